//! Policy model boundary
//!
//! The adapter does not evaluate policies. It feeds loaded rules into a
//! `Model` one line at a time and reads rules back out of it when saving.
//! `MemoryModel` is a minimal in-memory implementation used by tools and tests.

use super::codec::Rule;
use std::collections::BTreeMap;

/// Section holding permission rules
pub const POLICY_SECTION: &str = "p";
/// Section holding role/grouping rules
pub const GROUPING_SECTION: &str = "g";

/// In-memory policy model fed by the adapter
pub trait Model {
    /// Accept one rule in the line format `"ptype, v0, v1, ..."`
    fn load_policy_line(&mut self, line: &str);

    /// Every rule currently held in the given section (`"p"` or `"g"`)
    fn policy_rules(&self, sec: &str) -> Vec<Rule>;
}

/// Section a ptype belongs to: its first character (`"p2"` -> `"p"`)
pub fn section_of(ptype: &str) -> &str {
    ptype
        .char_indices()
        .nth(1)
        .map(|(idx, _)| &ptype[..idx])
        .unwrap_or(ptype)
}

/// Simple in-memory model: section -> ptype -> rules in insertion order
#[derive(Debug, Clone, Default)]
pub struct MemoryModel {
    sections: BTreeMap<String, BTreeMap<String, Vec<Vec<String>>>>,
}

impl MemoryModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a rule; returns `false` if it was already present
    pub fn add_policy<S: AsRef<str>>(&mut self, sec: &str, ptype: &str, rule: &[S]) -> bool {
        let rule: Vec<String> = rule.iter().map(|v| v.as_ref().to_string()).collect();
        let rules = self
            .sections
            .entry(sec.to_string())
            .or_default()
            .entry(ptype.to_string())
            .or_default();

        if rules.contains(&rule) {
            return false;
        }
        rules.push(rule);
        true
    }

    /// Remove a rule; returns `false` if it was not present
    pub fn remove_policy<S: AsRef<str>>(&mut self, sec: &str, ptype: &str, rule: &[S]) -> bool {
        let Some(rules) = self
            .sections
            .get_mut(sec)
            .and_then(|section| section.get_mut(ptype))
        else {
            return false;
        };

        let before = rules.len();
        rules.retain(|r| !same_rule(r, rule));
        rules.len() != before
    }

    pub fn has_policy<S: AsRef<str>>(&self, sec: &str, ptype: &str, rule: &[S]) -> bool {
        self.get_policy(sec, ptype)
            .iter()
            .any(|r| same_rule(r, rule))
    }

    /// Rules of one ptype, empty if the ptype has none
    pub fn get_policy(&self, sec: &str, ptype: &str) -> &[Vec<String>] {
        self.sections
            .get(sec)
            .and_then(|section| section.get(ptype))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Drop every rule in every section
    pub fn clear_policy(&mut self) {
        self.sections.clear();
    }

    /// Total number of rules across all sections
    pub fn len(&self) -> usize {
        self.sections
            .values()
            .flat_map(|section| section.values())
            .map(Vec::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Model for MemoryModel {
    fn load_policy_line(&mut self, line: &str) {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return;
        }

        let mut tokens = line.split(',').map(str::trim);
        let Some(ptype) = tokens.next().filter(|p| !p.is_empty()) else {
            return;
        };
        let rule: Vec<&str> = tokens.collect();

        self.add_policy(section_of(ptype), ptype, &rule);
    }

    fn policy_rules(&self, sec: &str) -> Vec<Rule> {
        self.sections
            .get(sec)
            .map(|section| {
                section
                    .iter()
                    .flat_map(|(ptype, rules)| rules.iter().map(|r| Rule::new(ptype.clone(), r)))
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn same_rule<S: AsRef<str>>(stored: &[String], rule: &[S]) -> bool {
    stored.len() == rule.len() && stored.iter().zip(rule).all(|(a, b)| a == b.as_ref())
}
