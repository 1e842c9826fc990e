//! Storage-independent building blocks: rule codec, filters, model boundary
//! and identifier validation.

pub mod codec;
pub mod filter;
pub mod model;
pub mod validation;
