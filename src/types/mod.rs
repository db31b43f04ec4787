//! Core type and value definitions shared across the analyzer.

pub mod data_type;
pub mod value;

pub use data_type::{DataType, TypeCategory, NO_TYPMOD};
pub use value::Value;
