mod attributes;
mod check;
mod error;
mod import;

pub use attributes::{applied_attributes, flatten, flatten_spec, AttrValue, Attributes};
pub use check::{compare, declared_checks, Check};
pub use error::{Mismatch, Mismatches};
pub use import::import_verify;
