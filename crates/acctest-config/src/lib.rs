mod raw;
mod loader;
pub mod builtin;
pub mod case;
pub mod env;
pub mod error;

pub use builtin::{builtin_case, builtin_suite, BUILTIN_CASES};
pub use case::{ImportVerify, TestCase, TestStep};
pub use env::AccConfig;
pub use error::ConfigError;
pub use loader::{load_case, load_suite};
