pub mod error;
pub mod quantity;
pub mod types;

mod tests;

pub use error::DomainError;
pub use quantity::Quantity;
pub use types::*;
