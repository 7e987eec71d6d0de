pub mod catalog;
pub mod error;
pub mod fixture;
pub mod hcl;

pub use error::FixtureError;
pub use fixture::{render, Fixture, FixtureParams, ResourceGroupBlock, StorageBlock};
pub use hcl::{Block, Body, Document, Expr};
