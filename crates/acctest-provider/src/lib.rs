pub mod azure;
pub mod client;
pub mod error;
pub mod local;
pub mod terraform;

pub use azure::{AzureConfig, AzureContainerClient};
pub use client::{ApplyEngine, ProviderClient};
pub use error::ProviderError;
pub use local::{Faults, LocalCloud};
pub use terraform::{TerraformConfig, TerraformEngine};
