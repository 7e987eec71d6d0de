use acctest_domain::{ObservedState, ResourceIdentity};
use acctest_fixture::Fixture;
use async_trait::async_trait;

use crate::error::ProviderError;

/// Read/delete access to container groups at the provider.
///
/// Implementations are shared across concurrently running sequences and must
/// not require client-side locking.
#[async_trait]
pub trait ProviderClient: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    /// Fetch current state by identity. `Ok(None)` means the group does not
    /// exist; it is never reported as an error.
    async fn get(&self, identity: &ResourceIdentity) -> Result<Option<ObservedState>, ProviderError>;

    /// Delete by identity. Deleting an absent group succeeds.
    async fn delete(&self, identity: &ResourceIdentity) -> Result<(), ProviderError>;
}

/// Drives the declarative toolchain. Apply converges the provider onto the
/// rendered document and returns no state; callers read it back through a
/// [`ProviderClient`].
#[async_trait]
pub trait ApplyEngine: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    async fn apply(&self, fixture: &Fixture, document: &str) -> Result<(), ProviderError>;

    /// Remove everything the fixture declared, supporting resources included.
    async fn destroy(&self, fixture: &Fixture, document: &str) -> Result<(), ProviderError>;
}
