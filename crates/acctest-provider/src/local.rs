use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};

use acctest_domain::{
    ObservedContainer, ObservedCredential, ObservedIp, ObservedState, ObservedVolume,
    ResourceIdentity, ResourceSpec,
};
use acctest_fixture::Fixture;
use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::client::{ApplyEngine, ProviderClient};
use crate::error::ProviderError;

/// Failure injection for [`LocalCloud`].
#[derive(Debug, Clone, Default)]
pub struct Faults {
    /// Fail the n-th apply call (1-based).
    pub fail_apply_on_call: Option<usize>,
    /// Apply succeeds but the group is never stored.
    pub drop_on_apply: bool,
    pub fail_get: Option<String>,
    pub fail_delete: Option<String>,
    /// Delete succeeds but the group stays visible.
    pub ignore_delete: bool,
    pub fail_destroy: Option<String>,
}

#[derive(Default)]
struct State {
    groups: HashMap<ResourceIdentity, ObservedState>,
    resource_groups: BTreeSet<String>,
    faults: Faults,
}

/// An in-memory provider that behaves like the real one where it matters:
/// apply replaces state wholesale, reads never return secrets, and not-found
/// is distinct from failure.
///
/// - Assigns a deterministic public IP and FQDN per identity.
/// - Tracks resource groups created by apply so `destroy` can be observed.
/// - Performs no I/O.
#[derive(Default)]
pub struct LocalCloud {
    state: RwLock<State>,
    applies: AtomicUsize,
    gets: AtomicUsize,
    deletes: AtomicUsize,
    destroys: AtomicUsize,
}

impl LocalCloud {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_faults(faults: Faults) -> Self {
        LocalCloud {
            state: RwLock::new(State { faults, ..State::default() }),
            ..Self::default()
        }
    }

    pub async fn set_faults(&self, faults: Faults) {
        self.state.write().await.faults = faults;
    }

    /// Seed a group directly, bypassing apply.
    pub async fn insert(&self, state: ObservedState) {
        let mut guard = self.state.write().await;
        guard.resource_groups.insert(state.identity.resource_group.clone());
        guard.groups.insert(state.identity.clone(), state);
    }

    pub async fn contains(&self, identity: &ResourceIdentity) -> bool {
        self.state.read().await.groups.contains_key(identity)
    }

    pub async fn group_count(&self) -> usize {
        self.state.read().await.groups.len()
    }

    pub async fn resource_groups(&self) -> Vec<String> {
        self.state.read().await.resource_groups.iter().cloned().collect()
    }

    pub fn apply_calls(&self) -> usize {
        self.applies.load(Ordering::SeqCst)
    }

    pub fn get_calls(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }

    pub fn destroy_calls(&self) -> usize {
        self.destroys.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProviderClient for LocalCloud {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn get(&self, identity: &ResourceIdentity) -> Result<Option<ObservedState>, ProviderError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        let guard = self.state.read().await;
        if let Some(msg) = &guard.faults.fail_get {
            return Err(ProviderError::Transport(msg.clone()));
        }
        debug!(%identity, found = guard.groups.contains_key(identity), "LocalCloud: get");
        Ok(guard.groups.get(identity).cloned())
    }

    async fn delete(&self, identity: &ResourceIdentity) -> Result<(), ProviderError> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        let mut guard = self.state.write().await;
        if let Some(msg) = &guard.faults.fail_delete {
            return Err(ProviderError::Api { status: 500, message: msg.clone() });
        }
        if guard.faults.ignore_delete {
            debug!(%identity, "LocalCloud: delete ignored");
            return Ok(());
        }
        guard.groups.remove(identity);
        debug!(%identity, "LocalCloud: delete");
        Ok(())
    }
}

#[async_trait]
impl ApplyEngine for LocalCloud {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn apply(&self, fixture: &Fixture, _document: &str) -> Result<(), ProviderError> {
        let call = self.applies.fetch_add(1, Ordering::SeqCst) + 1;
        let mut guard = self.state.write().await;
        if guard.faults.fail_apply_on_call == Some(call) {
            return Err(ProviderError::ApplyFailed(format!(
                "injected failure on apply #{call} of '{}'",
                fixture.name
            )));
        }

        guard.resource_groups.insert(fixture.resource_group.name.clone());
        if guard.faults.drop_on_apply {
            debug!(identity = %fixture.identity(), "LocalCloud: apply dropped");
            return Ok(());
        }

        let observed = observe(&fixture.container_group);
        debug!(identity = %observed.identity, containers = observed.containers.len(), "LocalCloud: apply");
        guard.groups.insert(observed.identity.clone(), observed);
        Ok(())
    }

    async fn destroy(&self, fixture: &Fixture, _document: &str) -> Result<(), ProviderError> {
        self.destroys.fetch_add(1, Ordering::SeqCst);
        let mut guard = self.state.write().await;
        if let Some(msg) = &guard.faults.fail_destroy {
            return Err(ProviderError::DestroyFailed(msg.clone()));
        }
        guard.groups.remove(&fixture.identity());
        guard.resource_groups.remove(&fixture.resource_group.name);
        debug!(identity = %fixture.identity(), "LocalCloud: destroy");
        Ok(())
    }
}

/// What a provider would report right after applying `spec`.
fn observe(spec: &ResourceSpec) -> ObservedState {
    let identity = spec.identity();
    let ip_address = spec.network.as_ref().map(|net| ObservedIp {
        ip: Some(synthetic_ip(&identity, net.public_ip)),
        public: net.public_ip,
        dns_name_label: net.dns_name_label.clone(),
        fqdn: net
            .dns_name_label
            .as_ref()
            .map(|label| format!("{}.{}.azurecontainer.io", label, spec.location)),
    });

    let containers = spec
        .containers
        .iter()
        .map(|c| ObservedContainer {
            name: c.name.clone(),
            image: c.image.clone(),
            cpu: c.cpu,
            memory: c.memory,
            ports: c.ports.clone(),
            commands: c.commands.clone(),
            environment_variables: c.environment_variables.clone(),
            secure_environment_variable_names: c.secure_environment_variables.keys().cloned().collect(),
            volumes: c
                .volumes
                .iter()
                .map(|v| ObservedVolume {
                    name: v.name.clone(),
                    mount_path: v.mount_path.clone(),
                    read_only: v.read_only,
                    share_name: Some(v.share.share_name.clone()),
                    storage_account_name: Some(v.share.storage_account_name.clone()),
                })
                .collect(),
        })
        .collect();

    ObservedState {
        id: format!(
            "/subscriptions/00000000-0000-0000-0000-000000000000/resourceGroups/{}/providers/Microsoft.ContainerInstance/containerGroups/{}",
            identity.resource_group, identity.name
        ),
        identity,
        location: spec.location.clone(),
        os_type: spec.os_type,
        restart_policy: spec.restart_policy,
        ip_address,
        provisioning_state: "Succeeded".into(),
        containers,
        registry_credentials: spec
            .registry_credentials
            .iter()
            .map(|c| ObservedCredential { server: c.server.clone(), username: c.username.clone() })
            .collect(),
        tags: spec.tags.clone(),
    }
}

/// FNV-1a over the identity, folded into an address.
fn synthetic_ip(identity: &ResourceIdentity, public: bool) -> String {
    let mut hash: u32 = 0x811c_9dc5;
    for b in identity.to_string().bytes() {
        hash ^= u32::from(b);
        hash = hash.wrapping_mul(0x0100_0193);
    }
    let [_, a, b, c] = hash.to_be_bytes();
    let first = if public { 20 } else { 10 };
    format!("{first}.{a}.{b}.{c}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use acctest_fixture::{catalog, FixtureParams};

    fn params() -> FixtureParams {
        FixtureParams::new(11, "westus")
    }

    #[tokio::test]
    async fn apply_then_get_returns_state_without_secrets() {
        let cloud = LocalCloud::new();
        let f = catalog::linux_complete(&params()).unwrap();
        cloud.apply(&f, "").await.unwrap();

        let state = cloud.get(&f.identity()).await.unwrap().unwrap();
        assert_eq!(state.provisioning_state, "Succeeded");
        let c = &state.containers[0];
        assert_eq!(c.secure_environment_variable_names, vec!["secureFoo", "secureFoo1"]);
        assert!(!format!("{:?}", state).contains("secureBar"));
        assert!(state.ip_address.unwrap().fqdn.unwrap().ends_with(".westus.azurecontainer.io"));
    }

    #[tokio::test]
    async fn update_replaces_rather_than_merges() {
        let cloud = LocalCloud::new();
        let p = params();
        cloud.apply(&catalog::image_registry_credentials(&p).unwrap(), "").await.unwrap();
        let f = catalog::image_registry_credentials_updated(&p).unwrap();
        cloud.apply(&f, "").await.unwrap();

        let state = cloud.get(&f.identity()).await.unwrap().unwrap();
        assert_eq!(state.registry_credentials.len(), 1);
        assert_eq!(state.registry_credentials[0].username, "updatedusername");
        assert_eq!(cloud.group_count().await, 1);
    }

    #[tokio::test]
    async fn missing_group_is_none_and_delete_is_idempotent() {
        let cloud = LocalCloud::new();
        let id = ResourceIdentity::new("rg", "nope");
        assert!(cloud.get(&id).await.unwrap().is_none());
        cloud.delete(&id).await.unwrap();
        cloud.delete(&id).await.unwrap();
        assert_eq!(cloud.delete_calls(), 2);
    }

    #[tokio::test]
    async fn synthetic_ip_is_stable_per_identity() {
        let a = ResourceIdentity::new("rg", "a");
        assert_eq!(synthetic_ip(&a, true), synthetic_ip(&a, true));
        assert_ne!(synthetic_ip(&a, true), synthetic_ip(&ResourceIdentity::new("rg", "b"), true));
    }

    #[tokio::test]
    async fn faults_are_injected() {
        let cloud = LocalCloud::with_faults(Faults {
            fail_apply_on_call: Some(2),
            ..Faults::default()
        });
        let f = catalog::linux_basic(&params()).unwrap();
        cloud.apply(&f, "").await.unwrap();
        assert!(matches!(cloud.apply(&f, "").await, Err(ProviderError::ApplyFailed(_))));

        cloud
            .set_faults(Faults { fail_get: Some("connection reset".into()), ..Faults::default() })
            .await;
        assert!(matches!(cloud.get(&f.identity()).await, Err(ProviderError::Transport(_))));
    }

    #[tokio::test]
    async fn destroy_removes_supporting_resources() {
        let cloud = LocalCloud::new();
        let f = catalog::linux_basic(&params()).unwrap();
        cloud.apply(&f, "").await.unwrap();
        assert_eq!(cloud.resource_groups().await, vec!["acctestRG-11".to_string()]);
        cloud.destroy(&f, "").await.unwrap();
        assert!(cloud.resource_groups().await.is_empty());
        assert!(!cloud.contains(&f.identity()).await);
    }
}
