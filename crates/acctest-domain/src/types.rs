use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use crate::error::DomainError;
use crate::quantity::Quantity;

// ── Identifiers ──────────────────────────────────────────────────────────────

/// Unique key of a container group at the provider: at most one group exists
/// per `(resource_group, name)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceIdentity {
    pub resource_group: String,
    pub name: String,
}

impl ResourceIdentity {
    pub fn new(resource_group: impl Into<String>, name: impl Into<String>) -> Self {
        ResourceIdentity {
            resource_group: resource_group.into(),
            name: name.into(),
        }
    }
}

impl std::fmt::Display for ResourceIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.resource_group, self.name)
    }
}

// ── Secrets ──────────────────────────────────────────────────────────────────

/// A secret-valued field. Never printed by `Debug` or `Display`; providers
/// never echo it back on read.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(s: impl Into<String>) -> Self {
        Secret(s.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Secret(<redacted>)")
    }
}

impl std::fmt::Display for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("<redacted>")
    }
}

// ── Enums ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum OsType {
    Linux,
    Windows,
}

impl std::str::FromStr for OsType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "linux" => Ok(OsType::Linux),
            "windows" => Ok(OsType::Windows),
            _ => Err(DomainError::InvalidOsType(s.to_string())),
        }
    }
}

impl std::fmt::Display for OsType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OsType::Linux => write!(f, "Linux"),
            OsType::Windows => write!(f, "Windows"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum RestartPolicy {
    #[default]
    Always,
    OnFailure,
    Never,
}

impl std::str::FromStr for RestartPolicy {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "always" => Ok(RestartPolicy::Always),
            "onfailure" => Ok(RestartPolicy::OnFailure),
            "never" => Ok(RestartPolicy::Never),
            _ => Err(DomainError::InvalidRestartPolicy(s.to_string())),
        }
    }
}

impl std::fmt::Display for RestartPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RestartPolicy::Always => write!(f, "Always"),
            RestartPolicy::OnFailure => write!(f, "OnFailure"),
            RestartPolicy::Never => write!(f, "Never"),
        }
    }
}

/// Port protocol. Unspecified protocols default to TCP.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum Protocol {
    #[default]
    #[serde(rename = "TCP")]
    Tcp,
    #[serde(rename = "UDP")]
    Udp,
}

impl std::str::FromStr for Protocol {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tcp" => Ok(Protocol::Tcp),
            "udp" => Ok(Protocol::Udp),
            _ => Err(DomainError::InvalidProtocol(s.to_string())),
        }
    }
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Protocol::Tcp => write!(f, "TCP"),
            Protocol::Udp => write!(f, "UDP"),
        }
    }
}

// Deserialization accepts any case; serialization stays canonical.
macro_rules! try_from_string {
    ($($ty:ty),*) => {
        $(
            impl TryFrom<String> for $ty {
                type Error = DomainError;

                fn try_from(s: String) -> Result<Self, Self::Error> {
                    s.parse()
                }
            }
        )*
    };
}

try_from_string!(OsType, RestartPolicy, Protocol);

// ── Desired state ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortSpec {
    pub port: u16,
    #[serde(default)]
    pub protocol: Protocol,
}

impl PortSpec {
    pub fn tcp(port: u16) -> Self {
        PortSpec { port, protocol: Protocol::Tcp }
    }

    pub fn udp(port: u16) -> Self {
        PortSpec { port, protocol: Protocol::Udp }
    }
}

/// Backing file share for a volume mount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareRef {
    pub share_name: String,
    pub storage_account_name: String,
    pub storage_account_key: Secret,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeMount {
    pub name: String,
    pub mount_path: String,
    #[serde(default)]
    pub read_only: bool,
    pub share: ShareRef,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerSpec {
    pub name: String,
    pub image: String,
    pub cpu: Quantity,
    pub memory: Quantity,
    /// Declaration order is preserved all the way to the provider.
    #[serde(default)]
    pub ports: Vec<PortSpec>,
    #[serde(default)]
    pub commands: Vec<String>,
    #[serde(default)]
    pub environment_variables: BTreeMap<String, String>,
    #[serde(default)]
    pub secure_environment_variables: BTreeMap<String, Secret>,
    #[serde(default)]
    pub volumes: Vec<VolumeMount>,
}

impl ContainerSpec {
    pub fn new(name: impl Into<String>, image: impl Into<String>, cpu: Quantity, memory: Quantity) -> Self {
        ContainerSpec {
            name: name.into(),
            image: image.into(),
            cpu,
            memory,
            ports: Vec::new(),
            commands: Vec::new(),
            environment_variables: BTreeMap::new(),
            secure_environment_variables: BTreeMap::new(),
            volumes: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryCredential {
    pub server: String,
    pub username: String,
    pub password: Secret,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkIdentity {
    pub public_ip: bool,
    #[serde(default)]
    pub dns_name_label: Option<String>,
}

/// Declarative description of a container group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSpec {
    pub name: String,
    pub resource_group: String,
    pub location: String,
    pub os_type: OsType,
    #[serde(default)]
    pub network: Option<NetworkIdentity>,
    #[serde(default)]
    pub restart_policy: RestartPolicy,
    pub containers: Vec<ContainerSpec>,
    #[serde(default)]
    pub registry_credentials: Vec<RegistryCredential>,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

impl ResourceSpec {
    pub fn identity(&self) -> ResourceIdentity {
        ResourceIdentity::new(&self.resource_group, &self.name)
    }

    /// Structural checks that hold for every container group regardless of
    /// provider.
    pub fn validate(&self) -> Result<(), DomainError> {
        for (field, value) in [
            ("name", &self.name),
            ("resource_group", &self.resource_group),
            ("location", &self.location),
        ] {
            if value.trim().is_empty() {
                return Err(DomainError::EmptyField(field.to_string()));
            }
        }

        if self.containers.is_empty() {
            return Err(DomainError::NoContainers(self.identity().to_string()));
        }

        let mut seen = HashSet::new();
        for c in &self.containers {
            if c.name.trim().is_empty() || c.image.trim().is_empty() {
                return Err(DomainError::EmptyField(format!("container '{}' name/image", c.name)));
            }
            if !seen.insert(c.name.as_str()) {
                return Err(DomainError::DuplicateContainer(c.name.clone()));
            }
            for p in &c.ports {
                if p.port == 0 {
                    return Err(DomainError::InvalidPort {
                        container: c.name.clone(),
                        port: i64::from(p.port),
                    });
                }
            }
            for v in &c.volumes {
                if !v.mount_path.starts_with('/') && !v.mount_path.contains(':') {
                    return Err(DomainError::InvalidConfig(format!(
                        "volume '{}' in container '{}' has a relative mount path '{}'",
                        v.name, c.name, v.mount_path
                    )));
                }
            }
        }

        for cred in &self.registry_credentials {
            if cred.server.trim().is_empty() || cred.username.trim().is_empty() {
                return Err(DomainError::EmptyField("image_registry_credential server/username".into()));
            }
        }

        if let Some(net) = &self.network {
            if net.dns_name_label.is_some() && !net.public_ip {
                return Err(DomainError::InvalidConfig(
                    "dns_name_label requires a public ip address".into(),
                ));
            }
        }

        Ok(())
    }
}

// ── Observed state ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservedIp {
    pub ip: Option<String>,
    pub public: bool,
    pub dns_name_label: Option<String>,
    pub fqdn: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservedVolume {
    pub name: String,
    pub mount_path: String,
    pub read_only: bool,
    pub share_name: Option<String>,
    pub storage_account_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservedContainer {
    pub name: String,
    pub image: String,
    pub cpu: Quantity,
    pub memory: Quantity,
    pub ports: Vec<PortSpec>,
    pub commands: Vec<String>,
    pub environment_variables: BTreeMap<String, String>,
    /// Names only; secure values are never returned on read.
    pub secure_environment_variable_names: Vec<String>,
    pub volumes: Vec<ObservedVolume>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservedCredential {
    pub server: String,
    pub username: String,
}

/// Provider-reported state of a container group. Recreated on every read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservedState {
    pub identity: ResourceIdentity,
    /// Provider-assigned resource id.
    pub id: String,
    pub location: String,
    pub os_type: OsType,
    pub restart_policy: RestartPolicy,
    pub ip_address: Option<ObservedIp>,
    pub provisioning_state: String,
    pub containers: Vec<ObservedContainer>,
    pub registry_credentials: Vec<ObservedCredential>,
    pub tags: BTreeMap<String, String>,
}
