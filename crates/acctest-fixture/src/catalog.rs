//! Named container-group fixtures.
//!
//! Every fixture is a pure function of [`FixtureParams`]. Names embed the
//! random disambiguator so independent runs never share an identity.

use std::collections::BTreeMap;

use acctest_domain::{
    ContainerSpec, NetworkIdentity, OsType, PortSpec, Quantity, RegistryCredential, ResourceSpec,
    RestartPolicy, Secret, ShareRef, VolumeMount,
};

use crate::error::FixtureError;
use crate::fixture::{Fixture, FixtureParams, ResourceGroupBlock, StorageBlock};

pub const NAMES: &[&str] = &[
    "linux_basic",
    "linux_basic_updated",
    "image_registry_credentials",
    "image_registry_credentials_updated",
    "windows_basic",
    "windows_complete",
    "linux_complete",
];

/// Look up a fixture by catalog name.
pub fn by_name(name: &str, params: &FixtureParams) -> Result<Fixture, FixtureError> {
    params.check()?;
    match name {
        "linux_basic" => linux_basic(params),
        "linux_basic_updated" => linux_basic_updated(params),
        "image_registry_credentials" => image_registry_credentials(params),
        "image_registry_credentials_updated" => image_registry_credentials_updated(params),
        "windows_basic" => windows_basic(params),
        "windows_complete" => windows_complete(params),
        "linux_complete" => linux_complete(params),
        other => Err(FixtureError::UnknownFixture(other.to_string())),
    }
}

pub fn linux_basic(p: &FixtureParams) -> Result<Fixture, FixtureError> {
    let mut hw = helloworld()?;
    hw.ports = vec![PortSpec::tcp(80)];
    Ok(base(p, "linux_basic", OsType::Linux, vec![hw]))
}

pub fn linux_basic_updated(p: &FixtureParams) -> Result<Fixture, FixtureError> {
    let mut hw = helloworld()?;
    hw.ports = vec![PortSpec::tcp(80), PortSpec::udp(5443)];
    Ok(base(p, "linux_basic_updated", OsType::Linux, vec![hw, sidecar()?]))
}

pub fn image_registry_credentials(p: &FixtureParams) -> Result<Fixture, FixtureError> {
    let mut hw = helloworld()?;
    hw.ports = vec![PortSpec::udp(5443)];
    let mut f = base(p, "image_registry_credentials", OsType::Linux, vec![hw, sidecar()?]);
    f.container_group.registry_credentials = vec![
        credential("hub.docker.com", "yourusername", "yourpassword"),
        credential("mine.acr.io", "acrusername", "acrpassword"),
    ];
    Ok(f)
}

pub fn image_registry_credentials_updated(p: &FixtureParams) -> Result<Fixture, FixtureError> {
    let mut hw = helloworld()?;
    hw.ports = vec![PortSpec::tcp(80)];
    let mut f = base(p, "image_registry_credentials_updated", OsType::Linux, vec![hw, sidecar()?]);
    f.container_group.registry_credentials =
        vec![credential("hub.docker.com", "updatedusername", "updatedpassword")];
    Ok(f)
}

pub fn windows_basic(p: &FixtureParams) -> Result<Fixture, FixtureError> {
    let mut c = windowsservercore()?;
    c.ports = vec![PortSpec::tcp(80), PortSpec::tcp(443)];
    Ok(base(p, "windows_basic", OsType::Windows, vec![c]))
}

pub fn windows_complete(p: &FixtureParams) -> Result<Fixture, FixtureError> {
    let mut c = windowsservercore()?;
    c.ports = vec![PortSpec::tcp(80)];
    c.environment_variables = plain_env();
    c.secure_environment_variables = secure_env();
    c.commands = vec!["cmd.exe".into(), "echo".into(), "hi".into()];

    let mut f = base(p, "windows_complete", OsType::Windows, vec![c]);
    f.container_group.network = Some(NetworkIdentity {
        public_ip: true,
        dns_name_label: Some(format!("acctestcontainergroup-{}", p.rand_int)),
    });
    f.container_group.restart_policy = RestartPolicy::Never;
    Ok(f)
}

pub fn linux_complete(p: &FixtureParams) -> Result<Fixture, FixtureError> {
    let storage = StorageBlock {
        account_name: format!("accsa{}", p.rand_int),
        share_name: format!("acctestss-{}", p.rand_int),
        account_tier: "Standard".into(),
        replication_type: "LRS".into(),
        quota_gb: 50,
    };

    let mut c = ContainerSpec::new(
        "hf",
        "seanmckenna/aci-hellofiles",
        Quantity::parse("1")?,
        Quantity::parse("1.5")?,
    );
    c.ports = vec![PortSpec::tcp(80)];
    c.volumes = vec![VolumeMount {
        name: "logs".into(),
        mount_path: "/aci/logs".into(),
        read_only: false,
        share: ShareRef {
            share_name: storage.share_name.clone(),
            storage_account_name: storage.account_name.clone(),
            // The real key is computed by the storage account at apply time.
            storage_account_key: Secret::new(format!("{}-primary-key", storage.account_name)),
        },
    }];
    c.environment_variables = plain_env();
    c.secure_environment_variables = secure_env();
    c.commands = vec!["/bin/bash".into(), "-c".into(), "ls".into()];

    let mut f = base(p, "linux_complete", OsType::Linux, vec![c]);
    f.storage = Some(storage);
    f.container_group.network = Some(NetworkIdentity {
        public_ip: true,
        dns_name_label: Some(format!("acctestcontainergroup-{}", p.rand_int)),
    });
    f.container_group.restart_policy = RestartPolicy::OnFailure;
    Ok(f)
}

// ── Building blocks ───────────────────────────────────────────────────────────

fn base(p: &FixtureParams, name: &str, os_type: OsType, containers: Vec<ContainerSpec>) -> Fixture {
    let resource_group = ResourceGroupBlock {
        name: format!("acctestRG-{}", p.rand_int),
        location: p.location.clone(),
    };
    let mut tags = BTreeMap::new();
    tags.insert("environment".to_string(), "Testing".to_string());

    let spec = ResourceSpec {
        name: format!("acctestcontainergroup-{}", p.rand_int),
        resource_group: resource_group.name.clone(),
        location: p.location.clone(),
        os_type,
        network: Some(NetworkIdentity { public_ip: true, dns_name_label: None }),
        restart_policy: RestartPolicy::Always,
        containers,
        registry_credentials: Vec::new(),
        tags,
    };

    Fixture {
        name: name.to_string(),
        resource_group,
        storage: None,
        container_group: spec,
    }
}

fn helloworld() -> Result<ContainerSpec, FixtureError> {
    Ok(ContainerSpec::new(
        "hw",
        "microsoft/aci-helloworld:latest",
        Quantity::parse("0.5")?,
        Quantity::parse("0.5")?,
    ))
}

fn sidecar() -> Result<ContainerSpec, FixtureError> {
    Ok(ContainerSpec::new(
        "sidecar",
        "microsoft/aci-tutorial-sidecar",
        Quantity::parse("0.5")?,
        Quantity::parse("0.5")?,
    ))
}

fn windowsservercore() -> Result<ContainerSpec, FixtureError> {
    Ok(ContainerSpec::new(
        "windowsservercore",
        "microsoft/windowsservercore:latest",
        Quantity::parse("2.0")?,
        Quantity::parse("3.5")?,
    ))
}

fn credential(server: &str, username: &str, password: &str) -> RegistryCredential {
    RegistryCredential {
        server: server.into(),
        username: username.into(),
        password: Secret::new(password),
    }
}

fn plain_env() -> BTreeMap<String, String> {
    [("foo", "bar"), ("foo1", "bar1")]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn secure_env() -> BTreeMap<String, Secret> {
    [("secureFoo", "secureBar"), ("secureFoo1", "secureBar1")]
        .into_iter()
        .map(|(k, v)| (k.to_string(), Secret::new(v)))
        .collect()
}
