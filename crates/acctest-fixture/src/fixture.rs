use acctest_domain::{ContainerSpec, ResourceIdentity, ResourceSpec, VolumeMount};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::FixtureError;
use crate::hcl::{Block, Body, Document, Expr};

const RG_TYPE: &str = "azurerm_resource_group";
const SA_TYPE: &str = "azurerm_storage_account";
const SHARE_TYPE: &str = "azurerm_storage_share";
const CG_TYPE: &str = "azurerm_container_group";
const ALIAS: &str = "test";

/// Inputs to every fixture: a random disambiguator so concurrent runs never
/// collide on names, plus the target location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixtureParams {
    pub rand_int: u32,
    pub location: String,
}

impl FixtureParams {
    pub fn new(rand_int: u32, location: impl Into<String>) -> Self {
        FixtureParams { rand_int, location: location.into() }
    }

    /// Draw a fresh disambiguator.
    pub fn random(location: impl Into<String>) -> Self {
        let rand_int = rand::thread_rng().gen_range(0..1_000_000_000);
        Self::new(rand_int, location)
    }

    pub(crate) fn check(&self) -> Result<(), FixtureError> {
        if self.location.trim().is_empty() {
            return Err(FixtureError::InvalidParam {
                param: "location".into(),
                message: "must not be empty".into(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceGroupBlock {
    pub name: String,
    pub location: String,
}

/// Storage account plus file share backing container volumes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageBlock {
    pub account_name: String,
    pub share_name: String,
    pub account_tier: String,
    pub replication_type: String,
    pub quota_gb: u32,
}

/// A complete, renderable test configuration: the container group under
/// test plus the supporting resources it references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fixture {
    /// Catalog name, or a caller-chosen label for inline specs.
    pub name: String,
    pub resource_group: ResourceGroupBlock,
    pub storage: Option<StorageBlock>,
    pub container_group: ResourceSpec,
}

impl Fixture {
    /// Wrap a bare spec, deriving the resource group block from it.
    pub fn for_spec(name: impl Into<String>, spec: ResourceSpec) -> Self {
        Fixture {
            name: name.into(),
            resource_group: ResourceGroupBlock {
                name: spec.resource_group.clone(),
                location: spec.location.clone(),
            },
            storage: None,
            container_group: spec,
        }
    }

    pub fn identity(&self) -> ResourceIdentity {
        self.container_group.identity()
    }

    /// Build the HCL document model for this fixture.
    pub fn to_document(&self) -> Document {
        let mut doc = Document::new();

        let mut rg = Body::new();
        rg.attr("name", Expr::str(&self.resource_group.name))
            .attr("location", Expr::str(&self.resource_group.location));
        doc.push(Block::resource(RG_TYPE, ALIAS, rg));

        if let Some(storage) = &self.storage {
            let mut sa = Body::new();
            sa.attr("name", Expr::str(&storage.account_name))
                .attr("resource_group_name", rg_ref("name"))
                .attr("location", rg_ref("location"))
                .attr("account_tier", Expr::str(&storage.account_tier))
                .attr("account_replication_type", Expr::str(&storage.replication_type));
            doc.push(Block::resource(SA_TYPE, ALIAS, sa));

            let mut share = Body::new();
            share
                .attr("name", Expr::str(&storage.share_name))
                .attr("resource_group_name", rg_ref("name"))
                .attr("storage_account_name", Expr::reference(format!("{SA_TYPE}.{ALIAS}.name")))
                .attr("quota", Expr::num(storage.quota_gb));
            doc.push(Block::resource(SHARE_TYPE, ALIAS, share));
        }

        doc.push(Block::resource(CG_TYPE, ALIAS, self.container_group_body()));
        doc
    }

    fn container_group_body(&self) -> Body {
        let spec = &self.container_group;
        let mut body = Body::new();

        body.attr("name", Expr::str(&spec.name));
        if spec.location == self.resource_group.location {
            body.attr("location", rg_ref("location"));
        } else {
            body.attr("location", Expr::str(&spec.location));
        }
        if spec.resource_group == self.resource_group.name {
            body.attr("resource_group_name", rg_ref("name"));
        } else {
            body.attr("resource_group_name", Expr::str(&spec.resource_group));
        }

        if let Some(net) = &spec.network {
            let ip_type = if net.public_ip { "public" } else { "private" };
            body.attr("ip_address_type", Expr::str(ip_type));
            if let Some(label) = &net.dns_name_label {
                body.attr("dns_name_label", Expr::str(label));
            }
        }
        body.attr("os_type", Expr::str(spec.os_type.to_string()))
            .attr("restart_policy", Expr::str(spec.restart_policy.to_string()));

        for cred in &spec.registry_credentials {
            let mut b = Body::new();
            b.attr("server", Expr::str(&cred.server))
                .attr("username", Expr::str(&cred.username))
                .attr("password", Expr::str(cred.password.expose()));
            body.block(Block::new("image_registry_credential").with_body(b));
        }

        for container in &spec.containers {
            body.block(Block::new("container").with_body(self.container_body(container)));
        }

        if !spec.tags.is_empty() {
            body.attr(
                "tags",
                Expr::Map(spec.tags.iter().map(|(k, v)| (k.clone(), Expr::str(v))).collect()),
            );
        }
        body
    }

    fn container_body(&self, c: &ContainerSpec) -> Body {
        let mut body = Body::new();
        body.attr("name", Expr::str(&c.name))
            .attr("image", Expr::str(&c.image))
            .attr("cpu", Expr::num(c.cpu))
            .attr("memory", Expr::num(c.memory));

        if !c.commands.is_empty() {
            body.attr("commands", Expr::List(c.commands.iter().map(Expr::str).collect()));
        }
        if !c.environment_variables.is_empty() {
            body.attr(
                "environment_variables",
                Expr::Map(
                    c.environment_variables
                        .iter()
                        .map(|(k, v)| (k.clone(), Expr::str(v)))
                        .collect(),
                ),
            );
        }
        if !c.secure_environment_variables.is_empty() {
            body.attr(
                "secure_environment_variables",
                Expr::Map(
                    c.secure_environment_variables
                        .iter()
                        .map(|(k, v)| (k.clone(), Expr::str(v.expose())))
                        .collect(),
                ),
            );
        }

        for port in &c.ports {
            let mut p = Body::new();
            p.attr("port", Expr::num(port.port))
                .attr("protocol", Expr::str(port.protocol.to_string()));
            body.block(Block::new("ports").with_body(p));
        }

        for volume in &c.volumes {
            body.block(Block::new("volume").with_body(self.volume_body(volume)));
        }
        body
    }

    fn volume_body(&self, v: &VolumeMount) -> Body {
        let mut body = Body::new();
        body.attr("name", Expr::str(&v.name))
            .attr("mount_path", Expr::str(&v.mount_path))
            .attr("read_only", Expr::Bool(v.read_only));

        // When the backing account is part of the fixture its key only
        // exists after apply, so it is always referenced.
        match &self.storage {
            Some(s) if s.share_name == v.share.share_name && s.account_name == v.share.storage_account_name => {
                body.attr("share_name", Expr::reference(format!("{SHARE_TYPE}.{ALIAS}.name")))
                    .attr("storage_account_name", Expr::reference(format!("{SA_TYPE}.{ALIAS}.name")))
                    .attr(
                        "storage_account_key",
                        Expr::reference(format!("{SA_TYPE}.{ALIAS}.primary_access_key")),
                    );
            }
            _ => {
                body.attr("share_name", Expr::str(&v.share.share_name))
                    .attr("storage_account_name", Expr::str(&v.share.storage_account_name))
                    .attr("storage_account_key", Expr::str(v.share.storage_account_key.expose()));
            }
        }
        body
    }
}

fn rg_ref(attr: &str) -> Expr {
    Expr::reference(format!("{RG_TYPE}.{ALIAS}.{attr}"))
}

/// Render a fixture to a declarative document. Pure and deterministic; the
/// only failure is a fixture whose spec does not validate.
pub fn render(fixture: &Fixture) -> Result<String, FixtureError> {
    fixture
        .container_group
        .validate()
        .map_err(|source| FixtureError::InvalidSpec {
            fixture: fixture.name.clone(),
            source,
        })?;
    if fixture.resource_group.location.trim().is_empty() {
        return Err(FixtureError::InvalidParam {
            param: "location".into(),
            message: format!("fixture '{}' has an empty resource group location", fixture.name),
        });
    }

    let text = fixture.to_document().to_hcl();
    debug!(fixture = %fixture.name, identity = %fixture.identity(), bytes = text.len(), "rendered fixture");
    Ok(text)
}
