//! Flattening of resource state into dotted attribute paths.
//!
//! Paths follow the provider state conventions: lists are addressed by
//! position (`container.0.ports.1.port`), list lengths live under `.#` and
//! map sizes under `.%`. Counts are always emitted, including zero.

use std::collections::{BTreeMap, BTreeSet};

use acctest_domain::{ObservedState, Quantity, ResourceSpec};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum AttrValue {
    Str(String),
    Int(i64),
    Bool(bool),
    Quantity(Quantity),
    /// Present at the provider but never echoed back (secrets).
    Redacted,
}

impl AttrValue {
    /// Exact comparison against an expected value written as text. Numbers
    /// are parsed, never rounded; redacted values match nothing.
    pub fn matches(&self, expected: &str) -> bool {
        match self {
            AttrValue::Str(s) => s == expected,
            AttrValue::Int(n) => expected.parse::<i64>().map_or(false, |e| e == *n),
            AttrValue::Bool(b) => expected == if *b { "true" } else { "false" },
            AttrValue::Quantity(q) => Quantity::parse(expected).map_or(false, |e| e == *q),
            AttrValue::Redacted => false,
        }
    }

    pub fn is_redacted(&self) -> bool {
        matches!(self, AttrValue::Redacted)
    }
}

impl std::fmt::Display for AttrValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttrValue::Str(s) => f.write_str(s),
            AttrValue::Int(n) => write!(f, "{}", n),
            AttrValue::Bool(b) => write!(f, "{}", b),
            AttrValue::Quantity(q) => write!(f, "{}", q),
            AttrValue::Redacted => f.write_str("<redacted>"),
        }
    }
}

pub type Attributes = BTreeMap<String, AttrValue>;

/// Builder that tracks which paths carry secret values.
#[derive(Default)]
struct Flat {
    attrs: Attributes,
    secrets: BTreeSet<String>,
}

impl Flat {
    fn put(&mut self, path: impl Into<String>, value: AttrValue) {
        self.attrs.insert(path.into(), value);
    }

    fn str(&mut self, path: impl Into<String>, value: &str) {
        self.put(path, AttrValue::Str(value.to_string()));
    }

    fn count(&mut self, path: &str, suffix: char, n: usize) {
        self.put(format!("{path}.{suffix}"), AttrValue::Int(n as i64));
    }

    fn secret(&mut self, path: String, value: AttrValue) {
        self.secrets.insert(path.clone());
        self.put(path, value);
    }
}

/// Flatten provider-reported state. Secret fields appear as
/// [`AttrValue::Redacted`].
pub fn flatten(state: &ObservedState) -> Attributes {
    let mut f = Flat::default();

    f.str("id", &state.id);
    f.str("name", &state.identity.name);
    f.str("resource_group_name", &state.identity.resource_group);
    f.str("location", &state.location);
    f.str("os_type", &state.os_type.to_string());
    f.str("restart_policy", &state.restart_policy.to_string());
    f.str("provisioning_state", &state.provisioning_state);

    if let Some(ip) = &state.ip_address {
        f.str("ip_address_type", if ip.public { "Public" } else { "Private" });
        if let Some(addr) = &ip.ip {
            f.str("ip_address", addr);
        }
        if let Some(label) = &ip.dns_name_label {
            f.str("dns_name_label", label);
        }
        if let Some(fqdn) = &ip.fqdn {
            f.str("fqdn", fqdn);
        }
    }

    flatten_tags(&mut f, &state.tags);

    f.count("container", '#', state.containers.len());
    for (i, c) in state.containers.iter().enumerate() {
        let base = format!("container.{i}");
        f.str(format!("{base}.name"), &c.name);
        f.str(format!("{base}.image"), &c.image);
        f.put(format!("{base}.cpu"), AttrValue::Quantity(c.cpu));
        f.put(format!("{base}.memory"), AttrValue::Quantity(c.memory));

        flatten_ports(&mut f, &base, c.ports.iter().map(|p| (p.port, p.protocol.to_string())));
        flatten_commands(&mut f, &base, &c.commands);

        f.count(&format!("{base}.environment_variables"), '%', c.environment_variables.len());
        for (k, v) in &c.environment_variables {
            f.str(format!("{base}.environment_variables.{k}"), v);
        }
        f.count(
            &format!("{base}.secure_environment_variables"),
            '%',
            c.secure_environment_variable_names.len(),
        );
        for k in &c.secure_environment_variable_names {
            f.secret(format!("{base}.secure_environment_variables.{k}"), AttrValue::Redacted);
        }

        f.count(&format!("{base}.volume"), '#', c.volumes.len());
        for (j, v) in c.volumes.iter().enumerate() {
            let vb = format!("{base}.volume.{j}");
            f.str(format!("{vb}.name"), &v.name);
            f.str(format!("{vb}.mount_path"), &v.mount_path);
            f.put(format!("{vb}.read_only"), AttrValue::Bool(v.read_only));
            if let Some(share) = &v.share_name {
                f.str(format!("{vb}.share_name"), share);
            }
            if let Some(account) = &v.storage_account_name {
                f.str(format!("{vb}.storage_account_name"), account);
            }
            f.secret(format!("{vb}.storage_account_key"), AttrValue::Redacted);
        }
    }

    f.count("image_registry_credential", '#', state.registry_credentials.len());
    for (i, cred) in state.registry_credentials.iter().enumerate() {
        let base = format!("image_registry_credential.{i}");
        f.str(format!("{base}.server"), &cred.server);
        f.str(format!("{base}.username"), &cred.username);
        f.secret(format!("{base}.password"), AttrValue::Redacted);
    }

    f.attrs
}

/// Flatten declared state. Secrets are in clear; provider-assigned fields
/// (`id`, `ip_address`, `fqdn`, `provisioning_state`) are absent.
pub fn flatten_spec(spec: &ResourceSpec) -> Attributes {
    flatten_declared(spec).attrs
}

fn flatten_declared(spec: &ResourceSpec) -> Flat {
    let mut f = Flat::default();

    f.str("name", &spec.name);
    f.str("resource_group_name", &spec.resource_group);
    f.str("location", &spec.location);
    f.str("os_type", &spec.os_type.to_string());
    f.str("restart_policy", &spec.restart_policy.to_string());

    if let Some(net) = &spec.network {
        f.str("ip_address_type", if net.public_ip { "Public" } else { "Private" });
        if let Some(label) = &net.dns_name_label {
            f.str("dns_name_label", label);
        }
    }

    flatten_tags(&mut f, &spec.tags);

    f.count("container", '#', spec.containers.len());
    for (i, c) in spec.containers.iter().enumerate() {
        let base = format!("container.{i}");
        f.str(format!("{base}.name"), &c.name);
        f.str(format!("{base}.image"), &c.image);
        f.put(format!("{base}.cpu"), AttrValue::Quantity(c.cpu));
        f.put(format!("{base}.memory"), AttrValue::Quantity(c.memory));

        flatten_ports(&mut f, &base, c.ports.iter().map(|p| (p.port, p.protocol.to_string())));
        flatten_commands(&mut f, &base, &c.commands);

        f.count(&format!("{base}.environment_variables"), '%', c.environment_variables.len());
        for (k, v) in &c.environment_variables {
            f.str(format!("{base}.environment_variables.{k}"), v);
        }
        f.count(
            &format!("{base}.secure_environment_variables"),
            '%',
            c.secure_environment_variables.len(),
        );
        for (k, v) in &c.secure_environment_variables {
            f.secret(
                format!("{base}.secure_environment_variables.{k}"),
                AttrValue::Str(v.expose().to_string()),
            );
        }

        f.count(&format!("{base}.volume"), '#', c.volumes.len());
        for (j, v) in c.volumes.iter().enumerate() {
            let vb = format!("{base}.volume.{j}");
            f.str(format!("{vb}.name"), &v.name);
            f.str(format!("{vb}.mount_path"), &v.mount_path);
            f.put(format!("{vb}.read_only"), AttrValue::Bool(v.read_only));
            f.str(format!("{vb}.share_name"), &v.share.share_name);
            f.str(format!("{vb}.storage_account_name"), &v.share.storage_account_name);
            f.secret(
                format!("{vb}.storage_account_key"),
                AttrValue::Str(v.share.storage_account_key.expose().to_string()),
            );
        }
    }

    f.count("image_registry_credential", '#', spec.registry_credentials.len());
    for (i, cred) in spec.registry_credentials.iter().enumerate() {
        let base = format!("image_registry_credential.{i}");
        f.str(format!("{base}.server"), &cred.server);
        f.str(format!("{base}.username"), &cred.username);
        f.secret(format!("{base}.password"), AttrValue::Str(cred.password.expose().to_string()));
    }

    f
}

/// Paths of `spec` whose values are secret.
pub(crate) fn secret_paths(spec: &ResourceSpec) -> BTreeSet<String> {
    flatten_declared(spec).secrets
}

/// The attribute set as it stands right after an apply: what the provider
/// reports, plus the secrets the apply supplied. A re-read by identity alone
/// cannot recover those secrets, so they differ from it unless exempted.
pub fn applied_attributes(spec: &ResourceSpec, observed: &ObservedState) -> Attributes {
    let mut attrs = flatten(observed);
    let declared = flatten_declared(spec);
    for path in &declared.secrets {
        if let Some(value) = declared.attrs.get(path) {
            attrs.insert(path.clone(), value.clone());
        }
    }
    attrs
}

fn flatten_tags(f: &mut Flat, tags: &BTreeMap<String, String>) {
    f.count("tags", '%', tags.len());
    for (k, v) in tags {
        f.str(format!("tags.{k}"), v);
    }
}

fn flatten_ports(f: &mut Flat, base: &str, ports: impl ExactSizeIterator<Item = (u16, String)>) {
    f.count(&format!("{base}.ports"), '#', ports.len());
    for (j, (port, protocol)) in ports.enumerate() {
        f.put(format!("{base}.ports.{j}.port"), AttrValue::Int(i64::from(port)));
        f.put(format!("{base}.ports.{j}.protocol"), AttrValue::Str(protocol));
    }
}

fn flatten_commands(f: &mut Flat, base: &str, commands: &[String]) {
    f.count(&format!("{base}.commands"), '#', commands.len());
    for (k, cmd) in commands.iter().enumerate() {
        f.str(format!("{base}.commands.{k}"), cmd);
    }
    if !commands.is_empty() {
        f.str(format!("{base}.command"), &commands.join(" "));
    }
}
