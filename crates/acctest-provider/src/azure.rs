use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use acctest_domain::{
    ObservedContainer, ObservedCredential, ObservedIp, ObservedState, ObservedVolume, OsType,
    PortSpec, Protocol, Quantity, ResourceIdentity, RestartPolicy,
};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::client::ProviderClient;
use crate::error::ProviderError;

const API_VERSION: &str = "2018-04-01";

// ── Configuration ─────────────────────────────────────────────────────────────

/// Operator-level settings for the ARM client, normally taken from the
/// `ARM_*` environment variables.
#[derive(Clone)]
pub struct AzureConfig {
    pub subscription_id: String,
    pub tenant_id: String,
    /// Service principal client ID (optional; falls back to the Azure CLI).
    pub client_id: Option<String>,
    /// Service principal client secret (optional; falls back to the Azure CLI).
    pub client_secret: Option<String>,
}

// ── Base URLs (overridden in tests) ───────────────────────────────────────────

#[derive(Clone)]
pub(crate) struct BaseUrls {
    management: String,
    login:      String,
}

impl Default for BaseUrls {
    fn default() -> Self {
        Self {
            management: "https://management.azure.com".into(),
            login:      "https://login.microsoftonline.com".into(),
        }
    }
}

// ── Token provider ────────────────────────────────────────────────────────────

/// Source of ARM bearer tokens.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn token(&self) -> Result<String, ProviderError>;
}

struct ServicePrincipalTokenProvider {
    tenant_id:     String,
    client_id:     String,
    client_secret: String,
    login_base:    String,
    client:        reqwest::Client,
    cache:         Mutex<Option<(String, Instant)>>,
}

#[async_trait]
impl TokenProvider for ServicePrincipalTokenProvider {
    async fn token(&self) -> Result<String, ProviderError> {
        {
            let guard = self.cache.lock().await;
            if let Some((tok, expiry)) = guard.as_ref() {
                if Instant::now() < *expiry {
                    return Ok(tok.clone());
                }
            }
        }

        let url = format!("{}/{}/oauth2/v2.0/token", self.login_base, self.tenant_id);
        let params = [
            ("grant_type", "client_credentials"),
            ("client_id", &self.client_id),
            ("client_secret", &self.client_secret),
            ("scope", "https://management.azure.com/.default"),
        ];
        let resp: Value = self
            .client
            .post(&url)
            .form(&params)
            .send()
            .await
            .map_err(|e| ProviderError::Auth(format!("SP token request: {}", e)))?
            .json()
            .await
            .map_err(|e| ProviderError::Auth(format!("SP token decode: {}", e)))?;

        let tok = resp["access_token"]
            .as_str()
            .ok_or_else(|| ProviderError::Auth(format!("SP token: no access_token in response: {}", resp)))?
            .to_string();
        let expires_in = resp["expires_in"].as_u64().unwrap_or(3600);
        let expiry = Instant::now() + Duration::from_secs(expires_in.saturating_sub(60));

        *self.cache.lock().await = Some((tok.clone(), expiry));
        Ok(tok)
    }
}

struct AzureCliTokenProvider {
    tenant_id: String,
}

#[async_trait]
impl TokenProvider for AzureCliTokenProvider {
    async fn token(&self) -> Result<String, ProviderError> {
        let output = tokio::process::Command::new("az")
            .args([
                "account",
                "get-access-token",
                "--resource",
                "https://management.azure.com",
                "--tenant",
                &self.tenant_id,
                "--output",
                "json",
            ])
            .output()
            .await
            .map_err(|e| ProviderError::Auth(format!("az CLI not found: {}. Install Azure CLI or set ARM_CLIENT_ID/ARM_CLIENT_SECRET.", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ProviderError::Auth(format!(
                "az account get-access-token failed: {}. Run 'az login' first.",
                stderr.trim()
            )));
        }

        let resp: Value = serde_json::from_slice(&output.stdout)
            .map_err(|e| ProviderError::Auth(format!("az CLI output parse: {}", e)))?;
        let tok = resp["accessToken"]
            .as_str()
            .ok_or_else(|| ProviderError::Auth("az CLI: no accessToken in output".into()))?
            .to_string();
        Ok(tok)
    }
}

/// A fixed bearer token.
#[cfg(test)]
struct StaticToken(String);

#[cfg(test)]
#[async_trait]
impl TokenProvider for StaticToken {
    async fn token(&self) -> Result<String, ProviderError> {
        Ok(self.0.clone())
    }
}

// ── AzureContainerClient ──────────────────────────────────────────────────────

/// Reads and deletes `Microsoft.ContainerInstance/containerGroups` through
/// the ARM REST API.
pub struct AzureContainerClient {
    config: AzureConfig,
    client: reqwest::Client,
    token:  Box<dyn TokenProvider>,
    base:   BaseUrls,
}

impl AzureContainerClient {
    /// Create a client, auto-selecting the token provider:
    /// 1. `client_id` + `client_secret` in config → Service Principal
    /// 2. Otherwise → Azure CLI (`az account get-access-token`)
    pub fn new(config: AzureConfig) -> Self {
        let client = reqwest::Client::new();
        let base   = BaseUrls::default();

        let token: Box<dyn TokenProvider> = match (config.client_id.as_deref(), config.client_secret.as_deref()) {
            (Some(cid), Some(cs)) => Box::new(ServicePrincipalTokenProvider {
                tenant_id:     config.tenant_id.clone(),
                client_id:     cid.to_string(),
                client_secret: cs.to_string(),
                login_base:    base.login.clone(),
                client:        client.clone(),
                cache:         Mutex::new(None),
            }),
            _ => Box::new(AzureCliTokenProvider {
                tenant_id: config.tenant_id.clone(),
            }),
        };

        Self { config, client, token, base }
    }

    #[cfg(test)]
    pub(crate) fn with_static_token(config: AzureConfig, token: &str, base: BaseUrls) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
            token:  Box::new(StaticToken(token.to_string())),
            base,
        }
    }

    fn group_url(&self, identity: &ResourceIdentity) -> String {
        format!(
            "{}/subscriptions/{}/resourceGroups/{}/providers/Microsoft.ContainerInstance/containerGroups/{}?api-version={}",
            self.base.management,
            self.config.subscription_id,
            identity.resource_group,
            identity.name,
            API_VERSION,
        )
    }

    // ── ARM error parsing ─────────────────────────────────────────────────────

    fn parse_arm_error(body: &Value) -> String {
        let err = body
            .get("error")
            .or_else(|| body.get("Error"))
            .unwrap_or(body);
        let code    = err["code"].as_str().unwrap_or("Unknown");
        let message = err["message"].as_str().unwrap_or("unknown error");
        format!("{}: {}", code, message)
    }

    // ── ARM async polling ─────────────────────────────────────────────────────

    /// Poll an ARM async operation URL until it completes or times out.
    ///
    /// Backoff: `[1, 2, 4, 8, 16, 30]` cycling, max 120 polls.
    async fn wait_for_operation(&self, op_url: &str) -> Result<Value, ProviderError> {
        let token  = self.token.token().await?;
        let delays = [1u64, 2, 4, 8, 16, 30];
        let max_polls = 120;

        for (i, &delay) in delays.iter().cycle().take(max_polls).enumerate() {
            let resp = self
                .client
                .get(op_url)
                .bearer_auth(&token)
                .send()
                .await
                .map_err(|e| ProviderError::Transport(format!("poll {}: {}", op_url, e)))?;

            let body: Value = resp
                .json()
                .await
                .map_err(|e| ProviderError::Decode(format!("poll {}: {}", op_url, e)))?;

            let status = body["status"].as_str().unwrap_or("Unknown");
            match status {
                "Succeeded" => return Ok(body),
                "Failed" | "Canceled" => {
                    return Err(ProviderError::OperationFailed {
                        status: status.to_string(),
                        message: Self::parse_arm_error(&body),
                    });
                }
                _ => {}
            }

            let poll = i + 1;
            if poll % 10 == 0 {
                info!(poll, op_url, "still waiting for ARM operation");
            } else {
                debug!(poll, op_url, delay, "ARM operation pending, waiting");
            }
            tokio::time::sleep(Duration::from_secs(delay)).await;
        }

        Err(ProviderError::Internal(format!(
            "ARM operation timed out after {} polls: {}",
            max_polls, op_url
        )))
    }

    // ── ARM HTTP verbs ────────────────────────────────────────────────────────

    async fn arm_get(&self, url: &str) -> Result<(u16, Value), ProviderError> {
        let token = self.token.token().await?;
        debug!(url, "ARM GET");
        let resp = self
            .client
            .get(url)
            .bearer_auth(&token)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(format!("GET {}: {}", url, e)))?;

        let status = resp.status().as_u16();
        let body: Value = resp.json().await.unwrap_or(Value::Null);
        Ok((status, body))
    }

    async fn arm_delete(&self, url: &str) -> Result<(), ProviderError> {
        let token = self.token.token().await?;
        debug!(url, "ARM DELETE");
        let resp = self
            .client
            .delete(url)
            .bearer_auth(&token)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(format!("DELETE {}: {}", url, e)))?;

        let status = resp.status().as_u16();
        if status == 202 {
            if let Some(op_url) = resp
                .headers()
                .get("Azure-AsyncOperation")
                .or_else(|| resp.headers().get("Location"))
                .and_then(|v| v.to_str().ok())
                .map(|s| s.to_string())
            {
                self.wait_for_operation(&op_url).await?;
            }
            return Ok(());
        }
        if status == 404 || (200..300).contains(&status) {
            return Ok(());
        }

        let body: Value = resp.json().await.unwrap_or(Value::Null);
        Err(ProviderError::Api { status, message: Self::parse_arm_error(&body) })
    }
}

#[async_trait]
impl ProviderClient for AzureContainerClient {
    fn name(&self) -> &'static str {
        "azure"
    }

    async fn get(&self, identity: &ResourceIdentity) -> Result<Option<ObservedState>, ProviderError> {
        let (status, body) = self.arm_get(&self.group_url(identity)).await?;
        match status {
            404 => {
                debug!(%identity, "container group not found");
                Ok(None)
            }
            200..=299 => parse_container_group(identity, body).map(Some),
            _ => Err(ProviderError::Api { status, message: Self::parse_arm_error(&body) }),
        }
    }

    async fn delete(&self, identity: &ResourceIdentity) -> Result<(), ProviderError> {
        info!(%identity, "deleting container group");
        self.arm_delete(&self.group_url(identity)).await
    }
}

// ── ARM payload ───────────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ArmContainerGroup {
    id: String,
    location: String,
    #[serde(default)]
    tags: BTreeMap<String, String>,
    properties: ArmGroupProperties,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ArmGroupProperties {
    #[serde(default)]
    provisioning_state: Option<String>,
    os_type: String,
    #[serde(default)]
    restart_policy: Option<String>,
    #[serde(default)]
    ip_address: Option<ArmIpAddress>,
    #[serde(default)]
    image_registry_credentials: Vec<ArmCredential>,
    #[serde(default)]
    containers: Vec<ArmContainer>,
    #[serde(default)]
    volumes: Vec<ArmVolume>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ArmIpAddress {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    ip: Option<String>,
    #[serde(default)]
    dns_name_label: Option<String>,
    #[serde(default)]
    fqdn: Option<String>,
}

#[derive(Deserialize)]
struct ArmCredential {
    server: String,
    username: String,
}

#[derive(Deserialize)]
struct ArmContainer {
    name: String,
    properties: ArmContainerProperties,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ArmContainerProperties {
    image: String,
    #[serde(default)]
    command: Vec<String>,
    #[serde(default)]
    ports: Vec<ArmPort>,
    #[serde(default)]
    environment_variables: Vec<ArmEnvVar>,
    resources: ArmResources,
    #[serde(default)]
    volume_mounts: Vec<ArmVolumeMount>,
}

#[derive(Deserialize)]
struct ArmPort {
    port: u16,
    #[serde(default)]
    protocol: Option<String>,
}

#[derive(Deserialize)]
struct ArmEnvVar {
    name: String,
    #[serde(default)]
    value: Option<String>,
}

#[derive(Deserialize)]
struct ArmResources {
    requests: ArmRequests,
}

#[derive(Deserialize)]
struct ArmRequests {
    cpu: f64,
    #[serde(rename = "memoryInGB")]
    memory_in_gb: f64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ArmVolumeMount {
    name: String,
    mount_path: String,
    #[serde(default)]
    read_only: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ArmVolume {
    name: String,
    #[serde(default)]
    azure_file: Option<ArmAzureFile>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ArmAzureFile {
    share_name: String,
    storage_account_name: String,
}

/// Convert an ARM container group body into observed state. Environment
/// variables without a value are secure ones; only their names survive.
fn parse_container_group(identity: &ResourceIdentity, body: Value) -> Result<ObservedState, ProviderError> {
    let group: ArmContainerGroup = serde_json::from_value(body)
        .map_err(|e| ProviderError::Decode(format!("container group {}: {}", identity, e)))?;
    let props = group.properties;
    let decode = |e: acctest_domain::DomainError| ProviderError::Decode(format!("container group {}: {}", identity, e));

    let os_type: OsType = props.os_type.parse().map_err(decode)?;
    let restart_policy: RestartPolicy = match &props.restart_policy {
        Some(p) => p.parse().map_err(decode)?,
        None => RestartPolicy::default(),
    };

    let mut containers = Vec::with_capacity(props.containers.len());
    for c in props.containers {
        let p = c.properties;
        let mut ports = Vec::with_capacity(p.ports.len());
        for port in p.ports {
            let protocol: Protocol = match &port.protocol {
                Some(s) => s.parse().map_err(decode)?,
                None => Protocol::default(),
            };
            ports.push(PortSpec { port: port.port, protocol });
        }

        let mut environment_variables = BTreeMap::new();
        let mut secure_environment_variable_names = Vec::new();
        for var in p.environment_variables {
            match var.value {
                Some(v) => {
                    environment_variables.insert(var.name, v);
                }
                None => secure_environment_variable_names.push(var.name),
            }
        }
        secure_environment_variable_names.sort();

        let volumes = p
            .volume_mounts
            .into_iter()
            .map(|m| {
                let share = props
                    .volumes
                    .iter()
                    .find(|v| v.name == m.name)
                    .and_then(|v| v.azure_file.as_ref());
                ObservedVolume {
                    share_name: share.map(|s| s.share_name.clone()),
                    storage_account_name: share.map(|s| s.storage_account_name.clone()),
                    name: m.name,
                    mount_path: m.mount_path,
                    read_only: m.read_only,
                }
            })
            .collect();

        containers.push(ObservedContainer {
            name: c.name,
            image: p.image,
            cpu: Quantity::from_f64(p.resources.requests.cpu).map_err(decode)?,
            memory: Quantity::from_f64(p.resources.requests.memory_in_gb).map_err(decode)?,
            ports,
            commands: p.command,
            environment_variables,
            secure_environment_variable_names,
            volumes,
        });
    }

    let ip_address = props.ip_address.map(|ip| ObservedIp {
        public: ip.kind.eq_ignore_ascii_case("public"),
        ip: ip.ip,
        dns_name_label: ip.dns_name_label,
        fqdn: ip.fqdn,
    });

    Ok(ObservedState {
        identity: identity.clone(),
        id: group.id,
        location: group.location,
        os_type,
        restart_policy,
        ip_address,
        provisioning_state: props.provisioning_state.unwrap_or_default(),
        containers,
        registry_credentials: props
            .image_registry_credentials
            .into_iter()
            .map(|c| ObservedCredential { server: c.server, username: c.username })
            .collect(),
        tags: group.tags,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::{
        matchers::{header, method, path, query_param},
        Mock, MockServer, ResponseTemplate,
    };

    const SUB: &str = "00000000-0000-0000-0000-000000000001";

    fn test_config() -> AzureConfig {
        AzureConfig {
            subscription_id: SUB.into(),
            tenant_id:       "test-tenant-id".into(),
            client_id:       None,
            client_secret:   None,
        }
    }

    fn test_base(url: &str) -> BaseUrls {
        BaseUrls {
            management: url.to_string(),
            login:      url.to_string(),
        }
    }

    fn client(server: &MockServer) -> AzureContainerClient {
        AzureContainerClient::with_static_token(test_config(), "fake-token", test_base(&server.uri()))
    }

    fn identity() -> ResourceIdentity {
        ResourceIdentity::new("acctestRG-1", "acctestcontainergroup-1")
    }

    fn group_path() -> String {
        format!(
            "/subscriptions/{}/resourceGroups/acctestRG-1/providers/Microsoft.ContainerInstance/containerGroups/acctestcontainergroup-1",
            SUB
        )
    }

    fn group_body() -> Value {
        json!({
            "id": group_path(),
            "name": "acctestcontainergroup-1",
            "location": "westus",
            "tags": { "environment": "Testing" },
            "properties": {
                "provisioningState": "Succeeded",
                "osType": "Linux",
                "restartPolicy": "OnFailure",
                "ipAddress": {
                    "type": "Public",
                    "ip": "52.1.2.3",
                    "dnsNameLabel": "acctestcontainergroup-1",
                    "fqdn": "acctestcontainergroup-1.westus.azurecontainer.io",
                    "ports": [{ "protocol": "UDP", "port": 5443 }]
                },
                "imageRegistryCredentials": [
                    { "server": "hub.docker.com", "username": "yourusername" },
                    { "server": "mine.acr.io", "username": "acrusername" }
                ],
                "containers": [{
                    "name": "hw",
                    "properties": {
                        "image": "microsoft/aci-helloworld:latest",
                        "command": ["/bin/bash", "-c", "ls"],
                        "ports": [{ "port": 5443, "protocol": "UDP" }],
                        "environmentVariables": [
                            { "name": "foo", "value": "bar" },
                            { "name": "secureFoo" }
                        ],
                        "resources": { "requests": { "cpu": 0.5, "memoryInGB": 1.5 } },
                        "volumeMounts": [{ "name": "logs", "mountPath": "/aci/logs", "readOnly": false }]
                    }
                }],
                "volumes": [{
                    "name": "logs",
                    "azureFile": { "shareName": "acctestss-1", "storageAccountName": "accsa1" }
                }]
            }
        })
    }

    // ── get ───────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn get_parses_container_group() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(group_path()))
            .and(query_param("api-version", API_VERSION))
            .and(header("authorization", "Bearer fake-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(group_body()))
            .mount(&server)
            .await;

        let state = client(&server).get(&identity()).await.unwrap().unwrap();
        assert_eq!(state.identity, identity());
        assert_eq!(state.os_type, OsType::Linux);
        assert_eq!(state.restart_policy, RestartPolicy::OnFailure);
        assert_eq!(state.provisioning_state, "Succeeded");
        assert_eq!(state.registry_credentials.len(), 2);

        let c = &state.containers[0];
        assert_eq!(c.ports, vec![PortSpec::udp(5443)]);
        assert_eq!(c.cpu, Quantity::parse("0.5").unwrap());
        assert_eq!(c.memory, Quantity::parse("1.5").unwrap());
        assert_eq!(c.environment_variables.get("foo").map(String::as_str), Some("bar"));
        assert_eq!(c.secure_environment_variable_names, vec!["secureFoo".to_string()]);
        assert_eq!(c.volumes[0].share_name.as_deref(), Some("acctestss-1"));

        let ip = state.ip_address.unwrap();
        assert!(ip.public);
        assert_eq!(ip.fqdn.as_deref(), Some("acctestcontainergroup-1.westus.azurecontainer.io"));
    }

    #[tokio::test]
    async fn get_not_found_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(group_path()))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "error": { "code": "ResourceNotFound", "message": "not found" }
            })))
            .mount(&server)
            .await;

        assert!(client(&server).get(&identity()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn get_server_error_is_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(group_path()))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({
                "error": { "code": "InternalServerError", "message": "boom" }
            })))
            .mount(&server)
            .await;

        let err = client(&server).get(&identity()).await.unwrap_err();
        match err {
            ProviderError::Api { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "InternalServerError: boom");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn get_malformed_body_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(group_path()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "x" })))
            .mount(&server)
            .await;

        let err = client(&server).get(&identity()).await.unwrap_err();
        assert!(matches!(err, ProviderError::Decode(_)), "got: {err:?}");
    }

    // ── delete ────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn delete_absent_group_succeeds() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path(group_path()))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        client(&server).delete(&identity()).await.unwrap();
    }

    #[tokio::test]
    async fn delete_polls_async_operation() {
        let server = MockServer::start().await;
        let op_url = format!("{}/operations/del-1", server.uri());
        Mock::given(method("DELETE"))
            .and(path(group_path()))
            .respond_with(ResponseTemplate::new(202).insert_header("Azure-AsyncOperation", op_url.as_str()))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/operations/del-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "Succeeded" })))
            .expect(1)
            .mount(&server)
            .await;

        client(&server).delete(&identity()).await.unwrap();
    }

    #[tokio::test]
    async fn delete_conflict_is_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path(group_path()))
            .respond_with(ResponseTemplate::new(409).set_body_json(json!({
                "error": { "code": "Conflict", "message": "operation in progress" }
            })))
            .mount(&server)
            .await;

        let err = client(&server).delete(&identity()).await.unwrap_err();
        assert!(matches!(err, ProviderError::Api { status: 409, .. }));
    }

    // ── wait_for_operation ────────────────────────────────────────────────────

    #[tokio::test]
    async fn wait_for_operation_fails_on_failed_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/operations/op-fail"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "Failed",
                "error": { "code": "InternalError", "message": "Something went wrong" }
            })))
            .mount(&server)
            .await;

        let c   = client(&server);
        let url = format!("{}/operations/op-fail", server.uri());
        let err = c.wait_for_operation(&url).await.unwrap_err();
        match err {
            ProviderError::OperationFailed { status, message } => {
                assert_eq!(status, "Failed");
                assert_eq!(message, "InternalError: Something went wrong");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    // ── token provider ────────────────────────────────────────────────────────

    #[tokio::test]
    async fn service_principal_token_is_cached() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/test-tenant-id/oauth2/v2.0/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "sp-token",
                "expires_in": 3600
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = ServicePrincipalTokenProvider {
            tenant_id:     "test-tenant-id".into(),
            client_id:     "cid".into(),
            client_secret: "secret".into(),
            login_base:    server.uri(),
            client:        reqwest::Client::new(),
            cache:         Mutex::new(None),
        };
        assert_eq!(provider.token().await.unwrap(), "sp-token");
        assert_eq!(provider.token().await.unwrap(), "sp-token");
    }

    // ── parse_arm_error (pure) ────────────────────────────────────────────────

    #[test]
    fn parse_arm_error_missing_fields_gives_fallback() {
        let body = json!({ "error": {} });
        assert_eq!(AzureContainerClient::parse_arm_error(&body), "Unknown: unknown error");
    }
}
