use crate::error::ConfigError;

pub const ENV_SUBSCRIPTION_ID: &str = "ARM_SUBSCRIPTION_ID";
pub const ENV_TENANT_ID: &str = "ARM_TENANT_ID";
pub const ENV_CLIENT_ID: &str = "ARM_CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "ARM_CLIENT_SECRET";
pub const ENV_TEST_LOCATION: &str = "ARM_TEST_LOCATION";
pub const ENV_TF_ACC: &str = "TF_ACC";

/// Operator settings for live acceptance runs.
#[derive(Clone, Default)]
pub struct AccConfig {
    pub subscription_id: Option<String>,
    pub tenant_id: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub location: Option<String>,
    /// Live runs only proceed when `TF_ACC` is set.
    pub acc_enabled: bool,
}

impl std::fmt::Debug for AccConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccConfig")
            .field("subscription_id", &self.subscription_id)
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "<redacted>"))
            .field("location", &self.location)
            .field("acc_enabled", &self.acc_enabled)
            .finish()
    }
}

impl AccConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        AccConfig {
            subscription_id: get(ENV_SUBSCRIPTION_ID),
            tenant_id: get(ENV_TENANT_ID),
            client_id: get(ENV_CLIENT_ID),
            client_secret: get(ENV_CLIENT_SECRET),
            location: get(ENV_TEST_LOCATION),
            acc_enabled: get(ENV_TF_ACC).is_some(),
        }
    }

    /// Fail before any remote call when the run cannot possibly succeed:
    /// `TF_ACC` unset, or any required `ARM_*` variable missing. All missing
    /// variables are reported at once.
    pub fn precheck(&self) -> Result<(), ConfigError> {
        if !self.acc_enabled {
            return Err(ConfigError::AccDisabled);
        }
        let missing: Vec<String> = [
            (ENV_SUBSCRIPTION_ID, &self.subscription_id),
            (ENV_CLIENT_ID, &self.client_id),
            (ENV_CLIENT_SECRET, &self.client_secret),
            (ENV_TENANT_ID, &self.tenant_id),
            (ENV_TEST_LOCATION, &self.location),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_none())
        .map(|(key, _)| key.to_string())
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::MissingEnv(missing))
        }
    }
}
