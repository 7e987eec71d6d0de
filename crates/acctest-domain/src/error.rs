use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("field '{0}' must not be empty")]
    EmptyField(String),

    #[error("container group '{0}' declares no containers")]
    NoContainers(String),

    #[error("duplicate container name: {0}")]
    DuplicateContainer(String),

    #[error("invalid port {port} on container '{container}': must be in 1..=65535")]
    InvalidPort { container: String, port: i64 },

    #[error("invalid quantity '{0}': expected a positive decimal such as \"0.5\"")]
    InvalidQuantity(String),

    #[error("invalid protocol: {0}")]
    InvalidProtocol(String),

    #[error("invalid os type: {0}")]
    InvalidOsType(String),

    #[error("invalid restart policy: {0}")]
    InvalidRestartPolicy(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
