use thiserror::Error;

#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("unknown fixture '{0}'")]
    UnknownFixture(String),

    #[error("invalid fixture parameter {param}: {message}")]
    InvalidParam { param: String, message: String },

    #[error("invalid container group spec in fixture '{fixture}': {source}")]
    InvalidSpec {
        fixture: String,
        #[source]
        source: acctest_domain::DomainError,
    },

    #[error("domain error: {0}")]
    Domain(#[from] acctest_domain::DomainError),
}
