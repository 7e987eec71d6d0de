use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("yaml parse error in {path}: {source}")]
    YamlParse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("conversion error in {path}: {message}")]
    Conversion { path: String, message: String },

    #[error("fixture error in {path}: {source}")]
    Fixture {
        path: String,
        #[source]
        source: acctest_fixture::FixtureError,
    },

    #[error("unknown test case '{0}'")]
    UnknownCase(String),

    #[error("missing required environment variable(s): {}", .0.join(", "))]
    MissingEnv(Vec<String>),

    #[error("acceptance tests skipped unless env 'TF_ACC' set")]
    AccDisabled,
}
