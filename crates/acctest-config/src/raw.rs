use acctest_compare::Check;
use acctest_domain::ResourceSpec;
use serde::{Deserialize, Serialize};

/// Raw YAML representation of one test case file (`<suite>/<case>.yml`)
#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RawCase {
    /// Defaults to the file stem.
    pub name: Option<String>,
    /// Overrides the location for every catalog fixture in this case.
    pub location: Option<String>,
    pub steps: Vec<RawStep>,
}

/// One step. Exactly one of `fixture` or `spec` declares the desired state;
/// a step carrying only `import_verify` applies to the step before it.
#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RawStep {
    /// Catalog fixture name.
    pub fixture: Option<String>,
    /// Inline container group, used verbatim.
    pub spec: Option<ResourceSpec>,
    #[serde(default)]
    pub checks: Vec<Check>,
    #[serde(default)]
    pub match_declared: bool,
    pub import_verify: Option<RawImportVerify>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RawImportVerify {
    #[serde(default)]
    pub ignore: Vec<String>,
}
