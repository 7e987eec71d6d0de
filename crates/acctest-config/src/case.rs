use std::collections::BTreeSet;

use acctest_compare::Check;
use acctest_domain::ResourceIdentity;
use acctest_fixture::Fixture;
use serde::{Deserialize, Serialize};

/// Re-read the resource by identity alone and require the result to match
/// what the step applied, except for the listed attribute paths.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportVerify {
    #[serde(default)]
    pub ignore: BTreeSet<String>,
}

impl ImportVerify {
    pub fn ignoring<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ImportVerify { ignore: paths.into_iter().map(Into::into).collect() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestStep {
    pub fixture: Fixture,
    #[serde(default)]
    pub checks: Vec<Check>,
    /// Also assert every attribute the fixture declares.
    #[serde(default)]
    pub match_declared: bool,
    #[serde(default)]
    pub import_verify: Option<ImportVerify>,
}

impl TestStep {
    pub fn new(fixture: Fixture) -> Self {
        TestStep { fixture, checks: Vec::new(), match_declared: false, import_verify: None }
    }

    pub fn with_checks(mut self, checks: impl IntoIterator<Item = Check>) -> Self {
        self.checks.extend(checks);
        self
    }

    pub fn with_import_verify(mut self, verify: ImportVerify) -> Self {
        self.import_verify = Some(verify);
        self
    }
}

/// An ordered sequence of steps against one resource identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    pub name: String,
    pub steps: Vec<TestStep>,
}

impl TestCase {
    pub fn new(name: impl Into<String>, steps: Vec<TestStep>) -> Self {
        TestCase { name: name.into(), steps }
    }

    /// Identity targeted by the first step.
    pub fn identity(&self) -> Option<ResourceIdentity> {
        self.steps.first().map(|s| s.fixture.identity())
    }
}
