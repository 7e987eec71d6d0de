use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use acctest_config::{builtin_suite, load_suite, AccConfig, TestCase, BUILTIN_CASES};
use acctest_domain::ResourceIdentity;
use acctest_fixture::{catalog, render as render_fixture, FixtureParams};
use acctest_lifecycle::{run_all, LifecycleDriver, TeardownPolicy};
use acctest_provider::{
    ApplyEngine, AzureConfig, AzureContainerClient, LocalCloud, ProviderClient, TerraformConfig,
    TerraformEngine,
};
use anyhow::{Context, Result};
use tracing::info;

use crate::cli::{BackendArg, BackendArgs, OutputFormat};
use crate::output;

const DEFAULT_LOCATION: &str = "westus";

// ── Backend ───────────────────────────────────────────────────────────────────

struct Backend {
    client: Arc<dyn ProviderClient>,
    engine: Arc<dyn ApplyEngine>,
    location: String,
}

fn backend(args: &BackendArgs) -> Result<Backend> {
    match args.backend {
        BackendArg::Local => {
            let cloud = Arc::new(LocalCloud::new());
            Ok(Backend {
                client: cloud.clone(),
                engine: cloud,
                location: args.location.clone().unwrap_or_else(|| DEFAULT_LOCATION.into()),
            })
        }
        BackendArg::Azure => {
            let acc = AccConfig {
                subscription_id: args.subscription_id.clone(),
                tenant_id: args.tenant_id.clone(),
                client_id: args.client_id.clone(),
                client_secret: args.client_secret.clone(),
                location: args.location.clone(),
                acc_enabled: args.tf_acc.as_deref().is_some_and(|v| !v.trim().is_empty()),
            };
            acc.precheck().context("Live runs need the Azure environment")?;

            let subscription_id = acc.subscription_id.clone().context("ARM_SUBSCRIPTION_ID is required")?;
            let tenant_id = acc.tenant_id.clone().context("ARM_TENANT_ID is required")?;
            let location = acc.location.clone().context("ARM_TEST_LOCATION is required")?;

            let mut tf = TerraformConfig::new(args.workspace.clone());
            tf.binary = args.terraform_bin.clone();
            for (key, value) in [
                ("ARM_SUBSCRIPTION_ID", &acc.subscription_id),
                ("ARM_TENANT_ID", &acc.tenant_id),
                ("ARM_CLIENT_ID", &acc.client_id),
                ("ARM_CLIENT_SECRET", &acc.client_secret),
            ] {
                if let Some(v) = value {
                    tf.env.insert(key.to_string(), v.clone());
                }
            }

            info!(subscription = %subscription_id, %location, workspace = %args.workspace.display(), "Using Azure backend");
            let client = AzureContainerClient::new(AzureConfig {
                subscription_id,
                tenant_id,
                client_id: acc.client_id,
                client_secret: acc.client_secret,
            });
            Ok(Backend {
                client: Arc::new(client),
                engine: Arc::new(TerraformEngine::new(tf)),
                location,
            })
        }
    }
}

// ── Run ───────────────────────────────────────────────────────────────────────

pub async fn run(
    suite: Option<PathBuf>,
    only: Vec<String>,
    concurrency: usize,
    confirm_attempts: u32,
    poll_interval: u64,
    format: OutputFormat,
    backend_args: BackendArgs,
) -> Result<()> {
    let backend = backend(&backend_args)?;

    let cases = match &suite {
        Some(dir) => load_suite(dir, &backend.location)
            .with_context(|| format!("Failed to load suite from {}", dir.display()))?,
        None => builtin_suite(&backend.location).context("Failed to build the built-in suite")?,
    };
    let cases = select(cases, &only)?;

    let driver = LifecycleDriver::new(
        backend.client,
        backend.engine,
        TeardownPolicy {
            confirm_attempts,
            poll_interval: Duration::from_secs(poll_interval),
        },
    );
    let report = run_all(&driver, cases, concurrency).await?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => print!("{}", output::render_run(&report)),
    }

    let failed = report.failed().count();
    if failed > 0 {
        anyhow::bail!("{} of {} sequence(s) failed", failed, report.sequences.len());
    }
    Ok(())
}

fn select(cases: Vec<TestCase>, only: &[String]) -> Result<Vec<TestCase>> {
    if only.is_empty() {
        return Ok(cases);
    }
    if let Some(unknown) = only.iter().find(|name| !cases.iter().any(|c| &c.name == *name)) {
        anyhow::bail!("No case named '{}'", unknown);
    }
    Ok(cases.into_iter().filter(|c| only.contains(&c.name)).collect())
}

// ── Render / List ─────────────────────────────────────────────────────────────

pub fn render(fixture: String, ri: u32, location: String) -> Result<()> {
    let fixture = catalog::by_name(&fixture, &FixtureParams::new(ri, location))?;
    print!("{}", render_fixture(&fixture)?);
    Ok(())
}

pub fn list() -> Result<()> {
    println!("Cases:");
    for name in BUILTIN_CASES {
        println!("  {}", name);
    }
    println!("Fixtures:");
    for name in catalog::NAMES {
        println!("  {}", name);
    }
    Ok(())
}

// ── Check destroy ─────────────────────────────────────────────────────────────

pub async fn check_destroy(resource_group: String, name: String, backend_args: BackendArgs) -> Result<()> {
    let backend = backend(&backend_args)?;
    let identity = ResourceIdentity::new(resource_group, name);
    let driver = LifecycleDriver::new(backend.client, backend.engine, TeardownPolicy::default());

    driver
        .confirm_absent(&identity)
        .await
        .with_context(|| format!("{} was not destroyed", identity))?;
    println!("{} is absent", identity);
    Ok(())
}
