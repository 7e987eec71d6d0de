use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "acctest",
    about = "Lifecycle acceptance tests for container groups",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run test cases: apply each step, check, import-verify, tear down.
    Run {
        /// Directory of case files. Defaults to the built-in suite.
        #[arg(long)]
        suite: Option<PathBuf>,

        /// Only run these cases (repeatable).
        #[arg(long = "case")]
        cases: Vec<String>,

        /// Sequences in flight at once.
        #[arg(long, default_value_t = 4)]
        concurrency: usize,

        /// Reads used to confirm a deleted group is gone.
        #[arg(long, default_value_t = 1)]
        confirm_attempts: u32,

        /// Seconds between confirmation reads.
        #[arg(long, default_value_t = 10)]
        poll_interval: u64,

        /// Report format.
        #[arg(long, default_value = "text")]
        output: OutputFormat,

        #[command(flatten)]
        backend: BackendArgs,
    },

    /// Print the document a fixture renders to.
    Render {
        /// Catalog fixture name.
        fixture: String,

        /// Disambiguator substituted into resource names.
        #[arg(long, default_value_t = 0)]
        ri: u32,

        #[arg(long, env = "ARM_TEST_LOCATION", default_value = "westus")]
        location: String,
    },

    /// List built-in cases and catalog fixtures.
    List,

    /// Confirm a container group no longer exists.
    CheckDestroy {
        #[arg(long)]
        resource_group: String,

        #[arg(long)]
        name: String,

        #[command(flatten)]
        backend: BackendArgs,
    },
}

#[derive(Debug, Clone, Args)]
pub struct BackendArgs {
    /// Where resources are created.
    #[arg(long, default_value = "local")]
    pub backend: BackendArg,

    /// Terraform workspaces, one per identity (azure backend).
    #[arg(long, default_value = ".acctest")]
    pub workspace: PathBuf,

    /// `terraform` or `tofu`.
    #[arg(long, env = "ACCTEST_TF_BINARY", default_value = "terraform")]
    pub terraform_bin: String,

    #[arg(long, env = "ARM_SUBSCRIPTION_ID")]
    pub subscription_id: Option<String>,

    #[arg(long, env = "ARM_TENANT_ID")]
    pub tenant_id: Option<String>,

    #[arg(long, env = "ARM_CLIENT_ID")]
    pub client_id: Option<String>,

    #[arg(long, env = "ARM_CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: Option<String>,

    #[arg(long, env = "ARM_TEST_LOCATION")]
    pub location: Option<String>,

    /// Must be set for live runs against Azure.
    #[arg(long, env = "TF_ACC", hide = true)]
    pub tf_acc: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackendArg {
    /// In-memory simulated provider.
    Local,
    /// Azure Resource Manager plus Terraform.
    Azure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}
