use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use acctest_fixture::Fixture;
use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::client::ApplyEngine;
use crate::error::ProviderError;

const MAIN_TF: &str = "main.tf";
const LOG_TAIL_LINES: usize = 20;

/// Settings for [`TerraformEngine`].
#[derive(Debug, Clone)]
pub struct TerraformConfig {
    /// `terraform` or `tofu`, or a path to either.
    pub binary: String,
    /// One workspace per identity is kept under this directory.
    pub workspace_root: PathBuf,
    /// Hard limit per command; the process is killed when exceeded.
    pub timeout: Duration,
    /// Extra environment for the subprocess (provider credentials).
    pub env: HashMap<String, String>,
}

impl TerraformConfig {
    pub fn new(workspace_root: impl Into<PathBuf>) -> Self {
        Self {
            binary: "terraform".into(),
            workspace_root: workspace_root.into(),
            timeout: Duration::from_secs(1800),
            env: HashMap::new(),
        }
    }
}

/// Applies rendered fixtures by invoking the `terraform` (or `tofu`) binary.
///
/// Responsibilities:
/// - Maintain a workspace under `{workspace_root}/{resource_group}/{name}/`
/// - Write `main.tf` from the provider block and the rendered document
/// - Run `init` + `apply` (or `destroy`) non-interactively
/// - Merge stdout+stderr into one log, mirrored to tracing
pub struct TerraformEngine {
    config: TerraformConfig,
}

impl TerraformEngine {
    pub fn new(config: TerraformConfig) -> Self {
        Self { config }
    }

    fn workspace_dir(&self, fixture: &Fixture) -> PathBuf {
        let id = fixture.identity();
        self.config
            .workspace_root
            .join(&id.resource_group)
            .join(&id.name)
    }

    // ── Process execution ─────────────────────────────────────────────────────

    /// Run a sub-command, capturing combined stdout+stderr.
    /// Returns (exit_code, combined_log).
    async fn run_tf(&self, workspace: &Path, args: &[&str]) -> Result<(i32, String), ProviderError> {
        let binary = self.config.binary.as_str();
        info!(binary, ?args, workspace = %workspace.display(), "running IaC command");

        let mut cmd = Command::new(binary);
        cmd.args(args)
            .current_dir(workspace)
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            // Disable interactive prompts and colour
            .env("TF_IN_AUTOMATION", "1")
            .env("TF_INPUT", "0")
            .envs(&self.config.env)
            .kill_on_drop(true);

        let mut child = cmd
            .spawn()
            .map_err(|e| ProviderError::Internal(format!("spawn {}: {}", binary, e)))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ProviderError::Internal("stdout not captured".into()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| ProviderError::Internal("stderr not captured".into()))?;

        // Merge both streams into one log; each line is also mirrored to tracing.
        let mut log = String::new();
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<String>();

        let tx1 = tx.clone();
        let stdout_task = tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                let _ = tx1.send(line);
            }
        });

        let tx2 = tx.clone();
        let stderr_task = tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                let _ = tx2.send(line);
            }
        });

        drop(tx);

        // One deadline covers both the output and the exit; a child can close
        // its pipes and keep running.
        let finish = async {
            while let Some(line) = rx.recv().await {
                debug!(target: "acctest::iac", "{}", line);
                log.push_str(&line);
                log.push('\n');
            }
            child.wait().await
        };
        let waited = tokio::time::timeout(self.config.timeout, finish).await;

        let status = match waited {
            Ok(status) => status.map_err(|e| ProviderError::Internal(format!("wait {}: {}", binary, e)))?,
            Err(_) => {
                let _ = child.kill().await;
                stdout_task.abort();
                stderr_task.abort();
                return Err(ProviderError::Internal(format!(
                    "{} {} timed out after {}s",
                    binary,
                    args.first().copied().unwrap_or(""),
                    self.config.timeout.as_secs(),
                )));
            }
        };

        stdout_task.await.ok();
        stderr_task.await.ok();

        let code = status.code().unwrap_or(-1);
        if code != 0 {
            warn!(binary, code, "IaC command exited non-zero");
        }
        Ok((code, log))
    }

    /// Run each command in order, stopping at the first non-zero exit.
    async fn run_steps(
        &self,
        workspace: &Path,
        steps: &[&[&str]],
        fail: fn(String) -> ProviderError,
    ) -> Result<(), ProviderError> {
        let mut log = String::new();
        for args in steps {
            let name = args.first().copied().unwrap_or("");
            log.push_str(&format!("=== {} {} ===\n", self.config.binary, name));
            let (code, output) = self
                .run_tf(workspace, args)
                .await
                .map_err(|e| fail(e.to_string()))?;
            log.push_str(&output);
            if code != 0 {
                return Err(fail(format!(
                    "{} {} exited with code {}:\n{}",
                    self.config.binary,
                    name,
                    code,
                    log_tail(&log, LOG_TAIL_LINES)
                )));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl ApplyEngine for TerraformEngine {
    fn name(&self) -> &'static str {
        "terraform"
    }

    async fn apply(&self, fixture: &Fixture, document: &str) -> Result<(), ProviderError> {
        let workspace = self.workspace_dir(fixture);
        tokio::fs::create_dir_all(&workspace)
            .await
            .map_err(|e| ProviderError::Internal(format!("create workspace dir: {}", e)))?;
        write_main_tf(&workspace, document)?;

        self.run_steps(
            &workspace,
            &[
                &["init", "-input=false", "-no-color"],
                &["apply", "-auto-approve", "-input=false", "-no-color"],
            ],
            ProviderError::ApplyFailed,
        )
        .await
    }

    async fn destroy(&self, fixture: &Fixture, document: &str) -> Result<(), ProviderError> {
        let workspace = self.workspace_dir(fixture);
        if !workspace.exists() {
            debug!(identity = %fixture.identity(), "no workspace found; nothing to destroy");
            return Ok(());
        }
        write_main_tf(&workspace, document)?;

        self.run_steps(
            &workspace,
            &[&["destroy", "-auto-approve", "-input=false", "-no-color"]],
            ProviderError::DestroyFailed,
        )
        .await?;

        tokio::fs::remove_dir_all(&workspace)
            .await
            .map_err(|e| ProviderError::Internal(format!("remove workspace: {}", e)))?;
        Ok(())
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn write_main_tf(workspace: &Path, document: &str) -> Result<(), ProviderError> {
    let mut content = String::from("# Generated by acctest; do not edit\n");
    content.push_str("provider \"azurerm\" {}\n\n");
    content.push_str(document);
    std::fs::write(workspace.join(MAIN_TF), content)
        .map_err(|e| ProviderError::Internal(format!("write {}: {}", MAIN_TF, e)))?;
    Ok(())
}

fn log_tail(log: &str, lines: usize) -> String {
    let all: Vec<&str> = log.lines().collect();
    all[all.len().saturating_sub(lines)..].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use acctest_fixture::{catalog, render, FixtureParams};

    fn fixture() -> Fixture {
        catalog::linux_basic(&FixtureParams::new(5, "westus")).unwrap()
    }

    fn engine(root: &Path, binary: &str) -> TerraformEngine {
        let mut config = TerraformConfig::new(root);
        config.binary = binary.into();
        TerraformEngine::new(config)
    }

    #[test]
    fn main_tf_has_header_provider_and_document() {
        let dir = tempfile::tempdir().unwrap();
        let doc = render(&fixture()).unwrap();
        write_main_tf(dir.path(), &doc).unwrap();

        let written = std::fs::read_to_string(dir.path().join(MAIN_TF)).unwrap();
        assert!(written.starts_with("# Generated by acctest; do not edit\n"));
        assert!(written.contains("provider \"azurerm\" {}"));
        assert!(written.ends_with(&doc));
    }

    #[test]
    fn workspace_is_per_identity() {
        let dir = tempfile::tempdir().unwrap();
        let e = engine(dir.path(), "terraform");
        assert_eq!(
            e.workspace_dir(&fixture()),
            dir.path().join("acctestRG-5").join("acctestcontainergroup-5")
        );
    }

    #[tokio::test]
    async fn timeout_covers_a_child_that_closes_its_output() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = TerraformConfig::new(dir.path());
        config.binary = "sh".into();
        config.timeout = Duration::from_millis(300);
        let e = TerraformEngine::new(config);

        let started = std::time::Instant::now();
        let err = e
            .run_tf(dir.path(), &["-c", "exec >&- 2>&-; sleep 30"])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("timed out"), "got: {err}");
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn log_tail_keeps_last_lines() {
        assert_eq!(log_tail("a\nb\nc\n", 2), "b\nc");
        assert_eq!(log_tail("a", 5), "a");
    }

    #[tokio::test]
    async fn destroy_without_workspace_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let e = engine(dir.path(), "/nonexistent/terraform");
        e.destroy(&fixture(), "").await.unwrap();
    }

    #[tokio::test]
    async fn missing_binary_fails_apply() {
        let dir = tempfile::tempdir().unwrap();
        let e = engine(dir.path(), "/nonexistent/terraform");
        let err = e.apply(&fixture(), "").await.unwrap_err();
        assert!(matches!(err, ProviderError::ApplyFailed(_)), "got: {err:?}");
        assert!(dir.path().join("acctestRG-5/acctestcontainergroup-5/main.tf").exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn successful_commands_apply_and_destroy() {
        let dir = tempfile::tempdir().unwrap();
        let e = engine(dir.path(), "echo");
        let f = fixture();
        e.apply(&f, "").await.unwrap();
        e.destroy(&f, "").await.unwrap();
        assert!(!e.workspace_dir(&f).exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn non_zero_exit_is_apply_failure() {
        let dir = tempfile::tempdir().unwrap();
        let e = engine(dir.path(), "false");
        let err = e.apply(&fixture(), "").await.unwrap_err();
        assert!(err.to_string().contains("init exited with code 1"), "got: {err}");
    }
}
