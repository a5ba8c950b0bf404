//! End-to-end runs against a temporary worker directory.

use async_trait::async_trait;
use ironbot_agent::{BuildAgent, CiConfig, RunExecutor};
use ironbot_core::pipeline::CheckoutStep;
use ironbot_core::ports::{CommandResult, SourceCheckout};
use ironbot_core::run::{BuildProperties, RunStatus, StepStatus};
use ironbot_core::{Error, Result};
use ironbot_notify::HttpTriggerSender;
use ironbot_runner::{RunnerConfig, ShellRunner};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Initialize test logging (call at the start of each test).
fn init_test_logging() {
    use tracing_subscriber::{EnvFilter, fmt};

    let _ = fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,ironbot_agent=debug")),
        )
        .with_test_writer()
        .try_init();
}

/// Pretends the sources are already in place.
struct NoCheckout;

#[async_trait]
impl SourceCheckout for NoCheckout {
    async fn checkout(&self, _step: &CheckoutStep, dir: &Path) -> Result<CommandResult> {
        tokio::fs::create_dir_all(dir).await?;
        Ok(CommandResult::from_exit_code(0, 0))
    }
}

fn config(worker: &TempDir, registry: &str) -> CiConfig {
    let yaml = format!(
        r#"
worker_dir: {}
registry_url: {}
triggers:
  - name: liridev/ci-archlinux
    token: t1
    tags: [packages]
  - name: liridev/ci-fedora
    token: t2
    tags: [fedora]
builders:
  - name: archlinux-packages
    kind: arch_packages
    repository: https://example.org/archlinux-packages.git
  - name: docker
    kind: docker_hub
    tags: [fedora, packages]
"#,
        worker.path().display(),
        registry
    );
    let config = CiConfig::from_yaml(&yaml).unwrap();
    config.validate().unwrap();
    config
}

fn agent(config: CiConfig) -> BuildAgent {
    let shell = ShellRunner::new(RunnerConfig {
        timeout_seconds: Some(30),
        ..RunnerConfig::default()
    });
    let executor = RunExecutor::new(
        Arc::new(shell),
        Arc::new(NoCheckout),
        Arc::new(HttpTriggerSender::new(5)),
    );
    BuildAgent::with_executor(config, executor)
}

fn props() -> BuildProperties {
    BuildProperties {
        repository: "https://example.org/archlinux-packages.git".to_string(),
        branch: "develop".to_string(),
        codebase: None,
    }
}

/// The package selection leaves the manifest in the checkout, next to the
/// package directories.
fn write_manifest(worker: &TempDir, builder: &str, content: &str) {
    let workdir = worker.path().join(builder).join("build");
    std::fs::create_dir_all(&workdir).unwrap();
    std::fs::write(workdir.join("channels.json"), content).unwrap();
}

#[cfg(unix)]
fn install_build_script(worker: &TempDir, builder: &str) {
    use std::os::unix::fs::PermissionsExt;

    let script = worker.path().join(builder).join("build").join("docker-build");
    std::fs::write(&script, "#!/bin/sh\nbasename \"$PWD\" >> ../built.txt\n").unwrap();
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
}

async fn mock_trigger(server: &MockServer, name: &str, token: &str, status: u16, times: u64) {
    Mock::given(method("POST"))
        .and(path(format!("/u/{}/trigger/{}/", name, token)))
        .and(body_json(serde_json::json!({"build": true})))
        .respond_with(ResponseTemplate::new(status))
        .expect(times)
        .mount(server)
        .await;
}

#[cfg(unix)]
#[tokio::test]
async fn test_packages_build_in_reverse_order_then_trigger() {
    init_test_logging();
    let server = MockServer::start().await;
    mock_trigger(&server, "liridev/ci-archlinux", "t1", 200, 1).await;
    mock_trigger(&server, "liridev/ci-fedora", "t2", 200, 0).await;

    let worker = TempDir::new().unwrap();
    write_manifest(
        &worker,
        "archlinux-packages",
        r#"{"stable": ["old"], "unstable": ["qt5-base", "fluid", "liri-shell"]}"#,
    );
    install_build_script(&worker, "archlinux-packages");

    let agent = agent(config(&worker, &server.uri()));
    let summary = agent
        .run_builder("archlinux-packages", props())
        .await
        .unwrap();

    assert_eq!(summary.status, RunStatus::Success);
    let built = std::fs::read_to_string(
        worker
            .path()
            .join("archlinux-packages/build/built.txt"),
    )
    .unwrap();
    assert_eq!(built, "liri-shell\nfluid\nqt5-base\n");

    let names: Vec<&str> = summary.steps.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "checkout sources",
            "create database",
            "select packages",
            "build liri-shell",
            "build fluid",
            "build qt5-base",
            "trigger rebuild liridev/ci-archlinux",
        ]
    );
}

#[tokio::test]
async fn test_malformed_manifest_fails_before_triggers() {
    init_test_logging();
    let server = MockServer::start().await;
    mock_trigger(&server, "liridev/ci-archlinux", "t1", 200, 0).await;

    let worker = TempDir::new().unwrap();
    write_manifest(&worker, "archlinux-packages", r#"{"stable": []}"#);

    let agent = agent(config(&worker, &server.uri()));
    let summary = agent
        .run_builder("archlinux-packages", props())
        .await
        .unwrap();

    assert_eq!(summary.status, RunStatus::Failure);
    assert_eq!(
        summary.step("select packages").unwrap().status,
        StepStatus::Failure
    );
    assert!(!summary.steps.iter().any(|s| s.name.starts_with("build ")));
    assert_eq!(
        summary.step("trigger rebuild liridev/ci-archlinux").unwrap().status,
        StepStatus::Skipped
    );
}

#[tokio::test]
async fn test_missing_manifest_builds_nothing() {
    init_test_logging();
    let server = MockServer::start().await;
    mock_trigger(&server, "liridev/ci-archlinux", "t1", 200, 1).await;

    let worker = TempDir::new().unwrap();
    let agent = agent(config(&worker, &server.uri()));
    let summary = agent
        .run_builder("archlinux-packages", props())
        .await
        .unwrap();

    assert_eq!(summary.status, RunStatus::Success);
    assert!(!summary.steps.iter().any(|s| s.name.starts_with("build ")));
}

#[tokio::test]
async fn test_manifest_outside_workdir_is_not_read() {
    init_test_logging();
    let server = MockServer::start().await;
    mock_trigger(&server, "liridev/ci-archlinux", "t1", 200, 1).await;

    let worker = TempDir::new().unwrap();
    let builddir = worker.path().join("archlinux-packages");
    std::fs::create_dir_all(&builddir).unwrap();
    std::fs::write(
        builddir.join("channels.json"),
        r#"{"stable": [], "unstable": ["pkg-a"]}"#,
    )
    .unwrap();

    let agent = agent(config(&worker, &server.uri()));
    let summary = agent
        .run_builder("archlinux-packages", props())
        .await
        .unwrap();

    assert_eq!(summary.status, RunStatus::Success);
    assert!(summary.step("build pkg-a").is_none());
}

#[tokio::test]
async fn test_rejected_trigger_is_a_warning() {
    init_test_logging();
    let server = MockServer::start().await;
    mock_trigger(&server, "liridev/ci-fedora", "t2", 500, 1).await;
    mock_trigger(&server, "liridev/ci-archlinux", "t1", 200, 1).await;

    let worker = TempDir::new().unwrap();
    let agent = agent(config(&worker, &server.uri()));
    let summary = agent.run_builder("docker", props()).await.unwrap();

    assert_eq!(summary.status, RunStatus::Success);
    assert_eq!(summary.steps.len(), 2);
    assert_eq!(summary.warnings(), 1);
    assert_eq!(
        summary.step("trigger rebuild liridev/ci-fedora").unwrap().status,
        StepStatus::Warnings
    );
}

#[tokio::test]
async fn test_concurrent_runs_are_independent() {
    init_test_logging();
    let server = MockServer::start().await;
    mock_trigger(&server, "liridev/ci-archlinux", "t1", 200, 2).await;
    mock_trigger(&server, "liridev/ci-fedora", "t2", 200, 1).await;

    let worker = TempDir::new().unwrap();
    write_manifest(&worker, "archlinux-packages", r#"{"stable": [], "unstable": []}"#);

    let agent = agent(config(&worker, &server.uri()));
    let (packages, docker) = tokio::join!(
        agent.run_builder("archlinux-packages", props()),
        agent.run_builder("docker", props()),
    );

    let packages = packages.unwrap();
    let docker = docker.unwrap();
    assert_ne!(packages.run_id, docker.run_id);
    assert_eq!(packages.status, RunStatus::Success);
    assert_eq!(docker.status, RunStatus::Success);
    assert_eq!(docker.steps.len(), 2);
}

#[tokio::test]
async fn test_unknown_builder() {
    init_test_logging();
    let worker = TempDir::new().unwrap();
    let agent = agent(config(&worker, "http://localhost:1"));
    let err = agent.run_builder("debian", props()).await.unwrap_err();
    assert!(matches!(err, Error::UnknownBuilder(name) if name == "debian"));
}
