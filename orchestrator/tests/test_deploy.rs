//! Deployment orchestrator tests

mod common;

use std::path::Path;
use std::sync::Arc;

use common::{site, ScriptedChannel};
use sitewright::deploy::deployer::Deployer;
use sitewright::models::run::{RunKind, RunStatus, StepStatus};
use sitewright::options::OrchestratorOptions;
use sitewright::store::memory::MemoryStore;
use sitewright::store::RecordStore;

fn deployer(store: &Arc<MemoryStore>) -> Deployer {
    Deployer::new(store.clone(), OrchestratorOptions::default())
}

#[tokio::test]
async fn test_deploy_happy_path() {
    let store = Arc::new(MemoryStore::new());
    store.insert_site(site("site-123", "example.com")).await;

    let mut channel = ScriptedChannel::new();
    let outcome = deployer(&store)
        .deploy(&mut channel, "site-123", Path::new("/tmp/content"))
        .await;

    assert!(outcome.success, "deploy failed: {:?}", outcome.error);
    assert_eq!(channel.connect_calls, 1);
    assert_eq!(channel.dispose_calls, 1);

    // Remote side effects in program order.
    assert!(channel.ran("mkdir -p /var/www/example.com"));
    assert!(channel.ran("sudo mv /tmp/example.com.conf /etc/nginx/sites-available/example.com"));
    assert!(channel
        .ran("sudo ln -sf /etc/nginx/sites-available/example.com /etc/nginx/sites-enabled/example.com"));
    assert!(
        channel.index_of("sudo nginx -t").unwrap()
            < channel.index_of("systemctl reload nginx").unwrap()
    );

    // Content tree plus the staged config blob.
    assert_eq!(channel.uploads.len(), 2);
    assert!(channel.uploads[0].starts_with("tree:/tmp/content:/var/www/example.com"));
    assert!(channel.uploads[1].ends_with("/tmp/example.com.conf"));

    let run = store
        .get_run(outcome.run_id.as_deref().unwrap())
        .await
        .unwrap();
    assert_eq!(run.kind, RunKind::Deploy);
    assert_eq!(run.status, RunStatus::Deployed);
    assert!(run.steps.iter().all(|s| s.status == StepStatus::Success));
    assert_eq!(run.steps.last().unwrap().name, "Done");

    let site = store.find_site("site-123").await.unwrap().unwrap();
    assert_eq!(site.deployed_path.as_deref(), Some("/var/www/example.com"));
}

#[tokio::test]
async fn test_invalid_domain_makes_no_remote_calls() {
    let store = Arc::new(MemoryStore::new());
    store.insert_site(site("site-123", "bad..domain")).await;

    let mut channel = ScriptedChannel::new();
    let outcome = deployer(&store)
        .deploy(&mut channel, "site-123", Path::new("/tmp/content"))
        .await;

    assert!(!outcome.success);
    assert!(outcome
        .error
        .as_deref()
        .unwrap()
        .starts_with("Invalid domain format"));

    assert_eq!(channel.connect_calls, 0);
    assert!(channel.commands.is_empty());
    assert!(channel.uploads.is_empty());

    let run = store
        .get_run(outcome.run_id.as_deref().unwrap())
        .await
        .unwrap();
    assert_eq!(run.status, RunStatus::Failed);
    let last = run.steps.last().unwrap();
    assert_eq!(last.name, "Validate");
    assert_eq!(last.status, StepStatus::Failed);
}

#[tokio::test]
async fn test_unknown_site_fails_before_remote_work() {
    let store = Arc::new(MemoryStore::new());

    let mut channel = ScriptedChannel::new();
    let outcome = deployer(&store)
        .deploy(&mut channel, "missing", Path::new("/tmp/content"))
        .await;

    assert!(!outcome.success);
    assert!(outcome.error.as_deref().unwrap().contains("not found"));
    assert_eq!(channel.connect_calls, 0);
}

#[tokio::test]
async fn test_config_test_failure_skips_reload() {
    let store = Arc::new(MemoryStore::new());
    store.insert_site(site("site-123", "example.com")).await;

    let mut channel = ScriptedChannel::new().respond(
        "nginx -t",
        1,
        "",
        "nginx: [emerg] invalid directive",
    );
    let outcome = deployer(&store)
        .deploy(&mut channel, "site-123", Path::new("/tmp/content"))
        .await;

    assert!(!outcome.success);
    assert!(outcome
        .error
        .as_deref()
        .unwrap()
        .contains("Nginx configuration test failed"));

    // A possibly-broken server is never reloaded, and the channel is
    // released exactly once.
    assert!(!channel.ran("reload"));
    assert_eq!(channel.dispose_calls, 1);

    let run = store
        .get_run(outcome.run_id.as_deref().unwrap())
        .await
        .unwrap();
    assert_eq!(run.status, RunStatus::Failed);
    let last = run.steps.last().unwrap();
    assert_eq!(last.name, "NginxTest");
    assert_eq!(last.status, StepStatus::Failed);
}

#[tokio::test]
async fn test_connect_failure_is_recorded() {
    let store = Arc::new(MemoryStore::new());
    store.insert_site(site("site-123", "example.com")).await;

    let mut channel = ScriptedChannel::new().failing_connect("host unreachable");
    let outcome = deployer(&store)
        .deploy(&mut channel, "site-123", Path::new("/tmp/content"))
        .await;

    assert!(!outcome.success);
    assert!(outcome.error.as_deref().unwrap().contains("host unreachable"));
    assert!(channel.commands.is_empty());

    let run = store
        .get_run(outcome.run_id.as_deref().unwrap())
        .await
        .unwrap();
    assert_eq!(run.steps.last().unwrap().name, "SSH");
}

#[tokio::test]
async fn test_redeploy_creates_independent_runs() {
    let store = Arc::new(MemoryStore::new());
    store.insert_site(site("site-123", "example.com")).await;
    let deployer = deployer(&store);

    let mut channel = ScriptedChannel::new();
    let first = deployer
        .deploy(&mut channel, "site-123", Path::new("/tmp/content-v1"))
        .await;
    assert!(first.success);

    let mut channel = ScriptedChannel::new();
    let second = deployer
        .deploy(&mut channel, "site-123", Path::new("/tmp/content-v2"))
        .await;
    assert!(second.success);
    assert!(channel.uploads[0].starts_with("tree:/tmp/content-v2"));

    let runs = store.runs_for_site("site-123").await;
    assert_eq!(runs.len(), 2);
    assert!(runs.iter().all(|r| r.status == RunStatus::Deployed));
    assert_ne!(runs[0].id, runs[1].id);

    let site = store.find_site("site-123").await.unwrap().unwrap();
    assert_eq!(site.deployed_path.as_deref(), Some("/var/www/example.com"));
}

#[tokio::test]
async fn test_step_log_is_insertion_ordered() {
    let store = Arc::new(MemoryStore::new());
    store.insert_site(site("site-123", "example.com")).await;

    let mut channel = ScriptedChannel::new();
    let outcome = deployer(&store)
        .deploy(&mut channel, "site-123", Path::new("/tmp/content"))
        .await;

    let names: Vec<&str> = outcome.logs.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "Validate", "SSH", "Prepare", "Upload", "Nginx", "Nginx", "Enable", "NginxTest",
            "Reload", "Done"
        ]
    );

    // The persisted log matches what the caller got.
    let run = store
        .get_run(outcome.run_id.as_deref().unwrap())
        .await
        .unwrap();
    assert_eq!(run.steps.len(), outcome.logs.len());
}
