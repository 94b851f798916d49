use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const HOST: &str = r#"
[[extensions]]
handle = "seo-suite"
edition = "pro"
modules = ["metadata", "redirects", "sitemaps"]

[[extensions]]
handle = "xml-sitemaps"
modules = ["sitemaps"]

[[extensions]]
handle = "forms-suite"
modules = ["forms", "email", "sent-email"]

[[extensions]]
handle = "lists-suite"
enabled = false
modules = ["lists"]
"#;

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new(host: &str) -> Self {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("host.toml"), host).unwrap();
        Self { dir }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn write(&self, name: &str, content: &str) {
        fs::write(self.path(name), content).unwrap();
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("confreg").unwrap();
        cmd.current_dir(self.dir.path())
            .env("XDG_CONFIG_HOME", self.path("config"))
            .env_remove("CONFREG_CONFIG")
            .arg("--host")
            .arg(self.path("host.toml"))
            .arg("--store")
            .arg(self.path("settings.json"))
            .arg("--log-level")
            .arg("error");
        cmd
    }

    fn json(&self, args: &[&str]) -> Value {
        let output = self.cmd().args(args).output().unwrap();
        assert!(output.status.success(), "{:?}", output);
        serde_json::from_slice(&output.stdout).unwrap()
    }
}

fn keys(value: &Value) -> Vec<String> {
    value.as_object().unwrap().keys().cloned().collect()
}

fn read_store(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn test_configs_in_discovery_order() {
    let ws = Workspace::new(HOST);
    let configs = ws.json(&["configs"]);

    assert_eq!(
        keys(&configs),
        vec!["metadata", "redirects", "sitemaps", "forms", "email", "sent-email"]
    );
    assert_eq!(configs["sitemaps"]["edition"], "pro");
    assert_eq!(configs["forms"]["edition"], "standard");
}

#[test]
fn test_get_unknown_key_fails() {
    let ws = Workspace::new(HOST);
    ws.cmd()
        .args(["get", "lists"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration module not found: lists"));
}

#[test]
fn test_nav_skips_disabled_modules() {
    let ws = Workspace::new(HOST);
    let nav = ws.json(&["nav"]);

    let labels: Vec<&str> = nav
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["label"].as_str().unwrap())
        .collect();

    // sent-email is disabled by default
    assert_eq!(
        labels,
        vec!["Metadata", "Redirects", "Sitemaps", "Forms", "Notifications"]
    );
    assert_eq!(nav[3]["subnav"]["entries"]["url"], "confreg/forms/entries");
}

#[test]
fn test_settings_pages_start_with_control_panel() {
    let ws = Workspace::new("");
    ws.cmd()
        .arg("settings-pages")
        .assert()
        .success()
        .stdout(predicate::str::contains("confreg/settings/control-panel"));
}

#[test]
fn test_file_overrides_only_apply_in_full_context() {
    let ws = Workspace::new(HOST);
    ws.write(".confreg.toml", "[forms]\nspamLimit = 42\n");

    let full = ws.json(&["get", "forms"]);
    assert_eq!(full["settings"]["spamLimit"], 42);

    let settings_only = ws.json(&["get", "forms", "--settings-only"]);
    assert_eq!(settings_only["settings"]["spamLimit"], 500);
}

#[test]
fn test_overrides_from_environment() {
    let ws = Workspace::new(HOST);
    ws.write("overrides.toml", "[redirects]\ntotal404Redirects = 10\n");

    let output = ws
        .cmd()
        .env("CONFREG_CONFIG", ws.path("overrides.toml"))
        .args(["get", "redirects"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let config: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(config["settings"]["total404Redirects"], 10);
}

#[test]
fn test_install_seeds_store() {
    let ws = Workspace::new(HOST);
    let report = ws.json(&["install", "forms-suite"]);

    assert_eq!(report["extension"], "forms-suite");
    assert_eq!(report["modules"][0]["outcome"], "installed");

    let store = read_store(&ws.path("settings.json"));
    assert_eq!(store["plugins.confreg.forms"]["enabled"], true);
    assert!(store["plugins.confreg._schema.forms"]["installedAt"].is_string());
}

#[test]
fn test_persisted_settings_beat_overrides() {
    let ws = Workspace::new(HOST);
    ws.json(&["install", "forms-suite"]);
    ws.write(".confreg.toml", "[forms]\nenabled = false\n");

    let forms = ws.json(&["get", "forms"]);
    assert_eq!(forms["settings"]["enabled"], true);
}

#[test]
fn test_uninstall_keeps_shared_modules() {
    let ws = Workspace::new(HOST);
    ws.json(&["install", "seo-suite"]);

    let report = ws.json(&["uninstall", "seo-suite"]);
    let outcomes: Vec<(&str, &str)> = report["modules"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| (m["key"].as_str().unwrap(), m["outcome"].as_str().unwrap()))
        .collect();

    assert_eq!(
        outcomes,
        vec![
            ("metadata", "removed"),
            ("redirects", "removed"),
            ("sitemaps", "skipped-in-use"),
        ]
    );

    let store = read_store(&ws.path("settings.json"));
    assert!(store.get("plugins.confreg.sitemaps").is_some());
    assert!(store.get("plugins.confreg.metadata").is_none());
}

#[test]
fn test_custom_namespace() {
    let ws = Workspace::new(HOST);
    ws.cmd()
        .args(["--namespace", "cms.settings", "install", "lists-suite"])
        .assert()
        .success();

    let store = read_store(&ws.path("settings.json"));
    assert!(store.get("cms.settings.lists").is_some());
}

#[test]
fn test_unknown_extension() {
    let ws = Workspace::new(HOST);
    ws.cmd()
        .args(["install", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Extension not found: nope"));
}

#[test]
fn test_missing_host_manifest() {
    let dir = TempDir::new().unwrap();
    Command::cargo_bin("confreg")
        .unwrap()
        .current_dir(dir.path())
        .args(["--host", "missing.toml", "configs"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load host manifest"));
}

#[test]
fn test_modules_lists_catalogue() {
    let ws = Workspace::new("");
    ws.cmd()
        .arg("modules")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"key\": \"sent-email\""));
}
