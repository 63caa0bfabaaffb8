//! Configuration-built services with command-backed sources, driven through
//! the CLI run context.

use std::path::Path;
use switchboard::cli::{Commands, OutputFormat, RunContext};
use switchboard::config::ConfigLoader;
use switchboard::error::ApiError;
use switchboard::{InventoryApi, RawRecord, Selection, UnifiedRecord};
use tempfile::TempDir;

const CONFIG: &str = r#"
[cache]
default_ttl_ms = 60000

[aliases]
ff = "Firefox"

[[sources]]
id = "firefox"
kind = "dedicated"
applications = ["Firefox"]
list_command = ["sh", "-c", "printf '%s' '[{\"title\":\"Docs\",\"url\":\"https://x.com/\",\"windowIndex\":1,\"tabIndex\":1}]'"]
activate_command = ["sh", "-c", "test \"$SWITCHBOARD_TITLE\" = Docs && test \"$SWITCHBOARD_TAB\" = 1"]
timeout_ms = 5000

[[sources]]
id = "windows"
kind = "universal"
list_command = ["sh", "-c", "printf '%s' '[{\"title\":\"Docs\",\"app\":\"Firefox\",\"windowIndex\":1,\"tabIndex\":1},{\"title\":\"Shell\",\"app\":\"Terminal\",\"kind\":\"window\"}]'"]
"#;

fn write_config(dir: &Path, contents: &str) -> std::path::PathBuf {
    let path = dir.join("switchboard.toml");
    std::fs::write(&path, contents).unwrap();
    path
}

#[tokio::test]
async fn test_command_sources_list_and_activate() {
    let temp = TempDir::new().unwrap();
    let config = ConfigLoader::load_from_file(&write_config(temp.path(), CONFIG))
        .unwrap()
        .validated()
        .unwrap();
    let api = InventoryApi::from_config(&config).unwrap();

    let records = api.list_items(&Selection::all()).await;
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].title, "Docs");
    assert_eq!(records[0].source_label, "Firefox");
    assert_eq!(records[0].url.as_deref(), Some("https://x.com/"));
    assert_eq!(records[1].title, "Shell");

    assert!(api.activate_item(&records[0], &Selection::all()).await);

    // The alias from the config file selects the dedicated source.
    let firefox = api.list_items(&Selection::of(["ff"])).await;
    assert_eq!(firefox.len(), 1);
}

#[tokio::test]
async fn test_source_without_activate_command_cannot_activate() {
    let temp = TempDir::new().unwrap();
    let config = ConfigLoader::load_from_file(&write_config(temp.path(), CONFIG)).unwrap();
    let api = InventoryApi::from_config(&config).unwrap();

    let shell = UnifiedRecord::detached(
        RawRecord::new("Shell", "Terminal").at(1, 1),
        Default::default(),
    );
    assert!(!api.activate_item(&shell, &Selection::of(["Terminal"])).await);
}

#[tokio::test]
async fn test_run_context_routes_commands() {
    let temp = TempDir::new().unwrap();
    let path = write_config(temp.path(), CONFIG);
    let context = RunContext::new(temp.path().to_path_buf(), Some(path)).unwrap();

    let output = context
        .execute(&Commands::Sources {
            format: OutputFormat::Json,
        })
        .await
        .unwrap();
    let value: serde_json::Value = serde_json::from_str(&output.text).unwrap();
    assert_eq!(value["total"], 2);
    assert_eq!(value["sources"][0]["id"], "firefox");

    let output = context
        .execute(&Commands::List {
            apps: vec!["Terminal".to_string()],
            format: OutputFormat::Json,
        })
        .await
        .unwrap();
    let value: serde_json::Value = serde_json::from_str(&output.text).unwrap();
    assert_eq!(value["total"], 1);
    assert_eq!(value["items"][0]["kind"], "window");

    let output = context
        .execute(&Commands::Activate {
            app: "Firefox".to_string(),
            title: "Docs".to_string(),
            url: None,
            window: Some(0),
            tab: Some(1),
            selection: Vec::new(),
            format: OutputFormat::Json,
        })
        .await
        .unwrap();
    assert!(!output.success);
    let value: serde_json::Value = serde_json::from_str(&output.text).unwrap();
    assert_eq!(value["outcome"], "invalid_target");
}

#[test]
fn test_invalid_config_is_rejected() {
    let temp = TempDir::new().unwrap();
    let path = write_config(
        temp.path(),
        r#"
[[sources]]
id = "safari"
list_command = ["safari-tabs"]
"#,
    );

    match RunContext::new(temp.path().to_path_buf(), Some(path)) {
        Err(ApiError::ConfigError(message)) => {
            assert!(message.contains("safari"));
        }
        Err(other) => panic!("unexpected error {:?}", other),
        Ok(_) => panic!("dedicated source without applications must be rejected"),
    }
}
