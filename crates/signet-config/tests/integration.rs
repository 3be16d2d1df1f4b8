use std::fs;
use std::path::PathBuf;

use anyhow::Result;
use signet_config::{CONFIG_PATH_ENV, ConfigError, ConfigLoader};

#[test]
fn yaml_file_then_environment_layers() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("signet.yaml");
    fs::write(
        &path,
        "watch:\n  workplace_path: /srv/incoming\n  destination_root: /srv/archive\n  poll_interval_ms: 250\n  status_keywords: [signed, approved]\nauto_start: true\n",
    )?;

    let explicit = path.display().to_string();
    let config = ConfigLoader::with_lookup(move |name: &str| match name {
        CONFIG_PATH_ENV => Some(explicit.clone()),
        "SIGNET_POLL_INTERVAL_MS" => Some("500".to_string()),
        _ => None,
    })
    .load()?;

    assert_eq!(config.watch.workplace_path, PathBuf::from("/srv/incoming"));
    assert_eq!(config.watch.destination_root, PathBuf::from("/srv/archive"));
    assert_eq!(config.watch.poll_interval_ms, 500);
    assert_eq!(config.watch.status_keywords, vec!["signed", "approved"]);
    assert!(config.auto_start);
    Ok(())
}

#[test]
fn default_file_is_used_when_present() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("signet.yaml");
    fs::write(&path, "watch:\n  dry_run: true\n")?;

    let config = ConfigLoader::with_lookup(|_: &str| None)
        .with_default_file(&path)
        .load()?;
    assert!(config.watch.dry_run);
    Ok(())
}

#[test]
fn invalid_yaml_reports_parse_error() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("signet.yaml");
    fs::write(&path, "watch: [not, a, mapping]\n")?;

    let err = ConfigLoader::with_lookup(|_: &str| None)
        .with_default_file(&path)
        .load();
    assert!(matches!(err, Err(ConfigError::Parse { .. })));
    Ok(())
}

#[test]
fn merged_document_is_validated() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("signet.yaml");
    fs::write(&path, "watch:\n  filename_pattern: '^(?P<doc>.+)\\.pdf$'\n")?;

    let err = ConfigLoader::with_lookup(|_: &str| None)
        .with_default_file(&path)
        .load();
    let err = err.err().ok_or_else(|| anyhow::anyhow!("expected validation failure"))?;
    assert_eq!(err.field(), Some("filename_pattern"));
    assert_eq!(err.reason(), Some("missing_group"));
    Ok(())
}
