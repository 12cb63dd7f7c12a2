//! Integration tests for building a bridge from configuration files

use super::test_utils::{added, sample_tree, Harness};
use std::fs;
use tempfile::TempDir;
use vtree_bridge::config::ConfigLoader;
use vtree_bridge::profiler::ProfilerStatus;
use vtree_bridge::Bridge;

fn write_config(dir: &TempDir, body: &str) -> std::path::PathBuf {
    let path = dir.path().join("bridge.toml");
    fs::write(&path, body).unwrap();
    path
}

#[test]
fn test_configured_filters_apply_from_first_commit() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_config(
        &temp_dir,
        r#"
renderer_id = 3

[[filters]]
rule = { kind = "element_type", value = "host" }

[[filters]]
rule = { kind = "display_name", value = "Footer" }
"#,
    );

    let config = ConfigLoader::load_from_file(&path).unwrap();
    assert_eq!(config.renderer_id, 3);
    let mut h = Harness::attached(Bridge::from_config(&config).unwrap());
    h.bridge.connect().unwrap();

    let tree = sample_tree();
    let ops = h.commit(&tree);
    assert_eq!(
        added(&ops),
        vec![(1, None), (2, Some(1)), (4, Some(2)), (5, Some(2))]
    );
    assert_eq!(h.bridge.filters().len(), 2);
    h.assert_mirrors(&tree);
}

#[test]
fn test_profiling_starts_on_attach() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_config(
        &temp_dir,
        r#"
[profiling]
start_on_attach = true
record_change_descriptions = false
"#,
    );

    let config = ConfigLoader::load_from_file(&path).unwrap();
    let bridge = Bridge::from_config(&config).unwrap();
    assert_eq!(bridge.profiler_status(), ProfilerStatus::Stopped);

    let mut h = Harness::attached(bridge);
    assert_eq!(h.bridge.profiler_status(), ProfilerStatus::Running);
    h.bridge.connect().unwrap();
    h.commit(&sample_tree());
    let data = h.bridge.get_profiling_data();
    assert_eq!(data.roots[0].commits.len(), 1);
    assert!(data.roots[0].commits[0].changed.is_empty());
}
