//! Ensures all workspace crates use `version.workspace = true` and that
//! the workspace version matches the version Cargo compiled this crate with.

use std::path::{Path, PathBuf};

const CRATES: [&str; 3] = [
    "crates/panelist-core",
    "crates/panelist-cli",
    "crates/panelist-state",
];

fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .ancestors()
        .nth(2)
        .unwrap()
        .to_path_buf()
}

fn read_manifest(dir: &Path) -> toml::Value {
    let text = std::fs::read_to_string(dir.join("Cargo.toml")).unwrap();
    text.parse().unwrap()
}

#[test]
fn all_crates_use_workspace_version() {
    let root = workspace_root();
    for krate in CRATES {
        let doc = read_manifest(&root.join(krate));
        let inherited = doc
            .get("package")
            .and_then(|p| p.get("version"))
            .and_then(|v| v.get("workspace"))
            .and_then(|w| w.as_bool());
        assert_eq!(
            inherited,
            Some(true),
            "{krate} should use version.workspace = true"
        );
    }
}

#[test]
fn workspace_members_match_crate_directories() {
    let doc = read_manifest(&workspace_root());
    let members: Vec<&str> = doc["workspace"]["members"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|m| m.as_str())
        .collect();
    assert_eq!(members, CRATES);
}

#[test]
fn workspace_version_matches_cargo_pkg() {
    let doc = read_manifest(&workspace_root());
    let ws_version = doc["workspace"]["package"]["version"].as_str().unwrap();
    assert_eq!(
        ws_version,
        env!("CARGO_PKG_VERSION"),
        "workspace version ({}) != CARGO_PKG_VERSION ({})",
        ws_version,
        env!("CARGO_PKG_VERSION")
    );
}
