//! Document loader: interpolation, single-file and directory loading.

use std::fs;
use std::path::PathBuf;

use mirrorctl::error::CliError;
use mirrorctl::loader::{interpolate_env, load_file, load_path};
use tempfile::TempDir;

#[test]
fn interpolation_is_identity_without_placeholders() {
    let texts = [
        "",
        "plain text",
        "kind: Peer\nmetadata:\n  name: demo\n",
        "not a placeholder: $HOME and ${} and ${1BAD}",
    ];
    for text in texts {
        assert_eq!(interpolate_env(text), text);
    }
}

#[test]
fn interpolation_substitutes_defined_variables() {
    std::env::set_var("MIRRORCTL_TEST_DB_PASSWORD", "hunter2");
    let out = interpolate_env("password: ${MIRRORCTL_TEST_DB_PASSWORD}");
    assert_eq!(out, "password: hunter2");
}

#[test]
fn unresolved_placeholders_stay_literal() {
    let text = "password: ${MIRRORCTL_TEST_NO_SUCH_VARIABLE}";
    assert_eq!(interpolate_env(text), text);
}

#[test]
fn loads_a_single_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("peer.yaml");
    fs::write(
        &path,
        "apiVersion: v1\nkind: Peer\nmetadata:\n  name: pg-main\nspec:\n  type: postgres\n",
    )
    .unwrap();

    let documents = load_path(&path).unwrap();
    assert_eq!(documents.len(), 1);
    assert_eq!(documents[0].document.kind, "Peer");
    assert_eq!(documents[0].document.metadata.name, "pg-main");
}

#[test]
fn interpolates_before_parsing() {
    std::env::set_var("MIRRORCTL_TEST_PEER_NAME", "pg-interp");
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("peer.yaml");
    fs::write(
        &path,
        "kind: Peer\nmetadata:\n  name: ${MIRRORCTL_TEST_PEER_NAME}\n",
    )
    .unwrap();

    let document = load_file(&path).unwrap();
    assert_eq!(document.metadata.name, "pg-interp");
}

fn write_document(dir: &TempDir, relative: &str, name: &str) {
    let path = dir.path().join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, format!("kind: Peer\nmetadata:\n  name: {name}\n")).unwrap();
}

#[test]
fn directory_load_is_deterministic_and_skips_non_documents() {
    let dir = TempDir::new().unwrap();
    write_document(&dir, "b.yaml", "second");
    write_document(&dir, "a.yml", "first");
    write_document(&dir, "c.YAML", "third");
    write_document(&dir, "nested/d.yaml", "fourth");
    fs::write(dir.path().join("notes.txt"), "kind: Peer\n").unwrap();
    fs::write(dir.path().join("data.json"), "{}").unwrap();

    let first_load = load_path(dir.path()).unwrap();
    let second_load = load_path(dir.path()).unwrap();

    let names: Vec<&str> = first_load
        .iter()
        .map(|d| d.document.metadata.name.as_str())
        .collect();
    assert_eq!(names, ["first", "second", "third", "fourth"]);

    let first_paths: Vec<&PathBuf> = first_load.iter().map(|d| &d.path).collect();
    let second_paths: Vec<&PathBuf> = second_load.iter().map(|d| &d.path).collect();
    assert_eq!(first_paths, second_paths);
}

#[test]
fn parse_failure_aborts_the_whole_directory_load() {
    let dir = TempDir::new().unwrap();
    write_document(&dir, "a.yaml", "fine");
    fs::write(dir.path().join("b.yaml"), "kind: [unclosed\n").unwrap();
    write_document(&dir, "c.yaml", "never-reached");

    let err = load_path(dir.path()).unwrap_err();
    match err {
        CliError::Parse { path, .. } => {
            assert!(path.ends_with("b.yaml"), "unexpected path {path:?}")
        }
        other => panic!("expected parse error, got {other:?}"),
    }
}

#[test]
fn empty_directory_yields_no_documents() {
    let dir = TempDir::new().unwrap();
    let documents = load_path(dir.path()).unwrap();
    assert!(documents.is_empty());
}

#[test]
fn missing_path_is_an_io_error() {
    let dir = TempDir::new().unwrap();
    let err = load_path(&dir.path().join("absent")).unwrap_err();
    assert!(matches!(err, CliError::Io { .. }));
}
