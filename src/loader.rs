//! Loads declarative documents from a file or a directory tree.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::{Captures, Regex};
use walkdir::WalkDir;

use crate::document::Document;
use crate::error::{CliError, Result};

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").unwrap());

/// A parsed document together with the file it came from.
#[derive(Debug, Clone)]
pub struct LoadedDocument {
    pub path: PathBuf,
    pub document: Document,
}

/// Replaces `${NAME}` placeholders with the value of the matching
/// environment variable. Unresolved names are left as literal text.
pub fn interpolate_env(text: &str) -> String {
    PLACEHOLDER
        .replace_all(text, |caps: &Captures| {
            std::env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
        })
        .into_owned()
}

/// Loads one document file: read, interpolate, parse.
pub fn load_file(path: &Path) -> Result<Document> {
    let raw = fs::read_to_string(path).map_err(|e| CliError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let expanded = interpolate_env(&raw);
    serde_yaml::from_str(&expanded).map_err(|e| CliError::Parse {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Loads a single file or every recognized document under a directory.
pub fn load_path(path: &Path) -> Result<Vec<LoadedDocument>> {
    let metadata = fs::metadata(path).map_err(|e| CliError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    if metadata.is_dir() {
        load_directory(path)
    } else {
        Ok(vec![LoadedDocument {
            path: path.to_path_buf(),
            document: load_file(path)?,
        }])
    }
}

/// Recursively collects every `.yaml`/`.yml` file under `dir`, in
/// lexicographic order, and parses each one. The first parse failure
/// aborts the whole load. An empty result is not an error.
pub fn load_directory(dir: &Path) -> Result<Vec<LoadedDocument>> {
    let mut documents = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e
                .path()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| dir.to_path_buf());
            CliError::Io {
                path,
                source: e.into(),
            }
        })?;
        if !entry.file_type().is_file() || !has_document_extension(entry.path()) {
            continue;
        }
        documents.push(LoadedDocument {
            path: entry.path().to_path_buf(),
            document: load_file(entry.path())?,
        });
    }
    tracing::debug!(count = documents.len(), dir = %dir.display(), "loaded documents");
    Ok(documents)
}

fn has_document_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"))
}
