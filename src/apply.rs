//! Validate and apply pipelines over loaded documents.
//!
//! Validate runs the translator for every document and aggregates the
//! results. Apply processes documents strictly in load order and halts on
//! the first translation or remote failure; documents already applied
//! stay applied (no rollback). Dry-run apply reports what would be
//! submitted without translating or calling the service.

use std::path::PathBuf;
use std::time::Duration;

use colored::Colorize;

use crate::client::FlowService;
use crate::error::{CliError, Result};
use crate::loader::LoadedDocument;
use crate::translate::{self, Request};

/// Deadline for a whole apply batch.
pub const APPLY_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Default)]
pub struct ApplyOptions {
    pub dry_run: bool,
    /// Allow updating peers that already exist.
    pub force: bool,
}

/// Per-document validation result.
#[derive(Debug)]
pub struct ValidationOutcome {
    pub path: PathBuf,
    pub kind: String,
    pub name: String,
    pub error: Option<CliError>,
}

/// Runs the translator over every document, capturing per-document
/// failures instead of stopping at the first one.
pub fn validate_documents(documents: &[LoadedDocument]) -> Vec<ValidationOutcome> {
    documents
        .iter()
        .map(|loaded| ValidationOutcome {
            path: loaded.path.clone(),
            kind: loaded.document.kind.clone(),
            name: loaded.document.metadata.name.clone(),
            error: translate::translate(&loaded.document).err(),
        })
        .collect()
}

/// Applies documents in load order, returning how many were submitted.
/// In dry-run mode nothing is translated or submitted.
pub async fn apply_documents(
    service: &dyn FlowService,
    documents: &[LoadedDocument],
    options: &ApplyOptions,
) -> Result<usize> {
    if options.dry_run {
        for loaded in documents {
            println!(
                "[dry-run] would apply {} '{}' ({})",
                loaded.document.kind,
                loaded.document.metadata.name,
                loaded.path.display()
            );
        }
        return Ok(0);
    }

    match tokio::time::timeout(APPLY_TIMEOUT, submit_all(service, documents, options)).await {
        Ok(result) => result,
        Err(_) => Err(CliError::Timeout(APPLY_TIMEOUT)),
    }
}

async fn submit_all(
    service: &dyn FlowService,
    documents: &[LoadedDocument],
    options: &ApplyOptions,
) -> Result<usize> {
    let mut applied = 0;
    for loaded in documents {
        println!(
            "Applying {} '{}'...",
            loaded.document.kind, loaded.document.metadata.name
        );

        let request = match translate::translate(&loaded.document) {
            Ok(request) => request,
            Err(err) => {
                eprintln!("  {} {}: {err}", "✗".red(), loaded.path.display());
                return Err(err);
            }
        };

        let result = match request {
            Request::CreatePeer(peer) => service
                .create_peer(peer, options.force)
                .await
                .map(|_| ()),
            Request::CreateMirror(request) => service.create_mirror(request).await.map(|_| ()),
        };

        if let Err(err) = result {
            eprintln!("  {} {}: {err}", "✗".red(), loaded.path.display());
            return Err(err);
        }

        println!("  {} applied", "✓".green());
        applied += 1;
    }
    Ok(applied)
}
