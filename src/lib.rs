//! Library behind the `mirrorctl` binary: a command-line client for a
//! PeerDB-style replication control plane.
//!
//! The pieces compose as a pipeline: [`loader`] turns files into typed
//! [`document`]s, [`translate`] turns documents into [`api`] requests, and
//! [`apply`] drives batches of them through the [`client`] facade.
//! [`settings`] resolves where the control plane lives.

pub mod api;
pub mod apply;
pub mod client;
pub mod commands;
pub mod document;
pub mod error;
pub mod loader;
pub mod settings;
pub mod translate;
