//! contrib-portal - contribution pipeline for a shared content repository
//!
//! Contributors never touch git. Each user gets a fork with an integration
//! branch that mirrors upstream's development branch; every submitted
//! resource becomes a topic branch, a single commit built through GitHub's
//! git data API, and a draft pull request against upstream.
//!
//! The [`server`] module exposes this over HTTP for the web front end; the
//! `portal` binary drives the same operations from a terminal.

pub mod auth;
pub mod branch;
pub mod commit;
pub mod config;
pub mod error;
pub mod platform;
pub mod resources;
pub mod server;
pub mod submit;
pub mod types;
pub mod workspace;

pub use error::{Error, Result};
