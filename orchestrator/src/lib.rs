//! Sitewright Orchestrator
//!
//! Drives a remote host over SSH through static-site deployment and TLS
//! certificate provisioning: directory preparation, content upload, nginx
//! configuration install, config validation, live reload, and certbot
//! invocation. Every run leaves an ordered, durable step log in the backing
//! record store.

pub mod channel;
pub mod deploy;
pub mod errors;
pub mod logs;
pub mod models;
pub mod nginx;
pub mod options;
pub mod store;
pub mod validate;
