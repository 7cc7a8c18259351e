//! Site record model

use serde::{Deserialize, Serialize};

/// Deployment status of a site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SiteStatus {
    Active,
    Suspended,
    Deleted,
}

/// TLS provisioning status of a site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TlsStatus {
    None,
    Pending,
    Active,
    Failed,
}

/// A site record, owned by the external record store.
///
/// The domain is stored as raw text and re-validated at the start of every
/// operation; it is never trusted across calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Site {
    /// Unique site ID
    pub id: String,

    /// Authoritative hostname for the deployment
    pub domain: String,

    /// Current deployment status
    pub status: SiteStatus,

    /// Current TLS status
    pub tls_status: TlsStatus,

    /// Remote path of the last successful deployment
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deployed_path: Option<String>,

    /// IP of the remote server hosting this site
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_ip: Option<String>,
}
