//! Orchestrator configuration options

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use crate::validate::Domain;

/// Connection options for the SSH channel.
#[derive(Debug, Clone)]
pub struct ChannelOptions {
    /// Remote host to connect to
    pub host: String,

    /// SSH port
    pub port: u16,

    /// Login user; must hold passwordless elevation for the administrative
    /// commands the orchestrators issue
    pub user: String,

    /// Path to the private key used for authentication
    pub key_path: PathBuf,

    /// Optional passphrase for the private key
    pub key_passphrase: Option<SecretString>,

    /// Transport inactivity timeout
    pub inactivity_timeout: Duration,
}

impl Default for ChannelOptions {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 22,
            user: "root".to_string(),
            key_path: PathBuf::from("/etc/sitewright/id_ed25519"),
            key_passphrase: None,
            inactivity_timeout: Duration::from_secs(300), // 5 minutes
        }
    }
}

/// Filesystem layout on the remote host.
///
/// Paths for a concrete site are derived through the accessor methods, which
/// only accept the validated `Domain` type.
#[derive(Debug, Clone)]
pub struct RemoteLayout {
    /// Base directory for deployed site content
    pub web_root: String,

    /// Directory holding installed nginx server blocks
    pub sites_available: String,

    /// Directory of enabled server-block symlinks
    pub sites_enabled: String,

    /// Staging directory for config uploads before the privileged move
    pub staging_dir: String,
}

impl RemoteLayout {
    /// Content directory for a site.
    pub fn content_dir(&self, domain: &Domain) -> String {
        format!("{}/{}", self.web_root, domain)
    }

    /// Installed server-block path for a site.
    pub fn config_path(&self, domain: &Domain) -> String {
        format!("{}/{}", self.sites_available, domain)
    }

    /// Enabled-symlink path for a site.
    pub fn enabled_path(&self, domain: &Domain) -> String {
        format!("{}/{}", self.sites_enabled, domain)
    }

    /// Staging path a rendered config is uploaded to before the move.
    pub fn staging_path(&self, domain: &Domain) -> String {
        format!("{}/{}.conf", self.staging_dir, domain)
    }
}

impl Default for RemoteLayout {
    fn default() -> Self {
        Self {
            web_root: crate::nginx::WEB_ROOT.to_string(),
            sites_available: "/etc/nginx/sites-available".to_string(),
            sites_enabled: "/etc/nginx/sites-enabled".to_string(),
            staging_dir: "/tmp".to_string(),
        }
    }
}

/// Options shared by the deployment and TLS orchestrators.
#[derive(Debug, Clone)]
pub struct OrchestratorOptions {
    /// Remote filesystem layout
    pub layout: RemoteLayout,

    /// Contact email passed to the certificate-issuance tool
    pub contact_email: String,
}

impl Default for OrchestratorOptions {
    fn default() -> Self {
        Self {
            layout: RemoteLayout::default(),
            contact_email: "admin@example.com".to_string(),
        }
    }
}
