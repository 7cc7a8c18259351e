//! Nginx server-block generation
//!
//! Pure text rendering, no I/O. The only input type accepted is the
//! validated `Domain`, so a raw string can never reach the template.

use crate::validate::Domain;

/// Base directory for deployed site content on the remote host. Must match
/// `RemoteLayout::default().web_root`.
pub const WEB_ROOT: &str = "/var/www";

/// Render a complete, self-contained HTTP server block for a deployed
/// static site. Deterministic: the same domain always produces byte-identical
/// output.
pub fn generate_config(domain: &Domain) -> String {
    format!(
        r#"server {{
    listen 80;
    listen [::]:80;

    server_name {domain};

    root {WEB_ROOT}/{domain};
    index index.html index.htm;

    location / {{
        try_files $uri $uri/ =404;
    }}

    location ~ /\. {{
        deny all;
    }}
}}
"#
    )
}
