//! API server configuration.

use std::collections::BTreeMap;
use std::path::PathBuf;

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "127.0.0.1:8080").
    pub bind_addr: String,
    /// Directory holding the RSA keypair and the token secret.
    pub keys_dir: PathBuf,
    /// Human-readable server name published in the API descriptor.
    pub server_name: String,
    /// Canonical host used for cache warm-up and link defaults when a
    /// request carries no Host header.
    pub server_host: String,
    /// Skin-domain whitelist published in the API descriptor.
    pub skin_domains: Vec<String>,
    /// Link templates; `{host}` is substituted per request.
    pub homepage_template: String,
    pub register_template: String,
    /// Allow authenticating with a profile name instead of an email.
    pub non_email_login: bool,
}

impl ApiConfig {
    /// Reads configuration from environment variables with sensible
    /// defaults.
    ///
    /// | Variable                | Default                         |
    /// |-------------------------|---------------------------------|
    /// | `ASKR_BIND_ADDR`        | `127.0.0.1:8080`                |
    /// | `ASKR_KEYS_DIR`         | `keys`                          |
    /// | `ASKR_SERVER_NAME`      | `askr`                          |
    /// | `ASKR_SERVER_HOST`      | derived from the bind address   |
    /// | `ASKR_SKIN_DOMAINS`     | empty (comma-separated list)    |
    /// | `ASKR_HOMEPAGE_URL`     | `http://{host}/`                |
    /// | `ASKR_REGISTER_URL`     | `http://{host}/auth/register`   |
    /// | `ASKR_NON_EMAIL_LOGIN`  | `false`                         |
    pub fn from_env() -> Self {
        let bind_addr =
            std::env::var("ASKR_BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".into());
        let server_host =
            std::env::var("ASKR_SERVER_HOST").unwrap_or_else(|_| bind_addr.clone());
        Self {
            bind_addr,
            keys_dir: std::env::var("ASKR_KEYS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("keys")),
            server_name: std::env::var("ASKR_SERVER_NAME").unwrap_or_else(|_| "askr".into()),
            server_host,
            skin_domains: std::env::var("ASKR_SKIN_DOMAINS")
                .map(|v| {
                    v.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
            homepage_template: std::env::var("ASKR_HOMEPAGE_URL")
                .unwrap_or_else(|_| "http://{host}/".into()),
            register_template: std::env::var("ASKR_REGISTER_URL")
                .unwrap_or_else(|_| "http://{host}/auth/register".into()),
            non_email_login: std::env::var("ASKR_NON_EMAIL_LOGIN")
                .map(|v| v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
        }
    }

    pub fn private_key_path(&self) -> PathBuf {
        self.keys_dir.join("private.pem")
    }

    pub fn public_key_path(&self) -> PathBuf {
        self.keys_dir.join("public.pem")
    }

    /// The descriptor link map for a given request host. `homepage`
    /// and `register` are always present.
    pub fn links(&self, host: &str) -> BTreeMap<String, String> {
        let mut links = BTreeMap::new();
        links.insert("homepage".to_string(), substitute(&self.homepage_template, host));
        links.insert("register".to_string(), substitute(&self.register_template, host));
        links
    }
}

fn substitute(template: &str, host: &str) -> String {
    template.replace("{host}", host)
}
