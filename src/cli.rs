//! Command-line flags

use std::path::PathBuf;

use clap::Parser;

/// Webhook receiver that runs a deployment script for pushed branches
#[derive(Parser, Debug)]
#[command(name = "hookdeploy")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to config file
    #[arg(long, env = "HOOKDEPLOY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Config given as a string
    #[arg(long = "string", env = "HOOKDEPLOY_CONFIG_STRING")]
    pub config_string: Option<String>,

    /// Shared webhook secret; signature checks are skipped when empty
    #[arg(long, env = "HOOKDEPLOY_SECRET", default_value = "", hide_env_values = true)]
    pub secret: String,

    /// Network address to listen on
    #[arg(long, env = "HOOKDEPLOY_ADDR", default_value = ":9090")]
    pub addr: String,

    /// URL path receiving webhook deliveries
    #[arg(long, env = "HOOKDEPLOY_PATH", default_value = "/deploy")]
    pub path: String,

    /// Path to PEM certificate chain (HTTPS when given with --key-file)
    #[arg(long = "cert-file", alias = "certFile", env = "HOOKDEPLOY_CERT_FILE")]
    pub cert_file: Option<PathBuf>,

    /// Path to PEM private key
    #[arg(long = "key-file", alias = "keyFile", env = "HOOKDEPLOY_KEY_FILE")]
    pub key_file: Option<PathBuf>,

    /// Maximum scripts running at once (0 = no limit)
    #[arg(long, env = "HOOKDEPLOY_MAX_CONCURRENT_SCRIPTS", default_value_t = 0)]
    pub max_concurrent_scripts: usize,

    /// Emit logs as JSON
    #[arg(long)]
    pub log_json: bool,
}

impl Cli {
    /// Address to bind; a bare `:port` listens on all interfaces.
    pub fn bind_addr(&self) -> String {
        if self.addr.starts_with(':') {
            format!("0.0.0.0{}", self.addr)
        } else {
            self.addr.clone()
        }
    }

    /// Webhook path, always rooted.
    pub fn route_path(&self) -> String {
        if self.path.starts_with('/') {
            self.path.clone()
        } else {
            format!("/{}", self.path)
        }
    }

    /// Certificate and key, only when both are given.
    pub fn tls_files(&self) -> Option<(&PathBuf, &PathBuf)> {
        match (&self.cert_file, &self.key_file) {
            (Some(cert), Some(key)) if !cert.as_os_str().is_empty() && !key.as_os_str().is_empty() => {
                Some((cert, key))
            }
            _ => None,
        }
    }
}
