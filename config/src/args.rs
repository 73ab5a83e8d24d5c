use clap::Parser;
use std::{
    collections::HashMap,
    net::IpAddr,
    path::PathBuf,
};
use strum::{
    Display,
    EnumString,
};

/// Anki sync server status dashboard
#[derive(Parser, Debug, Clone, Default)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Optional YAML file layered over the built-in defaults.
    #[arg(long, env = "DASHBOARD_CONFIG")]
    pub config: Option<PathBuf>,

    /// IP address to listen on.
    #[arg(long, env = "DASHBOARD_LISTEN_ADDRESS")]
    pub host: Option<IpAddr>,

    /// Port to listen on.
    #[arg(long, env = "DASHBOARD_PORT")]
    pub port: Option<u16>,

    /// Dashboard credential as `user:pass`. Leave empty to disable the auth gate.
    #[arg(long, env = "DASHBOARD_AUTH", hide_env_values = true)]
    pub auth: Option<String>,

    /// Root directory holding one sub-directory per sync user.
    #[arg(long, env = "SYNC_BASE")]
    pub data_dir: Option<PathBuf>,

    /// Directory the backup script writes archives into.
    #[arg(long, env = "BACKUP_DIR")]
    pub backup_dir: Option<PathBuf>,

    /// Directory holding sync.log, auth.log and backup.log.
    #[arg(long, env = "LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    /// Directory holding the state files written by the sync server.
    #[arg(long, env = "STATE_DIR")]
    pub state_dir: Option<PathBuf>,

    /// Executable that creates a new backup archive.
    #[arg(long, env = "BACKUP_SCRIPT")]
    pub backup_script: Option<PathBuf>,

    /// Executable that delivers a notification message.
    #[arg(long, env = "NOTIFY_SCRIPT")]
    pub notify_script: Option<PathBuf>,

    #[arg(long, env = "BACKUP_ENABLED", value_parser = parse_toggle)]
    pub backup_enabled: Option<bool>,

    #[arg(long, env = "S3_BACKUP_ENABLED", value_parser = parse_toggle)]
    pub s3_enabled: Option<bool>,

    #[arg(long, env = "METRICS_ENABLED", value_parser = parse_toggle)]
    pub metrics_enabled: Option<bool>,

    #[arg(long, env = "FAIL2BAN_ENABLED", value_parser = parse_toggle)]
    pub fail2ban_enabled: Option<bool>,

    #[arg(long, env = "NOTIFY_ENABLED", value_parser = parse_toggle)]
    pub notify_enabled: Option<bool>,

    #[arg(long, env = "RATE_LIMIT_ENABLED", value_parser = parse_toggle)]
    pub rate_limit_enabled: Option<bool>,

    /// Log output format.
    #[arg(long, env = "DASHBOARD_LOG_FORMAT", default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,

    /// Should the HTTP server terminate TLS connections?
    #[arg(long, action, env = "DASHBOARD_TLS", requires_all = ["certificate", "private_key"])]
    pub tls: bool,

    /// Path to the PEM encoded X.509 certificate.
    #[arg(long, env = "DASHBOARD_TLS_CERTIFICATE")]
    pub certificate: Option<PathBuf>,

    /// Path to the PEM encoded private key for the certificate.
    #[arg(long, env = "DASHBOARD_TLS_PRIVATE_KEY")]
    pub private_key: Option<PathBuf>,
}

#[derive(Debug, Default, Clone, Copy, Display, EnumString, clap::ValueEnum, PartialEq, Eq)]
#[strum(serialize_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Toggle values follow the shell conventions of the sync server's
/// environment: anything that is not a recognised "on" spelling is off.
pub fn parse_toggle(value: &str) -> Result<bool, String> {
    Ok(matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes" | "on"
    ))
}

fn path_value(path: &std::path::Path) -> config::Value {
    path.to_string_lossy().into_owned().into()
}

impl config::Source for Args {
    fn clone_into_box(&self) -> Box<dyn config::Source + Send + Sync> {
        Box::new((*self).clone())
    }

    fn collect(&self) -> Result<config::Map<String, config::Value>, config::ConfigError> {
        let mut cache = HashMap::<String, config::Value>::new();

        if let Some(host) = &self.host {
            cache.insert("host".to_string(), host.to_string().into());
        }
        if let Some(port) = self.port {
            cache.insert("port".to_string(), i64::from(port).into());
        }
        if let Some(auth) = &self.auth {
            cache.insert("auth".to_string(), auth.clone().into());
        }

        let paths = [
            ("data_dir", &self.data_dir),
            ("backup_dir", &self.backup_dir),
            ("log_dir", &self.log_dir),
            ("state_dir", &self.state_dir),
            ("backup.script", &self.backup_script),
            ("notify.script", &self.notify_script),
        ];
        for (key, value) in paths {
            if let Some(path) = value {
                cache.insert(key.to_string(), path_value(path));
            }
        }

        let toggles = [
            ("features.backup", self.backup_enabled),
            ("features.s3", self.s3_enabled),
            ("features.metrics", self.metrics_enabled),
            ("features.fail2ban", self.fail2ban_enabled),
            ("features.notifications", self.notify_enabled),
            ("features.rate_limit", self.rate_limit_enabled),
        ];
        for (key, value) in toggles {
            if let Some(enabled) = value {
                cache.insert(key.to_string(), enabled.into());
            }
        }

        Ok(cache)
    }
}
