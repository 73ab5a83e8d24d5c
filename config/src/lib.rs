#[macro_use]
extern crate tracing;

mod args;
mod credentials;
mod features;

pub use args::{
    parse_toggle,
    Args,
    LogFormat,
};
pub use credentials::Credentials;
pub use features::FeatureFlags;
use serde::{
    Deserialize,
    Deserializer,
};
use std::{
    net::{
        IpAddr,
        SocketAddr,
    },
    path::{
        Path,
        PathBuf,
    },
    time::Duration,
};

const DEFAULT_CONFIG: &str = include_str!("default-config.yaml");

/// Everything the status service knows about its environment. Built once at
/// start-up and handed to every collector by reference.
#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    #[serde(deserialize_with = "credentials::deserialize_optional")]
    pub auth: Option<Credentials>,
    pub data_dir: PathBuf,
    pub backup_dir: PathBuf,
    pub log_dir: PathBuf,
    pub state_dir: PathBuf,
    pub proc_dir: PathBuf,
    pub features: FeatureFlags,
    pub backup: BackupConfig,
    pub notify: NotifyConfig,
    pub logs: LogConfig,
}

#[derive(Clone, Debug, Deserialize)]
pub struct BackupConfig {
    pub script: PathBuf,
    #[serde(deserialize_with = "deserialize_duration")]
    pub timeout: Duration,
    pub archive_suffix: String,
    /// Upper bound on the number of archives reported by a listing.
    pub list_limit: usize,
    /// Number of archive names embedded in the combined status payload.
    pub recent_limit: usize,
}

#[derive(Clone, Debug, Deserialize)]
pub struct NotifyConfig {
    pub script: PathBuf,
    #[serde(deserialize_with = "deserialize_duration")]
    pub timeout: Duration,
}

#[derive(Clone, Debug, Deserialize)]
pub struct LogConfig {
    pub default_lines: usize,
    pub max_lines: usize,
    /// Number of trailing lines scanned when counting auth outcomes and syncs.
    pub scan_window: usize,
    pub chart_days: u32,
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    humantime::parse_duration(&value).map_err(serde::de::Error::custom)
}

impl Default for Config {
    fn default() -> Self {
        serde_yml::from_str(DEFAULT_CONFIG).expect("Failed to parse default config")
    }
}

impl Config {
    pub fn new(args: Args) -> Result<Self, config::ConfigError> {
        let mut builder =
            config::Config::builder().add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Yaml));

        if let Some(path) = &args.config {
            debug!(path = %path.display(), "Layering config file over defaults");
            builder = builder.add_source(config::File::from(path.as_path()).format(config::FileFormat::Yaml));
        }

        builder = builder.add_source(args);

        let cfg: Self = builder.build()?.try_deserialize()?;

        if cfg.auth.is_none() {
            warn!("DASHBOARD_AUTH is not set, the API is reachable without credentials");
        }

        Ok(cfg)
    }

    pub fn listen_address(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    pub fn state_dir(&self) -> &Path {
        &self.state_dir
    }

    /// A configuration rooted entirely under `root`, used by tests that build
    /// throwaway server trees.
    pub fn rooted_at(root: &Path) -> Self {
        Self {
            data_dir: root.join("data"),
            backup_dir: root.join("backups"),
            log_dir: root.join("logs"),
            state_dir: root.join("state"),
            proc_dir: root.join("proc"),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use temp_dir::TempDir;

    #[test]
    fn embedded_defaults_parse() {
        let config = Config::default();

        assert_eq!(config.listen_address(), "0.0.0.0:8081".parse().unwrap());
        assert_eq!(config.auth, None);
        assert_eq!(config.data_dir(), Path::new("/data"));
        assert_eq!(config.backup.timeout, Duration::from_secs(300));
        assert_eq!(config.notify.timeout, Duration::from_secs(30));
        assert_eq!(config.backup.list_limit, 20);
        assert_eq!(config.logs.max_lines, 1000);
        assert_eq!(config.features, FeatureFlags::default());
    }

    #[test]
    fn arguments_override_file_which_overrides_defaults() {
        let dir = TempDir::new().unwrap();
        let file = dir.child("dashboard.yaml");
        std::fs::write(
            &file,
            "port: 9090\nbackup_dir: /mnt/backups\nbackup:\n  timeout: 90s\nfeatures:\n  metrics: true\n",
        )
        .unwrap();

        let args = Args {
            config: Some(file),
            port: Some(9191),
            auth: Some("admin:hunter2".to_string()),
            fail2ban_enabled: Some(true),
            ..Default::default()
        };
        let config = Config::new(args).unwrap();

        assert_eq!(config.port, 9191);
        assert_eq!(config.backup_dir(), Path::new("/mnt/backups"));
        assert_eq!(config.backup.timeout, Duration::from_secs(90));
        assert_eq!(config.backup.script, Path::new("/usr/local/bin/backup.sh"));
        assert_eq!(config.auth, Some(Credentials::new("admin", "hunter2")));
        assert!(config.features.metrics);
        assert!(config.features.fail2ban);
        assert!(!config.features.backup);
        assert!(config.features.dashboard);
    }

    #[test]
    fn credential_without_separator_is_rejected() {
        let args = Args {
            auth: Some("just-a-password".to_string()),
            ..Default::default()
        };

        assert!(Config::new(args).is_err());
    }
}
