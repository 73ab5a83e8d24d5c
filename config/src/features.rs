use serde::{
    Deserialize,
    Serialize,
};

/// On/off state of the optional capabilities of the sync server.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureFlags {
    #[serde(default)]
    pub backup: bool,
    #[serde(default)]
    pub s3: bool,
    #[serde(default)]
    pub metrics: bool,
    #[serde(default)]
    pub fail2ban: bool,
    #[serde(default)]
    pub notifications: bool,
    #[serde(default)]
    pub rate_limit: bool,
    /// Always on: whoever reads the flags is talking to the dashboard.
    #[serde(skip_deserializing, default = "always_on")]
    pub dashboard: bool,
}

fn always_on() -> bool {
    true
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            backup: false,
            s3: false,
            metrics: false,
            fail2ban: false,
            notifications: false,
            rate_limit: false,
            dashboard: true,
        }
    }
}

impl FeatureFlags {
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, bool)> {
        [
            ("backup", self.backup),
            ("s3", self.s3),
            ("metrics", self.metrics),
            ("fail2ban", self.fail2ban),
            ("notifications", self.notifications),
            ("rate_limit", self.rate_limit),
            ("dashboard", self.dashboard),
        ]
        .into_iter()
    }

    pub fn enabled_count(&self) -> usize {
        self.iter().filter(|(_, enabled)| *enabled).count()
    }
}
