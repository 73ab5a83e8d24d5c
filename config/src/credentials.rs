use serde::{
    Deserialize,
    Deserializer,
};
use std::fmt;

/// The single `user:pass` pair the API gate accepts.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Splits on the first `:`, so passwords may themselves contain colons.
    /// An empty string means no credential is configured.
    pub fn parse(value: &str) -> Result<Option<Self>, String> {
        if value.is_empty() {
            return Ok(None);
        }
        match value.split_once(':') {
            Some((username, password)) => Ok(Some(Self::new(username, password))),
            None => Err("credential must have the form `user:pass`".to_string()),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

// Keep the password out of logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

pub(crate) fn deserialize_optional<'de, D>(deserializer: D) -> Result<Option<Credentials>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
    Credentials::parse(&value).map_err(serde::de::Error::custom)
}
