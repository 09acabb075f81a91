//! Per-channel platform credentials.

use std::collections::HashMap;
use std::fmt;

use shortcast_models::{Channel, Platform};

/// An opaque platform access token.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token, for use by a transport.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Resolves the credential a channel uses on a platform.
pub trait CredentialProvider: Send + Sync {
    fn credential(&self, channel: Channel, platform: Platform) -> Option<Credential>;
}

/// Credentials loaded once at startup.
#[derive(Debug, Clone, Default)]
pub struct StaticCredentials {
    tokens: HashMap<(Channel, Platform), Credential>,
}

impl StaticCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, channel: Channel, platform: Platform, token: impl Into<String>) -> Self {
        self.insert(channel, platform, token);
        self
    }

    pub fn insert(&mut self, channel: Channel, platform: Platform, token: impl Into<String>) {
        self.tokens.insert((channel, platform), Credential::new(token));
    }

    /// Environment variable holding a token, e.g. `TECH_BUNI_YT_TOKEN`.
    pub fn env_var(channel: Channel, platform: Platform) -> String {
        format!("{}_{}_TOKEN", channel.env_name(), platform.short_code())
    }

    /// Load every `<CHANNEL>_<PLATFORM>_TOKEN` variable that is set.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load tokens through `lookup`, skipping empty values.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut creds = Self::new();
        for channel in Channel::ALL {
            for platform in Platform::ALL {
                if let Some(token) = lookup(&Self::env_var(channel, platform)) {
                    let token = token.trim();
                    if !token.is_empty() {
                        creds.insert(channel, platform, token);
                    }
                }
            }
        }
        creds
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl CredentialProvider for StaticCredentials {
    fn credential(&self, channel: Channel, platform: Platform) -> Option<Credential> {
        self.tokens.get(&(channel, platform)).cloned()
    }
}
