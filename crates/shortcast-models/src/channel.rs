//! Channels (content brands) and delivery platforms.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ModelError;

/// A logical content source, independent of the platform it posts to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    TechBuni,
    CookingBuni,
    TravelBuni,
    GamingBuni,
    LifeBuni,
}

impl Channel {
    /// Every known channel.
    pub const ALL: [Channel; 5] = [
        Channel::TechBuni,
        Channel::CookingBuni,
        Channel::TravelBuni,
        Channel::GamingBuni,
        Channel::LifeBuni,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::TechBuni => "tech_buni",
            Channel::CookingBuni => "cooking_buni",
            Channel::TravelBuni => "travel_buni",
            Channel::GamingBuni => "gaming_buni",
            Channel::LifeBuni => "life_buni",
        }
    }

    /// Upper-case form used in environment variable names (`TECH_BUNI`).
    pub fn env_name(&self) -> String {
        self.as_str().to_ascii_uppercase()
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Channel {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Channel::ALL
            .into_iter()
            .find(|c| c.as_str() == s.trim())
            .ok_or_else(|| ModelError::UnknownChannel(s.to_string()))
    }
}

/// An external delivery target.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Youtube,
    Tiktok,
    Instagram,
    Facebook,
}

impl Platform {
    /// Every known platform, in dispatch order.
    pub const ALL: [Platform; 4] = [
        Platform::Youtube,
        Platform::Tiktok,
        Platform::Instagram,
        Platform::Facebook,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Youtube => "youtube",
            Platform::Tiktok => "tiktok",
            Platform::Instagram => "instagram",
            Platform::Facebook => "facebook",
        }
    }

    /// Short code used in credential variable names (`TECH_BUNI_YT_TOKEN`).
    pub fn short_code(&self) -> &'static str {
        match self {
            Platform::Youtube => "YT",
            Platform::Tiktok => "TT",
            Platform::Instagram => "IG",
            Platform::Facebook => "FB",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Platform {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        Platform::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or(ModelError::UnknownPlatform(s))
    }
}
