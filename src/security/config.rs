use crate::utils::get_env_with_prefix;
use serde::{Deserialize, Serialize};

/// X-Frame-Options header value
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum XFrameOptions {
    #[default]
    Deny,
    SameOrigin,
}

/// Referrer-Policy header value
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReferrerPolicy {
    #[default]
    NoReferrer,
    SameOrigin,
    StrictOriginWhenCrossOrigin,
}

impl ReferrerPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoReferrer => "no-referrer",
            Self::SameOrigin => "same-origin",
            Self::StrictOriginWhenCrossOrigin => "strict-origin-when-cross-origin",
        }
    }
}

/// Cross-Origin-Resource-Policy header value
///
/// Defaults to `cross-origin` so the payment popup and the web frontend,
/// served from other origins, can read API responses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CrossOriginResourcePolicy {
    SameOrigin,
    SameSite,
    #[default]
    CrossOrigin,
}

impl CrossOriginResourcePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SameOrigin => "same-origin",
            Self::SameSite => "same-site",
            Self::CrossOrigin => "cross-origin",
        }
    }
}

/// Cross-Origin-Opener-Policy header value
///
/// Defaults to `unsafe-none`; the hosted card popup needs its opener.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CrossOriginOpenerPolicy {
    SameOrigin,
    SameOriginAllowPopups,
    #[default]
    UnsafeNone,
}

impl CrossOriginOpenerPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SameOrigin => "same-origin",
            Self::SameOriginAllowPopups => "same-origin-allow-popups",
            Self::UnsafeNone => "unsafe-none",
        }
    }
}

/// Security headers configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SecurityConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Strict-Transport-Security max age in seconds. `0` disables HSTS.
    #[serde(default = "default_hsts_max_age")]
    pub hsts_max_age: u64,

    #[serde(default = "default_true")]
    pub hsts_include_subdomains: bool,

    #[serde(default = "default_true")]
    pub nosniff: bool,

    #[serde(default)]
    pub x_frame_options: Option<XFrameOptions>,

    #[serde(default)]
    pub referrer_policy: Option<ReferrerPolicy>,

    #[serde(default)]
    pub cross_origin_resource_policy: Option<CrossOriginResourcePolicy>,

    #[serde(default)]
    pub cross_origin_opener_policy: Option<CrossOriginOpenerPolicy>,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            hsts_max_age: default_hsts_max_age(),
            hsts_include_subdomains: true,
            nosniff: true,
            x_frame_options: Some(XFrameOptions::default()),
            referrer_policy: Some(ReferrerPolicy::default()),
            cross_origin_resource_policy: Some(CrossOriginResourcePolicy::default()),
            cross_origin_opener_policy: Some(CrossOriginOpenerPolicy::default()),
        }
    }
}

impl SecurityConfig {
    /// Load security configuration from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(enabled) = get_env_with_prefix("SECURITY_ENABLED") {
            config.enabled = enabled.parse().unwrap_or(true);
        }

        if let Some(max_age) = get_env_with_prefix("SECURITY_HSTS_MAX_AGE") {
            if let Ok(age) = max_age.parse() {
                config.hsts_max_age = age;
            }
        }

        config
    }
}

fn default_enabled() -> bool {
    true
}

fn default_true() -> bool {
    true
}

fn default_hsts_max_age() -> u64 {
    15_552_000 // 180 days
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_cross_origin_policies() {
        let config = SecurityConfig::default();
        assert_eq!(
            config.cross_origin_resource_policy.map(|p| p.as_str()),
            Some("cross-origin")
        );
        assert_eq!(
            config.cross_origin_opener_policy.map(|p| p.as_str()),
            Some("unsafe-none")
        );
        assert_eq!(config.x_frame_options, Some(XFrameOptions::Deny));
    }
}
