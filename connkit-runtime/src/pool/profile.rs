use std::time::Duration;

use serde::Deserialize;

/// What `borrow` does when a key has `max_active` objects out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExhaustedAction {
    /// Fail immediately with `PoolError::Exhausted`.
    Fail,
    /// Wait for a return, up to `max_wait`.
    Block,
    /// Create a new object regardless of the limit.
    Grow,
}

/// Pooling profile as configured on a connection manager or pool adapter.
///
/// Negative limits mean "unlimited"; a non-positive `max_wait_ms` blocks
/// until an object is available.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct PoolingProfile {
    pub max_active: i64,
    pub max_idle: i64,
    pub max_wait_ms: i64,
    pub exhausted_action: ExhaustedAction,
}

impl PoolingProfile {
    pub const DEFAULT_MAX_ACTIVE: i64 = 5;
    pub const DEFAULT_MAX_IDLE: i64 = 5;
    pub const DEFAULT_MAX_WAIT_MS: i64 = 4000;
}

impl Default for PoolingProfile {
    fn default() -> Self {
        Self {
            max_active: Self::DEFAULT_MAX_ACTIVE,
            max_idle: Self::DEFAULT_MAX_IDLE,
            max_wait_ms: Self::DEFAULT_MAX_WAIT_MS,
            exhausted_action: ExhaustedAction::Grow,
        }
    }
}

/// Effective pool limits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    /// Objects handed out per key at once; `None` is unlimited.
    pub max_active: Option<usize>,
    /// Idle objects kept per key; `None` is unlimited.
    pub max_idle: Option<usize>,
    /// How long `Block` waits; `None` waits indefinitely.
    pub max_wait: Option<Duration>,
    pub exhausted_action: ExhaustedAction,
}

impl Default for PoolConfig {
    /// Defaults used when no pooling profile is configured.
    fn default() -> Self {
        Self {
            max_active: Some(8),
            max_idle: Some(8),
            max_wait: None,
            exhausted_action: ExhaustedAction::Block,
        }
    }
}

impl From<&PoolingProfile> for PoolConfig {
    fn from(profile: &PoolingProfile) -> Self {
        let limit = |v: i64| usize::try_from(v).ok();
        Self {
            max_active: limit(profile.max_active),
            max_idle: limit(profile.max_idle),
            max_wait: u64::try_from(profile.max_wait_ms)
                .ok()
                .filter(|ms| *ms > 0)
                .map(Duration::from_millis),
            exhausted_action: profile.exhausted_action,
        }
    }
}

impl PoolConfig {
    /// The profile's limits when one is configured, pool defaults otherwise.
    pub fn from_profile(profile: Option<&PoolingProfile>) -> Self {
        profile.map(Self::from).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_defaults() {
        let config = PoolConfig::from(&PoolingProfile::default());
        assert_eq!(config.max_active, Some(5));
        assert_eq!(config.max_wait, Some(Duration::from_millis(4000)));
        assert_eq!(config.exhausted_action, ExhaustedAction::Grow);
    }

    #[test]
    fn test_negative_limits_are_unlimited() {
        let profile = PoolingProfile {
            max_active: -1,
            max_idle: -1,
            max_wait_ms: 0,
            exhausted_action: ExhaustedAction::Block,
        };
        let config = PoolConfig::from(&profile);
        assert_eq!(config.max_active, None);
        assert_eq!(config.max_idle, None);
        assert_eq!(config.max_wait, None);
    }

    #[test]
    fn test_absent_profile_uses_pool_defaults() {
        let config = PoolConfig::from_profile(None);
        assert_eq!(config, PoolConfig::default());
        assert_eq!(config.exhausted_action, ExhaustedAction::Block);
    }

    #[test]
    fn test_profile_from_toml() {
        let profile: PoolingProfile = toml::from_str(
            r#"
max-active = 2
exhausted-action = "fail"
"#,
        )
        .unwrap();
        assert_eq!(profile.max_active, 2);
        assert_eq!(profile.max_idle, PoolingProfile::DEFAULT_MAX_IDLE);
        assert_eq!(profile.exhausted_action, ExhaustedAction::Fail);
    }
}
