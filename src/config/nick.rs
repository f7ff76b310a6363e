//! Nickname registry policy.

use serde::Deserialize;

/// Policy knobs for the nickname registry and its enforcement timers.
#[derive(Debug, Clone, Deserialize)]
pub struct NickServConfig {
    /// Seconds of inactivity before a registered nickname expires.
    #[serde(default = "default_expire")]
    pub expire: i64,
    /// Seconds a user must wait between nickname registrations.
    #[serde(default = "default_reg_delay")]
    pub reg_delay: i64,
    /// Minimum password length; 0 disables the check.
    #[serde(default = "default_min_password_len")]
    pub min_password_len: usize,
    /// Maximum entries on an access-mask list.
    #[serde(default = "default_access_max")]
    pub access_max: usize,
    /// Seconds before a "quick" kill-protection collide fires.
    #[serde(default = "default_kill_quick")]
    pub kill_quick: i64,
    /// Seconds before a normal kill-protection collide fires.
    #[serde(default = "default_kill_delay")]
    pub kill_delay: i64,
    /// Seconds an enforced nick stays held before automatic release.
    #[serde(default = "default_release_timeout")]
    pub release_timeout: i64,
    /// Grace period before a forbidden nick's holder is disconnected.
    #[serde(default = "default_forbid_grace")]
    pub forbid_grace: i64,
    /// Wrong passwords tolerated per connection before disconnect.
    #[serde(default = "default_bad_pass_limit")]
    pub bad_pass_limit: u32,
    /// Seconds after which a connection's bad-password counter resets.
    #[serde(default = "default_bad_pass_timeout")]
    pub bad_pass_timeout: i64,
}

impl Default for NickServConfig {
    fn default() -> Self {
        Self {
            expire: default_expire(),
            reg_delay: default_reg_delay(),
            min_password_len: default_min_password_len(),
            access_max: default_access_max(),
            kill_quick: default_kill_quick(),
            kill_delay: default_kill_delay(),
            release_timeout: default_release_timeout(),
            forbid_grace: default_forbid_grace(),
            bad_pass_limit: default_bad_pass_limit(),
            bad_pass_timeout: default_bad_pass_timeout(),
        }
    }
}

fn default_expire() -> i64 {
    30 * 24 * 3600
}

fn default_reg_delay() -> i64 {
    30
}

fn default_min_password_len() -> usize {
    5
}

fn default_access_max() -> usize {
    32
}

fn default_kill_quick() -> i64 {
    20
}

fn default_kill_delay() -> i64 {
    60
}

fn default_release_timeout() -> i64 {
    60
}

fn default_forbid_grace() -> i64 {
    10
}

fn default_bad_pass_limit() -> u32 {
    3
}

fn default_bad_pass_timeout() -> i64 {
    3600
}
