//! Channel registry policy.

use serde::Deserialize;

/// Policy knobs for the channel registry.
#[derive(Debug, Clone, Deserialize)]
pub struct ChanServConfig {
    /// Seconds of disuse before a registered channel expires.
    #[serde(default = "default_expire")]
    pub expire: i64,
    /// Channels one identity may found; 0 means unlimited.
    #[serde(default = "default_max_registered")]
    pub max_registered: u32,
    /// Maximum entries on a channel access list.
    #[serde(default = "default_access_max")]
    pub access_max: usize,
    /// Maximum entries on a channel auto-kick list.
    #[serde(default = "default_akick_max")]
    pub akick_max: usize,
    /// Ban slots tracked per live channel.
    #[serde(default = "default_ban_slots")]
    pub ban_slots: usize,
    /// Seconds the service inhabits an otherwise-empty channel after an
    /// enforcement kick, so the ban it set can take hold.
    #[serde(default = "default_inhabit")]
    pub inhabit: i64,
    /// Corrective and external MODE counts that, reached in the same
    /// second, mark a channel's modes as bouncy.
    #[serde(default = "default_bounce_threshold")]
    pub bounce_threshold: u32,
}

impl Default for ChanServConfig {
    fn default() -> Self {
        Self {
            expire: default_expire(),
            max_registered: default_max_registered(),
            access_max: default_access_max(),
            akick_max: default_akick_max(),
            ban_slots: default_ban_slots(),
            inhabit: default_inhabit(),
            bounce_threshold: default_bounce_threshold(),
        }
    }
}

fn default_expire() -> i64 {
    14 * 24 * 3600
}

fn default_max_registered() -> u32 {
    20
}

fn default_access_max() -> usize {
    256
}

fn default_akick_max() -> usize {
    32
}

fn default_ban_slots() -> usize {
    64
}

fn default_inhabit() -> i64 {
    15
}

fn default_bounce_threshold() -> u32 {
    3
}
