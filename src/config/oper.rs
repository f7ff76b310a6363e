//! Network policing policy: services roots, autokill, session limits,
//! clone detection.

use serde::Deserialize;

/// Policy knobs for OperServ and the connect-time checks.
#[derive(Debug, Clone, Deserialize)]
pub struct OperServConfig {
    /// Nicknames with services-root privilege. Admin and operator lists
    /// are runtime sets edited through OperServ; the root list is fixed
    /// at startup.
    #[serde(default)]
    pub roots: Vec<String>,
    /// Maximum autokill entries.
    #[serde(default = "default_akill_max")]
    pub akill_max: usize,
    /// Default autokill expiry in seconds; 0 means never.
    #[serde(default = "default_akill_expiry")]
    pub akill_expiry: i64,
    /// Default sessions allowed per host when no exception matches.
    #[serde(default = "default_session_limit")]
    pub session_limit: u32,
    /// Maximum session-limit exception entries.
    #[serde(default = "default_exception_max")]
    pub exception_max: usize,
    /// Sliding window, in seconds, for clone detection.
    #[serde(default = "default_clone_window")]
    pub clone_window: i64,
    /// Connections from one host inside the window that count as clones.
    #[serde(default = "default_clone_trigger")]
    pub clone_trigger: u32,
    /// Seconds between repeated clone warnings for the same host.
    #[serde(default = "default_clone_warn_cooldown")]
    pub clone_warn_cooldown: i64,
    /// Disconnect clones instead of only warning operators.
    #[serde(default)]
    pub kill_clones: bool,
    /// Seconds after startup during which reactive op enforcement is
    /// suppressed, preventing mass-deop storms right after a link.
    #[serde(default = "default_startup_grace")]
    pub startup_grace: i64,
}

impl Default for OperServConfig {
    fn default() -> Self {
        Self {
            roots: Vec::new(),
            akill_max: default_akill_max(),
            akill_expiry: default_akill_expiry(),
            session_limit: default_session_limit(),
            exception_max: default_exception_max(),
            clone_window: default_clone_window(),
            clone_trigger: default_clone_trigger(),
            clone_warn_cooldown: default_clone_warn_cooldown(),
            kill_clones: false,
            startup_grace: default_startup_grace(),
        }
    }
}

fn default_akill_max() -> usize {
    1024
}

fn default_akill_expiry() -> i64 {
    30 * 24 * 3600
}

fn default_session_limit() -> u32 {
    3
}

fn default_exception_max() -> usize {
    128
}

fn default_clone_window() -> i64 {
    60
}

fn default_clone_trigger() -> u32 {
    5
}

fn default_clone_warn_cooldown() -> i64 {
    120
}

fn default_startup_grace() -> i64 {
    90
}
