//! Live (connected) user state.

use slserv_proto::irc_to_lower;
use std::collections::HashSet;

/// User mode bits the daemon cares about.
#[derive(Debug, Default, Clone)]
pub struct UserModes {
    pub invisible: bool, // +i
    pub wallops: bool,   // +w
    pub oper: bool,      // +o (IRC operator)
}

impl UserModes {
    /// Apply a `+ow`-style mode string.
    pub fn apply(&mut self, mode_str: &str) {
        let mut adding = true;
        for ch in mode_str.chars() {
            match ch {
                '+' => adding = true,
                '-' => adding = false,
                'i' => self.invisible = adding,
                'w' => self.wallops = adding,
                'o' => self.oper = adding,
                _ => {}
            }
        }
    }
}

/// A connected user, one per network entity.
///
/// Identity pointers are folded registry keys, re-resolved on every
/// nick change; the registries never hand out references that could
/// dangle here.
#[derive(Debug)]
pub struct LiveUser {
    /// Case-preserved current nick.
    pub nick: String,
    pub user: String,
    pub host: String,
    pub realname: String,
    /// Folded name of the server this user is attributed to.
    pub server: String,
    /// Signon time reported by the network.
    pub signon: i64,
    /// When this daemon first saw the connection.
    pub my_signon: i64,
    pub modes: UserModes,
    /// Away message, if marked away.
    pub away: Option<String>,
    /// Folded names of joined channels.
    pub channels: HashSet<String>,
    /// Folded names of channels this user has password-identified to as
    /// founder. Separate from nickname identification.
    pub founder_chans: HashSet<String>,
    /// Registry key matching the current nick exactly, when registered.
    pub real_identity: Option<String>,
    /// Ultimate link target of the real identity; privilege and
    /// settings come from here.
    pub effective_identity: Option<String>,
    pub bad_pass_count: u32,
    /// Time of the last wrong password, for counter reset.
    pub bad_pass_time: i64,
    /// Time of the last REGISTER, for the registration cooldown.
    pub last_register: i64,
}

impl LiveUser {
    pub fn new(
        nick: &str,
        user: &str,
        host: &str,
        realname: &str,
        server: &str,
        signon: i64,
        now: i64,
    ) -> Self {
        Self {
            nick: nick.to_owned(),
            user: user.to_owned(),
            host: host.to_owned(),
            realname: realname.to_owned(),
            server: irc_to_lower(server),
            signon,
            my_signon: now,
            modes: UserModes::default(),
            away: None,
            channels: HashSet::new(),
            founder_chans: HashSet::new(),
            real_identity: None,
            effective_identity: None,
            bad_pass_count: 0,
            bad_pass_time: 0,
            last_register: 0,
        }
    }

    /// `user@host`, the shape autokill masks and access masks match.
    pub fn user_host(&self) -> String {
        format!("{}@{}", self.user, self.host)
    }

    /// `nick!user@host`, the shape auto-kick masks match.
    pub fn nick_user_host(&self) -> String {
        format!("{}!{}@{}", self.nick, self.user, self.host)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_are_constructed() {
        let u = LiveUser::new("Alice", "al", "example.com", "A", "hub.net", 1, 2);
        assert_eq!(u.user_host(), "al@example.com");
        assert_eq!(u.nick_user_host(), "Alice!al@example.com");
        assert_eq!(u.server, "hub.net");
    }

    #[test]
    fn user_modes_apply() {
        let mut m = UserModes::default();
        m.apply("+iwo");
        assert!(m.invisible && m.wallops && m.oper);
        m.apply("-o");
        assert!(!m.oper);
        m.apply("+x"); // unknown, ignored
    }
}
