//! Live (in-use) channel state.

use crate::registry::chan::Topic;
use slserv_proto::ChannelModes;
use std::collections::HashSet;

/// A channel currently in use on the network.
///
/// Exists exactly while it has members; the matching registered record
/// (if any) is found by name through the channel registry, never stored
/// as a pointer.
#[derive(Debug)]
pub struct LiveChannel {
    /// Case-preserved name.
    pub name: String,
    pub created: i64,
    pub topic: Option<Topic>,
    pub modes: ChannelModes,
    /// Ban masks in bounded, reusable slots.
    pub bans: Vec<Option<String>>,
    /// Folded nicks. Operators and voiced are always subsets of
    /// members.
    pub members: HashSet<String>,
    pub ops: HashSet<String>,
    pub voices: HashSet<String>,
    /// (second, count) of externally-sourced MODE changes, for bounce
    /// detection.
    pub server_modes: (i64, u32),
    /// (second, count) of corrective MODE changes we issued.
    pub fix_modes: (i64, u32),
    /// Modes are fighting a peer; lock enforcement is off until the
    /// channel is recreated.
    pub bouncy: bool,
}

impl LiveChannel {
    pub fn new(name: &str, now: i64) -> Self {
        Self {
            name: name.to_owned(),
            created: now,
            topic: None,
            modes: ChannelModes::default(),
            bans: Vec::new(),
            members: HashSet::new(),
            ops: HashSet::new(),
            voices: HashSet::new(),
            server_modes: (0, 0),
            fix_modes: (0, 0),
            bouncy: false,
        }
    }

    /// Add a ban mask, reusing the first vacant slot. Returns false
    /// when every slot is taken.
    pub fn add_ban(&mut self, mask: &str, max_slots: usize) -> bool {
        if self
            .bans
            .iter()
            .flatten()
            .any(|b| slserv_proto::irc_eq(b, mask))
        {
            return true;
        }
        if let Some(slot) = self.bans.iter_mut().find(|s| s.is_none()) {
            *slot = Some(mask.to_owned());
            return true;
        }
        if self.bans.len() >= max_slots {
            return false;
        }
        self.bans.push(Some(mask.to_owned()));
        true
    }

    /// Vacate a ban slot by mask.
    pub fn del_ban(&mut self, mask: &str) {
        for slot in &mut self.bans {
            if matches!(slot, Some(b) if slserv_proto::irc_eq(b, mask)) {
                *slot = None;
            }
        }
    }

    pub fn ban_masks(&self) -> Vec<&str> {
        self.bans.iter().flatten().map(String::as_str).collect()
    }

    /// Remove a user from all three membership lists.
    pub fn remove_member(&mut self, key: &str) {
        self.members.remove(key);
        self.ops.remove(key);
        self.voices.remove(key);
    }

    /// Count one externally-sourced MODE in the current second.
    pub fn count_server_mode(&mut self, now: i64) -> u32 {
        if self.server_modes.0 != now {
            self.server_modes = (now, 0);
        }
        self.server_modes.1 += 1;
        self.server_modes.1
    }

    /// Count one corrective MODE of ours in the current second.
    pub fn count_fix_mode(&mut self, now: i64) -> u32 {
        if self.fix_modes.0 != now {
            self.fix_modes = (now, 0);
        }
        self.fix_modes.1 += 1;
        self.fix_modes.1
    }

    /// Both counters for the same second, for bounce detection.
    pub fn counters_this_second(&self, now: i64) -> (u32, u32) {
        let server = if self.server_modes.0 == now {
            self.server_modes.1
        } else {
            0
        };
        let fix = if self.fix_modes.0 == now {
            self.fix_modes.1
        } else {
            0
        };
        (server, fix)
    }
}
