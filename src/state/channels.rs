//! Channel lifecycle and enforcement.
//!
//! A live channel is created exactly when the first user joins and
//! destroyed exactly when the last member leaves. Creation restores the
//! registered mode lock and retained topic before the joining user is
//! added; `check_kick` runs before membership, so an unwanted user never
//! appears on the member list at all.

use super::Network;
use crate::registry::chan::{self, ChanAction, ChanRecord, Topic, ACCESS_FOUNDER};
use crate::timers::TimerKind;
use slserv_proto::irc_to_lower;
use slserv_proto::mode::{parse_channel_modes, ModeChange, ModeLineBuilder};

use super::channel::LiveChannel;
use tracing::{debug, error, info, warn};

impl Network {
    /// Numeric access level of a live user on a registered channel.
    pub fn user_level(&mut self, user_key: &str, chan_name: &str) -> i16 {
        let chan_key = irc_to_lower(chan_name);
        let Some(founder) = self.chans.get(&chan_key).map(|r| r.founder.clone()) else {
            return 0;
        };
        let founder_group = self.nicks.resolve_effective(&founder).unwrap_or(founder);

        let Some((effective, real, chan_identified)) = self.users.get(user_key).map(|u| {
            (
                u.effective_identity.clone(),
                u.real_identity.clone(),
                u.founder_chans.contains(&chan_key),
            )
        }) else {
            return 0;
        };
        let Some(record) = self.chans.get(&chan_key) else {
            return 0;
        };
        // A secure channel takes a password, not mask recognition.
        let trusted = real
            .as_deref()
            .and_then(|key| self.nicks.get(key))
            .map(|r| {
                if record.flags.secure {
                    r.identified
                } else {
                    r.trusted()
                }
            })
            .unwrap_or(false);
        chan::get_access(
            record,
            effective.as_deref(),
            trusted,
            &founder_group,
            chan_identified,
        )
    }

    /// A user joined a channel.
    pub fn join_channel(&mut self, user_key: &str, chan_name: &str, now: i64) {
        let user_key = irc_to_lower(user_key);
        if !self.users.contains_key(&user_key) {
            warn!(nick = %user_key, channel = %chan_name, "join by unknown user");
            return;
        }

        if self.check_kick(&user_key, chan_name, now) {
            return;
        }

        let chan_key = irc_to_lower(chan_name);
        if !self.channels.contains_key(&chan_key) {
            // Creation order matters: allocate, restore locked modes,
            // restore retained topic, then add the joining user.
            self.channels
                .insert(chan_key.clone(), LiveChannel::new(chan_name, now));
            self.check_modes(&chan_key, now);
            self.restore_topic(&chan_key);
        }

        if let Some(channel) = self.channels.get_mut(&chan_key) {
            channel.members.insert(user_key.clone());
        }
        if let Some(user) = self.users.get_mut(&user_key) {
            user.channels.insert(chan_key.clone());
        }

        self.apply_join_privileges(&user_key, &chan_key, now);
    }

    /// Auto-op/auto-voice and greeting for a user who just joined.
    fn apply_join_privileges(&mut self, user_key: &str, chan_key: &str, now: i64) {
        if self.chans.get(chan_key).is_none() {
            return;
        }
        let level = self.user_level(user_key, chan_key);
        let Some(nick) = self.users.get(user_key).map(|u| u.nick.clone()) else {
            return;
        };
        let chanserv = self.chanserv();

        let Some(record) = self.chans.get(chan_key) else {
            return;
        };
        let should_op = chan::check_access(record, level, ChanAction::AutoOp);
        let should_voice = !should_op && chan::check_access(record, level, ChanAction::AutoVoice);
        let entry_msg = record.entry_msg.clone();
        let chan_name = record.name.clone();

        if should_op {
            self.transport
                .send(&chanserv, &format!("MODE {} +o {}", chan_name, nick));
            if let Some(channel) = self.channels.get_mut(chan_key) {
                channel.ops.insert(user_key.to_owned());
            }
        } else if should_voice {
            self.transport
                .send(&chanserv, &format!("MODE {} +v {}", chan_name, nick));
            if let Some(channel) = self.channels.get_mut(chan_key) {
                channel.voices.insert(user_key.to_owned());
            }
        }

        if let Some(msg) = entry_msg {
            self.notice(&chanserv, &nick, &format!("[{}] {}", chan_name, msg));
        }

        if level > 0 {
            if let Some(record) = self.chans.get_mut(chan_key) {
                record.last_used = now;
            }
        }
    }

    /// Decide whether a joining user must be thrown back out. Runs
    /// before the user is added to membership. Returns true when the
    /// user was kicked.
    pub fn check_kick(&mut self, user_key: &str, chan_name: &str, now: i64) -> bool {
        let chan_key = irc_to_lower(chan_name);
        let (forbidden, suspended) = match self.chans.get(&chan_key) {
            Some(record) => (record.forbidden, record.suspended),
            None => return false,
        };
        if suspended {
            return false;
        }

        let reason: Option<String> = if forbidden {
            Some("This channel may not be used.".to_owned())
        } else {
            let Some((effective, nick_user_host)) = self
                .users
                .get(user_key)
                .map(|u| (u.effective_identity.clone(), u.nick_user_host()))
            else {
                return false;
            };
            let akick_reason = self.chans.get(&chan_key).and_then(|record| {
                record
                    .akick_match(effective.as_deref(), &nick_user_host)
                    .map(|entry| {
                        entry
                            .reason
                            .clone()
                            .unwrap_or_else(|| "You have been banned from the channel".to_owned())
                    })
            });
            if akick_reason.is_some() {
                akick_reason
            } else if !self.in_startup_grace(now) {
                let level = self.user_level(user_key, &chan_key);
                let Some(record) = self.chans.get(&chan_key) else {
                    return false;
                };
                if chan::check_access(record, level, ChanAction::NoJoin)
                    || (record.flags.restricted && level <= 0)
                {
                    Some("You are not permitted to be on this channel.".to_owned())
                } else {
                    None
                }
            } else {
                None
            }
        };

        let Some(reason) = reason else {
            return false;
        };
        let Some((nick, user, host)) = self
            .users
            .get(user_key)
            .map(|u| (u.nick.clone(), u.user.clone(), u.host.clone()))
        else {
            return false;
        };
        let chan_display = self
            .chans
            .get(&chan_key)
            .map(|r| r.name.clone())
            .unwrap_or_else(|| chan_name.to_owned());
        let ban_mask = format!("*!{}@{}", user, host);
        let chanserv = self.chanserv();
        info!(nick = %nick, channel = %chan_display, reason = %reason, "enforcement kick");

        if self.channels.contains_key(&chan_key) {
            let slots = self.config.chanserv.ban_slots;
            if let Some(channel) = self.channels.get_mut(&chan_key) {
                channel.add_ban(&ban_mask, slots);
            }
            self.transport
                .send(&chanserv, &format!("MODE {} +b {}", chan_display, ban_mask));
            self.transport.send(
                &chanserv,
                &format!("KICK {} {} :{}", chan_display, nick, reason),
            );
        } else {
            // Nobody is on the channel yet. Join, take op, set the ban,
            // kick, and stick around briefly so the ban can apply.
            self.transport
                .send(&chanserv, &format!("JOIN {}", chan_display));
            self.transport
                .send(&chanserv, &format!("MODE {} +o {}", chan_display, chanserv));
            self.transport
                .send(&chanserv, &format!("MODE {} +b {}", chan_display, ban_mask));
            self.transport.send(
                &chanserv,
                &format!("KICK {} {} :{}", chan_display, nick, reason),
            );
            self.timers.schedule(
                TimerKind::InhabitPart,
                &chan_key,
                now + self.config.chanserv.inhabit,
            );
        }
        true
    }

    /// Delayed part after an enforcement kick on an empty channel.
    pub(super) fn inhabit_part(&mut self, chan_key: &str) {
        let chan_display = self
            .chans
            .get(chan_key)
            .map(|r| r.name.clone())
            .unwrap_or_else(|| chan_key.to_owned());
        let chanserv = self.chanserv();
        self.transport
            .send(&chanserv, &format!("PART {}", chan_display));
    }

    /// A user left a channel (PART, KICK target, or QUIT cascade).
    pub fn leave_channel(&mut self, user_key: &str, chan_name: &str) {
        let chan_key = irc_to_lower(chan_name);
        let user_key = irc_to_lower(user_key);

        let empty = match self.channels.get_mut(&chan_key) {
            Some(channel) => {
                channel.remove_member(&user_key);
                channel.members.is_empty()
            }
            None => {
                debug!(channel = %chan_key, "part for unknown channel");
                return;
            }
        };
        if let Some(user) = self.users.get_mut(&user_key) {
            user.channels.remove(&chan_key);
        }

        if empty {
            if let Some(channel) = self.channels.remove(&chan_key) {
                if !channel.ops.is_empty() || !channel.voices.is_empty() {
                    error!(
                        channel = %channel.name,
                        ops = channel.ops.len(),
                        voices = channel.voices.len(),
                        "empty channel still had op/voice entries"
                    );
                }
                debug!(channel = %channel.name, "live channel destroyed");
            }
        }
    }

    /// Apply a MODE event to a live channel and reconcile against any
    /// mode lock.
    pub fn handle_mode(
        &mut self,
        source: &str,
        chan_name: &str,
        mode_str: &str,
        args: &[String],
        now: i64,
    ) {
        let chan_key = irc_to_lower(chan_name);
        if !self.channels.contains_key(&chan_key) {
            debug!(channel = %chan_name, "mode for unknown channel");
            return;
        }
        // Server names contain a dot; nicks cannot.
        let from_server = source.contains('.');

        let parse = parse_channel_modes(mode_str, args);
        for ch in &parse.missing_param {
            warn!(channel = %chan_name, mode = %ch, "mode missing parameter, skipped");
        }
        for ch in &parse.unknown {
            debug!(channel = %chan_name, mode = %ch, "unknown mode character, skipped");
        }

        let slots = self.config.chanserv.ban_slots;
        let mut op_grants: Vec<String> = Vec::new();
        if let Some(channel) = self.channels.get_mut(&chan_key) {
            for change in &parse.changes {
                match change {
                    ModeChange::Flag { adding, flag } => {
                        channel.modes.set_flag(*flag, *adding);
                    }
                    ModeChange::Key { adding, key } => {
                        channel.modes.key = if *adding { key.clone() } else { None };
                    }
                    ModeChange::Limit { adding, limit } => {
                        channel.modes.limit = if *adding { *limit } else { None };
                    }
                    ModeChange::Ban { adding, mask } => {
                        if *adding {
                            if !channel.add_ban(mask, slots) {
                                warn!(channel = %chan_name, mask = %mask, "ban list full");
                            }
                        } else {
                            channel.del_ban(mask);
                        }
                    }
                    ModeChange::Op { adding, nick } => {
                        let key = irc_to_lower(nick);
                        if *adding {
                            if channel.members.contains(&key) {
                                channel.ops.insert(key.clone());
                                op_grants.push(key);
                            } else {
                                debug!(channel = %chan_name, nick = %nick, "op grant for non-member");
                            }
                        } else {
                            channel.ops.remove(&key);
                        }
                    }
                    ModeChange::Voice { adding, nick } => {
                        let key = irc_to_lower(nick);
                        if *adding {
                            if channel.members.contains(&key) {
                                channel.voices.insert(key);
                            }
                        } else {
                            channel.voices.remove(&key);
                        }
                    }
                }
            }
            channel.count_server_mode(now);
        }

        for grantee in op_grants {
            self.check_valid_op(&grantee, &chan_key, from_server, now);
        }

        self.check_modes(&chan_key, now);
    }

    /// Reactive enforcement when someone is opped on a registered
    /// channel: server-granted ops to users without auto-op access are
    /// reverted after the startup grace, and anyone matching the
    /// auto-deop predicate is always reverted.
    pub fn check_valid_op(&mut self, user_key: &str, chan_key: &str, from_server: bool, now: i64) {
        if self.chans.get(chan_key).is_none() {
            return;
        }
        let level = self.user_level(user_key, chan_key);
        let in_grace = self.in_startup_grace(now);
        let Some(record) = self.chans.get(chan_key) else {
            return;
        };

        let auto_deop = chan::check_access(record, level, ChanAction::AutoDeop);
        // leave-ops channels tolerate server-granted ops.
        let server_invalid = from_server
            && !in_grace
            && !record.flags.leave_ops
            && !chan::check_access(record, level, ChanAction::AutoOp);
        let chan_name = record.name.clone();
        if !auto_deop && !server_invalid {
            return;
        }

        let Some(nick) = self.users.get(user_key).map(|u| u.nick.clone()) else {
            return;
        };
        info!(channel = %chan_name, nick = %nick, "reverting invalid op");
        let chanserv = self.chanserv();
        self.transport
            .send(&chanserv, &format!("MODE {} -o {}", chan_name, nick));
        if let Some(channel) = self.channels.get_mut(chan_key) {
            channel.ops.remove(user_key);
        }
    }

    /// Mode-lock reconciliation: one corrective MODE line for the whole
    /// symmetric difference, applied optimistically, guarded by bounce
    /// detection.
    pub fn check_modes(&mut self, chan_key: &str, now: i64) {
        let chan_key = irc_to_lower(chan_key);
        let (lock, chan_name) = match self.chans.get(&chan_key) {
            Some(record) if !record.forbidden && !record.suspended => {
                (record.mlock.clone(), record.name.clone())
            }
            _ => return,
        };
        let bounce_threshold = self.config.chanserv.bounce_threshold;
        let chanserv = self.chanserv();

        let mut went_bouncy = false;
        let mut mode_line: Option<String> = None;
        if let Some(channel) = self.channels.get_mut(&chan_key) {
            if channel.bouncy {
                return;
            }

            let (server_count, fix_count) = channel.counters_this_second(now);
            if server_count > bounce_threshold && fix_count > bounce_threshold {
                channel.bouncy = true;
                went_bouncy = true;
            } else {
                let mut builder = ModeLineBuilder::new();
                for flag in lock.on.chars() {
                    if !channel.modes.flag(flag) {
                        builder.add_flag(flag);
                        channel.modes.set_flag(flag, true);
                    }
                }
                for flag in lock.off.chars() {
                    if channel.modes.flag(flag) {
                        builder.remove_flag(flag);
                        channel.modes.set_flag(flag, false);
                    }
                }
                if let Some(locked_key) = &lock.key {
                    if channel.modes.key.as_deref() != Some(locked_key.as_str()) {
                        if let Some(current) = channel.modes.key.take() {
                            builder.remove_param('k', &current);
                        }
                        builder.add_param('k', locked_key);
                        channel.modes.key = Some(locked_key.clone());
                    }
                } else if lock.no_key {
                    if let Some(current) = channel.modes.key.take() {
                        builder.remove_param('k', &current);
                    }
                }
                if let Some(locked_limit) = lock.limit {
                    if channel.modes.limit != Some(locked_limit) {
                        builder.add_param('l', &locked_limit.to_string());
                        channel.modes.limit = Some(locked_limit);
                    }
                } else if lock.no_limit && channel.modes.limit.is_some() {
                    builder.remove_flag('l');
                    channel.modes.limit = None;
                }

                mode_line = builder.render();
                if mode_line.is_some() {
                    channel.count_fix_mode(now);
                }
            }
        } else {
            return;
        }

        if went_bouncy {
            error!(channel = %chan_name, "bouncy modes detected");
            self.oper_notice(
                &chanserv,
                &format!(
                    "Modes on {} are bouncing; mode-lock enforcement disabled until the channel is recreated.",
                    chan_name
                ),
            );
            return;
        }
        if let Some(line) = mode_line {
            self.transport
                .send(&chanserv, &format!("MODE {} {}", chan_name, line));
        }
    }

    /// Replay the retained topic on a freshly created live channel.
    fn restore_topic(&mut self, chan_key: &str) {
        let Some((keep_topic, topic, chan_name)) = self
            .chans
            .get(chan_key)
            .map(|r| (r.flags.keep_topic, r.last_topic.clone(), r.name.clone()))
        else {
            return;
        };
        if !keep_topic {
            return;
        }
        let Some(topic) = topic else {
            return;
        };
        if let Some(channel) = self.channels.get_mut(chan_key) {
            channel.topic = Some(topic.clone());
        }
        let chanserv = self.chanserv();
        self.transport.send(
            &chanserv,
            &format!(
                "TOPIC {} {} {} :{}",
                chan_name, topic.set_by, topic.set_at, topic.text
            ),
        );
    }

    /// A TOPIC event arrived from the network.
    pub fn handle_topic(&mut self, setter: &str, chan_name: &str, text: &str, now: i64) {
        let chan_key = irc_to_lower(chan_name);
        let new_topic = if text.is_empty() {
            None
        } else {
            Some(Topic {
                text: text.to_owned(),
                set_by: setter.to_owned(),
                set_at: now,
            })
        };
        match self.channels.get_mut(&chan_key) {
            Some(channel) => channel.topic = new_topic.clone(),
            None => {
                debug!(channel = %chan_name, "topic for unknown channel");
                return;
            }
        }

        let Some((forbidden, topic_lock, keep_topic, stored, chan_display)) =
            self.chans.get(&chan_key).map(|r| {
                (
                    r.forbidden,
                    r.flags.topic_lock,
                    r.flags.keep_topic,
                    r.last_topic.clone(),
                    r.name.clone(),
                )
            })
        else {
            return;
        };
        if forbidden {
            return;
        }

        if topic_lock {
            let differs = match (&stored, &new_topic) {
                (Some(a), Some(b)) => a.text != b.text,
                (None, None) => false,
                _ => true,
            };
            if !differs {
                return;
            }
            if let Some(channel) = self.channels.get_mut(&chan_key) {
                channel.topic = stored.clone();
            }
            let chanserv = self.chanserv();
            let (set_by, set_at, text) = stored
                .map(|t| (t.set_by, t.set_at, t.text))
                .unwrap_or_else(|| (chanserv.clone(), now, String::new()));
            self.transport.send(
                &chanserv,
                &format!("TOPIC {} {} {} :{}", chan_display, set_by, set_at, text),
            );
        } else if keep_topic {
            if let Some(record) = self.chans.get_mut(&chan_key) {
                record.last_topic = new_topic;
            }
        }
    }

    /// Record the current topic of every live channel into its record,
    /// run before a save so keep-topic survives restarts.
    pub fn record_topics(&mut self) {
        let snapshots: Vec<(String, Option<Topic>)> = self
            .channels
            .iter()
            .map(|(k, c)| (k.clone(), c.topic.clone()))
            .collect();
        for (key, topic) in snapshots {
            if let Some(record) = self.chans.get_mut(&key) {
                if record.flags.keep_topic {
                    record.last_topic = topic;
                }
            }
        }
    }

    /// Copy-out view of one registered channel for reporting.
    pub fn chan_record(&self, name: &str) -> Option<&ChanRecord> {
        self.chans.get(name)
    }

    /// Live member nicks of a channel, for CLEAR USERS-style commands.
    pub fn channel_members(&self, chan_key: &str) -> Vec<String> {
        self.channels
            .get(&irc_to_lower(chan_key))
            .map(|c| c.members.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Whether a user holds founder-level access on a channel.
    pub fn is_founder(&mut self, user_key: &str, chan_name: &str) -> bool {
        self.user_level(user_key, chan_name) == ACCESS_FOUNDER
    }
}
