//! User lifecycle: the connect pipeline, nick changes, removal and
//! nickname enforcement.
//!
//! Ordering in `introduce_user` is load-bearing: autokill and
//! session-limit checks run before any allocation, so a rejected
//! connection leaves no trace: no live user, no session counter.

use super::Network;
use crate::registry::nick::{IdStamp, KillProtect};
use crate::timers::{Timer, TimerKind};
use slserv_proto::irc_to_lower;
use tracing::{debug, info, warn};

use super::user::LiveUser;

impl Network {
    /// A new connection appeared on the network.
    ///
    /// Returns true when a live user was created. The checks run in
    /// strict order: autokill, session limit, allocation, identity
    /// resolution, clone heuristic, connect validation.
    pub fn introduce_user(
        &mut self,
        nick: &str,
        user: &str,
        host: &str,
        realname: &str,
        server: &str,
        signon: i64,
        now: i64,
    ) -> bool {
        let user_host = format!("{}@{}", user, host);

        if let Some(entry) = self.akills.match_user_host(&user_host, now) {
            let reason = entry.reason.clone();
            info!(nick = %nick, mask = %entry.mask, "autokilled connection");
            self.transport.send(
                &self.operserv(),
                &format!("KILL {} :Autokilled: {}", nick, reason),
            );
            return false;
        }

        if let Err(limit) = self.sessions.try_connect(host, now) {
            info!(nick = %nick, host = %host, limit = limit, "session limit exceeded");
            self.notice(
                &self.operserv(),
                nick,
                &format!(
                    "The session limit for your host ({}) has been reached; maximum {} simultaneous connections.",
                    host, limit
                ),
            );
            self.transport.send(
                &self.operserv(),
                &format!("KILL {} :Session limit exceeded", nick),
            );
            return false;
        }

        let key = irc_to_lower(nick);
        self.users.insert(
            key.clone(),
            LiveUser::new(nick, user, host, realname, server, signon, now),
        );
        self.resolve_user_identities(&key);

        if self.note_clone(host, now) {
            // Kill-on-clone policy: the user exists, so removal runs the
            // normal cascade and releases the session counter.
            self.transport
                .send(&self.operserv(), &format!("KILL {} :Clones", nick));
            self.remove_user(&key, "Clones", false, now);
            return false;
        }

        self.validate_on_connect(&key, now);
        true
    }

    /// Re-resolve a live user's real and effective identity pointers.
    pub fn resolve_user_identities(&mut self, user_key: &str) {
        let Some(nick) = self.users.get(user_key).map(|u| u.nick.clone()) else {
            return;
        };
        let real = self.nicks.get(&nick).map(|r| irc_to_lower(&r.nick));
        let effective = real
            .as_deref()
            .and_then(|key| self.nicks.resolve_effective(key));
        if let Some(user) = self.users.get_mut(user_key) {
            user.real_identity = real;
            user.effective_identity = effective;
        }
    }

    /// Sliding-window clone heuristic. Returns true when the connection
    /// should be disconnected under a kill-on-clone policy.
    fn note_clone(&mut self, host: &str, now: i64) -> bool {
        let window = self.config.operserv.clone_window;
        let trigger = self.config.operserv.clone_trigger;
        let cooldown = self.config.operserv.clone_warn_cooldown;
        let host_key = irc_to_lower(host);

        let watch = self.clone_watch.entry(host_key.clone()).or_default();
        watch.times.push(now);
        watch.times.retain(|t| now - *t < window);
        if (watch.times.len() as u32) < trigger {
            return false;
        }

        let should_warn = now - watch.last_warn >= cooldown;
        if should_warn {
            watch.last_warn = now;
        }
        let count = watch.times.len();
        if should_warn {
            let text = format!(
                "Possible clones from {} ({} connections in {}s)",
                host, count, window
            );
            self.oper_notice(&self.operserv(), &text);
            warn!(host = %host, count = count, "clone threshold reached");
        }
        self.config.operserv.kill_clones
    }

    /// The core authorization decision, run once per nick assumption.
    ///
    /// Returns true when the connection ends up recognized (or still
    /// identified, for a reappearing session).
    pub fn validate_on_connect(&mut self, user_key: &str, now: i64) -> bool {
        let Some((nick, user_host, realname, signon)) = self.users.get(user_key).map(|u| {
            (
                u.nick.clone(),
                u.user_host(),
                u.realname.clone(),
                u.signon,
            )
        }) else {
            return false;
        };
        let Some(real_key) = self.users.get(user_key).and_then(|u| u.real_identity.clone())
        else {
            return false;
        };

        let nickserv = self.nickserv();
        let (forbidden, secure, kill, on_access, stamp_matches) = {
            let Some(record) = self.nicks.get(&real_key) else {
                return false;
            };
            let stamp_matches = record
                .id_stamp
                .as_ref()
                .map(|s| s.signon == signon && s.usermask == user_host)
                .unwrap_or(false);
            (
                record.forbidden,
                record.settings.secure,
                record.settings.kill,
                record.on_access(&user_host),
                stamp_matches,
            )
        };

        if forbidden {
            self.notice(
                &nickserv,
                &nick,
                "This nickname may not be used. Please choose another one.",
            );
            self.timers.schedule(
                TimerKind::Collide,
                &real_key,
                now + self.config.nickserv.forbid_grace,
            );
            return false;
        }

        if stamp_matches {
            // The same identified session reappearing after a reconnect
            // burst; no password required again.
            if let Some(record) = self.nicks.get_mut(&real_key) {
                record.identified = true;
                record.recognized = true;
            }
            debug!(nick = %nick, "identification stamp matched, session restored");
            return true;
        }

        if on_access && !secure {
            if let Some(record) = self.nicks.get_mut(&real_key) {
                record.recognized = true;
                record.last_usermask = Some(user_host);
                record.last_realname = Some(realname);
                record.last_seen = now;
            }
            return true;
        }

        match kill {
            KillProtect::Off => false,
            KillProtect::Immediate => {
                self.notice(
                    &nickserv,
                    &nick,
                    "This nickname is registered and protected. You have been disconnected.",
                );
                self.collide(&real_key, now);
                false
            }
            KillProtect::Quick | KillProtect::Normal => {
                let delay = if kill == KillProtect::Quick {
                    self.config.nickserv.kill_quick
                } else {
                    self.config.nickserv.kill_delay
                };
                self.notice(
                    &nickserv,
                    &nick,
                    &format!(
                        "This nickname is registered and protected. If it is yours, identify within {} seconds or you will be disconnected.",
                        delay
                    ),
                );
                self.timers
                    .schedule(TimerKind::Collide, &real_key, now + delay);
                false
            }
        }
    }

    /// Dispatch one fired timer. Every callback re-resolves its target
    /// and no-ops safely when the condition became moot.
    pub(super) fn fire_timer(&mut self, timer: Timer, now: i64) {
        match timer.kind {
            TimerKind::Collide => self.collide(&timer.key, now),
            TimerKind::Release => self.release(&timer.key),
            TimerKind::InhabitPart => self.inhabit_part(&timer.key),
        }
    }

    /// Enforce a protected nick: disconnect the holder and hold the
    /// nick until released.
    pub fn collide(&mut self, nick_key: &str, now: i64) {
        let Some(user) = self.users.get(nick_key) else {
            debug!(nick = %nick_key, "collide target already gone");
            return;
        };
        let nick = user.nick.clone();
        match self.nicks.get(nick_key) {
            Some(record) if !record.trusted() || record.forbidden => {}
            _ => {
                debug!(nick = %nick_key, "collide no longer applies");
                return;
            }
        }

        info!(nick = %nick, "nickname enforcement collide");
        self.transport.send(
            &self.nickserv(),
            &format!("KILL {} :Nickname enforcement", nick),
        );
        if let Some(record) = self.nicks.get_mut(nick_key) {
            record.kill_held = true;
        }
        self.timers.schedule(
            TimerKind::Release,
            nick_key,
            now + self.config.nickserv.release_timeout,
        );
        self.remove_user(nick_key, "Nickname enforcement", false, now);
    }

    /// Give up a held nick.
    pub fn release(&mut self, nick_key: &str) {
        if let Some(record) = self.nicks.get_mut(nick_key) {
            if record.kill_held {
                record.kill_held = false;
                info!(nick = %record.nick, "held nickname released");
            }
        }
        self.timers.cancel(TimerKind::Release, nick_key);
    }

    /// A live user changed nick.
    pub fn change_nick(&mut self, old_nick: &str, new_nick: &str, now: i64) {
        let old_key = irc_to_lower(old_nick);
        let new_key = irc_to_lower(new_nick);
        let Some(mut user) = self.users.remove(&old_key) else {
            warn!(nick = %old_nick, "nick change for unknown user");
            return;
        };

        let old_effective = user.effective_identity.clone();
        let old_real = user.real_identity.clone();
        user.nick = new_nick.to_owned();
        if old_key != new_key {
            for chan_key in user.channels.clone() {
                if let Some(channel) = self.channels.get_mut(&chan_key) {
                    if channel.members.remove(&old_key) {
                        channel.members.insert(new_key.clone());
                    }
                    if channel.ops.remove(&old_key) {
                        channel.ops.insert(new_key.clone());
                    }
                    if channel.voices.remove(&old_key) {
                        channel.voices.insert(new_key.clone());
                    }
                }
            }
        }
        self.users.insert(new_key.clone(), user);
        self.resolve_user_identities(&new_key);

        let new_effective = self
            .users
            .get(&new_key)
            .and_then(|u| u.effective_identity.clone());

        if old_effective == new_effective {
            // Case change or movement inside one linked group; the
            // standing validation still applies.
            return;
        }

        // The holder left the old identity behind.
        if let Some(real) = old_real {
            if let Some(record) = self.nicks.get_mut(&real) {
                record.identified = false;
                record.recognized = false;
            }
            self.timers.cancel(TimerKind::Collide, &real);
        }
        self.validate_on_connect(&new_key, now);
    }

    /// A user left the network (QUIT, KILL, or netsplit cleanup).
    pub fn remove_user(&mut self, nick_key: &str, reason: &str, record_quit: bool, now: i64) {
        let key = irc_to_lower(nick_key);
        let Some(user) = self.users.remove(&key) else {
            return;
        };

        self.sessions.disconnect(&user.host);

        if let Some(real) = &user.real_identity {
            if let Some(record) = self.nicks.get_mut(real) {
                if record.trusted() {
                    if record_quit {
                        record.last_quit = Some(reason.to_owned());
                    }
                    record.last_seen = now;
                }
                record.identified = false;
                record.recognized = false;
            }
            self.timers.cancel(TimerKind::Collide, real);
        }

        for chan_key in user.channels.iter().cloned().collect::<Vec<_>>() {
            self.leave_channel(&key, &chan_key);
        }
        debug!(nick = %user.nick, reason = %reason, "user removed");
    }

    /// Track a wrong password from this connection. Returns true when
    /// the limit was exceeded and the user was disconnected.
    pub fn record_bad_password(&mut self, user_key: &str, now: i64) -> bool {
        let limit = self.config.nickserv.bad_pass_limit;
        let timeout = self.config.nickserv.bad_pass_timeout;
        let Some(user) = self.users.get_mut(user_key) else {
            return false;
        };

        if timeout > 0 && user.bad_pass_time > 0 && now - user.bad_pass_time >= timeout {
            user.bad_pass_count = 0;
        }
        user.bad_pass_count += 1;
        user.bad_pass_time = now;
        let nick = user.nick.clone();
        let count = user.bad_pass_count;

        if limit > 0 && count >= limit {
            info!(nick = %nick, "bad password limit exceeded");
            self.transport.send(
                &self.nickserv(),
                &format!("KILL {} :Too many invalid passwords", nick),
            );
            self.remove_user(user_key, "Too many invalid passwords", false, now);
            return true;
        }
        false
    }

    /// Stamp the identity so the same session can reappear identified
    /// after a reconnect burst.
    pub fn stamp_identity(&mut self, user_key: &str) {
        let Some((signon, usermask, real)) = self
            .users
            .get(user_key)
            .map(|u| (u.signon, u.user_host(), u.real_identity.clone()))
        else {
            return;
        };
        if let Some(real) = real {
            if let Some(record) = self.nicks.get_mut(&real) {
                record.id_stamp = Some(IdStamp { signon, usermask });
            }
        }
    }

    /// Live-user count attributed to one server.
    pub fn users_on_server(&self, server_key: &str) -> usize {
        self.users
            .values()
            .filter(|u| u.server == server_key)
            .count()
    }

    /// A server split away: recursively remove every descendant server
    /// and every user attributed to any of them.
    pub fn handle_squit(&mut self, server: &str, now: i64) {
        let removed = self.servers.squit(server);
        if removed.is_empty() {
            debug!(server = %server, "squit for unknown server");
            return;
        }
        let reason = format!("Netsplit from {}", server);
        let victims: Vec<String> = self
            .users
            .iter()
            .filter(|(_, u)| removed.contains(&u.server))
            .map(|(k, _)| k.clone())
            .collect();
        info!(server = %server, servers = removed.len(), users = victims.len(), "server split");
        for victim in victims {
            self.remove_user(&victim, &reason, false, now);
        }
    }
}
