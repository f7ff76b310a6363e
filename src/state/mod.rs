//! Live network state.
//!
//! [`Network`] is the single owner of every registry and every live
//! structure. All mutation funnels through one task holding `&mut
//! Network`, which is what makes the check-then-mutate sequences in the
//! connect pipeline and the per-second bounce counters safe without any
//! locking.

pub mod channel;
mod channels;
pub mod servers;
pub mod user;
mod users;

pub use channel::LiveChannel;
pub use servers::ServerMap;
pub use user::LiveUser;

use crate::config::Config;
use crate::error::{ServiceError, ServiceResult};
use crate::registry::{AkillRegistry, ChanRegistry, NickRegistry, SessionRegistry};
use crate::timers::TimerQueue;
use crate::transport::Transport;
use slserv_proto::irc_to_lower;
use std::collections::HashMap;
use tracing::info;

/// Clone-detection bookkeeping for one host.
#[derive(Debug, Default)]
pub(crate) struct CloneWatch {
    pub times: Vec<i64>,
    pub last_warn: i64,
}

/// The in-memory network-state engine.
pub struct Network {
    pub config: Config,
    pub nicks: NickRegistry,
    pub chans: ChanRegistry,
    pub akills: AkillRegistry,
    pub sessions: SessionRegistry,
    /// Live users, keyed by folded nick.
    pub users: HashMap<String, LiveUser>,
    /// Live channels, keyed by folded name.
    pub channels: HashMap<String, LiveChannel>,
    pub servers: ServerMap,
    /// Runtime services-admin identity keys. Edited through OperServ.
    pub admins: Vec<String>,
    /// Runtime services-operator identity keys.
    pub opers: Vec<String>,
    pub timers: TimerQueue,
    pub transport: Box<dyn Transport>,
    pub started_at: i64,
    pub(crate) clone_watch: HashMap<String, CloneWatch>,
}

impl Network {
    pub fn new(config: Config, transport: Box<dyn Transport>, now: i64) -> Self {
        let nicks = NickRegistry::new(config.nickserv.clone());
        let chans = ChanRegistry::new(config.chanserv.clone());
        let akills = AkillRegistry::new(config.operserv.akill_max);
        let sessions = SessionRegistry::new(
            config.operserv.session_limit,
            config.operserv.exception_max,
        );
        Self {
            config,
            nicks,
            chans,
            akills,
            sessions,
            users: HashMap::new(),
            channels: HashMap::new(),
            servers: ServerMap::new(),
            admins: Vec::new(),
            opers: Vec::new(),
            timers: TimerQueue::new(),
            transport,
            started_at: now,
            clone_watch: HashMap::new(),
        }
    }

    // ------------------------------------------------------------------
    // Outbound helpers
    // ------------------------------------------------------------------

    pub fn nickserv(&self) -> String {
        self.config.services.nickserv.clone()
    }

    pub fn chanserv(&self) -> String {
        self.config.services.chanserv.clone()
    }

    pub fn operserv(&self) -> String {
        self.config.services.operserv.clone()
    }

    /// NOTICE a user from a service pseudo-client.
    pub fn notice(&self, from: &str, target: &str, text: &str) {
        self.transport
            .send(from, &format!("NOTICE {} :{}", target, text));
    }

    pub fn oper_notice(&self, from: &str, text: &str) {
        self.transport.oper_notice(from, text);
    }

    /// Whether the post-startup grace period is still running. Reactive
    /// op/join enforcement stays off during it so a fresh link does not
    /// trigger a mass-deop storm.
    pub fn in_startup_grace(&self, now: i64) -> bool {
        now - self.started_at < self.config.operserv.startup_grace
    }

    // ------------------------------------------------------------------
    // Privilege predicates (the core is the sole authority)
    // ------------------------------------------------------------------

    /// Services root: the nick is on the configured root list and its
    /// registration is identified this session.
    pub fn is_services_root(&self, user: &LiveUser) -> bool {
        let nick = irc_to_lower(&user.nick);
        if !self
            .config
            .operserv
            .roots
            .iter()
            .any(|r| irc_to_lower(r) == nick)
        {
            return false;
        }
        match &user.real_identity {
            Some(key) => self.nicks.get(key).map(|r| r.identified).unwrap_or(false),
            None => false,
        }
    }

    pub fn is_services_admin(&self, user: &LiveUser) -> bool {
        if self.is_services_root(user) {
            return true;
        }
        self.identified_effective(user)
            .map(|key| self.admins.contains(&key))
            .unwrap_or(false)
    }

    pub fn is_services_oper(&self, user: &LiveUser) -> bool {
        if self.is_services_admin(user) {
            return true;
        }
        self.identified_effective(user)
            .map(|key| self.opers.contains(&key))
            .unwrap_or(false)
    }

    /// The user's effective identity key, but only while the real
    /// identity is identified. Privilege lists require a password, not
    /// mask recognition.
    fn identified_effective(&self, user: &LiveUser) -> Option<String> {
        let real = user.real_identity.as_deref()?;
        if !self.nicks.get(real).map(|r| r.identified).unwrap_or(false) {
            return None;
        }
        user.effective_identity.clone()
    }

    pub fn admin_add(&mut self, identity: &str) -> ServiceResult<()> {
        let key = irc_to_lower(identity);
        if self.nicks.get(&key).is_none() {
            return Err(ServiceError::NotFound(identity.to_owned()));
        }
        if self.admins.contains(&key) {
            return Err(ServiceError::AlreadyExists(identity.to_owned()));
        }
        self.admins.push(key);
        Ok(())
    }

    pub fn admin_del(&mut self, identity: &str) -> ServiceResult<()> {
        let key = irc_to_lower(identity);
        let before = self.admins.len();
        self.admins.retain(|a| *a != key);
        if self.admins.len() == before {
            return Err(ServiceError::NotFound(identity.to_owned()));
        }
        Ok(())
    }

    pub fn oper_add(&mut self, identity: &str) -> ServiceResult<()> {
        let key = irc_to_lower(identity);
        if self.nicks.get(&key).is_none() {
            return Err(ServiceError::NotFound(identity.to_owned()));
        }
        if self.opers.contains(&key) {
            return Err(ServiceError::AlreadyExists(identity.to_owned()));
        }
        self.opers.push(key);
        Ok(())
    }

    pub fn oper_del(&mut self, identity: &str) -> ServiceResult<()> {
        let key = irc_to_lower(identity);
        let before = self.opers.len();
        self.opers.retain(|o| *o != key);
        if self.opers.len() == before {
            return Err(ServiceError::NotFound(identity.to_owned()));
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Deletion cascades
    // ------------------------------------------------------------------

    /// Delete a registered nickname with the full cascade: linked
    /// identities are promoted, founded channels move to each channel's
    /// successor (when it has capacity) or are dropped, access and
    /// auto-kick references are scrubbed, privilege lists are pruned and
    /// live users re-resolve their identity pointers.
    pub fn delete_identity(&mut self, nick: &str, _now: i64) -> ServiceResult<()> {
        let key = irc_to_lower(nick);
        let record = self
            .nicks
            .remove(&key)
            .ok_or_else(|| ServiceError::NotFound(nick.to_owned()))?;
        info!(nick = %record.nick, "deleting identity");

        for chan_key in self.chans.founded_by(&key) {
            let successor = self
                .chans
                .get(&chan_key)
                .and_then(|c| c.successor.clone())
                .filter(|s| *s != key);
            match successor.and_then(|s| self.successor_with_capacity(&s)) {
                Some(heir) => {
                    if let Some(record) = self.chans.get_mut(&chan_key) {
                        record.founder = heir.clone();
                        record.successor = None;
                    }
                    if let Some(heir_rec) = self.nicks.get_mut(&heir) {
                        heir_rec.channel_count += 1;
                    }
                    info!(channel = %chan_key, heir = %heir, "channel transferred to successor");
                }
                None => {
                    self.delete_channel(&chan_key);
                }
            }
        }

        self.chans.scrub_identity(&key);
        self.admins.retain(|a| *a != key);
        self.opers.retain(|o| *o != key);
        self.timers.cancel_all(&key);

        let affected: Vec<String> = self
            .users
            .iter()
            .filter(|(_, u)| {
                u.real_identity.as_deref() == Some(key.as_str())
                    || u.effective_identity.as_deref() == Some(key.as_str())
            })
            .map(|(k, _)| k.clone())
            .collect();
        for user_key in affected {
            self.resolve_user_identities(&user_key);
        }
        Ok(())
    }

    /// A successor identity able to take one more channel, resolved to
    /// its effective master.
    fn successor_with_capacity(&mut self, successor: &str) -> Option<String> {
        let heir = self.nicks.resolve_effective(successor)?;
        let record = self.nicks.get(&heir)?;
        if record.forbidden {
            return None;
        }
        let max = if record.channel_max > 0 {
            record.channel_max
        } else {
            self.config.chanserv.max_registered
        };
        if max > 0 && record.channel_count >= max {
            return None;
        }
        Some(heir)
    }

    /// Delete a registered channel, releasing the founder's count and
    /// clearing founder identification held by live users.
    pub fn delete_channel(&mut self, name: &str) {
        let key = irc_to_lower(name);
        let Some(record) = self.chans.remove(&key) else {
            return;
        };
        if let Some(founder) = self.nicks.get_mut(&record.founder) {
            founder.channel_count = founder.channel_count.saturating_sub(1);
        }
        for user in self.users.values_mut() {
            user.founder_chans.remove(&key);
        }
        self.timers.cancel_all(&key);
    }

    // ------------------------------------------------------------------
    // Periodic work
    // ------------------------------------------------------------------

    /// Fire every due timer. Called once per tick from the event loop;
    /// never concurrently with event handling.
    pub fn tick(&mut self, now: i64) {
        for timer in self.timers.due(now) {
            self.fire_timer(timer, now);
        }
    }

    /// One atomic expiry pass over every registry.
    pub fn expire_sweep(&mut self, now: i64) {
        for nick in self.nicks.expire_candidates(now) {
            info!(nick = %nick, "nickname expired");
            let _ = self.delete_identity(&nick, now);
        }
        for chan in self.chans.expire_candidates(now) {
            info!(channel = %chan, "channel expired");
            self.delete_channel(&chan);
        }
        self.akills.expire_sweep(now);
        self.sessions.expire_sweep(now);
    }
}
