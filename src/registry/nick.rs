//! Registered-nickname registry.
//!
//! Owns every identity record: passwords, settings, access masks and the
//! link relation that groups identities under one effective master. The
//! link is a foreign key (the target's case-folded nick), never a
//! pointer; it is resolved through the registry on every use, so record
//! deletion can never leave a dangling reference.

use crate::config::NickServConfig;
use crate::error::{ServiceError, ServiceResult};
use crate::security::{mask::wildcard_match, password};
use serde::{Deserialize, Serialize};
use slserv_proto::irc_to_lower;
use std::collections::{HashMap, HashSet};
use std::io::{Read, Write};
use tracing::{error, info};

/// Kill-protection mode for a registered nickname.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum KillProtect {
    #[default]
    Off,
    /// Collide after the normal delay.
    Normal,
    /// Collide after a short delay.
    Quick,
    /// Collide immediately.
    Immediate,
}

/// Owner-controlled settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NickSettings {
    pub kill: KillProtect,
    /// Never recognize by access mask; a password is always required.
    pub secure: bool,
    /// Hide from LIST-style output.
    pub private: bool,
    pub hide_email: bool,
    pub hide_mask: bool,
    pub hide_quit: bool,
    pub memo_signon: bool,
    pub memo_receive: bool,
}

/// A stored memo. Delivery is an external collaborator's job; the
/// registry only owns the store so link/unlink can merge it correctly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Memo {
    pub sender: String,
    pub time: i64,
    pub text: String,
    pub unread: bool,
}

/// Session identification stamp, used to re-recognize an identified
/// session that reappears after a reconnect burst without re-asking for
/// the password.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdStamp {
    pub signon: i64,
    pub usermask: String,
}

/// A registered nickname.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NickRecord {
    /// Case-preserved nickname; the registry key is the folded form.
    pub nick: String,
    /// Argon2 hash. Empty for forbidden placeholder records.
    pub password: String,
    pub email: Option<String>,
    pub url: Option<String>,
    /// Last seen `user@host`.
    pub last_usermask: Option<String>,
    pub last_realname: Option<String>,
    pub last_quit: Option<String>,
    pub time_registered: i64,
    pub last_seen: i64,
    pub settings: NickSettings,
    /// Administrative flags.
    pub forbidden: bool,
    pub no_expire: bool,
    pub suspended: bool,
    /// Ordered access-mask list for passwordless recognition.
    pub access: Vec<String>,
    /// Folded nick of the link target, when this identity is a group
    /// member. Privilege and settings are inherited from the ultimate
    /// master.
    pub link: Option<String>,
    /// How many identities link directly to this one.
    pub link_count: u32,
    /// Channels founded by this identity (propagated up link chains).
    pub channel_count: u32,
    /// Founding limit; 0 means the configured default applies.
    pub channel_max: u32,
    pub memos: Vec<Memo>,

    // Session-scoped status; never persisted.
    #[serde(skip)]
    pub identified: bool,
    #[serde(skip)]
    pub recognized: bool,
    #[serde(skip)]
    pub kill_held: bool,
    #[serde(skip)]
    pub id_stamp: Option<IdStamp>,
}

impl NickRecord {
    fn new(nick: &str, password_hash: String, now: i64) -> Self {
        Self {
            nick: nick.to_owned(),
            password: password_hash,
            email: None,
            url: None,
            last_usermask: None,
            last_realname: None,
            last_quit: None,
            time_registered: now,
            last_seen: now,
            settings: NickSettings::default(),
            forbidden: false,
            no_expire: false,
            suspended: false,
            access: Vec::new(),
            link: None,
            link_count: 0,
            channel_count: 0,
            channel_max: 0,
            memos: Vec::new(),
            identified: false,
            recognized: false,
            kill_held: false,
            id_stamp: None,
        }
    }

    /// True when the holder may exercise this identity's privileges:
    /// identified, or recognized while the identity is not secure.
    pub fn trusted(&self) -> bool {
        self.identified || (self.recognized && !self.settings.secure)
    }

    /// Whether a `user@host` matches any stored access mask.
    pub fn on_access(&self, usermask: &str) -> bool {
        self.access.iter().any(|m| wildcard_match(m, usermask))
    }
}

/// The registered-nickname registry.
#[derive(Debug, Default)]
pub struct NickRegistry {
    records: HashMap<String, NickRecord>,
    policy: NickServConfig,
}

impl NickRegistry {
    pub fn new(policy: NickServConfig) -> Self {
        Self {
            records: HashMap::new(),
            policy,
        }
    }

    pub fn policy(&self) -> &NickServConfig {
        &self.policy
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Exact case-insensitive lookup.
    pub fn get(&self, nick: &str) -> Option<&NickRecord> {
        self.records.get(&irc_to_lower(nick))
    }

    pub fn get_mut(&mut self, nick: &str) -> Option<&mut NickRecord> {
        self.records.get_mut(&irc_to_lower(nick))
    }

    /// Case-folded keys, sorted, for LIST-style output.
    pub fn sorted_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.records.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Resolve the effective identity: follow `link` until it ends.
    ///
    /// Returns the folded key of the ultimate master. A cycle here means
    /// corrupted data (the `link` mutation rejects cycle-forming edits);
    /// recovery is to cut the link at the origin and keep running.
    pub fn resolve_effective(&mut self, nick: &str) -> Option<String> {
        let origin = irc_to_lower(nick);
        self.records.get(&origin)?;

        let mut seen: HashSet<String> = HashSet::new();
        let mut current = origin.clone();
        loop {
            if !seen.insert(current.clone()) {
                error!(
                    nick = %origin,
                    at = %current,
                    "identity link cycle detected; cutting link at origin"
                );
                if let Some(rec) = self.records.get_mut(&origin) {
                    rec.link = None;
                }
                return Some(origin);
            }
            match self.records.get(&current).and_then(|r| r.link.clone()) {
                Some(next) if self.records.contains_key(&next) => current = next,
                Some(next) => {
                    // Dangling key: the target was deleted without the
                    // unlink cascade running. Heal it.
                    error!(nick = %current, target = %next, "dangling identity link; clearing");
                    if let Some(rec) = self.records.get_mut(&current) {
                        rec.link = None;
                    }
                    return Some(current);
                }
                None => return Some(current),
            }
        }
    }

    /// Register a new nickname.
    ///
    /// Rate limiting against the registering connection is the caller's
    /// check (it owns the per-connection timestamp); everything else is
    /// validated here. On success the record is marked identified and
    /// recognized for the current session.
    pub fn register(
        &mut self,
        nick: &str,
        pass: &str,
        usermask: &str,
        realname: &str,
        now: i64,
    ) -> ServiceResult<()> {
        let key = irc_to_lower(nick);
        if let Some(existing) = self.records.get(&key) {
            if existing.forbidden {
                return Err(ServiceError::Forbidden(nick.to_owned()));
            }
            return Err(ServiceError::AlreadyExists(nick.to_owned()));
        }
        if slserv_proto::irc_eq(nick, pass) {
            return Err(ServiceError::InvalidArgument(
                "password may not be the nickname".to_owned(),
            ));
        }
        if self.policy.min_password_len > 0 && pass.len() < self.policy.min_password_len {
            return Err(ServiceError::InvalidArgument(format!(
                "password must be at least {} characters",
                self.policy.min_password_len
            )));
        }

        let hash = password::hash_password(pass)
            .map_err(|_| ServiceError::InvalidArgument("unusable password".to_owned()))?;
        let mut record = NickRecord::new(nick, hash, now);
        record.last_usermask = Some(usermask.to_owned());
        record.last_realname = Some(realname.to_owned());
        record.identified = true;
        record.recognized = true;
        self.records.insert(key, record);
        info!(nick = %nick, "nickname registered");
        Ok(())
    }

    /// Create or overwrite a forbidden placeholder.
    pub fn forbid(&mut self, nick: &str, now: i64) -> ServiceResult<()> {
        let key = irc_to_lower(nick);
        if let Some(existing) = self.records.get(&key) {
            if existing.forbidden {
                return Err(ServiceError::AlreadyExists(nick.to_owned()));
            }
        }
        // FORBID overwrites an existing registration; the caller runs
        // the deletion cascade first when one exists.
        let mut record = NickRecord::new(nick, String::new(), now);
        record.forbidden = true;
        self.records.insert(key, record);
        info!(nick = %nick, "nickname forbidden");
        Ok(())
    }

    /// Verify a password against the stored hash. Forbidden and
    /// suspended registrations refuse to be identified to at all.
    pub fn verify_password(&self, nick: &str, pass: &str) -> ServiceResult<bool> {
        let record = self
            .get(nick)
            .ok_or_else(|| ServiceError::NotFound(nick.to_owned()))?;
        if record.forbidden || record.suspended {
            return Err(ServiceError::Forbidden(nick.to_owned()));
        }
        Ok(password::verify_password(pass, &record.password))
    }

    /// Replace a password.
    pub fn set_password(&mut self, nick: &str, pass: &str) -> ServiceResult<()> {
        if slserv_proto::irc_eq(nick, pass) {
            return Err(ServiceError::InvalidArgument(
                "password may not be the nickname".to_owned(),
            ));
        }
        if self.policy.min_password_len > 0 && pass.len() < self.policy.min_password_len {
            return Err(ServiceError::InvalidArgument(format!(
                "password must be at least {} characters",
                self.policy.min_password_len
            )));
        }
        let hash = password::hash_password(pass)
            .map_err(|_| ServiceError::InvalidArgument("unusable password".to_owned()))?;
        let record = self
            .get_mut(nick)
            .ok_or_else(|| ServiceError::NotFound(nick.to_owned()))?;
        record.password = hash;
        Ok(())
    }

    /// Add an access mask, bounded by policy.
    pub fn access_add(&mut self, nick: &str, mask: &str) -> ServiceResult<()> {
        let limit = self.policy.access_max;
        let record = self
            .get_mut(nick)
            .ok_or_else(|| ServiceError::NotFound(nick.to_owned()))?;
        if record.access.iter().any(|m| slserv_proto::irc_eq(m, mask)) {
            return Err(ServiceError::AlreadyExists(mask.to_owned()));
        }
        if record.access.len() >= limit {
            return Err(ServiceError::CapacityExceeded("access list"));
        }
        record.access.push(mask.to_owned());
        Ok(())
    }

    pub fn access_del(&mut self, nick: &str, mask: &str) -> ServiceResult<()> {
        let record = self
            .get_mut(nick)
            .ok_or_else(|| ServiceError::NotFound(nick.to_owned()))?;
        let before = record.access.len();
        record.access.retain(|m| !slserv_proto::irc_eq(m, mask));
        if record.access.len() == before {
            return Err(ServiceError::NotFound(mask.to_owned()));
        }
        Ok(())
    }

    /// Link `nick` to `target`, making `target`'s group the source of
    /// privilege and settings.
    ///
    /// Rejects self-links and cycle-forming links by walking the
    /// target's existing chain first. Memos and channel-founding counts
    /// move onto the ultimate master; the linked identity's own settings
    /// and access list are cleared, since they are inherited from now
    /// on. The caller has already verified the target's password (or
    /// administrative bypass).
    pub fn link(&mut self, nick: &str, target: &str) -> ServiceResult<()> {
        let origin = irc_to_lower(nick);
        let target_key = irc_to_lower(target);

        if origin == target_key {
            return Err(ServiceError::InvalidArgument(
                "cannot link a nickname to itself".to_owned(),
            ));
        }
        if !self.records.contains_key(&origin) {
            return Err(ServiceError::NotFound(nick.to_owned()));
        }
        let target_rec = self
            .records
            .get(&target_key)
            .ok_or_else(|| ServiceError::NotFound(target.to_owned()))?;
        if target_rec.forbidden {
            return Err(ServiceError::Forbidden(target.to_owned()));
        }
        if self.records[&origin].link.is_some() {
            return Err(ServiceError::AlreadyExists(nick.to_owned()));
        }

        // Walk the target's chain; if it reaches the origin, the new
        // edge would close a cycle.
        let chain = self.chain_from(&target_key);
        if chain.contains(&origin) {
            return Err(ServiceError::InvalidArgument(
                "link would create a cycle".to_owned(),
            ));
        }

        let Some(rec) = self.records.get_mut(&origin) else {
            return Err(ServiceError::Inconsistent(format!(
                "record for {} vanished during link",
                origin
            )));
        };
        rec.link = Some(target_key.clone());
        rec.access.clear();
        rec.settings = NickSettings::default();
        let memos = std::mem::take(&mut rec.memos);
        let count = rec.channel_count;

        // Channel counts propagate up the whole new chain; memos land on
        // the ultimate master.
        for key in &chain {
            if let Some(rec) = self.records.get_mut(key) {
                rec.channel_count += count;
            }
        }
        if let Some(master_key) = chain.last() {
            if let Some(master) = self.records.get_mut(master_key) {
                master.memos.extend(memos);
            }
        }
        if let Some(target_rec) = self.records.get_mut(&target_key) {
            target_rec.link_count += 1;
        }
        info!(nick = %nick, target = %target, "nickname linked");
        Ok(())
    }

    /// Detach `nick` from its link target: the exact inverse of `link`.
    ///
    /// Inherited settings and founding limits are materialized back onto
    /// the detached identity; channel counts on the former master chain
    /// are decremented.
    pub fn unlink(&mut self, nick: &str) -> ServiceResult<()> {
        let origin = irc_to_lower(nick);
        let target_key = match self.records.get(&origin) {
            Some(rec) => rec
                .link
                .clone()
                .ok_or_else(|| ServiceError::NotFound(format!("{} is not linked", nick)))?,
            None => return Err(ServiceError::NotFound(nick.to_owned())),
        };

        let master_key = self
            .resolve_effective(&target_key)
            .unwrap_or_else(|| target_key.clone());
        let (inherited_settings, inherited_max) = match self.records.get(&master_key) {
            Some(master) => (master.settings.clone(), master.channel_max),
            None => (NickSettings::default(), 0),
        };

        let Some(rec) = self.records.get_mut(&origin) else {
            return Err(ServiceError::Inconsistent(format!(
                "record for {} vanished during unlink",
                origin
            )));
        };
        rec.link = None;
        rec.settings = inherited_settings;
        rec.channel_max = inherited_max;
        let count = rec.channel_count;

        for key in self.chain_from(&target_key) {
            if let Some(rec) = self.records.get_mut(&key) {
                rec.channel_count = rec.channel_count.saturating_sub(count);
            }
        }
        if let Some(target_rec) = self.records.get_mut(&target_key) {
            target_rec.link_count = target_rec.link_count.saturating_sub(1);
        }
        info!(nick = %nick, "nickname unlinked");
        Ok(())
    }

    /// Remove a record outright, returning it.
    ///
    /// This is the registry-local half of identity deletion. The full
    /// cascade (promoting linked identities, transferring founded
    /// channels, scrubbing channel access lists and privilege sets) is
    /// orchestrated by the network state, which owns the other
    /// registries involved.
    pub fn remove(&mut self, nick: &str) -> Option<NickRecord> {
        let key = irc_to_lower(nick);
        let record = self.records.remove(&key)?;

        // A linked record gives back what it contributed to its chain.
        if let Some(target) = record.link.clone() {
            for chain_key in self.chain_from(&target) {
                if let Some(rec) = self.records.get_mut(&chain_key) {
                    rec.channel_count = rec.channel_count.saturating_sub(record.channel_count);
                }
            }
            if let Some(target_rec) = self.records.get_mut(&target) {
                target_rec.link_count = target_rec.link_count.saturating_sub(1);
            }
        }

        // Identities pointing at the deleted record are detached and
        // keep their own data (they were inheriting, so materialize the
        // deleted master's settings onto them).
        let orphans: Vec<String> = self
            .records
            .iter()
            .filter(|(_, r)| r.link.as_deref() == Some(key.as_str()))
            .map(|(k, _)| k.clone())
            .collect();
        for orphan in orphans {
            if let Some(rec) = self.records.get_mut(&orphan) {
                rec.link = None;
                rec.settings = record.settings.clone();
                rec.channel_max = record.channel_max;
            }
        }
        Some(record)
    }

    /// Expiry sweep: nicknames unseen for longer than the policy window
    /// go away. Forbidden and no-expire records never expire. Returns
    /// the folded keys that expired; the caller runs the deletion
    /// cascade for each.
    pub fn expire_candidates(&self, now: i64) -> Vec<String> {
        if self.policy.expire <= 0 {
            return Vec::new();
        }
        self.records
            .iter()
            .filter(|(_, r)| {
                !r.forbidden && !r.no_expire && now - r.last_seen >= self.policy.expire
            })
            .map(|(k, _)| k.clone())
            .collect()
    }

    /// Every folded key on the chain starting at `key`, origin first,
    /// ultimate master last. Stops on the first repeat so corrupted
    /// data cannot loop the caller.
    fn chain_from(&self, key: &str) -> Vec<String> {
        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        let mut current = key.to_owned();
        while self.records.contains_key(&current) && seen.insert(current.clone()) {
            chain.push(current.clone());
            match self.records.get(&current).and_then(|r| r.link.clone()) {
                Some(next) => current = next,
                None => break,
            }
        }
        chain
    }

    /// Serialize every record.
    pub fn save<W: Write>(&self, writer: W) -> std::io::Result<()> {
        let records: Vec<&NickRecord> = self.records.values().collect();
        serde_json::to_writer(writer, &records).map_err(std::io::Error::other)
    }

    /// Load records, replacing the current contents.
    pub fn load<R: Read>(&mut self, reader: R) -> std::io::Result<()> {
        let records: Vec<NickRecord> =
            serde_json::from_reader(reader).map_err(std::io::Error::other)?;
        self.records = records
            .into_iter()
            .map(|r| (irc_to_lower(&r.nick), r))
            .collect();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> NickRegistry {
        NickRegistry::new(NickServConfig::default())
    }

    fn register(reg: &mut NickRegistry, nick: &str) {
        reg.register(nick, "hunter2x", "joe@example.com", "Joe", 1000)
            .unwrap();
    }

    #[test]
    fn register_and_lookup_case_insensitive() {
        let mut reg = registry();
        register(&mut reg, "Alice");
        assert!(reg.get("ALICE").is_some());
        assert_eq!(reg.get("alice").unwrap().nick, "Alice");
    }

    #[test]
    fn register_rejects_duplicate_and_weak_password() {
        let mut reg = registry();
        register(&mut reg, "Alice");
        assert_eq!(
            reg.register("alice", "hunter2x", "m", "r", 1000),
            Err(ServiceError::AlreadyExists("alice".into()))
        );
        assert!(matches!(
            reg.register("Bob", "bob", "m", "r", 1000),
            Err(ServiceError::InvalidArgument(_))
        ));
        assert!(matches!(
            reg.register("Carol", "ab", "m", "r", 1000),
            Err(ServiceError::InvalidArgument(_))
        ));
    }

    #[test]
    fn forbid_blocks_registration() {
        let mut reg = registry();
        reg.forbid("seized", 1000).unwrap();
        assert_eq!(
            reg.register("seized", "hunter2x", "m", "r", 1000),
            Err(ServiceError::Forbidden("seized".into()))
        );
    }

    #[test]
    fn resolve_effective_is_idempotent_and_linkless() {
        let mut reg = registry();
        register(&mut reg, "alice");
        register(&mut reg, "ally");
        register(&mut reg, "al");
        reg.link("ally", "alice").unwrap();
        reg.link("al", "ally").unwrap();

        let master = reg.resolve_effective("al").unwrap();
        assert_eq!(master, "alice");
        let again = reg.resolve_effective(&master).unwrap();
        assert_eq!(again, master);
        assert!(reg.get(&again).unwrap().link.is_none());
    }

    #[test]
    fn link_rejects_self_and_cycles() {
        let mut reg = registry();
        register(&mut reg, "a");
        register(&mut reg, "b");
        register(&mut reg, "c");
        assert!(matches!(
            reg.link("a", "a"),
            Err(ServiceError::InvalidArgument(_))
        ));
        reg.link("b", "a").unwrap();
        reg.link("c", "b").unwrap();
        // a -> c would close the loop c -> b -> a.
        assert!(matches!(
            reg.link("a", "c"),
            Err(ServiceError::InvalidArgument(_))
        ));
    }

    #[test]
    fn link_moves_counts_and_memos_up_the_chain() {
        let mut reg = registry();
        register(&mut reg, "master");
        register(&mut reg, "alt");
        {
            let alt = reg.get_mut("alt").unwrap();
            alt.channel_count = 2;
            alt.memos.push(Memo {
                sender: "bob".into(),
                time: 1,
                text: "hi".into(),
                unread: true,
            });
            alt.access.push("joe@example.com".into());
        }
        reg.link("alt", "master").unwrap();

        let master = reg.get("master").unwrap();
        assert_eq!(master.channel_count, 2);
        assert_eq!(master.memos.len(), 1);
        assert_eq!(master.link_count, 1);

        let alt = reg.get("alt").unwrap();
        assert!(alt.memos.is_empty());
        assert!(alt.access.is_empty());

        reg.unlink("alt").unwrap();
        let master = reg.get("master").unwrap();
        assert_eq!(master.channel_count, 0);
        assert_eq!(master.link_count, 0);
        // The master keeps the merged memo store; unlink does not claw
        // memos back.
        assert_eq!(master.memos.len(), 1);
    }

    #[test]
    fn remove_promotes_orphans() {
        let mut reg = registry();
        register(&mut reg, "master");
        register(&mut reg, "alt");
        reg.link("alt", "master").unwrap();
        reg.remove("master");
        let alt = reg.get("alt").unwrap();
        assert!(alt.link.is_none());
        assert!(reg.get("master").is_none());
    }

    #[test]
    fn cycle_in_loaded_data_is_cut_at_origin() {
        let mut reg = registry();
        register(&mut reg, "a");
        register(&mut reg, "b");
        // Simulate corrupted persisted data with a two-cycle.
        reg.get_mut("a").unwrap().link = Some("b".into());
        reg.get_mut("b").unwrap().link = Some("a".into());

        let master = reg.resolve_effective("a").unwrap();
        assert_eq!(master, "a");
        assert!(reg.get("a").unwrap().link.is_none());
    }

    #[test]
    fn expire_skips_forbidden_and_no_expire() {
        let mut reg = registry();
        register(&mut reg, "old");
        register(&mut reg, "kept");
        reg.forbid("seized", 1000).unwrap();
        reg.get_mut("kept").unwrap().no_expire = true;

        let horizon = 1000 + reg.policy.expire;
        let mut expired = reg.expire_candidates(horizon);
        expired.sort();
        assert_eq!(expired, vec!["old".to_string()]);
    }

    #[test]
    fn save_load_round_trip_preserves_fields() {
        let mut reg = registry();
        register(&mut reg, "Alice");
        {
            let rec = reg.get_mut("alice").unwrap();
            rec.email = Some("alice@example.com".into());
            rec.settings.kill = KillProtect::Quick;
            rec.settings.hide_quit = true;
            rec.access.push("*@trusted.example".into());
            rec.channel_count = 3;
            rec.memos.push(Memo {
                sender: "bob".into(),
                time: 7,
                text: "hello".into(),
                unread: false,
            });
        }

        let mut buf = Vec::new();
        reg.save(&mut buf).unwrap();
        let mut loaded = registry();
        loaded.load(buf.as_slice()).unwrap();

        let a = reg.get("alice").unwrap();
        let b = loaded.get("alice").unwrap();
        assert_eq!(a.nick, b.nick);
        assert_eq!(a.password, b.password);
        assert_eq!(a.email, b.email);
        assert_eq!(a.settings, b.settings);
        assert_eq!(a.access, b.access);
        assert_eq!(a.channel_count, b.channel_count);
        assert_eq!(a.memos, b.memos);
        // Session-scoped status does not survive a restart.
        assert!(!b.identified);
    }

    #[test]
    fn access_list_is_bounded() {
        let mut reg = NickRegistry::new(NickServConfig {
            access_max: 2,
            ..Default::default()
        });
        register(&mut reg, "alice");
        reg.access_add("alice", "a@b").unwrap();
        reg.access_add("alice", "c@d").unwrap();
        assert_eq!(
            reg.access_add("alice", "e@f"),
            Err(ServiceError::CapacityExceeded("access list"))
        );
    }
}
