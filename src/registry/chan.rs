//! Registered-channel registry.
//!
//! Owns channel records: founder/successor, the per-action access-level
//! table, the ordered access and auto-kick lists (slots may be vacant
//! and are reused), the mode lock and the retained topic. Identity
//! references are case-folded nickname keys resolved through the
//! nickname registry; nothing here stores a pointer that could dangle.

use crate::config::ChanServConfig;
use crate::error::{ServiceError, ServiceResult};
use crate::security::password;
use serde::{Deserialize, Serialize};
use slserv_proto::{irc_eq, irc_to_lower};
use std::collections::HashMap;
use std::fmt;
use std::io::{Read, Write};
use tracing::info;

/// Access level meaning "this action is disabled below founder".
pub const ACCESS_INVALID: i16 = -10000;
/// Access level of the founder group; above any configurable level.
pub const ACCESS_FOUNDER: i16 = 10000;
/// Configurable levels live in this closed range.
pub const LEVEL_MIN: i16 = -9999;
pub const LEVEL_MAX: i16 = 9999;

/// Privileged actions gated by the per-channel level table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChanAction {
    Invite,
    AkickEdit,
    Set,
    Unban,
    AutoOp,
    AutoVoice,
    AutoDeop,
    NoJoin,
    AccessList,
    AccessChange,
    Memo,
    Kick,
    OpDeop,
}

impl ChanAction {
    pub const ALL: [ChanAction; 13] = [
        ChanAction::Invite,
        ChanAction::AkickEdit,
        ChanAction::Set,
        ChanAction::Unban,
        ChanAction::AutoOp,
        ChanAction::AutoVoice,
        ChanAction::AutoDeop,
        ChanAction::NoJoin,
        ChanAction::AccessList,
        ChanAction::AccessChange,
        ChanAction::Memo,
        ChanAction::Kick,
        ChanAction::OpDeop,
    ];

    /// The two inverted actions trigger when the level is at or BELOW
    /// the threshold, and the founder group never triggers them.
    pub fn inverted(self) -> bool {
        matches!(self, ChanAction::AutoDeop | ChanAction::NoJoin)
    }

    /// Name used by the LEVELS command surface.
    pub fn name(self) -> &'static str {
        match self {
            ChanAction::Invite => "INVITE",
            ChanAction::AkickEdit => "AKICK",
            ChanAction::Set => "SET",
            ChanAction::Unban => "UNBAN",
            ChanAction::AutoOp => "AUTOOP",
            ChanAction::AutoVoice => "AUTOVOICE",
            ChanAction::AutoDeop => "AUTODEOP",
            ChanAction::NoJoin => "NOJOIN",
            ChanAction::AccessList => "ACC-LIST",
            ChanAction::AccessChange => "ACC-CHANGE",
            ChanAction::Memo => "MEMO",
            ChanAction::Kick => "KICK",
            ChanAction::OpDeop => "OPDEOP",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|a| a.name().eq_ignore_ascii_case(name))
    }
}

/// The per-action threshold table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelTable {
    pub invite: i16,
    pub akick: i16,
    pub set: i16,
    pub unban: i16,
    pub auto_op: i16,
    pub auto_voice: i16,
    pub auto_deop: i16,
    pub no_join: i16,
    pub access_list: i16,
    pub access_change: i16,
    pub memo: i16,
    pub kick: i16,
    pub op_deop: i16,
}

impl Default for LevelTable {
    fn default() -> Self {
        Self {
            invite: 5,
            akick: 10,
            set: ACCESS_INVALID,
            unban: 5,
            auto_op: 5,
            auto_voice: 3,
            auto_deop: -1,
            no_join: -2,
            access_list: 0,
            access_change: 10,
            memo: 10,
            kick: 5,
            op_deop: 5,
        }
    }
}

impl LevelTable {
    pub fn get(&self, action: ChanAction) -> i16 {
        match action {
            ChanAction::Invite => self.invite,
            ChanAction::AkickEdit => self.akick,
            ChanAction::Set => self.set,
            ChanAction::Unban => self.unban,
            ChanAction::AutoOp => self.auto_op,
            ChanAction::AutoVoice => self.auto_voice,
            ChanAction::AutoDeop => self.auto_deop,
            ChanAction::NoJoin => self.no_join,
            ChanAction::AccessList => self.access_list,
            ChanAction::AccessChange => self.access_change,
            ChanAction::Memo => self.memo,
            ChanAction::Kick => self.kick,
            ChanAction::OpDeop => self.op_deop,
        }
    }

    pub fn set(&mut self, action: ChanAction, level: i16) {
        let slot = match action {
            ChanAction::Invite => &mut self.invite,
            ChanAction::AkickEdit => &mut self.akick,
            ChanAction::Set => &mut self.set,
            ChanAction::Unban => &mut self.unban,
            ChanAction::AutoOp => &mut self.auto_op,
            ChanAction::AutoVoice => &mut self.auto_voice,
            ChanAction::AutoDeop => &mut self.auto_deop,
            ChanAction::NoJoin => &mut self.no_join,
            ChanAction::AccessList => &mut self.access_list,
            ChanAction::AccessChange => &mut self.access_change,
            ChanAction::Memo => &mut self.memo,
            ChanAction::Kick => &mut self.kick,
            ChanAction::OpDeop => &mut self.op_deop,
        };
        *slot = level;
    }
}

/// One access-list slot. Vacant slots stay in place and are reused by
/// the next ADD, so list positions stay stable within a command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessSlot {
    pub in_use: bool,
    /// Folded identity key.
    pub nick: String,
    pub level: i16,
}

/// What an auto-kick entry matches. Bound identity and raw mask are
/// mutually exclusive representations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AkickTarget {
    /// Folded identity key; compared against effective identities.
    Identity(String),
    /// Raw `nick!user@host` wildcard mask.
    Mask(String),
}

/// One auto-kick slot. An identity-bound entry goes inert (in_use
/// false) when that identity is deleted; it is not removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AkickSlot {
    pub in_use: bool,
    pub target: AkickTarget,
    pub reason: Option<String>,
    pub who: String,
    pub time: i64,
}

/// The mode lock: modes forced on, modes forced off, forced key and
/// limit. `no_key`/`no_limit` force `-k`/`-l`, mutually exclusive with
/// the corresponding value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeLock {
    /// Binary flag characters forced on, e.g. `"nt"`.
    pub on: String,
    /// Binary flag characters forced off.
    pub off: String,
    pub key: Option<String>,
    pub no_key: bool,
    pub limit: Option<u32>,
    pub no_limit: bool,
}

impl ModeLock {
    /// Parse a lock string like `+ntk-s secret` or `+l 25`.
    ///
    /// Unknown flag characters are rejected rather than skipped; a lock
    /// that silently lost a flag would enforce something its owner did
    /// not ask for.
    pub fn parse(mode_str: &str, args: &[String]) -> ServiceResult<Self> {
        let mut lock = ModeLock::default();
        let mut adding = true;
        let mut next_arg = 0usize;

        for ch in mode_str.chars() {
            match ch {
                '+' => adding = true,
                '-' => adding = false,
                'i' | 'm' | 'n' | 'p' | 's' | 't' => {
                    let set = if adding { &mut lock.on } else { &mut lock.off };
                    if !set.contains(ch) {
                        set.push(ch);
                    }
                    let other = if adding { &mut lock.off } else { &mut lock.on };
                    other.retain(|c| c != ch);
                }
                'k' => {
                    if adding {
                        let key = args.get(next_arg).cloned().ok_or_else(|| {
                            ServiceError::InvalidArgument("+k requires a key".to_owned())
                        })?;
                        next_arg += 1;
                        lock.key = Some(key);
                        lock.no_key = false;
                    } else {
                        lock.key = None;
                        lock.no_key = true;
                    }
                }
                'l' => {
                    if adding {
                        let limit = args
                            .get(next_arg)
                            .and_then(|a| a.parse::<u32>().ok())
                            .filter(|l| *l > 0)
                            .ok_or_else(|| {
                                ServiceError::InvalidArgument(
                                    "+l requires a positive limit".to_owned(),
                                )
                            })?;
                        next_arg += 1;
                        lock.limit = Some(limit);
                        lock.no_limit = false;
                    } else {
                        lock.limit = None;
                        lock.no_limit = true;
                    }
                }
                other => {
                    return Err(ServiceError::InvalidArgument(format!(
                        "unknown mode character: {}",
                        other
                    )));
                }
            }
        }
        Ok(lock)
    }

    pub fn is_empty(&self) -> bool {
        self.on.is_empty()
            && self.off.is_empty()
            && self.key.is_none()
            && !self.no_key
            && self.limit.is_none()
            && !self.no_limit
    }
}

impl fmt::Display for ModeLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut plus = self.on.clone();
        let mut minus = self.off.clone();
        let mut params = Vec::new();
        if let Some(key) = &self.key {
            plus.push('k');
            params.push(key.clone());
        }
        if let Some(limit) = self.limit {
            plus.push('l');
            params.push(limit.to_string());
        }
        if self.no_key {
            minus.push('k');
        }
        if self.no_limit {
            minus.push('l');
        }
        if !plus.is_empty() {
            write!(f, "+{}", plus)?;
        }
        if !minus.is_empty() {
            write!(f, "-{}", minus)?;
        }
        for p in params {
            write!(f, " {}", p)?;
        }
        Ok(())
    }
}

/// Retained topic for keep-topic / topic-lock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    pub text: String,
    pub set_by: String,
    pub set_at: i64,
}

/// Owner-controlled channel flags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChanFlags {
    pub keep_topic: bool,
    pub topic_lock: bool,
    pub private: bool,
    pub secure_ops: bool,
    pub leave_ops: bool,
    pub restricted: bool,
    pub secure: bool,
    pub op_notice: bool,
}

/// A registered channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChanRecord {
    /// Case-preserved name; the registry key is the folded form.
    pub name: String,
    /// Folded identity key of the founder.
    pub founder: String,
    /// Folded identity key channels fall to when the founder dies.
    pub successor: Option<String>,
    /// Argon2 hash of the founder password.
    pub password: String,
    pub desc: String,
    pub url: Option<String>,
    pub email: Option<String>,
    pub entry_msg: Option<String>,
    pub time_registered: i64,
    pub last_used: i64,
    pub last_topic: Option<Topic>,
    pub flags: ChanFlags,
    pub forbidden: bool,
    pub no_expire: bool,
    pub suspended: bool,
    pub levels: LevelTable,
    pub access: Vec<AccessSlot>,
    pub akick: Vec<AkickSlot>,
    pub mlock: ModeLock,
}

impl ChanRecord {
    fn new(name: &str, founder: &str, password_hash: String, desc: &str, now: i64) -> Self {
        Self {
            name: name.to_owned(),
            founder: irc_to_lower(founder),
            successor: None,
            password: password_hash,
            desc: desc.to_owned(),
            url: None,
            email: None,
            entry_msg: None,
            time_registered: now,
            last_used: now,
            last_topic: None,
            flags: ChanFlags {
                keep_topic: true,
                ..Default::default()
            },
            forbidden: false,
            no_expire: false,
            suspended: false,
            levels: LevelTable::default(),
            access: Vec::new(),
            akick: Vec::new(),
            mlock: ModeLock {
                on: "nt".to_owned(),
                ..Default::default()
            },
        }
    }

    /// Live access-list entries bound to an identity.
    pub fn access_entry(&self, identity: &str) -> Option<&AccessSlot> {
        self.access
            .iter()
            .find(|s| s.in_use && s.nick == identity)
    }

    /// Highest applicable level for an identity, zero when absent.
    pub fn access_level_of(&self, identity: &str) -> i16 {
        self.access
            .iter()
            .filter(|s| s.in_use && s.nick == identity)
            .map(|s| s.level)
            .max()
            .unwrap_or(0)
    }

    /// First matching auto-kick entry, if any.
    pub fn akick_match(
        &self,
        effective: Option<&str>,
        nick_user_host: &str,
    ) -> Option<&AkickSlot> {
        self.akick.iter().filter(|s| s.in_use).find(|s| match &s.target {
            AkickTarget::Identity(id) => effective == Some(id.as_str()),
            AkickTarget::Mask(mask) => crate::security::wildcard_match(mask, nick_user_host),
        })
    }
}

/// Numeric access evaluation for one user against one channel.
///
/// `effective` is the user's effective identity key, `trusted` whether
/// that identity may currently be exercised (identified, or recognized
/// and not secure), `chan_identified` whether the user has supplied the
/// channel's founder password this session, and `founder_group` the
/// founder's effective identity key.
pub fn get_access(
    record: &ChanRecord,
    effective: Option<&str>,
    trusted: bool,
    founder_group: &str,
    chan_identified: bool,
) -> i16 {
    if chan_identified {
        return ACCESS_FOUNDER;
    }
    let Some(identity) = effective else {
        return 0;
    };
    if !trusted {
        return 0;
    }
    if identity == founder_group {
        return ACCESS_FOUNDER;
    }
    record.access_level_of(identity)
}

/// The core privilege predicate.
pub fn check_access(record: &ChanRecord, level: i16, action: ChanAction) -> bool {
    if level == ACCESS_FOUNDER {
        // Founder bypasses every threshold; the inverted actions can
        // never apply to the founder group.
        return !action.inverted();
    }
    if action == ChanAction::AutoDeop && record.flags.secure_ops && level <= 0 {
        // secure-ops hardening: users with no access at all lose ops.
        return true;
    }
    let threshold = record.levels.get(action);
    if threshold == ACCESS_INVALID {
        return false;
    }
    if action.inverted() {
        level <= threshold
    } else {
        level >= threshold
    }
}

/// The registered-channel registry.
#[derive(Debug, Default)]
pub struct ChanRegistry {
    records: HashMap<String, ChanRecord>,
    policy: ChanServConfig,
}

impl ChanRegistry {
    pub fn new(policy: ChanServConfig) -> Self {
        Self {
            records: HashMap::new(),
            policy,
        }
    }

    pub fn policy(&self) -> &ChanServConfig {
        &self.policy
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&ChanRecord> {
        self.records.get(&irc_to_lower(name))
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut ChanRecord> {
        self.records.get_mut(&irc_to_lower(name))
    }

    pub fn sorted_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.records.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Register a channel. The caller has verified that the registering
    /// user is an operator on the live channel and that the founder's
    /// group has founding capacity left.
    pub fn register(
        &mut self,
        name: &str,
        founder: &str,
        pass: &str,
        desc: &str,
        now: i64,
    ) -> ServiceResult<()> {
        let key = irc_to_lower(name);
        if let Some(existing) = self.records.get(&key) {
            if existing.forbidden {
                return Err(ServiceError::Forbidden(name.to_owned()));
            }
            return Err(ServiceError::AlreadyExists(name.to_owned()));
        }
        if irc_eq(name, pass) {
            return Err(ServiceError::InvalidArgument(
                "password may not be the channel name".to_owned(),
            ));
        }
        let hash = password::hash_password(pass)
            .map_err(|_| ServiceError::InvalidArgument("unusable password".to_owned()))?;
        self.records
            .insert(key, ChanRecord::new(name, founder, hash, desc, now));
        info!(channel = %name, founder = %founder, "channel registered");
        Ok(())
    }

    pub fn forbid(&mut self, name: &str, now: i64) -> ServiceResult<()> {
        let key = irc_to_lower(name);
        if let Some(existing) = self.records.get(&key) {
            if existing.forbidden {
                return Err(ServiceError::AlreadyExists(name.to_owned()));
            }
        }
        let mut record = ChanRecord::new(name, "", String::new(), "", now);
        record.forbidden = true;
        self.records.insert(key, record);
        info!(channel = %name, "channel forbidden");
        Ok(())
    }

    /// Remove a record outright, returning it so the caller can release
    /// the founder's channel count.
    pub fn remove(&mut self, name: &str) -> Option<ChanRecord> {
        let record = self.records.remove(&irc_to_lower(name));
        if let Some(r) = &record {
            info!(channel = %r.name, "channel dropped");
        }
        record
    }

    pub fn verify_password(&self, name: &str, pass: &str) -> ServiceResult<bool> {
        let record = self
            .get(name)
            .ok_or_else(|| ServiceError::NotFound(name.to_owned()))?;
        if record.forbidden {
            return Err(ServiceError::Forbidden(name.to_owned()));
        }
        Ok(password::verify_password(pass, &record.password))
    }

    /// Add or update an access entry, reusing the first vacant slot.
    pub fn access_add(
        &mut self,
        name: &str,
        identity: &str,
        level: i16,
    ) -> ServiceResult<Option<i16>> {
        if !(LEVEL_MIN..=LEVEL_MAX).contains(&level) {
            return Err(ServiceError::InvalidArgument(format!(
                "level must be between {} and {}",
                LEVEL_MIN, LEVEL_MAX
            )));
        }
        let limit = self.policy.access_max;
        let record = self
            .get_mut(name)
            .ok_or_else(|| ServiceError::NotFound(name.to_owned()))?;
        let identity = irc_to_lower(identity);

        if let Some(slot) = record
            .access
            .iter_mut()
            .find(|s| s.in_use && s.nick == identity)
        {
            let old = slot.level;
            slot.level = level;
            return Ok(Some(old));
        }

        if let Some(slot) = record.access.iter_mut().find(|s| !s.in_use) {
            slot.in_use = true;
            slot.nick = identity;
            slot.level = level;
            return Ok(None);
        }
        if record.access.len() >= limit {
            return Err(ServiceError::CapacityExceeded("access list"));
        }
        record.access.push(AccessSlot {
            in_use: true,
            nick: identity,
            level,
        });
        Ok(None)
    }

    /// Vacate an access entry by identity.
    pub fn access_del(&mut self, name: &str, identity: &str) -> ServiceResult<i16> {
        let record = self
            .get_mut(name)
            .ok_or_else(|| ServiceError::NotFound(name.to_owned()))?;
        let identity = irc_to_lower(identity);
        match record
            .access
            .iter_mut()
            .find(|s| s.in_use && s.nick == identity)
        {
            Some(slot) => {
                slot.in_use = false;
                Ok(slot.level)
            }
            None => Err(ServiceError::NotFound(identity)),
        }
    }

    /// Append an auto-kick entry, reusing the first vacant slot.
    pub fn akick_add(
        &mut self,
        name: &str,
        target: AkickTarget,
        reason: Option<String>,
        who: &str,
        now: i64,
    ) -> ServiceResult<()> {
        let limit = self.policy.akick_max;
        let record = self
            .get_mut(name)
            .ok_or_else(|| ServiceError::NotFound(name.to_owned()))?;

        let exists = record.akick.iter().any(|s| s.in_use && s.target == target);
        if exists {
            return Err(ServiceError::AlreadyExists("auto-kick entry".to_owned()));
        }

        let entry = AkickSlot {
            in_use: true,
            target,
            reason,
            who: who.to_owned(),
            time: now,
        };
        if let Some(slot) = record.akick.iter_mut().find(|s| !s.in_use) {
            *slot = entry;
            return Ok(());
        }
        if record.akick.len() >= limit {
            return Err(ServiceError::CapacityExceeded("auto-kick list"));
        }
        record.akick.push(entry);
        Ok(())
    }

    pub fn akick_del(&mut self, name: &str, target: &AkickTarget) -> ServiceResult<()> {
        let record = self
            .get_mut(name)
            .ok_or_else(|| ServiceError::NotFound(name.to_owned()))?;
        match record
            .akick
            .iter_mut()
            .find(|s| s.in_use && s.target == *target)
        {
            Some(slot) => {
                slot.in_use = false;
                Ok(())
            }
            None => Err(ServiceError::NotFound("auto-kick entry".to_owned())),
        }
    }

    /// Channel names founded by an identity (folded key).
    pub fn founded_by(&self, identity: &str) -> Vec<String> {
        self.records
            .iter()
            .filter(|(_, r)| !r.forbidden && r.founder == identity)
            .map(|(k, _)| k.clone())
            .collect()
    }

    /// Scrub a deleted identity from every record: vacate its access
    /// slots, mark its auto-kick bindings inert, clear successor
    /// references. Founder handling (transfer or drop) is the caller's
    /// cascade.
    pub fn scrub_identity(&mut self, identity: &str) {
        for record in self.records.values_mut() {
            for slot in &mut record.access {
                if slot.in_use && slot.nick == identity {
                    slot.in_use = false;
                }
            }
            for slot in &mut record.akick {
                if slot.in_use && matches!(&slot.target, AkickTarget::Identity(id) if id == identity)
                {
                    slot.in_use = false;
                }
            }
            if record.successor.as_deref() == Some(identity) {
                record.successor = None;
            }
        }
    }

    /// Expiry sweep candidates; forbidden and no-expire records never
    /// expire.
    pub fn expire_candidates(&self, now: i64) -> Vec<String> {
        if self.policy.expire <= 0 {
            return Vec::new();
        }
        self.records
            .iter()
            .filter(|(_, r)| !r.forbidden && !r.no_expire && now - r.last_used >= self.policy.expire)
            .map(|(k, _)| k.clone())
            .collect()
    }

    pub fn save<W: Write>(&self, writer: W) -> std::io::Result<()> {
        let records: Vec<&ChanRecord> = self.records.values().collect();
        serde_json::to_writer(writer, &records).map_err(std::io::Error::other)
    }

    pub fn load<R: Read>(&mut self, reader: R) -> std::io::Result<()> {
        let records: Vec<ChanRecord> =
            serde_json::from_reader(reader).map_err(std::io::Error::other)?;
        self.records = records
            .into_iter()
            .map(|r| (irc_to_lower(&r.name), r))
            .collect();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> ChanRegistry {
        ChanRegistry::new(ChanServConfig::default())
    }

    fn register(reg: &mut ChanRegistry, name: &str, founder: &str) {
        reg.register(name, founder, "hunter2x", "a test channel", 1000)
            .unwrap();
    }

    #[test]
    fn register_and_lookup() {
        let mut reg = registry();
        register(&mut reg, "#Test", "alice");
        let record = reg.get("#TEST").unwrap();
        assert_eq!(record.name, "#Test");
        assert_eq!(record.founder, "alice");
        // Registration defaults: keep-topic on, +nt locked.
        assert!(record.flags.keep_topic);
        assert_eq!(record.mlock.on, "nt");
    }

    #[test]
    fn mode_lock_parses_and_displays() {
        let lock = ModeLock::parse("+ntk-s", &["sekrit".to_owned()]).unwrap();
        assert_eq!(lock.on, "nt");
        assert_eq!(lock.off, "s");
        assert_eq!(lock.key.as_deref(), Some("sekrit"));
        assert_eq!(lock.to_string(), "+ntk-s sekrit");

        let lock = ModeLock::parse("-kl", &[]).unwrap();
        assert!(lock.no_key && lock.no_limit);
        assert_eq!(lock.to_string(), "-kl");
    }

    #[test]
    fn mode_lock_rejects_unknown_and_missing_params() {
        assert!(ModeLock::parse("+X", &[]).is_err());
        assert!(ModeLock::parse("+k", &[]).is_err());
        assert!(ModeLock::parse("+l", &["zero".to_owned()]).is_err());
    }

    #[test]
    fn mode_lock_later_sign_wins() {
        let lock = ModeLock::parse("+n-n", &[]).unwrap();
        assert_eq!(lock.on, "");
        assert_eq!(lock.off, "n");
    }

    #[test]
    fn founder_passes_everything_except_inverted() {
        let mut reg = registry();
        register(&mut reg, "#test", "alice");
        let record = reg.get("#test").unwrap();
        for action in ChanAction::ALL {
            let passes = check_access(record, ACCESS_FOUNDER, action);
            assert_eq!(passes, !action.inverted(), "action {:?}", action);
        }
    }

    #[test]
    fn disabled_threshold_fails_below_founder() {
        let mut reg = registry();
        register(&mut reg, "#test", "alice");
        let record = reg.get("#test").unwrap();
        // SET defaults to disabled.
        assert!(!check_access(record, 9999, ChanAction::Set));
        assert!(check_access(record, ACCESS_FOUNDER, ChanAction::Set));
    }

    #[test]
    fn inverted_actions_compare_downward() {
        let mut reg = registry();
        register(&mut reg, "#test", "alice");
        let record = reg.get("#test").unwrap();
        // Defaults: auto_deop -1, no_join -2.
        assert!(check_access(record, -1, ChanAction::AutoDeop));
        assert!(check_access(record, -5, ChanAction::NoJoin));
        assert!(!check_access(record, 0, ChanAction::AutoDeop));
        assert!(!check_access(record, 0, ChanAction::NoJoin));
    }

    #[test]
    fn secure_ops_deops_level_zero() {
        let mut reg = registry();
        register(&mut reg, "#test", "alice");
        reg.get_mut("#test").unwrap().flags.secure_ops = true;
        let record = reg.get("#test").unwrap();
        assert!(check_access(record, 0, ChanAction::AutoDeop));
        assert!(!check_access(record, 5, ChanAction::AutoDeop));
    }

    #[test]
    fn get_access_founder_group() {
        let mut reg = registry();
        register(&mut reg, "#test", "alice");
        let record = reg.get("#test").unwrap();
        assert_eq!(
            get_access(record, Some("alice"), true, "alice", false),
            ACCESS_FOUNDER
        );
        // Untrusted holder of the founder nick gets nothing.
        assert_eq!(get_access(record, Some("alice"), false, "alice", false), 0);
        // Channel password identification outranks everything.
        assert_eq!(get_access(record, None, false, "alice", true), ACCESS_FOUNDER);
    }

    #[test]
    fn access_slots_are_reused() {
        let mut reg = registry();
        register(&mut reg, "#test", "alice");
        reg.access_add("#test", "bob", 5).unwrap();
        reg.access_add("#test", "carol", 7).unwrap();
        reg.access_del("#test", "bob").unwrap();

        // Vacant slot stays in the vector.
        assert_eq!(reg.get("#test").unwrap().access.len(), 2);
        reg.access_add("#test", "dave", 3).unwrap();
        let record = reg.get("#test").unwrap();
        assert_eq!(record.access.len(), 2);
        assert_eq!(record.access[0].nick, "dave");
        assert!(record.access[0].in_use);
    }

    #[test]
    fn access_add_updates_existing() {
        let mut reg = registry();
        register(&mut reg, "#test", "alice");
        reg.access_add("#test", "bob", 5).unwrap();
        let old = reg.access_add("#test", "BOB", 8).unwrap();
        assert_eq!(old, Some(5));
        assert_eq!(reg.get("#test").unwrap().access_level_of("bob"), 8);
    }

    #[test]
    fn akick_matches_identity_and_mask() {
        let mut reg = registry();
        register(&mut reg, "#test", "alice");
        reg.akick_add(
            "#test",
            AkickTarget::Identity("badguy".into()),
            Some("no".into()),
            "alice",
            1000,
        )
        .unwrap();
        reg.akick_add(
            "#test",
            AkickTarget::Mask("*!*@spam.example".into()),
            None,
            "alice",
            1000,
        )
        .unwrap();

        let record = reg.get("#test").unwrap();
        assert!(record.akick_match(Some("badguy"), "x!y@z").is_some());
        assert!(record
            .akick_match(None, "troll!u@spam.example")
            .is_some());
        assert!(record.akick_match(Some("goodguy"), "a!b@c").is_none());
    }

    #[test]
    fn scrub_identity_inerts_bindings() {
        let mut reg = registry();
        register(&mut reg, "#test", "alice");
        reg.access_add("#test", "bob", 5).unwrap();
        reg.akick_add(
            "#test",
            AkickTarget::Identity("bob".into()),
            None,
            "alice",
            1000,
        )
        .unwrap();
        reg.get_mut("#test").unwrap().successor = Some("bob".into());

        reg.scrub_identity("bob");
        let record = reg.get("#test").unwrap();
        assert_eq!(record.access_level_of("bob"), 0);
        // The akick slot is inert, not gone.
        assert_eq!(record.akick.len(), 1);
        assert!(!record.akick[0].in_use);
        assert!(record.successor.is_none());
    }

    #[test]
    fn save_load_round_trip_preserves_vacant_slots() {
        let mut reg = registry();
        register(&mut reg, "#test", "alice");
        reg.access_add("#test", "bob", 5).unwrap();
        reg.access_del("#test", "bob").unwrap();
        reg.akick_add(
            "#test",
            AkickTarget::Mask("*!*@bad".into()),
            Some("spam".into()),
            "alice",
            1000,
        )
        .unwrap();
        reg.get_mut("#test").unwrap().levels.set(ChanAction::Kick, 8);
        reg.get_mut("#test").unwrap().mlock =
            ModeLock::parse("+ntml", &["30".to_owned()]).unwrap();

        let mut buf = Vec::new();
        reg.save(&mut buf).unwrap();
        let mut loaded = registry();
        loaded.load(buf.as_slice()).unwrap();

        let a = reg.get("#test").unwrap();
        let b = loaded.get("#test").unwrap();
        assert_eq!(a.access, b.access);
        assert_eq!(a.akick, b.akick);
        assert_eq!(a.levels, b.levels);
        assert_eq!(a.mlock, b.mlock);
        assert_eq!(a.password, b.password);
        // The vacant slot survived intact.
        assert_eq!(b.access.len(), 1);
        assert!(!b.access[0].in_use);
    }

    #[test]
    fn expire_skips_protected() {
        let mut reg = registry();
        register(&mut reg, "#old", "alice");
        register(&mut reg, "#kept", "alice");
        reg.get_mut("#kept").unwrap().no_expire = true;
        reg.forbid("#seized", 1000).unwrap();

        let horizon = 1000 + reg.policy.expire;
        let expired = reg.expire_candidates(horizon);
        assert_eq!(expired, vec!["#old".to_string()]);
    }
}
