//! Autokill (network-ban) registry.
//!
//! Ordered list of `user@host` wildcard patterns with reason, setter and
//! expiry. Matched against every new connection before a live user is
//! allocated.

use crate::error::{ServiceError, ServiceResult};
use crate::registry::selector::parse_ranges;
use crate::security::wildcard_match;
use serde::{Deserialize, Serialize};
use slserv_proto::irc_eq;
use std::io::{Read, Write};
use tracing::info;

/// One autokill entry. `expires == 0` means never.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AkillEntry {
    pub mask: String,
    pub reason: String,
    pub who: String,
    pub time: i64,
    pub expires: i64,
}

impl AkillEntry {
    pub fn is_expired(&self, now: i64) -> bool {
        self.expires != 0 && now >= self.expires
    }
}

/// The autokill registry.
#[derive(Debug, Default)]
pub struct AkillRegistry {
    entries: Vec<AkillEntry>,
    capacity: usize,
}

impl AkillRegistry {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[AkillEntry] {
        &self.entries
    }

    /// Append an entry, bounded by capacity.
    pub fn add(
        &mut self,
        mask: &str,
        reason: &str,
        who: &str,
        now: i64,
        expires: i64,
    ) -> ServiceResult<()> {
        if self.entries.iter().any(|e| irc_eq(&e.mask, mask)) {
            return Err(ServiceError::AlreadyExists(mask.to_owned()));
        }
        if self.entries.len() >= self.capacity {
            return Err(ServiceError::CapacityExceeded("autokill list"));
        }
        self.entries.push(AkillEntry {
            mask: mask.to_owned(),
            reason: reason.to_owned(),
            who: who.to_owned(),
            time: now,
            expires,
        });
        info!(mask = %mask, who = %who, "autokill added");
        Ok(())
    }

    /// Delete by exact mask.
    pub fn del_mask(&mut self, mask: &str) -> ServiceResult<()> {
        let before = self.entries.len();
        self.entries.retain(|e| !irc_eq(&e.mask, mask));
        if self.entries.len() == before {
            return Err(ServiceError::NotFound(mask.to_owned()));
        }
        info!(mask = %mask, "autokill removed");
        Ok(())
    }

    /// Delete by numeric-range selector, returning the removed masks.
    pub fn del_ranges(&mut self, selector: &str) -> ServiceResult<Vec<String>> {
        let indices = parse_ranges(selector, self.entries.len())?;
        let mut removed = Vec::with_capacity(indices.len());
        for idx in indices.into_iter().rev() {
            removed.push(self.entries.remove(idx - 1).mask);
        }
        removed.reverse();
        Ok(removed)
    }

    /// First unexpired entry matching a `user@host` string.
    pub fn match_user_host(&self, user_host: &str, now: i64) -> Option<&AkillEntry> {
        self.entries
            .iter()
            .find(|e| !e.is_expired(now) && wildcard_match(&e.mask, user_host))
    }

    /// Drop expired entries, returning their masks.
    pub fn expire_sweep(&mut self, now: i64) -> Vec<String> {
        let mut removed = Vec::new();
        self.entries.retain(|e| {
            if e.is_expired(now) {
                removed.push(e.mask.clone());
                false
            } else {
                true
            }
        });
        for mask in &removed {
            info!(mask = %mask, "autokill expired");
        }
        removed
    }

    pub fn save<W: Write>(&self, writer: W) -> std::io::Result<()> {
        serde_json::to_writer(writer, &self.entries).map_err(std::io::Error::other)
    }

    pub fn load<R: Read>(&mut self, reader: R) -> std::io::Result<()> {
        self.entries = serde_json::from_reader(reader).map_err(std::io::Error::other)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> AkillRegistry {
        AkillRegistry::new(8)
    }

    #[test]
    fn add_match_delete() {
        let mut reg = registry();
        reg.add("*@badhost.example", "spam", "oper", 1000, 0).unwrap();
        assert_eq!(reg.len(), 1);
        assert!(reg.match_user_host("joe@badhost.example", 2000).is_some());
        assert!(reg.match_user_host("joe@goodhost.example", 2000).is_none());

        reg.del_mask("*@BADHOST.example").unwrap();
        assert!(reg.is_empty());
    }

    #[test]
    fn duplicate_mask_rejected() {
        let mut reg = registry();
        reg.add("*@x", "a", "oper", 1, 0).unwrap();
        assert_eq!(
            reg.add("*@X", "b", "oper", 1, 0),
            Err(ServiceError::AlreadyExists("*@X".into()))
        );
    }

    #[test]
    fn capacity_is_bounded() {
        let mut reg = AkillRegistry::new(1);
        reg.add("*@a", "r", "o", 1, 0).unwrap();
        assert_eq!(
            reg.add("*@b", "r", "o", 1, 0),
            Err(ServiceError::CapacityExceeded("autokill list"))
        );
    }

    #[test]
    fn expired_entry_does_not_match() {
        let mut reg = registry();
        reg.add("*@x", "r", "o", 1000, 2000).unwrap();
        assert!(reg.match_user_host("u@x", 1500).is_some());
        assert!(reg.match_user_host("u@x", 2000).is_none());

        let removed = reg.expire_sweep(2000);
        assert_eq!(removed, vec!["*@x".to_string()]);
        assert!(reg.is_empty());
    }

    #[test]
    fn range_delete_resolves_against_positions() {
        let mut reg = registry();
        for mask in ["*@a", "*@b", "*@c", "*@d", "*@e"] {
            reg.add(mask, "r", "o", 1, 0).unwrap();
        }
        let removed = reg.del_ranges("1,3-4").unwrap();
        assert_eq!(removed, vec!["*@a", "*@c", "*@d"]);
        let left: Vec<&str> = reg.entries().iter().map(|e| e.mask.as_str()).collect();
        assert_eq!(left, vec!["*@b", "*@e"]);
    }

    #[test]
    fn save_load_round_trip() {
        let mut reg = registry();
        reg.add("*@badhost.example", "spam", "oper", 1000, 5000)
            .unwrap();
        let mut buf = Vec::new();
        reg.save(&mut buf).unwrap();

        let mut loaded = registry();
        loaded.load(buf.as_slice()).unwrap();
        assert_eq!(loaded.entries(), reg.entries());
    }
}
