//! Session-limit registry.
//!
//! Caps simultaneous connections per host, independent of nickname. An
//! ordered exception list (first match wins) overrides the network-wide
//! default; a live host → count table is kept only while sessions exist.

use crate::error::{ServiceError, ServiceResult};
use crate::registry::selector::parse_ranges;
use crate::security::wildcard_match;
use serde::{Deserialize, Serialize};
use slserv_proto::{irc_eq, irc_to_lower};
use std::collections::HashMap;
use std::io::{Read, Write};
use tracing::info;

/// One session-limit exception. `expires == 0` means never; `limit == 0`
/// means unlimited sessions for matching hosts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionException {
    pub mask: String,
    pub limit: u32,
    pub who: String,
    pub reason: String,
    pub time: i64,
    pub expires: i64,
}

impl SessionException {
    pub fn is_expired(&self, now: i64) -> bool {
        self.expires != 0 && now >= self.expires
    }
}

/// The session-limit registry: exception list plus live counters.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    exceptions: Vec<SessionException>,
    counts: HashMap<String, u32>,
    default_limit: u32,
    capacity: usize,
}

impl SessionRegistry {
    pub fn new(default_limit: u32, capacity: usize) -> Self {
        Self {
            exceptions: Vec::new(),
            counts: HashMap::new(),
            default_limit,
            capacity,
        }
    }

    pub fn exceptions(&self) -> &[SessionException] {
        &self.exceptions
    }

    /// Live counter for a host (zero when no sessions).
    pub fn count_of(&self, host: &str) -> u32 {
        self.counts.get(&irc_to_lower(host)).copied().unwrap_or(0)
    }

    /// Hosts with live sessions, sorted by count descending.
    pub fn counts_sorted(&self) -> Vec<(String, u32)> {
        let mut all: Vec<(String, u32)> = self
            .counts
            .iter()
            .map(|(h, c)| (h.clone(), *c))
            .collect();
        all.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        all
    }

    /// Applicable limit for a host: first matching unexpired exception,
    /// else the network default. Zero means unlimited.
    pub fn limit_for(&self, host: &str, now: i64) -> u32 {
        self.exceptions
            .iter()
            .find(|e| !e.is_expired(now) && wildcard_match(&e.mask, host))
            .map(|e| e.limit)
            .unwrap_or(self.default_limit)
    }

    /// Account for a new connection. The counter is incremented only
    /// when the connection is admitted; a rejected connection leaves no
    /// trace.
    pub fn try_connect(&mut self, host: &str, now: i64) -> Result<u32, u32> {
        let limit = self.limit_for(host, now);
        let key = irc_to_lower(host);
        let count = self.counts.get(&key).copied().unwrap_or(0);
        if limit != 0 && count >= limit {
            return Err(limit);
        }
        self.counts.insert(key, count + 1);
        Ok(count + 1)
    }

    /// Release a connection's session. Deletes the counter at zero.
    pub fn disconnect(&mut self, host: &str) {
        let key = irc_to_lower(host);
        match self.counts.get_mut(&key) {
            Some(count) if *count > 1 => *count -= 1,
            Some(_) => {
                self.counts.remove(&key);
            }
            None => {}
        }
    }

    /// Add an exception at a position (1-based; 0 or past-end appends).
    pub fn exception_add(
        &mut self,
        mask: &str,
        limit: u32,
        who: &str,
        reason: &str,
        now: i64,
        expires: i64,
        position: usize,
    ) -> ServiceResult<()> {
        if self.exceptions.iter().any(|e| irc_eq(&e.mask, mask)) {
            return Err(ServiceError::AlreadyExists(mask.to_owned()));
        }
        if self.exceptions.len() >= self.capacity {
            return Err(ServiceError::CapacityExceeded("exception list"));
        }
        let entry = SessionException {
            mask: mask.to_owned(),
            limit,
            who: who.to_owned(),
            reason: reason.to_owned(),
            time: now,
            expires,
        };
        if position >= 1 && position <= self.exceptions.len() {
            self.exceptions.insert(position - 1, entry);
        } else {
            self.exceptions.push(entry);
        }
        info!(mask = %mask, limit = limit, "session exception added");
        Ok(())
    }

    pub fn exception_del_mask(&mut self, mask: &str) -> ServiceResult<()> {
        let before = self.exceptions.len();
        self.exceptions.retain(|e| !irc_eq(&e.mask, mask));
        if self.exceptions.len() == before {
            return Err(ServiceError::NotFound(mask.to_owned()));
        }
        Ok(())
    }

    pub fn exception_del_ranges(&mut self, selector: &str) -> ServiceResult<Vec<String>> {
        let indices = parse_ranges(selector, self.exceptions.len())?;
        let mut removed = Vec::with_capacity(indices.len());
        for idx in indices.into_iter().rev() {
            removed.push(self.exceptions.remove(idx - 1).mask);
        }
        removed.reverse();
        Ok(removed)
    }

    /// Move an exception to a new position (both 1-based). Order matters
    /// because matching is first-match-wins.
    pub fn exception_move(&mut self, from: usize, to: usize) -> ServiceResult<()> {
        let len = self.exceptions.len();
        if from < 1 || from > len || to < 1 || to > len {
            return Err(ServiceError::InvalidArgument(
                "exception position out of range".to_owned(),
            ));
        }
        let entry = self.exceptions.remove(from - 1);
        self.exceptions.insert(to - 1, entry);
        Ok(())
    }

    /// Drop expired exceptions, returning their masks.
    pub fn expire_sweep(&mut self, now: i64) -> Vec<String> {
        let mut removed = Vec::new();
        self.exceptions.retain(|e| {
            if e.is_expired(now) {
                removed.push(e.mask.clone());
                false
            } else {
                true
            }
        });
        removed
    }

    /// Exceptions persist; live counters do not.
    pub fn save<W: Write>(&self, writer: W) -> std::io::Result<()> {
        serde_json::to_writer(writer, &self.exceptions).map_err(std::io::Error::other)
    }

    pub fn load<R: Read>(&mut self, reader: R) -> std::io::Result<()> {
        self.exceptions = serde_json::from_reader(reader).map_err(std::io::Error::other)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> SessionRegistry {
        SessionRegistry::new(2, 8)
    }

    #[test]
    fn default_limit_applies() {
        let mut reg = registry();
        assert_eq!(reg.try_connect("host.example", 0), Ok(1));
        assert_eq!(reg.try_connect("HOST.example", 0), Ok(2));
        assert_eq!(reg.try_connect("host.example", 0), Err(2));
        assert_eq!(reg.count_of("host.example"), 2);
    }

    #[test]
    fn rejected_connection_leaves_no_counter() {
        let mut reg = SessionRegistry::new(1, 8);
        reg.try_connect("h", 0).unwrap();
        assert!(reg.try_connect("h", 0).is_err());
        assert_eq!(reg.count_of("h"), 1);
    }

    #[test]
    fn counter_deleted_at_zero() {
        let mut reg = registry();
        reg.try_connect("h", 0).unwrap();
        reg.disconnect("h");
        assert_eq!(reg.count_of("h"), 0);
        assert!(reg.counts_sorted().is_empty());
    }

    #[test]
    fn first_match_wins() {
        let mut reg = registry();
        reg.exception_add("*.example", 5, "oper", "shell box", 0, 0, 0)
            .unwrap();
        reg.exception_add("special.example", 9, "oper", "unreachable", 0, 0, 0)
            .unwrap();
        // The broader mask sits first, so it wins.
        assert_eq!(reg.limit_for("special.example", 0), 5);

        reg.exception_move(2, 1).unwrap();
        assert_eq!(reg.limit_for("special.example", 0), 9);
        assert_eq!(reg.limit_for("other.example", 0), 5);
    }

    #[test]
    fn zero_limit_means_unlimited() {
        let mut reg = SessionRegistry::new(1, 8);
        reg.exception_add("bouncer.example", 0, "oper", "bnc", 0, 0, 0)
            .unwrap();
        for _ in 0..10 {
            reg.try_connect("bouncer.example", 0).unwrap();
        }
    }

    #[test]
    fn expired_exception_falls_back() {
        let mut reg = registry();
        reg.exception_add("*.example", 9, "oper", "r", 0, 100, 0)
            .unwrap();
        assert_eq!(reg.limit_for("a.example", 50), 9);
        assert_eq!(reg.limit_for("a.example", 100), 2);
        assert_eq!(reg.expire_sweep(100), vec!["*.example".to_string()]);
    }

    #[test]
    fn save_load_round_trip_keeps_exceptions_only() {
        let mut reg = registry();
        reg.exception_add("*.example", 5, "oper", "r", 10, 0, 0)
            .unwrap();
        reg.try_connect("h", 0).unwrap();

        let mut buf = Vec::new();
        reg.save(&mut buf).unwrap();
        let mut loaded = registry();
        loaded.load(buf.as_slice()).unwrap();
        assert_eq!(loaded.exceptions(), reg.exceptions());
        assert_eq!(loaded.count_of("h"), 0);
    }
}
