//! Server spanning-tree bookkeeping.
//!
//! Tracks every linked server so users can be attributed to one and so
//! a SQUIT can recursively clean up everything behind the lost link.
//! Parent links are folded names, not pointers.

use slserv_proto::irc_to_lower;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// One linked server.
#[derive(Debug, Clone)]
pub struct ServerInfo {
    /// Case-preserved name.
    pub name: String,
    /// Folded name of the server that introduced this one. `None` for
    /// our uplink.
    pub parent: Option<String>,
    pub description: String,
    pub hops: u32,
}

/// The server tree.
#[derive(Debug, Default)]
pub struct ServerMap {
    servers: HashMap<String, ServerInfo>,
}

impl ServerMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.servers.len()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.servers.contains_key(&irc_to_lower(name))
    }

    pub fn get(&self, name: &str) -> Option<&ServerInfo> {
        self.servers.get(&irc_to_lower(name))
    }

    pub fn add(&mut self, name: &str, parent: Option<&str>, description: &str, hops: u32) {
        let key = irc_to_lower(name);
        debug!(server = %name, parent = ?parent, "server linked");
        self.servers.insert(
            key,
            ServerInfo {
                name: name.to_owned(),
                parent: parent.map(irc_to_lower),
                description: description.to_owned(),
                hops,
            },
        );
    }

    /// Remove a server and every descendant, returning the folded names
    /// of everything removed (the target included).
    pub fn squit(&mut self, name: &str) -> Vec<String> {
        let root = irc_to_lower(name);
        if !self.servers.contains_key(&root) {
            return Vec::new();
        }

        let mut removed = Vec::new();
        let mut to_process = vec![root];
        let mut processed = HashSet::new();

        while let Some(current) = to_process.pop() {
            if !processed.insert(current.clone()) {
                continue;
            }
            removed.push(current.clone());

            for (key, info) in &self.servers {
                if info.parent.as_deref() == Some(current.as_str())
                    && !processed.contains(key)
                {
                    to_process.push(key.clone());
                }
            }
        }

        for key in &removed {
            self.servers.remove(key);
        }
        removed
    }

    /// Server names, sorted, for diagnostics.
    pub fn sorted_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.servers.keys().cloned().collect();
        names.sort();
        names
    }
}
