//! Registry snapshot persistence.
//!
//! Each registry serializes itself through plain readers and writers;
//! this module owns the file paths, the tmp-file + atomic-rename write
//! discipline and the notion of "save everything". Corrupt data is
//! fatal at load time (startup) only; a running daemon never aborts
//! over persistence.

use crate::state::Network;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const NICKS_FILE: &str = "nicks.json";
const CHANS_FILE: &str = "channels.json";
const AKILLS_FILE: &str = "akills.json";
const EXCEPTIONS_FILE: &str = "exceptions.json";
const OPERS_FILE: &str = "opers.json";

/// The privilege lists travel together in one file.
#[derive(Debug, Default, Serialize, Deserialize)]
struct OperLists {
    admins: Vec<String>,
    opers: Vec<String>,
}

/// Handle on the snapshot directory.
#[derive(Debug, Clone)]
pub struct Db {
    dir: PathBuf,
}

impl Db {
    pub fn new<P: AsRef<Path>>(dir: P) -> std::io::Result<Self> {
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir: dir.as_ref().to_path_buf(),
        })
    }

    fn path(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }

    /// Write one snapshot file via temp file + atomic rename.
    fn write_atomic(
        &self,
        file: &str,
        write: impl FnOnce(BufWriter<File>) -> std::io::Result<()>,
    ) -> std::io::Result<()> {
        let target = self.path(file);
        let temp = target.with_extension("json.tmp");
        let writer = BufWriter::new(File::create(&temp)?);
        write(writer)?;
        fs::rename(&temp, &target)?;
        debug!(path = %target.display(), "snapshot saved");
        Ok(())
    }

    /// Load every registry that has a snapshot file. Missing files are
    /// a fresh install, not an error.
    pub fn load_all(&self, net: &mut Network) -> std::io::Result<()> {
        if let Ok(file) = File::open(self.path(NICKS_FILE)) {
            net.nicks.load(BufReader::new(file))?;
        }
        if let Ok(file) = File::open(self.path(CHANS_FILE)) {
            net.chans.load(BufReader::new(file))?;
        }
        if let Ok(file) = File::open(self.path(AKILLS_FILE)) {
            net.akills.load(BufReader::new(file))?;
        }
        if let Ok(file) = File::open(self.path(EXCEPTIONS_FILE)) {
            net.sessions.load(BufReader::new(file))?;
        }
        if let Ok(file) = File::open(self.path(OPERS_FILE)) {
            let lists: OperLists =
                serde_json::from_reader(BufReader::new(file)).map_err(std::io::Error::other)?;
            net.admins = lists.admins;
            net.opers = lists.opers;
        }
        info!(
            nicks = net.nicks.len(),
            channels = net.chans.len(),
            akills = net.akills.len(),
            "registries loaded"
        );
        Ok(())
    }

    /// Save every registry.
    pub fn save_all(&self, net: &mut Network) -> std::io::Result<()> {
        // Keep-topic channels persist the live topic.
        net.record_topics();

        self.write_atomic(NICKS_FILE, |w| net.nicks.save(w))?;
        self.write_atomic(CHANS_FILE, |w| net.chans.save(w))?;
        self.write_atomic(AKILLS_FILE, |w| net.akills.save(w))?;
        self.write_atomic(EXCEPTIONS_FILE, |w| net.sessions.save(w))?;
        let lists = OperLists {
            admins: net.admins.clone(),
            opers: net.opers.clone(),
        };
        self.write_atomic(OPERS_FILE, |w| {
            serde_json::to_writer(w, &lists).map_err(std::io::Error::other)
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::transport::Recorder;

    fn network() -> Network {
        Network::new(Config::default(), Box::new(Recorder::new()), 1000)
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let db = Db::new(dir.path()).unwrap();

        let mut net = network();
        net.nicks
            .register("alice", "hunter2x", "i@h", "r", 1000)
            .unwrap();
        net.chans
            .register("#test", "alice", "hunter2x", "d", 1000)
            .unwrap();
        net.akills.add("*@bad", "spam", "oper", 1000, 0).unwrap();
        net.sessions
            .exception_add("*.example", 5, "oper", "bnc", 1000, 0, 0)
            .unwrap();
        net.admins.push("alice".to_owned());
        db.save_all(&mut net).unwrap();

        let mut loaded = network();
        db.load_all(&mut loaded).unwrap();
        assert!(loaded.nicks.get("alice").is_some());
        assert!(loaded.chans.get("#test").is_some());
        assert_eq!(loaded.akills.len(), 1);
        assert_eq!(loaded.sessions.exceptions().len(), 1);
        assert_eq!(loaded.admins, vec!["alice".to_owned()]);
    }

    #[test]
    fn missing_files_are_a_fresh_install() {
        let dir = tempfile::tempdir().unwrap();
        let db = Db::new(dir.path()).unwrap();
        let mut net = network();
        db.load_all(&mut net).unwrap();
        assert!(net.nicks.is_empty());
    }

    #[test]
    fn corrupt_file_errors_at_load() {
        let dir = tempfile::tempdir().unwrap();
        let db = Db::new(dir.path()).unwrap();
        std::fs::write(dir.path().join(NICKS_FILE), b"{not json").unwrap();
        let mut net = network();
        assert!(db.load_all(&mut net).is_err());
    }
}
