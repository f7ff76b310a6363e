//! Outbound transport seam.
//!
//! The core produces protocol lines; delivery is fire-and-forget and
//! belongs to the uplink. Everything the daemon says goes through this
//! trait, which is what lets the tests drive the whole core without a
//! socket.

use slserv_proto::line::with_source;
use std::sync::Mutex;

/// Sink for outbound protocol lines.
pub trait Transport: Send {
    /// Send one line attributed to `source` (a pseudo-client nick or
    /// the services server name).
    fn send(&self, source: &str, line: &str);

    /// Notice to network operators. Default rendering is a GLOBOPS from
    /// the given source.
    fn oper_notice(&self, source: &str, text: &str) {
        self.send(source, &format!("GLOBOPS :{}", text));
    }
}

/// Transport that records every line, used by the test harness and by
/// read-only diagnostics.
#[derive(Debug, Default)]
pub struct Recorder {
    lines: Mutex<Vec<String>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain everything recorded so far.
    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut self.lines.lock().expect("recorder poisoned"))
    }

    /// Copy of everything recorded so far.
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().expect("recorder poisoned").clone()
    }
}

impl Transport for Recorder {
    fn send(&self, source: &str, line: &str) {
        self.lines
            .lock()
            .expect("recorder poisoned")
            .push(with_source(source, line));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recorder_collects_prefixed_lines() {
        let t = Recorder::new();
        t.send("NickServ", "NOTICE alice :hi");
        t.oper_notice("OperServ", "warning");
        assert_eq!(
            t.take(),
            vec![
                ":NickServ NOTICE alice :hi".to_string(),
                ":OperServ GLOBOPS :warning".to_string(),
            ]
        );
        assert!(t.lines().is_empty());
    }
}
