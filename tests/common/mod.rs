//! Shared test harness.
//!
//! Drives the whole core the way the uplink would: decoded events in,
//! recorded lines out. No sockets anywhere.

use slserv_proto::Event;
use slservd::config::Config;
use slservd::handlers::Registry;
use slservd::state::Network;
use slservd::transport::{Recorder, Transport};
use std::sync::Arc;

pub struct SharedRecorder(pub Arc<Recorder>);

impl Transport for SharedRecorder {
    fn send(&self, source: &str, line: &str) {
        self.0.send(source, line);
    }
}

pub struct Harness {
    pub net: Network,
    pub registry: Registry,
    pub rec: Arc<Recorder>,
    pub now: i64,
}

#[allow(dead_code)] // Not every test file uses every helper.
impl Harness {
    pub fn new() -> Self {
        let mut config = Config::default();
        config.operserv.startup_grace = 0;
        Self::with_config(config)
    }

    pub fn with_config(config: Config) -> Self {
        let rec = Arc::new(Recorder::new());
        let net = Network::new(config, Box::new(SharedRecorder(rec.clone())), 1000);
        Self {
            net,
            registry: Registry::new(),
            rec,
            now: 1000,
        }
    }

    /// Feed one decoded event at the current time.
    pub fn event(&mut self, source: Option<&str>, verb: &str, args: &[&str]) {
        let event = Event::new(source, verb, args);
        let now = self.now;
        self.registry.dispatch(&mut self.net, &event, now);
    }

    /// A new connection from the network.
    pub fn connect(&mut self, nick: &str, host: &str) {
        self.event(
            None,
            "NICK",
            &[nick, "ident", host, "hub.net", &self.now.to_string(), "Test User"],
        );
    }

    /// A service command over PRIVMSG.
    pub fn privmsg(&mut self, from: &str, target: &str, text: &str) {
        self.event(Some(from), "PRIVMSG", &[target, text]);
    }

    /// Advance the clock and run the timer tick.
    pub fn advance(&mut self, secs: i64) {
        self.now += secs;
        let now = self.now;
        self.net.tick(now);
    }

    pub fn lines(&self) -> Vec<String> {
        self.rec.lines()
    }

    pub fn drain(&mut self) -> Vec<String> {
        self.rec.take()
    }

    /// Any recorded line containing all the given fragments.
    pub fn saw(&self, fragments: &[&str]) -> bool {
        self.rec
            .lines()
            .iter()
            .any(|l| fragments.iter().all(|f| l.contains(f)))
    }
}
