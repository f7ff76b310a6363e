//! Protocol event router.
//!
//! Maps inbound server-protocol verbs onto the live-state mutations
//! that must run, in order, before any command-pipeline work. Events
//! come pre-tokenized from the uplink; anomalies from peers (a MODE for
//! a channel we do not know, a PART by a non-member) are logged, never
//! messaged, since there is no requesting user to notify.

mod channel;
mod connection;
mod message;
mod server;

use crate::state::Network;
use slserv_proto::Event;
use std::collections::HashMap;
use tracing::debug;

/// A protocol event handler.
pub type Handler = fn(&mut Network, &Event, i64);

/// Registry of protocol event handlers.
pub struct Registry {
    handlers: HashMap<&'static str, Handler>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// Create a new registry with all handlers registered.
    pub fn new() -> Self {
        let mut handlers: HashMap<&'static str, Handler> = HashMap::new();

        // Connection lifecycle
        handlers.insert("NICK", connection::handle_nick);
        handlers.insert("QUIT", connection::handle_quit);
        handlers.insert("KILL", connection::handle_kill);
        handlers.insert("AWAY", connection::handle_away);
        handlers.insert("PING", connection::handle_ping);

        // Channel events
        handlers.insert("JOIN", channel::handle_join);
        handlers.insert("PART", channel::handle_part);
        handlers.insert("KICK", channel::handle_kick);
        handlers.insert("TOPIC", channel::handle_topic);
        handlers.insert("MODE", channel::handle_mode);

        // Server topology
        handlers.insert("SERVER", server::handle_server);
        handlers.insert("SQUIT", server::handle_squit);

        // Command pipeline entry
        handlers.insert("PRIVMSG", message::handle_privmsg);

        Self { handlers }
    }

    /// Dispatch one decoded event.
    pub fn dispatch(&self, net: &mut Network, event: &Event, now: i64) {
        let verb = event.verb.to_uppercase();
        match self.handlers.get(verb.as_str()) {
            Some(handler) => handler(net, event, now),
            None => debug!(verb = %event.verb, "unhandled protocol verb"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::transport::Recorder;
    use std::sync::Arc;

    struct SharedRecorder(Arc<Recorder>);

    impl crate::transport::Transport for SharedRecorder {
        fn send(&self, source: &str, line: &str) {
            self.0.send(source, line);
        }
    }

    fn network() -> (Network, Arc<Recorder>) {
        let recorder = Arc::new(Recorder::new());
        let net = Network::new(
            Config::default(),
            Box::new(SharedRecorder(recorder.clone())),
            1000,
        );
        (net, recorder)
    }

    fn ev(source: Option<&str>, verb: &str, args: &[&str]) -> Event {
        Event::new(source, verb, args)
    }

    #[test]
    fn nick_introduction_then_change() {
        let (mut net, _rec) = network();
        let registry = Registry::new();
        registry.dispatch(
            &mut net,
            &ev(
                None,
                "NICK",
                &["alice", "ident", "home.example", "hub.net", "999", "A Person"],
            ),
            1001,
        );
        assert!(net.users.contains_key("alice"));
        assert_eq!(net.users.get("alice").unwrap().signon, 999);

        registry.dispatch(&mut net, &ev(Some("alice"), "NICK", &["Alicia"]), 1002);
        assert!(!net.users.contains_key("alice"));
        assert_eq!(net.users.get("alicia").unwrap().nick, "Alicia");
    }

    #[test]
    fn join_part_quit_flow() {
        let (mut net, _rec) = network();
        let registry = Registry::new();
        registry.dispatch(
            &mut net,
            &ev(None, "NICK", &["alice", "i", "h", "hub.net", "1", "r"]),
            1001,
        );
        registry.dispatch(&mut net, &ev(Some("alice"), "JOIN", &["#a,#b"]), 1002);
        assert!(net.channels.contains_key("#a"));
        assert!(net.channels.contains_key("#b"));

        registry.dispatch(&mut net, &ev(Some("alice"), "PART", &["#a"]), 1003);
        assert!(!net.channels.contains_key("#a"));

        registry.dispatch(&mut net, &ev(Some("alice"), "QUIT", &["bye"]), 1004);
        assert!(net.users.is_empty());
        assert!(net.channels.is_empty());
    }

    #[test]
    fn kick_removes_target() {
        let (mut net, _rec) = network();
        let registry = Registry::new();
        registry.dispatch(
            &mut net,
            &ev(None, "NICK", &["alice", "i", "h", "hub.net", "1", "r"]),
            1001,
        );
        registry.dispatch(
            &mut net,
            &ev(None, "NICK", &["bob", "i", "h2", "hub.net", "1", "r"]),
            1001,
        );
        registry.dispatch(&mut net, &ev(Some("alice"), "JOIN", &["#x"]), 1002);
        registry.dispatch(&mut net, &ev(Some("bob"), "JOIN", &["#x"]), 1002);

        registry.dispatch(
            &mut net,
            &ev(Some("alice"), "KICK", &["#x", "bob", "out"]),
            1003,
        );
        assert!(!net.channels.get("#x").unwrap().members.contains("bob"));
        assert!(net.users.get("bob").unwrap().channels.is_empty());
    }

    #[test]
    fn ping_gets_pong() {
        let (mut net, rec) = network();
        let registry = Registry::new();
        registry.dispatch(&mut net, &ev(None, "PING", &["hub.net"]), 1001);
        assert!(rec.lines().iter().any(|l| l.contains("PONG")));
    }

    #[test]
    fn server_and_squit() {
        let (mut net, _rec) = network();
        let registry = Registry::new();
        registry.dispatch(&mut net, &ev(None, "SERVER", &["hub.net", "1", "hub"]), 1001);
        registry.dispatch(
            &mut net,
            &ev(Some("hub.net"), "SERVER", &["leaf.net", "2", "leaf"]),
            1001,
        );
        registry.dispatch(
            &mut net,
            &ev(None, "NICK", &["bob", "i", "h", "leaf.net", "1", "r"]),
            1002,
        );

        registry.dispatch(&mut net, &ev(None, "SQUIT", &["leaf.net"]), 1003);
        assert!(!net.servers.contains("leaf.net"));
        assert!(net.users.is_empty());
    }

    #[test]
    fn privmsg_routes_to_services() {
        let (mut net, rec) = network();
        let registry = Registry::new();
        registry.dispatch(
            &mut net,
            &ev(None, "NICK", &["alice", "i", "h", "hub.net", "1", "r"]),
            1001,
        );
        registry.dispatch(
            &mut net,
            &ev(Some("alice"), "PRIVMSG", &["NickServ", "REGISTER hunter2x"]),
            1002,
        );
        assert!(net.nicks.get("alice").is_some());
        assert!(rec
            .lines()
            .iter()
            .any(|l| l.contains("NOTICE alice") && l.contains("registered")));
    }

    #[test]
    fn unknown_verb_is_ignored() {
        let (mut net, _rec) = network();
        let registry = Registry::new();
        registry.dispatch(&mut net, &ev(None, "WALLOPS", &["hi"]), 1001);
    }
}
