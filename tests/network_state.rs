//! Cross-cutting state-engine properties.

mod common;
use common::Harness;
use slservd::registry::chan::{self, ChanAction, ACCESS_FOUNDER};

#[test]
fn effective_identity_resolution_is_idempotent() {
    let mut h = Harness::new();
    for nick in ["a", "b", "c"] {
        h.connect(nick, &format!("{}.example", nick));
        h.privmsg(nick, "NickServ", &format!("REGISTER hunter2{}x", nick));
    }
    h.net.nicks.link("b", "a").unwrap();
    h.net.nicks.link("c", "b").unwrap();

    let first = h.net.nicks.resolve_effective("c").unwrap();
    let second = h.net.nicks.resolve_effective(&first).unwrap();
    assert_eq!(first, second);
    assert!(h.net.nicks.get(&second).unwrap().link.is_none());
}

#[test]
fn founder_passes_all_actions_except_inverted() {
    let mut h = Harness::new();
    h.connect("alice", "home.example");
    h.privmsg("alice", "NickServ", "REGISTER hunter2x");
    h.event(Some("alice"), "JOIN", &["#test"]);
    h.event(Some("hub.net"), "MODE", &["#test", "+o", "alice"]);
    h.privmsg("alice", "ChanServ", "REGISTER #test sekrit99 d");

    let level = h.net.user_level("alice", "#test");
    assert_eq!(level, ACCESS_FOUNDER);
    let record = h.net.chans.get("#test").unwrap();
    for action in ChanAction::ALL {
        assert_eq!(
            chan::check_access(record, level, action),
            !action.inverted(),
            "action {:?}",
            action
        );
    }
}

#[test]
fn empty_channel_deallocates_completely() {
    let mut h = Harness::new();
    h.connect("alice", "home.example");
    h.privmsg("alice", "NickServ", "REGISTER hunter2x");
    h.event(Some("alice"), "JOIN", &["#test"]);
    h.event(Some("hub.net"), "MODE", &["#test", "+o", "alice"]);
    h.privmsg("alice", "ChanServ", "REGISTER #test sekrit99 d");

    h.event(Some("alice"), "PART", &["#test"]);
    // The live side is gone without residue; the registered side knows
    // nothing of it (linkage is derived, not stored).
    assert!(h.net.channels.get("#test").is_none());
    assert!(h.net.chans.get("#test").is_some());
    assert!(h.net.users.get("alice").unwrap().channels.is_empty());
}

#[test]
fn registries_round_trip_byte_for_byte() {
    let mut h = Harness::new();
    h.connect("alice", "home.example");
    h.privmsg("alice", "NickServ", "REGISTER hunter2x");
    h.privmsg("alice", "NickServ", "ACCESS ADD ident@home.example");
    h.event(Some("alice"), "JOIN", &["#test"]);
    h.event(Some("hub.net"), "MODE", &["#test", "+o", "alice"]);
    h.privmsg("alice", "ChanServ", "REGISTER #test sekrit99 d");
    h.privmsg("alice", "ChanServ", "AKICK #test ADD *!*@bad.example spam");
    // Leave a vacant slot behind; it must survive the round trip.
    h.connect("alice2", "a2.example");
    h.privmsg("alice2", "NickServ", "REGISTER hunter9y");
    h.privmsg("alice", "ChanServ", "ACCESS #test ADD alice2 3");
    h.privmsg("alice", "ChanServ", "ACCESS #test DEL alice2");

    let mut nick_bytes = Vec::new();
    h.net.nicks.save(&mut nick_bytes).unwrap();
    let mut chan_bytes = Vec::new();
    h.net.chans.save(&mut chan_bytes).unwrap();

    let mut h2 = Harness::new();
    h2.net.nicks.load(nick_bytes.as_slice()).unwrap();
    h2.net.chans.load(chan_bytes.as_slice()).unwrap();

    // A single-record registry reserializes to identical bytes.
    let mut chan_bytes_again = Vec::new();
    h2.net.chans.save(&mut chan_bytes_again).unwrap();
    assert_eq!(chan_bytes, chan_bytes_again);

    let record = h2.net.chans.get("#test").unwrap();
    assert!(record.akick.iter().any(|s| s.in_use));
    assert!(record.access.iter().any(|s| !s.in_use));
}

#[test]
fn squit_cleans_up_descendants_and_sessions() {
    let mut h = Harness::new();
    h.event(None, "SERVER", &["hub.net", "1", "hub"]);
    h.event(Some("hub.net"), "SERVER", &["leaf.net", "2", "leaf"]);
    h.event(Some("leaf.net"), "SERVER", &["deep.net", "3", "deep"]);

    h.event(None, "NICK", &["a", "i", "h1", "hub.net", "1", "r"]);
    h.event(None, "NICK", &["b", "i", "h2", "leaf.net", "1", "r"]);
    h.event(None, "NICK", &["c", "i", "h3", "deep.net", "1", "r"]);
    h.event(Some("b"), "JOIN", &["#chat"]);
    h.event(Some("c"), "JOIN", &["#chat"]);

    h.event(None, "SQUIT", &["leaf.net"]);
    assert!(h.net.users.contains_key("a"));
    assert!(!h.net.users.contains_key("b"));
    assert!(!h.net.users.contains_key("c"));
    assert!(!h.net.servers.contains("deep.net"));
    // Their channel emptied and died with them.
    assert!(h.net.channels.get("#chat").is_none());
    assert_eq!(h.net.sessions.count_of("h2"), 0);
    assert_eq!(h.net.sessions.count_of("h3"), 0);
}

#[test]
fn nick_expiry_sweep_respects_protections() {
    let mut h = Harness::new();
    for nick in ["old", "kept", "fresh"] {
        h.connect(nick, &format!("{}.example", nick));
        h.privmsg(nick, "NickServ", "REGISTER hunter2x");
        h.event(Some(nick), "QUIT", &["bye"]);
    }
    h.net.nicks.get_mut("kept").unwrap().no_expire = true;

    let expire = h.net.config.nickserv.expire;
    h.advance(expire - 100);
    // Fresh reconnects and is seen again just before the horizon.
    h.connect("fresh", "fresh.example");
    h.privmsg("fresh", "NickServ", "IDENTIFY hunter2x");
    h.event(Some("fresh"), "QUIT", &["bye"]);

    h.advance(200);
    let now = h.now;
    h.net.expire_sweep(now);
    assert!(h.net.nicks.get("old").is_none());
    assert!(h.net.nicks.get("kept").is_some());
    assert!(h.net.nicks.get("fresh").is_some());
}

#[test]
fn channel_expiry_follows_last_used() {
    let mut h = Harness::new();
    h.connect("alice", "home.example");
    h.privmsg("alice", "NickServ", "REGISTER hunter2x");
    h.event(Some("alice"), "JOIN", &["#test"]);
    h.event(Some("hub.net"), "MODE", &["#test", "+o", "alice"]);
    h.privmsg("alice", "ChanServ", "REGISTER #test sekrit99 d");

    let expire = h.net.config.chanserv.expire;
    h.advance(expire + 1);
    let now = h.now;
    h.net.expire_sweep(now);
    assert!(h.net.chans.get("#test").is_none());
    // The founder's count came back with the cascade.
    assert_eq!(h.net.nicks.get("alice").unwrap().channel_count, 0);
}
