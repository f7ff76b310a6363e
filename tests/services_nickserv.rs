//! NickServ flows driven end to end through decoded protocol events.

mod common;
use common::Harness;

#[test]
fn register_and_identify_flow() {
    let mut h = Harness::new();
    h.connect("alice", "home.example");
    h.privmsg("alice", "NickServ", "REGISTER hunter2x alice@example.com");

    assert!(h.saw(&["NOTICE alice", "has been registered"]));
    let record = h.net.nicks.get("alice").unwrap();
    assert!(record.identified);
    assert_eq!(record.email.as_deref(), Some("alice@example.com"));
    assert_eq!(record.last_usermask.as_deref(), Some("ident@home.example"));
}

#[test]
fn register_rejects_weak_password_with_one_notice() {
    let mut h = Harness::new();
    h.connect("alice", "home.example");
    h.drain();
    h.privmsg("alice", "NickServ", "REGISTER alice");

    let notices: Vec<String> = h
        .drain()
        .into_iter()
        .filter(|l| l.contains("NOTICE alice"))
        .collect();
    assert_eq!(notices.len(), 1);
    assert!(h.net.nicks.get("alice").is_none());
}

#[test]
fn registration_cooldown_applies() {
    let mut h = Harness::new();
    h.connect("alice", "home.example");
    h.privmsg("alice", "NickServ", "REGISTER hunter2x");
    // Same connection renames and tries to register again right away.
    h.event(Some("alice"), "NICK", &["alice2"]);
    h.drain();
    h.privmsg("alice2", "NickServ", "REGISTER hunter2x");

    assert!(h.saw(&["NOTICE alice2", "wait"]));
    assert!(h.net.nicks.get("alice2").is_none());
}

#[test]
fn three_bad_passwords_disconnect() {
    let mut h = Harness::new();
    h.connect("alice", "home.example");
    h.privmsg("alice", "NickServ", "REGISTER hunter2x");
    h.event(Some("alice"), "QUIT", &["leaving"]);

    h.connect("alice", "elsewhere.example");
    h.drain();
    h.privmsg("alice", "NickServ", "IDENTIFY wrongpass");
    assert!(h.net.users.contains_key("alice"));
    h.privmsg("alice", "NickServ", "IDENTIFY wrongpass");
    assert!(h.net.users.contains_key("alice"));
    h.privmsg("alice", "NickServ", "IDENTIFY wrongpass");

    // Third failure crosses BadPassLimit=3: the connection is killed.
    assert!(!h.net.users.contains_key("alice"));
    assert!(h.saw(&["KILL alice", "invalid passwords"]));
}

#[test]
fn bad_password_counter_resets_after_timeout() {
    let mut h = Harness::new();
    h.connect("alice", "home.example");
    h.privmsg("alice", "NickServ", "REGISTER hunter2x");
    h.event(Some("alice"), "QUIT", &["leaving"]);

    h.connect("alice", "elsewhere.example");
    h.privmsg("alice", "NickServ", "IDENTIFY wrongpass");
    h.privmsg("alice", "NickServ", "IDENTIFY wrongpass");

    // Wait out BadPassTimeout; the third failure starts a fresh count.
    let timeout = h.net.config.nickserv.bad_pass_timeout;
    h.advance(timeout + 1);
    h.privmsg("alice", "NickServ", "IDENTIFY wrongpass");
    assert!(h.net.users.contains_key("alice"));
    assert_eq!(h.net.users.get("alice").unwrap().bad_pass_count, 1);

    // And the right password still works.
    h.privmsg("alice", "NickServ", "IDENTIFY hunter2x");
    assert!(h.net.nicks.get("alice").unwrap().identified);
}

#[test]
fn link_moves_channel_counts_and_unlink_restores() {
    let mut h = Harness::new();
    h.connect("alice", "home.example");
    h.privmsg("alice", "NickServ", "REGISTER hunter2x");
    h.net.nicks.get_mut("alice").unwrap().channel_count = 2;
    h.net.nicks.get_mut("alice").unwrap().memos.push(
        slservd::registry::nick::Memo {
            sender: "bob".into(),
            time: 1,
            text: "hi".into(),
            unread: true,
        },
    );

    h.connect("master", "other.example");
    h.privmsg("master", "NickServ", "REGISTER hunter9y");
    h.event(Some("master"), "QUIT", &["bye"]);

    h.privmsg("alice", "NickServ", "LINK master hunter9y");
    let master = h.net.nicks.get("master").unwrap();
    assert_eq!(master.channel_count, 2);
    assert_eq!(master.memos.len(), 1);
    let alice = h.net.nicks.get("alice").unwrap();
    assert!(alice.memos.is_empty());
    assert!(alice.access.is_empty());
    assert_eq!(
        h.net.users.get("alice").unwrap().effective_identity.as_deref(),
        Some("master")
    );

    h.privmsg("alice", "NickServ", "UNLINK");
    let master = h.net.nicks.get("master").unwrap();
    assert_eq!(master.channel_count, 0);
    assert_eq!(master.link_count, 0);
    assert!(h.net.nicks.get("alice").unwrap().link.is_none());
}

#[test]
fn drop_cascades_to_channels_and_lists() {
    let mut h = Harness::new();
    h.connect("alice", "home.example");
    h.privmsg("alice", "NickServ", "REGISTER hunter2x");
    h.connect("bob", "other.example");
    h.privmsg("bob", "NickServ", "REGISTER hunter9y");

    // Alice founds a channel and puts bob on its lists.
    h.event(Some("alice"), "JOIN", &["#lair"]);
    h.event(Some("hub.net"), "MODE", &["#lair", "+o", "alice"]);
    h.privmsg("alice", "ChanServ", "REGISTER #lair sekrit99 the lair");
    h.privmsg("alice", "ChanServ", "ACCESS #lair ADD bob 5");
    assert_eq!(h.net.nicks.get("alice").unwrap().channel_count, 1);

    // Bob drops; his access entry goes inert everywhere.
    h.privmsg("bob", "NickServ", "DROP");
    assert!(h.net.nicks.get("bob").is_none());
    assert_eq!(h.net.chans.get("#lair").unwrap().access_level_of("bob"), 0);

    // Alice drops; with no successor the channel dies with her.
    h.privmsg("alice", "NickServ", "DROP");
    assert!(h.net.nicks.get("alice").is_none());
    assert!(h.net.chans.get("#lair").is_none());
}

#[test]
fn drop_transfers_channel_to_successor_with_capacity() {
    let mut h = Harness::new();
    h.connect("alice", "home.example");
    h.privmsg("alice", "NickServ", "REGISTER hunter2x");
    h.connect("heir", "other.example");
    h.privmsg("heir", "NickServ", "REGISTER hunter9y");

    h.event(Some("alice"), "JOIN", &["#lair"]);
    h.event(Some("hub.net"), "MODE", &["#lair", "+o", "alice"]);
    h.privmsg("alice", "ChanServ", "REGISTER #lair sekrit99 the lair");
    h.privmsg("alice", "ChanServ", "SET #lair SUCCESSOR heir");

    h.privmsg("alice", "NickServ", "DROP");
    let record = h.net.chans.get("#lair").unwrap();
    assert_eq!(record.founder, "heir");
    assert!(record.successor.is_none());
    assert_eq!(h.net.nicks.get("heir").unwrap().channel_count, 1);
}

#[test]
fn forbid_blocks_and_enforces() {
    let mut h = Harness::with_config({
        let mut config = slservd::config::Config::default();
        config.operserv.startup_grace = 0;
        config.operserv.roots = vec!["root".to_owned()];
        config
    });
    h.connect("root", "hq.example");
    h.privmsg("root", "NickServ", "REGISTER hunter2x");

    h.connect("victim", "elsewhere.example");
    h.privmsg("root", "NickServ", "FORBID seized");
    assert!(h.net.nicks.get("seized").unwrap().forbidden);

    // Registration of a forbidden nick is refused.
    h.connect("seized", "somewhere.example");
    h.drain();
    h.privmsg("seized", "NickServ", "REGISTER hunter2x");
    assert!(h.saw(&["NOTICE seized", "may not be used"]));
    assert!(h.net.nicks.get("seized").unwrap().password.is_empty());
}

#[test]
fn recover_kills_and_holds_then_release() {
    let mut h = Harness::new();
    h.connect("alice", "home.example");
    h.privmsg("alice", "NickServ", "REGISTER hunter2x");
    h.event(Some("alice"), "QUIT", &["brb"]);

    // An imposter takes the nick; the owner comes back as alice_.
    h.connect("alice", "evil.example");
    h.connect("alice_", "home.example");
    h.drain();
    h.privmsg("alice_", "NickServ", "RECOVER alice hunter2x");

    assert!(!h.net.users.contains_key("alice"));
    assert!(h.net.nicks.get("alice").unwrap().kill_held);
    assert!(h.saw(&["KILL alice", "Nickname enforcement"]));

    h.privmsg("alice_", "NickServ", "RELEASE alice hunter2x");
    assert!(!h.net.nicks.get("alice").unwrap().kill_held);
}

#[test]
fn ghost_kills_without_hold() {
    let mut h = Harness::new();
    h.connect("alice", "home.example");
    h.privmsg("alice", "NickServ", "REGISTER hunter2x");
    h.event(Some("alice"), "QUIT", &["brb"]);

    h.connect("alice", "evil.example");
    h.connect("alice_", "home.example");
    h.privmsg("alice_", "NickServ", "GHOST alice hunter2x");

    assert!(!h.net.users.contains_key("alice"));
    assert!(!h.net.nicks.get("alice").unwrap().kill_held);
    assert!(h.saw(&["KILL alice", "GHOST command used by alice_"]));
}

#[test]
fn set_kill_schedules_enforcement_for_stranger() {
    let mut h = Harness::new();
    h.connect("alice", "home.example");
    h.privmsg("alice", "NickServ", "REGISTER hunter2x");
    h.privmsg("alice", "NickServ", "SET KILL ON");
    h.event(Some("alice"), "QUIT", &["bye"]);

    h.connect("alice", "evil.example");
    h.drain();
    let delay = h.net.config.nickserv.kill_delay;
    h.advance(delay);
    assert!(!h.net.users.contains_key("alice"));
    assert!(h.saw(&["KILL alice", "Nickname enforcement"]));
}

#[test]
fn access_mask_gives_recognition_on_connect() {
    let mut h = Harness::new();
    h.connect("alice", "home.example");
    h.privmsg("alice", "NickServ", "REGISTER hunter2x");
    h.privmsg("alice", "NickServ", "ACCESS ADD ident@home.example");
    h.event(Some("alice"), "QUIT", &["bye"]);

    h.connect("alice", "home.example");
    let record = h.net.nicks.get("alice").unwrap();
    assert!(record.recognized);
    assert!(!record.identified);
}
