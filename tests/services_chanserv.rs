//! ChanServ flows driven end to end through decoded protocol events.

mod common;
use common::Harness;

/// Connect a user, register+identify their nick, join a channel, get
/// server ops, and register the channel.
fn setup_channel(h: &mut Harness, nick: &str, chan: &str) {
    h.connect(nick, "home.example");
    h.privmsg(nick, "NickServ", "REGISTER hunter2x");
    h.event(Some(nick), "JOIN", &[chan]);
    h.event(Some("hub.net"), "MODE", &[chan, "+o", nick]);
    h.privmsg(nick, "ChanServ", &format!("REGISTER {} sekrit99 a test channel", chan));
}

#[test]
fn register_requires_live_ops() {
    let mut h = Harness::new();
    h.connect("alice", "home.example");
    h.privmsg("alice", "NickServ", "REGISTER hunter2x");
    h.event(Some("alice"), "JOIN", &["#test"]);
    h.drain();

    // Not an op yet: refused.
    h.privmsg("alice", "ChanServ", "REGISTER #test sekrit99 my channel");
    assert!(h.saw(&["NOTICE alice", "channel operator"]));
    assert!(h.net.chans.get("#test").is_none());

    h.event(Some("hub.net"), "MODE", &["#test", "+o", "alice"]);
    h.privmsg("alice", "ChanServ", "REGISTER #test sekrit99 my channel");
    let record = h.net.chans.get("#test").unwrap();
    assert_eq!(record.founder, "alice");
    assert_eq!(h.net.nicks.get("alice").unwrap().channel_count, 1);
}

#[test]
fn mlock_reverts_peer_change_with_single_line() {
    let mut h = Harness::new();
    setup_channel(&mut h, "alice", "#test");
    assert_eq!(h.net.chans.get("#test").unwrap().mlock.on, "nt");

    h.advance(5);
    h.drain();
    h.event(Some("hub.net"), "MODE", &["#test", "-n"]);

    let corrections: Vec<String> = h
        .drain()
        .into_iter()
        .filter(|l| l.contains("MODE #test"))
        .collect();
    assert_eq!(corrections.len(), 1);
    assert!(corrections[0].contains("+n"));

    let channel = h.net.channels.get("#test").unwrap();
    assert!(channel.modes.no_external && channel.modes.topic_protected);
    assert_eq!(channel.counters_this_second(h.now), (1, 1));
    assert!(!channel.bouncy);
}

#[test]
fn set_mlock_applies_immediately() {
    let mut h = Harness::new();
    setup_channel(&mut h, "alice", "#test");
    h.advance(2);
    h.drain();

    h.privmsg("alice", "ChanServ", "SET #test MLOCK +ntm-s");
    assert!(h.saw(&["NOTICE alice", "Mode lock changed"]));
    let channel = h.net.channels.get("#test").unwrap();
    assert!(channel.modes.moderated);
    assert_eq!(h.net.chans.get("#test").unwrap().mlock.on, "ntm");
}

#[test]
fn access_and_auto_op_on_join() {
    let mut h = Harness::new();
    setup_channel(&mut h, "alice", "#test");
    h.connect("bob", "bob.example");
    h.privmsg("bob", "NickServ", "REGISTER hunter9y");

    h.privmsg("alice", "ChanServ", "ACCESS #test ADD bob 5");
    assert_eq!(h.net.chans.get("#test").unwrap().access_level_of("bob"), 5);

    h.drain();
    h.event(Some("bob"), "JOIN", &["#test"]);
    assert!(h.saw(&["MODE #test +o bob"]));
    assert!(h.net.channels.get("#test").unwrap().ops.contains("bob"));
}

#[test]
fn access_grant_cannot_reach_own_level() {
    let mut h = Harness::new();
    setup_channel(&mut h, "alice", "#test");
    h.connect("bob", "bob.example");
    h.privmsg("bob", "NickServ", "REGISTER hunter9y");
    h.connect("carol", "carol.example");
    h.privmsg("carol", "NickServ", "REGISTER hunter8z");

    h.privmsg("alice", "ChanServ", "ACCESS #test ADD bob 10");
    h.drain();
    // Bob (level 10) may not hand out level 10.
    h.privmsg("bob", "ChanServ", "ACCESS #test ADD carol 10");
    assert!(h.saw(&["NOTICE bob", "Access denied"]));
    assert_eq!(h.net.chans.get("#test").unwrap().access_level_of("carol"), 0);

    h.privmsg("bob", "ChanServ", "ACCESS #test ADD carol 5");
    assert_eq!(h.net.chans.get("#test").unwrap().access_level_of("carol"), 5);
}

#[test]
fn akick_add_enforces_against_present_members() {
    let mut h = Harness::new();
    setup_channel(&mut h, "alice", "#test");
    h.connect("troll", "spam.example");
    h.event(Some("troll"), "JOIN", &["#test"]);
    assert!(h.net.channels.get("#test").unwrap().members.contains("troll"));

    h.drain();
    h.privmsg("alice", "ChanServ", "AKICK #test ADD *!*@spam.example flooding");
    assert!(h.saw(&["MODE #test +b *!ident@spam.example"]));
    assert!(h.saw(&["KICK #test troll :flooding"]));
    assert!(!h.net.channels.get("#test").unwrap().members.contains("troll"));

    // And a rejoin is thrown out before membership.
    h.drain();
    h.event(Some("troll"), "JOIN", &["#test"]);
    assert!(h.saw(&["KICK #test troll"]));
    assert!(!h.net.channels.get("#test").unwrap().members.contains("troll"));
}

#[test]
fn topic_retention_and_lock() {
    let mut h = Harness::new();
    setup_channel(&mut h, "alice", "#test");

    h.event(Some("alice"), "TOPIC", &["#test", "welcome home"]);
    assert_eq!(
        h.net.chans.get("#test").unwrap().last_topic.as_ref().unwrap().text,
        "welcome home"
    );

    // Channel empties and is recreated: the topic is replayed.
    h.event(Some("alice"), "PART", &["#test"]);
    assert!(h.net.channels.get("#test").is_none());
    h.drain();
    h.event(Some("alice"), "JOIN", &["#test"]);
    assert!(h.saw(&["TOPIC #test", "welcome home"]));

    // With TOPICLOCK on, a stranger's topic is reverted.
    h.privmsg("alice", "ChanServ", "SET #test TOPICLOCK ON");
    h.connect("rando", "rando.example");
    h.event(Some("rando"), "JOIN", &["#test"]);
    h.drain();
    h.event(Some("rando"), "TOPIC", &["#test", "defaced"]);
    assert!(h.saw(&["TOPIC #test", "welcome home"]));
    assert_eq!(
        h.net.channels.get("#test").unwrap().topic.as_ref().unwrap().text,
        "welcome home"
    );
}

#[test]
fn levels_reshape_thresholds() {
    let mut h = Harness::new();
    setup_channel(&mut h, "alice", "#test");
    h.connect("bob", "bob.example");
    h.privmsg("bob", "NickServ", "REGISTER hunter9y");
    h.privmsg("alice", "ChanServ", "ACCESS #test ADD bob 3");

    // Default auto-op threshold is 5: a level-3 user gets voice only.
    h.drain();
    h.event(Some("bob"), "JOIN", &["#test"]);
    assert!(h.saw(&["MODE #test +v bob"]));

    h.event(Some("bob"), "PART", &["#test"]);
    h.privmsg("alice", "ChanServ", "LEVELS #test SET AUTOOP 3");
    h.drain();
    h.event(Some("bob"), "JOIN", &["#test"]);
    assert!(h.saw(&["MODE #test +o bob"]));
}

#[test]
fn invite_op_deop_unban_clear() {
    let mut h = Harness::new();
    setup_channel(&mut h, "alice", "#test");
    h.drain();

    h.privmsg("alice", "ChanServ", "INVITE #test");
    assert!(h.saw(&["INVITE alice #test"]));

    h.privmsg("alice", "ChanServ", "DEOP #test");
    assert!(h.saw(&["MODE #test -o alice"]));
    assert!(!h.net.channels.get("#test").unwrap().ops.contains("alice"));

    h.privmsg("alice", "ChanServ", "OP #test");
    assert!(h.net.channels.get("#test").unwrap().ops.contains("alice"));

    // A ban covering alice can be lifted with UNBAN.
    h.event(Some("hub.net"), "MODE", &["#test", "+b", "*!*@home.example"]);
    h.drain();
    h.privmsg("alice", "ChanServ", "UNBAN #test");
    assert!(h.saw(&["MODE #test -b *!*@home.example"]));
    assert!(h.net.channels.get("#test").unwrap().ban_masks().is_empty());

    // CLEAR USERS empties the room.
    h.privmsg("alice", "ChanServ", "CLEAR #test USERS");
    assert!(h.net.channels.get("#test").is_none());
}

#[test]
fn drop_and_forbid() {
    let mut h = Harness::with_config({
        let mut config = slservd::config::Config::default();
        config.operserv.startup_grace = 0;
        config.operserv.roots = vec!["root".to_owned()];
        config
    });
    setup_channel(&mut h, "alice", "#test");
    h.privmsg("alice", "ChanServ", "DROP #test");
    assert!(h.net.chans.get("#test").is_none());
    assert_eq!(h.net.nicks.get("alice").unwrap().channel_count, 0);

    h.connect("root", "hq.example");
    h.privmsg("root", "NickServ", "REGISTER hunter2x");
    h.privmsg("root", "ChanServ", "FORBID #test");
    assert!(h.net.chans.get("#test").unwrap().forbidden);

    // Joining a forbidden channel gets an immediate kick.
    h.drain();
    h.event(Some("alice"), "JOIN", &["#test"]);
    assert!(h.saw(&["KICK #test alice", "may not be used"]));
}

#[test]
fn suspended_record_rejects_commands() {
    let mut h = Harness::new();
    setup_channel(&mut h, "alice", "#test");
    h.net.chans.get_mut("#test").unwrap().suspended = true;
    h.drain();
    h.privmsg("alice", "ChanServ", "SET #test TOPICLOCK ON");
    assert!(h.saw(&["NOTICE alice", "may not be used"]));
    assert!(!h.net.chans.get("#test").unwrap().flags.topic_lock);
}
