//! OperServ flows: autokill, session limits, exceptions, privilege
//! lists.

mod common;
use common::Harness;
use slservd::config::Config;

/// Harness with `root` configured as services root, connected,
/// registered, identified and marked as an IRC operator.
fn oper_harness() -> Harness {
    let mut config = Config::default();
    config.operserv.startup_grace = 0;
    config.operserv.roots = vec!["root".to_owned()];
    let mut h = Harness::with_config(config);
    h.connect("root", "hq.example");
    h.privmsg("root", "NickServ", "REGISTER hunter2x");
    h.event(Some("root"), "MODE", &["root", "+o"]);
    h
}

#[test]
fn akill_rejects_connection_before_any_user_exists() {
    let mut h = oper_harness();
    h.privmsg("root", "OperServ", "AKILL ADD +0 *@badhost.example spam");
    assert_eq!(h.net.akills.len(), 1);

    h.drain();
    h.event(
        None,
        "NICK",
        &["troll", "ident", "badhost.example", "hub.net", "1", "r"],
    );
    assert!(!h.net.users.contains_key("troll"));
    assert_eq!(h.net.sessions.count_of("badhost.example"), 0);
    assert!(h.saw(&["KILL troll", "Autokilled", "spam"]));

    h.drain();
    h.privmsg("root", "OperServ", "AKILL LIST");
    let rows: Vec<String> = h
        .drain()
        .into_iter()
        .filter(|l| l.contains("*@badhost.example"))
        .collect();
    assert_eq!(rows.len(), 1);
}

#[test]
fn akill_expiry_and_range_delete() {
    let mut h = oper_harness();
    h.privmsg("root", "OperServ", "AKILL ADD +1h *@a.example one");
    h.privmsg("root", "OperServ", "AKILL ADD +0 *@b.example two");
    h.privmsg("root", "OperServ", "AKILL ADD +0 *@c.example three");
    assert_eq!(h.net.akills.len(), 3);

    // The one-hour entry stops matching and is swept.
    h.advance(3601);
    let now = h.now;
    h.net.expire_sweep(now);
    assert_eq!(h.net.akills.len(), 2);

    h.privmsg("root", "OperServ", "AKILL DEL 1-2");
    assert_eq!(h.net.akills.len(), 0);
}

#[test]
fn akill_requires_services_oper() {
    let mut h = oper_harness();
    h.connect("joe", "joe.example");
    h.event(Some("joe"), "MODE", &["joe", "+o"]);
    h.drain();
    h.privmsg("joe", "OperServ", "AKILL ADD *@x.example nope");
    assert!(h.saw(&["NOTICE joe", "Access denied"]));
    assert_eq!(h.net.akills.len(), 0);

    // Non-ircops are turned away at the door.
    h.connect("pleb", "pleb.example");
    h.drain();
    h.privmsg("pleb", "OperServ", "STATS");
    assert!(h.saw(&["NOTICE pleb", "Access denied"]));
}

#[test]
fn session_limit_enforced_and_exception_lifts_it() {
    let mut config = Config::default();
    config.operserv.startup_grace = 0;
    config.operserv.roots = vec!["root".to_owned()];
    config.operserv.session_limit = 2;
    let mut h = Harness::with_config(config);
    h.net.sessions = slservd::registry::SessionRegistry::new(2, 8);
    h.connect("root", "hq.example");
    h.privmsg("root", "NickServ", "REGISTER hunter2x");
    h.event(Some("root"), "MODE", &["root", "+o"]);

    h.connect("a1", "shared.example");
    h.connect("a2", "shared.example");
    h.drain();
    h.connect("a3", "shared.example");
    assert!(!h.net.users.contains_key("a3"));
    assert!(h.saw(&["KILL a3", "Session limit exceeded"]));

    h.privmsg("root", "OperServ", "EXCEPTION ADD shared.example 10 shell box");
    h.connect("a3", "shared.example");
    assert!(h.net.users.contains_key("a3"));
    assert_eq!(h.net.sessions.count_of("shared.example"), 3);

    h.drain();
    h.privmsg("root", "OperServ", "SESSION VIEW shared.example");
    assert!(h.saw(&["NOTICE root", "3 session(s)", "limit 10"]));
}

#[test]
fn exception_move_reorders_first_match() {
    let mut h = oper_harness();
    h.privmsg("root", "OperServ", "EXCEPTION ADD *.example 5 broad entry");
    h.privmsg("root", "OperServ", "EXCEPTION ADD special.example 9 narrow entry");
    let now = h.now;
    assert_eq!(h.net.sessions.limit_for("special.example", now), 5);

    h.privmsg("root", "OperServ", "EXCEPTION MOVE 2 1");
    assert_eq!(h.net.sessions.limit_for("special.example", now), 9);
}

#[test]
fn admin_and_oper_lists_gate_each_other() {
    let mut h = oper_harness();
    h.connect("helper", "helper.example");
    h.privmsg("helper", "NickServ", "REGISTER hunter9y");
    h.event(Some("helper"), "MODE", &["helper", "+o"]);

    // Helper is nobody yet: cannot edit the oper list.
    h.drain();
    h.privmsg("helper", "OperServ", "OPER ADD helper");
    assert!(h.saw(&["NOTICE helper", "Access denied"]));

    // Root promotes helper to services admin; now helper can.
    h.privmsg("root", "OperServ", "ADMIN ADD helper");
    assert!(h.net.admins.contains(&"helper".to_owned()));
    h.privmsg("helper", "OperServ", "OPER ADD helper");
    assert!(h.net.opers.contains(&"helper".to_owned()));

    // But only root touches the admin list.
    h.drain();
    h.privmsg("helper", "OperServ", "ADMIN ADD helper");
    assert!(h.saw(&["NOTICE helper", "Access denied"]));
}

#[test]
fn clone_warning_fires_for_rapid_connections() {
    let mut config = Config::default();
    config.operserv.startup_grace = 0;
    config.operserv.clone_trigger = 3;
    config.operserv.session_limit = 0;
    let mut h = Harness::with_config(config);
    h.net.sessions = slservd::registry::SessionRegistry::new(0, 8);

    for i in 0..3 {
        h.connect(&format!("clone{}", i), "farm.example");
    }
    let warnings = h
        .lines()
        .iter()
        .filter(|l| l.contains("GLOBOPS") && l.contains("clones"))
        .count();
    assert_eq!(warnings, 1);
}

#[test]
fn stats_reports_counts() {
    let mut h = oper_harness();
    h.connect("someone", "x.example");
    h.drain();
    h.privmsg("root", "OperServ", "STATS");
    assert!(h.saw(&["NOTICE root", "Current users: 2"]));
    assert!(h.saw(&["Registered nicknames: 1"]));
}
