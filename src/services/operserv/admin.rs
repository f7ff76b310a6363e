//! ADMIN, OPER and STATS command handlers for OperServ.
//!
//! The admin and operator lists are runtime sets of identity keys;
//! editing them is gated one level up (root edits admins, admins edit
//! opers).

use super::{require_admin, require_oper, require_root};
use crate::services::{check_read_only, reply, reply_error};
use crate::state::Network;

pub(super) fn handle_admin(net: &mut Network, user_key: &str, args: &[&str]) {
    let service = net.operserv();
    let Some(sub) = args.first().map(|s| s.to_uppercase()) else {
        reply(net, &service, user_key, "Syntax: ADMIN <ADD|DEL|LIST> [nick]");
        return;
    };

    match sub.as_str() {
        "LIST" => {
            if let Err(err) = require_oper(net, user_key) {
                reply_error(net, &service, user_key, &err);
                return;
            }
            list(net, &service, user_key, "Services admin list:", &net.admins.clone());
        }
        "ADD" | "DEL" => {
            if let Err(err) = require_root(net, user_key) {
                reply_error(net, &service, user_key, &err);
                return;
            }
            if let Err(err) = check_read_only(net) {
                reply_error(net, &service, user_key, &err);
                return;
            }
            let Some(nick) = args.get(1) else {
                reply(net, &service, user_key, "Syntax: ADMIN <ADD|DEL> <nick>");
                return;
            };
            let result = if sub == "ADD" {
                net.admin_add(nick)
            } else {
                net.admin_del(nick)
            };
            match result {
                Ok(()) => reply(
                    net,
                    &service,
                    user_key,
                    &format!(
                        "\x02{}\x02 {} the services admin list.",
                        nick,
                        if sub == "ADD" { "added to" } else { "removed from" }
                    ),
                ),
                Err(err) => reply_error(net, &service, user_key, &err),
            }
        }
        _ => reply(net, &service, user_key, "Syntax: ADMIN <ADD|DEL|LIST> [nick]"),
    }
}

pub(super) fn handle_oper(net: &mut Network, user_key: &str, args: &[&str]) {
    let service = net.operserv();
    let Some(sub) = args.first().map(|s| s.to_uppercase()) else {
        reply(net, &service, user_key, "Syntax: OPER <ADD|DEL|LIST> [nick]");
        return;
    };

    match sub.as_str() {
        "LIST" => {
            if let Err(err) = require_oper(net, user_key) {
                reply_error(net, &service, user_key, &err);
                return;
            }
            list(net, &service, user_key, "Services operator list:", &net.opers.clone());
        }
        "ADD" | "DEL" => {
            if let Err(err) = require_admin(net, user_key) {
                reply_error(net, &service, user_key, &err);
                return;
            }
            if let Err(err) = check_read_only(net) {
                reply_error(net, &service, user_key, &err);
                return;
            }
            let Some(nick) = args.get(1) else {
                reply(net, &service, user_key, "Syntax: OPER <ADD|DEL> <nick>");
                return;
            };
            let result = if sub == "ADD" {
                net.oper_add(nick)
            } else {
                net.oper_del(nick)
            };
            match result {
                Ok(()) => reply(
                    net,
                    &service,
                    user_key,
                    &format!(
                        "\x02{}\x02 {} the services operator list.",
                        nick,
                        if sub == "ADD" { "added to" } else { "removed from" }
                    ),
                ),
                Err(err) => reply_error(net, &service, user_key, &err),
            }
        }
        _ => reply(net, &service, user_key, "Syntax: OPER <ADD|DEL|LIST> [nick]"),
    }
}

fn list(net: &Network, service: &str, user_key: &str, header: &str, entries: &[String]) {
    if entries.is_empty() {
        reply(net, service, user_key, "The list is empty.");
        return;
    }
    reply(net, service, user_key, header);
    for (i, nick) in entries.iter().enumerate() {
        reply(net, service, user_key, &format!("  {:>3}  {}", i + 1, nick));
    }
}

pub(super) fn handle_stats(net: &mut Network, user_key: &str, now: i64) {
    let service = net.operserv();
    if let Err(err) = require_oper(net, user_key) {
        reply_error(net, &service, user_key, &err);
        return;
    }

    let uptime = now - net.started_at;
    let lines = vec![
        format!("Current users: {}", net.users.len()),
        format!("Current channels: {}", net.channels.len()),
        format!("Linked servers: {}", net.servers.len()),
        format!("Registered nicknames: {}", net.nicks.len()),
        format!("Registered channels: {}", net.chans.len()),
        format!("AKILL entries: {}", net.akills.len()),
        format!(
            "Services up {} day(s), {:02}:{:02}:{:02}",
            uptime / 86400,
            (uptime / 3600) % 24,
            (uptime / 60) % 60,
            uptime % 60
        ),
    ];
    for line in lines {
        reply(net, &service, user_key, &line);
    }
}
