//! EXCEPTION command handlers for OperServ.

use super::require_admin;
use crate::error::ServiceError;
use crate::services::{check_read_only, format_time, parse_expiry, reply, reply_error};
use crate::state::Network;

pub(super) fn handle_exception(net: &mut Network, user_key: &str, args: &[&str], now: i64) {
    let service = net.operserv();
    if let Err(err) = require_admin(net, user_key) {
        reply_error(net, &service, user_key, &err);
        return;
    }
    let Some(sub) = args.first().map(|s| s.to_uppercase()) else {
        reply(
            net,
            &service,
            user_key,
            "Syntax: EXCEPTION <ADD|DEL|MOVE|LIST|VIEW> ...",
        );
        return;
    };

    match sub.as_str() {
        "ADD" => handle_add(net, user_key, &args[1..], now),
        "DEL" => handle_del(net, user_key, &args[1..]),
        "MOVE" => handle_move(net, user_key, &args[1..]),
        "LIST" => handle_list(net, user_key, &args[1..], false),
        "VIEW" => handle_list(net, user_key, &args[1..], true),
        _ => reply(
            net,
            &service,
            user_key,
            "Syntax: EXCEPTION <ADD|DEL|MOVE|LIST|VIEW> ...",
        ),
    }
}

fn handle_add(net: &mut Network, user_key: &str, args: &[&str], now: i64) {
    let service = net.operserv();
    if let Err(err) = check_read_only(net) {
        reply_error(net, &service, user_key, &err);
        return;
    }

    let (expires, rest) = match args.first() {
        Some(token) if token.starts_with('+') => match parse_expiry(token, now) {
            Ok(expires) => (expires, &args[1..]),
            Err(err) => {
                reply_error(net, &service, user_key, &err);
                return;
            }
        },
        _ => (0, args),
    };

    let (Some(mask), Some(limit_str)) = (rest.first(), rest.get(1)) else {
        reply(
            net,
            &service,
            user_key,
            "Syntax: EXCEPTION ADD [+expiry] <mask> <limit> <reason>",
        );
        return;
    };
    let Ok(limit) = limit_str.parse::<u32>() else {
        reply_error(
            net,
            &service,
            user_key,
            &ServiceError::InvalidArgument(format!("bad limit {}", limit_str)),
        );
        return;
    };
    let reason = if rest.len() > 2 {
        rest[2..].join(" ")
    } else {
        reply(
            net,
            &service,
            user_key,
            "Syntax: EXCEPTION ADD [+expiry] <mask> <limit> <reason>",
        );
        return;
    };
    let who = net
        .users
        .get(user_key)
        .map(|u| u.nick.clone())
        .unwrap_or_default();

    match net
        .sessions
        .exception_add(mask, limit, &who, &reason, now, expires, 0)
    {
        Ok(()) => reply(
            net,
            &service,
            user_key,
            &format!(
                "\x02{}\x02 may now have {} session(s).",
                mask,
                if limit == 0 {
                    "unlimited".to_owned()
                } else {
                    limit.to_string()
                }
            ),
        ),
        Err(err) => reply_error(net, &service, user_key, &err),
    }
}

fn handle_del(net: &mut Network, user_key: &str, args: &[&str]) {
    let service = net.operserv();
    if let Err(err) = check_read_only(net) {
        reply_error(net, &service, user_key, &err);
        return;
    }
    let Some(what) = args.first() else {
        reply(net, &service, user_key, "Syntax: EXCEPTION DEL <mask|entry-numbers>");
        return;
    };

    let result = if what.chars().all(|c| c.is_ascii_digit() || c == ',' || c == '-') {
        net.sessions.exception_del_ranges(what).map(|removed| {
            format!("Deleted {} exception(s).", removed.len())
        })
    } else {
        net.sessions
            .exception_del_mask(what)
            .map(|()| format!("\x02{}\x02 removed from the exception list.", what))
    };
    match result {
        Ok(text) => reply(net, &service, user_key, &text),
        Err(err) => reply_error(net, &service, user_key, &err),
    }
}

fn handle_move(net: &mut Network, user_key: &str, args: &[&str]) {
    let service = net.operserv();
    if let Err(err) = check_read_only(net) {
        reply_error(net, &service, user_key, &err);
        return;
    }
    let (Some(from), Some(to)) = (
        args.first().and_then(|a| a.parse::<usize>().ok()),
        args.get(1).and_then(|a| a.parse::<usize>().ok()),
    ) else {
        reply(net, &service, user_key, "Syntax: EXCEPTION MOVE <num> <position>");
        return;
    };

    match net.sessions.exception_move(from, to) {
        Ok(()) => reply(
            net,
            &service,
            user_key,
            &format!("Exception {} moved to position {}.", from, to),
        ),
        Err(err) => reply_error(net, &service, user_key, &err),
    }
}

fn handle_list(net: &mut Network, user_key: &str, args: &[&str], verbose: bool) {
    let service = net.operserv();
    let filter = args.first().copied().unwrap_or("*");
    let rows: Vec<String> = net
        .sessions
        .exceptions()
        .iter()
        .enumerate()
        .filter(|(_, e)| crate::security::wildcard_match(filter, &e.mask))
        .map(|(i, e)| {
            if verbose {
                let expires = if e.expires == 0 {
                    "never expires".to_owned()
                } else {
                    format!("expires {}", format_time(e.expires))
                };
                format!(
                    "  {:>3}  {} (limit {}) set by {} on {}, {}: {}",
                    i + 1,
                    e.mask,
                    e.limit,
                    e.who,
                    format_time(e.time),
                    expires,
                    e.reason
                )
            } else {
                format!("  {:>3}  {:>4}  {}", i + 1, e.limit, e.mask)
            }
        })
        .collect();

    if rows.is_empty() {
        reply(net, &service, user_key, "The session exception list is empty.");
        return;
    }
    reply(net, &service, user_key, "Current exception list:");
    for line in rows {
        reply(net, &service, user_key, &line);
    }
}
