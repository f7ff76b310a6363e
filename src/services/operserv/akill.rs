//! AKILL command handlers for OperServ.

use super::require_oper;
use crate::error::ServiceError;
use crate::security::mask::normalize_user_host;
use crate::services::{check_read_only, format_time, parse_expiry, reply, reply_error};
use crate::state::Network;

pub(super) fn handle_akill(net: &mut Network, user_key: &str, args: &[&str], now: i64) {
    let service = net.operserv();
    if let Err(err) = require_oper(net, user_key) {
        reply_error(net, &service, user_key, &err);
        return;
    }
    let Some(sub) = args.first().map(|s| s.to_uppercase()) else {
        reply(
            net,
            &service,
            user_key,
            "Syntax: AKILL <ADD|DEL|LIST|VIEW> [+expiry] [mask] [reason]",
        );
        return;
    };

    match sub.as_str() {
        "ADD" => handle_add(net, user_key, &args[1..], now),
        "DEL" => handle_del(net, user_key, &args[1..]),
        "LIST" => handle_list(net, user_key, &args[1..], false),
        "VIEW" => handle_list(net, user_key, &args[1..], true),
        _ => reply(
            net,
            &service,
            user_key,
            "Syntax: AKILL <ADD|DEL|LIST|VIEW> [+expiry] [mask] [reason]",
        ),
    }
}

fn handle_add(net: &mut Network, user_key: &str, args: &[&str], now: i64) {
    let service = net.operserv();
    if let Err(err) = check_read_only(net) {
        reply_error(net, &service, user_key, &err);
        return;
    }

    // Optional leading +expiry token.
    let (expires, rest) = match args.first() {
        Some(token) if token.starts_with('+') => match parse_expiry(token, now) {
            Ok(expires) => (expires, &args[1..]),
            Err(err) => {
                reply_error(net, &service, user_key, &err);
                return;
            }
        },
        _ => {
            let default = net.config.operserv.akill_expiry;
            let expires = if default > 0 { now + default } else { 0 };
            (expires, args)
        }
    };

    let Some(raw_mask) = rest.first() else {
        reply(net, &service, user_key, "Syntax: AKILL ADD [+expiry] <mask> <reason>");
        return;
    };
    let Some(mask) = normalize_user_host(raw_mask) else {
        reply_error(
            net,
            &service,
            user_key,
            &ServiceError::InvalidArgument(format!("bad mask {}", raw_mask)),
        );
        return;
    };
    let reason = if rest.len() > 1 {
        rest[1..].join(" ")
    } else {
        "You have been banned from this network".to_owned()
    };
    let who = net
        .users
        .get(user_key)
        .map(|u| u.nick.clone())
        .unwrap_or_default();

    match net.akills.add(&mask, &reason, &who, now, expires) {
        Ok(()) => {
            reply(
                net,
                &service,
                user_key,
                &format!("\x02{}\x02 added to the AKILL list.", mask),
            );
            net.oper_notice(
                &service,
                &format!("{} added an AKILL for {} ({})", who, mask, reason),
            );
        }
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
        reply(net, &service, user_key, "Syntax: AKILL DEL <mask|entry-numbers>");
        return;
    };

    // Digits and ranges select by position, anything else is a mask.
    let result = if what.chars().all(|c| c.is_ascii_digit() || c == ',' || c == '-') {
        net.akills.del_ranges(what).map(|removed| {
            format!("Deleted {} entr{}.", removed.len(), if removed.len() == 1 { "y" } else { "ies" })
        })
    } else {
        net.akills
            .del_mask(what)
            .map(|()| format!("\x02{}\x02 removed from the AKILL list.", what))
    };
    match result {
        Ok(text) => reply(net, &service, user_key, &text),
        Err(err) => reply_error(net, &service, user_key, &err),
    }
}

fn handle_list(net: &mut Network, user_key: &str, args: &[&str], verbose: bool) {
    let service = net.operserv();
    let filter = args.first().copied().unwrap_or("*");
    let entries: Vec<String> = net
        .akills
        .entries()
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
                    "  {:>3}  {} set by {} on {}, {}: {}",
                    i + 1,
                    e.mask,
                    e.who,
                    format_time(e.time),
                    expires,
                    e.reason
                )
            } else {
                format!("  {:>3}  {}  {}", i + 1, e.mask, e.reason)
            }
        })
        .collect();

    if entries.is_empty() {
        reply(net, &service, user_key, "The AKILL list is empty.");
        return;
    }
    reply(net, &service, user_key, "Current AKILL list:");
    for line in entries {
        reply(net, &service, user_key, &line);
    }
}
