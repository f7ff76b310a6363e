//! AKICK command handlers for ChanServ.

use super::check_chan_access;
use crate::error::ServiceError;
use crate::registry::chan::{AkickTarget, ChanAction};
use crate::services::{check_read_only, format_time, reply, reply_error};
use crate::state::Network;
use slserv_proto::irc_to_lower;

pub(super) fn handle_akick(net: &mut Network, user_key: &str, args: &[&str], now: i64) {
    let service = net.chanserv();
    let (Some(chan), Some(sub)) = (args.first(), args.get(1).map(|s| s.to_uppercase())) else {
        reply(
            net,
            &service,
            user_key,
            "Syntax: AKICK <#channel> <ADD|DEL|LIST> [nick|mask] [reason]",
        );
        return;
    };
    if let Err(err) = check_chan_access(net, user_key, chan, ChanAction::AkickEdit) {
        reply_error(net, &service, user_key, &err);
        return;
    }

    match sub.as_str() {
        "LIST" => handle_list(net, user_key, chan),
        "ADD" => handle_add(net, user_key, chan, &args[2..], now),
        "DEL" => handle_del(net, user_key, chan, &args[2..]),
        _ => reply(
            net,
            &service,
            user_key,
            "Syntax: AKICK <#channel> <ADD|DEL|LIST> [nick|mask] [reason]",
        ),
    }
}

/// Resolve an operator-supplied target: a registered nick binds to the
/// identity, anything mask-shaped becomes a `nick!user@host` pattern.
fn parse_target(net: &mut Network, token: &str) -> Result<AkickTarget, ServiceError> {
    if let Some(identity) = net.nicks.resolve_effective(token) {
        return Ok(AkickTarget::Identity(identity));
    }
    if token.contains('!') {
        return Ok(AkickTarget::Mask(token.to_owned()));
    }
    if token.contains('@') {
        return Ok(AkickTarget::Mask(format!("*!{}", token)));
    }
    Err(ServiceError::NotFound(token.to_owned()))
}

fn handle_add(net: &mut Network, user_key: &str, chan: &str, args: &[&str], now: i64) {
    let service = net.chanserv();
    let Some(token) = args.first() else {
        reply(net, &service, user_key, "Syntax: AKICK <#channel> ADD <nick|mask> [reason]");
        return;
    };
    if let Err(err) = check_read_only(net) {
        reply_error(net, &service, user_key, &err);
        return;
    }
    let reason = if args.len() > 1 {
        Some(args[1..].join(" "))
    } else {
        None
    };
    let who = net
        .users
        .get(user_key)
        .map(|u| u.nick.clone())
        .unwrap_or_default();

    let target = match parse_target(net, token) {
        Ok(target) => target,
        Err(err) => {
            reply_error(net, &service, user_key, &err);
            return;
        }
    };
    match net.chans.akick_add(chan, target, reason, &who, now) {
        Ok(()) => {
            reply(
                net,
                &service,
                user_key,
                &format!("\x02{}\x02 added to the AKICK list of \x02{}\x02.", token, chan),
            );
            enforce_akick(net, chan, now);
        }
        Err(err) => reply_error(net, &service, user_key, &err),
    }
}

fn handle_del(net: &mut Network, user_key: &str, chan: &str, args: &[&str]) {
    let service = net.chanserv();
    let Some(token) = args.first() else {
        reply(net, &service, user_key, "Syntax: AKICK <#channel> DEL <nick|mask>");
        return;
    };
    if let Err(err) = check_read_only(net) {
        reply_error(net, &service, user_key, &err);
        return;
    }
    let target = match parse_target(net, token) {
        Ok(target) => target,
        Err(err) => {
            reply_error(net, &service, user_key, &err);
            return;
        }
    };
    match net.chans.akick_del(chan, &target) {
        Ok(()) => reply(
            net,
            &service,
            user_key,
            &format!(
                "\x02{}\x02 removed from the AKICK list of \x02{}\x02.",
                token, chan
            ),
        ),
        Err(err) => reply_error(net, &service, user_key, &err),
    }
}

fn handle_list(net: &mut Network, user_key: &str, chan: &str) {
    let service = net.chanserv();
    let entries: Vec<String> = net
        .chans
        .get(chan)
        .map(|record| {
            record
                .akick
                .iter()
                .enumerate()
                .filter(|(_, slot)| slot.in_use)
                .map(|(i, slot)| {
                    let what = match &slot.target {
                        AkickTarget::Identity(id) => id.clone(),
                        AkickTarget::Mask(mask) => mask.clone(),
                    };
                    format!(
                        "  {:>3}  {} ({}) set by {} on {}",
                        i + 1,
                        what,
                        slot.reason.as_deref().unwrap_or("no reason"),
                        slot.who,
                        format_time(slot.time)
                    )
                })
                .collect()
        })
        .unwrap_or_default();

    if entries.is_empty() {
        reply(
            net,
            &service,
            user_key,
            &format!("AKICK list for \x02{}\x02 is empty.", chan),
        );
        return;
    }
    reply(net, &service, user_key, &format!("AKICK list for \x02{}\x02:", chan));
    for line in entries {
        reply(net, &service, user_key, &line);
    }
}

/// Apply a freshly added AKICK entry to anyone already on the channel.
fn enforce_akick(net: &mut Network, chan: &str, now: i64) {
    let chan_key = irc_to_lower(chan);
    for member in net.channel_members(&chan_key) {
        let matched = {
            let Some((effective, nick_user_host)) = net
                .users
                .get(&member)
                .map(|u| (u.effective_identity.clone(), u.nick_user_host()))
            else {
                continue;
            };
            net.chans
                .get(&chan_key)
                .and_then(|r| r.akick_match(effective.as_deref(), &nick_user_host))
                .is_some()
        };
        if matched {
            // The kick path bans and kicks; then membership is dropped,
            // destroying the channel if that was the last member.
            let _ = net.check_kick(&member, &chan_key, now);
            net.leave_channel(&member, &chan_key);
        }
    }
}
