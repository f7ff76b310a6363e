//! ACCESS command handlers for ChanServ.

use super::{acting_admin, check_chan_access};
use crate::error::ServiceError;
use crate::registry::chan::{ChanAction, ACCESS_FOUNDER};
use crate::services::{check_read_only, reply, reply_error};
use crate::state::Network;

pub(super) fn handle_access(net: &mut Network, user_key: &str, args: &[&str]) {
    let service = net.chanserv();
    let (Some(chan), Some(sub)) = (args.first(), args.get(1).map(|s| s.to_uppercase())) else {
        reply(
            net,
            &service,
            user_key,
            "Syntax: ACCESS <#channel> <ADD|DEL|LIST> [nick] [level]",
        );
        return;
    };

    match sub.as_str() {
        "LIST" => handle_list(net, user_key, chan),
        "ADD" => handle_add(net, user_key, chan, &args[2..]),
        "DEL" => handle_del(net, user_key, chan, &args[2..]),
        _ => reply(
            net,
            &service,
            user_key,
            "Syntax: ACCESS <#channel> <ADD|DEL|LIST> [nick] [level]",
        ),
    }
}

fn handle_list(net: &mut Network, user_key: &str, chan: &str) {
    let service = net.chanserv();
    if let Err(err) = check_chan_access(net, user_key, chan, ChanAction::AccessList) {
        reply_error(net, &service, user_key, &err);
        return;
    }

    let entries: Vec<(usize, String, i16)> = net
        .chans
        .get(chan)
        .map(|record| {
            record
                .access
                .iter()
                .enumerate()
                .filter(|(_, slot)| slot.in_use)
                .map(|(i, slot)| (i + 1, slot.nick.clone(), slot.level))
                .collect()
        })
        .unwrap_or_default();

    if entries.is_empty() {
        reply(
            net,
            &service,
            user_key,
            &format!("Access list for \x02{}\x02 is empty.", chan),
        );
        return;
    }
    reply(
        net,
        &service,
        user_key,
        &format!("Access list for \x02{}\x02:", chan),
    );
    for (num, nick, level) in entries {
        reply(
            net,
            &service,
            user_key,
            &format!("  {:>3}  {:>6}  {}", num, level, nick),
        );
    }
}

fn handle_add(net: &mut Network, user_key: &str, chan: &str, args: &[&str]) {
    let service = net.chanserv();
    let (Some(nick), Some(level_str)) = (args.first(), args.get(1)) else {
        reply(net, &service, user_key, "Syntax: ACCESS <#channel> ADD <nick> <level>");
        return;
    };
    if let Err(err) = check_read_only(net) {
        reply_error(net, &service, user_key, &err);
        return;
    }
    if let Err(err) = check_chan_access(net, user_key, chan, ChanAction::AccessChange) {
        reply_error(net, &service, user_key, &err);
        return;
    }
    let Ok(level) = level_str.parse::<i16>() else {
        reply_error(
            net,
            &service,
            user_key,
            &ServiceError::InvalidArgument(format!("bad level {}", level_str)),
        );
        return;
    };

    // Nobody may grant at or above their own standing.
    let actor_level = net.user_level(user_key, chan);
    if actor_level != ACCESS_FOUNDER && level >= actor_level && !acting_admin(net, user_key) {
        reply_error(net, &service, user_key, &ServiceError::PermissionDenied);
        return;
    }

    let Some(identity) = net.nicks.resolve_effective(nick) else {
        reply_error(
            net,
            &service,
            user_key,
            &ServiceError::NotFound((*nick).to_owned()),
        );
        return;
    };
    let founder = net.chans.get(chan).map(|r| r.founder.clone());
    if founder.as_deref() == Some(identity.as_str()) {
        reply(
            net,
            &service,
            user_key,
            "The founder's access may not be changed.",
        );
        return;
    }

    match net.chans.access_add(chan, &identity, level) {
        Ok(Some(old)) => reply(
            net,
            &service,
            user_key,
            &format!(
                "Access level for \x02{}\x02 on \x02{}\x02 changed from {} to {}.",
                identity, chan, old, level
            ),
        ),
        Ok(None) => reply(
            net,
            &service,
            user_key,
            &format!(
                "\x02{}\x02 added to the access list of \x02{}\x02 at level {}.",
                identity, chan, level
            ),
        ),
        Err(err) => reply_error(net, &service, user_key, &err),
    }
}

fn handle_del(net: &mut Network, user_key: &str, chan: &str, args: &[&str]) {
    let service = net.chanserv();
    let Some(nick) = args.first() else {
        reply(net, &service, user_key, "Syntax: ACCESS <#channel> DEL <nick>");
        return;
    };
    if let Err(err) = check_read_only(net) {
        reply_error(net, &service, user_key, &err);
        return;
    }
    if let Err(err) = check_chan_access(net, user_key, chan, ChanAction::AccessChange) {
        reply_error(net, &service, user_key, &err);
        return;
    }

    let Some(identity) = net.nicks.resolve_effective(nick) else {
        reply_error(
            net,
            &service,
            user_key,
            &ServiceError::NotFound((*nick).to_owned()),
        );
        return;
    };

    // An entry at or above the actor's own level is out of reach.
    let actor_level = net.user_level(user_key, chan);
    let target_level = net
        .chans
        .get(chan)
        .map(|r| r.access_level_of(&identity))
        .unwrap_or(0);
    if actor_level != ACCESS_FOUNDER && target_level >= actor_level && !acting_admin(net, user_key)
    {
        reply_error(net, &service, user_key, &ServiceError::PermissionDenied);
        return;
    }

    match net.chans.access_del(chan, &identity) {
        Ok(_) => reply(
            net,
            &service,
            user_key,
            &format!(
                "\x02{}\x02 removed from the access list of \x02{}\x02.",
                identity, chan
            ),
        ),
        Err(err) => reply_error(net, &service, user_key, &err),
    }
}
