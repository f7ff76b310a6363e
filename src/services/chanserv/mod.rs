//! ChanServ - channel registration and access control service.
//!
//! Handles:
//! - REGISTER <#channel> <password> <description> - register a channel
//! - IDENTIFY <#channel> <password> - founder identification
//! - DROP <#channel> - drop a registration
//! - SET <#channel> <option> <value> - channel settings and mode lock
//! - ACCESS / AKICK / LEVELS - the three per-channel lists
//! - INFO, INVITE, OP, DEOP, UNBAN, CLEAR - moderation surface
//! - FORBID <#channel> - administrative block

mod access;
mod akick;
mod drop;
mod info;
mod levels;
mod moderation;
mod register;
mod set;

use super::{reply, split_command};
use crate::error::ServiceError;
use crate::registry::chan::{self, ChanAction};
use crate::state::Network;

/// Dispatch one command line addressed to ChanServ.
pub fn handle(net: &mut Network, user_key: &str, text: &str, now: i64) {
    let service = net.chanserv();
    let Some((verb, args)) = split_command(text) else {
        reply(
            net,
            &service,
            user_key,
            "Commands: REGISTER IDENTIFY DROP SET ACCESS AKICK LEVELS INFO INVITE OP DEOP UNBAN CLEAR FORBID",
        );
        return;
    };

    match verb.as_str() {
        "REGISTER" => register::handle_register(net, user_key, &args, now),
        "IDENTIFY" => register::handle_identify(net, user_key, &args, now),
        "DROP" => drop::handle_drop(net, user_key, &args),
        "SET" => set::handle_set(net, user_key, &args, now),
        "ACCESS" => access::handle_access(net, user_key, &args),
        "AKICK" => akick::handle_akick(net, user_key, &args, now),
        "LEVELS" => levels::handle_levels(net, user_key, &args),
        "INFO" => info::handle_info(net, user_key, &args),
        "INVITE" => moderation::handle_invite(net, user_key, &args),
        "OP" => moderation::handle_op(net, user_key, &args, true),
        "DEOP" => moderation::handle_op(net, user_key, &args, false),
        "UNBAN" => moderation::handle_unban(net, user_key, &args),
        "CLEAR" => moderation::handle_clear(net, user_key, &args, now),
        "FORBID" => drop::handle_forbid(net, user_key, &args, now),
        _ => reply(
            net,
            &service,
            user_key,
            &format!("Unknown command \x02{}\x02. Try HELP.", verb),
        ),
    }
}

/// Is the acting user a services admin?
pub(super) fn acting_admin(net: &Network, user_key: &str) -> bool {
    net.users
        .get(user_key)
        .map(|u| net.is_services_admin(u))
        .unwrap_or(false)
}

/// Gate a command on a per-channel action level. Services admins
/// bypass; forbidden and suspended channels refuse everyone else.
pub(super) fn check_chan_access(
    net: &mut Network,
    user_key: &str,
    chan: &str,
    action: ChanAction,
) -> Result<(), ServiceError> {
    let (forbidden, suspended) = match net.chans.get(chan) {
        Some(record) => (record.forbidden, record.suspended),
        None => return Err(ServiceError::NotFound(chan.to_owned())),
    };
    if acting_admin(net, user_key) {
        return Ok(());
    }
    if forbidden || suspended {
        return Err(ServiceError::Forbidden(chan.to_owned()));
    }

    let level = net.user_level(user_key, chan);
    let Some(record) = net.chans.get(chan) else {
        return Err(ServiceError::NotFound(chan.to_owned()));
    };
    if chan::check_access(record, level, action) {
        Ok(())
    } else {
        Err(ServiceError::PermissionDenied)
    }
}

/// Gate a command on founder-level access (admin bypass included).
pub(super) fn check_founder(
    net: &mut Network,
    user_key: &str,
    chan: &str,
) -> Result<(), ServiceError> {
    if net.chans.get(chan).is_none() {
        return Err(ServiceError::NotFound(chan.to_owned()));
    }
    if acting_admin(net, user_key) {
        return Ok(());
    }
    if net.is_founder(user_key, chan) {
        Ok(())
    } else {
        Err(ServiceError::PermissionDenied)
    }
}
