//! OperServ - network policing service.
//!
//! Handles:
//! - AKILL ADD/DEL/LIST/VIEW - network-wide connection bans
//! - SESSION LIST/VIEW - live per-host session counters
//! - EXCEPTION ADD/DEL/MOVE/LIST/VIEW - session-limit exceptions
//! - ADMIN / OPER ADD/DEL/LIST - the runtime privilege sets
//! - STATS - copy-out counters
//!
//! Only IRC operators may talk to OperServ at all; individual commands
//! layer services-oper/admin/root requirements on top.

mod admin;
mod akill;
mod exception;
mod session;

use super::{reply, split_command};
use crate::error::ServiceError;
use crate::services::reply_error;
use crate::state::Network;

/// Dispatch one command line addressed to OperServ.
pub fn handle(net: &mut Network, user_key: &str, text: &str, now: i64) {
    let service = net.operserv();
    let is_ircop = net
        .users
        .get(user_key)
        .map(|u| u.modes.oper)
        .unwrap_or(false);
    if !is_ircop {
        reply_error(net, &service, user_key, &ServiceError::PermissionDenied);
        return;
    }

    let Some((verb, args)) = split_command(text) else {
        reply(
            net,
            &service,
            user_key,
            "Commands: AKILL SESSION EXCEPTION ADMIN OPER STATS",
        );
        return;
    };

    match verb.as_str() {
        "AKILL" => akill::handle_akill(net, user_key, &args, now),
        "SESSION" => session::handle_session(net, user_key, &args, now),
        "EXCEPTION" => exception::handle_exception(net, user_key, &args, now),
        "ADMIN" => admin::handle_admin(net, user_key, &args),
        "OPER" => admin::handle_oper(net, user_key, &args),
        "STATS" => admin::handle_stats(net, user_key, now),
        _ => reply(
            net,
            &service,
            user_key,
            &format!("Unknown command \x02{}\x02. Try HELP.", verb),
        ),
    }
}

/// Services-operator gate.
pub(super) fn require_oper(net: &Network, user_key: &str) -> Result<(), ServiceError> {
    match net.users.get(user_key) {
        Some(user) if net.is_services_oper(user) => Ok(()),
        _ => Err(ServiceError::PermissionDenied),
    }
}

/// Services-admin gate.
pub(super) fn require_admin(net: &Network, user_key: &str) -> Result<(), ServiceError> {
    match net.users.get(user_key) {
        Some(user) if net.is_services_admin(user) => Ok(()),
        _ => Err(ServiceError::PermissionDenied),
    }
}

/// Services-root gate.
pub(super) fn require_root(net: &Network, user_key: &str) -> Result<(), ServiceError> {
    match net.users.get(user_key) {
        Some(user) if net.is_services_root(user) => Ok(()),
        _ => Err(ServiceError::PermissionDenied),
    }
}
