//! FORBID command handler for NickServ.

use crate::error::ServiceError;
use crate::services::{check_read_only, reply, reply_error};
use crate::state::Network;
use slserv_proto::irc_to_lower;

pub(super) fn handle_forbid(net: &mut Network, user_key: &str, args: &[&str], now: i64) {
    let service = net.nickserv();
    let Some(target) = args.first() else {
        reply(net, &service, user_key, "Syntax: FORBID <nick>");
        return;
    };
    if let Err(err) = check_read_only(net) {
        reply_error(net, &service, user_key, &err);
        return;
    }
    let is_admin = net
        .users
        .get(user_key)
        .map(|u| net.is_services_admin(u))
        .unwrap_or(false);
    if !is_admin {
        reply_error(net, &service, user_key, &ServiceError::PermissionDenied);
        return;
    }

    let target_key = irc_to_lower(target);
    // FORBID overwrites an existing registration after the full cascade.
    if net.nicks.get(&target_key).is_some() {
        if let Err(err) = net.delete_identity(&target_key, now) {
            reply_error(net, &service, user_key, &err);
            return;
        }
    }
    match net.nicks.forbid(target, now) {
        Ok(()) => {
            // A live holder is put on the enforcement path right away.
            if net.users.contains_key(&target_key) {
                net.resolve_user_identities(&target_key);
                net.validate_on_connect(&target_key, now);
            }
            reply(
                net,
                &service,
                user_key,
                &format!("Nickname \x02{}\x02 is now forbidden.", target),
            );
        }
        Err(err) => reply_error(net, &service, user_key, &err),
    }
}
