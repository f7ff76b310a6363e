//! DROP command handler for NickServ.

use crate::error::ServiceError;
use crate::services::{check_read_only, reply, reply_error};
use crate::state::Network;
use slserv_proto::irc_to_lower;

pub(super) fn handle_drop(net: &mut Network, user_key: &str, args: &[&str], now: i64) {
    let service = net.nickserv();
    if let Err(err) = check_read_only(net) {
        reply_error(net, &service, user_key, &err);
        return;
    }

    match args.first() {
        None => drop_own(net, &service, user_key, now),
        Some(target) => drop_other(net, &service, user_key, target, now),
    }
}

fn drop_own(net: &mut Network, service: &str, user_key: &str, now: i64) {
    let Some(real) = net.users.get(user_key).and_then(|u| u.real_identity.clone()) else {
        let nick = net
            .users
            .get(user_key)
            .map(|u| u.nick.clone())
            .unwrap_or_default();
        reply_error(net, service, user_key, &ServiceError::NotFound(nick));
        return;
    };
    let identified = net.nicks.get(&real).map(|r| r.identified).unwrap_or(false);
    if !identified {
        reply_error(net, service, user_key, &ServiceError::PermissionDenied);
        return;
    }

    match net.delete_identity(&real, now) {
        Ok(()) => {
            net.resolve_user_identities(user_key);
            reply(net, service, user_key, "Your nickname has been dropped.");
        }
        Err(err) => reply_error(net, service, user_key, &err),
    }
}

fn drop_other(net: &mut Network, service: &str, user_key: &str, target: &str, now: i64) {
    let is_admin = net
        .users
        .get(user_key)
        .map(|u| net.is_services_admin(u))
        .unwrap_or(false);
    if !is_admin {
        reply_error(net, service, user_key, &ServiceError::PermissionDenied);
        return;
    }

    let target_key = irc_to_lower(target);
    if net.nicks.get(&target_key).is_none() {
        reply_error(
            net,
            service,
            user_key,
            &ServiceError::NotFound(target.to_owned()),
        );
        return;
    }

    // Dropping another privileged identity takes root.
    let protected = net.admins.contains(&target_key)
        || net.opers.contains(&target_key)
        || net
            .config
            .operserv
            .roots
            .iter()
            .any(|r| irc_to_lower(r) == target_key);
    if protected {
        let is_root = net
            .users
            .get(user_key)
            .map(|u| net.is_services_root(u))
            .unwrap_or(false);
        if !is_root {
            reply_error(net, service, user_key, &ServiceError::PermissionDenied);
            return;
        }
    }

    match net.delete_identity(&target_key, now) {
        Ok(()) => {
            reply(
                net,
                service,
                user_key,
                &format!("Nickname \x02{}\x02 has been dropped.", target),
            );
        }
        Err(err) => reply_error(net, service, user_key, &err),
    }
}
