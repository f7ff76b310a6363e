//! LINK and UNLINK command handlers for NickServ.

use crate::error::ServiceError;
use crate::services::{check_read_only, reply, reply_error};
use crate::state::Network;

/// The acting user's real identity key, if identified this session.
fn identified_real(net: &Network, user_key: &str) -> Result<String, ServiceError> {
    let real = net
        .users
        .get(user_key)
        .and_then(|u| u.real_identity.clone())
        .ok_or_else(|| {
            let nick = net
                .users
                .get(user_key)
                .map(|u| u.nick.clone())
                .unwrap_or_default();
            ServiceError::NotFound(nick)
        })?;
    if !net.nicks.get(&real).map(|r| r.identified).unwrap_or(false) {
        return Err(ServiceError::PermissionDenied);
    }
    Ok(real)
}

pub(super) fn handle_link(net: &mut Network, user_key: &str, args: &[&str]) {
    let service = net.nickserv();
    let (Some(target), Some(password)) = (args.first(), args.get(1)) else {
        reply(net, &service, user_key, "Syntax: LINK <nick> <password>");
        return;
    };
    if let Err(err) = check_read_only(net) {
        reply_error(net, &service, user_key, &err);
        return;
    }
    let real = match identified_real(net, user_key) {
        Ok(real) => real,
        Err(err) => {
            reply_error(net, &service, user_key, &err);
            return;
        }
    };

    // Linking hands the target group control over this identity, so the
    // target's password is required (admins bypass).
    let is_admin = net
        .users
        .get(user_key)
        .map(|u| net.is_services_admin(u))
        .unwrap_or(false);
    if !is_admin {
        match net.nicks.verify_password(target, password) {
            Ok(true) => {}
            Ok(false) => {
                reply_error(net, &service, user_key, &ServiceError::BadCredential);
                return;
            }
            Err(err) => {
                reply_error(net, &service, user_key, &err);
                return;
            }
        }
    }

    match net.nicks.link(&real, target) {
        Ok(()) => {
            net.resolve_user_identities(user_key);
            reply(
                net,
                &service,
                user_key,
                &format!("Your nickname is now linked to \x02{}\x02.", target),
            );
        }
        Err(err) => reply_error(net, &service, user_key, &err),
    }
}

pub(super) fn handle_unlink(net: &mut Network, user_key: &str, _args: &[&str]) {
    let service = net.nickserv();
    if let Err(err) = check_read_only(net) {
        reply_error(net, &service, user_key, &err);
        return;
    }
    let real = match identified_real(net, user_key) {
        Ok(real) => real,
        Err(err) => {
            reply_error(net, &service, user_key, &err);
            return;
        }
    };

    match net.nicks.unlink(&real) {
        Ok(()) => {
            net.resolve_user_identities(user_key);
            reply(net, &service, user_key, "Your nickname has been unlinked.");
        }
        Err(err) => reply_error(net, &service, user_key, &err),
    }
}
