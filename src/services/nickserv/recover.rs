//! RECOVER, RELEASE and GHOST command handlers for NickServ.
//!
//! All three are front-ends over the same enforcement machinery: prove
//! you own a nick, then dislodge whoever is using it.

use crate::error::ServiceError;
use crate::services::{reply, reply_error};
use crate::state::Network;
use slserv_proto::irc_to_lower;

/// Authorization shared by the three commands: the stated password, or
/// a recognizable mask on a non-secure registration, or holding the same
/// effective identity while identified.
fn can_enforce(
    net: &mut Network,
    user_key: &str,
    target: &str,
    password: Option<&str>,
) -> Result<(), ServiceError> {
    if let Some(password) = password {
        return match net.nicks.verify_password(target, password)? {
            true => Ok(()),
            false => Err(ServiceError::BadCredential),
        };
    }

    let Some((user_host, effective, real)) = net.users.get(user_key).map(|u| {
        (
            u.user_host(),
            u.effective_identity.clone(),
            u.real_identity.clone(),
        )
    }) else {
        return Err(ServiceError::PermissionDenied);
    };

    let target_effective = net.nicks.resolve_effective(target);
    let Some(record) = net.nicks.get(target) else {
        return Err(ServiceError::NotFound(target.to_owned()));
    };
    if record.forbidden {
        return Err(ServiceError::Forbidden(target.to_owned()));
    }

    if !record.settings.secure && record.on_access(&user_host) {
        return Ok(());
    }
    // Identified holder of another nick in the same group.
    let identified = real
        .as_deref()
        .and_then(|r| net.nicks.get(r))
        .map(|r| r.identified)
        .unwrap_or(false);
    if identified && effective.is_some() && effective == target_effective {
        return Ok(());
    }
    Err(ServiceError::PermissionDenied)
}

pub(super) fn handle_recover(net: &mut Network, user_key: &str, args: &[&str], now: i64) {
    let service = net.nickserv();
    let Some(target) = args.first() else {
        reply(net, &service, user_key, "Syntax: RECOVER <nick> [password]");
        return;
    };
    let target_key = irc_to_lower(target);
    if target_key == *user_key {
        reply(net, &service, user_key, "You can't recover your own nick.");
        return;
    }
    if !net.users.contains_key(&target_key) {
        reply(
            net,
            &service,
            user_key,
            &format!("Nick \x02{}\x02 isn't currently in use.", target),
        );
        return;
    }
    if let Err(err) = can_enforce(net, user_key, target, args.get(1).copied()) {
        reply_error(net, &service, user_key, &err);
        return;
    }

    net.collide(&target_key, now);
    reply(
        net,
        &service,
        user_key,
        &format!(
            "The user with your nick has been removed. \x02{}\x02 is held for you; use RELEASE to claim it sooner.",
            target
        ),
    );
}

pub(super) fn handle_release(net: &mut Network, user_key: &str, args: &[&str]) {
    let service = net.nickserv();
    let Some(target) = args.first() else {
        reply(net, &service, user_key, "Syntax: RELEASE <nick> [password]");
        return;
    };
    let target_key = irc_to_lower(target);
    let held = net
        .nicks
        .get(&target_key)
        .map(|r| r.kill_held)
        .unwrap_or(false);
    if !held {
        reply(
            net,
            &service,
            user_key,
            &format!("Nick \x02{}\x02 isn't being held.", target),
        );
        return;
    }
    if let Err(err) = can_enforce(net, user_key, target, args.get(1).copied()) {
        reply_error(net, &service, user_key, &err);
        return;
    }

    net.release(&target_key);
    reply(
        net,
        &service,
        user_key,
        &format!("\x02{}\x02 has been released.", target),
    );
}

pub(super) fn handle_ghost(net: &mut Network, user_key: &str, args: &[&str], now: i64) {
    let service = net.nickserv();
    let Some(target) = args.first() else {
        reply(net, &service, user_key, "Syntax: GHOST <nick> [password]");
        return;
    };
    let target_key = irc_to_lower(target);
    if target_key == *user_key {
        reply(net, &service, user_key, "You can't ghost yourself.");
        return;
    }
    if !net.users.contains_key(&target_key) {
        reply(
            net,
            &service,
            user_key,
            &format!("Nick \x02{}\x02 isn't currently in use.", target),
        );
        return;
    }
    if let Err(err) = can_enforce(net, user_key, target, args.get(1).copied()) {
        reply_error(net, &service, user_key, &err);
        return;
    }

    let requester = net
        .users
        .get(user_key)
        .map(|u| u.nick.clone())
        .unwrap_or_default();
    let target_nick = net
        .users
        .get(&target_key)
        .map(|u| u.nick.clone())
        .unwrap_or_else(|| (*target).to_owned());
    net.transport.send(
        &service,
        &format!("KILL {} :GHOST command used by {}", target_nick, requester),
    );
    net.remove_user(&target_key, "GHOST command", false, now);
    reply(
        net,
        &service,
        user_key,
        &format!("Ghost with your nick \x02{}\x02 has been killed.", target),
    );
}
