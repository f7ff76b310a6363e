//! IDENTIFY command handler for NickServ.

use crate::services::{reply, reply_error};
use crate::state::Network;
use crate::timers::TimerKind;
use slserv_proto::irc_to_lower;

pub(super) fn handle_identify(net: &mut Network, user_key: &str, args: &[&str], now: i64) {
    let service = net.nickserv();
    let Some(password) = args.first() else {
        reply(net, &service, user_key, "Syntax: IDENTIFY <password>");
        return;
    };
    let Some((nick, user_host, realname)) = net
        .users
        .get(user_key)
        .map(|u| (u.nick.clone(), u.user_host(), u.realname.clone()))
    else {
        return;
    };

    match net.nicks.verify_password(&nick, password) {
        Err(err) => reply_error(net, &service, user_key, &err),
        Ok(false) => {
            reply_error(
                net,
                &service,
                user_key,
                &crate::error::ServiceError::BadCredential,
            );
            net.record_bad_password(user_key, now);
        }
        Ok(true) => {
            net.resolve_user_identities(user_key);
            {
                let Some(record) = net.nicks.get_mut(&nick) else {
                    return;
                };
                let was_recognized = record.recognized;
                record.identified = true;
                record.recognized = true;
                if !was_recognized {
                    record.last_usermask = Some(user_host);
                    record.last_realname = Some(realname);
                    record.last_seen = now;
                }
            }
            net.timers.cancel(TimerKind::Collide, &irc_to_lower(&nick));
            net.stamp_identity(user_key);
            reply(
                net,
                &service,
                user_key,
                "Password accepted -- you are now identified.",
            );
            // Memo delivery itself is the memo subsystem's job; the
            // sign-on nudge happens here.
            let unread = net
                .users
                .get(user_key)
                .and_then(|u| u.effective_identity.as_deref())
                .and_then(|key| net.nicks.get(key))
                .map(|r| r.memos.iter().filter(|m| m.unread).count())
                .unwrap_or(0);
            if unread > 0 {
                reply(
                    net,
                    &service,
                    user_key,
                    &format!("You have {} new memo(s).", unread),
                );
            }
        }
    }
}
