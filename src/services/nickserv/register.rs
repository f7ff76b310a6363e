//! REGISTER command handler for NickServ.

use crate::services::{check_read_only, reply, reply_error};
use crate::state::Network;

pub(super) fn handle_register(net: &mut Network, user_key: &str, args: &[&str], now: i64) {
    let service = net.nickserv();
    let Some(password) = args.first() else {
        reply(net, &service, user_key, "Syntax: REGISTER <password> [email]");
        return;
    };
    if let Err(err) = check_read_only(net) {
        reply_error(net, &service, user_key, &err);
        return;
    }

    let Some((nick, user_host, realname, last_register)) = net
        .users
        .get(user_key)
        .map(|u| (u.nick.clone(), u.user_host(), u.realname.clone(), u.last_register))
    else {
        return;
    };

    let delay = net.config.nickserv.reg_delay;
    if delay > 0 && last_register > 0 && now - last_register < delay {
        let err = crate::error::ServiceError::RateLimited(last_register + delay - now);
        reply_error(net, &service, user_key, &err);
        return;
    }

    match net.nicks.register(&nick, password, &user_host, &realname, now) {
        Ok(()) => {
            if let Some(email) = args.get(1) {
                if let Some(record) = net.nicks.get_mut(&nick) {
                    record.email = Some((*email).to_owned());
                }
            }
            if let Some(user) = net.users.get_mut(user_key) {
                user.last_register = now;
            }
            net.resolve_user_identities(user_key);
            net.stamp_identity(user_key);
            reply(
                net,
                &service,
                user_key,
                &format!("Your nickname \x02{}\x02 has been registered.", nick),
            );
            reply(
                net,
                &service,
                user_key,
                "You are now identified for your nickname.",
            );
        }
        Err(err) => reply_error(net, &service, user_key, &err),
    }
}
