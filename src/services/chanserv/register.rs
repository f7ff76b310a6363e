//! REGISTER and IDENTIFY command handlers for ChanServ.

use crate::error::ServiceError;
use crate::services::{check_read_only, reply, reply_error};
use crate::state::Network;
use slserv_proto::irc_to_lower;

pub(super) fn handle_register(net: &mut Network, user_key: &str, args: &[&str], now: i64) {
    let service = net.chanserv();
    let (Some(chan), Some(password)) = (args.first(), args.get(1)) else {
        reply(
            net,
            &service,
            user_key,
            "Syntax: REGISTER <#channel> <password> <description>",
        );
        return;
    };
    if !chan.starts_with('#') {
        reply_error(
            net,
            &service,
            user_key,
            &ServiceError::InvalidArgument(format!("{} is not a channel name", chan)),
        );
        return;
    }
    if let Err(err) = check_read_only(net) {
        reply_error(net, &service, user_key, &err);
        return;
    }
    let description = if args.len() > 2 {
        args[2..].join(" ")
    } else {
        String::new()
    };

    // The founder identity is the effective identity of an identified
    // registrant.
    let Some((real, effective)) = net
        .users
        .get(user_key)
        .map(|u| (u.real_identity.clone(), u.effective_identity.clone()))
    else {
        return;
    };
    let identified = real
        .as_deref()
        .and_then(|r| net.nicks.get(r))
        .map(|r| r.identified)
        .unwrap_or(false);
    let (Some(_), Some(founder), true) = (real, effective, identified) else {
        reply(
            net,
            &service,
            user_key,
            "You must register and identify your nickname first.",
        );
        return;
    };

    // Registration requires actually running the channel right now.
    let chan_key = irc_to_lower(chan);
    let is_op = net
        .channels
        .get(&chan_key)
        .map(|c| c.ops.contains(user_key))
        .unwrap_or(false);
    if !is_op {
        reply(
            net,
            &service,
            user_key,
            &format!("You must be a channel operator on \x02{}\x02 to register it.", chan),
        );
        return;
    }

    // Founding capacity of the whole linked group.
    let (count, max) = net
        .nicks
        .get(&founder)
        .map(|r| (r.channel_count, r.channel_max))
        .unwrap_or((0, 0));
    let cap = if max > 0 {
        max
    } else {
        net.config.chanserv.max_registered
    };
    if cap > 0 && count >= cap {
        reply_error(
            net,
            &service,
            user_key,
            &ServiceError::CapacityExceeded("channel registration limit"),
        );
        return;
    }

    match net.chans.register(chan, &founder, password, &description, now) {
        Ok(()) => {
            if let Some(record) = net.nicks.get_mut(&founder) {
                record.channel_count += 1;
            }
            if let Some(user) = net.users.get_mut(user_key) {
                user.founder_chans.insert(chan_key.clone());
            }
            net.check_modes(&chan_key, now);
            reply(
                net,
                &service,
                user_key,
                &format!("Channel \x02{}\x02 has been registered.", chan),
            );
        }
        Err(err) => reply_error(net, &service, user_key, &err),
    }
}

pub(super) fn handle_identify(net: &mut Network, user_key: &str, args: &[&str], now: i64) {
    let service = net.chanserv();
    let (Some(chan), Some(password)) = (args.first(), args.get(1)) else {
        reply(net, &service, user_key, "Syntax: IDENTIFY <#channel> <password>");
        return;
    };

    match net.chans.verify_password(chan, password) {
        Err(err) => reply_error(net, &service, user_key, &err),
        Ok(false) => {
            reply_error(net, &service, user_key, &ServiceError::BadCredential);
            net.record_bad_password(user_key, now);
        }
        Ok(true) => {
            let chan_key = irc_to_lower(chan);
            if let Some(user) = net.users.get_mut(user_key) {
                user.founder_chans.insert(chan_key);
            }
            reply(
                net,
                &service,
                user_key,
                &format!("You now have founder access to \x02{}\x02.", chan),
            );
        }
    }
}
