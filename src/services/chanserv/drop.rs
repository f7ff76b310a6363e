//! DROP and FORBID command handlers for ChanServ.

use super::{acting_admin, check_founder};
use crate::error::ServiceError;
use crate::services::{check_read_only, reply, reply_error};
use crate::state::Network;
use slserv_proto::irc_to_lower;

pub(super) fn handle_drop(net: &mut Network, user_key: &str, args: &[&str]) {
    let service = net.chanserv();
    let Some(chan) = args.first() else {
        reply(net, &service, user_key, "Syntax: DROP <#channel>");
        return;
    };
    if let Err(err) = check_read_only(net) {
        reply_error(net, &service, user_key, &err);
        return;
    }
    if let Err(err) = check_founder(net, user_key, chan) {
        reply_error(net, &service, user_key, &err);
        return;
    }

    net.delete_channel(chan);
    reply(
        net,
        &service,
        user_key,
        &format!("Channel \x02{}\x02 has been dropped.", chan),
    );
}

pub(super) fn handle_forbid(net: &mut Network, user_key: &str, args: &[&str], now: i64) {
    let service = net.chanserv();
    let Some(chan) = args.first() else {
        reply(net, &service, user_key, "Syntax: FORBID <#channel>");
        return;
    };
    if let Err(err) = check_read_only(net) {
        reply_error(net, &service, user_key, &err);
        return;
    }
    if !acting_admin(net, user_key) {
        reply_error(net, &service, user_key, &ServiceError::PermissionDenied);
        return;
    }

    let chan_key = irc_to_lower(chan);
    if net.chans.get(&chan_key).is_some() {
        net.delete_channel(&chan_key);
    }
    match net.chans.forbid(chan, now) {
        Ok(()) => {
            // Clear out anyone currently on the channel.
            let chanserv = net.chanserv();
            for member in net.channel_members(&chan_key) {
                let nick = net
                    .users
                    .get(&member)
                    .map(|u| u.nick.clone())
                    .unwrap_or_else(|| member.clone());
                net.transport.send(
                    &chanserv,
                    &format!("KICK {} {} :This channel may not be used.", chan, nick),
                );
                net.leave_channel(&member, &chan_key);
            }
            reply(
                net,
                &service,
                user_key,
                &format!("Channel \x02{}\x02 is now forbidden.", chan),
            );
        }
        Err(err) => reply_error(net, &service, user_key, &err),
    }
}
