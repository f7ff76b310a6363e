//! INVITE, OP, DEOP, UNBAN and CLEAR command handlers for ChanServ.

use super::check_chan_access;
use crate::registry::chan::ChanAction;
use crate::security::wildcard_match;
use crate::services::{reply, reply_error};
use crate::state::Network;
use slserv_proto::irc_to_lower;
use slserv_proto::mode::ModeLineBuilder;

pub(super) fn handle_invite(net: &mut Network, user_key: &str, args: &[&str]) {
    let service = net.chanserv();
    let Some(chan) = args.first() else {
        reply(net, &service, user_key, "Syntax: INVITE <#channel>");
        return;
    };
    if let Err(err) = check_chan_access(net, user_key, chan, ChanAction::Invite) {
        reply_error(net, &service, user_key, &err);
        return;
    }
    let Some(nick) = net.users.get(user_key).map(|u| u.nick.clone()) else {
        return;
    };
    net.transport
        .send(&service, &format!("INVITE {} {}", nick, chan));
}

pub(super) fn handle_op(net: &mut Network, user_key: &str, args: &[&str], give: bool) {
    let service = net.chanserv();
    let Some(chan) = args.first() else {
        let syntax = if give {
            "Syntax: OP <#channel> [nick]"
        } else {
            "Syntax: DEOP <#channel> [nick]"
        };
        reply(net, &service, user_key, syntax);
        return;
    };
    if let Err(err) = check_chan_access(net, user_key, chan, ChanAction::OpDeop) {
        reply_error(net, &service, user_key, &err);
        return;
    }

    let target_key = match args.get(1) {
        Some(nick) => irc_to_lower(nick),
        None => user_key.to_owned(),
    };
    let chan_key = irc_to_lower(chan);
    let is_member = net
        .channels
        .get(&chan_key)
        .map(|c| c.members.contains(&target_key))
        .unwrap_or(false);
    if !is_member {
        reply(
            net,
            &service,
            user_key,
            &format!("\x02{}\x02 is not on \x02{}\x02.", target_key, chan),
        );
        return;
    }
    let Some(target_nick) = net.users.get(&target_key).map(|u| u.nick.clone()) else {
        return;
    };

    let flag = if give { "+o" } else { "-o" };
    net.transport
        .send(&service, &format!("MODE {} {} {}", chan, flag, target_nick));
    if let Some(channel) = net.channels.get_mut(&chan_key) {
        if give {
            channel.ops.insert(target_key.clone());
        } else {
            channel.ops.remove(&target_key);
        }
    }

    // Channels may announce op changes made through services.
    let announce = net
        .chans
        .get(&chan_key)
        .map(|r| r.flags.op_notice)
        .unwrap_or(false);
    if announce {
        let actor = net
            .users
            .get(user_key)
            .map(|u| u.nick.clone())
            .unwrap_or_default();
        let verb = if give { "OP" } else { "DEOP" };
        net.transport.send(
            &service,
            &format!("NOTICE @{} :{} command used by {} for {}", chan, verb, actor, target_nick),
        );
    }
}

pub(super) fn handle_unban(net: &mut Network, user_key: &str, args: &[&str]) {
    let service = net.chanserv();
    let Some(chan) = args.first() else {
        reply(net, &service, user_key, "Syntax: UNBAN <#channel>");
        return;
    };
    if let Err(err) = check_chan_access(net, user_key, chan, ChanAction::Unban) {
        reply_error(net, &service, user_key, &err);
        return;
    }

    let chan_key = irc_to_lower(chan);
    let Some(nick_user_host) = net.users.get(user_key).map(|u| u.nick_user_host()) else {
        return;
    };
    let matching: Vec<String> = net
        .channels
        .get(&chan_key)
        .map(|c| {
            c.ban_masks()
                .into_iter()
                .filter(|mask| wildcard_match(mask, &nick_user_host))
                .map(str::to_owned)
                .collect()
        })
        .unwrap_or_default();

    if matching.is_empty() {
        reply(
            net,
            &service,
            user_key,
            &format!("No bans matching you were found on \x02{}\x02.", chan),
        );
        return;
    }
    for mask in &matching {
        net.transport
            .send(&service, &format!("MODE {} -b {}", chan, mask));
        if let Some(channel) = net.channels.get_mut(&chan_key) {
            channel.del_ban(mask);
        }
    }
    reply(
        net,
        &service,
        user_key,
        &format!("You have been unbanned from \x02{}\x02.", chan),
    );
}

pub(super) fn handle_clear(net: &mut Network, user_key: &str, args: &[&str], now: i64) {
    let service = net.chanserv();
    let (Some(chan), Some(what)) = (args.first(), args.get(1).map(|s| s.to_uppercase())) else {
        reply(
            net,
            &service,
            user_key,
            "Syntax: CLEAR <#channel> <MODES|BANS|OPS|VOICES|USERS>",
        );
        return;
    };
    if let Err(err) = check_chan_access(net, user_key, chan, ChanAction::Set) {
        reply_error(net, &service, user_key, &err);
        return;
    }
    let chan_key = irc_to_lower(chan);
    if !net.channels.contains_key(&chan_key) {
        reply(
            net,
            &service,
            user_key,
            &format!("Channel \x02{}\x02 is not in use.", chan),
        );
        return;
    }
    let actor = net
        .users
        .get(user_key)
        .map(|u| u.nick.clone())
        .unwrap_or_default();

    match what.as_str() {
        "MODES" => {
            let mut builder = ModeLineBuilder::new();
            if let Some(channel) = net.channels.get_mut(&chan_key) {
                for flag in slserv_proto::ChannelModes::FLAG_CHARS {
                    if channel.modes.flag(flag) {
                        builder.remove_flag(flag);
                        channel.modes.set_flag(flag, false);
                    }
                }
                if let Some(key) = channel.modes.key.take() {
                    builder.remove_param('k', &key);
                }
                if channel.modes.limit.take().is_some() {
                    builder.remove_flag('l');
                }
            }
            if let Some(line) = builder.render() {
                net.transport
                    .send(&service, &format!("MODE {} {}", chan, line));
            }
            // The lock wins back anything it pins.
            net.check_modes(&chan_key, now);
            reply(net, &service, user_key, &format!("Modes cleared on \x02{}\x02.", chan));
        }
        "BANS" => {
            let masks: Vec<String> = net
                .channels
                .get(&chan_key)
                .map(|c| c.ban_masks().into_iter().map(str::to_owned).collect())
                .unwrap_or_default();
            for mask in &masks {
                net.transport
                    .send(&service, &format!("MODE {} -b {}", chan, mask));
                if let Some(channel) = net.channels.get_mut(&chan_key) {
                    channel.del_ban(mask);
                }
            }
            reply(
                net,
                &service,
                user_key,
                &format!("{} ban(s) cleared on \x02{}\x02.", masks.len(), chan),
            );
        }
        "OPS" => {
            let ops: Vec<String> = net
                .channels
                .get(&chan_key)
                .map(|c| c.ops.iter().cloned().collect())
                .unwrap_or_default();
            for member in ops {
                let nick = net
                    .users
                    .get(&member)
                    .map(|u| u.nick.clone())
                    .unwrap_or(member.clone());
                net.transport
                    .send(&service, &format!("MODE {} -o {}", chan, nick));
                if let Some(channel) = net.channels.get_mut(&chan_key) {
                    channel.ops.remove(&member);
                }
            }
            reply(net, &service, user_key, &format!("Ops cleared on \x02{}\x02.", chan));
        }
        "VOICES" => {
            let voices: Vec<String> = net
                .channels
                .get(&chan_key)
                .map(|c| c.voices.iter().cloned().collect())
                .unwrap_or_default();
            for member in voices {
                let nick = net
                    .users
                    .get(&member)
                    .map(|u| u.nick.clone())
                    .unwrap_or(member.clone());
                net.transport
                    .send(&service, &format!("MODE {} -v {}", chan, nick));
                if let Some(channel) = net.channels.get_mut(&chan_key) {
                    channel.voices.remove(&member);
                }
            }
            reply(net, &service, user_key, &format!("Voices cleared on \x02{}\x02.", chan));
        }
        "USERS" => {
            let members = net.channel_members(&chan_key);
            for member in members {
                let nick = net
                    .users
                    .get(&member)
                    .map(|u| u.nick.clone())
                    .unwrap_or(member.clone());
                net.transport.send(
                    &service,
                    &format!("KICK {} {} :CLEAR USERS command from {}", chan, nick, actor),
                );
                net.leave_channel(&member, &chan_key);
            }
            reply(net, &service, user_key, &format!("Users cleared on \x02{}\x02.", chan));
        }
        _ => reply(
            net,
            &service,
            user_key,
            "Syntax: CLEAR <#channel> <MODES|BANS|OPS|VOICES|USERS>",
        ),
    }
}
