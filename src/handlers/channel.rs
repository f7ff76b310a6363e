//! Channel event handlers: JOIN, PART, KICK, TOPIC, MODE.

use crate::state::Network;
use slserv_proto::{irc_to_lower, Event};
use tracing::debug;

pub(super) fn handle_join(net: &mut Network, event: &Event, now: i64) {
    let Some(source) = &event.source else {
        debug!("JOIN without source");
        return;
    };
    let Some(channels) = event.arg(0) else {
        debug!(source = %source, "JOIN without channels");
        return;
    };
    let source_key = irc_to_lower(source);
    for chan in channels.split(',').filter(|c| !c.is_empty()) {
        net.join_channel(&source_key, chan, now);
    }
}

pub(super) fn handle_part(net: &mut Network, event: &Event, _now: i64) {
    let Some(source) = &event.source else {
        debug!("PART without source");
        return;
    };
    let Some(channels) = event.arg(0) else {
        return;
    };
    for chan in channels.split(',').filter(|c| !c.is_empty()) {
        net.leave_channel(source, chan);
    }
}

pub(super) fn handle_kick(net: &mut Network, event: &Event, _now: i64) {
    let (Some(chan), Some(target)) = (event.arg(0), event.arg(1)) else {
        debug!("malformed KICK");
        return;
    };
    net.leave_channel(target, chan);
}

/// TOPIC arrives either client-style `TOPIC #chan :text` or burst-style
/// `TOPIC #chan setter ts :text`.
pub(super) fn handle_topic(net: &mut Network, event: &Event, now: i64) {
    let Some(chan) = event.arg(0) else {
        debug!("TOPIC without channel");
        return;
    };
    let (setter, text) = if event.args.len() >= 4 {
        (event.args[1].clone(), event.args[3].clone())
    } else {
        (
            event.source.clone().unwrap_or_default(),
            event.arg(1).unwrap_or("").to_owned(),
        )
    };
    net.handle_topic(&setter, chan, &text, now);
}

pub(super) fn handle_mode(net: &mut Network, event: &Event, now: i64) {
    let Some(target) = event.arg(0) else {
        debug!("MODE without target");
        return;
    };
    let source = event.source.clone().unwrap_or_default();

    if target.starts_with('#') {
        let Some(mode_str) = event.arg(1) else {
            debug!(channel = %target, "MODE without mode string");
            return;
        };
        let params: Vec<String> = event.args[2..].to_vec();
        net.handle_mode(&source, target, mode_str, &params, now);
    } else {
        // User mode change; only the bits the daemon cares about are
        // tracked.
        let Some(mode_str) = event.arg(1) else {
            return;
        };
        if let Some(user) = net.users.get_mut(&irc_to_lower(target)) {
            user.modes.apply(mode_str);
        }
    }
}
