//! Connection lifecycle handlers: NICK, QUIT, KILL, AWAY, PING.

use crate::state::Network;
use slserv_proto::{irc_to_lower, Event};
use tracing::{debug, warn};

/// NICK is both user introduction and nick change. A source that
/// resolves to a live user is changing nick; anything else with a full
/// argument set is a new connection.
pub(super) fn handle_nick(net: &mut Network, event: &Event, now: i64) {
    if let Some(source) = &event.source {
        let source_key = irc_to_lower(source);
        if net.users.contains_key(&source_key) {
            let Some(new_nick) = event.arg(0) else {
                warn!("nick change without a new nick");
                return;
            };
            net.change_nick(source, new_nick, now);
            return;
        }
    }

    // Introduction: nick, username, host, server, signon, realname.
    let (Some(nick), Some(user), Some(host), Some(server)) = (
        event.arg(0),
        event.arg(1),
        event.arg(2),
        event.arg(3),
    ) else {
        warn!(args = ?event.args, "malformed NICK introduction");
        return;
    };
    let signon = event
        .arg(4)
        .and_then(|a| a.parse::<i64>().ok())
        .unwrap_or(now);
    let realname = event.arg(5).unwrap_or("");
    net.introduce_user(nick, user, host, realname, server, signon, now);
}

pub(super) fn handle_quit(net: &mut Network, event: &Event, now: i64) {
    let Some(source) = &event.source else {
        debug!("QUIT without source");
        return;
    };
    let reason = event.arg(0).unwrap_or("");
    net.remove_user(source, reason, true, now);
}

/// A KILL from anywhere on the network removes the target like a quit,
/// without recording a last-quit message.
pub(super) fn handle_kill(net: &mut Network, event: &Event, now: i64) {
    let Some(target) = event.arg(0) else {
        debug!("KILL without target");
        return;
    };
    let reason = event.arg(1).unwrap_or("Killed");
    net.remove_user(target, reason, false, now);
}

pub(super) fn handle_away(net: &mut Network, event: &Event, _now: i64) {
    let Some(source) = &event.source else {
        return;
    };
    let away = event.arg(0).filter(|a| !a.is_empty()).map(str::to_owned);
    if let Some(user) = net.users.get_mut(&irc_to_lower(source)) {
        user.away = away;
    }
}

pub(super) fn handle_ping(net: &mut Network, event: &Event, _now: i64) {
    let origin = event.arg(0).unwrap_or("");
    let server = net.config.uplink.server_name.clone();
    net.transport.send(&server, &format!("PONG :{}", origin));
}
