//! LEVELS command handlers for ChanServ.

use super::check_founder;
use crate::error::ServiceError;
use crate::registry::chan::{ChanAction, LevelTable, ACCESS_INVALID, LEVEL_MAX, LEVEL_MIN};
use crate::services::{check_read_only, reply, reply_error};
use crate::state::Network;

pub(super) fn handle_levels(net: &mut Network, user_key: &str, args: &[&str]) {
    let service = net.chanserv();
    let (Some(chan), Some(sub)) = (args.first(), args.get(1).map(|s| s.to_uppercase())) else {
        reply(
            net,
            &service,
            user_key,
            "Syntax: LEVELS <#channel> <SET|DIS|LIST|RESET> [action] [level]",
        );
        return;
    };
    if let Err(err) = check_founder(net, user_key, chan) {
        reply_error(net, &service, user_key, &err);
        return;
    }

    match sub.as_str() {
        "LIST" => {
            let Some(levels) = net.chans.get(chan).map(|r| r.levels.clone()) else {
                return;
            };
            reply(
                net,
                &service,
                user_key,
                &format!("Access levels for \x02{}\x02:", chan),
            );
            for action in ChanAction::ALL {
                let value = levels.get(action);
                let shown = if value == ACCESS_INVALID {
                    "(disabled)".to_owned()
                } else {
                    value.to_string()
                };
                reply(
                    net,
                    &service,
                    user_key,
                    &format!("  {:<12} {}", action.name(), shown),
                );
            }
        }
        "SET" => {
            let (Some(which), Some(level_str)) = (args.get(2), args.get(3)) else {
                reply(net, &service, user_key, "Syntax: LEVELS <#channel> SET <action> <level>");
                return;
            };
            if let Err(err) = check_read_only(net) {
                reply_error(net, &service, user_key, &err);
                return;
            }
            let Some(action) = ChanAction::from_name(which) else {
                reply_error(
                    net,
                    &service,
                    user_key,
                    &ServiceError::InvalidArgument(format!("unknown action {}", which)),
                );
                return;
            };
            let level = match level_str.parse::<i16>() {
                Ok(level) if (LEVEL_MIN..=LEVEL_MAX).contains(&level) => level,
                _ => {
                    reply_error(
                        net,
                        &service,
                        user_key,
                        &ServiceError::InvalidArgument(format!(
                            "level must be between {} and {}",
                            LEVEL_MIN, LEVEL_MAX
                        )),
                    );
                    return;
                }
            };
            if let Some(record) = net.chans.get_mut(chan) {
                record.levels.set(action, level);
            }
            reply(
                net,
                &service,
                user_key,
                &format!("Level for {} on \x02{}\x02 set to {}.", action.name(), chan, level),
            );
        }
        "DIS" => {
            let Some(which) = args.get(2) else {
                reply(net, &service, user_key, "Syntax: LEVELS <#channel> DIS <action>");
                return;
            };
            if let Err(err) = check_read_only(net) {
                reply_error(net, &service, user_key, &err);
                return;
            }
            let Some(action) = ChanAction::from_name(which) else {
                reply_error(
                    net,
                    &service,
                    user_key,
                    &ServiceError::InvalidArgument(format!("unknown action {}", which)),
                );
                return;
            };
            if let Some(record) = net.chans.get_mut(chan) {
                record.levels.set(action, ACCESS_INVALID);
            }
            reply(
                net,
                &service,
                user_key,
                &format!("{} on \x02{}\x02 is now founder-only.", action.name(), chan),
            );
        }
        "RESET" => {
            if let Err(err) = check_read_only(net) {
                reply_error(net, &service, user_key, &err);
                return;
            }
            if let Some(record) = net.chans.get_mut(chan) {
                record.levels = LevelTable::default();
            }
            reply(
                net,
                &service,
                user_key,
                &format!("Access levels for \x02{}\x02 reset to defaults.", chan),
            );
        }
        _ => reply(
            net,
            &service,
            user_key,
            "Syntax: LEVELS <#channel> <SET|DIS|LIST|RESET> [action] [level]",
        ),
    }
}
