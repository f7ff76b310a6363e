//! SET command handlers for ChanServ.

use super::{acting_admin, check_chan_access};
use crate::error::ServiceError;
use crate::registry::chan::{ChanAction, ChanRecord, ModeLock};
use crate::security::password;
use crate::services::{check_read_only, reply, reply_error};
use crate::state::Network;
use slserv_proto::irc_to_lower;

pub(super) fn handle_set(net: &mut Network, user_key: &str, args: &[&str], now: i64) {
    let service = net.chanserv();
    let (Some(chan), Some(option)) = (args.first(), args.get(1)) else {
        reply(net, &service, user_key, "Syntax: SET <#channel> <option> <parameters>");
        return;
    };
    if let Err(err) = check_read_only(net) {
        reply_error(net, &service, user_key, &err);
        return;
    }
    if let Err(err) = check_chan_access(net, user_key, chan, ChanAction::Set) {
        reply_error(net, &service, user_key, &err);
        return;
    }

    let chan_key = irc_to_lower(chan);
    let option = option.to_uppercase();
    let rest = &args[2..];
    let result = match option.as_str() {
        "FOUNDER" => set_founder(net, &chan_key, rest),
        "SUCCESSOR" => set_successor(net, &chan_key, rest),
        "PASSWORD" => set_chan_password(net, &chan_key, rest),
        "DESC" => set_desc(net, &chan_key, rest),
        "URL" => set_opt_text(net, &chan_key, rest, |r, v| r.url = v),
        "EMAIL" => set_opt_text(net, &chan_key, rest, |r, v| r.email = v),
        "ENTRYMSG" => set_opt_text(net, &chan_key, rest, |r, v| r.entry_msg = v),
        "MLOCK" => set_mlock(net, &chan_key, rest, now),
        "KEEPTOPIC" => set_flag(net, &chan_key, rest, |r, v| r.flags.keep_topic = v),
        "TOPICLOCK" => set_flag(net, &chan_key, rest, |r, v| r.flags.topic_lock = v),
        "PRIVATE" => set_flag(net, &chan_key, rest, |r, v| r.flags.private = v),
        "SECUREOPS" => set_flag(net, &chan_key, rest, |r, v| r.flags.secure_ops = v),
        "LEAVEOPS" => set_flag(net, &chan_key, rest, |r, v| r.flags.leave_ops = v),
        "RESTRICTED" => set_flag(net, &chan_key, rest, |r, v| r.flags.restricted = v),
        "SECURE" => set_flag(net, &chan_key, rest, |r, v| r.flags.secure = v),
        "OPNOTICE" => set_flag(net, &chan_key, rest, |r, v| r.flags.op_notice = v),
        "NOEXPIRE" => set_no_expire(net, user_key, &chan_key, rest),
        _ => Err(ServiceError::InvalidArgument(format!(
            "unknown SET option {}",
            option
        ))),
    };

    match result {
        Ok(confirmation) => reply(net, &service, user_key, &confirmation),
        Err(err) => reply_error(net, &service, user_key, &err),
    }
}

fn record_mut<'a>(net: &'a mut Network, chan_key: &str) -> Result<&'a mut ChanRecord, ServiceError> {
    net.chans
        .get_mut(chan_key)
        .ok_or_else(|| ServiceError::NotFound(chan_key.to_owned()))
}

fn set_founder(net: &mut Network, chan_key: &str, args: &[&str]) -> Result<String, ServiceError> {
    let Some(new_founder) = args.first() else {
        return Err(ServiceError::InvalidArgument(
            "SET FOUNDER needs a nickname".to_owned(),
        ));
    };
    let heir = net
        .nicks
        .resolve_effective(new_founder)
        .ok_or_else(|| ServiceError::NotFound((*new_founder).to_owned()))?;

    let (count, max) = net
        .nicks
        .get(&heir)
        .map(|r| (r.channel_count, r.channel_max))
        .unwrap_or((0, 0));
    let cap = if max > 0 {
        max
    } else {
        net.config.chanserv.max_registered
    };
    if cap > 0 && count >= cap {
        return Err(ServiceError::CapacityExceeded("channel registration limit"));
    }

    let old_founder = {
        let record = record_mut(net, chan_key)?;
        std::mem::replace(&mut record.founder, heir.clone())
    };
    if let Some(old) = net.nicks.get_mut(&old_founder) {
        old.channel_count = old.channel_count.saturating_sub(1);
    }
    if let Some(new) = net.nicks.get_mut(&heir) {
        new.channel_count += 1;
    }
    Ok(format!("Founder changed to \x02{}\x02.", heir))
}

fn set_successor(net: &mut Network, chan_key: &str, args: &[&str]) -> Result<String, ServiceError> {
    let value = match args.first() {
        Some(&"-") | None => None,
        Some(nick) => Some(
            net.nicks
                .resolve_effective(nick)
                .ok_or_else(|| ServiceError::NotFound((*nick).to_owned()))?,
        ),
    };
    let record = record_mut(net, chan_key)?;
    if value.as_deref() == Some(record.founder.as_str()) {
        return Err(ServiceError::InvalidArgument(
            "the founder cannot be the successor".to_owned(),
        ));
    }
    record.successor = value.clone();
    Ok(match value {
        Some(nick) => format!("Successor set to \x02{}\x02.", nick),
        None => "Successor unset.".to_owned(),
    })
}

fn set_chan_password(
    net: &mut Network,
    chan_key: &str,
    args: &[&str],
) -> Result<String, ServiceError> {
    let Some(new_pass) = args.first() else {
        return Err(ServiceError::InvalidArgument(
            "SET PASSWORD needs a password".to_owned(),
        ));
    };
    let hash = password::hash_password(new_pass)
        .map_err(|_| ServiceError::InvalidArgument("unusable password".to_owned()))?;
    let record = record_mut(net, chan_key)?;
    record.password = hash;
    Ok("Channel password changed.".to_owned())
}

fn set_desc(net: &mut Network, chan_key: &str, args: &[&str]) -> Result<String, ServiceError> {
    if args.is_empty() {
        return Err(ServiceError::InvalidArgument(
            "SET DESC needs a description".to_owned(),
        ));
    }
    let record = record_mut(net, chan_key)?;
    record.desc = args.join(" ");
    Ok("Description changed.".to_owned())
}

fn set_opt_text(
    net: &mut Network,
    chan_key: &str,
    args: &[&str],
    apply: impl FnOnce(&mut ChanRecord, Option<String>),
) -> Result<String, ServiceError> {
    let value = match args.first() {
        Some(&"-") | None => None,
        Some(_) => Some(args.join(" ")),
    };
    let record = record_mut(net, chan_key)?;
    apply(record, value);
    Ok("Updated.".to_owned())
}

fn set_mlock(
    net: &mut Network,
    chan_key: &str,
    args: &[&str],
    now: i64,
) -> Result<String, ServiceError> {
    let Some(modes) = args.first() else {
        return Err(ServiceError::InvalidArgument(
            "SET MLOCK needs a mode string".to_owned(),
        ));
    };
    let params: Vec<String> = args[1..].iter().map(|a| (*a).to_owned()).collect();
    let lock = ModeLock::parse(modes, &params)?;
    let display = lock.to_string();
    {
        let record = record_mut(net, chan_key)?;
        record.mlock = lock;
    }
    // Enforce the new lock right away if the channel is live.
    net.check_modes(chan_key, now);
    Ok(if display.is_empty() {
        "Mode lock removed.".to_owned()
    } else {
        format!("Mode lock changed to \x02{}\x02.", display)
    })
}

fn set_flag(
    net: &mut Network,
    chan_key: &str,
    args: &[&str],
    apply: impl FnOnce(&mut ChanRecord, bool),
) -> Result<String, ServiceError> {
    let value = match args.first().map(|a| a.to_uppercase()).as_deref() {
        Some("ON") => true,
        Some("OFF") => false,
        _ => {
            return Err(ServiceError::InvalidArgument("expected ON or OFF".to_owned()));
        }
    };
    let record = record_mut(net, chan_key)?;
    apply(record, value);
    Ok(if value {
        "Option enabled.".to_owned()
    } else {
        "Option disabled.".to_owned()
    })
}

fn set_no_expire(
    net: &mut Network,
    user_key: &str,
    chan_key: &str,
    args: &[&str],
) -> Result<String, ServiceError> {
    if !acting_admin(net, user_key) {
        return Err(ServiceError::PermissionDenied);
    }
    let value = match args.first().map(|a| a.to_uppercase()).as_deref() {
        Some("ON") => true,
        Some("OFF") => false,
        _ => {
            return Err(ServiceError::InvalidArgument("expected ON or OFF".to_owned()));
        }
    };
    let record = record_mut(net, chan_key)?;
    record.no_expire = value;
    Ok(if value {
        format!("Channel \x02{}\x02 will not expire.", record.name)
    } else {
        format!("Channel \x02{}\x02 will expire normally.", record.name)
    })
}
