//! SET command handlers for NickServ.

use crate::error::ServiceError;
use crate::registry::nick::KillProtect;
use crate::services::{check_read_only, reply, reply_error};
use crate::state::Network;

pub(super) fn handle_set(net: &mut Network, user_key: &str, args: &[&str]) {
    let service = net.nickserv();
    let Some(option) = args.first() else {
        reply(
            net,
            &service,
            user_key,
            "Syntax: SET <PASSWORD|URL|EMAIL|KILL|SECURE|PRIVATE|HIDE|NOEXPIRE> ...",
        );
        return;
    };
    if let Err(err) = check_read_only(net) {
        reply_error(net, &service, user_key, &err);
        return;
    }

    // Settings always operate on the real identity, which must be
    // identified this session.
    let Some(real) = net.users.get(user_key).and_then(|u| u.real_identity.clone()) else {
        let nick = net
            .users
            .get(user_key)
            .map(|u| u.nick.clone())
            .unwrap_or_default();
        reply_error(net, &service, user_key, &ServiceError::NotFound(nick));
        return;
    };
    if !net.nicks.get(&real).map(|r| r.identified).unwrap_or(false) {
        reply_error(net, &service, user_key, &ServiceError::PermissionDenied);
        return;
    }

    let option = option.to_uppercase();
    let result = match option.as_str() {
        "PASSWORD" => set_password(net, &real, &args[1..]),
        "URL" => set_text(net, &real, &args[1..], |r, v| r.url = v),
        "EMAIL" => set_text(net, &real, &args[1..], |r, v| r.email = v),
        "KILL" => set_kill(net, &real, &args[1..]),
        "SECURE" => set_bool(net, &real, &args[1..], |r, v| r.settings.secure = v),
        "PRIVATE" => set_bool(net, &real, &args[1..], |r, v| r.settings.private = v),
        "HIDE" => set_hide(net, &real, &args[1..]),
        "NOEXPIRE" => set_no_expire(net, user_key, &real, &args[1..]),
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

fn set_password(net: &mut Network, real: &str, args: &[&str]) -> Result<String, ServiceError> {
    let Some(password) = args.first() else {
        return Err(ServiceError::InvalidArgument(
            "SET PASSWORD needs a password".to_owned(),
        ));
    };
    net.nicks.set_password(real, password)?;
    Ok("Your password has been changed.".to_owned())
}

fn set_text(
    net: &mut Network,
    real: &str,
    args: &[&str],
    apply: impl FnOnce(&mut crate::registry::nick::NickRecord, Option<String>),
) -> Result<String, ServiceError> {
    let value = match args.first() {
        Some(&"-") | None => None,
        Some(v) => Some((*v).to_owned()),
    };
    let record = net
        .nicks
        .get_mut(real)
        .ok_or_else(|| ServiceError::NotFound(real.to_owned()))?;
    apply(record, value);
    Ok("Updated.".to_owned())
}

fn set_kill(net: &mut Network, real: &str, args: &[&str]) -> Result<String, ServiceError> {
    let mode = match args.first().map(|a| a.to_uppercase()).as_deref() {
        Some("ON") => KillProtect::Normal,
        Some("QUICK") => KillProtect::Quick,
        Some("IMMED") => KillProtect::Immediate,
        Some("OFF") => KillProtect::Off,
        _ => {
            return Err(ServiceError::InvalidArgument(
                "SET KILL takes ON, QUICK, IMMED or OFF".to_owned(),
            ));
        }
    };
    let record = net
        .nicks
        .get_mut(real)
        .ok_or_else(|| ServiceError::NotFound(real.to_owned()))?;
    record.settings.kill = mode;
    Ok(match mode {
        KillProtect::Off => "Kill protection is now off.".to_owned(),
        KillProtect::Normal => "Kill protection is now on.".to_owned(),
        KillProtect::Quick => "Kill protection is now on, with a short delay.".to_owned(),
        KillProtect::Immediate => "Kill protection is now immediate.".to_owned(),
    })
}

fn set_bool(
    net: &mut Network,
    real: &str,
    args: &[&str],
    apply: impl FnOnce(&mut crate::registry::nick::NickRecord, bool),
) -> Result<String, ServiceError> {
    let value = parse_on_off(args)?;
    let record = net
        .nicks
        .get_mut(real)
        .ok_or_else(|| ServiceError::NotFound(real.to_owned()))?;
    apply(record, value);
    Ok(if value {
        "Option enabled.".to_owned()
    } else {
        "Option disabled.".to_owned()
    })
}

fn set_hide(net: &mut Network, real: &str, args: &[&str]) -> Result<String, ServiceError> {
    let Some(what) = args.first().map(|a| a.to_uppercase()) else {
        return Err(ServiceError::InvalidArgument(
            "SET HIDE takes EMAIL, USERMASK or QUIT".to_owned(),
        ));
    };
    let value = parse_on_off(&args[1..])?;
    let record = net
        .nicks
        .get_mut(real)
        .ok_or_else(|| ServiceError::NotFound(real.to_owned()))?;
    match what.as_str() {
        "EMAIL" => record.settings.hide_email = value,
        "USERMASK" => record.settings.hide_mask = value,
        "QUIT" => record.settings.hide_quit = value,
        _ => {
            return Err(ServiceError::InvalidArgument(
                "SET HIDE takes EMAIL, USERMASK or QUIT".to_owned(),
            ));
        }
    }
    Ok("Updated.".to_owned())
}

fn set_no_expire(
    net: &mut Network,
    user_key: &str,
    real: &str,
    args: &[&str],
) -> Result<String, ServiceError> {
    let is_admin = net
        .users
        .get(user_key)
        .map(|u| net.is_services_admin(u))
        .unwrap_or(false);
    if !is_admin {
        return Err(ServiceError::PermissionDenied);
    }
    // Admins may flag another nick: SET NOEXPIRE <nick> ON|OFF.
    let (target, flag_args): (&str, &[&str]) = if args.len() >= 2 {
        (args[0], &args[1..])
    } else {
        (real, args)
    };
    let value = parse_on_off(flag_args)?;
    let record = net
        .nicks
        .get_mut(target)
        .ok_or_else(|| ServiceError::NotFound(target.to_owned()))?;
    record.no_expire = value;
    Ok(if value {
        format!("Nickname \x02{}\x02 will not expire.", record.nick)
    } else {
        format!("Nickname \x02{}\x02 will expire normally.", record.nick)
    })
}

fn parse_on_off(args: &[&str]) -> Result<bool, ServiceError> {
    match args.first().map(|a| a.to_uppercase()).as_deref() {
        Some("ON") => Ok(true),
        Some("OFF") => Ok(false),
        _ => Err(ServiceError::InvalidArgument("expected ON or OFF".to_owned())),
    }
}
