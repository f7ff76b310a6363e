//! INFO command handler for NickServ.

use crate::error::ServiceError;
use crate::services::{format_time, reply, reply_error};
use crate::state::Network;
use slserv_proto::irc_to_lower;

pub(super) fn handle_info(net: &mut Network, user_key: &str, args: &[&str]) {
    let service = net.nickserv();
    let Some(target) = args.first() else {
        reply(net, &service, user_key, "Syntax: INFO <nick>");
        return;
    };

    let Some(record) = net.nicks.get(target) else {
        reply_error(
            net,
            &service,
            user_key,
            &ServiceError::NotFound((*target).to_owned()),
        );
        return;
    };

    if record.forbidden {
        let text = format!("Nickname \x02{}\x02 may not be registered or used.", record.nick);
        reply(net, &service, user_key, &text);
        return;
    }

    // Owners (identified) and services admins see through hide flags.
    let target_key = irc_to_lower(target);
    let is_owner = net
        .users
        .get(user_key)
        .and_then(|u| u.real_identity.as_deref().map(|r| r == target_key))
        .unwrap_or(false)
        && record.identified;
    let is_admin = net
        .users
        .get(user_key)
        .map(|u| net.is_services_admin(u))
        .unwrap_or(false);
    let all = is_owner || is_admin;

    let mut lines = vec![format!(
        "\x02{}\x02 is {}",
        record.nick,
        record.last_realname.as_deref().unwrap_or("(unknown)")
    )];
    if let Some(mask) = &record.last_usermask {
        if all || !record.settings.hide_mask {
            lines.push(format!("   Last seen address: {}", mask));
        }
    }
    lines.push(format!(
        "   Time registered: {}",
        format_time(record.time_registered)
    ));
    lines.push(format!("         Last seen: {}", format_time(record.last_seen)));
    if let Some(quit) = &record.last_quit {
        if all || !record.settings.hide_quit {
            lines.push(format!(" Last quit message: {}", quit));
        }
    }
    if let Some(email) = &record.email {
        if all || !record.settings.hide_email {
            lines.push(format!("    E-mail address: {}", email));
        }
    }
    if let Some(url) = &record.url {
        lines.push(format!("               URL: {}", url));
    }
    if let Some(link) = &record.link {
        if all {
            lines.push(format!("         Linked to: {}", link));
        }
    }
    let mut options = Vec::new();
    if record.settings.kill != crate::registry::nick::KillProtect::Off {
        options.push("Kill protection");
    }
    if record.settings.secure {
        options.push("Security");
    }
    if record.settings.private {
        options.push("Private");
    }
    if record.no_expire {
        options.push("No expire");
    }
    lines.push(format!(
        "           Options: {}",
        if options.is_empty() {
            "None".to_owned()
        } else {
            options.join(", ")
        }
    ));

    for line in lines {
        reply(net, &service, user_key, &line);
    }
}
