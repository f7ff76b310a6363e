//! Service command pipeline.
//!
//! PRIVMSGs aimed at a service pseudo-client are routed here, parsed
//! into an uppercase verb plus arguments, and dispatched through each
//! service's command table. Every rejected command produces exactly one
//! explanatory notice; the registries themselves never format
//! user-facing text.

pub mod chanserv;
pub mod nickserv;
pub mod operserv;

use crate::error::ServiceError;
use crate::state::Network;
use slserv_proto::irc_to_lower;

/// Route a message addressed to a service. Returns true when the target
/// was one of ours.
pub fn route_service_message(
    net: &mut Network,
    source: &str,
    target: &str,
    text: &str,
    now: i64,
) -> bool {
    let target_lower = irc_to_lower(target);
    let source_key = irc_to_lower(source);

    if target_lower == irc_to_lower(&net.nickserv()) {
        nickserv::handle(net, &source_key, text, now);
        return true;
    }
    if target_lower == irc_to_lower(&net.chanserv()) {
        chanserv::handle(net, &source_key, text, now);
        return true;
    }
    if target_lower == irc_to_lower(&net.operserv()) {
        operserv::handle(net, &source_key, text, now);
        return true;
    }
    false
}

/// Split a command line into an uppercase verb and its arguments.
pub(crate) fn split_command(text: &str) -> Option<(String, Vec<&str>)> {
    let mut parts = text.split_whitespace();
    let verb = parts.next()?.to_uppercase();
    Some((verb, parts.collect()))
}

/// NOTICE the acting user from a service.
pub(crate) fn reply(net: &Network, service: &str, user_key: &str, text: &str) {
    if let Some(user) = net.users.get(user_key) {
        net.notice(service, &user.nick, text);
    }
}

/// Map a rejection onto its one user-facing notice.
pub(crate) fn reply_error(net: &Network, service: &str, user_key: &str, err: &ServiceError) {
    let text = match err {
        ServiceError::NotFound(what) => format!("\x02{}\x02 is not registered.", what),
        ServiceError::AlreadyExists(what) => format!("\x02{}\x02 already exists.", what),
        ServiceError::Forbidden(what) => {
            format!("\x02{}\x02 may not be used or registered.", what)
        }
        ServiceError::PermissionDenied => "Access denied.".to_owned(),
        ServiceError::BadCredential => "Password incorrect.".to_owned(),
        ServiceError::RateLimited(secs) => {
            format!("Please wait {} seconds before using this command again.", secs)
        }
        ServiceError::CapacityExceeded(what) => format!("Sorry, the {} is full.", what),
        ServiceError::InvalidArgument(what) => format!("Invalid argument: {}.", what),
        ServiceError::ReadOnly => {
            "Services are in read-only mode; changes cannot be made right now.".to_owned()
        }
        ServiceError::Inconsistent(_) => "An internal problem occurred; it has been logged.".to_owned(),
    };
    reply(net, service, user_key, &text);
}

/// Read-only guard shared by every mutating command.
pub(crate) fn check_read_only(net: &Network) -> Result<(), ServiceError> {
    if net.config.read_only {
        Err(ServiceError::ReadOnly)
    } else {
        Ok(())
    }
}

/// Parse an `+expiry` token (`30d`, `2h`, `45m`, plain seconds, `0` for
/// never) into an absolute expiry timestamp, 0 meaning never.
pub(crate) fn parse_expiry(token: &str, now: i64) -> Result<i64, ServiceError> {
    let token = token.strip_prefix('+').unwrap_or(token);
    if token == "0" {
        return Ok(0);
    }
    let (digits, unit) = match token.chars().last() {
        Some(c) if c.is_ascii_digit() => (token, 1i64),
        Some('s') => (&token[..token.len() - 1], 1),
        Some('m') => (&token[..token.len() - 1], 60),
        Some('h') => (&token[..token.len() - 1], 3600),
        Some('d') => (&token[..token.len() - 1], 86400),
        _ => {
            return Err(ServiceError::InvalidArgument(format!(
                "bad expiry: {}",
                token
            )));
        }
    };
    let n: i64 = digits
        .parse()
        .map_err(|_| ServiceError::InvalidArgument(format!("bad expiry: {}", token)))?;
    if n <= 0 {
        return Err(ServiceError::InvalidArgument(format!(
            "bad expiry: {}",
            token
        )));
    }
    Ok(now + n * unit)
}

/// Render a timestamp for LIST/VIEW/INFO output.
pub(crate) fn format_time(ts: i64) -> String {
    use chrono::{TimeZone, Utc};
    match Utc.timestamp_opt(ts, 0).single() {
        Some(t) => t.format("%b %d %H:%M:%S %Y UTC").to_string(),
        None => ts.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_command_uppercases_verb() {
        let (verb, args) = split_command("identify hunter2x").unwrap();
        assert_eq!(verb, "IDENTIFY");
        assert_eq!(args, vec!["hunter2x"]);
        assert!(split_command("   ").is_none());
    }

    #[test]
    fn parse_expiry_units() {
        assert_eq!(parse_expiry("0", 100).unwrap(), 0);
        assert_eq!(parse_expiry("30", 100).unwrap(), 130);
        assert_eq!(parse_expiry("+45m", 100).unwrap(), 100 + 45 * 60);
        assert_eq!(parse_expiry("2h", 100).unwrap(), 100 + 7200);
        assert_eq!(parse_expiry("30d", 100).unwrap(), 100 + 30 * 86400);
        assert!(parse_expiry("x", 100).is_err());
        assert!(parse_expiry("-5d", 100).is_err());
    }
}
