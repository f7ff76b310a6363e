//! Protocol utilities shared by the Straylight services daemon.
//!
//! This crate owns the pieces of the IRC server protocol that are
//! independent of any network state: RFC 1459 case mapping, tokenizing a
//! wire line into a decoded event, and channel mode strings. The daemon
//! core consumes decoded [`Event`]s and never parses raw lines itself.

pub mod casemap;
pub mod line;
pub mod mode;

pub use casemap::{irc_eq, irc_lower_char, irc_to_lower};
pub use line::{Event, ParseError};
pub use mode::{ChannelModes, ModeChange, ModeParse};
