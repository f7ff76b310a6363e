//! Persistent registries.
//!
//! Each registry owns its records outright and is mutated only through
//! the operations it exposes; the live network state and the service
//! command pipeline are the only callers. Registries serialize through
//! `save`/`load` on plain readers and writers; file paths, rotation and
//! save cadence belong to the `db` module.

pub mod akill;
pub mod chan;
pub mod nick;
pub mod selector;
pub mod session;

pub use akill::AkillRegistry;
pub use chan::ChanRegistry;
pub use nick::NickRegistry;
pub use session::SessionRegistry;
