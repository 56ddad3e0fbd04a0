//! Fans platform events and moderation actions out to per-guild log channels.

mod actor;
mod delivery;
mod dispatcher;
mod handlers;

pub mod channel;
pub mod event;
pub mod format;
pub mod journal;
pub mod kind;
pub mod moderation;
pub mod outcome;
pub mod registry;
pub mod roles;
pub mod voice;

pub use delivery::{SendCheck, bot_can_send};
pub use dispatcher::{ClientHandle, EventLogDispatcher};
pub use kind::{EventKind, LogCategory};
pub use moderation::{ModerationAction, ModerationEntry};
pub use outcome::{DeliveryOutcome, SkipReason};
