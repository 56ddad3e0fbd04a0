use std::fmt;

use tracing::{debug, error};

use crate::kind::LogCategory;

/// Result of one handler invocation. Never surfaced to the platform.
#[derive(Debug)]
pub enum DeliveryOutcome {
    Sent,
    Skipped(SkipReason),
    Failed(anyhow::Error),
}

impl DeliveryOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, Self::Sent)
    }
}

impl From<SkipReason> for DeliveryOutcome {
    fn from(reason: SkipReason) -> Self {
        Self::Skipped(reason)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SkipReason {
    NotInGuild,
    BotAuthor,
    NoDestination(LogCategory),
    DestinationMissing(u64),
    NotSendable(u64),
    PriorVersionUnknown,
    NothingChanged,
    Uninitialized,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotInGuild => f.write_str("not a guild event"),
            Self::BotAuthor => f.write_str("authored by a bot"),
            Self::NoDestination(category) => {
                write!(f, "no {} log channel configured", category.as_str())
            }
            Self::DestinationMissing(channel_id) => {
                write!(f, "log channel {channel_id} not found")
            }
            Self::NotSendable(channel_id) => {
                write!(f, "missing permissions in log channel {channel_id}")
            }
            Self::PriorVersionUnknown => f.write_str("previous state not cached"),
            Self::NothingChanged => f.write_str("nothing to report"),
            Self::Uninitialized => f.write_str("dispatcher not initialized"),
        }
    }
}

/// Single reporting point for every handler outcome.
pub(crate) fn report(source: &str, guild_id: Option<u64>, outcome: &DeliveryOutcome) {
    match outcome {
        DeliveryOutcome::Sent => debug!(source, ?guild_id, "log notification sent"),
        DeliveryOutcome::Skipped(reason) => {
            debug!(source, ?guild_id, %reason, "log notification skipped");
        }
        DeliveryOutcome::Failed(error) => {
            error!(?error, source, ?guild_id, "log notification failed");
        }
    }
}
