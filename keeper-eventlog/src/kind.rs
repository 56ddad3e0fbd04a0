use std::fmt;

use keeper_storage::model::guild_config::LogChannels;

/// Platform events the dispatcher listens to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    MessageCreate,
    MessageUpdate,
    MessageDelete,
    ChannelCreate,
    ChannelUpdate,
    ChannelDelete,
    MemberRoleUpdate,
    VoiceStateUpdate,
}

impl EventKind {
    pub const ALL: [EventKind; 8] = [
        EventKind::MessageCreate,
        EventKind::MessageUpdate,
        EventKind::MessageDelete,
        EventKind::ChannelCreate,
        EventKind::ChannelUpdate,
        EventKind::ChannelDelete,
        EventKind::MemberRoleUpdate,
        EventKind::VoiceStateUpdate,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::MessageCreate => "message_create",
            Self::MessageUpdate => "message_update",
            Self::MessageDelete => "message_delete",
            Self::ChannelCreate => "channel_create",
            Self::ChannelUpdate => "channel_update",
            Self::ChannelDelete => "channel_delete",
            Self::MemberRoleUpdate => "member_role_update",
            Self::VoiceStateUpdate => "voice_state_update",
        }
    }

    pub fn category(self) -> LogCategory {
        match self {
            Self::MessageCreate | Self::MessageUpdate | Self::MessageDelete => LogCategory::Message,
            Self::ChannelCreate | Self::ChannelUpdate | Self::ChannelDelete => LogCategory::Channel,
            Self::MemberRoleUpdate => LogCategory::Role,
            Self::VoiceStateUpdate => LogCategory::Voice,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which configured log channel a notification goes to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogCategory {
    Role,
    Channel,
    Message,
    Voice,
    Moderation,
}

impl LogCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Role => "role",
            Self::Channel => "channel",
            Self::Message => "message",
            Self::Voice => "voice",
            Self::Moderation => "moderation",
        }
    }

    /// Resolve the destination channel. Moderation entries fall back to the channel log.
    pub fn destination(self, channels: &LogChannels) -> Option<u64> {
        match self {
            Self::Role => channels.role_log,
            Self::Channel => channels.channel_log,
            Self::Message => channels.message_log,
            Self::Voice => channels.voice_log,
            Self::Moderation => channels.moderation_log.or(channels.channel_log),
        }
    }
}
