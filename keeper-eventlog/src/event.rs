use crate::channel::ChannelSnapshot;
use crate::journal::MessageSnapshot;
use crate::kind::EventKind;
use crate::voice::VoiceSnapshot;

/// Owned copy of a platform event, detached from the gateway so handlers can
/// run on their own task.
#[derive(Clone, Debug)]
pub enum TrackedEvent {
    MessageCreate(MessageSnapshot),
    MessageUpdate {
        guild_id: Option<u64>,
        message_id: u64,
        author_bot: Option<bool>,
        before: Option<MessageSnapshot>,
        content: Option<String>,
    },
    MessageDelete {
        guild_id: u64,
        channel_id: u64,
        message_id: u64,
        cached: Option<MessageSnapshot>,
    },
    ChannelCreate(ChannelSnapshot),
    ChannelUpdate {
        before: Option<ChannelSnapshot>,
        after: ChannelSnapshot,
    },
    ChannelDelete(ChannelSnapshot),
    MemberRoleUpdate {
        guild_id: u64,
        user_id: u64,
        before: Option<Vec<u64>>,
        after: Vec<u64>,
    },
    VoiceStateUpdate {
        guild_id: Option<u64>,
        user_id: u64,
        avatar: Option<String>,
        before: Option<VoiceSnapshot>,
        after: VoiceSnapshot,
    },
}

impl TrackedEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::MessageCreate(_) => EventKind::MessageCreate,
            Self::MessageUpdate { .. } => EventKind::MessageUpdate,
            Self::MessageDelete { .. } => EventKind::MessageDelete,
            Self::ChannelCreate(_) => EventKind::ChannelCreate,
            Self::ChannelUpdate { .. } => EventKind::ChannelUpdate,
            Self::ChannelDelete(_) => EventKind::ChannelDelete,
            Self::MemberRoleUpdate { .. } => EventKind::MemberRoleUpdate,
            Self::VoiceStateUpdate { .. } => EventKind::VoiceStateUpdate,
        }
    }

    pub fn guild_id(&self) -> Option<u64> {
        match self {
            Self::MessageCreate(message) => message.guild_id,
            Self::MessageUpdate { guild_id, .. } | Self::VoiceStateUpdate { guild_id, .. } => {
                *guild_id
            }
            Self::MessageDelete { guild_id, .. } | Self::MemberRoleUpdate { guild_id, .. } => {
                Some(*guild_id)
            }
            Self::ChannelCreate(channel) | Self::ChannelDelete(channel) => Some(channel.guild_id),
            Self::ChannelUpdate { after, .. } => Some(after.guild_id),
        }
    }
}
