use poise::serenity_prelude as serenity;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChannelSnapshot {
    pub channel_id: u64,
    pub guild_id: u64,
    pub name: String,
    pub kind: serenity::ChannelType,
    pub topic: Option<String>,
    pub parent_id: Option<u64>,
    pub nsfw: bool,
}

impl ChannelSnapshot {
    pub fn from_channel(channel: &serenity::GuildChannel) -> Self {
        Self {
            channel_id: channel.id.get(),
            guild_id: channel.guild_id.get(),
            name: channel.name.clone(),
            kind: channel.kind,
            topic: channel.topic.clone(),
            parent_id: channel.parent_id.map(|id| id.get()),
            nsfw: channel.nsfw,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChannelChange {
    Name { before: String, after: String },
    Topic { before: Option<String>, after: Option<String> },
    Category { before: Option<u64>, after: Option<u64> },
    Nsfw { before: bool, after: bool },
}

/// Field-level differences worth logging, in display order.
pub fn diff_channel(before: &ChannelSnapshot, after: &ChannelSnapshot) -> Vec<ChannelChange> {
    let mut changes = Vec::new();

    if before.name != after.name {
        changes.push(ChannelChange::Name {
            before: before.name.clone(),
            after: after.name.clone(),
        });
    }

    if normalized_topic(&before.topic) != normalized_topic(&after.topic) {
        changes.push(ChannelChange::Topic {
            before: before.topic.clone(),
            after: after.topic.clone(),
        });
    }

    if before.parent_id != after.parent_id {
        changes.push(ChannelChange::Category {
            before: before.parent_id,
            after: after.parent_id,
        });
    }

    if before.nsfw != after.nsfw {
        changes.push(ChannelChange::Nsfw {
            before: before.nsfw,
            after: after.nsfw,
        });
    }

    changes
}

// An empty topic and a missing topic are the same thing on the platform.
fn normalized_topic(topic: &Option<String>) -> Option<&str> {
    topic.as_deref().filter(|topic| !topic.is_empty())
}

pub fn channel_type_label(kind: serenity::ChannelType) -> &'static str {
    match kind {
        serenity::ChannelType::Text => "Text Channel",
        serenity::ChannelType::Voice => "Voice Channel",
        serenity::ChannelType::Category => "Category",
        serenity::ChannelType::News => "Announcement Channel",
        serenity::ChannelType::Stage => "Stage Channel",
        serenity::ChannelType::Forum => "Forum Channel",
        serenity::ChannelType::PublicThread
        | serenity::ChannelType::PrivateThread
        | serenity::ChannelType::NewsThread => "Thread",
        _ => "Channel",
    }
}
