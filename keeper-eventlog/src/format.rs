use poise::serenity_prelude as serenity;

use keeper_utils::formatting::truncate_chars;

use crate::channel::{ChannelChange, ChannelSnapshot, channel_type_label};
use crate::journal::MessageSnapshot;
use crate::voice::VoiceActivity;

pub const COLOR_CREATE: u32 = 0x43_B5_81;
pub const COLOR_DELETE: u32 = 0xF0_47_47;
pub const COLOR_UPDATE: u32 = 0xFA_A6_1A;
pub const COLOR_NEUTRAL: u32 = 0x72_89_DA;

const DESCRIPTION_LIMIT: usize = 4_096;
const FIELD_VALUE_LIMIT: usize = 1_024;
const CONTENT_LIMIT: usize = 1_800;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NotificationAuthor {
    pub name: String,
    pub icon_url: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NotificationField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

impl NotificationField {
    pub fn new(name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            inline,
        }
    }
}

/// Platform-independent description of one log embed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogNotification {
    pub color: u32,
    pub author: Option<NotificationAuthor>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub fields: Vec<NotificationField>,
}

impl LogNotification {
    pub fn new(color: u32) -> Self {
        Self {
            color,
            author: None,
            title: None,
            description: None,
            fields: Vec::new(),
        }
    }

    pub fn author(mut self, name: impl Into<String>, icon_url: Option<String>) -> Self {
        self.author = Some(NotificationAuthor {
            name: name.into(),
            icon_url,
        });
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, lines: &[String]) -> Self {
        self.description = Some(lines.join("\n"));
        self
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        self.fields.push(NotificationField::new(name, value, inline));
        self
    }

    pub fn into_embed(self) -> serenity::CreateEmbed {
        let mut embed = serenity::CreateEmbed::new()
            .color(self.color)
            .timestamp(serenity::Timestamp::now());

        if let Some(author) = self.author {
            let mut builder = serenity::CreateEmbedAuthor::new(author.name);
            if let Some(icon_url) = author.icon_url {
                builder = builder.icon_url(icon_url);
            }
            embed = embed.author(builder);
        }

        if let Some(title) = self.title {
            embed = embed.title(title);
        }

        if let Some(description) = self.description {
            embed = embed.description(truncate_chars(&description, DESCRIPTION_LIMIT));
        }

        embed.fields(self.fields.into_iter().map(|field| {
            (
                field.name,
                truncate_chars(&field.value, FIELD_VALUE_LIMIT),
                field.inline,
            )
        }))
    }
}

pub fn user_mention(user_id: Option<u64>) -> String {
    match user_id {
        Some(user_id) => format!("<@{user_id}>"),
        None => "Unknown".to_owned(),
    }
}

pub fn channel_mention(channel_id: Option<u64>) -> String {
    match channel_id {
        Some(channel_id) => format!("<#{channel_id}>"),
        None => "None".to_owned(),
    }
}

fn content_or_placeholder(content: &str) -> String {
    if content.trim().is_empty() {
        "*No content*".to_owned()
    } else {
        truncate_chars(content, CONTENT_LIMIT)
    }
}

fn with_attachments(notification: LogNotification, message: &MessageSnapshot) -> LogNotification {
    if message.attachments.is_empty() {
        return notification;
    }

    let list = message
        .attachments
        .iter()
        .map(|attachment| format!("[{}]({})", attachment.filename, attachment.url))
        .collect::<Vec<_>>()
        .join("\n");

    notification.field("📎 Attachments", list, false)
}

pub fn message_created(message: &MessageSnapshot) -> LogNotification {
    let notification = LogNotification::new(COLOR_CREATE)
        .author("Message Created", message.author_avatar.clone())
        .description(&[
            "📝 **New Message Sent**".to_owned(),
            format!("Channel: {}", channel_mention(Some(message.channel_id))),
            format!("Author: {}", user_mention(Some(message.author_id))),
            String::new(),
            "**Content:**".to_owned(),
            content_or_placeholder(&message.content),
        ]);

    with_attachments(notification, message)
}

pub fn message_edited(before: &MessageSnapshot, after_content: &str) -> LogNotification {
    LogNotification::new(COLOR_UPDATE)
        .author("Message Edited", before.author_avatar.clone())
        .description(&[
            "✏️ **Message Edited**".to_owned(),
            format!("Channel: {}", channel_mention(Some(before.channel_id))),
            format!("Author: {}", user_mention(Some(before.author_id))),
            String::new(),
            "**Before:**".to_owned(),
            content_or_placeholder(&before.content),
            String::new(),
            "**After:**".to_owned(),
            content_or_placeholder(after_content),
        ])
}

/// A delete for a message that was never recorded shows unknown author and content.
pub fn message_deleted(
    channel_id: u64,
    message_id: u64,
    cached: Option<&MessageSnapshot>,
) -> LogNotification {
    let (author, content) = match cached {
        Some(message) => (
            user_mention(Some(message.author_id)),
            content_or_placeholder(&message.content),
        ),
        None => ("Unknown".to_owned(), "*Unknown (message not cached)*".to_owned()),
    };

    let notification = LogNotification::new(COLOR_DELETE)
        .author(
            "Message Deleted",
            cached.and_then(|message| message.author_avatar.clone()),
        )
        .description(&[
            "🗑️ **Message Deleted**".to_owned(),
            format!("Channel: {}", channel_mention(Some(channel_id))),
            format!("Author: {author}"),
            format!("Message ID: `{message_id}`"),
            String::new(),
            "**Content:**".to_owned(),
            content,
        ]);

    match cached {
        Some(message) => with_attachments(notification, message),
        None => notification,
    }
}

pub fn channel_created(channel: &ChannelSnapshot, actor: Option<u64>) -> LogNotification {
    LogNotification::new(COLOR_CREATE)
        .author("Channel Created", None)
        .description(&[
            "📁 **New Channel Created**".to_owned(),
            format!("Channel: {}", channel_mention(Some(channel.channel_id))),
            format!("Name: `{}`", channel.name),
            format!("Type: `{}`", channel_type_label(channel.kind)),
            format!("Category: {}", channel_mention(channel.parent_id)),
            format!("Created by: {}", user_mention(actor)),
        ])
}

pub fn channel_deleted(channel: &ChannelSnapshot, actor: Option<u64>) -> LogNotification {
    LogNotification::new(COLOR_DELETE)
        .author("Channel Deleted", None)
        .description(&[
            "🗑️ **Channel Deleted**".to_owned(),
            format!("Name: `{}`", channel.name),
            format!("Type: `{}`", channel_type_label(channel.kind)),
            format!("Category: {}", channel_mention(channel.parent_id)),
            format!("Deleted by: {}", user_mention(actor)),
        ])
}

pub fn channel_updated(
    channel: &ChannelSnapshot,
    changes: &[ChannelChange],
    actor: Option<u64>,
) -> LogNotification {
    let mut lines = vec![
        "✏️ **Channel Updated**".to_owned(),
        format!("Channel: {}", channel_mention(Some(channel.channel_id))),
        String::new(),
        "**Changes:**".to_owned(),
    ];
    lines.extend(changes.iter().map(describe_channel_change));
    lines.push(String::new());
    lines.push(format!("Updated by: {}", user_mention(actor)));

    LogNotification::new(COLOR_UPDATE)
        .author("Channel Updated", None)
        .description(&lines)
}

fn describe_channel_change(change: &ChannelChange) -> String {
    match change {
        ChannelChange::Name { before, after } => format!("📋 Name: `{before}` → `{after}`"),
        ChannelChange::Topic { before, after } => format!(
            "📌 Topic: `{}` → `{}`",
            before.as_deref().unwrap_or("None"),
            after.as_deref().unwrap_or("None")
        ),
        ChannelChange::Category { before, after } => format!(
            "📁 Category: {} → {}",
            channel_mention(*before),
            channel_mention(*after)
        ),
        ChannelChange::Nsfw { before, after } => format!("🔞 NSFW: `{before}` → `{after}`"),
    }
}

pub fn role_added(user_id: u64, role_id: u64, actor: Option<u64>) -> LogNotification {
    role_change("➕ Role Added", COLOR_CREATE, user_id, role_id, actor)
}

pub fn role_removed(user_id: u64, role_id: u64, actor: Option<u64>) -> LogNotification {
    role_change("➖ Role Removed", COLOR_DELETE, user_id, role_id, actor)
}

fn role_change(
    title: &str,
    color: u32,
    user_id: u64,
    role_id: u64,
    actor: Option<u64>,
) -> LogNotification {
    let action_by = match actor {
        Some(_) => user_mention(actor),
        None => "System".to_owned(),
    };

    LogNotification::new(color).title(title).description(&[
        format!("**Role:** <@&{role_id}> ({role_id})"),
        format!("**Member:** <@{user_id}> ({user_id})"),
        format!("**Action By:** {action_by}"),
    ])
}

pub fn voice_activity(
    user_id: u64,
    avatar: Option<String>,
    activity: &VoiceActivity,
) -> LogNotification {
    let member = format!("**Member:** {}", user_mention(Some(user_id)));

    let (color, lines) = match activity {
        VoiceActivity::Joined { channel_id } => (
            COLOR_CREATE,
            vec![
                "👋 **Member Joined Voice**".to_owned(),
                member,
                format!("**Channel:** {}", channel_mention(Some(*channel_id))),
            ],
        ),
        VoiceActivity::Left { channel_id } => (
            COLOR_DELETE,
            vec![
                "🚶 **Member Left Voice**".to_owned(),
                member,
                format!("**Channel:** {}", channel_mention(Some(*channel_id))),
            ],
        ),
        VoiceActivity::Moved { from, to } => (
            COLOR_UPDATE,
            vec![
                "↔️ **Member Switched Channels**".to_owned(),
                member,
                format!("**From:** {}", channel_mention(Some(*from))),
                format!("**To:** {}", channel_mention(Some(*to))),
            ],
        ),
        VoiceActivity::StateChanged {
            channel_id,
            toggles,
        } => {
            let mut lines = vec![
                "⚙️ **Voice State Updated**".to_owned(),
                member,
                format!("**Channel:** {}", channel_mention(*channel_id)),
                String::new(),
            ];
            lines.extend(toggles.iter().map(|toggle| {
                let state = if toggle.enabled {
                    "🔇 Enabled"
                } else {
                    "🔊 Disabled"
                };
                format!("**{}:** {state}", toggle.flag.label())
            }));
            (COLOR_NEUTRAL, lines)
        }
    };

    LogNotification::new(color)
        .author("Voice Activity", avatar)
        .description(&lines)
}
