use ::serenity::model::guild::audit_log::{Action, ChannelAction, MemberAction};

use crate::actor::recent_actor;
use crate::channel::diff_channel;
use crate::delivery::{deliver, resolve_destination, send};
use crate::dispatcher::HandlerContext;
use crate::event::TrackedEvent;
use crate::format;
use crate::kind::{EventKind, LogCategory};
use crate::outcome::{DeliveryOutcome, SkipReason};
use crate::registry::{EventHandler, HandlerFuture};
use crate::roles::diff_roles;
use crate::voice::classify_voice;

/// The handler set bound on every `init`.
pub(crate) fn bindings() -> [(EventKind, EventHandler); 8] {
    [
        (EventKind::MessageCreate, message_create as EventHandler),
        (EventKind::MessageUpdate, message_update as EventHandler),
        (EventKind::MessageDelete, message_delete as EventHandler),
        (EventKind::ChannelCreate, channel_create as EventHandler),
        (EventKind::ChannelUpdate, channel_update as EventHandler),
        (EventKind::ChannelDelete, channel_delete as EventHandler),
        (EventKind::MemberRoleUpdate, member_role_update as EventHandler),
        (EventKind::VoiceStateUpdate, voice_state_update as EventHandler),
    ]
}

fn unexpected(expected: EventKind, received: &TrackedEvent) -> DeliveryOutcome {
    DeliveryOutcome::Failed(anyhow::anyhow!(
        "{expected} handler received a {} event",
        received.kind()
    ))
}

fn message_create(cx: HandlerContext, event: TrackedEvent) -> HandlerFuture {
    Box::pin(async move {
        let message = match event {
            TrackedEvent::MessageCreate(message) => message,
            other => return unexpected(EventKind::MessageCreate, &other),
        };

        let Some(guild_id) = message.guild_id else {
            return SkipReason::NotInGuild.into();
        };

        if message.author_bot {
            return SkipReason::BotAuthor.into();
        }

        deliver(
            &cx,
            guild_id,
            LogCategory::Message,
            vec![format::message_created(&message)],
        )
        .await
    })
}

fn message_update(cx: HandlerContext, event: TrackedEvent) -> HandlerFuture {
    Box::pin(async move {
        let (guild_id, author_bot, before, content) = match event {
            TrackedEvent::MessageUpdate {
                guild_id,
                author_bot,
                before,
                content,
                ..
            } => (guild_id, author_bot, before, content),
            other => return unexpected(EventKind::MessageUpdate, &other),
        };

        let Some(guild_id) = guild_id else {
            return SkipReason::NotInGuild.into();
        };

        if author_bot == Some(true) || before.as_ref().is_some_and(|before| before.author_bot) {
            return SkipReason::BotAuthor.into();
        }

        let Some(before) = before else {
            return SkipReason::PriorVersionUnknown.into();
        };

        let Some(after) = content.filter(|after| *after != before.content) else {
            return SkipReason::NothingChanged.into();
        };

        deliver(
            &cx,
            guild_id,
            LogCategory::Message,
            vec![format::message_edited(&before, &after)],
        )
        .await
    })
}

fn message_delete(cx: HandlerContext, event: TrackedEvent) -> HandlerFuture {
    Box::pin(async move {
        let (guild_id, channel_id, message_id, cached) = match event {
            TrackedEvent::MessageDelete {
                guild_id,
                channel_id,
                message_id,
                cached,
            } => (guild_id, channel_id, message_id, cached),
            other => return unexpected(EventKind::MessageDelete, &other),
        };

        if cached.as_ref().is_some_and(|message| message.author_bot) {
            return SkipReason::BotAuthor.into();
        }

        deliver(
            &cx,
            guild_id,
            LogCategory::Message,
            vec![format::message_deleted(channel_id, message_id, cached.as_ref())],
        )
        .await
    })
}

fn channel_create(cx: HandlerContext, event: TrackedEvent) -> HandlerFuture {
    Box::pin(async move {
        let channel = match event {
            TrackedEvent::ChannelCreate(channel) => channel,
            other => return unexpected(EventKind::ChannelCreate, &other),
        };

        let destination = match resolve_destination(&cx, channel.guild_id, LogCategory::Channel).await {
            Ok(destination) => destination,
            Err(reason) => return reason.into(),
        };

        let actor = recent_actor(
            cx.http(),
            channel.guild_id,
            Action::Channel(ChannelAction::Create),
            channel.channel_id,
        )
        .await;

        send(&cx, destination, vec![format::channel_created(&channel, actor)]).await
    })
}

fn channel_update(cx: HandlerContext, event: TrackedEvent) -> HandlerFuture {
    Box::pin(async move {
        let (before, after) = match event {
            TrackedEvent::ChannelUpdate { before, after } => (before, after),
            other => return unexpected(EventKind::ChannelUpdate, &other),
        };

        let Some(before) = before else {
            return SkipReason::PriorVersionUnknown.into();
        };

        let changes = diff_channel(&before, &after);
        if changes.is_empty() {
            return SkipReason::NothingChanged.into();
        }

        let destination = match resolve_destination(&cx, after.guild_id, LogCategory::Channel).await {
            Ok(destination) => destination,
            Err(reason) => return reason.into(),
        };

        let actor = recent_actor(
            cx.http(),
            after.guild_id,
            Action::Channel(ChannelAction::Update),
            after.channel_id,
        )
        .await;

        send(
            &cx,
            destination,
            vec![format::channel_updated(&after, &changes, actor)],
        )
        .await
    })
}

fn channel_delete(cx: HandlerContext, event: TrackedEvent) -> HandlerFuture {
    Box::pin(async move {
        let channel = match event {
            TrackedEvent::ChannelDelete(channel) => channel,
            other => return unexpected(EventKind::ChannelDelete, &other),
        };

        let destination = match resolve_destination(&cx, channel.guild_id, LogCategory::Channel).await {
            Ok(destination) => destination,
            Err(reason) => return reason.into(),
        };

        let actor = recent_actor(
            cx.http(),
            channel.guild_id,
            Action::Channel(ChannelAction::Delete),
            channel.channel_id,
        )
        .await;

        send(&cx, destination, vec![format::channel_deleted(&channel, actor)]).await
    })
}

fn member_role_update(cx: HandlerContext, event: TrackedEvent) -> HandlerFuture {
    Box::pin(async move {
        let (guild_id, user_id, before, after) = match event {
            TrackedEvent::MemberRoleUpdate {
                guild_id,
                user_id,
                before,
                after,
            } => (guild_id, user_id, before, after),
            other => return unexpected(EventKind::MemberRoleUpdate, &other),
        };

        let Some(before) = before else {
            return SkipReason::PriorVersionUnknown.into();
        };

        let changes = diff_roles(&before, &after);
        if changes.is_empty() {
            return SkipReason::NothingChanged.into();
        }

        let destination = match resolve_destination(&cx, guild_id, LogCategory::Role).await {
            Ok(destination) => destination,
            Err(reason) => return reason.into(),
        };

        let actor = recent_actor(
            cx.http(),
            guild_id,
            Action::Member(MemberAction::RoleUpdate),
            user_id,
        )
        .await;

        let notifications = changes
            .added
            .iter()
            .map(|role_id| format::role_added(user_id, *role_id, actor))
            .chain(
                changes
                    .removed
                    .iter()
                    .map(|role_id| format::role_removed(user_id, *role_id, actor)),
            )
            .collect();

        send(&cx, destination, notifications).await
    })
}

fn voice_state_update(cx: HandlerContext, event: TrackedEvent) -> HandlerFuture {
    Box::pin(async move {
        let (guild_id, user_id, avatar, before, after) = match event {
            TrackedEvent::VoiceStateUpdate {
                guild_id,
                user_id,
                avatar,
                before,
                after,
            } => (guild_id, user_id, avatar, before, after),
            other => return unexpected(EventKind::VoiceStateUpdate, &other),
        };

        let Some(guild_id) = guild_id else {
            return SkipReason::NotInGuild.into();
        };

        let Some(activity) = classify_voice(before.as_ref(), &after) else {
            return SkipReason::NothingChanged.into();
        };

        deliver(
            &cx,
            guild_id,
            LogCategory::Voice,
            vec![format::voice_activity(user_id, avatar, &activity)],
        )
        .await
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;

    use poise::serenity_prelude as serenity;

    use keeper_storage::impls::guild_config::update_log_channels;
    use keeper_storage::model::guild_config::LogChannels;
    use keeper_storage::{CacheService, Storage};

    use super::{
        bindings, channel_update, member_role_update, message_create, message_delete,
        message_update, voice_state_update,
    };
    use crate::channel::ChannelSnapshot;
    use crate::dispatcher::{ClientHandle, HandlerContext};
    use crate::event::TrackedEvent;
    use crate::journal::MessageSnapshot;
    use crate::kind::{EventKind, LogCategory};
    use crate::outcome::{DeliveryOutcome, SkipReason};
    use crate::voice::VoiceSnapshot;

    const GUILD: u64 = 100;

    async fn context(dir: &tempfile::TempDir) -> HandlerContext {
        let storage = Storage::open(dir.path(), CacheService::memory("test"))
            .await
            .unwrap();
        let client = ClientHandle::new(
            Arc::new(serenity::Http::new("")),
            Arc::new(serenity::Cache::new()),
        );
        HandlerContext::new(storage, client)
    }

    fn skipped(outcome: DeliveryOutcome) -> SkipReason {
        match outcome {
            DeliveryOutcome::Skipped(reason) => reason,
            DeliveryOutcome::Sent => panic!("expected a skip, got a delivery"),
            DeliveryOutcome::Failed(error) => panic!("expected a skip, got {error:#}"),
        }
    }

    fn message(author_bot: bool, content: &str) -> MessageSnapshot {
        MessageSnapshot {
            message_id: 7,
            guild_id: Some(GUILD),
            channel_id: 8,
            author_id: 9,
            author_bot,
            author_avatar: None,
            content: content.to_owned(),
            attachments: Vec::new(),
        }
    }

    fn text_channel(name: &str) -> ChannelSnapshot {
        ChannelSnapshot {
            channel_id: 11,
            guild_id: GUILD,
            name: name.to_owned(),
            kind: serenity::ChannelType::Text,
            topic: None,
            parent_id: None,
            nsfw: false,
        }
    }

    #[test]
    fn every_kind_has_exactly_one_handler() {
        let kinds: HashSet<EventKind> = bindings().iter().map(|(kind, _)| *kind).collect();
        assert_eq!(kinds.len(), EventKind::ALL.len());
    }

    #[tokio::test]
    async fn bot_messages_are_never_logged() {
        let dir = tempfile::tempdir().unwrap();
        let cx = context(&dir).await;

        let created = message_create(cx.clone(), TrackedEvent::MessageCreate(message(true, "hi"))).await;
        assert_eq!(skipped(created), SkipReason::BotAuthor);

        let edited = message_update(
            cx.clone(),
            TrackedEvent::MessageUpdate {
                guild_id: Some(GUILD),
                message_id: 7,
                author_bot: Some(true),
                before: None,
                content: Some("edited".to_owned()),
            },
        )
        .await;
        assert_eq!(skipped(edited), SkipReason::BotAuthor);

        let deleted = message_delete(
            cx,
            TrackedEvent::MessageDelete {
                guild_id: GUILD,
                channel_id: 8,
                message_id: 7,
                cached: Some(message(true, "hi")),
            },
        )
        .await;
        assert_eq!(skipped(deleted), SkipReason::BotAuthor);
    }

    #[tokio::test]
    async fn edits_need_a_known_and_different_prior_version() {
        let dir = tempfile::tempdir().unwrap();
        let cx = context(&dir).await;

        let unknown = message_update(
            cx.clone(),
            TrackedEvent::MessageUpdate {
                guild_id: Some(GUILD),
                message_id: 7,
                author_bot: Some(false),
                before: None,
                content: Some("edited".to_owned()),
            },
        )
        .await;
        assert_eq!(skipped(unknown), SkipReason::PriorVersionUnknown);

        let same = message_update(
            cx.clone(),
            TrackedEvent::MessageUpdate {
                guild_id: Some(GUILD),
                message_id: 7,
                author_bot: None,
                before: Some(message(false, "hi")),
                content: Some("hi".to_owned()),
            },
        )
        .await;
        assert_eq!(skipped(same), SkipReason::NothingChanged);

        let direct = message_update(
            cx,
            TrackedEvent::MessageUpdate {
                guild_id: None,
                message_id: 7,
                author_bot: Some(false),
                before: Some(message(false, "hi")),
                content: Some("edited".to_owned()),
            },
        )
        .await;
        assert_eq!(skipped(direct), SkipReason::NotInGuild);
    }

    #[tokio::test]
    async fn unconfigured_guilds_have_no_destination() {
        let dir = tempfile::tempdir().unwrap();
        let cx = context(&dir).await;

        let created = message_create(cx.clone(), TrackedEvent::MessageCreate(message(false, "hi"))).await;
        assert_eq!(skipped(created), SkipReason::NoDestination(LogCategory::Message));

        let deleted = message_delete(
            cx.clone(),
            TrackedEvent::MessageDelete {
                guild_id: GUILD,
                channel_id: 8,
                message_id: 7,
                cached: None,
            },
        )
        .await;
        assert_eq!(skipped(deleted), SkipReason::NoDestination(LogCategory::Message));

        let roles = member_role_update(
            cx,
            TrackedEvent::MemberRoleUpdate {
                guild_id: GUILD,
                user_id: 9,
                before: Some(vec![1]),
                after: vec![1, 2],
            },
        )
        .await;
        assert_eq!(skipped(roles), SkipReason::NoDestination(LogCategory::Role));
    }

    #[tokio::test]
    async fn uncached_log_channel_is_reported_missing() {
        let dir = tempfile::tempdir().unwrap();
        let cx = context(&dir).await;

        let channels = LogChannels {
            message_log: Some(555),
            ..LogChannels::default()
        };
        assert!(update_log_channels(&cx.storage, GUILD, &channels).await);

        let created = message_create(cx, TrackedEvent::MessageCreate(message(false, "hi"))).await;
        assert_eq!(skipped(created), SkipReason::DestinationMissing(555));
    }

    #[tokio::test]
    async fn unchanged_state_is_not_logged() {
        let dir = tempfile::tempdir().unwrap();
        let cx = context(&dir).await;

        let channel = channel_update(
            cx.clone(),
            TrackedEvent::ChannelUpdate {
                before: Some(text_channel("general")),
                after: text_channel("general"),
            },
        )
        .await;
        assert_eq!(skipped(channel), SkipReason::NothingChanged);

        let uncached = channel_update(
            cx.clone(),
            TrackedEvent::ChannelUpdate {
                before: None,
                after: text_channel("general"),
            },
        )
        .await;
        assert_eq!(skipped(uncached), SkipReason::PriorVersionUnknown);

        let roles = member_role_update(
            cx.clone(),
            TrackedEvent::MemberRoleUpdate {
                guild_id: GUILD,
                user_id: 9,
                before: Some(vec![1, 2]),
                after: vec![2, 1],
            },
        )
        .await;
        assert_eq!(skipped(roles), SkipReason::NothingChanged);

        let in_call = VoiceSnapshot {
            channel_id: Some(12),
            ..VoiceSnapshot::default()
        };
        let voice = voice_state_update(
            cx,
            TrackedEvent::VoiceStateUpdate {
                guild_id: Some(GUILD),
                user_id: 9,
                avatar: None,
                before: Some(in_call),
                after: in_call,
            },
        )
        .await;
        assert_eq!(skipped(voice), SkipReason::NothingChanged);
    }
}
