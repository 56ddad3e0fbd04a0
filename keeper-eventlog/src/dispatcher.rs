use std::fmt;
use std::sync::Arc;

use poise::serenity_prelude as serenity;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use keeper_storage::Storage;
use keeper_storage::impls::guild_config::clear_guild_config_cache;

use crate::channel::ChannelSnapshot;
use crate::delivery::{resolve_destination, send};
use crate::event::TrackedEvent;
use crate::handlers;
use crate::journal::{AttachmentRef, MessageJournal, MessageSnapshot};
use crate::kind::LogCategory;
use crate::moderation::ModerationEntry;
use crate::outcome::{DeliveryOutcome, SkipReason, report};
use crate::registry::HandlerRegistry;
use crate::voice::VoiceSnapshot;

/// Gateway handles captured on `Ready`.
#[derive(Clone)]
pub struct ClientHandle {
    http: Arc<serenity::Http>,
    cache: Arc<serenity::Cache>,
}

impl ClientHandle {
    pub fn new(http: Arc<serenity::Http>, cache: Arc<serenity::Cache>) -> Self {
        Self { http, cache }
    }

    pub fn from_context(ctx: &serenity::Context) -> Self {
        Self::new(Arc::clone(&ctx.http), Arc::clone(&ctx.cache))
    }
}

impl fmt::Debug for ClientHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientHandle").finish_non_exhaustive()
    }
}

/// Everything a handler task needs, owned so the task can outlive the event.
#[derive(Clone, Debug)]
pub struct HandlerContext {
    pub(crate) storage: Storage,
    client: ClientHandle,
}

impl HandlerContext {
    pub(crate) fn new(storage: Storage, client: ClientHandle) -> Self {
        Self { storage, client }
    }

    pub(crate) fn http(&self) -> &serenity::Http {
        &self.client.http
    }

    pub(crate) fn cache(&self) -> &serenity::Cache {
        &self.client.cache
    }
}

#[derive(Debug, Default)]
struct DispatcherState {
    client: Option<ClientHandle>,
    registry: HandlerRegistry,
    generation: u64,
}

struct Inner {
    storage: Storage,
    state: RwLock<DispatcherState>,
    journal: Mutex<MessageJournal>,
}

/// Routes tracked platform events to their log handlers.
///
/// Starts uninitialized and ignores every event until `init` runs. Each
/// event is handled on its own task and its outcome is reported once.
#[derive(Clone)]
pub struct EventLogDispatcher {
    inner: Arc<Inner>,
}

impl fmt::Debug for EventLogDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventLogDispatcher")
            .field("storage", &self.inner.storage)
            .finish_non_exhaustive()
    }
}

impl EventLogDispatcher {
    pub fn new(storage: Storage, journal_capacity: usize) -> Self {
        Self {
            inner: Arc::new(Inner {
                storage,
                state: RwLock::new(DispatcherState::default()),
                journal: Mutex::new(MessageJournal::new(journal_capacity)),
            }),
        }
    }

    pub fn storage(&self) -> &Storage {
        &self.inner.storage
    }

    /// Capture the client and (re)bind every handler.
    ///
    /// Existing bindings are dropped first, so repeated calls (reconnects,
    /// additional `Ready` events) leave exactly one handler per event kind.
    pub async fn init(&self, client: ClientHandle) {
        let mut state = self.inner.state.write().await;

        let unbound = state.registry.unbind_all();
        state.registry.bind_all(handlers::bindings());
        state.client = Some(client);
        state.generation += 1;

        info!(
            generation = state.generation,
            unbound,
            bound = state.registry.len(),
            "event log dispatcher initialized"
        );
    }

    pub async fn is_initialized(&self) -> bool {
        self.inner.state.read().await.client.is_some()
    }

    pub async fn bound_handlers(&self) -> usize {
        self.inner.state.read().await.registry.len()
    }

    /// Feed a gateway event in. Untracked events are ignored.
    pub async fn handle(&self, event: &serenity::FullEvent) {
        let tracked = {
            let mut journal = self.inner.journal.lock().await;
            track(event, &mut journal)
        };

        for event in tracked {
            self.dispatch(event).await;
        }
    }

    /// Spawn the bound handler for `event`; no-op while uninitialized.
    pub async fn dispatch(&self, event: TrackedEvent) {
        let kind = event.kind();

        let (handler, cx) = {
            let state = self.inner.state.read().await;
            let Some(client) = state.client.clone() else {
                debug!(%kind, "event ignored; dispatcher not initialized");
                return;
            };
            let Some(handler) = state.registry.handler(kind) else {
                debug!(%kind, "event ignored; no handler bound");
                return;
            };

            (
                handler,
                HandlerContext::new(self.inner.storage.clone(), client),
            )
        };

        let guild_id = event.guild_id();
        tokio::spawn(async move {
            let outcome = handler(cx, event).await;
            report(kind.as_str(), guild_id, &outcome);
        });
    }

    /// Record a moderation action in the guild's moderation log (or the
    /// channel log when no moderation log is set). Fire-and-forget.
    pub async fn log_moderation(&self, guild_id: u64, entry: ModerationEntry) {
        let client = self.inner.state.read().await.client.clone();
        let Some(client) = client else {
            report(
                "moderation",
                Some(guild_id),
                &SkipReason::Uninitialized.into(),
            );
            return;
        };

        let cx = HandlerContext::new(self.inner.storage.clone(), client);

        tokio::spawn(async move {
            let outcome = match resolve_destination(&cx, guild_id, LogCategory::Moderation).await {
                Ok(channel_id) => send(&cx, channel_id, vec![entry.to_notification()]).await,
                Err(reason) => DeliveryOutcome::Skipped(reason),
            };
            report("moderation", Some(guild_id), &outcome);
        });
    }

    /// Drop cached configuration so the next event re-reads the log channels.
    pub async fn clear_cache(&self, guild_id: Option<u64>) {
        clear_guild_config_cache(&self.inner.storage, guild_id).await;
    }
}

/// Convert a gateway event into tracked events, keeping the message journal current.
fn track(event: &serenity::FullEvent, journal: &mut MessageJournal) -> Vec<TrackedEvent> {
    match event {
        serenity::FullEvent::Message { new_message } => {
            let snapshot = MessageSnapshot::from_message(new_message);
            if snapshot.guild_id.is_some() {
                journal.record(snapshot.clone());
            }
            vec![TrackedEvent::MessageCreate(snapshot)]
        }
        serenity::FullEvent::MessageUpdate { event, .. } => {
            let attachments = event.attachments.as_ref().map(|attachments| {
                attachments
                    .iter()
                    .map(|attachment| AttachmentRef {
                        filename: attachment.filename.clone(),
                        url: attachment.url.clone(),
                    })
                    .collect()
            });
            let before = journal.apply_edit(event.id.get(), event.content.as_deref(), attachments);

            vec![TrackedEvent::MessageUpdate {
                guild_id: event.guild_id.map(|id| id.get()),
                message_id: event.id.get(),
                author_bot: event.author.as_ref().map(|author| author.bot),
                before,
                content: event.content.clone(),
            }]
        }
        serenity::FullEvent::MessageDelete {
            channel_id,
            deleted_message_id,
            guild_id: Some(guild_id),
            ..
        } => vec![deleted(journal, guild_id.get(), channel_id.get(), deleted_message_id.get())],
        serenity::FullEvent::MessageDeleteBulk {
            channel_id,
            multiple_deleted_messages_ids,
            guild_id: Some(guild_id),
            ..
        } => multiple_deleted_messages_ids
            .iter()
            .map(|message_id| deleted(journal, guild_id.get(), channel_id.get(), message_id.get()))
            .collect(),
        serenity::FullEvent::ChannelCreate { channel, .. } => {
            vec![TrackedEvent::ChannelCreate(ChannelSnapshot::from_channel(channel))]
        }
        serenity::FullEvent::ChannelUpdate { old, new, .. } => vec![TrackedEvent::ChannelUpdate {
            before: old.as_ref().map(ChannelSnapshot::from_channel),
            after: ChannelSnapshot::from_channel(new),
        }],
        serenity::FullEvent::ChannelDelete { channel, .. } => {
            vec![TrackedEvent::ChannelDelete(ChannelSnapshot::from_channel(channel))]
        }
        serenity::FullEvent::GuildMemberUpdate {
            old_if_available,
            event,
            ..
        } => vec![TrackedEvent::MemberRoleUpdate {
            guild_id: event.guild_id.get(),
            user_id: event.user.id.get(),
            before: old_if_available
                .as_ref()
                .map(|member| member.roles.iter().map(|role| role.get()).collect()),
            after: event.roles.iter().map(|role| role.get()).collect(),
        }],
        serenity::FullEvent::VoiceStateUpdate { old, new, .. } => {
            vec![TrackedEvent::VoiceStateUpdate {
                guild_id: new.guild_id.map(|id| id.get()),
                user_id: new.user_id.get(),
                avatar: new.member.as_ref().map(|member| member.user.face()),
                before: old.as_ref().map(VoiceSnapshot::from_state),
                after: VoiceSnapshot::from_state(new),
            }]
        }
        _ => Vec::new(),
    }
}

fn deleted(
    journal: &mut MessageJournal,
    guild_id: u64,
    channel_id: u64,
    message_id: u64,
) -> TrackedEvent {
    TrackedEvent::MessageDelete {
        guild_id,
        channel_id,
        message_id,
        cached: journal.remove(message_id),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use poise::serenity_prelude as serenity;

    use keeper_storage::{CacheService, Storage};

    use super::{ClientHandle, EventLogDispatcher, track};
    use crate::event::TrackedEvent;
    use crate::journal::MessageJournal;
    use crate::kind::EventKind;
    use crate::voice::VoiceSnapshot;

    async fn dispatcher(dir: &tempfile::TempDir) -> EventLogDispatcher {
        let storage = Storage::open(dir.path(), CacheService::memory("test"))
            .await
            .unwrap();
        EventLogDispatcher::new(storage, 16)
    }

    fn client() -> ClientHandle {
        ClientHandle::new(
            Arc::new(serenity::Http::new("")),
            Arc::new(serenity::Cache::new()),
        )
    }

    #[tokio::test]
    async fn starts_uninitialized_and_ignores_events() {
        let dir = tempfile::tempdir().unwrap();
        let dispatcher = dispatcher(&dir).await;

        assert!(!dispatcher.is_initialized().await);
        assert_eq!(dispatcher.bound_handlers().await, 0);

        dispatcher
            .dispatch(TrackedEvent::VoiceStateUpdate {
                guild_id: Some(1),
                user_id: 2,
                avatar: None,
                before: None,
                after: VoiceSnapshot::default(),
            })
            .await;
        assert!(dispatcher.storage().configs_dir().read_dir().unwrap().next().is_none());
    }

    #[tokio::test]
    async fn repeated_init_keeps_one_binding_per_kind() {
        let dir = tempfile::tempdir().unwrap();
        let dispatcher = dispatcher(&dir).await;

        dispatcher.init(client()).await;
        dispatcher.init(client()).await;

        assert!(dispatcher.is_initialized().await);
        assert_eq!(dispatcher.bound_handlers().await, EventKind::ALL.len());
    }

    #[tokio::test]
    async fn clones_share_state() {
        let dir = tempfile::tempdir().unwrap();
        let dispatcher = dispatcher(&dir).await;
        let clone = dispatcher.clone();

        dispatcher.init(client()).await;
        assert!(clone.is_initialized().await);
    }

    fn guild_message(id: u64, content: &str) -> serenity::Message {
        let mut message = serenity::Message::default();
        message.id = serenity::MessageId::new(id);
        message.channel_id = serenity::ChannelId::new(20);
        message.guild_id = Some(serenity::GuildId::new(30));
        message.content = content.to_owned();
        message
    }

    #[test]
    fn journal_carries_edits_into_bulk_deletes() {
        let mut journal = MessageJournal::new(16);

        let created = track(
            &serenity::FullEvent::Message {
                new_message: guild_message(7, "before"),
            },
            &mut journal,
        );
        assert!(matches!(&created[..], [TrackedEvent::MessageCreate(_)]));
        assert_eq!(journal.len(), 1);

        let edit: serenity::MessageUpdateEvent = serde_json::from_value(serde_json::json!({
            "id": "7",
            "channel_id": "20",
            "guild_id": "30",
            "content": "after",
        }))
        .unwrap();
        let edited = track(
            &serenity::FullEvent::MessageUpdate {
                old_if_available: None,
                new: None,
                event: edit,
            },
            &mut journal,
        );
        match &edited[..] {
            [TrackedEvent::MessageUpdate { before, content, .. }] => {
                assert_eq!(before.as_ref().map(|m| m.content.as_str()), Some("before"));
                assert_eq!(content.as_deref(), Some("after"));
            }
            other => panic!("unexpected events {other:?}"),
        }

        let deleted = track(
            &serenity::FullEvent::MessageDeleteBulk {
                channel_id: serenity::ChannelId::new(20),
                multiple_deleted_messages_ids: vec![
                    serenity::MessageId::new(7),
                    serenity::MessageId::new(8),
                ],
                guild_id: Some(serenity::GuildId::new(30)),
            },
            &mut journal,
        );
        match &deleted[..] {
            [
                TrackedEvent::MessageDelete {
                    message_id: 7,
                    cached: Some(cached),
                    ..
                },
                TrackedEvent::MessageDelete {
                    message_id: 8,
                    cached: None,
                    ..
                },
            ] => assert_eq!(cached.content, "after"),
            other => panic!("unexpected events {other:?}"),
        }
        assert!(journal.is_empty());
    }

    #[test]
    fn direct_messages_are_not_journaled() {
        let mut journal = MessageJournal::new(16);
        let mut message = guild_message(7, "hi");
        message.guild_id = None;

        let tracked = track(&serenity::FullEvent::Message { new_message: message }, &mut journal);

        assert_eq!(tracked.len(), 1);
        assert!(journal.is_empty());
    }
}
