use anyhow::Context as _;
use chrono::Utc;
use tracing::{error, info, warn};

use crate::model::tickets::{
    GuildTickets, NewTicket, TicketMetadata, TicketRecord, TicketStatus, TicketUpdate,
};
use crate::storage::{Storage, list_guild_ids, read_json, write_json_pretty};

const RESTART_CLOSE_REASON: &str = "Bot restart";

async fn read_tickets(storage: &Storage, guild_id: u64) -> anyhow::Result<Option<GuildTickets>> {
    let Some(document) = read_json(&storage.tickets_path(guild_id)).await? else {
        return Ok(None);
    };

    let tickets = serde_json::from_value(document)
        .with_context(|| format!("ticket document for {guild_id} does not match the schema"))?;
    Ok(Some(tickets))
}

async fn write_tickets(
    storage: &Storage,
    guild_id: u64,
    tickets: &GuildTickets,
) -> anyhow::Result<()> {
    write_json_pretty(&storage.tickets_path(guild_id), tickets).await
}

/// Open a new ticket with the next sequential number for its guild.
pub async fn create_ticket(storage: &Storage, new: NewTicket<'_>) -> Option<TicketRecord> {
    let guild_id = new.guild_id;
    match try_create_ticket(storage, new).await {
        Ok(ticket) => {
            info!(
                guild_id,
                ticket_id = ticket.ticket_id,
                ticket_number = ticket.ticket_number,
                "ticket created"
            );
            Some(ticket)
        }
        Err(source) => {
            error!(?source, guild_id, "failed to create ticket");
            None
        }
    }
}

async fn try_create_ticket(storage: &Storage, new: NewTicket<'_>) -> anyhow::Result<TicketRecord> {
    let mut document = read_tickets(storage, new.guild_id)
        .await?
        .unwrap_or_default();

    let metadata = &mut document.metadata;
    metadata.total_tickets += 1;
    metadata.active_tickets += 1;
    metadata.last_ticket_id += 1;

    let ticket = TicketRecord {
        ticket_id: new.ticket_id,
        guild_id: new.guild_id,
        user_id: new.user_id,
        ticket_number: metadata.last_ticket_id,
        channel_name: new.channel_name.map(str::to_owned),
        status: TicketStatus::Open,
        created_at: Utc::now(),
        claimed_by: None,
        claimed_at: None,
        closed_at: None,
        close_reason: None,
        transcript_url: None,
        last_updated: None,
    };

    document.tickets.push(ticket.clone());
    write_tickets(storage, new.guild_id, &document).await?;

    Ok(ticket)
}

pub async fn get_ticket(storage: &Storage, guild_id: u64, ticket_id: u64) -> Option<TicketRecord> {
    match read_tickets(storage, guild_id).await {
        Ok(document) => document?.find(ticket_id).cloned(),
        Err(source) => {
            error!(?source, guild_id, ticket_id, "failed to read ticket");
            None
        }
    }
}

/// Apply `update` to a ticket and stamp `lastUpdated`.
///
/// Leaving the open/claimed states decrements `activeTickets` once; later
/// updates of an already inactive ticket never touch the counter. Returns
/// `false` when the guild or ticket does not exist.
pub async fn update_ticket(
    storage: &Storage,
    guild_id: u64,
    ticket_id: u64,
    update: TicketUpdate,
) -> bool {
    match try_update_ticket(storage, guild_id, ticket_id, update).await {
        Ok(updated) => updated,
        Err(source) => {
            error!(?source, guild_id, ticket_id, "failed to update ticket");
            false
        }
    }
}

async fn try_update_ticket(
    storage: &Storage,
    guild_id: u64,
    ticket_id: u64,
    update: TicketUpdate,
) -> anyhow::Result<bool> {
    let Some(mut document) = read_tickets(storage, guild_id).await? else {
        return Ok(false);
    };

    let Some(ticket) = document.find_mut(ticket_id) else {
        return Ok(false);
    };

    let was_active = ticket.status.is_active();
    update.apply_to(ticket);
    ticket.last_updated = Some(Utc::now());
    let left_active = was_active && !ticket.status.is_active();

    if left_active {
        let active = &mut document.metadata.active_tickets;
        *active = active.saturating_sub(1);
    }

    write_tickets(storage, guild_id, &document).await?;
    Ok(true)
}

/// Number of a user's tickets that are still open or claimed.
pub async fn get_user_open_tickets(storage: &Storage, guild_id: u64, user_id: u64) -> usize {
    match read_tickets(storage, guild_id).await {
        Ok(Some(document)) => document
            .tickets
            .iter()
            .filter(|ticket| ticket.user_id == user_id && ticket.status.is_active())
            .count(),
        Ok(None) => 0,
        Err(source) => {
            error!(?source, guild_id, user_id, "failed to count open tickets");
            0
        }
    }
}

/// Guild ticket counters; creates an empty document for a guild without one.
pub async fn get_guild_stats(storage: &Storage, guild_id: u64) -> TicketMetadata {
    let result = async {
        if let Some(document) = read_tickets(storage, guild_id).await? {
            return Ok(document.metadata);
        }

        write_tickets(storage, guild_id, &GuildTickets::default()).await?;
        anyhow::Ok(TicketMetadata::default())
    }
    .await;

    match result {
        Ok(metadata) => metadata,
        Err(source) => {
            error!(?source, guild_id, "failed to read ticket stats");
            TicketMetadata::default()
        }
    }
}

/// Startup recovery: every `open` ticket in every guild becomes
/// `force_closed` and each guild's `activeTickets` is zeroed.
///
/// A failing guild is logged and skipped; the result is `false` if any guild failed.
pub async fn reset_active_tickets(storage: &Storage) -> bool {
    let guild_ids = match list_guild_ids(storage.tickets_dir()).await {
        Ok(guild_ids) => guild_ids,
        Err(source) => {
            error!(?source, "failed to list ticket documents");
            return false;
        }
    };

    let mut all_ok = true;
    let mut force_closed = 0_usize;

    for guild_id in guild_ids {
        match reset_guild(storage, guild_id).await {
            Ok(closed) => force_closed += closed,
            Err(source) => {
                warn!(?source, guild_id, "failed to reset active tickets");
                all_ok = false;
            }
        }
    }

    info!(force_closed, "reset active tickets");
    all_ok
}

async fn reset_guild(storage: &Storage, guild_id: u64) -> anyhow::Result<usize> {
    let Some(mut document) = read_tickets(storage, guild_id).await? else {
        return Ok(0);
    };

    let now = Utc::now();
    let mut closed = 0;

    for ticket in document
        .tickets
        .iter_mut()
        .filter(|ticket| ticket.status == TicketStatus::Open)
    {
        ticket.status = TicketStatus::ForceClosed;
        ticket.closed_at = Some(now);
        ticket.close_reason = Some(RESTART_CLOSE_REASON.to_owned());
        closed += 1;
    }

    document.metadata.active_tickets = 0;
    write_tickets(storage, guild_id, &document).await?;

    Ok(closed)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::{
        create_ticket, get_guild_stats, get_ticket, get_user_open_tickets, reset_active_tickets,
        update_ticket,
    };
    use crate::cache::CacheService;
    use crate::model::tickets::{NewTicket, TicketMetadata, TicketStatus, TicketUpdate};
    use crate::storage::Storage;

    const GUILD: u64 = 900;
    const USER: u64 = 42;

    async fn storage(dir: &tempfile::TempDir) -> Storage {
        Storage::open(dir.path(), CacheService::disabled("test"))
            .await
            .unwrap()
    }

    fn new_ticket(guild_id: u64, ticket_id: u64, user_id: u64) -> NewTicket<'static> {
        NewTicket {
            ticket_id,
            guild_id,
            user_id,
            channel_name: Some("ticket-someone-1"),
        }
    }

    #[tokio::test]
    async fn tickets_are_numbered_sequentially() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage(&dir).await;

        let first = create_ticket(&storage, new_ticket(GUILD, 1, USER)).await.unwrap();
        let second = create_ticket(&storage, new_ticket(GUILD, 2, USER)).await.unwrap();

        assert_eq!((first.ticket_number, second.ticket_number), (1, 2));
        assert_eq!(first.status, TicketStatus::Open);
        assert_eq!(
            get_guild_stats(&storage, GUILD).await,
            TicketMetadata {
                total_tickets: 2,
                active_tickets: 2,
                last_ticket_id: 2,
            }
        );
        assert_eq!(get_ticket(&storage, GUILD, 2).await, Some(second));
        assert_eq!(get_ticket(&storage, GUILD, 3).await, None);
        assert_eq!(get_ticket(&storage, GUILD + 1, 1).await, None);
    }

    #[tokio::test]
    async fn claim_then_close_decrements_once() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage(&dir).await;
        create_ticket(&storage, new_ticket(GUILD, 1, USER)).await.unwrap();

        assert!(update_ticket(&storage, GUILD, 1, TicketUpdate::claim(7, Utc::now())).await);
        assert_eq!(get_guild_stats(&storage, GUILD).await.active_tickets, 1);

        assert!(update_ticket(&storage, GUILD, 1, TicketUpdate::close(Utc::now())).await);
        assert!(update_ticket(&storage, GUILD, 1, TicketUpdate::close(Utc::now())).await);

        let ticket = get_ticket(&storage, GUILD, 1).await.unwrap();
        assert_eq!(ticket.status, TicketStatus::Closed);
        assert_eq!(ticket.claimed_by, Some(7));
        assert!(ticket.closed_at.is_some());
        assert!(ticket.last_updated.is_some());
        assert_eq!(get_guild_stats(&storage, GUILD).await.active_tickets, 0);
    }

    #[tokio::test]
    async fn updating_missing_tickets_fails() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage(&dir).await;

        assert!(!update_ticket(&storage, GUILD, 1, TicketUpdate::close(Utc::now())).await);
        create_ticket(&storage, new_ticket(GUILD, 1, USER)).await.unwrap();
        assert!(!update_ticket(&storage, GUILD, 2, TicketUpdate::close(Utc::now())).await);
    }

    #[tokio::test]
    async fn open_ticket_count_per_user() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage(&dir).await;
        create_ticket(&storage, new_ticket(GUILD, 1, USER)).await.unwrap();
        create_ticket(&storage, new_ticket(GUILD, 2, USER)).await.unwrap();
        create_ticket(&storage, new_ticket(GUILD, 3, USER + 1)).await.unwrap();

        update_ticket(&storage, GUILD, 2, TicketUpdate::claim(7, Utc::now())).await;
        assert_eq!(get_user_open_tickets(&storage, GUILD, USER).await, 2);

        update_ticket(&storage, GUILD, 1, TicketUpdate::close(Utc::now())).await;
        assert_eq!(get_user_open_tickets(&storage, GUILD, USER).await, 1);
        assert_eq!(get_user_open_tickets(&storage, GUILD + 1, USER).await, 0);
    }

    #[tokio::test]
    async fn restart_force_closes_open_tickets_in_every_guild() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage(&dir).await;
        create_ticket(&storage, new_ticket(GUILD, 1, USER)).await.unwrap();
        create_ticket(&storage, new_ticket(GUILD, 2, USER)).await.unwrap();
        create_ticket(&storage, new_ticket(GUILD, 3, USER)).await.unwrap();
        create_ticket(&storage, new_ticket(GUILD + 1, 4, USER)).await.unwrap();
        update_ticket(&storage, GUILD, 2, TicketUpdate::claim(7, Utc::now())).await;
        update_ticket(&storage, GUILD, 3, TicketUpdate::close(Utc::now())).await;

        assert!(reset_active_tickets(&storage).await);

        let forced = get_ticket(&storage, GUILD, 1).await.unwrap();
        assert_eq!(forced.status, TicketStatus::ForceClosed);
        assert_eq!(forced.close_reason.as_deref(), Some("Bot restart"));
        assert!(forced.closed_at.is_some());

        assert_eq!(
            get_ticket(&storage, GUILD, 2).await.unwrap().status,
            TicketStatus::Claimed
        );
        assert_eq!(
            get_ticket(&storage, GUILD, 3).await.unwrap().status,
            TicketStatus::Closed
        );
        assert_eq!(
            get_ticket(&storage, GUILD + 1, 4).await.unwrap().status,
            TicketStatus::ForceClosed
        );
        assert_eq!(get_guild_stats(&storage, GUILD).await.active_tickets, 0);
        assert_eq!(get_guild_stats(&storage, GUILD).await.total_tickets, 3);
        assert_eq!(get_guild_stats(&storage, GUILD + 1).await.active_tickets, 0);
    }

    #[tokio::test]
    async fn stats_initialize_missing_documents() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage(&dir).await;

        assert_eq!(get_guild_stats(&storage, GUILD).await, TicketMetadata::default());
        assert!(storage.tickets_dir().join(format!("{GUILD}.json")).exists());
    }

    #[tokio::test]
    async fn snowflakes_are_stored_as_strings() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage(&dir).await;
        create_ticket(&storage, new_ticket(GUILD, 1_234_567_890_123_456_789, USER))
            .await
            .unwrap();

        let raw =
            std::fs::read_to_string(storage.tickets_dir().join(format!("{GUILD}.json"))).unwrap();
        assert!(raw.contains(r#""ticketId": "1234567890123456789""#));
        assert!(raw.contains(r#""status": "open""#));
    }

    #[tokio::test]
    async fn corrupt_document_yields_fallbacks() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage(&dir).await;
        std::fs::write(storage.tickets_dir().join(format!("{GUILD}.json")), "[oops").unwrap();

        assert!(create_ticket(&storage, new_ticket(GUILD, 1, USER)).await.is_none());
        assert_eq!(get_ticket(&storage, GUILD, 1).await, None);
        assert_eq!(get_user_open_tickets(&storage, GUILD, USER).await, 0);
        assert!(!reset_active_tickets(&storage).await);
    }
}
