use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    Open,
    Claimed,
    Closed,
    ForceClosed,
}

impl TicketStatus {
    /// Open and claimed tickets count towards `activeTickets`.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Open | Self::Claimed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Claimed => "claimed",
            Self::Closed => "closed",
            Self::ForceClosed => "force_closed",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketRecord {
    #[serde(with = "crate::snowflake")]
    pub ticket_id: u64,
    #[serde(with = "crate::snowflake")]
    pub guild_id: u64,
    #[serde(with = "crate::snowflake")]
    pub user_id: u64,
    pub ticket_number: u64,
    #[serde(default)]
    pub channel_name: Option<String>,
    pub status: TicketStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default, with = "crate::snowflake::option")]
    pub claimed_by: Option<u64>,
    #[serde(default)]
    pub claimed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub closed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub close_reason: Option<String>,
    #[serde(default)]
    pub transcript_url: Option<String>,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TicketMetadata {
    pub total_tickets: u64,
    pub active_tickets: u64,
    pub last_ticket_id: u64,
}

/// One guild's ticket document persisted under `tickets/<guild_id>.json`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuildTickets {
    pub tickets: Vec<TicketRecord>,
    pub metadata: TicketMetadata,
}

impl GuildTickets {
    pub fn find(&self, ticket_id: u64) -> Option<&TicketRecord> {
        self.tickets.iter().find(|ticket| ticket.ticket_id == ticket_id)
    }

    pub fn find_mut(&mut self, ticket_id: u64) -> Option<&mut TicketRecord> {
        self.tickets
            .iter_mut()
            .find(|ticket| ticket.ticket_id == ticket_id)
    }
}

pub struct NewTicket<'a> {
    pub ticket_id: u64,
    pub guild_id: u64,
    pub user_id: u64,
    pub channel_name: Option<&'a str>,
}

/// Field-level patch applied by `update_ticket`; `None` leaves a field unchanged.
#[derive(Clone, Debug, Default)]
pub struct TicketUpdate {
    pub status: Option<TicketStatus>,
    pub claimed_by: Option<u64>,
    pub claimed_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
    pub close_reason: Option<String>,
    pub transcript_url: Option<String>,
}

impl TicketUpdate {
    pub fn claim(user_id: u64, at: DateTime<Utc>) -> Self {
        Self {
            status: Some(TicketStatus::Claimed),
            claimed_by: Some(user_id),
            claimed_at: Some(at),
            ..Default::default()
        }
    }

    pub fn close(at: DateTime<Utc>) -> Self {
        Self {
            status: Some(TicketStatus::Closed),
            closed_at: Some(at),
            ..Default::default()
        }
    }

    pub(crate) fn apply_to(self, ticket: &mut TicketRecord) {
        if let Some(status) = self.status {
            ticket.status = status;
        }
        if let Some(claimed_by) = self.claimed_by {
            ticket.claimed_by = Some(claimed_by);
        }
        if let Some(claimed_at) = self.claimed_at {
            ticket.claimed_at = Some(claimed_at);
        }
        if let Some(closed_at) = self.closed_at {
            ticket.closed_at = Some(closed_at);
        }
        if let Some(close_reason) = self.close_reason {
            ticket.close_reason = Some(close_reason);
        }
        if let Some(transcript_url) = self.transcript_url {
            ticket.transcript_url = Some(transcript_url);
        }
    }
}
