use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-guild configuration document persisted under `configs/<guild_id>.json`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GuildConfig {
    pub ticket_system: TicketSystemConfig,
    pub log_channels: LogChannels,
    pub statistics: Statistics,
    pub setup_complete: bool,
    pub last_updated: DateTime<Utc>,
}

impl Default for GuildConfig {
    fn default() -> Self {
        Self {
            ticket_system: TicketSystemConfig::default(),
            log_channels: LogChannels::default(),
            statistics: Statistics::default(),
            setup_complete: false,
            last_updated: Utc::now(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TicketSystemConfig {
    pub enabled: bool,
    pub channels: TicketChannels,
    pub roles: TicketRoles,
    pub settings: TicketSettings,
    pub messages: TicketMessages,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TicketChannels {
    #[serde(with = "crate::snowflake::option")]
    pub category: Option<u64>,
    #[serde(with = "crate::snowflake::option")]
    pub logs: Option<u64>,
    #[serde(with = "crate::snowflake::option")]
    pub transcript: Option<u64>,
    #[serde(with = "crate::snowflake::option")]
    pub ticket_panel: Option<u64>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TicketRoles {
    #[serde(with = "crate::snowflake::vec")]
    pub staff: Vec<u64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TicketSettings {
    pub embed_colors: EmbedColors,
    pub ticket_name_format: String,
    pub max_tickets_per_user: u32,
    /// Delay in milliseconds before a closed ticket channel is removed.
    pub delete_timeout: u64,
    pub transcript_enabled: bool,
}

impl Default for TicketSettings {
    fn default() -> Self {
        Self {
            embed_colors: EmbedColors::default(),
            ticket_name_format: "ticket-{username}-{count}".to_owned(),
            max_tickets_per_user: 1,
            delete_timeout: 5_000,
            transcript_enabled: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbedColors {
    pub main: String,
    pub claim: String,
    pub close: String,
}

impl Default for EmbedColors {
    fn default() -> Self {
        Self {
            main: "#2f3136".to_owned(),
            claim: "#3498db".to_owned(),
            close: "#e74c3c".to_owned(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TicketMessages {
    pub welcome: Option<String>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LogChannels {
    #[serde(with = "crate::snowflake::option")]
    pub role_log: Option<u64>,
    #[serde(with = "crate::snowflake::option")]
    pub channel_log: Option<u64>,
    #[serde(with = "crate::snowflake::option")]
    pub message_log: Option<u64>,
    #[serde(with = "crate::snowflake::option")]
    pub voice_log: Option<u64>,
    #[serde(with = "crate::snowflake::option")]
    pub moderation_log: Option<u64>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Statistics {
    pub total_tickets: u64,
    pub active_tickets: u64,
    pub last_ticket_id: u64,
    pub commands_used: u64,
}

/// Counters that can be bumped through the configuration store.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Statistic {
    TotalTickets,
    ActiveTickets,
    LastTicketId,
    CommandsUsed,
}

impl Statistics {
    pub fn counter_mut(&mut self, stat: Statistic) -> &mut u64 {
        match stat {
            Statistic::TotalTickets => &mut self.total_tickets,
            Statistic::ActiveTickets => &mut self.active_tickets,
            Statistic::LastTicketId => &mut self.last_ticket_id,
            Statistic::CommandsUsed => &mut self.commands_used,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{GuildConfig, Statistic};

    #[test]
    fn default_document_uses_camel_case_keys() {
        let value = serde_json::to_value(GuildConfig::default()).unwrap();

        assert_eq!(value["ticketSystem"]["enabled"], json!(false));
        assert_eq!(
            value["ticketSystem"]["settings"]["ticketNameFormat"],
            json!("ticket-{username}-{count}")
        );
        assert_eq!(value["ticketSystem"]["settings"]["embedColors"]["main"], json!("#2f3136"));
        assert_eq!(value["ticketSystem"]["messages"]["welcome"], json!(null));
        assert_eq!(value["logChannels"]["moderationLog"], json!(null));
        assert_eq!(value["statistics"]["commandsUsed"], json!(0));
        assert_eq!(value["setupComplete"], json!(false));
        assert!(value["lastUpdated"].is_string());
    }

    #[test]
    fn counters_are_addressed_by_statistic() {
        let mut config = GuildConfig::default();
        *config.statistics.counter_mut(Statistic::CommandsUsed) += 2;
        *config.statistics.counter_mut(Statistic::LastTicketId) += 1;

        assert_eq!(config.statistics.commands_used, 2);
        assert_eq!(config.statistics.last_ticket_id, 1);
        assert_eq!(config.statistics.total_tickets, 0);
    }
}
