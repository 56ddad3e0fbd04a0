pub mod guild_config;
pub mod tickets;
