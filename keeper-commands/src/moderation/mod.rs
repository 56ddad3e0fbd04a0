pub mod ban;
pub mod kick;
pub mod timeout;
pub mod unban;
pub mod untimeout;

pub(crate) mod embeds;
