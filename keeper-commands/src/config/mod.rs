pub mod logsetup;
pub mod ticketsetup;
pub mod ticketstats;
