pub mod help;

pub(crate) mod embeds;
