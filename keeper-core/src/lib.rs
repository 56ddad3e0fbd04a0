use keeper_eventlog::EventLogDispatcher;
use keeper_storage::Storage;

pub type Error = anyhow::Error;

#[derive(Clone, Debug)]
pub struct Data {
    pub storage: Storage,
    pub event_log: EventLogDispatcher,
}

pub type Context<'a> = poise::Context<'a, Data, Error>;
