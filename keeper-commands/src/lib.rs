pub mod config;
pub mod moderation;
pub mod utility;

use keeper_core::{Data, Error};

pub struct CommandMeta {
    pub name: &'static str,
    pub desc: &'static str,
    pub category: &'static str,
    pub usage: &'static str,
}

pub const COMMANDS: &[CommandMeta] = &[
    utility::help::META,
    config::logsetup::META,
    config::ticketsetup::META,
    config::ticketstats::META,
    moderation::ban::META,
    moderation::unban::META,
    moderation::kick::META,
    moderation::timeout::META,
    moderation::untimeout::META,
];

pub fn commands() -> Vec<poise::Command<Data, Error>> {
    vec![
        utility::help::help(),
        config::logsetup::logsetup(),
        config::ticketsetup::ticketsetup(),
        config::ticketstats::ticketstats(),
        moderation::ban::ban(),
        moderation::unban::unban(),
        moderation::kick::kick(),
        moderation::timeout::timeout(),
        moderation::untimeout::untimeout(),
    ]
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::{COMMANDS, commands};

    #[test]
    fn every_registered_command_has_metadata() {
        let registered: HashSet<String> = commands().into_iter().map(|c| c.name).collect();
        let described: HashSet<String> = COMMANDS.iter().map(|c| c.name.to_owned()).collect();

        assert_eq!(registered, described);
    }
}
