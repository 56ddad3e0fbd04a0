use crate::utility::embeds::{command_detail, grouped_help_description, unknown_category_message};
use crate::{COMMANDS, CommandMeta};
use keeper_core::{Context, Error};
use keeper_utils::embed::info_embed;

pub const META: CommandMeta = CommandMeta {
    name: "help",
    desc: "Lists out all available commands.",
    category: "utility",
    usage: "!help [category|command]",
};

#[poise::command(prefix_command, slash_command, category = "Utility")]
pub async fn help(
    ctx: Context<'_>,
    #[description = "Category or command name"] query: Option<String>,
) -> Result<(), Error> {
    let query = query.as_deref().map(str::trim).filter(|raw| !raw.is_empty());

    if let Some(name) = query
        && let Some(command) = COMMANDS.iter().find(|c| c.name.eq_ignore_ascii_case(name))
    {
        ctx.send(poise::CreateReply::default().embed(info_embed("Help", command_detail(command))))
            .await?;
        return Ok(());
    }

    let categories = categories();
    let category = query.map(str::to_ascii_lowercase);
    if let Some(wanted_category) = category.as_deref()
        && !categories.iter().any(|known| *known == wanted_category)
    {
        ctx.say(unknown_category_message(wanted_category, &categories))
            .await?;
        return Ok(());
    }

    let commands = sorted_commands(category.as_deref());
    ctx.send(poise::CreateReply::default().embed(info_embed(
        "Available Commands",
        grouped_help_description(&commands),
    )))
    .await?;

    Ok(())
}

fn categories() -> Vec<&'static str> {
    let mut categories: Vec<&str> = COMMANDS.iter().map(|c| c.category).collect();
    categories.sort_unstable();
    categories.dedup();
    categories
}

fn sorted_commands(category: Option<&str>) -> Vec<&'static CommandMeta> {
    let mut filtered: Vec<&'static CommandMeta> = COMMANDS
        .iter()
        .filter(|cmd| match category {
            Some(wanted) => cmd.category == wanted,
            None => true,
        })
        .collect();

    filtered.sort_unstable_by(|left, right| {
        left.category
            .cmp(right.category)
            .then_with(|| left.name.cmp(right.name))
    });

    filtered
}

#[cfg(test)]
mod tests {
    use super::{categories, sorted_commands};

    #[test]
    fn categories_are_unique_and_sorted() {
        assert_eq!(categories(), ["config", "moderation", "utility"]);
    }

    #[test]
    fn commands_sort_by_category_then_name() {
        let names: Vec<&str> = sorted_commands(Some("moderation"))
            .iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, ["ban", "kick", "timeout", "unban", "untimeout"]);
        assert_eq!(sorted_commands(None).len(), crate::COMMANDS.len());
    }
}
