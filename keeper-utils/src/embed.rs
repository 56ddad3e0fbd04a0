use poise::serenity_prelude as serenity;

use crate::parse::parse_hex_color;

/// Default embed color used across the bot UI.
pub const DEFAULT_EMBED_COLOR: u32 = 0x90_55_30;
pub const SUCCESS_EMBED_COLOR: u32 = 0x43_B5_81;
pub const ERROR_EMBED_COLOR: u32 = 0xF0_47_47;

/// Resolve a configured `#rrggbb` colour, falling back to the default.
pub fn configured_color(raw: &str) -> u32 {
    parse_hex_color(raw).unwrap_or(DEFAULT_EMBED_COLOR)
}

pub fn info_embed(title: impl Into<String>, description: impl Into<String>) -> serenity::CreateEmbed {
    serenity::CreateEmbed::new()
        .title(title)
        .description(description)
        .color(DEFAULT_EMBED_COLOR)
}

pub fn success_embed(
    title: impl Into<String>,
    description: impl Into<String>,
) -> serenity::CreateEmbed {
    info_embed(title, description).color(SUCCESS_EMBED_COLOR)
}

pub fn error_embed(title: impl Into<String>, description: impl Into<String>) -> serenity::CreateEmbed {
    info_embed(title, description).color(ERROR_EMBED_COLOR)
}

#[cfg(test)]
mod tests {
    use super::{DEFAULT_EMBED_COLOR, configured_color};

    #[test]
    fn configured_colors_fall_back_to_default() {
        assert_eq!(configured_color("#2f3136"), 0x2f_31_36);
        assert_eq!(configured_color("blurple"), DEFAULT_EMBED_COLOR);
    }
}
