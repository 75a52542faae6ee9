use chrono::Utc;
use poise::serenity_prelude::{Colour, CreateEmbed};

pub const COLOR_DEFAULT: Colour = Colour::BLURPLE;
pub const COLOR_SUCCESS: Colour = Colour(0xb8bb26);
pub const COLOR_ERROR: Colour = Colour(0xfb4934);

pub fn base_embed() -> CreateEmbed {
    CreateEmbed::default().timestamp(Utc::now()).color(COLOR_DEFAULT)
}

pub fn make_success_embed(text: &str) -> CreateEmbed {
    CreateEmbed::default().description(text).color(COLOR_SUCCESS)
}

pub fn make_error_embed(text: &str) -> CreateEmbed {
    CreateEmbed::default().description(text).color(COLOR_ERROR)
}
