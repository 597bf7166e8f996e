use clicktui_core::config::ThemeConfig;
use ratatui::style::Color;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct Theme {
    pub primary_fg: Color,
    pub accent: Color,
    pub muted: Color,
    pub highlight: Color,
    pub on_accent: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary_fg: Color::White,
            accent: Color::Magenta,
            muted: Color::DarkGray,
            highlight: Color::LightMagenta,
            on_accent: Color::White,
        }
    }
}

impl Theme {
    /// Build the palette from config, keeping defaults for unparsable colours.
    pub fn from_config(config: &ThemeConfig) -> Self {
        let mut theme = Theme::default();
        let mut apply = |name: &str, value: &str, slot: &mut Color| match parse_hex_color(value) {
            Some(color) => *slot = color,
            None => warn!(name, value, "Ignoring invalid theme colour"),
        };
        apply("accent", &config.accent, &mut theme.accent);
        apply("muted", &config.muted, &mut theme.muted);
        apply("highlight", &config.highlight, &mut theme.highlight);
        theme.on_accent = contrast_color(&theme.accent, theme.on_accent);
        theme
    }
}

fn parse_hex_color(input: &str) -> Option<Color> {
    let trimmed = input.trim();
    let hex = trimmed.strip_prefix('#').unwrap_or(trimmed);
    match hex.len() {
        6 => {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            Some(Color::Rgb(r, g, b))
        }
        3 => {
            let r = u8::from_str_radix(&hex[0..1].repeat(2), 16).ok()?;
            let g = u8::from_str_radix(&hex[1..2].repeat(2), 16).ok()?;
            let b = u8::from_str_radix(&hex[2..3].repeat(2), 16).ok()?;
            Some(Color::Rgb(r, g, b))
        }
        _ => None,
    }
}

/// Black or white, whichever reads better on `color`.
fn contrast_color(color: &Color, fallback: Color) -> Color {
    match color {
        Color::Rgb(r, g, b) => {
            let luminance =
                0.299 * f64::from(*r) + 0.587 * f64::from(*g) + 0.114 * f64::from(*b);
            if luminance > 186.0 {
                Color::Black
            } else {
                Color::White
            }
        }
        _ => fallback,
    }
}
