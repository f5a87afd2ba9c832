//! Theme colors, optionally taken from the user's kitty.conf
//! (Omarchy keeps its current theme at ~/.config/omarchy/current/theme/kitty.conf)

use ratatui::style::Color;
use std::collections::HashMap;
use std::fs;

/// Theme colors for the UI
#[derive(Debug, Clone)]
pub struct Theme {
    pub accent: Color,       // Focused borders, key hints
    pub success: Color,      // Connected indicator, result value
    pub danger: Color,       // Disconnected indicator, error banner
    pub warning: Color,      // Pending states (checking, predicting)
    pub text: Color,         // Primary text (foreground)
    pub text_dim: Color,     // Placeholders, descriptions
    pub bg_selected: Color,  // Focused field background
    pub inactive: Color,     // Unfocused borders
    pub header: Color,       // Section headings
}

impl Default for Theme {
    fn default() -> Self {
        // Catppuccin-inspired fallback
        Self {
            accent: Color::Rgb(250, 179, 135),
            success: Color::Rgb(166, 218, 149),
            danger: Color::Rgb(243, 139, 168),
            warning: Color::Rgb(249, 226, 175),
            text: Color::Rgb(205, 214, 244),
            text_dim: Color::Rgb(147, 153, 178),
            bg_selected: Color::Rgb(69, 71, 90),
            inactive: Color::Rgb(88, 91, 112),
            header: Color::Rgb(137, 180, 250),
        }
    }
}

impl Theme {
    pub fn load() -> Self {
        dirs::home_dir()
            .map(|home| home.join(".config/omarchy/current/theme/kitty.conf"))
            .and_then(|path| fs::read_to_string(path).ok())
            .and_then(|content| Self::from_kitty_conf(&content))
            .unwrap_or_default()
    }

    /// Map kitty's palette onto our roles; `None` if the file holds no colors
    fn from_kitty_conf(content: &str) -> Option<Self> {
        let colors = Self::parse_kitty_conf(content);
        if colors.is_empty() {
            return None;
        }

        let fallback = Self::default();
        let pick = |keys: &[&str], default: Color| {
            keys.iter().find_map(|k| colors.get(*k).copied()).unwrap_or(default)
        };

        Some(Self {
            accent: pick(&["color2", "color10"], fallback.accent),
            success: pick(&["color10", "color2"], fallback.success),
            danger: pick(&["color1", "color9"], fallback.danger),
            warning: pick(&["color3", "color11"], fallback.warning),
            text: pick(&["foreground"], fallback.text),
            text_dim: pick(&["color8"], fallback.text_dim),
            bg_selected: pick(&["selection_background", "color0"], fallback.bg_selected),
            inactive: pick(&["inactive_border_color", "color8"], fallback.inactive),
            header: pick(&["color4", "color12"], fallback.header),
        })
    }

    /// Parse kitty.conf format: `key #hexcolor`
    fn parse_kitty_conf(content: &str) -> HashMap<String, Color> {
        content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .filter_map(|line| {
                let (key, value) = line.split_once(char::is_whitespace)?;
                Some((key.to_string(), Self::parse_hex_color(value)?))
            })
            .collect()
    }

    /// Parse a hex color string (#RRGGBB or #RGB)
    fn parse_hex_color(s: &str) -> Option<Color> {
        let s = s.trim().strip_prefix('#')?;
        let channel = |range: std::ops::Range<usize>| u8::from_str_radix(s.get(range)?, 16).ok();

        match s.len() {
            6 => Some(Color::Rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?)),
            3 => Some(Color::Rgb(channel(0..1)? * 17, channel(1..2)? * 17, channel(2..3)? * 17)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(Theme::parse_hex_color("#FFC107"), Some(Color::Rgb(255, 193, 7)));
        assert_eq!(Theme::parse_hex_color("#fff"), Some(Color::Rgb(255, 255, 255)));
        assert_eq!(Theme::parse_hex_color("FFC107"), None);
        assert_eq!(Theme::parse_hex_color("#12345"), None);
    }

    #[test]
    fn test_kitty_conf_mapping() {
        let conf = "# comment\nforeground #bebebe\ncolor1 #D35F5F\ncolor2 #FFC107\nfont_size 11\n";
        let theme = Theme::from_kitty_conf(conf).unwrap();
        assert_eq!(theme.text, Color::Rgb(190, 190, 190));
        assert_eq!(theme.danger, Color::Rgb(211, 95, 95));
        assert_eq!(theme.accent, Color::Rgb(255, 193, 7));
        assert_eq!(theme.header, Theme::default().header);

        assert!(Theme::from_kitty_conf("font_size 11\n").is_none());
    }
}
