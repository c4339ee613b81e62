//! Series colors
//!
//! Colors come from a named palette or as raw hex values. The `-1`
//! sentinel means "undefined": those series are assigned from the rotation
//! in render order.

use once_cell::sync::Lazy;
use serde::Serialize;

/// Named palette, in rotation order
static PALETTE: Lazy<Vec<(&'static str, &'static str)>> = Lazy::new(|| {
    vec![
        ("red", "#d5321e"),
        ("orange", "#e67e22"),
        ("yellow", "#f1c40f"),
        ("green", "#27ae60"),
        ("blue", "#2980b9"),
        ("purple", "#8e44ad"),
        ("cyan", "#17a2b8"),
        ("magenta", "#d63384"),
        ("brown", "#8b572a"),
        ("gray", "#7f8c8d"),
        ("black", "#000000"),
        ("white", "#ffffff"),
    ]
});

/// A series color
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Color {
    /// Not chosen by the author; assigned from the rotation at render time
    Undefined,
    /// A concrete hex color
    Hex(String),
}

impl Color {
    /// Parse an author-supplied color value
    ///
    /// Accepts `-1` (undefined), `#rgb`/`#rrggbb` hex, or a palette name
    /// (case-insensitive). Anything else is treated as undefined so a typo
    /// degrades to an assigned color instead of failing the chart.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed == "-1" || trimmed.is_empty() {
            return Self::Undefined;
        }
        if let Some(hex) = trimmed.strip_prefix('#') {
            if (hex.len() == 3 || hex.len() == 6) && hex.chars().all(|c| c.is_ascii_hexdigit()) {
                return Self::Hex(trimmed.to_ascii_lowercase());
            }
            tracing::debug!(value = trimmed, "unrecognized hex color, assigning from rotation");
            return Self::Undefined;
        }
        let lowered = trimmed.to_ascii_lowercase();
        match PALETTE.iter().find(|(name, _)| *name == lowered) {
            Some((_, hex)) => Self::Hex((*hex).to_string()),
            None => {
                tracing::debug!(value = trimmed, "unknown color name, assigning from rotation");
                Self::Undefined
            }
        }
    }

    /// Concrete hex for this color, pulling from the rotation when undefined
    #[must_use]
    pub fn resolve(&self, rotation_index: usize) -> String {
        match self {
            Self::Hex(hex) => hex.clone(),
            Self::Undefined => PALETTE[rotation_index % PALETTE.len()].1.to_string(),
        }
    }

    /// Whether the author left the color unspecified
    #[inline]
    #[must_use]
    pub fn is_undefined(&self) -> bool {
        matches!(self, Self::Undefined)
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::Undefined
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sentinel_as_undefined() {
        assert!(Color::parse("-1").is_undefined());
        assert!(Color::parse("").is_undefined());
    }

    #[test]
    fn parses_hex() {
        assert_eq!(Color::parse("#FF0000"), Color::Hex("#ff0000".to_string()));
        assert_eq!(Color::parse("#abc"), Color::Hex("#abc".to_string()));
    }

    #[test]
    fn rejects_malformed_hex() {
        assert!(Color::parse("#ff00").is_undefined());
        assert!(Color::parse("#gggggg").is_undefined());
    }

    #[test]
    fn parses_palette_names_case_insensitively() {
        assert_eq!(Color::parse("Green"), Color::Hex("#27ae60".to_string()));
    }

    #[test]
    fn unknown_name_is_undefined() {
        assert!(Color::parse("chartreuse-ish").is_undefined());
    }

    #[test]
    fn undefined_resolves_from_rotation() {
        let first = Color::Undefined.resolve(0);
        let second = Color::Undefined.resolve(1);
        assert_ne!(first, second);
        // rotation wraps
        assert_eq!(Color::Undefined.resolve(0), Color::Undefined.resolve(PALETTE.len()));
    }

    #[test]
    fn explicit_hex_ignores_rotation() {
        assert_eq!(Color::Hex("#123456".to_string()).resolve(5), "#123456");
    }
}
