//! Appearance values forwarded to the renderer.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Kind of transport surface fitted to a section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SurfaceType {
    /// Continuous belt.
    #[default]
    Belt,
    /// Driven rollers.
    Roller,
    /// Parallel straps.
    Strap,
}

impl SurfaceType {
    /// Color a freshly created surface of this type is painted with.
    #[must_use]
    pub const fn default_color(self) -> Color {
        match self {
            Self::Belt => Color::BLACK,
            Self::Roller | Self::Strap => Color::SILVER,
        }
    }
}

impl std::fmt::Display for SurfaceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Belt => write!(f, "Belt"),
            Self::Roller => write!(f, "Roller"),
            Self::Strap => write!(f, "Strap"),
        }
    }
}

/// 8-bit RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Color {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl Color {
    /// Opaque black.
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    /// Opaque silver.
    pub const SILVER: Self = Self::rgb(192, 192, 192);

    /// Creates an opaque color.
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }
}

impl Default for Color {
    fn default() -> Self {
        SurfaceType::default().default_color()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_surface_colors() {
        assert_eq!(SurfaceType::Belt.default_color(), Color::BLACK);
        assert_eq!(SurfaceType::Roller.default_color(), Color::SILVER);
        assert_eq!(SurfaceType::Strap.default_color(), Color::SILVER);
        assert_eq!(Color::default(), Color::BLACK);
    }

    #[test]
    fn test_surface_display() {
        assert_eq!(SurfaceType::Roller.to_string(), "Roller");
    }
}
