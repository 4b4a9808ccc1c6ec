/// Theme colors and color-string parsing
use nom::{
    branch::alt,
    bytes::complete::{tag_no_case, take_while_m_n},
    character::complete::{char, digit1, multispace0},
    combinator::{all_consuming, map_res},
    sequence::{delimited, preceded},
    IResult,
};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ThemeError {
    #[error("invalid color value: {0:?}")]
    InvalidColor(String),
}

/// An 8-bit sRGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(0xff, 0xff, 0xff);
    pub const BLACK: Rgb = Rgb::new(0x00, 0x00, 0x00);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Build from a packed `0xRRGGBB` value; the top byte is ignored.
    pub const fn from_hex_int(value: u32) -> Self {
        Self {
            r: ((value >> 16) & 0xff) as u8,
            g: ((value >> 8) & 0xff) as u8,
            b: (value & 0xff) as u8,
        }
    }

    pub fn to_hex_int(self) -> u32 {
        (self.r as u32) << 16 | (self.g as u32) << 8 | self.b as u32
    }

    pub fn to_hex_string(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Components scaled to `0.0..=1.0` (still sRGB encoded)
    pub fn to_unit_f32(self) -> [f32; 3] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
        ]
    }

    /// Brighten (positive) or darken (negative) every channel by `percent`.
    pub fn shade(self, percent: f32) -> Self {
        let scale = |c: u8| -> u8 {
            (c as f32 * (100.0 + percent) / 100.0)
                .round()
                .clamp(0.0, 255.0) as u8
        };
        Self::new(scale(self.r), scale(self.g), scale(self.b))
    }

    /// Linear blend towards `other`; `t = 0` keeps `self`.
    pub fn mix(self, other: Rgb, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        let lerp = |a: u8, b: u8| -> u8 { (a as f32 + (b as f32 - a as f32) * t).round() as u8 };
        Self::new(
            lerp(self.r, other.r),
            lerp(self.g, other.g),
            lerp(self.b, other.b),
        )
    }
}

fn is_hex(c: char) -> bool {
    c.is_ascii_hexdigit()
}

fn long_hex(input: &str) -> IResult<&str, Rgb> {
    map_res(take_while_m_n(6, 6, is_hex), |digits: &str| {
        u32::from_str_radix(digits, 16).map(Rgb::from_hex_int)
    })(input)
}

fn short_hex(input: &str) -> IResult<&str, Rgb> {
    map_res(take_while_m_n(3, 3, is_hex), |digits: &str| {
        let doubled: String = digits.chars().flat_map(|c| [c, c]).collect();
        u32::from_str_radix(&doubled, 16).map(Rgb::from_hex_int)
    })(input)
}

fn hex_color(input: &str) -> IResult<&str, Rgb> {
    preceded(char('#'), alt((long_hex, short_hex)))(input)
}

fn channel(input: &str) -> IResult<&str, u8> {
    delimited(
        multispace0,
        map_res(digit1, |digits: &str| digits.parse::<u8>()),
        multispace0,
    )(input)
}

fn rgb_function(input: &str) -> IResult<&str, Rgb> {
    let (input, _) = tag_no_case("rgb(")(input)?;
    let (input, r) = channel(input)?;
    let (input, _) = char(',')(input)?;
    let (input, g) = channel(input)?;
    let (input, _) = char(',')(input)?;
    let (input, b) = channel(input)?;
    let (input, _) = char(')')(input)?;
    Ok((input, Rgb::new(r, g, b)))
}

/// Parse `#rgb`, `#rrggbb` or `rgb(r, g, b)`.
pub fn parse_color(input: &str) -> Result<Rgb, ThemeError> {
    let trimmed = input.trim();
    all_consuming(alt((hex_color, rgb_function)))(trimmed)
        .map(|(_, color)| color)
        .map_err(|_| ThemeError::InvalidColor(trimmed.to_string()))
}

/// CSS custom property names read from the document root
pub const PROP_BACKGROUND: &str = "--bg";
pub const PROP_BASE: &str = "--bg-2";
pub const PROP_ACCENT: &str = "--accent";
pub const PROP_MUTED: &str = "--muted";

pub const THEME_PROPERTIES: [&str; 4] = [PROP_BACKGROUND, PROP_BASE, PROP_ACCENT, PROP_MUTED];

/// Colors the diagram is painted with
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Theme {
    pub background: Rgb,
    pub base: Rgb,
    pub muted: Rgb,
    pub accent: Rgb,
}

impl Theme {
    /// Look up each custom property and fall back to the built-in palette
    /// when a value is missing, blank or not a color.
    pub fn resolve<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let pick = |name: &str, fallback: Rgb| -> Rgb {
            let Some(raw) = lookup(name) else {
                return fallback;
            };
            let value = raw.trim();
            if value.is_empty() {
                return fallback;
            }
            match parse_color(value) {
                Ok(color) => color,
                Err(err) => {
                    log::warn!("{name}: {err}, using {}", fallback.to_hex_string());
                    fallback
                }
            }
        };

        Self {
            background: pick(PROP_BACKGROUND, defaults.background),
            base: pick(PROP_BASE, defaults.base),
            muted: pick(PROP_MUTED, defaults.muted),
            accent: pick(PROP_ACCENT, defaults.accent),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            background: Rgb::from_hex_int(0x0b233a),
            base: Rgb::from_hex_int(0x0f2940),
            muted: Rgb::from_hex_int(0xf2f2f2),
            accent: Rgb::from_hex_int(0xa82426),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_forms() {
        assert_eq!(parse_color("#a82426").unwrap(), Rgb::new(0xa8, 0x24, 0x26));
        assert_eq!(parse_color("  #FFF ").unwrap(), Rgb::WHITE);
        assert_eq!(parse_color("#0f2").unwrap(), Rgb::new(0x00, 0xff, 0x22));
        assert_eq!(parse_color("rgb(15, 41,64)").unwrap(), Rgb::new(15, 41, 64));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_color("").is_err());
        assert!(parse_color("#abcd").is_err());
        assert!(parse_color("navy").is_err());
        assert!(parse_color("rgb(256, 0, 0)").is_err());
    }

    #[test]
    fn test_hex_round_trip() {
        let color = Rgb::from_hex_int(0x0f2940);
        assert_eq!(color.to_hex_int(), 0x0f2940);
        assert_eq!(color.to_hex_string(), "#0f2940");
    }

    #[test]
    fn test_shade_clamps() {
        let color = Rgb::new(200, 100, 0);
        assert_eq!(color.shade(50.0), Rgb::new(255, 150, 0));
        assert_eq!(color.shade(-50.0), Rgb::new(100, 50, 0));
        assert_eq!(color.shade(-200.0), Rgb::BLACK);
    }

    #[test]
    fn test_resolve_falls_back() {
        let theme = Theme::resolve(|name| match name {
            PROP_ACCENT => Some(" #123456 ".to_string()),
            PROP_MUTED => Some("   ".to_string()),
            PROP_BASE => Some("not-a-color".to_string()),
            _ => None,
        });
        let defaults = Theme::default();
        assert_eq!(theme.accent, Rgb::from_hex_int(0x123456));
        assert_eq!(theme.muted, defaults.muted);
        assert_eq!(theme.base, defaults.base);
        assert_eq!(theme.background, defaults.background);
    }
}
