//! Colors (spec §3): held in RGB, HSL, or HWB representation plus alpha,
//! convertible losslessly through a canonical RGB basis. Grounded on the
//! teacher's `colors.rs`, which wrapped the same `colors-transform` crate
//! for its RGB/HSL math and kept a `lazy_static` named-color table; here
//! the representation is generalized to remember which space the value was
//! authored in (so `hsl(...)` round-trips to `hsl(...)`, not `rgb(...)`)
//! and to carry alpha as a first-class field rather than bolted onto RGB.

use colors_transform::{AlphaColor, Color as _, Hsl, Rgb};
use lazy_static::lazy_static;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColorSpace {
    Rgb,
    Hsl,
    Hwb,
}

/// A color value. Internally always convertible to RGB; `space` only
/// influences which function-notation the serializer prefers when no
/// shorter representation (name/hex) is available.
#[derive(Debug, Clone, Copy)]
pub struct SassColor {
    pub red: f64,
    pub green: f64,
    pub blue: f64,
    pub alpha: f64,
    pub space: ColorSpace,
}

impl PartialEq for SassColor {
    fn eq(&self, other: &Self) -> bool {
        let close = |a: f64, b: f64| (a - b).abs() < 1e-6;
        close(self.red, other.red)
            && close(self.green, other.green)
            && close(self.blue, other.blue)
            && close(self.alpha, other.alpha)
    }
}

impl SassColor {
    pub fn rgb(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self {
            red: r.clamp(0.0, 255.0),
            green: g.clamp(0.0, 255.0),
            blue: b.clamp(0.0, 255.0),
            alpha: a.clamp(0.0, 1.0),
            space: ColorSpace::Rgb,
        }
    }

    pub fn hsl(h: f64, s: f64, l: f64, a: f64) -> Self {
        let hsl = Hsl::from(
            (h.rem_euclid(360.0)) as f32,
            s.clamp(0.0, 100.0) as f32,
            l.clamp(0.0, 100.0) as f32,
        );
        let rgb = hsl.to_rgb();
        Self {
            red: rgb.get_red() as f64,
            green: rgb.get_green() as f64,
            blue: rgb.get_blue() as f64,
            alpha: a.clamp(0.0, 1.0),
            space: ColorSpace::Hsl,
        }
    }

    /// HWB derived from the canonical RGB basis via HSL, since
    /// `colors-transform` has no native HWB support.
    pub fn hwb(h: f64, w: f64, b: f64, a: f64) -> Self {
        let w = w.clamp(0.0, 100.0) / 100.0;
        let b = b.clamp(0.0, 100.0) / 100.0;
        if w + b >= 1.0 {
            let gray = w / (w + b) * 255.0;
            return Self {
                red: gray,
                green: gray,
                blue: gray,
                alpha: a.clamp(0.0, 1.0),
                space: ColorSpace::Hwb,
            };
        }
        let rgb = Hsl::from(h.rem_euclid(360.0) as f32, 100.0, 50.0).to_rgb();
        let scale = |c: f32| (c as f64 / 255.0) * (1.0 - w - b) + w;
        Self {
            red: scale(rgb.get_red()) * 255.0,
            green: scale(rgb.get_green()) * 255.0,
            blue: scale(rgb.get_blue()) * 255.0,
            alpha: a.clamp(0.0, 1.0),
            space: ColorSpace::Hwb,
        }
    }

    pub fn to_hsl(self) -> (f64, f64, f64) {
        let rgb = Rgb::from(self.red as f32, self.green as f32, self.blue as f32);
        let hsl = rgb.to_hsl();
        (hsl.get_hue() as f64, hsl.get_saturation() as f64, hsl.get_lightness() as f64)
    }

    pub fn with_alpha(self, alpha: f64) -> Self {
        Self {
            alpha: alpha.clamp(0.0, 1.0),
            ..self
        }
    }

    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        let nibble = |c: char| c.to_digit(16).map(|d| d as f64);
        let chars: Vec<char> = hex.chars().collect();
        let pair = |hi: char, lo: char| Some(nibble(hi)? * 16.0 + nibble(lo)?);
        match chars.len() {
            3 => Some(Self::rgb(pair(chars[0], chars[0])?, pair(chars[1], chars[1])?, pair(chars[2], chars[2])?, 1.0)),
            4 => Some(Self::rgb(
                pair(chars[0], chars[0])?,
                pair(chars[1], chars[1])?,
                pair(chars[2], chars[2])?,
                pair(chars[3], chars[3])? / 255.0,
            )),
            6 => Some(Self::rgb(pair(chars[0], chars[1])?, pair(chars[2], chars[3])?, pair(chars[4], chars[5])?, 1.0)),
            8 => Some(Self::rgb(
                pair(chars[0], chars[1])?,
                pair(chars[2], chars[3])?,
                pair(chars[4], chars[5])?,
                pair(chars[6], chars[7])? / 255.0,
            )),
            _ => None,
        }
    }

    pub fn named(name: &str) -> Option<Self> {
        let lower = name.to_ascii_lowercase();
        if lower == "transparent" {
            return Some(Self::rgb(0.0, 0.0, 0.0, 0.0));
        }
        CSS_COLOR_NAMES
            .iter()
            .find(|entry| entry.name == lower)
            .and_then(|entry| Self::from_hex(entry.hex))
    }

    /// The shortest name for this exact RGBA value, if any.
    pub fn to_name(&self) -> Option<&'static str> {
        if self.alpha < 1.0 {
            return None;
        }
        let (r, g, b) = (self.red.round() as u8, self.green.round() as u8, self.blue.round() as u8);
        CSS_COLOR_NAMES.iter().find_map(|entry| {
            let c = Self::from_hex(entry.hex)?;
            if c.red.round() as u8 == r && c.green.round() as u8 == g && c.blue.round() as u8 == b {
                Some(entry.name)
            } else {
                None
            }
        })
    }
}

pub struct CssColorEntry {
    pub name: &'static str,
    pub hex: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a_three_digit_hex_code_duplicates_each_nibble() {
        let c = SassColor::from_hex("#abc").unwrap();
        let full = SassColor::from_hex("#aabbcc").unwrap();
        assert_eq!(c, full);
    }

    #[test]
    fn an_eight_digit_hex_code_carries_alpha_as_a_fraction_of_255() {
        let c = SassColor::from_hex("#ff000080").unwrap();
        assert_eq!(c.red, 255.0);
        assert!((c.alpha - (0x80 as f64 / 255.0)).abs() < 1e-9);
    }

    #[test]
    fn an_invalid_hex_length_is_rejected() {
        assert!(SassColor::from_hex("#abcde").is_none());
    }

    #[test]
    fn named_looks_up_a_css_keyword_case_insensitively() {
        let a = SassColor::named("Red").unwrap();
        let b = SassColor::named("red").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.red, 255.0);
    }

    #[test]
    fn transparent_is_black_with_zero_alpha() {
        let c = SassColor::named("transparent").unwrap();
        assert_eq!((c.red, c.green, c.blue, c.alpha), (0.0, 0.0, 0.0, 0.0));
    }

    #[test]
    fn to_name_only_matches_fully_opaque_colors() {
        let opaque = SassColor::rgb(255.0, 0.0, 0.0, 1.0);
        let translucent = SassColor::rgb(255.0, 0.0, 0.0, 0.5);
        assert_eq!(opaque.to_name(), Some("red"));
        assert_eq!(translucent.to_name(), None);
    }

    #[test]
    fn to_name_is_none_for_a_color_with_no_css_keyword() {
        let c = SassColor::rgb(18.0, 52.0, 86.0, 1.0);
        assert_eq!(c.to_name(), None);
    }
}

lazy_static! {
    pub static ref CSS_COLOR_NAMES: Vec<CssColorEntry> = vec![
        CssColorEntry { name: "black", hex: "#000000" },
        CssColorEntry { name: "silver", hex: "#c0c0c0" },
        CssColorEntry { name: "gray", hex: "#808080" },
        CssColorEntry { name: "white", hex: "#ffffff" },
        CssColorEntry { name: "maroon", hex: "#800000" },
        CssColorEntry { name: "red", hex: "#ff0000" },
        CssColorEntry { name: "purple", hex: "#800080" },
        CssColorEntry { name: "fuchsia", hex: "#ff00ff" },
        CssColorEntry { name: "green", hex: "#008000" },
        CssColorEntry { name: "lime", hex: "#00ff00" },
        CssColorEntry { name: "olive", hex: "#808000" },
        CssColorEntry { name: "yellow", hex: "#ffff00" },
        CssColorEntry { name: "navy", hex: "#000080" },
        CssColorEntry { name: "blue", hex: "#0000ff" },
        CssColorEntry { name: "teal", hex: "#008080" },
        CssColorEntry { name: "aqua", hex: "#00ffff" },
        CssColorEntry { name: "orange", hex: "#ffa500" },
        CssColorEntry { name: "aliceblue", hex: "#f0f8ff" },
        CssColorEntry { name: "antiquewhite", hex: "#faebd7" },
        CssColorEntry { name: "aquamarine", hex: "#7fffd4" },
        CssColorEntry { name: "azure", hex: "#f0ffff" },
        CssColorEntry { name: "beige", hex: "#f5f5dc" },
        CssColorEntry { name: "bisque", hex: "#ffe4c4" },
        CssColorEntry { name: "blanchedalmond", hex: "#ffebcd" },
        CssColorEntry { name: "blueviolet", hex: "#8a2be2" },
        CssColorEntry { name: "brown", hex: "#a52a2a" },
        CssColorEntry { name: "burlywood", hex: "#deb887" },
        CssColorEntry { name: "cadetblue", hex: "#5f9ea0" },
        CssColorEntry { name: "chartreuse", hex: "#7fff00" },
        CssColorEntry { name: "chocolate", hex: "#d2691e" },
        CssColorEntry { name: "coral", hex: "#ff7f50" },
        CssColorEntry { name: "cornflowerblue", hex: "#6495ed" },
        CssColorEntry { name: "cornsilk", hex: "#fff8dc" },
        CssColorEntry { name: "crimson", hex: "#dc143c" },
        CssColorEntry { name: "cyan", hex: "#00ffff" },
        CssColorEntry { name: "darkblue", hex: "#00008b" },
        CssColorEntry { name: "darkcyan", hex: "#008b8b" },
        CssColorEntry { name: "darkgoldenrod", hex: "#b8860b" },
        CssColorEntry { name: "darkgray", hex: "#a9a9a9" },
        CssColorEntry { name: "darkgreen", hex: "#006400" },
        CssColorEntry { name: "darkkhaki", hex: "#bdb76b" },
        CssColorEntry { name: "darkmagenta", hex: "#8b008b" },
        CssColorEntry { name: "darkolivegreen", hex: "#556b2f" },
        CssColorEntry { name: "darkorange", hex: "#ff8c00" },
        CssColorEntry { name: "darkorchid", hex: "#9932cc" },
        CssColorEntry { name: "darkred", hex: "#8b0000" },
        CssColorEntry { name: "darksalmon", hex: "#e9967a" },
        CssColorEntry { name: "darkseagreen", hex: "#8fbc8f" },
        CssColorEntry { name: "darkslateblue", hex: "#483d8b" },
        CssColorEntry { name: "darkslategray", hex: "#2f4f4f" },
        CssColorEntry { name: "darkturquoise", hex: "#00ced1" },
        CssColorEntry { name: "darkviolet", hex: "#9400d3" },
        CssColorEntry { name: "deeppink", hex: "#ff1493" },
        CssColorEntry { name: "deepskyblue", hex: "#00bfff" },
        CssColorEntry { name: "dimgray", hex: "#696969" },
        CssColorEntry { name: "dodgerblue", hex: "#1e90ff" },
        CssColorEntry { name: "firebrick", hex: "#b22222" },
        CssColorEntry { name: "floralwhite", hex: "#fffaf0" },
        CssColorEntry { name: "forestgreen", hex: "#228b22" },
        CssColorEntry { name: "gainsboro", hex: "#dcdcdc" },
        CssColorEntry { name: "ghostwhite", hex: "#f8f8ff" },
        CssColorEntry { name: "gold", hex: "#ffd700" },
        CssColorEntry { name: "goldenrod", hex: "#daa520" },
        CssColorEntry { name: "greenyellow", hex: "#adff2f" },
        CssColorEntry { name: "honeydew", hex: "#f0fff0" },
        CssColorEntry { name: "hotpink", hex: "#ff69b4" },
        CssColorEntry { name: "indianred", hex: "#cd5c5c" },
        CssColorEntry { name: "indigo", hex: "#4b0082" },
        CssColorEntry { name: "ivory", hex: "#fffff0" },
        CssColorEntry { name: "khaki", hex: "#f0e68c" },
        CssColorEntry { name: "lavender", hex: "#e6e6fa" },
        CssColorEntry { name: "lavenderblush", hex: "#fff0f5" },
        CssColorEntry { name: "lawngreen", hex: "#7cfc00" },
        CssColorEntry { name: "lemonchiffon", hex: "#fffacd" },
        CssColorEntry { name: "lightblue", hex: "#add8e6" },
        CssColorEntry { name: "lightcoral", hex: "#f08080" },
        CssColorEntry { name: "lightcyan", hex: "#e0ffff" },
        CssColorEntry { name: "lightgoldenrodyellow", hex: "#fafad2" },
        CssColorEntry { name: "lightgray", hex: "#d3d3d3" },
        CssColorEntry { name: "lightgreen", hex: "#90ee90" },
        CssColorEntry { name: "lightpink", hex: "#ffb6c1" },
        CssColorEntry { name: "lightsalmon", hex: "#ffa07a" },
        CssColorEntry { name: "lightseagreen", hex: "#20b2aa" },
        CssColorEntry { name: "lightskyblue", hex: "#87cefa" },
        CssColorEntry { name: "lightslategray", hex: "#778899" },
        CssColorEntry { name: "lightsteelblue", hex: "#b0c4de" },
        CssColorEntry { name: "lightyellow", hex: "#ffffe0" },
        CssColorEntry { name: "limegreen", hex: "#32cd32" },
        CssColorEntry { name: "linen", hex: "#faf0e6" },
        CssColorEntry { name: "magenta", hex: "#ff00ff" },
        CssColorEntry { name: "mediumaquamarine", hex: "#66cdaa" },
        CssColorEntry { name: "mediumblue", hex: "#0000cd" },
        CssColorEntry { name: "mediumorchid", hex: "#ba55d3" },
        CssColorEntry { name: "mediumpurple", hex: "#9370db" },
        CssColorEntry { name: "mediumseagreen", hex: "#3cb371" },
        CssColorEntry { name: "mediumslateblue", hex: "#7b68ee" },
        CssColorEntry { name: "mediumspringgreen", hex: "#00fa9a" },
        CssColorEntry { name: "mediumturquoise", hex: "#48d1cc" },
        CssColorEntry { name: "mediumvioletred", hex: "#c71585" },
        CssColorEntry { name: "midnightblue", hex: "#191970" },
        CssColorEntry { name: "mintcream", hex: "#f5fffa" },
        CssColorEntry { name: "mistyrose", hex: "#ffe4e1" },
        CssColorEntry { name: "moccasin", hex: "#ffe4b5" },
        CssColorEntry { name: "navajowhite", hex: "#ffdead" },
        CssColorEntry { name: "oldlace", hex: "#fdf5e6" },
        CssColorEntry { name: "olivedrab", hex: "#6b8e23" },
        CssColorEntry { name: "orangered", hex: "#ff4500" },
        CssColorEntry { name: "orchid", hex: "#da70d6" },
        CssColorEntry { name: "palegoldenrod", hex: "#eee8aa" },
        CssColorEntry { name: "palegreen", hex: "#98fb98" },
        CssColorEntry { name: "paleturquoise", hex: "#afeeee" },
        CssColorEntry { name: "palevioletred", hex: "#db7093" },
        CssColorEntry { name: "papayawhip", hex: "#ffefd5" },
        CssColorEntry { name: "peachpuff", hex: "#ffdab9" },
        CssColorEntry { name: "peru", hex: "#cd853f" },
        CssColorEntry { name: "pink", hex: "#ffc0cb" },
        CssColorEntry { name: "plum", hex: "#dda0dd" },
        CssColorEntry { name: "powderblue", hex: "#b0e0e6" },
        CssColorEntry { name: "rosybrown", hex: "#bc8f8f" },
        CssColorEntry { name: "royalblue", hex: "#4169e1" },
        CssColorEntry { name: "saddlebrown", hex: "#8b4513" },
        CssColorEntry { name: "salmon", hex: "#fa8072" },
        CssColorEntry { name: "sandybrown", hex: "#f4a460" },
        CssColorEntry { name: "seagreen", hex: "#2e8b57" },
        CssColorEntry { name: "seashell", hex: "#fff5ee" },
        CssColorEntry { name: "sienna", hex: "#a0522d" },
        CssColorEntry { name: "skyblue", hex: "#87ceeb" },
        CssColorEntry { name: "slateblue", hex: "#6a5acd" },
        CssColorEntry { name: "slategray", hex: "#708090" },
        CssColorEntry { name: "snow", hex: "#fffafa" },
        CssColorEntry { name: "springgreen", hex: "#00ff7f" },
        CssColorEntry { name: "steelblue", hex: "#4682b4" },
        CssColorEntry { name: "tan", hex: "#d2b48c" },
        CssColorEntry { name: "thistle", hex: "#d8bfd8" },
        CssColorEntry { name: "tomato", hex: "#ff6347" },
        CssColorEntry { name: "turquoise", hex: "#40e0d0" },
        CssColorEntry { name: "violet", hex: "#ee82ee" },
        CssColorEntry { name: "wheat", hex: "#f5deb3" },
        CssColorEntry { name: "whitesmoke", hex: "#f5f5f5" },
        CssColorEntry { name: "yellowgreen", hex: "#9acd32" },
        CssColorEntry { name: "rebeccapurple", hex: "#663399" },
    ];
}
