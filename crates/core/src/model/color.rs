//! Color space and color value definitions.

use std::collections::HashMap;
use std::sync::LazyLock;

use rust_decimal::Decimal;

/// Represents a color space selected by `CS`/`cs` or implied by `G`/`RG`/`K`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PDFColorSpace {
    /// Family name of the color space (e.g., "DeviceRGB", "ICCBased")
    pub name: String,
    /// Number of color components an `SC`/`sc` operator must supply
    pub ncomponents: usize,
    /// Underlying space of an uncolored Pattern space
    pub base: Option<Box<PDFColorSpace>>,
    /// Resource name when the space came from the ColorSpace dictionary
    pub resource: Option<String>,
}

impl PDFColorSpace {
    /// Create a new color space.
    pub fn new(name: &str, ncomponents: usize) -> Self {
        Self {
            name: name.to_string(),
            ncomponents,
            base: None,
            resource: None,
        }
    }

    /// DeviceGray, the initial space of both stroke and fill.
    pub fn device_gray() -> Self {
        Self::new("DeviceGray", 1)
    }

    pub fn device_rgb() -> Self {
        Self::new("DeviceRGB", 3)
    }

    pub fn device_cmyk() -> Self {
        Self::new("DeviceCMYK", 4)
    }

    /// A Pattern space, optionally over an underlying space.
    pub fn pattern(base: Option<Self>) -> Self {
        Self {
            name: "Pattern".to_string(),
            ncomponents: 1,
            base: base.map(Box::new),
            resource: None,
        }
    }

    pub fn is_pattern(&self) -> bool {
        self.name == "Pattern"
    }

    /// Color a freshly selected space starts with.
    pub fn initial_color(&self) -> Color {
        match self.name.as_str() {
            "DeviceGray" | "CalGray" => Color::Gray(Decimal::ZERO),
            "DeviceRGB" | "CalRGB" => Color::Rgb(Decimal::ZERO, Decimal::ZERO, Decimal::ZERO),
            "DeviceCMYK" => Color::Cmyk(Decimal::ZERO, Decimal::ZERO, Decimal::ZERO, Decimal::ONE),
            "Separation" | "DeviceN" => Color::Components(vec![Decimal::ONE; self.ncomponents]),
            "Pattern" => Color::Components(Vec::new()),
            _ => Color::Components(vec![Decimal::ZERO; self.ncomponents]),
        }
    }

    /// Build a color value for this space from numeric components.
    ///
    /// The caller has already checked the component count.
    pub fn color_from(&self, components: Vec<Decimal>) -> Color {
        match (self.name.as_str(), components.as_slice()) {
            ("DeviceGray" | "CalGray", &[g]) => Color::Gray(g),
            ("DeviceRGB" | "CalRGB", &[r, g, b]) => Color::Rgb(r, g, b),
            ("DeviceCMYK", &[c, m, y, k]) => Color::Cmyk(c, m, y, k),
            _ => Color::Components(components),
        }
    }
}

impl Default for PDFColorSpace {
    fn default() -> Self {
        Self::device_gray()
    }
}

/// Predefined color space families and their component counts.
pub static PREDEFINED_COLORSPACE: LazyLock<HashMap<&'static str, PDFColorSpace>> =
    LazyLock::new(|| {
        let entries = [
            ("DeviceGray", 1),
            ("CalRGB", 3),
            ("CalGray", 1),
            ("Lab", 3),
            ("DeviceRGB", 3),
            ("DeviceCMYK", 4),
            ("Separation", 1),
            ("Indexed", 1),
            ("Pattern", 1),
        ];

        let mut map = HashMap::with_capacity(entries.len());
        for (name, n) in entries {
            map.insert(name, PDFColorSpace::new(name, n));
        }
        map
    });

/// Inline image color space abbreviations.
pub static INLINE_COLORSPACE_ABBREV: LazyLock<HashMap<&'static str, &'static str>> =
    LazyLock::new(|| {
        HashMap::from([
            ("G", "DeviceGray"),
            ("RGB", "DeviceRGB"),
            ("CMYK", "DeviceCMYK"),
            ("I", "Indexed"),
        ])
    });

/// Color value held by the graphics state.
#[derive(Debug, Clone, PartialEq)]
pub enum Color {
    /// Greyscale color (0 = black, 1 = white)
    Gray(Decimal),
    /// RGB color
    Rgb(Decimal, Decimal, Decimal),
    /// CMYK color
    Cmyk(Decimal, Decimal, Decimal, Decimal),
    /// Any other space (Lab, ICCBased, Indexed, Separation, DeviceN)
    Components(Vec<Decimal>),
    /// Colored tiling pattern (PaintType=1) - just the pattern name
    PatternColored(String),
    /// Uncolored tiling pattern (PaintType=2) - base components + pattern name
    PatternUncolored(Vec<Decimal>, String),
}

impl Default for Color {
    fn default() -> Self {
        Color::Gray(Decimal::ZERO)
    }
}

impl Color {
    /// Numeric components; pattern colors yield their base components.
    pub fn to_vec(&self) -> Vec<Decimal> {
        match self {
            Color::Gray(g) => vec![*g],
            Color::Rgb(r, g, b) => vec![*r, *g, *b],
            Color::Cmyk(c, m, y, k) => vec![*c, *m, *y, *k],
            Color::Components(v) => v.clone(),
            Color::PatternColored(_) => vec![],
            Color::PatternUncolored(base, _) => base.clone(),
        }
    }

    /// Get the pattern name if this is a pattern color.
    pub fn pattern_name(&self) -> Option<&str> {
        match self {
            Color::PatternColored(name) => Some(name),
            Color::PatternUncolored(_, name) => Some(name),
            _ => None,
        }
    }

    /// Check if this color is a pattern color.
    pub fn is_pattern(&self) -> bool {
        matches!(
            self,
            Color::PatternColored(_) | Color::PatternUncolored(_, _)
        )
    }
}
