//! Read-only view over an element's resolved style.

use crate::geometry::{Edges, Rect};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// CSS properties the collector records for every element
pub const COLLECTED_PROPERTIES: &[&str] = &[
    "display",
    "position",
    "visibility",
    "opacity",
    "content-visibility",
    "overflow-x",
    "overflow-y",
    "clip",
    "clip-path",
    "mask-image",
    "-webkit-mask-image",
    "text-overflow",
    "-webkit-line-clamp",
    "line-clamp",
    "white-space",
    "font-size",
    "float",
    "flex-direction",
    "max-width",
    "top",
    "left",
    "margin-top",
    "margin-right",
    "margin-bottom",
    "margin-left",
    "padding-top",
    "padding-right",
    "padding-bottom",
    "padding-left",
    "border-top-width",
    "border-right-width",
    "border-bottom-width",
    "border-left-width",
    "border-top-style",
    "border-right-style",
    "border-bottom-style",
    "border-left-style",
    "border-top-color",
    "border-right-color",
    "border-bottom-color",
    "border-left-color",
    "border-top-left-radius",
    "border-top-right-radius",
    "border-bottom-right-radius",
    "border-bottom-left-radius",
    "background-color",
    "background-image",
    "box-shadow",
    "pointer-events",
];

/// Value of `position`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    /// `static`
    Static,
    /// `relative`
    Relative,
    /// `absolute`
    Absolute,
    /// `fixed`
    Fixed,
    /// `sticky`
    Sticky,
}

impl Position {
    /// Absolute, fixed or sticky: out of normal flow for overlap purposes
    #[must_use]
    pub const fn is_out_of_flow(self) -> bool {
        matches!(self, Self::Absolute | Self::Fixed | Self::Sticky)
    }

    /// Absolute or fixed: starts a new layout root
    #[must_use]
    pub const fn is_layout_root(self) -> bool {
        matches!(self, Self::Absolute | Self::Fixed)
    }
}

/// Value of `overflow-x` / `overflow-y`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overflow {
    /// `visible`
    Visible,
    /// `hidden`
    Hidden,
    /// `clip`
    Clip,
    /// `scroll`
    Scroll,
    /// `auto`
    Auto,
}

impl Overflow {
    fn parse(value: &str) -> Self {
        match value {
            "hidden" => Self::Hidden,
            "clip" => Self::Clip,
            "scroll" => Self::Scroll,
            "auto" | "overlay" => Self::Auto,
            _ => Self::Visible,
        }
    }

    /// Content past the edge is cut off without a scroll affordance
    #[must_use]
    pub const fn clips(self) -> bool {
        matches!(self, Self::Hidden | Self::Clip)
    }
}

/// One corner of a box
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Corner {
    /// Top-left
    TopLeft,
    /// Top-right
    TopRight,
    /// Bottom-right
    BottomRight,
    /// Bottom-left
    BottomLeft,
}

impl Corner {
    /// All corners, clockwise from top-left
    pub const ALL: [Self; 4] = [
        Self::TopLeft,
        Self::TopRight,
        Self::BottomRight,
        Self::BottomLeft,
    ];

    /// Computed-style property holding this corner's radius
    #[must_use]
    pub const fn property(self) -> &'static str {
        match self {
            Self::TopLeft => "border-top-left-radius",
            Self::TopRight => "border-top-right-radius",
            Self::BottomRight => "border-bottom-right-radius",
            Self::BottomLeft => "border-bottom-left-radius",
        }
    }

    /// Human-readable label
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::TopLeft => "top-left",
            Self::TopRight => "top-right",
            Self::BottomRight => "bottom-right",
            Self::BottomLeft => "bottom-left",
        }
    }
}

/// Resolved style of one element, as returned by `getComputedStyle`.
///
/// Properties absent from the map read as their CSS initial value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComputedStyleView {
    properties: BTreeMap<String, String>,
}

impl ComputedStyleView {
    /// Create an empty view (every property at its initial value)
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a view from property/value pairs
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            properties: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Set a property, returning the previous value
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.properties.insert(name.into(), value.into())
    }

    /// Raw value of a property, falling back to its initial value
    #[must_use]
    pub fn get(&self, name: &str) -> &str {
        self.properties
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| initial_value(name))
    }

    /// Leading length of a property in px (0 when not a length)
    #[must_use]
    pub fn px(&self, name: &str) -> f64 {
        parse_px(self.get(name)).unwrap_or(0.0)
    }

    /// Length in px, `None` for keywords such as `auto`
    #[must_use]
    pub fn length(&self, name: &str) -> Option<f64> {
        parse_px(self.get(name))
    }

    /// `display`
    #[must_use]
    pub fn display(&self) -> &str {
        self.get("display")
    }

    /// `display: none`
    #[must_use]
    pub fn is_display_none(&self) -> bool {
        self.display() == "none"
    }

    /// Flex container
    #[must_use]
    pub fn is_flex(&self) -> bool {
        matches!(self.display(), "flex" | "inline-flex")
    }

    /// Grid container
    #[must_use]
    pub fn is_grid(&self) -> bool {
        matches!(self.display(), "grid" | "inline-grid")
    }

    /// `flex-direction` is a row (either direction)
    #[must_use]
    pub fn is_row_direction(&self) -> bool {
        matches!(self.get("flex-direction"), "row" | "row-reverse")
    }

    /// `position`
    #[must_use]
    pub fn position(&self) -> Position {
        match self.get("position") {
            "relative" => Position::Relative,
            "absolute" => Position::Absolute,
            "fixed" => Position::Fixed,
            "sticky" | "-webkit-sticky" => Position::Sticky,
            _ => Position::Static,
        }
    }

    /// `overflow-x`
    #[must_use]
    pub fn overflow_x(&self) -> Overflow {
        Overflow::parse(self.get("overflow-x"))
    }

    /// `overflow-y`
    #[must_use]
    pub fn overflow_y(&self) -> Overflow {
        Overflow::parse(self.get("overflow-y"))
    }

    /// Overflow clips on at least one axis
    #[must_use]
    pub fn clips_any_axis(&self) -> bool {
        self.overflow_x().clips() || self.overflow_y().clips()
    }

    /// `visibility: hidden | collapse`
    #[must_use]
    pub fn is_visibility_hidden(&self) -> bool {
        matches!(self.get("visibility"), "hidden" | "collapse")
    }

    /// `opacity` as a number
    #[must_use]
    pub fn opacity(&self) -> f64 {
        self.get("opacity").parse::<f64>().unwrap_or(1.0)
    }

    /// `font-size` in px
    #[must_use]
    pub fn font_size(&self) -> f64 {
        self.length("font-size").unwrap_or(16.0)
    }

    /// `text-overflow: ellipsis`
    #[must_use]
    pub fn has_ellipsis(&self) -> bool {
        self.get("text-overflow").contains("ellipsis")
    }

    /// Line clamping is in effect
    #[must_use]
    pub fn is_line_clamped(&self) -> bool {
        let active = |v: &str| !matches!(v, "" | "none" | "0");
        active(self.get("-webkit-line-clamp")) || active(self.get("line-clamp"))
    }

    /// `float` is not `none`
    #[must_use]
    pub fn is_floated(&self) -> bool {
        matches!(self.get("float"), "left" | "right" | "inline-start" | "inline-end")
    }

    /// `max-width` is set
    #[must_use]
    pub fn has_max_width(&self) -> bool {
        self.get("max-width") != "none"
    }

    /// `clip-path` is set
    #[must_use]
    pub fn has_clip_path(&self) -> bool {
        self.get("clip-path") != "none"
    }

    /// `mask-image` (or the prefixed form) is set
    #[must_use]
    pub fn has_mask_image(&self) -> bool {
        self.get("mask-image") != "none" || self.get("-webkit-mask-image") != "none"
    }

    /// `background-image` is set
    #[must_use]
    pub fn has_background_image(&self) -> bool {
        self.get("background-image") != "none"
    }

    /// `box-shadow` is set
    #[must_use]
    pub fn has_box_shadow(&self) -> bool {
        self.get("box-shadow") != "none"
    }

    /// `pointer-events: none`
    #[must_use]
    pub fn ignores_pointer(&self) -> bool {
        self.get("pointer-events") == "none"
    }

    /// Alpha channel of `background-color`
    #[must_use]
    pub fn background_alpha(&self) -> f64 {
        color_alpha(self.get("background-color"))
    }

    /// Any side draws a border
    #[must_use]
    pub fn has_visible_border(&self) -> bool {
        ["top", "right", "bottom", "left"].iter().any(|side| {
            self.px(&format!("border-{side}-width")) > 0.0
                && !matches!(
                    self.get(&format!("border-{side}-style")),
                    "none" | "hidden"
                )
                && color_alpha(self.get(&format!("border-{side}-color"))) > 0.0
        })
    }

    /// Paints something of its own: border, background colour, background
    /// image or shadow
    #[must_use]
    pub fn has_decoration(&self) -> bool {
        self.has_visible_border()
            || self.background_alpha() > 0.0
            || self.has_background_image()
            || self.has_box_shadow()
    }

    /// Border widths
    #[must_use]
    pub fn border_widths(&self) -> Edges {
        self.edges("border-", "-width")
    }

    /// Paddings
    #[must_use]
    pub fn paddings(&self) -> Edges {
        self.edges("padding-", "")
    }

    /// Margins
    #[must_use]
    pub fn margins(&self) -> Edges {
        self.edges("margin-", "")
    }

    fn edges(&self, prefix: &str, suffix: &str) -> Edges {
        let side = |s: &str| self.px(&format!("{prefix}{s}{suffix}"));
        Edges::new(side("top"), side("right"), side("bottom"), side("left"))
    }

    /// Radius of one corner in px, resolved against the border box.
    ///
    /// Elliptical radii use the smaller axis; the result never exceeds half
    /// the shorter side.
    #[must_use]
    pub fn corner_radius(&self, corner: Corner, rect: &Rect) -> f64 {
        let raw = self.get(corner.property());
        let mut parts = raw.split_whitespace();
        let resolve = |part: Option<&str>, basis: f64| -> Option<f64> {
            let part = part?;
            if let Some(pct) = part.strip_suffix('%') {
                pct.parse::<f64>().ok().map(|p| basis * p / 100.0)
            } else {
                parse_px(part)
            }
        };
        let horizontal = resolve(parts.next(), rect.width).unwrap_or(0.0);
        let vertical = resolve(parts.next(), rect.height).unwrap_or(horizontal);
        let radius = horizontal.min(vertical).max(0.0);
        radius.min(rect.width.min(rect.height) / 2.0)
    }

    /// Any corner is rounded
    #[must_use]
    pub fn has_rounded_corners(&self, rect: &Rect) -> bool {
        Corner::ALL
            .iter()
            .any(|c| self.corner_radius(*c, rect) > 0.0)
    }

    /// Legacy `clip: rect(...)` collapses the box to nothing
    #[must_use]
    pub fn legacy_clip_is_empty(&self) -> bool {
        static RECT: OnceLock<Option<Regex>> = OnceLock::new();
        let value = self.get("clip");
        let Some(re) = RECT
            .get_or_init(|| {
                Regex::new(
                    r"rect\(\s*([^,\s)]+)[,\s]+([^,\s)]+)[,\s]+([^,\s)]+)[,\s]+([^,\s)]+)\s*\)",
                )
                .ok()
            })
            .as_ref()
        else {
            return false;
        };
        let Some(caps) = re.captures(value) else {
            return false;
        };
        let num = |i: usize| caps.get(i).and_then(|m| parse_px(m.as_str()));
        match (num(1), num(2), num(3), num(4)) {
            (Some(top), Some(right), Some(bottom), Some(left)) => right <= left || bottom <= top,
            _ => false,
        }
    }

    /// `clip-path` is one of the "hide it" shapes: `inset(50%...)`,
    /// `inset(100%...)` or `circle(0...)`
    #[must_use]
    pub fn clip_path_hides(&self) -> bool {
        let value = self.get("clip-path").replace(' ', "");
        value.starts_with("inset(50%")
            || value.starts_with("inset(100%")
            || value.starts_with("circle(0)")
            || value.starts_with("circle(0px")
            || value.starts_with("circle(0%")
            || value.starts_with("circle(0at")
    }

    /// `content-visibility: hidden`
    #[must_use]
    pub fn is_content_hidden(&self) -> bool {
        self.get("content-visibility") == "hidden"
    }
}

/// Parse the leading number of a CSS length such as `12.5px`
#[must_use]
pub fn parse_px(value: &str) -> Option<f64> {
    let value = value.trim();
    let number = value.strip_suffix("px").unwrap_or(value);
    if number.is_empty() || number.ends_with('%') {
        return None;
    }
    number.parse::<f64>().ok()
}

/// Alpha channel of a CSS colour; unparseable colours count as opaque
#[must_use]
pub fn color_alpha(value: &str) -> f64 {
    match value.trim() {
        "" | "transparent" => 0.0,
        other => csscolorparser::parse(other).map_or(1.0, |c| f64::from(c.a)),
    }
}

fn initial_value(name: &str) -> &'static str {
    match name {
        "display" => "inline",
        "position" => "static",
        "visibility" => "visible",
        "opacity" => "1",
        "content-visibility" => "visible",
        "overflow-x" | "overflow-y" => "visible",
        "clip" | "pointer-events" => "auto",
        "max-width"
        | "float"
        | "clip-path"
        | "mask-image"
        | "-webkit-mask-image"
        | "background-image"
        | "box-shadow"
        | "-webkit-line-clamp"
        | "line-clamp" => "none",
        "text-overflow" => "clip",
        "white-space" => "normal",
        "font-size" => "16px",
        "flex-direction" => "row",
        "top" | "left" => "auto",
        "background-color" => "rgba(0, 0, 0, 0)",
        "border-top-style" | "border-right-style" | "border-bottom-style"
        | "border-left-style" => "none",
        "border-top-color" | "border-right-color" | "border-bottom-color"
        | "border-left-color" => "rgb(0, 0, 0)",
        _ => "0px",
    }
}
