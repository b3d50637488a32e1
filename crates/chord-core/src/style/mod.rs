//! Style synthesis: from the set of keys in a chord to a drawing style.
//!
//! The synthesizer walks an ordered rule table.  Each rule has a condition
//! on the key set and an update to the style being built; later rules
//! overwrite fields set by earlier ones, so the order of [`RULES`] *is* the
//! override precedence:
//!
//! | # | Rule               | When                          | Effect                                   |
//! |---|--------------------|-------------------------------|------------------------------------------|
//! | 1 | `outline`          | any of `s a d g h x e`        | black stroke, base width, no markers/dash |
//! | 2 | `no-outline`       | none of `s a d g h x e`       | `stroke: none`                           |
//! | 3 | `thick`            | `g`                           | width = thick                            |
//! | 4 | `very-thick`       | `h`                           | width = very thick (beats `g`)           |
//! | 5 | `arrow-end`        | `a`                           | arrow at the end                         |
//! | 6 | `arrow-both`       | `x`                           | arrows at both ends                      |
//! | 7 | `dashed`           | `d`                           | dash `width,2u`                          |
//! | 8 | `dotted`           | `e`                           | dash `3u,3u` (beats `d`)                 |
//! | 9 | `light-fill`       | `f`                           | black fill at 12% opacity                |
//! |10 | `solid-fill`       | `b`                           | opaque black fill (beats `f`)            |
//! |11 | `white-fill`       | `w`                           | opaque white fill (beats `f`, `b`)       |
//! |12 | `fill-clears-markers` | any of `f b w`             | no markers                               |
//! |13 | `no-fill`          | none of `f b w`               | `fill: none`, opacity 1                  |
//!
//! A style with neither stroke nor fill is degenerate and yields `None`:
//! there is nothing to paste.
//!
//! Note that the key labelled `w` (white fill) has nothing to do with the
//! stroke width; the width being built is tracked as
//! `StyleDraft::stroke_width`.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::trace;

pub mod svg;

/// Keys that turn on the outline (stroke).
pub const OUTLINE_KEYS: &[&str] = &["s", "a", "d", "g", "h", "x", "e"];
/// Keys that turn on a fill.
pub const FILL_KEYS: &[&str] = &["f", "b", "w"];

const LIGHT_FILL_OPACITY: f64 = 0.12;

/// Error returned by [`StyleMetrics::validate`].
#[derive(Debug, Error, PartialEq)]
pub enum StyleError {
    #[error("{field} must be a finite positive number, got {value}")]
    InvalidMetric { field: &'static str, value: f64 },
}

// ── Metrics ───────────────────────────────────────────────────────────────────

/// Stroke widths and dash lengths, expressed in points and scaled by `unit`
/// (pixels per point).  The defaults follow TikZ's `thin`, `thick`, and
/// `very thick` line widths.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct StyleMetrics {
    /// Pixels per point.
    #[serde(default = "default_unit")]
    pub unit: f64,
    /// Width of a plain outline, in points.
    #[serde(default = "default_base_width")]
    pub base_width: f64,
    /// Width selected by `g`, in points.
    #[serde(default = "default_thick_width")]
    pub thick_width: f64,
    /// Width selected by `h`, in points.
    #[serde(default = "default_very_thick_width")]
    pub very_thick_width: f64,
}

fn default_unit() -> f64 {
    1.327
}
fn default_base_width() -> f64 {
    0.4
}
fn default_thick_width() -> f64 {
    0.75
}
fn default_very_thick_width() -> f64 {
    1.4
}

impl Default for StyleMetrics {
    fn default() -> Self {
        Self {
            unit: default_unit(),
            base_width: default_base_width(),
            thick_width: default_thick_width(),
            very_thick_width: default_very_thick_width(),
        }
    }
}

impl StyleMetrics {
    pub fn base_px(&self) -> f64 {
        self.base_width * self.unit
    }

    pub fn thick_px(&self) -> f64 {
        self.thick_width * self.unit
    }

    pub fn very_thick_px(&self) -> f64 {
        self.very_thick_width * self.unit
    }

    /// Checks that every metric is a finite positive number.
    ///
    /// # Errors
    ///
    /// Returns [`StyleError::InvalidMetric`] naming the first offending field.
    pub fn validate(&self) -> Result<(), StyleError> {
        let fields = [
            ("unit", self.unit),
            ("base_width", self.base_width),
            ("thick_width", self.thick_width),
            ("very_thick_width", self.very_thick_width),
        ];
        for (field, value) in fields {
            if !value.is_finite() || value <= 0.0 {
                return Err(StyleError::InvalidMetric { field, value });
            }
        }
        Ok(())
    }
}

// ── Descriptor ────────────────────────────────────────────────────────────────

/// A style property.  Variants are declared in alphabetical order of their
/// CSS names so that map iteration yields the serialization order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StyleProperty {
    Fill,
    FillOpacity,
    MarkerEnd,
    MarkerStart,
    Stroke,
    StrokeDasharray,
    StrokeOpacity,
    StrokeWidth,
}

impl StyleProperty {
    pub fn as_str(self) -> &'static str {
        match self {
            StyleProperty::Fill => "fill",
            StyleProperty::FillOpacity => "fill-opacity",
            StyleProperty::MarkerEnd => "marker-end",
            StyleProperty::MarkerStart => "marker-start",
            StyleProperty::Stroke => "stroke",
            StyleProperty::StrokeDasharray => "stroke-dasharray",
            StyleProperty::StrokeOpacity => "stroke-opacity",
            StyleProperty::StrokeWidth => "stroke-width",
        }
    }
}

impl fmt::Display for StyleProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A property value.  Numbers print in shortest round-trip form, so `1.0`
/// prints as `1` and `0.4 * 1.327` as `0.5308`.
#[derive(Debug, Clone, PartialEq)]
pub enum StyleValue {
    Keyword(&'static str),
    Number(f64),
    Text(String),
}

impl StyleValue {
    pub const NONE: StyleValue = StyleValue::Keyword("none");
    pub const BLACK: StyleValue = StyleValue::Keyword("black");
    pub const WHITE: StyleValue = StyleValue::Keyword("white");

    pub fn is_none(&self) -> bool {
        matches!(self, StyleValue::Keyword("none"))
    }

    fn arrow(width: f64) -> Self {
        StyleValue::Text(format!("url(#{})", svg::marker_id(width)))
    }
}

impl fmt::Display for StyleValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StyleValue::Keyword(k) => f.write_str(k),
            StyleValue::Number(n) => write!(f, "{n}"),
            StyleValue::Text(t) => f.write_str(t),
        }
    }
}

/// The finished style, never mutated after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleDescriptor {
    properties: BTreeMap<StyleProperty, StyleValue>,
    stroke_width: f64,
}

impl StyleDescriptor {
    pub fn get(&self, property: StyleProperty) -> Option<&StyleValue> {
        self.properties.get(&property)
    }

    /// Properties in alphabetical order of their names.
    pub fn iter(&self) -> impl Iterator<Item = (StyleProperty, &StyleValue)> {
        self.properties.iter().map(|(k, v)| (*k, v))
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Final stroke width in pixels; also keys the arrow marker.
    pub fn stroke_width(&self) -> f64 {
        self.stroke_width
    }

    /// `true` when either end carries a marker.
    pub fn has_marker(&self) -> bool {
        [StyleProperty::MarkerStart, StyleProperty::MarkerEnd]
            .iter()
            .any(|p| self.get(*p).is_some_and(|v| !v.is_none()))
    }

    /// `key: value` pairs joined by `;`, sorted by key.
    pub fn to_style_string(&self) -> String {
        self.iter()
            .map(|(k, v)| format!("{k}: {v}"))
            .collect::<Vec<_>>()
            .join(";")
    }
}

// ── Rule table ────────────────────────────────────────────────────────────────

/// Condition under which a rule fires.
#[derive(Debug, Clone, Copy)]
pub enum Condition {
    /// The key is in the chord.
    Has(&'static str),
    /// At least one of the keys is in the chord.
    AnyOf(&'static [&'static str]),
    /// None of the keys is in the chord.
    NoneOf(&'static [&'static str]),
}

impl Condition {
    pub fn matches(&self, combination: &BTreeSet<String>) -> bool {
        match self {
            Condition::Has(key) => combination.contains(*key),
            Condition::AnyOf(keys) => keys.iter().any(|k| combination.contains(*k)),
            Condition::NoneOf(keys) => !keys.iter().any(|k| combination.contains(*k)),
        }
    }
}

/// Style under construction.
struct StyleDraft<'m> {
    metrics: &'m StyleMetrics,
    stroke_width: f64,
    properties: BTreeMap<StyleProperty, StyleValue>,
}

impl StyleDraft<'_> {
    fn set(&mut self, property: StyleProperty, value: StyleValue) {
        self.properties.insert(property, value);
    }

    fn set_markers(&mut self, value: StyleValue) {
        self.set(StyleProperty::MarkerStart, value.clone());
        self.set(StyleProperty::MarkerEnd, value);
    }

    fn set_stroke_width(&mut self, width: f64) {
        self.stroke_width = width;
        self.set(StyleProperty::StrokeWidth, StyleValue::Number(width));
    }

    fn set_fill(&mut self, fill: StyleValue, opacity: f64) {
        self.set(StyleProperty::Fill, fill);
        self.set(StyleProperty::FillOpacity, StyleValue::Number(opacity));
    }
}

/// One entry of the rule table.
pub struct StyleRule {
    pub name: &'static str,
    pub when: Condition,
    apply: fn(&mut StyleDraft<'_>),
}

impl fmt::Debug for StyleRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StyleRule")
            .field("name", &self.name)
            .field("when", &self.when)
            .finish()
    }
}

/// The rule table, applied top to bottom.
pub static RULES: &[StyleRule] = &[
    StyleRule {
        name: "outline",
        when: Condition::AnyOf(OUTLINE_KEYS),
        apply: |d| {
            d.set(StyleProperty::Stroke, StyleValue::BLACK);
            let width = d.stroke_width;
            d.set_stroke_width(width);
            d.set_markers(StyleValue::NONE);
            d.set(StyleProperty::StrokeDasharray, StyleValue::NONE);
        },
    },
    StyleRule {
        name: "no-outline",
        when: Condition::NoneOf(OUTLINE_KEYS),
        apply: |d| d.set(StyleProperty::Stroke, StyleValue::NONE),
    },
    StyleRule {
        name: "thick",
        when: Condition::Has("g"),
        apply: |d| {
            let width = d.metrics.thick_px();
            d.set_stroke_width(width);
        },
    },
    StyleRule {
        name: "very-thick",
        when: Condition::Has("h"),
        apply: |d| {
            let width = d.metrics.very_thick_px();
            d.set_stroke_width(width);
        },
    },
    StyleRule {
        name: "arrow-end",
        when: Condition::Has("a"),
        apply: |d| {
            let arrow = StyleValue::arrow(d.stroke_width);
            d.set(StyleProperty::MarkerEnd, arrow);
        },
    },
    StyleRule {
        name: "arrow-both",
        when: Condition::Has("x"),
        apply: |d| {
            let arrow = StyleValue::arrow(d.stroke_width);
            d.set_markers(arrow);
        },
    },
    StyleRule {
        name: "dashed",
        when: Condition::Has("d"),
        apply: |d| {
            let dash = format!("{},{}", d.stroke_width, 2.0 * d.metrics.unit);
            d.set(StyleProperty::StrokeDasharray, StyleValue::Text(dash));
        },
    },
    StyleRule {
        name: "dotted",
        when: Condition::Has("e"),
        apply: |d| {
            let gap = 3.0 * d.metrics.unit;
            d.set(StyleProperty::StrokeDasharray, StyleValue::Text(format!("{gap},{gap}")));
        },
    },
    StyleRule {
        name: "light-fill",
        when: Condition::Has("f"),
        apply: |d| d.set_fill(StyleValue::BLACK, LIGHT_FILL_OPACITY),
    },
    StyleRule {
        name: "solid-fill",
        when: Condition::Has("b"),
        apply: |d| d.set_fill(StyleValue::BLACK, 1.0),
    },
    StyleRule {
        name: "white-fill",
        when: Condition::Has("w"),
        apply: |d| d.set_fill(StyleValue::WHITE, 1.0),
    },
    StyleRule {
        name: "fill-clears-markers",
        when: Condition::AnyOf(FILL_KEYS),
        apply: |d| d.set_markers(StyleValue::NONE),
    },
    StyleRule {
        name: "no-fill",
        when: Condition::NoneOf(FILL_KEYS),
        apply: |d| d.set_fill(StyleValue::NONE, 1.0),
    },
];

/// Derives the style for `combination`, or `None` when the result has
/// neither stroke nor fill.
///
/// Pure and order-independent: the same set always yields the same style.
pub fn synthesize(combination: &BTreeSet<String>, metrics: &StyleMetrics) -> Option<StyleDescriptor> {
    let mut draft = StyleDraft {
        metrics,
        stroke_width: metrics.base_px(),
        properties: BTreeMap::new(),
    };

    for rule in RULES {
        if rule.when.matches(combination) {
            trace!(rule = rule.name, "style rule fired");
            (rule.apply)(&mut draft);
        }
    }

    let is_none = |p| draft.properties.get(&p).map_or(true, StyleValue::is_none);
    if is_none(StyleProperty::Fill) && is_none(StyleProperty::Stroke) {
        return None;
    }

    draft.set(StyleProperty::StrokeOpacity, StyleValue::Number(1.0));
    Some(StyleDescriptor {
        properties: draft.properties,
        stroke_width: draft.stroke_width,
    })
}
