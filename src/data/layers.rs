//! Per-series visual state: colors, palette allocation and the layer registry.
//!
//! Every plottable column gets a [`Layer`] describing how it should be drawn.
//! Layers start **hidden**: with many columns over millions of rows, forcing
//! every series into the render layer at load time would stall the UI, so a
//! series is only materialized when it is first made visible.

use std::collections::HashMap;
use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// An opaque sRGB color, persisted as `"#rrggbb"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    pub fn from_hex(s: &str) -> Option<Self> {
        let hex = s.strip_prefix('#')?;
        if hex.len() != 6 {
            return None;
        }
        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
        Some(Self { r, g, b })
    }
}

impl Serialize for Rgb {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

struct RgbVisitor;

impl Visitor<'_> for RgbVisitor {
    type Value = Rgb;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a color string like \"#1f77b4\"")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Rgb, E> {
        Rgb::from_hex(v).ok_or_else(|| E::custom(format!("invalid color {v:?}")))
    }
}

impl<'de> Deserialize<'de> for Rgb {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_str(RgbVisitor)
    }
}

/// Default line colors, cycled by registration order.
pub const PALETTE: [Rgb; 15] = [
    Rgb::new(0x1f, 0x77, 0xb4), // blue
    Rgb::new(0xff, 0x7f, 0x0e), // orange
    Rgb::new(0x2c, 0xa0, 0x2c), // green
    Rgb::new(0xd6, 0x27, 0x28), // red
    Rgb::new(0x94, 0x67, 0xbd), // purple
    Rgb::new(0x8c, 0x56, 0x4b), // brown
    Rgb::new(0xe3, 0x77, 0xc2), // pink
    Rgb::new(0x7f, 0x7f, 0x7f), // gray
    Rgb::new(0xbc, 0xbd, 0x22), // yellow-green
    Rgb::new(0x17, 0xbe, 0xcf), // cyan
    Rgb::new(0xae, 0xc7, 0xe8), // light blue
    Rgb::new(0xff, 0xbb, 0x78), // light orange
    Rgb::new(0x98, 0xdf, 0x8a), // light green
    Rgb::new(0xff, 0x98, 0x96), // light red
    Rgb::new(0xc5, 0xb0, 0xd5), // light purple
];

/// Allocate a palette color for the given registration index.
pub fn alloc_color(index: usize) -> Rgb {
    PALETTE[index % PALETTE.len()]
}

pub const MIN_LINE_WIDTH: u32 = 1;
pub const MAX_LINE_WIDTH: u32 = 10;

fn clamp_width(width: u32) -> u32 {
    width.clamp(MIN_LINE_WIDTH, MAX_LINE_WIDTH)
}

/// Activation state of a registered series. Unregistered series have no
/// state at all; transitions happen only through explicit registry calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerState {
    Hidden,
    Visible,
}

/// One registered series and its visual configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub name: String,
    pub color: Rgb,
    pub width: u32,
    state: LayerState,
}

impl Layer {
    pub fn state(&self) -> LayerState {
        self.state
    }

    pub fn visible(&self) -> bool {
        self.state == LayerState::Visible
    }
}

/// Change notification produced by registry mutations.
///
/// `toggle_all` emits a single [`LayerEvent::AllVisibilityChanged`] rather
/// than one event per layer, so downstream consumers recompute ranges once.
#[derive(Debug, Clone, PartialEq)]
pub enum LayerEvent {
    Registered { name: String },
    VisibilityChanged { name: String, visible: bool },
    ColorChanged { name: String, color: Rgb },
    WidthChanged { name: String, width: u32 },
    AllVisibilityChanged { visible: bool },
    Cleared,
}

/// Owns the per-column visual state for the currently loaded dataset.
#[derive(Default)]
pub struct LayerRegistry {
    layers: HashMap<String, Layer>,
    order: Vec<String>,
}

impl LayerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a series. A no-op (returning `None`) if the name is already
    /// registered. When `color` is omitted the next palette color is assigned
    /// by registration order.
    pub fn register(
        &mut self,
        name: &str,
        color: Option<Rgb>,
        visible: bool,
        width: u32,
    ) -> Option<LayerEvent> {
        if self.layers.contains_key(name) {
            return None;
        }
        let color = color.unwrap_or_else(|| alloc_color(self.order.len()));
        self.layers.insert(
            name.to_string(),
            Layer {
                name: name.to_string(),
                color,
                width: clamp_width(width),
                state: if visible {
                    LayerState::Visible
                } else {
                    LayerState::Hidden
                },
            },
        );
        self.order.push(name.to_string());
        Some(LayerEvent::Registered {
            name: name.to_string(),
        })
    }

    pub fn get(&self, name: &str) -> Option<&Layer> {
        self.layers.get(name)
    }

    /// Idempotent: returns `None` when the layer is unknown or the value is
    /// already set.
    pub fn set_visible(&mut self, name: &str, visible: bool) -> Option<LayerEvent> {
        let layer = self.layers.get_mut(name)?;
        let state = if visible {
            LayerState::Visible
        } else {
            LayerState::Hidden
        };
        if layer.state == state {
            return None;
        }
        layer.state = state;
        Some(LayerEvent::VisibilityChanged {
            name: name.to_string(),
            visible,
        })
    }

    pub fn set_color(&mut self, name: &str, color: Rgb) -> Option<LayerEvent> {
        let layer = self.layers.get_mut(name)?;
        if layer.color == color {
            return None;
        }
        layer.color = color;
        Some(LayerEvent::ColorChanged {
            name: name.to_string(),
            color,
        })
    }

    pub fn set_width(&mut self, name: &str, width: u32) -> Option<LayerEvent> {
        let width = clamp_width(width);
        let layer = self.layers.get_mut(name)?;
        if layer.width == width {
            return None;
        }
        layer.width = width;
        Some(LayerEvent::WidthChanged {
            name: name.to_string(),
            width,
        })
    }

    /// Set every registered layer to the same visibility in one batch,
    /// emitting a single aggregate event. `None` when no layers exist.
    pub fn toggle_all(&mut self, visible: bool) -> Option<LayerEvent> {
        if self.layers.is_empty() {
            return None;
        }
        let state = if visible {
            LayerState::Visible
        } else {
            LayerState::Hidden
        };
        for layer in self.layers.values_mut() {
            layer.state = state;
        }
        Some(LayerEvent::AllVisibilityChanged { visible })
    }

    /// Discard all registrations (dataset cleared or replaced).
    pub fn clear(&mut self) -> Option<LayerEvent> {
        if self.layers.is_empty() {
            return None;
        }
        self.layers.clear();
        self.order.clear();
        Some(LayerEvent::Cleared)
    }

    /// Layer names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Layers in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Layer> {
        self.order.iter().filter_map(|n| self.layers.get(n))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
