//! Normalizers from host board primitives to canonical records.

pub mod footprints;
pub mod layers;
pub mod nets;
pub mod pads;
pub mod polygons;
pub mod shapes;
pub mod text;
pub mod tracks;

use crate::capabilities::Capabilities;
use crate::font::FontService;
use crate::snapshot::{BoardFootprint, BoardItem, GraphicText};
use crate::types::{DrawingItem, TextItem};
use log::info;

/// Shared state for one extraction pass: resolved capabilities, the net
/// inclusion switch and the font service every shown string goes to.
pub struct Normalizer<'a> {
    pub caps: &'a Capabilities,
    pub include_nets: bool,
    fonts: &'a mut dyn FontService,
}

impl<'a> Normalizer<'a> {
    pub fn new(caps: &'a Capabilities, include_nets: bool, fonts: &'a mut dyn FontService) -> Self {
        Self {
            caps,
            include_nets,
            fonts,
        }
    }

    /// Normalize a shape or text item. Other drawing classes are skipped.
    pub fn parse_drawing(
        &mut self,
        item: &BoardItem,
        owner: Option<&BoardFootprint>,
    ) -> Option<DrawingItem> {
        match item {
            BoardItem::Shape(s) => {
                shapes::parse_shape(s, owner.map(|f| f.orientation), self.caps)
                    .map(DrawingItem::Shape)
            }
            BoardItem::Text(t) => self.parse_text_item(t).map(DrawingItem::Text),
            BoardItem::Other { name, .. } => {
                info!("Unsupported drawing class {name}, skipping");
                None
            }
        }
    }

    pub fn parse_text_item(&mut self, t: &GraphicText) -> Option<TextItem> {
        text::parse_text(t, self.caps, &mut *self.fonts)
    }
}
