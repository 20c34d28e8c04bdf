use super::Normalizer;
use crate::snapshot::{Board, BoardFootprint, BoardItem, GraphicText, Layer};
use crate::types::{DrawingItem, LayerData, Side};

/// A front/back pair of logical layers that entities are routed into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerPair {
    pub front: Layer,
    pub back: Layer,
}

impl LayerPair {
    pub const COPPER: LayerPair = LayerPair {
        front: Layer::FrontCopper,
        back: Layer::BackCopper,
    };
    pub const SILKSCREEN: LayerPair = LayerPair {
        front: Layer::FrontSilk,
        back: Layer::BackSilk,
    };
    pub const FABRICATION: LayerPair = LayerPair {
        front: Layer::FrontFab,
        back: Layer::BackFab,
    };

    /// Which side `layer` belongs to, or `None` if it is neither of the pair.
    pub fn route(&self, layer: &Layer) -> Option<Side> {
        if *layer == self.front {
            Some(Side::Front)
        } else if *layer == self.back {
            Some(Side::Back)
        } else {
            None
        }
    }
}

pub fn copper_side(layer: &Layer) -> Option<Side> {
    LayerPair::COPPER.route(layer)
}

/// One board-wide drawing candidate.
#[derive(Debug, Clone, Copy)]
pub enum DrawingSource<'a> {
    Item(&'a BoardItem, Option<&'a BoardFootprint>),
    Reference(&'a GraphicText),
    Value(&'a GraphicText),
}

impl<'a> DrawingSource<'a> {
    pub fn layer(&self) -> &'a Layer {
        match self {
            DrawingSource::Item(item, _) => item.layer(),
            DrawingSource::Reference(t) | DrawingSource::Value(t) => &t.layer,
        }
    }
}

/// Board drawings, then for every footprint its reference text, value text
/// and graphic items.
pub fn all_drawings(board: &Board) -> Vec<DrawingSource<'_>> {
    let mut out: Vec<DrawingSource<'_>> = board
        .drawings
        .iter()
        .map(|d| DrawingSource::Item(d, None))
        .collect();
    for f in &board.footprints {
        if let Some(t) = &f.reference_text {
            out.push(DrawingSource::Reference(t));
        }
        if let Some(t) = &f.value_text {
            out.push(DrawingSource::Value(t));
        }
        out.extend(f.graphics.iter().map(|g| DrawingSource::Item(g, Some(f))));
    }
    out
}

/// Normalize every drawing on either layer of `pair`, split by side.
/// Drawings on other layers are dropped.
pub fn drawings_on_layers(
    n: &mut Normalizer<'_>,
    sources: &[DrawingSource<'_>],
    pair: &LayerPair,
) -> LayerData<Vec<DrawingItem>> {
    let mut result: LayerData<Vec<DrawingItem>> = LayerData::default();
    for source in sources {
        let Some(side) = pair.route(source.layer()) else {
            continue;
        };
        let drawing = match source {
            DrawingSource::Item(item, owner) => n.parse_drawing(item, *owner),
            DrawingSource::Reference(t) => n.parse_text_item(t).map(|mut text| {
                text.is_ref = Some(1);
                DrawingItem::Text(text)
            }),
            DrawingSource::Value(t) => n.parse_text_item(t).map(|mut text| {
                text.val = Some(1);
                DrawingItem::Text(text)
            }),
        };
        if let Some(drawing) = drawing {
            result.get_mut(side).push(drawing);
        }
    }
    result
}
