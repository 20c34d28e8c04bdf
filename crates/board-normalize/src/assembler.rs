//! Top-level orchestration: one board snapshot in, one document out.

use crate::capabilities::{Capabilities, HostFeature};
use crate::error::AssemblyError;
use crate::fields::{self, FieldSource};
use crate::font::FontService;
use crate::metadata;
use crate::normalize::layers::{self, copper_side, LayerPair};
use crate::normalize::shapes::shape_bbox;
use crate::normalize::{footprints, nets, tracks, Normalizer};
use crate::snapshot::{Board, BoardFootprint, Layer};
use crate::types::{
    BBox, BoardDocument, Component, ComponentAttr, DrawingItem, Drawings,
};
use crate::ExtractOptions;
use log::{error, warn};

/// Result of one extraction pass.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub document: BoardDocument,
    /// One entry per footprint, in board order, for the BOM stage.
    pub components: Vec<Component>,
}

pub struct BoardAssembler<'a> {
    board: &'a Board,
    opts: &'a ExtractOptions,
    caps: Capabilities,
}

impl<'a> BoardAssembler<'a> {
    pub fn new(board: &'a Board, opts: &'a ExtractOptions) -> Self {
        Self {
            board,
            opts,
            caps: Capabilities::detect(&board.host),
        }
    }

    fn needs_extra_fields(&self) -> bool {
        !self.opts.extra_fields.is_empty()
            || !self.opts.board_variant_whitelist.is_empty()
            || !self.opts.board_variant_blacklist.is_empty()
            || self.opts.dnp_field.is_some()
    }

    pub fn assemble(&self, fonts: &mut dyn FontService) -> Result<Extraction, AssemblyError> {
        let board = self.board;
        let field_data = fields::load_configured(
            self.needs_extra_fields(),
            self.opts.field_source.as_deref(),
            self.opts.normalize_field_case,
        )?;

        let metadata = metadata::resolve(board, &self.caps);

        let mut n = Normalizer::new(&self.caps, self.opts.include_nets, fonts);
        let (edges, bbox) = parse_edges(&mut n, board);
        let Some(edges_bbox) = bbox else {
            if edges.is_empty() {
                error!(
                    "Please draw the board outline on the Edge.Cuts layer, on the board or in any footprint, before extracting"
                );
            } else {
                error!(
                    "Edge.Cuts has {} drawings but none with usable geometry; outline polygons need point access on this host",
                    edges.len()
                );
            }
            return Err(AssemblyError::MissingOutline);
        };

        let sources = layers::all_drawings(board);
        let drawings = Drawings {
            silkscreen: layers::drawings_on_layers(&mut n, &sources, &LayerPair::SILKSCREEN),
            fabrication: layers::drawings_on_layers(&mut n, &sources, &LayerPair::FABRICATION),
        };
        let footprints = board
            .footprints
            .iter()
            .map(|f| footprints::assemble(&mut n, f))
            .collect();
        drop(n);

        let (tracks, zones) = if self.opts.include_tracks {
            (
                Some(tracks::parse_tracks(&board.tracks, self.opts.include_nets)),
                Some(tracks::parse_zones(
                    &board.zones,
                    &self.caps,
                    self.opts.include_nets,
                )),
            )
        } else {
            (None, None)
        };
        let nets = (self.opts.include_nets && self.caps.has(HostFeature::NetInfo))
            .then(|| nets::collect(&board.nets));

        let source = field_data.as_ref().map(|s| s as &dyn FieldSource);
        let components = components(&board.footprints, source);

        Ok(Extraction {
            document: BoardDocument {
                edges_bbox,
                edges,
                drawings,
                footprints,
                metadata,
                bom: serde_json::Map::new(),
                font_data: fonts.font_data(),
                tracks,
                zones,
                nets,
            },
            components,
        })
    }
}

/// Outline drawings from the board and every footprint, and the merged box
/// of their shapes. `None` when nothing is drawn on the outline layer.
fn parse_edges(n: &mut Normalizer<'_>, board: &Board) -> (Vec<DrawingItem>, Option<BBox>) {
    let mut edges = Vec::new();
    let mut bbox: Option<BBox> = None;
    for (item, owner) in board.all_graphics() {
        if *item.layer() != Layer::EdgeCuts {
            continue;
        }
        let Some(drawing) = n.parse_drawing(item, owner) else {
            continue;
        };
        if let DrawingItem::Shape(shape) = &drawing {
            if let Some(b) = shape_bbox(shape) {
                bbox = Some(match bbox {
                    Some(mut acc) => {
                        acc.merge(&b);
                        acc
                    }
                    None => b,
                });
            }
        }
        edges.push(drawing);
    }
    (edges, bbox.map(BBox::normalize))
}

fn components(
    footprints: &[BoardFootprint],
    field_data: Option<&dyn FieldSource>,
) -> Vec<Component> {
    let mut stale = false;
    let result = footprints
        .iter()
        .map(|f| {
            let extra_fields = match field_data {
                Some(source) => match source.fields(&f.reference) {
                    Some(fields) => fields.clone(),
                    None => {
                        warn!("Component {} is missing from field data", f.reference);
                        stale = true;
                        Default::default()
                    }
                },
                None => Default::default(),
            };
            Component {
                ref_: f.reference.clone(),
                val: f.value.clone(),
                footprint_name: f.footprint_name.clone(),
                layer: copper_side(&f.layer),
                attr: if f.exclude_from_bom {
                    ComponentAttr::Virtual
                } else {
                    ComponentAttr::Normal
                },
                extra_fields,
            }
        })
        .collect();
    if stale {
        warn!("Field data is likely out of date");
    }
    result
}
