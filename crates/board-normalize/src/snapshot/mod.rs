//! Read-only board snapshot in host units.
//!
//! Lengths are integer nanometres and angles are tenths of a degree, the way
//! the host design tool stores them. Footprint children carry absolute board
//! coordinates. The engine never mutates a `Board`; the only mutators here
//! (`BoardFootprint::set_position` / `set_orientation`) exist for throwaway
//! copies.

pub mod geometry;

use crate::capabilities::HostFeature;
use geometry::{expand_opt, rotate_about, HostBox};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::SystemTime;

// ─── Primitives ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[i64; 2]", into = "[i64; 2]")]
pub struct Vec2 {
    pub x: i64,
    pub y: i64,
}

impl Vec2 {
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: i64, dy: i64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    pub fn distance(self, other: Vec2) -> f64 {
        let dx = (other.x - self.x) as f64;
        let dy = (other.y - self.y) as f64;
        (dx * dx + dy * dy).sqrt()
    }
}

impl From<[i64; 2]> for Vec2 {
    fn from(v: [i64; 2]) -> Self {
        Self::new(v[0], v[1])
    }
}

impl From<Vec2> for [i64; 2] {
    fn from(v: Vec2) -> Self {
        [v.x, v.y]
    }
}

/// Board layer identity. Serialized by its host name (`F.Cu`, `Edge.Cuts`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Layer {
    FrontCopper,
    BackCopper,
    InnerCopper(u8),
    FrontSilk,
    BackSilk,
    FrontFab,
    BackFab,
    EdgeCuts,
    Other(String),
}

impl Layer {
    pub fn from_name(name: &str) -> Self {
        match name {
            "F.Cu" => Layer::FrontCopper,
            "B.Cu" => Layer::BackCopper,
            "F.SilkS" | "F.Silkscreen" => Layer::FrontSilk,
            "B.SilkS" | "B.Silkscreen" => Layer::BackSilk,
            "F.Fab" | "F.Fabrication" => Layer::FrontFab,
            "B.Fab" | "B.Fabrication" => Layer::BackFab,
            "Edge.Cuts" => Layer::EdgeCuts,
            n => n
                .strip_prefix("In")
                .and_then(|rest| rest.strip_suffix(".Cu"))
                .and_then(|num| num.parse().ok())
                .map(Layer::InnerCopper)
                .unwrap_or_else(|| Layer::Other(n.to_string())),
        }
    }

    pub fn name(&self) -> String {
        match self {
            Layer::FrontCopper => "F.Cu".to_string(),
            Layer::BackCopper => "B.Cu".to_string(),
            Layer::InnerCopper(n) => format!("In{n}.Cu"),
            Layer::FrontSilk => "F.SilkS".to_string(),
            Layer::BackSilk => "B.SilkS".to_string(),
            Layer::FrontFab => "F.Fab".to_string(),
            Layer::BackFab => "B.Fab".to_string(),
            Layer::EdgeCuts => "Edge.Cuts".to_string(),
            Layer::Other(n) => n.clone(),
        }
    }

    /// Position in the copper stack, front first. `None` for non-copper layers.
    pub fn copper_depth(&self) -> Option<u16> {
        match self {
            Layer::FrontCopper => Some(0),
            Layer::InnerCopper(n) => Some(*n as u16),
            Layer::BackCopper => Some(u16::MAX),
            _ => None,
        }
    }
}

impl From<String> for Layer {
    fn from(s: String) -> Self {
        Layer::from_name(&s)
    }
}

impl From<Layer> for String {
    fn from(l: Layer) -> Self {
        l.name()
    }
}

/// A contour as an ordered point list.
pub type Contour = Vec<Vec2>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolygonWithHoles {
    pub outline: Contour,
    #[serde(default)]
    pub holes: Vec<Contour>,
}

/// A set of polygons, each with an outer boundary and optional holes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PolySet {
    pub polygons: Vec<PolygonWithHoles>,
}

impl PolySet {
    pub fn from_contours(contours: Vec<Contour>) -> Self {
        Self {
            polygons: contours
                .into_iter()
                .map(|outline| PolygonWithHoles {
                    outline,
                    holes: Vec::new(),
                })
                .collect(),
        }
    }

    /// Outer boundaries and holes in source order: each outline followed by
    /// its holes.
    pub fn contours(&self) -> impl Iterator<Item = &Contour> {
        self.polygons
            .iter()
            .flat_map(|p| std::iter::once(&p.outline).chain(p.holes.iter()))
    }

    pub fn has_holes(&self) -> bool {
        self.polygons.iter().any(|p| !p.holes.is_empty())
    }

    pub fn is_self_intersecting(&self) -> bool {
        self.contours()
            .any(|c| geometry::contour_self_intersects(c))
    }

    fn for_each_point_mut(&mut self, mut f: impl FnMut(&mut Vec2)) {
        for poly in &mut self.polygons {
            poly.outline.iter_mut().for_each(&mut f);
            for hole in &mut poly.holes {
                hole.iter_mut().for_each(&mut f);
            }
        }
    }
}

// ─── Host metadata ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HostVersion {
    pub major: u32,
    #[serde(default)]
    pub minor: u32,
}

impl Default for HostVersion {
    fn default() -> Self {
        Self { major: 8, minor: 0 }
    }
}

/// Host identity: its version plus any features the host explicitly lacks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HostInfo {
    #[serde(default)]
    pub version: HostVersion,
    #[serde(default)]
    pub unavailable: Vec<HostFeature>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TitleBlock {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub revision: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub date: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetInfo {
    pub code: i32,
    pub name: String,
}

// ─── Graphic items ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeKind {
    Segment,
    Rect,
    Circle,
    Arc,
    Polygon,
    Curve,
    #[serde(other)]
    Unsupported,
}

/// A drawn shape.
///
/// Circles and arcs store their center in `start` and a point on the
/// circumference in `end`. Arc angles are decidegrees: `arc_start` is the
/// angle of `end` around the center, `arc_sweep` the signed sweep.
/// Polygons belonging to a footprint keep their points relative to `start`
/// and unrotated; board-level polygons have `start` at the origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphicShape {
    pub kind: ShapeKind,
    pub layer: Layer,
    #[serde(default)]
    pub start: Vec2,
    #[serde(default)]
    pub end: Vec2,
    #[serde(default)]
    pub width: i64,
    #[serde(default)]
    pub arc_start: f64,
    #[serde(default)]
    pub arc_sweep: f64,
    #[serde(default)]
    pub polygon: Option<PolySet>,
    #[serde(default)]
    pub bezier: Option<[Vec2; 2]>,
}

impl GraphicShape {
    pub fn radius(&self) -> f64 {
        self.start.distance(self.end)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextClass {
    #[default]
    Board,
    Footprint,
}

fn default_true() -> bool {
    true
}

/// A text item.
///
/// `segments`, when the host can provide it, is the stroke decomposition as
/// a flat list of line endpoints (two per stroke).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphicText {
    #[serde(default)]
    pub class: TextClass,
    pub layer: Layer,
    pub text: String,
    #[serde(default)]
    pub shown_text: Option<String>,
    pub position: Vec2,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default)]
    pub thickness: i64,
    #[serde(default)]
    pub height: i64,
    #[serde(default)]
    pub width: i64,
    #[serde(default)]
    pub draw_rotation: Option<f64>,
    #[serde(default)]
    pub text_angle: Option<f64>,
    #[serde(default)]
    pub orientation: f64,
    /// Horizontal (-1 left, 0 center, 1 right) and vertical (-1 top, 0 center, 1 bottom).
    #[serde(default)]
    pub justify: [i8; 2],
    #[serde(default)]
    pub mirrored: bool,
    #[serde(default)]
    pub italic: bool,
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub segments: Option<Vec<Vec2>>,
}

impl GraphicText {
    pub fn shown(&self) -> &str {
        self.shown_text.as_deref().unwrap_or(&self.text)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "class", rename_all = "snake_case")]
pub enum BoardItem {
    Shape(GraphicShape),
    Text(GraphicText),
    /// A drawing class the engine has no normalizer for (dimensions, images, ...).
    Other { name: String, layer: Layer },
}

impl BoardItem {
    pub fn layer(&self) -> &Layer {
        match self {
            BoardItem::Shape(s) => &s.layer,
            BoardItem::Text(t) => &t.layer,
            BoardItem::Other { layer, .. } => layer,
        }
    }

    pub fn class_name(&self) -> &str {
        match self {
            BoardItem::Shape(_) => "shape",
            BoardItem::Text(_) => "text",
            BoardItem::Other { name, .. } => name,
        }
    }
}

// ─── Pads and footprints ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PadShape {
    Rect,
    Oval,
    Circle,
    Trapezoid,
    RoundRect,
    ChamferedRect,
    Custom,
}

/// Host pad attribute. Legacy hosts call plated holes `Standard` and
/// non-plated holes `HoleNotPlated`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PadAttribute {
    Pth,
    Smd,
    Conn,
    Npth,
    Standard,
    HoleNotPlated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostDrillShape {
    #[default]
    Circle,
    Oblong,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardPad {
    pub name: String,
    pub layers: Vec<Layer>,
    pub position: Vec2,
    pub size: Vec2,
    #[serde(default)]
    pub orientation: f64,
    pub shape: PadShape,
    pub attribute: PadAttribute,
    #[serde(default)]
    pub drill_shape: HostDrillShape,
    #[serde(default)]
    pub drill_size: Vec2,
    #[serde(default)]
    pub offset: Vec2,
    #[serde(default)]
    pub round_rect_ratio: f64,
    /// Chamfered corners: 1 top-left, 2 top-right, 4 bottom-left, 8 bottom-right.
    #[serde(default)]
    pub chamfer_positions: u8,
    #[serde(default)]
    pub chamfer_ratio: f64,
    /// Custom pad outline, pad-relative and unrotated.
    #[serde(default)]
    pub custom_polygon: Option<PolySet>,
    #[serde(default)]
    pub net_name: String,
}

impl BoardPad {
    pub fn corner_radius(&self) -> i64 {
        (self.size.x.min(self.size.y) as f64 * self.round_rect_ratio).round() as i64
    }

    /// Box of the pad rectangle after rotation.
    pub fn bounding_box(&self) -> HostBox {
        let hx = self.size.x / 2;
        let hy = self.size.y / 2;
        let center = self.position.offset(self.offset.x, self.offset.y);
        let mut bbox = HostBox::at(rotate_about(
            center.offset(-hx, -hy),
            self.position,
            self.orientation,
        ));
        for corner in [
            center.offset(hx, -hy),
            center.offset(hx, hy),
            center.offset(-hx, hy),
        ] {
            bbox.expand(rotate_about(corner, self.position, self.orientation));
        }
        bbox
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardFootprint {
    pub reference: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub footprint_name: String,
    pub layer: Layer,
    pub position: Vec2,
    #[serde(default)]
    pub orientation: f64,
    #[serde(default)]
    pub exclude_from_bom: bool,
    #[serde(default)]
    pub reference_text: Option<GraphicText>,
    #[serde(default)]
    pub value_text: Option<GraphicText>,
    #[serde(default)]
    pub pads: Vec<BoardPad>,
    #[serde(default)]
    pub graphics: Vec<BoardItem>,
}

impl BoardFootprint {
    /// Move the footprint and everything it owns.
    pub fn set_position(&mut self, pos: Vec2) {
        let dx = pos.x - self.position.x;
        let dy = pos.y - self.position.y;
        self.position = pos;
        for pad in &mut self.pads {
            pad.position = pad.position.offset(dx, dy);
        }
        for text in self.texts_mut() {
            text.position = text.position.offset(dx, dy);
            if let Some(segs) = &mut text.segments {
                segs.iter_mut().for_each(|p| *p = p.offset(dx, dy));
            }
        }
        for item in &mut self.graphics {
            if let BoardItem::Shape(s) = item {
                s.start = s.start.offset(dx, dy);
                if s.kind != ShapeKind::Polygon {
                    s.end = s.end.offset(dx, dy);
                }
                if let Some(ctrl) = &mut s.bezier {
                    ctrl.iter_mut().for_each(|p| *p = p.offset(dx, dy));
                }
            }
        }
    }

    /// Rotate the footprint and everything it owns around its anchor.
    pub fn set_orientation(&mut self, angle: f64) {
        let delta = angle - self.orientation;
        let center = self.position;
        self.orientation = angle;
        if delta == 0.0 {
            return;
        }
        let rot = |p: &mut Vec2| *p = rotate_about(*p, center, delta);
        for pad in &mut self.pads {
            rot(&mut pad.position);
            pad.orientation += delta;
        }
        for text in self.texts_mut() {
            rot(&mut text.position);
            if let Some(r) = &mut text.draw_rotation {
                *r += delta;
            }
            if let Some(segs) = &mut text.segments {
                segs.iter_mut().for_each(rot);
            }
        }
        for item in &mut self.graphics {
            if let BoardItem::Shape(s) = item {
                if s.kind == ShapeKind::Polygon {
                    // points are footprint-relative; only the anchor moves
                    rot(&mut s.start);
                    continue;
                }
                rot(&mut s.start);
                rot(&mut s.end);
                s.arc_start -= delta;
                if let Some(ctrl) = &mut s.bezier {
                    ctrl.iter_mut().for_each(rot);
                }
            }
        }
    }

    fn texts_mut(&mut self) -> impl Iterator<Item = &mut GraphicText> {
        let owned = self
            .reference_text
            .iter_mut()
            .chain(self.value_text.iter_mut());
        let drawn = self.graphics.iter_mut().filter_map(|g| match g {
            BoardItem::Text(t) => Some(t),
            _ => None,
        });
        owned.chain(drawn)
    }

    /// Box around pads and graphic shapes (text excluded), in the current pose.
    pub fn bounding_box(&self) -> HostBox {
        let mut bbox: Option<HostBox> = None;
        for pad in &self.pads {
            let pb = pad.bounding_box();
            expand_opt(&mut bbox, pb.min);
            expand_opt(&mut bbox, pb.max);
        }
        for item in &self.graphics {
            if let BoardItem::Shape(s) = item {
                if let Some(sb) = self.shape_box(s) {
                    expand_opt(&mut bbox, sb.min);
                    expand_opt(&mut bbox, sb.max);
                }
            }
        }
        bbox.unwrap_or_else(|| HostBox::at(self.position))
    }

    fn shape_box(&self, s: &GraphicShape) -> Option<HostBox> {
        let mut bbox = match s.kind {
            ShapeKind::Segment | ShapeKind::Rect => {
                let mut b = HostBox::at(s.start);
                b.expand(s.end);
                b
            }
            ShapeKind::Circle => {
                let mut b = HostBox::at(s.start);
                b.inflate(s.radius().round() as i64);
                b
            }
            ShapeKind::Arc => geometry::arc_box(s.start, s.radius(), s.arc_start, s.arc_sweep),
            ShapeKind::Curve => {
                let mut b = HostBox::at(s.start);
                b.expand(s.end);
                for c in s.bezier.iter().flatten() {
                    b.expand(*c);
                }
                b
            }
            ShapeKind::Polygon => {
                let mut b: Option<HostBox> = None;
                for c in s.polygon.iter().flat_map(|p| p.contours()) {
                    for p in c {
                        let abs = rotate_about(
                            s.start.offset(p.x, p.y),
                            s.start,
                            self.orientation,
                        );
                        expand_opt(&mut b, abs);
                    }
                }
                b?
            }
            ShapeKind::Unsupported => return None,
        };
        bbox.inflate(s.width / 2);
        Some(bbox)
    }
}

// ─── Tracks and zones ────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "class", rename_all = "snake_case")]
pub enum BoardTrack {
    Track {
        start: Vec2,
        end: Vec2,
        width: i64,
        layer: Layer,
        #[serde(default)]
        net: String,
    },
    Arc {
        center: Vec2,
        radius: i64,
        /// Decidegrees.
        arc_start: f64,
        arc_sweep: f64,
        width: i64,
        layer: Layer,
        #[serde(default)]
        net: String,
    },
    Via {
        position: Vec2,
        width: i64,
        #[serde(default)]
        drill: i64,
        /// Outermost copper layers the via connects.
        span: [Layer; 2],
        #[serde(default)]
        net: String,
    },
}

impl BoardTrack {
    /// Single copper layer of a track or arc, `None` for vias.
    pub fn layer(&self) -> Option<&Layer> {
        match self {
            BoardTrack::Track { layer, .. } | BoardTrack::Arc { layer, .. } => Some(layer),
            BoardTrack::Via { .. } => None,
        }
    }

    pub fn is_on_layer(&self, layer: &Layer) -> bool {
        match self {
            BoardTrack::Via { span, .. } => {
                let (Some(a), Some(b), Some(l)) = (
                    span[0].copper_depth(),
                    span[1].copper_depth(),
                    layer.copper_depth(),
                ) else {
                    return false;
                };
                l >= a.min(b) && l <= a.max(b)
            }
            _ => self.layer() == Some(layer),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerFill {
    pub layer: Layer,
    pub polygons: PolySet,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardZone {
    pub layers: Vec<Layer>,
    #[serde(default)]
    pub net: String,
    #[serde(default)]
    pub filled: bool,
    #[serde(default)]
    pub keepout: bool,
    #[serde(default)]
    pub rule_area: bool,
    #[serde(default)]
    pub min_thickness: i64,
    #[serde(default = "default_true")]
    pub fill_uses_thickness: bool,
    #[serde(default)]
    pub fills: Vec<LayerFill>,
}

// ─── Board ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Board {
    #[serde(default)]
    pub host: HostInfo,
    #[serde(default)]
    pub file_name: String,
    #[serde(skip)]
    pub modified: Option<SystemTime>,
    #[serde(default)]
    pub title_block: TitleBlock,
    #[serde(default)]
    pub text_vars: BTreeMap<String, String>,
    #[serde(default)]
    pub drawings: Vec<BoardItem>,
    #[serde(default)]
    pub footprints: Vec<BoardFootprint>,
    #[serde(default)]
    pub tracks: Vec<BoardTrack>,
    #[serde(default)]
    pub zones: Vec<BoardZone>,
    #[serde(default)]
    pub nets: Vec<NetInfo>,
}

impl Board {
    /// Board drawings followed by every footprint's graphic items.
    pub fn all_graphics(&self) -> impl Iterator<Item = (&BoardItem, Option<&BoardFootprint>)> {
        self.drawings.iter().map(|d| (d, None)).chain(
            self.footprints
                .iter()
                .flat_map(|f| f.graphics.iter().map(move |g| (g, Some(f)))),
        )
    }
}
