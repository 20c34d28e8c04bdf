use crate::units::round_f64;
use serde::ser::Serializer;
use serde::Serialize;
use std::collections::BTreeMap;

/// Rounds f64 to 6 decimal places on serialization.
fn serialize_f64_rounded<S: Serializer>(v: &f64, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(round_f64(*v, 6))
}

fn serialize_point<S: Serializer>(p: &[f64; 2], s: S) -> Result<S::Ok, S::Error> {
    let rounded = [round_f64(p[0], 6), round_f64(p[1], 6)];
    rounded.serialize(s)
}

fn serialize_opt_point<S: Serializer>(p: &Option<[f64; 2]>, s: S) -> Result<S::Ok, S::Error> {
    match p {
        Some(pt) => {
            let rounded = [round_f64(pt[0], 6), round_f64(pt[1], 6)];
            s.serialize_some(&rounded)
        }
        None => s.serialize_none(),
    }
}

fn serialize_polygons<S: Serializer>(polys: &Polygons, s: S) -> Result<S::Ok, S::Error> {
    let rounded: Vec<Vec<[f64; 2]>> = polys
        .iter()
        .map(|poly| {
            poly.iter()
                .map(|p| [round_f64(p[0], 6), round_f64(p[1], 6)])
                .collect()
        })
        .collect();
    rounded.serialize(s)
}

/// Ordered point sequences, one per outline or hole.
pub type Polygons = Vec<Vec<[f64; 2]>>;

// ─── Top-level BoardDocument ─────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct BoardDocument {
    pub edges_bbox: BBox,
    pub edges: Vec<DrawingItem>,
    pub drawings: Drawings,
    pub footprints: Vec<Footprint>,
    pub metadata: Metadata,
    /// Filled in by the BOM stage downstream.
    pub bom: serde_json::Map<String, serde_json::Value>,
    pub font_data: FontData,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracks: Option<LayerData<Vec<Track>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zones: Option<LayerData<Vec<Zone>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nets: Option<Vec<String>>,
}

// ─── Bounding Box ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BBox {
    #[serde(serialize_with = "serialize_f64_rounded")]
    pub minx: f64,
    #[serde(serialize_with = "serialize_f64_rounded")]
    pub miny: f64,
    #[serde(serialize_with = "serialize_f64_rounded")]
    pub maxx: f64,
    #[serde(serialize_with = "serialize_f64_rounded")]
    pub maxy: f64,
}

impl BBox {
    pub fn from_point(x: f64, y: f64) -> Self {
        Self {
            minx: x,
            miny: y,
            maxx: x,
            maxy: y,
        }
    }

    pub fn expand_point(&mut self, x: f64, y: f64) {
        self.minx = self.minx.min(x);
        self.miny = self.miny.min(y);
        self.maxx = self.maxx.max(x);
        self.maxy = self.maxy.max(y);
    }

    /// Union with another box. Commutative and associative.
    pub fn merge(&mut self, other: &BBox) {
        self.minx = self.minx.min(other.minx);
        self.miny = self.miny.min(other.miny);
        self.maxx = self.maxx.max(other.maxx);
        self.maxy = self.maxy.max(other.maxy);
    }

    /// Swap bounds so that min <= max on both axes.
    pub fn normalize(mut self) -> Self {
        if self.minx > self.maxx {
            std::mem::swap(&mut self.minx, &mut self.maxx);
        }
        if self.miny > self.maxy {
            std::mem::swap(&mut self.miny, &mut self.maxy);
        }
        self
    }
}

// ─── Drawings container ──────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct Drawings {
    pub silkscreen: LayerData<Vec<DrawingItem>>,
    pub fabrication: LayerData<Vec<DrawingItem>>,
}

/// Front/Back layer data.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LayerData<T> {
    #[serde(rename = "F")]
    pub front: T,
    #[serde(rename = "B")]
    pub back: T,
}

impl<T> LayerData<T> {
    pub fn get_mut(&mut self, side: Side) -> &mut T {
        match side {
            Side::Front => &mut self.front,
            Side::Back => &mut self.back,
        }
    }
}

// ─── Shapes ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Shape {
    Segment {
        #[serde(serialize_with = "serialize_point")]
        start: [f64; 2],
        #[serde(serialize_with = "serialize_point")]
        end: [f64; 2],
        #[serde(serialize_with = "serialize_f64_rounded")]
        width: f64,
    },
    Rect {
        #[serde(serialize_with = "serialize_point")]
        start: [f64; 2],
        #[serde(serialize_with = "serialize_point")]
        end: [f64; 2],
        #[serde(serialize_with = "serialize_f64_rounded")]
        width: f64,
    },
    Circle {
        #[serde(serialize_with = "serialize_point")]
        start: [f64; 2],
        #[serde(serialize_with = "serialize_f64_rounded")]
        radius: f64,
        #[serde(serialize_with = "serialize_f64_rounded")]
        width: f64,
    },
    Arc {
        #[serde(serialize_with = "serialize_point")]
        start: [f64; 2],
        #[serde(serialize_with = "serialize_f64_rounded")]
        radius: f64,
        startangle: f64,
        endangle: f64,
        #[serde(serialize_with = "serialize_f64_rounded")]
        width: f64,
    },
    Polygon {
        #[serde(serialize_with = "serialize_point")]
        pos: [f64; 2],
        #[serde(serialize_with = "serialize_f64_rounded")]
        angle: f64,
        #[serde(serialize_with = "serialize_polygons")]
        polygons: Polygons,
    },
    Curve {
        #[serde(serialize_with = "serialize_point")]
        start: [f64; 2],
        #[serde(serialize_with = "serialize_point")]
        cpa: [f64; 2],
        #[serde(serialize_with = "serialize_point")]
        cpb: [f64; 2],
        #[serde(serialize_with = "serialize_point")]
        end: [f64; 2],
        #[serde(serialize_with = "serialize_f64_rounded")]
        width: f64,
    },
}

// ─── Text ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAttr {
    Mirrored,
    Italic,
    Bold,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TextBody {
    /// Vector strokes as an SVG path.
    Stroke {
        svgpath: String,
        #[serde(serialize_with = "serialize_f64_rounded")]
        thickness: f64,
    },
    Metadata {
        #[serde(serialize_with = "serialize_point")]
        pos: [f64; 2],
        text: String,
        #[serde(serialize_with = "serialize_f64_rounded")]
        height: f64,
        #[serde(serialize_with = "serialize_f64_rounded")]
        width: f64,
        justify: [i8; 2],
        #[serde(serialize_with = "serialize_f64_rounded")]
        thickness: f64,
        attr: Vec<TextAttr>,
        #[serde(serialize_with = "serialize_f64_rounded")]
        angle: f64,
    },
}

/// Text drawing, untagged: the viewer tells text apart by its fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextItem {
    #[serde(flatten)]
    pub body: TextBody,
    #[serde(skip_serializing_if = "Option::is_none", rename = "ref")]
    pub is_ref: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub val: Option<u8>,
}

/// A drawing that can be either a shape or text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DrawingItem {
    Shape(Shape),
    Text(TextItem),
}

#[derive(Debug, Clone, Serialize)]
pub struct FootprintDrawing {
    pub layer: Side,
    pub drawing: DrawingItem,
}

// ─── Footprint ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct Footprint {
    #[serde(rename = "ref")]
    pub ref_: String,
    pub bbox: FootprintBBox,
    pub pads: Vec<Pad>,
    pub drawings: Vec<FootprintDrawing>,
    pub layer: Option<Side>,
}

/// `pos`/`angle` are the footprint's actual pose; `relpos`/`size` describe
/// its box with position and rotation zeroed.
#[derive(Debug, Clone, Serialize)]
pub struct FootprintBBox {
    #[serde(serialize_with = "serialize_point")]
    pub pos: [f64; 2],
    #[serde(serialize_with = "serialize_point")]
    pub relpos: [f64; 2],
    #[serde(serialize_with = "serialize_point")]
    pub size: [f64; 2],
    #[serde(serialize_with = "serialize_f64_rounded")]
    pub angle: f64,
}

// ─── Pad ─────────────────────────────────────────────────────────────

/// Canonical pad shape kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PadKind {
    Rect,
    Oval,
    Circle,
    RoundRect,
    Custom,
    ChamfRect,
}

/// Shape-specific pad data, tagged by `shape`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "shape", rename_all = "lowercase")]
pub enum PadShapeData {
    Rect,
    Oval,
    Circle,
    RoundRect {
        #[serde(serialize_with = "serialize_f64_rounded")]
        radius: f64,
    },
    Custom {
        #[serde(serialize_with = "serialize_polygons")]
        polygons: Polygons,
    },
    ChamfRect {
        #[serde(serialize_with = "serialize_f64_rounded")]
        radius: f64,
        chamfpos: u8,
        chamfratio: f64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DrillShape {
    Circle,
    Oblong,
}

/// Through-hole or surface-mount, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum Mount {
    #[serde(rename = "th")]
    ThroughHole {
        drillshape: DrillShape,
        #[serde(serialize_with = "serialize_point")]
        drillsize: [f64; 2],
    },
    #[serde(rename = "smd")]
    SurfaceMount,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pad {
    pub layers: Vec<Side>,
    #[serde(serialize_with = "serialize_point")]
    pub pos: [f64; 2],
    #[serde(serialize_with = "serialize_point")]
    pub size: [f64; 2],
    #[serde(serialize_with = "serialize_f64_rounded")]
    pub angle: f64,
    #[serde(flatten)]
    pub shape: PadShapeData,
    #[serde(flatten)]
    pub mount: Mount,
    #[serde(
        serialize_with = "serialize_opt_point",
        skip_serializing_if = "Option::is_none"
    )]
    pub offset: Option<[f64; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub net: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pin1: Option<u8>,
}

impl Pad {
    pub fn is_through_hole(&self) -> bool {
        matches!(self.mount, Mount::ThroughHole { .. })
    }
}

// ─── Track ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Track {
    Segment {
        #[serde(serialize_with = "serialize_point")]
        start: [f64; 2],
        #[serde(serialize_with = "serialize_point")]
        end: [f64; 2],
        #[serde(serialize_with = "serialize_f64_rounded")]
        width: f64,
        #[serde(skip_serializing_if = "Option::is_none")]
        net: Option<String>,
    },
    Arc {
        #[serde(serialize_with = "serialize_point")]
        center: [f64; 2],
        startangle: f64,
        endangle: f64,
        #[serde(serialize_with = "serialize_f64_rounded")]
        radius: f64,
        #[serde(serialize_with = "serialize_f64_rounded")]
        width: f64,
        #[serde(skip_serializing_if = "Option::is_none")]
        net: Option<String>,
    },
}

// ─── Zone ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Zone {
    #[serde(serialize_with = "serialize_polygons")]
    pub polygons: Polygons,
    /// Zero means the outline of the filled polygon already carries its width.
    #[serde(serialize_with = "serialize_f64_rounded")]
    pub width: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub net: Option<String>,
}

// ─── Font data ───────────────────────────────────────────────────────

pub type FontData = BTreeMap<String, GlyphData>;

#[derive(Debug, Clone, PartialEq, Serialize, serde::Deserialize)]
pub struct GlyphData {
    pub w: f64,
    pub l: Vec<Vec<[f64; 2]>>,
}

// ─── Metadata ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metadata {
    pub title: String,
    pub revision: String,
    pub company: String,
    pub date: String,
}

// ─── Side helper ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Side {
    #[serde(rename = "F")]
    Front,
    #[serde(rename = "B")]
    Back,
}

// ─── Component (consumed by the BOM stage) ───────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ComponentAttr {
    Normal,
    Virtual,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Component {
    #[serde(rename = "ref")]
    pub ref_: String,
    pub val: String,
    pub footprint_name: String,
    pub layer: Option<Side>,
    pub attr: ComponentAttr,
    pub extra_fields: BTreeMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bbox_normalize() {
        let b = BBox {
            minx: 10.0,
            miny: 5.0,
            maxx: 0.0,
            maxy: 0.0,
        }
        .normalize();
        assert_eq!(b, BBox { minx: 0.0, miny: 0.0, maxx: 10.0, maxy: 5.0 });
    }

    #[test]
    fn test_pad_serializes_flat() {
        let pad = Pad {
            layers: vec![Side::Front, Side::Back],
            pos: [1.0, 2.0],
            size: [1.5, 1.5],
            angle: -90.0,
            shape: PadShapeData::RoundRect { radius: 0.25 },
            mount: Mount::ThroughHole {
                drillshape: DrillShape::Circle,
                drillsize: [0.8, 0.8],
            },
            offset: Some([0.0, 0.0]),
            net: None,
            pin1: Some(1),
        };
        let v = serde_json::to_value(&pad).unwrap();
        assert_eq!(v["layers"], json!(["F", "B"]));
        assert_eq!(v["shape"], json!("roundrect"));
        assert_eq!(v["radius"], json!(0.25));
        assert_eq!(v["type"], json!("th"));
        assert_eq!(v["drillshape"], json!("circle"));
        assert_eq!(v["pin1"], json!(1));
        assert!(v.get("net").is_none());
    }

    #[test]
    fn test_smd_pad_has_no_drill() {
        let pad = Pad {
            layers: vec![Side::Front],
            pos: [0.0, 0.0],
            size: [1.0, 0.5],
            angle: 0.0,
            shape: PadShapeData::ChamfRect {
                radius: 0.1,
                chamfpos: 5,
                chamfratio: 0.2,
            },
            mount: Mount::SurfaceMount,
            offset: None,
            net: Some("GND".to_string()),
            pin1: None,
        };
        let v = serde_json::to_value(&pad).unwrap();
        assert_eq!(v["shape"], json!("chamfrect"));
        assert_eq!(v["type"], json!("smd"));
        assert_eq!(v["chamfpos"], json!(5));
        assert!(v.get("drillsize").is_none());
        assert_eq!(v["net"], json!("GND"));
    }

    #[test]
    fn test_text_item_shapes() {
        let text = DrawingItem::Text(TextItem {
            body: TextBody::Stroke {
                svgpath: "M0 0L1 1".to_string(),
                thickness: 0.15,
            },
            is_ref: Some(1),
            val: None,
        });
        let v = serde_json::to_value(&text).unwrap();
        assert_eq!(v, json!({"svgpath": "M0 0L1 1", "thickness": 0.15, "ref": 1}));

        let seg = DrawingItem::Shape(Shape::Segment {
            start: [0.0, 0.0],
            end: [1.0000001, 2.0],
            width: 0.1,
        });
        let v = serde_json::to_value(&seg).unwrap();
        assert_eq!(v["type"], json!("segment"));
        assert_eq!(v["end"], json!([1.0, 2.0]));
    }
}
