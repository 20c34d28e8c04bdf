//! `.kicad_pcb` loader producing a board snapshot.
//!
//! Handles the S-expression syntax written by KiCad 5 through 8: `module` and
//! `footprint` blocks, legacy center/angle arcs and three-point arcs, bare
//! and `(hide yes)` flags, `fp_text` and `property` fields.

use super::kicad_sexpr::{self, SExpr};
use crate::capabilities::HostFeature;
use crate::error::ExtractError;
use crate::snapshot::geometry::rotate_about;
use crate::snapshot::*;
use crate::units::{from_deg, from_mm};
use log::{debug, info};
use std::collections::{BTreeMap, HashMap};
use std::f64::consts::PI;

/// Parse a `.kicad_pcb` file into a snapshot. File name and modification
/// time are left for the caller.
pub fn parse(data: &[u8]) -> Result<Board, ExtractError> {
    let root = kicad_sexpr::parse(data)
        .map_err(|e| ExtractError::ParseError(format!("S-expression parse error: {e}")))?;

    if root.tag() != Some("kicad_pcb") {
        return Err(ExtractError::ParseError("not a kicad_pcb file".to_string()));
    }

    let version = host_version(root.value("version"));
    let nets = parse_nets(&root);
    let ctx = Context {
        legacy: version.major < 6,
        nets: nets.iter().map(|n| (n.code, n.name.clone())).collect(),
    };
    debug!("kicad_pcb file from host {}.x, {} nets", version.major, nets.len());

    let mut board = Board {
        host: HostInfo {
            version,
            // stroke decomposition needs the host's font engine
            unavailable: vec![HostFeature::TextSegments],
        },
        title_block: parse_title_block(&root),
        text_vars: parse_text_vars(&root),
        nets,
        ..Default::default()
    };

    for child in root.children() {
        let Some(tag) = child.tag() else {
            continue;
        };
        match tag {
            "footprint" | "module" => board.footprints.push(parse_footprint(child, &ctx)),
            "segment" | "arc" | "via" => {
                if let Some(track) = parse_track(child, tag, &ctx) {
                    board.tracks.push(track);
                }
            }
            "zone" => board.zones.push(parse_zone(child, &ctx)),
            _ => {
                if let Some(item) = parse_item(child, tag, &Pose::BOARD, TextClass::Board) {
                    board.drawings.push(item);
                }
            }
        }
    }

    Ok(board)
}

/// Major host version from the file's `(version YYYYMMDD)` stamp.
fn host_version(stamp: Option<&str>) -> HostVersion {
    let stamp: u32 = stamp.and_then(|s| s.parse().ok()).unwrap_or(0);
    let major = match stamp {
        s if s >= 20241229 => 9,
        s if s >= 20240108 => 8,
        s if s >= 20221018 => 7,
        s if s >= 20211014 => 6,
        s if s >= 20171130 => 5,
        _ => 4,
    };
    HostVersion { major, minor: 0 }
}

struct Context {
    legacy: bool,
    nets: HashMap<i32, String>,
}

impl Context {
    /// Net name of a node: `(net 3 "GND")`, `(net 3)` or `(net "GND")`.
    fn net_name(&self, node: &SExpr) -> String {
        let Some(net) = node.find("net") else {
            return String::new();
        };
        if let Some(name) = net.atom_at(1) {
            return name.to_string();
        }
        match net.atom_at(0) {
            Some(id) => match id.parse::<i32>() {
                Ok(code) => self.nets.get(&code).cloned().unwrap_or_default(),
                Err(_) => id.to_string(),
            },
            None => String::new(),
        }
    }
}

/// Placement of footprint-local coordinates on the board.
struct Pose {
    origin: Vec2,
    /// Decidegrees.
    angle: f64,
}

impl Pose {
    const BOARD: Pose = Pose {
        origin: Vec2::new(0, 0),
        angle: 0.0,
    };

    fn place(&self, local: [f64; 2]) -> Vec2 {
        let p = self.origin.offset(from_mm(local[0]), from_mm(local[1]));
        rotate_about(p, self.origin, self.angle)
    }
}

fn nm(v: f64) -> i64 {
    from_mm(v)
}

fn local_point(p: [f64; 2]) -> Vec2 {
    Vec2::new(nm(p[0]), nm(p[1]))
}

fn layer_of(node: &SExpr) -> Layer {
    Layer::from_name(node.value("layer").unwrap_or(""))
}

fn stroke_width(node: &SExpr) -> i64 {
    node.value_f64("width")
        .or_else(|| node.find("stroke").and_then(|s| s.value_f64("width")))
        .map_or(0, nm)
}

// ─── Board header ────────────────────────────────────────────────────

fn parse_nets(root: &SExpr) -> Vec<NetInfo> {
    root.find_all("net")
        .filter_map(|n| {
            Some(NetInfo {
                code: n.atom_at(0)?.parse().ok()?,
                name: n.atom_at(1).unwrap_or("").to_string(),
            })
        })
        .collect()
}

fn parse_title_block(root: &SExpr) -> TitleBlock {
    let Some(tb) = root.find("title_block") else {
        return TitleBlock::default();
    };
    let field = |tag: &str| tb.value(tag).unwrap_or("").to_string();
    TitleBlock {
        title: field("title"),
        revision: field("rev"),
        company: field("company"),
        date: field("date"),
    }
}

fn parse_text_vars(root: &SExpr) -> BTreeMap<String, String> {
    root.find_all("property")
        .filter_map(|p| Some((p.atom_at(0)?.to_string(), p.atom_at(1)?.to_string())))
        .collect()
}

// ─── Graphic items ───────────────────────────────────────────────────

fn parse_item(node: &SExpr, tag: &str, pose: &Pose, class: TextClass) -> Option<BoardItem> {
    let kind = tag.strip_prefix("gr_").or_else(|| tag.strip_prefix("fp_"));
    match kind {
        Some(shape @ ("line" | "rect" | "circle" | "arc" | "poly" | "curve")) => {
            parse_shape(node, shape, pose, class == TextClass::Footprint).map(BoardItem::Shape)
        }
        Some("text") => {
            let text = node.atom_at(0).unwrap_or("");
            parse_text(node, text, pose, class).map(BoardItem::Text)
        }
        Some(other) => Some(BoardItem::Other {
            name: other.to_string(),
            layer: layer_of(node),
        }),
        None if matches!(tag, "dimension" | "image" | "target") => Some(BoardItem::Other {
            name: tag.to_string(),
            layer: layer_of(node),
        }),
        None => None,
    }
}

fn parse_shape(node: &SExpr, kind: &str, pose: &Pose, in_footprint: bool) -> Option<GraphicShape> {
    let mut shape = GraphicShape {
        kind: ShapeKind::Segment,
        layer: layer_of(node),
        start: Vec2::default(),
        end: Vec2::default(),
        width: stroke_width(node),
        arc_start: 0.0,
        arc_sweep: 0.0,
        polygon: None,
        bezier: None,
    };
    match kind {
        "line" | "rect" => {
            shape.kind = if kind == "line" {
                ShapeKind::Segment
            } else {
                ShapeKind::Rect
            };
            shape.start = pose.place(node.xy("start")?);
            shape.end = pose.place(node.xy("end")?);
        }
        "circle" => {
            shape.kind = ShapeKind::Circle;
            shape.start = pose.place(node.xy("center").or_else(|| node.xy("start"))?);
            shape.end = pose.place(node.xy("end")?);
        }
        "arc" => {
            shape.kind = ShapeKind::Arc;
            if let Some(mid) = node.xy("mid") {
                let start = pose.place(node.xy("start")?);
                let end = pose.place(node.xy("end")?);
                let arc = arc_from_three_points(start, pose.place(mid), end)?;
                shape.start = arc.center;
                shape.end = start;
                shape.arc_start = arc.start;
                shape.arc_sweep = arc.sweep;
            } else {
                // legacy: center in `start`, arc start point in `end`
                let center = pose.place(node.xy("start")?);
                let from = pose.place(node.xy("end")?);
                shape.start = center;
                shape.end = from;
                shape.arc_start = point_angle(center, from);
                shape.arc_sweep = from_deg(node.value_f64("angle").unwrap_or(0.0));
            }
        }
        "curve" => {
            shape.kind = ShapeKind::Curve;
            let pts = node.points();
            if pts.len() < 4 {
                return None;
            }
            shape.start = pose.place(pts[0]);
            shape.bezier = Some([pose.place(pts[1]), pose.place(pts[2])]);
            shape.end = pose.place(pts[3]);
        }
        "poly" => {
            shape.kind = ShapeKind::Polygon;
            let pts = node.points();
            if pts.is_empty() {
                return None;
            }
            // footprint polygons stay local and unrotated, anchored on the footprint
            let contour: Contour = if in_footprint {
                shape.start = pose.origin;
                pts.into_iter().map(local_point).collect()
            } else {
                pts.into_iter().map(|p| pose.place(p)).collect()
            };
            shape.polygon = Some(PolySet::from_contours(vec![contour]));
        }
        _ => return None,
    }
    Some(shape)
}

fn parse_text(node: &SExpr, text: &str, pose: &Pose, class: TextClass) -> Option<GraphicText> {
    let at = node.find("at");
    let local = [
        at.and_then(|a| a.f64_at(0)).unwrap_or(0.0),
        at.and_then(|a| a.f64_at(1)).unwrap_or(0.0),
    ];
    // the file stores text angles absolute, footprint text included
    let angle = at.and_then(|a| a.f64_at(2)).unwrap_or(0.0);

    let effects = node.find("effects");
    let font = effects.and_then(|e| e.find("font"));
    let size = font.and_then(|f| f.find("size"));
    let height = size.and_then(|s| s.f64_at(0)).unwrap_or(1.0);
    let width = size.and_then(|s| s.f64_at(1)).unwrap_or(height);
    let thickness = font
        .and_then(|f| f.value_f64("thickness"))
        .unwrap_or(0.15);

    let mut justify = [0i8; 2];
    let mut mirrored = false;
    if let Some(j) = effects.and_then(|e| e.find("justify")) {
        for atom in j.atoms() {
            match atom {
                "left" => justify[0] = -1,
                "right" => justify[0] = 1,
                "top" => justify[1] = -1,
                "bottom" => justify[1] = 1,
                "mirror" => mirrored = true,
                _ => {}
            }
        }
    }
    let hidden = node.flag("hide") || effects.is_some_and(|e| e.flag("hide"));

    Some(GraphicText {
        class,
        layer: layer_of(node),
        text: text.to_string(),
        shown_text: None,
        position: pose.place(local),
        visible: !hidden,
        thickness: nm(thickness),
        height: nm(height),
        width: nm(width),
        draw_rotation: None,
        text_angle: None,
        orientation: from_deg(angle),
        justify,
        mirrored,
        italic: font.is_some_and(|f| f.flag("italic")),
        bold: font.is_some_and(|f| f.flag("bold")),
        segments: None,
    })
}

/// Center, start angle and signed sweep of an arc, angles in decidegrees.
struct ArcGeometry {
    center: Vec2,
    start: f64,
    sweep: f64,
}

/// Arc from `p1` through `p2` to `p3`. `None` for collinear points.
fn arc_from_three_points(p1: Vec2, p2: Vec2, p3: Vec2) -> Option<ArcGeometry> {
    let (ax, ay) = (p1.x as f64, p1.y as f64);
    let (bx, by) = (p2.x as f64, p2.y as f64);
    let (cx, cy) = (p3.x as f64, p3.y as f64);

    let d = 2.0 * (ax * (by - cy) + bx * (cy - ay) + cx * (ay - by));
    if d.abs() < 1e-10 {
        return None;
    }
    let ux = ((ax * ax + ay * ay) * (by - cy)
        + (bx * bx + by * by) * (cy - ay)
        + (cx * cx + cy * cy) * (ay - by))
        / d;
    let uy = ((ax * ax + ay * ay) * (cx - bx)
        + (bx * bx + by * by) * (ax - cx)
        + (cx * cx + cy * cy) * (bx - ax))
        / d;
    // angles come from the exact center; only the stored one is snapped to nm
    let angle = |p: Vec2| from_deg((p.y as f64 - uy).atan2(p.x as f64 - ux) * 180.0 / PI);
    let start = angle(p1);
    let to_mid = (angle(p2) - start).rem_euclid(3600.0);
    let to_end = (angle(p3) - start).rem_euclid(3600.0);
    let sweep = if to_mid <= to_end {
        to_end
    } else {
        to_end - 3600.0
    };
    Some(ArcGeometry {
        center: Vec2::new(ux.round() as i64, uy.round() as i64),
        start,
        sweep,
    })
}

/// Angle of `p` around `center` in decidegrees, y axis pointing down.
fn point_angle(center: Vec2, p: Vec2) -> f64 {
    let dy = (p.y - center.y) as f64;
    let dx = (p.x - center.x) as f64;
    from_deg(dy.atan2(dx) * 180.0 / PI)
}

// ─── Footprints ──────────────────────────────────────────────────────

fn parse_footprint(node: &SExpr, ctx: &Context) -> BoardFootprint {
    let at = node.find("at");
    let pose = Pose {
        origin: local_point([
            at.and_then(|a| a.f64_at(0)).unwrap_or(0.0),
            at.and_then(|a| a.f64_at(1)).unwrap_or(0.0),
        ]),
        angle: from_deg(at.and_then(|a| a.f64_at(2)).unwrap_or(0.0)),
    };
    let fpid = node.atom_at(0).unwrap_or("");

    let mut fp = BoardFootprint {
        reference: String::new(),
        value: String::new(),
        footprint_name: fpid.rsplit(':').next().unwrap_or(fpid).to_string(),
        layer: layer_of(node),
        position: pose.origin,
        orientation: pose.angle,
        exclude_from_bom: false,
        reference_text: None,
        value_text: None,
        pads: Vec::new(),
        graphics: Vec::new(),
    };

    for child in node.children() {
        let Some(tag) = child.tag() else {
            continue;
        };
        match tag {
            "fp_text" | "property" => {
                let role = child.atom_at(0).unwrap_or("");
                let text = child.atom_at(1).unwrap_or("");
                match role {
                    "reference" | "Reference" => {
                        fp.reference = text.to_string();
                        fp.reference_text =
                            parse_text(child, text, &pose, TextClass::Footprint);
                    }
                    "value" | "Value" => {
                        fp.value = text.to_string();
                        fp.value_text = parse_text(child, text, &pose, TextClass::Footprint);
                    }
                    _ if tag == "fp_text" => {
                        fp.graphics.extend(
                            parse_text(child, text, &pose, TextClass::Footprint)
                                .map(BoardItem::Text),
                        );
                    }
                    // other properties are fields, not drawings
                    _ => {}
                }
            }
            "pad" => fp.pads.extend(parse_pad(child, &pose, ctx)),
            "attr" => {
                if child
                    .atoms()
                    .any(|a| a == "exclude_from_bom" || a == "virtual")
                {
                    fp.exclude_from_bom = true;
                }
            }
            _ if tag.starts_with("fp_") => {
                fp.graphics
                    .extend(parse_item(child, tag, &pose, TextClass::Footprint));
            }
            _ => {}
        }
    }

    expand_field_refs(&mut fp);
    fp
}

/// Resolve `${REFERENCE}` and `${VALUE}` in user text to what is shown.
fn expand_field_refs(fp: &mut BoardFootprint) {
    let (reference, value) = (fp.reference.clone(), fp.value.clone());
    for item in &mut fp.graphics {
        if let BoardItem::Text(t) = item {
            if t.text.contains("${") {
                t.shown_text = Some(
                    t.text
                        .replace("${REFERENCE}", &reference)
                        .replace("${VALUE}", &value),
                );
            }
        }
    }
}

fn parse_pad(node: &SExpr, pose: &Pose, ctx: &Context) -> Option<BoardPad> {
    let name = node.atom_at(0).unwrap_or("").to_string();
    let attribute = match node.atom_at(1) {
        Some("thru_hole") if ctx.legacy => PadAttribute::Standard,
        Some("thru_hole") => PadAttribute::Pth,
        Some("np_thru_hole") if ctx.legacy => PadAttribute::HoleNotPlated,
        Some("np_thru_hole") => PadAttribute::Npth,
        Some("connect") => PadAttribute::Conn,
        _ => PadAttribute::Smd,
    };

    let mut chamfer_positions = 0u8;
    if let Some(chamfer) = node.find("chamfer") {
        for atom in chamfer.atoms() {
            chamfer_positions |= match atom {
                "top_left" => 1,
                "top_right" => 2,
                "bottom_left" => 4,
                "bottom_right" => 8,
                _ => 0,
            };
        }
    }
    let shape = match node.atom_at(2) {
        Some("rect" | "roundrect") if chamfer_positions != 0 => PadShape::ChamferedRect,
        Some("rect") => PadShape::Rect,
        Some("roundrect") => PadShape::RoundRect,
        Some("oval") => PadShape::Oval,
        Some("circle") => PadShape::Circle,
        Some("trapezoid") => PadShape::Trapezoid,
        Some("custom") => PadShape::Custom,
        other => {
            info!("Unknown pad shape {other:?} on pad {name}, skipping");
            return None;
        }
    };

    let at = node.find("at");
    let local = [
        at.and_then(|a| a.f64_at(0)).unwrap_or(0.0),
        at.and_then(|a| a.f64_at(1)).unwrap_or(0.0),
    ];
    let size = node.xy("size").unwrap_or([0.0, 0.0]);

    let (drill_shape, drill_size, offset) = match node.find("drill") {
        Some(drill) => {
            let offset = drill.xy("offset").map(local_point).unwrap_or_default();
            if drill.atom_at(0) == Some("oval") {
                let w = drill.f64_at(1).unwrap_or(0.0);
                let h = drill.f64_at(2).unwrap_or(w);
                (HostDrillShape::Oblong, local_point([w, h]), offset)
            } else {
                let d = drill.f64_at(0).unwrap_or(0.0);
                (HostDrillShape::Circle, local_point([d, d]), offset)
            }
        }
        None => (HostDrillShape::Circle, Vec2::default(), Vec2::default()),
    };

    let custom_polygon = (shape == PadShape::Custom).then(|| {
        let contours = node
            .find("primitives")
            .map(|prims| {
                prims
                    .find_all("gr_poly")
                    .map(|p| p.points().into_iter().map(local_point).collect())
                    .collect()
            })
            .unwrap_or_default();
        PolySet::from_contours(contours)
    });

    Some(BoardPad {
        name,
        layers: pad_layers(node),
        position: pose.place(local),
        size: local_point(size),
        // pad angles are stored absolute
        orientation: from_deg(at.and_then(|a| a.f64_at(2)).unwrap_or(0.0)),
        shape,
        attribute,
        drill_shape,
        drill_size,
        offset,
        round_rect_ratio: node.value_f64("roundrect_rratio").unwrap_or(0.0),
        chamfer_positions,
        chamfer_ratio: node.value_f64("chamfer_ratio").unwrap_or(0.0),
        custom_polygon,
        net_name: ctx.net_name(node),
    })
}

fn pad_layers(node: &SExpr) -> Vec<Layer> {
    let mut layers = Vec::new();
    for name in node.find("layers").into_iter().flat_map(|l| l.atoms()) {
        match name {
            "*.Cu" | "F&B.Cu" => {
                layers.push(Layer::FrontCopper);
                layers.push(Layer::BackCopper);
            }
            n => layers.push(Layer::from_name(n)),
        }
    }
    layers
}

// ─── Tracks and zones ────────────────────────────────────────────────

fn parse_track(node: &SExpr, tag: &str, ctx: &Context) -> Option<BoardTrack> {
    let net = ctx.net_name(node);
    let width = node.value_f64("width").map_or(0, nm);
    match tag {
        "segment" => Some(BoardTrack::Track {
            start: local_point(node.xy("start")?),
            end: local_point(node.xy("end")?),
            width,
            layer: layer_of(node),
            net,
        }),
        "arc" => {
            let start = local_point(node.xy("start")?);
            let arc = arc_from_three_points(
                start,
                local_point(node.xy("mid")?),
                local_point(node.xy("end")?),
            )?;
            Some(BoardTrack::Arc {
                center: arc.center,
                radius: arc.center.distance(start).round() as i64,
                arc_start: arc.start,
                arc_sweep: arc.sweep,
                width,
                layer: layer_of(node),
                net,
            })
        }
        "via" => {
            let mut span = node
                .find("layers")
                .into_iter()
                .flat_map(|l| l.atoms())
                .map(Layer::from_name);
            let first = span.next().unwrap_or(Layer::FrontCopper);
            let second = span.next().unwrap_or(Layer::BackCopper);
            Some(BoardTrack::Via {
                position: local_point(node.xy("at")?),
                width: node.value_f64("size").map_or(0, nm),
                drill: node.value_f64("drill").map_or(0, nm),
                span: [first, second],
                net,
            })
        }
        _ => None,
    }
}

fn parse_zone(node: &SExpr, ctx: &Context) -> BoardZone {
    let mut layers: Vec<Layer> = match node.find("layers") {
        Some(l) => l
            .atoms()
            .flat_map(|name| match name {
                "*.Cu" | "F&B.Cu" => vec![Layer::FrontCopper, Layer::BackCopper],
                n => vec![Layer::from_name(n)],
            })
            .collect(),
        None => Vec::new(),
    };
    if layers.is_empty() {
        layers.push(layer_of(node));
    }

    let mut fills: Vec<LayerFill> = Vec::new();
    for poly in node.find_all("filled_polygon") {
        let layer = match poly.value("layer") {
            Some(name) => Layer::from_name(name),
            None => layers[0].clone(),
        };
        let outline: Contour = poly.points().into_iter().map(local_point).collect();
        let polygon = PolygonWithHoles {
            outline,
            holes: Vec::new(),
        };
        match fills.iter_mut().find(|f| f.layer == layer) {
            Some(fill) => fill.polygons.polygons.push(polygon),
            None => fills.push(LayerFill {
                layer,
                polygons: PolySet {
                    polygons: vec![polygon],
                },
            }),
        }
    }

    let keepout = node.find("keepout").is_some();
    BoardZone {
        layers,
        net: node
            .value("net_name")
            .map(str::to_string)
            .unwrap_or_else(|| ctx.net_name(node)),
        filled: !fills.is_empty(),
        keepout,
        rule_area: keepout && !ctx.legacy,
        min_thickness: node.value_f64("min_thickness").map_or(0, nm),
        fill_uses_thickness: node.value("filled_areas_thickness") != Some("no"),
        fills,
    }
}
