use super::polygons;
use crate::capabilities::{Capabilities, HostFeature};
use crate::snapshot::{BoardPad, HostDrillShape, Layer};
use crate::types::{DrillShape, Mount, Pad, PadKind, PadShapeData, Side};
use crate::units::{normalize, to_deg, to_mm};
use log::{info, warn};

/// Convert a host pad into its canonical record. Shapes the host table does
/// not map are logged and skipped.
pub fn parse_pad(pad: &BoardPad, caps: &Capabilities, include_nets: bool) -> Option<Pad> {
    let mut layers = Vec::new();
    if pad.layers.contains(&Layer::FrontCopper) {
        layers.push(Side::Front);
    }
    if pad.layers.contains(&Layer::BackCopper) {
        layers.push(Side::Back);
    }

    let Some(kind) = caps.pad_shapes.lookup(pad.shape) else {
        info!("Unsupported pad shape {:?}, skipping.", pad.shape);
        return None;
    };

    let radius = || to_mm(pad.corner_radius());
    let shape = match kind {
        PadKind::Rect => PadShapeData::Rect,
        PadKind::Oval => PadShapeData::Oval,
        PadKind::Circle => PadShapeData::Circle,
        PadKind::RoundRect => PadShapeData::RoundRect { radius: radius() },
        PadKind::ChamfRect => PadShapeData::ChamfRect {
            radius: radius(),
            chamfpos: pad.chamfer_positions,
            chamfratio: pad.chamfer_ratio,
        },
        PadKind::Custom => {
            let polygons = match &pad.custom_polygon {
                Some(set) => {
                    if set.has_holes() {
                        warn!("Detected holes in custom pad polygons");
                    }
                    if set.is_self_intersecting() {
                        warn!("Detected self intersecting polygons in custom pad");
                    }
                    polygons::extract(set, caps)
                }
                None => Vec::new(),
            };
            PadShapeData::Custom { polygons }
        }
    };

    let mount = if caps.is_through_hole(pad.attribute) {
        Mount::ThroughHole {
            drillshape: match pad.drill_shape {
                HostDrillShape::Circle => DrillShape::Circle,
                HostDrillShape::Oblong => DrillShape::Oblong,
            },
            drillsize: normalize(pad.drill_size),
        }
    } else {
        Mount::SurfaceMount
    };

    Some(Pad {
        layers,
        pos: normalize(pad.position),
        size: normalize(pad.size),
        angle: -to_deg(pad.orientation),
        shape,
        mount,
        offset: caps
            .has(HostFeature::PadOffset)
            .then(|| normalize(pad.offset)),
        net: include_nets.then(|| pad.net_name.clone()),
        pin1: None,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::snapshot::{HostInfo, HostVersion, PadAttribute, PadShape, PolySet, PolygonWithHoles, Vec2};

    pub(crate) fn board_pad(name: &str) -> BoardPad {
        BoardPad {
            name: name.to_string(),
            layers: vec![Layer::FrontCopper, Layer::Other("F.Paste".to_string())],
            position: Vec2::new(1_000_000, 2_000_000),
            size: Vec2::new(1_500_000, 1_000_000),
            orientation: 900.0,
            shape: PadShape::Rect,
            attribute: PadAttribute::Smd,
            drill_shape: HostDrillShape::Circle,
            drill_size: Vec2::default(),
            offset: Vec2::default(),
            round_rect_ratio: 0.25,
            chamfer_positions: 0,
            chamfer_ratio: 0.0,
            custom_polygon: None,
            net_name: "GND".to_string(),
        }
    }

    #[test]
    fn test_smd_pad() {
        let pad = parse_pad(&board_pad("1"), &Capabilities::full(), false).unwrap();
        assert_eq!(pad.layers, vec![Side::Front]);
        assert_eq!(pad.pos, [1.0, 2.0]);
        assert_eq!(pad.size, [1.5, 1.0]);
        assert_eq!(pad.angle, -90.0);
        assert_eq!(pad.shape, PadShapeData::Rect);
        assert_eq!(pad.mount, Mount::SurfaceMount);
        assert_eq!(pad.offset, Some([0.0, 0.0]));
        assert_eq!(pad.net, None);
        assert_eq!(pad.pin1, None);
    }

    #[test]
    fn test_through_hole_pad() {
        let mut p = board_pad("1");
        p.layers = vec![Layer::FrontCopper, Layer::BackCopper];
        p.attribute = PadAttribute::Npth;
        p.drill_shape = HostDrillShape::Oblong;
        p.drill_size = Vec2::new(800_000, 1_200_000);
        let pad = parse_pad(&p, &Capabilities::full(), true).unwrap();
        assert_eq!(pad.layers, vec![Side::Front, Side::Back]);
        assert_eq!(
            pad.mount,
            Mount::ThroughHole {
                drillshape: DrillShape::Oblong,
                drillsize: [0.8, 1.2]
            }
        );
        assert_eq!(pad.net.as_deref(), Some("GND"));
    }

    #[test]
    fn test_legacy_attribute_names() {
        let legacy = Capabilities::detect(&HostInfo {
            version: HostVersion { major: 5, minor: 1 },
            unavailable: vec![],
        });
        let mut p = board_pad("1");
        p.attribute = PadAttribute::Standard;
        assert!(parse_pad(&p, &legacy, false).unwrap().is_through_hole());
        p.attribute = PadAttribute::Pth;
        assert!(!parse_pad(&p, &legacy, false).unwrap().is_through_hole());
    }

    #[test]
    fn test_roundrect_and_chamfer() {
        let mut p = board_pad("1");
        p.shape = PadShape::RoundRect;
        let pad = parse_pad(&p, &Capabilities::full(), false).unwrap();
        assert_eq!(pad.shape, PadShapeData::RoundRect { radius: 0.25 });

        p.shape = PadShape::ChamferedRect;
        p.chamfer_positions = 1 | 8;
        p.chamfer_ratio = 0.2;
        let pad = parse_pad(&p, &Capabilities::full(), false).unwrap();
        assert_eq!(
            pad.shape,
            PadShapeData::ChamfRect {
                radius: 0.25,
                chamfpos: 9,
                chamfratio: 0.2
            }
        );
    }

    #[test]
    fn test_unknown_shape_skipped() {
        let mut p = board_pad("1");
        p.shape = PadShape::Trapezoid;
        assert!(parse_pad(&p, &Capabilities::full(), false).is_none());

        let legacy = Capabilities::detect(&HostInfo {
            version: HostVersion { major: 4, minor: 0 },
            unavailable: vec![],
        });
        p.shape = PadShape::RoundRect;
        assert!(parse_pad(&p, &legacy, false).is_none());
    }

    #[test]
    fn test_custom_pad_with_hole_still_parsed() {
        let mut p = board_pad("1");
        p.shape = PadShape::Custom;
        p.custom_polygon = Some(PolySet {
            polygons: vec![PolygonWithHoles {
                outline: vec![
                    Vec2::new(0, 0),
                    Vec2::new(2_000_000, 0),
                    Vec2::new(2_000_000, 2_000_000),
                    Vec2::new(0, 2_000_000),
                ],
                holes: vec![vec![
                    Vec2::new(500_000, 500_000),
                    Vec2::new(1_000_000, 500_000),
                    Vec2::new(1_000_000, 1_000_000),
                ]],
            }],
        });
        let pad = parse_pad(&p, &Capabilities::full(), false).unwrap();
        let PadShapeData::Custom { polygons } = pad.shape else {
            panic!("expected custom pad");
        };
        assert_eq!(polygons.len(), 2);
        assert_eq!(polygons[0][2], [2.0, 2.0]);
    }
}
