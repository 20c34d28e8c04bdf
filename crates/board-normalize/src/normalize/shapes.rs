use super::polygons;
use crate::capabilities::{Capabilities, HostFeature};
use crate::snapshot::{GraphicShape, ShapeKind};
use crate::types::{BBox, Shape};
use crate::units::{arc_angles, normalize, to_deg, to_mm, NM_PER_MM};
use log::info;

/// Convert a host shape into its canonical record.
///
/// `owner_orientation` is the orientation (decidegrees) of the footprint that
/// owns the shape, if any; polygons inherit it.
pub fn parse_shape(
    d: &GraphicShape,
    owner_orientation: Option<f64>,
    caps: &Capabilities,
) -> Option<Shape> {
    let start = normalize(d.start);
    let end = normalize(d.end);
    let width = to_mm(d.width);
    match d.kind {
        ShapeKind::Segment => Some(Shape::Segment { start, end, width }),
        ShapeKind::Rect => Some(Shape::Rect { start, end, width }),
        ShapeKind::Circle => Some(Shape::Circle {
            start,
            radius: d.radius() / NM_PER_MM,
            width,
        }),
        ShapeKind::Arc => {
            let (startangle, endangle) = arc_angles(d.arc_start, d.arc_sweep);
            Some(Shape::Arc {
                start,
                radius: d.radius() / NM_PER_MM,
                startangle,
                endangle,
                width,
            })
        }
        ShapeKind::Polygon => {
            if !caps.has(HostFeature::PolygonOutlines) {
                info!("Polygons not supported by this host, skipping");
                return None;
            }
            let polygons = d
                .polygon
                .as_ref()
                .map(|set| polygons::extract(set, caps))
                .unwrap_or_default();
            Some(Shape::Polygon {
                pos: start,
                angle: owner_orientation.map(to_deg).unwrap_or(0.0),
                polygons,
            })
        }
        ShapeKind::Curve => {
            let [cpa, cpb] = d.bezier.unwrap_or([d.start, d.end]);
            Some(Shape::Curve {
                start,
                cpa: normalize(cpa),
                cpb: normalize(cpb),
                end,
                width,
            })
        }
        ShapeKind::Unsupported => {
            info!("Unsupported shape on layer {}, skipping", d.layer.name());
            None
        }
    }
}

/// Box of an arc, including any axis extremes the sweep passes through.
fn arc_bbox(center: [f64; 2], radius: f64, startangle: f64, endangle: f64) -> BBox {
    let at = |deg: f64| {
        let rad = deg.to_radians();
        [center[0] + radius * rad.cos(), center[1] + radius * rad.sin()]
    };
    let p = at(startangle);
    let mut bbox = BBox::from_point(p[0], p[1]);
    let p = at(endangle);
    bbox.expand_point(p[0], p[1]);
    if endangle - startangle >= 360.0 {
        bbox.expand_point(center[0] - radius, center[1] - radius);
        bbox.expand_point(center[0] + radius, center[1] + radius);
        return bbox;
    }
    let mut quadrant = (startangle / 90.0).ceil() * 90.0;
    while quadrant <= endangle {
        let p = at(quadrant);
        bbox.expand_point(p[0], p[1]);
        quadrant += 90.0;
    }
    bbox
}

/// Bounding box of a normalized shape, stroke width excluded.
pub fn shape_bbox(shape: &Shape) -> Option<BBox> {
    match shape {
        Shape::Segment { start, end, .. } | Shape::Rect { start, end, .. } => {
            let mut bbox = BBox::from_point(start[0], start[1]);
            bbox.expand_point(end[0], end[1]);
            Some(bbox)
        }
        Shape::Circle { start, radius, .. } => {
            let mut bbox = BBox::from_point(start[0] - radius, start[1] - radius);
            bbox.expand_point(start[0] + radius, start[1] + radius);
            Some(bbox)
        }
        Shape::Arc {
            start,
            radius,
            startangle,
            endangle,
            ..
        } => Some(arc_bbox(*start, *radius, *startangle, *endangle)),
        Shape::Curve {
            start,
            cpa,
            cpb,
            end,
            ..
        } => {
            let mut bbox = BBox::from_point(start[0], start[1]);
            for p in [cpa, cpb, end] {
                bbox.expand_point(p[0], p[1]);
            }
            Some(bbox)
        }
        Shape::Polygon {
            pos,
            angle,
            polygons,
        } => {
            let (sin_a, cos_a) = (-angle.to_radians()).sin_cos();
            let mut bbox: Option<BBox> = None;
            for p in polygons.iter().flatten() {
                let x = pos[0] + p[0] * cos_a - p[1] * sin_a;
                let y = pos[1] + p[0] * sin_a + p[1] * cos_a;
                bbox = Some(match bbox {
                    Some(mut b) => {
                        b.expand_point(x, y);
                        b
                    }
                    None => BBox::from_point(x, y),
                });
            }
            bbox
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{HostInfo, HostVersion, Layer, PolySet, Vec2};
    use approx::assert_abs_diff_eq;

    fn shape(kind: ShapeKind) -> GraphicShape {
        GraphicShape {
            kind,
            layer: Layer::EdgeCuts,
            start: Vec2::new(0, 0),
            end: Vec2::new(10_000_000, 5_000_000),
            width: 150_000,
            arc_start: 0.0,
            arc_sweep: 0.0,
            polygon: None,
            bezier: None,
        }
    }

    #[test]
    fn test_segment() {
        let caps = Capabilities::full();
        let s = parse_shape(&shape(ShapeKind::Segment), None, &caps).unwrap();
        assert_eq!(
            s,
            Shape::Segment {
                start: [0.0, 0.0],
                end: [10.0, 5.0],
                width: 0.15
            }
        );
    }

    #[test]
    fn test_circle_radius() {
        let mut d = shape(ShapeKind::Circle);
        d.end = Vec2::new(3_000_000, 4_000_000);
        let Some(Shape::Circle { radius, .. }) = parse_shape(&d, None, &Capabilities::full())
        else {
            panic!("expected circle");
        };
        assert_abs_diff_eq!(radius, 5.0, epsilon = 1e-9);
    }

    #[test]
    fn test_arc_negative_sweep() {
        let mut d = shape(ShapeKind::Arc);
        d.arc_start = 450.0;
        d.arc_sweep = -900.0;
        let Some(Shape::Arc {
            startangle,
            endangle,
            ..
        }) = parse_shape(&d, None, &Capabilities::full())
        else {
            panic!("expected arc");
        };
        assert_eq!(startangle, -45.0);
        assert_eq!(endangle, 45.0);
    }

    #[test]
    fn test_polygon_inherits_owner_angle() {
        let mut d = shape(ShapeKind::Polygon);
        d.polygon = Some(PolySet::from_contours(vec![vec![
            Vec2::new(0, 0),
            Vec2::new(1_000_000, 0),
            Vec2::new(0, 1_000_000),
        ]]));
        let Some(Shape::Polygon {
            angle, polygons, ..
        }) = parse_shape(&d, Some(900.0), &Capabilities::full())
        else {
            panic!("expected polygon");
        };
        assert_eq!(angle, 90.0);
        assert_eq!(polygons, vec![vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]]]);
    }

    #[test]
    fn test_polygon_skipped_on_legacy_host() {
        let caps = Capabilities::detect(&HostInfo {
            version: HostVersion { major: 4, minor: 0 },
            unavailable: vec![],
        });
        let mut d = shape(ShapeKind::Polygon);
        d.polygon = Some(PolySet::default());
        assert!(parse_shape(&d, None, &caps).is_none());
    }

    #[test]
    fn test_curve_control_points() {
        let mut d = shape(ShapeKind::Curve);
        d.bezier = Some([Vec2::new(1_000_000, 2_000_000), Vec2::new(3_000_000, 4_000_000)]);
        let s = parse_shape(&d, None, &Capabilities::full()).unwrap();
        assert_eq!(
            s,
            Shape::Curve {
                start: [0.0, 0.0],
                cpa: [1.0, 2.0],
                cpb: [3.0, 4.0],
                end: [10.0, 5.0],
                width: 0.15
            }
        );
    }

    #[test]
    fn test_unsupported_skipped() {
        assert!(parse_shape(&shape(ShapeKind::Unsupported), None, &Capabilities::full()).is_none());
    }

    #[test]
    fn test_quarter_arc_bbox() {
        let arc = Shape::Arc {
            start: [0.0, 0.0],
            radius: 2.0,
            startangle: -45.0,
            endangle: 45.0,
            width: 0.1,
        };
        let b = shape_bbox(&arc).unwrap();
        assert_abs_diff_eq!(b.maxx, 2.0, epsilon = 1e-9);
        assert_abs_diff_eq!(b.minx, 2.0 * 45f64.to_radians().cos(), epsilon = 1e-9);
        assert_abs_diff_eq!(b.miny, -b.maxy, epsilon = 1e-9);
    }
}
