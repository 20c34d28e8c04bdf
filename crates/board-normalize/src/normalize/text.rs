use crate::capabilities::{Capabilities, TextStrategy};
use crate::font::FontService;
use crate::snapshot::{GraphicText, Vec2};
use crate::types::{TextAttr, TextBody, TextItem};
use crate::units::{normalize, round_f64, to_deg, to_mm};
use log::debug;

/// Convert a text item. Invisible text yields `None`.
pub fn parse_text(
    d: &GraphicText,
    caps: &Capabilities,
    fonts: &mut dyn FontService,
) -> Option<TextItem> {
    if !d.visible {
        return None;
    }
    let text = d.shown();
    fonts.add_string(text);
    let thickness = to_mm(d.thickness);

    let body = match (caps.text, &d.segments) {
        (TextStrategy::StrokeSegments, Some(segments)) => TextBody::Stroke {
            svgpath: svg_path(&stroke_lines(segments)),
            thickness,
        },
        _ => {
            let angle = d
                .draw_rotation
                .or(d.text_angle)
                .unwrap_or(d.orientation);
            let mut attr = Vec::new();
            if d.mirrored {
                attr.push(TextAttr::Mirrored);
            }
            if d.italic {
                attr.push(TextAttr::Italic);
            }
            if d.bold {
                attr.push(TextAttr::Bold);
            }
            TextBody::Metadata {
                pos: normalize(d.position),
                text: text.to_string(),
                height: to_mm(d.height),
                width: to_mm(d.width),
                justify: d.justify,
                thickness,
                attr,
                angle: to_deg(angle),
            }
        }
    };

    Some(TextItem {
        body,
        is_ref: None,
        val: None,
    })
}

/// Join a flat endpoint list (two points per stroke) into polylines. A new
/// polyline starts whenever a stroke does not begin where the previous ended.
pub fn stroke_lines(segments: &[Vec2]) -> Vec<Vec<[f64; 2]>> {
    if segments.len() % 2 != 0 {
        debug!("odd stroke endpoint count {}, dropping the last", segments.len());
    }
    let mut lines: Vec<Vec<[f64; 2]>> = Vec::new();
    for (i, pair) in segments.chunks_exact(2).enumerate() {
        if i == 0 || segments[2 * i - 1] != pair[0] {
            lines.push(vec![normalize(pair[0])]);
        }
        if let Some(line) = lines.last_mut() {
            line.push(normalize(pair[1]));
        }
    }
    lines
}

/// Encode polylines as an SVG path of move/line commands.
pub fn svg_path(lines: &[Vec<[f64; 2]>]) -> String {
    let mut path = String::new();
    for line in lines {
        for (i, p) in line.iter().enumerate() {
            let cmd = if i == 0 { 'M' } else { 'L' };
            path.push_str(&format!(
                "{cmd}{} {}",
                round_f64(p[0], 6),
                round_f64(p[1], 6)
            ));
        }
    }
    path
}
