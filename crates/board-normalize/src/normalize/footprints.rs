use super::layers::copper_side;
use super::pads::parse_pad;
use super::Normalizer;
use crate::snapshot::{BoardFootprint, Vec2};
use crate::types::{Footprint, FootprintBBox, FootprintDrawing, Pad};
use crate::units::{normalize, to_deg};

/// Designators commonly given to the first pin, in no particular order.
pub const PIN1_NAMES: [&str; 5] = ["1", "A", "A1", "P1", "PAD1"];

/// Assemble one footprint: its boxes, copper drawings and pads.
pub fn assemble(n: &mut Normalizer<'_>, f: &BoardFootprint) -> Footprint {
    let local = {
        let mut copy = f.clone();
        copy.set_orientation(0.0);
        copy.set_position(Vec2::new(0, 0));
        copy.bounding_box()
    };
    let bbox = FootprintBBox {
        pos: normalize(f.position),
        relpos: normalize(local.min),
        size: normalize(local.size()),
        angle: to_deg(f.orientation),
    };

    // silkscreen and fabrication are collected board-wide
    let mut drawings = Vec::new();
    for item in &f.graphics {
        let Some(layer) = copper_side(item.layer()) else {
            continue;
        };
        if let Some(drawing) = n.parse_drawing(item, Some(f)) {
            drawings.push(FootprintDrawing { layer, drawing });
        }
    }

    let mut names = Vec::new();
    let mut pads = Vec::new();
    for p in &f.pads {
        if let Some(pad) = parse_pad(p, n.caps, n.include_nets) {
            names.push(p.name.as_str());
            pads.push(pad);
        }
    }
    mark_pin1(&names, &mut pads);

    Footprint {
        ref_: f.reference.clone(),
        bbox,
        pads,
        drawings,
        layer: copper_side(&f.layer),
    }
}

/// Flag the most likely first pin.
///
/// Designators are compared lexicographically. The earliest designator from
/// `PIN1_NAMES` wins; without one the smallest designator overall is used.
/// At most one pad is flagged, the first in source order on ties.
pub fn mark_pin1(names: &[&str], pads: &mut [Pad]) {
    let mut order: Vec<usize> = (0..names.len().min(pads.len())).collect();
    order.sort_by(|&a, &b| names[a].cmp(names[b]));
    let chosen = order
        .iter()
        .copied()
        .find(|&i| PIN1_NAMES.contains(&names[i]))
        .or_else(|| order.first().copied());
    if let Some(i) = chosen {
        pads[i].pin1 = Some(1);
    }
}
