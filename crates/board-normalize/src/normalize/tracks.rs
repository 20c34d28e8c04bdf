use super::layers::{copper_side, LayerPair};
use super::polygons;
use crate::capabilities::{Capabilities, HostFeature};
use crate::snapshot::{BoardTrack, BoardZone, PolySet};
use crate::types::{LayerData, Side, Track, Zone};
use crate::units::{arc_angles, normalize, to_mm};
use log::info;

/// Group tracks, arcs and vias by outer copper side.
///
/// Tracks and arcs on inner layers are dropped. A via lands in every outer
/// side its span reaches and always carries its net name.
pub fn parse_tracks(tracks: &[BoardTrack], include_nets: bool) -> LayerData<Vec<Track>> {
    let mut result: LayerData<Vec<Track>> = LayerData::default();
    for track in tracks {
        match track {
            BoardTrack::Via {
                position,
                width,
                net,
                ..
            } => {
                let via = Track::Segment {
                    start: normalize(*position),
                    end: normalize(*position),
                    width: to_mm(*width),
                    net: Some(net.clone()),
                };
                for (side, layer) in [
                    (Side::Front, &LayerPair::COPPER.front),
                    (Side::Back, &LayerPair::COPPER.back),
                ] {
                    if track.is_on_layer(layer) {
                        result.get_mut(side).push(via.clone());
                    }
                }
            }
            BoardTrack::Track {
                start,
                end,
                width,
                layer,
                net,
            } => {
                let Some(side) = copper_side(layer) else {
                    continue;
                };
                result.get_mut(side).push(Track::Segment {
                    start: normalize(*start),
                    end: normalize(*end),
                    width: to_mm(*width),
                    net: include_nets.then(|| net.clone()),
                });
            }
            BoardTrack::Arc {
                center,
                radius,
                arc_start,
                arc_sweep,
                width,
                layer,
                net,
            } => {
                let Some(side) = copper_side(layer) else {
                    continue;
                };
                let (startangle, endangle) = arc_angles(*arc_start, *arc_sweep);
                result.get_mut(side).push(Track::Arc {
                    center: normalize(*center),
                    startangle,
                    endangle,
                    radius: to_mm(*radius),
                    width: to_mm(*width),
                    net: include_nets.then(|| net.clone()),
                });
            }
        }
    }
    result
}

/// Filled copper per outer side. Unfilled zones, keepouts and rule areas
/// produce nothing.
pub fn parse_zones(
    zones: &[BoardZone],
    caps: &Capabilities,
    include_nets: bool,
) -> LayerData<Vec<Zone>> {
    let mut result: LayerData<Vec<Zone>> = LayerData::default();
    if !caps.has(HostFeature::Zones) {
        info!("Zones are not supported on this host, skipping");
        return result;
    }
    let empty = PolySet::default();
    for zone in zones {
        if !zone.filled
            || (caps.has(HostFeature::ZoneKeepout) && zone.keepout)
            || (caps.has(HostFeature::RuleAreas) && zone.rule_area)
        {
            continue;
        }
        let width = if caps.has(HostFeature::FillThicknessFlag) && !zone.fill_uses_thickness {
            0.0
        } else {
            to_mm(zone.min_thickness)
        };
        for layer in &zone.layers {
            let Some(side) = copper_side(layer) else {
                continue;
            };
            // older hosts keep one fill shared by every layer
            let fill = if caps.has(HostFeature::PerLayerZoneFill) {
                zone.fills.iter().find(|f| f.layer == *layer)
            } else {
                zone.fills.first()
            };
            let set = fill.map_or(&empty, |f| &f.polygons);
            result.get_mut(side).push(Zone {
                polygons: polygons::extract(set, caps),
                width,
                net: include_nets.then(|| zone.net.clone()),
            });
        }
    }
    result
}
