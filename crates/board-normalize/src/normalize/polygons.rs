use crate::capabilities::{Capabilities, HostFeature};
use crate::snapshot::PolySet;
use crate::types::Polygons;
use crate::units::normalize;
use log::warn;

/// Flatten a polygon set into point sequences, outlines and holes alike, in
/// source order and winding.
///
/// Hosts that cannot enumerate outline points yield whatever was collected
/// before the first outline, with a warning.
pub fn extract(set: &PolySet, caps: &Capabilities) -> Polygons {
    let mut result = Vec::new();
    for contour in set.contours() {
        if !caps.has(HostFeature::OutlinePointAccess) {
            warn!("Outline points are not accessible on this host, polygon data truncated");
            return result;
        }
        result.push(contour.iter().map(|p| normalize(*p)).collect());
    }
    result
}
