//! One-time capability detection.
//!
//! Host feature availability is resolved once per extraction into a fixed
//! `Capabilities` value. Normalizers consume it and never query the host on their own.

use crate::snapshot::{HostInfo, HostVersion, PadAttribute, PadShape};
use crate::types::PadKind;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Optional host features the engine adapts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostFeature {
    PolygonOutlines,
    OutlinePointAccess,
    TextSegments,
    RoundRectPads,
    CustomPads,
    ChamferedPads,
    PadOffset,
    Zones,
    ZoneKeepout,
    RuleAreas,
    PerLayerZoneFill,
    FillThicknessFlag,
    TextVariables,
    NetInfo,
}

impl HostFeature {
    pub const ALL: [HostFeature; 14] = [
        HostFeature::PolygonOutlines,
        HostFeature::OutlinePointAccess,
        HostFeature::TextSegments,
        HostFeature::RoundRectPads,
        HostFeature::CustomPads,
        HostFeature::ChamferedPads,
        HostFeature::PadOffset,
        HostFeature::Zones,
        HostFeature::ZoneKeepout,
        HostFeature::RuleAreas,
        HostFeature::PerLayerZoneFill,
        HostFeature::FillThicknessFlag,
        HostFeature::TextVariables,
        HostFeature::NetInfo,
    ];

    /// Host major versions `[introduced, removed)` that carry the feature.
    fn supported_majors(self) -> (u32, Option<u32>) {
        match self {
            HostFeature::PadOffset | HostFeature::NetInfo => (4, None),
            HostFeature::PolygonOutlines
            | HostFeature::OutlinePointAccess
            | HostFeature::RoundRectPads
            | HostFeature::CustomPads
            | HostFeature::ChamferedPads
            | HostFeature::Zones => (5, None),
            HostFeature::ZoneKeepout => (5, Some(6)),
            HostFeature::FillThicknessFlag => (5, Some(7)),
            HostFeature::RuleAreas
            | HostFeature::PerLayerZoneFill
            | HostFeature::TextVariables => (6, None),
            HostFeature::TextSegments => (7, None),
        }
    }

    fn present_in(self, version: HostVersion) -> bool {
        let (since, until) = self.supported_majors();
        version.major >= since && until.map_or(true, |u| version.major < u)
    }
}

/// How text primitives are converted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextStrategy {
    /// Host decomposes text into stroke segments.
    StrokeSegments,
    /// Position/size/justification metadata, rendered downstream.
    Metadata,
}

/// Host pad shape to canonical kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PadShapeTable(BTreeMap<PadShape, PadKind>);

impl PadShapeTable {
    fn build(features: &BTreeSet<HostFeature>) -> Self {
        let mut table = BTreeMap::from([
            (PadShape::Rect, PadKind::Rect),
            (PadShape::Oval, PadKind::Oval),
            (PadShape::Circle, PadKind::Circle),
        ]);
        if features.contains(&HostFeature::RoundRectPads) {
            table.insert(PadShape::RoundRect, PadKind::RoundRect);
        }
        if features.contains(&HostFeature::CustomPads) {
            table.insert(PadShape::Custom, PadKind::Custom);
        }
        if features.contains(&HostFeature::ChamferedPads) {
            table.insert(PadShape::ChamferedRect, PadKind::ChamfRect);
        }
        Self(table)
    }

    pub fn lookup(&self, shape: PadShape) -> Option<PadKind> {
        self.0.get(&shape).copied()
    }
}

#[derive(Debug, Clone)]
pub struct Capabilities {
    features: BTreeSet<HostFeature>,
    pub pad_shapes: PadShapeTable,
    pub text: TextStrategy,
    pub through_hole: [PadAttribute; 2],
}

impl Capabilities {
    pub fn detect(host: &HostInfo) -> Self {
        let features: BTreeSet<HostFeature> = HostFeature::ALL
            .into_iter()
            .filter(|f| f.present_in(host.version) && !host.unavailable.contains(f))
            .collect();
        let text = if features.contains(&HostFeature::TextSegments) {
            TextStrategy::StrokeSegments
        } else {
            TextStrategy::Metadata
        };
        let through_hole = if host.version.major >= 6 {
            [PadAttribute::Pth, PadAttribute::Npth]
        } else {
            [PadAttribute::Standard, PadAttribute::HoleNotPlated]
        };
        let pad_shapes = PadShapeTable::build(&features);
        log::debug!(
            "host {}.{} capabilities: {:?}",
            host.version.major,
            host.version.minor,
            features
        );
        Self {
            features,
            pad_shapes,
            text,
            through_hole,
        }
    }

    /// Everything available, for a current host.
    pub fn full() -> Self {
        Self::detect(&HostInfo::default())
    }

    pub fn has(&self, feature: HostFeature) -> bool {
        self.features.contains(&feature)
    }

    pub fn is_through_hole(&self, attr: PadAttribute) -> bool {
        self.through_hole.contains(&attr)
    }
}
