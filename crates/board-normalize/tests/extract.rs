use approx::assert_abs_diff_eq;
use board_normalize::types::{ComponentAttr, DrawingItem, Shape, Side, TextBody, Track};
use board_normalize::{
    extract, extract_board, parse_board, AssemblyError, BoardFormat, ExtractError,
    ExtractOptions, GlyphRecorder,
};
use std::path::{Path, PathBuf};

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn all_options() -> ExtractOptions {
    ExtractOptions {
        include_tracks: true,
        include_nets: true,
        ..Default::default()
    }
}

fn pin1_names(pads: &[board_normalize::types::Pad], names: &[&str]) -> Vec<String> {
    pads.iter()
        .zip(names)
        .filter(|(p, _)| p.pin1 == Some(1))
        .map(|(_, n)| n.to_string())
        .collect()
}

#[test]
fn test_kicad_board_outline() {
    let out = extract(&fixture("sensor.kicad_pcb"), &ExtractOptions::default()).unwrap();
    let bbox = out.document.edges_bbox;
    assert_abs_diff_eq!(bbox.minx, 0.0, epsilon = 1e-9);
    assert_abs_diff_eq!(bbox.miny, 0.0, epsilon = 1e-9);
    assert_abs_diff_eq!(bbox.maxx, 10.0, epsilon = 1e-9);
    assert_abs_diff_eq!(bbox.maxy, 5.0, epsilon = 1e-9);
    assert_eq!(out.document.edges.len(), 2);
}

#[test]
fn test_kicad_metadata() {
    let out = extract(&fixture("sensor.kicad_pcb"), &ExtractOptions::default()).unwrap();
    let meta = &out.document.metadata;
    assert_eq!(meta.title, "Sensor Node");
    assert_eq!(meta.revision, "A");
    assert_eq!(meta.company, "Acme Instruments");
    assert_eq!(meta.date, "2024-03-01");
}

#[test]
fn test_kicad_pin1_selection() {
    let out = extract(&fixture("sensor.kicad_pcb"), &ExtractOptions::default()).unwrap();
    let fps = &out.document.footprints;
    assert_eq!(fps.len(), 3);

    assert_eq!(fps[0].ref_, "J1");
    assert_eq!(pin1_names(&fps[0].pads, &["2", "1", "3"]), vec!["1"]);
    assert!(fps[0].pads.iter().all(|p| p.is_through_hole()));

    assert_eq!(fps[1].ref_, "U1");
    assert_eq!(fps[1].layer, Some(Side::Back));
    assert_eq!(pin1_names(&fps[1].pads, &["B2", "B1"]), vec!["B1"]);
    assert_eq!(fps[1].pads[0].layers, vec![Side::Back]);

    for fp in fps {
        assert!(fp.pads.iter().filter(|p| p.pin1.is_some()).count() <= 1);
    }
}

#[test]
fn test_kicad_drawings_by_layer() {
    let out = extract(&fixture("sensor.kicad_pcb"), &ExtractOptions::default()).unwrap();
    let silk = &out.document.drawings.silkscreen;
    let fab = &out.document.drawings.fabrication;
    // board text, J1 reference and outline; the hidden logo reference is dropped
    assert_eq!(silk.front.len(), 3);
    assert_eq!(silk.back.len(), 1);
    assert_eq!(fab.front.len(), 1);
    assert_eq!(fab.back.len(), 1);

    let refs = silk
        .front
        .iter()
        .filter(|d| matches!(d, DrawingItem::Text(t) if t.is_ref == Some(1)))
        .count();
    assert_eq!(refs, 1);

    let DrawingItem::Text(u1) = &silk.back[0] else {
        panic!("expected text");
    };
    let TextBody::Metadata { text, attr, .. } = &u1.body else {
        panic!("file loaders produce text metadata");
    };
    assert_eq!(text, "U1");
    assert!(!attr.is_empty());
}

#[test]
fn test_kicad_tracks_zones_nets() {
    let out = extract(&fixture("sensor.kicad_pcb"), &all_options()).unwrap();
    let tracks = out.document.tracks.as_ref().unwrap();
    assert_eq!(tracks.front.len(), 2);
    assert_eq!(tracks.back.len(), 2);
    let Track::Segment { net, .. } = &tracks.front[0] else {
        panic!("expected segment");
    };
    assert_eq!(net.as_deref(), Some("VCC"));

    // the unfilled VCC zone contributes nothing
    let zones = out.document.zones.as_ref().unwrap();
    assert!(zones.front.is_empty());
    assert_eq!(zones.back.len(), 1);
    assert_eq!(zones.back[0].net.as_deref(), Some("GND"));
    assert_eq!(zones.back[0].polygons[0].len(), 4);

    let nets = out.document.nets.as_ref().unwrap();
    assert_eq!(nets, &vec!["", "/SDA", "GND", "VCC"]);
    assert!(nets.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn test_kicad_optional_sections_off_by_default() {
    let out = extract(&fixture("sensor.kicad_pcb"), &ExtractOptions::default()).unwrap();
    assert!(out.document.tracks.is_none());
    assert!(out.document.zones.is_none());
    assert!(out.document.nets.is_none());
    let json = serde_json::to_value(&out.document).unwrap();
    assert!(json.get("tracks").is_none());
    assert!(json["bom"].as_object().unwrap().is_empty());
}

#[test]
fn test_kicad_components() {
    let out = extract(&fixture("sensor.kicad_pcb"), &ExtractOptions::default()).unwrap();
    let comps = &out.components;
    assert_eq!(comps.len(), 3);
    assert_eq!(comps[0].ref_, "J1");
    assert_eq!(comps[0].footprint_name, "Header_1x03");
    assert_eq!(comps[1].layer, Some(Side::Back));
    assert_eq!(comps[2].attr, ComponentAttr::Virtual);
}

#[test]
fn test_field_source() {
    let path = std::env::temp_dir().join("board-normalize-it-fields.json");
    std::fs::write(&path, br#"{"J1": {"MPN": "PH-3"}, "U1": {"MPN": "MCU-1"}}"#).unwrap();
    let opts = ExtractOptions {
        extra_fields: vec!["MPN".to_string()],
        field_source: Some(path.clone()),
        ..Default::default()
    };
    let out = extract(&fixture("sensor.kicad_pcb"), &opts);
    std::fs::remove_file(&path).ok();
    let out = out.unwrap();
    assert_eq!(out.components[0].extra_fields["MPN"], "PH-3");
    // LOGO1 is absent from the field data
    assert!(out.components[2].extra_fields.is_empty());
}

#[test]
fn test_missing_field_source_fails() {
    let opts = ExtractOptions {
        dnp_field: Some("DNP".to_string()),
        field_source: Some(PathBuf::from("/nonexistent/fields.json")),
        ..Default::default()
    };
    let err = extract(&fixture("sensor.kicad_pcb"), &opts).unwrap_err();
    assert!(err.is_hard_failure());
    assert!(matches!(
        err,
        ExtractError::Assembly(AssemblyError::FieldSourceUnavailable(_))
    ));
}

#[test]
fn test_json_snapshot() {
    let out = extract(&fixture("snapshot.json"), &ExtractOptions::default()).unwrap();
    let doc = &out.document;
    assert_eq!(doc.metadata.title, "snapshot");
    assert_eq!(doc.metadata.revision, "3");
    assert_abs_diff_eq!(doc.edges_bbox.maxx, 20.0, epsilon = 1e-9);
    assert_abs_diff_eq!(doc.edges_bbox.maxy, 10.0, epsilon = 1e-9);

    // the image item is skipped
    assert_eq!(doc.drawings.silkscreen.front.len(), 1);
    let DrawingItem::Shape(Shape::Arc {
        startangle,
        endangle,
        radius,
        ..
    }) = &doc.drawings.silkscreen.front[0]
    else {
        panic!("expected arc");
    };
    assert_abs_diff_eq!(*startangle, -45.0, epsilon = 1e-9);
    assert_abs_diff_eq!(*endangle, 45.0, epsilon = 1e-9);
    assert_abs_diff_eq!(*radius, 2.0, epsilon = 1e-9);

    assert_eq!(pin1_names(&doc.footprints[0].pads, &["K", "A"]), vec!["A"]);
}

#[test]
fn test_board_without_outline_fails() {
    let json = br#"{
        "drawings": [
            {"class": "shape", "kind": "segment", "layer": "F.SilkS",
             "start": [0, 0], "end": [1000000, 0], "width": 100000}
        ]
    }"#;
    let board = parse_board(json, BoardFormat::Json).unwrap();
    let mut fonts = GlyphRecorder::new();
    let err = extract_board(&board, &ExtractOptions::default(), &mut fonts).unwrap_err();
    assert!(matches!(
        err,
        ExtractError::Assembly(AssemblyError::MissingOutline)
    ));
}
