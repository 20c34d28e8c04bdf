//! JSON board snapshot loader.

use crate::error::ExtractError;
use crate::snapshot::Board;

pub fn parse(data: &[u8]) -> Result<Board, ExtractError> {
    Ok(serde_json::from_slice(data)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{BoardItem, Layer, ShapeKind, Vec2};

    #[test]
    fn test_minimal_snapshot() {
        let json = br#"{
            "host": {"version": {"major": 7}},
            "title_block": {"title": "demo"},
            "drawings": [
                {"class": "shape", "kind": "segment", "layer": "Edge.Cuts",
                 "start": [0, 0], "end": [1000000, 0], "width": 100000},
                {"class": "other", "name": "dimension", "layer": "Dwgs.User"}
            ]
        }"#;
        let board = parse(json).unwrap();
        assert_eq!(board.host.version.major, 7);
        assert_eq!(board.title_block.title, "demo");
        let BoardItem::Shape(line) = &board.drawings[0] else {
            panic!("expected shape");
        };
        assert_eq!(line.kind, ShapeKind::Segment);
        assert_eq!(line.layer, Layer::EdgeCuts);
        assert_eq!(line.end, Vec2::new(1_000_000, 0));
        assert_eq!(board.drawings[1].class_name(), "dimension");
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(parse(b"{\"drawings\": 3}"), Err(ExtractError::Json(_))));
    }
}
