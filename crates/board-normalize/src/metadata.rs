//! Title block resolution.

use crate::capabilities::{Capabilities, HostFeature};
use crate::snapshot::Board;
use crate::types::Metadata;
use chrono::{DateTime, Local};
use std::collections::BTreeMap;
use std::path::Path;

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn resolve(board: &Board, caps: &Capabilities) -> Metadata {
    let tb = &board.title_block;
    let expand = |s: &str| {
        if caps.has(HostFeature::TextVariables) {
            expand_text_vars(s, &board.text_vars)
        } else {
            s.to_string()
        }
    };
    let mut title = expand(&tb.title);
    let revision = expand(&tb.revision);
    let company = expand(&tb.company);

    let date = if !tb.date.is_empty() {
        tb.date.clone()
    } else {
        board
            .modified
            .map(|t| DateTime::<Local>::from(t).format(DATE_FORMAT).to_string())
            .unwrap_or_default()
    };

    if title.is_empty() {
        title = Path::new(&board.file_name)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
    }

    Metadata {
        title,
        revision,
        company,
        date,
    }
}

/// Replace `${NAME}` references with project variables. Unknown names and
/// unterminated references are kept verbatim.
pub fn expand_text_vars(text: &str, vars: &BTreeMap<String, String>) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            out.push_str(&rest[start..]);
            return out;
        };
        let name = &after[..end];
        match vars.get(name) {
            Some(value) => out.push_str(value),
            None => out.push_str(&rest[start..start + 2 + end + 1]),
        }
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{HostInfo, HostVersion, TitleBlock};
    use std::time::{Duration, SystemTime};

    fn vars() -> BTreeMap<String, String> {
        BTreeMap::from([
            ("REV".to_string(), "B".to_string()),
            ("PROJECT".to_string(), "Widget".to_string()),
        ])
    }

    #[test]
    fn test_expand_known_and_unknown() {
        assert_eq!(expand_text_vars("${PROJECT} rev ${REV}", &vars()), "Widget rev B");
        assert_eq!(expand_text_vars("${NOPE}-${REV}", &vars()), "${NOPE}-B");
        assert_eq!(expand_text_vars("broken ${REV", &vars()), "broken ${REV");
        assert_eq!(expand_text_vars("plain", &vars()), "plain");
    }

    #[test]
    fn test_title_from_file_name() {
        let board = Board {
            file_name: "/tmp/boards/sensor-node.kicad_pcb".to_string(),
            title_block: TitleBlock {
                date: "2024-01-02".to_string(),
                ..Default::default()
            },
            ..Default::default()
        };
        let meta = resolve(&board, &Capabilities::full());
        assert_eq!(meta.title, "sensor-node");
        assert_eq!(meta.date, "2024-01-02");
    }

    #[test]
    fn test_expansion_needs_capability() {
        let board = Board {
            host: HostInfo {
                version: HostVersion { major: 5, minor: 1 },
                unavailable: vec![],
            },
            title_block: TitleBlock {
                title: "${PROJECT}".to_string(),
                revision: "${REV}".to_string(),
                ..Default::default()
            },
            text_vars: vars(),
            ..Default::default()
        };
        let legacy = Capabilities::detect(&board.host);
        assert_eq!(resolve(&board, &legacy).title, "${PROJECT}");
        let current = resolve(&board, &Capabilities::full());
        assert_eq!(current.title, "Widget");
        assert_eq!(current.revision, "B");
    }

    #[test]
    fn test_date_from_mtime() {
        let mtime = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        let board = Board {
            file_name: "a.kicad_pcb".to_string(),
            modified: Some(mtime),
            ..Default::default()
        };
        let meta = resolve(&board, &Capabilities::full());
        let expected = DateTime::<Local>::from(mtime).format(DATE_FORMAT).to_string();
        assert_eq!(meta.date, expected);
        assert_eq!(meta.date.len(), 19);

        let undated = Board::default();
        assert_eq!(resolve(&undated, &Capabilities::full()).date, "");
    }
}
