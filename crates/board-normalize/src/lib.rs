pub mod assembler;
pub mod capabilities;
pub mod error;
pub mod fields;
pub mod font;
pub mod metadata;
pub mod normalize;
pub mod parsers;
pub mod snapshot;
pub mod types;
pub mod units;

pub use assembler::{BoardAssembler, Extraction};
pub use error::{AssemblyError, ExtractError};
pub use font::{FontService, GlyphRecorder};
pub use snapshot::Board;
pub use types::BoardDocument;

use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardFormat {
    KiCad,
    /// A serialized board snapshot.
    Json,
}

/// Extraction settings. Field-related options only matter when a field
/// source is configured.
#[derive(Debug, Clone, Default)]
pub struct ExtractOptions {
    pub include_tracks: bool,
    pub include_nets: bool,
    pub extra_fields: Vec<String>,
    pub board_variant_whitelist: Vec<String>,
    pub board_variant_blacklist: Vec<String>,
    pub dnp_field: Option<String>,
    pub field_source: Option<PathBuf>,
    pub normalize_field_case: bool,
    pub font_table: Option<PathBuf>,
}

/// Detect format from file extension.
pub fn detect_format(path: &Path) -> Option<BoardFormat> {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .as_deref()
    {
        Some("kicad_pcb") => Some(BoardFormat::KiCad),
        Some("json") => Some(BoardFormat::Json),
        _ => None,
    }
}

/// Parse a snapshot from bytes with an explicit format.
pub fn parse_board(data: &[u8], format: BoardFormat) -> Result<Board, ExtractError> {
    match format {
        BoardFormat::KiCad => parsers::kicad::parse(data),
        BoardFormat::Json => parsers::json::parse(data),
    }
}

/// Load a snapshot from disk, auto-detecting the format unless one is given.
/// Records the file name and modification time on the snapshot.
pub fn load_board(path: &Path, format: Option<BoardFormat>) -> Result<Board, ExtractError> {
    let format = match format.or_else(|| detect_format(path)) {
        Some(f) => f,
        None => {
            return Err(ExtractError::UnsupportedFormat(
                path.extension()
                    .and_then(|e| e.to_str())
                    .unwrap_or("(none)")
                    .to_string(),
            ))
        }
    };
    let data = std::fs::read(path)?;
    let mut board = parse_board(&data, format)?;
    board.file_name = path.to_string_lossy().into_owned();
    board.modified = std::fs::metadata(path).and_then(|m| m.modified()).ok();
    Ok(board)
}

/// Run one extraction over an already loaded snapshot.
pub fn extract_board(
    board: &Board,
    opts: &ExtractOptions,
    fonts: &mut dyn FontService,
) -> Result<Extraction, ExtractError> {
    Ok(BoardAssembler::new(board, opts).assemble(fonts)?)
}

/// Load a board file and extract it.
pub fn extract(path: &Path, opts: &ExtractOptions) -> Result<Extraction, ExtractError> {
    extract_file(path, None, opts)
}

/// Like [`extract`] with an optional format override. Uses the configured
/// glyph table for font data when there is one.
pub fn extract_file(
    path: &Path,
    format: Option<BoardFormat>,
    opts: &ExtractOptions,
) -> Result<Extraction, ExtractError> {
    let board = load_board(path, format)?;
    let mut fonts = match &opts.font_table {
        Some(table) => GlyphRecorder::load_table(table)?,
        None => GlyphRecorder::new(),
    };
    extract_board(&board, opts, &mut fonts)
}
