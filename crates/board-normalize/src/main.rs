use board_normalize::types::{BoardDocument, Component};
use board_normalize::{extract_file, BoardFormat, ExtractOptions};
use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "board-normalize",
    about = "Normalize a PCB layout into a board document"
)]
struct Cli {
    /// Input board file (.kicad_pcb or a .json snapshot)
    input: PathBuf,

    /// Output JSON file (stdout if not specified)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Override auto-detected format (kicad, json)
    #[arg(short, long)]
    format: Option<String>,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,

    /// Include tracks and zones in output
    #[arg(long)]
    tracks: bool,

    /// Include nets in output
    #[arg(long)]
    nets: bool,

    /// Extra footprint field to carry into components (repeatable)
    #[arg(long = "field")]
    fields: Vec<String>,

    /// JSON file with per-reference field data
    #[arg(long)]
    field_source: Option<PathBuf>,

    /// Board variants to include
    #[arg(long, value_delimiter = ',')]
    variant_whitelist: Vec<String>,

    /// Board variants to exclude
    #[arg(long, value_delimiter = ',')]
    variant_blacklist: Vec<String>,

    /// Field marking a component as do-not-populate
    #[arg(long)]
    dnp_field: Option<String>,

    /// Lowercase field names from the field source
    #[arg(long)]
    normalize_field_case: bool,

    /// JSON glyph table for font data
    #[arg(long)]
    font_table: Option<PathBuf>,

    /// Emit {pcbdata, components} instead of the document alone
    #[arg(long)]
    components: bool,
}

#[derive(Serialize)]
struct WithComponents<'a> {
    pcbdata: &'a BoardDocument,
    components: &'a [Component],
}

fn to_json<T: Serialize>(value: &T, pretty: bool) -> serde_json::Result<String> {
    if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
}

fn parse_format(s: &str) -> Result<BoardFormat, String> {
    match s.to_lowercase().as_str() {
        "kicad" => Ok(BoardFormat::KiCad),
        "json" => Ok(BoardFormat::Json),
        _ => Err(format!("Unknown format: {s}. Use: kicad, json")),
    }
}

fn run(cli: Cli) -> Result<(), String> {
    let format = cli.format.as_deref().map(parse_format).transpose()?;
    let opts = ExtractOptions {
        include_tracks: cli.tracks,
        include_nets: cli.nets,
        extra_fields: cli.fields,
        board_variant_whitelist: cli.variant_whitelist,
        board_variant_blacklist: cli.variant_blacklist,
        dnp_field: cli.dnp_field,
        field_source: cli.field_source,
        normalize_field_case: cli.normalize_field_case,
        font_table: cli.font_table,
    };

    let extraction = extract_file(&cli.input, format, &opts).map_err(|e| e.to_string())?;

    let out = if cli.components {
        to_json(
            &WithComponents {
                pcbdata: &extraction.document,
                components: &extraction.components,
            },
            cli.pretty,
        )
    } else {
        to_json(&extraction.document, cli.pretty)
    }
    .map_err(|e| format!("JSON serialization failed: {e}"))?;

    match cli.output {
        Some(path) => {
            std::fs::write(&path, &out)
                .map_err(|e| format!("Failed to write {}: {e}", path.display()))?;
            eprintln!("Written to {}", path.display());
        }
        None => println!("{out}"),
    }
    Ok(())
}

fn main() {
    env_logger::init();
    if let Err(e) = run(Cli::parse()) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
