pub mod json;
pub mod kicad;
pub mod kicad_sexpr;
