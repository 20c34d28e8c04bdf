//! Tolerant S-expression reader for KiCad board files.
//!
//!   sexpr  = '(' (atom | sexpr)* ')'
//!   atom   = '"' escaped-string '"' | symbol
//!   symbol = [^ \t\n\r()"]+
//!
//! Numbers are kept as symbols and parsed on access.

#[derive(Debug, Clone, PartialEq)]
pub enum SExpr {
    List(Vec<SExpr>),
    Atom(String),
}

impl SExpr {
    /// First atom of a list.
    pub fn tag(&self) -> Option<&str> {
        match self {
            SExpr::List(items) => items.first().and_then(SExpr::as_atom),
            SExpr::Atom(_) => None,
        }
    }

    /// Everything after the tag.
    pub fn children(&self) -> &[SExpr] {
        match self {
            SExpr::List(items) if !items.is_empty() => &items[1..],
            _ => &[],
        }
    }

    pub fn as_atom(&self) -> Option<&str> {
        match self {
            SExpr::Atom(s) => Some(s.as_str()),
            SExpr::List(_) => None,
        }
    }

    pub fn find(&self, tag: &str) -> Option<&SExpr> {
        self.children().iter().find(|c| c.tag() == Some(tag))
    }

    pub fn find_all<'s>(&'s self, tag: &'s str) -> impl Iterator<Item = &'s SExpr> + 's {
        self.children().iter().filter(move |c| c.tag() == Some(tag))
    }

    /// Value of a `(tag value)` child.
    pub fn value(&self, tag: &str) -> Option<&str> {
        self.find(tag).and_then(|node| node.atom_at(0))
    }

    pub fn value_f64(&self, tag: &str) -> Option<f64> {
        self.value(tag).and_then(|v| v.parse().ok())
    }

    /// Nth atom after the tag.
    pub fn atom_at(&self, index: usize) -> Option<&str> {
        self.children().get(index).and_then(SExpr::as_atom)
    }

    pub fn f64_at(&self, index: usize) -> Option<f64> {
        self.atom_at(index).and_then(|v| v.parse().ok())
    }

    /// Atoms after the tag, lists skipped.
    pub fn atoms(&self) -> impl Iterator<Item = &str> {
        self.children().iter().filter_map(SExpr::as_atom)
    }

    /// A boolean flag written either as a bare atom (`hide`, legacy syntax)
    /// or as `(hide yes)` / `(hide)`. Bare flags follow the first nested
    /// list; leading atoms are the node's own values, such as a text body.
    pub fn flag(&self, name: &str) -> bool {
        let bare = self
            .children()
            .iter()
            .skip_while(|c| c.as_atom().is_some())
            .filter_map(SExpr::as_atom)
            .any(|a| a == name);
        if bare {
            return true;
        }
        match self.find(name) {
            Some(node) => !matches!(node.atom_at(0), Some("no") | Some("false")),
            None => false,
        }
    }

    /// `(tag x y ...)` as a pair.
    pub fn xy(&self, tag: &str) -> Option<[f64; 2]> {
        self.find(tag)
            .map(|n| [n.f64_at(0).unwrap_or(0.0), n.f64_at(1).unwrap_or(0.0)])
    }

    /// Points of a `(pts (xy ..) (xy ..))` child.
    pub fn points(&self) -> Vec<[f64; 2]> {
        self.find("pts")
            .map(|pts| {
                pts.find_all("xy")
                    .map(|xy| [xy.f64_at(0).unwrap_or(0.0), xy.f64_at(1).unwrap_or(0.0)])
                    .collect()
            })
            .unwrap_or_default()
    }
}

struct Reader<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn skip_whitespace(&mut self) {
        while let Some(b' ' | b'\t' | b'\n' | b'\r') = self.peek() {
            self.pos += 1;
        }
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn string(&mut self) -> Result<String, String> {
        let opened_at = self.pos;
        self.pos += 1;
        let mut bytes = Vec::new();
        while let Some(b) = self.peek() {
            self.pos += 1;
            match b {
                b'"' => return Ok(String::from_utf8_lossy(&bytes).into_owned()),
                b'\\' => {
                    let escaped = self.peek().ok_or("dangling escape at end of input")?;
                    self.pos += 1;
                    bytes.push(match escaped {
                        b'n' => b'\n',
                        b't' => b'\t',
                        other => other,
                    });
                }
                _ => bytes.push(b),
            }
        }
        Err(format!("unterminated string starting at byte {opened_at}"))
    }

    fn symbol(&mut self) -> String {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if matches!(b, b' ' | b'\t' | b'\n' | b'\r' | b'(' | b')' | b'"') {
                break;
            }
            self.pos += 1;
        }
        String::from_utf8_lossy(&self.input[start..self.pos]).into_owned()
    }

    fn expr(&mut self) -> Result<SExpr, String> {
        self.skip_whitespace();
        match self.peek() {
            None => Err("unexpected end of input".to_string()),
            Some(b'(') => {
                let opened_at = self.pos;
                self.pos += 1;
                let mut items = Vec::new();
                loop {
                    self.skip_whitespace();
                    match self.peek() {
                        Some(b')') => {
                            self.pos += 1;
                            return Ok(SExpr::List(items));
                        }
                        None => {
                            return Err(format!("unclosed list starting at byte {opened_at}"))
                        }
                        Some(_) => items.push(self.expr()?),
                    }
                }
            }
            Some(b')') => Err(format!("unexpected ')' at byte {}", self.pos)),
            Some(b'"') => self.string().map(SExpr::Atom),
            Some(_) => Ok(SExpr::Atom(self.symbol())),
        }
    }
}

/// Read the first expression of `input`. Anything after it is ignored.
pub fn parse(input: &[u8]) -> Result<SExpr, String> {
    let mut reader = Reader { input, pos: 0 };
    reader.skip_whitespace();
    if reader.peek().is_none() {
        return Err("empty input".to_string());
    }
    reader.expr()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_values() {
        let e = parse(b"(a (b 1) (c 2.5) (at 100.5 -50.3 90))").unwrap();
        assert_eq!(e.tag(), Some("a"));
        assert_eq!(e.value("b"), Some("1"));
        assert_eq!(e.value_f64("c"), Some(2.5));
        assert_eq!(e.xy("at"), Some([100.5, -50.3]));
        assert_eq!(e.find("at").and_then(|a| a.f64_at(2)), Some(90.0));
    }

    #[test]
    fn test_quoted_strings() {
        let e = parse("(property \"Value\" \"10k \\\"1%\\\" Ω\")".as_bytes()).unwrap();
        assert_eq!(e.atom_at(0), Some("Value"));
        assert_eq!(e.atom_at(1), Some("10k \"1%\" Ω"));
    }

    #[test]
    fn test_flags() {
        let legacy = parse(b"(fp_text value 10k (at 0 1) (layer F.Fab) hide)").unwrap();
        assert!(legacy.flag("hide"));
        let modern = parse(b"(property \"Value\" \"10k\" (hide yes))").unwrap();
        assert!(modern.flag("hide"));
        let shown = parse(b"(property \"Value\" \"10k\" (hide no))").unwrap();
        assert!(!shown.flag("hide"));
    }

    #[test]
    fn test_flag_ignores_text_body() {
        let text = parse(b"(gr_text \"hide\" (at 1 1) (layer \"F.SilkS\"))").unwrap();
        assert!(!text.flag("hide"));
        let legacy = parse(b"(fp_text user hide (at 0 0) (layer F.SilkS))").unwrap();
        assert!(!legacy.flag("hide"));
        let hidden = parse(b"(fp_text user hide (at 0 0) (layer F.SilkS) hide)").unwrap();
        assert!(hidden.flag("hide"));
    }

    #[test]
    fn test_points_and_find_all() {
        let e = parse(b"(root (net 0 \"\") (net 1 \"GND\") (gr_poly (pts (xy 0 0) (xy 1 0) (xy 1 1))))")
            .unwrap();
        assert_eq!(e.find_all("net").count(), 2);
        let poly = e.find("gr_poly").unwrap();
        assert_eq!(poly.points(), vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0]]);
    }

    #[test]
    fn test_malformed_input() {
        assert!(parse(b"").is_err());
        assert!(parse(b"(a (b 1)").is_err());
        assert!(parse(b"(a \"open)").is_err());
        assert!(parse(b")").is_err());
    }
}
