//! Well-Known Text.

use super::{CodecError, MAX_NESTING};
use crate::geometry::{
    Geometry, GeometryCollection, GeometryKind, GeometryType, LineString, MultiLineString,
    MultiPoint, MultiPolygon, Point, PolyhedralSurface, Polygon, SimpleFeature,
};

// ─── Writing ─────────────────────────────────────────────────────────────────

/// Renders geometries as WKT with a fixed number of decimals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WktWriter {
    pub precision: usize,
}

impl Default for WktWriter {
    fn default() -> Self {
        Self { precision: 6 }
    }
}

impl WktWriter {
    pub fn new(precision: usize) -> Self {
        Self { precision }
    }

    /// Z and M are written for the whole tree when any point carries them.
    pub fn write(&self, g: &Geometry) -> String {
        let mut out = String::new();
        self.tagged(&mut out, g, g.is_3d(), g.is_measured());
        out
    }

    fn tagged(&self, out: &mut String, g: &Geometry, z: bool, m: bool) {
        out.push_str(g.geometry_type().wkt_tag());
        match (z, m) {
            (true, true) => out.push_str(" ZM"),
            (true, false) => out.push_str(" Z"),
            (false, true) => out.push_str(" M"),
            (false, false) => {}
        }
        out.push(' ');
        self.body(out, g, z, m);
    }

    fn body(&self, out: &mut String, g: &Geometry, z: bool, m: bool) {
        if g.is_empty() {
            out.push_str("EMPTY");
            return;
        }
        match g.kind() {
            GeometryKind::Point(p) => {
                out.push('(');
                self.coord(out, p, z, m);
                out.push(')');
            }
            GeometryKind::LineString(l) => self.coords(out, l.points(), z, m),
            GeometryKind::Polygon(p) => self.polygon(out, p, z, m),
            GeometryKind::PolyhedralSurface(s) => {
                self.list(out, s.patches(), |w, out, p| w.polygon(out, p, z, m))
            }
            GeometryKind::MultiPoint(mp) => {
                self.list(out, mp.points(), |w, out, p| w.coord(out, p, z, m))
            }
            GeometryKind::MultiLineString(ml) => {
                self.list(out, ml.lines(), |w, out, l| w.coords(out, l.points(), z, m))
            }
            GeometryKind::MultiPolygon(mp) => {
                self.list(out, mp.polygons(), |w, out, p| w.polygon(out, p, z, m))
            }
            GeometryKind::GeometryCollection(gc) => {
                self.list(out, gc.geometries(), |w, out, g| w.tagged(out, g, z, m))
            }
        }
    }

    fn list<T>(&self, out: &mut String, items: &[T], mut each: impl FnMut(&Self, &mut String, &T)) {
        out.push('(');
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            each(self, out, item);
        }
        out.push(')');
    }

    fn polygon(&self, out: &mut String, polygon: &Polygon, z: bool, m: bool) {
        if polygon.rings().is_empty() {
            out.push_str("EMPTY");
            return;
        }
        self.list(out, polygon.rings(), |w, out, r| w.coords(out, r.points(), z, m));
    }

    fn coords(&self, out: &mut String, points: &[Point], z: bool, m: bool) {
        if points.is_empty() {
            out.push_str("EMPTY");
            return;
        }
        self.list(out, points, |w, out, p| w.coord(out, p, z, m));
    }

    fn coord(&self, out: &mut String, p: &Point, z: bool, m: bool) {
        let prec = self.precision;
        out.push_str(&format!("{:.*} {:.*}", prec, p.x, prec, p.y));
        if z {
            out.push_str(&format!(" {:.*}", prec, p.z.unwrap_or(0.0)));
        }
        if m {
            out.push_str(&format!(" {:.*}", prec, p.m.unwrap_or(0.0)));
        }
    }
}

// ─── Tokenizer ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token<'a> {
    Word(&'a str),
    Number(&'a str),
    LParen,
    RParen,
    Comma,
    Other(char),
    End,
}

impl Token<'_> {
    fn describe(&self) -> String {
        match self {
            Token::Word(w) | Token::Number(w) => (*w).to_string(),
            Token::LParen => "(".into(),
            Token::RParen => ")".into(),
            Token::Comma => ",".into(),
            Token::Other(c) => c.to_string(),
            Token::End => "end of input".into(),
        }
    }
}

struct Lexer<'a> {
    src: &'a str,
    pos: usize,
    peeked: Option<(Token<'a>, usize)>,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            peeked: None,
        }
    }

    fn take_while(&mut self, start: usize, pred: fn(u8) -> bool) -> &'a str {
        let src = self.src;
        let bytes = src.as_bytes();
        while self.pos < bytes.len() && pred(bytes[self.pos]) {
            self.pos += 1;
        }
        &src[start..self.pos]
    }

    fn scan(&mut self) -> (Token<'a>, usize) {
        let src = self.src;
        let bytes = src.as_bytes();
        while self.pos < bytes.len() && bytes[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
        let start = self.pos;
        let Some(&c) = bytes.get(start) else {
            return (Token::End, start);
        };
        let token = match c {
            b'(' | b')' | b',' => {
                self.pos += 1;
                match c {
                    b'(' => Token::LParen,
                    b')' => Token::RParen,
                    _ => Token::Comma,
                }
            }
            c if c.is_ascii_alphabetic() => {
                Token::Word(self.take_while(start, |b| b.is_ascii_alphanumeric() || b == b'_'))
            }
            c if c.is_ascii_digit() || matches!(c, b'-' | b'+' | b'.') => {
                Token::Number(self.take_while(start, |b| {
                    b.is_ascii_digit() || matches!(b, b'-' | b'+' | b'.' | b'e' | b'E')
                }))
            }
            _ => {
                let ch = src[start..].chars().next().unwrap_or('?');
                self.pos += ch.len_utf8();
                Token::Other(ch)
            }
        };
        (token, start)
    }

    fn peek(&mut self) -> Token<'a> {
        if self.peeked.is_none() {
            self.peeked = Some(self.scan());
        }
        self.peeked.map(|(t, _)| t).unwrap_or(Token::End)
    }

    fn next(&mut self) -> (Token<'a>, usize) {
        self.peeked.take().unwrap_or_else(|| self.scan())
    }

    fn unexpected(token: Token<'_>, offset: usize, expected: &'static str) -> CodecError {
        match token {
            Token::End => CodecError::UnexpectedEnd(expected),
            other => CodecError::UnexpectedToken {
                expected,
                found: other.describe(),
                offset,
            },
        }
    }

    fn expect(&mut self, want: Token<'static>, expected: &'static str) -> Result<(), CodecError> {
        let (token, offset) = self.next();
        if token == want {
            Ok(())
        } else {
            Err(Self::unexpected(token, offset, expected))
        }
    }

    fn peek_keyword(&mut self, keyword: &str) -> bool {
        matches!(self.peek(), Token::Word(w) if w.eq_ignore_ascii_case(keyword))
    }
}

// ─── Parsing ─────────────────────────────────────────────────────────────────

/// Ordinates declared by a `Z`, `M` or `ZM` tag. Without a tag the count
/// of each tuple decides: three means Z, four means ZM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Dims {
    declared: Option<(bool, bool)>,
}

impl Dims {
    fn expected(&self) -> Option<usize> {
        self.declared.map(|(z, m)| 2 + z as usize + m as usize)
    }
}

struct Parser<'a> {
    lexer: Lexer<'a>,
    /// Tagged geometries currently open.
    depth: usize,
}

impl<'a> Parser<'a> {
    /// True and consumed when the next tokens spell an empty body:
    /// `EMPTY` or `(EMPTY)`.
    fn empty_body(&mut self) -> Result<bool, CodecError> {
        if self.lexer.peek_keyword("EMPTY") {
            self.lexer.next();
            return Ok(true);
        }
        if self.lexer.peek() == Token::LParen {
            let saved = (self.lexer.pos, self.lexer.peeked);
            self.lexer.next();
            if self.lexer.peek_keyword("EMPTY") {
                self.lexer.next();
                self.lexer.expect(Token::RParen, "`)`")?;
                return Ok(true);
            }
            (self.lexer.pos, self.lexer.peeked) = saved;
        }
        Ok(false)
    }

    fn tagged(&mut self) -> Result<Geometry, CodecError> {
        if self.depth == MAX_NESTING {
            return Err(CodecError::TooDeep(MAX_NESTING));
        }
        self.depth += 1;
        let geometry = self.tagged_body();
        self.depth -= 1;
        geometry
    }

    fn tagged_body(&mut self) -> Result<Geometry, CodecError> {
        let (token, offset) = self.lexer.next();
        let Token::Word(word) = token else {
            return Err(Lexer::unexpected(token, offset, "geometry tag"));
        };
        let tag = word.to_ascii_uppercase();
        let geometry_type = match tag.as_str() {
            "POINT" => GeometryType::Point,
            "LINESTRING" | "LINE" | "LINEARRING" => GeometryType::LineString,
            "POLYGON" | "TRIANGLE" => GeometryType::Polygon,
            "POLYHEDRALSURFACE" | "TIN" | "POLYHEDRON" => GeometryType::PolyhedralSurface,
            "MULTIPOINT" => GeometryType::MultiPoint,
            "MULTILINESTRING" => GeometryType::MultiLineString,
            "MULTIPOLYGON" => GeometryType::MultiPolygon,
            "GEOMETRYCOLLECTION" => GeometryType::GeometryCollection,
            _ => return Err(CodecError::UnknownTag(word.to_string())),
        };

        let declared = match self.lexer.peek() {
            Token::Word(w) if w.eq_ignore_ascii_case("Z") => Some((true, false)),
            Token::Word(w) if w.eq_ignore_ascii_case("M") => Some((false, true)),
            Token::Word(w) if w.eq_ignore_ascii_case("ZM") => Some((true, true)),
            _ => None,
        };
        if declared.is_some() {
            self.lexer.next();
        }
        let dims = Dims { declared };

        if self.empty_body()? {
            return Ok(Geometry::empty(geometry_type));
        }

        let geometry = match geometry_type {
            GeometryType::Point => {
                self.lexer.expect(Token::LParen, "`(`")?;
                let p = self.coord(dims)?;
                self.lexer.expect(Token::RParen, "`)`")?;
                p.into()
            }
            GeometryType::LineString => LineString::new(self.coords(dims)?).into(),
            GeometryType::Polygon => self.polygon(dims)?.into(),
            GeometryType::PolyhedralSurface => {
                PolyhedralSurface::new(self.list(|p| p.polygon(dims))?).into()
            }
            GeometryType::MultiPoint => MultiPoint::new(self.list(|p| p.multi_point_member(dims))?).into(),
            GeometryType::MultiLineString => {
                MultiLineString::new(self.list(|p| p.coords(dims).map(LineString::new))?).into()
            }
            GeometryType::MultiPolygon => MultiPolygon::new(self.list(|p| p.polygon(dims))?).into(),
            GeometryType::GeometryCollection => {
                GeometryCollection::from_geometries(self.list(|p| p.tagged())?).into()
            }
        };
        Ok(geometry)
    }

    /// `( item , item ... )`, or `EMPTY` for no items.
    fn list<T>(&mut self, mut item: impl FnMut(&mut Self) -> Result<T, CodecError>) -> Result<Vec<T>, CodecError> {
        if self.empty_body()? {
            return Ok(Vec::new());
        }
        self.lexer.expect(Token::LParen, "`(`")?;
        let mut items = vec![item(self)?];
        loop {
            let (token, offset) = self.lexer.next();
            match token {
                Token::Comma => items.push(item(self)?),
                Token::RParen => return Ok(items),
                other => return Err(Lexer::unexpected(other, offset, "`,` or `)`")),
            }
        }
    }

    fn coords(&mut self, dims: Dims) -> Result<Vec<Point>, CodecError> {
        self.list(|p| p.coord(dims))
    }

    fn polygon(&mut self, dims: Dims) -> Result<Polygon, CodecError> {
        let rings = self.list(|p| p.coords(dims).map(LineString::new))?;
        Ok(Polygon::from_rings(rings))
    }

    /// Accepts both `1 2` and `(1 2)`.
    fn multi_point_member(&mut self, dims: Dims) -> Result<Point, CodecError> {
        if self.lexer.peek() == Token::LParen {
            self.lexer.next();
            let p = self.coord(dims)?;
            self.lexer.expect(Token::RParen, "`)`")?;
            Ok(p)
        } else {
            self.coord(dims)
        }
    }

    fn coord(&mut self, dims: Dims) -> Result<Point, CodecError> {
        let mut ordinates = Vec::with_capacity(4);
        while let Token::Number(text) = self.lexer.peek() {
            self.lexer.next();
            let v: f64 = text
                .parse()
                .map_err(|_| CodecError::InvalidNumber(text.to_string()))?;
            ordinates.push(v);
        }
        if ordinates.is_empty() {
            let (token, offset) = self.lexer.next();
            return Err(Lexer::unexpected(token, offset, "coordinate"));
        }
        let n = ordinates.len();
        let (has_z, has_m) = match (dims.declared, n) {
            (Some(declared), _) if dims.expected() == Some(n) => declared,
            (Some(_), _) => {
                return Err(CodecError::OrdinateCount {
                    expected: dims.expected().unwrap_or(2),
                    found: n,
                });
            }
            (None, 2) => (false, false),
            (None, 3) => (true, false),
            (None, 4) => (true, true),
            (None, _) => return Err(CodecError::OrdinateCount { expected: 2, found: n }),
        };
        let mut rest = ordinates[2..].iter().copied();
        Ok(Point {
            x: ordinates[0],
            y: ordinates[1],
            z: if has_z { rest.next() } else { None },
            m: if has_m { rest.next() } else { None },
        })
    }
}

/// Parse one WKT geometry. Anything but whitespace after it is an error.
pub fn read(text: &str) -> Result<Geometry, CodecError> {
    let mut parser = Parser {
        lexer: Lexer::new(text),
        depth: 0,
    };
    let geometry = parser.tagged()?;
    match parser.lexer.next() {
        (Token::End, _) => Ok(geometry),
        (_, offset) => Err(CodecError::TrailingInput(offset)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_re_encodes_with_six_decimals() {
        let g = read("POINT(1 2)").unwrap();
        assert_eq!(g.as_point(), Some(&Point::new(1.0, 2.0)));
        assert_eq!(WktWriter::default().write(&g), "POINT (1.000000 2.000000)");
    }

    #[test]
    fn test_dimension_tags() {
        let g = read("point z (1 2 3)").unwrap();
        assert_eq!(g.as_point(), Some(&Point::new_z(1.0, 2.0, 3.0)));
        assert_eq!(WktWriter::new(1).write(&g), "POINT Z (1.0 2.0 3.0)");

        let g = read("POINT M (1 2 7)").unwrap();
        assert_eq!(g.as_point(), Some(&Point::new_m(1.0, 2.0, 7.0)));

        let g = read("POINT (1 2 3 4)").unwrap();
        assert_eq!(g.as_point(), Some(&Point::new_zm(1.0, 2.0, 3.0, 4.0)));
        assert_eq!(WktWriter::new(0).write(&g), "POINT ZM (1 2 3 4)");
    }

    #[test]
    fn test_polygon_layout() {
        let g = read("POLYGON ((0 0, 2 0, 2 2, 0 0), (0.5 0.25, 1 0.25, 1 0.5, 0.5 0.25))").unwrap();
        assert_eq!(
            WktWriter::new(2).write(&g),
            "POLYGON ((0.00 0.00,2.00 0.00,2.00 2.00,0.00 0.00),(0.50 0.25,1.00 0.25,1.00 0.50,0.50 0.25))"
        );
    }

    #[test]
    fn test_multi_point_forms() {
        let bare = read("MULTIPOINT (1 2, 3 4)").unwrap();
        let wrapped = read("MULTIPOINT ((1 2), (3 4))").unwrap();
        assert_eq!(bare, wrapped);
        assert_eq!(WktWriter::new(0).write(&bare), "MULTIPOINT (1 2,3 4)");
    }

    #[test]
    fn test_collection_children_keep_tags() {
        let g = read("GEOMETRYCOLLECTION (POINT (1 2), LINESTRING (0 0, 1 1), POLYGON EMPTY)").unwrap();
        let gc = g.as_collection().unwrap();
        assert_eq!(gc.num_geometries(), 3);
        assert_eq!(
            WktWriter::new(0).write(&g),
            "GEOMETRYCOLLECTION (POINT (1 2),LINESTRING (0 0,1 1),POLYGON EMPTY)"
        );
    }

    #[test]
    fn test_empty_forms() {
        for text in ["LINESTRING EMPTY", "LINESTRING (EMPTY)", "linestring empty"] {
            let g = read(text).unwrap();
            assert!(g.is_empty());
            assert_eq!(g.geometry_type(), GeometryType::LineString);
            assert_eq!(WktWriter::default().write(&g), "LINESTRING EMPTY");
        }
        assert_eq!(WktWriter::default().write(&read("MULTIPOLYGON EMPTY").unwrap()), "MULTIPOLYGON EMPTY");

        for text in ["POINT EMPTY", "POINT (EMPTY)", "point empty"] {
            let g = read(text).unwrap();
            assert!(g.is_empty());
            assert_eq!(g.geometry_type(), GeometryType::Point);
            assert_eq!(WktWriter::default().write(&g), "POINT EMPTY");
        }
        let g = read("GEOMETRYCOLLECTION (POINT EMPTY, POINT (1 2))").unwrap();
        assert_eq!(WktWriter::new(0).write(&g), "GEOMETRYCOLLECTION (POINT EMPTY,POINT (1 2))");
    }

    #[test]
    fn test_deep_nesting_is_rejected() {
        let depth = 100_000;
        let text = format!(
            "{}POINT (1 2){}",
            "GEOMETRYCOLLECTION (".repeat(depth),
            ")".repeat(depth)
        );
        assert_eq!(read(&text), Err(CodecError::TooDeep(MAX_NESTING)));
    }

    #[test]
    fn test_nesting_below_the_cap_is_read() {
        let depth = 32;
        let text = format!(
            "{}POINT (1 2){}",
            "GEOMETRYCOLLECTION (".repeat(depth),
            ")".repeat(depth)
        );
        let g = read(&text).unwrap();
        assert_eq!(read(&WktWriter::default().write(&g)).unwrap(), g);
    }

    #[test]
    fn test_aliases() {
        assert_eq!(read("LINEARRING (0 0, 1 0)").unwrap().geometry_type(), GeometryType::LineString);
        assert_eq!(read("TRIANGLE ((0 0, 1 0, 0 1, 0 0))").unwrap().geometry_type(), GeometryType::Polygon);
        let tin = read("TIN (((0 0 0, 1 0 0, 0 1 0, 0 0 0)), ((1 0 0, 1 1 0, 0 1 0, 1 0 0)))").unwrap();
        match tin.kind() {
            GeometryKind::PolyhedralSurface(s) => assert_eq!(s.num_patches(), 2),
            other => panic!("expected a PolyhedralSurface, got {other:?}"),
        }
        assert!(read("POLYHEDRALSURFACE EMPTY").unwrap().is_empty());
    }

    #[test]
    fn test_unknown_tag() {
        assert_eq!(read("CIRCLE (0 0, 1)"), Err(CodecError::UnknownTag("CIRCLE".into())));
    }

    #[test]
    fn test_malformed_inputs() {
        assert_eq!(read("POINT (1 2"), Err(CodecError::UnexpectedEnd("`)`")));
        assert!(matches!(read("POINT (1 2) x"), Err(CodecError::TrailingInput(12))));
        assert!(matches!(read("POINT (1)"), Err(CodecError::OrdinateCount { expected: 2, found: 1 })));
        assert!(matches!(read("POINT Z (1 2)"), Err(CodecError::OrdinateCount { expected: 3, found: 2 })));
        assert!(matches!(read("POINT (1..2 3)"), Err(CodecError::InvalidNumber(_))));
        assert!(matches!(read("LINESTRING (0 0; 1 1)"), Err(CodecError::UnexpectedToken { .. })));
        assert!(matches!(read(""), Err(CodecError::UnexpectedEnd(_))));
    }

    #[test]
    fn test_scientific_notation() {
        let g = read("POINT (1e3 -2.5E-1)").unwrap();
        assert_eq!(g.as_point(), Some(&Point::new(1000.0, -0.25)));
    }
}
