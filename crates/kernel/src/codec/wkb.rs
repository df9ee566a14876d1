//! Well-Known Binary.
//!
//! Record layout: byte-order marker, `u32` type code (base code plus the
//! Z/M offset), payload. Collections embed complete child records, each
//! with its own marker.

use byteorder::{BigEndian, ByteOrder as _, LittleEndian};

use super::{ByteOrder, CodecError, MAX_NESTING};
use crate::geometry::{
    Geometry, GeometryCollection, GeometryError, GeometryKind, GeometryType, LineString,
    MultiLineString, MultiPoint, MultiPolygon, Point, PolyhedralSurface, Polygon, SimpleFeature,
};

const TIN: u32 = 16;
const TRIANGLE: u32 = 17;

/// The shape of a record's payload, after folding aliases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Payload {
    Point,
    LineString,
    Polygon,
    MultiPoint,
    MultiLineString,
    MultiPolygon,
    GeometryCollection,
    PolyhedralSurface,
}

/// Split a type code into payload kind and Z/M presence.
fn decode_type_code(code: u32) -> Result<(Payload, bool, bool), CodecError> {
    let (has_z, has_m) = match code / 1000 {
        0 => (false, false),
        1 => (true, false),
        2 => (false, true),
        3 => (true, true),
        _ => return Err(CodecError::UnknownTypeCode(code)),
    };
    let payload = match code % 1000 {
        1 => Payload::Point,
        2 => Payload::LineString,
        3 | TRIANGLE => Payload::Polygon,
        4 => Payload::MultiPoint,
        5 => Payload::MultiLineString,
        6 => Payload::MultiPolygon,
        7 => Payload::GeometryCollection,
        15 | TIN => Payload::PolyhedralSurface,
        _ => return Err(CodecError::UnknownTypeCode(code)),
    };
    Ok((payload, has_z, has_m))
}

// ─── Writing ─────────────────────────────────────────────────────────────────

struct WkbWriter {
    out: Vec<u8>,
    order: ByteOrder,
}

impl WkbWriter {
    fn put_u32(&mut self, v: u32) {
        let mut buf = [0u8; 4];
        match self.order {
            ByteOrder::Xdr => BigEndian::write_u32(&mut buf, v),
            ByteOrder::Ndr => LittleEndian::write_u32(&mut buf, v),
        }
        self.out.extend_from_slice(&buf);
    }

    fn put_f64(&mut self, v: f64) {
        let mut buf = [0u8; 8];
        match self.order {
            ByteOrder::Xdr => BigEndian::write_f64(&mut buf, v),
            ByteOrder::Ndr => LittleEndian::write_f64(&mut buf, v),
        }
        self.out.extend_from_slice(&buf);
    }

    fn put_count(&mut self, n: usize) -> Result<(), CodecError> {
        let n = u32::try_from(n).map_err(|_| CodecError::CountOverflow(n))?;
        self.put_u32(n);
        Ok(())
    }

    fn put_point(&mut self, p: &Point, with_z: bool, with_m: bool) {
        self.put_f64(p.x);
        self.put_f64(p.y);
        if with_z {
            self.put_f64(p.z.unwrap_or(0.0));
        }
        if with_m {
            self.put_f64(p.m.unwrap_or(0.0));
        }
    }

    fn put_points(&mut self, points: &[Point], with_z: bool, with_m: bool) -> Result<(), CodecError> {
        self.put_count(points.len())?;
        for p in points {
            self.put_point(p, with_z, with_m);
        }
        Ok(())
    }

    fn put_polygon(&mut self, polygon: &Polygon, with_z: bool, with_m: bool) -> Result<(), CodecError> {
        self.put_count(polygon.rings().len())?;
        for ring in polygon.rings() {
            self.put_points(ring.points(), with_z, with_m)?;
        }
        Ok(())
    }

    fn put_header(&mut self, g: &dyn SimpleFeature, with_z: bool, with_m: bool) {
        self.out.push(self.order.marker());
        self.put_u32(g.wkb_geometry_type(with_z, with_m));
    }

    fn put_geometry(&mut self, g: &Geometry, with_z: bool, with_m: bool) -> Result<(), CodecError> {
        self.put_header(g, with_z, with_m);
        match g.kind() {
            GeometryKind::Point(p) => self.put_point(p, with_z, with_m),
            GeometryKind::LineString(l) => self.put_points(l.points(), with_z, with_m)?,
            GeometryKind::Polygon(p) => self.put_polygon(p, with_z, with_m)?,
            GeometryKind::PolyhedralSurface(s) => {
                self.put_count(s.num_patches())?;
                for patch in s.patches() {
                    self.put_header(patch, with_z, with_m);
                    self.put_polygon(patch, with_z, with_m)?;
                }
            }
            GeometryKind::MultiPoint(mp) => {
                self.put_count(mp.num_points())?;
                for p in mp.points() {
                    self.put_header(p, with_z, with_m);
                    self.put_point(p, with_z, with_m);
                }
            }
            GeometryKind::MultiLineString(ml) => {
                self.put_count(ml.num_lines())?;
                for l in ml.lines() {
                    self.put_header(l, with_z, with_m);
                    self.put_points(l.points(), with_z, with_m)?;
                }
            }
            GeometryKind::MultiPolygon(mp) => {
                self.put_count(mp.num_polygons())?;
                for p in mp.polygons() {
                    self.put_header(p, with_z, with_m);
                    self.put_polygon(p, with_z, with_m)?;
                }
            }
            GeometryKind::GeometryCollection(gc) => {
                self.put_count(gc.num_geometries())?;
                for child in gc.geometries() {
                    self.put_geometry(child, with_z, with_m)?;
                }
            }
        }
        Ok(())
    }
}

/// Encode `g`. Z and M are written when any point of `g` carries them;
/// a point lacking an ordinate the record carries is written with zero.
/// The empty point is written with NaN X and Y.
///
/// Fails only when a count does not fit the format's `u32`.
pub fn write(g: &Geometry, order: ByteOrder) -> Result<Vec<u8>, CodecError> {
    let mut w = WkbWriter {
        out: Vec::new(),
        order,
    };
    w.put_geometry(g, g.is_3d(), g.is_measured())?;
    Ok(w.out)
}

// ─── Reading ─────────────────────────────────────────────────────────────────

struct WkbReader<'a> {
    buf: &'a [u8],
    pos: usize,
    depth: usize,
}

impl<'a> WkbReader<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8], CodecError> {
        let end = self.pos + n;
        let bytes = self
            .buf
            .get(self.pos..end)
            .ok_or(CodecError::Truncated(self.pos))?;
        self.pos = end;
        Ok(bytes)
    }

    fn u8(&mut self) -> Result<u8, CodecError> {
        Ok(self.take(1)?[0])
    }

    fn u32(&mut self, order: ByteOrder) -> Result<u32, CodecError> {
        let b = self.take(4)?;
        Ok(match order {
            ByteOrder::Xdr => BigEndian::read_u32(b),
            ByteOrder::Ndr => LittleEndian::read_u32(b),
        })
    }

    fn f64(&mut self, order: ByteOrder) -> Result<f64, CodecError> {
        let b = self.take(8)?;
        Ok(match order {
            ByteOrder::Xdr => BigEndian::read_f64(b),
            ByteOrder::Ndr => LittleEndian::read_f64(b),
        })
    }

    /// A count, rejected early when the remaining input cannot hold
    /// `min_item_size`-byte items.
    fn count(&mut self, order: ByteOrder, min_item_size: usize) -> Result<usize, CodecError> {
        let n = self.u32(order)? as usize;
        let remaining = self.buf.len() - self.pos;
        if n.saturating_mul(min_item_size) > remaining {
            return Err(CodecError::Truncated(self.pos));
        }
        Ok(n)
    }

    fn point(&mut self, order: ByteOrder, has_z: bool, has_m: bool) -> Result<Point, CodecError> {
        let x = self.f64(order)?;
        let y = self.f64(order)?;
        let z = if has_z { Some(self.f64(order)?) } else { None };
        let m = if has_m { Some(self.f64(order)?) } else { None };
        Ok(Point { x, y, z, m })
    }

    fn points(&mut self, order: ByteOrder, has_z: bool, has_m: bool) -> Result<Vec<Point>, CodecError> {
        let point_size = 8 * (2 + has_z as usize + has_m as usize);
        let n = self.count(order, point_size)?;
        (0..n).map(|_| self.point(order, has_z, has_m)).collect()
    }

    fn polygon(&mut self, order: ByteOrder, has_z: bool, has_m: bool) -> Result<Polygon, CodecError> {
        let n = self.count(order, 4)?;
        let rings = (0..n)
            .map(|_| self.points(order, has_z, has_m).map(LineString::new))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Polygon::from_rings(rings))
    }

    fn children(&mut self, order: ByteOrder) -> Result<Vec<Geometry>, CodecError> {
        let n = self.count(order, 5)?;
        (0..n).map(|_| self.geometry()).collect()
    }

    fn geometry(&mut self) -> Result<Geometry, CodecError> {
        if self.depth == MAX_NESTING {
            return Err(CodecError::TooDeep(MAX_NESTING));
        }
        self.depth += 1;
        let geometry = self.record();
        self.depth -= 1;
        geometry
    }

    fn record(&mut self) -> Result<Geometry, CodecError> {
        let marker = self.u8()?;
        let order = ByteOrder::from_marker(marker).ok_or(CodecError::UnknownByteOrder(marker))?;
        let code = self.u32(order)?;
        let (payload, has_z, has_m) = decode_type_code(code)?;
        let geometry = match payload {
            Payload::Point => self.point(order, has_z, has_m)?.into(),
            Payload::LineString => LineString::new(self.points(order, has_z, has_m)?).into(),
            Payload::Polygon => self.polygon(order, has_z, has_m)?.into(),
            Payload::PolyhedralSurface => {
                let mut surface = PolyhedralSurface::default();
                for child in self.children(order)? {
                    match child.into_kind() {
                        GeometryKind::Polygon(p) => surface.add_patch(p),
                        other => {
                            return Err(GeometryError::WrongChildKind {
                                collection: GeometryType::PolyhedralSurface,
                                found: Geometry::from(other).geometry_type(),
                            }
                            .into());
                        }
                    }
                }
                surface.into()
            }
            Payload::MultiPoint => {
                let mut mp = MultiPoint::default();
                for child in self.children(order)? {
                    mp.add_geometry(child)?;
                }
                mp.into()
            }
            Payload::MultiLineString => {
                let mut ml = MultiLineString::default();
                for child in self.children(order)? {
                    ml.add_geometry(child)?;
                }
                ml.into()
            }
            Payload::MultiPolygon => {
                let mut mp = MultiPolygon::default();
                for child in self.children(order)? {
                    mp.add_geometry(child)?;
                }
                mp.into()
            }
            Payload::GeometryCollection => {
                GeometryCollection::from_geometries(self.children(order)?).into()
            }
        };
        Ok(geometry)
    }
}

/// Decode one WKB record. Trailing bytes are ignored.
pub fn read(bytes: &[u8]) -> Result<Geometry, CodecError> {
    WkbReader {
        buf: bytes,
        pos: 0,
        depth: 0,
    }
    .geometry()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_xdr_layout() {
        let bytes = write(&Point::new(1.0, 2.0).into(), ByteOrder::Xdr).unwrap();
        assert_eq!(bytes.len(), 21);
        assert_eq!(bytes[0], 0);
        assert_eq!(&bytes[1..5], &[0, 0, 0, 1]);
        assert_eq!(&bytes[5..13], &1.0f64.to_be_bytes());
        assert_eq!(&bytes[13..21], &2.0f64.to_be_bytes());
    }

    #[test]
    fn test_point_ndr_layout() {
        let bytes = write(&Point::new_z(1.0, 2.0, 3.0).into(), ByteOrder::Ndr).unwrap();
        assert_eq!(bytes[0], 1);
        assert_eq!(&bytes[1..5], &1001u32.to_le_bytes());
        assert_eq!(bytes.len(), 1 + 4 + 24);
    }

    #[test]
    fn test_line_string_layout() {
        let line = LineString::from_xy(&[(0.0, 0.0), (1.0, 1.0), (2.0, 0.0)]);
        let bytes = write(&line.into(), ByteOrder::Xdr).unwrap();
        assert_eq!(&bytes[1..5], &[0, 0, 0, 2]);
        assert_eq!(&bytes[5..9], &[0, 0, 0, 3]);
        assert_eq!(bytes.len(), 9 + 3 * 16);
    }

    #[test]
    fn test_round_trip_mixed_byte_orders() {
        // A collection in NDR whose child is XDR.
        let mut bytes = vec![1];
        bytes.extend_from_slice(&7u32.to_le_bytes());
        bytes.extend_from_slice(&1u32.to_le_bytes());
        bytes.extend(write(&Point::new(5.0, 6.0).into(), ByteOrder::Xdr).unwrap());
        let g = read(&bytes).unwrap();
        let gc = g.as_collection().unwrap();
        assert_eq!(gc.geometries()[0].as_point(), Some(&Point::new(5.0, 6.0)));
    }

    #[test]
    fn test_round_trip_zm_multi_polygon() {
        let ring = LineString::new(vec![
            Point::new_zm(0.0, 0.0, 1.0, 9.0),
            Point::new_zm(1.0, 0.0, 2.0, 8.0),
            Point::new_zm(1.0, 1.0, 3.0, 7.0),
            Point::new_zm(0.0, 0.0, 1.0, 9.0),
        ]);
        let g: Geometry = MultiPolygon::new(vec![Polygon::new(ring)]).into();
        for order in [ByteOrder::Xdr, ByteOrder::Ndr] {
            let bytes = write(&g, order).unwrap();
            assert_eq!(read(&bytes).unwrap(), g);
        }
    }

    #[test]
    fn test_unknown_type_code_is_error() {
        let mut bytes = vec![0];
        bytes.extend_from_slice(&99u32.to_be_bytes());
        assert_eq!(read(&bytes), Err(CodecError::UnknownTypeCode(99)));
        let mut bytes = vec![0];
        bytes.extend_from_slice(&4001u32.to_be_bytes());
        assert_eq!(read(&bytes), Err(CodecError::UnknownTypeCode(4001)));
    }

    #[test]
    fn test_bad_marker_and_truncation() {
        assert_eq!(read(&[9, 0, 0, 0, 1]), Err(CodecError::UnknownByteOrder(9)));
        let bytes = write(&Point::new(1.0, 2.0).into(), ByteOrder::Xdr).unwrap();
        assert!(matches!(read(&bytes[..15]), Err(CodecError::Truncated(_))));
        assert!(matches!(read(&[]), Err(CodecError::Truncated(0))));
    }

    #[test]
    fn test_multi_point_with_wrong_child_kind() {
        let mut bytes = vec![0];
        bytes.extend_from_slice(&4u32.to_be_bytes());
        bytes.extend_from_slice(&1u32.to_be_bytes());
        bytes.extend(write(&LineString::from_xy(&[(0.0, 0.0), (1.0, 0.0)]).into(), ByteOrder::Xdr).unwrap());
        assert!(matches!(read(&bytes), Err(CodecError::Structure(_))));
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn test_count_overflow_is_error() {
        let mut w = WkbWriter {
            out: Vec::new(),
            order: ByteOrder::Xdr,
        };
        let n = u32::MAX as usize + 1;
        assert_eq!(w.put_count(n), Err(CodecError::CountOverflow(n)));
        assert!(w.out.is_empty());
        assert_eq!(w.put_count(u32::MAX as usize), Ok(()));
        assert_eq!(w.out, vec![0xff; 4]);
    }

    #[test]
    fn test_empty_point_round_trip() {
        let g = Geometry::empty(GeometryType::Point);
        for order in [ByteOrder::Xdr, ByteOrder::Ndr] {
            let bytes = write(&g, order).unwrap();
            assert_eq!(bytes.len(), 21);
            let back = read(&bytes).unwrap();
            assert_eq!(back.geometry_type(), GeometryType::Point);
            assert!(back.is_empty());
            assert_eq!(back, g);
        }
    }

    #[test]
    fn test_deep_nesting_is_rejected() {
        let mut bytes = Vec::new();
        for _ in 0..100_000 {
            bytes.push(0);
            bytes.extend_from_slice(&7u32.to_be_bytes());
            bytes.extend_from_slice(&1u32.to_be_bytes());
        }
        bytes.extend(write(&Point::new(1.0, 2.0).into(), ByteOrder::Xdr).unwrap());
        assert_eq!(read(&bytes), Err(CodecError::TooDeep(MAX_NESTING)));
    }

    #[test]
    fn test_nesting_below_the_cap_is_read() {
        let mut g: Geometry = Point::new(1.0, 2.0).into();
        for _ in 0..32 {
            g = GeometryCollection::from_geometries(vec![g]).into();
        }
        let bytes = write(&g, ByteOrder::Ndr).unwrap();
        assert_eq!(read(&bytes).unwrap(), g);
    }

    #[test]
    fn test_tin_and_triangle_codes() {
        let triangle = Polygon::new(LineString::from_xy(&[(0.0, 0.0), (1.0, 0.0), (0.0, 1.0), (0.0, 0.0)]));
        let tri_bytes = write(&triangle.clone().into(), ByteOrder::Xdr).unwrap();
        let mut bytes = vec![0];
        bytes.extend_from_slice(&TIN.to_be_bytes());
        bytes.extend_from_slice(&1u32.to_be_bytes());
        bytes.push(0);
        bytes.extend_from_slice(&TRIANGLE.to_be_bytes());
        bytes.extend_from_slice(&tri_bytes[5..]);
        let g = read(&bytes).unwrap();
        match g.kind() {
            GeometryKind::PolyhedralSurface(s) => assert_eq!(s.patches(), &[triangle]),
            other => panic!("expected a PolyhedralSurface, got {other:?}"),
        }
    }
}
