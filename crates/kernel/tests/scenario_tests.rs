//! End-to-end scenarios across the codec, relate and buffer engines.

use sfa_kernel::{
    BufferParams, ByteOrder, CodecError, EndCap, Geometry, GeometryType, Location, Relate,
    RelateMode, SimpleFeature, Tolerance, UnionPolicy,
};

fn wkt(text: &str) -> Geometry {
    Geometry::from_text(text).unwrap()
}

fn close(a: f64, b: f64, tol: f64) -> bool {
    (a - b).abs() < tol
}

// ─── Codec ───────────────────────────────────────────────────────────────────

#[test]
fn test_point_text_uses_six_decimals() {
    let g = wkt("POINT(1 2)");
    assert_eq!(g.as_text(), "POINT (1.000000 2.000000)");
}

#[test]
fn test_text_and_binary_agree() {
    let g = wkt("POLYGON ((0 0, 4 0, 4 4, 0 4, 0 0), (1 1, 1 2, 2 2, 2 1, 1 1))");
    let from_xdr = Geometry::from_binary(&g.as_binary().unwrap()).unwrap();
    let from_ndr = Geometry::from_binary(&g.as_binary_with_order(ByteOrder::Ndr).unwrap()).unwrap();
    assert_eq!(from_xdr, g);
    assert_eq!(from_ndr, g);
    assert_eq!(from_xdr.as_text(), g.as_text());
}

#[test]
fn test_binary_header_is_big_endian_by_default() {
    let bytes = wkt("POINT Z (1 2 3)").as_binary().unwrap();
    assert_eq!(bytes[0], 0);
    assert_eq!(&bytes[1..5], &1001u32.to_be_bytes());
    assert_eq!(bytes.len(), 1 + 4 + 3 * 8);
}

#[test]
fn test_malformed_inputs_are_errors() {
    assert!(Geometry::from_text("POINT (1").is_err());
    assert!(Geometry::from_text("CIRCLE (1 2)").is_err());
    assert!(matches!(Geometry::from_binary(&[1, 2]), Err(CodecError::Truncated(_))));
    let mut bytes = wkt("POINT (1 2)").as_binary().unwrap();
    bytes[4] = 99;
    assert!(Geometry::from_binary(&bytes).is_err());
}

#[test]
fn test_empty_round_trips() {
    let g = wkt("MULTIPOLYGON EMPTY");
    assert!(g.is_empty());
    assert_eq!(g.geometry_type(), GeometryType::MultiPolygon);
    assert_eq!(g.as_text(), "MULTIPOLYGON EMPTY");
    assert_eq!(Geometry::from_binary(&g.as_binary().unwrap()).unwrap(), g);

    let p = wkt("POINT EMPTY");
    assert_eq!(p.geometry_type(), GeometryType::Point);
    assert_eq!(p.as_text(), "POINT EMPTY");
    let back = Geometry::from_binary(&p.as_binary().unwrap()).unwrap();
    assert_eq!(back.as_text(), "POINT EMPTY");
    assert!(back.equals(&p) && back.equals(&g));
    assert!(p.buffer(1.0).unwrap().is_empty());
}

// ─── Relate ──────────────────────────────────────────────────────────────────

#[test]
fn test_crossing_segments() {
    let a = wkt("LINESTRING (0 0, 2 2)");
    let b = wkt("LINESTRING (0 2, 2 0)");
    assert!(a.crosses(&b));
    assert!(a.relate_pattern(&b, "0********").unwrap());
    assert!(a.intersects(&b));
    assert!(!a.touches(&b));
}

#[test]
fn test_polygon_predicates() {
    let big = wkt("POLYGON ((0 0, 10 0, 10 10, 0 10, 0 0))");
    let small = wkt("POLYGON ((2 2, 4 2, 4 4, 2 4, 2 2))");
    let neighbour = wkt("POLYGON ((10 0, 20 0, 20 10, 10 10, 10 0))");
    let crossing = wkt("POLYGON ((5 5, 15 5, 15 15, 5 15, 5 5))");

    assert!(small.within(&big) && big.contains(&small));
    assert!(big.touches(&neighbour) && !big.overlaps(&neighbour));
    assert!(big.overlaps(&crossing) && !big.touches(&crossing));
    assert!(small.disjoint(&neighbour));
    assert_eq!(big.relate(&crossing).to_string(), "212101212");
}

#[test]
fn test_equals_ignores_start_vertex_and_direction() {
    let a = wkt("POLYGON ((0 0, 1 0, 1 1, 0 1, 0 0))");
    let b = wkt("POLYGON ((1 1, 1 0, 0 0, 0 1, 1 1))");
    assert!(a.equals(&b));
}

#[test]
fn test_point_in_polygon_with_hole() {
    let poly = wkt("POLYGON ((0 0, 10 0, 10 10, 0 10, 0 0), (3 3, 3 7, 7 7, 7 3, 3 3))");
    let inside = wkt("POINT (1 1)");
    let in_hole = wkt("POINT (5 5)");
    let on_hole_edge = wkt("POINT (3 5)");
    assert!(inside.within(&poly));
    assert!(in_hole.disjoint(&poly));
    assert!(on_hole_edge.touches(&poly));
    let m = on_hole_edge.relate(&poly);
    assert_eq!(m.get(Location::Interior, Location::Boundary), Some(0));
}

#[test]
fn test_spatial_mode_with_explicit_tolerance() {
    let a = wkt("POINT Z (0 0 0)");
    let b = wkt("POINT Z (0 0 1)");
    let tol = Tolerance::new(1e-9).unwrap();
    assert!(Relate::with_tolerance(&a, &b, RelateMode::Planar, tol).equals());
    assert!(Relate::with_tolerance(&a, &b, RelateMode::Spatial, tol).disjoint());
}

// ─── Buffer ──────────────────────────────────────────────────────────────────

#[test]
fn test_segment_buffer_envelope() {
    let g = wkt("LINESTRING (0 0, 10 0)");
    let out = g.buffer(1.0).unwrap();
    let env = out.bounds().unwrap();
    assert!(close(env.min.x, -1.0, 1e-6) && close(env.max.x, 11.0, 1e-6));
    assert!(close(env.min.y, -1.0, 1e-6) && close(env.max.y, 1.0, 1e-6));
    assert!(out.contains(&g));
}

#[test]
fn test_unit_square_inset() {
    let g = wkt("POLYGON ((0 0, 1 0, 1 1, 0 1, 0 0))");
    let out = g.buffer(-0.25).expect("inset of the unit square exists");
    let expected = wkt("POLYGON ((0.25 0.25, 0.75 0.25, 0.75 0.75, 0.25 0.75, 0.25 0.25))");
    assert!(out.equals(&expected));
}

#[test]
fn test_buffer_keeps_input_covered() {
    let g = wkt("LINESTRING (0 0, 5 0, 5 5, 0 5)");
    let out = g.buffer(0.5).unwrap();
    assert_eq!(out.geometry_type(), GeometryType::Polygon);
    assert!(out.contains(&g));
}

#[test]
fn test_collection_union_policies() {
    let g = wkt("GEOMETRYCOLLECTION (POINT (0 0), LINESTRING (0 0, 4 0))");
    let merged = g.buffer(1.0).unwrap();
    assert_eq!(merged.geometry_type(), GeometryType::Polygon);

    let params = BufferParams::default()
        .with_union_policy(UnionPolicy::Disjoint)
        .with_end_cap(EndCap::Flat);
    let apart = g.buffer_with(1.0, &params).unwrap();
    assert_eq!(apart.geometry_type(), GeometryType::GeometryCollection);
    assert_eq!(apart.as_collection().unwrap().num_geometries(), 2);
}

#[test]
fn test_buffer_result_encodes() {
    let out = wkt("POINT (0 0)").buffer(2.0).unwrap();
    let back = Geometry::from_binary(&out.as_binary().unwrap()).unwrap();
    assert_eq!(back, out);
    assert!(out.as_text().starts_with("POLYGON (("));
}

#[test]
fn test_buffer_params_serde() {
    let params = BufferParams::default().with_quadrant_segments(4);
    let json = serde_json::to_string(&params).unwrap();
    let back: BufferParams = serde_json::from_str(&json).unwrap();
    assert_eq!(back, params);

    let g = wkt("LINESTRING (0 0, 1 1)");
    let json = serde_json::to_string(&g).unwrap();
    assert_eq!(serde_json::from_str::<Geometry>(&json).unwrap(), g);
}
