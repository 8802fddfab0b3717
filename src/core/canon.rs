//! BPO canonicalization and content hashing.
//!
//! Canonical form is compact JSON `{"attributes":…,"geometry":…,"v":1}` with
//! object keys sorted at every depth. Coordinates are fixed-point integers of
//! nano-degrees (`round(x * 1e9)`, half away from zero), so float formatting
//! noise below 1e-9 degrees never changes a hash. Attribute floats keep their
//! shortest round-trip form with `-0.0` folded into `0.0`.
//!
//! Changing any rule here changes every content hash; bump [`CANON_VERSION`]
//! if that is ever intended.

use serde_json::{Map, Value};

use super::attributes::{AttrValue, Attributes};
use super::error::EncodingError;
use super::geometry::{Geometry, Position};
use super::identity::ContentHash;
use super::json_canon::{canon_f64, to_canon_json_bytes};

pub const CANON_VERSION: u64 = 1;

/// Fixed-point scale for coordinates: one unit is 1e-9 degrees.
pub const COORDINATE_SCALE: f64 = 1e9;

/// Deterministic byte encoding of (geometry, attributes).
pub fn canonicalize(geometry: &Geometry, attributes: &Attributes) -> Result<Vec<u8>, EncodingError> {
    geometry.validate()?;
    let mut root = Map::new();
    root.insert("v".into(), Value::from(CANON_VERSION));
    root.insert("geometry".into(), geometry_value(geometry, "$")?);
    root.insert("attributes".into(), attributes_value(attributes)?);
    to_canon_json_bytes(Value::Object(root))
}

/// Canonicalize raw GeoJSON geometry and a JSON attribute object.
pub fn canonicalize_json(geometry: Value, attributes: Value) -> Result<Vec<u8>, EncodingError> {
    let geometry = Geometry::from_geojson(geometry)?;
    let attributes = Attributes::from_json(attributes)?;
    canonicalize(&geometry, &attributes)
}

/// SHA-256 of the canonical encoding.
pub fn content_hash(geometry: &Geometry, attributes: &Attributes) -> Result<ContentHash, EncodingError> {
    canonicalize(geometry, attributes).map(|bytes| ContentHash::digest(&bytes))
}

/// Quantize one ordinate to nano-degrees.
pub fn quantize(value: f64, path: &str) -> Result<i64, EncodingError> {
    if !value.is_finite() {
        return Err(EncodingError::NonFiniteCoordinate {
            path: path.to_string(),
            value,
        });
    }
    let scaled = (value * COORDINATE_SCALE).round();
    // i64::MAX is not exactly representable; stay strictly inside.
    if scaled.abs() >= 9.2e18 {
        return Err(EncodingError::geometry(format!(
            "ordinate {value} at {path} exceeds the fixed-point range"
        )));
    }
    if scaled == 0.0 {
        return Ok(0);
    }
    Ok(scaled as i64)
}

fn position_value(pos: &Position, path: &str) -> Result<Value, EncodingError> {
    pos.ordinates()
        .enumerate()
        .map(|(idx, v)| quantize(v, &format!("{path}[{idx}]")).map(Value::from))
        .collect::<Result<Vec<_>, _>>()
        .map(Value::Array)
}

fn positions_value(positions: &[Position], path: &str) -> Result<Value, EncodingError> {
    positions
        .iter()
        .enumerate()
        .map(|(idx, p)| position_value(p, &format!("{path}[{idx}]")))
        .collect::<Result<Vec<_>, _>>()
        .map(Value::Array)
}

fn rings_value(rings: &[Vec<Position>], path: &str) -> Result<Value, EncodingError> {
    rings
        .iter()
        .enumerate()
        .map(|(idx, r)| positions_value(r, &format!("{path}[{idx}]")))
        .collect::<Result<Vec<_>, _>>()
        .map(Value::Array)
}

fn geometry_value(geometry: &Geometry, path: &str) -> Result<Value, EncodingError> {
    let mut obj = Map::new();
    obj.insert(
        "type".into(),
        Value::from(geometry.geometry_type().as_str()),
    );
    let coords_path = format!("{path}.coordinates");
    let coordinates = match geometry {
        Geometry::Point { coordinates } => position_value(coordinates, &coords_path)?,
        Geometry::LineString { coordinates } | Geometry::MultiPoint { coordinates } => {
            positions_value(coordinates, &coords_path)?
        }
        Geometry::Polygon { coordinates } | Geometry::MultiLineString { coordinates } => {
            rings_value(coordinates, &coords_path)?
        }
        Geometry::MultiPolygon { coordinates } => coordinates
            .iter()
            .enumerate()
            .map(|(idx, poly)| rings_value(poly, &format!("{coords_path}[{idx}]")))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array)?,
        Geometry::GeometryCollection { geometries } => {
            let members = geometries
                .iter()
                .enumerate()
                .map(|(idx, g)| geometry_value(g, &format!("{path}.geometries[{idx}]")))
                .collect::<Result<Vec<_>, _>>()?;
            obj.insert("geometries".into(), Value::Array(members));
            return Ok(Value::Object(obj));
        }
    };
    obj.insert("coordinates".into(), coordinates);
    Ok(Value::Object(obj))
}

fn attributes_value(attributes: &Attributes) -> Result<Value, EncodingError> {
    attributes
        .iter()
        .map(|(k, v)| attr_value(v, k).map(|v| (k.clone(), v)))
        .collect::<Result<Map<_, _>, _>>()
        .map(Value::Object)
}

fn attr_value(value: &AttrValue, key: &str) -> Result<Value, EncodingError> {
    Ok(match value {
        AttrValue::Null => Value::Null,
        AttrValue::Bool(b) => Value::Bool(*b),
        AttrValue::Int(i) => Value::from(*i),
        AttrValue::Float(f) => canon_f64(key, *f)?,
        AttrValue::Text(s) => Value::String(s.clone()),
        AttrValue::List(items) => Value::Array(
            items
                .iter()
                .enumerate()
                .map(|(idx, item)| attr_value(item, &format!("{key}[{idx}]")))
                .collect::<Result<_, _>>()?,
        ),
        AttrValue::Map(map) => Value::Object(
            map.iter()
                .map(|(k, v)| attr_value(v, &format!("{key}.{k}")).map(|v| (k.clone(), v)))
                .collect::<Result<_, _>>()?,
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn canonical_bytes_have_fixed_layout() {
        let bytes = canonicalize(
            &Geometry::point(30.0, 60.0),
            &Attributes::new().with("class", "test_class"),
        )
        .unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            r#"{"attributes":{"class":"test_class"},"geometry":{"coordinates":[30000000000,60000000000],"type":"Point"},"v":1}"#
        );
    }

    #[test]
    fn sub_nanodegree_noise_does_not_change_hash() {
        let attrs = Attributes::new();
        let a = content_hash(&Geometry::point(0.1 + 0.2, 10.0), &attrs).unwrap();
        let b = content_hash(&Geometry::point(0.3, 10.0), &attrs).unwrap();
        let c = content_hash(&Geometry::point(0.300000001, 10.0), &attrs).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn negative_zero_is_zero() {
        let attrs = Attributes::new().with("offset", -0.0);
        let a = content_hash(&Geometry::point(-0.0, 0.0), &attrs).unwrap();
        let b = content_hash(&Geometry::point(0.0, 0.0), &Attributes::new().with("offset", 0.0))
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn ring_order_is_significant() {
        let attrs = Attributes::new();
        let forward = Geometry::polygon([(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 0.0)]);
        let reversed = Geometry::polygon([(0.0, 0.0), (1.0, 1.0), (1.0, 0.0), (0.0, 0.0)]);
        assert_ne!(
            content_hash(&forward, &attrs).unwrap(),
            content_hash(&reversed, &attrs).unwrap()
        );
    }

    #[test]
    fn int_and_float_attributes_differ() {
        let geom = Geometry::point(1.0, 1.0);
        let int = content_hash(&geom, &Attributes::new().with("n", 1)).unwrap();
        let float = content_hash(&geom, &Attributes::new().with("n", 1.0)).unwrap();
        assert_ne!(int, float);
    }

    #[test]
    fn raw_json_key_order_does_not_matter() {
        let geometry = json!({"type": "Point", "coordinates": [5.5, 6.5]});
        let a: Value = serde_json::from_str(r#"{"b": {"y": 1, "x": 2}, "a": [1, 2]}"#).unwrap();
        let b: Value = serde_json::from_str(r#"{"a": [1, 2], "b": {"x": 2, "y": 1}}"#).unwrap();
        assert_eq!(
            canonicalize_json(geometry.clone(), a).unwrap(),
            canonicalize_json(geometry, b).unwrap()
        );
    }

    #[test]
    fn rejects_non_finite_coordinates_and_attributes() {
        let err = canonicalize(&Geometry::point(f64::NAN, 0.0), &Attributes::new()).unwrap_err();
        assert!(matches!(err, EncodingError::NonFiniteCoordinate { .. }));

        let err = canonicalize(
            &Geometry::point(0.0, 0.0),
            &Attributes::new().with("h", f64::INFINITY),
        )
        .unwrap_err();
        assert!(matches!(err, EncodingError::UnsupportedAttribute { .. }));
    }

    #[test]
    fn quantize_rounds_to_nearest_nanodegree() {
        assert_eq!(quantize(1.0000000006, "$").unwrap(), 1_000_000_001);
        assert_eq!(quantize(-1.0000000006, "$").unwrap(), -1_000_000_001);
        assert_eq!(quantize(-0.0000000004, "$").unwrap(), 0);
        assert!(quantize(1e11, "$").is_err());
    }
}
