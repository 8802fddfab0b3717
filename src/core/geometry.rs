//! Layer 2: GeoJSON geometry
//!
//! Positions are `[lon, lat]` or `[lon, lat, alt]` in degrees. Ring and
//! point order is significant and is never rearranged.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::EncodingError;

pub const MIN_LON: f64 = -180.0;
pub const MAX_LON: f64 = 180.0;
pub const MIN_LAT: f64 = -90.0;
pub const MAX_LAT: f64 = 90.0;

/// Minimum number of positions in a LineString.
pub const MIN_LINE_POSITIONS: usize = 2;
/// Minimum number of positions in a Polygon ring (closed triangle).
pub const MIN_RING_POSITIONS: usize = 4;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct Position {
    pub lon: f64,
    pub lat: f64,
    pub alt: Option<f64>,
}

impl Position {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self {
            lon,
            lat,
            alt: None,
        }
    }

    pub fn with_alt(lon: f64, lat: f64, alt: f64) -> Self {
        Self {
            lon,
            lat,
            alt: Some(alt),
        }
    }

    /// Ordinates in GeoJSON order.
    pub fn ordinates(&self) -> impl Iterator<Item = f64> + '_ {
        [self.lon, self.lat].into_iter().chain(self.alt)
    }

    fn validate(&self, path: &str) -> Result<(), EncodingError> {
        for (idx, value) in self.ordinates().enumerate() {
            if !value.is_finite() {
                return Err(EncodingError::NonFiniteCoordinate {
                    path: format!("{path}[{idx}]"),
                    value,
                });
            }
        }
        if !(MIN_LON..=MAX_LON).contains(&self.lon) {
            return Err(EncodingError::geometry(format!(
                "longitude {} at {path} outside [{MIN_LON}, {MAX_LON}]",
                self.lon
            )));
        }
        if !(MIN_LAT..=MAX_LAT).contains(&self.lat) {
            return Err(EncodingError::geometry(format!(
                "latitude {} at {path} outside [{MIN_LAT}, {MAX_LAT}]",
                self.lat
            )));
        }
        Ok(())
    }
}

impl TryFrom<Vec<f64>> for Position {
    type Error = String;

    fn try_from(raw: Vec<f64>) -> Result<Self, Self::Error> {
        match raw.as_slice() {
            [lon, lat] => Ok(Position::new(*lon, *lat)),
            [lon, lat, alt] => Ok(Position::with_alt(*lon, *lat, *alt)),
            other => Err(format!(
                "position must have 2 or 3 ordinates (got {})",
                other.len()
            )),
        }
    }
}

impl From<Position> for Vec<f64> {
    fn from(pos: Position) -> Vec<f64> {
        pos.ordinates().collect()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeometryType {
    Point,
    LineString,
    Polygon,
    MultiPoint,
    MultiLineString,
    MultiPolygon,
    GeometryCollection,
}

impl GeometryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GeometryType::Point => "Point",
            GeometryType::LineString => "LineString",
            GeometryType::Polygon => "Polygon",
            GeometryType::MultiPoint => "MultiPoint",
            GeometryType::MultiLineString => "MultiLineString",
            GeometryType::MultiPolygon => "MultiPolygon",
            GeometryType::GeometryCollection => "GeometryCollection",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "Point" => Some(GeometryType::Point),
            "LineString" => Some(GeometryType::LineString),
            "Polygon" => Some(GeometryType::Polygon),
            "MultiPoint" => Some(GeometryType::MultiPoint),
            "MultiLineString" => Some(GeometryType::MultiLineString),
            "MultiPolygon" => Some(GeometryType::MultiPolygon),
            "GeometryCollection" => Some(GeometryType::GeometryCollection),
            _ => None,
        }
    }
}

impl fmt::Display for GeometryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// GeoJSON geometry object.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Point {
        coordinates: Position,
    },
    LineString {
        coordinates: Vec<Position>,
    },
    Polygon {
        coordinates: Vec<Vec<Position>>,
    },
    MultiPoint {
        coordinates: Vec<Position>,
    },
    MultiLineString {
        coordinates: Vec<Vec<Position>>,
    },
    MultiPolygon {
        coordinates: Vec<Vec<Vec<Position>>>,
    },
    GeometryCollection {
        geometries: Vec<Geometry>,
    },
}

impl Geometry {
    pub fn point(lon: f64, lat: f64) -> Self {
        Geometry::Point {
            coordinates: Position::new(lon, lat),
        }
    }

    pub fn line_string(points: impl IntoIterator<Item = (f64, f64)>) -> Self {
        Geometry::LineString {
            coordinates: points
                .into_iter()
                .map(|(lon, lat)| Position::new(lon, lat))
                .collect(),
        }
    }

    /// Single-ring polygon.
    pub fn polygon(ring: impl IntoIterator<Item = (f64, f64)>) -> Self {
        Geometry::Polygon {
            coordinates: vec![
                ring.into_iter()
                    .map(|(lon, lat)| Position::new(lon, lat))
                    .collect(),
            ],
        }
    }

    pub fn geometry_type(&self) -> GeometryType {
        match self {
            Geometry::Point { .. } => GeometryType::Point,
            Geometry::LineString { .. } => GeometryType::LineString,
            Geometry::Polygon { .. } => GeometryType::Polygon,
            Geometry::MultiPoint { .. } => GeometryType::MultiPoint,
            Geometry::MultiLineString { .. } => GeometryType::MultiLineString,
            Geometry::MultiPolygon { .. } => GeometryType::MultiPolygon,
            Geometry::GeometryCollection { .. } => GeometryType::GeometryCollection,
        }
    }

    /// Parse and validate a raw GeoJSON geometry object.
    pub fn from_geojson(value: Value) -> Result<Self, EncodingError> {
        if let Some(raw) = value.get("type").and_then(Value::as_str)
            && GeometryType::parse(raw).is_none()
        {
            return Err(EncodingError::geometry(format!(
                "unsupported geometry type `{raw}`"
            )));
        }
        let geometry: Geometry = serde_json::from_value(value)
            .map_err(|err| EncodingError::geometry(err.to_string()))?;
        geometry.validate()?;
        Ok(geometry)
    }

    pub fn to_geojson(&self) -> Result<Value, EncodingError> {
        Ok(serde_json::to_value(self)?)
    }

    /// Check ordinate finiteness, lon/lat ranges and minimum vertex counts.
    pub fn validate(&self) -> Result<(), EncodingError> {
        self.validate_at("$")
    }

    fn validate_at(&self, path: &str) -> Result<(), EncodingError> {
        match self {
            Geometry::Point { coordinates } => coordinates.validate(&format!("{path}.coordinates")),
            Geometry::LineString { coordinates } => {
                validate_line(coordinates, &format!("{path}.coordinates"))
            }
            Geometry::Polygon { coordinates } => {
                validate_polygon(coordinates, &format!("{path}.coordinates"))
            }
            Geometry::MultiPoint { coordinates } => {
                for (idx, pos) in coordinates.iter().enumerate() {
                    pos.validate(&format!("{path}.coordinates[{idx}]"))?;
                }
                Ok(())
            }
            Geometry::MultiLineString { coordinates } => {
                for (idx, line) in coordinates.iter().enumerate() {
                    validate_line(line, &format!("{path}.coordinates[{idx}]"))?;
                }
                Ok(())
            }
            Geometry::MultiPolygon { coordinates } => {
                for (idx, polygon) in coordinates.iter().enumerate() {
                    validate_polygon(polygon, &format!("{path}.coordinates[{idx}]"))?;
                }
                Ok(())
            }
            Geometry::GeometryCollection { geometries } => {
                for (idx, geometry) in geometries.iter().enumerate() {
                    geometry.validate_at(&format!("{path}.geometries[{idx}]"))?;
                }
                Ok(())
            }
        }
    }
}

fn validate_line(positions: &[Position], path: &str) -> Result<(), EncodingError> {
    if positions.len() < MIN_LINE_POSITIONS {
        return Err(EncodingError::geometry(format!(
            "line at {path} needs at least {MIN_LINE_POSITIONS} positions (got {})",
            positions.len()
        )));
    }
    for (idx, pos) in positions.iter().enumerate() {
        pos.validate(&format!("{path}[{idx}]"))?;
    }
    Ok(())
}

fn validate_polygon(rings: &[Vec<Position>], path: &str) -> Result<(), EncodingError> {
    if rings.is_empty() {
        return Err(EncodingError::geometry(format!(
            "polygon at {path} has no rings"
        )));
    }
    for (ring_idx, ring) in rings.iter().enumerate() {
        if ring.len() < MIN_RING_POSITIONS {
            return Err(EncodingError::geometry(format!(
                "ring at {path}[{ring_idx}] needs at least {MIN_RING_POSITIONS} positions (got {})",
                ring.len()
            )));
        }
        for (idx, pos) in ring.iter().enumerate() {
            pos.validate(&format!("{path}[{ring_idx}][{idx}]"))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_geojson_point_and_polygon() {
        let point = Geometry::from_geojson(json!({"type": "Point", "coordinates": [30.0, 60.0]}))
            .unwrap();
        assert_eq!(point, Geometry::point(30.0, 60.0));
        assert_eq!(point.geometry_type(), GeometryType::Point);

        let polygon = Geometry::from_geojson(json!({
            "type": "Polygon",
            "coordinates": [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]]
        }))
        .unwrap();
        assert_eq!(polygon.geometry_type(), GeometryType::Polygon);
    }

    #[test]
    fn keeps_altitude_ordinate() {
        let point = Geometry::from_geojson(json!({"type": "Point", "coordinates": [1.0, 2.0, 3.5]}))
            .unwrap();
        assert_eq!(
            point,
            Geometry::Point {
                coordinates: Position::with_alt(1.0, 2.0, 3.5)
            }
        );
        assert_eq!(
            point.to_geojson().unwrap(),
            json!({"type": "Point", "coordinates": [1.0, 2.0, 3.5]})
        );
    }

    #[test]
    fn rejects_out_of_range_and_short_shapes() {
        assert!(matches!(
            Geometry::point(181.0, 0.0).validate(),
            Err(EncodingError::InvalidGeometry { .. })
        ));
        assert!(matches!(
            Geometry::point(0.0, -90.5).validate(),
            Err(EncodingError::InvalidGeometry { .. })
        ));
        assert!(Geometry::line_string([(0.0, 0.0)]).validate().is_err());
        assert!(
            Geometry::polygon([(0.0, 0.0), (1.0, 0.0), (0.0, 0.0)])
                .validate()
                .is_err()
        );
        assert!(
            Geometry::Polygon {
                coordinates: Vec::new()
            }
            .validate()
            .is_err()
        );
    }

    #[test]
    fn rejects_non_finite_with_path() {
        let err = Geometry::line_string([(0.0, 0.0), (f64::NAN, 1.0)])
            .validate()
            .unwrap_err();
        match err {
            EncodingError::NonFiniteCoordinate { path, .. } => {
                assert_eq!(path, "$.coordinates[1][0]");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_type_and_bad_positions() {
        assert!(Geometry::from_geojson(json!({"type": "Circle", "coordinates": [0.0, 0.0]})).is_err());
        assert!(Geometry::from_geojson(json!({"type": "Point", "coordinates": [0.0]})).is_err());
        assert!(Geometry::from_geojson(json!({"type": "Point", "coordinates": "x"})).is_err());
    }

    #[test]
    fn validates_nested_collections() {
        let collection = Geometry::GeometryCollection {
            geometries: vec![
                Geometry::point(1.0, 1.0),
                Geometry::MultiPolygon {
                    coordinates: vec![vec![vec![Position::new(0.0, 0.0)]]],
                },
            ],
        };
        assert!(collection.validate().is_err());
    }
}
