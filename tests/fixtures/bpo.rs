//! BPO builders.

use geoversion::{Attributes, Bpo, Geometry, StableIdentity};

/// A point feature whose identity comes from its `feature_id` attribute.
pub fn site(feature_id: &str, lon: f64, lat: f64) -> Bpo {
    Bpo::new(
        Geometry::point(lon, lat),
        Attributes::new()
            .with("feature_id", feature_id)
            .with("class", "site"),
    )
    .expect("valid site")
}

/// A point feature with no identity attribute.
pub fn anonymous(lon: f64, lat: f64) -> Bpo {
    Bpo::new(Geometry::point(lon, lat), Attributes::new().with("class", "marker")).expect("valid marker")
}

/// A closed square parcel with an explicitly assigned identity.
pub fn parcel(identity: &str, min_lon: f64, min_lat: f64, size: f64) -> Bpo {
    let ring = [
        (min_lon, min_lat),
        (min_lon + size, min_lat),
        (min_lon + size, min_lat + size),
        (min_lon, min_lat + size),
        (min_lon, min_lat),
    ];
    Bpo::new(Geometry::polygon(ring), Attributes::new().with("class", "parcel"))
        .expect("valid parcel")
        .with_identity(StableIdentity::new(identity).expect("identity"))
}
