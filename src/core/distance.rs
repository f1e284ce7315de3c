use crate::models::{BoundingBox, Geolocation};

/// Mean Earth radius in kilometers.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Kilometers per degree of latitude (and of longitude at the equator).
const KM_PER_DEGREE: f64 = 111.0;

/// Great-circle distance in kilometers between two points given in
/// degrees, by the spherical law of cosines.
#[inline]
pub fn great_circle_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let delta_lambda = (lon2 - lon1).to_radians();

    // acos is only defined on [-1, 1]; rounding can drift past it
    let cos_angle = (phi1.sin() * phi2.sin() + phi1.cos() * phi2.cos() * delta_lambda.cos())
        .clamp(-1.0, 1.0);

    cos_angle.acos() * EARTH_RADIUS_KM
}

/// Distance between two geolocated points in kilometers.
#[inline]
pub fn geodistance(origin: &Geolocation, to: &Geolocation) -> f64 {
    great_circle_distance(origin.lat, origin.lon, to.lat, to.lon)
}

/// Whether `to` lies within `distance_km` kilometers of `origin`.
#[inline]
pub fn is_close_enough(origin: &Geolocation, to: &Geolocation, distance_km: f64) -> bool {
    geodistance(origin, to) <= distance_km
}

/// Degree-space box that contains the `radius_km` circle around a point.
///
/// A containment check against it is a couple of comparisons, so the
/// search pipeline uses it to skip the trigonometry for obvious misses.
/// Longitude degrees shrink with latitude, hence the cosine correction.
pub fn calculate_bounding_box(lat: f64, lon: f64, radius_km: f64) -> BoundingBox {
    let lat_delta = radius_km / KM_PER_DEGREE;
    let lon_delta = radius_km / (KM_PER_DEGREE * lat.to_radians().cos().abs());

    BoundingBox {
        min_lat: lat - lat_delta,
        max_lat: lat + lat_delta,
        min_lon: lon - lon_delta,
        max_lon: lon + lon_delta,
    }
}

/// Whether a point falls inside a bounding box (edges included).
#[inline]
pub fn is_within_bounding_box(lat: f64, lon: f64, bbox: &BoundingBox) -> bool {
    lat >= bbox.min_lat
        && lat <= bbox.max_lat
        && lon >= bbox.min_lon
        && lon <= bbox.max_lon
}
