//! Great-circle distance and radius-bounded ranking.
//!
//! Pure functions of their inputs: no shared state, safe to run in
//! parallel across institutions.

use serde::Serialize;

use crate::models::{Coordinates, Institution};

/// Mean Earth radius in kilometers.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// An institution paired with its distance from the search origin.
/// `distance_km` is absent when no origin was supplied or the record has
/// no coordinates.
#[derive(Debug, Clone, Serialize)]
pub struct RankedResult {
    #[serde(flatten)]
    pub institution: Institution,

    pub distance_km: Option<f64>,
}

/// Haversine great-circle distance between two points, in kilometers.
#[must_use]
pub fn haversine_km(a: Coordinates, b: Coordinates) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let dlat = (b.latitude - a.latitude).to_radians();
    let dlon = (b.longitude - a.longitude).to_radians();

    let h = (dlat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_KM * c
}

/// Bounding box (`min_lat`, `max_lat`, `min_lon`, `max_lon`) around a point.
///
/// A cheap prefilter: candidates outside the box cannot be within
/// `distance_km`, so only the survivors need the exact haversine.
#[must_use]
pub fn bounding_box(center: Coordinates, distance_km: f64) -> (f64, f64, f64, f64) {
    // 1 degree of latitude is ~111 km everywhere; longitude shrinks with
    // the cosine of the latitude.
    let lat_offset = distance_km / 111.0;
    let lon_offset = distance_km / (111.0 * center.latitude.to_radians().cos());

    (
        center.latitude - lat_offset,
        center.latitude + lat_offset,
        center.longitude - lon_offset,
        center.longitude + lon_offset,
    )
}

/// Ranks institutions by distance from `origin`, dropping anything without
/// coordinates or farther than `radius_km`. Ascending by distance, with a
/// case-insensitive name tie-break so the ordering is deterministic no
/// matter how the candidates were produced.
#[must_use]
pub fn rank(
    origin: Coordinates,
    institutions: impl IntoIterator<Item = Institution>,
    radius_km: f64,
) -> Vec<RankedResult> {
    let (min_lat, max_lat, min_lon, max_lon) = bounding_box(origin, radius_km);

    let mut results: Vec<RankedResult> = institutions
        .into_iter()
        .filter_map(|institution| {
            // Ungeocoded records are excluded, never given a default distance.
            let coords = institution.coordinates?;
            if coords.latitude < min_lat
                || coords.latitude > max_lat
                || coords.longitude < min_lon
                || coords.longitude > max_lon
            {
                return None;
            }
            let distance = haversine_km(origin, coords);
            (distance <= radius_km).then(|| RankedResult {
                institution,
                distance_km: Some(distance),
            })
        })
        .collect();

    results.sort_by(|a, b| {
        a.distance_km
            .partial_cmp(&b.distance_km)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| {
                a.institution
                    .name
                    .to_lowercase()
                    .cmp(&b.institution.name.to_lowercase())
            })
    });

    results
}

/// Formats a distance for display: metres under a kilometre, otherwise one
/// decimal of kilometres.
#[must_use]
pub fn format_distance(distance_km: f64) -> String {
    if distance_km < 1.0 {
        format!("{} m", (distance_km * 1000.0) as i64)
    } else {
        format!("{distance_km:.1} km")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::InstitutionType;

    fn institution(id: i64, name: &str, coords: Option<Coordinates>) -> Institution {
        Institution {
            id,
            institution_type: InstitutionType::Primary,
            name: name.to_string(),
            city: "Amsterdam".to_string(),
            address: None,
            postal_code: None,
            coordinates: coords,
            rating: None,
            is_bilingual: false,
            is_international: false,
            offers_english: false,
            details: serde_json::Value::Null,
            description: None,
        }
    }

    #[test]
    fn haversine_is_symmetric() {
        let amsterdam = Coordinates::new(52.3676, 4.9041);
        let utrecht = Coordinates::new(52.0907, 5.1214);
        let there = haversine_km(amsterdam, utrecht);
        let back = haversine_km(utrecht, amsterdam);
        assert!((there - back).abs() < 1e-9);
    }

    #[test]
    fn haversine_of_identical_points_is_zero() {
        let p = Coordinates::new(52.3676, 4.9041);
        assert_eq!(haversine_km(p, p), 0.0);
    }

    #[test]
    fn haversine_one_degree_longitude_at_equator() {
        let d = haversine_km(Coordinates::new(0.0, 0.0), Coordinates::new(0.0, 1.0));
        assert!((d - 111.19).abs() < 0.5, "got {d}");
    }

    #[test]
    fn rank_enforces_radius_bound() {
        let origin = Coordinates::new(52.3676, 4.9041);
        let candidates = vec![
            institution(1, "Nearby", Some(Coordinates::new(52.37, 4.91))),
            institution(2, "Utrecht", Some(Coordinates::new(52.0907, 5.1214))),
        ];

        let results = rank(origin, candidates, 5.0);
        assert_eq!(results.len(), 1);
        for r in &results {
            assert!(r.distance_km.unwrap() <= 5.0);
            assert!(r.distance_km.unwrap() >= 0.0);
        }
    }

    #[test]
    fn rank_skips_ungeocoded_records() {
        let origin = Coordinates::new(52.3676, 4.9041);
        let candidates = vec![institution(1, "No coords", None)];
        assert!(rank(origin, candidates, 100.0).is_empty());
    }

    #[test]
    fn rank_sorts_ascending_with_name_tie_break() {
        let origin = Coordinates::new(52.0, 4.0);
        let same_spot = Coordinates::new(52.01, 4.0);
        let candidates = vec![
            institution(1, "zuiderlicht", Some(same_spot)),
            institution(2, "Anker", Some(same_spot)),
            institution(3, "Close", Some(Coordinates::new(52.001, 4.0))),
        ];

        let results = rank(origin, candidates, 50.0);
        let names: Vec<&str> = results
            .iter()
            .map(|r| r.institution.name.as_str())
            .collect();
        assert_eq!(names, vec!["Close", "Anker", "zuiderlicht"]);
    }

    #[test]
    fn bounding_box_contains_radius() {
        let center = Coordinates::new(52.0, 5.0);
        let (min_lat, max_lat, min_lon, max_lon) = bounding_box(center, 10.0);
        // A point 9 km due north stays inside the box.
        let north = Coordinates::new(52.0 + 9.0 / 111.0, 5.0);
        assert!(north.latitude > min_lat && north.latitude < max_lat);
        assert!(north.longitude > min_lon && north.longitude < max_lon);
    }

    #[test]
    fn formats_short_distances_in_metres() {
        assert_eq!(format_distance(0.25), "250 m");
        assert_eq!(format_distance(1.5), "1.5 km");
    }
}
