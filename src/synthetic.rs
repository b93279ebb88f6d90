//! Generated demonstration datasets, shown when neither the backend nor
//! the user has supplied anything for the active layer.

use rand::Rng;
use serde::Serialize;

use crate::models::{Point, WeightedPoint};
use crate::region::Region;

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Hotspot {
    pub lat: f64,
    pub lng: f64,
    pub weight: f64,
    pub label: &'static str,
}

/// Named foraging hotspots the heat field clusters around.
pub const HOTSPOTS: [Hotspot; 5] = [
    Hotspot { lat: 15.0, lng: -74.0, weight: 1.0, label: "Central Caribbean" },
    Hotspot { lat: 19.5, lng: -78.5, weight: 0.9, label: "Jamaica/Cayman" },
    Hotspot { lat: 13.5, lng: -61.0, weight: 0.75, label: "Windward Islands" },
    Hotspot { lat: 22.5, lng: -84.5, weight: 0.7, label: "South of Cuba" },
    Hotspot { lat: 11.5, lng: -69.5, weight: 0.8, label: "ABC Islands" },
];

const HOTSPOT_SIGMA: f64 = 3.5;
// The floor keeps a faint background signal everywhere instead of the
// field dropping to exactly zero between hotspots.
const WEIGHT_FLOOR: f64 = 0.05;

/// Samples `count` weighted points: a latitude gradient (cooler toward
/// the north edge) plus a gaussian contribution from each hotspot,
/// clamped into `[0.05, 1.0]`.
pub fn heat_field(count: usize, region: &Region) -> Vec<WeightedPoint> {
    let mut rng = rand::thread_rng();
    (0..count)
        .map(|_| {
            let lat = rng.gen_range(region.lat1..region.lat2);
            let lng = rng.gen_range(region.lng1..region.lng2);

            let lat_norm = (lat - region.lat1) / region.lat_span();
            let mut weight = 1.0 - lat_norm * 0.6;
            for hotspot in &HOTSPOTS {
                let d = (lat - hotspot.lat).hypot(lng - hotspot.lng);
                weight +=
                    hotspot.weight * (-(d * d) / (2.0 * HOTSPOT_SIGMA * HOTSPOT_SIGMA)).exp();
            }
            let weight = (weight / 2.0).min(1.0).max(WEIGHT_FLOOR);

            WeightedPoint { lat, lng, weight }
        })
        .collect()
}

/// Uniform unweighted scatter inside the region; the neutral fallback
/// for dot layers.
pub fn scatter(count: usize, region: &Region) -> Vec<Point> {
    let mut rng = rand::thread_rng();
    (0..count)
        .map(|_| Point {
            lat: rng.gen_range(region.lat1..region.lat2),
            lng: rng.gen_range(region.lng1..region.lng2),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::CARIBBEAN;

    #[test]
    fn heat_field_returns_count_points_with_clamped_weights() {
        let field = heat_field(400, &CARIBBEAN);
        assert_eq!(field.len(), 400);
        for point in &field {
            assert!(CARIBBEAN.contains(point.lat, point.lng));
            assert!(point.weight >= 0.05, "weight {} below floor", point.weight);
            assert!(point.weight <= 1.0, "weight {} above ceiling", point.weight);
        }
    }

    #[test]
    fn heat_field_concentrates_around_hotspots() {
        // Points landing on a hotspot center must carry more weight
        // than the gradient alone would give the far corner.
        let field = heat_field(2000, &CARIBBEAN);
        let near_hotspot: Vec<_> = field
            .iter()
            .filter(|p| (p.lat - 15.0).hypot(p.lng - -74.0) < 1.0)
            .collect();
        for point in near_hotspot {
            assert!(point.weight > 0.5);
        }
    }

    #[test]
    fn scatter_stays_inside_the_region() {
        let points = scatter(300, &CARIBBEAN);
        assert_eq!(points.len(), 300);
        for point in &points {
            assert!(CARIBBEAN.contains(point.lat, point.lng));
        }
    }

    #[test]
    fn zero_count_is_allowed() {
        assert!(heat_field(0, &CARIBBEAN).is_empty());
        assert!(scatter(0, &CARIBBEAN).is_empty());
    }
}
