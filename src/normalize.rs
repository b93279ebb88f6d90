//! Shape-sniffing conversion of loosely-typed backend JSON into the
//! canonical record types.
//!
//! Every function here is pure and total: a malformed value is never an
//! error, it simply normalizes to `None` and is filtered out upstream.
//! Structured backend points are checked for finiteness only; free-text
//! user input is additionally range-checked.

use serde_json::Value;

use crate::frame::Origin;
use crate::models::{ActivityPoint, MigrationPath, Point, Prediction, WeightedPoint};

/// Reads a numeric value, tolerating numbers encoded as strings (some
/// upstream serializers emit them). Non-finite values normalize away.
fn num(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|x| x.is_finite()),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|x| x.is_finite()),
        _ => None,
    }
}

/// Accepts a `[lat, lng, ..]` pair or an object exposing `lat`/`lng`
/// (or `latitude`/`longitude`) fields.
pub fn point(raw: &Value) -> Option<Point> {
    match raw {
        Value::Array(items) if items.len() >= 2 => {
            let lat = num(&items[0])?;
            let lng = num(&items[1])?;
            Some(Point { lat, lng })
        }
        Value::Object(map) => {
            let lat = num(map.get("lat").or_else(|| map.get("latitude"))?)?;
            let lng = num(map.get("lng").or_else(|| map.get("longitude"))?)?;
            Some(Point { lat, lng })
        }
        _ => None,
    }
}

/// Like [`point`], additionally reading an optional third array slot or
/// a `weight` field. A missing or unusable weight defaults to 1.
pub fn weighted_point(raw: &Value) -> Option<WeightedPoint> {
    let base = point(raw)?;
    let weight = match raw {
        Value::Array(items) => items.get(2).and_then(num),
        Value::Object(map) => map.get("weight").and_then(num),
        _ => None,
    }
    .unwrap_or(1.0);
    Some(WeightedPoint {
        lat: base.lat,
        lng: base.lng,
        weight,
    })
}

/// Maps each element of a raw path through [`point`], dropping invalid
/// entries. A path with fewer than two surviving points has no visual
/// meaning and normalizes to `None`.
pub fn path(raw: &Value) -> Option<MigrationPath> {
    let points: Vec<Point> = raw.as_array()?.iter().filter_map(point).collect();
    if points.len() < 2 {
        return None;
    }
    Some(MigrationPath(points))
}

/// Accepts `[lat, lng, code]` triples or objects carrying the code under
/// `prediction`, `pred`, or `score`. Unrecognized codes map to
/// [`Prediction::Unknown`] rather than dropping the point.
pub fn activity_point(raw: &Value) -> Option<ActivityPoint> {
    let base = point(raw)?;
    let code = match raw {
        Value::Array(items) => items.get(2),
        Value::Object(map) => map
            .get("prediction")
            .or_else(|| map.get("pred"))
            .or_else(|| map.get("score")),
        _ => None,
    };
    let prediction = code
        .and_then(num)
        .map(Prediction::from_code)
        .unwrap_or(Prediction::Unknown);
    Some(ActivityPoint {
        lat: base.lat,
        lng: base.lng,
        prediction,
    })
}

/// Accepts a two-corner `[[lat,lng],[lat,lng]]` bounds array; both
/// corners must normalize.
pub fn bounds(raw: &Value) -> Option<(Point, Point)> {
    let corners = raw.as_array()?;
    if corners.len() != 2 {
        return None;
    }
    Some((point(&corners[0])?, point(&corners[1])?))
}

/// Normalizes a backend origin frame. The center may live under a
/// `center` key or the origin object may itself be the center; zoom and
/// bounds are read when usable. Every part is independent.
pub fn origin(raw: &Value) -> Origin {
    let center = match raw.get("center") {
        Some(value) if !value.is_null() => point(value),
        _ => point(raw),
    };
    let zoom = raw
        .get("zoom")
        .and_then(Value::as_u64)
        .and_then(|z| u8::try_from(z).ok());
    let frame_bounds = raw.get("bounds").and_then(bounds);
    Origin {
        center,
        zoom,
        bounds: frame_bounds,
    }
}

/// Parses free-form search text into a coordinate pair: the first two
/// numeric tokens, both finite and inside `[-90,90]x[-180,180]`.
pub fn parse_coord_text(input: &str) -> Option<(f64, f64)> {
    let mut numbers = input
        .split(|c: char| !(c.is_ascii_digit() || c == '.' || c == '-'))
        .filter(|token| !token.is_empty())
        .filter_map(|token| token.parse::<f64>().ok())
        .filter(|x| x.is_finite());
    let lat = numbers.next()?;
    let lng = numbers.next()?;
    if lat.abs() > 90.0 || lng.abs() > 180.0 {
        return None;
    }
    Some((lat, lng))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn point_accepts_pairs_and_objects() {
        assert_eq!(
            point(&json!([12.5, -70.3])),
            Some(Point { lat: 12.5, lng: -70.3 })
        );
        assert_eq!(
            point(&json!({"lat": 12.5, "lng": -70.3})),
            Some(Point { lat: 12.5, lng: -70.3 })
        );
        assert_eq!(
            point(&json!({"latitude": -3.2, "longitude": 149.5})),
            Some(Point { lat: -3.2, lng: 149.5 })
        );
    }

    #[test]
    fn point_tolerates_numeric_strings_and_extra_slots() {
        assert_eq!(
            point(&json!(["12.5", "-70.3"])),
            Some(Point { lat: 12.5, lng: -70.3 })
        );
        // A weighted triple still reads as a plain point.
        assert_eq!(
            point(&json!([12.5, -70.3, 0.8])),
            Some(Point { lat: 12.5, lng: -70.3 })
        );
    }

    #[test]
    fn point_rejects_unusable_shapes() {
        assert_eq!(point(&json!([12.5])), None);
        assert_eq!(point(&json!(["abc", 4.0])), None);
        assert_eq!(point(&json!({"lat": 12.5})), None);
        assert_eq!(point(&json!({"lat": null, "lng": 4.0})), None);
        assert_eq!(point(&json!("12.5,-70.3")), None);
        assert_eq!(point(&json!(null)), None);
    }

    #[test]
    fn weighted_point_defaults_missing_weight_to_one() {
        assert_eq!(
            weighted_point(&json!([12.5, -70.3])),
            Some(WeightedPoint { lat: 12.5, lng: -70.3, weight: 1.0 })
        );
        assert_eq!(
            weighted_point(&json!([12.5, -70.3, 0.25])),
            Some(WeightedPoint { lat: 12.5, lng: -70.3, weight: 0.25 })
        );
        assert_eq!(
            weighted_point(&json!({"lat": 1.0, "lng": 2.0, "weight": 0.5})),
            Some(WeightedPoint { lat: 1.0, lng: 2.0, weight: 0.5 })
        );
        // Unusable weight falls back to 1 instead of poisoning the point.
        assert_eq!(
            weighted_point(&json!([12.5, -70.3, "hot"])),
            Some(WeightedPoint { lat: 12.5, lng: -70.3, weight: 1.0 })
        );
    }

    #[test]
    fn path_filters_and_keeps_order() {
        let raw = json!([[1.0, 2.0], "bad", [3.0, 4.0], [null, 5.0], [5.0, 6.0]]);
        let path = path(&raw).unwrap();
        assert_eq!(
            path.0,
            vec![
                Point { lat: 1.0, lng: 2.0 },
                Point { lat: 3.0, lng: 4.0 },
                Point { lat: 5.0, lng: 6.0 },
            ]
        );
    }

    #[test]
    fn path_with_one_valid_point_is_discarded() {
        assert_eq!(path(&json!([[1.0, 2.0], "bad"])), None);
        assert_eq!(path(&json!([])), None);
        assert_eq!(path(&json!({"points": []})), None);
    }

    #[test]
    fn activity_point_reads_all_code_spellings() {
        let from_triple = activity_point(&json!([12.5, -70.5, 1])).unwrap();
        assert_eq!(from_triple.prediction, Prediction::Resting);

        let from_pred = activity_point(&json!({"lat": 1.0, "lng": 2.0, "pred": 0})).unwrap();
        assert_eq!(from_pred.prediction, Prediction::Migrating);

        let from_score = activity_point(&json!({"lat": 1.0, "lng": 2.0, "score": "2"})).unwrap();
        assert_eq!(from_score.prediction, Prediction::Eating);

        let unknown = activity_point(&json!([23.0, -74.0, 3])).unwrap();
        assert_eq!(unknown.prediction, Prediction::Unknown);

        let missing = activity_point(&json!([23.0, -74.0])).unwrap();
        assert_eq!(missing.prediction, Prediction::Unknown);
    }

    #[test]
    fn bounds_require_exactly_two_corners() {
        assert_eq!(
            bounds(&json!([[-85.0, -180.0], [85.0, 180.0]])),
            Some((
                Point { lat: -85.0, lng: -180.0 },
                Point { lat: 85.0, lng: 180.0 }
            ))
        );
        assert_eq!(bounds(&json!([[-85.0, -180.0]])), None);
        assert_eq!(bounds(&json!([[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]])), None);
        assert_eq!(bounds(&json!([[1.0, 2.0], "bad"])), None);
    }

    #[test]
    fn origin_reads_center_key_or_direct_coordinates() {
        let nested = origin(&json!({"center": [17.0, -75.0], "zoom": 5}));
        assert_eq!(nested.center, Some(Point { lat: 17.0, lng: -75.0 }));
        assert_eq!(nested.zoom, Some(5));
        assert_eq!(nested.bounds, None);

        let direct = origin(&json!({"lat": 17.0, "lng": -75.0}));
        assert_eq!(direct.center, Some(Point { lat: 17.0, lng: -75.0 }));
        assert_eq!(direct.zoom, None);
    }

    #[test]
    fn origin_ignores_unusable_parts() {
        let partial = origin(&json!({"center": "mid-ocean", "zoom": 5.5, "bounds": [[-85, -180], [85, 180]]}));
        assert_eq!(partial.center, None);
        assert_eq!(partial.zoom, None);
        assert!(partial.bounds.is_some());
    }

    #[test]
    fn coord_text_takes_first_two_numbers_in_range() {
        assert_eq!(parse_coord_text("17.2, -75.9"), Some((17.2, -75.9)));
        assert_eq!(parse_coord_text("lat 17 lng -75"), Some((17.0, -75.0)));
        assert_eq!(parse_coord_text("(21.3; -79.8)"), Some((21.3, -79.8)));
    }

    #[test]
    fn coord_text_rejects_out_of_range_and_garbage() {
        assert_eq!(parse_coord_text("91, 0"), None);
        assert_eq!(parse_coord_text("0, 181"), None);
        assert_eq!(parse_coord_text("-90.5, 10"), None);
        assert_eq!(parse_coord_text("somewhere warm"), None);
        assert_eq!(parse_coord_text("42"), None);
        assert_eq!(parse_coord_text(""), None);
    }
}
