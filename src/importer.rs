//! Best-effort CSV point import.
//!
//! User-supplied files have no fixed schema beyond locatable latitude
//! and longitude columns, so the header is matched against synonym sets
//! and everything else is positional. Rows that do not yield two finite
//! numbers are skipped without surfacing per-row errors; only the final
//! count is reported.

use csv::ReaderBuilder;

use crate::models::Point;

const LAT_COLUMNS: [&str; 3] = ["lat", "latitude", "y"];
const LNG_COLUMNS: [&str; 5] = ["lng", "lon", "long", "longitude", "x"];

/// Parses `contents` into at most `limit` points. Returns an empty list
/// when no latitude/longitude columns can be located; a partial import
/// never happens.
pub fn import(contents: &str, limit: usize) -> Vec<Point> {
    // Quoting is disabled: cells are split on commas positionally, the
    // way the upstream exports are written.
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .quoting(false)
        .from_reader(contents.as_bytes());

    let headers = match reader.headers() {
        Ok(headers) => headers.clone(),
        Err(err) => {
            log::warn!("CSV import: unreadable header: {err}");
            return Vec::new();
        }
    };
    let normalized: Vec<String> = headers
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_ascii_lowercase())
        .collect();
    let lat_idx = normalized
        .iter()
        .position(|h| LAT_COLUMNS.contains(&h.as_str()));
    let lng_idx = normalized
        .iter()
        .position(|h| LNG_COLUMNS.contains(&h.as_str()));
    let (Some(lat_idx), Some(lng_idx)) = (lat_idx, lng_idx) else {
        log::warn!("CSV import: no latitude/longitude columns in header");
        return Vec::new();
    };

    let mut points = Vec::new();
    for record in reader.records() {
        if points.len() >= limit {
            break;
        }
        let Ok(record) = record else { continue };
        // Rows shorter than the required column index are skipped.
        let (Some(lat_cell), Some(lng_cell)) = (record.get(lat_idx), record.get(lng_idx)) else {
            continue;
        };
        let (Ok(lat), Ok(lng)) = (
            lat_cell.trim().parse::<f64>(),
            lng_cell.trim().parse::<f64>(),
        ) else {
            continue;
        };
        if lat.is_finite() && lng.is_finite() {
            points.push(Point { lat, lng });
        }
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn imports_lat_lng_columns() {
        let csv = "name,lat,lng\na,12.5,-70.3\nb,13.0,-71.0\n";
        let points = import(csv, 10_000);
        assert_eq!(
            points,
            vec![
                Point { lat: 12.5, lng: -70.3 },
                Point { lat: 13.0, lng: -71.0 },
            ]
        );
    }

    #[test]
    fn header_matching_is_case_insensitive_and_bom_tolerant() {
        let csv = "\u{feff}LAT,Lng\n12.5,-70.3\n";
        assert_eq!(import(csv, 10_000).len(), 1);

        let csv = "Y,X\n12.5,-70.3\n";
        assert_eq!(import(csv, 10_000), vec![Point { lat: 12.5, lng: -70.3 }]);

        let csv = "Latitude, Longitude\n12.5,-70.3\n";
        assert_eq!(import(csv, 10_000).len(), 1);
    }

    #[test]
    fn missing_coordinate_column_yields_nothing() {
        let csv = "lat,value\n12.5,3\n13.0,4\n";
        assert!(import(csv, 10_000).is_empty());

        let csv = "a,b\n1,2\n";
        assert!(import(csv, 10_000).is_empty());

        assert!(import("", 10_000).is_empty());
    }

    #[test]
    fn bad_rows_are_skipped_and_order_is_preserved() {
        let csv = "lat,lng\n1.0,2.0\nnot,numeric\n3.0\n5.0,6.0\n\n7.0,8.0\n";
        let points = import(csv, 10_000);
        assert_eq!(
            points,
            vec![
                Point { lat: 1.0, lng: 2.0 },
                Point { lat: 5.0, lng: 6.0 },
                Point { lat: 7.0, lng: 8.0 },
            ]
        );
    }

    #[test]
    fn import_stops_at_the_limit() {
        let mut csv = String::from("lat,lng\n");
        for i in 0..20 {
            csv.push_str(&format!("{}.0,1.0\n", i));
        }
        let points = import(&csv, 5);
        assert_eq!(points.len(), 5);
        assert_eq!(points[0].lat, 0.0);
        assert_eq!(points[4].lat, 4.0);
    }
}
