//! HTTP client for the prediction backend.
//!
//! Every endpoint is tolerant of several reasonable response shapes, and
//! every failure path ends in a warning plus either "apply nothing" or a
//! documented fallback. Nothing here ever reaches the rendering path as
//! an error: the dashboard always has something plausible to show.

use serde_json::{Value, json};

use crate::frame::Origin;
use crate::models::{ActivityPoint, MigrationPath, Point, WeightedPoint};
use crate::normalize;

#[derive(Clone)]
pub struct Gateway {
    base_url: String,
    client: reqwest::Client,
}

/// Everything a `/get` snapshot may carry. An absent field means "leave
/// the current dataset alone", never "reset to empty".
#[derive(Debug, Default)]
pub struct Snapshot {
    pub origin: Option<Origin>,
    pub sightings: Option<Vec<Point>>,
    pub thermal: Option<Vec<WeightedPoint>>,
    pub prey: Option<Vec<Point>>,
    pub water_quality: Option<Vec<Point>>,
    pub migration: Option<Vec<MigrationPath>>,
    pub climate: Option<Vec<WeightedPoint>>,
}

/// Body of a sighting prediction call: explicit coordinates from the
/// search box, or the current frame when a layer entry triggers it.
#[derive(Debug, Clone, Copy)]
pub enum SightingRequest {
    Coords { lat: f64, lng: f64 },
    Frame { center: Point, zoom: u8 },
}

impl SightingRequest {
    fn body(&self) -> Value {
        match self {
            SightingRequest::Coords { lat, lng } => json!({ "lat": lat, "lng": lng }),
            SightingRequest::Frame { center, zoom } => {
                json!({ "center": [center.lat, center.lng], "zoom": zoom })
            }
        }
    }
}

impl Gateway {
    pub fn new(base_url: &str) -> Self {
        Gateway {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    async fn get_json(&self, path: &str) -> anyhow::Result<Value> {
        let response = self
            .client
            .get(format!("{}{path}", self.base_url))
            .send()
            .await?;
        if !response.status().is_success() {
            anyhow::bail!("HTTP {}", response.status());
        }
        Ok(response.json().await?)
    }

    async fn post_json(&self, path: &str, body: &Value) -> anyhow::Result<Value> {
        let response = self
            .client
            .post(format!("{}{path}", self.base_url))
            .json(body)
            .send()
            .await?;
        if !response.status().is_success() {
            anyhow::bail!("HTTP {}", response.status());
        }
        Ok(response.json().await?)
    }

    /// GET /get. `None` means the call failed entirely; a snapshot with
    /// all fields absent is still a valid (empty) answer.
    pub async fn fetch_snapshot(&self) -> Option<Snapshot> {
        match self.get_json("/get").await {
            Ok(data) => Some(parse_snapshot(&data)),
            Err(err) => {
                log::warn!("snapshot request failed: {err}");
                None
            }
        }
    }

    /// POST /predictionSighting with explicit coordinates. An empty or
    /// unusable result is `None`: the search leaves state untouched.
    pub async fn predict_sighting(&self, lat: f64, lng: f64) -> Option<Vec<Point>> {
        let points = self
            .call_prediction(&SightingRequest::Coords { lat, lng })
            .await?;
        if points.is_empty() {
            log::warn!("sighting prediction returned no points");
            return None;
        }
        Some(points)
    }

    /// POST /predictionSighting with the current frame; used when the
    /// sighting layer becomes active. Unlike a search, a recognized but
    /// empty answer is applied (the layer then falls back to demo data).
    pub async fn fetch_sighting_data(&self, center: Point, zoom: u8) -> Option<Vec<Point>> {
        self.call_prediction(&SightingRequest::Frame { center, zoom })
            .await
    }

    async fn call_prediction(&self, request: &SightingRequest) -> Option<Vec<Point>> {
        match self.post_json("/predictionSighting", &request.body()).await {
            Ok(data) => {
                let parsed = parse_point_response(&data);
                if parsed.is_none() {
                    log::warn!("unexpected /predictionSighting response shape");
                }
                parsed
            }
            Err(err) => {
                log::warn!("/predictionSighting request failed: {err}");
                None
            }
        }
    }

    /// POST /getMigration with the fixed thermal payload. Infallible:
    /// when the backend cannot produce a field, the request payload's
    /// own points are the displayed result.
    pub async fn fetch_prey_field(&self) -> Vec<WeightedPoint> {
        let payload = prey_field_payload();
        match self.post_json("/getMigration", &payload).await {
            Ok(data) => parse_prey_response(&data).unwrap_or_else(|| {
                log::warn!("unexpected /getMigration response shape, using request payload");
                prey_payload_points()
            }),
            Err(err) => {
                log::warn!("/getMigration request failed: {err}, using request payload");
                prey_payload_points()
            }
        }
    }

    /// POST /sharkActivity. `None` on failure; the migration layer then
    /// shows a fixed illustrative example instead of nothing.
    pub async fn fetch_shark_activity(
        &self,
        center: Point,
        zoom: u8,
    ) -> Option<Vec<ActivityPoint>> {
        let body = json!({ "center": [center.lat, center.lng], "zoom": zoom });
        match self.post_json("/sharkActivity", &body).await {
            Ok(data) => {
                let parsed = parse_activity_response(&data);
                if parsed.is_none() {
                    log::warn!("unexpected /sharkActivity response shape");
                }
                parsed
            }
            Err(err) => {
                log::warn!("/sharkActivity request failed: {err}");
                None
            }
        }
    }
}

/// The literal prey-field request. Kept as data rather than code: its
/// points double as the fallback response.
fn prey_field_payload() -> Value {
    json!({
        "thermal": {
            "points": [
                [21.32651791419603, -79.89247976683664, 0.9996861219406128],
                [24.588686718170898, -95.40663951868758, 0.09564905613660812],
                [29.80044148343347, -120.82571824050683, 0.9999206066131592],
                [-36.68539032259705, -10.62875719806923, 0.9987298846244812],
                [14.703906527535146, 118.83185658212564, 0.9850975275039673],
                [-9.860844269556736, -100.37712015338664, 0.9989984631538391],
                [3.656780647806253, 80.90092794665533, 0.9999538660049438],
                [-3.8921331047068684, 149.498251666582, 0.9995149374008179],
                [17.90511683842291, -61.632163673580244, 0.9989810585975647]
            ],
            "options": { "radius": 27, "blur": 19, "maxZoom": 12, "max": 1 }
        }
    })
}

/// The payload's own points, normalized; the fallback dataset for the
/// prey layer.
pub fn prey_payload_points() -> Vec<WeightedPoint> {
    prey_field_payload()["thermal"]["points"]
        .as_array()
        .map(|items| items.iter().filter_map(normalize::weighted_point).collect())
        .unwrap_or_default()
}

fn point_list(value: &Value) -> Option<Vec<Point>> {
    value
        .as_array()
        .map(|items| items.iter().filter_map(normalize::point).collect())
}

fn weighted_list(value: &Value) -> Option<Vec<WeightedPoint>> {
    value
        .as_array()
        .map(|items| items.iter().filter_map(normalize::weighted_point).collect())
}

/// Sighting-style responses: a bare array of pairs/objects, a wrapper
/// under `sightings` or `points`, or a single coordinate object.
pub(crate) fn parse_point_response(data: &Value) -> Option<Vec<Point>> {
    if let Some(points) = point_list(data) {
        return Some(points);
    }
    for key in ["sightings", "points"] {
        if let Some(points) = data.get(key).and_then(point_list) {
            return Some(points);
        }
    }
    normalize::point(data).map(|p| vec![p])
}

/// Prey-field responses: a bare array of weighted triples or
/// `{thermal: {points: [..]}}`.
pub(crate) fn parse_prey_response(data: &Value) -> Option<Vec<WeightedPoint>> {
    if let Some(points) = weighted_list(data) {
        return Some(points);
    }
    data.get("thermal")
        .and_then(|t| t.get("points"))
        .and_then(weighted_list)
}

/// Activity responses: a bare array or a wrapper under `points` or
/// `activity`.
pub(crate) fn parse_activity_response(data: &Value) -> Option<Vec<ActivityPoint>> {
    let items = data
        .as_array()
        .or_else(|| data.get("points").and_then(Value::as_array))
        .or_else(|| data.get("activity").and_then(Value::as_array))?;
    Some(items.iter().filter_map(normalize::activity_point).collect())
}

pub(crate) fn parse_snapshot(data: &Value) -> Snapshot {
    Snapshot {
        origin: data.get("origin").map(normalize::origin),
        sightings: data.get("sightings").and_then(point_list),
        thermal: data
            .get("thermal")
            .and_then(|t| t.get("points"))
            .and_then(weighted_list),
        prey: data.get("prey").and_then(point_list),
        water_quality: data.get("waterQuality").and_then(point_list),
        migration: data
            .get("migration")
            .and_then(Value::as_array)
            .map(|paths| paths.iter().filter_map(normalize::path).collect()),
        climate: data
            .get("climate")
            .and_then(|c| c.get("points"))
            .and_then(weighted_list),
    }
}
