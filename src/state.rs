//! The engine's single source of truth.
//!
//! All shared state lives here, behind one `Arc<Mutex<_>>` owner, and is
//! mutated only through the setters below. Datasets are resolved on
//! every read, so intensity changes and newly applied fetches are never
//! served stale. A fetch generation counter guards fire-and-forget
//! tasks: a result whose generation was superseded is discarded on
//! arrival instead of clobbering newer state.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use serde::Serialize;
use tokio::sync::broadcast;

use crate::frame::{FrameAction, MapFrame, WORLD_BOUNDS};
use crate::gateway::Snapshot;
use crate::models::{
    ActivityPoint, ControlsRequest, DotStyle, HeatOptions, Layer, LayerDataset, LineStyle,
    MigrationPath, Point, Prediction, StateSummary, WeightedPoint, MIGRATION_LINE_COLOR,
    PREY_DOT_COLOR, SIGHTING_DOT_COLOR, WATER_DOT_COLOR,
};
use crate::region::Region;
use crate::synthetic;

/// Point sets received from the prediction backend. `None` means "never
/// answered"; an empty list means the backend answered with nothing
/// usable, which still loses to nothing at merge time.
#[derive(Debug, Default)]
pub struct BackendData {
    pub sightings: Option<Vec<Point>>,
    pub thermal: Option<Vec<WeightedPoint>>,
    pub prey: Option<Vec<Point>>,
    pub prey_field: Option<Vec<WeightedPoint>>,
    pub water_quality: Option<Vec<Point>>,
    pub migration: Option<Vec<MigrationPath>>,
    pub activity: Option<Vec<ActivityPoint>>,
    pub climate: Option<Vec<WeightedPoint>>,
}

/// User-facing display controls.
#[derive(Debug, Clone, Copy)]
pub struct Controls {
    pub intensity: f64,
    pub heat_radius: u32,
    pub dot_size: u32,
    pub show_imported: bool,
}

impl Default for Controls {
    fn default() -> Self {
        Controls {
            intensity: 0.9,
            heat_radius: 25,
            dot_size: 4,
            show_imported: false,
        }
    }
}

pub struct State {
    active: Layer,
    controls: Controls,
    frame: MapFrame,
    backend: BackendData,
    csv_points: Vec<Point>,
    predicted: Option<Vec<Point>>,
    fallback_heat: Vec<WeightedPoint>,
    fallback_scatter: Vec<Point>,
    fetch_generation: u64,
    csv_limit: usize,
    keep_alive: std::time::Duration,
    snapshot_at: Option<chrono::DateTime<chrono::Utc>>,
    started_at: Instant,
    sse_streams: Arc<AtomicU64>,

    pub updates: Updates,
}

impl State {
    pub fn new(
        updates: Updates,
        demo_region: &Region,
        heat_count: usize,
        scatter_count: usize,
        csv_limit: usize,
        keep_alive: std::time::Duration,
    ) -> Self {
        let mut frame = MapFrame::default();
        // The sighting layer starts active, and it always frames the
        // whole world.
        frame.bounds = Some(WORLD_BOUNDS);
        State {
            active: Layer::Sighting,
            controls: Controls::default(),
            frame,
            backend: BackendData::default(),
            csv_points: Vec::new(),
            predicted: None,
            fallback_heat: synthetic::heat_field(heat_count, demo_region),
            fallback_scatter: synthetic::scatter(scatter_count, demo_region),
            fetch_generation: 0,
            csv_limit,
            keep_alive,
            snapshot_at: None,
            started_at: Instant::now(),
            sse_streams: Arc::new(AtomicU64::new(0)),
            updates,
        }
    }

    pub fn active_layer(&self) -> Layer {
        self.active
    }

    pub fn frame(&self) -> &MapFrame {
        &self.frame
    }

    pub fn generation(&self) -> u64 {
        self.fetch_generation
    }

    pub fn csv_limit(&self) -> usize {
        self.csv_limit
    }

    pub fn keep_alive(&self) -> std::time::Duration {
        self.keep_alive
    }

    pub fn uptime(&self) -> std::time::Duration {
        self.started_at.elapsed()
    }

    pub fn stream_counter(&self) -> Arc<AtomicU64> {
        self.sse_streams.clone()
    }

    pub fn open_streams(&self) -> u64 {
        self.sse_streams.load(Ordering::SeqCst)
    }

    fn next_generation(&mut self) -> u64 {
        self.fetch_generation += 1;
        self.fetch_generation
    }

    /// Activates a layer and returns the generation an entry fetch for
    /// it should carry. Selecting the sighting layer always resets the
    /// view to the world frame.
    pub fn select_layer(&mut self, layer: Layer) -> u64 {
        self.active = layer;
        if layer == Layer::Sighting {
            self.frame.bounds = Some(WORLD_BOUNDS);
        }
        self.next_generation()
    }

    /// Marks the frame as changed (origin applied) and hands out a fresh
    /// generation for any frame-sensitive refetch.
    pub fn frame_changed(&mut self) -> u64 {
        self.next_generation()
    }

    /// A successful coordinate search takes over the sighting layer:
    /// predicted points override everything, the imported-points toggle
    /// is forced off, and the view reframes to the whole world.
    pub fn apply_search_prediction(&mut self, points: Vec<Point>) {
        self.predicted = Some(points);
        self.active = Layer::Sighting;
        self.controls.show_imported = false;
        self.frame.bounds = Some(WORLD_BOUNDS);
        self.next_generation();
    }

    /// Merges a snapshot: only the fields the backend actually sent are
    /// applied. Returns true when the frame moved, so the caller can
    /// refetch frame-sensitive layers.
    pub fn apply_snapshot(&mut self, snapshot: Snapshot) -> bool {
        let mut frame_moved = false;
        if let Some(origin) = snapshot.origin {
            frame_moved = self.frame.apply_origin(&origin);
        }
        if let Some(sightings) = snapshot.sightings {
            self.backend.sightings = Some(sightings);
        }
        if let Some(thermal) = snapshot.thermal {
            self.backend.thermal = Some(thermal);
        }
        if let Some(prey) = snapshot.prey {
            self.backend.prey = Some(prey);
        }
        if let Some(water) = snapshot.water_quality {
            self.backend.water_quality = Some(water);
        }
        if let Some(migration) = snapshot.migration {
            self.backend.migration = Some(migration);
        }
        if let Some(climate) = snapshot.climate {
            self.backend.climate = Some(climate);
        }
        self.snapshot_at = Some(chrono::Utc::now());
        frame_moved
    }

    fn is_current(&self, generation: u64, what: &str) -> bool {
        if generation != self.fetch_generation {
            log::debug!("discarding stale {what} result (superseded)");
            return false;
        }
        true
    }

    pub fn apply_backend_sightings(&mut self, generation: u64, points: Vec<Point>) -> bool {
        if !self.is_current(generation, "sighting fetch") {
            return false;
        }
        self.backend.sightings = Some(points);
        true
    }

    pub fn apply_prey_field(&mut self, generation: u64, field: Vec<WeightedPoint>) -> bool {
        if !self.is_current(generation, "prey field fetch") {
            return false;
        }
        self.backend.prey_field = Some(field);
        true
    }

    pub fn apply_activity(&mut self, generation: u64, points: Vec<ActivityPoint>) -> bool {
        if !self.is_current(generation, "shark activity fetch") {
            return false;
        }
        self.backend.activity = Some(points);
        true
    }

    pub fn set_csv_points(&mut self, points: Vec<Point>) {
        self.csv_points = points;
    }

    pub fn update_controls(&mut self, request: &ControlsRequest) {
        if let Some(intensity) = request.intensity {
            if intensity.is_finite() {
                self.controls.intensity = intensity;
            }
        }
        if let Some(radius) = request.heat_radius {
            self.controls.heat_radius = radius;
        }
        if let Some(size) = request.dot_size {
            self.controls.dot_size = size;
        }
        if let Some(show) = request.show_imported {
            self.controls.show_imported = show;
        }
    }

    pub fn summary(&self) -> StateSummary {
        StateSummary {
            layer: self.active,
            frame: self.frame.resolve(),
            intensity: self.controls.intensity,
            heat_radius: self.controls.heat_radius,
            dot_size: self.controls.dot_size,
            show_imported: self.controls.show_imported,
            csv_points: self.csv_points.len(),
            predicted_points: self.predicted.as_ref().map(Vec::len).unwrap_or(0),
            snapshot_at: self.snapshot_at,
        }
    }

    /// Per-source point counts, for the metrics endpoint.
    pub fn source_counts(&self) -> Vec<(&'static str, usize)> {
        let len = |points: &Option<Vec<Point>>| points.as_ref().map(Vec::len).unwrap_or(0);
        vec![
            ("sightings", len(&self.backend.sightings)),
            (
                "thermal",
                self.backend.thermal.as_ref().map(Vec::len).unwrap_or(0),
            ),
            ("prey", len(&self.backend.prey)),
            (
                "prey_field",
                self.backend.prey_field.as_ref().map(Vec::len).unwrap_or(0),
            ),
            ("water_quality", len(&self.backend.water_quality)),
            (
                "migration",
                self.backend.migration.as_ref().map(Vec::len).unwrap_or(0),
            ),
            (
                "activity",
                self.backend.activity.as_ref().map(Vec::len).unwrap_or(0),
            ),
            (
                "climate",
                self.backend.climate.as_ref().map(Vec::len).unwrap_or(0),
            ),
            ("csv", self.csv_points.len()),
            (
                "predicted",
                self.predicted.as_ref().map(Vec::len).unwrap_or(0),
            ),
        ]
    }

    /// Rescales heat weights by the intensity control, clamped back into
    /// `[0, 1]`. Derived on every read so it can never go stale.
    fn scaled(&self, base: &[WeightedPoint]) -> Vec<WeightedPoint> {
        base.iter()
            .map(|p| WeightedPoint {
                lat: p.lat,
                lng: p.lng,
                weight: (p.weight * self.controls.intensity).clamp(0.0, 1.0),
            })
            .collect()
    }

    /// Sighting precedence: search prediction, then imported CSV points
    /// (while the toggle is on), then backend data, then demo scatter.
    fn sighting_points(&self) -> Vec<Point> {
        if let Some(predicted) = &self.predicted {
            if !predicted.is_empty() {
                return predicted.clone();
            }
        }
        if self.controls.show_imported && !self.csv_points.is_empty() {
            return self.csv_points.clone();
        }
        if let Some(sightings) = &self.backend.sightings {
            if !sightings.is_empty() {
                return sightings.clone();
            }
        }
        self.fallback_scatter.clone()
    }

    fn thermal_base(&self) -> &[WeightedPoint] {
        match &self.backend.thermal {
            Some(thermal) if !thermal.is_empty() => thermal,
            _ => &self.fallback_heat,
        }
    }

    /// Climate rides on the thermal base when the backend has not sent a
    /// climate field of its own.
    fn climate_base(&self) -> &[WeightedPoint] {
        match &self.backend.climate {
            Some(climate) if !climate.is_empty() => climate,
            _ => self.thermal_base(),
        }
    }

    /// Resolves the dataset for the active layer: precedence applied,
    /// weights rescaled, fallbacks substituted.
    pub fn active_dataset(&self) -> LayerDataset {
        match self.active {
            Layer::Sighting => LayerDataset::Points {
                points: self.sighting_points(),
                style: DotStyle {
                    radius: self.controls.dot_size,
                    color: SIGHTING_DOT_COLOR,
                },
            },
            Layer::Thermal => LayerDataset::Heat {
                points: self.scaled(self.thermal_base()),
                options: HeatOptions::thermal(self.controls.heat_radius),
            },
            Layer::PreyAvailable => match &self.backend.prey_field {
                Some(field) if !field.is_empty() => LayerDataset::Heat {
                    points: self.scaled(field),
                    options: HeatOptions::prey(),
                },
                _ => LayerDataset::Points {
                    points: match &self.backend.prey {
                        Some(prey) if !prey.is_empty() => prey.clone(),
                        _ => self.fallback_scatter.clone(),
                    },
                    style: DotStyle {
                        radius: 5,
                        color: PREY_DOT_COLOR,
                    },
                },
            },
            Layer::WaterQuality => LayerDataset::Points {
                points: match &self.backend.water_quality {
                    Some(water) if !water.is_empty() => water.clone(),
                    _ => self.fallback_scatter.clone(),
                },
                style: DotStyle {
                    radius: 5,
                    color: WATER_DOT_COLOR,
                },
            },
            Layer::Migration => LayerDataset::Migration {
                paths: match &self.backend.migration {
                    Some(paths) if !paths.is_empty() => paths.clone(),
                    _ => demo_migration_paths(),
                },
                activity: match &self.backend.activity {
                    Some(activity) => activity.clone(),
                    None => activity_example(),
                },
                line: LineStyle {
                    weight: 3,
                    color: MIGRATION_LINE_COLOR,
                },
                dot_radius: self.controls.dot_size.saturating_add(2).max(5),
            },
            Layer::Climate => LayerDataset::Heat {
                points: self.scaled(self.climate_base()),
                options: HeatOptions::climate(self.controls.heat_radius),
            },
        }
    }

    pub fn current_update(&self) -> LayerUpdate {
        LayerUpdate {
            layer: self.active,
            dataset: self.active_dataset(),
            frame: self.frame.resolve(),
        }
    }

    /// Broadcasts the freshly resolved dataset to every live stream.
    pub fn publish(&self) {
        self.updates.send(self.current_update());
    }
}

/// Two illustrative tracks shown while the backend has no migration
/// paths for the current frame.
fn demo_migration_paths() -> Vec<MigrationPath> {
    vec![
        MigrationPath(vec![
            Point { lat: 12.5, lng: -70.5 },
            Point { lat: 15.2, lng: -71.0 },
            Point { lat: 18.0, lng: -72.0 },
            Point { lat: 20.5, lng: -73.5 },
            Point { lat: 23.0, lng: -74.0 },
        ]),
        MigrationPath(vec![
            Point { lat: 10.8, lng: -81.0 },
            Point { lat: 14.0, lng: -80.0 },
            Point { lat: 17.3, lng: -79.2 },
            Point { lat: 20.1, lng: -78.0 },
            Point { lat: 23.2, lng: -77.4 },
        ]),
    ]
}

/// Three-point example shown until the backend answers an activity
/// fetch. The third code is out of range and renders as Unknown.
fn activity_example() -> Vec<ActivityPoint> {
    vec![
        ActivityPoint {
            lat: 12.5,
            lng: -70.5,
            prediction: Prediction::from_code(1.0),
        },
        ActivityPoint {
            lat: 18.0,
            lng: -72.0,
            prediction: Prediction::from_code(2.0),
        },
        ActivityPoint {
            lat: 23.0,
            lng: -74.0,
            prediction: Prediction::from_code(3.0),
        },
    ]
}

/// One recompute of the active dataset, as sent to SSE subscribers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerUpdate {
    pub layer: Layer,
    pub dataset: LayerDataset,
    pub frame: FrameAction,
}

pub struct Updates {
    updates_tx: broadcast::Sender<LayerUpdate>,
}

impl Updates {
    pub fn new() -> Self {
        let (updates_tx, _updates_rx) = broadcast::channel(10);
        Updates { updates_tx }
    }

    fn send(&self, update: LayerUpdate) {
        match self.updates_tx.send(update) {
            Ok(_) => (),
            Err(_) => (), // this is fine.. it happens when there are no subscribers.
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LayerUpdate> {
        self.updates_tx.subscribe()
    }
}
