use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

use crate::frame::FrameAction;

/// A geographic coordinate accepted into a canonical collection.
///
/// Both components are finite by construction: the normalization chain
/// drops anything that does not parse to a finite number, so a `Point`
/// is never stored partial or NaN.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub lat: f64,
    pub lng: f64,
}

/// A coordinate with an intensity scalar used by heat-style layers.
/// Weight defaults to 1 when the upstream omits it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightedPoint {
    pub lat: f64,
    pub lng: f64,
    pub weight: f64,
}

/// An ordered migration track. Always holds at least two valid points;
/// shorter "paths" are discarded during normalization.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct MigrationPath(pub Vec<Point>);

/// Behaviour code attached to a shark-activity point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prediction {
    Migrating,
    Resting,
    Eating,
    Unknown,
}

impl Prediction {
    /// Wire codes: 0 = migrating, 1 = resting, 2 = eating. Anything
    /// else, including missing codes, is unknown.
    pub fn from_code(code: f64) -> Self {
        if code == 0.0 {
            Prediction::Migrating
        } else if code == 1.0 {
            Prediction::Resting
        } else if code == 2.0 {
            Prediction::Eating
        } else {
            Prediction::Unknown
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Prediction::Migrating => "Migrating",
            Prediction::Resting => "Resting",
            Prediction::Eating => "Eating",
            Prediction::Unknown => "Unknown",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            Prediction::Migrating => "#f59e0b",
            Prediction::Resting => "#3b82f6",
            Prediction::Eating => "#ef4444",
            Prediction::Unknown => "#6b7280",
        }
    }
}

/// A sighting point carrying a behaviour prediction. Serialized with the
/// display label and color resolved, so the presentation surface never
/// needs to know the numeric codes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActivityPoint {
    pub lat: f64,
    pub lng: f64,
    pub prediction: Prediction,
}

impl Serialize for ActivityPoint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ActivityPoint", 4)?;
        state.serialize_field("lat", &self.lat)?;
        state.serialize_field("lng", &self.lng)?;
        state.serialize_field("prediction", self.prediction.label())?;
        state.serialize_field("color", self.prediction.color())?;
        state.end()
    }
}

/// The six mutually exclusive map overlays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Layer {
    Sighting,
    Thermal,
    PreyAvailable,
    WaterQuality,
    Migration,
    Climate,
}

// Dot and line colors shared between layers and the legend.
pub const SIGHTING_DOT_COLOR: &str = "#ef4444";
pub const PREY_DOT_COLOR: &str = "#22c55e";
pub const WATER_DOT_COLOR: &str = "#3b82f6";
pub const MIGRATION_LINE_COLOR: &str = "#10b981";

/// Rendering hints for dot layers.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct DotStyle {
    pub radius: u32,
    pub color: &'static str,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct LineStyle {
    pub weight: u32,
    pub color: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GradientStop {
    pub at: f64,
    pub color: &'static str,
}

/// Heat-layer rendering options, mirrored from the upstream contract.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatOptions {
    pub radius: u32,
    pub blur: u32,
    pub max_zoom: u32,
    pub max: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gradient: Option<Vec<GradientStop>>,
}

impl HeatOptions {
    pub fn thermal(radius: u32) -> Self {
        HeatOptions {
            radius,
            blur: (radius as f64 * 0.8).round() as u32,
            max_zoom: 9,
            max: 1.0,
            gradient: None,
        }
    }

    /// Fixed options carried by the prey-field request payload.
    pub fn prey() -> Self {
        HeatOptions {
            radius: 27,
            blur: 19,
            max_zoom: 12,
            max: 1.0,
            gradient: None,
        }
    }

    /// The climate heatmap reuses the thermal radius slider but floors
    /// the derived values and renders through a fixed gradient.
    pub fn climate(radius: u32) -> Self {
        HeatOptions {
            radius: ((radius as f64 * 0.8).round() as u32).max(15),
            blur: ((radius as f64 * 0.7).round() as u32).max(12),
            max_zoom: 9,
            max: 1.0,
            gradient: Some(vec![
                GradientStop { at: 0.0, color: "#0b306e" },
                GradientStop { at: 0.4, color: "#2a9df4" },
                GradientStop { at: 0.7, color: "#f7b500" },
                GradientStop { at: 1.0, color: "#d00000" },
            ]),
        }
    }
}

/// The dataset currently backing the map, fully resolved: precedence
/// applied, weights rescaled, fallbacks substituted.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum LayerDataset {
    Points {
        points: Vec<Point>,
        style: DotStyle,
    },
    Heat {
        points: Vec<WeightedPoint>,
        options: HeatOptions,
    },
    Migration {
        paths: Vec<MigrationPath>,
        activity: Vec<ActivityPoint>,
        line: LineStyle,
        dot_radius: u32,
    },
}

// ========================
// API Request and Response Models
// ========================

/// Request body for the /api/layer endpoint.
#[derive(Debug, Deserialize)]
pub struct LayerRequest {
    pub layer: Layer,
}

/// Request body for the /api/search endpoint. Free-form text; the first
/// two numeric tokens are taken as latitude and longitude.
#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: String,
}

/// Partial update of the display controls; absent fields are untouched.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlsRequest {
    pub intensity: Option<f64>,
    pub heat_radius: Option<u32>,
    pub dot_size: Option<u32>,
    pub show_imported: Option<bool>,
}

/// Response body for the /api/import endpoint.
#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub imported: usize,
}

/// Response body for the /api/state endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StateSummary {
    pub layer: Layer,
    pub frame: FrameAction,
    pub intensity: f64,
    pub heat_radius: u32,
    pub dot_size: u32,
    pub show_imported: bool,
    pub csv_points: usize,
    pub predicted_points: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot_at: Option<chrono::DateTime<chrono::Utc>>,
}
