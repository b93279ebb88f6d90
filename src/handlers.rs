use crate::AppState;
use crate::frame::MapFrame;
use crate::gateway::Gateway;
use crate::importer;
use crate::metrics;
use crate::models::{
    ControlsRequest, ImportResponse, Layer, LayerRequest, SearchRequest,
};
use crate::normalize;
use crate::stream_counter::StreamCounter;
use actix_web::{HttpResponse, Responder, get, post, web};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;

/// Handler for the `/api/state` endpoint: a summary of the engine
/// without the (potentially large) dataset itself.
#[get("/api/state")]
pub async fn engine_state(state: web::Data<AppState>) -> impl Responder {
    let state = state.lock().await;
    web::Json(state.summary())
}

/// Handler for the `/api/dataset` endpoint.
///
/// The dataset is resolved on every call, so control changes and newly
/// applied fetches are always reflected.
#[get("/api/dataset")]
pub async fn active_dataset(state: web::Data<AppState>) -> impl Responder {
    let state = state.lock().await;
    web::Json(state.active_dataset())
}

/// Handler for the `/api/frame` endpoint.
#[get("/api/frame")]
pub async fn current_frame(state: web::Data<AppState>) -> impl Responder {
    let state = state.lock().await;
    web::Json(state.frame().resolve())
}

/// Handler for the `/api/hotspots` endpoint: the named hotspot centers
/// the demo heat field clusters around, for tooltip markers.
#[get("/api/hotspots")]
pub async fn hotspots() -> impl Responder {
    web::Json(crate::synthetic::HOTSPOTS)
}

/// Handler for the `/api/layer` endpoint.
///
/// Activates the requested layer, runs its entry fetch in the
/// background, and answers immediately with whatever the merge engine
/// resolves right now (possibly fallback data; the SSE stream delivers
/// the backend's answer when it lands).
#[post("/api/layer")]
pub async fn select_layer(
    data: web::Json<LayerRequest>,
    state: web::Data<AppState>,
    gateway: web::Data<Gateway>,
) -> impl Responder {
    let (generation, frame, dataset) = {
        let mut state = state.lock().await;
        let generation = state.select_layer(data.layer);
        state.publish();
        (generation, *state.frame(), state.active_dataset())
    };

    spawn_entry_fetch(
        data.layer,
        generation,
        frame,
        state.get_ref().clone(),
        gateway.get_ref().clone(),
    );

    HttpResponse::Ok().json(dataset)
}

/// Launches the fetch a layer requires on entry, if any. The result is
/// applied only when the captured generation is still current, so a
/// response that arrives after the user moved on is discarded.
pub fn spawn_entry_fetch(
    layer: Layer,
    generation: u64,
    frame: MapFrame,
    state: AppState,
    gateway: Gateway,
) {
    match layer {
        Layer::Sighting => {
            tokio::spawn(async move {
                if let Some(points) = gateway.fetch_sighting_data(frame.center, frame.zoom).await
                {
                    let mut state = state.lock().await;
                    if state.apply_backend_sightings(generation, points) {
                        state.publish();
                    }
                }
            });
        }
        Layer::PreyAvailable => {
            tokio::spawn(async move {
                let field = gateway.fetch_prey_field().await;
                let mut state = state.lock().await;
                if state.apply_prey_field(generation, field) {
                    state.publish();
                }
            });
        }
        Layer::Migration => {
            tokio::spawn(async move {
                if let Some(points) = gateway.fetch_shark_activity(frame.center, frame.zoom).await
                {
                    let mut state = state.lock().await;
                    if state.apply_activity(generation, points) {
                        state.publish();
                    }
                }
            });
        }
        // The remaining layers render from the snapshot or synthetic
        // data and need no entry fetch.
        Layer::Thermal | Layer::WaterQuality | Layer::Climate => {}
    }
}

/// Handler for the `/api/search` endpoint.
///
/// Parses free-form coordinate text and asks the backend for predicted
/// sightings there. Unparsable input is rejected outright; a failed or
/// empty prediction leaves the previous state in place.
#[post("/api/search")]
pub async fn search(
    data: web::Json<SearchRequest>,
    state: web::Data<AppState>,
    gateway: web::Data<Gateway>,
) -> impl Responder {
    let Some((lat, lng)) = normalize::parse_coord_text(&data.query) else {
        log::warn!("rejecting coordinate input {:?}", data.query);
        return HttpResponse::BadRequest()
            .body("Expected 'lat, lng' with |lat| <= 90 and |lng| <= 180.");
    };

    // The gateway call runs without holding the state lock; only the
    // application of its result takes it.
    match gateway.predict_sighting(lat, lng).await {
        Some(points) => {
            let mut state = state.lock().await;
            state.apply_search_prediction(points);
            state.publish();
            HttpResponse::Ok().json(state.active_dataset())
        }
        None => {
            // Best effort: the previous dataset keeps being displayed.
            let state = state.lock().await;
            HttpResponse::Ok().json(state.active_dataset())
        }
    }
}

/// Handler for the `/api/import` endpoint.
///
/// Accepts raw CSV text and replaces the imported point set. Rows that
/// do not parse are skipped silently; only the final count is returned.
#[post("/api/import")]
pub async fn import_points(body: String, state: web::Data<AppState>) -> impl Responder {
    let mut state = state.lock().await;
    let points = importer::import(&body, state.csv_limit());
    let imported = points.len();
    state.set_csv_points(points);
    state.publish();
    web::Json(ImportResponse { imported })
}

/// Handler for the `/api/controls` endpoint.
#[post("/api/controls")]
pub async fn update_controls(
    data: web::Json<ControlsRequest>,
    state: web::Data<AppState>,
) -> impl Responder {
    let mut state = state.lock().await;
    state.update_controls(&data);
    state.publish();
    web::Json(state.summary())
}

/// Handler for the `/api/stream` endpoint.
///
/// Server-sent events: the current dataset first, then one event per
/// recompute. Lagging subscribers lose intermediate events, never the
/// stream itself.
#[get("/api/stream")]
pub async fn stream(state: web::Data<AppState>) -> actix_web::Result<impl Responder> {
    let (initial, receiver, keep_alive, counter) = {
        let state = state.lock().await;
        (
            state.current_update(),
            state.updates.subscribe(),
            state.keep_alive(),
            state.stream_counter(),
        )
    };
    let guard = StreamCounter::new(counter);

    let events = async_stream::stream! {
        let _guard = guard;
        yield initial;
        let mut live = BroadcastStream::new(receiver);
        while let Some(item) = futures_util::StreamExt::next(&mut live).await {
            match item {
                Ok(update) => yield update,
                Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                    log::warn!("update stream lagged, {skipped} updates dropped");
                }
            }
        }
    };
    let events = futures_util::StreamExt::map(
        events,
        |update| -> anyhow::Result<actix_web_lab::sse::Event> {
            let json_data = serde_json::to_string(&update)?;
            Ok(actix_web_lab::sse::Event::Data(
                actix_web_lab::sse::Data::new(json_data),
            ))
        },
    );

    Ok(actix_web_lab::sse::Sse::from_stream(events).with_keep_alive(keep_alive))
}

/// Handler for the `/metrics` endpoint.
#[get("/metrics")]
pub async fn metrics_endpoint(state: web::Data<AppState>) -> impl Responder {
    let state = state.lock().await;
    HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4; charset=utf-8")
        .body(metrics::render(&state))
}
