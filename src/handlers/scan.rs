use axum::{
    extract::{Query, State},
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::wrappers::{errors::BroadcastStreamRecvError, BroadcastStream};
use tokio_stream::StreamExt;
use validator::Validate;

use crate::errors::AppError;
use crate::models::scan::{ScanQuery, ScanSnapshot};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/scan",
    params(ScanQuery),
    responses(
        (status = 200, description = "Latest scan cycle for all selected instruments", body = ScanSnapshot),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse)
    )
)]
pub async fn get_scan_status(
    State(state): State<AppState>,
    Query(query): Query<ScanQuery>,
) -> Result<Json<ScanSnapshot>, AppError> {
    query
        .validate()
        .map_err(|err| AppError::Validation(err.to_string()))?;

    let snapshot = state.scan_state.snapshot.read().await.clone();
    Ok(Json(snapshot.filtered(&query)))
}

#[utoipa::path(
    get,
    path = "/scan/stream",
    responses(
        (status = 200, description = "SSE stream of scan cycle snapshots", content_type = "text/event-stream")
    )
)]
pub async fn get_scan_stream(
    State(state): State<AppState>,
) -> Result<Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>>, AppError> {
    let initial_snapshot = state.scan_state.snapshot.read().await.clone();
    let initial_stream = tokio_stream::iter(vec![Ok(snapshot_event(&initial_snapshot)?)]);

    let rx = state.scan_state.broadcaster.subscribe();
    let broadcast_stream = BroadcastStream::new(rx).filter_map(|message| match message {
        Ok(snapshot) => snapshot_event(&snapshot).ok().map(Ok),
        Err(BroadcastStreamRecvError::Lagged(skipped)) => {
            tracing::debug!("scan stream lagged, skipped {} snapshots", skipped);
            None
        }
    });

    let stream = initial_stream.chain(broadcast_stream);

    Ok(Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15))))
}

fn snapshot_event(snapshot: &ScanSnapshot) -> Result<Event, AppError> {
    let data =
        serde_json::to_string(snapshot).map_err(|err| AppError::Internal(err.to_string()))?;
    Ok(Event::default()
        .event("snapshot")
        .id(snapshot.cycle.to_string())
        .data(data))
}
