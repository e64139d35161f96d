//! Run handlers.

use crate::api::AppState;
use crate::types::{Event, RunId};
use axum::{
    Json,
    body::Body,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use std::convert::Infallible;
use tokio::sync::broadcast;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::{BroadcastStream, errors::BroadcastStreamRecvError};

/// GET /files - Run the pipeline and stream its progress as plain text
///
/// The status line is sent before the run starts, so a failed run shows up
/// as a final `Run failed: ...` line rather than an error status. Use
/// `POST /runs` for a structured result.
#[utoipa::path(
    get,
    path = "/files",
    tag = "runs",
    responses(
        (status = 200, description = "Progress lines, one per event, streamed while the run executes", content_type = "text/plain")
    )
)]
pub async fn run_files(State(state): State<AppState>) -> impl IntoResponse {
    let run_id = RunId::new();

    // Subscribe before the run starts so no event is missed
    let receiver = state.pipeline.subscribe();

    let pipeline = state.pipeline.clone();
    tokio::spawn(async move {
        if let Err(e) = pipeline.run(run_id).await {
            tracing::warn!(run_id = %run_id, error = %e, "streamed run failed");
        }
    });

    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        Body::from_stream(progress_lines(receiver, run_id)),
    )
}

/// POST /runs - Run the pipeline and return its summary
#[utoipa::path(
    post,
    path = "/runs",
    tag = "runs",
    responses(
        (status = 200, description = "Run completed", body = crate::types::RunSummary),
        (status = 500, description = "Run failed", body = crate::error::ApiError)
    )
)]
pub async fn create_run(State(state): State<AppState>) -> Response {
    match state.pipeline.run_new().await {
        Ok(summary) => (StatusCode::OK, Json(summary)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Progress text of one run, ending after its terminal event
fn progress_lines(
    receiver: broadcast::Receiver<Event>,
    run_id: RunId,
) -> impl futures::Stream<Item = Result<String, Infallible>> + Send + 'static {
    let events = BroadcastStream::new(receiver);

    futures::stream::unfold((events, false), move |(mut events, finished)| async move {
        if finished {
            return None;
        }

        loop {
            match events.next().await? {
                Ok(event) if event.run_id() == run_id => {
                    let done = event.is_terminal();
                    return Some((Ok(event.progress_text()), (events, done)));
                }
                Ok(_) => continue,
                Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                    tracing::warn!(run_id = %run_id, skipped, "progress stream lagged");
                    let line = format!("... {skipped} progress lines skipped\n");
                    return Some((Ok(line), (events, false)));
                }
            }
        }
    })
}
