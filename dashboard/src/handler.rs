use chrono::Local;
use relief_data::{
    analysis::{MapStyle, MapView},
    reader,
};
use serde::Deserialize;
use tokio::time::Instant;
use tracing::{debug, error};
use warp::{http::StatusCode, reply::Response, Reply};

use crate::{
    context::{load_snapshot, DashboardContextRef},
    frame::render_frame,
    page, Result,
};

pub const DEFAULT_HISTORY_HOURS: i64 = 24;

#[derive(Debug, Default, Deserialize)]
pub struct FrameQuery {
    pub session: Option<String>,
    pub view: Option<String>,
    pub style: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    pub hours: Option<i64>,
}

fn error_reply(status: StatusCode, message: String) -> Response {
    let body = serde_json::json!({ "error": message });
    warp::reply::with_status(warp::reply::json(&body), status).into_response()
}

pub async fn health_handler() -> Result<impl Reply> {
    Ok(StatusCode::OK)
}

pub async fn index_handler() -> Result<impl Reply> {
    Ok(warp::reply::html(page::INDEX_HTML))
}

pub async fn create_session_handler(context_ref: DashboardContextRef) -> Result<impl Reply> {
    let session_id = context_ref.write().await.create_session();
    let body = serde_json::json!({ "session_id": session_id });
    Ok(warp::reply::with_status(warp::reply::json(&body), StatusCode::CREATED))
}

pub async fn frame_handler(query: FrameQuery, context_ref: DashboardContextRef) -> Result<Response> {
    let view = match query.view.as_deref() {
        None => MapView::default(),
        Some(name) => match MapView::parse(name) {
            Some(view) => view,
            None => return Ok(error_reply(StatusCode::BAD_REQUEST, format!("unknown map view: {name}"))),
        },
    };
    let style = match query.style.as_deref() {
        None => MapStyle::default(),
        Some(name) => match MapStyle::parse(name) {
            Some(style) => style,
            None => return Ok(error_reply(StatusCode::BAD_REQUEST, format!("unknown map style: {name}"))),
        },
    };

    let snapshot = load_snapshot(&context_ref).await;
    let mut context = context_ref.write().await;
    context.evict_idle_sessions();
    let refresh_interval = context.config.refresh_interval;

    let frame = match query.session {
        None => render_frame(&snapshot, None, view, style, refresh_interval, Local::now()),
        Some(id) => {
            let Some(session) = context.sessions.get_mut(&id) else {
                return Ok(error_reply(StatusCode::NOT_FOUND, format!("unknown session: {id}")));
            };
            let frame = render_frame(&snapshot, session.previous.as_deref(), view, style, refresh_interval, Local::now());
            session.previous = Some(snapshot.records);
            session.frames_served += 1;
            session.last_seen = Instant::now();
            debug!(session = %id, frames = session.frames_served, "served frame");
            frame
        }
    };
    Ok(warp::reply::json(&frame).into_response())
}

pub async fn history_handler(query: HistoryQuery, context_ref: DashboardContextRef) -> Result<impl Reply> {
    let store = context_ref.read().await.store.clone();
    let hours = query.hours.unwrap_or(DEFAULT_HISTORY_HOURS);
    let records = match tokio::task::spawn_blocking(move || reader::load_history(store.as_ref(), hours)).await {
        Ok(records) => records,
        Err(e) => {
            error!(error = %e, "history read task failed");
            Vec::new()
        }
    };
    Ok(warp::reply::json(&records))
}
