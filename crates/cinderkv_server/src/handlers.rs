//! Request handlers for the typed endpoints, raw query, and health report.

use crate::error::{ServerError, ServerResult};
use crate::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use cinderkv_core::{Fetched, LogStore};
use cinderkv_types::{Collection, Kind, Number, Set, Table, Text, ZSet};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;

/// The `/health` report body.
#[derive(Debug, Serialize)]
pub struct SystemInfo {
    /// Server version.
    pub version: &'static str,
    /// Compaction state: `idle` or `running`.
    pub compaction_state: &'static str,
    /// Live key count.
    pub key_count: usize,
    /// Id of the segment receiving appends.
    pub active_segment: u64,
    /// Number of sealed segments.
    pub sealed_segments: usize,
    /// Total bytes across segment files.
    pub disk_used_bytes: u64,
    /// Data directory path.
    pub directory: String,
}

/// `GET /{kind}/{key}` - typed read.
pub async fn get_typed(
    State(state): State<AppState>,
    Path((kind, key)): Path<(String, String)>,
) -> ServerResult<Response> {
    let Some(kind) = Kind::from_str_name(&kind) else {
        return Ok(unknown_route());
    };

    let fetched = fetch(&state.store, key.into_bytes()).await?;
    let body = typed_response(kind, &fetched)?;
    Ok((StatusCode::OK, Json(body)).into_response())
}

/// `PUT /{kind}/{key}` - typed write, kind inferred from the path.
pub async fn put_typed(
    State(state): State<AppState>,
    Path((kind, key)): Path<(String, String)>,
    body: Result<Json<Value>, JsonRejection>,
) -> ServerResult<Response> {
    let Some(kind) = Kind::from_str_name(&kind) else {
        return Ok(unknown_route());
    };
    let Json(body) = body.map_err(|e| ServerError::bad_request(e.body_text()))?;
    let (value, ttl) = parse_body(kind, body)?;

    let store = Arc::clone(&state.store);
    let key = key.into_bytes();
    run_blocking(move || store.put(&key, kind, &value, ttl)).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "request processed succeed." })),
    )
        .into_response())
}

/// `DELETE /{kind}/{key}`.
pub async fn delete_typed(
    State(state): State<AppState>,
    Path((kind, key)): Path<(String, String)>,
) -> ServerResult<Response> {
    if Kind::from_str_name(&kind).is_none() {
        return Ok(unknown_route());
    }

    let store = Arc::clone(&state.store);
    let key = key.into_bytes();
    run_blocking(move || store.delete(&key)).await?;

    Ok(StatusCode::NO_CONTENT.into_response())
}

/// `GET /query/{key}` - raw read: kind, key, post-transform-reversed value
/// bytes, remaining TTL and the MVCC tag.
pub async fn query(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> ServerResult<Response> {
    let fetched = fetch(&state.store, key.clone().into_bytes()).await?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "type": fetched.kind.as_str(),
            "key": key,
            "value": fetched.value,
            "ttl": fetched.ttl,
            "mvcc": fetched.version,
        })),
    )
        .into_response())
}

/// `GET /health`.
pub async fn health(State(state): State<AppState>) -> ServerResult<Response> {
    let store = Arc::clone(&state.store);
    let info = run_blocking(move || -> cinderkv_core::CoreResult<SystemInfo> {
        Ok(SystemInfo {
            version: env!("CARGO_PKG_VERSION"),
            compaction_state: store.compaction_state().as_str(),
            key_count: store.key_count(),
            active_segment: store.active_segment_id(),
            sealed_segments: store.sealed_segment_count(),
            disk_used_bytes: store.disk_usage()?,
            directory: store.directory().display().to_string(),
        })
    })
    .await?;

    Ok((StatusCode::OK, Json(info)).into_response())
}

/// Catch-all for unmatched routes.
pub async fn fallback() -> Response {
    unknown_route()
}

fn unknown_route() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "message": "Oops! 404 Not Found!" })),
    )
        .into_response()
}

async fn fetch(store: &Arc<LogStore>, key: Vec<u8>) -> ServerResult<Fetched> {
    let store = Arc::clone(store);
    run_blocking(move || store.get(&key)).await
}

/// Runs an engine call on the blocking pool; disk I/O must not stall the
/// request executor.
async fn run_blocking<T, E, F>(f: F) -> ServerResult<T>
where
    F: FnOnce() -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: Into<ServerError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ServerError::internal(format!("engine task failed: {e}")))?
        .map_err(Into::into)
}

/// Binds a JSON request body to the payload type of `kind`, returning the
/// msgpack value bytes and the requested TTL.
fn parse_body(kind: Kind, body: Value) -> ServerResult<(Vec<u8>, u64)> {
    fn bind<T: serde::de::DeserializeOwned>(body: Value) -> ServerResult<T> {
        serde_json::from_value(body).map_err(|e| ServerError::bad_request(e.to_string()))
    }

    Ok(match kind {
        Kind::Text => {
            let payload: Text = bind(body)?;
            (payload.to_value_bytes()?, payload.ttl)
        }
        Kind::Number => {
            let payload: Number = bind(body)?;
            (payload.to_value_bytes()?, payload.ttl)
        }
        Kind::Set => {
            let payload: Set = bind(body)?;
            (payload.to_value_bytes()?, payload.ttl)
        }
        Kind::ZSet => {
            let payload: ZSet = bind(body)?;
            (payload.to_value_bytes()?, payload.ttl)
        }
        Kind::Table => {
            let payload: Table = bind(body)?;
            (payload.to_value_bytes()?, payload.ttl)
        }
        Kind::Collection => {
            let payload: Collection = bind(body)?;
            (payload.to_value_bytes()?, payload.ttl)
        }
        Kind::Unknown => {
            return Err(ServerError::bad_request("unknown kind is not writable"));
        }
    })
}

/// Renders a fetched record as the response body for its kind.
///
/// The stored kind travels into the typed decoder, so a read through the
/// wrong endpoint surfaces as a kind mismatch rather than garbage.
fn typed_response(kind: Kind, fetched: &Fetched) -> ServerResult<Value> {
    Ok(match kind {
        Kind::Text => json!({ "text": Text::from_value_bytes(fetched.kind, &fetched.value)?.content }),
        Kind::Number => {
            json!({ "number": Number::from_value_bytes(fetched.kind, &fetched.value)?.value })
        }
        Kind::Set => json!({ "set": Set::from_value_bytes(fetched.kind, &fetched.value)?.set }),
        Kind::ZSet => json!({ "zset": ZSet::from_value_bytes(fetched.kind, &fetched.value)?.zset }),
        Kind::Table => {
            json!({ "table": Table::from_value_bytes(fetched.kind, &fetched.value)?.table })
        }
        Kind::Collection => {
            json!({ "collection": Collection::from_value_bytes(fetched.kind, &fetched.value)?.collection })
        }
        Kind::Unknown => return Err(ServerError::internal("record with unknown kind")),
    })
}
