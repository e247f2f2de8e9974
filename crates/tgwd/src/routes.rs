//! Object API routes: upload, full/ranged download, head, delete.
//!
//! Status mapping follows the engine's error taxonomy: unsatisfiable
//! ranges answer 416 with `Content-Range: bytes */<size>`, malformed
//! headers and bad ids answer 400, unknown objects 404, and every other
//! failure an opaque 500. Failure details go to the log, never to the
//! client.

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{on, MethodFilter},
    Json, Router,
};
use serde::Serialize;
use tgw_engine::{decrypt_full, decrypt_range, encrypt_upload, plan_request, EngineError, RangePlan};
use tgw_storage::{Catalog, ObjectRecord, ObjectStore};

use crate::metrics::GatewayMetrics;

#[derive(Clone)]
pub struct AppState {
    pub store: ObjectStore,
    pub catalog: Catalog,
    pub data_prefix: String,
    pub metrics: GatewayMetrics,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/objects/{id}",
            on(MethodFilter::GET, get_object)
                .on(MethodFilter::HEAD, head_object)
                .put(put_object)
                .delete(delete_object),
        )
        .with_state(state)
}

// ── Error mapping ─────────────────────────────────────────────────────────

pub enum ApiError {
    NotFound,
    BadRequest(&'static str),
    RangeNotSatisfiable { size: u64 },
    Internal(anyhow::Error),
}

impl ApiError {
    fn internal(e: impl Into<anyhow::Error>) -> Self {
        ApiError::Internal(e.into())
    }
}

impl From<EngineError> for ApiError {
    fn from(e: EngineError) -> Self {
        match e {
            EngineError::RangeNotSatisfiable { size } => ApiError::RangeNotSatisfiable { size },
            EngineError::MalformedRange(_) => ApiError::BadRequest("malformed range header"),
            EngineError::Client(_) => ApiError::BadRequest("client stream error"),
            other => ApiError::Internal(other.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::NotFound => (StatusCode::NOT_FOUND, "object not found").into_response(),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            ApiError::RangeNotSatisfiable { size } => Response::builder()
                .status(StatusCode::RANGE_NOT_SATISFIABLE)
                .header(header::CONTENT_RANGE, format!("bytes */{size}"))
                .body(Body::empty())
                .unwrap_or_else(|_| StatusCode::RANGE_NOT_SATISFIABLE.into_response()),
            ApiError::Internal(e) => {
                // Engine failures stay opaque to clients; the log gets the chain
                tracing::error!("request failed: {e:#}");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error").into_response()
            }
        }
    }
}

fn validate_id(id: &str) -> Result<(), ApiError> {
    let ok = !id.is_empty()
        && id.len() <= 255
        && !id.starts_with('.')
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if ok {
        Ok(())
    } else {
        Err(ApiError::BadRequest("invalid object id"))
    }
}

// ── Handlers ──────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct UploadResponse {
    id: String,
    plaintext_size: u64,
    stored_size: u64,
}

async fn put_object(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Body,
) -> Result<Response, ApiError> {
    validate_id(&id)?;

    let key = tgw_crypto::generate_key();
    let stored_path = format!("{}/{id}", state.data_prefix);

    let outcome = encrypt_upload(&state.store, &key, &stored_path, body.into_data_stream()).await?;

    let record = ObjectRecord::new(outcome.plaintext_size, &key, &stored_path);
    state
        .catalog
        .save(&id, &record)
        .await
        .map_err(ApiError::internal)?;

    state.metrics.record_request("put");
    state.metrics.add_bytes_in(outcome.plaintext_size);

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            id,
            plaintext_size: outcome.plaintext_size,
            stored_size: outcome.stored_size,
        }),
    )
        .into_response())
}

async fn get_object(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    validate_id(&id)?;

    let record = state
        .catalog
        .load(&id)
        .await
        .map_err(ApiError::internal)?
        .ok_or(ApiError::NotFound)?;
    let key = record.decode_key().map_err(ApiError::internal)?;

    let range_header = match headers.get(header::RANGE) {
        Some(v) => Some(
            v.to_str()
                .map_err(|_| ApiError::BadRequest("malformed range header"))?,
        ),
        None => None,
    };
    let plan = plan_request(range_header, record.plaintext_size)?;

    let (status, stream) = match plan {
        RangePlan::Full { .. } => (
            StatusCode::OK,
            decrypt_full(&state.store, &key, &record.stored_path).await?,
        ),
        RangePlan::Partial { start, end, size } => (
            StatusCode::PARTIAL_CONTENT,
            decrypt_range(&state.store, &key, &record.stored_path, size, start, end).await?,
        ),
    };

    state.metrics.record_request("get");
    state.metrics.add_bytes_out(plan.content_length());

    let mut builder = Response::builder()
        .status(status)
        .header(header::ACCEPT_RANGES, "bytes")
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .header(header::CONTENT_LENGTH, plan.content_length());
    if let Some(content_range) = plan.content_range() {
        builder = builder.header(header::CONTENT_RANGE, content_range);
    }
    builder
        .body(Body::from_stream(stream))
        .map_err(ApiError::internal)
}

async fn head_object(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    validate_id(&id)?;

    let record = state
        .catalog
        .load(&id)
        .await
        .map_err(ApiError::internal)?
        .ok_or(ApiError::NotFound)?;

    state.metrics.record_request("head");

    Response::builder()
        .status(StatusCode::OK)
        .header(header::ACCEPT_RANGES, "bytes")
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .header(header::CONTENT_LENGTH, record.plaintext_size)
        .body(Body::empty())
        .map_err(ApiError::internal)
}

async fn delete_object(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    validate_id(&id)?;

    let record = state
        .catalog
        .load(&id)
        .await
        .map_err(ApiError::internal)?
        .ok_or(ApiError::NotFound)?;

    state
        .store
        .delete(&record.stored_path)
        .await
        .map_err(ApiError::internal)?;
    state
        .catalog
        .delete(&id)
        .await
        .map_err(ApiError::internal)?;

    state.metrics.record_request("delete");

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use axum::http::Request;
    use tower::ServiceExt;

    fn test_app() -> Router {
        let op = opendal::Operator::new(opendal::services::Memory::default())
            .expect("memory operator")
            .finish();
        let mut registry = prometheus_client::registry::Registry::default();
        let state = AppState {
            store: ObjectStore::new(op.clone()),
            catalog: Catalog::new(op, "meta"),
            data_prefix: "objects".into(),
            metrics: GatewayMetrics::new(&mut registry),
        };
        router(state)
    }

    async fn put_object_bytes(app: &Router, id: &str, data: Vec<u8>) -> Response {
        app.clone()
            .oneshot(
                Request::builder()
                    .method("PUT")
                    .uri(format!("/objects/{id}"))
                    .body(Body::from(data))
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    async fn get_with_range(app: &Router, id: &str, range: Option<&str>) -> Response {
        let mut req = Request::builder()
            .method("GET")
            .uri(format!("/objects/{id}"));
        if let Some(r) = range {
            req = req.header(header::RANGE, r);
        }
        app.clone()
            .oneshot(req.body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn body_bytes(resp: Response) -> Vec<u8> {
        to_bytes(resp.into_body(), usize::MAX).await.unwrap().to_vec()
    }

    #[tokio::test]
    async fn upload_then_download_roundtrip() {
        let app = test_app();
        let data: Vec<u8> = (0..50_000).map(|i| (i % 256) as u8).collect();

        let resp = put_object_bytes(&app, "vid1", data.clone()).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: serde_json::Value =
            serde_json::from_slice(&body_bytes(resp).await).unwrap();
        assert_eq!(body["plaintext_size"], 50_000);
        assert_eq!(body["stored_size"], 50_016);

        let resp = get_with_range(&app, "vid1", None).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get(header::ACCEPT_RANGES).unwrap(),
            "bytes"
        );
        assert_eq!(
            resp.headers().get(header::CONTENT_LENGTH).unwrap(),
            "50000"
        );
        assert_eq!(body_bytes(resp).await, data);
    }

    #[tokio::test]
    async fn ranged_get_returns_partial_content() {
        let app = test_app();
        let data = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz".to_vec();
        put_object_bytes(&app, "alpha", data).await;

        let resp = get_with_range(&app, "alpha", Some("bytes=10-19")).await;
        assert_eq!(resp.status(), StatusCode::PARTIAL_CONTENT);
        assert_eq!(
            resp.headers().get(header::CONTENT_RANGE).unwrap(),
            "bytes 10-19/62"
        );
        assert_eq!(resp.headers().get(header::CONTENT_LENGTH).unwrap(), "10");
        assert_eq!(resp.headers().get(header::ACCEPT_RANGES).unwrap(), "bytes");
        assert_eq!(body_bytes(resp).await, b"ABCDEFGHIJ");
    }

    #[tokio::test]
    async fn open_ended_range_reads_to_the_end() {
        let app = test_app();
        let data: Vec<u8> = (0..100u8).collect();
        put_object_bytes(&app, "tail", data.clone()).await;

        let resp = get_with_range(&app, "tail", Some("bytes=90-")).await;
        assert_eq!(resp.status(), StatusCode::PARTIAL_CONTENT);
        assert_eq!(
            resp.headers().get(header::CONTENT_RANGE).unwrap(),
            "bytes 90-99/100"
        );
        assert_eq!(body_bytes(resp).await, &data[90..]);
    }

    #[tokio::test]
    async fn malformed_range_is_a_client_error() {
        let app = test_app();
        put_object_bytes(&app, "bad", vec![0u8; 100]).await;

        for range in ["bytes=-5", "bytes=x-y", "10-20", "bytes=1-2,4-5"] {
            let resp = get_with_range(&app, "bad", Some(range)).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "range {range:?}");
        }
    }

    #[tokio::test]
    async fn unsatisfiable_range_discloses_total_size() {
        let app = test_app();
        put_object_bytes(&app, "small", vec![1u8; 100]).await;

        let resp = get_with_range(&app, "small", Some("bytes=200-300")).await;
        assert_eq!(resp.status(), StatusCode::RANGE_NOT_SATISFIABLE);
        assert_eq!(
            resp.headers().get(header::CONTENT_RANGE).unwrap(),
            "bytes */100"
        );
        assert!(body_bytes(resp).await.is_empty(), "416 carries no body");
    }

    #[tokio::test]
    async fn missing_object_is_404() {
        let app = test_app();
        let resp = get_with_range(&app, "ghost", None).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn invalid_id_is_rejected() {
        let app = test_app();
        for id in ["..", ".hidden", "a%2Fb"] {
            let resp = get_with_range(&app, id, None).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "id {id:?}");
        }
    }

    #[tokio::test]
    async fn head_reports_plaintext_size() {
        let app = test_app();
        put_object_bytes(&app, "sized", vec![9u8; 12_345]).await;

        let resp = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("HEAD")
                    .uri("/objects/sized")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get(header::CONTENT_LENGTH).unwrap(),
            "12345"
        );
        assert_eq!(resp.headers().get(header::ACCEPT_RANGES).unwrap(), "bytes");
        assert!(body_bytes(resp).await.is_empty());
    }

    #[tokio::test]
    async fn delete_removes_object_and_metadata() {
        let app = test_app();
        put_object_bytes(&app, "gone", vec![5u8; 64]).await;

        let resp = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/objects/gone")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);

        let resp = get_with_range(&app, "gone", None).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn megabyte_seek_end_to_end() {
        let app = test_app();
        let data: Vec<u8> = (0..1_048_576).map(|i| (i % 256) as u8).collect();
        put_object_bytes(&app, "movie", data.clone()).await;

        let resp = get_with_range(&app, "movie", Some("bytes=500000-500099")).await;
        assert_eq!(resp.status(), StatusCode::PARTIAL_CONTENT);
        assert_eq!(
            resp.headers().get(header::CONTENT_RANGE).unwrap(),
            "bytes 500000-500099/1048576"
        );

        let body = body_bytes(resp).await;
        assert_eq!(body.len(), 100);
        assert_eq!(body, &data[500_000..=500_099]);
    }
}
