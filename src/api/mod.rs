use std::{sync::Arc, time::Duration};

use axum::{
    body::Body,
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{classify::ServerErrorsFailureClass, cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, error, info, Span};
use uuid::Uuid;

use crate::{
    config::Config,
    repository::SongRepository,
    usecase::{self, ListParams},
    util::lenient_positive,
    validate::{Issue, ValidationIssues},
};

pub type SharedRepository = Arc<dyn SongRepository>;

enum ApiError {
    Validation(ValidationIssues),
    NotFound,
    /// Generic message for the client; the cause has already been logged.
    Internal(&'static str),
}

impl ApiError {
    fn from_usecase(err: usecase::Error, failure: &'static str) -> Self {
        match err {
            usecase::Error::Validation(issues) => ApiError::Validation(issues),
            usecase::Error::Store(e) => {
                error!("{failure}: {e}");
                ApiError::Internal(failure)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(issues) => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "Validation failed", "details": issues })),
            )
                .into_response(),
            ApiError::NotFound => (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": "Song not found" })),
            )
                .into_response(),
            ApiError::Internal(message) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": message })),
            )
                .into_response(),
        }
    }
}

fn json_body(body: Result<Json<Value>, JsonRejection>) -> Result<Value, ApiError> {
    body.map(|Json(value)| value).map_err(|rejection| {
        debug!("rejected body: {rejection}");
        ApiError::Validation(Issue::body(rejection.body_text()).into())
    })
}

// malformed ids are just songs that don't exist
fn song_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| {
        debug!("malformed song id {raw:?}");
        ApiError::NotFound
    })
}

// Repeated keys are not an error, the first occurrence wins.
type QueryPairs = Query<Vec<(String, String)>>;

fn first<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, value)| value.as_str())
}

async fn create(
    State(repo): State<SharedRepository>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let payload = json_body(body)?;
    let song = usecase::create_song(repo.as_ref(), &payload)
        .await
        .map_err(|e| ApiError::from_usecase(e, "Failed to create song"))?;
    info!("created song {}", song.id);
    Ok((StatusCode::CREATED, Json(song)))
}

async fn list(
    State(repo): State<SharedRepository>,
    Query(query): QueryPairs,
) -> Result<impl IntoResponse, ApiError> {
    let params = ListParams {
        page: lenient_positive(first(&query, "page")),
        limit: lenient_positive(first(&query, "limit")),
        genre: first(&query, "genre").map(str::to_string),
    };
    let page = usecase::list_songs(repo.as_ref(), &params)
        .await
        .map_err(|e| ApiError::from_usecase(e, "Failed to get songs"))?;
    Ok(Json(page))
}

async fn search(
    State(repo): State<SharedRepository>,
    Query(query): QueryPairs,
) -> Result<impl IntoResponse, ApiError> {
    let songs = usecase::search_songs(repo.as_ref(), first(&query, "q").unwrap_or_default())
        .await
        .map_err(|e| ApiError::from_usecase(e, "Failed to search songs"))?;
    Ok(Json(songs))
}

async fn statistics(State(repo): State<SharedRepository>) -> Result<impl IntoResponse, ApiError> {
    let stats = usecase::get_statistics(repo.as_ref())
        .await
        .map_err(|e| ApiError::from_usecase(e, "Failed to get statistics"))?;
    Ok(Json(stats))
}

async fn get_one(
    State(repo): State<SharedRepository>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = song_id(&id)?;
    usecase::get_song(repo.as_ref(), id)
        .await
        .map_err(|e| ApiError::from_usecase(e, "Failed to get song"))?
        .map(Json)
        .ok_or(ApiError::NotFound)
}

async fn update(
    State(repo): State<SharedRepository>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let id = song_id(&id)?;
    let payload = json_body(body)?;
    usecase::update_song(repo.as_ref(), id, &payload)
        .await
        .map_err(|e| ApiError::from_usecase(e, "Failed to update song"))?
        .map(Json)
        .ok_or(ApiError::NotFound)
}

async fn remove(
    State(repo): State<SharedRepository>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = song_id(&id)?;
    let deleted = usecase::delete_song(repo.as_ref(), id)
        .await
        .map_err(|e| ApiError::from_usecase(e, "Failed to delete song"))?;
    if deleted {
        info!("deleted song {id}");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound)
    }
}

pub fn router(repo: SharedRepository, base_path: &str) -> Router {
    let songs = Router::new()
        .route("/", get(list).post(create))
        .route("/search", get(search))
        .route("/statistics", get(statistics))
        .route("/:id", get(get_one).put(update).delete(remove));

    let base_path = base_path.trim_matches('/');
    let app = Router::new().route("/health", get(|| async { Json(json!({ "status": "ok" })) }));
    // axum refuses to nest at the root
    let app = if base_path.is_empty() {
        app.merge(songs)
    } else {
        app.nest(&format!("/{base_path}"), songs)
    };

    app.with_state(repo)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .on_request(|req: &Request<Body>, _span: &Span| {
                    debug!("{} {}", req.method(), req.uri());
                })
                .on_response(|response: &Response, latency: Duration, _span: &Span| {
                    debug!("{} in {latency:?}", response.status());
                })
                .on_failure(
                    |error: ServerErrorsFailureClass, _latency: Duration, _span: &Span| {
                        error!("{error:?}");
                    },
                ),
        )
}

pub async fn serve(repo: SharedRepository, config: &Config) -> std::io::Result<()> {
    let app = router(repo, &config.api.base_path);

    let listener = tokio::net::TcpListener::bind(config.system.bind_addr.as_str()).await?;
    info!(
        "Running on {} (songs at {})",
        listener.local_addr()?,
        config.api.base_path
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("cannot listen for ctrl-c: {e}");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
