use axum::{
    Router,
    extract::{Query, State, rejection::QueryRejection},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use crate::auth::AccessGate;
use crate::resolver::Resolver;

const MISSING_PARAMS: &str = "Missing required parameters \"artist\" or \"title\".";
const UNAUTHORIZED: &str = "Unauthorized";
const NOT_FOUND: &str = "Lyrics not found.";

#[derive(Clone)]
pub struct AppState {
    pub resolver: Resolver,
    /// `None` when authentication is disabled.
    pub gate: Option<AccessGate>,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/lyrics", get(get_lyrics))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Liveness probe
async fn root() -> StatusCode {
    StatusCode::OK
}

#[derive(Debug, Deserialize)]
struct LyricsParams {
    #[serde(default)]
    artist: String,
    #[serde(default)]
    title: String,
}

/// Resolve lyrics for an (artist, title) query.
///
/// Clients only ever see 200/400/401/404; internal cache and remote failures
/// are logged server-side and collapse to 404.
async fn get_lyrics(
    State(state): State<AppState>,
    headers: HeaderMap,
    params: Result<Query<LyricsParams>, QueryRejection>,
) -> Response {
    if let Some(gate) = &state.gate {
        let authorization = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok());

        let allowed = match gate.authorize(authorization).await {
            Ok(allowed) => allowed,
            Err(e) => {
                tracing::error!("Token store error: {}", e);
                false
            }
        };

        if !allowed {
            return (StatusCode::UNAUTHORIZED, UNAUTHORIZED).into_response();
        }
    }

    // An unparseable query string gets the same fixed 400 body as missing
    // parameters; axum's own rejection text never crosses the boundary.
    let Ok(Query(params)) = params else {
        return (StatusCode::BAD_REQUEST, MISSING_PARAMS).into_response();
    };

    if params.artist.is_empty() || params.title.is_empty() {
        return (StatusCode::BAD_REQUEST, MISSING_PARAMS).into_response();
    }

    tracing::debug!(
        "Resolving lyrics for artist='{}', title='{}'",
        params.artist,
        params.title
    );

    match state.resolver.resolve(&params.artist, &params.title).await {
        Some(lyrics) => (StatusCode::OK, lyrics).into_response(),
        None => (StatusCode::NOT_FOUND, NOT_FOUND).into_response(),
    }
}
