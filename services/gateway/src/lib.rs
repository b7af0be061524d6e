pub mod context;
pub mod http;
pub mod middleware;
pub mod packets;
pub mod state;
pub mod svc;

pub use state::{AppState, MenuIcon, ServiceUrls};

use axum::Router;
use axum::middleware::from_fn;
use axum::routing::{get, post};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/v1/login", post(http::login::login))
        .route("/v1/bancho", post(http::bancho::bancho))
        .route("/v1/web/osu-osz2-getscores.php", get(http::web::get_scores))
        .layer(from_fn(middleware::track_request))
        .with_state(state)
}
