use std::sync::Arc;

use axum::{Router, http::HeaderValue};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    config::{Env, ServerConfig},
    store::Store,
};

pub mod blog;
pub mod config;
pub mod error;
pub mod identity;
pub mod json;
pub mod schema;
pub mod store;
pub mod thread;

#[derive(Clone)]
pub struct App {
    pub store: Arc<dyn Store>,
    pub config: Arc<ServerConfig>,
}

impl App {
    pub fn new(store: Arc<dyn Store>, config: ServerConfig) -> Self {
        App {
            store,
            config: Arc::new(config),
        }
    }
}

pub fn router(app: App) -> Router {
    let mut router = Router::new()
        .merge(blog::routes::route())
        .layer(TraceLayer::new_for_http());

    let allow_origin = match app.config.env {
        Env::Dev => Some(AllowOrigin::any()),
        Env::Staging | Env::Production => match app.config.site_url.parse::<HeaderValue>() {
            Ok(origin) => Some(AllowOrigin::exact(origin)),
            Err(e) => {
                tracing::warn!(site_url = %app.config.site_url, error = %e, "Invalid SITE_URL, CORS disabled");
                None
            }
        },
    };

    if let Some(allow_origin) = allow_origin {
        router = router.layer(
            CorsLayer::new()
                .allow_origin(allow_origin)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        );
    }

    router.with_state(app)
}
