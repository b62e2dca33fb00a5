use std::sync::Arc;

use blog_api::{
    App,
    config::{Env, ServerConfig},
    store::PgStore,
};
use dotenv::dotenv;
use mimalloc::MiMalloc;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

const MAX_DB_CONNECTIONS: usize = 10;

fn init_tracing(env: Env) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    match env {
        Env::Production => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        Env::Dev | Env::Staging => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    dotenv().ok();

    let env = Env::from_env();
    init_tracing(env);

    let config = ServerConfig::new_from_env(env);
    let store = PgStore::connect(&config.database_url, MAX_DB_CONNECTIONS)?;
    let addr = config.listen_addr;

    let app = blog_api::router(App::new(Arc::new(store), config));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
