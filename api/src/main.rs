use std::{net::SocketAddr, time::Duration};

use diesel_async::{
    AsyncPgConnection,
    pooled_connection::{AsyncDieselConnectionManager, deadpool::Pool},
};
use dotenv::dotenv;
use mimalloc::MiMalloc;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use space_api::{
    App,
    config::{Env, ServerConfig},
    router,
};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

const HTTP_TIMEOUT: Duration = Duration::from_secs(15);

fn init_tracing(env: Env) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    match env {
        Env::Dev => registry.with(tracing_subscriber::fmt::layer()).init(),
        Env::Staging | Env::Production => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
    }
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    dotenv().ok();
    init_tracing(Env::from_env());

    let config = ServerConfig::new_from_env();

    let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(&config.database_url);
    let diesel = Pool::builder(manager).max_size(10).build()?;

    let http = reqwest::Client::builder().timeout(HTTP_TIMEOUT).build()?;

    let app = App::new(config, diesel, http);

    let views_cache = app.views_cache.clone();
    tokio::spawn(async move {
        views_cache
            .monitor(4, 0.25, Duration::from_secs(3))
            .await;
    });

    let addr = SocketAddr::from(([0, 0, 0, 0], app.config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Listening");

    axum::serve(
        listener,
        router(app).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
