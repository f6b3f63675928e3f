use std::sync::Arc;

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::{get, post},
};
use diesel_async::AsyncPgConnection;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

pub mod blog;
pub mod captcha;
pub mod config;
pub mod contact;
pub mod error;
pub mod home;
pub mod identity;
pub mod json;
pub mod models;
pub mod notify;
pub mod profile;
pub mod projects;
pub mod real_ip;
pub mod schema;
pub mod sitemap;
pub mod slug;
pub mod store;
pub mod utils;

#[cfg(test)]
mod test_util;

use captcha::CaptchaVerifier;
use config::ServerConfig;
use notify::Notifier;
use store::pg::PgStore;

pub type DieselPool = diesel_async::pooled_connection::deadpool::Pool<AsyncPgConnection>;

#[derive(Clone)]
pub struct App {
    pub diesel: DieselPool,
    pub store: PgStore,
    pub config: Arc<ServerConfig>,
    pub notifier: Notifier,
    pub captcha: CaptchaVerifier,
    /// `{ip}:{article id}` pairs whose view was already counted.
    pub views_cache: Arc<retainer::Cache<String, ()>>,
}

impl App {
    pub fn new(config: ServerConfig, diesel: DieselPool, http: reqwest::Client) -> Self {
        let notifier = Notifier::from_config(&config, http.clone());
        let captcha = CaptchaVerifier::new(http, config.smartcaptcha_server_key.clone());

        App {
            store: PgStore::new(diesel.clone()),
            diesel,
            config: Arc::new(config),
            notifier,
            captcha,
            views_cache: Arc::new(retainer::Cache::new()),
        }
    }
}

fn cors(config: &ServerConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(origin) => Some(origin),
            Err(e) => {
                tracing::warn!(%origin, error = %e, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PATCH])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true)
}

async fn health() -> &'static str {
    "ok"
}

pub fn router(app: App) -> Router {
    let admin = blog::routes::admin_route()
        .route("/projects", post(projects::create_project))
        .route("/contact-messages", get(contact::list_messages));

    Router::new()
        .route("/health", get(health))
        .route("/home", get(home::get_home))
        .route("/sitemap", get(sitemap::get_sitemap))
        .route("/site", get(profile::get_site))
        .route("/about", get(profile::get_about))
        .route("/projects", get(projects::list_projects))
        .route("/contact", post(contact::submit_contact))
        .nest("/blog", blog::routes::route())
        .nest("/admin", admin)
        .layer(cors(&app.config))
        .layer(TraceLayer::new_for_http())
        .with_state(app)
}
