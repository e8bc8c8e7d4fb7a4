mod app;
pub mod config;
mod error;
mod routes;

use anyhow::Result;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

pub use app::AppState;
pub use config::AppConfig;
pub use error::ApiError;

pub struct BlogApp {
    pub config: AppConfig,
    pub state: AppState,
    pub router: Router<()>,
}

impl BlogApp {
    pub async fn listen(self) -> Result<()> {
        let listener = TcpListener::bind(self.config.address()).await?;
        axum::serve(listener, self.router).await?;
        Ok(())
    }
}

pub fn build() -> Result<BlogApp> {
    build_with(AppConfig::from_env())
}

pub fn build_with(config: AppConfig) -> Result<BlogApp> {
    let state = AppState::new(&config);

    let router = routes::router(state.clone(), config.max_media_bytes())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .with_state(state.clone());

    Ok(BlogApp { config, state, router })
}
