//! HTTP surface over schema, query and data generation, conversations and
//! the active database connection.

pub mod error;
pub mod routes;
pub mod state;

pub use error::{ApiError, ServerError};
pub use routes::configure;
pub use state::AppState;

use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use common::config::ForgeConfig;
use common::error::ForgeError;
use shared_clients::{ModelRouter, SharedModel};
use std::sync::Arc;
use tracing::info;

/// Malformed or missing JSON bodies become input errors in the usual
/// envelope.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        ApiError::from(ForgeError::input(format!("No data provided: {err}"))).into()
    })
}

pub fn build_state(config: ForgeConfig) -> Result<AppState, ServerError> {
    let model: SharedModel = Arc::new(ModelRouter::from_config(&config.models)?);
    Ok(AppState::new(config, model))
}

pub async fn run_server(config: ForgeConfig) -> Result<(), ServerError> {
    let addr = config.server.addr.clone();
    let state = web::Data::new(build_state(config)?);

    info!(addr = %addr, "starting server");

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .wrap(Logger::default())
            .wrap(cors)
            .app_data(state.clone())
            .app_data(json_config())
            .configure(configure)
    })
    .bind(addr)?
    .run()
    .await?;
    Ok(())
}
