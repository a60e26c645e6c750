use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use dotenv::dotenv;
use explanation_client::{ExplainerConfig, ExplanationClient};
use rule_engine::Evaluator;
use screening_service::{config::Config, handlers, handlers::AppState};
use std::time::Duration;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();

    let _subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .json()
        .init();

    info!("Starting Screening Service...");

    // Load configuration
    let config = Config::from_env().expect("Failed to load configuration");
    info!("Configuration loaded successfully");

    // The registry is built once and shared read-only across all workers
    let evaluator = Evaluator::with_standard_operators();
    info!(
        operators = evaluator.registry().len(),
        "Operator registry initialized"
    );

    let explainer = if config.explainer.enabled {
        let explainer_config = ExplainerConfig {
            endpoint: config.explainer.endpoint.clone(),
            model: config.explainer.model.clone(),
            max_attempts: config.explainer.max_attempts,
            request_timeout: Duration::from_secs(config.explainer.request_timeout_seconds),
            ..ExplainerConfig::default()
        };
        match ExplanationClient::new(explainer_config) {
            Ok(client) => Some(client),
            Err(e) => {
                warn!("Explanation client disabled: {}", e);
                None
            }
        }
    } else {
        None
    };

    let state = web::Data::new(AppState {
        evaluator,
        explainer,
    });

    let server_config = config.server.clone();

    info!(
        "Starting HTTP server on {}:{}",
        server_config.host, server_config.port
    );

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(middleware::Logger::default())
            .configure(handlers::configure_routes)
    })
    .workers(server_config.workers)
    .bind((server_config.host, server_config.port))?
    .run()
    .await
}
