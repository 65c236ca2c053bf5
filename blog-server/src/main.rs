mod application;
mod cli;
mod data;
mod domain;
mod infrastructure;
mod presentation;
#[cfg(test)]
mod test_support;

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::middleware::{DefaultHeaders, Logger};
use actix_web::{App, HttpServer};
use anyhow::Context;
use application::Services;
use clap::Parser;
use cli::{Cli, Command};
use infrastructure::clock::SystemClock;
use infrastructure::config::AppConfig;
use infrastructure::database::connect_repositories;
use infrastructure::logging::init_logging;
use infrastructure::security::JwtKeys;
use presentation::middleware::{RequestIdMiddleware, TimingMiddleware};
use presentation::routes;
use tracing::info;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let cli = Cli::parse();
    let config = AppConfig::from_env().context("invalid configuration")?;
    let repos = connect_repositories(&config)
        .await
        .context("failed to initialise storage")?;
    let keys = JwtKeys::new(config.jwt_secret.clone());

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            let ttl = u32::try_from(config.feed_cache_ttl_secs).unwrap_or(u32::MAX);
            let services = Services::new(
                repos,
                keys,
                Arc::new(SystemClock),
                chrono::Duration::seconds(i64::from(ttl)),
            );
            serve(config, services).await
        }
        Command::Group(command) => cli::run_group(repos, command).await,
        Command::User(command) => cli::run_user(repos, keys, command).await,
    }
}

async fn serve(config: AppConfig, services: Services) -> anyhow::Result<()> {
    let bind = (config.host.clone(), config.port);
    info!(host = %bind.0, port = bind.1, "starting HTTP server");

    HttpServer::new(move || {
        let cors = build_cors(&config);
        App::new()
            .wrap(Logger::default())
            .wrap(TimingMiddleware)
            .wrap(RequestIdMiddleware)
            .wrap(
                DefaultHeaders::new()
                    .add(("X-Content-Type-Options", "nosniff"))
                    .add(("Referrer-Policy", "no-referrer"))
                    .add(("Permissions-Policy", "geolocation=()"))
                    .add(("Cross-Origin-Opener-Policy", "same-origin")),
            )
            .wrap(cors)
            .configure(|cfg| routes::configure(cfg, &services))
    })
    .bind(bind)?
    .run()
    .await?;

    Ok(())
}

fn build_cors(config: &AppConfig) -> Cors {
    let mut cors = Cors::default()
        .allowed_methods(vec!["GET", "POST", "PUT", "DELETE"])
        .allowed_headers(vec![
            actix_web::http::header::CONTENT_TYPE,
            actix_web::http::header::AUTHORIZATION,
        ])
        .supports_credentials()
        .max_age(3600);

    for origin in &config.cors_origins {
        cors = if origin == "*" {
            cors.allow_any_origin()
        } else {
            cors.allowed_origin(origin)
        };
    }

    cors
}
