use crate::cli::Args;
use anyhow::Context;
use axum::Router;
use axum::routing::{get, post};
use axum_keycloak_auth::PassthroughMode;
use axum_keycloak_auth::instance::{KeycloakAuthInstance, KeycloakConfig};
use axum_keycloak_auth::layer::KeycloakAuthLayer;
use deadpool_diesel::Runtime;
use deadpool_diesel::postgres::{Manager, Pool};
use tracing::info;

pub mod cli;
pub mod model;
pub mod payloads;
pub mod response;
pub mod schema;

mod api;
mod errors;

pub fn init_router(args: &Args) -> anyhow::Result<Router> {
    info!("Initializing database pool...");
    let pool = init_pool(&args.connection_str, args.db_pool_max_size)
        .context("Failed to initialize database pool")?;

    info!("Initializing Keycloak authentication layer...");
    let keycloak_layer =
        init_protection_layer(args).context("Failed to initialize Keycloak layer")?;

    info!("Initializing router...");
    Ok(init_router_internal(pool, keycloak_layer))
}

pub fn init_test_router(pool: Pool) -> Router {
    let admin_api = admin_routes();
    let player_api = player_routes();

    Router::new()
        .nest("/admin", admin_api)
        .nest("/player", player_api)
        .with_state(pool)
}

fn init_router_internal(pool: Pool, keycloak_layer: KeycloakAuthLayer<String>) -> Router {
    let admin_api = admin_routes().layer(keycloak_layer.clone());
    let player_api = player_routes().layer(keycloak_layer.clone());

    Router::new()
        .nest("/admin", admin_api)
        .nest("/player", player_api)
        .with_state(pool)
}

fn init_pool(conn_str: &str, max_size: u32) -> anyhow::Result<Pool> {
    let manager = Manager::new(conn_str, Runtime::Tokio1);
    let pool = Pool::builder(manager).max_size(max_size as usize).build()?;
    Ok(pool)
}

fn init_protection_layer(args: &Args) -> anyhow::Result<KeycloakAuthLayer<String>> {
    let config = KeycloakConfig::builder()
        .server(args.keycloak_server_url.clone())
        .realm(args.keycloak_realm.clone())
        .build();

    let instance = KeycloakAuthInstance::new(config);

    let layer = KeycloakAuthLayer::builder()
        .instance(instance)
        .passthrough_mode(PassthroughMode::Block)
        .persist_raw_claims(false)
        .expected_audiences(vec![args.keycloak_audiences.clone()])
        .build();

    Ok(layer)
}

fn admin_routes() -> Router<Pool> {
    Router::new()
        // game catalog
        .route("/get_games", get(api::admin::get_games))
        .route("/get_game", get(api::admin::get_game))
        .route("/create_game", post(api::admin::create_game))
        .route("/modify_game", post(api::admin::modify_game))
        .route("/delete_game", post(api::admin::delete_game))
        // submission review and reward pipeline
        .route(
            "/get_game_submissions",
            get(api::admin::get_game_submissions),
        )
        .route("/review_submission", post(api::admin::review_submission))
        .route("/select_winners", post(api::admin::select_winners))
        .route("/award_rewards", post(api::admin::award_rewards))
        .route(
            "/refresh_leaderboard",
            post(api::admin::refresh_leaderboard),
        )
        // badge catalog
        .route("/get_badges", get(api::admin::get_badges))
        .route("/create_badge", post(api::admin::create_badge))
        .route("/modify_badge", post(api::admin::modify_badge))
        .route("/delete_badge", post(api::admin::delete_badge))
}

fn player_routes() -> Router<Pool> {
    Router::new()
        .route(
            "/get_published_games",
            get(api::player::get_published_games),
        )
        .route("/submit_entry", post(api::player::submit_entry))
        .route("/get_leaderboard", get(api::player::get_leaderboard))
        .route("/get_player_rewards", get(api::player::get_player_rewards))
}
