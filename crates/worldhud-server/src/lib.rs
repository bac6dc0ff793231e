//! HTTP and realtime surface for the World HUD backend.
//!
//! `build_rocket` assembles the `/api` routes, the `/ws/hud` realtime
//! channel, JSON error catchers and the CORS fairing around a shared
//! `HudService` and `Relay`.

pub mod cors;
pub mod error;
pub mod relay;
pub mod routes;

use log::info;
use rocket::fairing::AdHoc;
use rocket::figment::Figment;
use rocket::{Build, Rocket, catchers};
use worldhud_core::HudService;

pub use error::ApiError;
pub use relay::{OutboundMessage, Relay};

/// Build the server with Rocket's default configuration sources.
pub fn build_rocket(service: HudService, relay: Relay) -> Rocket<Build> {
    build_rocket_with(rocket::Config::figment(), service, relay)
}

/// Build the server from an explicit configuration figment.
pub fn build_rocket_with(figment: Figment, service: HudService, relay: Relay) -> Rocket<Build> {
    rocket::custom(figment)
        .manage(service)
        .manage(relay)
        .attach(cors::Cors)
        .attach(AdHoc::on_liftoff("Startup log", |rocket| {
            Box::pin(async move {
                let config = rocket.config();
                info!(
                    "world hud server listening (address={}, port={})",
                    config.address, config.port
                );
            })
        }))
        .attach(AdHoc::on_shutdown("Shutdown log", |rocket| {
            Box::pin(async move {
                let clients = rocket.state::<Relay>().map_or(0, Relay::len);
                info!("world hud server shutting down (realtime_clients={clients})");
            })
        }))
        .mount("/api", routes::routes())
        .mount("/", rocket::routes![relay::hud_socket, cors::preflight])
        .register(
            "/",
            catchers![error::not_found, error::unprocessable, error::fallback],
        )
}
