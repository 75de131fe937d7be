use actix_web::{middleware, web, App, HttpServer};
use clap::Parser;

use server::config::Config;
use server::handlers::root;
use server::relay::Relay;
use server::room_registry::RoomRegistry;
use server::server::spawn_server;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::parse();
    let settings = config.connection_settings();

    let relay = Relay::new(RoomRegistry::new(config.initial_document.clone()));
    let srv_tx = spawn_server(relay);

    log::info!("Listening on {}", config.bind);
    let app_config = config.clone();
    HttpServer::new(move || {
        App::new()
            .wrap(app_config.cors())
            .wrap(middleware::Logger::default())
            .app_data(web::Data::new(srv_tx.clone()))
            .app_data(web::Data::new(settings))
            .configure(root)
    })
    .bind(&config.bind)?
    .run()
    .await
}
