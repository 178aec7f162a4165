use checkout_service::{build_server, create_pool, run_migrations, AppState, Ports, Settings};
use dotenvy::dotenv;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let settings = Settings::from_env().map_err(std::io::Error::other)?;

    let pool = create_pool(&settings.database_url).map_err(std::io::Error::other)?;
    run_migrations(&pool)?;

    let ports = Ports::postgres(pool, &settings)?;
    let (state, reconciler) = AppState::assemble(ports, &settings);

    let interval = reconciler.interval();
    actix_web::rt::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            reconciler.run_once().await;
        }
    });

    log::info!(
        "Starting server at http://{}:{}",
        settings.host,
        settings.port
    );

    build_server(state, &settings.host, settings.port)?.await
}
