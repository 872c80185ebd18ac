#[cfg(feature = "http_api")]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use std::net::SocketAddr;

    use task_scheduler::{Calendar, PlannerConfig, SqliteTaskStore, http_api};

    env_logger::init();

    let config = PlannerConfig::load()?;
    let addr: SocketAddr = config.http_addr.parse()?;

    let calendar = match &config.database_path {
        Some(path) => Calendar::load_from(&SqliteTaskStore::new(path)?)?,
        None => Calendar::new(),
    };

    println!("task-scheduler HTTP API listening on http://{addr}");
    http_api::serve(addr, calendar, config).await?;
    Ok(())
}

#[cfg(not(feature = "http_api"))]
fn main() {
    eprintln!("Rebuild with the `http_api` feature to enable the HTTP server.");
}
