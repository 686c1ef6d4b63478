use std::future;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    persona::telemetry::setup_tracing();

    let state = persona::initialize_state().await?;
    let recorder = persona::telemetry::setup_metrics_recorder()?;

    let app = persona::app(state).route(
        "/metrics",
        axum::routing::get(move || future::ready(recorder.render())),
    );

    let port = std::env::var("PORT")
        .ok()
        .and_then(|port| port.parse::<u16>().ok())
        .unwrap_or(8080);
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    tracing::info!(%port, "server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "cannot install ^C handler");
    }
}
