//! Serve command implementation.
//!
//! Starts the HTTP and WebSocket dashboard server.

use salesboard_core::DashboardConfig;
use salesboard_server::ServerConfig;

use crate::colors;

/// Start the dashboard server.
pub async fn execute(
    host: String,
    port: u16,
    max_upload_mb: usize,
    dashboard: DashboardConfig,
) -> anyhow::Result<()> {
    let config = ServerConfig {
        host,
        port,
        dashboard,
        max_upload_bytes: max_upload_mb.saturating_mul(1024 * 1024),
        ..ServerConfig::default()
    };

    println!(
        "\n{}Salesboard Server{} - Interactive Sales Dashboard",
        colors::BOLD,
        colors::RESET
    );
    println!("{}", "─".repeat(50));
    println!(
        "{}  ◆ Server:{} http://{}:{}",
        colors::CYAN,
        colors::RESET,
        config.host,
        config.port
    );
    println!(
        "{}  ◆ Upload:{} POST http://{}:{}/api/sessions?filename=<name>",
        colors::CYAN,
        colors::RESET,
        config.host,
        config.port
    );
    println!(
        "{}  ◆ WebSocket:{} ws://{}:{}/ws?session=<id>",
        colors::CYAN,
        colors::RESET,
        config.host,
        config.port
    );
    println!("{}", "─".repeat(50));
    println!("{}Press Ctrl+C to stop{}", colors::GREEN, colors::RESET);
    println!();

    salesboard_server::serve(config).await?;

    Ok(())
}
