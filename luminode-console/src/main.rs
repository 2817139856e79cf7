use std::sync::Arc;

use luminode_console::configs::Settings;
use luminode_console::run;

#[tokio::main]
async fn main() {
    let settings = Arc::new(Settings::new().expect("Failed to load settings."));

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            let level = settings.logger.level.as_str();

            format!("luminode_console={level},luminode_core={level}").into()
        }))
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(&settings).await {
        tracing::error!("console stopped: {}", e);
        std::process::exit(1);
    }
}
