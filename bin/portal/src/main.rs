use campus_desk_portal::{Portal, PortalConfig, terminal};
use std::process::ExitCode;
use tokio::io::BufReader;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ExitCode {
    // Logs go to stderr so they don't interleave with the terminal surface.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = match PortalConfig::from_env() {
        Ok(config) => config,
        Err(report) => {
            tracing::error!(error = %report.current_context(), "failed to load configuration");
            return ExitCode::FAILURE;
        }
    };
    tracing::info!(
        identity = config.identity.is_some(),
        bot = config.bot.is_some(),
        "Loaded configuration"
    );

    let mut portal = Portal::from_config(&config);
    let input = BufReader::new(tokio::io::stdin());
    let output = tokio::io::stdout();

    match terminal::run(&mut portal, input, output).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "terminal I/O failed");
            ExitCode::FAILURE
        }
    }
}
