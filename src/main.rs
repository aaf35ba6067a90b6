use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use postsmith::backend::openai::{OpenAiConnector, http_client};
use postsmith::config::{ModelConfig, setup_logging};
use tracing::error;

#[tokio::main(flavor = "multi_thread")]
async fn main() {
    let cli = postsmith::cli::CliOptions::parse();

    if setup_logging(cli.debug).is_err() {
        return;
    }

    let http = match http_client(Duration::from_secs(cli.request_timeout_secs)) {
        Ok(http) => http,
        Err(err) => {
            error!("HTTP client setup error: {}", err);
            return;
        }
    };
    let connector = Arc::new(OpenAiConnector::new(http, &cli.openai_base_url));

    if let Err(err) = postsmith::web::setup_server(
        &cli.listen_address,
        cli.port,
        connector,
        ModelConfig::from(&cli),
    )
    .await
    {
        error!("Application error: {}", err);
    }
}
