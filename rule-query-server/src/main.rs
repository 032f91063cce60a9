use anyhow::Context;
use rule_query_core::ServiceConfig;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServiceConfig::from_env().context("failed to load configuration")?;

    if let Err(err) =
        rule_query_core::logging::init_tracing(Some(&config.log_level), Some(&config.log_file))
    {
        eprintln!("failed to initialise tracing: {err}");
    }

    info!(
        order_status_url = %config.upstream.order_status_url,
        purpose_url = %config.upstream.purpose_url,
        timeout_ms = config.upstream.timeout.as_millis() as u64,
        log_file = %config.log_file.display(),
        "starting rule-query-server"
    );

    let server = rule_query_server::build_server(&config.upstream)?;
    if let Err(err) = server.run_stdio().await {
        error!(error = %err, "tool server terminated with error");
        return Err(err);
    }

    Ok(())
}
