use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use rule_query_core::config::DEFAULT_LOG_FILE;

mod launch;
mod logview;

use logview::LogViewerError;

#[derive(Parser)]
#[command(name = "rule-query-logs")]
#[command(about = "View the rule query server log, or launch the server", long_about = None)]
struct Cli {
    /// Log file written by the tool server
    #[arg(long, global = true, env = "RULE_QUERY_LOG_FILE", default_value = DEFAULT_LOG_FILE)]
    log_file: PathBuf,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show recent lines and keep following the log (Ctrl-C to stop)
    Tail {
        /// Number of existing lines to show first
        #[arg(short = 'n', long, default_value_t = 20)]
        lines: usize,
        /// Poll interval in milliseconds
        #[arg(long, default_value_t = 500)]
        interval_ms: u64,
    },
    /// Show the last lines of the log
    Last {
        /// Number of lines to show
        #[arg(default_value_t = 50)]
        lines: usize,
    },
    /// Show the whole log
    All,
    /// Empty the log file
    Clear,
    /// Run the tool server in the foreground
    Run {
        #[arg(long, env = "RULE_QUERY_SERVER_BIN", default_value = "rule-query-server")]
        server_bin: String,
    },
    /// Start the server and send a handshake, tools/list and one tool call
    Test {
        #[arg(long, env = "RULE_QUERY_SERVER_BIN", default_value = "rule-query-server")]
        server_bin: String,
        /// Order used for the fetch_order_status call
        #[arg(long, default_value = "ST-9012")]
        order_id: String,
        /// Seconds to wait for each reply
        #[arg(long, default_value_t = 30)]
        timeout_secs: u64,
    },
}

#[tokio::main]
async fn main() -> Result<(), LogViewerError> {
    let cli = Cli::parse();

    if let Err(err) = rule_query_core::logging::init_tracing(Some("warn"), None) {
        eprintln!("failed to initialise tracing: {err}");
    }

    match cli.command {
        Commands::Tail { lines, interval_ms } => {
            logview::follow(&cli.log_file, lines, Duration::from_millis(interval_ms.max(50)))
                .await?;
        }
        Commands::Last { lines } => {
            let tail = logview::last_lines(&cli.log_file, lines)?;
            logview::print_lines(tail.iter().map(String::as_str));
        }
        Commands::All => {
            let contents = logview::read_all(&cli.log_file)?;
            logview::print_lines(contents.lines());
        }
        Commands::Clear => {
            logview::clear(&cli.log_file)?;
            println!("cleared {}", cli.log_file.display());
        }
        Commands::Run { server_bin } => {
            launch::run_server(&server_bin, &cli.log_file).await?;
        }
        Commands::Test {
            server_bin,
            order_id,
            timeout_secs,
        } => {
            launch::test_server(
                &server_bin,
                &cli.log_file,
                &order_id,
                Duration::from_secs(timeout_secs.max(1)),
            )
            .await?;
        }
    }

    Ok(())
}
