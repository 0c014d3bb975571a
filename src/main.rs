use clap::Parser;
use ledger_gateway::mcp::catalog::list_tools;
use ledger_gateway::services::config::GatewayConfig;
use ledger_gateway::services::logger::{LogLevel, Logger};

#[derive(Debug, Parser)]
#[command(name = "ledger-gateway", version, about = "MCP stdio gateway for the ledger API")]
struct Cli {
    /// Overrides LOG_LEVEL (error, warn, info, debug).
    #[arg(long)]
    log_level: Option<String>,

    /// Print the tool catalog as JSON and exit.
    #[arg(long)]
    list_tools: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if cli.list_tools {
        match serde_json::to_string_pretty(&list_tools()) {
            Ok(text) => println!("{}", text),
            Err(err) => {
                eprintln!("ledger-gateway: {}", err);
                std::process::exit(1);
            }
        }
        return;
    }

    let mut config = match GatewayConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("ledger-gateway: {}", err);
            std::process::exit(2);
        }
    };
    if let Some(raw) = cli.log_level.as_deref() {
        match LogLevel::parse(raw) {
            Some(level) => config.log_level = level,
            None => {
                eprintln!("ledger-gateway: unknown log level '{}'", raw);
                std::process::exit(2);
            }
        }
    }

    let logger = Logger::new("ledger-gateway", config.log_level);
    if let Err(err) = ledger_gateway::mcp::server::run_stdio(config, logger).await {
        eprintln!("ledger-gateway: {}", err);
        std::process::exit(1);
    }
}
