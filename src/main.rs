//! md-mcp: MCP server that appends markdown files to Notion pages.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use md_mcp::{Config, McpServer, McpSession, DEFAULT_API_URL, DEFAULT_NOTION_VERSION};

/// Command-line options. Every option can also be set from the environment.
#[derive(Parser)]
#[command(name = "md-mcp", version, about = "MCP server for appending markdown to Notion")]
struct Cli {
    /// Notion integration token
    #[arg(long, env = "NOTION_API_TOKEN", hide_env_values = true)]
    notion_token: Option<String>,

    /// Environment name reported by the config resource
    #[arg(long, env = "MD_MCP_ENV", default_value = "development")]
    environment: String,

    /// Notion REST base URL
    #[arg(long, env = "NOTION_API_URL", default_value = DEFAULT_API_URL)]
    notion_api_url: String,

    /// Notion-Version header
    #[arg(long, env = "NOTION_VERSION", default_value = DEFAULT_NOTION_VERSION)]
    notion_version: String,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl std::fmt::Debug for Cli {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cli")
            .field("notion_token", &self.notion_token.as_ref().map(|_| "<redacted>"))
            .field("environment", &self.environment)
            .field("notion_api_url", &self.notion_api_url)
            .field("notion_version", &self.notion_version)
            .field("verbose", &self.verbose)
            .finish()
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "md_mcp=debug" } else { "md_mcp=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    // stdout carries the protocol; logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config {
        notion_token: cli.notion_token,
        environment: cli.environment,
        notion_api_url: cli.notion_api_url,
        notion_version: cli.notion_version,
    };

    if !config.has_notion_token() {
        tracing::warn!("NOTION_API_TOKEN is not set; Notion tools will fail until it is");
    }

    let server = McpServer::new(McpSession::new(config));
    tracing::info!("Markdown MCP Server is running...");

    if let Err(e) = server.run().await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_token() {
        let cli = Cli::parse_from(["md-mcp", "--notion-token", "secret_cli"]);
        let debug = format!("{:?}", cli);
        assert!(!debug.contains("secret_cli"));
        assert!(debug.contains("<redacted>"));
    }
}
