use anyhow::{Context, Result, bail};
use clap::Parser;
use resolvepay_mcp::config::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};
use resolvepay_mcp::connector::{Connector, tool_definitions};
use resolvepay_mcp::http::{DEFAULT_CALLS_PER_SECOND, DEFAULT_MAX_RETRIES};
use resolvepay_mcp::mcp::StdioServer;
use resolvepay_mcp::ConnectorConfig;

/// resolvepay-mcp - ResolvePay tools for MCP clients
///
/// Exposes ResolvePay customer management and credit checks as MCP tools.
///
/// Credentials are read from RESOLVEPAY_MERCHANT_ID and RESOLVEPAY_API_KEY
/// when not given on the command line.
///
/// Examples:
///   resolvepay-mcp serve                                     # Run the stdio server
///   resolvepay-mcp call get_customer --args '{"customer_id": "cus_1"}'
#[derive(Parser, Debug)]
#[command(author, version = env!("RESOLVEPAY_MCP_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// ResolvePay merchant ID
    #[arg(long, env = "RESOLVEPAY_MERCHANT_ID", global = true, hide_env_values = true)]
    merchant_id: Option<String>,

    /// ResolvePay API key
    #[arg(long, env = "RESOLVEPAY_API_KEY", global = true, hide_env_values = true)]
    api_key: Option<String>,

    /// API base URL
    #[arg(long, env = "RESOLVEPAY_BASE_URL", value_name = "URL", global = true, default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Request timeout in seconds
    #[arg(long, env = "RESOLVEPAY_TIMEOUT", value_name = "SECS", global = true, default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout: u64,

    /// Retries for rate limits, server errors and connection failures
    #[arg(long, env = "RESOLVEPAY_MAX_RETRIES", global = true, default_value_t = DEFAULT_MAX_RETRIES)]
    max_retries: u32,

    /// Maximum calls per second (0 disables limiting)
    #[arg(long, env = "RESOLVEPAY_RATE_LIMIT", global = true, default_value_t = DEFAULT_CALLS_PER_SECOND)]
    rate_limit: u32,

    /// Verbose logging on stderr
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Serve tools over MCP on stdin/stdout
    Serve,

    /// Print the tool catalog as JSON
    Tools,

    /// Invoke a single tool and print its result
    Call(CallArgs),
}

#[derive(clap::Args, Debug)]
struct CallArgs {
    /// Tool name, e.g. "get_customer"
    #[arg(value_name = "TOOL")]
    tool: String,

    /// Tool arguments as a JSON object
    #[arg(long, value_name = "JSON", default_value = "{}")]
    args: String,
}

impl Cli {
    fn connector_config(&self) -> Result<ConnectorConfig> {
        let config = ConnectorConfig::new(
            self.merchant_id.clone().unwrap_or_default(),
            self.api_key.clone().unwrap_or_default(),
        )
        .with_base_url(&self.base_url)
        .with_timeout(self.timeout)
        .with_max_retries(self.max_retries)
        .with_rate_limit(self.rate_limit)
        .with_debug_mode(self.debug);

        config
            .validate()
            .context("Invalid ResolvePay configuration")?;
        Ok(config)
    }

    fn connector(&self) -> Result<Connector> {
        Connector::new(self.connector_config()?).context("Failed to create ResolvePay connector")
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let default_filter = if cli.debug { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    match &cli.command {
        Commands::Serve => {
            let server = StdioServer::new(cli.connector()?);
            server.run().await?;
            server.into_handler().close();
        }
        Commands::Tools => {
            println!("{}", serde_json::to_string_pretty(&tool_definitions())?);
        }
        Commands::Call(args) => {
            let arguments: serde_json::Value =
                serde_json::from_str(&args.args).context("--args must be valid JSON")?;
            let connector = cli.connector()?;
            let result = connector.invoke_tool(&args.tool, &arguments).await;
            connector.close();

            println!("{}", serde_json::to_string_pretty(&result)?);
            if result["success"] == false {
                bail!("{} failed", args.tool);
            }
        }
    }
    Ok(())
}
