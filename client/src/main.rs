use std::{path::Path, sync::Arc};

use anyhow::Result;
use clap::{Parser, Subcommand};
use log::{info, warn};

use scriptlog_client::{
    config::{defaults, ConfigValidator, Network, ValidatedConfig},
    ClientSettings, DaemonClient, RpcWalletProvider, ScriptClient,
};
use scriptlog_common::{
    config::{
        DEFAULT_CONTRACT_ADDRESS, DEFAULT_FINALIZATION_TIMEOUT_SECS, DEFAULT_POLL_INTERVAL_MS,
        DEFAULT_WALLET_ADDRESS, SAVE_SCRIPT_FEE, SAVE_SCRIPT_MAX_GAS, VERSION,
    },
    contract::get_saved_script_args,
    get_cli_styles,
    logger::{setup_logger, LogConfig},
};

#[derive(Subcommand, Clone, Debug)]
enum Command {
    /// List every saved script
    List,
    /// Save a new script at the next index
    Save {
        /// Script text, surrounding whitespace is trimmed
        text: String,
    },
    /// Show the next script ID
    Counter,
    /// Call an exposed contract function in read-only mode
    Read {
        /// Function name, e.g. get_script_id
        function: String,
        /// Script ID argument
        #[clap(long)]
        index: Option<u64>,
    },
    /// Follow account changes of the connected wallet
    Watch,
}

#[derive(Parser, Clone, Debug)]
#[command(name = "scriptlog", version = VERSION, styles = get_cli_styles())]
#[command(about = "Save and list scripts stored by the script log contract")]
struct CliConfig {
    #[clap(flatten)]
    log: LogConfig,

    /// Network whose public node is used when no node address is set
    #[clap(long, value_enum, default_value_t)]
    network: Network,

    /// Node JSON-RPC address
    #[clap(long)]
    node_address: Option<String>,

    /// Wallet service JSON-RPC address
    #[clap(long, default_value_t = String::from(DEFAULT_WALLET_ADDRESS))]
    wallet_address: String,

    /// Script log contract address
    #[clap(long, default_value_t = String::from(DEFAULT_CONTRACT_ADDRESS))]
    contract_address: String,

    /// Advanced: Request timeout in seconds
    #[clap(long, default_value_t = defaults::REQUEST_TIMEOUT_SECS)]
    request_timeout_secs: u64,

    /// Advanced: Connection timeout in seconds
    #[clap(long, default_value_t = defaults::CONNECTION_TIMEOUT_SECS)]
    connection_timeout_secs: u64,

    /// Maximum wait for a saved script to be final, in seconds
    #[clap(long, default_value_t = DEFAULT_FINALIZATION_TIMEOUT_SECS)]
    finalization_timeout_secs: u64,

    /// Interval between operation status checks, in milliseconds
    #[clap(long, default_value_t = DEFAULT_POLL_INTERVAL_MS)]
    poll_interval_ms: u64,

    /// Read final values instead of candidate ones
    #[clap(long)]
    final_reads: bool,

    /// Max gas of a save operation
    #[clap(long, default_value_t = SAVE_SCRIPT_MAX_GAS)]
    max_gas: u64,

    /// Fee of a save operation
    #[clap(long, default_value_t = SAVE_SCRIPT_FEE)]
    fee: u64,

    /// Enable strict configuration validation
    #[clap(long)]
    strict_validation: bool,

    /// Disable auto-fix of configuration issues
    #[clap(long)]
    no_auto_fix: bool,

    /// JSON File to load the configuration from
    #[clap(long)]
    config_file: Option<String>,

    /// Generate the template at the `config_file` path
    #[clap(long)]
    generate_config_template: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

impl CliConfig {
    fn to_validated_config(&self) -> ValidatedConfig {
        ValidatedConfig {
            log: self.log.clone(),
            network: self.network,
            node_address: self.node_address.clone(),
            wallet_address: self.wallet_address.clone(),
            contract_address: self.contract_address.clone(),
            request_timeout_secs: self.request_timeout_secs,
            connection_timeout_secs: self.connection_timeout_secs,
            finalization_timeout_secs: self.finalization_timeout_secs,
            poll_interval_ms: self.poll_interval_ms,
            final_reads: self.final_reads,
            max_gas: self.max_gas,
            fee: self.fee,
            auto_fix_config: !self.no_auto_fix,
            strict_validation: self.strict_validation,
        }
    }
}

type Client = ScriptClient<DaemonClient, RpcWalletProvider>;

#[tokio::main]
async fn main() -> Result<()> {
    let cli_config = CliConfig::parse();

    if let Some(path) = cli_config.config_file.as_ref() {
        if cli_config.generate_config_template {
            if Path::new(path).exists() {
                eprintln!("Config file already exists at {path}");
                return Ok(());
            }

            ValidatedConfig::generate_template(path)?;
            println!("Configuration template generated at {path}");
            return Ok(());
        }
    }

    let config = if let Some(path) = &cli_config.config_file {
        ValidatedConfig::from_file(path, cli_config.strict_validation, !cli_config.no_auto_fix)?
    } else {
        let mut config = cli_config.to_validated_config();
        ConfigValidator::new(config.strict_validation, config.auto_fix_config)
            .validate(&mut config)?;
        config
    };

    setup_logger(&config.log)?;
    if log::log_enabled!(log::Level::Info) {
        info!("scriptlog v{} using node {}", VERSION, config.node_address());
    }

    let transport = config.to_transport_config();
    let daemon = DaemonClient::with_config(config.node_address(), transport.clone())?;
    let wallets =
        RpcWalletProvider::new(&config.wallet_address, transport, config.poll_interval())?;
    let settings: ClientSettings = config.to_client_settings();
    let client = ScriptClient::new(Arc::new(daemon), Arc::new(wallets), settings);

    match cli_config.command.unwrap_or(Command::List) {
        Command::List => list(&client).await?,
        Command::Save { text } => {
            let address = client.connect().await?;
            println!("Connected with account {address}");

            let operation = client.append_next(&text).await?;
            println!("Script saved in operation {operation}");
            print_scripts(&client.state().await.scripts);
        }
        Command::Counter => {
            println!("{}", client.next_script_id().await?);
        }
        Command::Read { function, index } => {
            let args = index.map(get_saved_script_args).unwrap_or_default();
            let data = client.read_exposed(&function, args).await?;
            println!("{}", String::from_utf8_lossy(&data));
        }
        Command::Watch => {
            let address = client.connect().await?;
            println!("Connected with account {address}, waiting for account changes");
            let applied = client.watch_account_changes().await?;
            info!("Account change stream ended after {} change(s)", applied);
        }
    }

    Ok(())
}

async fn list(client: &Client) -> Result<()> {
    let scripts = client.fetch_all().await?;
    let skipped = client.state().await.skipped_reads;
    if skipped > 0 {
        warn!("{} script(s) could not be read", skipped);
    }
    print_scripts(&scripts);
    Ok(())
}

fn print_scripts(scripts: &[String]) {
    if scripts.is_empty() {
        println!("No scripts yet.");
        return;
    }

    for (i, script) in scripts.iter().enumerate() {
        println!("{:>4}  {}", i, script);
    }
}
