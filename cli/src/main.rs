//! attest: command line entry point.

use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::Parser;

use attest_client::{AttestContext, ClientConfig};
use attest_crypto::digest_reader;
use attest_types::{NetworkId, SubjectHash};
use attest_utils::LogFormat;

#[derive(Parser)]
#[command(name = "attest", about = "Record and verify content hashes on a ledger")]
struct Cli {
    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "ATTEST_CONFIG")]
    config: Option<PathBuf>,

    /// Network to connect to (see `attest networks`).
    #[arg(long, env = "ATTEST_NETWORK")]
    network: Option<String>,

    /// Per-endpoint connection timeout in milliseconds.
    #[arg(long, env = "ATTEST_PER_ENDPOINT_TIMEOUT_MS")]
    per_endpoint_timeout_ms: Option<u64>,

    /// Overall connection timeout in milliseconds.
    #[arg(long, env = "ATTEST_OVERALL_TIMEOUT_MS")]
    overall_timeout_ms: Option<u64>,

    /// Number of recent blocks scanned by `verify`.
    #[arg(long, env = "ATTEST_SCAN_DEPTH")]
    scan_depth: Option<u32>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "ATTEST_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "ATTEST_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// List known networks and their endpoints in failover order.
    Networks,

    /// Print the subject hash of a file.
    Hash { file: PathBuf },

    /// Look up the record for a hash on the selected network.
    Verify {
        /// Hex subject hash (64 characters).
        #[arg(long, conflicts_with = "file", required_unless_present = "file")]
        hash: Option<String>,

        /// File whose content hash to look up.
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Print the current chain head of the selected network.
    Head,
}

impl Cli {
    /// File settings (or defaults), then flags and environment on top.
    fn config(&self) -> anyhow::Result<ClientConfig> {
        let mut config = match &self.config {
            Some(path) => ClientConfig::from_toml_file(path)?,
            None => ClientConfig::default(),
        };
        if let Some(network) = &self.network {
            config.network = Some(NetworkId::new(network.as_str())?);
        }
        if let Some(ms) = self.per_endpoint_timeout_ms {
            config.per_endpoint_timeout_ms = ms;
        }
        if let Some(ms) = self.overall_timeout_ms {
            config.overall_timeout_ms = ms;
        }
        if let Some(depth) = self.scan_depth {
            config.scan_depth = depth;
        }
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
        if let Some(format) = self.log_format {
            config.log_format = format;
        }
        Ok(config)
    }
}

fn hash_file(path: &Path) -> anyhow::Result<SubjectHash> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    digest_reader(file).with_context(|| format!("reading {}", path.display()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.config()?;
    attest_utils::init_logging(config.log_format, &config.log_level)?;
    if let Some(path) = &cli.config {
        tracing::info!("Loaded config from {}", path.display());
    }

    // Signing is delegated to an external provider; the CLI only reads.
    let ctx = AttestContext::websocket(config, None)?;

    match cli.command {
        Command::Networks => {
            let default = ctx.registry().default_network();
            for network in ctx.registry().networks() {
                let marker = if &network.id == default { "*" } else { " " };
                println!("{marker} {:<14} {}", network.id.as_str(), network.display_name);
                for endpoint in &network.endpoints {
                    println!("    {endpoint}");
                }
            }
        }
        Command::Hash { file } => {
            println!("{}", hash_file(&file)?);
        }
        Command::Verify { hash, file } => {
            let subject = match (hash, file) {
                (Some(hex), _) => hex.parse::<SubjectHash>()?,
                (None, Some(path)) => hash_file(&path)?,
                (None, None) => bail!("either --hash or --file is required"),
            };
            let conn = ctx.start().await?;
            match ctx.service().verify(&subject).await? {
                Some(record) => println!("{}", serde_json::to_string_pretty(&record)?),
                None => bail!(
                    "no record for {subject} in the last {} blocks of {}",
                    ctx.config().scan_depth,
                    conn.network_id()
                ),
            }
            ctx.service().disconnect().await;
        }
        Command::Head => {
            let conn = ctx.start().await?;
            let head = ctx.service().chain_head().await?;
            println!("{} #{} {}", conn.network_id(), head.number, head.hash);
            ctx.service().disconnect().await;
        }
    }

    Ok(())
}
