use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{anyhow, Context};
use clap::{Args, Parser, Subcommand};
use serde_json::{json, Value};
use tracing::info;
use tracing::level_filters::LevelFilter;

use nodelink::model::{
    ConnectPeerRequest, CreateOfferRequest, InvoiceRequest, KeysendRequest, OfferAmount,
    OpenChannelRequest, PayInvoiceRequest, SetFeesRequest, TransactionRequest,
    VerifyMessageRequest,
};
use nodelink::{Backend, Capability, EndpointConfig, NodeVersions, SharedSettings};
use nodelink_cln::ClnRest;
use nodelink_util::config::{get_rune, FileConfig, DEFAULT_PORT};
use nodelink_util::observability::init_tracing_subscriber;
use nodelink_util::{config_path_from_env, log_dir_from_env, rune_from_env, tls_verify_disabled};

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    #[clap(short = 'f', long, help = "configuration file", value_name = "FILE", value_parser)]
    config: Option<PathBuf>,

    #[clap(long, help = "node REST host, e.g. https://node.local", value_parser)]
    host: Option<String>,

    #[clap(short, long, help = "node REST port", value_parser)]
    port: Option<u16>,

    #[clap(long, help = "rune", value_parser, conflicts_with = "rune_file")]
    rune: Option<String>,

    #[clap(long, help = "file containing the rune", value_name = "FILE", value_parser)]
    rune_file: Option<PathBuf>,

    #[clap(long, help = "accept self-signed node certificates")]
    no_tls_verify: bool,

    #[clap(
        long,
        help = "set the logging level",
        value_name = "LEVEL",
        value_parser = ["off", "error", "warn", "info", "debug", "trace"],
    )]
    log_level: Option<String>,

    #[clap(long, help = "also write logs to DIR/nodelink.log", value_name = "DIR", value_parser)]
    log_dir: Option<PathBuf>,

    #[clap(subcommand)]
    command: Commands,
}

impl Cli {
    fn file_config(&self) -> anyhow::Result<FileConfig> {
        match self.config.clone().or_else(config_path_from_env) {
            Some(path) => FileConfig::load(&path),
            None => Ok(FileConfig::default()),
        }
    }

    /// Command line flags override the config file
    fn endpoint(&self, file: &FileConfig) -> anyhow::Result<EndpointConfig> {
        let host = self
            .host
            .clone()
            .or_else(|| file.host.clone())
            .ok_or_else(|| anyhow!("--host or a config file host must be set"))?;
        let port = self.port.or(file.port).unwrap_or(DEFAULT_PORT);
        let rune = if self.rune.is_some() || self.rune_file.is_some() {
            get_rune(self.rune.clone(), self.rune_file.clone(), None)?
        } else {
            get_rune(file.rune.clone(), file.rune_file.clone(), rune_from_env())?
        };
        let tls_verify =
            !self.no_tls_verify && !tls_verify_disabled() && file.tls_verify.unwrap_or(true);
        Ok(EndpointConfig::new(host, Some(port), rune).with_tls_verify(tls_verify))
    }

    fn log_level(&self, file: &FileConfig) -> anyhow::Result<LevelFilter> {
        let level = self.log_level.as_deref().or(file.log_level.as_deref()).unwrap_or("info");
        LevelFilter::from_str(level).with_context(|| format!("invalid log level {:?}", level))
    }

    fn log_dir(&self, file: &FileConfig) -> Option<PathBuf> {
        self.log_dir.clone().or_else(|| file.log_dir.clone()).or_else(log_dir_from_env)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Node identity and status
    #[clap(name = "info")]
    Info,
    /// Which features the connected node supports
    #[clap(name = "capabilities")]
    Capabilities,
    /// Active channels
    #[clap(name = "channels")]
    Channels,
    /// On-chain balance
    #[clap(name = "balance")]
    Balance,
    /// Off-chain balance
    #[clap(name = "lightning-balance")]
    LightningBalance,
    /// Wallet outputs
    #[clap(name = "transactions")]
    Transactions,
    /// Spendable outputs
    #[clap(name = "utxos")]
    Utxos,
    /// Outgoing payments
    #[clap(name = "payments")]
    Payments,
    /// Issued invoices
    #[clap(name = "invoices")]
    Invoices,
    /// Routing fees earned
    #[clap(name = "fees")]
    Fees,
    /// Fresh on-chain address
    #[clap(name = "new-address")]
    NewAddress,
    /// Send on-chain
    #[clap(name = "send-coins")]
    SendCoins(SendCoinsArgs),
    /// Create an invoice
    #[clap(name = "invoice")]
    Invoice {
        /// satoshis
        amount: u64,
        #[clap(long, default_value = "")]
        memo: String,
        #[clap(long, default_value_t = 3600)]
        expiry: u64,
    },
    /// Decode a BOLT11 invoice or BOLT12 string
    #[clap(name = "decode")]
    Decode { payment_request: String },
    /// Pay a BOLT11 invoice
    #[clap(name = "pay")]
    Pay {
        payment_request: String,
        /// satoshis, for invoices without an amount
        #[clap(long)]
        amount: Option<u64>,
        #[clap(long)]
        max_fee_percent: Option<f64>,
    },
    /// Spontaneous payment
    #[clap(name = "keysend")]
    Keysend {
        pubkey: String,
        /// satoshis
        amount: u64,
        #[clap(long)]
        max_fee_percent: Option<f64>,
    },
    /// Connect to a peer
    #[clap(name = "connect")]
    Connect { pubkey: String, host: String },
    /// Open a channel
    #[clap(name = "open-channel")]
    OpenChannel(OpenChannelArgs),
    /// Close a channel
    #[clap(name = "close-channel")]
    CloseChannel { channel_id: String },
    /// Update routing fees of one channel, or all with --all
    #[clap(name = "set-fees")]
    SetFees {
        #[clap(long, required_unless_present = "all")]
        channel_id: Option<String>,
        #[clap(long, conflicts_with = "channel_id")]
        all: bool,
        #[clap(long)]
        base_fee_msat: u64,
        #[clap(long)]
        fee_rate_ppm: u64,
    },
    /// Sign a message with the node key
    #[clap(name = "sign")]
    Sign { message: String },
    /// Verify a message signature
    #[clap(name = "verify")]
    Verify {
        message: String,
        signature: String,
        #[clap(long)]
        pubkey: Option<String>,
    },
    /// Answer an LNURL-auth challenge
    #[clap(name = "lnurl-auth")]
    LnurlAuth { challenge: String },
    /// BOLT12 offers
    #[clap(name = "offers")]
    Offers(OffersArgs),
}

#[derive(Debug, Args)]
struct SendCoinsArgs {
    addr: String,
    /// satoshis
    #[clap(long, required_unless_present = "all")]
    amount: Option<u64>,
    /// sweep the whole wallet
    #[clap(long, conflicts_with = "amount")]
    all: bool,
    #[clap(long, default_value = "1")]
    sat_per_vbyte: String,
    /// spend only this outpoint (txid:vout), repeatable
    #[clap(long)]
    utxo: Vec<String>,
}

#[derive(Debug, Args)]
struct OpenChannelArgs {
    pubkey: String,
    /// satoshis
    amount: u64,
    #[clap(long, default_value = "1")]
    sat_per_vbyte: String,
    #[clap(long)]
    private: bool,
    #[clap(long)]
    min_confs: Option<u32>,
    /// fund from this outpoint (txid:vout), repeatable
    #[clap(long)]
    utxo: Vec<String>,
}

#[derive(Debug, Args)]
struct OffersArgs {
    #[clap(subcommand)]
    command: Option<OffersCommands>,
}

#[derive(Debug, Subcommand)]
enum OffersCommands {
    /// create an offer; any amount unless --amount is given
    #[clap(name = "create")]
    Create {
        #[clap(long)]
        amount: Option<u64>,
        #[clap(long)]
        description: Option<String>,
        #[clap(long)]
        label: Option<String>,
        #[clap(long)]
        single_use: bool,
    },
    /// disable an offer
    #[clap(name = "disable")]
    Disable { offer_id: String },
    /// request an invoice from an offer
    #[clap(name = "fetch-invoice")]
    FetchInvoice { offer: String, amount: u64 },
}

async fn capabilities(backend: &dyn Backend) -> anyhow::Result<Value> {
    let info = backend.get_node_info().await?;
    let field = |name: &str| info.get(name).and_then(Value::as_str).map(str::to_string);
    let node = NodeVersions::new(field("version"), field("api_version"));
    let mut supported = serde_json::Map::new();
    for capability in Capability::ALL {
        let value = backend.supports(capability, &node).resolve().await;
        supported.insert(capability.to_string(), json!(value));
    }
    Ok(Value::Object(supported))
}

async fn run(command: Commands, backend: &dyn Backend) -> anyhow::Result<Value> {
    let value = match command {
        Commands::Info => backend.get_my_node_info().await?,
        Commands::Capabilities => capabilities(backend).await?,
        Commands::Channels => serde_json::to_value(backend.get_channels().await?)?,
        Commands::Balance => serde_json::to_value(backend.get_blockchain_balance().await?)?,
        Commands::LightningBalance =>
            serde_json::to_value(backend.get_lightning_balance().await?)?,
        Commands::Transactions => serde_json::to_value(backend.get_transactions().await?)?,
        Commands::Utxos => backend.get_utxos().await?,
        Commands::Payments => serde_json::to_value(backend.get_payments().await?)?,
        Commands::Invoices => backend.get_invoices().await?,
        Commands::Fees => serde_json::to_value(backend.get_fees().await?)?,
        Commands::NewAddress => backend.get_new_address().await?,
        Commands::SendCoins(args) => {
            let request = TransactionRequest {
                addr: args.addr,
                amount: args.amount.unwrap_or(0),
                sat_per_vbyte: args.sat_per_vbyte,
                utxos: if args.utxo.is_empty() { None } else { Some(args.utxo) },
                send_all: args.all,
            };
            backend.send_coins(&request).await?
        }
        Commands::Invoice { amount, memo, expiry } =>
            backend.create_invoice(&InvoiceRequest { memo, value: amount, expiry }).await?,
        Commands::Decode { payment_request } =>
            backend.decode_payment_request(&payment_request).await?,
        Commands::Pay { payment_request, amount, max_fee_percent } => {
            let request = PayInvoiceRequest { payment_request, amt: amount, max_fee_percent };
            backend.pay_lightning_invoice(&request).await?
        }
        Commands::Keysend { pubkey, amount, max_fee_percent } => {
            let request = KeysendRequest { pubkey, amt: amount, max_fee_percent };
            backend.send_keysend(&request).await?
        }
        Commands::Connect { pubkey, host } =>
            backend.connect_peer(&ConnectPeerRequest { pubkey, host }).await?,
        Commands::OpenChannel(args) => {
            let request = OpenChannelRequest {
                node_pubkey: args.pubkey,
                satoshis: args.amount,
                sat_per_vbyte: args.sat_per_vbyte,
                private: args.private,
                min_confs: args.min_confs,
                utxos: args.utxo,
            };
            backend.open_channel(&request).await?
        }
        Commands::CloseChannel { channel_id } => backend.close_channel(&channel_id).await?,
        Commands::SetFees { channel_id, all, base_fee_msat, fee_rate_ppm } => {
            let request =
                SetFeesRequest { global: all, channel_id, base_fee_msat, fee_rate_ppm };
            backend.set_fees(&request).await?
        }
        Commands::Sign { message } => serde_json::to_value(backend.sign_message(&message).await?)?,
        Commands::Verify { message, signature, pubkey } => {
            let request = VerifyMessageRequest { msg: message, signature, pubkey };
            serde_json::to_value(backend.verify_message(&request).await?)?
        }
        Commands::LnurlAuth { challenge } =>
            serde_json::to_value(backend.lnurl_auth(&challenge).await?)?,
        Commands::Offers(offers_args) => match offers_args.command {
            None => backend.list_offers().await?,
            Some(OffersCommands::Create { amount, description, label, single_use }) => {
                let request = CreateOfferRequest {
                    description,
                    label,
                    single_use,
                    amount: amount.map_or(OfferAmount::Any, OfferAmount::Sat),
                };
                backend.create_offer(&request).await?
            }
            Some(OffersCommands::Disable { offer_id }) => backend.disable_offer(&offer_id).await?,
            Some(OffersCommands::FetchInvoice { offer, amount }) =>
                backend.fetch_invoice_from_offer(&offer, amount).await?,
        },
    };
    Ok(value)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let file_config = cli.file_config()?;
    let log_dir = cli.log_dir(&file_config);
    let _log_guard =
        init_tracing_subscriber(log_dir.as_deref(), "nodelink", cli.log_level(&file_config)?)
            .map_err(|e| anyhow!("initializing logging: {}", e))?;

    let endpoint = cli.endpoint(&file_config)?;
    info!("connecting to {:?}", endpoint);
    let settings = Arc::new(SharedSettings::new(endpoint));
    let backend: Arc<dyn Backend> = Arc::new(ClnRest::new(settings)?);
    info!("using backend {}", backend.name());

    let response = run(cli.command, backend.as_ref()).await?;
    println!("{}", serde_json::to_string_pretty(&response)?);

    Ok(())
}
