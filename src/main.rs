use clap::{Parser, Subcommand, ValueEnum};
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;
use zapshift::application::marketplace::{CheckoutSettings, Marketplace};
use zapshift::config::Config;
use zapshift::domain::ports::{PaymentGatewayBox, Stores};
use zapshift::infrastructure::sandbox_gateway::SandboxGateway;
use zapshift::infrastructure::token::HmacTokenVerifier;
use zapshift::interfaces::csv::payment_writer::PaymentWriter;
use zapshift::interfaces::script::runner::ScriptRunner;
use zapshift::telemetry;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Replay a JSON-lines command script and print one result per command
    Run {
        /// Input script, one JSON command per line
        script: PathBuf,

        /// Path to persistent database (optional). If provided, uses RocksDB.
        #[arg(long)]
        db_path: Option<PathBuf>,

        /// Checkout provider
        #[arg(long, value_enum, default_value_t = GatewayKind::Sandbox)]
        gateway: GatewayKind,
    },
    /// Write payment history as CSV
    ExportPayments {
        /// Bearer token of the caller
        #[arg(long)]
        token: String,

        /// Only payments of this customer (must be the caller)
        #[arg(long, conflicts_with = "all")]
        email: Option<String>,

        /// Every payment on record (admin only)
        #[arg(long)]
        all: bool,

        /// Path to persistent database (optional). If provided, uses RocksDB.
        #[arg(long)]
        db_path: Option<PathBuf>,
    },
    /// Print a bearer token for an email, signed with the configured secret
    IssueToken { email: String },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum GatewayKind {
    Sandbox,
    Stripe,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    telemetry::init_tracing();

    let cli = Cli::parse();
    let config = Config::from_env().into_diagnostic()?;
    let verifier = HmacTokenVerifier::new(&config.token_secret, config.token_ttl);

    match cli.command {
        Command::IssueToken { email } => {
            println!("{}", verifier.issue(&email));
        }
        Command::Run {
            script,
            db_path,
            gateway,
        } => {
            let stores = open_stores(db_path)?;
            let (gateway, sandbox) = build_gateway(gateway, &config)?;
            let marketplace = Marketplace::new(
                stores,
                gateway,
                Box::new(verifier),
                CheckoutSettings::from(&config),
            );
            marketplace
                .bootstrap_admins(&config.admin_emails)
                .await
                .into_diagnostic()?;

            let file = File::open(script).into_diagnostic()?;
            let stdout = io::stdout();
            ScriptRunner::new(&marketplace, sandbox)
                .run(BufReader::new(file), stdout.lock())
                .await
                .into_diagnostic()?;
        }
        Command::ExportPayments {
            token,
            email,
            all,
            db_path,
        } => {
            let stores = open_stores(db_path)?;
            let marketplace = Marketplace::new(
                stores,
                Box::new(SandboxGateway::new()),
                Box::new(verifier),
                CheckoutSettings::from(&config),
            );
            marketplace
                .bootstrap_admins(&config.admin_emails)
                .await
                .into_diagnostic()?;

            let payments = if all {
                marketplace.list_all_payments(&token).await
            } else {
                marketplace.list_payments(&token, email.as_deref()).await
            }
            .into_diagnostic()?;

            let stdout = io::stdout();
            let mut writer = PaymentWriter::new(stdout.lock());
            writer.write_payments(&payments).into_diagnostic()?;
        }
    }

    Ok(())
}

#[cfg(feature = "storage-rocksdb")]
fn open_stores(db_path: Option<PathBuf>) -> Result<Stores> {
    use zapshift::infrastructure::rocksdb::RocksDBStore;

    match db_path {
        Some(path) => Ok(RocksDBStore::open(path).into_diagnostic()?.into_stores()),
        None => Ok(Stores::in_memory()),
    }
}

#[cfg(not(feature = "storage-rocksdb"))]
fn open_stores(db_path: Option<PathBuf>) -> Result<Stores> {
    if db_path.is_some() {
        tracing::warn!(
            "Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to in-memory storage."
        );
    }
    Ok(Stores::in_memory())
}

/// Returns the gateway for the marketplace and, for the sandbox, a handle the
/// script runner uses to complete sessions.
fn build_gateway(
    kind: GatewayKind,
    config: &Config,
) -> Result<(PaymentGatewayBox, Option<SandboxGateway>)> {
    match kind {
        GatewayKind::Sandbox => {
            let sandbox = SandboxGateway::new();
            Ok((Box::new(sandbox.clone()), Some(sandbox)))
        }
        GatewayKind::Stripe => stripe_gateway(config).map(|gateway| (gateway, None)),
    }
}

#[cfg(feature = "gateway-stripe")]
fn stripe_gateway(config: &Config) -> Result<PaymentGatewayBox> {
    use zapshift::infrastructure::stripe::StripeGateway;

    let key = config
        .stripe_secret_key
        .clone()
        .ok_or_else(|| miette::miette!("STRIPE_SECRET_KEY is required for --gateway stripe"))?;
    Ok(Box::new(StripeGateway::new(key).into_diagnostic()?))
}

#[cfg(not(feature = "gateway-stripe"))]
fn stripe_gateway(_config: &Config) -> Result<PaymentGatewayBox> {
    Err(miette::miette!(
        "--gateway stripe requires the 'gateway-stripe' feature"
    ))
}
