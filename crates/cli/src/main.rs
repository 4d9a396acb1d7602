//! Madma CLI - Terminal storefront and store management.
//!
//! # Usage
//!
//! ```bash
//! # Show the store and whether you own it
//! madma store show
//!
//! # Create the store with your wallet as authority
//! madma store init
//!
//! # List designs as buyers see them, or every design (owner only)
//! madma design list
//! madma design list --all
//!
//! # Add a design priced in SOL
//! madma design create -t "Sunset Tee" -d "Screen printed" -i https://example.com/sunset.png -p 0.25
//!
//! # Buy a design and track the order
//! madma order create <DESIGN> -s "1 Main St, Springfield"
//! madma order list --search springfield --asc
//!
//! # Move an order along (owner only)
//! madma order status <ORDER> shipped
//! ```
//!
//! # Commands
//!
//! - `store` - Show or initialize the store
//! - `design` - List, create, update and toggle designs
//! - `order` - List, place and update orders

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use clap::{Parser, Subcommand};
use madma_core::{OrderStatus, Pubkey};
use madma_storefront::{
    ChainClient, HttpRpcClient, KeypairWallet, ProgramProvider, StorefrontConfig, StorefrontError,
    SystemClock, TracingSink, WalletSigner,
};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "madma")]
#[command(author, version, about = "Madma print-on-demand storefront")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show or initialize the store
    Store {
        #[command(subcommand)]
        action: StoreAction,
    },
    /// Browse and manage designs
    Design {
        #[command(subcommand)]
        action: DesignAction,
    },
    /// Place, list and manage orders
    Order {
        #[command(subcommand)]
        action: OrderAction,
    },
}

#[derive(Subcommand)]
enum StoreAction {
    /// Show authority, design count and earnings
    Show,
    /// Create the store with the connected wallet as authority
    Init,
}

#[derive(Subcommand)]
enum DesignAction {
    /// List designs
    List {
        /// Include unavailable designs (store owner only)
        #[arg(long)]
        all: bool,
    },
    /// Create a new design
    Create {
        #[arg(short, long)]
        title: String,

        #[arg(short, long)]
        description: String,

        #[arg(short, long)]
        image_url: String,

        /// Price in SOL, e.g. 0.25
        #[arg(short, long)]
        price: String,
    },
    /// Update some fields of a design
    Update {
        /// Design address
        design: Pubkey,

        #[arg(short, long)]
        title: Option<String>,

        #[arg(short, long)]
        description: Option<String>,

        #[arg(short, long)]
        image_url: Option<String>,

        /// Price in SOL
        #[arg(short, long)]
        price: Option<String>,

        #[arg(short, long)]
        available: Option<bool>,
    },
    /// Flip whether a design can be bought
    Toggle {
        /// Design address
        design: Pubkey,
    },
}

#[derive(Subcommand)]
enum OrderAction {
    /// List orders
    List {
        /// Every order in the store (store owner only)
        #[arg(long)]
        all: bool,

        /// Match order address or shipping information
        #[arg(short, long, default_value = "")]
        search: String,

        /// Oldest first
        #[arg(long)]
        asc: bool,
    },
    /// Buy a design
    Create {
        /// Design address
        design: Pubkey,

        /// Shipping address and contact details
        #[arg(short, long)]
        shipping: String,
    },
    /// Set the status of an order (store owner only)
    Status {
        /// Order address
        order: Pubkey,

        /// created, pending, shipped, delivered, cancelled or completed
        status: OrderStatus,
    },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match StorefrontConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            #[allow(clippy::print_stderr)]
            {
                eprintln!("Configuration error: {e}");
            }
            std::process::exit(2);
        }
    };

    // Sentry must be initialized before the tracing subscriber
    let _sentry_guard = init_sentry(&config);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "madma_storefront=info,madma_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli, &config).await;

    if let Err(e) = result {
        tracing::debug!("Command failed: {e}");
        let message = e
            .downcast_ref::<StorefrontError>()
            .map_or_else(|| e.to_string(), StorefrontError::user_message);
        #[allow(clippy::print_stderr)]
        {
            eprintln!("{message}");
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: &StorefrontConfig) -> Result<(), Box<dyn std::error::Error>> {
    let wallet = config
        .keypair_path
        .as_deref()
        .map(KeypairWallet::from_file)
        .transpose()?
        .map(|wallet| Arc::new(wallet) as Arc<dyn WalletSigner>);

    let chain = ChainClient::new(HttpRpcClient::new(&config.rpc), config.rpc.chain_settings());
    let provider = ProgramProvider::new(
        chain,
        wallet,
        Arc::new(TracingSink),
        Arc::new(SystemClock),
        config.rpc.cache_ttl,
    );

    match cli.command {
        Commands::Store { action } => match action {
            StoreAction::Show => commands::store::show(&provider).await?,
            StoreAction::Init => commands::store::init(&provider).await?,
        },
        Commands::Design { action } => match action {
            DesignAction::List { all } => commands::designs::list(&provider, all).await?,
            DesignAction::Create {
                title,
                description,
                image_url,
                price,
            } => {
                commands::designs::create(&provider, title, description, image_url, &price)
                    .await?;
            }
            DesignAction::Update {
                design,
                title,
                description,
                image_url,
                price,
                available,
            } => {
                let fields = commands::designs::UpdateFields {
                    title,
                    description,
                    image_url,
                    price,
                    available,
                };
                commands::designs::update(&provider, &design, fields).await?;
            }
            DesignAction::Toggle { design } => {
                commands::designs::toggle(&provider, &design).await?;
            }
        },
        Commands::Order { action } => match action {
            OrderAction::List { all, search, asc } => {
                commands::orders::list(&provider, all, search, asc).await?;
            }
            OrderAction::Create { design, shipping } => {
                commands::orders::create(&provider, &design, shipping).await?;
            }
            OrderAction::Status { order, status } => {
                commands::orders::set_status(&provider, &order, status).await?;
            }
        },
    }
    Ok(())
}
