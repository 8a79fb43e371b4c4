use anyhow::Result;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tracing::{info, warn, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use bitstamp_trader::exchange::BITSTAMP_PAIR;
use bitstamp_trader::types::LimitOrder;
use bitstamp_trader::{ExchangeSpecification, TradeService};

#[derive(Parser)]
#[command(name = "bitstamp-trader")]
#[command(version = "0.1.0")]
#[command(about = "Trade on a Bitstamp account through the private API", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, default_value = "bitstamp.toml")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List open orders
    OpenOrders,
    /// Place a limit buy order
    Buy {
        /// Amount of BTC
        #[arg(short, long)]
        amount: Decimal,
        /// Limit price in USD
        #[arg(short, long)]
        price: Decimal,
    },
    /// Place a limit sell order
    Sell {
        /// Amount of BTC
        #[arg(short, long)]
        amount: Decimal,
        /// Limit price in USD
        #[arg(short, long)]
        price: Decimal,
    },
    /// Cancel an open order
    Cancel {
        /// Exchange order id
        id: String,
    },
    /// Show executed trades
    Trades {
        /// Maximum number of transactions to fetch (default: all)
        #[arg(short, long)]
        limit: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let spec = ExchangeSpecification::load(Some(cli.config.as_str()))?;
    info!("Using {}", spec.ssl_uri);
    let service = TradeService::from_specification(&spec)?;

    match cli.command {
        Commands::OpenOrders => {
            let open = service.get_open_orders().await?;
            if open.is_empty() {
                println!("No open orders");
            }
            for order in open {
                println!("{}", order);
            }
        }
        Commands::Buy { amount, price } => {
            let order = LimitOrder::bid(amount, BITSTAMP_PAIR, price);
            let id = service.place_limit_order(&order).await?;
            println!("Placed buy order {}", id);
        }
        Commands::Sell { amount, price } => {
            let order = LimitOrder::ask(amount, BITSTAMP_PAIR, price);
            let id = service.place_limit_order(&order).await?;
            println!("Placed sell order {}", id);
        }
        Commands::Cancel { id } => {
            if service.cancel_order(&id).await? {
                println!("Order {} cancelled", id);
            } else {
                warn!("Exchange did not confirm cancellation of order {}", id);
            }
        }
        Commands::Trades { limit } => {
            let trades = service.get_trade_history(limit).await?;
            println!("{} trades", trades.len());
            for trade in trades {
                println!("{}", trade);
            }
        }
    }

    Ok(())
}
