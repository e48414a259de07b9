use lotusx_futures::exchanges::binance_futures::types::{decode_event, TickerUpdate};
use lotusx_futures::{ExchangeConfig, UsdFuturesAccess};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Credentials are optional; without them only public calls work
    let config = load_config();
    let mut access = UsdFuturesAccess::new(config)?;

    println!("Fetching 24h ticker...");
    match access.api().get_24hr_ticker("BTCUSDT").await {
        Ok(tickers) => {
            for ticker in tickers {
                println!(
                    "{}: last {} (weighted avg {})",
                    ticker.symbol, ticker.last_price, ticker.weighted_avg_price
                );
            }
        }
        Err(e) => println!("Error fetching ticker: {}", e),
    }

    access.open_stream().await?;
    let subscription = access.subscribe_symbol_ticker("BTCUSDT").await?;
    println!(
        "Subscribed to {} (id {})",
        subscription.stream_name(),
        subscription.id
    );

    let (router, mut outputs) = access.spawn_router(64)?;

    for _ in 0..5 {
        let Some(frame) = outputs.prices.recv().await else {
            break;
        };
        match decode_event::<TickerUpdate>(&frame) {
            Ok(update) => println!("{} last price {}", update.symbol, update.last_price),
            Err(e) => println!("Undecodable ticker: {}", e),
        }
    }

    access.close_stream().await?;
    let reason = router.await?;
    println!("Router finished: {}", reason);

    Ok(())
}

fn load_config() -> ExchangeConfig {
    #[cfg(feature = "env-file")]
    let loaded = ExchangeConfig::from_env_file("BINANCE_FUTURES");
    #[cfg(not(feature = "env-file"))]
    let loaded = ExchangeConfig::from_env("BINANCE_FUTURES");

    loaded.unwrap_or_else(|_| ExchangeConfig::read_only().testnet(true))
}
