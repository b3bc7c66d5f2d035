use anyhow::{bail, Context, Result};
use council::{load_config, Council};
use market_data::{CachedSource, MarketDataSource, YahooChartSource};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: council <TICKER> [--config PATH] [--signal NAME [--pair TICKER2]]
       council --list [--config PATH]
       council --init-config PATH";

#[derive(Debug, Default)]
struct Args {
    ticker: Option<String>,
    config: Option<String>,
    signal: Option<String>,
    pair: Option<String>,
    list: bool,
    init_config: Option<String>,
}

fn parse_args() -> Result<Args> {
    let mut args = Args::default();
    let mut raw = std::env::args().skip(1);

    while let Some(arg) = raw.next() {
        match arg.as_str() {
            "--config" => args.config = Some(raw.next().context("--config needs a path")?),
            "--signal" => args.signal = Some(raw.next().context("--signal needs a name")?),
            "--pair" => args.pair = Some(raw.next().context("--pair needs a ticker")?),
            "--init-config" => {
                args.init_config = Some(raw.next().context("--init-config needs a path")?)
            }
            "--list" => args.list = true,
            "-h" | "--help" => {
                println!("{}", USAGE);
                std::process::exit(0);
            }
            flag if flag.starts_with("--") => bail!("unknown option {}\n{}", flag, USAGE),
            ticker => {
                if args.ticker.is_some() {
                    bail!("unexpected argument {}\n{}", ticker, USAGE);
                }
                args.ticker = Some(ticker.to_string());
            }
        }
    }

    if args.pair.is_some() && args.signal.is_none() {
        bail!("--pair only applies with --signal\n{}", USAGE);
    }
    Ok(args)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout stays valid JSON
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = parse_args()?;

    if let Some(path) = &args.init_config {
        council::create_config_template(path)?;
        info!(path = %path, "Wrote configuration template");
        return Ok(());
    }

    let config = load_config(args.config.as_deref())?;

    let yahoo = YahooChartSource::new(
        config.market_data.base_url.clone(),
        config.market_data.request_timeout(),
    )?;
    let source: Arc<dyn MarketDataSource> =
        Arc::new(CachedSource::new(yahoo, &config.market_data.cache()));
    let council = Council::with_source(source, &config)?;

    if args.list {
        println!("{}", serde_json::to_string_pretty(&council.descriptors())?);
        return Ok(());
    }

    let Some(ticker) = args.ticker else {
        bail!("a ticker is required\n{}", USAGE);
    };

    let output = match &args.signal {
        Some(name) => {
            let result = council.run_signal(name, &ticker, args.pair.as_deref()).await?;
            serde_json::to_string_pretty(&result)?
        }
        None => {
            let result = council.run_council(&ticker).await?;
            serde_json::to_string_pretty(&result)?
        }
    };

    println!("{}", output);
    Ok(())
}
