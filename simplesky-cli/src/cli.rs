use anyhow::{Context, anyhow};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use simplesky_core::{Config, LocationQuery, ProviderId, SimpleSky, TimeSpec};
use tracing_subscriber::EnvFilter;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "simplesky", version, about = "Geocode a place and print its weather as JSON")]
pub struct Cli {
    /// Increase log verbosity (-v debug, -vv trace). `RUST_LOG` takes precedence.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Weather provider to query instead of the configured default.
    #[arg(long, global = true)]
    pub provider: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Where to look up the weather.
#[derive(Debug, Args)]
pub struct LocationArgs {
    /// Place name, e.g. "San Francisco". Ignored when --lat/--lon are valid.
    pub place: Option<String>,

    #[arg(long, allow_negative_numbers = true)]
    pub lat: Option<f64>,

    #[arg(long, allow_negative_numbers = true)]
    pub lon: Option<f64>,
}

impl LocationArgs {
    fn query(self) -> LocationQuery {
        LocationQuery::new(self.place, self.lat, self.lon)
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store API credentials for a weather provider and the geocoder.
    Configure {
        /// Provider short name, e.g. "darksky" or "pirateweather".
        provider: String,
    },

    /// Full forecast payload.
    Full(LocationArgs),

    /// Current conditions only.
    Currently(LocationArgs),

    /// Minute-by-minute forecast for the next hour.
    Minutely(LocationArgs),

    /// Hour-by-hour forecast.
    Hourly {
        #[command(flatten)]
        location: LocationArgs,

        /// Request the extended hourly horizon.
        #[arg(long)]
        extend: bool,
    },

    /// Day-by-day forecast.
    Daily(LocationArgs),

    /// Full payload at a past or future instant.
    TimeMachine {
        #[command(flatten)]
        location: LocationArgs,

        /// Unix timestamp or relative offsets, e.g. "-4y -5M -3m".
        #[arg(long, allow_hyphen_values = true)]
        at: String,
    },
}

pub fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "simplesky_core=debug,simplesky=debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let provider = self.provider;

        match self.command {
            Command::Configure { provider } => configure(&provider),
            Command::Full(location) => {
                print_json(&client(provider)?.get_full(&location.query()).await?)
            }
            Command::Currently(location) => {
                print_json(&client(provider)?.get_currently(&location.query()).await?)
            }
            Command::Minutely(location) => {
                print_json(&client(provider)?.get_minutely(&location.query()).await?)
            }
            Command::Hourly { location, extend } => {
                print_json(&client(provider)?.get_hourly(&location.query(), extend).await?)
            }
            Command::Daily(location) => {
                print_json(&client(provider)?.get_daily(&location.query()).await?)
            }
            Command::TimeMachine { location, at } => {
                let when: TimeSpec = at.parse()?;
                print_json(&client(provider)?.get_time_machine(&location.query(), &when).await?)
            }
        }
    }
}

fn client(provider: Option<String>) -> anyhow::Result<SimpleSky> {
    let mut config = Config::load()?.with_env_overrides()?;

    if let Some(name) = provider {
        select_provider(&mut config, &name)?;
    }

    SimpleSky::from_config(&config)
}

/// Make `name` the provider for this run; it must already have a key.
fn select_provider(config: &mut Config, name: &str) -> anyhow::Result<()> {
    let id = ProviderId::try_from(name)?;
    if !config.is_provider_configured(id) {
        return Err(anyhow!(
            "No API key configured for provider '{id}'.\n\
             Hint: run `simplesky configure {id}` and enter your API key."
        ));
    }

    tracing::debug!(provider = %id, "overriding default provider");
    config.set_default_provider(id);
    Ok(())
}

fn configure(provider: &str) -> anyhow::Result<()> {
    let id = ProviderId::try_from(provider)?;
    let mut config = Config::load()?;

    let weather_key = inquire::Password::new(&format!("API key for {id}:"))
        .without_confirmation()
        .prompt()
        .context("Failed to read weather API key")?;
    config.upsert_provider_api_key(id, weather_key.trim().to_string());

    let geocoding_key = inquire::Password::new("Google geocoding API key (empty keeps current):")
        .without_confirmation()
        .prompt()
        .context("Failed to read geocoding API key")?;
    if !geocoding_key.trim().is_empty() {
        config.set_geocoding_api_key(geocoding_key.trim().to_string());
    }

    if config.default_provider_id()? != id
        && inquire::Confirm::new(&format!("Make {id} the default provider?"))
            .with_default(true)
            .prompt()?
    {
        config.set_default_provider(id);
    }

    config.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to render JSON output")?;
    println!("{json}");
    Ok(())
}
