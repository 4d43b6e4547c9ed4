use anyhow::{Context, Result};
use clap::Parser;
use log::warn;
use skypoll::commands::{Command, collect_params, run};
use skypoll::verticals::flights_cache::BrowseKind;
use skypoll::{Config, ErrorMode, ResponseFormat, RetryPolicy, Transport};
use std::time::Duration;

/// skypoll - live pricing client
///
/// Creates pricing sessions, polls them until the results are complete and
/// prints the final document.
///
/// Parameters are given as key=value pairs.
///
/// Examples:
///   skypoll markets en-GB
///   skypoll flights country=UK currency=GBP locale=en-GB originplace=SIN-sky \
///     destinationplace=KUL-sky outbounddate=2017-05-28 adults=1 stops=0
#[derive(Parser, Debug)]
#[command(author, version = env!("SKYPOLL_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// API key (also via SKYPOLL_API_KEY)
    #[arg(
        long = "api-key",
        env = "SKYPOLL_API_KEY",
        value_name = "KEY",
        hide_env_values = true,
        global = true
    )]
    pub api_key: Option<String>,

    /// API host (defaults to http://partners.api.skyscanner.net)
    #[arg(
        long = "api-host",
        env = "SKYPOLL_API_HOST",
        value_name = "URL",
        global = true
    )]
    pub api_host: Option<String>,

    /// Response format: json or xml
    #[arg(long, value_name = "FORMAT", default_value = "json", global = true)]
    pub format: ResponseFormat,

    /// Error mode: strict, graceful or ignore
    #[arg(long, value_name = "MODE", global = true)]
    pub errors: Option<String>,

    /// Maximum number of polls
    #[arg(long, value_name = "N", global = true)]
    pub tries: Option<usize>,

    /// Delay between polls in milliseconds
    #[arg(long = "delay-ms", value_name = "MS", global = true)]
    pub delay_ms: Option<u64>,

    /// Delay before the first poll in milliseconds
    #[arg(long = "initial-delay-ms", value_name = "MS", global = true)]
    pub initial_delay_ms: Option<u64>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// List the markets (countries) the API sells in
    Markets {
        /// Locale of the country names
        #[arg(default_value = "en-GB")]
        locale: String,
    },

    /// Suggest places matching a query
    Autosuggest {
        /// Use the hotel and car hire endpoint
        #[arg(long)]
        hotels: bool,

        #[arg(value_name = "KEY=VALUE")]
        params: Vec<String>,
    },

    /// Live flight prices
    Flights {
        #[arg(value_name = "KEY=VALUE")]
        params: Vec<String>,
    },

    /// Live hotel prices
    Hotels {
        #[arg(value_name = "KEY=VALUE")]
        params: Vec<String>,
    },

    /// Live car hire prices
    Carhire {
        #[arg(value_name = "KEY=VALUE")]
        params: Vec<String>,
    },

    /// Cached cheapest prices: quotes, routes, dates or grid
    Browse {
        kind: BrowseKind,

        #[arg(value_name = "KEY=VALUE")]
        params: Vec<String>,
    },

    /// Booking details for an itinerary of a flights session
    Booking {
        /// Poll URL of the flights session
        #[arg(value_name = "URL")]
        poll_url: String,

        #[arg(value_name = "KEY=VALUE")]
        params: Vec<String>,
    },
}

impl Commands {
    fn into_command(self) -> Result<Command> {
        let command = match self {
            Commands::Markets { locale } => Command::Markets { locale },
            Commands::Autosuggest { hotels, params } => Command::Autosuggest {
                hotels,
                params: collect_params(&params)?,
            },
            Commands::Flights { params } => Command::Flights {
                params: collect_params(&params)?,
            },
            Commands::Hotels { params } => Command::Hotels {
                params: collect_params(&params)?,
            },
            Commands::Carhire { params } => Command::Carhire {
                params: collect_params(&params)?,
            },
            Commands::Browse { kind, params } => Command::Browse {
                kind,
                params: collect_params(&params)?,
            },
            Commands::Booking { poll_url, params } => Command::Booking {
                poll_url,
                params: collect_params(&params)?,
            },
        };
        Ok(command)
    }
}

impl Cli {
    fn config(&self) -> Result<Config> {
        let mut retry = RetryPolicy::default();
        if let Some(tries) = self.tries {
            retry.tries = tries;
        }
        if let Some(ms) = self.delay_ms {
            retry.delay = Duration::from_millis(ms);
        }
        if let Some(ms) = self.initial_delay_ms {
            retry.initial_delay = Duration::from_millis(ms);
        }

        let mut config = Config::new(self.api_key.clone().unwrap_or_default())
            .with_response_format(self.format)
            .with_retry(retry);
        if let Some(host) = &self.api_host {
            config = config.with_api_host(host.as_str());
        }
        if let Some(errors) = &self.errors {
            let mode: ErrorMode = errors.parse().context("Invalid --errors value")?;
            config = config.with_error_mode(mode);
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let config = cli.config()?;
    let transport =
        Transport::new(config).context("Failed to set up client (is SKYPOLL_API_KEY set?)")?;
    let command = cli.command.into_command()?;

    match run(&transport, command, None).await? {
        Some(doc) => println!("{}", doc),
        None => warn!("No content returned"),
    }
    Ok(())
}
