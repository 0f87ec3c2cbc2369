use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use regex::Regex;
use std::sync::{Arc, LazyLock};
use weather_core::{AuthProvider, CredentialStore, TemperatureUnit, WeatherProvider};

use crate::{
    client::{ServiceClient, SessionAuth},
    config::Config,
    credentials::FileCredentialStore,
    output::{OutputFormat, render},
    remote::RemoteWeatherProvider,
};

static ZIP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{5}(?:-\d{4})?$").expect("zip pattern is valid"));

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather", version, about = "ZIP code weather CLI")]
pub struct Cli {
    /// Weather service base URL; overrides the configured one.
    #[arg(long, global = true, env = "WEATHER_SERVICE_URL")]
    pub service_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Set the weather service URL used by default.
    Configure {
        /// Service base URL, e.g. "https://weather.example.com".
        url: String,
    },

    /// Create an account on the weather service.
    Register {
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        password: Option<String>,
    },

    /// Log in and store the access token locally.
    Login {
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        password: Option<String>,
    },

    /// Forget the stored access token.
    Logout,

    /// Show current weather for a ZIP code.
    Current {
        #[arg(value_parser = parse_zip)]
        zip: String,

        #[arg(long, short, default_value = "F", value_parser = parse_unit)]
        units: TemperatureUnit,

        #[arg(long, short, value_enum, default_value_t)]
        output: OutputFormat,
    },

    /// Show average weather over the next few days for a ZIP code.
    Average {
        #[arg(value_parser = parse_zip)]
        zip: String,

        /// Number of days to average, 2 to 5.
        #[arg(long, short, value_parser = clap::value_parser!(u32).range(2..=5))]
        days: u32,

        #[arg(long, short, default_value = "F", value_parser = parse_unit)]
        units: TemperatureUnit,

        #[arg(long, short, value_enum, default_value_t)]
        output: OutputFormat,
    },
}

fn parse_zip(value: &str) -> Result<String, String> {
    let zip = value.trim();
    if ZIP_RE.is_match(zip) {
        Ok(zip.to_string())
    } else {
        Err(format!("'{value}' is not a valid US zip code (expected 12345 or 12345-6789)"))
    }
}

fn parse_unit(value: &str) -> Result<TemperatureUnit, weather_core::UnitError> {
    value.parse()
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let mut config = Config::load()?;
        let service_url = self
            .service_url
            .clone()
            .unwrap_or_else(|| config.service_url().to_string());

        let store: Arc<dyn CredentialStore> =
            Arc::new(FileCredentialStore::new(Config::credentials_file_path()?));
        let client = ServiceClient::new(&service_url)?;
        let auth = Arc::new(SessionAuth::new(client.clone(), store));

        match self.command {
            Command::Configure { url } => {
                config.set_service_url(&url)?;
                config.save()?;
                println!("Weather service set to {}", config.service_url());
            }
            Command::Register { email, password } => {
                let email = prompt_email(email, config.email.as_deref())?;
                let password = match password {
                    Some(password) => password,
                    None => inquire::Password::new("Password:").prompt()?,
                };

                client.register(&email, &password).await?;
                println!("Registered {email}. Run `weather login` to sign in.");
            }
            Command::Login { email, password } => {
                let email = prompt_email(email, config.email.as_deref())?;
                let password = match password {
                    Some(password) => password,
                    None => inquire::Password::new("Password:")
                        .without_confirmation()
                        .prompt()?,
                };

                auth.login(&email, &password).await?;
                config.email = Some(email.clone());
                config.save()?;
                println!("Logged in as {email}.");
            }
            Command::Logout => {
                auth.logout()?;
                println!("Logged out.");
            }
            Command::Current { zip, units, output } => {
                let provider = weather_provider(client, auth).await?;
                match provider.current_weather(&zip, units).await? {
                    Some(weather) => println!("{}", render(&weather, output)?),
                    None => println!("No weather data found for zip code {zip}."),
                }
            }
            Command::Average {
                zip,
                days,
                units,
                output,
            } => {
                let provider = weather_provider(client, auth).await?;
                match provider.average_weather(&zip, days, units).await? {
                    Some(weather) => println!("{}", render(&weather, output)?),
                    None => println!("No weather data found for zip code {zip}."),
                }
            }
        }

        Ok(())
    }
}

async fn weather_provider(
    client: ServiceClient,
    auth: Arc<SessionAuth>,
) -> Result<RemoteWeatherProvider> {
    if auth.bearer_token().await?.is_none() {
        bail!(
            "You are not logged in.\n\
             Hint: run `weather login` (or `weather register` first if you have no account)."
        );
    }
    Ok(RemoteWeatherProvider::new(client, auth))
}

fn prompt_email(email: Option<String>, last_used: Option<&str>) -> Result<String> {
    if let Some(email) = email {
        return Ok(email);
    }

    let mut prompt = inquire::Text::new("Email:");
    if let Some(last_used) = last_used {
        prompt = prompt.with_default(last_used);
    }
    Ok(prompt.prompt()?)
}
