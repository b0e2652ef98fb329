use anyhow::Context;
use clap::{Parser, Subcommand};
use wxcache_core::store::{MemoryStore, SupabaseStore};
use wxcache_core::{Config, Coordinate, Observation, ObservationStore, WeatherCache};
use wxcache_core::provider::OpenWeatherProvider;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "wxcache", version, about = "Cached weather lookup by coordinate")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure the OpenWeather API key (and optionally the hosted store).
    Configure,

    /// Show current weather at a coordinate.
    Show {
        /// Latitude in decimal degrees.
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        /// Longitude in decimal degrees.
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show { lat, lon } => show(lat, lon).await,
        }
    }
}

fn configure() -> anyhow::Result<()> {
    let mut cfg = Config::load()?;

    let api_key = inquire::Text::new("OpenWeather API key:")
        .prompt()
        .context("Failed to read API key")?;
    cfg.api_key = Some(api_key.trim().to_string());

    let use_store = inquire::Confirm::new("Configure a hosted Supabase store?")
        .with_default(false)
        .prompt()
        .context("Failed to read store choice")?;

    if use_store {
        let url = inquire::Text::new("Supabase project URL:")
            .prompt()
            .context("Failed to read store URL")?;
        let key = inquire::Text::new("Supabase service key:")
            .prompt()
            .context("Failed to read store key")?;
        cfg.store = Some(wxcache_core::StoreConfig {
            url: url.trim().to_string(),
            api_key: key.trim().to_string(),
        });
    }

    cfg.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());

    Ok(())
}

async fn show(lat: f64, lon: f64) -> anyhow::Result<()> {
    anyhow::ensure!(lat.is_finite() && (-90.0..=90.0).contains(&lat), "latitude out of range");
    anyhow::ensure!(lon.is_finite() && (-180.0..=180.0).contains(&lon), "longitude out of range");

    let cfg = Config::load()?;
    let api_key = cfg.api_key()?.to_string();

    let provider = OpenWeatherProvider::new(api_key)?;

    // Without a hosted store every run starts cold; lookups within one run
    // still hit the in-process cache.
    let store: Box<dyn ObservationStore> = match &cfg.store {
        Some(sc) => Box::new(SupabaseStore::new(sc.url.clone(), sc.api_key.clone())?),
        None => Box::new(MemoryStore::new()),
    };

    let cache = WeatherCache::new(Box::new(provider), store, cfg.ttl(), cfg.radius_meters);
    let obs = cache.lookup(Coordinate::new(lon, lat)).await?;

    print_observation(&obs);

    Ok(())
}

fn print_observation(obs: &Observation) {
    println!("Weather at ({:.4}, {:.4})", obs.coord.lat, obs.coord.lon);
    println!("  Condition  : {} ({})", obs.weather_main, obs.weather_description);
    println!("  Temp       : {:.1} °C (feels like {:.1} °C)", obs.temp, obs.feels_like);
    println!("  Wind       : {} m/s, {}°, gusts {}",
        fmt_opt(obs.wind_speed), fmt_opt(obs.wind_deg), fmt_opt(obs.wind_gust));
    println!("  Visibility : {} m", fmt_opt(obs.visibility));
    println!("  Rain (1h)  : {} mm", fmt_opt(obs.rain_1h));
    println!("  Snow (1h)  : {} mm", fmt_opt(obs.snow_1h));
    match obs.clouds {
        Some(pct) => println!("  Clouds     : {pct}%"),
        None => println!("  Clouds     : unknown"),
    }
    println!("  Observed   : {}", obs.observed_at.format("%Y-%m-%d %H:%M UTC"));
    println!("  Fresh until: {}", obs.expires_at.format("%Y-%m-%d %H:%M UTC"));
}

fn fmt_opt(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.1}"),
        None => "unknown".to_string(),
    }
}
