use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use climate_core::{
    Config, Dashboard, DashboardEvent, TimePeriod,
    anomaly,
    momentum::FrameOutcome,
    provider::{GeocoderId, MIN_QUERY_LEN},
};
use inquire::{Password, Select, Text};
use log::{debug, info};

use crate::render::{TextRenderer, print_anomalies, print_forecast};

/// Roughly one display frame.
const FRAME: Duration = Duration::from_millis(16);

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "climate", version, about = "Climate and air-quality explorer")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// A city name or a latitude/longitude pair.
#[derive(Debug, Args)]
pub struct LocationArgs {
    /// City name, e.g. "Lyon" or "Springfield, Illinois".
    #[arg(long, conflicts_with_all = ["lat", "lon"], required_unless_present_all = ["lat", "lon"])]
    pub city: Option<String>,

    #[arg(long, requires = "lon", allow_negative_numbers = true)]
    pub lat: Option<f64>,

    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    pub lon: Option<f64>,

    /// One of: today, 7days, 30days, year. Defaults to the configured period.
    #[arg(long)]
    pub period: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Set the backend URL, geocoder and API key.
    Configure,

    /// Search for cities matching a name.
    Search {
        query: String,
    },

    /// Show charts and current conditions for a location.
    Show {
        #[command(flatten)]
        location: LocationArgs,
    },

    /// Spin the globe, click on it and show the picked location.
    Pick {
        /// Click position in viewport pixels.
        #[arg(long, allow_negative_numbers = true)]
        x: f64,

        #[arg(long, allow_negative_numbers = true)]
        y: f64,

        /// Horizontal drag steps (px) applied before the click.
        #[arg(long, num_args = 1.., allow_negative_numbers = true)]
        drag: Vec<f64>,

        /// Use the large modal globe instead of the thumbnail.
        #[arg(long)]
        modal: bool,

        #[arg(long)]
        period: Option<String>,
    },

    /// Keep showing a location, refreshing periodically until Ctrl-C.
    Watch {
        #[command(flatten)]
        location: LocationArgs,
    },

    /// Ask the assistant about a location's conditions.
    Ask {
        message: String,

        #[command(flatten)]
        location: LocationArgs,
    },

    /// Save the charts and current conditions for a location as JSON.
    Export {
        #[command(flatten)]
        location: LocationArgs,

        /// Output file; defaults to climate-data-<place>-<date>.json here.
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Search { query } => search(&query).await,
            Command::Show { location } => {
                let mut dash = dashboard()?;
                load(&mut dash, &location).await?;
                show(&dash);
                Ok(())
            }
            Command::Pick {
                x,
                y,
                drag,
                modal,
                period,
            } => pick(x, y, &drag, modal, period.as_deref()).await,
            Command::Watch { location } => watch(&location).await,
            Command::Ask { message, location } => {
                let mut dash = dashboard()?;
                load(&mut dash, &location).await?;
                let reply = dash.ask(&message).await?;
                println!("{reply}");
                Ok(())
            }
            Command::Export { location, out } => {
                let mut dash = dashboard()?;
                load(&mut dash, &location).await?;
                let dir = std::env::current_dir().context("Failed to read current directory")?;
                let path = dash.export(out.as_deref(), &dir)?;
                println!("Exported to {}", path.display());
                Ok(())
            }
        }
    }
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let base_url = Text::new("Dashboard backend URL:")
        .with_default(&config.backend.base_url)
        .prompt()?;
    config.backend.base_url = base_url.trim().to_string();

    let options: Vec<&str> = GeocoderId::all().iter().map(|id| id.as_str()).collect();
    let choice = Select::new("City search provider:", options).prompt()?;
    let id = GeocoderId::try_from(choice)?;

    if id.needs_api_key() {
        let api_key = Password::new(&format!("API key for {id}:"))
            .without_confirmation()
            .prompt()?;
        config.upsert_provider_api_key(id, api_key.trim().to_string());
    }
    config.set_default_geocoder(id);

    config.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

fn dashboard() -> anyhow::Result<Dashboard> {
    let config = Config::load()?;
    Dashboard::from_config(&config)
}

fn parse_period(period: Option<&str>) -> anyhow::Result<Option<TimePeriod>> {
    period.map(TimePeriod::try_from).transpose()
}

/// Select the requested location and wait for its charts.
async fn load(dash: &mut Dashboard, args: &LocationArgs) -> anyhow::Result<()> {
    if let Some(period) = parse_period(args.period.as_deref())? {
        dash.switch_period(period);
    }

    match (&args.city, args.lat, args.lon) {
        (Some(city), _, _) => {
            dash.select_city_name(city).await?;
        }
        (None, Some(lat), Some(lon)) => {
            dash.select_coordinates(lat, lon);
        }
        _ => bail!("Pass --city or both --lat and --lon"),
    }

    wait_for_charts(dash).await
}

/// Wait for the charts and, for coordinates, the place name.
async fn wait_for_charts(dash: &mut Dashboard) -> anyhow::Result<()> {
    let mut loaded = false;
    while !loaded || dash.is_resolving_name() {
        match dash.next_event().await {
            Some(DashboardEvent::Charts { location, period }) => {
                info!("loaded {period} for {}", location.display_name());
                loaded = true;
            }
            Some(DashboardEvent::LoadFailed(message)) => bail!(message),
            Some(DashboardEvent::Renamed(location)) => {
                debug!("named {}", location.display_name());
            }
            Some(other) => debug!("ignoring {other:?} while loading"),
            None => bail!("Dashboard stopped before data arrived"),
        }
    }
    Ok(())
}

fn show(dash: &Dashboard) {
    let view = dash.view();
    if let Some(location) = view.location() {
        println!(
            "{} ({}) - {}",
            location.display_name(),
            location.format_coordinates(),
            view.period().label()
        );
    }

    dash.render(&mut TextRenderer);
    print_forecast(&dash.forecast());

    if let Some(payload) = view.payload() {
        print_anomalies(&anomaly::detect(payload));
    }
}

async fn search(query: &str) -> anyhow::Result<()> {
    if query.trim().chars().count() < MIN_QUERY_LEN {
        bail!("Type at least {MIN_QUERY_LEN} characters to search");
    }

    let mut dash = dashboard()?;
    dash.search_input(query);

    loop {
        match dash.next_event().await {
            Some(DashboardEvent::SearchResults { cities, .. }) => {
                if cities.is_empty() {
                    println!("No cities found for '{query}'");
                }
                for city in cities {
                    println!("{:<40} {:>8.3} {:>9.3}", city.label(), city.lat, city.lon);
                }
                return Ok(());
            }
            Some(DashboardEvent::SearchFailed { error, .. }) => bail!(error),
            Some(_) => continue,
            None => bail!("Dashboard stopped before search finished"),
        }
    }
}

async fn pick(
    x: f64,
    y: f64,
    drag: &[f64],
    modal: bool,
    period: Option<&str>,
) -> anyhow::Result<()> {
    let mut dash = dashboard()?;
    if let Some(period) = parse_period(period)? {
        dash.switch_period(period);
    }
    if modal {
        dash.globes_mut().open_modal();
    }

    {
        let globe = dash.globes_mut().active_mut();
        if !drag.is_empty() {
            let mut pointer = x;
            globe.pointer_down(pointer, y);
            for step in drag {
                pointer += step;
                globe.pointer_move(pointer, y);
            }

            if let Some(token) = globe.pointer_up() {
                let mut frames = tokio::time::interval(FRAME);
                let mut count = 0usize;
                loop {
                    frames.tick().await;
                    count += 1;
                    if globe.on_frame(token) != FrameOutcome::Continue {
                        break;
                    }
                }
                debug!("globe came to rest after {count} frames");
            }
            println!("Globe offset after drag: {:.1} px", globe.offset_px());
        }

        // a still press so the click below counts as a selection
        globe.pointer_down(x, y);
        globe.pointer_up();
    }

    if dash.pick_on_globe(x, y).is_none() {
        println!("({x:.0}, {y:.0}) is outside the globe face; nothing selected");
        return Ok(());
    }

    wait_for_charts(&mut dash).await?;
    show(&dash);
    Ok(())
}

async fn watch(args: &LocationArgs) -> anyhow::Result<()> {
    let mut dash = dashboard()?;
    load(&mut dash, args).await?;
    show(&dash);

    dash.start_auto_refresh();
    println!();
    println!("Watching for updates, press Ctrl-C to stop.");

    loop {
        let event = tokio::select! {
            _ = tokio::signal::ctrl_c() => None,
            event = dash.next_event() => event,
        };

        match event {
            Some(DashboardEvent::Charts { .. }) => show(&dash),
            Some(DashboardEvent::LoadFailed(message)) => {
                eprintln!("Refresh failed: {message}");
            }
            Some(other) => debug!("ignoring {other:?}"),
            None => break,
        }
    }

    dash.stop_auto_refresh();
    Ok(())
}
