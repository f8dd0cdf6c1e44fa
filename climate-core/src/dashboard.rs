//! The async host around the pure state machines.
//!
//! A [`Dashboard`] owns the location coordinator, the climate view, both globes
//! and the search debouncer. Climate fetches run as spawned tasks that post
//! their [`ClimateResponse`] back over an mpsc channel; [`Dashboard::next_event`]
//! applies them one at a time, so every piece of mutable state is only touched
//! from the caller's task. Requests are never cancelled in flight; a stale
//! answer is simply discarded by the view on arrival.
//!
//! Coordinate selections are acknowledged at once under a coordinate label.
//! Reverse geocoding runs in the background and renames the place later.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chrono::Local;
use log::{debug, info, warn};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::time::{Instant, sleep_until};

use crate::config::{Config, DashboardConfig};
use crate::error::{ClimateError, Result};
use crate::export;
use crate::forecast::{self, ForecastCard};
use crate::globe::{GlobePair, GlobeWidget};
use crate::model::{ChatRequest, CitySuggestion, Location, TimePeriod};
use crate::provider::{
    Assistant, ClimateSource, Geocoder, assistant_from_config, climate_source_from_config,
    default_geocoder_from_config,
};
use crate::refresh::RefreshTimer;
use crate::view::{ApplyOutcome, ClimateRequest, ClimateResponse, ClimateView, StaleReason};
use crate::chart::ChartRenderer;
use crate::coordinator::{self, LocationCoordinator};
use crate::debounce::Debouncer;

const CHANNEL_CAPACITY: usize = 64;

/// The network collaborators a dashboard talks to.
#[derive(Debug)]
pub struct Services {
    pub geocoder: Arc<dyn Geocoder>,
    pub climate: Arc<dyn ClimateSource>,
    pub assistant: Option<Box<dyn Assistant>>,
}

#[derive(Debug)]
enum Msg {
    Climate(ClimateResponse),
    Named {
        place: Location,
        named: Option<Location>,
    },
    RefreshTick,
}

/// What changed after a call to [`Dashboard::next_event`].
#[derive(Debug, Clone, PartialEq)]
pub enum DashboardEvent {
    /// Fresh charts are ready for the active location and period.
    Charts { location: Location, period: TimePeriod },
    LoadFailed(String),
    Discarded(StaleReason),
    SearchResults {
        query: String,
        cities: Vec<CitySuggestion>,
    },
    SearchFailed { query: String, error: String },
    /// The selected coordinates now carry a reverse-geocoded name.
    Renamed(Location),
    /// A name lookup finished without renaming anything: it failed, or the
    /// user had already selected somewhere else.
    NameKept(Location),
}

enum Wake {
    Message(Option<Msg>),
    SearchDue,
}

#[derive(Debug)]
pub struct Dashboard {
    climate: Arc<dyn ClimateSource>,
    assistant: Option<Box<dyn Assistant>>,
    coordinator: LocationCoordinator,
    view: ClimateView,
    globes: GlobePair,
    debouncer: Debouncer,
    refresh_every: Duration,
    refresh: RefreshTimer,
    pending_names: usize,
    tx: mpsc::Sender<Msg>,
    rx: mpsc::Receiver<Msg>,
}

impl Dashboard {
    pub fn new(services: Services, globes: GlobePair, settings: &DashboardConfig) -> Self {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        Self {
            climate: services.climate,
            assistant: services.assistant,
            coordinator: LocationCoordinator::new(services.geocoder),
            view: ClimateView::new(settings.default_period),
            globes,
            debouncer: Debouncer::new(settings.search_debounce()),
            refresh_every: settings.refresh_interval(),
            refresh: RefreshTimer::default(),
            pending_names: 0,
            tx,
            rx,
        }
    }

    /// Wire up the configured providers and globe geometry.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let thumbnail = config
            .globe
            .thumbnail
            .geometry()
            .context("Invalid [globe.thumbnail] geometry")?;
        let modal = config
            .globe
            .modal
            .geometry()
            .context("Invalid [globe.modal] geometry")?;

        let globes = GlobePair::new(
            GlobeWidget::new(thumbnail, config.momentum),
            GlobeWidget::new(modal, config.momentum),
        );

        let services = Services {
            geocoder: Arc::from(default_geocoder_from_config(config)?),
            climate: climate_source_from_config(config),
            assistant: Some(assistant_from_config(config)),
        };

        Ok(Self::new(services, globes, &config.dashboard))
    }

    pub fn view(&self) -> &ClimateView {
        &self.view
    }

    pub fn location(&self) -> Option<&Location> {
        self.coordinator.current()
    }

    pub fn globes(&self) -> &GlobePair {
        &self.globes
    }

    pub fn globes_mut(&mut self) -> &mut GlobePair {
        &mut self.globes
    }

    pub fn select(&mut self, location: Location) -> ClimateRequest {
        let request = self.coordinator.select(location, &mut self.view);
        self.dispatch(request.clone());
        request
    }

    pub fn select_city(&mut self, city: &CitySuggestion) -> ClimateRequest {
        self.debouncer.cancel();
        let request = self.coordinator.select_city(city, &mut self.view);
        self.dispatch(request.clone());
        request
    }

    pub async fn select_city_name(&mut self, name: &str) -> Result<ClimateRequest> {
        let request = self
            .coordinator
            .select_by_city_name(name, &mut self.view)
            .await?;
        self.dispatch(request.clone());
        Ok(request)
    }

    /// Select coordinates now and name them once reverse geocoding answers.
    pub fn select_coordinates(&mut self, lat: f64, lon: f64) -> ClimateRequest {
        let request = self.coordinator.select_coordinates(lat, lon, &mut self.view);
        self.dispatch(request.clone());
        self.resolve_name(request.location.clone());
        request
    }

    /// Resolve a click on the globe currently receiving input and select it.
    /// Clicks that end a drag or miss the face select nothing.
    pub fn pick_on_globe(&mut self, x: f64, y: f64) -> Option<ClimateRequest> {
        let point = self.globes.active_mut().click(x, y)?;
        Some(self.select_coordinates(point.lat, point.lon))
    }

    /// True while a reverse-geocoding lookup has not reported back.
    pub fn is_resolving_name(&self) -> bool {
        self.pending_names > 0
    }

    pub fn switch_period(&mut self, period: TimePeriod) -> Option<ClimateRequest> {
        let request = self.view.switch_period(period)?;
        self.dispatch(request.clone());
        Some(request)
    }

    pub fn refresh(&mut self) -> Option<ClimateRequest> {
        let request = self.view.refresh()?;
        self.dispatch(request.clone());
        Some(request)
    }

    pub fn retry(&mut self) -> Option<ClimateRequest> {
        let request = self.view.retry()?;
        self.dispatch(request.clone());
        Some(request)
    }

    /// Feed the search box; the query runs once typing pauses.
    pub fn search_input(&mut self, text: &str) {
        self.debouncer.input(text, Instant::now());
    }

    pub fn start_auto_refresh(&mut self) {
        let tx = self.tx.clone();
        self.refresh = RefreshTimer::start(self.refresh_every, move || {
            match tx.try_send(Msg::RefreshTick) {
                Ok(()) | Err(TrySendError::Full(_)) => true,
                Err(TrySendError::Closed(_)) => false,
            }
        });
        info!("auto-refresh every {}s", self.refresh_every.as_secs());
    }

    pub fn stop_auto_refresh(&mut self) {
        self.refresh.cancel();
    }

    pub fn is_auto_refreshing(&self) -> bool {
        self.refresh.is_running()
    }

    /// Wait for the next climate answer or settled search.
    pub async fn next_event(&mut self) -> Option<DashboardEvent> {
        loop {
            let deadline = self.debouncer.deadline();
            let wake = tokio::select! {
                msg = self.rx.recv() => Wake::Message(msg),
                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    Wake::SearchDue
                }
            };

            match wake {
                Wake::Message(None) => return None,
                Wake::Message(Some(Msg::Climate(response))) => {
                    return Some(self.on_climate(response));
                }
                Wake::Message(Some(Msg::Named { place, named })) => {
                    return Some(self.on_named(place, named));
                }
                Wake::Message(Some(Msg::RefreshTick)) => {
                    if self.refresh().is_none() {
                        debug!("refresh tick with no location selected");
                    }
                }
                Wake::SearchDue => {
                    if let Some(query) = self.debouncer.poll(Instant::now()) {
                        return Some(self.run_search(query).await);
                    }
                }
            }
        }
    }

    /// Draw the current charts and snapshot.
    pub fn render(&self, renderer: &mut dyn ChartRenderer) {
        renderer.draw(self.view.charts());
        if let Some(current) = self.view.current() {
            renderer.draw_current(current);
        }
    }

    /// Upcoming-day cards while the seven-day period is shown.
    pub fn forecast(&self) -> Vec<ForecastCard> {
        self.view
            .payload()
            .map(|payload| forecast::for_payload(payload, Local::now().date_naive()))
            .unwrap_or_default()
    }

    /// Ask the assistant about the displayed data.
    pub async fn ask(&self, message: &str) -> Result<String> {
        let assistant = self
            .assistant
            .as_ref()
            .ok_or_else(|| ClimateError::NotConfigured("No assistant configured".to_string()))?;

        let weather_data = self
            .view
            .current()
            .and_then(|current| serde_json::to_value(current).ok());
        let request = ChatRequest {
            message: message.to_string(),
            weather_data,
            location: self.location().map(|l| l.display_name().to_string()),
        };

        Ok(assistant.ask(&request).await?.response)
    }

    /// Write the export JSON to `out`, or to the default file name in `dir`.
    pub fn export(&self, out: Option<&Path>, dir: &Path) -> anyhow::Result<PathBuf> {
        let now = Local::now();
        let snapshot = export::snapshot(&self.view, now)?;
        let path = match out {
            Some(path) => path.to_path_buf(),
            None => dir.join(export::default_file_name(
                &snapshot.location,
                now.date_naive(),
            )),
        };
        export::write_json(&snapshot, &path)?;
        info!("exported {} to {}", snapshot.period, path.display());
        Ok(path)
    }

    fn dispatch(&self, request: ClimateRequest) {
        let climate = Arc::clone(&self.climate);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = climate.fetch(&request).await;
            if tx.send(Msg::Climate(ClimateResponse::new(&request, result))).await.is_err() {
                debug!("dashboard gone, dropping response #{}", request.id);
            }
        });
    }

    fn resolve_name(&mut self, place: Location) {
        self.pending_names += 1;
        let geocoder = self.coordinator.geocoder_handle();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let named = coordinator::resolve_name(geocoder.as_ref(), &place).await;
            if tx.send(Msg::Named { place, named }).await.is_err() {
                debug!("dashboard gone, dropping name lookup");
            }
        });
    }

    fn on_named(&mut self, place: Location, named: Option<Location>) -> DashboardEvent {
        self.pending_names = self.pending_names.saturating_sub(1);
        let renamed =
            named.filter(|named| self.coordinator.apply_name(named.clone(), &mut self.view));
        match renamed {
            Some(named) => DashboardEvent::Renamed(named),
            None => DashboardEvent::NameKept(place),
        }
    }

    fn on_climate(&mut self, response: ClimateResponse) -> DashboardEvent {
        match self.view.apply(response) {
            ApplyOutcome::Applied => match self.view.location() {
                Some(location) => DashboardEvent::Charts {
                    location: location.clone(),
                    period: self.view.period(),
                },
                None => DashboardEvent::Discarded(StaleReason::Unsolicited),
            },
            ApplyOutcome::Failed(message) => DashboardEvent::LoadFailed(message),
            ApplyOutcome::Discarded(reason) => DashboardEvent::Discarded(reason),
        }
    }

    async fn run_search(&self, query: String) -> DashboardEvent {
        match self.coordinator.search(&query).await {
            Ok(cities) => DashboardEvent::SearchResults { query, cities },
            Err(err) => {
                warn!("search for '{query}' failed: {err}");
                DashboardEvent::SearchFailed {
                    query,
                    error: err.to_string(),
                }
            }
        }
    }
}
