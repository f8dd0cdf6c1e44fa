//! The climate data view: active period, in-flight request bookkeeping and the
//! charts currently on screen.
//!
//! The view never performs I/O. Every transition that needs data returns a
//! [`ClimateRequest`] for the host to execute; the host hands the outcome back
//! through [`ClimateView::apply`]. Only the most recently issued request may
//! change what is displayed, and only while its period is still active.

use chrono::{Local, NaiveDate};
use log::{debug, info, warn};

use crate::chart::{self, ChartDescriptor};
use crate::error::ClimateError;
use crate::model::{ClimateDataPayload, CurrentConditions, Location, TimePeriod};

pub type RequestId = u64;

/// One climate-data fetch the host should perform.
#[derive(Debug, Clone, PartialEq)]
pub struct ClimateRequest {
    pub id: RequestId,
    pub location: Location,
    pub period: TimePeriod,
}

/// The outcome of a [`ClimateRequest`], echoing its id and period.
#[derive(Debug)]
pub struct ClimateResponse {
    pub request_id: RequestId,
    pub period: TimePeriod,
    pub result: Result<ClimateDataPayload, ClimateError>,
}

impl ClimateResponse {
    pub fn new(request: &ClimateRequest, result: Result<ClimateDataPayload, ClimateError>) -> Self {
        Self {
            request_id: request.id,
            period: request.period,
            result,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaleReason {
    /// Nothing has been requested yet.
    Unsolicited,
    /// A newer request was issued after this one.
    Superseded { latest: RequestId },
    /// The period changed (or the payload is tagged with another period).
    PeriodMismatch { active: TimePeriod, got: TimePeriod },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Charts were rebuilt from the payload.
    Applied,
    /// The request failed; the view now shows an error.
    Failed(String),
    /// The response was stale and changed nothing.
    Discarded(StaleReason),
}

#[derive(Debug, Default)]
pub struct ClimateView {
    period: TimePeriod,
    /// Read-only mirror of the coordinator's current location; only
    /// `set_location` and `rename_location` write it.
    location: Option<Location>,
    next_id: RequestId,
    latest: Option<ClimateRequest>,
    loading: bool,
    error: Option<String>,
    current: Option<CurrentConditions>,
    charts: Vec<ChartDescriptor>,
    payload: Option<ClimateDataPayload>,
}

impl ClimateView {
    pub fn new(period: TimePeriod) -> Self {
        Self {
            period,
            ..Self::default()
        }
    }

    pub fn period(&self) -> TimePeriod {
        self.period
    }

    pub fn location(&self) -> Option<&Location> {
        self.location.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn current(&self) -> Option<&CurrentConditions> {
        self.current.as_ref()
    }

    pub fn charts(&self) -> &[ChartDescriptor] {
        &self.charts
    }

    /// The payload the charts were built from.
    pub fn payload(&self) -> Option<&ClimateDataPayload> {
        self.payload.as_ref()
    }

    pub fn latest_request(&self) -> Option<&ClimateRequest> {
        self.latest.as_ref()
    }

    /// A new location became active; always reloads.
    ///
    /// Everything shown for the previous location is dropped so charts and
    /// the current snapshot never describe two different places.
    pub fn set_location(&mut self, location: Location) -> ClimateRequest {
        self.location = Some(location.clone());
        self.current = None;
        self.charts.clear();
        self.payload = None;
        self.issue(location)
    }

    /// Replace the active location's name once it is known. Ignored unless
    /// `location` is the same place as the active one.
    pub fn rename_location(&mut self, location: Location) -> bool {
        match &self.location {
            Some(active) if active.same_place(&location) => {
                self.location = Some(location);
                true
            }
            _ => false,
        }
    }

    /// Make `period` active and request its data if a location is selected.
    ///
    /// Re-selecting the active period is a no-op while its request for the
    /// current location is pending or has succeeded.
    pub fn switch_period(&mut self, period: TimePeriod) -> Option<ClimateRequest> {
        if period == self.period && self.error.is_none() && self.latest_matches_selection() {
            debug!("period {period} already active, no new request");
            return None;
        }

        self.period = period;
        let location = self.location.clone()?;
        Some(self.issue(location))
    }

    /// Re-request the active period for the active location.
    pub fn refresh(&mut self) -> Option<ClimateRequest> {
        let location = self.location.clone()?;
        Some(self.issue(location))
    }

    /// Re-issue the active request, but only after a failure.
    pub fn retry(&mut self) -> Option<ClimateRequest> {
        if self.error.is_none() {
            return None;
        }
        self.refresh()
    }

    pub fn apply(&mut self, response: ClimateResponse) -> ApplyOutcome {
        self.apply_on(response, Local::now().date_naive())
    }

    /// Like [`ClimateView::apply`] with an explicit calendar day for labels.
    pub fn apply_on(&mut self, response: ClimateResponse, today: NaiveDate) -> ApplyOutcome {
        let Some(latest) = &self.latest else {
            debug!("discarding unsolicited response #{}", response.request_id);
            return ApplyOutcome::Discarded(StaleReason::Unsolicited);
        };

        if response.request_id != latest.id {
            debug!(
                "discarding response #{} ({}), latest is #{}",
                response.request_id, response.period, latest.id
            );
            return ApplyOutcome::Discarded(StaleReason::Superseded { latest: latest.id });
        }

        if response.period != self.period {
            debug!(
                "discarding response #{} for {}, active period is {}",
                response.request_id, response.period, self.period
            );
            // nothing newer is in flight
            self.loading = false;
            return ApplyOutcome::Discarded(StaleReason::PeriodMismatch {
                active: self.period,
                got: response.period,
            });
        }

        match response.result {
            Err(err) => {
                let message = err.to_string();
                warn!("climate request #{} failed: {message}", response.request_id);
                self.loading = false;
                self.error = Some(message.clone());
                ApplyOutcome::Failed(message)
            }
            Ok(payload) if payload.period() != self.period => {
                let err = ClimateError::InvalidPayload(format!(
                    "requested {} data but received {}",
                    self.period,
                    payload.period()
                ));
                let message = err.to_string();
                warn!("climate request #{} failed: {message}", response.request_id);
                self.loading = false;
                self.error = Some(message.clone());
                ApplyOutcome::Failed(message)
            }
            Ok(payload) => {
                self.current = payload.current().copied();
                self.charts = chart::build(&payload, today);
                self.payload = Some(payload);
                self.loading = false;
                self.error = None;
                ApplyOutcome::Applied
            }
        }
    }

    fn latest_matches_selection(&self) -> bool {
        match (&self.latest, &self.location) {
            (Some(latest), Some(location)) => {
                latest.period == self.period && latest.location.same_place(location)
            }
            _ => false,
        }
    }

    fn issue(&mut self, location: Location) -> ClimateRequest {
        let id = self.next_id;
        self.next_id += 1;

        let request = ClimateRequest {
            id,
            location,
            period: self.period,
        };
        info!(
            "requesting {} data for {} ({}) as #{id}",
            request.period,
            request.location.display_name(),
            request.location.format_coordinates()
        );

        self.latest = Some(request.clone());
        self.loading = true;
        self.error = None;
        request
    }
}
