//! Single entry point for "a location became active".
//!
//! Globe clicks, search hits and typed city names all end up in
//! [`LocationCoordinator::select`], which replaces the current location and
//! asks the view for a reload of the active period.

use std::sync::Arc;

use log::{debug, info, warn};

use crate::error::{ClimateError, Result};
use crate::model::{CitySuggestion, Location};
use crate::provider::{Geocoder, MIN_QUERY_LEN};
use crate::view::{ClimateRequest, ClimateView};

/// Owns the current location; the view only mirrors it.
#[derive(Debug)]
pub struct LocationCoordinator {
    geocoder: Arc<dyn Geocoder>,
    current: Option<Location>,
}

impl LocationCoordinator {
    pub fn new(geocoder: Arc<dyn Geocoder>) -> Self {
        Self {
            geocoder,
            current: None,
        }
    }

    pub fn current(&self) -> Option<&Location> {
        self.current.as_ref()
    }

    pub fn geocoder(&self) -> &dyn Geocoder {
        self.geocoder.as_ref()
    }

    /// A handle for naming work that outlives a borrow of the coordinator.
    pub fn geocoder_handle(&self) -> Arc<dyn Geocoder> {
        Arc::clone(&self.geocoder)
    }

    /// Make `location` current and return the reload the host must run.
    pub fn select(&mut self, location: Location, view: &mut ClimateView) -> ClimateRequest {
        info!(
            "selected {} ({})",
            location.display_name(),
            location.format_coordinates()
        );
        self.current = Some(location.clone());
        view.set_location(location)
    }

    pub fn select_city(&mut self, city: &CitySuggestion, view: &mut ClimateView) -> ClimateRequest {
        self.select(city.to_location(), view)
    }

    /// Search for `name` and select the first hit.
    pub async fn select_by_city_name(
        &mut self,
        name: &str,
        view: &mut ClimateView,
    ) -> Result<ClimateRequest> {
        let name = name.trim();
        let city = self
            .geocoder
            .search(name)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ClimateError::NoMatch(name.to_string()))?;

        Ok(self.select_city(&city, view))
    }

    /// Select raw coordinates right away under their coordinate label.
    ///
    /// The returned request carries the normalized place; pass it to
    /// [`resolve_name`] and hand the result to [`LocationCoordinator::apply_name`].
    pub fn select_coordinates(
        &mut self,
        lat: f64,
        lon: f64,
        view: &mut ClimateView,
    ) -> ClimateRequest {
        let unnamed = Location::new(lat, lon, "");
        let (lat, lon) = (unnamed.latitude(), unnamed.longitude());
        self.select(Location::new(lat, lon, Location::coordinates_label(lat, lon)), view)
    }

    /// Adopt a resolved name if `named` is still the current place.
    ///
    /// Returns false when the user has moved on; nothing is reloaded either way.
    pub fn apply_name(&mut self, named: Location, view: &mut ClimateView) -> bool {
        match &self.current {
            Some(current) if current.same_place(&named) => {
                info!("named {} as {}", named.format_coordinates(), named.display_name());
                view.rename_location(named.clone());
                self.current = Some(named);
                true
            }
            _ => {
                debug!("dropping late name {} for an old selection", named.display_name());
                false
            }
        }
    }

    /// City suggestions for free text; short queries never hit the network.
    pub async fn search(&self, query: &str) -> Result<Vec<CitySuggestion>> {
        let query = query.trim();
        if query.chars().count() < MIN_QUERY_LEN {
            return Ok(Vec::new());
        }
        self.geocoder.search(query).await
    }
}

/// Reverse geocode `place`, returning it renamed. `None` keeps the coordinate label.
pub async fn resolve_name(geocoder: &dyn Geocoder, place: &Location) -> Option<Location> {
    let (lat, lon) = (place.latitude(), place.longitude());
    match geocoder.reverse(lat, lon).await {
        Ok(found) if !found.display_name.trim().is_empty() => {
            Some(Location::new(lat, lon, found.display_name))
        }
        Ok(_) => None,
        Err(err) => {
            warn!("reverse geocoding {lat:.2}, {lon:.2} failed: {err}");
            None
        }
    }
}
