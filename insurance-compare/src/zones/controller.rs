//! Shared state behind the zones tab: a filterable card list and a map of the
//! same collection.
//!
//! Both views read from and write to one [`ZoneInteractionController`], so
//! "which zone is active" lives in exactly one place. Every transition is a
//! plain last-write-wins assignment, which keeps the displayed state equal to
//! the most recent user action however quickly updates arrive.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::collation::locale_cmp;
use super::geometry::{LonLat, zone_coordinates};
use super::{Zone, ZoneType};

pub const DEFAULT_CENTER: LonLat = [0.0, 20.0];
pub const MIN_ZOOM: f64 = 1.0;
pub const MAX_ZOOM: f64 = 8.0;
/// Minimum zoom applied when focusing a zone.
pub const FOCUS_ZOOM: f64 = 3.0;
pub const LABEL_ZOOM_THRESHOLD: f64 = 4.0;
pub const BASE_MARKER_RADIUS: f64 = 6.0;
const EMPHASIS_SCALE: f64 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub center: LonLat,
    pub zoom: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            center: DEFAULT_CENTER,
            zoom: MIN_ZOOM,
        }
    }
}

/// Type chip selection; serialized flat as `"all"` or the zone type name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum ZoneTypeFilter {
    #[default]
    All,
    Only(ZoneType),
}

impl From<ZoneTypeFilter> for String {
    fn from(filter: ZoneTypeFilter) -> Self {
        match filter {
            ZoneTypeFilter::All => "all".to_string(),
            ZoneTypeFilter::Only(zone_type) => zone_type.as_str().to_string(),
        }
    }
}

impl TryFrom<String> for ZoneTypeFilter {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value == "all" {
            return Ok(ZoneTypeFilter::All);
        }
        ZoneType::ALL
            .into_iter()
            .find(|t| t.as_str() == value)
            .map(ZoneTypeFilter::Only)
            .ok_or_else(|| format!("unknown zone type filter: {value}"))
    }
}

impl ZoneTypeFilter {
    fn accepts(self, zone_type: ZoneType) -> bool {
        match self {
            ZoneTypeFilter::All => true,
            ZoneTypeFilter::Only(t) => t == zone_type,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HighlightState {
    Normal,
    Highlighted,
    Dimmed,
}

/// Whether a list click should move the map or open the bottom sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListLayout {
    Wide,
    Narrow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ZoneCounts {
    pub all: usize,
    pub country: usize,
    pub zone: usize,
    pub region: usize,
    pub city: usize,
}

impl ZoneCounts {
    pub fn tally<'a>(zones: impl IntoIterator<Item = &'a Zone>) -> Self {
        zones.into_iter().fold(Self::default(), |mut counts, zone| {
            counts.all += 1;
            match zone.zone_type {
                ZoneType::Country => counts.country += 1,
                ZoneType::Zone => counts.zone += 1,
                ZoneType::Region => counts.region += 1,
                ZoneType::City => counts.city += 1,
            }
            counts
        })
    }

    pub fn get(&self, filter: ZoneTypeFilter) -> usize {
        match filter {
            ZoneTypeFilter::All => self.all,
            ZoneTypeFilter::Only(ZoneType::Country) => self.country,
            ZoneTypeFilter::Only(ZoneType::Zone) => self.zone,
            ZoneTypeFilter::Only(ZoneType::Region) => self.region,
            ZoneTypeFilter::Only(ZoneType::City) => self.city,
        }
    }
}

/// Render model of one map marker at the current zoom.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneMarker {
    pub key: String,
    pub name: String,
    pub coordinates: LonLat,
    pub highlight: HighlightState,
    pub focused: bool,
    pub radius: f64,
    pub show_label: bool,
}

#[derive(Debug, Clone)]
pub struct ZoneInteractionController {
    zones: Vec<Zone>,
    counts: ZoneCounts,
    search_query: String,
    type_filter: ZoneTypeFilter,
    expanded_zone_id: Option<String>,
    hovered_zone_code: Option<String>,
    focused_zone_code: Option<String>,
    viewport: Viewport,
    active_zone_for_mobile_sheet: Option<Zone>,
}

impl ZoneInteractionController {
    pub fn new(zones: Vec<Zone>) -> Self {
        let counts = ZoneCounts::tally(&zones);
        Self {
            zones,
            counts,
            search_query: String::new(),
            type_filter: ZoneTypeFilter::All,
            expanded_zone_id: None,
            hovered_zone_code: None,
            focused_zone_code: None,
            viewport: Viewport::default(),
            active_zone_for_mobile_sheet: None,
        }
    }

    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    pub fn type_filter(&self) -> ZoneTypeFilter {
        self.type_filter
    }

    pub fn expanded_zone_id(&self) -> Option<&str> {
        self.expanded_zone_id.as_deref()
    }

    pub fn hovered_zone_code(&self) -> Option<&str> {
        self.hovered_zone_code.as_deref()
    }

    pub fn focused_zone_code(&self) -> Option<&str> {
        self.focused_zone_code.as_deref()
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn active_zone_for_mobile_sheet(&self) -> Option<&Zone> {
        self.active_zone_for_mobile_sheet.as_ref()
    }

    /// Totals over the whole collection, independent of search and filter.
    pub fn zone_counts(&self) -> ZoneCounts {
        self.counts
    }

    pub fn set_search_query(&mut self, query: impl Into<String>) {
        self.search_query = query.into();
    }

    pub fn set_type_filter(&mut self, filter: ZoneTypeFilter) {
        self.type_filter = filter;
    }

    pub fn reset_filters(&mut self) {
        self.search_query.clear();
        self.type_filter = ZoneTypeFilter::All;
    }

    /// Zones matching the search and type filter, ordered by type label then name.
    pub fn filtered_zones(&self) -> Vec<&Zone> {
        let needle = self.search_query.to_lowercase();
        let mut zones: Vec<&Zone> = self
            .zones
            .iter()
            .filter(|z| z.name.to_lowercase().contains(&needle))
            .filter(|z| self.type_filter.accepts(z.zone_type))
            .collect();
        zones.sort_by(|a, b| {
            locale_cmp(a.zone_type.label(), b.zone_type.label())
                .then_with(|| locale_cmp(&a.name, &b.name))
        });
        zones
    }

    pub fn hover(&mut self, key: impl Into<String>) {
        self.hovered_zone_code = Some(key.into());
    }

    /// Ends the hover of `key`; a leave event for a zone that is no longer
    /// hovered is ignored.
    pub fn unhover(&mut self, key: &str) {
        if self.hovered_zone_code.as_deref() == Some(key) {
            self.hovered_zone_code = None;
        }
    }

    pub fn clear_hover(&mut self) {
        self.hovered_zone_code = None;
    }

    pub fn highlight_state(&self, key: &str) -> HighlightState {
        match self.hovered_zone_code.as_deref() {
            None => HighlightState::Normal,
            Some(hovered) if hovered == key => HighlightState::Highlighted,
            Some(_) => HighlightState::Dimmed,
        }
    }

    fn zone_by_key(&self, key: &str) -> Option<&Zone> {
        self.zones.iter().find(|z| z.marker_key() == key)
    }

    /// Marks the zone as focused and moves the camera onto it when it has
    /// coordinates. Zoom only ever increases here.
    pub fn focus_zone(&mut self, key: &str) {
        self.focused_zone_code = Some(key.to_string());
        let Some(coordinates) = self.zone_by_key(key).and_then(zone_coordinates) else {
            debug!(zone = %key, "focused zone has no coordinates, keeping viewport");
            return;
        };
        self.viewport = Viewport {
            center: coordinates,
            zoom: self.viewport.zoom.max(FOCUS_ZOOM),
        };
    }

    /// Handles a click on a list card.
    pub fn select_from_list(&mut self, zone_id: &str, layout: ListLayout) {
        let Some(zone) = self.zones.iter().find(|z| z.id == zone_id) else {
            debug!(zone_id = %zone_id, "selected zone is not part of the collection");
            return;
        };
        match layout {
            ListLayout::Wide => {
                let key = zone.marker_key().to_string();
                self.focus_zone(&key);
            }
            ListLayout::Narrow => {
                self.active_zone_for_mobile_sheet = Some(zone.clone());
            }
        }
    }

    /// "Center on map" from inside the bottom sheet: focuses the sheet's zone
    /// and closes the sheet.
    pub fn center_sheet_zone_on_map(&mut self) {
        if let Some(zone) = self.active_zone_for_mobile_sheet.take() {
            self.focus_zone(zone.marker_key());
        }
    }

    pub fn close_sheet(&mut self) {
        self.active_zone_for_mobile_sheet = None;
    }

    /// Pan/zoom gesture from the map.
    pub fn set_viewport(&mut self, center: LonLat, zoom: f64) {
        let zoom = if zoom.is_finite() {
            zoom.clamp(MIN_ZOOM, MAX_ZOOM)
        } else {
            self.viewport.zoom
        };
        self.viewport = Viewport { center, zoom };
    }

    pub fn toggle_expanded(&mut self, zone_id: &str) {
        if self.expanded_zone_id.as_deref() == Some(zone_id) {
            self.expanded_zone_id = None;
        } else {
            self.expanded_zone_id = Some(zone_id.to_string());
        }
    }

    /// Markers for the currently listed zones that can be placed on the map.
    pub fn markers(&self) -> Vec<ZoneMarker> {
        let zoom = self.viewport.zoom;
        self.filtered_zones()
            .into_iter()
            .filter_map(|zone| {
                let coordinates = zone_coordinates(zone)?;
                let key = zone.marker_key();
                let highlight = self.highlight_state(key);
                let focused = self.focused_zone_code.as_deref() == Some(key);
                let emphasized = focused || highlight == HighlightState::Highlighted;
                let mut radius = BASE_MARKER_RADIUS / zoom.sqrt();
                if emphasized {
                    radius *= EMPHASIS_SCALE;
                }
                Some(ZoneMarker {
                    key: key.to_string(),
                    name: zone.name.clone(),
                    coordinates,
                    highlight,
                    focused,
                    radius,
                    show_label: zoom >= LABEL_ZOOM_THRESHOLD || emphasized,
                })
            })
            .collect()
    }
}
