//! Geographic zones covered by a contract and the list/map interaction model.

pub mod collation;
pub mod controller;
pub mod geometry;

use serde::{Deserialize, Serialize};

pub use controller::{
    HighlightState, ListLayout, Viewport, ZoneCounts, ZoneInteractionController, ZoneMarker,
    ZoneTypeFilter,
};
pub use geometry::{LonLat, zone_coordinates};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneType {
    Country,
    Zone,
    Region,
    City,
}

impl ZoneType {
    pub const ALL: [ZoneType; 4] = [
        ZoneType::Country,
        ZoneType::Zone,
        ZoneType::Region,
        ZoneType::City,
    ];

    /// Wire name, as used in `type` fields.
    pub fn as_str(self) -> &'static str {
        match self {
            ZoneType::Country => "country",
            ZoneType::Zone => "zone",
            ZoneType::Region => "region",
            ZoneType::City => "city",
        }
    }

    /// Display label used for the filter chips and for sorting.
    pub fn label(self) -> &'static str {
        match self {
            ZoneType::Country => "Pays",
            ZoneType::Zone => "Zone",
            ZoneType::Region => "Région",
            ZoneType::City => "Ville",
        }
    }
}

/// A geographic area covered by a contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub id: String,
    #[serde(rename = "type")]
    pub zone_type: ZoneType,
    pub name: String,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub latitude: Option<String>,
    #[serde(default)]
    pub longitude: Option<String>,
    #[serde(default)]
    pub conditions: Option<Vec<String>>,
}

impl Zone {
    /// Key shared by the list card and the map marker of this zone.
    pub fn marker_key(&self) -> &str {
        self.code
            .as_deref()
            .filter(|c| !c.is_empty())
            .unwrap_or(&self.id)
    }

    /// Regional-indicator flag for two-letter country codes.
    pub fn flag_emoji(&self) -> Option<String> {
        if self.zone_type != ZoneType::Country {
            return None;
        }
        let code = self.code.as_deref()?.trim();
        if code.len() != 2 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
            return None;
        }
        code.to_ascii_uppercase()
            .chars()
            .map(|c| char::from_u32(0x1F1E6 + (c as u32 - 'A' as u32)))
            .collect()
    }

    pub fn conditions(&self) -> &[String] {
        self.conditions.as_deref().unwrap_or_default()
    }
}
