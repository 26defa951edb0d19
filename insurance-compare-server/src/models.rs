use insurance_compare::{
    FinancialSummary, GuaranteeHighlights, GuaranteeStats, LonLat, ServiceStats, Zone,
    ZoneCounts, ZoneType, zone_coordinates,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuaranteeReport {
    pub stats: GuaranteeStats,
    pub services: Vec<ServiceStats>,
    pub financial_summary: FinancialSummary,
    pub highlights: GuaranteeHighlights,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ZoneSummary {
    pub counts: ZoneCounts,
    pub zones: Vec<ZoneEntry>,
}

/// A zone as listed by the zones tab, with its resolved map position.
#[derive(Debug, Serialize, Deserialize)]
pub struct ZoneEntry {
    pub id: String,
    pub key: String,
    pub name: String,
    #[serde(rename = "type")]
    pub zone_type: ZoneType,
    pub label: String,
    pub flag: Option<String>,
    pub coordinates: Option<LonLat>,
    pub conditions: Vec<String>,
}

impl From<&Zone> for ZoneEntry {
    fn from(zone: &Zone) -> Self {
        Self {
            id: zone.id.clone(),
            key: zone.marker_key().to_string(),
            name: zone.name.clone(),
            zone_type: zone.zone_type,
            label: zone.zone_type.label().to_string(),
            flag: zone.flag_emoji(),
            coordinates: zone_coordinates(zone),
            conditions: zone.conditions().to_vec(),
        }
    }
}
