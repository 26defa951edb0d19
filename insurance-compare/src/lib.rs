pub mod backend;
pub mod error;
pub mod models;
pub mod normalizer;
pub mod service;
pub mod stats;
pub mod view;
pub mod zones;

// Re-export commonly used types
#[cfg(feature = "http")]
pub use backend::HttpComparisonBackend;
pub use backend::{ComparisonBackend, InMemoryComparisonBackend};
pub use error::{CompareError, Result};
pub use models::{
    ComparisonResult, Coverage, CoverageKind, Formula, FormulaGuarantee, Guarantee,
    GuaranteeDetail, Insurer, Offer,
};
pub use normalizer::{ResponseShape, classify, normalize_payload, parse_offer_list};
pub use service::{ComparisonService, PollOptions};
pub use stats::{
    FinancialSummary, GuaranteeHighlights, GuaranteeStats, RiskLevel, ServiceStats,
    calculate_financial_summary, calculate_guarantee_stats, calculate_service_stats,
    financial_risk_level, guarantee_highlights,
};
pub use view::{LoadOutcome, ResultsState, ResultsView};
pub use zones::{
    HighlightState, ListLayout, LonLat, Viewport, Zone, ZoneCounts, ZoneInteractionController,
    ZoneMarker, ZoneType, ZoneTypeFilter, zone_coordinates,
};
