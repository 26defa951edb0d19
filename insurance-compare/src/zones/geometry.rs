use super::Zone;

/// Map coordinate pair in projection axis order: `[longitude, latitude]`.
pub type LonLat = [f64; 2];

fn parse_degrees(value: Option<&str>) -> Option<f64> {
    let value = value?.trim();
    if value.is_empty() {
        return None;
    }
    value.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Resolves the stored text coordinates of a zone.
///
/// `(0, 0)` is the placeholder upstream writes when geocoding failed and is
/// treated as missing.
pub fn zone_coordinates(zone: &Zone) -> Option<LonLat> {
    let latitude = parse_degrees(zone.latitude.as_deref())?;
    let longitude = parse_degrees(zone.longitude.as_deref())?;
    if latitude == 0.0 && longitude == 0.0 {
        return None;
    }
    Some([longitude, latitude])
}
