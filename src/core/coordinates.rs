use crate::domain::model::Coordinates;

const LAT_RANGE: std::ops::RangeInclusive<f64> = -90.0..=90.0;
const LON_RANGE: std::ops::RangeInclusive<f64> = -180.0..=180.0;

/// 解析 `"<lat>,<lon>"`，數值不合法或超出範圍時回傳 `None`
pub fn parse_coordinates(input: &str) -> Option<Coordinates> {
    let mut parts = input.split(',');
    let lat = parts.next()?.trim().parse::<f64>().ok()?;
    let lon = parts.next()?.trim().parse::<f64>().ok()?;
    if parts.next().is_some() {
        return None;
    }

    // NaN 不在任何範圍內
    if LAT_RANGE.contains(&lat) && LON_RANGE.contains(&lon) {
        Some(Coordinates { lat, lon })
    } else {
        None
    }
}

pub fn is_coordinates(input: &str) -> bool {
    parse_coordinates(input).is_some()
}
