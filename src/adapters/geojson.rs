use geo_types::{Coord, LineString, MultiPolygon, Polygon};
use serde_json::Value;

type Ring = Vec<Vec<f64>>;

/// 將 GeoJSON geometry 轉為 MultiPolygon；非面狀幾何回傳 `None`
pub fn to_multi_polygon(geometry: &Value) -> Option<MultiPolygon<f64>> {
    let coordinates = geometry.get("coordinates")?.clone();

    match geometry.get("type")?.as_str()? {
        "Polygon" => {
            let rings: Vec<Ring> = serde_json::from_value(coordinates).ok()?;
            let polygon = polygon_from_rings(rings)?;
            Some(MultiPolygon::new(vec![polygon]))
        }
        "MultiPolygon" => {
            let polygons: Vec<Vec<Ring>> = serde_json::from_value(coordinates).ok()?;
            let polygons: Vec<Polygon<f64>> =
                polygons.into_iter().filter_map(polygon_from_rings).collect();
            if polygons.is_empty() {
                None
            } else {
                Some(MultiPolygon::new(polygons))
            }
        }
        _ => None,
    }
}

/// 外環無效則整個多邊形無效；無效的內環直接略過
fn polygon_from_rings(rings: Vec<Ring>) -> Option<Polygon<f64>> {
    let mut rings = rings.into_iter();
    let exterior = line_string(rings.next()?)?;
    Some(Polygon::new(exterior, rings.filter_map(line_string).collect()))
}

fn line_string(ring: Ring) -> Option<LineString<f64>> {
    let coords: Vec<Coord<f64>> = ring
        .into_iter()
        .filter(|position| position.len() >= 2)
        .map(|position| Coord {
            x: position[0],
            y: position[1],
        })
        .collect();

    // 至少三個頂點加上封閉點
    if coords.len() < 4 {
        return None;
    }
    Some(LineString::new(coords))
}
