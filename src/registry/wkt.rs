//! Conversion of registry geometries (GeoJSON-like objects or GML strings)
//! to Well-Known Text.

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

static GML_POLYGON: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<gml:Polygon[^>]*>(.*?)</gml:Polygon>").expect("valid gml:Polygon pattern")
});
static GML_POS_LIST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<gml:posList[^>]*>([^<]+)</gml:posList>").expect("valid gml:posList pattern")
});
static GML_LINE_STRING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<gml:LineString[\s>]").expect("valid gml:LineString pattern"));
static GML_POS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<gml:pos(?:\s[^>]*)?>([^<]+)</gml:pos>").expect("valid gml:pos pattern")
});

type Ring = Vec<(f64, f64)>;

/// Six decimals at most, trailing zeros dropped: `4.100000` becomes `4.1`.
pub fn format_coord(value: f64) -> String {
    if value.is_nan() {
        return String::new();
    }
    let text = format!("{:.6}", value);
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn point(value: &Value) -> Option<(f64, f64)> {
    let coords = value.as_array()?;
    if coords.len() < 2 {
        return None;
    }
    Some((number(&coords[0])?, number(&coords[1])?))
}

fn json_ring(value: &Value) -> Ring {
    value
        .as_array()
        .map(|points| points.iter().filter_map(point).collect())
        .unwrap_or_default()
}

fn json_polygon(value: &Value) -> Vec<Ring> {
    value
        .as_array()
        .map(|rings| {
            rings
                .iter()
                .map(json_ring)
                .filter(|r| !r.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

fn ring_text(ring: &[(f64, f64)]) -> String {
    ring.iter()
        .map(|(x, y)| format!("{} {}", format_coord(*x), format_coord(*y)))
        .collect::<Vec<_>>()
        .join(", ")
}

fn polygon_body(rings: &[Ring]) -> Option<String> {
    if rings.is_empty() {
        return None;
    }
    let inner = rings
        .iter()
        .map(|r| format!("({})", ring_text(r)))
        .collect::<Vec<_>>()
        .join(", ");
    Some(format!("({})", inner))
}

fn polygons_wkt(polygons: &[Vec<Ring>]) -> Option<String> {
    let bodies: Vec<String> = polygons.iter().filter_map(|p| polygon_body(p)).collect();
    match bodies.len() {
        0 => None,
        1 => Some(format!("POLYGON {}", bodies[0])),
        _ => Some(format!("MULTIPOLYGON ({})", bodies.join(", "))),
    }
}

fn coordinates_wkt(geometry_type: &str, coordinates: &Value) -> Option<String> {
    match geometry_type {
        "Polygon" => polygon_body(&json_polygon(coordinates)).map(|b| format!("POLYGON {}", b)),
        "MultiPolygon" => {
            let bodies: Vec<String> = coordinates
                .as_array()?
                .iter()
                .filter_map(|p| polygon_body(&json_polygon(p)))
                .collect();
            if bodies.is_empty() {
                None
            } else {
                Some(format!("MULTIPOLYGON ({})", bodies.join(", ")))
            }
        }
        "LineString" => {
            let ring = json_ring(coordinates);
            (!ring.is_empty()).then(|| format!("LINESTRING ({})", ring_text(&ring)))
        }
        "Point" => {
            let (x, y) = point(coordinates)?;
            Some(format!("POINT ({} {})", format_coord(x), format_coord(y)))
        }
        _ => None,
    }
}

fn pos_list(text: &str) -> Ring {
    let values: Vec<f64> = text
        .split_whitespace()
        .filter_map(|v| v.parse().ok())
        .collect();
    values.chunks_exact(2).map(|c| (c[0], c[1])).collect()
}

fn block_rings(block: &str) -> Vec<Ring> {
    GML_POS_LIST
        .captures_iter(block)
        .map(|caps| pos_list(&caps[1]))
        .filter(|r| !r.is_empty())
        .collect()
}

/// GML polygons, multi-surfaces, line strings and points.
pub fn gml_to_wkt(gml: &str) -> Option<String> {
    let polygons: Vec<Vec<Ring>> = GML_POLYGON
        .captures_iter(gml)
        .map(|caps| block_rings(&caps[1]))
        .filter(|rings| !rings.is_empty())
        .collect();
    if !polygons.is_empty() {
        return polygons_wkt(&polygons);
    }

    let rings = block_rings(gml);
    if !rings.is_empty() {
        if GML_LINE_STRING.is_match(gml) {
            return Some(format!("LINESTRING ({})", ring_text(&rings[0])));
        }
        return polygons_wkt(&[rings]);
    }

    let caps = GML_POS.captures(gml)?;
    let (x, y) = pos_list(&caps[1]).first().copied()?;
    Some(format!("POINT ({} {})", format_coord(x), format_coord(y)))
}

/// WKT for a registry `geometrie` object; `None` when nothing usable is found.
pub fn geometry_to_wkt(geometry: &Value) -> Option<String> {
    let object = geometry.as_object()?;
    let from_coordinates = match (
        object.get("type").and_then(Value::as_str),
        object.get("coordinates"),
    ) {
        (Some(geometry_type), Some(coordinates)) => coordinates_wkt(geometry_type, coordinates),
        _ => None,
    };
    from_coordinates.or_else(|| object.get("gml").and_then(Value::as_str).and_then(gml_to_wkt))
}
