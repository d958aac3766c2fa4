// Conversion of cell text into numbers, rates and coordinates.
// None of these functions fail: bad input degrades to 0 or to absent.

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::LatLng;

static LEADING_FLOAT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(?:\d+(?:\.\d*)?|\.\d+)(?:[eE][+-]?\d+)?").expect("regex is valid")
});

static DECIMAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"-?\d+\.\d+").expect("regex is valid"));

// D°M'S"H, with the usual typographic variants of the minute and second marks.
static DMS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)(\d+(?:\.\d+)?)\s*°\s*(\d+(?:\.\d+)?)\s*['′’]\s*(\d+(?:\.\d+)?)\s*(?:"|″|”|'')\s*([NSEW])"#,
    )
    .expect("regex is valid")
});

/// Parses the numeric prefix of a text, the way spreadsheet exports are usually read:
/// `"300 acres"` is 300, `"abc"` is nothing.
fn leading_float(s: &str) -> Option<f64> {
    let m = LEADING_FLOAT.find(s.trim())?;
    m.as_str().parse::<f64>().ok().filter(|x| x.is_finite())
}

/// Parses a count (farmers, acres, distance).
///
/// Thousands separators are removed. Anything that is not a number is 0.
pub fn parse_count(text: &str) -> f64 {
    count_value(text).unwrap_or(0.0)
}

/// The count in a cell, if the cell holds one.
pub(crate) fn count_value(text: &str) -> Option<f64> {
    let cleaned = text.replace(',', "");
    leading_float(&cleaned)
}

/// Parses a percentage.
///
/// Returns `None` for empty cells, placeholders such as `-`, and values
/// outside of [0, 100].
pub fn parse_rate(text: &str) -> Option<f64> {
    let s = text.trim();
    let s = s.strip_suffix('%').unwrap_or(s).trim();
    let x = leading_float(s)?;
    if (0.0..=100.0).contains(&x) {
        Some(x)
    } else {
        debug!("parse_rate: out of range rate {:?}", text);
        None
    }
}

/// Converts one degrees-minutes-seconds token to decimal degrees.
///
/// ```
/// let lat = outreach_sessions::parse_dms("28°09'13.2\"N").unwrap();
/// assert!((lat - 28.1537).abs() < 1e-3);
/// ```
pub fn parse_dms(token: &str) -> Option<f64> {
    let caps = DMS.captures(token)?;
    dms_from_captures(&caps).map(|(value, _)| value)
}

fn dms_from_captures(caps: &regex::Captures) -> Option<(f64, char)> {
    let deg: f64 = caps.get(1)?.as_str().parse().ok()?;
    let min: f64 = caps.get(2)?.as_str().parse().ok()?;
    let sec: f64 = caps.get(3)?.as_str().parse().ok()?;
    let hemisphere = caps.get(4)?.as_str().chars().next()?.to_ascii_uppercase();
    let value = deg + min / 60.0 + sec / 3600.0;
    match hemisphere {
        'S' | 'W' => Some((-value, hemisphere)),
        _ => Some((value, hemisphere)),
    }
}

fn valid(lat: f64, lng: f64) -> Option<LatLng> {
    if (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lng) {
        Some(LatLng { lat, lng })
    } else {
        debug!("parse_coordinates: out of range {:?} {:?}", lat, lng);
        None
    }
}

/// Extracts a (latitude, longitude) pair from free text.
///
/// Two notations are understood: two DMS tokens, or two signed decimal
/// numbers anywhere in the text (latitude first). Text in DMS notation
/// without two complete tokens is absent.
pub fn parse_coordinates(text: &str) -> Option<LatLng> {
    if text.trim().is_empty() {
        return None;
    }

    // DMS first: its decimal seconds would otherwise be read as a decimal pair.
    let dms: Vec<(f64, char)> = DMS
        .captures_iter(text)
        .filter_map(|caps| dms_from_captures(&caps))
        .take(2)
        .collect();
    if let [(v1, h1), (v2, h2)] = dms.as_slice() {
        let lng_first = matches!(h1, 'E' | 'W') && matches!(h2, 'N' | 'S');
        return if lng_first {
            valid(*v2, *v1)
        } else {
            valid(*v1, *v2)
        };
    }

    // DMS text without a full pair: its seconds must not be read as decimals.
    if !dms.is_empty() || text.contains('°') {
        debug!("parse_coordinates: incomplete DMS pair {:?}", text);
        return None;
    }

    let decimals: Vec<f64> = DECIMAL
        .find_iter(text)
        .filter_map(|m| m.as_str().parse::<f64>().ok())
        .take(2)
        .collect();
    match decimals.as_slice() {
        [lat, lng] => valid(*lat, *lng),
        _ => None,
    }
}
