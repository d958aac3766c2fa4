mod aggregate;
mod config;
mod map;
pub mod manual;
pub mod quick_start;
mod parse;

use log::{debug, info, warn};

use std::collections::HashMap;

pub use crate::aggregate::*;
pub use crate::config::*;
pub use crate::map::*;
pub use crate::parse::{parse_coordinates, parse_count, parse_dms, parse_rate};
use crate::parse::count_value;

/// The position of each mapped field in the header row.
///
/// Fields whose header cannot be found are simply missing: every row then
/// reads an empty cell for them.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct ColumnIndex {
    columns: HashMap<Field, usize>,
}

impl ColumnIndex {
    pub fn get(&self, field: Field) -> Option<usize> {
        self.columns.get(&field).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// The cell of a record for a field. Missing columns and short rows read as empty.
    fn cell<'a>(&self, row: &'a [String], field: Field) -> &'a str {
        self.get(field)
            .and_then(|idx| row.get(idx))
            .map(|s| s.trim())
            .unwrap_or("")
    }
}

fn clean_header(s: &str) -> &str {
    s.trim_matches(|c: char| c.is_whitespace() || c == '\u{feff}')
}

/// Finds the position of the header row among the records of the table.
///
/// Position 0 is `raw.header`, position `i` is `raw.rows[i - 1]`.
/// Returns `None` when no record of the scanned window qualifies.
pub fn locate_header(raw: &RawTable, detection: &HeaderDetection) -> Option<usize> {
    match detection {
        HeaderDetection::FirstRow => {
            if raw.num_records() > 0 {
                Some(0)
            } else {
                None
            }
        }
        HeaderDetection::Anchors {
            anchors,
            max_scan_rows,
        } => {
            let scan = (*max_scan_rows).min(raw.num_records());
            (0..scan).find(|idx| {
                raw.record(*idx)
                    .map(|rec| {
                        rec.iter()
                            .any(|cell| anchors.iter().any(|a| clean_header(cell) == a.trim()))
                    })
                    .unwrap_or(false)
            })
        }
    }
}

/// Maps each field of the field map to its column in the header.
pub fn resolve_columns(
    header: &[String],
    field_map: &FieldMap,
    policy: DuplicateHeaderPolicy,
) -> ColumnIndex {
    let mut columns: HashMap<Field, usize> = HashMap::new();
    for (field, expected) in field_map.iter() {
        let expected = expected.trim();
        let mut matches = header
            .iter()
            .enumerate()
            .filter(|(_, h)| clean_header(h) == expected)
            .map(|(idx, _)| idx);
        let found = match policy {
            DuplicateHeaderPolicy::FirstMatch => matches.next(),
            DuplicateHeaderPolicy::LastMatch => matches.last(),
        };
        match found {
            Some(idx) => {
                columns.insert(*field, idx);
            }
            None => {
                debug!(
                    "resolve_columns: no column {:?} for field {}",
                    expected,
                    field.name()
                );
            }
        }
    }
    ColumnIndex { columns }
}

fn keep_row(row: &[String], columns: &ColumnIndex, filter: RowFilter) -> bool {
    if row.iter().all(|c| c.trim().is_empty()) {
        return false;
    }
    let location = columns.cell(row, Field::Location);
    let farmers = columns.cell(row, Field::Farmers);
    match filter {
        RowFilter::Lenient => !location.is_empty() || !farmers.is_empty(),
        RowFilter::Strict => !location.is_empty() && count_value(farmers).is_some(),
    }
}

/// The grouping key of a session.
///
/// An explicit day column wins. Otherwise the activity date (or the generic
/// date) is joined with the city, and rows without a date fall back to the
/// serial number.
pub fn day_key(day: &str, date: &str, city: &str, serial: &str, delimiter: &str) -> String {
    if !day.is_empty() {
        return day.to_string();
    }
    match (date.is_empty(), city.is_empty()) {
        (false, false) => format!("{}{}{}", date, delimiter, city),
        (false, true) => date.to_string(),
        (true, _) if !serial.is_empty() => format!("Day {}", serial),
        (true, _) => "Day Unknown".to_string(),
    }
}

fn optional_text(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

fn build_session(
    row: &[String],
    columns: &ColumnIndex,
    options: &NormalizeOptions,
    lineno: usize,
) -> Session {
    let cell = |field: Field| columns.cell(row, field);

    let date = match cell(Field::ActivityDate) {
        "" => cell(Field::Date),
        d => d,
    };
    let city = cell(Field::City);
    let serial = cell(Field::Serial);
    let day = day_key(
        cell(Field::Day),
        date,
        city,
        serial,
        &options.day_delimiter,
    );

    Session {
        day,
        serial: serial.to_string(),
        date: date.to_string(),
        city: city.to_string(),
        location: cell(Field::Location).to_string(),
        tehsil: cell(Field::Tehsil).to_string(),
        sales_rep: cell(Field::SalesRep).to_string(),
        total_farmers: parse_count(cell(Field::Farmers)),
        total_acres: parse_count(cell(Field::Acres)),
        distance_km: parse_count(cell(Field::DistanceKm)),
        awareness_rate: parse_rate(cell(Field::AwarenessRate)),
        definite_rate: parse_rate(cell(Field::DefiniteRate)),
        maybe_rate: parse_rate(cell(Field::MaybeRate)),
        used_last_year_rate: parse_rate(cell(Field::UsedLastYearRate)),
        coords: parse_coordinates(cell(Field::Coords)),
        top_reason_use: optional_text(cell(Field::TopReasonUse)),
        top_reason_not_use: optional_text(cell(Field::TopReasonNotUse)),
        lineno,
        cells: row.to_vec(),
    }
}

/// Normalizes a raw table, keeping the header row that was used.
///
/// This never fails: a table without a recognizable header, or without any
/// valid row, gives an empty list of sessions.
pub fn normalize_table(
    raw: &RawTable,
    field_map: &FieldMap,
    options: &NormalizeOptions,
) -> NormalizedTable {
    let header_pos = match locate_header(raw, &options.header_detection) {
        Some(pos) => pos,
        None => {
            warn!(
                "normalize_table: no header found in {} records",
                raw.num_records()
            );
            return NormalizedTable::default();
        }
    };
    let header: Vec<String> = raw.record(header_pos).unwrap_or_default().to_vec();
    debug!("normalize_table: header at {}: {:?}", header_pos, header);

    let columns = resolve_columns(&header, field_map, options.duplicate_headers);
    if columns.is_empty() {
        warn!("normalize_table: none of the mapped headers is present");
        return NormalizedTable {
            header,
            sessions: Vec::new(),
        };
    }

    let mut sessions: Vec<Session> = Vec::new();
    let mut dropped = 0usize;
    for pos in (header_pos + 1)..raw.num_records() {
        let row = match raw.record(pos) {
            Some(r) => r,
            None => continue,
        };
        let lineno = pos + 1;
        if !keep_row(row, &columns, options.row_filter) {
            debug!("normalize_table: line {}: dropping row {:?}", lineno, row);
            dropped += 1;
            continue;
        }
        let session = build_session(row, &columns, options, lineno);
        debug!("normalize_table: line {}: {:?}", lineno, session);
        sessions.push(session);
    }

    info!(
        "Normalized {} sessions ({} rows dropped)",
        sessions.len(),
        dropped
    );
    NormalizedTable { header, sessions }
}

/// Normalizes a raw table into sessions, with explicit options.
pub fn normalize_with(
    raw: &RawTable,
    field_map: &FieldMap,
    options: &NormalizeOptions,
) -> Vec<Session> {
    normalize_table(raw, field_map, options).sessions
}

/// Normalizes a raw table into sessions with the default options for this field map.
pub fn normalize(raw: &RawTable, field_map: &FieldMap) -> Vec<Session> {
    normalize_with(raw, field_map, &NormalizeOptions::for_field_map(field_map))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|s| s.to_string()).collect()
    }

    fn example_header() -> Vec<String> {
        rec(&[
            "SN",
            "Activity Date",
            "City",
            "Session Location",
            "Total Farmers",
            "Total Wheat Acres",
            "Awareness Rate",
            "Spot Coordinates",
        ])
    }

    #[test]
    fn single_row_end_to_end() {
        let raw = RawTable {
            header: example_header(),
            rows: vec![rec(&[
                "1",
                "2024-03-01",
                "Multan",
                "Farm A",
                "120",
                "300",
                "75%",
                "28.5 69.2",
            ])],
        };
        let sessions = normalize(&raw, &FieldMap::activity_sheet());
        assert_eq!(sessions.len(), 1);
        let s = &sessions[0];
        assert_eq!(s.total_farmers, 120.0);
        assert_eq!(s.total_acres, 300.0);
        assert_eq!(s.awareness_rate, Some(75.0));
        assert_eq!(s.definite_rate, None);
        assert_eq!(s.lat(), Some(28.5));
        assert_eq!(s.lng(), Some(69.2));
        assert_eq!(s.day, "2024-03-01 – Multan");
        assert_eq!(s.lineno, 2);

        let days = aggregate(&sessions);
        assert_eq!(days.len(), 1);
        assert_eq!(days[0].count, 1);
        assert_eq!(days[0].farmers, 120.0);
        assert_eq!(days[0].mean_awareness, Some(75.0));
    }

    #[test]
    fn blank_rows_are_dropped() {
        let raw = RawTable {
            header: example_header(),
            rows: vec![
                rec(&["", "", "", "", "", "", "", ""]),
                rec(&["  ", ""]),
                rec(&["7", "2024-03-02", "Multan", "", "", "", "", ""]),
            ],
        };
        let sessions = normalize(&raw, &FieldMap::activity_sheet());
        assert!(sessions.is_empty());
        let kpis = compute_kpis(&sessions);
        assert_eq!(kpis.total_farmers, 0.0);
        assert_eq!(kpis.avg_acres_per_farmer, 0.0);
        assert_eq!(kpis.avg_awareness, None);
    }

    #[test]
    fn empty_table_gives_no_sessions() {
        let raw = RawTable::from_records(vec![]);
        assert!(normalize(&raw, &FieldMap::activity_sheet()).is_empty());
        let raw = RawTable::from_records(vec![rec(&["a", "b"]), rec(&["1", "2"])]);
        assert!(normalize(&raw, &FieldMap::activity_sheet()).is_empty());
    }

    #[test]
    fn short_rows_read_as_empty() {
        let raw = RawTable {
            header: example_header(),
            rows: vec![rec(&["2", "2024-03-01", "Multan", "Farm B", "45"])],
        };
        let sessions = normalize(&raw, &FieldMap::activity_sheet());
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].total_farmers, 45.0);
        assert_eq!(sessions[0].total_acres, 0.0);
        assert_eq!(sessions[0].awareness_rate, None);
        assert_eq!(sessions[0].coords, None);
    }

    #[test]
    fn header_after_preamble() {
        let mut records = vec![
            rec(&["Wheat outreach report"]),
            rec(&["Prepared for the regional team", ""]),
        ];
        records.push(example_header());
        records.push(rec(&[
            "1",
            "2024-03-01",
            "Multan",
            "Farm A",
            "120",
            "300",
            "75%",
            "",
        ]));
        let raw = RawTable::from_records(records);
        let options = NormalizeOptions::for_field_map(&FieldMap::activity_sheet());
        assert_eq!(locate_header(&raw, &options.header_detection), Some(2));

        let table = normalize_table(&raw, &FieldMap::activity_sheet(), &options);
        assert_eq!(table.header, example_header());
        assert_eq!(table.sessions.len(), 1);
        assert_eq!(table.sessions[0].lineno, 4);
    }

    #[test]
    fn header_outside_scan_window() {
        let mut records: Vec<Vec<String>> = (0..5).map(|_| rec(&["notes"])).collect();
        records.push(example_header());
        let raw = RawTable::from_records(records);
        let detection = HeaderDetection::Anchors {
            anchors: vec!["Total Farmers".to_string()],
            max_scan_rows: 3,
        };
        assert_eq!(locate_header(&raw, &detection), None);
        assert_eq!(locate_header(&raw, &HeaderDetection::FirstRow), Some(0));
    }

    #[test]
    fn duplicate_headers_follow_policy() {
        let header = rec(&["Total Farmers", "City", " Total Farmers "]);
        let map = FieldMap::new().with(Field::Farmers, "Total Farmers");
        let first = resolve_columns(&header, &map, DuplicateHeaderPolicy::FirstMatch);
        assert_eq!(first.get(Field::Farmers), Some(0));
        let last = resolve_columns(&header, &map, DuplicateHeaderPolicy::LastMatch);
        assert_eq!(last.get(Field::Farmers), Some(2));
        assert_eq!(last.get(Field::City), None);
    }

    #[test]
    fn byte_order_mark_is_ignored() {
        let header = rec(&["\u{feff}SN", "Total Farmers"]);
        let map = FieldMap::new().with(Field::Serial, "SN");
        let idx = resolve_columns(&header, &map, DuplicateHeaderPolicy::FirstMatch);
        assert_eq!(idx.get(Field::Serial), Some(0));
    }

    #[test]
    fn strict_filter_requires_location_and_count() {
        let raw = RawTable {
            header: example_header(),
            rows: vec![
                rec(&["1", "2024-03-01", "Multan", "Farm A", "120", "", "", ""]),
                rec(&["2", "2024-03-01", "Multan", "", "80", "", "", ""]),
                rec(&["3", "2024-03-01", "Multan", "Farm C", "many", "", "", ""]),
                rec(&["4", "2024-03-01", "Multan", "Farm D", "1,200", "", "", ""]),
                rec(&["5", "2024-03-01", "Multan", "Farm E", "45 farmers", "", "", ""]),
            ],
        };
        let map = FieldMap::activity_sheet();
        let mut options = NormalizeOptions::for_field_map(&map);
        assert_eq!(normalize_with(&raw, &map, &options).len(), 5);

        options.row_filter = RowFilter::Strict;
        let sessions = normalize_with(&raw, &map, &options);
        let serials: Vec<&str> = sessions.iter().map(|s| s.serial.as_str()).collect();
        assert_eq!(serials, vec!["1", "4", "5"]);
        assert_eq!(sessions[1].total_farmers, 1200.0);
        assert_eq!(sessions[2].total_farmers, 45.0);
    }

    #[test]
    fn day_key_fallbacks() {
        assert_eq!(day_key("", "2024-03-01", "Multan", "3", " – "), "2024-03-01 – Multan");
        assert_eq!(day_key("", "2024-03-01", "", "3", " – "), "2024-03-01");
        assert_eq!(day_key("", "", "Multan", "3", " – "), "Day 3");
        assert_eq!(day_key("", "", "Multan", "", " – "), "Day Unknown");
        assert_eq!(day_key("Day 2", "2024-03-01", "Multan", "3", " – "), "Day 2");
    }

    #[test]
    fn generic_date_is_a_fallback() {
        let raw = RawTable {
            header: rec(&["SN", "Date", "City", "Session Location", "Total Farmers"]),
            rows: vec![rec(&["9", "2024-04-10", "Vehari", "Canal bank", "30"])],
        };
        let sessions = normalize(&raw, &FieldMap::activity_sheet());
        assert_eq!(sessions[0].day, "2024-04-10 – Vehari");
    }

    #[test]
    fn summary_sheet_uses_day_column() {
        let raw = RawTable {
            header: rec(&[
                "Day",
                "City / Tehsil",
                "Session Location",
                "Total Farmers",
                "Maybe Rate",
            ]),
            rows: vec![
                rec(&["Day 1", "Multan", "Farm A", "40", "35%"]),
                rec(&["", "Multan", "Farm B", "20", "-"]),
            ],
        };
        let sessions = normalize(&raw, &FieldMap::summary_sheet());
        assert_eq!(sessions[0].day, "Day 1");
        assert_eq!(sessions[0].maybe_rate, Some(35.0));
        assert_eq!(sessions[1].day, "Day Unknown");
        assert_eq!(sessions[1].maybe_rate, None);
    }

    #[test]
    fn reasons_and_text_fields() {
        let raw = RawTable {
            header: rec(&[
                "Session Location",
                "Total Farmers",
                "Sales Rep",
                "Top Reason Use",
                "Top Reason Not Use",
            ]),
            rows: vec![rec(&[" Farm A ", "10", "Ali", "Yield", ""])],
        };
        let sessions = normalize(&raw, &FieldMap::activity_sheet());
        assert_eq!(sessions[0].location, "Farm A");
        assert_eq!(sessions[0].sales_rep, "Ali");
        assert_eq!(sessions[0].top_reason_use, Some("Yield".to_string()));
        assert_eq!(sessions[0].top_reason_not_use, None);
        assert_eq!(sessions[0].tehsil, "");
    }
}
