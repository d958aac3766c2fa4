// ********* Input data structures ***********

use std::error::Error;
use std::fmt::Display;

/// A table as produced by the loaders: text cells only, no typing.
///
/// The `header` is the first physical record of the file. When the file
/// carries a metadata preamble, the real header row is somewhere in `rows`
/// and is found by the header detection (see [HeaderDetection]).
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct RawTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Builds a table out of all the records of a file, the first one being the header.
    pub fn from_records(records: Vec<Vec<String>>) -> RawTable {
        let mut iter = records.into_iter();
        let header = iter.next().unwrap_or_default();
        RawTable {
            header,
            rows: iter.collect(),
        }
    }

    /// The number of physical records, header included.
    pub fn num_records(&self) -> usize {
        if self.header.is_empty() && self.rows.is_empty() {
            0
        } else {
            self.rows.len() + 1
        }
    }

    /// The physical record at the given position (0 is the header).
    pub fn record(&self, idx: usize) -> Option<&[String]> {
        if idx == 0 {
            Some(self.header.as_slice())
        } else {
            self.rows.get(idx - 1).map(|r| r.as_slice())
        }
    }
}

/// The semantic fields understood by the normalizer.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum Field {
    Serial,
    ActivityDate,
    /// Generic date column, used when there is no activity date.
    Date,
    /// A precomputed day label, as found in summary sheets.
    Day,
    City,
    Location,
    Tehsil,
    SalesRep,
    Farmers,
    Acres,
    DistanceKm,
    AwarenessRate,
    DefiniteRate,
    MaybeRate,
    UsedLastYearRate,
    Coords,
    TopReasonUse,
    TopReasonNotUse,
}

impl Field {
    pub const ALL: [Field; 18] = [
        Field::Serial,
        Field::ActivityDate,
        Field::Date,
        Field::Day,
        Field::City,
        Field::Location,
        Field::Tehsil,
        Field::SalesRep,
        Field::Farmers,
        Field::Acres,
        Field::DistanceKm,
        Field::AwarenessRate,
        Field::DefiniteRate,
        Field::MaybeRate,
        Field::UsedLastYearRate,
        Field::Coords,
        Field::TopReasonUse,
        Field::TopReasonNotUse,
    ];

    /// The name used for this field in configuration files.
    pub fn name(&self) -> &'static str {
        match self {
            Field::Serial => "serial",
            Field::ActivityDate => "activityDate",
            Field::Date => "date",
            Field::Day => "day",
            Field::City => "city",
            Field::Location => "location",
            Field::Tehsil => "tehsil",
            Field::SalesRep => "salesRep",
            Field::Farmers => "farmers",
            Field::Acres => "acres",
            Field::DistanceKm => "distanceKm",
            Field::AwarenessRate => "awarenessRate",
            Field::DefiniteRate => "definiteRate",
            Field::MaybeRate => "maybeRate",
            Field::UsedLastYearRate => "usedLastYearRate",
            Field::Coords => "coords",
            Field::TopReasonUse => "topReasonUse",
            Field::TopReasonNotUse => "topReasonNotUse",
        }
    }

    pub fn from_name(name: &str) -> Option<Field> {
        Field::ALL.iter().find(|f| f.name() == name).copied()
    }
}

/// The mapping from semantic fields to the exact header text of the sheet.
///
/// Different sheet layouts are expressed as different field maps, the
/// normalizer itself does not change.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct FieldMap {
    entries: Vec<(Field, String)>,
}

impl FieldMap {
    pub fn new() -> FieldMap {
        FieldMap {
            entries: Vec::new(),
        }
    }

    /// Sets the header for a field, replacing any previous one.
    pub fn with(mut self, field: Field, header: &str) -> FieldMap {
        self.entries.retain(|(f, _)| *f != field);
        self.entries.push((field, header.to_string()));
        self
    }

    /// Builds a map out of (semantic name, header text) pairs.
    pub fn from_pairs<S: AsRef<str>>(pairs: &[(S, S)]) -> Result<FieldMap, ConfigErrors> {
        let mut res = FieldMap::new();
        for (name, header) in pairs {
            let field = Field::from_name(name.as_ref())
                .ok_or_else(|| ConfigErrors::UnknownField(name.as_ref().to_string()))?;
            res = res.with(field, header.as_ref());
        }
        if res.is_empty() {
            return Err(ConfigErrors::EmptyFieldMap);
        }
        Ok(res)
    }

    pub fn header(&self, field: Field) -> Option<&str> {
        self.entries
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, h)| h.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &(Field, String)> {
        self.entries.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Layout of the per-activity sheets (one row per session, with a serial number).
    pub fn activity_sheet() -> FieldMap {
        FieldMap::new()
            .with(Field::Serial, "SN")
            .with(Field::ActivityDate, "Activity Date")
            .with(Field::Date, "Date")
            .with(Field::City, "City")
            .with(Field::Location, "Session Location")
            .with(Field::Tehsil, "Tehsil")
            .with(Field::SalesRep, "Sales Rep")
            .with(Field::Farmers, "Total Farmers")
            .with(Field::Acres, "Total Wheat Acres")
            .with(Field::DistanceKm, "Approximate Distance (km)")
            .with(Field::AwarenessRate, "Awareness Rate")
            .with(Field::DefiniteRate, "Definite Use Rate")
            .with(Field::MaybeRate, "Maybe Rate")
            .with(Field::UsedLastYearRate, "Used Last Year Rate")
            .with(Field::Coords, "Spot Coordinates")
            .with(Field::TopReasonUse, "Top Reason Use")
            .with(Field::TopReasonNotUse, "Top Reason Not Use")
    }

    /// Layout of the summary sheets, where the day label is already a column.
    pub fn summary_sheet() -> FieldMap {
        FieldMap::new()
            .with(Field::Day, "Day")
            .with(Field::City, "City / Tehsil")
            .with(Field::Location, "Session Location")
            .with(Field::Farmers, "Total Farmers")
            .with(Field::Acres, "Total Wheat Acres")
            .with(Field::AwarenessRate, "Awareness Rate")
            .with(Field::DefiniteRate, "Definite Use Rate")
            .with(Field::MaybeRate, "Maybe Rate")
            .with(Field::UsedLastYearRate, "Used Last Year Rate")
            .with(Field::Coords, "Spot Coordinates")
            .with(Field::DistanceKm, "Approximate Distance (km)")
    }
}

// ********* Configuration **********

/// Which column wins when the same header text appears several times.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum DuplicateHeaderPolicy {
    FirstMatch,
    LastMatch,
}

/// How the header row is found.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum HeaderDetection {
    /// The first record is the header.
    FirstRow,
    /// The header is the first of the first `max_scan_rows` records that has
    /// a cell equal (after trimming) to one of the anchors.
    Anchors {
        anchors: Vec<String>,
        max_scan_rows: usize,
    },
}

/// Which rows are dropped before normalization.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum RowFilter {
    /// Only blank rows (and rows with neither a location nor a farmers count) are dropped.
    Lenient,
    /// The location must be filled and the farmers count must start with a number.
    Strict,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct NormalizeOptions {
    pub duplicate_headers: DuplicateHeaderPolicy,
    pub header_detection: HeaderDetection,
    pub row_filter: RowFilter,
    pub day_delimiter: String,
}

impl NormalizeOptions {
    pub const DEFAULT_SCAN_ROWS: usize = 10;
    pub const DEFAULT_DAY_DELIMITER: &'static str = " – ";

    /// The default options, anchoring the header detection on the location
    /// and farmers headers of the field map.
    pub fn for_field_map(field_map: &FieldMap) -> NormalizeOptions {
        let anchors: Vec<String> = [Field::Location, Field::Farmers]
            .iter()
            .filter_map(|f| field_map.header(*f))
            .map(|s| s.trim().to_string())
            .collect();
        let header_detection = if anchors.is_empty() {
            HeaderDetection::FirstRow
        } else {
            HeaderDetection::Anchors {
                anchors,
                max_scan_rows: NormalizeOptions::DEFAULT_SCAN_ROWS,
            }
        };
        NormalizeOptions {
            duplicate_headers: DuplicateHeaderPolicy::FirstMatch,
            header_detection,
            row_filter: RowFilter::Lenient,
            day_delimiter: NormalizeOptions::DEFAULT_DAY_DELIMITER.to_string(),
        }
    }
}

// ******** Output data structures *********

#[derive(PartialEq, Debug, Clone, Copy)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

/// One normalized outreach session.
///
/// Rates and coordinates are `None` when absent, which is different from 0.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct Session {
    /// Grouping key and display label, derived from the date and the city.
    pub day: String,
    pub serial: String,
    pub date: String,
    pub city: String,
    pub location: String,
    pub tehsil: String,
    pub sales_rep: String,
    pub total_farmers: f64,
    pub total_acres: f64,
    pub distance_km: f64,
    pub awareness_rate: Option<f64>,
    pub definite_rate: Option<f64>,
    pub maybe_rate: Option<f64>,
    pub used_last_year_rate: Option<f64>,
    pub coords: Option<LatLng>,
    pub top_reason_use: Option<String>,
    pub top_reason_not_use: Option<String>,
    /// Line of the record in the source (1-based, header and preamble included).
    pub lineno: usize,
    /// The raw cells of the record, for the table view.
    pub cells: Vec<String>,
}

impl Session {
    pub fn lat(&self) -> Option<f64> {
        self.coords.map(|c| c.lat)
    }

    pub fn lng(&self) -> Option<f64> {
        self.coords.map(|c| c.lng)
    }

    /// The value of a rate field, if this field is a rate.
    pub fn rate(&self, field: Field) -> Option<f64> {
        match field {
            Field::AwarenessRate => self.awareness_rate,
            Field::DefiniteRate => self.definite_rate,
            Field::MaybeRate => self.maybe_rate,
            Field::UsedLastYearRate => self.used_last_year_rate,
            _ => None,
        }
    }
}

/// The result of a normalization, with the header that was effectively used.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct NormalizedTable {
    pub header: Vec<String>,
    pub sessions: Vec<Session>,
}

/// Errors in the configuration of the normalizer.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum ConfigErrors {
    UnknownField(String),
    EmptyFieldMap,
    InvalidOption { name: String, value: String },
}

impl Error for ConfigErrors {}

impl Display for ConfigErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigErrors::UnknownField(name) => write!(f, "unknown field {:?}", name),
            ConfigErrors::EmptyFieldMap => write!(f, "the field map is empty"),
            ConfigErrors::InvalidOption { name, value } => {
                write!(f, "invalid value {:?} for option {}", value, name)
            }
        }
    }
}
