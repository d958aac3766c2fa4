use crate::dash::*;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct OutputSettings {
    #[serde(rename = "dashboardName")]
    pub dashboard_name: Option<String>,
    #[serde(rename = "outputDirectory")]
    pub output_directory: Option<String>,
    #[serde(rename = "dayFilter")]
    pub day_filter: Option<String>,
    pub metric: Option<String>,
    #[serde(rename = "sortDays")]
    pub sort_days: Option<bool>,
    #[serde(rename = "includeTable")]
    pub include_table: Option<bool>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct FileSource {
    pub provider: String,
    #[serde(rename = "filePath")]
    pub file_path: String,
    #[serde(rename = "excelWorksheetName")]
    pub excel_worksheet_name: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct NormalizationSettings {
    #[serde(rename = "duplicateHeaders")]
    pub duplicate_headers: Option<String>,
    #[serde(rename = "anchorHeaders")]
    pub anchor_headers: Option<Vec<String>>,
    // Number or string
    #[serde(rename = "headerScanRows")]
    pub header_scan_rows: Option<JSValue>,
    #[serde(rename = "rowFilter")]
    pub row_filter: Option<String>,
    #[serde(rename = "dayDelimiter")]
    pub day_delimiter: Option<String>,
}

fn invalid_option(name: &str, value: &str) -> DashError {
    DashError::InvalidConfig {
        source: ConfigErrors::InvalidOption {
            name: name.to_string(),
            value: value.to_string(),
        },
    }
}

impl NormalizationSettings {
    /// The normalizer options: the defaults of the field map, overridden by the settings.
    pub fn options(&self, field_map: &FieldMap) -> DashResult<NormalizeOptions> {
        let mut options = NormalizeOptions::for_field_map(field_map);

        match self.duplicate_headers.as_deref() {
            None | Some("firstMatch") => {}
            Some("lastMatch") => options.duplicate_headers = DuplicateHeaderPolicy::LastMatch,
            Some(x) => return Err(invalid_option("duplicateHeaders", x)),
        }

        match self.row_filter.as_deref() {
            None | Some("lenient") => {}
            Some("strict") => options.row_filter = RowFilter::Strict,
            Some(x) => return Err(invalid_option("rowFilter", x)),
        }

        if let Some(delim) = &self.day_delimiter {
            options.day_delimiter = delim.clone();
        }

        let scan_rows = match &self.header_scan_rows {
            None => None,
            Some(js) => Some(
                read_js_int(js).ok_or_else(|| invalid_option("headerScanRows", &js.to_string()))?,
            ),
        };
        let anchors = match (&self.anchor_headers, &options.header_detection) {
            (Some(a), _) => Some(a.clone()),
            (None, HeaderDetection::Anchors { anchors, .. }) => Some(anchors.clone()),
            (None, HeaderDetection::FirstRow) => None,
        };
        options.header_detection = match (anchors, scan_rows) {
            // Scanning zero rows means the first row is the header.
            (_, Some(0)) => HeaderDetection::FirstRow,
            (Some(anchors), n) if !anchors.is_empty() => HeaderDetection::Anchors {
                anchors,
                max_scan_rows: n.unwrap_or(NormalizeOptions::DEFAULT_SCAN_ROWS),
            },
            _ => HeaderDetection::FirstRow,
        };
        Ok(options)
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct DashConfig {
    #[serde(rename = "outputSettings", default)]
    pub output_settings: OutputSettings,
    #[serde(default)]
    pub sources: Vec<FileSource>,
    pub schema: Option<String>,
    #[serde(rename = "fieldMap")]
    pub field_map: Option<BTreeMap<String, String>>,
    pub normalization: Option<NormalizationSettings>,
}

impl DashConfig {
    /// The field map: an explicit `fieldMap` wins over the schema preset.
    /// The schema given on the command line wins over the one of the file.
    pub fn field_map(&self, schema_override: Option<&str>) -> DashResult<FieldMap> {
        if let Some(fm) = &self.field_map {
            let pairs: Vec<(&str, &str)> =
                fm.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
            return FieldMap::from_pairs(&pairs).context(InvalidConfigSnafu {});
        }
        match schema_override.or(self.schema.as_deref()) {
            None | Some("activity") => Ok(FieldMap::activity_sheet()),
            Some("summary") => Ok(FieldMap::summary_sheet()),
            Some(x) => whatever!("unknown schema: {} (expected activity or summary)", x),
        }
    }
}

pub fn read_config(path: &str) -> DashResult<DashConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let config: DashConfig =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(config)
}

pub fn read_summary(path: &str) -> DashResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(js)
}

fn read_js_int(x: &JSValue) -> Option<usize> {
    match x {
        JSValue::Number(n) => n.as_u64().map(|x| x as usize),
        JSValue::String(s) => s.trim().parse::<usize>().ok(),
        _ => None,
    }
}
