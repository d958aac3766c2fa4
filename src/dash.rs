use log::{debug, info, warn};

use outreach_sessions::*;
use snafu::{prelude::*, Snafu};

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::json;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;
use crate::dash::config_reader::*;
use crate::dash::io_common::simplify_file_name;

pub mod config_reader;
mod io_common;
mod io_csv;
mod io_excel;

#[derive(Debug, Snafu)]
pub enum DashError {
    #[snafu(display("Error opening file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error reading line {lineno} of {path}"))]
    CsvLineParse {
        source: csv::Error,
        path: String,
        lineno: usize,
    },
    #[snafu(display("Error opening file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("No worksheet found in {path}"))]
    EmptyExcel { path: String },
    #[snafu(display("Worksheet {name} not found in {path}"))]
    MissingWorksheet { name: String, path: String },
    #[snafu(display("{path} has several worksheets, the worksheet name must be provided"))]
    TooManyWorksheets { path: String },
    #[snafu(display("Error reading {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Error writing {path}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Invalid configuration: {source}"))]
    InvalidConfig { source: ConfigErrors },
    #[snafu(display("Unknown provider {provider}: expected csv or xlsx"))]
    UnknownProvider { provider: String },
    #[snafu(display("No input: use --input or a configuration file with sources"))]
    MissingInput {},
    #[snafu(display("Cannot find the directory of {path}"))]
    MissingParentDir { path: String },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type DashResult<T> = Result<T, DashError>;

/// Everything needed for one run, after merging the configuration file and the command line.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub name: Option<String>,
    /// The sources, with paths already resolved.
    pub sources: Vec<FileSource>,
    pub field_map: FieldMap,
    pub options: NormalizeOptions,
    pub day_filter: DayFilter,
    pub metric: Metric,
    pub day_order: DayOrder,
    pub include_table: bool,
}

#[derive(Debug, Clone)]
pub struct LoadedSessions {
    pub header: Vec<String>,
    pub sessions: Vec<Session>,
}

/// The outcome of loading all the sources.
///
/// A file that cannot be read is an error. A file without any valid row is
/// not: it is reported as `NoData`.
#[derive(Debug, Clone)]
pub enum LoadOutcome {
    Sessions(LoadedSessions),
    NoData,
}

fn resolve_settings(config: &DashConfig, root: &Path, args: &Args) -> DashResult<RunSettings> {
    let sources: Vec<FileSource> = if let Some(input) = args.input.clone() {
        vec![FileSource {
            provider: args.input_type.clone().unwrap_or_else(|| "csv".to_string()),
            file_path: input,
            excel_worksheet_name: args.excel_worksheet_name.clone(),
        }]
    } else {
        config
            .sources
            .iter()
            .map(|s| {
                let p: PathBuf = [root, Path::new(&s.file_path)].iter().collect();
                FileSource {
                    file_path: p.as_path().display().to_string(),
                    ..s.clone()
                }
            })
            .collect()
    };

    let field_map = config.field_map(args.schema.as_deref())?;
    let options = match &config.normalization {
        Some(n) => n.options(&field_map)?,
        None => NormalizeOptions::for_field_map(&field_map),
    };

    let settings = &config.output_settings;
    let day_filter = match args.day.clone().or_else(|| settings.day_filter.clone()) {
        Some(d) if d != "all" => DayFilter::Day(d),
        _ => DayFilter::All,
    };
    let metric: Metric = args
        .metric
        .clone()
        .or_else(|| settings.metric.clone())
        .unwrap_or_else(|| "farmers".to_string())
        .parse()
        .context(InvalidConfigSnafu {})?;
    let day_order = if args.sort_days || settings.sort_days.unwrap_or(false) {
        DayOrder::ByKey
    } else {
        DayOrder::FirstSeen
    };

    Ok(RunSettings {
        name: settings.dashboard_name.clone(),
        sources,
        field_map,
        options,
        day_filter,
        metric,
        day_order,
        include_table: args.include_table || settings.include_table.unwrap_or(false),
    })
}

fn read_source(source: &FileSource) -> DashResult<RawTable> {
    info!("Attempting to read session file {:?}", source.file_path);
    match source.provider.as_str() {
        "csv" => io_csv::read_csv_table(&source.file_path),
        "xlsx" => io_excel::read_excel_table(
            &source.file_path,
            source.excel_worksheet_name.as_deref(),
        ),
        x => UnknownProviderSnafu { provider: x }.fail(),
    }
}

pub fn load_sessions(settings: &RunSettings) -> DashResult<LoadOutcome> {
    ensure!(!settings.sources.is_empty(), MissingInputSnafu {});

    let mut header: Vec<String> = Vec::new();
    let mut sessions: Vec<Session> = Vec::new();
    for source in settings.sources.iter() {
        let raw = read_source(source)?;
        debug!(
            "load_sessions: {:?}: {} records",
            source.file_path,
            raw.num_records()
        );
        let table = normalize_table(&raw, &settings.field_map, &settings.options);
        if header.is_empty() {
            header = table.header;
        }
        sessions.extend(table.sessions);
    }

    if sessions.is_empty() {
        warn!("No session found in the sources");
        Ok(LoadOutcome::NoData)
    } else {
        info!("Loaded {} sessions", sessions.len());
        Ok(LoadOutcome::Sessions(LoadedSessions { header, sessions }))
    }
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

fn opt_round1(x: Option<f64>) -> JSValue {
    json!(x.map(round1))
}

// Farmer and acre totals are whole numbers in practice: emitted as integers when they are.
fn whole(x: f64) -> JSValue {
    if x.fract() == 0.0 && x.abs() < 9.0e15 {
        json!(x as i64)
    } else {
        json!(x)
    }
}

fn whole_series(xs: &[f64]) -> Vec<JSValue> {
    xs.iter().map(|x| whole(*x)).collect()
}

fn kpis_to_json(k: &Kpis) -> JSValue {
    json!({
        "totalFarmers": whole(k.total_farmers),
        "totalAcres": whole(k.total_acres),
        "sessionsHeld": k.sessions_held,
        "avgAwareness": opt_round1(k.avg_awareness),
        "avgDefinite": opt_round1(k.avg_definite),
        "avgAcresPerFarmer": round1(k.avg_acres_per_farmer),
        "repeatUsageSessions": k.repeat_usage_sessions,
        "repeatSharePct": round1(k.repeat_share_pct),
        "highMaybeSessions": k.high_maybe_sessions,
    })
}

fn days_to_json(days: &[DaySummary]) -> Vec<JSValue> {
    days.iter()
        .map(|d| {
            json!({
                "day": d.day,
                "sessions": d.count,
                "farmers": whole(d.farmers),
                "acres": whole(d.acres),
                "distanceKm": d.distance_km,
                "meanAwareness": opt_round1(d.mean_awareness),
                "meanDefinite": opt_round1(d.mean_definite),
                "meanMaybe": opt_round1(d.mean_maybe),
                "meanUsedLastYear": opt_round1(d.mean_used_last_year),
                "locations": d.locations,
            })
        })
        .collect()
}

fn markers_to_json(markers: &[MarkerData]) -> Vec<JSValue> {
    markers
        .iter()
        .map(|m| {
            json!({
                "lat": m.lat,
                "lng": m.lng,
                "severity": m.severity.name(),
                "radius": round1(m.radius),
                "label": m.label,
                "city": m.city,
            })
        })
        .collect()
}

fn bounds_to_json(b: Option<Bounds>) -> JSValue {
    match b {
        Some(b) => json!({"south": b.south, "west": b.west, "north": b.north, "east": b.east}),
        None => JSValue::Null,
    }
}

fn route_to_json(points: &[LatLng]) -> JSValue {
    let pts: Vec<JSValue> = points.iter().map(|p| json!([p.lat, p.lng])).collect();
    json!({
        "points": pts,
        "lengthKm": round1(route_length_km(points)),
    })
}

fn charts_to_json(series: &ChartSeries, signals: &SignalCounts) -> JSValue {
    let definite: Vec<JSValue> = series.definite.iter().map(|x| opt_round1(*x)).collect();
    json!({
        "labels": series.labels,
        "farmers": whole_series(&series.farmers),
        "acres": whole_series(&series.acres),
        "definite": definite,
        "distanceKm": series.distance_km,
        "signals": {
            "strongAwareness": signals.strong_awareness,
            "highMaybe": signals.high_maybe,
            "priceSensitive": signals.price_sensitive,
        }
    })
}

fn reasons_to_json(reasons: &[ReasonCount]) -> Vec<JSValue> {
    reasons
        .iter()
        .map(|rc| json!({"reason": rc.reason, "count": rc.count}))
        .collect()
}

/// Assembles the summary consumed by the presentation layer.
pub fn build_summary_js(settings: &RunSettings, outcome: &LoadOutcome) -> JSValue {
    let (all_sessions, header, status): (&[Session], &[String], &str) = match outcome {
        LoadOutcome::Sessions(l) => (l.sessions.as_slice(), l.header.as_slice(), "loaded"),
        LoadOutcome::NoData => (&[][..], &[][..], "noData"),
    };
    let working_set = filter_sessions(all_sessions, &settings.day_filter);
    debug!(
        "build_summary_js: {} sessions in the working set",
        working_set.len()
    );

    let days = aggregate_with(&working_set, settings.day_order);
    let sources: Vec<String> = settings
        .sources
        .iter()
        .map(|s| simplify_file_name(&s.file_path))
        .collect();
    let day_filter = match &settings.day_filter {
        DayFilter::All => "all".to_string(),
        DayFilter::Day(d) => d.clone(),
    };

    let mut summary = json!({
        "config": {
            "dashboardName": settings.name,
            "sources": sources,
            "dayFilter": day_filter,
            "dayOptions": day_options(all_sessions),
            "metric": settings.metric.name(),
            "sessionsLoaded": all_sessions.len(),
        },
        "status": status,
        "kpis": kpis_to_json(&compute_kpis(&working_set)),
        "days": days_to_json(&days),
        "markers": markers_to_json(&map_markers(&working_set, settings.metric)),
        "bounds": bounds_to_json(bounds(&working_set)),
        "route": route_to_json(&route(&working_set)),
        "charts": charts_to_json(&chart_series(&days), &signal_counts(&working_set)),
        "reasons": {
            "use": reasons_to_json(&reason_counts(&working_set, Field::TopReasonUse)),
            "notUse": reasons_to_json(&reason_counts(&working_set, Field::TopReasonNotUse)),
        },
    });
    if settings.include_table {
        let view = table_view(header, &working_set);
        summary["table"] = json!({"header": view.header, "rows": view.rows});
    }
    summary
}

fn load_config(args: &Args) -> DashResult<(DashConfig, PathBuf)> {
    match &args.config {
        Some(config_path) => {
            let config = read_config(config_path)?;
            info!("config: {:?}", config);
            let root = Path::new(config_path.as_str())
                .parent()
                .context(MissingParentDirSnafu {
                    path: config_path.clone(),
                })?
                .to_path_buf();
            Ok((config, root))
        }
        None => Ok((DashConfig::default(), PathBuf::new())),
    }
}

fn summarize_with(config: &DashConfig, root: &Path, args: &Args) -> DashResult<JSValue> {
    let settings = resolve_settings(config, root, args)?;
    debug!("settings: {:?}", settings);
    let outcome = load_sessions(&settings)?;
    Ok(build_summary_js(&settings, &outcome))
}

/// Loads the sources and builds the summary, without writing anything.
pub fn summarize(args: &Args) -> DashResult<JSValue> {
    let (config, root) = load_config(args)?;
    summarize_with(&config, &root, args)
}

fn write_summary(pretty_js: &str, target: Option<PathBuf>) -> DashResult<()> {
    match target {
        Some(p) => {
            let path = p.display().to_string();
            info!("Writing summary to {:?}", path);
            fs::write(&p, pretty_js).context(WritingOutputSnafu { path })
        }
        None => {
            println!("{}", pretty_js);
            Ok(())
        }
    }
}

pub fn run_dashboard(args: &Args) -> DashResult<()> {
    let (config, root) = load_config(args)?;
    let summary_js = summarize_with(&config, &root, args)?;
    let pretty_js = serde_json::to_string_pretty(&summary_js).context(ParsingJsonSnafu {})?;

    // --out wins over the output directory of the configuration.
    let target: Option<PathBuf> = match args.out.as_deref() {
        Some("stdout") | Some("") => None,
        Some(p) => Some(PathBuf::from(p)),
        None => config
            .output_settings
            .output_directory
            .as_ref()
            .map(|d| root.join(d).join("summary.json")),
    };
    write_summary(&pretty_js, target)?;

    // The reference summary, if provided for comparison
    if let Some(summary_p) = &args.reference {
        let summary_ref = read_summary(summary_p)?;
        let pretty_js_ref =
            serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {})?;
        if pretty_js_ref != pretty_js {
            warn!("Found differences with the reference summary");
            print_diff(pretty_js_ref.as_str(), pretty_js.as_str(), "\n");
            whatever!("Difference detected between the produced summary and the reference summary")
        }
        info!("The summary matches the reference {:?}", summary_p);
    }
    Ok(())
}
