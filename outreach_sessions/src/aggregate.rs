use log::debug;

use std::collections::HashMap;

use crate::config::*;

// ******** Output data structures *********

/// Statistics for one day key.
#[derive(PartialEq, Debug, Clone)]
pub struct DaySummary {
    pub day: String,
    pub count: usize,
    pub farmers: f64,
    pub acres: f64,
    pub distance_km: f64,
    /// Means over the sessions where the rate is present. `None` when no session has it.
    pub mean_awareness: Option<f64>,
    pub mean_definite: Option<f64>,
    pub mean_maybe: Option<f64>,
    pub mean_used_last_year: Option<f64>,
    /// Distinct locations (or cities when the location is missing), in first-seen order.
    pub locations: Vec<String>,
}

/// Headline numbers over a working set of sessions.
#[derive(PartialEq, Debug, Clone)]
pub struct Kpis {
    pub total_farmers: f64,
    pub total_acres: f64,
    pub sessions_held: usize,
    pub avg_awareness: Option<f64>,
    pub avg_definite: Option<f64>,
    /// 0 when there are no farmers.
    pub avg_acres_per_farmer: f64,
    /// Sessions where some farmers already used the product last year.
    pub repeat_usage_sessions: usize,
    /// Share of repeat-usage sessions, in percent. 0 for an empty working set.
    pub repeat_share_pct: f64,
    /// Sessions with a maybe rate above 30%, candidates for a follow-up.
    pub high_maybe_sessions: usize,
}

/// Four-tier classification of a rate, used for coloring.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum Severity {
    Strong,
    Moderate,
    Weak,
    /// Below 40%, or unknown.
    None,
}

impl Severity {
    pub fn name(&self) -> &'static str {
        match self {
            Severity::Strong => "strong",
            Severity::Moderate => "moderate",
            Severity::Weak => "weak",
            Severity::None => "none",
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum DayOrder {
    /// Order in which the day keys first appear.
    FirstSeen,
    /// Lexicographic order of the day keys, for charts.
    ByKey,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub enum DayFilter {
    All,
    Day(String),
}

/// Per-day series, aligned on `labels`.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub farmers: Vec<f64>,
    pub acres: Vec<f64>,
    pub definite: Vec<Option<f64>>,
    pub distance_km: Vec<f64>,
}

/// Rough adoption and rejection signals over the working set.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Default)]
pub struct SignalCounts {
    pub strong_awareness: usize,
    pub high_maybe: usize,
    pub price_sensitive: usize,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ReasonCount {
    pub reason: String,
    pub count: usize,
}

/// The raw view of the working set: the header and the original cells.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct TableView {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

// ******** Aggregation *********

const REPEAT_USAGE_THRESHOLD: f64 = 0.0;
const HIGH_MAYBE_THRESHOLD: f64 = 30.0;

// Starts from +0.0: an empty `sum()` of floats is -0.0.
fn total(values: impl Iterator<Item = f64>) -> f64 {
    values.fold(0.0, |acc, x| acc + x)
}

fn mean(values: impl Iterator<Item = Option<f64>>) -> Option<f64> {
    let (sum, n) = values
        .flatten()
        .fold((0.0, 0usize), |(sum, n), x| (sum + x, n + 1));
    if n == 0 {
        None
    } else {
        Some(sum / n as f64)
    }
}

fn summarize_day(day: &str, sessions: &[&Session]) -> DaySummary {
    let mut locations: Vec<String> = Vec::new();
    for s in sessions.iter() {
        let loc = if s.location.is_empty() {
            &s.city
        } else {
            &s.location
        };
        if !loc.is_empty() && !locations.contains(loc) {
            locations.push(loc.clone());
        }
    }
    DaySummary {
        day: day.to_string(),
        count: sessions.len(),
        farmers: total(sessions.iter().map(|s| s.total_farmers)),
        acres: total(sessions.iter().map(|s| s.total_acres)),
        distance_km: total(sessions.iter().map(|s| s.distance_km)),
        mean_awareness: mean(sessions.iter().map(|s| s.awareness_rate)),
        mean_definite: mean(sessions.iter().map(|s| s.definite_rate)),
        mean_maybe: mean(sessions.iter().map(|s| s.maybe_rate)),
        mean_used_last_year: mean(sessions.iter().map(|s| s.used_last_year_rate)),
        locations,
    }
}

/// Groups the sessions by day key, in the requested order.
pub fn aggregate_with(sessions: &[Session], order: DayOrder) -> Vec<DaySummary> {
    let mut keys: Vec<&str> = Vec::new();
    let mut groups: HashMap<&str, Vec<&Session>> = HashMap::new();
    for s in sessions.iter() {
        let day = s.day.as_str();
        groups
            .entry(day)
            .or_insert_with(|| {
                keys.push(day);
                Vec::new()
            })
            .push(s);
    }
    if order == DayOrder::ByKey {
        keys.sort();
    }
    debug!("aggregate_with: {} sessions in {} days", sessions.len(), keys.len());
    keys.iter()
        .filter_map(|k| groups.get(k).map(|g| summarize_day(k, g)))
        .collect()
}

/// Groups the sessions by day key, keeping the order in which days first appear.
pub fn aggregate(sessions: &[Session]) -> Vec<DaySummary> {
    aggregate_with(sessions, DayOrder::FirstSeen)
}

pub fn compute_kpis(sessions: &[Session]) -> Kpis {
    let total_farmers = total(sessions.iter().map(|s| s.total_farmers));
    let total_acres = total(sessions.iter().map(|s| s.total_acres));
    let repeat_usage_sessions = sessions
        .iter()
        .filter(|s| matches!(s.used_last_year_rate, Some(x) if x > REPEAT_USAGE_THRESHOLD))
        .count();
    let high_maybe_sessions = sessions
        .iter()
        .filter(|s| matches!(s.maybe_rate, Some(x) if x > HIGH_MAYBE_THRESHOLD))
        .count();
    Kpis {
        total_farmers,
        total_acres,
        sessions_held: sessions.len(),
        avg_awareness: mean(sessions.iter().map(|s| s.awareness_rate)),
        avg_definite: mean(sessions.iter().map(|s| s.definite_rate)),
        avg_acres_per_farmer: if total_farmers == 0.0 {
            0.0
        } else {
            total_acres / total_farmers
        },
        repeat_usage_sessions,
        repeat_share_pct: if sessions.is_empty() {
            0.0
        } else {
            repeat_usage_sessions as f64 / sessions.len() as f64 * 100.0
        },
        high_maybe_sessions,
    }
}

/// The color tier of a rate. Awareness and definite-use coloring both go through here.
pub fn severity(rate: Option<f64>) -> Severity {
    match rate {
        Some(x) if x >= 80.0 => Severity::Strong,
        Some(x) if x >= 60.0 => Severity::Moderate,
        Some(x) if x >= 40.0 => Severity::Weak,
        _ => Severity::None,
    }
}

/// The distinct day keys, in first-seen order.
pub fn day_options(sessions: &[Session]) -> Vec<String> {
    let mut res: Vec<String> = Vec::new();
    for s in sessions.iter() {
        if !s.day.is_empty() && !res.contains(&s.day) {
            res.push(s.day.clone());
        }
    }
    res
}

/// The working set for a filter. Filtering on an unknown day gives an empty set.
pub fn filter_sessions(sessions: &[Session], filter: &DayFilter) -> Vec<Session> {
    match filter {
        DayFilter::All => sessions.to_vec(),
        DayFilter::Day(day) => sessions.iter().filter(|s| s.day == *day).cloned().collect(),
    }
}

pub fn chart_series(summaries: &[DaySummary]) -> ChartSeries {
    ChartSeries {
        labels: summaries.iter().map(|d| d.day.clone()).collect(),
        farmers: summaries.iter().map(|d| d.farmers).collect(),
        acres: summaries.iter().map(|d| d.acres).collect(),
        definite: summaries.iter().map(|d| d.mean_definite).collect(),
        distance_km: summaries.iter().map(|d| d.distance_km).collect(),
    }
}

pub fn signal_counts(sessions: &[Session]) -> SignalCounts {
    let count = |pred: &dyn Fn(&Session) -> bool| sessions.iter().filter(|s| pred(s)).count();
    SignalCounts {
        strong_awareness: count(&|s: &Session| matches!(s.awareness_rate, Some(x) if x >= 70.0)),
        high_maybe: count(&|s: &Session| matches!(s.maybe_rate, Some(x) if x >= 40.0)),
        price_sensitive: count(&|s: &Session| matches!(s.definite_rate, Some(x) if x < 40.0)),
    }
}

/// Tallies the top reasons given for using (`Field::TopReasonUse`) or not
/// using (`Field::TopReasonNotUse`) the product.
///
/// Most frequent first, ties in first-seen order.
pub fn reason_counts(sessions: &[Session], field: Field) -> Vec<ReasonCount> {
    let mut res: Vec<ReasonCount> = Vec::new();
    for s in sessions.iter() {
        let reason = match field {
            Field::TopReasonUse => s.top_reason_use.as_ref(),
            Field::TopReasonNotUse => s.top_reason_not_use.as_ref(),
            _ => None,
        };
        if let Some(r) = reason {
            match res.iter_mut().find(|rc| rc.reason == *r) {
                Some(rc) => rc.count += 1,
                None => res.push(ReasonCount {
                    reason: r.clone(),
                    count: 1,
                }),
            }
        }
    }
    // Stable sort: ties keep their first-seen order.
    res.sort_by(|a, b| b.count.cmp(&a.count));
    res
}

pub fn table_view(header: &[String], sessions: &[Session]) -> TableView {
    TableView {
        header: header.to_vec(),
        rows: sessions.iter().map(|s| s.cells.clone()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(day: &str, location: &str, farmers: f64, acres: f64) -> Session {
        Session {
            day: day.to_string(),
            location: location.to_string(),
            total_farmers: farmers,
            total_acres: acres,
            ..Default::default()
        }
    }

    #[test]
    fn groups_in_first_seen_order() {
        let sessions = vec![
            session("B", "x", 10.0, 20.0),
            session("A", "y", 5.0, 5.0),
            session("B", "z", 1.0, 2.0),
            session("B", "x", 1.0, 1.0),
        ];
        let days = aggregate(&sessions);
        let labels: Vec<&str> = days.iter().map(|d| d.day.as_str()).collect();
        assert_eq!(labels, vec!["B", "A"]);
        assert_eq!(days[0].count, 3);
        assert_eq!(days[0].farmers, 12.0);
        assert_eq!(days[0].acres, 23.0);
        assert_eq!(days[0].locations, vec!["x".to_string(), "z".to_string()]);

        let sorted = aggregate_with(&sessions, DayOrder::ByKey);
        let labels: Vec<&str> = sorted.iter().map(|d| d.day.as_str()).collect();
        assert_eq!(labels, vec!["A", "B"]);
    }

    #[test]
    fn means_skip_absent_rates() {
        let mut s1 = session("A", "x", 10.0, 10.0);
        s1.awareness_rate = Some(80.0);
        s1.definite_rate = Some(0.0);
        let mut s2 = session("A", "y", 10.0, 10.0);
        s2.awareness_rate = None;
        s2.definite_rate = Some(50.0);
        let days = aggregate(&[s1, s2]);
        assert_eq!(days[0].mean_awareness, Some(80.0));
        assert_eq!(days[0].mean_definite, Some(25.0));
        assert_eq!(days[0].mean_maybe, None);
        assert_eq!(days[0].mean_used_last_year, None);
    }

    #[test]
    fn location_falls_back_to_city() {
        let mut s1 = session("A", "", 1.0, 1.0);
        s1.city = "Multan".to_string();
        let s2 = session("A", "", 1.0, 1.0);
        let days = aggregate(&[s1, s2]);
        assert_eq!(days[0].locations, vec!["Multan".to_string()]);
    }

    #[test]
    fn kpis() {
        let mut s1 = session("A", "x", 100.0, 250.0);
        s1.used_last_year_rate = Some(10.0);
        s1.maybe_rate = Some(31.0);
        s1.awareness_rate = Some(70.0);
        let mut s2 = session("B", "y", 150.0, 250.0);
        s2.used_last_year_rate = Some(0.0);
        s2.maybe_rate = Some(30.0);
        let mut s3 = session("B", "z", 0.0, 0.0);
        s3.used_last_year_rate = None;
        s3.maybe_rate = None;
        s3.awareness_rate = Some(90.0);
        let k = compute_kpis(&[s1, s2, s3, session("C", "w", 0.0, 0.0)]);
        assert_eq!(k.total_farmers, 250.0);
        assert_eq!(k.total_acres, 500.0);
        assert_eq!(k.sessions_held, 4);
        assert_eq!(k.avg_acres_per_farmer, 2.0);
        assert_eq!(k.avg_awareness, Some(80.0));
        assert_eq!(k.avg_definite, None);
        assert_eq!(k.repeat_usage_sessions, 1);
        assert_eq!(k.repeat_share_pct, 25.0);
        assert_eq!(k.high_maybe_sessions, 1);
    }

    #[test]
    fn kpis_on_empty_set() {
        let k = compute_kpis(&[]);
        assert_eq!(k.total_farmers, 0.0);
        assert_eq!(k.sessions_held, 0);
        assert_eq!(k.avg_acres_per_farmer, 0.0);
        assert_eq!(k.repeat_share_pct, 0.0);
        assert_eq!(k.avg_awareness, None);
        assert!(!k.total_farmers.is_sign_negative());
        assert!(!k.total_acres.is_sign_negative());
        assert!(aggregate(&[]).is_empty());
        assert_eq!(chart_series(&[]), ChartSeries::default());
    }

    #[test]
    fn severity_tiers() {
        assert_eq!(severity(Some(80.0)), Severity::Strong);
        assert_eq!(severity(Some(79.9)), Severity::Moderate);
        assert_eq!(severity(Some(60.0)), Severity::Moderate);
        assert_eq!(severity(Some(40.0)), Severity::Weak);
        assert_eq!(severity(Some(39.0)), Severity::None);
        assert_eq!(severity(None), Severity::None);
        assert_eq!(Severity::Weak.name(), "weak");
    }

    #[test]
    fn day_filter() {
        let sessions = vec![
            session("A", "x", 1.0, 1.0),
            session("B", "y", 2.0, 2.0),
            session("A", "z", 3.0, 3.0),
        ];
        assert_eq!(day_options(&sessions), vec!["A".to_string(), "B".to_string()]);
        let a = filter_sessions(&sessions, &DayFilter::Day("A".to_string()));
        assert_eq!(a.len(), 2);
        assert_eq!(filter_sessions(&sessions, &DayFilter::All).len(), 3);
        assert!(filter_sessions(&sessions, &DayFilter::Day("Z".to_string())).is_empty());
    }

    #[test]
    fn charts_keep_absent_means() {
        let mut s1 = session("A", "x", 1.0, 2.0);
        s1.definite_rate = Some(40.0);
        s1.distance_km = 12.0;
        let s2 = session("B", "y", 3.0, 4.0);
        let series = chart_series(&aggregate(&[s1, s2]));
        assert_eq!(series.labels, vec!["A".to_string(), "B".to_string()]);
        assert_eq!(series.farmers, vec![1.0, 3.0]);
        assert_eq!(series.acres, vec![2.0, 4.0]);
        assert_eq!(series.definite, vec![Some(40.0), None]);
        assert_eq!(series.distance_km, vec![12.0, 0.0]);
    }

    #[test]
    fn signals_ignore_absent_rates() {
        let mut s1 = session("A", "x", 1.0, 1.0);
        s1.awareness_rate = Some(70.0);
        s1.maybe_rate = Some(40.0);
        s1.definite_rate = Some(39.0);
        let s2 = session("A", "y", 1.0, 1.0);
        let counts = signal_counts(&[s1, s2]);
        assert_eq!(
            counts,
            SignalCounts {
                strong_awareness: 1,
                high_maybe: 1,
                price_sensitive: 1
            }
        );
    }

    #[test]
    fn reasons_by_frequency() {
        let reasons = ["Price", "Yield", "Yield", "Availability", "Price", "Yield"];
        let sessions: Vec<Session> = reasons
            .iter()
            .map(|r| Session {
                top_reason_not_use: Some(r.to_string()),
                ..Default::default()
            })
            .collect();
        let counts = reason_counts(&sessions, Field::TopReasonNotUse);
        let flat: Vec<(&str, usize)> = counts
            .iter()
            .map(|rc| (rc.reason.as_str(), rc.count))
            .collect();
        assert_eq!(flat, vec![("Yield", 3), ("Price", 2), ("Availability", 1)]);
        assert!(reason_counts(&sessions, Field::TopReasonUse).is_empty());
    }

    #[test]
    fn table_keeps_raw_cells() {
        let s = Session {
            cells: vec!["1".to_string(), "Farm A".to_string()],
            ..Default::default()
        };
        let header = vec!["SN".to_string(), "Session Location".to_string()];
        let view = table_view(&header, &[s]);
        assert_eq!(view.header, header);
        assert_eq!(view.rows, vec![vec!["1".to_string(), "Farm A".to_string()]]);
    }
}
