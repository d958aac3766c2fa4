/*!

# Quick start

The field team keeps one row per outreach session in a shared spreadsheet,
exported as CSV. The export usually looks like this, with a title line above
the real header:

```text
March sessions,,,,,
SN,Activity Date,City,Session Location,Total Farmers,Total Wheat Acres,Awareness Rate
1,2024-03-01,Multan,Farm A,120,300,75%
2,2024-03-01,Multan,Farm B,"1,000",900,N/A
,,,,,,
3,2024-03-02,Bahawalpur,Village C,40,80,90%
```

The loaders of the command line turn such a file into a [RawTable](crate::RawTable)
of text cells. From there, the library does the rest:

```
use outreach_sessions::*;

let records: Vec<Vec<String>> = vec![
    vec!["March sessions", "", "", "", "", "", ""],
    vec!["SN", "Activity Date", "City", "Session Location", "Total Farmers", "Total Wheat Acres", "Awareness Rate"],
    vec!["1", "2024-03-01", "Multan", "Farm A", "120", "300", "75%"],
    vec!["2", "2024-03-01", "Multan", "Farm B", "1,000", "900", "N/A"],
    vec!["", "", "", "", "", "", ""],
    vec!["3", "2024-03-02", "Bahawalpur", "Village C", "40", "80", "90%"],
]
.into_iter()
.map(|r| r.into_iter().map(|s| s.to_string()).collect())
.collect();
let raw = RawTable::from_records(records);

let sessions = normalize(&raw, &FieldMap::activity_sheet());
assert_eq!(sessions.len(), 3);
assert_eq!(sessions[1].total_farmers, 1000.0);
assert_eq!(sessions[1].awareness_rate, None);

let days = aggregate(&sessions);
assert_eq!(days.len(), 2);
assert_eq!(days[0].day, "2024-03-01 – Multan");
assert_eq!(days[0].farmers, 1120.0);
// Farm B has no awareness rate: it does not count in the mean.
assert_eq!(days[0].mean_awareness, Some(75.0));

let kpis = compute_kpis(&sessions);
assert_eq!(kpis.sessions_held, 3);
assert_eq!(kpis.total_acres, 1280.0);
```

The same result is obtained with the command line:

```bash
outreach -i march_sessions.csv
```

which prints the summary in JSON format. See the [manual](crate::manual) for
the configuration file and the other layouts.
*/
