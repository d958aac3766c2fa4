/*!

This is the long-form manual for `outreach_sessions` and the `outreach` command.

## Input formats

The following formats are supported by the command line:
* `csv` Comma Separated Values, UTF-8
* `xlsx` Excel workbooks (one worksheet)

Both are read as plain text cells. Typing happens in the normalizer.

### Header row

Sheets exported from shared spreadsheets often start with a few lines of
notes before the real header. The header row is the first record, within
the first `headerScanRows` records (default 10), that has a cell equal to one
of the `anchorHeaders`. By default the anchors are the headers mapped to
`location` and `farmers`.

When a header text is repeated, `duplicateHeaders` decides which column is
used: `firstMatch` (default) or `lastMatch`.

### Field map

The field map tells which header holds which field. Two presets exist:

* `activity` : `SN`, `Activity Date`, `Date`, `City`, `Session Location`, `Tehsil`,
  `Sales Rep`, `Total Farmers`, `Total Wheat Acres`, `Approximate Distance (km)`,
  `Awareness Rate`, `Definite Use Rate`, `Maybe Rate`, `Used Last Year Rate`,
  `Spot Coordinates`, `Top Reason Use`, `Top Reason Not Use`
* `summary` : `Day`, `City / Tehsil`, `Session Location`, `Total Farmers`, `Total Wheat Acres`,
  `Awareness Rate`, `Definite Use Rate`, `Maybe Rate`, `Used Last Year Rate`,
  `Spot Coordinates`, `Approximate Distance (km)`

Any other layout can be described with an explicit `fieldMap`, keyed by field name:
`serial`, `activityDate`, `date`, `day`, `city`, `location`, `tehsil`, `salesRep`,
`farmers`, `acres`, `distanceKm`, `awarenessRate`, `definiteRate`, `maybeRate`,
`usedLastYearRate`, `coords`, `topReasonUse`, `topReasonNotUse`.

A field whose header is not in the sheet reads as an empty cell on every row.

## Values

* counts (`farmers`, `acres`, `distanceKm`): thousands separators are ignored,
  anything that is not a number counts as 0.
* rates: a trailing `%` is allowed. Empty cells, `-`, `N/A` and values outside
  0-100 are *absent*. Absent rates are left out of the averages: a day where no
  session has a rate has no average (`null` in the summary, "N/A" on screen).
* coordinates: either two decimal numbers (`28.5, 69.2`, latitude first) or two
  degrees-minutes-seconds values (`28°09'13.2"N 71°30'00"E`).

Rows that are completely empty, or that have neither a location nor a farmers
count, are ignored. With `rowFilter: strict`, the location must be filled and the
farmers count must start with a number.

## Days

Sessions are grouped by a day key: the activity date and the city joined by
`dayDelimiter` (default ` – `), e.g. `2024-03-01 – Multan`. Without a date, the
key is `Day <SN>` or `Day Unknown`. With the `summary` preset the `Day` column is
used as is.

## Configuration file

```json
{
  "outputSettings": {
    "dashboardName": "Wheat outreach 2024",
    "dayFilter": null,
    "metric": "farmers",
    "sortDays": false,
    "includeTable": false
  },
  "sources": [
    { "provider": "csv", "filePath": "sessions.csv" }
  ],
  "schema": "activity",
  "normalization": {
    "duplicateHeaders": "firstMatch",
    "headerScanRows": 10,
    "rowFilter": "lenient"
  }
}
```

The summary is written as JSON: headline numbers (`kpis`), one entry per day
(`days`), the map markers and their `bounds`, the chart series and the tallies
of the reasons given by the farmers.
*/
