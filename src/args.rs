use clap::Parser;

/// This is a summarizing program for farmer-outreach session sheets.
#[derive(Parser, Debug, Clone, Default)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) The JSON file describing the sources, the field map and the output settings.
    /// For more information about the file format, read the documentation of the outreach_sessions crate (manual).
    #[clap(short, long, value_parser)]
    pub config: Option<String>,
    /// (file path) A reference summary in JSON format. If provided, the produced summary
    /// is checked against it.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the summary will be written in JSON format to the given
    /// location. Setting this option overrides the output directory that may be specified with the --config option.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path or empty) If specified, the session sheet to read. Setting this option overrides the
    /// sources that may be specified with the --config option.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (default csv) The type of the input: csv or xlsx.
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    /// (optional if the workbook has a single worksheet) When using an Excel file, indicates the name of
    /// the worksheet to use. It is required when the workbook has several worksheets.
    #[clap(long, value_parser)]
    pub excel_worksheet_name: Option<String>,

    /// (default activity) The layout of the sheet when no field map is configured: activity or summary.
    #[clap(long, value_parser)]
    pub schema: Option<String>,

    /// (day key or empty) Restricts the summary to the sessions of one day.
    #[clap(long, value_parser)]
    pub day: Option<String>,

    /// (default farmers) The metric used for the size of the map markers: farmers, acres, awareness or definite.
    #[clap(long, value_parser)]
    pub metric: Option<String>,

    /// If passed as an argument, the days are sorted by key instead of appearing in file order.
    #[clap(long, takes_value = false)]
    pub sort_days: bool,

    /// If passed as an argument, the raw rows of the sessions are added to the summary.
    #[clap(long, takes_value = false)]
    pub include_table: bool,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
