// Primitives for reading Excel workbooks.

use calamine::{open_workbook, DataType, Reader, Xlsx};

use crate::dash::*;

/// Reads the cells of one worksheet as text.
///
/// Without a worksheet name, the workbook must have exactly one worksheet.
pub fn read_excel_table(path: &str, worksheet_name: Option<&str>) -> DashResult<RawTable> {
    let wrange = get_range(path, worksheet_name)?;
    let records: Vec<Vec<String>> = wrange
        .rows()
        .map(|row| row.iter().map(cell_text).collect())
        .collect();
    debug!("read_excel_table: {:?}: {} records", path, records.len());
    Ok(RawTable::from_records(records))
}

fn cell_text(cell: &DataType) -> String {
    match cell {
        DataType::String(s) => s.clone(),
        DataType::Empty => String::new(),
        DataType::Int(i) => i.to_string(),
        DataType::Float(f) => f.to_string(),
        DataType::Bool(b) => b.to_string(),
        DataType::DateTime(_) => match cell.as_date() {
            Some(d) => d.to_string(),
            None => String::new(),
        },
        x => {
            warn!("cell_text: unreadable cell {:?}, read as empty", x);
            String::new()
        }
    }
}

fn get_range(path: &str, worksheet_name_o: Option<&str>) -> DashResult<calamine::Range<DataType>> {
    debug!(
        "get_range: path: {:?} worksheet: {:?}",
        path, worksheet_name_o
    );
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path })?;

    // A worksheet name was provided, use it.
    if let Some(worksheet_name) = worksheet_name_o {
        let wrange = workbook
            .worksheet_range(worksheet_name)
            .context(MissingWorksheetSnafu {
                name: worksheet_name,
                path,
            })?
            .context(OpeningExcelSnafu { path })?;
        Ok(wrange)
    } else {
        let all_worksheets = workbook.worksheets();
        match all_worksheets.as_slice() {
            [] => EmptyExcelSnafu { path }.fail(),
            [(worksheet_name, wrange)] => {
                debug!("get_range: path: {:?} worksheet: {:?}", path, worksheet_name);
                Ok(wrange.clone())
            }
            _ => TooManyWorksheetsSnafu { path }.fail(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells_as_text() {
        assert_eq!(cell_text(&DataType::String("Farm A".to_string())), "Farm A");
        assert_eq!(cell_text(&DataType::Float(120.0)), "120");
        assert_eq!(cell_text(&DataType::Float(28.5)), "28.5");
        assert_eq!(cell_text(&DataType::Int(7)), "7");
        assert_eq!(cell_text(&DataType::Empty), "");
        assert_eq!(cell_text(&DataType::Bool(true)), "true");
        // 2024-03-01 in the 1900 date system.
        assert_eq!(cell_text(&DataType::DateTime(45352.0)), "2024-03-01");
    }

    fn two_sheets() -> String {
        format!(
            "{}/testdata/workbooks/two_sheets.xlsx",
            env!("CARGO_MANIFEST_DIR")
        )
    }

    #[test]
    fn several_worksheets_need_a_name() {
        let path = two_sheets();
        assert!(matches!(
            read_excel_table(&path, None),
            Err(DashError::TooManyWorksheets { .. })
        ));
        assert!(matches!(
            read_excel_table(&path, Some("Summary")),
            Err(DashError::MissingWorksheet { .. })
        ));
        let table = read_excel_table(&path, Some("Sessions")).unwrap();
        assert_eq!(table.header, vec!["Session Location", "Total Farmers"]);
        assert_eq!(table.rows, vec![vec!["Farm A", "120"]]);
    }

    #[test]
    fn missing_workbook() {
        let res = read_excel_table("does_not_exist.xlsx", None);
        assert!(matches!(res, Err(DashError::OpeningExcel { .. })));
    }
}
