//! Tabular store — the compiled price matrix as CSV.
//!
//! Layout: a `Date` column (ISO-8601, strictly ascending) followed by one
//! column per ticker. An empty cell is an absent price; it is never written
//! or read back as 0.

use std::io::{Read, Write};
use std::path::Path;

use chrono::NaiveDate;
use pricevote_core::data::{DataError, PriceMatrix};
use pricevote_core::domain::Cell;
use pricevote_core::labels::LabelFrame;
use tracing::debug;

/// Name of the first column in every store and label export.
pub const DATE_COLUMN: &str = "Date";

const DATE_FORMAT: &str = "%Y-%m-%d";

// ─── Reading ────────────────────────────────────────────────────────

/// Read a price matrix from any CSV source.
pub fn read_matrix<R: Read>(reader: R) -> Result<PriceMatrix, DataError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers().map_err(store_error)?.clone();
    let mut columns = headers.iter();
    match columns.next() {
        Some(first) if first == DATE_COLUMN => {}
        Some(other) => {
            return Err(DataError::Store(format!(
                "first column must be '{DATE_COLUMN}', found '{other}'"
            )))
        }
        None => return Err(DataError::Store("missing header row".into())),
    }
    let tickers: Vec<String> = columns.map(str::to_string).collect();

    let mut dates = Vec::new();
    let mut cells: Vec<Vec<Cell>> = vec![Vec::new(); tickers.len()];

    for record in rdr.records() {
        let record = record.map_err(store_error)?;
        let line = record.position().map_or(0, |p| p.line());

        let raw_date = record.get(0).unwrap_or_default();
        let date = NaiveDate::parse_from_str(raw_date, DATE_FORMAT).map_err(|e| {
            DataError::Store(format!("line {line}: bad date '{raw_date}': {e}"))
        })?;
        dates.push(date);

        for (col, raw) in record.iter().skip(1).enumerate() {
            let cell = if raw.is_empty() {
                Cell::Absent
            } else {
                let value: f64 = raw.parse().map_err(|_| {
                    DataError::Store(format!(
                        "line {line}: non-numeric value '{raw}' in column '{}'",
                        tickers[col]
                    ))
                })?;
                Cell::Present(value)
            };
            cells[col].push(cell);
        }
    }

    let matrix = PriceMatrix::new(dates, tickers, cells)?;
    debug!(
        rows = matrix.n_rows(),
        tickers = matrix.n_cols(),
        "tabular store read"
    );
    Ok(matrix)
}

/// Read a price matrix from a CSV file.
pub fn load_matrix(path: &Path) -> Result<PriceMatrix, DataError> {
    let file = std::fs::File::open(path)
        .map_err(|e| DataError::Io(format!("open {}: {e}", path.display())))?;
    read_matrix(file)
}

// ─── Writing ────────────────────────────────────────────────────────

/// Write a price matrix as CSV. Values use the shortest representation that
/// reads back to the same `f64`.
pub fn write_matrix<W: Write>(matrix: &PriceMatrix, writer: W) -> Result<(), DataError> {
    let mut wtr = csv::Writer::from_writer(writer);

    let mut header = Vec::with_capacity(matrix.n_cols() + 1);
    header.push(DATE_COLUMN.to_string());
    header.extend(matrix.tickers().iter().cloned());
    wtr.write_record(&header).map_err(store_error)?;

    for (row, date) in matrix.dates().iter().enumerate() {
        let mut record = Vec::with_capacity(matrix.n_cols() + 1);
        record.push(date.format(DATE_FORMAT).to_string());
        for col in 0..matrix.n_cols() {
            record.push(format_cell(matrix.cell(row, col)));
        }
        wtr.write_record(&record).map_err(store_error)?;
    }
    wtr.flush()
        .map_err(|e| DataError::Io(format!("flush store: {e}")))?;
    Ok(())
}

/// Write a price matrix to a CSV file, creating parent directories.
pub fn save_matrix(matrix: &PriceMatrix, path: &Path) -> Result<(), DataError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| DataError::Io(format!("create {}: {e}", parent.display())))?;
    }
    let file = std::fs::File::create(path)
        .map_err(|e| DataError::Io(format!("create {}: {e}", path.display())))?;
    write_matrix(matrix, file)?;
    debug!(path = %path.display(), rows = matrix.n_rows(), "tabular store written");
    Ok(())
}

/// Export horizon returns and labels: `Date`, `{T}_1d` .. `{T}_{H}d`,
/// `{T}_target`. Horizons past the last row are left empty.
pub fn write_label_frame<W: Write>(frame: &LabelFrame, writer: W) -> Result<(), DataError> {
    let horizons = frame.config().horizons;
    let mut wtr = csv::Writer::from_writer(writer);

    let mut header = vec![DATE_COLUMN.to_string()];
    header.extend((1..=horizons).map(|h| frame.horizon_column_name(h)));
    header.push(frame.target_column_name());
    wtr.write_record(&header).map_err(store_error)?;

    for (row, date) in frame.dates().iter().enumerate() {
        let mut record = vec![date.format(DATE_FORMAT).to_string()];
        for h in 1..=horizons {
            let cell = frame
                .returns(h)
                .map_or(Cell::Absent, |col| col[row]);
            record.push(format_cell(cell));
        }
        record.push(frame.labels()[row].to_string());
        wtr.write_record(&record).map_err(store_error)?;
    }
    wtr.flush()
        .map_err(|e| DataError::Io(format!("flush labels: {e}")))?;
    Ok(())
}

fn format_cell(cell: Cell) -> String {
    cell.value().map(|v| v.to_string()).unwrap_or_default()
}

fn store_error(e: csv::Error) -> DataError {
    match e.position() {
        Some(pos) => DataError::Store(format!("line {}: {e}", pos.line())),
        None => DataError::Store(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pricevote_core::labels::{generate_labels, LabelConfig};

    const SAMPLE: &str = "\
Date,AAA,BBB
2020-01-02,10.5,
2020-01-03,,20.25
2020-01-06,11,21
";

    #[test]
    fn reads_absent_cells() {
        let matrix = read_matrix(SAMPLE.as_bytes()).unwrap();
        assert_eq!(matrix.tickers(), &["AAA".to_string(), "BBB".to_string()]);
        assert_eq!(matrix.n_rows(), 3);
        assert_eq!(matrix.cell(0, 0), Cell::Present(10.5));
        assert_eq!(matrix.cell(0, 1), Cell::Absent);
        assert_eq!(matrix.cell(1, 0), Cell::Absent);
        assert_eq!(matrix.cell(2, 1), Cell::Present(21.0));
    }

    #[test]
    fn write_then_read_keeps_absent_cells() {
        let matrix = read_matrix(SAMPLE.as_bytes()).unwrap();
        let mut buf = Vec::new();
        write_matrix(&matrix, &mut buf).unwrap();
        let text = String::from_utf8(buf.clone()).unwrap();
        assert!(text.starts_with("Date,AAA,BBB\n2020-01-02,10.5,\n"));

        let back = read_matrix(buf.as_slice()).unwrap();
        assert_eq!(back, matrix);
        assert_eq!(back.fingerprint(), matrix.fingerprint());
    }

    #[test]
    fn rejects_wrong_first_column() {
        let err = read_matrix("Day,AAA\n2020-01-02,1\n".as_bytes()).unwrap_err();
        assert!(matches!(err, DataError::Store(msg) if msg.contains("Date")));
    }

    #[test]
    fn rejects_bad_numbers_with_line() {
        let err = read_matrix("Date,AAA\n2020-01-02,1\n2020-01-03,abc\n".as_bytes()).unwrap_err();
        match err {
            DataError::Store(msg) => {
                assert!(msg.contains("line 3"), "{msg}");
                assert!(msg.contains("abc"), "{msg}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn rejects_unsorted_dates() {
        let err = read_matrix("Date,AAA\n2020-01-03,1\n2020-01-02,2\n".as_bytes()).unwrap_err();
        assert!(matches!(err, DataError::Shape(_)));
    }

    #[test]
    fn label_export_has_named_columns() {
        let matrix = read_matrix("Date,AAA\n2020-01-02,100\n2020-01-03,103\n".as_bytes()).unwrap();
        let config = LabelConfig {
            horizons: 2,
            ..Default::default()
        };
        let frame = generate_labels(&matrix, "AAA", &config).unwrap();

        let mut buf = Vec::new();
        write_label_frame(&frame, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Date,AAA_1d,AAA_2d,AAA_target");
        assert_eq!(lines[1], "2020-01-02,0.03,,1");
        assert_eq!(lines[2], "2020-01-03,,,0");
    }
}
