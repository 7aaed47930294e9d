//! CSV ingest and validation.
//!
//! Turns a photometer measurement table into a `SampleSet`:
//!
//! - headerless, comma separated
//! - one row per measurement repetition, one column per pixel intensity
//! - `#` comment lines and blank lines are ignored, cells are trimmed
//!
//! Unlike a bond list, a measurement table is all-or-nothing: a single bad
//! cell means the run was recorded wrong, so every problem aborts the load
//! with a `DataLoad` error naming the line.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::info;

use crate::domain::{RunConfig, SampleSet};
use crate::error::AppError;

/// Load the table named by `config.input_path`.
pub fn load_sample_set(config: &RunConfig) -> Result<SampleSet, AppError> {
    let path = config.input_path.as_path();
    let file =
        File::open(path).map_err(|e| AppError::data_load(path, format!("cannot open: {e}")))?;
    let set = read_sample_set(file, path, config)?;
    info!(
        path = %path.display(),
        repetitions = set.repetitions(),
        samples = set.x().len(),
        "loaded measurement table"
    );
    Ok(set)
}

/// Parse a measurement table from any reader; `path` is only used in errors.
pub fn read_sample_set<R: Read>(
    reader: R,
    path: &Path,
    config: &RunConfig,
) -> Result<SampleSet, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .comment(Some(b'#'))
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut rows: Vec<Vec<f64>> = Vec::new();
    for result in reader.records() {
        let record =
            result.map_err(|e| AppError::data_load(path, format!("CSV parse error: {e}")))?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        let row = parse_row(&record, line).map_err(|reason| AppError::data_load(path, reason))?;
        if let Some(first) = rows.first() {
            if row.len() != first.len() {
                return Err(AppError::data_load(
                    path,
                    format!(
                        "line {line}: expected {} values, found {}",
                        first.len(),
                        row.len()
                    ),
                ));
            }
        }
        rows.push(row);
    }

    let Some(first) = rows.first() else {
        return Err(AppError::data_load(path, "table has no measurement rows"));
    };
    let width = first.len();
    if width != config.samples {
        return Err(AppError::data_load(
            path,
            format!("expected {} samples per row, found {width}", config.samples),
        ));
    }
    if width < 2 {
        return Err(AppError::data_load(
            path,
            format!("need at least 2 samples per row, found {width}"),
        ));
    }

    SampleSet::new(config.x_grid(width), rows).map_err(|reason| AppError::data_load(path, reason))
}

fn parse_row(record: &csv::StringRecord, line: u64) -> Result<Vec<f64>, String> {
    record
        .iter()
        .enumerate()
        .map(|(col, cell)| {
            // Spreadsheet exports sometimes start with a UTF-8 BOM.
            let cell = cell.trim_start_matches('\u{feff}');
            let value: f64 = cell
                .parse()
                .map_err(|_| format!("line {line}, column {}: '{cell}' is not a number", col + 1))?;
            if !value.is_finite() {
                return Err(format!("line {line}, column {}: value is not finite", col + 1));
            }
            Ok(value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str, config: &RunConfig) -> Result<SampleSet, AppError> {
        read_sample_set(text.as_bytes(), Path::new("mem.csv"), config)
    }

    fn three_columns() -> RunConfig {
        RunConfig {
            samples: 3,
            ..RunConfig::default()
        }
    }

    #[test]
    fn reads_rows_and_skips_comments() {
        let text = "# photometer run 1\n1, 2, 3\n\n# second pass\n3,2,1\n";
        let set = parse(text, &three_columns()).unwrap();
        assert_eq!(set.repetitions(), 2);
        assert_eq!(set.x(), &[-1.0, 0.0, 1.0]);
        assert_eq!(set.rows()[1], vec![3.0, 2.0, 1.0]);
    }

    #[test]
    fn rejects_non_numeric_cell() {
        let err = parse("1,2,3\n4,abc,6\n", &three_columns()).unwrap_err();
        let msg = err.to_string();
        assert!(matches!(err, AppError::DataLoad { .. }));
        assert!(msg.contains("'abc' is not a number"), "{msg}");
        assert!(msg.contains("line 2"), "{msg}");
    }

    #[test]
    fn rejects_ragged_rows() {
        let err = parse("1,2,3\n4,5\n", &three_columns()).unwrap_err();
        assert!(err.to_string().contains("expected 3 values, found 2"));
    }

    #[test]
    fn rejects_sample_count_mismatch() {
        let err = parse("1,2,3\n", &RunConfig::default()).unwrap_err();
        assert!(err.to_string().contains("expected 17 samples"));
    }

    #[test]
    fn default_config_rejects_sixteen_column_table() {
        let row: Vec<String> = (0..16).map(|i| format!("{}", 10 * i)).collect();
        let text = format!("{}\n{}\n", row.join(","), row.join(","));
        let err = parse(&text, &RunConfig::default()).unwrap_err();
        assert!(matches!(err, AppError::DataLoad { .. }));
        assert!(err.to_string().contains("expected 17 samples per row, found 16"));

        let row17: Vec<String> = (0..17).map(|i| format!("{}", 10 * i)).collect();
        let set = parse(&row17.join(","), &RunConfig::default()).unwrap();
        assert_eq!(set.x().len(), 17);
        assert!(set.x()[8].abs() < 1e-15);
    }

    #[test]
    fn rejects_empty_and_non_finite() {
        assert!(parse("# nothing here\n", &three_columns()).is_err());
        let err = parse("1,NaN,3\n", &three_columns()).unwrap_err();
        assert!(err.to_string().contains("not finite"));
    }

    #[test]
    fn missing_file_is_a_load_error() {
        let config = RunConfig {
            input_path: "definitely/not/here.csv".into(),
            ..RunConfig::default()
        };
        let err = load_sample_set(&config).unwrap_err();
        assert!(matches!(err, AppError::DataLoad { .. }));
        assert_eq!(err.exit_code(), 2);
    }
}
