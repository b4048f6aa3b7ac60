use anyhow::{Context, Result};
use csv::ReaderBuilder;
use glob::glob;
use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};
use tracing::debug;

use crate::error::TransformError;
use crate::model::{RawSalesRecord, RAW_FIELD_COUNT};

/// List staged CSV files under `stage_dir`, sorted so runs are deterministic.
pub fn discover_staged_files(stage_dir: &Path) -> Result<Vec<PathBuf>> {
    let pattern = format!("{}/*.csv", stage_dir.display());
    let mut files: Vec<PathBuf> = glob(&pattern)
        .with_context(|| format!("bad stage pattern {pattern}"))?
        .filter_map(std::result::Result::ok)
        .collect();
    files.sort();
    Ok(files)
}

/// Decode one staged CSV into raw records.
///
/// The header row is skipped; fields are comma-separated. Any data row whose
/// field count disagrees with the fixed sales schema aborts the run with a
/// `SchemaMismatch` — missing fields are a structural violation, never
/// patched over with nulls.
pub fn read_records(path: &Path) -> Result<Vec<RawSalesRecord>> {
    let file =
        File::open(path).with_context(|| format!("opening staged file {}", path.display()))?;
    // flexible so a short row reaches our own field-count check instead of
    // surfacing as a library error
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(BufReader::new(file));

    let mut records = Vec::new();
    for (row, result) in rdr.records().enumerate() {
        let record = result
            .with_context(|| format!("CSV parse error in {} at row {}", path.display(), row))?;

        if record.len() != RAW_FIELD_COUNT {
            return Err(TransformError::SchemaMismatch {
                row,
                expected: RAW_FIELD_COUNT,
                found: record.len(),
            }
            .into());
        }

        let raw: RawSalesRecord = record.deserialize(None).with_context(|| {
            format!(
                "row {} in {} does not match the sales schema",
                row,
                path.display()
            )
        })?;
        records.push(raw);
    }

    debug!(rows = records.len(), path = %path.display(), "decoded staged file");
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink;
    use crate::transform::{self, DateErrorPolicy};
    use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
    use std::io::Write;
    use tempfile::TempDir;
    use tracing_subscriber::{EnvFilter, FmtSubscriber};

    fn init_test_logging() {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new("info,salespipe::stage=debug")),
            )
            .with_test_writer()
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    }

    const HEADER: &str = "order_id,order_date,month_of_sale,customer_id,customer_name,country,region,city,category,subcategory,quantity,discount,sales,profit";

    fn write_staged(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        let mut f = File::create(&path).unwrap();
        writeln!(f, "{HEADER}").unwrap();
        write!(f, "{body}").unwrap();
        path
    }

    #[test]
    fn decodes_well_formed_rows() {
        let dir = TempDir::new().unwrap();
        let path = write_staged(
            dir.path(),
            "sales_2024_03.csv",
            "O1,2024-03-15,March,C1,Ada,Australia,VIC,Melbourne,Furniture,Chairs,2,0.1,100.0,20.0\n\
             O2,2024-03-16,March,C2,Grace,Australia,NSW,Sydney,Office,Paper,1,0.0,30.5,-2.0\n",
        );

        let records = read_records(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].order_id, "O1");
        assert_eq!(records[0].quantity, 2);
        assert_eq!(records[0].discount, 0.1);
        assert_eq!(records[1].profit, -2.0);
    }

    #[test]
    fn short_row_is_a_schema_mismatch() {
        let dir = TempDir::new().unwrap();
        let path = write_staged(
            dir.path(),
            "bad.csv",
            "O1,2024-03-15,March,C1,Ada,Australia,VIC,Melbourne,Furniture,Chairs,2,0.1,100.0,20.0\n\
             O2,2024-03-16,March,C2,Grace,Australia,NSW,Sydney,Office,Paper,1,0.0\n",
        );

        let err = read_records(&path).unwrap_err();
        let mismatch = err.downcast_ref::<TransformError>().expect("typed error");
        assert_eq!(
            *mismatch,
            TransformError::SchemaMismatch {
                row: 1,
                expected: RAW_FIELD_COUNT,
                found: 12
            }
        );
    }

    #[test]
    fn unparsable_numeric_field_aborts() {
        let dir = TempDir::new().unwrap();
        let path = write_staged(
            dir.path(),
            "bad_types.csv",
            "O1,2024-03-15,March,C1,Ada,Australia,VIC,Melbourne,Furniture,Chairs,two,0.1,100.0,20.0\n",
        );

        assert!(read_records(&path).is_err());
    }

    #[test]
    fn staged_file_flows_through_to_parquet() -> Result<()> {
        init_test_logging();
        let dir = TempDir::new().unwrap();
        let path = write_staged(
            dir.path(),
            "sales_2024_03.csv",
            "O1,2024-03-15,March,C1,Ada,Australia,VIC,Melbourne,Furniture,Chairs,2,0.1,100.0,20.0\n\
             O2,2024-03-16,March,C2,Grace,Australia,NSW,Sydney,Office,Paper,1,0.0,50.0,-5.0\n\
             O3,15-03-2024,March,C3,Edsger,Australia,QLD,Brisbane,Office,Pens,3,0.0,10.0,1.0\n",
        );

        let raw = read_records(&path)?;
        let (enriched, summary) = transform::transform(raw, DateErrorPolicy::Skip)?;
        assert_eq!(summary.retained, 1);
        assert_eq!(summary.filtered, 1);
        assert_eq!(summary.bad_dates, 1);

        let out = dir.path().join("sales_2024_03.parquet");
        sink::write_parquet(&enriched, &out)?;

        let reader = ParquetRecordBatchReaderBuilder::try_new(File::open(&out)?)?.build()?;
        let total: usize = reader.map(|b| b.unwrap().num_rows()).sum();
        assert_eq!(total, 1);
        Ok(())
    }

    #[test]
    fn discovery_is_sorted_and_csv_only() {
        let dir = TempDir::new().unwrap();
        for name in ["b.csv", "a.csv", "notes.txt"] {
            File::create(dir.path().join(name)).unwrap();
        }

        let found = discover_staged_files(dir.path()).unwrap();
        let names: Vec<_> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.csv", "b.csv"]);
    }
}
