use anyhow::{Context, Result};
use arrow::{
    array::{
        ArrayRef, Date32Array, Float64Array, Int64Array, StringArray, UInt32Array,
    },
    datatypes::{DataType, Field, Schema},
    record_batch::RecordBatch,
};
use chrono::NaiveDate;
use parquet::{
    arrow::ArrowWriter,
    basic::{BrotliLevel, Compression},
    file::properties::WriterProperties,
};
use std::{
    fs::{self, File},
    path::Path,
    sync::Arc,
};
use tracing::debug;

use crate::model::EnrichedSalesRecord;

/// Output table schema: the raw columns with `order_date` normalized to a
/// date, plus the four derived reporting columns. The table is always
/// (re)created from this schema; there is no evolution to handle.
pub fn output_schema() -> Schema {
    Schema::new(vec![
        Field::new("order_id", DataType::Utf8, false),
        Field::new("order_date", DataType::Date32, false),
        Field::new("month_of_sale", DataType::Utf8, false),
        Field::new("customer_id", DataType::Utf8, false),
        Field::new("customer_name", DataType::Utf8, false),
        Field::new("country", DataType::Utf8, false),
        Field::new("region", DataType::Utf8, false),
        Field::new("city", DataType::Utf8, false),
        Field::new("category", DataType::Utf8, false),
        Field::new("subcategory", DataType::Utf8, false),
        Field::new("quantity", DataType::Int64, false),
        Field::new("discount", DataType::Float64, false),
        Field::new("sales", DataType::Float64, false),
        Field::new("profit", DataType::Float64, false),
        Field::new("profit_margin", DataType::Float64, false),
        Field::new("discounted_sales", DataType::Float64, false),
        Field::new("sale_year", DataType::Int64, false),
        Field::new("sale_month", DataType::UInt32, false),
    ])
}

fn to_record_batch(records: &[EnrichedSalesRecord], schema: Arc<Schema>) -> Result<RecordBatch> {
    // Date32 is days since the Unix epoch
    let epoch = NaiveDate::default();

    let columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from_iter_values(
            records.iter().map(|r| r.order_id.as_str()),
        )),
        Arc::new(Date32Array::from_iter_values(
            records.iter().map(|r| (r.order_date - epoch).num_days() as i32),
        )),
        Arc::new(StringArray::from_iter_values(
            records.iter().map(|r| r.month_of_sale.as_str()),
        )),
        Arc::new(StringArray::from_iter_values(
            records.iter().map(|r| r.customer_id.as_str()),
        )),
        Arc::new(StringArray::from_iter_values(
            records.iter().map(|r| r.customer_name.as_str()),
        )),
        Arc::new(StringArray::from_iter_values(
            records.iter().map(|r| r.country.as_str()),
        )),
        Arc::new(StringArray::from_iter_values(
            records.iter().map(|r| r.region.as_str()),
        )),
        Arc::new(StringArray::from_iter_values(
            records.iter().map(|r| r.city.as_str()),
        )),
        Arc::new(StringArray::from_iter_values(
            records.iter().map(|r| r.category.as_str()),
        )),
        Arc::new(StringArray::from_iter_values(
            records.iter().map(|r| r.subcategory.as_str()),
        )),
        Arc::new(Int64Array::from_iter_values(
            records.iter().map(|r| r.quantity),
        )),
        Arc::new(Float64Array::from_iter_values(
            records.iter().map(|r| r.discount),
        )),
        Arc::new(Float64Array::from_iter_values(
            records.iter().map(|r| r.sales),
        )),
        Arc::new(Float64Array::from_iter_values(
            records.iter().map(|r| r.profit),
        )),
        Arc::new(Float64Array::from_iter_values(
            records.iter().map(|r| r.profit_margin),
        )),
        Arc::new(Float64Array::from_iter_values(
            records.iter().map(|r| r.discounted_sales),
        )),
        Arc::new(Int64Array::from_iter_values(
            records.iter().map(|r| i64::from(r.sale_year)),
        )),
        Arc::new(UInt32Array::from_iter_values(
            records.iter().map(|r| r.sale_month),
        )),
    ];

    RecordBatch::try_new(schema, columns).context("building enriched sales batch")
}

/// Persist enriched records as one parquet file. Returns bytes written.
pub fn write_parquet(records: &[EnrichedSalesRecord], output_path: &Path) -> Result<u64> {
    let schema = Arc::new(output_schema());
    let batch = to_record_batch(records, schema.clone())?;

    let file = File::create(output_path)
        .with_context(|| format!("creating file {}", output_path.display()))?;

    let props = WriterProperties::builder()
        .set_compression(Compression::BROTLI(BrotliLevel::try_new(5)?))
        .build();

    let mut writer =
        ArrowWriter::try_new(file, schema, Some(props)).context("creating parquet writer")?;
    writer.write(&batch).context("writing batch to parquet")?;
    writer.close().context("closing parquet writer")?;

    let metadata = fs::metadata(output_path).context("getting file metadata")?;
    debug!(
        rows = records.len(),
        bytes = metadata.len(),
        path = %output_path.display(),
        "wrote parquet"
    );

    Ok(metadata.len())
}
