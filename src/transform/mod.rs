pub mod date;

use crate::error::TransformError;
use crate::model::{EnrichedSalesRecord, RawSalesRecord};
use chrono::Datelike;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// What to do when a row's `order_date` fails to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateErrorPolicy {
    /// Drop the offending row, log it, and keep going.
    #[default]
    Skip,
    /// Fail the whole run on the first bad date.
    Abort,
}

/// Row counts for one transform run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TransformSummary {
    pub input_rows: usize,
    /// Rows that passed the filter and were enriched.
    pub retained: usize,
    /// Rows dropped by the `sales > 0 && profit > 0` predicate.
    pub filtered: usize,
    /// Rows skipped for an unparsable date (skip policy only).
    pub bad_dates: usize,
}

/// Per-row kernel: normalize the date, apply the filter, derive columns.
///
/// `Ok(None)` means the row was excluded by the filter — a designed silent
/// drop, not an error. Derivations:
/// `profit_margin = profit / sales`,
/// `discounted_sales = sales * (1 - discount)`,
/// `sale_year` / `sale_month` from the parsed `order_date`.
pub fn enrich(
    row: usize,
    raw: &RawSalesRecord,
) -> Result<Option<EnrichedSalesRecord>, TransformError> {
    let order_date =
        date::parse_order_date(&raw.order_date).ok_or_else(|| TransformError::DateParse {
            row,
            value: raw.order_date.clone(),
        })?;

    if !(raw.sales > 0.0 && raw.profit > 0.0) {
        return Ok(None);
    }

    // The filter above guarantees sales > 0; the division still checks its
    // own precondition so a reordering of steps cannot emit inf margins.
    if raw.sales == 0.0 {
        return Err(TransformError::ZeroSales { row });
    }

    Ok(Some(EnrichedSalesRecord {
        order_id: raw.order_id.clone(),
        month_of_sale: raw.month_of_sale.clone(),
        customer_id: raw.customer_id.clone(),
        customer_name: raw.customer_name.clone(),
        country: raw.country.clone(),
        region: raw.region.clone(),
        city: raw.city.clone(),
        category: raw.category.clone(),
        subcategory: raw.subcategory.clone(),
        quantity: raw.quantity,
        discount: raw.discount,
        sales: raw.sales,
        profit: raw.profit,
        profit_margin: raw.profit / raw.sales,
        discounted_sales: raw.sales * (1.0 - raw.discount),
        sale_year: order_date.year(),
        sale_month: order_date.month(),
        order_date,
    }))
}

/// Sequential reference path. Consumes the input exactly once and preserves
/// the relative order of retained rows (stable filter). The caller sees
/// either the complete output sequence or a run-level failure.
pub fn transform<I>(
    records: I,
    on_date_error: DateErrorPolicy,
) -> Result<(Vec<EnrichedSalesRecord>, TransformSummary), TransformError>
where
    I: IntoIterator<Item = RawSalesRecord>,
{
    let mut out = Vec::new();
    let mut summary = TransformSummary::default();

    for (row, raw) in records.into_iter().enumerate() {
        summary.input_rows += 1;
        collect_row(enrich(row, &raw), on_date_error, &mut out, &mut summary)?;
    }

    Ok((out, summary))
}

/// Data-parallel path. Rows are independent, so fan the kernel out with
/// rayon; the indexed collect restores input order, so the output matches
/// the sequential path exactly.
pub fn transform_parallel(
    records: &[RawSalesRecord],
    on_date_error: DateErrorPolicy,
) -> Result<(Vec<EnrichedSalesRecord>, TransformSummary), TransformError> {
    let results: Vec<Result<Option<EnrichedSalesRecord>, TransformError>> = records
        .par_iter()
        .enumerate()
        .map(|(row, raw)| enrich(row, raw))
        .collect();

    let mut out = Vec::with_capacity(records.len());
    let mut summary = TransformSummary {
        input_rows: records.len(),
        ..TransformSummary::default()
    };
    for res in results {
        collect_row(res, on_date_error, &mut out, &mut summary)?;
    }

    Ok((out, summary))
}

fn collect_row(
    res: Result<Option<EnrichedSalesRecord>, TransformError>,
    on_date_error: DateErrorPolicy,
    out: &mut Vec<EnrichedSalesRecord>,
    summary: &mut TransformSummary,
) -> Result<(), TransformError> {
    match res {
        Ok(Some(rec)) => {
            summary.retained += 1;
            out.push(rec);
        }
        Ok(None) => summary.filtered += 1,
        Err(err) if err.is_row_level() && on_date_error == DateErrorPolicy::Skip => {
            warn!("{err}; skipping row");
            summary.bad_dates += 1;
        }
        Err(err) => return Err(err),
    }
    Ok(())
}
