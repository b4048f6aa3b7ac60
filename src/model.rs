use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Field count of the staged CSV schema. Fixed and positional; any row that
/// disagrees is a structural violation, not a recoverable one.
pub const RAW_FIELD_COUNT: usize = 14;

/// One row as parsed from a staged sales CSV, before any enrichment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSalesRecord {
    pub order_id: String,
    /// Textual date, expected `YYYY-MM-DD`.
    pub order_date: String,
    pub month_of_sale: String,
    pub customer_id: String,
    pub customer_name: String,
    pub country: String,
    pub region: String,
    pub city: String,
    pub category: String,
    pub subcategory: String,
    pub quantity: i64,
    /// Fraction in `[0, 1)`.
    pub discount: f64,
    pub sales: f64,
    pub profit: f64,
}

/// A raw record that passed the filter, plus the derived reporting columns.
/// Built functionally from one `RawSalesRecord`; the raw value is never
/// mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedSalesRecord {
    pub order_id: String,
    /// Normalized from the raw textual date.
    pub order_date: NaiveDate,
    pub month_of_sale: String,
    pub customer_id: String,
    pub customer_name: String,
    pub country: String,
    pub region: String,
    pub city: String,
    pub category: String,
    pub subcategory: String,
    pub quantity: i64,
    pub discount: f64,
    pub sales: f64,
    pub profit: f64,
    pub profit_margin: f64,
    pub discounted_sales: f64,
    pub sale_year: i32,
    pub sale_month: u32,
}
