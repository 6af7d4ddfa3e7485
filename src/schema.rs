use chrono::{DateTime, Utc, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SalesAnalyticsError};

/// Maps each semantic column to the header name used by the upstream export.
///
/// The defaults match the canonical storefront export. Callers whose export
/// uses different headers construct their own map instead of renaming columns
/// in the file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ColumnMap {
    pub order_id: String,
    pub created_at: String,
    pub last_changed_at: String,
    pub total_value: String,
    pub quantity: String,
    pub shipping_value: String,
    pub discount_total: String,
    pub product_name: String,
    pub city: String,
    pub category_id: String,
    pub payment_method: String,
    pub traffic_source: String,
    pub cancellation_reason: String,
}

impl Default for ColumnMap {
    fn default() -> Self {
        Self {
            order_id: "Order".to_string(),
            created_at: "Creation Date".to_string(),
            last_changed_at: "Last Change Date".to_string(),
            total_value: "Total Value".to_string(),
            quantity: "Quantity_SKU".to_string(),
            shipping_value: "Shipping Value".to_string(),
            discount_total: "Discounts Totals".to_string(),
            product_name: "SKU Name".to_string(),
            city: "City".to_string(),
            category_id: "Category Ids Sku".to_string(),
            payment_method: "Payment System Name".to_string(),
            traffic_source: "UtmSource".to_string(),
            cancellation_reason: "Cancellation Reason".to_string(),
        }
    }
}

/// Explicit pipeline configuration, passed in at session construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub columns: ColumnMap,

    /// Columns whose missing fraction exceeds this value are dropped before
    /// typed coercion runs.
    pub sparsity_threshold: f64,

    /// Sentinel for absent payment methods and traffic sources.
    pub unknown_label: String,

    /// Sentinel for orders that were never cancelled.
    pub not_cancelled_label: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            columns: ColumnMap::default(),
            sparsity_threshold: 0.90,
            unknown_label: "Unknown".to_string(),
            not_cancelled_label: "Not cancelled".to_string(),
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.sparsity_threshold) {
            return Err(SalesAnalyticsError::InvalidSparsityThreshold(
                self.sparsity_threshold,
            ));
        }
        Ok(())
    }
}

/// One uploaded table of untyped cell values.
///
/// Blank and whitespace-only cells are normalized to `None` on construction;
/// ragged rows are padded or truncated to the header width so column indexing
/// stays in bounds.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    headers: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Option<String>>>) -> Self {
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, None);
                row.into_iter()
                    .map(|cell| cell.filter(|c| !c.trim().is_empty()))
                    .collect()
            })
            .collect();

        Self { headers, rows }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<Option<String>>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }
}

/// One coerced transaction row.
///
/// Every field is optional: a cell that is absent from the upload, belongs to
/// a pruned column, or fails to parse stays `None` rather than being zeroed
/// or dropping the whole row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CleanedRecord {
    pub order_id: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub last_changed_at: Option<DateTime<Utc>>,
    pub total_value: Option<f64>,
    pub quantity: Option<f64>,
    pub shipping_value: Option<f64>,
    pub discount_total: Option<f64>,
    pub product_name: Option<String>,
    pub city: Option<String>,
    pub category_id: Option<String>,
    pub payment_method: Option<String>,
    pub traffic_source: Option<String>,
    pub cancellation_reason: Option<String>,

    // Derived from `created_at`; absent whenever the timestamp is absent.
    pub month: Option<u32>,
    pub weekday: Option<Weekday>,
    pub hour_of_day: Option<u32>,
}
