use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use log::{debug, info};

use crate::features;
use crate::schema::{CleanedRecord, ColumnMap, PipelineConfig, RawTable};

/// Missing-value statistics for one input column.
///
/// `missing` is measured over the original row count, before any sentinel
/// substitution, so mass-empty columns cannot be rescued by their defaults.
#[derive(Debug, Clone)]
pub struct ColumnProfile {
    pub name: String,
    pub missing: usize,
    pub total: usize,
    pub kept: bool,
}

impl ColumnProfile {
    pub fn missing_fraction(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.missing as f64 / self.total as f64
        }
    }
}

pub fn profile_columns(table: &RawTable, sparsity_threshold: f64) -> Vec<ColumnProfile> {
    let total = table.row_count();

    table
        .headers()
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            let missing = table
                .rows()
                .iter()
                .filter(|row| row[idx].is_none())
                .count();
            let mut profile = ColumnProfile {
                name: name.clone(),
                missing,
                total,
                kept: true,
            };
            profile.kept = profile.missing_fraction() <= sparsity_threshold;
            profile
        })
        .collect()
}

// Indices of the semantic columns that survived sparsity pruning. A `None`
// means the column is absent from the upload or was pruned; every field read
// through it stays absent.
struct ColumnLayout {
    order_id: Option<usize>,
    created_at: Option<usize>,
    last_changed_at: Option<usize>,
    total_value: Option<usize>,
    quantity: Option<usize>,
    shipping_value: Option<usize>,
    discount_total: Option<usize>,
    product_name: Option<usize>,
    city: Option<usize>,
    category_id: Option<usize>,
    payment_method: Option<usize>,
    traffic_source: Option<usize>,
    cancellation_reason: Option<usize>,
}

impl ColumnLayout {
    fn resolve(table: &RawTable, columns: &ColumnMap, profiles: &[ColumnProfile]) -> Self {
        let kept = |name: &str| {
            table
                .column_index(name)
                .filter(|&idx| profiles[idx].kept)
        };

        Self {
            order_id: kept(&columns.order_id),
            created_at: kept(&columns.created_at),
            last_changed_at: kept(&columns.last_changed_at),
            total_value: kept(&columns.total_value),
            quantity: kept(&columns.quantity),
            shipping_value: kept(&columns.shipping_value),
            discount_total: kept(&columns.discount_total),
            product_name: kept(&columns.product_name),
            city: kept(&columns.city),
            category_id: kept(&columns.category_id),
            payment_method: kept(&columns.payment_method),
            traffic_source: kept(&columns.traffic_source),
            cancellation_reason: kept(&columns.cancellation_reason),
        }
    }
}

/// Coerces a raw table into typed records.
///
/// Never aborts: each cell that fails to parse degrades to an absent field,
/// and an empty or header-only table yields an empty record set.
pub fn clean_table(table: &RawTable, config: &PipelineConfig) -> Vec<CleanedRecord> {
    let profiles = profile_columns(table, config.sparsity_threshold);

    let dropped: Vec<&str> = profiles
        .iter()
        .filter(|p| !p.kept)
        .map(|p| p.name.as_str())
        .collect();
    if !dropped.is_empty() {
        debug!(
            "Dropping {} column(s) with more than {:.0}% missing values: {:?}",
            dropped.len(),
            config.sparsity_threshold * 100.0,
            dropped
        );
    }

    let layout = ColumnLayout::resolve(table, &config.columns, &profiles);

    let records: Vec<CleanedRecord> = table
        .rows()
        .iter()
        .map(|row| {
            let record = CleanedRecord {
                order_id: text(row, layout.order_id),
                created_at: timestamp(row, layout.created_at),
                last_changed_at: timestamp(row, layout.last_changed_at),
                total_value: decimal(row, layout.total_value),
                quantity: decimal(row, layout.quantity),
                shipping_value: decimal(row, layout.shipping_value),
                discount_total: decimal(row, layout.discount_total),
                product_name: text(row, layout.product_name),
                city: text(row, layout.city),
                category_id: text(row, layout.category_id),
                payment_method: text_or(row, layout.payment_method, &config.unknown_label),
                traffic_source: text_or(row, layout.traffic_source, &config.unknown_label),
                cancellation_reason: text_or(
                    row,
                    layout.cancellation_reason,
                    &config.not_cancelled_label,
                ),
                month: None,
                weekday: None,
                hour_of_day: None,
            };
            features::with_calendar_features(record)
        })
        .collect();

    info!(
        "Coerced {} row(s) across {} kept column(s)",
        records.len(),
        profiles.iter().filter(|p| p.kept).count()
    );

    records
}

fn cell<'a>(row: &'a [Option<String>], idx: Option<usize>) -> Option<&'a str> {
    idx.and_then(|i| row.get(i)).and_then(|c| c.as_deref())
}

fn text(row: &[Option<String>], idx: Option<usize>) -> Option<String> {
    cell(row, idx).map(|s| s.trim().to_string())
}

// Sentinel substitution: only applies when the column itself survived, so a
// pruned or absent column stays absent instead of becoming all-sentinel.
fn text_or(row: &[Option<String>], idx: Option<usize>, sentinel: &str) -> Option<String> {
    idx?;
    Some(
        cell(row, idx)
            .map(|s| s.trim().to_string())
            .unwrap_or_else(|| sentinel.to_string()),
    )
}

fn decimal(row: &[Option<String>], idx: Option<usize>) -> Option<f64> {
    cell(row, idx).and_then(parse_decimal)
}

fn timestamp(row: &[Option<String>], idx: Option<usize>) -> Option<DateTime<Utc>> {
    cell(row, idx).and_then(parse_timestamp)
}

/// Parses a decimal that may use a comma as its decimal separator.
/// "1234,56" and "1234.56" both produce 1234.56.
pub fn parse_decimal(raw: &str) -> Option<f64> {
    let normalized = raw.trim().replace(',', ".");
    normalized.parse::<f64>().ok().filter(|v| v.is_finite())
}

const TIMESTAMP_LAYOUTS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

const DATE_LAYOUTS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y"];

/// Permissive timestamp parse, normalized to UTC. Accepts RFC 3339 plus the
/// date-time layouts seen in storefront exports; anything else is `None`.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }

    for layout in TIMESTAMP_LAYOUTS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, layout) {
            return Some(dt.and_utc());
        }
    }

    for layout in DATE_LAYOUTS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, layout) {
            return Some(date.and_hms_opt(0, 0, 0)?.and_utc());
        }
    }

    None
}
