//! # Sales Analytics Engine
//!
//! A library for turning an uploaded, loosely-structured sales transaction
//! table into a fixed battery of business-analytics views, plus an ad-hoc
//! natural-language query capability backed by an external language model.
//!
//! ## Core Concepts
//!
//! - **Raw Table**: untyped cell values keyed by column name, exactly as the
//!   upload collaborator produced them
//! - **Cleaned Records**: typed rows where every field is optional; coercion
//!   failures degrade individual cells, never the pipeline
//! - **Sparsity Pruning**: columns that are mostly empty are dropped before
//!   any default substitution can fill them
//! - **Aggregate Views**: pure reductions over a date-filtered subset, each
//!   answering one fixed business question with its own tie-break rule
//!
//! ## Example
//!
//! ```rust,ignore
//! use sales_analytics_engine::*;
//! use chrono::NaiveDate;
//!
//! let table = ingestion::read_delimited(upload_bytes)?;
//! let session = AnalyticsSession::new(&table, PipelineConfig::default())?;
//!
//! let (start, end) = session.observed_date_range().unwrap();
//! let report = session.report(start, end);
//! println!("{}", report.city_answer);
//! ```

pub mod aggregate;
pub mod cleaning;
pub mod error;
pub mod features;
pub mod filter;
pub mod ingestion;
pub mod report;
pub mod schema;

#[cfg(feature = "gemini")]
pub mod llm;

pub use aggregate::{
    CategorySales, CitySales, HourlySales, MonthlyBucket, PaymentMethodCount, ProductSales,
    SalePoint, SalesKpis, TrafficSourceRevenue, WeekdaySales, TOP_PRODUCT_LIMIT,
};
pub use cleaning::{clean_table, profile_columns, ColumnProfile};
pub use error::{Result, SalesAnalyticsError};
pub use features::{calendar_features, weekday_label, CalendarFeatures, WEEKDAY_ORDER};
pub use filter::{filter_by_date, observed_date_range};
pub use ingestion::{read_delimited, DelimitedTextSource, TableFormat, TableSource};
pub use report::{DashboardReport, NO_DATA};
pub use schema::{CleanedRecord, ColumnMap, PipelineConfig, RawTable};

use chrono::NaiveDate;
use log::info;

/// One analysis session over one uploaded dataset.
///
/// Cleaning and feature derivation run once at construction; every filter
/// change recomputes the aggregate views from scratch, so results are never
/// reused across date ranges or across datasets.
pub struct AnalyticsSession {
    config: PipelineConfig,
    records: Vec<CleanedRecord>,
}

impl AnalyticsSession {
    pub fn new(table: &RawTable, config: PipelineConfig) -> Result<Self> {
        config.validate()?;

        info!(
            "Starting analysis session over {} raw row(s)",
            table.row_count()
        );
        let records = cleaning::clean_table(table, &config);

        Ok(Self { config, records })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// The full cleaned record set, unfiltered.
    pub fn records(&self) -> &[CleanedRecord] {
        &self.records
    }

    /// Bounds for the caller's date-range control.
    pub fn observed_date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        filter::observed_date_range(&self.records)
    }

    /// Rows whose creation date falls within the inclusive interval.
    pub fn filter(&self, start: NaiveDate, end: NaiveDate) -> Vec<CleanedRecord> {
        filter::filter_by_date(&self.records, start, end)
    }

    /// Every dashboard view and answer for the given date range.
    pub fn report(&self, start: NaiveDate, end: NaiveDate) -> DashboardReport {
        let filtered = self.filter(start, end);
        DashboardReport::build(&filtered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
Order,Creation Date,City,Total Value,Quantity_SKU,SKU Name,Payment System Name,UtmSource
A,2024-01-05 10:00:00,X,\"100,00\",2,Widget,card,google
A,2024-01-05 10:00:00,X,100.00,2,Widget,card,google
B,2024-02-10 15:30:00,Y,50.00,1,Gadget,cash,direct
";

    #[test]
    fn test_end_to_end_session() {
        let table = read_delimited(SAMPLE.as_bytes()).unwrap();
        let session = AnalyticsSession::new(&table, PipelineConfig::default()).unwrap();

        let (start, end) = session.observed_date_range().unwrap();
        assert_eq!(start, NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2024, 2, 10).unwrap());

        let report = session.report(start, end);
        assert_eq!(report.kpis.unique_orders, 2);
        assert!(report.monthly_answer.contains("January 2024 (200.00)"));
        assert!(report.city_answer.contains("X"));
        assert!(report.city_answer.contains("80.00%"));
    }

    #[test]
    fn test_session_rejects_invalid_config() {
        let table = read_delimited(SAMPLE.as_bytes()).unwrap();
        let config = PipelineConfig {
            sparsity_threshold: -0.1,
            ..PipelineConfig::default()
        };
        assert!(AnalyticsSession::new(&table, config).is_err());
    }

    #[test]
    fn test_filtering_to_empty_range_reports_no_data() {
        let table = read_delimited(SAMPLE.as_bytes()).unwrap();
        let session = AnalyticsSession::new(&table, PipelineConfig::default()).unwrap();

        let report = session.report(
            NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2030, 12, 31).unwrap(),
        );
        assert_eq!(report.monthly_answer, NO_DATA);
        assert_eq!(report.kpis.unique_orders, 0);
    }
}
