//! Pure reductions over a filtered record set.
//!
//! Every operation here is a function of its input slice: nothing is cached,
//! nothing is mutated, and results are recomputed on every filter change.
//! Absent numeric values count as zero inside sums but never remove a row
//! from its grouping; absent grouping keys drop the row from that one view
//! only. Groupings accumulate in `BTreeMap`, so iteration order is
//! deterministic and ties after a stable descending sort resolve to the
//! lexically (or chronologically) first key.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Datelike, NaiveDate, Utc, Weekday};
use serde::Serialize;

use crate::features::WEEKDAY_ORDER;
use crate::schema::CleanedRecord;

pub const TOP_PRODUCT_LIMIT: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalesKpis {
    pub total_revenue: f64,
    pub total_units: f64,
    pub unique_orders: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyBucket {
    /// First day of the calendar month this bucket covers.
    pub month_start: NaiveDate,
    pub revenue: f64,
    pub units: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductSales {
    pub product: String,
    pub revenue: f64,
    pub units: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CitySales {
    pub city: String,
    pub revenue: f64,
    pub units: f64,
    /// This city's revenue as a percentage of revenue across all cities.
    pub revenue_share_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySales {
    pub category_id: String,
    pub revenue: f64,
    pub units: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalePoint {
    pub at: DateTime<Utc>,
    pub revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentMethodCount {
    pub method: String,
    pub orders: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrafficSourceRevenue {
    pub source: String,
    pub revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekdaySales {
    pub weekday: Weekday,
    pub revenue: f64,
    pub units: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlySales {
    /// Hour of day, 0-23.
    pub hour: u32,
    pub revenue: f64,
    pub units: f64,
}

fn revenue_of(record: &CleanedRecord) -> f64 {
    record.total_value.unwrap_or(0.0)
}

fn units_of(record: &CleanedRecord) -> f64 {
    record.quantity.unwrap_or(0.0)
}

fn descending(a: f64, b: f64) -> std::cmp::Ordering {
    b.partial_cmp(&a).unwrap_or(std::cmp::Ordering::Equal)
}

/// First item with the maximum measure; earlier items win ties.
pub fn max_by_measure<T>(items: &[T], measure: impl Fn(&T) -> f64) -> Option<&T> {
    let mut best: Option<(&T, f64)> = None;
    for item in items {
        let value = measure(item);
        match best {
            Some((_, current)) if value <= current => {}
            _ => best = Some((item, value)),
        }
    }
    best.map(|(item, _)| item)
}

/// First item with the minimum measure; earlier items win ties.
pub fn min_by_measure<T>(items: &[T], measure: impl Fn(&T) -> f64) -> Option<&T> {
    let mut best: Option<(&T, f64)> = None;
    for item in items {
        let value = measure(item);
        match best {
            Some((_, current)) if value >= current => {}
            _ => best = Some((item, value)),
        }
    }
    best.map(|(item, _)| item)
}

pub fn sales_kpis(records: &[CleanedRecord]) -> SalesKpis {
    SalesKpis {
        total_revenue: records.iter().map(revenue_of).sum(),
        total_units: records.iter().map(units_of).sum(),
        unique_orders: unique_order_count(records),
    }
}

/// Revenue and units per calendar month, in chronological bucket order.
pub fn monthly_trend(records: &[CleanedRecord]) -> Vec<MonthlyBucket> {
    let mut buckets: BTreeMap<NaiveDate, (f64, f64)> = BTreeMap::new();

    for record in records {
        let Some(ts) = record.created_at else { continue };
        let Some(month_start) = NaiveDate::from_ymd_opt(ts.year(), ts.month(), 1) else {
            continue;
        };
        let entry = buckets.entry(month_start).or_insert((0.0, 0.0));
        entry.0 += revenue_of(record);
        entry.1 += units_of(record);
    }

    buckets
        .into_iter()
        .map(|(month_start, (revenue, units))| MonthlyBucket {
            month_start,
            revenue,
            units,
        })
        .collect()
}

fn product_totals(records: &[CleanedRecord]) -> Vec<ProductSales> {
    let mut totals: BTreeMap<&str, (f64, f64)> = BTreeMap::new();

    for record in records {
        let Some(product) = record.product_name.as_deref() else {
            continue;
        };
        let entry = totals.entry(product).or_insert((0.0, 0.0));
        entry.0 += revenue_of(record);
        entry.1 += units_of(record);
    }

    totals
        .into_iter()
        .map(|(product, (revenue, units))| ProductSales {
            product: product.to_string(),
            revenue,
            units,
        })
        .collect()
}

pub fn top_products_by_revenue(records: &[CleanedRecord]) -> Vec<ProductSales> {
    let mut products = product_totals(records);
    products.sort_by(|a, b| descending(a.revenue, b.revenue));
    products.truncate(TOP_PRODUCT_LIMIT);
    products
}

pub fn top_products_by_units(records: &[CleanedRecord]) -> Vec<ProductSales> {
    let mut products = product_totals(records);
    products.sort_by(|a, b| descending(a.units, b.units));
    products.truncate(TOP_PRODUCT_LIMIT);
    products
}

/// Count of distinct order identifiers. Rows without an identifier cannot be
/// attributed to an order and do not count.
pub fn unique_order_count(records: &[CleanedRecord]) -> usize {
    records
        .iter()
        .filter_map(|record| record.order_id.as_deref())
        .collect::<BTreeSet<_>>()
        .len()
}

/// Cities ranked by revenue, each carrying its share of total revenue across
/// all cities. Shares sum to 100 (up to rounding) whenever revenue is
/// non-zero.
pub fn city_ranking(records: &[CleanedRecord]) -> Vec<CitySales> {
    let mut totals: BTreeMap<&str, (f64, f64)> = BTreeMap::new();

    for record in records {
        let Some(city) = record.city.as_deref() else { continue };
        let entry = totals.entry(city).or_insert((0.0, 0.0));
        entry.0 += revenue_of(record);
        entry.1 += units_of(record);
    }

    let grand_total: f64 = totals.values().map(|(revenue, _)| revenue).sum();

    let mut cities: Vec<CitySales> = totals
        .into_iter()
        .map(|(city, (revenue, units))| CitySales {
            city: city.to_string(),
            revenue,
            units,
            revenue_share_pct: if grand_total > 0.0 {
                revenue / grand_total * 100.0
            } else {
                0.0
            },
        })
        .collect();

    cities.sort_by(|a, b| descending(a.revenue, b.revenue));
    cities
}

/// Categories ranked by revenue, descending.
pub fn category_ranking(records: &[CleanedRecord]) -> Vec<CategorySales> {
    let mut totals: BTreeMap<&str, (f64, f64)> = BTreeMap::new();

    for record in records {
        let Some(category) = record.category_id.as_deref() else {
            continue;
        };
        let entry = totals.entry(category).or_insert((0.0, 0.0));
        entry.0 += revenue_of(record);
        entry.1 += units_of(record);
    }

    let mut categories: Vec<CategorySales> = totals
        .into_iter()
        .map(|(category_id, (revenue, units))| CategorySales {
            category_id: category_id.to_string(),
            revenue,
            units,
        })
        .collect();

    categories.sort_by(|a, b| descending(a.revenue, b.revenue));
    categories
}

/// Per-row revenue in chronological order; no aggregation, display only.
pub fn revenue_over_time(records: &[CleanedRecord]) -> Vec<SalePoint> {
    let mut points: Vec<SalePoint> = records
        .iter()
        .filter_map(|record| {
            record.created_at.map(|at| SalePoint {
                at,
                revenue: revenue_of(record),
            })
        })
        .collect();

    points.sort_by_key(|point| point.at);
    points
}

/// Row counts per payment method, most used first.
pub fn payment_method_distribution(records: &[CleanedRecord]) -> Vec<PaymentMethodCount> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();

    for record in records {
        let Some(method) = record.payment_method.as_deref() else {
            continue;
        };
        *counts.entry(method).or_insert(0) += 1;
    }

    let mut methods: Vec<PaymentMethodCount> = counts
        .into_iter()
        .map(|(method, orders)| PaymentMethodCount {
            method: method.to_string(),
            orders,
        })
        .collect();

    methods.sort_by(|a, b| b.orders.cmp(&a.orders));
    methods
}

/// Revenue per traffic source, highest first.
pub fn traffic_source_revenue(records: &[CleanedRecord]) -> Vec<TrafficSourceRevenue> {
    let mut totals: BTreeMap<&str, f64> = BTreeMap::new();

    for record in records {
        let Some(source) = record.traffic_source.as_deref() else {
            continue;
        };
        *totals.entry(source).or_insert(0.0) += revenue_of(record);
    }

    let mut sources: Vec<TrafficSourceRevenue> = totals
        .into_iter()
        .map(|(source, revenue)| TrafficSourceRevenue {
            source: source.to_string(),
            revenue,
        })
        .collect();

    sources.sort_by(|a, b| descending(a.revenue, b.revenue));
    sources
}

/// Revenue and units per weekday, always reported in Monday→Sunday order
/// regardless of the order days appear in the input.
pub fn weekday_pattern(records: &[CleanedRecord]) -> Vec<WeekdaySales> {
    let mut totals: BTreeMap<u32, (f64, f64)> = BTreeMap::new();

    for record in records {
        let Some(weekday) = record.weekday else { continue };
        let entry = totals
            .entry(weekday.num_days_from_monday())
            .or_insert((0.0, 0.0));
        entry.0 += revenue_of(record);
        entry.1 += units_of(record);
    }

    totals
        .into_iter()
        .map(|(index, (revenue, units))| WeekdaySales {
            weekday: WEEKDAY_ORDER[index as usize],
            revenue,
            units,
        })
        .collect()
}

/// Revenue and units per hour of day, ascending by hour.
pub fn hourly_pattern(records: &[CleanedRecord]) -> Vec<HourlySales> {
    let mut totals: BTreeMap<u32, (f64, f64)> = BTreeMap::new();

    for record in records {
        let Some(hour) = record.hour_of_day else { continue };
        let entry = totals.entry(hour).or_insert((0.0, 0.0));
        entry.0 += revenue_of(record);
        entry.1 += units_of(record);
    }

    totals
        .into_iter()
        .map(|(hour, (revenue, units))| HourlySales {
            hour,
            revenue,
            units,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(
        order: &str,
        ts: (i32, u32, u32, u32),
        total: Option<f64>,
        qty: Option<f64>,
        city: &str,
    ) -> CleanedRecord {
        let (year, month, day, hour) = ts;
        crate::features::with_calendar_features(CleanedRecord {
            order_id: Some(order.to_string()),
            created_at: Some(Utc.with_ymd_and_hms(year, month, day, hour, 0, 0).unwrap()),
            total_value: total,
            quantity: qty,
            city: Some(city.to_string()),
            ..CleanedRecord::default()
        })
    }

    fn scenario_rows() -> Vec<CleanedRecord> {
        vec![
            record("A", (2024, 1, 5, 10), Some(100.0), Some(2.0), "X"),
            record("A", (2024, 1, 5, 10), Some(100.0), Some(2.0), "X"),
            record("B", (2024, 2, 10, 15), Some(50.0), Some(1.0), "Y"),
        ]
    }

    #[test]
    fn test_scenario_unique_orders_and_monthly_totals() {
        let rows = scenario_rows();

        assert_eq!(unique_order_count(&rows), 2);

        let monthly = monthly_trend(&rows);
        assert_eq!(monthly.len(), 2);
        assert_eq!(
            monthly[0].month_start,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
        );
        assert!((monthly[0].revenue - 200.0).abs() < 1e-9);
        assert!((monthly[0].units - 4.0).abs() < 1e-9);
        assert!((monthly[1].revenue - 50.0).abs() < 1e-9);
        assert!((monthly[1].units - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_scenario_city_share() {
        let rows = scenario_rows();
        let cities = city_ranking(&rows);

        assert_eq!(cities[0].city, "X");
        assert!((cities[0].revenue_share_pct - 80.0).abs() < 1e-9);

        let share_sum: f64 = cities.iter().map(|c| c.revenue_share_pct).sum();
        assert!((share_sum - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_unparseable_total_counts_as_zero_but_row_survives() {
        let mut rows = scenario_rows();
        rows.push(record("C", (2024, 2, 11, 9), None, Some(3.0), "Y"));

        assert_eq!(unique_order_count(&rows), 3);

        let cities = city_ranking(&rows);
        let y = cities.iter().find(|c| c.city == "Y").unwrap();
        assert!((y.revenue - 50.0).abs() < 1e-9);
        assert!((y.units - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_top_products_bounded_and_descending() {
        let rows: Vec<CleanedRecord> = (0..8)
            .map(|i| CleanedRecord {
                product_name: Some(format!("product-{i}")),
                total_value: Some(10.0 * (i + 1) as f64),
                quantity: Some(1.0),
                ..CleanedRecord::default()
            })
            .collect();

        let top = top_products_by_revenue(&rows);
        assert_eq!(top.len(), TOP_PRODUCT_LIMIT);
        for pair in top.windows(2) {
            assert!(pair[0].revenue >= pair[1].revenue);
        }
        assert_eq!(top[0].product, "product-7");
    }

    #[test]
    fn test_top_products_tie_breaks_are_deterministic() {
        let rows: Vec<CleanedRecord> = ["zeta", "alpha", "mid"]
            .iter()
            .map(|name| CleanedRecord {
                product_name: Some(name.to_string()),
                total_value: Some(100.0),
                quantity: Some(1.0),
                ..CleanedRecord::default()
            })
            .collect();

        // Equal revenue everywhere: the stable sort preserves the lexical
        // grouping order.
        let top = top_products_by_revenue(&rows);
        assert_eq!(top[0].product, "alpha");
        assert_eq!(top[1].product, "mid");
        assert_eq!(top[2].product, "zeta");
    }

    #[test]
    fn test_weekday_pattern_is_monday_first() {
        // Saturday, then Monday, then Wednesday in input order.
        let rows = vec![
            record("A", (2024, 2, 10, 9), Some(10.0), Some(1.0), "X"),
            record("B", (2024, 2, 5, 9), Some(20.0), Some(2.0), "X"),
            record("C", (2024, 2, 7, 9), Some(30.0), Some(3.0), "X"),
        ];

        let pattern = weekday_pattern(&rows);
        let days: Vec<Weekday> = pattern.iter().map(|p| p.weekday).collect();
        assert_eq!(days, vec![Weekday::Mon, Weekday::Wed, Weekday::Sat]);
    }

    #[test]
    fn test_hourly_pattern_extremes() {
        let rows = vec![
            record("A", (2024, 1, 1, 9), Some(10.0), Some(1.0), "X"),
            record("B", (2024, 1, 1, 14), Some(90.0), Some(1.0), "X"),
            record("C", (2024, 1, 2, 23), Some(40.0), Some(1.0), "X"),
        ];

        let pattern = hourly_pattern(&rows);
        let peak = max_by_measure(&pattern, |h| h.revenue).unwrap();
        let trough = min_by_measure(&pattern, |h| h.revenue).unwrap();
        assert_eq!(peak.hour, 14);
        assert_eq!(trough.hour, 9);
    }

    #[test]
    fn test_max_by_measure_first_wins_ties() {
        let monthly = vec![
            MonthlyBucket {
                month_start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                revenue: 50.0,
                units: 5.0,
            },
            MonthlyBucket {
                month_start: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
                revenue: 50.0,
                units: 9.0,
            },
        ];

        let by_revenue = max_by_measure(&monthly, |m| m.revenue).unwrap();
        let by_units = max_by_measure(&monthly, |m| m.units).unwrap();
        assert_eq!(by_revenue.month_start.month0(), 0);
        assert_eq!(by_units.month_start.month0(), 1);
    }

    #[test]
    fn test_empty_input_produces_empty_views() {
        let rows: Vec<CleanedRecord> = Vec::new();

        assert!(monthly_trend(&rows).is_empty());
        assert!(top_products_by_revenue(&rows).is_empty());
        assert!(city_ranking(&rows).is_empty());
        assert!(category_ranking(&rows).is_empty());
        assert!(revenue_over_time(&rows).is_empty());
        assert!(payment_method_distribution(&rows).is_empty());
        assert!(traffic_source_revenue(&rows).is_empty());
        assert!(weekday_pattern(&rows).is_empty());
        assert!(hourly_pattern(&rows).is_empty());
        assert_eq!(unique_order_count(&rows), 0);
        assert!(max_by_measure(&monthly_trend(&rows), |m| m.revenue).is_none());

        let kpis = sales_kpis(&rows);
        assert_eq!(kpis.unique_orders, 0);
        assert_eq!(kpis.total_revenue, 0.0);
    }

    #[test]
    fn test_payment_mode_and_traffic_argmax() {
        let mut rows = Vec::new();
        for (method, source, total) in [
            ("card", "google", 10.0),
            ("card", "google", 20.0),
            ("cash", "direct", 300.0),
        ] {
            rows.push(CleanedRecord {
                payment_method: Some(method.to_string()),
                traffic_source: Some(source.to_string()),
                total_value: Some(total),
                ..CleanedRecord::default()
            });
        }

        let methods = payment_method_distribution(&rows);
        assert_eq!(methods[0].method, "card");
        assert_eq!(methods[0].orders, 2);

        let sources = traffic_source_revenue(&rows);
        assert_eq!(sources[0].source, "direct");
        assert!((sources[0].revenue - 300.0).abs() < 1e-9);
    }
}
