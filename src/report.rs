//! Turns aggregate views into short human-readable answers.
//!
//! All numeric rendering uses a fixed convention (comma thousands separator,
//! period decimal point, two decimals for money and percentages) independent
//! of the viewer's locale. Every answer function short-circuits to a "no
//! data" sentence on an empty view instead of taking an extremum over
//! nothing.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::aggregate::{
    self, CategorySales, CitySales, HourlySales, MonthlyBucket, PaymentMethodCount, ProductSales,
    SalePoint, SalesKpis, TrafficSourceRevenue, WeekdaySales,
};
use crate::features::weekday_label;
use crate::schema::CleanedRecord;

pub const NO_DATA: &str = "No data available for the selected period.";

/// Number of category rows shown in the dashboard ranking.
pub const CATEGORY_DISPLAY_LIMIT: usize = 10;

pub const RECOMMENDATIONS: &str = "\
- Products: focus campaigns on the current top-5 products by revenue.\n\
- Cities: invest in segmented digital advertising for the top-ranked cities.\n\
- Marketing: shift budget toward the traffic source with the highest revenue share.\n\
- Timing: schedule promotions around the peak sales weekday and hour.";

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Formats money with comma thousands grouping and two decimals, e.g.
/// `1,234.56`.
pub fn format_money(value: f64) -> String {
    let negative = value < 0.0;
    let cents = (value.abs() * 100.0).round() as u128;
    let whole = group_thousands(&(cents / 100).to_string());
    format!(
        "{}{}.{:02}",
        if negative { "-" } else { "" },
        whole,
        cents % 100
    )
}

/// Formats a count as a grouped integer, e.g. `12,345`.
pub fn format_count(value: f64) -> String {
    let negative = value < 0.0;
    let rounded = value.abs().round() as u128;
    format!(
        "{}{}",
        if negative { "-" } else { "" },
        group_thousands(&rounded.to_string())
    )
}

/// Formats a percentage with two decimals, e.g. `80.00%`.
pub fn format_percent(value: f64) -> String {
    format!("{value:.2}%")
}

fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

pub fn month_label(month_start: NaiveDate) -> String {
    format!(
        "{} {}",
        MONTH_NAMES[month_start.month0() as usize],
        month_start.year()
    )
}

pub fn monthly_answer(monthly: &[MonthlyBucket]) -> String {
    let (Some(by_revenue), Some(by_units)) = (
        aggregate::max_by_measure(monthly, |m| m.revenue),
        aggregate::max_by_measure(monthly, |m| m.units),
    ) else {
        return NO_DATA.to_string();
    };

    format!(
        "The strongest month by revenue was {} ({}); by units it was {} ({} units).",
        month_label(by_revenue.month_start),
        format_money(by_revenue.revenue),
        month_label(by_units.month_start),
        format_count(by_units.units),
    )
}

pub fn top_products_by_revenue_answer(products: &[ProductSales]) -> String {
    if products.is_empty() {
        return NO_DATA.to_string();
    }

    let listing: Vec<String> = products
        .iter()
        .map(|p| format!("{} ({})", p.product, format_money(p.revenue)))
        .collect();
    format!(
        "Top {} products by revenue: {}.",
        products.len(),
        listing.join(", ")
    )
}

pub fn top_products_by_units_answer(products: &[ProductSales]) -> String {
    if products.is_empty() {
        return NO_DATA.to_string();
    }

    let listing: Vec<String> = products
        .iter()
        .map(|p| format!("{} ({} units)", p.product, format_count(p.units)))
        .collect();
    format!(
        "Top {} products by units: {}.",
        products.len(),
        listing.join(", ")
    )
}

pub fn unique_orders_answer(kpis: &SalesKpis) -> String {
    format!(
        "There are {} unique orders in the selected period.",
        format_count(kpis.unique_orders as f64)
    )
}

pub fn city_answer(cities: &[CitySales]) -> String {
    let Some(top) = cities.first() else {
        return NO_DATA.to_string();
    };

    format!(
        "The top city by revenue is {} with {}, which represents {} of the total.",
        top.city,
        format_money(top.revenue),
        format_percent(top.revenue_share_pct),
    )
}

pub fn category_answer(categories: &[CategorySales]) -> String {
    let Some(top) = categories.first() else {
        return NO_DATA.to_string();
    };

    format!(
        "The best-selling category is {} with {}.",
        top.category_id,
        format_money(top.revenue)
    )
}

pub fn timeline_answer(timeline: &[SalePoint]) -> String {
    let (Some(first), Some(last)) = (timeline.first(), timeline.last()) else {
        return NO_DATA.to_string();
    };

    format!(
        "Recorded {} sales events between {} and {}.",
        format_count(timeline.len() as f64),
        first.at.date_naive(),
        last.at.date_naive(),
    )
}

pub fn payment_method_answer(methods: &[PaymentMethodCount]) -> String {
    let Some(mode) = methods.first() else {
        return NO_DATA.to_string();
    };

    format!(
        "The most used payment method is {} ({} orders).",
        mode.method,
        format_count(mode.orders as f64)
    )
}

pub fn traffic_source_answer(sources: &[TrafficSourceRevenue]) -> String {
    let Some(top) = sources.first() else {
        return NO_DATA.to_string();
    };

    format!(
        "The traffic source driving the most revenue is {} ({}).",
        top.source,
        format_money(top.revenue)
    )
}

pub fn weekday_answer(weekdays: &[WeekdaySales]) -> String {
    let (Some(by_revenue), Some(by_units)) = (
        aggregate::max_by_measure(weekdays, |w| w.revenue),
        aggregate::max_by_measure(weekdays, |w| w.units),
    ) else {
        return NO_DATA.to_string();
    };

    format!(
        "The strongest weekday by revenue is {} ({}); by units it is {} ({} units).",
        weekday_label(by_revenue.weekday),
        format_money(by_revenue.revenue),
        weekday_label(by_units.weekday),
        format_count(by_units.units),
    )
}

pub fn hourly_answer(hours: &[HourlySales]) -> String {
    let (Some(peak), Some(trough)) = (
        aggregate::max_by_measure(hours, |h| h.revenue),
        aggregate::min_by_measure(hours, |h| h.revenue),
    ) else {
        return NO_DATA.to_string();
    };

    format!(
        "Sales peak at hour {} ({}) and are lowest at hour {} ({}).",
        peak.hour,
        format_money(peak.revenue),
        trough.hour,
        format_money(trough.revenue),
    )
}

/// The full battery of dashboard views with their answer sentences.
///
/// Each view is computed independently from the same filtered record set, so
/// a view that has no usable data reports [`NO_DATA`] without affecting any
/// other view.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardReport {
    pub kpis: SalesKpis,
    pub unique_orders_answer: String,

    pub monthly: Vec<MonthlyBucket>,
    pub monthly_answer: String,

    pub top_products_by_revenue: Vec<ProductSales>,
    pub top_products_by_revenue_answer: String,
    pub top_products_by_units: Vec<ProductSales>,
    pub top_products_by_units_answer: String,

    pub cities: Vec<CitySales>,
    pub city_answer: String,

    /// At most [`CATEGORY_DISPLAY_LIMIT`] rows, revenue-descending.
    pub categories: Vec<CategorySales>,
    pub category_answer: String,

    pub timeline: Vec<SalePoint>,
    pub timeline_answer: String,

    pub payment_methods: Vec<PaymentMethodCount>,
    pub payment_method_answer: String,

    pub traffic_sources: Vec<TrafficSourceRevenue>,
    pub traffic_source_answer: String,

    pub weekdays: Vec<WeekdaySales>,
    pub weekday_answer: String,

    pub hours: Vec<HourlySales>,
    pub hourly_answer: String,

    pub recommendations: &'static str,
}

impl DashboardReport {
    pub fn build(records: &[CleanedRecord]) -> Self {
        let kpis = aggregate::sales_kpis(records);
        let monthly = aggregate::monthly_trend(records);
        let top_by_revenue = aggregate::top_products_by_revenue(records);
        let top_by_units = aggregate::top_products_by_units(records);
        let cities = aggregate::city_ranking(records);
        let mut categories = aggregate::category_ranking(records);
        let category_answer = category_answer(&categories);
        categories.truncate(CATEGORY_DISPLAY_LIMIT);
        let timeline = aggregate::revenue_over_time(records);
        let payment_methods = aggregate::payment_method_distribution(records);
        let traffic_sources = aggregate::traffic_source_revenue(records);
        let weekdays = aggregate::weekday_pattern(records);
        let hours = aggregate::hourly_pattern(records);

        Self {
            unique_orders_answer: unique_orders_answer(&kpis),
            monthly_answer: monthly_answer(&monthly),
            top_products_by_revenue_answer: top_products_by_revenue_answer(&top_by_revenue),
            top_products_by_units_answer: top_products_by_units_answer(&top_by_units),
            city_answer: city_answer(&cities),
            category_answer,
            timeline_answer: timeline_answer(&timeline),
            payment_method_answer: payment_method_answer(&payment_methods),
            traffic_source_answer: traffic_source_answer(&traffic_sources),
            weekday_answer: weekday_answer(&weekdays),
            hourly_answer: hourly_answer(&hours),
            kpis,
            monthly,
            top_products_by_revenue: top_by_revenue,
            top_products_by_units: top_by_units,
            cities,
            categories,
            timeline,
            payment_methods,
            traffic_sources,
            weekdays,
            hours,
            recommendations: RECOMMENDATIONS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::CleanedRecord;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_money_formatting_is_locale_stable() {
        assert_eq!(format_money(0.0), "0.00");
        assert_eq!(format_money(80.0), "80.00");
        assert_eq!(format_money(1234.56), "1,234.56");
        assert_eq!(format_money(1234567.891), "1,234,567.89");
        assert_eq!(format_money(-9876.5), "-9,876.50");
        assert_eq!(format_money(999.999), "1,000.00");
    }

    #[test]
    fn test_count_and_percent_formatting() {
        assert_eq!(format_count(4.0), "4");
        assert_eq!(format_count(12345.0), "12,345");
        assert_eq!(format_count(2.6), "3");
        assert_eq!(format_percent(80.0), "80.00%");
        assert_eq!(format_percent(33.3333), "33.33%");
    }

    #[test]
    fn test_month_label() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        assert_eq!(month_label(date), "February 2024");
    }

    #[test]
    fn test_empty_views_report_no_data() {
        assert_eq!(monthly_answer(&[]), NO_DATA);
        assert_eq!(top_products_by_revenue_answer(&[]), NO_DATA);
        assert_eq!(city_answer(&[]), NO_DATA);
        assert_eq!(category_answer(&[]), NO_DATA);
        assert_eq!(timeline_answer(&[]), NO_DATA);
        assert_eq!(payment_method_answer(&[]), NO_DATA);
        assert_eq!(traffic_source_answer(&[]), NO_DATA);
        assert_eq!(weekday_answer(&[]), NO_DATA);
        assert_eq!(hourly_answer(&[]), NO_DATA);
    }

    #[test]
    fn test_monthly_answer_reports_measures_independently() {
        let monthly = vec![
            MonthlyBucket {
                month_start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                revenue: 500.0,
                units: 2.0,
            },
            MonthlyBucket {
                month_start: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
                revenue: 100.0,
                units: 40.0,
            },
        ];

        let answer = monthly_answer(&monthly);
        assert!(answer.contains("January 2024 (500.00)"));
        assert!(answer.contains("February 2024 (40 units)"));
    }

    #[test]
    fn test_report_build_on_empty_set_never_panics() {
        let report = DashboardReport::build(&[]);
        assert_eq!(report.kpis.unique_orders, 0);
        assert_eq!(report.monthly_answer, NO_DATA);
        assert_eq!(report.hourly_answer, NO_DATA);
        assert!(report.cities.is_empty());
    }

    #[test]
    fn test_report_build_isolates_views() {
        // A record with a product but no city: the product views populate
        // while the city view reports no data.
        let record = CleanedRecord {
            order_id: Some("A".to_string()),
            created_at: Some(Utc.with_ymd_and_hms(2024, 1, 5, 10, 0, 0).unwrap()),
            total_value: Some(100.0),
            quantity: Some(2.0),
            product_name: Some("Widget".to_string()),
            ..CleanedRecord::default()
        };
        let records = vec![crate::features::with_calendar_features(record)];

        let report = DashboardReport::build(&records);
        assert!(report
            .top_products_by_revenue_answer
            .contains("Widget (100.00)"));
        assert_eq!(report.city_answer, NO_DATA);
        assert!(report.monthly_answer.contains("January 2024"));
    }

    #[test]
    fn test_category_display_limit() {
        let records: Vec<CleanedRecord> = (0..15)
            .map(|i| CleanedRecord {
                category_id: Some(format!("cat-{i:02}")),
                total_value: Some(100.0 - i as f64),
                ..CleanedRecord::default()
            })
            .collect();

        let report = DashboardReport::build(&records);
        assert_eq!(report.categories.len(), CATEGORY_DISPLAY_LIMIT);
        assert!(report.category_answer.contains("cat-00"));
    }
}
