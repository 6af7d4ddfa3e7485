use crate::schema::CleanedRecord;

/// Number of cleaned rows serialized into the analysis prompt.
pub const SAMPLE_ROW_LIMIT: usize = 50;

const COLUMN_GUIDE: &str = "\
- Order: unique identifier of the order.
- Creation Date: timestamp the order was created, normalized to UTC.
- City: city the order shipped to.
- Total Value: total monetary value of the order.
- Quantity: number of units sold.
- Product: name of the product sold.
- Payment Method: payment method used for the transaction.
- Traffic Source: marketing source the customer came from.";

/// Builds the prompt for one ad-hoc question: fixed column guide, a sample
/// of the filtered rows, then the user's question verbatim.
pub fn build_analysis_prompt(records: &[CleanedRecord], question: &str) -> String {
    format!(
        "You are an expert data analyst. Analyze the following sales data \
         table to answer the user's question. The data has these columns:\n\
         {COLUMN_GUIDE}\n\n\
         Sales data (first {SAMPLE_ROW_LIMIT} rows):\n{}\n\
         User question: {question}",
        render_sample_table(records, SAMPLE_ROW_LIMIT),
    )
}

/// Renders up to `limit` records as a readable markdown table. Absent fields
/// render as empty cells.
pub fn render_sample_table(records: &[CleanedRecord], limit: usize) -> String {
    let mut table = String::from(
        "| Order | Creation Date | City | Total Value | Quantity | Product | Payment Method | Traffic Source |\n\
         |---|---|---|---|---|---|---|---|\n",
    );

    for record in records.iter().take(limit) {
        let created = record
            .created_at
            .map(|ts| ts.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default();

        table.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} | {} | {} |\n",
            text_cell(&record.order_id),
            created,
            text_cell(&record.city),
            decimal_cell(record.total_value),
            decimal_cell(record.quantity),
            text_cell(&record.product_name),
            text_cell(&record.payment_method),
            text_cell(&record.traffic_source),
        ));
    }

    table
}

fn text_cell(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("")
}

fn decimal_cell(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.2}")).unwrap_or_default()
}
