//! CSV income-statement export.
//!
//! One row per line item of every delivered order. UTF-8, comma-delimited;
//! free-text fields have embedded commas stripped rather than quoted, which
//! is what downstream spreadsheet imports expect.

use crate::domain::revenue;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;

pub const INCOME_STATEMENT_HEADER: &str =
    "Date,Order ID,Customer,Product,Quantity,Unit Price,Total Price,Platform Fee (10%),Net Income";

/// One exportable line item, as selected from the orders/order_items join.
#[derive(Debug, Clone, FromRow)]
pub struct IncomeStatementRow {
    pub order_date: DateTime<Utc>,
    pub order_id: Uuid,
    pub customer_name: String,
    pub product: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

/// Render the income statement as CSV text.
pub fn income_statement_csv(rows: &[IncomeStatementRow]) -> String {
    let mut out = String::with_capacity(64 + rows.len() * 96);
    out.push_str(INCOME_STATEMENT_HEADER);
    out.push('\n');

    for row in rows {
        let fee = revenue::item_commission(row.line_total);
        let net = revenue::item_net_income(row.line_total);

        out.push_str(&format!(
            "{},{},{},{},{},{},{},{},{}\n",
            row.order_date.format("%Y-%m-%d"),
            row.order_id,
            strip_commas(&row.customer_name),
            strip_commas(&row.product),
            row.quantity,
            row.unit_price,
            row.line_total,
            fee,
            net,
        ));
    }

    out
}

fn strip_commas(field: &str) -> String {
    field.replace(',', "")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn sample_row() -> IncomeStatementRow {
        IncomeStatementRow {
            order_date: Utc.with_ymd_and_hms(2026, 3, 14, 9, 30, 0).unwrap(),
            order_id: Uuid::parse_str("99999999-9999-9999-9999-999999999999").unwrap(),
            customer_name: "Amina Yusuf".to_string(),
            product: "Three-piece suit".to_string(),
            quantity: 1,
            unit_price: dec("200.00"),
            line_total: dec("200.00"),
        }
    }

    #[test]
    fn header_matches_expected_columns() {
        let csv = income_statement_csv(&[]);
        assert_eq!(
            csv,
            "Date,Order ID,Customer,Product,Quantity,Unit Price,Total Price,Platform Fee (10%),Net Income\n"
        );
    }

    #[test]
    fn renders_one_row_per_item_with_fee_split() {
        let csv = income_statement_csv(&[sample_row()]);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[1],
            "2026-03-14,99999999-9999-9999-9999-999999999999,Amina Yusuf,Three-piece suit,1,200.00,200.00,20.00,180.00"
        );
    }

    #[test]
    fn strips_embedded_commas_from_free_text() {
        let mut row = sample_row();
        row.customer_name = "Yusuf, Amina".to_string();
        row.product = "Jacket, lined, wool".to_string();

        let csv = income_statement_csv(&[row]);
        let data_line = csv.lines().nth(1).unwrap();
        // Still exactly nine columns.
        assert_eq!(data_line.split(',').count(), 9);
        assert!(data_line.contains("Yusuf Amina"));
        assert!(data_line.contains("Jacket lined wool"));
    }
}
