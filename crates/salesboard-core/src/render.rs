//! Text and HTML rendering of tables.
//!
//! The [`Render`] trait gives result types a terminal representation and an
//! optional HTML one for the browser client.

use std::fmt::Write as _;

use crate::kpi::Kpis;
use crate::table::{Cell, Table};

/// Types that can be displayed in a terminal or a web page.
pub trait Render {
    /// Plain text representation (for terminals).
    fn render_text(&self) -> String;

    /// HTML representation.
    ///
    /// Return `None` to fall back to text rendering.
    fn render_html(&self) -> Option<String> {
        None
    }
}

impl Render for Table {
    /// Left-aligned text, right-aligned numbers, a dashed rule under the header.
    fn render_text(&self) -> String {
        let fields: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|row| row.iter().map(display_cell).collect())
            .collect();

        let mut widths: Vec<usize> = self.columns.iter().map(|c| c.chars().count()).collect();
        for row in &fields {
            for (w, field) in widths.iter_mut().zip(row) {
                *w = (*w).max(field.chars().count());
            }
        }

        let mut out = String::new();
        let header: Vec<String> = self
            .columns
            .iter()
            .zip(&widths)
            .map(|(c, w)| format!("{:<w$}", c, w = *w))
            .collect();
        out.push_str(header.join("  ").trim_end());
        out.push('\n');
        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        out.push_str(&rule.join("  "));
        out.push('\n');

        for (cells, row) in self.rows.iter().zip(&fields) {
            let line: Vec<String> = cells
                .iter()
                .zip(row)
                .zip(&widths)
                .map(|((cell, field), w)| match cell {
                    Cell::Text(_) | Cell::Null => format!("{:<w$}", field, w = *w),
                    Cell::Integer(_) | Cell::Number(_) => format!("{:>w$}", field, w = *w),
                })
                .collect();
            out.push_str(line.join("  ").trim_end());
            out.push('\n');
        }
        out
    }

    fn render_html(&self) -> Option<String> {
        let mut html = String::from("<table class=\"dataframe\">\n<thead><tr>");
        for column in &self.columns {
            let _ = write!(html, "<th>{}</th>", escape_html(column));
        }
        html.push_str("</tr></thead>\n<tbody>\n");
        for row in &self.rows {
            html.push_str("<tr>");
            for cell in row {
                let _ = write!(html, "<td>{}</td>", escape_html(&display_cell(cell)));
            }
            html.push_str("</tr>\n");
        }
        html.push_str("</tbody>\n</table>\n");
        Some(html)
    }
}

impl Render for Kpis {
    fn render_text(&self) -> String {
        let lines = [
            ("Total Sales", format_currency(self.total_sales)),
            ("Total Profit", format_currency(self.total_profit)),
            ("Profit Margin", format!("{:.2}%", self.profit_margin_pct)),
            ("Total Quantity", self.total_quantity.to_string()),
            ("Avg Order Value", format_currency(self.avg_order_value)),
            ("Unique Customers", self.unique_customers.to_string()),
            ("Rows", self.row_count.to_string()),
        ];
        lines
            .iter()
            .map(|(label, value)| format!("{:<18}{}\n", label, value))
            .collect()
    }
}

/// Cell text for display: numbers to two decimals, `Null` as blank.
fn display_cell(cell: &Cell) -> String {
    match cell {
        Cell::Number(n) => format!("{:.2}", n),
        other => other.to_field(),
    }
}

/// Dollar amount with thousands separators, e.g. `$1,234.50` or `-$3.00`.
pub fn format_currency(value: f64) -> String {
    let cents = format!("{:.2}", value.abs());
    let (whole, frac) = cents.split_once('.').unwrap_or((cents.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 && cents != "0.00" { "-" } else { "" };
    format!("{}${}.{}", sign, grouped, frac)
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
