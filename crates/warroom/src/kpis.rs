//! Headline KPIs of the primary company's most recent period

use serde::Serialize;

use crate::store::DataStore;

/// How a KPI value is rendered
#[derive(Debug, Clone, Copy)]
enum Format {
    /// `$1090M`
    Millions,
    /// `$40.5M`
    MillionsOneDecimal,
    /// `125%`
    Percent,
    /// `1,204`
    Count,
}

/// Headline metrics in display order
const HEADLINE: [(&str, &str, Format); 7] = [
    ("Product Revenue", "PRODUCT_REVENUE_M", Format::Millions),
    ("Total Revenue", "TOTAL_REVENUE_M", Format::Millions),
    ("RPO", "RPO_M", Format::Millions),
    ("NRR", "NRR_PERCENT", Format::Percent),
    ("$1M+ Customers", "CUSTOMERS_1M_PLUS", Format::Count),
    ("FCF", "FCF_IN_MILLIONS", Format::MillionsOneDecimal),
    ("Gross Margin", "GROSS_MARGIN_PERCENT", Format::Percent),
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Kpi {
    pub label: String,
    pub value: String,
}

/// Formatted headline metrics plus the quarter they belong to
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatestKpis {
    pub ticker: String,
    /// "Q2 FY2026"; `None` when the ticker has no metrics
    pub quarter: Option<String>,
    pub items: Vec<Kpi>,
}

impl LatestKpis {
    /// Collect the headline metrics reported for `ticker`'s latest period
    pub fn from_store(store: &DataStore, ticker: &str) -> Self {
        let Some(period) = store.latest_period(ticker) else {
            return Self {
                ticker: ticker.to_string(),
                quarter: None,
                items: Vec::new(),
            };
        };

        let items = HEADLINE
            .iter()
            .filter_map(|(label, metric, format)| {
                let value = store.metric_value(ticker, period.end_date, metric)?;
                Some(Kpi {
                    label: (*label).to_string(),
                    value: render(value, *format),
                })
            })
            .collect();

        Self {
            ticker: ticker.to_string(),
            quarter: Some(period.label()),
            items,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, label: &str) -> Option<&str> {
        self.items
            .iter()
            .find(|k| k.label == label)
            .map(|k| k.value.as_str())
    }

    /// One "- Label: value" line per KPI
    pub fn to_prompt_text(&self) -> String {
        if self.items.is_empty() {
            return "No KPI data available".to_string();
        }
        self.items
            .iter()
            .map(|k| format!("- {}: {}", k.label, k.value))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn render(value: f64, format: Format) -> String {
    match format {
        Format::Millions => format!("${value:.0}M"),
        Format::MillionsOneDecimal => format!("${value:.1}M"),
        Format::Percent => format!("{value:.0}%"),
        Format::Count => thousands(value.round() as i64),
    }
}

fn thousands(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    if n < 0 {
        out.insert(0, '-');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::fixtures;

    #[test]
    fn test_latest_kpis_formats() {
        let store = fixtures::store();
        let kpis = LatestKpis::from_store(&store, "SNOW");

        assert_eq!(kpis.quarter.as_deref(), Some("Q2 FY2026"));
        assert_eq!(kpis.get("Product Revenue"), Some("$1090M"));
        assert_eq!(kpis.get("Total Revenue"), Some("$1145M"));
        assert_eq!(kpis.get("RPO"), Some("$6900M"));
        assert_eq!(kpis.get("NRR"), Some("108%"));
        assert_eq!(kpis.get("$1M+ Customers"), Some("654"));
        assert_eq!(kpis.get("FCF"), Some("$40.0M"));
        assert_eq!(kpis.get("Gross Margin"), Some("75%"));

        let labels: Vec<&str> = kpis.items.iter().map(|k| k.label.as_str()).collect();
        assert_eq!(labels[0], "Product Revenue");
        assert_eq!(labels[6], "Gross Margin");

        let text = kpis.to_prompt_text();
        assert!(text.starts_with("- Product Revenue: $1090M\n"));
    }

    #[test]
    fn test_unknown_ticker_has_no_kpis() {
        let store = fixtures::store();
        let kpis = LatestKpis::from_store(&store, "ZZZZ");
        assert!(kpis.is_empty());
        assert_eq!(kpis.quarter, None);
        assert_eq!(kpis.to_prompt_text(), "No KPI data available");
    }

    #[test]
    fn test_thousands_separator() {
        assert_eq!(thousands(0), "0");
        assert_eq!(thousands(999), "999");
        assert_eq!(thousands(1000), "1,000");
        assert_eq!(thousands(1_234_567), "1,234,567");
        assert_eq!(thousands(-4200), "-4,200");
    }
}
