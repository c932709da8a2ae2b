//! Result rows produced by the query set, plus the value types they carry.

use chrono::{Datelike, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A row type that can be rendered as a table with a fixed header.
pub trait ReportRow: Serialize {
    const HEADERS: &'static [&'static str];
}

/// Calendar quarter of an invoice date, rendered as `YYYY-Qn`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Quarter {
    pub year: i32,
    pub quarter: u8,
}

impl Quarter {
    pub fn from_datetime(at: &NaiveDateTime) -> Self {
        Self {
            year: at.year(),
            quarter: (at.month0() / 3 + 1) as u8,
        }
    }
}

impl fmt::Display for Quarter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-Q{}", self.year, self.quarter)
    }
}

impl Serialize for Quarter {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpendingTier {
    Low,
    Medium,
    High,
}

/// Inclusive bounds of the Medium tier. Below `medium_min` is Low, above
/// `medium_max` is High.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpendingTiers {
    pub medium_min: Decimal,
    pub medium_max: Decimal,
}

impl Default for SpendingTiers {
    fn default() -> Self {
        Self {
            medium_min: Decimal::from(100),
            medium_max: Decimal::from(500),
        }
    }
}

impl SpendingTiers {
    pub fn classify(&self, total: Decimal) -> SpendingTier {
        if total < self.medium_min {
            SpendingTier::Low
        } else if total > self.medium_max {
            SpendingTier::High
        } else {
            SpendingTier::Medium
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomerSpend {
    #[serde(rename = "CustomerID")]
    pub customer_id: u64,
    pub money_spent: Decimal,
}

impl ReportRow for CustomerSpend {
    const HEADERS: &'static [&'static str] = &["CustomerID", "money_spent"];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomerTransactions {
    #[serde(rename = "CustomerID")]
    pub customer_id: u64,
    pub transaction_count: u64,
}

impl ReportRow for CustomerTransactions {
    const HEADERS: &'static [&'static str] = &["CustomerID", "transaction_count"];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomerInvoices {
    #[serde(rename = "CustomerID")]
    pub customer_id: u64,
    pub invoice_count: u64,
}

impl ReportRow for CustomerInvoices {
    const HEADERS: &'static [&'static str] = &["CustomerID", "invoice_count"];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductPurchases {
    #[serde(rename = "Description")]
    pub description: String,
    pub purchase_count: u64,
}

impl ReportRow for ProductPurchases {
    const HEADERS: &'static [&'static str] = &["Description", "purchase_count"];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountryPurchases {
    #[serde(rename = "Country")]
    pub country: Option<String>,
    pub total_purchases: u64,
}

impl ReportRow for CountryPurchases {
    const HEADERS: &'static [&'static str] = &["Country", "total_purchases"];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountrySpendingTier {
    #[serde(rename = "Country")]
    pub country: Option<String>,
    #[serde(rename = "TotalSpending")]
    pub total_spending: Decimal,
    pub category: SpendingTier,
}

impl ReportRow for CountrySpendingTier {
    const HEADERS: &'static [&'static str] = &["Country", "TotalSpending", "category"];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuarterlyProductTrend {
    #[serde(rename = "Description")]
    pub description: Option<String>,
    #[serde(rename = "Quarter")]
    pub quarter: Option<Quarter>,
    #[serde(rename = "TotalQuantity")]
    pub total_quantity: i64,
}

impl ReportRow for QuarterlyProductTrend {
    const HEADERS: &'static [&'static str] = &["Description", "Quarter", "TotalQuantity"];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    TopSpenders,
    MostActiveCustomers,
    CustomerInvoiceCounts,
    TrendingProducts,
    TopCountries,
    SpendingTiers,
    QuarterlyTrends,
}

impl ReportKind {
    pub const ALL: &'static [ReportKind] = &[
        ReportKind::TopSpenders,
        ReportKind::MostActiveCustomers,
        ReportKind::CustomerInvoiceCounts,
        ReportKind::TrendingProducts,
        ReportKind::TopCountries,
        ReportKind::SpendingTiers,
        ReportKind::QuarterlyTrends,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportKind::TopSpenders => "top_spenders",
            ReportKind::MostActiveCustomers => "most_active_customers",
            ReportKind::CustomerInvoiceCounts => "customer_invoice_counts",
            ReportKind::TrendingProducts => "trending_products",
            ReportKind::TopCountries => "top_countries",
            ReportKind::SpendingTiers => "spending_tiers",
            ReportKind::QuarterlyTrends => "quarterly_trends",
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim().replace('-', "_").to_ascii_lowercase();
        ReportKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == wanted)
            .ok_or_else(|| {
                let known: Vec<&str> = ReportKind::ALL.iter().map(|k| k.as_str()).collect();
                format!("unknown report '{}' (known: {})", s, known.join(", "))
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Csv,
    Tsv,
    Json,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Tsv => "tsv",
            OutputFormat::Json => "json",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "tsv" => Ok(OutputFormat::Tsv),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("unsupported format '{}' (valid: csv, tsv, json)", other)),
        }
    }
}

/// One report rendered in a single format, ready to be written out.
#[derive(Debug, Clone)]
pub struct RenderedReport {
    pub kind: ReportKind,
    pub format: OutputFormat,
    pub row_count: usize,
    pub content: String,
}

impl RenderedReport {
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.kind.as_str(), self.format.extension())
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReportBundle {
    pub reports: Vec<RenderedReport>,
}
