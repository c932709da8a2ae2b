use crate::core::queries;
use crate::domain::dataset::Dataset;
use crate::domain::report::{
    OutputFormat, RenderedReport, ReportBundle, ReportKind, ReportRow, SpendingTiers,
};
use crate::utils::error::Result;
use csv::WriterBuilder;

/// Options shared by every report in one run.
#[derive(Debug, Clone)]
pub struct ReportOptions<'a> {
    pub kinds: &'a [ReportKind],
    pub formats: &'a [OutputFormat],
    pub tiers: SpendingTiers,
    pub row_limit: Option<usize>,
}

fn delimited<T: ReportRow>(rows: &[T], delimiter: u8) -> Result<String> {
    let mut writer = WriterBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(T::HEADERS)?;
    for row in rows {
        writer.serialize(row)?;
    }
    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

pub fn render<T: ReportRow>(rows: &[T], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Csv => delimited(rows, b','),
        OutputFormat::Tsv => delimited(rows, b'\t'),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(rows)?),
    }
}

fn render_all<T: ReportRow>(
    kind: ReportKind,
    mut rows: Vec<T>,
    options: &ReportOptions<'_>,
    bundle: &mut ReportBundle,
) -> Result<()> {
    if let Some(limit) = options.row_limit {
        rows.truncate(limit);
    }
    for &format in options.formats {
        bundle.reports.push(RenderedReport {
            kind,
            format,
            row_count: rows.len(),
            content: render(&rows, format)?,
        });
    }
    tracing::debug!("Rendered {} ({} rows)", kind, rows.len());
    Ok(())
}

/// Runs each selected query and renders it in every requested format.
pub fn build_reports(dataset: &Dataset, options: &ReportOptions<'_>) -> Result<ReportBundle> {
    let mut bundle = ReportBundle::default();
    for &kind in options.kinds {
        match kind {
            ReportKind::TopSpenders => {
                render_all(kind, queries::money_spent(dataset)?, options, &mut bundle)?
            }
            ReportKind::MostActiveCustomers => {
                render_all(kind, queries::transaction_count(dataset), options, &mut bundle)?
            }
            ReportKind::CustomerInvoiceCounts => render_all(
                kind,
                queries::distinct_invoice_count(dataset),
                options,
                &mut bundle,
            )?,
            ReportKind::TrendingProducts => {
                render_all(kind, queries::purchase_count(dataset), options, &mut bundle)?
            }
            ReportKind::TopCountries => render_all(
                kind,
                queries::total_purchases_by_country(dataset),
                options,
                &mut bundle,
            )?,
            ReportKind::SpendingTiers => render_all(
                kind,
                queries::spending_tiers_by_country(dataset, &options.tiers)?,
                options,
                &mut bundle,
            )?,
            ReportKind::QuarterlyTrends => render_all(
                kind,
                queries::quarterly_product_trends(dataset)?,
                options,
                &mut bundle,
            )?,
        }
    }
    Ok(bundle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{Customer, Invoice, InvoiceLine, Product};
    use crate::domain::report::{CountryPurchases, CustomerSpend};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn dataset() -> Dataset {
        let date = NaiveDate::from_ymd_opt(2023, 11, 15)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();
        let mut ds = Dataset::new();
        ds.insert_customer(Customer::new(1, Some("US"))).unwrap();
        ds.insert_customer(Customer::new(2, None)).unwrap();
        ds.insert_product(Product::new("A1", "Widget", Decimal::from_str("10.00").unwrap()))
            .unwrap();
        ds.insert_invoice(Invoice::new("INV1", date, 1)).unwrap();
        ds.insert_line(InvoiceLine::new("INV1", "A1", 3)).unwrap();
        ds
    }

    #[test]
    fn test_csv_and_tsv_rendering() {
        let rows = vec![CustomerSpend {
            customer_id: 1,
            money_spent: Decimal::from_str("30.00").unwrap(),
        }];
        assert_eq!(render(&rows, OutputFormat::Csv).unwrap(), "CustomerID,money_spent\n1,30.00\n");
        assert_eq!(render(&rows, OutputFormat::Tsv).unwrap(), "CustomerID\tmoney_spent\n1\t30.00\n");
    }

    #[test]
    fn test_empty_result_keeps_header() {
        let rows: Vec<CountryPurchases> = Vec::new();
        assert_eq!(render(&rows, OutputFormat::Csv).unwrap(), "Country,total_purchases\n");
        assert_eq!(render(&rows, OutputFormat::Json).unwrap(), "[]");
    }

    #[test]
    fn test_missing_country_renders_empty_or_null() {
        let rows = vec![CountryPurchases {
            country: None,
            total_purchases: 0,
        }];
        assert_eq!(render(&rows, OutputFormat::Csv).unwrap(), "Country,total_purchases\n,0\n");
        let json: serde_json::Value =
            serde_json::from_str(&render(&rows, OutputFormat::Json).unwrap()).unwrap();
        assert!(json[0]["Country"].is_null());
    }

    #[test]
    fn test_build_reports_for_every_kind_and_format() {
        let formats = [OutputFormat::Csv, OutputFormat::Json];
        let options = ReportOptions {
            kinds: ReportKind::ALL,
            formats: &formats,
            tiers: SpendingTiers::default(),
            row_limit: None,
        };
        let bundle = build_reports(&dataset(), &options).unwrap();
        assert_eq!(bundle.reports.len(), ReportKind::ALL.len() * 2);

        let tiers = bundle
            .reports
            .iter()
            .find(|r| r.kind == ReportKind::SpendingTiers && r.format == OutputFormat::Csv)
            .unwrap();
        assert_eq!(tiers.file_name(), "spending_tiers.csv");
        assert_eq!(tiers.content, "Country,TotalSpending,category\nUS,30.00,Low\n");

        let trends = bundle
            .reports
            .iter()
            .find(|r| r.kind == ReportKind::QuarterlyTrends && r.format == OutputFormat::Csv)
            .unwrap();
        assert!(trends.content.starts_with("Description,Quarter,TotalQuantity\nWidget,2023-Q4,3\n"));
    }

    #[test]
    fn test_row_limit_truncates() {
        let formats = [OutputFormat::Csv];
        let options = ReportOptions {
            kinds: &[ReportKind::TopSpenders],
            formats: &formats,
            tiers: SpendingTiers::default(),
            row_limit: Some(1),
        };
        let bundle = build_reports(&dataset(), &options).unwrap();
        assert_eq!(bundle.reports.len(), 1);
        assert_eq!(bundle.reports[0].row_count, 1);
        assert_eq!(bundle.reports[0].content, "CustomerID,money_spent\n1,30.00\n");
    }
}
