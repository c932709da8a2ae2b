use crate::domain::dataset::Dataset;
use crate::domain::model::{Customer, Invoice, InvoiceLine, Product};
use crate::utils::error::{InsightsError, Result};
use chrono::{NaiveDate, NaiveDateTime};
use csv::{ReaderBuilder, Trim};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::str::FromStr;

const DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M",
];

/// Raw contents of one source file.
#[derive(Debug, Clone)]
pub struct SourceTable {
    pub name: String,
    pub data: Vec<u8>,
}

impl SourceTable {
    pub fn new(name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            data: data.into(),
        }
    }

    fn delimiter(&self) -> u8 {
        if self.name.to_ascii_lowercase().ends_with(".tsv") {
            b'\t'
        } else {
            b','
        }
    }
}

#[derive(Debug, Clone)]
pub struct SourceTables {
    pub customers: SourceTable,
    pub products: SourceTable,
    pub invoices: SourceTable,
    pub invoice_lines: SourceTable,
}

#[derive(Debug, Deserialize)]
struct CustomerRow {
    #[serde(rename = "CustomerID")]
    customer_id: u64,
    #[serde(rename = "Country")]
    country: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProductRow {
    #[serde(rename = "StockCode")]
    stock_code: String,
    #[serde(rename = "Description")]
    description: String,
    #[serde(rename = "UnitPrice")]
    unit_price: String,
}

#[derive(Debug, Deserialize)]
struct InvoiceRow {
    #[serde(rename = "InvoiceNo")]
    invoice_no: String,
    #[serde(rename = "InvoiceDate")]
    invoice_date: String,
    #[serde(rename = "CustomerID")]
    customer_id: u64,
}

#[derive(Debug, Deserialize)]
struct LineRow {
    #[serde(rename = "InvoiceNo")]
    invoice_no: String,
    #[serde(rename = "StockCode")]
    stock_code: String,
    #[serde(rename = "Quantity")]
    quantity: i64,
}

pub fn parse_invoice_date(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    DATE_TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

fn read_rows<T: DeserializeOwned>(table: &SourceTable) -> Result<Vec<(u64, T)>> {
    let mut reader = ReaderBuilder::new()
        .delimiter(table.delimiter())
        .trim(Trim::All)
        .from_reader(table.data.as_slice());
    let headers = reader.headers()?.clone();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        let row = record
            .deserialize(Some(&headers))
            .map_err(|e| data_error(table, line, e.to_string()))?;
        rows.push((line, row));
    }
    Ok(rows)
}

fn data_error(table: &SourceTable, line: u64, message: String) -> InsightsError {
    InsightsError::DataFormat {
        file: table.name.clone(),
        line,
        message,
    }
}

fn located<T>(table: &SourceTable, line: u64, result: Result<T>) -> Result<T> {
    result.inspect_err(|e| tracing::warn!(file = %table.name, line, "rejected row: {}", e))
}

/// Bulk-loads the four tables in dependency order, so every row passes the
/// same key checks as a direct insert.
pub fn load_dataset(tables: &SourceTables) -> Result<Dataset> {
    let mut dataset = Dataset::new();

    let table = &tables.customers;
    for (line, row) in read_rows::<CustomerRow>(table)? {
        let customer = Customer {
            customer_id: row.customer_id,
            country: row.country,
        };
        located(table, line, dataset.insert_customer(customer))?;
    }

    let table = &tables.products;
    for (line, row) in read_rows::<ProductRow>(table)? {
        let unit_price = Decimal::from_str(row.unit_price.trim()).map_err(|e| {
            data_error(table, line, format!("invalid UnitPrice '{}': {}", row.unit_price, e))
        })?;
        let product = Product {
            stock_code: row.stock_code,
            description: row.description,
            unit_price,
        };
        located(table, line, dataset.insert_product(product))?;
    }

    let table = &tables.invoices;
    for (line, row) in read_rows::<InvoiceRow>(table)? {
        let invoice_date = parse_invoice_date(&row.invoice_date).ok_or_else(|| {
            data_error(table, line, format!("invalid InvoiceDate '{}'", row.invoice_date))
        })?;
        let invoice = Invoice {
            invoice_no: row.invoice_no,
            invoice_date,
            customer_id: row.customer_id,
        };
        located(table, line, dataset.insert_invoice(invoice))?;
    }

    let table = &tables.invoice_lines;
    for (line, row) in read_rows::<LineRow>(table)? {
        let invoice_line = InvoiceLine {
            invoice_no: row.invoice_no,
            stock_code: row.stock_code,
            quantity: row.quantity,
        };
        located(table, line, dataset.insert_line(invoice_line))?;
    }

    let summary = dataset.summary();
    tracing::debug!(
        "Loaded {} customers, {} products, {} invoices, {} invoice lines",
        summary.customers,
        summary.products,
        summary.invoices,
        summary.invoice_lines
    );
    Ok(dataset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::ConstraintKind;
    use chrono::{Datelike, Timelike};

    fn tables(lines: &str) -> SourceTables {
        SourceTables {
            customers: SourceTable::new("customers.csv", "CustomerID,Country\n17850,United Kingdom\n12583,France\n13047,\n"),
            products: SourceTable::new(
                "products.csv",
                "StockCode,Description,UnitPrice\n85123A,WHITE HANGING HEART T-LIGHT HOLDER,2.55\n71053,WHITE METAL LANTERN,3.39\n",
            ),
            invoices: SourceTable::new(
                "invoices.csv",
                "InvoiceNo,InvoiceDate,CustomerID\n536365,12/1/2010 8:26,17850\n536370,2010-12-01 08:45:00,12583\n",
            ),
            invoice_lines: SourceTable::new("invoice_details.csv", lines),
        }
    }

    #[test]
    fn test_load_dataset_from_csv() {
        let ds = load_dataset(&tables(
            "InvoiceNo,StockCode,Quantity\n536365,85123A,6\n536365,71053,6\n536370,71053,-2\n",
        ))
        .unwrap();

        let summary = ds.summary();
        assert_eq!(summary.customers, 3);
        assert_eq!(summary.products, 2);
        assert_eq!(summary.invoices, 2);
        assert_eq!(summary.invoice_lines, 3);

        assert_eq!(ds.customer(13047).unwrap().country, None);
        assert_eq!(ds.customer(12583).unwrap().country.as_deref(), Some("France"));
        assert_eq!(ds.product("85123A").unwrap().unit_price.to_string(), "2.55");
        assert_eq!(ds.lines_for_invoice("536370").next().unwrap().quantity, -2);
    }

    #[test]
    fn test_dangling_stock_code_rejected() {
        let err = load_dataset(&tables("InvoiceNo,StockCode,Quantity\n536365,NOPE,1\n")).unwrap_err();
        assert!(matches!(
            err,
            InsightsError::ConstraintViolation {
                kind: ConstraintKind::ForeignKey,
                ..
            }
        ));
    }

    #[test]
    fn test_duplicate_line_rejected() {
        let err = load_dataset(&tables(
            "InvoiceNo,StockCode,Quantity\n536365,71053,1\n536365,71053,2\n",
        ))
        .unwrap_err();
        assert!(matches!(
            err,
            InsightsError::ConstraintViolation {
                kind: ConstraintKind::DuplicateKey,
                ..
            }
        ));
    }

    #[test]
    fn test_bad_quantity_reports_file_and_line() {
        let err = load_dataset(&tables(
            "InvoiceNo,StockCode,Quantity\n536365,71053,1\n536365,85123A,lots\n",
        ))
        .unwrap_err();
        match err {
            InsightsError::DataFormat { file, line, .. } => {
                assert_eq!(file, "invoice_details.csv");
                assert_eq!(line, 3);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_bad_price_rejected() {
        let mut input = tables("InvoiceNo,StockCode,Quantity\n");
        input.products = SourceTable::new("products.csv", "StockCode,Description,UnitPrice\nX1,Thing,abc\n");
        assert!(matches!(
            load_dataset(&input),
            Err(InsightsError::DataFormat { line: 2, .. })
        ));
    }

    #[test]
    fn test_tsv_delimiter_from_extension() {
        let mut input = tables("");
        input.invoice_lines = SourceTable::new(
            "invoice_details.tsv",
            "InvoiceNo\tStockCode\tQuantity\n536365\t71053\t4\n",
        );
        let ds = load_dataset(&input).unwrap();
        assert_eq!(ds.lines_for_invoice("536365").next().unwrap().quantity, 4);
    }

    #[test]
    fn test_parse_invoice_date_formats() {
        let retail = parse_invoice_date("12/1/2010 8:26").unwrap();
        assert_eq!((retail.year(), retail.month(), retail.day()), (2010, 12, 1));
        assert_eq!((retail.hour(), retail.minute()), (8, 26));

        assert!(parse_invoice_date("2023-11-15 10:00:00").is_some());
        assert!(parse_invoice_date("2023-11-15T10:00:00").is_some());
        assert!(parse_invoice_date("2023-11-15 10:00").is_some());

        let date_only = parse_invoice_date("2023-11-15").unwrap();
        assert_eq!(date_only.hour(), 0);

        assert!(parse_invoice_date("15 Nov 2023").is_none());
        assert!(parse_invoice_date("").is_none());
    }
}
