use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub customer_id: u64,
    pub country: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub stock_code: String,
    pub description: String,
    /// Two fractional digits once stored in a dataset.
    pub unit_price: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    pub invoice_no: String,
    pub invoice_date: NaiveDateTime,
    pub customer_id: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceLine {
    pub invoice_no: String,
    pub stock_code: String,
    pub quantity: i64,
}

impl Customer {
    pub fn new(customer_id: u64, country: Option<&str>) -> Self {
        Self {
            customer_id,
            country: country.map(str::to_string),
        }
    }
}

impl Product {
    pub fn new(stock_code: &str, description: &str, unit_price: Decimal) -> Self {
        Self {
            stock_code: stock_code.to_string(),
            description: description.to_string(),
            unit_price,
        }
    }
}

impl Invoice {
    pub fn new(invoice_no: &str, invoice_date: NaiveDateTime, customer_id: u64) -> Self {
        Self {
            invoice_no: invoice_no.to_string(),
            invoice_date,
            customer_id,
        }
    }
}

impl InvoiceLine {
    pub fn new(invoice_no: &str, stock_code: &str, quantity: i64) -> Self {
        Self {
            invoice_no: invoice_no.to_string(),
            stock_code: stock_code.to_string(),
            quantity,
        }
    }
}
