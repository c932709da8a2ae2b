use crate::domain::model::{Customer, Invoice, InvoiceLine, Product};
use crate::utils::error::{ConstraintKind, InsightsError, Result};
use rust_decimal::{Decimal, RoundingStrategy};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

pub const CUSTOMERS: &str = "customers";
pub const PRODUCTS: &str = "products";
pub const INVOICES: &str = "invoices";
pub const INVOICE_LINES: &str = "invoice_lines";

const PRICE_SCALE: u32 = 2;

/// Row counts per table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DatasetSummary {
    pub customers: usize,
    pub products: usize,
    pub invoices: usize,
    pub invoice_lines: usize,
}

/// The four retail tables, keyed by their primary keys. Writes enforce key
/// uniqueness and foreign-key references; there is no update or delete path.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    customers: BTreeMap<u64, Customer>,
    products: BTreeMap<String, Product>,
    invoices: BTreeMap<String, Invoice>,
    lines: BTreeMap<(String, String), InvoiceLine>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_customer(&mut self, customer: Customer) -> Result<()> {
        match self.customers.entry(customer.customer_id) {
            Entry::Occupied(_) => Err(InsightsError::constraint(
                ConstraintKind::DuplicateKey,
                CUSTOMERS,
                customer.customer_id.to_string(),
            )),
            Entry::Vacant(slot) => {
                slot.insert(customer);
                Ok(())
            }
        }
    }

    pub fn insert_product(&mut self, mut product: Product) -> Result<()> {
        if self.products.contains_key(&product.stock_code) {
            return Err(InsightsError::constraint(
                ConstraintKind::DuplicateKey,
                PRODUCTS,
                product.stock_code,
            ));
        }
        product.unit_price = product
            .unit_price
            .round_dp_with_strategy(PRICE_SCALE, RoundingStrategy::MidpointAwayFromZero);
        product.unit_price.rescale(PRICE_SCALE);
        self.products.insert(product.stock_code.clone(), product);
        Ok(())
    }

    pub fn insert_invoice(&mut self, invoice: Invoice) -> Result<()> {
        if self.invoices.contains_key(&invoice.invoice_no) {
            return Err(InsightsError::constraint(
                ConstraintKind::DuplicateKey,
                INVOICES,
                invoice.invoice_no,
            ));
        }
        if !self.customers.contains_key(&invoice.customer_id) {
            return Err(InsightsError::constraint(
                ConstraintKind::ForeignKey,
                INVOICES,
                format!("{} -> customer {}", invoice.invoice_no, invoice.customer_id),
            ));
        }
        self.invoices.insert(invoice.invoice_no.clone(), invoice);
        Ok(())
    }

    pub fn insert_line(&mut self, line: InvoiceLine) -> Result<()> {
        self.check_line_references(&line.invoice_no, &line.stock_code)?;

        let key = (line.invoice_no.clone(), line.stock_code.clone());
        if self.lines.contains_key(&key) {
            return Err(InsightsError::constraint(
                ConstraintKind::DuplicateKey,
                INVOICE_LINES,
                format!("{}/{}", key.0, key.1),
            ));
        }
        self.lines.insert(key, line);
        Ok(())
    }

    /// Adds `quantity` of a product to an invoice. A product already on the
    /// invoice has its line incremented instead of gaining a second row.
    pub fn record_purchase(&mut self, invoice_no: &str, stock_code: &str, quantity: i64) -> Result<()> {
        self.check_line_references(invoice_no, stock_code)?;

        let key = (invoice_no.to_string(), stock_code.to_string());
        match self.lines.entry(key) {
            Entry::Occupied(mut existing) => {
                let line = existing.get_mut();
                line.quantity = line.quantity.checked_add(quantity).ok_or_else(|| {
                    InsightsError::overflow(format!("quantity of {}/{}", invoice_no, stock_code))
                })?;
            }
            Entry::Vacant(slot) => {
                slot.insert(InvoiceLine::new(invoice_no, stock_code, quantity));
            }
        }
        Ok(())
    }

    fn check_line_references(&self, invoice_no: &str, stock_code: &str) -> Result<()> {
        if !self.invoices.contains_key(invoice_no) {
            return Err(InsightsError::constraint(
                ConstraintKind::ForeignKey,
                INVOICE_LINES,
                format!("{}/{} -> invoice {}", invoice_no, stock_code, invoice_no),
            ));
        }
        if !self.products.contains_key(stock_code) {
            return Err(InsightsError::constraint(
                ConstraintKind::ForeignKey,
                INVOICE_LINES,
                format!("{}/{} -> product {}", invoice_no, stock_code, stock_code),
            ));
        }
        Ok(())
    }

    pub fn customers(&self) -> impl Iterator<Item = &Customer> {
        self.customers.values()
    }

    pub fn products(&self) -> impl Iterator<Item = &Product> {
        self.products.values()
    }

    pub fn invoices(&self) -> impl Iterator<Item = &Invoice> {
        self.invoices.values()
    }

    pub fn lines(&self) -> impl Iterator<Item = &InvoiceLine> {
        self.lines.values()
    }

    pub fn customer(&self, customer_id: u64) -> Option<&Customer> {
        self.customers.get(&customer_id)
    }

    pub fn product(&self, stock_code: &str) -> Option<&Product> {
        self.products.get(stock_code)
    }

    pub fn invoice(&self, invoice_no: &str) -> Option<&Invoice> {
        self.invoices.get(invoice_no)
    }

    pub fn lines_for_invoice<'a>(&'a self, invoice_no: &'a str) -> impl Iterator<Item = &'a InvoiceLine> + 'a {
        self.lines
            .range((invoice_no.to_string(), String::new())..)
            .take_while(move |((no, _), _)| no == invoice_no)
            .map(|(_, line)| line)
    }

    pub fn summary(&self) -> DatasetSummary {
        DatasetSummary {
            customers: self.customers.len(),
            products: self.products.len(),
            invoices: self.invoices.len(),
            invoice_lines: self.lines.len(),
        }
    }
}

/// Monetary value of one line: unit price times quantity.
pub fn line_value(product: &Product, line: &InvoiceLine) -> Result<Decimal> {
    product
        .unit_price
        .checked_mul(Decimal::from(line.quantity))
        .ok_or_else(|| {
            InsightsError::overflow(format!("value of {}/{}", line.invoice_no, line.stock_code))
        })
}
