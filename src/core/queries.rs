//! The retail query set. Every function is a pure read over a [`Dataset`].
//!
//! Null policy: a sum over an unmatched group is zero and a count of line
//! references over an unmatched group is zero. `transaction_count` is the one
//! exception: it counts joined rows, so a customer without invoices still
//! yields one row. Rows with equal aggregates are ordered by ascending
//! grouping key, `None` keys first.

use crate::domain::dataset::{line_value, Dataset};
use crate::domain::model::{Customer, Invoice, InvoiceLine, Product};
use crate::domain::report::{
    CountryPurchases, CountrySpendingTier, CustomerInvoices, CustomerSpend, CustomerTransactions,
    ProductPurchases, Quarter, QuarterlyProductTrend, SpendingTiers,
};
use crate::utils::error::{InsightsError, Result};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};

/// One row of customers LEFT JOIN invoices LEFT JOIN lines LEFT JOIN products.
#[derive(Debug, Clone, Copy)]
struct ChainRow<'a> {
    customer: &'a Customer,
    invoice: Option<&'a Invoice>,
    line: Option<&'a InvoiceLine>,
    product: Option<&'a Product>,
}

impl ChainRow<'_> {
    fn value(&self) -> Result<Decimal> {
        match (self.line, self.product) {
            (Some(line), Some(product)) => line_value(product, line),
            _ => Ok(Decimal::ZERO),
        }
    }

    fn is_complete(&self) -> bool {
        self.invoice.is_some() && self.line.is_some() && self.product.is_some()
    }
}

fn invoices_by_customer(dataset: &Dataset) -> HashMap<u64, Vec<&Invoice>> {
    let mut index: HashMap<u64, Vec<&Invoice>> = HashMap::new();
    for invoice in dataset.invoices() {
        index.entry(invoice.customer_id).or_default().push(invoice);
    }
    index
}

/// Customers LEFT JOIN invoices: one row per invoice, or a single invoice-less row
/// for a customer with none.
fn customer_invoice_rows(dataset: &Dataset) -> Vec<(&Customer, Option<&Invoice>)> {
    let index = invoices_by_customer(dataset);
    let mut rows = Vec::new();
    for customer in dataset.customers() {
        match index.get(&customer.customer_id) {
            Some(invoices) => rows.extend(invoices.iter().map(|&inv| (customer, Some(inv)))),
            None => rows.push((customer, None)),
        }
    }
    rows
}

fn customer_chain(dataset: &Dataset) -> Vec<ChainRow<'_>> {
    let mut rows = Vec::new();
    for (customer, invoice) in customer_invoice_rows(dataset) {
        let Some(invoice) = invoice else {
            rows.push(ChainRow {
                customer,
                invoice: None,
                line: None,
                product: None,
            });
            continue;
        };

        let before = rows.len();
        for line in dataset.lines_for_invoice(&invoice.invoice_no) {
            rows.push(ChainRow {
                customer,
                invoice: Some(invoice),
                line: Some(line),
                product: dataset.product(&line.stock_code),
            });
        }
        if rows.len() == before {
            rows.push(ChainRow {
                customer,
                invoice: Some(invoice),
                line: None,
                product: None,
            });
        }
    }
    rows
}

fn accumulate(total: &mut Decimal, amount: Decimal, context: impl FnOnce() -> String) -> Result<()> {
    *total = total
        .checked_add(amount)
        .ok_or_else(|| InsightsError::overflow(context()))?;
    Ok(())
}

fn rank_by<T, V: Ord, K: Ord>(rows: &mut [T], value: impl Fn(&T) -> V, key: impl Fn(&T) -> K) {
    rows.sort_by(|a, b| value(b).cmp(&value(a)).then_with(|| key(a).cmp(&key(b))));
}

/// Q1: total spend per customer, highest first.
pub fn money_spent(dataset: &Dataset) -> Result<Vec<CustomerSpend>> {
    let mut totals: BTreeMap<u64, Decimal> = BTreeMap::new();
    for row in customer_chain(dataset) {
        let id = row.customer.customer_id;
        let total = totals.entry(id).or_insert(Decimal::ZERO);
        accumulate(total, row.value()?, || format!("money_spent of customer {}", id))?;
    }

    let mut rows: Vec<CustomerSpend> = totals
        .into_iter()
        .map(|(customer_id, money_spent)| CustomerSpend {
            customer_id,
            money_spent,
        })
        .collect();
    rank_by(&mut rows, |r| r.money_spent, |r| r.customer_id);
    Ok(rows)
}

/// Q2: joined customer/invoice rows per customer. A customer without
/// invoices counts 1, the way the outer join materializes it.
pub fn transaction_count(dataset: &Dataset) -> Vec<CustomerTransactions> {
    let mut counts: BTreeMap<u64, u64> = BTreeMap::new();
    for (customer, _) in customer_invoice_rows(dataset) {
        *counts.entry(customer.customer_id).or_default() += 1;
    }

    let mut rows: Vec<CustomerTransactions> = counts
        .into_iter()
        .map(|(customer_id, transaction_count)| CustomerTransactions {
            customer_id,
            transaction_count,
        })
        .collect();
    rank_by(&mut rows, |r| r.transaction_count, |r| r.customer_id);
    rows
}

/// Distinct invoices per customer; zero for a customer without invoices.
pub fn distinct_invoice_count(dataset: &Dataset) -> Vec<CustomerInvoices> {
    let mut counts: BTreeMap<u64, u64> = BTreeMap::new();
    for (customer, invoice) in customer_invoice_rows(dataset) {
        *counts.entry(customer.customer_id).or_default() += u64::from(invoice.is_some());
    }

    let mut rows: Vec<CustomerInvoices> = counts
        .into_iter()
        .map(|(customer_id, invoice_count)| CustomerInvoices {
            customer_id,
            invoice_count,
        })
        .collect();
    rank_by(&mut rows, |r| r.invoice_count, |r| r.customer_id);
    rows
}

/// Q3: invoice lines per product description. Counts line occurrences, not
/// quantities; products sharing a description share a row.
pub fn purchase_count(dataset: &Dataset) -> Vec<ProductPurchases> {
    let mut per_code: HashMap<&str, u64> = HashMap::new();
    for line in dataset.lines() {
        *per_code.entry(line.stock_code.as_str()).or_default() += 1;
    }

    let mut per_description: BTreeMap<&str, u64> = BTreeMap::new();
    for product in dataset.products() {
        let lines = per_code.get(product.stock_code.as_str()).copied().unwrap_or(0);
        *per_description.entry(product.description.as_str()).or_default() += lines;
    }

    let mut rows: Vec<ProductPurchases> = per_description
        .into_iter()
        .map(|(description, purchase_count)| ProductPurchases {
            description: description.to_string(),
            purchase_count,
        })
        .collect();
    rank_by(&mut rows, |r| r.purchase_count, |r| r.description.clone());
    rows
}

/// Q4: invoice lines per customer country.
pub fn total_purchases_by_country(dataset: &Dataset) -> Vec<CountryPurchases> {
    let mut counts: BTreeMap<Option<&str>, u64> = BTreeMap::new();
    for row in customer_chain(dataset) {
        *counts.entry(row.customer.country.as_deref()).or_default() += u64::from(row.line.is_some());
    }

    let mut rows: Vec<CountryPurchases> = counts
        .into_iter()
        .map(|(country, total_purchases)| CountryPurchases {
            country: country.map(str::to_string),
            total_purchases,
        })
        .collect();
    rank_by(&mut rows, |r| r.total_purchases, |r| r.country.clone());
    rows
}

/// Q5: spend per country over complete rows only, with its spending tier.
/// Countries whose customers never bought anything do not appear.
pub fn spending_tiers_by_country(
    dataset: &Dataset,
    tiers: &SpendingTiers,
) -> Result<Vec<CountrySpendingTier>> {
    let mut totals: BTreeMap<Option<&str>, Decimal> = BTreeMap::new();
    for row in customer_chain(dataset).into_iter().filter(|row| row.is_complete()) {
        let country = row.customer.country.as_deref();
        let total = totals.entry(country).or_insert(Decimal::ZERO);
        accumulate(total, row.value()?, || {
            format!("TotalSpending of {}", country.unwrap_or("<no country>"))
        })?;
    }

    let mut rows: Vec<CountrySpendingTier> = totals
        .into_iter()
        .map(|(country, total_spending)| CountrySpendingTier {
            country: country.map(str::to_string),
            total_spending,
            category: tiers.classify(total_spending),
        })
        .collect();
    rank_by(&mut rows, |r| r.total_spending, |r| r.country.clone());
    Ok(rows)
}

/// Q6: quantity sold per (description, quarter). Invoice-less customers and
/// line-less invoices surface as groups with missing keys and zero quantity.
pub fn quarterly_product_trends(dataset: &Dataset) -> Result<Vec<QuarterlyProductTrend>> {
    let mut totals: BTreeMap<(Option<&str>, Option<Quarter>), i64> = BTreeMap::new();
    for row in customer_chain(dataset) {
        let description = row.product.map(|p| p.description.as_str());
        let quarter = row.invoice.map(|inv| Quarter::from_datetime(&inv.invoice_date));
        let total = totals.entry((description, quarter)).or_insert(0);
        let quantity = row.line.map(|l| l.quantity).unwrap_or(0);
        *total = total.checked_add(quantity).ok_or_else(|| {
            InsightsError::overflow(format!(
                "TotalQuantity of {} in {}",
                description.unwrap_or("<none>"),
                quarter.map(|q| q.to_string()).unwrap_or_default()
            ))
        })?;
    }

    let mut rows: Vec<QuarterlyProductTrend> = totals
        .into_iter()
        .map(|((description, quarter), total_quantity)| QuarterlyProductTrend {
            description: description.map(str::to_string),
            quarter,
            total_quantity,
        })
        .collect();
    rank_by(
        &mut rows,
        |r| r.total_quantity,
        |r| (r.description.clone(), r.quarter),
    );
    Ok(rows)
}
