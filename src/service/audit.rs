use crate::error::{ReportError, Result};
use crate::models::{DiscrepancyReport, Document, ExpectationTable, UnlinkedExpenses};
use bigdecimal::{BigDecimal, Zero};
use indexmap::IndexMap;

/// Group name for expenses that carry no supplier
pub const UNKNOWN_SUPPLIER: &str = "unknown";

/// Counts expense documents per supplier, in first-seen order
pub fn supplier_counts(expenses: &[Document]) -> IndexMap<&str, u32> {
    let mut counts: IndexMap<&str, u32> = IndexMap::new();
    for name in expenses.iter().filter_map(Document::supplier_name) {
        *counts.entry(name).or_insert(0) += 1;
    }
    counts
}

/// Compares one period's expenses against the expected bill count per supplier.
///
/// A supplier is short when it has fewer documents than expected; unlisted suppliers
/// expect 0 and can never be short. A listed supplier with no document at all is missing,
/// whatever its expected count.
pub fn audit(expenses: &[Document], expectations: &ExpectationTable) -> DiscrepancyReport {
    let counts = supplier_counts(expenses);
    let mut report = DiscrepancyReport::default();

    for (supplier, count) in &counts {
        if *count < expectations.expected(supplier) {
            report.short_suppliers.insert(supplier.to_string());
        }
    }
    for supplier in expectations.suppliers() {
        if !counts.contains_key(supplier) {
            report.missing_suppliers.insert(supplier.to_string());
        }
    }

    tracing::info!(
        "Expense audit: {} suppliers seen, {} missing, {} short",
        counts.len(),
        report.missing_suppliers.len(),
        report.short_suppliers.len()
    );
    report
}

/// Sums the amounts of expenses without a downloadable document, per supplier
pub fn unlinked_expenses(expenses: &[Document]) -> UnlinkedExpenses {
    let mut totals = UnlinkedExpenses::new();
    for expense in expenses.iter().filter(|e| e.url.is_none()) {
        let supplier = expense.supplier_name().unwrap_or(UNKNOWN_SUPPLIER);
        let total = totals
            .entry(supplier.to_string())
            .or_insert_with(BigDecimal::zero);
        *total += &expense.amount;
    }
    totals
}

/// Renders the unlinked expense totals as `supplier,amount` CSV
pub fn unlinked_expenses_csv(totals: &UnlinkedExpenses) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["supplier", "amount"])?;
    for (supplier, amount) in totals {
        let amount = amount.to_string();
        writer.write_record([supplier.as_str(), amount.as_str()])?;
    }
    writer
        .into_inner()
        .map_err(|e| ReportError::Package(e.to_string()))
}
