use bigdecimal::BigDecimal;
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

/// Expected bill count per reporting period, keyed by supplier name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExpectationTable {
    entries: IndexMap<String, u32>,
}

impl ExpectationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the expectation for `supplier`
    pub fn insert(&mut self, supplier: impl Into<String>, expected: u32) {
        self.entries.insert(supplier.into(), expected);
    }

    /// Expected count, 0 for unlisted suppliers
    pub fn expected(&self, supplier: &str) -> u32 {
        self.entries.get(supplier).copied().unwrap_or(0)
    }

    /// Suppliers in configuration order
    pub fn suppliers(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, u32)> for ExpectationTable {
    fn from_iter<I: IntoIterator<Item = (S, u32)>>(iter: I) -> Self {
        let mut table = Self::new();
        for (supplier, expected) in iter {
            table.insert(supplier, expected);
        }
        table
    }
}

/// Outcome of the expense audit
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscrepancyReport {
    /// Expected suppliers with no document at all in the period
    pub missing_suppliers: IndexSet<String>,
    /// Suppliers with fewer documents than expected
    pub short_suppliers: IndexSet<String>,
}

impl DiscrepancyReport {
    pub fn is_clean(&self) -> bool {
        self.missing_suppliers.is_empty() && self.short_suppliers.is_empty()
    }
}

/// Summed amounts of expenses that have no downloadable document, per supplier
pub type UnlinkedExpenses = IndexMap<String, BigDecimal>;
