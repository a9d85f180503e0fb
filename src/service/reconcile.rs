use crate::error::Result;
use crate::models::{Document, DocumentKind};
use crate::source::DocumentLookup;
use bigdecimal::BigDecimal;
use indexmap::IndexSet;
use std::collections::{HashMap, HashSet};

/// Position of the invoice number among the space-separated words of a receipt's remarks
pub const REFERENCE_TOKEN: usize = 4;

/// Invoice number a receipt refers to.
///
/// The bookkeeping service writes receipt remarks from a fixed template whose fifth word
/// (split on single spaces) is the paid invoice's number. This is positional and breaks
/// as soon as the template changes, so every caller goes through here.
pub fn referenced_invoice(remarks: &str) -> Option<&str> {
    remarks
        .split(' ')
        .nth(REFERENCE_TOKEN)
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Income documents split by kind, each list in input order
#[derive(Debug, Default)]
pub struct Partition {
    pub receipts: Vec<Document>,
    pub invoices: Vec<Document>,
    pub others: Vec<Document>,
}

pub fn partition(documents: Vec<Document>) -> Partition {
    let mut parts = Partition::default();
    for doc in documents {
        match doc.kind {
            DocumentKind::Receipt => parts.receipts.push(doc),
            DocumentKind::Invoice => parts.invoices.push(doc),
            DocumentKind::Other(_) => parts.others.push(doc),
        }
    }
    parts
}

/// Invoice numbers referenced by in-period receipts whose invoice is not in the period,
/// in first-reference order and without repeats
pub fn cross_period_references(documents: &[Document]) -> IndexSet<String> {
    let in_period: HashSet<&str> = documents
        .iter()
        .filter(|d| d.is_invoice())
        .map(|d| d.number.as_str())
        .collect();

    let mut missing = IndexSet::new();
    for receipt in documents.iter().filter(|d| d.is_receipt()) {
        let Some(number) = receipt.remarks.as_deref().and_then(referenced_invoice) else {
            tracing::warn!(
                "Receipt {} has no invoice reference in its remarks, pairing by amount only",
                receipt.number
            );
            continue;
        };
        if !in_period.contains(number) {
            missing.insert(number.to_string());
        }
    }
    missing
}

/// Orders the income documents of one period for merging.
///
/// Invoices referenced from an earlier period are fetched one by one through `lookup`;
/// any failed lookup aborts the whole run.
pub async fn reconcile<L>(documents: Vec<Document>, lookup: &L) -> Result<Vec<Document>>
where
    L: DocumentLookup + ?Sized,
{
    let references = cross_period_references(&documents);
    let mut fetched = Vec::with_capacity(references.len());
    for number in &references {
        tracing::info!("Fetching invoice {} from an earlier period", number);
        fetched.push(lookup.fetch_by_number(number).await?);
    }

    let total = documents.len();
    let ordered = arrange(documents, fetched);
    tracing::info!(
        "Reconciled {} in-period income documents into {} ({} from earlier periods)",
        total,
        ordered.len(),
        references.len()
    );
    Ok(ordered)
}

/// Builds the final order: each receipt followed by the in-period invoice with the same
/// amount, then unpaired invoices, then other documents, then the fetched invoices.
///
/// Pairing consumes invoices once. When several in-period invoices share an amount only
/// the last in input order is reachable for pairing; the rest stay unpaired.
pub fn arrange(documents: Vec<Document>, fetched: Vec<Document>) -> Vec<Document> {
    let Partition {
        receipts,
        invoices,
        others,
    } = partition(documents);

    let mut by_amount: HashMap<BigDecimal, usize> = HashMap::new();
    for (idx, invoice) in invoices.iter().enumerate() {
        by_amount.insert(invoice.amount.normalized(), idx);
    }
    let mut unpaired: Vec<Option<Document>> = invoices.into_iter().map(Some).collect();

    let mut seen: HashSet<(DocumentKind, String)> = HashSet::new();
    let mut ordered = Vec::with_capacity(receipts.len() + unpaired.len() + others.len() + fetched.len());

    for receipt in receipts {
        let paired = by_amount
            .remove(&receipt.amount.normalized())
            .and_then(|idx| unpaired[idx].take());
        ordered.push(receipt);
        ordered.extend(paired);
    }
    ordered.extend(unpaired.into_iter().flatten());
    ordered.extend(others);
    ordered.retain(|d| seen.insert((d.kind, d.number.clone())));

    for doc in fetched {
        if seen.insert((doc.kind, doc.number.clone())) {
            ordered.push(doc);
        }
    }
    ordered
}
