#![allow(dead_code)]

use async_trait::async_trait;
use bookkeeping_report::error::{ReportError, Result};
use bookkeeping_report::models::{Document, ExpectationTable};
use bookkeeping_report::source::{AccessToken, DocumentSource, Ledger, ListScope};
use bookkeeping_report::{build_router, AppState, ReportService};
use axum::Router;
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Object, Stream};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub const CODE: &str = "s3cret";

/// In-memory bookkeeping service
#[derive(Default)]
pub struct StubSource {
    pub income: Vec<Document>,
    pub expenses: Vec<Document>,
    /// Invoices reachable only by number lookup
    pub earlier: HashMap<String, Document>,
    pub files: HashMap<String, Vec<u8>>,
    pub fail_auth: bool,
    pub calls: Mutex<Vec<String>>,
}

impl StubSource {
    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl DocumentSource for StubSource {
    async fn authenticate(&self) -> Result<AccessToken> {
        self.record("authenticate".to_string());
        if self.fail_auth {
            return Err(ReportError::Authentication("bad credentials".to_string()));
        }
        Ok(AccessToken("token-1".to_string()))
    }

    async fn list_documents(
        &self,
        token: &AccessToken,
        ledger: Ledger,
        scope: ListScope,
    ) -> Result<Vec<Document>> {
        assert_eq!(token.as_str(), "token-1");
        let scope = match scope {
            ListScope::Period(p) => format!("{}..{}", p.start(), p.end()),
            ListScope::All => "all".to_string(),
        };
        self.record(format!("list {} {}", ledger.as_str(), scope));
        Ok(match ledger {
            Ledger::Income => self.income.clone(),
            Ledger::Expense => self.expenses.clone(),
        })
    }

    async fn get_document(&self, token: &AccessToken, ledger: Ledger, number: &str) -> Result<Document> {
        assert_eq!(token.as_str(), "token-1");
        self.record(format!("get {} {}", ledger.as_str(), number));
        self.earlier
            .get(number)
            .cloned()
            .ok_or_else(|| ReportError::NotFound(number.to_string()))
    }

    async fn download(&self, url: &str) -> Result<Option<Vec<u8>>> {
        self.record(format!("download {}", url));
        Ok(self.files.get(url).cloned())
    }
}

/// Decodes a record the way the bookkeeping service sends it
pub fn record(value: Value) -> Document {
    serde_json::from_value(value).unwrap()
}

pub fn invoice(number: &str, amount: f64, url: Option<&str>) -> Document {
    let mut value = json!({"number": number, "type": 305, "amount": amount});
    if let Some(url) = url {
        value["url"] = json!({ "he": url });
    }
    record(value)
}

pub fn receipt(number: &str, amount: f64, invoice: &str, url: Option<&str>) -> Document {
    let mut value = json!({
        "number": number,
        "type": 400,
        "amount": amount,
        "remarks": format!("Payment for tax invoice {}", invoice),
    });
    if let Some(url) = url {
        value["url"] = json!({ "he": url });
    }
    record(value)
}

pub fn expense(supplier: &str, amount: f64, url: Option<&str>) -> Document {
    let mut value = json!({
        "number": "",
        "type": 20,
        "amount": amount,
        "supplier": {"name": supplier},
    });
    if let Some(url) = url {
        value["url"] = json!(url);
    }
    record(value)
}

pub fn expectations(entries: &[(&str, u32)]) -> ExpectationTable {
    entries.iter().map(|(s, n)| (*s, *n)).collect()
}

pub fn app(source: Arc<StubSource>, table: ExpectationTable) -> Router {
    let service = Arc::new(ReportService::new(source, table));
    build_router(AppState::new(service, CODE))
}

/// PDF with one page per label, each page showing its label
pub fn pdf(labels: &[&str]) -> Vec<u8> {
    let mut doc = lopdf::Document::with_version("1.5");
    let tree_id = doc.new_object_id();
    let mut kids = Vec::new();
    for label in labels {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tj", vec![Object::string_literal(*label)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(Dictionary::new(), content.encode().unwrap()));
        let mut page = Dictionary::new();
        page.set("Type", Object::Name(b"Page".to_vec()));
        page.set("Parent", tree_id);
        page.set("Contents", content_id);
        kids.push(Object::Reference(doc.add_object(page)));
    }
    let mut tree = Dictionary::new();
    tree.set("Type", Object::Name(b"Pages".to_vec()));
    tree.set("Count", kids.len() as u32);
    tree.set("Kids", kids);
    doc.objects.insert(tree_id, Object::Dictionary(tree));
    let mut catalog = Dictionary::new();
    catalog.set("Type", Object::Name(b"Catalog".to_vec()));
    catalog.set("Pages", tree_id);
    let catalog_id = doc.add_object(catalog);
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

/// Page labels of a PDF, in page order
pub fn labels(bytes: &[u8]) -> Vec<String> {
    let doc = lopdf::Document::load_mem(bytes).unwrap();
    doc.get_pages()
        .values()
        .map(|page_id| {
            let content = Content::decode(&doc.get_page_content(*page_id).unwrap()).unwrap();
            content
                .operations
                .iter()
                .filter(|op| op.operator == "Tj")
                .filter_map(|op| op.operands.first())
                .filter_map(|o| o.as_str().ok())
                .map(|s| String::from_utf8_lossy(s).into_owned())
                .collect::<String>()
        })
        .collect()
}
