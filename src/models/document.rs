use bigdecimal::{BigDecimal, Zero};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;

/// Income document type code for a tax invoice
pub const INVOICE_TYPE: i32 = 305;
/// Income document type code for a receipt
pub const RECEIPT_TYPE: i32 = 400;

/// Document kind, decoded from the numeric `type` field of the bookkeeping service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    Invoice,
    Receipt,
    /// Any other income type, or an expense type
    Other(i32),
}

impl DocumentKind {
    pub fn code(&self) -> i32 {
        match self {
            DocumentKind::Invoice => INVOICE_TYPE,
            DocumentKind::Receipt => RECEIPT_TYPE,
            DocumentKind::Other(code) => *code,
        }
    }
}

impl From<i32> for DocumentKind {
    fn from(code: i32) -> Self {
        match code {
            INVOICE_TYPE => DocumentKind::Invoice,
            RECEIPT_TYPE => DocumentKind::Receipt,
            other => DocumentKind::Other(other),
        }
    }
}

impl Default for DocumentKind {
    fn default() -> Self {
        DocumentKind::Other(0)
    }
}

impl Serialize for DocumentKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i32(self.code())
    }
}

impl<'de> Deserialize<'de> for DocumentKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        i32::deserialize(deserializer).map(DocumentKind::from)
    }
}

/// Supplier block of an expense record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Supplier {
    #[serde(default)]
    pub name: String,
}

/// Download link: expenses carry a plain URL, income documents a per-language map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DownloadUrl {
    Plain(String),
    Localized(BTreeMap<String, String>),
}

impl DownloadUrl {
    /// Picks the link for `language`, falling back to any available one
    pub fn resolve(&self, language: &str) -> Option<&str> {
        match self {
            DownloadUrl::Plain(url) => Some(url.as_str()).filter(|u| !u.is_empty()),
            DownloadUrl::Localized(urls) => urls
                .get(language)
                .or_else(|| urls.values().next())
                .map(String::as_str)
                .filter(|u| !u.is_empty()),
        }
    }
}

/// Income or expense record as returned by the bookkeeping service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Document number, unique within its ledger
    #[serde(default, deserialize_with = "string_or_number")]
    pub number: String,
    #[serde(rename = "type", default)]
    pub kind: DocumentKind,
    #[serde(default = "BigDecimal::zero")]
    pub amount: BigDecimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supplier: Option<Supplier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
    /// Absent means the document cannot be downloaded yet
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<DownloadUrl>,
}

impl Document {
    pub fn supplier_name(&self) -> Option<&str> {
        self.supplier.as_ref().map(|s| s.name.as_str())
    }

    pub fn download_url(&self, language: &str) -> Option<&str> {
        self.url.as_ref().and_then(|u| u.resolve(language))
    }

    pub fn is_invoice(&self) -> bool {
        self.kind == DocumentKind::Invoice
    }

    pub fn is_receipt(&self) -> bool {
        self.kind == DocumentKind::Receipt
    }
}

/// Response envelope of list and lookup calls
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DocumentPage {
    #[serde(default)]
    pub items: Vec<Document>,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(i64),
        Float(f64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Int(n) => n.to_string(),
        Raw::Float(n) => n.to_string(),
    })
}
