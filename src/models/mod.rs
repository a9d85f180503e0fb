pub mod audit;
pub mod document;
pub mod period;

pub use audit::{DiscrepancyReport, ExpectationTable, UnlinkedExpenses};
pub use document::{Document, DocumentKind, DocumentPage, DownloadUrl, Supplier};
pub use period::ReportingPeriod;
