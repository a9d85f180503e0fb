pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod package;
pub mod service;
pub mod source;

pub use api::{build_router, AppState};
pub use config::AppConfig;
pub use error::{ReportError, Result};
pub use service::ReportService;
pub use source::{DocumentSource, HttpDocumentSource};
