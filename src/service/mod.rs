pub mod audit;
pub mod period;
pub mod reconcile;
pub mod report;

pub use audit::{audit, unlinked_expenses};
pub use period::{report_period, report_period_str};
pub use reconcile::reconcile;
pub use report::{PeriodDocuments, ReportService, ReportSummary};
