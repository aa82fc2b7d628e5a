pub mod domain;
mod engine;
pub mod report;

pub use domain::{
    ComplianceThresholds, DepartmentStatus, LicenseStatus, ThresholdError, VisitRecord,
};
pub use engine::ComplianceEngine;
pub use report::views::{
    ComplianceInsights, ComplianceOverview, DepartmentHighlight, DepartmentSummary,
    DoctorSummary, WeeklyCompliancePoint,
};
pub use report::ComplianceReport;
