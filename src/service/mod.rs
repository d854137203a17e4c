pub mod credentials;
pub mod feedback;
pub mod report;

pub use credentials::{CredentialStore, VerifyOutcome};
pub use feedback::{FeedbackPage, FeedbackService};
pub use report::ReportRenderer;
