//! Clinical record intake: the multi-step form and record submission.

pub mod form;
pub mod submission;

pub use form::{reduce, FormAction, FormController, FormState, FormStep};
pub use submission::RecordSubmitter;
