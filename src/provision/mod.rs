//! Tenant schema provisioning: template transformation and transactional script execution.

mod runner;
mod transform;

pub use runner::{split_batches, ScriptRunner, BATCH_SEPARATOR};
pub use transform::{transform_script, SCHEMA_PLACEHOLDER};
