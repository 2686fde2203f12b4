//! The capability shared by every finding producer.

use async_trait::async_trait;
use plume_core::Finding;

/// Produces findings for a text.
///
/// Checkers never fail: a checker that cannot do its job reports no
/// findings. The gate concatenates the output of its checkers in order.
#[async_trait]
pub trait Checker: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    async fn check(&self, text: &str) -> Vec<Finding>;
}
