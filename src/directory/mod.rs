//! # Beneficiary Directory
//!
//! Resolves where a beneficiary can be notified. A missing push target is a
//! normal answer, not an error.

pub mod postgres;

use crate::error::Result;
use crate::models::PushTarget;
use async_trait::async_trait;

pub use postgres::PgBeneficiaryDirectory;

#[async_trait]
pub trait BeneficiaryDirectory: Send + Sync {
    async fn get_push_target(&self, beneficiary_id: &str) -> Result<Option<PushTarget>>;
}
