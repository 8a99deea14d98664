// src/oracle/mod.rs — Decision oracle boundary

pub mod http;

use async_trait::async_trait;

use crate::infra::errors::ApsisError;
use crate::protocol::StateDigest;

/// One request/response exchange with the external decision oracle.
///
/// Implementations are pure transport: they serialize the digest, perform a
/// single bounded exchange, and hand back the raw payload untouched.
/// Interpretation belongs exclusively to the plan validator.
#[async_trait]
pub trait Oracle: Send + Sync {
    fn id(&self) -> &str;

    async fn propose(&self, digest: &StateDigest) -> Result<String, ApsisError>;
}
