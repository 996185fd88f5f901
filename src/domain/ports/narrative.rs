use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{SynthesisOutput, SynthesisRequest};

/// Turns a structured result set into a narrative and a rendered artifact.
///
/// A request carrying prior feedback is a refinement pass; the same
/// implementation serves both.
#[async_trait]
pub trait NarrativeSynthesizer: Send + Sync {
    async fn synthesize(&self, request: SynthesisRequest<'_>) -> DomainResult<SynthesisOutput>;
}
