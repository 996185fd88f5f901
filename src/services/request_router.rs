//! Keyword-based request classification.

use crate::domain::models::TemplateId;
use crate::domain::ports::RequestRouter;

/// Routes a request to the first template whose keywords appear in it.
///
/// Matching is case-insensitive substring membership, checked in
/// [`TemplateId::ORDERED`] order.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordRequestRouter;

impl KeywordRequestRouter {
    pub fn new() -> Self {
        Self
    }
}

impl RequestRouter for KeywordRequestRouter {
    fn classify(&self, request: &str) -> TemplateId {
        let lowered = request.to_lowercase();
        TemplateId::ORDERED
            .into_iter()
            .find(|template| template.keywords().iter().any(|kw| lowered.contains(kw)))
            .unwrap_or(TemplateId::DEFAULT)
    }
}
