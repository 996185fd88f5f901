use crate::domain::models::TemplateId;

/// Classifies a free-text data request into a metric template.
///
/// Classification is total: a request that matches nothing gets the
/// default template.
pub trait RequestRouter: Send + Sync {
    fn classify(&self, request: &str) -> TemplateId;
}
