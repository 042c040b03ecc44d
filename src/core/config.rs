/// Runtime settings for the completion call after configuration parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionSettings {
    /// Hosted model identifier named in every request and in the answer heading.
    pub model: String,
    /// Cost-attribution identifier forwarded by gateways that understand it.
    pub routing_id: Option<String>,
}

impl CompletionSettings {
    pub fn new(model: impl Into<String>, routing_id: Option<String>) -> Self {
        Self {
            model: model.into(),
            routing_id: routing_id.filter(|id| !id.trim().is_empty()),
        }
    }
}
