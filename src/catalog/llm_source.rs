//! Candidate source backed by a chat-completion model.

use std::sync::Arc;

use async_trait::async_trait;

use super::{CandidateRequest, CandidateSource, Recommendation, RecommendationResponse, SourceError};
use crate::llm::{ChatMessage, ChatOptions, LlmClient};

pub const SYSTEM_PROMPT: &str = "You are a helpful PC building assistant. Always return valid JSON. \
You MUST prioritize strict budget adherence over performance. \
Do not hallucinate lower prices for premium parts.";

/// Asks an LLM for three offers inside the band.
pub struct LlmCandidateSource {
    llm: Arc<dyn LlmClient>,
    model: String,
}

impl LlmCandidateSource {
    pub fn new(llm: Arc<dyn LlmClient>, model: impl Into<String>) -> Self {
        Self {
            llm,
            model: model.into(),
        }
    }
}

fn join_categories(request: &CandidateRequest) -> String {
    if request.future_categories.is_empty() {
        return "none (this is the last component)".to_string();
    }
    request
        .future_categories
        .iter()
        .map(|c| c.name())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Render the user prompt for `request`.
pub fn render_prompt(request: &CandidateRequest) -> String {
    let category = request.category.name();
    let min = request.band.min;
    let max = request.band.max;
    let selected = serde_json::to_string(&request.selected_parts).unwrap_or_else(|_| "[]".to_string());

    format!(
        r#"You are an expert PC builder for the Indian market.

STRICT BUDGET CONSTRAINTS:
- Total Project Budget: ₹{ceiling}
- Currently Spent: ₹{spent}
- Remaining Wallet: ₹{remaining}
- Target Price for {category}: ₹{min} - ₹{max} (STRICT LIMIT)

The user has a hard limit of ₹{ceiling} for the entire PC.
Budget is reserved for these future components: {future}.

Recommend 3 options for {category} priced STRICTLY within ₹{min} - ₹{max}.
Do NOT suggest parts above ₹{max}, even if they perform better.

Current Build Context:
- Usage: {usage}
- Selected Parts: {selected}

Constraints:
- Prices must be accurate Indian market estimates in INR.
- Check compatibility with the selected parts.
- Omit specs that are not relevant to the part.

Respond ONLY with a JSON object:
{{
    "recommendations": [
        {{
            "name": "Exact product name",
            "price": 0,
            "specs": {{ "attribute": "value" }},
            "reason": "Why it fits the build, its compatibility and the budget"
        }}
    ]
}}"#,
        ceiling = request.ceiling,
        spent = request.spent,
        remaining = request.remaining_budget,
        future = join_categories(request),
        usage = request.usage.label(),
    )
}

/// Strip Markdown code fences and surrounding prose from a model reply.
fn extract_json(content: &str) -> &str {
    let trimmed = content.trim();
    match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if start < end => &trimmed[start..=end],
        _ => trimmed,
    }
}

/// Parse a `{"recommendations": [...]}` reply.
pub fn parse_recommendations(content: &str) -> Result<Vec<Recommendation>, SourceError> {
    let json = extract_json(content);
    if json.is_empty() {
        return Err(SourceError::Malformed("empty response".to_string()));
    }
    let parsed: RecommendationResponse =
        serde_json::from_str(json).map_err(|e| SourceError::Malformed(e.to_string()))?;
    Ok(parsed.recommendations)
}

#[async_trait]
impl CandidateSource for LlmCandidateSource {
    fn name(&self) -> &str {
        &self.model
    }

    async fn recommend(&self, request: &CandidateRequest) -> Result<Vec<Recommendation>, SourceError> {
        let messages = vec![
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(render_prompt(request)),
        ];
        let options = ChatOptions {
            temperature: Some(0.2),
            max_tokens: None,
            json_response: true,
        };

        let response = self
            .llm
            .chat_completion_with_options(&self.model, &messages, options)
            .await
            .map_err(|e| SourceError::Unavailable(e.to_string()))?;

        if let Some(usage) = &response.usage {
            tracing::debug!(
                model = %self.model,
                category = %request.category,
                total_tokens = usage.total_tokens,
                "Recommendation tokens"
            );
        }

        let content = response.content.unwrap_or_default();
        parse_recommendations(&content)
    }
}
