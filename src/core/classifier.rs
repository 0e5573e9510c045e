//! LLM-based actionability classifier.
//!
//! Every item is judged with exactly one completion. The system message
//! fixes the response schema; the response is parsed strictly, and any
//! missing field, extra field or out-of-contract value is a
//! `MalformedVerdict`.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, instrument};

use crate::adapters::truncate_chars;
use crate::domain::{Category, ClassificationVerdict, Priority, RawItem, SourceKind};
use crate::error::PipelineError;
use crate::llm::{ChatMessage, CompletionRequest, LlmClient, LlmError};

/// Default cap on the content excerpt sent to the model
pub const DEFAULT_EXCERPT_CHARS: usize = 500;

/// The response shape the model is instructed to produce
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerdictContract {
    /// Documents and issues: `{actionable, category, description, priority}`
    Actionable,

    /// Mail: `{requiresResponse, category, description, priority}`
    RequiresResponse,
}

const ACTIONABLE_CATEGORIES: [Category; 5] = [
    Category::ContentCreation,
    Category::Research,
    Category::ClientWork,
    Category::Automation,
    Category::Other,
];

const RESPONSE_CATEGORIES: [Category; 5] = [
    Category::CustomerInquiry,
    Category::ClientRequest,
    Category::Collaboration,
    Category::Spam,
    Category::Other,
];

impl VerdictContract {
    pub fn for_source(kind: SourceKind) -> Self {
        match kind {
            SourceKind::Gmail => VerdictContract::RequiresResponse,
            SourceKind::Drive | SourceKind::Github | SourceKind::Notion => {
                VerdictContract::Actionable
            }
        }
    }

    pub fn categories(&self) -> &'static [Category] {
        match self {
            VerdictContract::Actionable => &ACTIONABLE_CATEGORIES,
            VerdictContract::RequiresResponse => &RESPONSE_CATEGORIES,
        }
    }

    fn flag_field(&self) -> &'static str {
        match self {
            VerdictContract::Actionable => "actionable",
            VerdictContract::RequiresResponse => "requiresResponse",
        }
    }

    pub fn system_prompt(&self) -> String {
        let categories = self
            .categories()
            .iter()
            .map(|c| format!("\"{}\"", c))
            .collect::<Vec<_>>()
            .join(" | ");

        let role = match self {
            VerdictContract::Actionable => {
                "You are an AI that analyzes documents to identify actionable tasks."
            }
            VerdictContract::RequiresResponse => {
                "You are an AI that analyzes emails to determine if they require a response."
            }
        };

        format!(
            "{role}\nRespond in JSON format with exactly these fields and no others:\n{{\n  \"{flag}\": boolean,\n  \"category\": {categories},\n  \"description\": \"Brief description of what needs to be done\",\n  \"priority\": \"high\" | \"medium\" | \"low\"\n}}",
            role = role,
            flag = self.flag_field(),
            categories = categories,
        )
    }

    /// Parse a model response under this contract
    pub fn parse(&self, response: &str) -> Result<ClassificationVerdict, PipelineError> {
        let json = strip_code_fence(response);

        let verdict = match self {
            VerdictContract::Actionable => serde_json::from_str::<ActionableWire>(json)
                .map(ClassificationVerdict::from),
            VerdictContract::RequiresResponse => serde_json::from_str::<RequiresResponseWire>(json)
                .map(ClassificationVerdict::from),
        }
        .map_err(|e| PipelineError::MalformedVerdict(e.to_string()))?;

        if !self.categories().contains(&verdict.category) {
            return Err(PipelineError::MalformedVerdict(format!(
                "category '{}' is not allowed here",
                verdict.category
            )));
        }

        Ok(verdict)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ActionableWire {
    actionable: bool,
    category: Category,
    description: String,
    priority: Priority,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
struct RequiresResponseWire {
    requires_response: bool,
    category: Category,
    description: String,
    priority: Priority,
}

impl From<ActionableWire> for ClassificationVerdict {
    fn from(wire: ActionableWire) -> Self {
        Self {
            actionable: wire.actionable,
            category: wire.category,
            description: wire.description,
            priority: wire.priority,
        }
    }
}

impl From<RequiresResponseWire> for ClassificationVerdict {
    fn from(wire: RequiresResponseWire) -> Self {
        Self {
            actionable: wire.requires_response,
            category: wire.category,
            description: wire.description,
            priority: wire.priority,
        }
    }
}

/// Accept a response wrapped in a single markdown code fence
fn strip_code_fence(response: &str) -> &str {
    let trimmed = response.trim();
    trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .map(str::trim)
        .unwrap_or(trimmed)
}

/// What the classifier sees of one item
#[derive(Debug, Clone)]
pub struct PromptContext {
    pub contract: VerdictContract,

    /// Identifying lines: title, or sender and subject
    pub heading: String,

    /// Bounded content excerpt
    pub excerpt: String,
}

impl PromptContext {
    pub fn from_item(item: &RawItem, excerpt_chars: usize) -> Self {
        let excerpt = truncate_chars(&item.body_excerpt, excerpt_chars).to_string();
        let contract = VerdictContract::for_source(item.source_kind);

        let heading = match item.source_kind {
            SourceKind::Gmail => {
                let subject = item
                    .captured_metadata
                    .get("subject")
                    .and_then(|v| v.as_str())
                    .unwrap_or(&item.title);
                format!(
                    "From: {}\nSubject: {}",
                    item.author.as_deref().unwrap_or("Unknown sender"),
                    subject
                )
            }
            SourceKind::Drive => format!("Document Title: {}", item.title),
            SourceKind::Github => format!("Issue Title: {}", item.title),
            SourceKind::Notion => format!("Page Title: {}", item.title),
        };

        Self {
            contract,
            heading,
            excerpt,
        }
    }

    fn user_message(&self) -> String {
        let label = match self.contract {
            VerdictContract::Actionable => "Content Preview",
            VerdictContract::RequiresResponse => "Body Preview",
        };
        format!("{}\n\n{}:\n{}", self.heading, label, self.excerpt)
    }
}

/// Judges items with one structured completion each
pub struct Classifier {
    llm: Arc<dyn LlmClient>,
    timeout: Duration,
}

impl Classifier {
    pub fn new(llm: Arc<dyn LlmClient>, timeout: Duration) -> Self {
        Self { llm, timeout }
    }

    #[instrument(skip(self, context), fields(provider = self.llm.name(), contract = ?context.contract))]
    pub async fn classify(&self, context: &PromptContext) -> Result<ClassificationVerdict, PipelineError> {
        let request = CompletionRequest::new(vec![
            ChatMessage::system(context.contract.system_prompt()),
            ChatMessage::user(context.user_message()),
        ])
        .json();

        let response = tokio::time::timeout(self.timeout, self.llm.complete(request))
            .await
            .map_err(|_| LlmError::Timeout(self.timeout))??;

        let verdict = context.contract.parse(&response)?;
        debug!(actionable = verdict.actionable, category = %verdict.category, "Item classified");
        Ok(verdict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_actionable_contract() {
        let verdict = VerdictContract::Actionable
            .parse(r#"{"actionable": true, "category": "content_creation", "description": "Finish the draft", "priority": "medium"}"#)
            .unwrap();

        assert!(verdict.actionable);
        assert_eq!(verdict.category, Category::ContentCreation);
        assert_eq!(verdict.priority, Priority::Medium);
    }

    #[test]
    fn test_parse_requires_response_contract() {
        let verdict = VerdictContract::RequiresResponse
            .parse(r#"{"requiresResponse": true, "category": "customer_inquiry", "description": "Reply with pricing", "priority": "high"}"#)
            .unwrap();

        assert!(verdict.actionable);
        assert_eq!(verdict.category, Category::CustomerInquiry);
    }

    #[test]
    fn test_missing_field_is_malformed() {
        let err = VerdictContract::Actionable
            .parse(r#"{"actionable": true, "category": "research", "priority": "low"}"#)
            .unwrap_err();
        assert!(matches!(err, PipelineError::MalformedVerdict(_)));
    }

    #[test]
    fn test_extra_field_is_malformed() {
        let err = VerdictContract::Actionable
            .parse(r#"{"actionable": false, "category": "other", "description": "", "priority": "low", "confidence": 0.4}"#)
            .unwrap_err();
        assert!(matches!(err, PipelineError::MalformedVerdict(_)));
    }

    #[test]
    fn test_wrong_contract_flag_is_malformed() {
        let err = VerdictContract::RequiresResponse
            .parse(r#"{"actionable": true, "category": "spam", "description": "", "priority": "low"}"#)
            .unwrap_err();
        assert!(matches!(err, PipelineError::MalformedVerdict(_)));
    }

    #[test]
    fn test_category_outside_contract_is_malformed() {
        let err = VerdictContract::Actionable
            .parse(r#"{"actionable": true, "category": "spam", "description": "x", "priority": "low"}"#)
            .unwrap_err();
        assert!(err.to_string().contains("not allowed"));
    }

    #[test]
    fn test_non_json_is_malformed() {
        assert!(VerdictContract::Actionable.parse("Sure! This looks actionable.").is_err());
    }

    #[test]
    fn test_code_fence_is_tolerated() {
        let verdict = VerdictContract::Actionable
            .parse("```json\n{\"actionable\": false, \"category\": \"other\", \"description\": \"\", \"priority\": \"low\"}\n```")
            .unwrap();
        assert!(!verdict.actionable);
    }

    #[test]
    fn test_system_prompt_lists_contract_fields() {
        let prompt = VerdictContract::RequiresResponse.system_prompt();
        assert!(prompt.contains("\"requiresResponse\": boolean"));
        assert!(prompt.contains("\"customer_inquiry\""));
        assert!(!prompt.contains("\"content_creation\""));
    }

    #[test]
    fn test_prompt_context_caps_excerpt() {
        let item = RawItem::new("d1", SourceKind::Drive, "WIP: plan", "x".repeat(2000));
        let context = PromptContext::from_item(&item, DEFAULT_EXCERPT_CHARS);

        assert_eq!(context.excerpt.chars().count(), 500);
        assert_eq!(context.heading, "Document Title: WIP: plan");
        assert!(context.user_message().contains("Content Preview:"));
    }

    #[test]
    fn test_prompt_context_for_mail_uses_sender_and_subject() {
        let item = RawItem::new("m1", SourceKind::Gmail, "Email: Pricing?", "body")
            .with_author("ana@example.com")
            .with_metadata("subject", "Pricing?");
        let context = PromptContext::from_item(&item, DEFAULT_EXCERPT_CHARS);

        assert_eq!(context.contract, VerdictContract::RequiresResponse);
        assert_eq!(context.heading, "From: ana@example.com\nSubject: Pricing?");
    }
}
