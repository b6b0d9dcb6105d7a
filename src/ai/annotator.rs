use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::models::{Annotation, CATEGORIES};
use crate::pipeline::{Annotator, CollabResult, CollaboratorError};

const CLAUDE_API_URL: &str = "https://api.anthropic.com/v1/messages";

// At most this many characters of body text go into the prompt.
const MAX_EXCERPT_CHARS: usize = 3000;

const MAX_SUMMARY_SENTENCES: usize = 3;

#[derive(Debug, Serialize)]
struct MessageRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<Message>,
    system: Option<String>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AnnotationPayload {
    category: String,
    summary: String,
}

/// Classifies and summarizes articles via the Claude messages API. The model
/// is asked for a strict JSON object; anything else is an invalid response
/// and the stage's retry policy takes it from there.
pub struct ClaudeAnnotator {
    client: Client,
    api_key: String,
    model: String,
}

impl ClaudeAnnotator {
    pub fn new(api_key: String, model: String, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");
        Self {
            client,
            api_key,
            model,
        }
    }

    fn system_prompt() -> String {
        format!(
            "你是半导体行业新闻编辑。阅读文章后输出一个 JSON 对象，且只输出 JSON：\n\
             {{\"category\": \"...\", \"summary\": \"...\"}}\n\
             category 必须是以下之一：{}。\n\
             summary 为客观中文摘要，不超过三句话，不加评论。",
            CATEGORIES.join("、")
        )
    }
}

impl Annotator for ClaudeAnnotator {
    async fn classify_and_summarize(&self, title: &str, content: &str) -> CollabResult<Annotation> {
        let excerpt = build_content_excerpt(content, MAX_EXCERPT_CHARS);
        let user_message = format!("标题：{title}\n\n正文：\n{excerpt}");

        let request = MessageRequest {
            model: self.model.clone(),
            max_tokens: 512,
            messages: vec![Message {
                role: "user".to_string(),
                content: user_message,
            }],
            system: Some(Self::system_prompt()),
        };

        let response = self
            .client
            .post(CLAUDE_API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(CollaboratorError::Api(format!(
                "HTTP {status}: {error_text}"
            )));
        }

        let message_response: MessageResponse = response
            .json()
            .await
            .map_err(|e| CollaboratorError::InvalidResponse(e.to_string()))?;

        let text = message_response
            .content
            .into_iter()
            .filter_map(|block| block.text)
            .collect::<Vec<_>>()
            .join("\n");

        parse_annotation(&text)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Parse the model's reply into an annotation. Tolerates a markdown code
/// fence around the JSON and trims the summary to three sentences.
pub fn parse_annotation(text: &str) -> CollabResult<Annotation> {
    let stripped = strip_code_fences(text);
    let payload: AnnotationPayload = serde_json::from_str(stripped)
        .map_err(|e| CollaboratorError::InvalidResponse(format!("not a JSON object: {e}")))?;

    let category = payload.category.trim().to_string();
    let summary = truncate_sentences(payload.summary.trim(), MAX_SUMMARY_SENTENCES);
    if summary.is_empty() {
        return Err(CollaboratorError::InvalidResponse("empty summary".into()));
    }

    Ok(Annotation { category, summary })
}

fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json") on the opening fence line.
    let rest = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    rest.trim_end().trim_end_matches("```").trim()
}

/// Cut after at most `max` sentence terminators (CJK or ASCII).
pub fn truncate_sentences(text: &str, max: usize) -> String {
    let mut count = 0;
    for (idx, ch) in text.char_indices() {
        if matches!(ch, '。' | '！' | '？' | '.' | '!' | '?') {
            count += 1;
            if count == max {
                return text[..idx + ch.len_utf8()].to_string();
            }
        }
    }
    text.to_string()
}

/// First `max_chars` characters of the body (character count, not bytes, so
/// CJK text is not cut mid-codepoint).
pub fn build_content_excerpt(content: &str, max_chars: usize) -> String {
    content.chars().take(max_chars).collect()
}
