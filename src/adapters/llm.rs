//! OpenAI-compatible chat and transcription client (Groq by default).
//!
//! One client backs all three collaborators: code extraction and schedule
//! synthesis go through `/chat/completions` in JSON mode, transcription
//! through `/audio/transcriptions`.

use crate::config::toml_config::LlmConfig;
use crate::domain::model::{AudioInput, ExtractionResponse, ScheduleResponse, SynthesisRequest};
use crate::domain::ports::{CodeExtractor, ScheduleSynthesizer, Transcriber};
use crate::utils::error::{PlannerError, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;

const SCHEDULE_SCHEMA_PROMPT: &str = r#"You are a scheduling assistant. You must output JSON that matches this schema:
{
  "status": "success",
  "requested_courses": {
    "mandatory": [{"course_code": "CODE1"}],
    "electives": [{"course_code": "CODE2"}]
  },
  "special_requests": "any special requests",
  "schedules": [
    {
      "schedule_id": 1,
      "courses": [{
        "status": "open",
        "crn": "12345",
        "course_code": "CODE1",
        "section": "A",
        "course_title": "Course Title",
        "credits": 1,
        "schedule_type": "lecture",
        "instructor": "Instructor Name",
        "day": "Mon",
        "start_time": "10:00",
        "end_time": "11:00",
        "also_register_in": "Optional info"
      }]
    }
  ]
}

Each course in the schedules array must include all required fields.
Ensure your JSON strictly follows the schema."#;

fn extraction_prompt(allowed_codes: &[String]) -> String {
    format!(
        r#"You are a course code extraction assistant. You must output JSON that matches this schema:
{{
  "status": "success",
  "requested_input": "user's input text",
  "special_request": "any scheduling preferences",
  "mandatory": [{{"course_code": "CODE1"}}],
  "electives": [{{"course_code": "CODE2"}}]
}}

Schema fields:
- 'mandatory': list of courses the user explicitly wants
- 'electives': list of courses the user says are optional
- 'special_request': if the user mentions any scheduling preference (e.g., 'avoid Fridays'), store it here.

If the user doesn't mention an 'elective' or 'optional' phrase, default it to 'mandatory'.

The ONLY valid course codes are:
{}

Ensure you strictly follow the JSON schema."#,
        allowed_codes.join(", ")
    )
}

/// User message for schedule synthesis.
pub fn synthesis_message(request: &SynthesisRequest) -> String {
    format!(
        "MANDATORY COURSES: {}\nELECTIVE COURSES: {}\nSPECIAL REQUESTS: {}\nMARKDOWN FILE CONTENT: {}\nGENERATION INSTRUCTIONS: Generate multiple course schedules (aim for at least {}) with each schedule having a maximum of {} credits. For courses with tutorials, always select the tutorial corresponding to the lecture. Only output schedules that contain every mandatory course.",
        request.mandatory.join(", "),
        request.electives.join(", "),
        request.special_request.as_deref().unwrap_or("None"),
        request.document,
        request.limits.min_schedules,
        request.limits.max_credits,
    )
}

#[derive(Deserialize)]
struct Message {
    content: String,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct TranscriptionResponse {
    text: String,
}

#[derive(Debug, Clone)]
pub struct LlmClient {
    client: Client,
    base_url: String,
    api_key: String,
    chat_model: String,
    transcription_model: String,
    transcription_prompt: Option<String>,
}

impl LlmClient {
    pub fn from_config(config: &LlmConfig, api_key: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            chat_model: config.chat_model.clone(),
            transcription_model: config.transcription_model.clone(),
            transcription_prompt: config.transcription_prompt.clone(),
        })
    }

    /// Sends one JSON-mode chat completion and returns the message content.
    /// Every failure is reported through `fail`.
    async fn chat_json<F>(&self, system_prompt: &str, user_prompt: &str, fail: F) -> Result<String>
    where
        F: Fn(String) -> PlannerError,
    {
        let body = serde_json::json!({
            "model": &self.chat_model,
            "messages": [
                {"role": "system", "content": system_prompt},
                {"role": "user", "content": user_prompt}
            ],
            "temperature": 0,
            "response_format": {"type": "json_object"}
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| fail(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(fail(format!("API error {}: {}", status, body)));
        }

        let chat: ChatResponse = response.json().await.map_err(|e| fail(e.to_string()))?;
        chat.choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| fail("API returned no choices".to_string()))
    }
}

#[async_trait]
impl CodeExtractor for LlmClient {
    async fn extract_codes(
        &self,
        text: &str,
        allowed_codes: &[String],
    ) -> Result<ExtractionResponse> {
        let content = self
            .chat_json(&extraction_prompt(allowed_codes), text, |m| {
                PlannerError::extraction(m)
            })
            .await?;
        tracing::debug!("Extraction reply: {}", content);

        let mut value: serde_json::Value = serde_json::from_str(&content)
            .map_err(|e| PlannerError::extraction(format!("malformed JSON: {}", e)))?;
        let object = value
            .as_object_mut()
            .ok_or_else(|| PlannerError::extraction("reply is not a JSON object"))?;
        object
            .entry("status")
            .or_insert_with(|| serde_json::Value::from("success"));
        object.insert("requested_input".to_string(), text.into());

        serde_json::from_value(value)
            .map_err(|e| PlannerError::extraction(format!("unexpected reply shape: {}", e)))
    }
}

#[async_trait]
impl ScheduleSynthesizer for LlmClient {
    async fn synthesize(&self, request: SynthesisRequest) -> Result<ScheduleResponse> {
        let content = self
            .chat_json(
                SCHEDULE_SCHEMA_PROMPT,
                &synthesis_message(&request),
                |m| PlannerError::synthesis(m),
            )
            .await?;

        serde_json::from_str(&content)
            .map_err(|e| PlannerError::synthesis(format!("malformed schedule JSON: {}", e)))
    }
}

#[async_trait]
impl Transcriber for LlmClient {
    async fn transcribe(&self, audio: &AudioInput) -> Result<String> {
        let file = Part::bytes(audio.bytes.clone()).file_name(audio.file_name.clone());
        let mut form = Form::new()
            .part("file", file)
            .text("model", self.transcription_model.clone())
            .text("language", "en")
            .text("temperature", "0");
        if let Some(prompt) = &self.transcription_prompt {
            form = form.text("prompt", prompt.clone());
        }

        let response = self
            .client
            .post(format!("{}/audio/transcriptions", self.base_url))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if status == StatusCode::PAYLOAD_TOO_LARGE
                || body.to_ascii_lowercase().contains("too large")
            {
                return Err(PlannerError::PayloadTooLarge {
                    message: format!("{} ({} bytes)", audio.file_name, audio.bytes.len()),
                });
            }
            return Err(PlannerError::input(format!(
                "Transcription failed with {}: {}",
                status, body
            )));
        }

        let transcription: TranscriptionResponse = response.json().await?;
        Ok(transcription.text)
    }
}
