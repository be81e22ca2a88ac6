//! Google Gemini `generateContent` client.
//!
//! Blocking HTTP on purpose: evaluators run inside worker-pool threads.
//! The response schema pins the model to the [`Evaluation`] shape and the
//! response is requested as JSON, but the parser still tolerates fence
//! markers or prose around the payload.

use std::thread;
use std::time::Duration;

use log::{debug, warn};
use reqwest::blocking::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{Evaluation, Evaluator, EvaluatorError};

pub const DEFAULT_MODEL: &str = "gemini-2.5-pro";

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const TEMPERATURE: f64 = 1.0;
const MAX_RETRIES: u32 = 2;
const RETRY_DELAY: Duration = Duration::from_millis(500);

pub struct GeminiEvaluator {
    client: Client,
    model: String,
    api_key: SecretString,
}

impl GeminiEvaluator {
    /// `timeout` bounds each HTTP attempt; the per-job deadline wrapper
    /// bounds the call as a whole.
    pub fn new(
        api_key: SecretString,
        model: &str,
        timeout: Duration,
    ) -> Result<Self, EvaluatorError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            model: model.to_string(),
            api_key,
        })
    }

    fn send_request(&self, body: &Value) -> Result<Evaluation, EvaluatorError> {
        let url = format!("{}/models/{}:generateContent", API_BASE, self.model);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(body)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(EvaluatorError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateContentResponse = response.json()?;
        parse_evaluation(parsed)
    }
}

impl Evaluator for GeminiEvaluator {
    fn evaluate(
        &self,
        document_text: &str,
        job_description: &str,
    ) -> Result<Evaluation, EvaluatorError> {
        let body = build_request_body(document_text, job_description);

        let mut last_error = None;
        for attempt in 0..=MAX_RETRIES {
            if attempt > 0 {
                warn!(
                    "Retrying Gemini request (attempt {} of {})",
                    attempt + 1,
                    MAX_RETRIES + 1
                );
                thread::sleep(RETRY_DELAY * attempt);
            }

            match self.send_request(&body) {
                Ok(evaluation) => return Ok(evaluation),
                Err(e) if retryable(&e) => {
                    debug!("Gemini request failed: {e}");
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or(EvaluatorError::EmptyResponse))
    }
}

fn retryable(error: &EvaluatorError) -> bool {
    match error {
        EvaluatorError::Http(e) => e.is_timeout() || e.is_connect(),
        EvaluatorError::Api { status, .. } => *status == 429 || *status >= 500,
        _ => false,
    }
}

fn build_prompt(document_text: &str, job_description: &str) -> String {
    format!(
        "For the following data find out the match percentage: {document_text}, \
         for the following job description: {job_description}, \
         also give valid feedback based on match percentage"
    )
}

fn build_request_body(document_text: &str, job_description: &str) -> Value {
    json!({
        "contents": [{
            "parts": [{ "text": build_prompt(document_text, job_description) }]
        }],
        "generationConfig": {
            "temperature": TEMPERATURE,
            "responseMimeType": "application/json",
            "responseSchema": {
                "type": "OBJECT",
                "properties": {
                    "candidate_name": {
                        "type": "STRING",
                        "description": "Name of the candidate"
                    },
                    "years_experience": {
                        "type": "INTEGER",
                        "description": "Number of years of experience the candidate has"
                    },
                    "match_percentage": {
                        "type": "INTEGER",
                        "description": "Percentage by which the candidate suits the job description"
                    },
                    "feedback": {
                        "type": "STRING",
                        "description": "Feedback for the match and why the candidate got it"
                    }
                },
                "required": [
                    "candidate_name",
                    "years_experience",
                    "match_percentage",
                    "feedback"
                ]
            }
        }
    })
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

fn parse_evaluation(response: GenerateContentResponse) -> Result<Evaluation, EvaluatorError> {
    let text = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| content.parts.into_iter().map(|p| p.text).collect::<String>())
        .ok_or(EvaluatorError::EmptyResponse)?;

    if text.trim().is_empty() {
        return Err(EvaluatorError::EmptyResponse);
    }

    let json_str = extract_json(&text);
    let mut evaluation: Evaluation = serde_json::from_str(&json_str).map_err(|e| {
        EvaluatorError::ResponseParse(format!("{e}. Response was: {json_str}"))
    })?;

    // Schema pins 0-100, but the model occasionally strays.
    evaluation.match_percentage = evaluation.match_percentage.clamp(0, 100);

    Ok(evaluation)
}

/// Extracts the first balanced JSON object from the response, ignoring any
/// surrounding prose or markdown fences. Tracks string boundaries and
/// escape sequences so braces inside string values don't end the scan.
fn extract_json(response: &str) -> String {
    let start = match response.find('{') {
        Some(idx) => idx,
        None => return response.to_string(),
    };

    let mut depth = 0;
    let mut in_string = false;
    let mut escape_next = false;
    let mut end = response.len();

    for (i, c) in response[start..].char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }

        match c {
            '\\' if in_string => {
                escape_next = true;
            }
            '"' => {
                in_string = !in_string;
            }
            '{' if !in_string => {
                depth += 1;
            }
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    end = start + i + 1;
                    break;
                }
            }
            _ => {}
        }
    }

    response[start..end].to_string()
}
