use reqwest::Client;
use serde_json::json;

use crate::config::Config;

pub struct EnhanceService;

impl EnhanceService {
    fn client() -> Client {
        Client::new()
    }

    fn api_url() -> Result<String, String> {
        Config::ai_api_url()
            .ok_or_else(|| "AI_API_URL not configured".to_string())
    }

    fn api_key() -> Result<String, String> {
        Config::ai_api_key()
            .ok_or_else(|| "AI_API_KEY not configured".to_string())
    }

    /// Rewrite a gig description through the configured completion API.
    pub async fn enhance_description(title: &str, description: &str) -> Result<String, String> {
        if !Config::is_ai_enabled() {
            return Err("AI enhancement is not enabled".to_string());
        }

        let body = json!({
            "model": Config::ai_model(),
            "messages": [
                {
                    "role": "system",
                    "content": "You polish freelance gig descriptions. Keep the seller's voice, \
                                fix grammar, and make the offer concrete. Reply with the rewritten \
                                description only."
                },
                {
                    "role": "user",
                    "content": format!("Gig title: {}\n\nDescription:\n{}", title, description)
                }
            ],
            "max_tokens": 512
        });

        let res = Self::client()
            .post(Self::api_url()?)
            .bearer_auth(Self::api_key()?)
            .json(&body)
            .send()
            .await
            .map_err(|e| format!("AI request failed: {}", e))?;

        if !res.status().is_success() {
            return Err(res.text().await.unwrap_or_else(|_| "AI provider error".to_string()));
        }

        let payload: serde_json::Value = res
            .json()
            .await
            .map_err(|e| format!("AI response was not JSON: {}", e))?;

        payload["choices"][0]["message"]["content"]
            .as_str()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| "AI response missing content".to_string())
    }
}
