use crate::config::ServiceConfig;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::time::Instant;

pub(crate) const SIGNATURE: &str = "—— 陈祖云";

const TEMPERATURE: f32 = 1.0;
const TOP_P: f32 = 0.9;

#[derive(Debug, thiserror::Error)]
pub(crate) enum BlessingError {
    #[error("no API key configured")]
    MissingApiKey,
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("service answered HTTP {0}")]
    Status(reqwest::StatusCode),
    #[error("service answered with no text")]
    Empty,
}

pub(crate) fn prompt(name: &str) -> String {
    format!(
        "你是一个深谙浪漫且懂代码的诗人。请为名为\"{name}\"的朋友写一段充满“程序员浪漫”风格的圣诞祝福。要求：\n\
         1. 措辞要包含一些浪漫的科技隐喻（如：逻辑、粒子、编译、永恒的循环、解构等）。\n\
         2. 语气温暖而富有格调，像是在璀璨的数字星空下低语。\n\
         3. 必须以“{SIGNATURE}”作为唯一的署名结尾。\n\
         4. 字数控制在100字左右。\n\
         5. 只返回祝福内容和署名。"
    )
}

/// Used when the service answers but says nothing.
pub(crate) fn fallback_on_empty(name: &str) -> String {
    format!(
        "亲爱的{name}，在这个充满逻辑与温暖的夜晚，愿你的生活如优美的代码般流畅，\
         愿所有的幸福都在你的世界里无限循环。圣诞快乐。\n\n{SIGNATURE}"
    )
}

/// Used for every other failure.
pub(crate) fn fallback_on_error(name: &str) -> String {
    format!(
        "亲爱的{name}，愿这棵魔法圣诞树带给你一整年的好运。\
         在这串数字编织的奇迹里，祝你岁岁平安。\n\n{SIGNATURE}"
    )
}

/* ----------------------------
   Gemini generateContent wire types
---------------------------- */

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize, Default)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_p: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Content,
}

impl GenerateRequest {
    fn for_name(name: &str) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![Part {
                    text: Some(prompt(name)),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: TEMPERATURE,
                top_p: TOP_P,
            },
        }
    }
}

impl GenerateResponse {
    fn text(&self) -> String {
        self.candidates
            .first()
            .map(|c| {
                c.content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
            .trim()
            .to_string()
    }
}

pub(crate) struct BlessingClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl BlessingClient {
    pub(crate) fn new(cfg: &ServiceConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(cfg.timeout)
            .build()
            .context("building HTTP client")?;
        let endpoint = format!(
            "{}/v1beta/models/{}:generateContent",
            cfg.api_base.trim_end_matches('/'),
            cfg.model
        );
        Ok(Self {
            http,
            endpoint,
            api_key: cfg.api_key.clone(),
        })
    }

    pub(crate) async fn request(&self, name: &str) -> Result<String, BlessingError> {
        let key = self.api_key.as_deref().ok_or(BlessingError::MissingApiKey)?;
        let resp = self
            .http
            .post(&self.endpoint)
            .header("x-goog-api-key", key)
            .json(&GenerateRequest::for_name(name))
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(BlessingError::Status(resp.status()));
        }

        let body: GenerateResponse = resp.json().await?;
        let text = body.text();
        if text.is_empty() {
            return Err(BlessingError::Empty);
        }
        Ok(text)
    }

    /// Always yields something to show; failures only cost latency.
    pub(crate) async fn bless(&self, name: &str) -> String {
        let started = Instant::now();
        let result = self.request(name).await;
        log::info!(
            "blessing request finished in {:?} (ok={})",
            started.elapsed(),
            result.is_ok()
        );
        resolve(name, result)
    }
}

pub(crate) fn resolve(name: &str, result: Result<String, BlessingError>) -> String {
    match result {
        Ok(text) => text,
        Err(BlessingError::Empty) => {
            log::warn!("blessing generation returned nothing, using fallback");
            fallback_on_empty(name)
        }
        Err(e) => {
            log::warn!("blessing generation failed: {e}");
            fallback_on_error(name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn service(api_key: Option<&str>, api_base: &str) -> ServiceConfig {
        ServiceConfig {
            api_key: api_key.map(str::to_string),
            api_base: api_base.to_string(),
            model: "gemini-3-flash-preview".to_string(),
            timeout: Duration::from_secs(2),
        }
    }

    #[test]
    fn prompt_names_the_friend_and_the_signature() {
        let p = prompt("小雪");
        assert!(p.contains("\"小雪\""));
        assert!(p.contains(SIGNATURE));
        assert!(p.contains("100字"));
    }

    #[test]
    fn request_body_carries_sampling_parameters() {
        let v = serde_json::to_value(GenerateRequest::for_name("小雪")).unwrap();
        assert_eq!(v["generationConfig"]["temperature"], 1.0);
        assert!((v["generationConfig"]["topP"].as_f64().unwrap() - 0.9).abs() < 1e-6);
        assert!(v["contents"][0]["parts"][0]["text"]
            .as_str()
            .unwrap()
            .contains("小雪"));
    }

    #[test]
    fn response_text_joins_parts() {
        let raw = r#"{
            "candidates": [{
                "content": {
                    "parts": [{"text": "  愿你的代码，"}, {"text": "永不报错。\n\n—— 陈祖云 "}],
                    "role": "model"
                },
                "finishReason": "STOP"
            }],
            "usageMetadata": {"totalTokenCount": 42}
        }"#;
        let resp: GenerateResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(resp.text(), "愿你的代码，永不报错。\n\n—— 陈祖云");
    }

    #[test]
    fn blocked_response_has_no_text() {
        let raw = r#"{"candidates": [], "promptFeedback": {"blockReason": "OTHER"}}"#;
        let resp: GenerateResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(resp.text(), "");
        let raw = r#"{"candidates": [{"finishReason": "SAFETY"}]}"#;
        let resp: GenerateResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(resp.text(), "");
    }

    #[test]
    fn endpoint_is_built_from_base_and_model() {
        let c = BlessingClient::new(&service(None, "https://example.test/")).unwrap();
        assert_eq!(
            c.endpoint,
            "https://example.test/v1beta/models/gemini-3-flash-preview:generateContent"
        );
    }

    #[test]
    fn fallbacks_greet_by_name_and_sign_off() {
        for text in [fallback_on_empty("陈祖云"), fallback_on_error("陈祖云")] {
            assert!(text.starts_with("亲爱的陈祖云，"));
            assert!(text.ends_with(SIGNATURE));
        }
    }

    #[test]
    fn resolve_maps_failures_to_fallbacks() {
        assert_eq!(resolve("雪", Ok("你好".into())), "你好");
        assert_eq!(resolve("雪", Err(BlessingError::Empty)), fallback_on_empty("雪"));
        assert_eq!(
            resolve("雪", Err(BlessingError::MissingApiKey)),
            fallback_on_error("雪")
        );
        let status = reqwest::StatusCode::INTERNAL_SERVER_ERROR;
        assert_eq!(
            resolve("雪", Err(BlessingError::Status(status))),
            fallback_on_error("雪")
        );
    }

    #[tokio::test]
    async fn missing_key_never_touches_the_network() {
        let c = BlessingClient::new(&service(None, "http://127.0.0.1:9")).unwrap();
        assert!(matches!(
            c.request("陈祖云").await,
            Err(BlessingError::MissingApiKey)
        ));
        let text = c.bless("陈祖云").await;
        assert_eq!(text, fallback_on_error("陈祖云"));
    }

    #[tokio::test]
    async fn unreachable_service_falls_back() {
        let c = BlessingClient::new(&service(Some("k"), "http://127.0.0.1:9")).unwrap();
        let text = c.bless("陈祖云").await;
        assert!(text.contains("陈祖云"));
        assert!(text.ends_with(SIGNATURE));
    }
}
