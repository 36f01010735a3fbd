//! Remote captcha-solving services
//!
//! Both services follow a submit-then-poll contract: the site key and page
//! URL go out with a task submission, and the token comes back after the
//! service's human/ML backend resolves it - typically tens of seconds.
//! Failures of any kind (transport, service error codes, poll timeout)
//! degrade to an empty token.

use crate::captcha::TokenSource;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

fn service_client() -> Client {
    Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .unwrap_or_default()
}

/// 2Captcha-compatible solving service (`in.php` / `res.php` contract)
pub struct TwoCaptchaSource {
    client: Client,
    api_key: String,
    site_key: String,
    page_url: String,
}

impl TwoCaptchaSource {
    pub fn new(api_key: String, site_key: String, page_url: String) -> Self {
        if api_key.is_empty() {
            tracing::warn!("TWO_CAPTCHA_API_KEY is not set; every solve will fail");
        }
        Self {
            client: service_client(),
            api_key,
            site_key,
            page_url,
        }
    }

    async fn submit(&self, action: &str) -> Option<String> {
        let response = self
            .client
            .post("https://2captcha.com/in.php")
            .form(&[
                ("key", self.api_key.as_str()),
                ("method", "userrecaptcha"),
                ("googlekey", self.site_key.as_str()),
                ("pageurl", self.page_url.as_str()),
                ("invisible", "1"),
                ("action", action),
                ("json", "1"),
            ])
            .send()
            .await
            .ok()?;

        let parsed: Value = response.json().await.ok()?;
        if parsed.get("status").and_then(Value::as_i64) != Some(1) {
            tracing::warn!("2captcha submission rejected: {}", parsed);
            return None;
        }
        parsed
            .get("request")
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    async fn poll(&self, task_id: &str) -> Option<String> {
        // ~2 minutes of polling at 5 s intervals
        for _ in 0..24 {
            tokio::time::sleep(Duration::from_secs(5)).await;

            let response = self
                .client
                .get("https://2captcha.com/res.php")
                .query(&[
                    ("key", self.api_key.as_str()),
                    ("action", "get"),
                    ("id", task_id),
                    ("json", "1"),
                ])
                .send()
                .await
                .ok()?;

            let parsed: Value = response.json().await.ok()?;
            if parsed.get("status").and_then(Value::as_i64) == Some(1) {
                return parsed
                    .get("request")
                    .and_then(Value::as_str)
                    .map(str::to_string);
            }

            let state = parsed.get("request").and_then(Value::as_str).unwrap_or("");
            if state != "CAPCHA_NOT_READY" {
                tracing::warn!("2captcha poll failed: {}", state);
                return None;
            }
        }

        tracing::warn!("2captcha poll timed out for task {}", task_id);
        None
    }
}

#[async_trait]
impl TokenSource for TwoCaptchaSource {
    async fn solve(&self, action: &str) -> String {
        let Some(task_id) = self.submit(action).await else {
            return String::new();
        };

        match self.poll(&task_id).await {
            Some(token) => {
                tracing::debug!("2captcha solved task {}", task_id);
                token
            }
            None => String::new(),
        }
    }
}

/// CapSolver-compatible solving service (`createTask` / `getTaskResult`)
pub struct CapSolverSource {
    client: Client,
    api_key: String,
    site_key: String,
    page_url: String,
}

impl CapSolverSource {
    pub fn new(api_key: String, site_key: String, page_url: String) -> Self {
        if api_key.is_empty() {
            tracing::warn!("CAP_SOLVER_API_KEY is not set; every solve will fail");
        }
        Self {
            client: service_client(),
            api_key,
            site_key,
            page_url,
        }
    }

    async fn create_task(&self, action: &str) -> Option<String> {
        let response = self
            .client
            .post("https://api.capsolver.com/createTask")
            .json(&json!({
                "clientKey": self.api_key,
                "task": {
                    "type": "ReCaptchaV2TaskProxyless",
                    "websiteURL": self.page_url,
                    "websiteKey": self.site_key,
                    "isInvisible": true,
                    "pageAction": action,
                    "minScore": 0.9,
                }
            }))
            .send()
            .await
            .ok()?;

        let parsed: Value = response.json().await.ok()?;
        if parsed.get("errorId").and_then(Value::as_i64) != Some(0) {
            tracing::warn!("capsolver task rejected: {}", parsed);
            return None;
        }
        parsed
            .get("taskId")
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    async fn poll(&self, task_id: &str) -> Option<String> {
        for _ in 0..40 {
            tokio::time::sleep(Duration::from_secs(3)).await;

            let response = self
                .client
                .post("https://api.capsolver.com/getTaskResult")
                .json(&json!({ "clientKey": self.api_key, "taskId": task_id }))
                .send()
                .await
                .ok()?;

            let parsed: Value = response.json().await.ok()?;
            match parsed.get("status").and_then(Value::as_str) {
                Some("ready") => {
                    return parsed
                        .pointer("/solution/gRecaptchaResponse")
                        .and_then(Value::as_str)
                        .map(str::to_string);
                }
                Some("processing") => continue,
                other => {
                    tracing::warn!("capsolver poll failed: {:?} ({})", other, parsed);
                    return None;
                }
            }
        }

        tracing::warn!("capsolver poll timed out for task {}", task_id);
        None
    }
}

#[async_trait]
impl TokenSource for CapSolverSource {
    async fn solve(&self, action: &str) -> String {
        let Some(task_id) = self.create_task(action).await else {
            return String::new();
        };

        match self.poll(&task_id).await {
            Some(token) => {
                tracing::debug!("capsolver solved task {}", task_id);
                token
            }
            None => String::new(),
        }
    }
}
