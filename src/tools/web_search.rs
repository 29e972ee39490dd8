//! web_search tool - Google results through SerpAPI

use async_trait::async_trait;
use serde_json::{Value, json};

use super::{Tool, ToolContext, ToolError, require_str};

pub struct WebSearchTool;

#[async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &'static str {
        "web_search"
    }

    fn description(&self) -> &'static str {
        "Search the web for information"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search query"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value, ToolError> {
        let query = require_str(&params, "query")?;
        let cfg = &ctx.config.search;
        let api_key = cfg.api_key().ok_or_else(|| ToolError::missing(&cfg.api_key_env))?;

        let response = ctx
            .http
            .get(&cfg.base_url)
            .query(&[("engine", cfg.engine.as_str()), ("q", query), ("api_key", api_key.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ToolError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| ToolError::InvalidResponse(format!("search reply: {}", e)))?;

        trim_organic_results(&body, cfg.max_results)
    }
}

/// Keep the first `limit` organic results, reduced to the fields worth showing a model
fn trim_organic_results(body: &Value, limit: usize) -> Result<Value, ToolError> {
    let Some(results) = body.get("organic_results").and_then(|r| r.as_array()) else {
        return match body.get("error").and_then(|e| e.as_str()) {
            Some(message) => Err(ToolError::NotFound(message.to_string())),
            None => Err(ToolError::InvalidResponse(
                "no organic_results in search reply".to_string(),
            )),
        };
    };

    let trimmed: Vec<Value> = results
        .iter()
        .take(limit)
        .map(|r| {
            json!({
                "position": r.get("position").cloned().unwrap_or(Value::Null),
                "title": r.get("title").cloned().unwrap_or(Value::Null),
                "link": r.get("link").cloned().unwrap_or(Value::Null),
                "snippet": r.get("snippet").cloned().unwrap_or(Value::Null),
            })
        })
        .collect();

    Ok(Value::Array(trimmed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ToolsConfig;
    use mockito::Matcher;

    #[test]
    fn test_trim_organic_results() {
        let body = json!({
            "search_metadata": {"status": "Success"},
            "organic_results": [
                {
                    "position": 1, "title": "Rust", "link": "https://rust-lang.org",
                    "snippet": "A language", "favicon": "x"
                },
                {"position": 2, "title": "Crates", "link": "https://crates.io"},
                {"position": 3, "title": "Docs", "link": "https://docs.rs"}
            ]
        });

        let trimmed = trim_organic_results(&body, 2).unwrap();
        let items = trimmed.as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["title"], "Rust");
        assert!(items[0].get("favicon").is_none());
        assert!(items[1]["snippet"].is_null());
    }

    #[test]
    fn test_trim_reports_api_error() {
        let body = json!({"error": "Google hasn't returned any results for this query."});
        let err = trim_organic_results(&body, 5).unwrap_err();
        assert!(matches!(err, ToolError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_missing_api_key() {
        let mut config = ToolsConfig::default();
        config.search.api_key_env = "TASKPILOT_TEST_NO_SERPAPI".to_string();
        let ctx = ToolContext::new(config).unwrap();

        let err = WebSearchTool.execute(json!({"query": "rust"}), &ctx).await.unwrap_err();
        assert!(matches!(err, ToolError::MissingCredential { .. }));
    }

    #[tokio::test]
    async fn test_search_against_mock_server() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/search.json")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("engine".into(), "google".into()),
                Matcher::UrlEncoded("q".into(), "tokio runtime".into()),
                Matcher::UrlEncoded("api_key".into(), "serp-test".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"organic_results":[{"position":1,"title":"Tokio","link":"https://tokio.rs","snippet":"async"}]}"#)
            .create_async()
            .await;

        let mut config = ToolsConfig::default();
        config.search.base_url = format!("{}/search.json", server.url());
        config.search.api_key = Some("serp-test".to_string());
        let ctx = ToolContext::new(config).unwrap();

        let result = WebSearchTool
            .execute(json!({"query": "tokio runtime"}), &ctx)
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(result[0]["link"], "https://tokio.rs");
    }

    #[tokio::test]
    async fn test_search_http_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/search.json")
            .match_query(Matcher::Any)
            .with_status(401)
            .with_body("Invalid API key")
            .create_async()
            .await;

        let mut config = ToolsConfig::default();
        config.search.base_url = format!("{}/search.json", server.url());
        config.search.api_key = Some("bad".to_string());
        let ctx = ToolContext::new(config).unwrap();

        let err = WebSearchTool.execute(json!({"query": "x"}), &ctx).await.unwrap_err();
        assert!(matches!(err, ToolError::Api { status: 401, .. }));
    }
}
