//! translate_text tool - Google Translate public endpoints with a backup
//!
//! The primary `translate_a/single` endpoint returns sentence fragments; when
//! it fails the `translate_a/t` endpoint is tried once.

use async_trait::async_trait;
use serde_json::{Value, json};

use super::{Tool, ToolContext, ToolError};

pub struct TranslateTextTool;

/// Normalized translation request
#[derive(Debug, Clone, PartialEq)]
struct TranslateRequest {
    text: String,
    target_language: String,
    source_language: String,
}

#[async_trait]
impl Tool for TranslateTextTool {
    fn name(&self) -> &'static str {
        "translate_text"
    }

    fn description(&self) -> &'static str {
        "Translate text from one language to another"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "text": {
                    "type": "string",
                    "description": "Text to translate"
                },
                "target_language": {
                    "type": "string",
                    "description": "Language code to translate to, e.g. 'fr'"
                },
                "source_language": {
                    "type": "string",
                    "description": "Language code to translate from (default: auto)"
                }
            },
            "required": ["text", "target_language"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value, ToolError> {
        let request = normalize_params(&params)?;

        let primary_err = match translate_primary(&request, ctx).await {
            Ok(result) => return Ok(result),
            Err(e) => e,
        };
        log::warn!("Primary translation failed ({}), trying backup", primary_err);

        translate_backup(&request, ctx).await.map_err(|backup_err| {
            ToolError::InvalidResponse(format!(
                "Both translation methods failed. Primary error: {}, Backup error: {}",
                primary_err, backup_err
            ))
        })
    }
}

fn str_param(params: &Value, name: &str) -> Option<String> {
    params
        .get(name)
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Accept `to` as an alias and a nested `parameters` object, which planners emit
fn normalize_params(params: &Value) -> Result<TranslateRequest, ToolError> {
    let nested = params.get("parameters").filter(|p| p.is_object());
    let lookup = |name: &str| {
        nested
            .and_then(|n| str_param(n, name))
            .or_else(|| str_param(params, name))
    };

    let text = lookup("text").ok_or_else(|| {
        ToolError::InvalidParameters("No text provided for translation".to_string())
    })?;
    let target_language = lookup("target_language")
        .or_else(|| lookup("to"))
        .ok_or_else(|| ToolError::InvalidParameters("No target language provided".to_string()))?;
    let source_language = lookup("source_language").unwrap_or_else(|| "auto".to_string());

    Ok(TranslateRequest {
        text,
        target_language,
        source_language,
    })
}

async fn fetch_json(
    url: &str,
    query: &[(&str, &str)],
    ctx: &ToolContext,
) -> Result<Value, ToolError> {
    let response = ctx
        .http
        .get(url)
        .query(query)
        .header(reqwest::header::USER_AGENT, &ctx.config.translate.user_agent)
        .header(reqwest::header::ACCEPT, "application/json, text/plain, */*")
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

    response
        .json()
        .await
        .map_err(|e| ToolError::InvalidResponse(format!("translation reply: {}", e)))
}

fn success(request: &TranslateRequest, translated_text: String, source_language: String) -> Value {
    json!({
        "status": "success",
        "translated_text": translated_text,
        "source_language": source_language,
        "target_language": request.target_language,
    })
}

async fn translate_primary(
    request: &TranslateRequest,
    ctx: &ToolContext,
) -> Result<Value, ToolError> {
    let body = fetch_json(
        &ctx.config.translate.primary_url,
        &[
            ("client", "gtx"),
            ("sl", &request.source_language),
            ("tl", &request.target_language),
            ("dt", "t"),
            ("q", &request.text),
        ],
        ctx,
    )
    .await?;

    let (text, detected) = parse_primary(&body, &request.source_language)?;
    Ok(success(request, text, detected))
}

/// `[[["Bonjour","Hello",...], ...], null, "en", ...]`
fn parse_primary(body: &Value, source_language: &str) -> Result<(String, String), ToolError> {
    let sentences = body
        .get(0)
        .and_then(|s| s.as_array())
        .ok_or_else(|| {
            ToolError::InvalidResponse("translation reply has no sentences".to_string())
        })?;

    let translated: String = sentences
        .iter()
        .filter_map(|sentence| sentence.get(0).and_then(|t| t.as_str()))
        .collect();

    let detected = match (source_language, body.get(2).and_then(|d| d.as_str())) {
        ("auto", Some(lang)) => lang.to_string(),
        _ => source_language.to_string(),
    };

    Ok((translated, detected))
}

async fn translate_backup(
    request: &TranslateRequest,
    ctx: &ToolContext,
) -> Result<Value, ToolError> {
    let body = fetch_json(
        &ctx.config.translate.backup_url,
        &[
            ("client", "dict-chrome-ex"),
            ("sl", &request.source_language),
            ("tl", &request.target_language),
            ("q", &request.text),
        ],
        ctx,
    )
    .await?;

    Ok(success(request, parse_backup(&body), request.source_language.clone()))
}

/// `["Bonjour"]`, `[["Bonjour","en"]]`, or anything else stringified
fn parse_backup(body: &Value) -> String {
    match body.get(0) {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Array(inner)) => match inner.first() {
            Some(Value::String(text)) => text.clone(),
            _ => body.to_string(),
        },
        _ => body.to_string(),
    }
}
