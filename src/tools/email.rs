//! send_email tool - plain-text mail through an SMTP relay (STARTTLS + login)

use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use serde_json::{Value, json};

use super::{Tool, ToolContext, ToolError, require_str};

pub struct SendEmailTool;

#[async_trait]
impl Tool for SendEmailTool {
    fn name(&self) -> &'static str {
        "send_email"
    }

    fn description(&self) -> &'static str {
        "Send an email with subject and body to the specified recipient"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "to": {
                    "type": "string",
                    "description": "Recipient email address"
                },
                "subject": {
                    "type": "string",
                    "description": "Email subject line"
                },
                "body": {
                    "type": "string",
                    "description": "Plain-text email body"
                }
            },
            "required": ["to", "subject", "body"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value, ToolError> {
        let to = require_str(&params, "to")?;
        let subject = require_str(&params, "subject")?;
        // Bodies may legitimately be blank after trimming, but must be present
        let body = params
            .get("body")
            .and_then(|b| b.as_str())
            .ok_or_else(|| ToolError::InvalidParameters("missing 'body' parameter".to_string()))?;

        let cfg = &ctx.config.email;
        let server = cfg.smtp_server().ok_or_else(|| ToolError::missing("SMTP_SERVER"))?;
        let username = cfg.username().ok_or_else(|| ToolError::missing("SMTP_USER"))?;
        let password = cfg.password().ok_or_else(|| ToolError::missing("SMTP_PASSWORD"))?;

        let message = build_message(&username, to, subject, body)?;

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&server)
            .map_err(|e| ToolError::Email(format!("cannot reach {}: {}", server, e)))?
            .port(cfg.smtp_port())
            .credentials(Credentials::new(username, password))
            .build();

        mailer
            .send(message)
            .await
            .map_err(|e| ToolError::Email(e.to_string()))?;

        log::info!("Email sent to {}", to);
        Ok(json!({
            "status": "success",
            "message": format!("Email sent to {}", to),
        }))
    }
}

fn parse_mailbox(address: &str, role: &str) -> Result<Mailbox, ToolError> {
    address.parse().map_err(|e| {
        ToolError::InvalidParameters(format!("invalid {} address '{}': {}", role, address, e))
    })
}

/// Assemble the plain-text message
fn build_message(from: &str, to: &str, subject: &str, body: &str) -> Result<Message, ToolError> {
    Message::builder()
        .from(parse_mailbox(from, "sender")?)
        .to(parse_mailbox(to, "recipient")?)
        .subject(subject)
        .header(ContentType::TEXT_PLAIN)
        .body(body.to_string())
        .map_err(|e| ToolError::Email(e.to_string()))
}
