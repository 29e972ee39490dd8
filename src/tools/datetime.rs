//! findDateTime tool - current local date and time at a place

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde_json::{Value, json};

use super::{Place, Tool, ToolContext, ToolError, geocode, require_str};

pub struct FindDateTimeTool;

#[async_trait]
impl Tool for FindDateTimeTool {
    fn name(&self) -> &'static str {
        "findDateTime"
    }

    fn description(&self) -> &'static str {
        "This function returns the current date"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "location": {
                    "type": "string",
                    "description": "The Location required for determining date and time"
                }
            },
            "required": ["location"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value, ToolError> {
        let location = require_str(&params, "location")?;

        let place = geocode(location, ctx)
            .await?
            .ok_or_else(|| ToolError::NotFound(format!("Could not find location: {}", location)))?;

        local_time(location, &place, Utc::now())
    }
}

/// Render `now` in the place's timezone
fn local_time(location: &str, place: &Place, now: DateTime<Utc>) -> Result<Value, ToolError> {
    let tz: Tz = place
        .timezone
        .as_deref()
        .and_then(|name| name.parse().ok())
        .ok_or_else(|| {
            ToolError::NotFound(format!("Could not determine timezone for: {}", location))
        })?;

    let local = now.with_timezone(&tz);

    Ok(json!({
        "location": place.display_name(),
        "timezone": tz.name(),
        "current_datetime": local.format("%Y-%m-%d %H:%M:%S").to_string(),
        "utc_offset": local.format("%:z").to_string(),
        "weekday": local.format("%A").to_string(),
        "timestamp": local.timestamp(),
    }))
}
