//! get_weather tool - current conditions from OpenWeatherMap

use async_trait::async_trait;
use serde_json::{Value, json};

use super::{Place, Tool, ToolContext, ToolError, geocode, require_str};

pub struct GetWeatherTool;

#[async_trait]
impl Tool for GetWeatherTool {
    fn name(&self) -> &'static str {
        "get_weather"
    }

    fn description(&self) -> &'static str {
        "This function returns the current weather information"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "location": {
                    "type": "string",
                    "description": "The Location required for determining weather"
                }
            },
            "required": ["location"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value, ToolError> {
        let location = require_str(&params, "location")?;
        let cfg = &ctx.config.weather;
        let api_key = cfg.api_key().ok_or_else(|| ToolError::missing(&cfg.api_key_env))?;

        let place = geocode(location, ctx)
            .await?
            .ok_or_else(|| ToolError::NotFound(format!("Location not found: {}", location)))?;

        let response = ctx
            .http
            .get(&cfg.base_url)
            .query(&[
                ("lat", place.latitude.to_string()),
                ("lon", place.longitude.to_string()),
                ("appid", api_key),
                ("units", cfg.units.clone()),
            ])
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
            .map_err(|e| ToolError::InvalidResponse(format!("weather reply: {}", e)))?;

        format_weather(&place, &body)
    }
}

fn field<'a>(body: &'a Value, pointer: &str) -> Result<&'a Value, ToolError> {
    body.pointer(pointer)
        .filter(|v| !v.is_null())
        .ok_or_else(|| ToolError::InvalidResponse(format!("weather reply is missing {}", pointer)))
}

fn field_or_na(body: &Value, pointer: &str) -> Value {
    body.pointer(pointer)
        .filter(|v| !v.is_null())
        .cloned()
        .unwrap_or_else(|| json!("N/A"))
}

/// Shape an OpenWeatherMap current-weather body into the tool's result
fn format_weather(place: &Place, body: &Value) -> Result<Value, ToolError> {
    Ok(json!({
        "location": place.display_name(),
        "coordinates": {
            "latitude": place.latitude,
            "longitude": place.longitude,
        },
        "weather": {
            "condition": field(body, "/weather/0/main")?,
            "description": field(body, "/weather/0/description")?,
            "temperature": {
                "current": field(body, "/main/temp")?,
                "feels_like": field(body, "/main/feels_like")?,
                "min": field(body, "/main/temp_min")?,
                "max": field(body, "/main/temp_max")?,
            },
            "humidity": field(body, "/main/humidity")?,
            "wind": {
                "speed": field(body, "/wind/speed")?,
                "degrees": field_or_na(body, "/wind/deg"),
            },
            "pressure": field(body, "/main/pressure")?,
            "visibility": field_or_na(body, "/visibility"),
        },
        "timestamp": field(body, "/dt")?,
        "sunrise": field(body, "/sys/sunrise")?,
        "sunset": field(body, "/sys/sunset")?,
    }))
}
