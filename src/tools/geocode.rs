//! Place lookup shared by the weather and date/time tools
//!
//! Uses the Open-Meteo geocoding search, which returns coordinates and the
//! IANA timezone in one call.

use serde::Deserialize;

use super::{ToolContext, ToolError};

/// A geocoded location
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Place {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub admin1: Option<String>,
}

impl Place {
    /// "Toronto, Ontario, Canada" style label
    pub fn display_name(&self) -> String {
        let mut parts = vec![self.name.as_str()];
        for extra in [&self.admin1, &self.country].into_iter().flatten() {
            if !extra.is_empty() && !parts.contains(&extra.as_str()) {
                parts.push(extra);
            }
        }
        parts.join(", ")
    }

    fn matches_qualifier(&self, qualifier: &str) -> bool {
        if qualifier.is_empty() {
            return false;
        }
        [&self.country, &self.admin1]
            .into_iter()
            .flatten()
            .filter(|field| !field.trim().is_empty())
            .any(|field| {
                let field = field.to_lowercase();
                field.contains(qualifier) || qualifier.contains(&field)
            })
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<Place>,
}

/// Look up a free-form location such as "Paris" or "Paris, France"
///
/// Returns `Ok(None)` when the geocoder has no match.
pub async fn geocode(location: &str, ctx: &ToolContext) -> Result<Option<Place>, ToolError> {
    let segments: Vec<&str> = location
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    let Some((name, qualifiers)) = segments.split_first() else {
        return Err(ToolError::InvalidParameters("location is empty".to_string()));
    };

    let cfg = &ctx.config.geocoding;
    let count = if qualifiers.is_empty() { 1 } else { cfg.max_candidates.max(1) };

    let response = ctx
        .http
        .get(&cfg.base_url)
        .query(&[
            ("name", (*name).to_string()),
            ("count", count.to_string()),
            ("language", "en".to_string()),
            ("format", "json".to_string()),
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

    let body: SearchResponse = response
        .json()
        .await
        .map_err(|e| ToolError::InvalidResponse(format!("geocoder reply: {}", e)))?;

    let qualifiers: Vec<String> = qualifiers.iter().map(|q| q.to_lowercase()).collect();
    let place = pick_place(body.results, &qualifiers);
    if let Some(p) = &place {
        log::debug!(
            "Geocoded '{}' to {} ({}, {})",
            location,
            p.display_name(),
            p.latitude,
            p.longitude
        );
    }
    Ok(place)
}

/// Prefer a candidate whose country or region matches a qualifier, else the first
fn pick_place(candidates: Vec<Place>, qualifiers: &[String]) -> Option<Place> {
    if let Some(idx) = candidates
        .iter()
        .position(|p| qualifiers.iter().any(|q| p.matches_qualifier(q)))
    {
        return candidates.into_iter().nth(idx);
    }
    candidates.into_iter().next()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ToolsConfig;
    use mockito::Matcher;

    fn place(name: &str, country: &str, admin1: &str) -> Place {
        Place {
            name: name.to_string(),
            latitude: 1.0,
            longitude: 2.0,
            timezone: Some("UTC".to_string()),
            country: Some(country.to_string()),
            admin1: Some(admin1.to_string()),
        }
    }

    #[test]
    fn test_display_name() {
        let p = place("Toronto", "Canada", "Ontario");
        assert_eq!(p.display_name(), "Toronto, Ontario, Canada");

        let bare = Place {
            admin1: None,
            country: None,
            ..p
        };
        assert_eq!(bare.display_name(), "Toronto");
    }

    #[test]
    fn test_pick_place_prefers_qualifier() {
        let candidates = vec![
            place("Paris", "United States", "Texas"),
            place("Paris", "France", "Île-de-France"),
        ];
        let picked = pick_place(candidates, &["france".to_string()]).unwrap();
        assert_eq!(picked.country.as_deref(), Some("France"));
    }

    #[test]
    fn test_blank_region_matches_nothing() {
        let candidates = vec![
            place("Springfield", "United States", ""),
            place("Springfield", "Australia", "Queensland"),
        ];
        let picked = pick_place(candidates, &["queensland".to_string()]).unwrap();
        assert_eq!(picked.country.as_deref(), Some("Australia"));
    }

    #[test]
    fn test_pick_place_falls_back_to_first() {
        let candidates = vec![
            place("London", "United Kingdom", "England"),
            place("London", "Canada", "Ontario"),
        ];
        let picked = pick_place(candidates, &["narnia".to_string()]).unwrap();
        assert_eq!(picked.country.as_deref(), Some("United Kingdom"));
        assert!(pick_place(Vec::new(), &[]).is_none());
    }

    #[tokio::test]
    async fn test_geocode_with_qualifier() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/v1/search")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("name".into(), "Paris".into()),
                Matcher::UrlEncoded("count".into(), "10".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"results":[
                    {"name":"Paris","latitude":33.66,"longitude":-95.55,"timezone":"America/Chicago","country":"United States","admin1":"Texas"},
                    {"name":"Paris","latitude":48.85,"longitude":2.35,"timezone":"Europe/Paris","country":"France","admin1":"Île-de-France"}
                ]}"#,
            )
            .create_async()
            .await;

        let mut config = ToolsConfig::default();
        config.geocoding.base_url = format!("{}/v1/search", server.url());
        let ctx = ToolContext::new(config).unwrap();

        let place = geocode("Paris, France", &ctx).await.unwrap().unwrap();
        mock.assert_async().await;
        assert_eq!(place.timezone.as_deref(), Some("Europe/Paris"));
    }

    #[tokio::test]
    async fn test_geocode_no_results() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/v1/search")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"generationtime_ms":0.5}"#)
            .create_async()
            .await;

        let mut config = ToolsConfig::default();
        config.geocoding.base_url = format!("{}/v1/search", server.url());
        let ctx = ToolContext::new(config).unwrap();

        assert!(geocode("Atlantis", &ctx).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_geocode_empty_location() {
        let ctx = ToolContext::new(ToolsConfig::default()).unwrap();
        assert!(matches!(
            geocode(" , ", &ctx).await,
            Err(ToolError::InvalidParameters(_))
        ));
    }
}
