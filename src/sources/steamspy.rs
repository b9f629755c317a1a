//! SteamSpy community statistics: review counts and playtime per app.

use std::collections::HashMap;

use reqwest::Client;
use serde::{Deserialize, Deserializer};

use crate::config::Config;
use crate::error::{HarvestError, Result};
use crate::transport::classify;
use crate::types::{AppId, RequestOutcome};

pub const STEAMSPY_LABEL: &str = "steamspy";

/// Community statistics for one app as SteamSpy reports them.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SpyStats {
    #[serde(default)]
    pub positive: u64,
    #[serde(default)]
    pub negative: u64,
    #[serde(default, rename = "average_forever")]
    pub playtime_mean: u64,
    #[serde(default, rename = "median_forever")]
    pub playtime_median: u64,
    #[serde(default, deserialize_with = "tags_map_or_empty")]
    pub tags: HashMap<String, u64>,
}

/// SteamSpy serializes an empty tag set as `[]` instead of `{}`.
fn tags_map_or_empty<'de, D>(de: D) -> std::result::Result<HashMap<String, u64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Map(HashMap<String, u64>),
        List(Vec<serde_json::Value>),
    }
    Ok(match Raw::deserialize(de)? {
        Raw::Map(map) => map,
        Raw::List(_) => HashMap::new(),
    })
}

pub async fn fetch_spy_stats(
    client: &Client,
    cfg: &Config,
    appid: AppId,
) -> Result<RequestOutcome<SpyStats>> {
    let url = format!("{}/api.php?request=appdetails&appid={}", cfg.steamspy_api_url, appid);
    let response = client
        .get(&url)
        .send()
        .await
        .map_err(|inner| HarvestError::Transport { source_label: STEAMSPY_LABEL, appid, inner })?;

    if let Some(outcome) = classify(STEAMSPY_LABEL, appid, response.status().as_u16())?.without_payload() {
        return Ok(outcome);
    }

    let body = response
        .text()
        .await
        .map_err(|inner| HarvestError::Transport { source_label: STEAMSPY_LABEL, appid, inner })?;
    let stats: SpyStats = serde_json::from_str(&body).map_err(|e| HarvestError::Payload {
        source_label: STEAMSPY_LABEL,
        appid,
        detail: e.to_string(),
    })?;
    Ok(RequestOutcome::Success(stats))
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[test]
    fn stats_parse_with_a_tag_map() {
        let body = r#"{"appid": 730, "positive": 100, "negative": 10,
            "average_forever": 300, "median_forever": 120,
            "tags": {"FPS": 91172, "Shooter": 65634}}"#;
        let stats: SpyStats = serde_json::from_str(body).unwrap();
        assert_eq!(stats.positive, 100);
        assert_eq!(stats.playtime_mean, 300);
        assert_eq!(stats.tags.get("FPS"), Some(&91_172));
    }

    #[test]
    fn empty_tag_list_parses_as_no_tags() {
        let body = r#"{"positive": 5, "negative": 0, "average_forever": 0,
            "median_forever": 0, "tags": []}"#;
        let stats: SpyStats = serde_json::from_str(body).unwrap();
        assert!(stats.tags.is_empty());
    }

    #[tokio::test]
    async fn missing_apps_report_absent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api.php"))
            .and(query_param("appid", "424141343"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let mut cfg = Config::from_env().unwrap();
        cfg.steamspy_api_url = server.uri();
        let client = Client::new();
        let outcome = fetch_spy_stats(&client, &cfg, 424_141_343).await.unwrap();
        assert_eq!(outcome, RequestOutcome::Absent);
    }
}
