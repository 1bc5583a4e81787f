//! # HTTP Offer Search Gateway
//!
//! Queries the offer search API with a saved search's criteria, restricted to
//! offers created since the previous evaluation. Only the first, tiny page is
//! requested: the run needs to know whether anything new exists, not what.

use super::{OfferPage, OfferSearchGateway};
use crate::config::OfferApiConfig;
use crate::error::{GatewayError, NotifierError, Result};
use crate::models::SearchKind;
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{Client, StatusCode, Url};
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Clone)]
pub struct HttpOfferSearchGateway {
    client: Client,
    base_url: Url,
    api_key: Option<String>,
    page_size: u32,
}

impl std::fmt::Debug for HttpOfferSearchGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpOfferSearchGateway")
            .field("base_url", &self.base_url.as_str())
            .field("page_size", &self.page_size)
            .field("auth_enabled", &self.api_key.is_some())
            .finish()
    }
}

impl HttpOfferSearchGateway {
    pub fn new(config: &OfferApiConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            NotifierError::ConfigurationError(format!("Invalid offer API base URL: {e}"))
        })?;

        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(format!("search-notifier/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                NotifierError::ConfigurationError(format!("Failed to create HTTP client: {e}"))
            })?;

        info!(
            base_url = %config.base_url,
            timeout_ms = config.timeout_ms,
            page_size = config.page_size,
            "Created offer search gateway"
        );

        Ok(Self {
            client,
            base_url,
            api_key: config.api_key.clone(),
            page_size: config.page_size,
        })
    }

    /// Endpoint paths are appended to the base URL so an API prefix (`/v1`) is kept
    fn endpoint(&self, kind: SearchKind) -> std::result::Result<Url, GatewayError> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Url::parse(&format!("{base}{}", endpoint_path(kind)))
            .map_err(|e| GatewayError::other(format!("Failed to construct URL: {e}")))
    }
}

#[async_trait]
impl OfferSearchGateway for HttpOfferSearchGateway {
    async fn search(
        &self,
        kind: SearchKind,
        criteria: &serde_json::Value,
        not_before: DateTime<Utc>,
    ) -> std::result::Result<OfferPage, GatewayError> {
        let url = self.endpoint(kind)?;
        let params = build_query(kind, criteria, not_before, self.page_size);

        debug!(url = %url, kind = %kind, params = ?params, "Searching new offers");

        let mut request = self.client.get(url).query(&params);
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| GatewayError::other(format!("Request to offer API failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            if status == StatusCode::TOO_MANY_REQUESTS {
                warn!(kind = %kind, "Offer API answered 429");
            }
            return Err(GatewayError::from_status(
                status.as_u16(),
                format!("HTTP {status}: {body}"),
            ));
        }

        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|e| GatewayError::other(format!("Invalid offer API response: {e}")))?;

        parse_offer_page(payload)
    }
}

fn endpoint_path(kind: SearchKind) -> &'static str {
    match kind {
        SearchKind::OffresEmploi | SearchKind::OffresAlternance => "/offres-emploi",
        SearchKind::OffresImmersion => "/offres-immersion",
        SearchKind::OffresServicesCivique => "/services-civique",
    }
}

/// Flatten criteria into query parameters and add the paging and freshness filters
pub(crate) fn build_query(
    kind: SearchKind,
    criteria: &serde_json::Value,
    not_before: DateTime<Utc>,
    page_size: u32,
) -> Vec<(String, String)> {
    let mut params = Vec::new();

    if let serde_json::Value::Object(fields) = criteria {
        for (name, value) in fields {
            if matches!(name.as_str(), "alternance" | "page" | "limit" | "minDateCreation") {
                continue;
            }
            match value {
                serde_json::Value::Null => {}
                serde_json::Value::Array(values) => {
                    for item in values.iter().filter_map(scalar_to_param) {
                        params.push((name.clone(), item));
                    }
                }
                other => {
                    if let Some(param) = scalar_to_param(other) {
                        params.push((name.clone(), param));
                    }
                }
            }
        }
    }

    match kind {
        SearchKind::OffresEmploi => params.push(("alternance".to_string(), "false".to_string())),
        SearchKind::OffresAlternance => {
            params.push(("alternance".to_string(), "true".to_string()))
        }
        SearchKind::OffresImmersion | SearchKind::OffresServicesCivique => {}
    }

    params.push((
        "minDateCreation".to_string(),
        not_before.to_rfc3339_opts(SecondsFormat::Secs, true),
    ));
    params.push(("page".to_string(), "1".to_string()));
    params.push(("limit".to_string(), page_size.to_string()));
    params
}

fn scalar_to_param(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        nested => Some(nested.to_string()),
    }
}

/// Accept either a bare array or an object carrying a `results` array
pub(crate) fn parse_offer_page(
    payload: serde_json::Value,
) -> std::result::Result<OfferPage, GatewayError> {
    match payload {
        serde_json::Value::Array(items) => Ok(OfferPage::new(items)),
        serde_json::Value::Object(mut body) => match body.remove("results") {
            Some(serde_json::Value::Array(items)) => Ok(OfferPage::new(items)),
            _ => Err(GatewayError::other(
                "Offer API response has no results array",
            )),
        },
        _ => Err(GatewayError::other("Unexpected offer API response shape")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn param<'a>(params: &'a [(String, String)], name: &str) -> Vec<&'a str> {
        params
            .iter()
            .filter(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
            .collect()
    }

    #[test]
    fn test_build_query_for_job_offers() {
        let not_before = Utc.with_ymd_and_hms(2024, 3, 1, 8, 30, 0).unwrap();
        let criteria = json!({
            "q": "boulanger",
            "departement": "75",
            "experience": ["1", "2"],
            "rayon": 10,
            "commune": null,
            "alternance": true
        });

        let params = build_query(SearchKind::OffresEmploi, &criteria, not_before, 2);

        assert_eq!(param(&params, "q"), vec!["boulanger"]);
        assert_eq!(param(&params, "departement"), vec!["75"]);
        assert_eq!(param(&params, "experience"), vec!["1", "2"]);
        assert_eq!(param(&params, "rayon"), vec!["10"]);
        assert!(param(&params, "commune").is_empty());
        assert_eq!(param(&params, "alternance"), vec!["false"]);
        assert_eq!(param(&params, "minDateCreation"), vec!["2024-03-01T08:30:00Z"]);
        assert_eq!(param(&params, "page"), vec!["1"]);
        assert_eq!(param(&params, "limit"), vec!["2"]);
    }

    #[test]
    fn test_build_query_for_apprenticeship_forces_flag() {
        let params = build_query(SearchKind::OffresAlternance, &json!(null), Utc::now(), 1);
        assert_eq!(param(&params, "alternance"), vec!["true"]);
        assert_eq!(param(&params, "limit"), vec!["1"]);
    }

    #[test]
    fn test_build_query_for_immersion_has_no_alternance_flag() {
        let params = build_query(
            SearchKind::OffresImmersion,
            &json!({"rome": "D1102", "lat": 48.85, "lon": 2.35}),
            Utc::now(),
            2,
        );
        assert!(param(&params, "alternance").is_empty());
        assert_eq!(param(&params, "rome"), vec!["D1102"]);
        assert_eq!(param(&params, "lat"), vec!["48.85"]);
    }

    #[test]
    fn test_endpoint_paths() {
        assert_eq!(endpoint_path(SearchKind::OffresEmploi), "/offres-emploi");
        assert_eq!(endpoint_path(SearchKind::OffresAlternance), "/offres-emploi");
        assert_eq!(endpoint_path(SearchKind::OffresImmersion), "/offres-immersion");
        assert_eq!(
            endpoint_path(SearchKind::OffresServicesCivique),
            "/services-civique"
        );
    }

    #[test]
    fn test_parse_offer_page_shapes() {
        let page = parse_offer_page(json!({"pagination": {"total": 1}, "results": [{"id": "1"}]}))
            .unwrap();
        assert_eq!(page.len(), 1);
        assert!(page.has_results());

        let page = parse_offer_page(json!([])).unwrap();
        assert!(!page.has_results());

        assert!(parse_offer_page(json!({"total": 0})).is_err());
        assert!(parse_offer_page(json!("nope")).is_err());
    }

    #[test]
    fn test_endpoint_keeps_base_path_prefix() {
        let config = OfferApiConfig {
            base_url: "https://offres.example.org/api/v1/".to_string(),
            ..Default::default()
        };
        let gateway = HttpOfferSearchGateway::new(&config).unwrap();
        assert_eq!(
            gateway.endpoint(SearchKind::OffresImmersion).unwrap().as_str(),
            "https://offres.example.org/api/v1/offres-immersion"
        );
    }

    #[test]
    fn test_rejects_invalid_base_url() {
        let config = OfferApiConfig {
            base_url: "not a url".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            HttpOfferSearchGateway::new(&config),
            Err(NotifierError::ConfigurationError(_))
        ));
    }
}
