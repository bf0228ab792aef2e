//! SOS Crise API client.
//!
//! Provides async HTTP access to the backend collections.
//! Uses reqwest with rustls for TLS.

use std::fmt;
use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use crate::errors::FetchError;
use crate::models::{
    Alert, GuideDetail, GuideSummary, Id, NewsItem, Organization, SupplyNeed, SupportPoint,
    VolunteerOpportunity,
};

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Default API location (the backend runs next to the front-end).
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// User agent string for API requests.
const USER_AGENT: &str = concat!("sos-crise/", env!("CARGO_PKG_VERSION"));

/// Resources exposed by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Alerts,
    News,
    Organizations,
    SupplyNeeds,
    VolunteerOpportunities,
    SupportPoints,
    Guides,
    Guide(Id),
}

impl Resource {
    /// Get the URL path for this resource.
    #[must_use]
    pub fn path(self) -> String {
        match self {
            Self::Alerts => "/api/alerts".into(),
            Self::News => "/api/news".into(),
            Self::Organizations => "/api/organizations".into(),
            Self::SupplyNeeds => "/api/supply-needs".into(),
            Self::VolunteerOpportunities => "/api/volunteer-opportunities".into(),
            Self::SupportPoints => "/api/support-points".into(),
            Self::Guides => "/api/preparedness-guides".into(),
            Self::Guide(id) => format!("/api/preparedness-guides/{id}"),
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Alerts => f.write_str("alerts"),
            Self::News => f.write_str("news"),
            Self::Organizations => f.write_str("organizations"),
            Self::SupplyNeeds => f.write_str("supply needs"),
            Self::VolunteerOpportunities => f.write_str("volunteer opportunities"),
            Self::SupportPoints => f.write_str("support points"),
            Self::Guides => f.write_str("preparedness guides"),
            Self::Guide(id) => write!(f, "preparedness guide {id}"),
        }
    }
}

/// Client for the SOS Crise API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(FetchError::Client)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// The API location requests are sent to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET a resource and decode its JSON body.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the API answers with a
    /// non-success status, or the body does not decode.
    #[instrument(skip(self, resource), fields(resource = %resource))]
    pub async fn fetch<T: DeserializeOwned>(&self, resource: Resource) -> Result<T, FetchError> {
        let url = format!("{}{}", self.base_url, resource.path());

        debug!("fetching {}", url);

        let http_err = |source| FetchError::Http {
            resource: resource.to_string(),
            source,
        };

        let response = self.client.get(&url).send().await.map_err(http_err)?;

        // Check status before parsing
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Api {
                resource: resource.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(http_err)?;
        let value = serde_json::from_str(&body).map_err(|source| FetchError::Parse {
            resource: resource.to_string(),
            source,
        })?;

        debug!("fetched {} bytes", body.len());
        Ok(value)
    }

    /// # Errors
    ///
    /// See [`ApiClient::fetch`].
    pub async fn alerts(&self) -> Result<Vec<Alert>, FetchError> {
        self.fetch(Resource::Alerts).await
    }

    /// # Errors
    ///
    /// See [`ApiClient::fetch`].
    pub async fn news(&self) -> Result<Vec<NewsItem>, FetchError> {
        self.fetch(Resource::News).await
    }

    /// # Errors
    ///
    /// See [`ApiClient::fetch`].
    pub async fn organizations(&self) -> Result<Vec<Organization>, FetchError> {
        self.fetch(Resource::Organizations).await
    }

    /// # Errors
    ///
    /// See [`ApiClient::fetch`].
    pub async fn supply_needs(&self) -> Result<Vec<SupplyNeed>, FetchError> {
        self.fetch(Resource::SupplyNeeds).await
    }

    /// # Errors
    ///
    /// See [`ApiClient::fetch`].
    pub async fn volunteer_opportunities(&self) -> Result<Vec<VolunteerOpportunity>, FetchError> {
        self.fetch(Resource::VolunteerOpportunities).await
    }

    /// # Errors
    ///
    /// See [`ApiClient::fetch`].
    pub async fn support_points(&self) -> Result<Vec<SupportPoint>, FetchError> {
        self.fetch(Resource::SupportPoints).await
    }

    /// # Errors
    ///
    /// See [`ApiClient::fetch`].
    pub async fn guides(&self) -> Result<Vec<GuideSummary>, FetchError> {
        self.fetch(Resource::Guides).await
    }

    /// Fetch one guide with its markdown body.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::fetch`].
    pub async fn guide(&self, id: Id) -> Result<GuideDetail, FetchError> {
        self.fetch(Resource::Guide(id)).await
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client_for(server: &MockServer) -> ApiClient {
        ApiClient::new(&server.uri(), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_resource_paths() {
        assert_eq!(Resource::SupplyNeeds.path(), "/api/supply-needs");
        assert_eq!(
            Resource::VolunteerOpportunities.path(),
            "/api/volunteer-opportunities"
        );
        assert_eq!(Resource::Guide(3).path(), "/api/preparedness-guides/3");
        assert_eq!(Resource::Guide(3).to_string(), "preparedness guide 3");
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let client = ApiClient::new("http://localhost:8000/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8000");
    }

    #[tokio::test]
    async fn test_fetch_alerts() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/alerts"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                r#"[{"id": 1, "title": "Enchente em Porto Alegre", "severity": "critical",
                     "location": "Porto Alegre, RS", "recommendations": ["Evite áreas alagadas"]}]"#,
                "application/json",
            ))
            .expect(1)
            .mount(&server)
            .await;

        let alerts = client_for(&server).alerts().await.unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].recommendations, vec!["Evite áreas alagadas"]);
    }

    #[tokio::test]
    async fn test_empty_collection_is_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/news"))
            .respond_with(ResponseTemplate::new(200).set_body_raw("[]", "application/json"))
            .mount(&server)
            .await;

        let news = client_for(&server).news().await.unwrap();
        assert!(news.is_empty());
    }

    #[tokio::test]
    async fn test_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/alerts"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = client_for(&server).alerts().await.unwrap_err();
        assert!(matches!(err, FetchError::Api { status: 500, .. }));
        assert_eq!(err.user_message(), crate::errors::USER_MESSAGE);
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/support-points"))
            .respond_with(ResponseTemplate::new(200).set_body_raw("{not json", "application/json"))
            .mount(&server)
            .await;

        let err = client_for(&server).support_points().await.unwrap_err();
        assert!(matches!(err, FetchError::Parse { .. }));
    }

    #[tokio::test]
    async fn test_fetch_guide_detail() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/preparedness-guides/3"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                r##"{"id": 3, "title": "Kit de emergência", "content_md": "# Kit"}"##,
                "application/json",
            ))
            .expect(1)
            .mount(&server)
            .await;

        let guide = client_for(&server).guide(3).await.unwrap();
        assert_eq!(guide.summary.title, "Kit de emergência");
        assert_eq!(guide.content_md, "# Kit");
    }

    #[tokio::test]
    async fn test_unreachable_api() {
        // Nothing listens on port 9 (discard) in the test environment
        let client = ApiClient::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
        let err = client.guides().await.unwrap_err();
        assert!(matches!(err, FetchError::Http { .. }));
    }
}
