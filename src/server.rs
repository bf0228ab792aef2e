//! Web server for the SOS Crise UI.
//!
//! Serves the crisis dashboard using:
//! - Axum for HTTP server
//! - HTMX fragments so every data section loads on its own
//! - Leaflet for the support map
//!
//! Page routes answer with a shell straight away and open a visit. The
//! first fragment request of a visit fetches its collection from the API;
//! filter changes within the visit re-filter the cached collection. Only a
//! new page load fetches again.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use axum::{
    Router,
    extract::{Path, Query, State},
    http::{StatusCode, Uri},
    response::Html,
    routing::get,
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use crate::cache::{VisitCache, VisitId};
use crate::client::ApiClient;
use crate::filters::{AlertFilter, Choice, SupportPointFilter, TextQuery, Unfiltered};
use crate::models::{
    Alert, Id, NewsItem, PointType, Severity, SupplyNeed, SupportPoint, VolunteerOpportunity,
};
use crate::pages::{self, ViewMode};
use crate::view::{HelpState, HelpTab, ListView, Selector};

/// Alerts shown on the landing page.
const LATEST_ALERTS: usize = 3;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    pub api_url: String,
    pub timeout: Duration,
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    client: ApiClient,
    next_visit: Arc<AtomicU64>,
    alerts: Arc<VisitCache<Alert, AlertFilter>>,
    news: Arc<VisitCache<NewsItem, TextQuery>>,
    supplies: Arc<VisitCache<SupplyNeed, TextQuery>>,
    volunteers: Arc<VisitCache<VolunteerOpportunity, TextQuery>>,
    support_points: Arc<VisitCache<SupportPoint, SupportPointFilter>>,
}

impl AppState {
    #[must_use]
    pub fn new(client: ApiClient) -> Self {
        // Start from the clock so tabs left open across a restart get fresh ids
        let first = u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or_default();
        Self {
            client,
            next_visit: Arc::new(AtomicU64::new(first)),
            alerts: Arc::new(VisitCache::with_default_capacity()),
            news: Arc::new(VisitCache::with_default_capacity()),
            supplies: Arc::new(VisitCache::with_default_capacity()),
            volunteers: Arc::new(VisitCache::with_default_capacity()),
            support_points: Arc::new(VisitCache::with_default_capacity()),
        }
    }

    /// Open a visit for a freshly loaded page.
    fn begin_visit(&self) -> VisitId {
        self.next_visit.fetch_add(1, Ordering::Relaxed)
    }
}

// Query strings are parsed leniently: a missing or malformed value means
// "no filter", never a rejected request.

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct VisitParams {
    visit: String,
}

impl VisitParams {
    fn id(&self) -> Option<VisitId> {
        self.visit.trim().parse().ok()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SearchParams {
    q: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AlertsParams {
    q: String,
    severity: String,
    selected: String,
}

impl AlertsParams {
    fn severity(&self) -> Choice<Severity> {
        self.severity.parse().unwrap_or_default()
    }

    fn selected(&self) -> Option<Id> {
        self.selected.trim().parse().ok()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SupportMapParams {
    q: String,
    #[serde(rename = "type")]
    kind: String,
    view: String,
}

impl SupportMapParams {
    fn kind(&self) -> Choice<PointType> {
        self.kind.parse().unwrap_or_default()
    }

    fn mode(&self) -> ViewMode {
        ViewMode::parse(&self.view)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct HelpParams {
    tab: String,
    q: String,
}

impl HelpParams {
    fn state(self) -> HelpState {
        HelpState {
            tab: self.tab.parse().unwrap_or(HelpTab::Donations),
            query: self.q,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GuideParams {
    guide: String,
}

/// Create the Axum router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home_handler))
        .route("/alerts", get(alerts_page_handler))
        .route("/news", get(news_page_handler))
        .route("/support-map", get(support_map_page_handler))
        .route("/how-to-help", get(how_to_help_page_handler))
        .route("/preparedness", get(preparedness_page_handler))
        .route("/fragments/latest-alerts", get(latest_alerts_handler))
        .route("/fragments/alerts", get(alerts_handler))
        .route("/fragments/news", get(news_handler))
        .route("/fragments/organizations", get(organizations_handler))
        .route("/fragments/supply-needs", get(supply_needs_handler))
        .route(
            "/fragments/volunteer-opportunities",
            get(volunteer_opportunities_handler),
        )
        .route("/fragments/support-points", get(support_points_handler))
        .route("/fragments/guides", get(guides_handler))
        .route("/fragments/guides/{id}", get(guide_handler))
        .route("/health", get(health_handler))
        .fallback(not_found_handler)
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                // Path only: search text stays out of the logs
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    path = %request.uri().path(),
                )
            }),
        )
        .with_state(state)
}

/// Start the web server.
///
/// # Errors
///
/// Returns an error if the API client cannot be built or the address
/// cannot be bound.
pub async fn run_server(config: ServerConfig) -> anyhow::Result<()> {
    let client = ApiClient::new(&config.api_url, config.timeout)?;
    tracing::info!("reading data from {}", client.base_url());
    let app = create_router(AppState::new(client));

    let addr = format!("{}:{}", config.host, config.port);
    tracing::info!("🆘 SOS Crise UI starting at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============================================================================
// Page Handlers
// ============================================================================

async fn home_handler() -> Html<String> {
    Html(pages::home_page())
}

async fn alerts_page_handler(
    State(state): State<AppState>,
    Query(params): Query<AlertsParams>,
) -> Html<String> {
    Html(pages::alerts_page(
        &params.q,
        &params.severity(),
        params.selected(),
        state.begin_visit(),
    ))
}

async fn news_page_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Html<String> {
    Html(pages::news_page(&params.q, state.begin_visit()))
}

async fn support_map_page_handler(
    State(state): State<AppState>,
    Query(params): Query<SupportMapParams>,
) -> Html<String> {
    Html(pages::support_map_page(
        &params.q,
        &params.kind(),
        params.mode(),
        state.begin_visit(),
    ))
}

async fn how_to_help_page_handler(
    State(state): State<AppState>,
    Query(params): Query<HelpParams>,
) -> Html<String> {
    Html(pages::how_to_help_page(&params.state(), state.begin_visit()))
}

async fn preparedness_page_handler(Query(params): Query<GuideParams>) -> Html<String> {
    Html(pages::preparedness_page(params.guide.trim().parse().ok()))
}

async fn not_found_handler(uri: Uri) -> (StatusCode, Html<String>) {
    tracing::warn!("no route for {}", uri.path());
    (StatusCode::NOT_FOUND, Html(pages::not_found_page(uri.path())))
}

/// Health check endpoint.
async fn health_handler() -> &'static str {
    "OK"
}

// ============================================================================
// Fragment Handlers
// ============================================================================

async fn latest_alerts_handler(State(state): State<AppState>) -> Html<String> {
    let mut view = ListView::new(TextQuery::default());
    view.begin();
    view.finish(state.client.alerts().await);
    Html(pages::latest_alerts_fragment(&view.visible(), LATEST_ALERTS))
}

async fn alerts_handler(
    State(state): State<AppState>,
    Query(params): Query<AlertsParams>,
    Query(visit): Query<VisitParams>,
) -> Html<String> {
    let visit = visit.id();
    let filter = AlertFilter {
        query: TextQuery::new(&params.q),
        severity: params.severity(),
    };
    let selector = Selector::new(params.selected());

    let html = state
        .alerts
        .with_view(visit, filter, || state.client.alerts(), |view| {
            let filter = view.filter();
            pages::alerts_fragment(
                &view.visible(),
                filter.query.as_str(),
                &filter.severity,
                selector,
                visit,
            )
        })
        .await;
    Html(html)
}

async fn news_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
    Query(visit): Query<VisitParams>,
) -> Html<String> {
    let html = state
        .news
        .with_view(visit.id(), TextQuery::new(&params.q), || state.client.news(), |view| {
            pages::news_fragment(&view.visible())
        })
        .await;
    Html(html)
}

async fn organizations_handler(State(state): State<AppState>) -> Html<String> {
    let mut view = ListView::new(Unfiltered);
    view.begin();
    view.finish(state.client.organizations().await);
    Html(pages::organizations_fragment(&view.visible()))
}

async fn supply_needs_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
    Query(visit): Query<VisitParams>,
) -> Html<String> {
    let html = state
        .supplies
        .with_view(
            visit.id(),
            TextQuery::new(&params.q),
            || state.client.supply_needs(),
            |view| pages::supply_needs_fragment(&view.visible()),
        )
        .await;
    Html(html)
}

async fn volunteer_opportunities_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
    Query(visit): Query<VisitParams>,
) -> Html<String> {
    let html = state
        .volunteers
        .with_view(
            visit.id(),
            TextQuery::new(&params.q),
            || state.client.volunteer_opportunities(),
            |view| pages::volunteer_fragment(&view.visible()),
        )
        .await;
    Html(html)
}

async fn support_points_handler(
    State(state): State<AppState>,
    Query(params): Query<SupportMapParams>,
    Query(visit): Query<VisitParams>,
) -> Html<String> {
    let mode = params.mode();
    let filter = SupportPointFilter {
        query: TextQuery::new(&params.q),
        kind: params.kind(),
        mappable_only: mode == ViewMode::Map,
    };
    let html = state
        .support_points
        .with_view(visit.id(), filter, || state.client.support_points(), |view| {
            pages::support_points_fragment(&view.visible(), mode)
        })
        .await;
    Html(html)
}

async fn guides_handler(State(state): State<AppState>) -> Html<String> {
    let mut view = ListView::new(Unfiltered);
    view.begin();
    view.finish(state.client.guides().await);
    Html(pages::guides_fragment(&view.visible(), Selector::default()))
}

/// One guide in full.
///
/// Each open guide is its own page load, so a response for a guide the
/// user already left lands on a page that is gone.
async fn guide_handler(State(state): State<AppState>, Path(id): Path<Id>) -> Html<String> {
    Html(match state.client.guide(id).await {
        Ok(guide) => pages::guide_detail_fragment(&guide),
        Err(e) => {
            tracing::warn!("guide {id} failed: {e}");
            pages::error_state(e.user_message())
        }
    })
}

#[cfg(test)]
mod tests {
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use tower::ServiceExt;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    const ALERTS: &str = r#"[
        {"id": 1, "title": "Enchente em Porto Alegre", "severity": "critical",
         "location": "Porto Alegre, RS", "recommendations": ["Evite áreas alagadas"]},
        {"id": 2, "title": "Onda de calor", "severity": "medium",
         "location": "Cuiabá, MT", "recommendations": []}
    ]"#;

    fn router_for(server: &MockServer) -> Router {
        let client = ApiClient::new(&server.uri(), Duration::from_secs(5)).unwrap();
        create_router(AppState::new(client))
    }

    async fn get_body(app: Router, uri: &str) -> (StatusCode, String) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    async fn mount_alerts(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/api/alerts"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(ALERTS, "application/json"))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_alerts_fragment_filters() {
        let server = MockServer::start().await;
        mount_alerts(&server).await;

        let (status, body) = get_body(router_for(&server), "/fragments/alerts?q=porto").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Enchente em Porto Alegre"));
        assert!(!body.contains("Onda de calor"));

        let (_, body) = get_body(router_for(&server), "/fragments/alerts?severity=medium").await;
        assert!(body.contains("Onda de calor"));
        assert!(!body.contains("Enchente"));
    }

    #[tokio::test]
    async fn test_no_results_block() {
        let server = MockServer::start().await;
        mount_alerts(&server).await;

        let (_, body) = get_body(router_for(&server), "/fragments/alerts?q=xyz").await;
        assert!(body.contains("Nenhum alerta encontrado"));
        assert!(!body.contains("error-state"));
    }

    #[tokio::test]
    async fn test_selected_alert_shows_recommendations() {
        let server = MockServer::start().await;
        mount_alerts(&server).await;

        let (_, body) = get_body(router_for(&server), "/fragments/alerts?selected=1").await;
        assert!(body.contains("Evite áreas alagadas"));
        assert!(body.contains("Ocultar detalhes"));

        let (_, body) = get_body(router_for(&server), "/fragments/alerts?selected=abc").await;
        assert!(!body.contains("Recomendações"));
    }

    #[tokio::test]
    async fn test_filter_changes_reuse_the_visit_fetch() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/alerts"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(ALERTS, "application/json"))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        // Anything after the first load would fail
        Mock::given(method("GET"))
            .and(path("/api/alerts"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let app = router_for(&server);
        let (_, initial) = get_body(app.clone(), "/fragments/alerts?visit=7").await;
        assert!(initial.contains("Onda de calor"));

        let (_, typed) = get_body(app.clone(), "/fragments/alerts?visit=7&q=porto").await;
        assert!(typed.contains("Enchente em Porto Alegre"));
        assert!(!typed.contains("Onda de calor"));
        assert!(!typed.contains("error-state"));

        let (_, opened) = get_body(app.clone(), "/fragments/alerts?visit=7&q=porto&selected=1").await;
        assert!(opened.contains("Evite áreas alagadas"));

        let requests = server.received_requests().await.unwrap_or_default();
        assert_eq!(requests.len(), 1);

        // A new page load is a new visit and fetches again
        let (_, other) = get_body(app, "/fragments/alerts?visit=8").await;
        assert!(other.contains("error-state"));
    }

    #[tokio::test]
    async fn test_failed_visit_ignores_filter_changes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/news"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/news"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                r#"[{"id": 1, "title": "Chuvas no Sul"}]"#,
                "application/json",
            ))
            .mount(&server)
            .await;

        let app = router_for(&server);
        let (_, first) = get_body(app.clone(), "/fragments/news?visit=3").await;
        assert!(first.contains("error-state"));

        let (_, typed) = get_body(app, "/fragments/news?visit=3&q=chuva").await;
        assert!(typed.contains("error-state"));
        assert!(!typed.contains("Chuvas no Sul"));
        assert_eq!(server.received_requests().await.unwrap_or_default().len(), 1);
    }

    #[tokio::test]
    async fn test_each_page_load_opens_a_visit() {
        let server = MockServer::start().await;
        let app = router_for(&server);

        let (_, first) = get_body(app.clone(), "/alerts").await;
        let (_, second) = get_body(app, "/alerts").await;
        assert!(first.contains(r#"<input type="hidden" name="visit""#));
        assert!(first.contains("/fragments/alerts?visit="));

        let visit_of = |page: &str| {
            let start = page.find(r#"name="visit" value=""#).map(|i| i + 20)?;
            let len = page[start..].find('"')?;
            page[start..start + len].parse::<VisitId>().ok()
        };
        let (a, b) = (visit_of(&first), visit_of(&second));
        assert!(a.is_some());
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_api_failure_renders_error_block() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/alerts"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let (status, body) = get_body(router_for(&server), "/fragments/alerts?q=porto").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("error-state"));
        assert!(body.contains(crate::errors::USER_MESSAGE));

        // The page shell still renders its controls
        let (_, page) = get_body(router_for(&server), "/alerts?q=porto").await;
        assert!(page.contains(r#"value="porto""#));
        assert!(page.contains("hx-trigger=\"load\""));
    }

    #[tokio::test]
    async fn test_failures_are_independent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/organizations"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/supply-needs"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                r#"[{"id": 1, "organization": "Cruz Vermelha", "items": ["Água potável"],
                     "urgency": "urgent", "location": "Canoas, RS", "contact": "doacoes@cv.org"}]"#,
                "application/json",
            ))
            .mount(&server)
            .await;

        let (_, orgs) = get_body(router_for(&server), "/fragments/organizations").await;
        assert!(orgs.contains("error-state"));

        let (_, supplies) = get_body(router_for(&server), "/fragments/supply-needs?q=%C3%81GUA").await;
        assert!(supplies.contains("Cruz Vermelha"));
        assert!(supplies.contains("URGENTE"));
        assert!(supplies.contains("mailto:doacoes@cv.org"));
    }

    #[tokio::test]
    async fn test_support_map_view_only_plots_coordinates() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/support-points"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                r#"[{"id": 1, "name": "Ginásio Tesourinha", "type": "shelter",
                     "latitude": -30.03, "longitude": -51.22},
                    {"id": 2, "name": "Posto Central", "type": "health_clinic"}]"#,
                "application/json",
            ))
            .mount(&server)
            .await;

        let (_, list) = get_body(router_for(&server), "/fragments/support-points").await;
        assert!(list.contains("Ginásio Tesourinha"));
        assert!(list.contains("Posto Central"));

        let (_, map) = get_body(router_for(&server), "/fragments/support-points?view=map").await;
        assert!(map.contains("Ginásio Tesourinha"));
        assert!(!map.contains("Posto Central"));

        let (_, none) =
            get_body(router_for(&server), "/fragments/support-points?view=map&type=health_clinic").await;
        assert!(none.contains("Nenhum local encontrado"));
    }

    #[tokio::test]
    async fn test_guide_detail_fragment() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/preparedness-guides/3"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                r##"{"id": 3, "title": "Kit de emergência", "category": "Preparação",
                     "difficulty": "Básico", "content_md": "# Itens essenciais"}"##,
                "application/json",
            ))
            .expect(2)
            .mount(&server)
            .await;

        let app = router_for(&server);
        let (_, body) = get_body(app.clone(), "/fragments/guides/3").await;
        assert!(body.contains("Kit de emergência"));
        assert!(body.contains("# Itens essenciais"));
        assert!(body.contains("data-markdown"));

        // Opening the same guide again is a new page load, not a close
        let (_, again) = get_body(app, "/fragments/guides/3").await;
        assert!(again.contains("Kit de emergência"));
        assert!(!again.contains("error-state"));
    }

    #[tokio::test]
    async fn test_guide_detail_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/preparedness-guides/8"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let (_, body) = get_body(router_for(&server), "/fragments/guides/8").await;
        assert!(body.contains("error-state"));
    }

    #[tokio::test]
    async fn test_preparedness_page_opens_guide() {
        let server = MockServer::start().await;
        let (_, body) = get_body(router_for(&server), "/preparedness?guide=3").await;
        assert!(body.contains(r#"hx-get="/fragments/guides/3""#));
        assert!(body.contains("Voltar aos guias"));

        let (_, body) = get_body(router_for(&server), "/preparedness?guide=oops").await;
        assert!(body.contains(r#"hx-get="/fragments/guides""#));
        assert!(body.contains("Números de Emergência"));
    }

    #[tokio::test]
    async fn test_unknown_route_and_health() {
        let server = MockServer::start().await;
        let (status, body) = get_body(router_for(&server), "/nowhere").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.contains("Página não encontrada"));

        let (status, body) = get_body(router_for(&server), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "OK");
    }

    #[test]
    fn test_lenient_params() {
        let params = AlertsParams {
            q: String::new(),
            severity: "HIGH".into(),
            selected: " 4 ".into(),
        };
        assert_eq!(params.severity(), Choice::Only(Severity::High));
        assert_eq!(params.selected(), Some(4));

        let help = HelpParams {
            tab: "bogus".into(),
            q: "água".into(),
        }
        .state();
        assert_eq!(help.tab, HelpTab::Donations);

        let visit = |raw: &str| VisitParams { visit: raw.into() }.id();
        assert_eq!(visit(" 12 "), Some(12));
        assert_eq!(visit("abc"), None);
        assert_eq!(visit(""), None);
    }
}
