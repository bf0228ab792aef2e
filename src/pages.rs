//! HTML rendering for the web UI.
//!
//! Pages are shells: header, filter controls and footer are rendered at
//! once, while every data section starts as a loading placeholder that
//! fetches its own fragment (HTMX `hx-trigger="load"`). Fragments render
//! one of: error block, "no results" block, or cards.

use reqwest::Url;
use serde::Serialize;

use crate::cache::VisitId;
use crate::filters::{ALL, Choice};
use crate::lookup::{self, Badge};
use crate::models::{
    Alert, Contact, GuideDetail, GuideSummary, Id, NewsItem, Organization, PointType, Severity,
    SupplyNeed, SupportPoint, VolunteerOpportunity,
};
use crate::output::{format_date, format_time};
use crate::view::{HelpState, HelpTab, Selector, Visible};

/// Navigation entries: (route, label).
const NAV: [(&str, &str); 6] = [
    ("/", "Início"),
    ("/alerts", "Alertas"),
    ("/news", "Notícias"),
    ("/support-map", "Mapa de Apoio"),
    ("/how-to-help", "Como Ajudar"),
    ("/preparedness", "Preparo"),
];

/// Emergency phone numbers: (number, service).
const EMERGENCY_NUMBERS: [(&str, &str); 4] = [
    ("193", "Bombeiros"),
    ("192", "SAMU"),
    ("190", "Polícia"),
    ("199", "Defesa Civil"),
];

/// How a support point list is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    List,
    Map,
}

impl ViewMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::List => "list",
            Self::Map => "map",
        }
    }

    /// Anything but `map` falls back to the list.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        if s.eq_ignore_ascii_case("map") { Self::Map } else { Self::List }
    }
}

/// Escape text for use in HTML content and attribute values.
#[must_use]
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Serialize data for an inline `<script>` without letting it close the tag.
fn script_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value)
        .unwrap_or_else(|_| "[]".into())
        .replace('<', "\\u003c")
}

/// Build a link to `path` with its query string.
///
/// Empty values and the `all` sentinel are left out, so an inactive filter
/// never shows up in a URL.
#[must_use]
pub fn href(path: &str, params: &[(&str, &str)]) -> String {
    let pairs: Vec<(&str, &str)> = params
        .iter()
        .copied()
        .filter(|(_, v)| !v.is_empty() && *v != ALL)
        .collect();
    if pairs.is_empty() {
        return path.to_string();
    }
    match Url::parse_with_params("http://localhost/", &pairs) {
        Ok(url) => format!("{path}?{}", url.query().unwrap_or_default()),
        Err(_) => path.to_string(),
    }
}

/// External map search for an address.
#[must_use]
pub fn map_search_url(address: &str) -> String {
    Url::parse_with_params(
        "https://www.google.com/maps/search/",
        &[("api", "1"), ("query", address)],
    )
    .map_or_else(|_| String::new(), String::from)
}

fn badge_html(badge: &Badge<'_>) -> String {
    format!(
        r#"<span class="badge {}">{}</span>"#,
        badge.tone.css_class(),
        html_escape(&badge.label)
    )
}

fn outline_badges(values: &[String]) -> String {
    values
        .iter()
        .map(|v| format!(r#"<span class="badge badge-outline">{}</span>"#, html_escape(v)))
        .collect::<Vec<_>>()
        .join("")
}

fn contact_link(contact: &Contact, label: &str) -> String {
    format!(
        r#"<a class="btn btn-outline" href="{}">{}</a>"#,
        html_escape(&contact.href()),
        html_escape(label)
    )
}

// ============================================================================
// Layout
// ============================================================================

fn header(active: &str) -> String {
    let links: String = NAV
        .iter()
        .map(|(route, label)| {
            let is_active = if *route == "/" {
                active == "/"
            } else {
                active.starts_with(route)
            };
            let class = if is_active { "nav-link active" } else { "nav-link" };
            format!(r#"<a class="{class}" href="{route}">{label}</a>"#)
        })
        .collect();

    format!(
        r#"<header class="header">
    <div class="container header-inner">
        <a class="logo" href="/"><span class="logo-sos">SOS</span> <span class="logo-crise">CRISE</span></a>
        <nav class="nav">{links}</nav>
    </div>
</header>"#
    )
}

fn footer() -> String {
    let numbers: String = EMERGENCY_NUMBERS
        .iter()
        .map(|(number, service)| format!("<p><strong>{service}:</strong> {number}</p>"))
        .collect();

    format!(
        r#"<footer class="footer">
    <div class="container footer-grid">
        <div>
            <p class="logo"><span class="logo-sos">SOS</span> <span class="logo-crise">CRISE</span></p>
            <p>Conectando pessoas em situações de emergência com recursos essenciais e oportunidades de ajuda mútua no Brasil.</p>
        </div>
        <div>
            <h3>Links Rápidos</h3>
            <ul>
                <li><a href="/alerts">Alertas</a></li>
                <li><a href="/support-map">Mapa de Apoio</a></li>
                <li><a href="/how-to-help">Como Ajudar</a></li>
                <li><a href="/preparedness">Guias de Preparo</a></li>
            </ul>
        </div>
        <div>
            <h3>Emergências</h3>
            {numbers}
        </div>
    </div>
    <p class="copyright">© 2024 SOS Crise. Todos os direitos reservados.</p>
</footer>"#
    )
}

/// Wrap page content with the document head, header and footer.
#[must_use]
pub fn layout(title: &str, active: &str, content: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="pt-BR">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title} — SOS Crise</title>
    <script src="https://unpkg.com/htmx.org@1.9.10"></script>
    <link rel="stylesheet" href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css" />
    <script src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js"></script>
    <script src="https://cdn.jsdelivr.net/npm/marked@12.0.2/marked.min.js"></script>
    <script src="https://cdn.jsdelivr.net/npm/dompurify@3.1.6/dist/purify.min.js"></script>
    <style>{STYLES}</style>
</head>
<body>
    {header}
    <main class="container main">
{content}
    </main>
    {footer}
</body>
</html>
"#,
        title = html_escape(title),
        header = header(active),
        footer = footer(),
    )
}

fn page_heading(icon: &str, title: &str, subtitle: &str) -> String {
    format!(
        r#"<div class="page-heading">
    <h1>{icon} {title}</h1>
    <p>{subtitle}</p>
</div>"#
    )
}

// ============================================================================
// States
// ============================================================================

/// Section that fetches its own content once the page has loaded.
#[must_use]
pub fn placeholder(id: &str, fragment_url: &str) -> String {
    format!(
        r#"<div id="{id}" class="results" hx-get="{url}" hx-trigger="load" hx-swap="innerHTML">{loading}</div>"#,
        url = html_escape(fragment_url),
        loading = loading_state(),
    )
}

/// Skeleton shown while a request is in flight.
#[must_use]
pub fn loading_state() -> String {
    r#"<div class="loading" aria-busy="true">
    <div class="skeleton"></div>
    <div class="skeleton"></div>
    <div class="skeleton"></div>
</div>"#
        .to_string()
}

/// Block replacing a list or detail whose fetch failed.
#[must_use]
pub fn error_state(message: &str) -> String {
    format!(
        r#"<div class="error-state" role="alert">
    <p class="error-title">Erro ao carregar</p>
    <p>{}</p>
</div>"#,
        html_escape(message)
    )
}

/// Block shown when a filter leaves nothing to display.
#[must_use]
pub fn empty_state(icon: &str, title: &str) -> String {
    format!(
        r#"<div class="empty-state">
    <div class="empty-icon">{icon}</div>
    <h3>{title}</h3>
    <p>Tente ajustar os filtros de busca.</p>
</div>"#
    )
}

fn render_visible<T>(
    visible: &Visible<'_, T>,
    empty: impl FnOnce() -> String,
    cards: impl FnOnce(&[&T]) -> String,
) -> String {
    match visible {
        Visible::Loading => loading_state(),
        Visible::Failed(message) => error_state(message),
        Visible::Empty => empty(),
        Visible::Items(items) => cards(items.as_slice()),
    }
}

// ============================================================================
// Home
// ============================================================================

/// Landing page.
#[must_use]
pub fn home_page() -> String {
    let quick = [
        ("/alerts", "⚠️", "Alertas", "Situações de emergência em andamento"),
        ("/support-map", "📍", "Mapa de Apoio", "Abrigos, hospitais e pontos de coleta"),
        ("/how-to-help", "❤️", "Como Ajudar", "Doações e voluntariado"),
        ("/preparedness", "📘", "Preparo", "Guias para se proteger"),
    ];
    let quick_cards: String = quick
        .iter()
        .map(|(route, icon, title, desc)| {
            format!(
                r#"<a class="card quick-card" href="{route}"><div class="quick-icon">{icon}</div><h3>{title}</h3><p>{desc}</p></a>"#
            )
        })
        .collect();

    let content = format!(
        r#"<section class="hero">
    <h1><span class="logo-sos">SOS</span> Crise</h1>
    <p>Plataforma digital para informações críticas, doações e conectar voluntários durante eventos extremos e crises no Brasil.</p>
    <div class="hero-actions">
        <a class="btn btn-primary" href="/alerts">⚠️ Ver Alertas</a>
        <a class="btn btn-outline" href="/support-map">📍 Mapa de Apoio</a>
    </div>
</section>
<section>
    <div class="section-header">
        <h2>Alertas Recentes</h2>
        <a class="btn btn-outline" href="/alerts">Ver Todos</a>
    </div>
    {latest}
</section>
<section>
    <h2>Acesso Rápido</h2>
    <div class="grid">{quick_cards}</div>
</section>
<section class="card about">
    <h2>Sobre o SOS Crise</h2>
    <p>O SOS Crise é uma plataforma digital criada para conectar pessoas em situações de emergência com recursos essenciais, informações verificadas e oportunidades de ajuda mútua. Nossa missão é facilitar o acesso a informações críticas e coordenar esforços de solidariedade durante crises e eventos extremos no Brasil.</p>
</section>"#,
        latest = placeholder("latest-alerts", "/fragments/latest-alerts"),
    );

    layout("Início", "/", &content)
}

/// The few most recent alerts shown on the landing page.
#[must_use]
pub fn latest_alerts_fragment(visible: &Visible<'_, Alert>, count: usize) -> String {
    render_visible(
        visible,
        || empty_state("⚠️", "Nenhum alerta no momento"),
        |alerts| {
            alerts
                .iter()
                .take(count)
                .map(|alert| {
                    format!(
                        r#"<a class="card alert-card" href="{link}">
    <div class="card-title-row"><h3>{title}</h3>{badge}</div>
    <p class="card-meta">{location} • {date}</p>
    <p>{description}</p>
</a>"#,
                        link = html_escape(&href("/alerts", &[("selected", alert.id.to_string().as_str())])),
                        title = html_escape(&alert.title),
                        badge = badge_html(&lookup::severity_badge(&alert.severity)),
                        location = html_escape(&alert.location),
                        date = format_date(alert.date),
                        description = html_escape(&alert.description),
                    )
                })
                .collect()
        },
    )
}

// ============================================================================
// Alerts
// ============================================================================

fn severity_options(current: &Choice<Severity>) -> String {
    let mut options = format!(
        r#"<option value="all"{}>Todos os níveis</option>"#,
        if current.is_all() { " selected" } else { "" }
    );
    for severity in Severity::known() {
        let selected = if current.admits(&severity) && !current.is_all() {
            " selected"
        } else {
            ""
        };
        options.push_str(&format!(
            r#"<option value="{}"{selected}>{}</option>"#,
            severity.as_str(),
            lookup::severity_option_label(&severity)
        ));
    }
    options
}

/// Hidden field carrying the open alert. Fragments replace it out of band
/// so filtering keeps the current selection.
fn selected_input(selected: Option<Id>, out_of_band: bool) -> String {
    format!(
        r#"<input type="hidden" id="alerts-selected" name="selected" value="{}"{}>"#,
        selected.map(|id| id.to_string()).unwrap_or_default(),
        if out_of_band { r#" hx-swap-oob="true""# } else { "" }
    )
}

/// Alerts page shell.
#[must_use]
pub fn alerts_page(
    q: &str,
    severity: &Choice<Severity>,
    selected: Option<Id>,
    visit: VisitId,
) -> String {
    let severity_param = severity.to_string();
    let selected_param = selected.map(|id| id.to_string()).unwrap_or_default();
    let visit_param = visit.to_string();
    let fragment = href(
        "/fragments/alerts",
        &[
            ("q", q),
            ("severity", severity_param.as_str()),
            ("selected", selected_param.as_str()),
            ("visit", visit_param.as_str()),
        ],
    );

    let content = format!(
        r##"{heading}
<form class="filters card" action="/alerts" method="get"
      hx-get="/fragments/alerts" hx-target="#alerts-results" hx-trigger="input, change, submit">
    <input type="search" name="q" value="{q}" placeholder="Buscar por localização ou tipo de alerta..." autocomplete="off">
    <select name="severity">{options}</select>
    {selected}
    <input type="hidden" name="visit" value="{visit}">
</form>
{results}"##,
        heading = page_heading(
            "⚠️",
            "Alertas de Emergência",
            "Acompanhe situações de emergência e alertas em tempo real no Brasil."
        ),
        q = html_escape(q),
        options = severity_options(severity),
        selected = selected_input(selected, false),
        results = placeholder("alerts-results", &fragment),
    );

    layout("Alertas", "/alerts", &content)
}

/// Alert cards; the selected one shows its recommendations.
///
/// Toggle links stay within `visit`, so opening an alert re-renders the
/// cached list.
#[must_use]
pub fn alerts_fragment(
    visible: &Visible<'_, Alert>,
    q: &str,
    severity: &Choice<Severity>,
    selector: Selector<Id>,
    visit: Option<VisitId>,
) -> String {
    let severity_param = severity.to_string();
    let visit_param = visit.map(|id| id.to_string()).unwrap_or_default();
    let cards = render_visible(
        visible,
        || empty_state("⚠️", "Nenhum alerta encontrado"),
        |alerts| {
            alerts
                .iter()
                .map(|alert| {
                    let next = selector.toggled(alert.id).map(|id| id.to_string()).unwrap_or_default();
                    let params = [("q", q), ("severity", severity_param.as_str()), ("selected", next.as_str())];
                    let in_visit = [
                        ("q", q),
                        ("severity", severity_param.as_str()),
                        ("selected", next.as_str()),
                        ("visit", visit_param.as_str()),
                    ];
                    let is_open = selector.is_selected(alert.id);

                    let details = if is_open {
                        let items: String = alert
                            .recommendations
                            .iter()
                            .map(|r| format!("<li>{}</li>", html_escape(r)))
                            .collect();
                        format!(
                            r#"<div class="details"><h4>Recomendações:</h4><ul>{items}</ul></div>"#
                        )
                    } else {
                        String::new()
                    };

                    format!(
                        r##"<article class="card alert-card" id="alert-{id}">
    <div class="card-title-row"><h3>⚠️ {title}</h3>{badge}</div>
    <p class="card-meta">{location} • {date} às {time} • Fonte: {source}</p>
    <p>{description}</p>
    {details}
    <a class="btn btn-outline btn-sm" href="{page}" hx-get="{fragment}" hx-target="#alerts-results">{toggle}</a>
</article>"##,
                        id = alert.id,
                        title = html_escape(&alert.title),
                        badge = badge_html(&lookup::severity_badge(&alert.severity)),
                        location = html_escape(&alert.location),
                        date = format_date(alert.date),
                        time = format_time(alert.time),
                        source = html_escape(&alert.source),
                        description = html_escape(&alert.description),
                        page = html_escape(&href("/alerts", &params)),
                        fragment = html_escape(&href("/fragments/alerts", &in_visit)),
                        toggle = if is_open { "Ocultar detalhes" } else { "Ver detalhes" },
                    )
                })
                .collect()
        },
    );
    format!("{}{cards}", selected_input(selector.selected(), true))
}

// ============================================================================
// News
// ============================================================================

/// News page shell.
#[must_use]
pub fn news_page(q: &str, visit: VisitId) -> String {
    let visit_param = visit.to_string();
    let content = format!(
        r##"{heading}
<form class="filters card" action="/news" method="get"
      hx-get="/fragments/news" hx-target="#news-results" hx-trigger="input, submit">
    <input type="search" name="q" value="{q_attr}" placeholder="Buscar notícias..." autocomplete="off">
    <input type="hidden" name="visit" value="{visit}">
</form>
{results}"##,
        heading = page_heading(
            "📰",
            "Notícias",
            "Informações verificadas sobre crises, prevenção e ações de ajuda."
        ),
        q_attr = html_escape(q),
        results = placeholder(
            "news-results",
            &href("/fragments/news", &[("q", q), ("visit", visit_param.as_str())])
        ),
    );

    layout("Notícias", "/news", &content)
}

/// News cards.
#[must_use]
pub fn news_fragment(visible: &Visible<'_, NewsItem>) -> String {
    render_visible(
        visible,
        || empty_state("📰", "Nenhuma notícia encontrada"),
        |items| {
            items
                .iter()
                .map(|news| {
                    let verified = if news.verified {
                        r#"<span class="badge badge-outline tone-green">✓ Verificado</span>"#
                    } else {
                        ""
                    };
                    let link = if news.url.is_empty() {
                        String::new()
                    } else {
                        format!(
                            r#"<a class="btn btn-outline btn-sm" href="{}" target="_blank" rel="noopener">Ler mais</a>"#,
                            html_escape(&news.url)
                        )
                    };
                    format!(
                        r#"<article class="card">
    <div class="badges">{category}{verified}</div>
    <h3>{title}</h3>
    <p class="card-meta">{date} • {source}</p>
    <p>{summary}</p>
    {link}
</article>"#,
                        category = badge_html(&lookup::news_category_badge(&news.category)),
                        title = html_escape(&news.title),
                        date = format_date(news.date),
                        source = html_escape(&news.source),
                        summary = html_escape(&news.summary),
                    )
                })
                .collect()
        },
    )
}

// ============================================================================
// Support map
// ============================================================================

fn point_type_options(current: &Choice<PointType>) -> String {
    let mut options = format!(
        r#"<option value="all"{}>Todos os tipos</option>"#,
        if current.is_all() { " selected" } else { "" }
    );
    for kind in PointType::known() {
        let selected = if !current.is_all() && current.admits(&kind) {
            " selected"
        } else {
            ""
        };
        options.push_str(&format!(
            r#"<option value="{}"{selected}>{}</option>"#,
            kind.as_str(),
            lookup::point_type_option_label(&kind)
        ));
    }
    options
}

/// Support map page shell.
#[must_use]
pub fn support_map_page(
    q: &str,
    kind: &Choice<PointType>,
    mode: ViewMode,
    visit: VisitId,
) -> String {
    let kind_param = kind.to_string();
    let visit_param = visit.to_string();
    let fragment = href(
        "/fragments/support-points",
        &[
            ("q", q),
            ("type", kind_param.as_str()),
            ("view", mode.as_str()),
            ("visit", visit_param.as_str()),
        ],
    );
    let toggle = |target: ViewMode, label: &str| {
        let class = if target == mode { "btn btn-primary btn-sm" } else { "btn btn-outline btn-sm" };
        format!(
            r#"<a class="{class}" href="{}">{label}</a>"#,
            html_escape(&href(
                "/support-map",
                &[("q", q), ("type", kind_param.as_str()), ("view", target.as_str())]
            ))
        )
    };

    let content = format!(
        r##"{heading}
<div class="filters card">
    <form action="/support-map" method="get"
          hx-get="/fragments/support-points" hx-target="#support-results" hx-trigger="input, change, submit">
        <input type="search" name="q" value="{q_attr}" placeholder="Buscar por nome ou endereço..." autocomplete="off">
        <select name="type">{options}</select>
        <input type="hidden" name="view" value="{view}">
        <input type="hidden" name="visit" value="{visit}">
    </form>
    <div class="view-toggle">{list_btn}{map_btn}</div>
</div>
{results}"##,
        heading = page_heading(
            "📍",
            "Mapa de Apoio",
            "Encontre abrigos, pontos de coleta, hospitais e locais de distribuição de ajuda."
        ),
        q_attr = html_escape(q),
        options = point_type_options(kind),
        view = mode.as_str(),
        list_btn = toggle(ViewMode::List, "☰ Lista"),
        map_btn = toggle(ViewMode::Map, "📍 Mapa"),
        results = placeholder("support-results", &fragment),
    );

    layout("Mapa de Apoio", "/support-map", &content)
}

fn support_point_card(point: &SupportPoint) -> String {
    let kind = lookup::point_type_badge(&point.kind);
    let status = lookup::point_status_badge(&point.status);

    let services = if point.services.is_empty() {
        String::new()
    } else {
        format!(
            r#"<div><h4>Serviços oferecidos:</h4><div class="badges">{}</div></div>"#,
            outline_badges(&point.services)
        )
    };
    let needed = if point.needed_items().is_empty() {
        String::new()
    } else {
        format!(
            r#"<div><h4>Itens necessários:</h4><div class="badges">{}</div></div>"#,
            outline_badges(point.needed_items())
        )
    };
    let capacity = point
        .capacity
        .as_deref()
        .map(|c| format!(r#"<p><strong>Capacidade:</strong> {}</p>"#, html_escape(c)))
        .unwrap_or_default();
    let phone = point
        .phone
        .as_deref()
        .and_then(Contact::parse)
        .map(|c| contact_link(&c, &format!("📞 Ligar: {}", c.as_str())))
        .unwrap_or_default();
    let directions = if point.address.is_empty() {
        String::new()
    } else {
        format!(
            r#"<a class="btn btn-outline btn-sm" href="{}" target="_blank" rel="noopener">🧭 Como chegar</a>"#,
            html_escape(&map_search_url(&point.address))
        )
    };

    format!(
        r#"<article class="card">
    <div class="card-title-row"><div class="badges"><span class="icon">{icon}</span>{kind}</div>{status}</div>
    <h3>{name}</h3>
    <p class="card-meta">{address} • {hours}</p>
    {services}{needed}{capacity}
    <div class="actions">{directions}{phone}</div>
</article>"#,
        icon = lookup::point_type_icon(&point.kind),
        kind = badge_html(&kind),
        status = badge_html(&status),
        name = html_escape(&point.name),
        address = html_escape(&point.address),
        hours = html_escape(&point.hours),
    )
}

#[derive(Serialize)]
struct Marker<'a> {
    lat: f64,
    lon: f64,
    name: &'a str,
    label: String,
    address: &'a str,
    color: &'static str,
}

const fn marker_color(tone: lookup::Tone) -> &'static str {
    match tone {
        lookup::Tone::Red => "#ef4444",
        lookup::Tone::Orange => "#f97316",
        lookup::Tone::Yellow => "#eab308",
        lookup::Tone::Blue => "#3b82f6",
        lookup::Tone::Green => "#22c55e",
        lookup::Tone::Emerald => "#10b981",
        lookup::Tone::Purple => "#a855f7",
        lookup::Tone::Gray => "#6b7280",
    }
}

fn support_map_canvas(points: &[&SupportPoint]) -> String {
    let markers: Vec<Marker<'_>> = points
        .iter()
        .filter_map(|point| {
            let (lat, lon) = point.coordinates()?;
            let badge = lookup::point_type_badge(&point.kind);
            Some(Marker {
                lat,
                lon,
                name: &point.name,
                label: badge.label.into_owned(),
                address: &point.address,
                color: marker_color(badge.tone),
            })
        })
        .collect();

    format!(
        r#"<div id="support-map-canvas" class="map-canvas"></div>
<script>
(function() {{
  var el = document.getElementById('support-map-canvas');
  if (!el || el._leaflet_id) return;
  var markers = {markers};
  var map = L.map(el);
  L.tileLayer('https://{{s}}.tile.openstreetmap.org/{{z}}/{{x}}/{{y}}.png', {{
    attribution: '&copy; OpenStreetMap contributors',
    maxZoom: 18
  }}).addTo(map);
  var bounds = [];
  markers.forEach(function(m) {{
    var popup = document.createElement('div');
    var title = document.createElement('strong');
    title.textContent = m.name;
    popup.appendChild(title);
    popup.appendChild(document.createElement('br'));
    popup.appendChild(document.createTextNode(m.label + ' • ' + m.address));
    L.circleMarker([m.lat, m.lon], {{
      radius: 8, fillColor: m.color, color: '#fff', weight: 2, fillOpacity: 0.9
    }}).bindPopup(popup).addTo(map);
    bounds.push([m.lat, m.lon]);
  }});
  if (bounds.length) {{ map.fitBounds(bounds, {{ padding: [30, 30], maxZoom: 14 }}); }}
  else {{ map.setView([-15.78, -47.93], 4); }}
}})();
</script>"#,
        markers = script_json(&markers),
    )
}

/// Support points as cards or on a map.
///
/// The map only receives points with both coordinates; the caller filters
/// with `mappable_only` so the empty state covers "nothing to plot".
#[must_use]
pub fn support_points_fragment(visible: &Visible<'_, SupportPoint>, mode: ViewMode) -> String {
    render_visible(
        visible,
        || empty_state("📍", "Nenhum local encontrado"),
        |points| match mode {
            ViewMode::List => points.iter().map(|p| support_point_card(p)).collect(),
            ViewMode::Map => support_map_canvas(points),
        },
    )
}

// ============================================================================
// How to help
// ============================================================================

fn help_search_form(
    state: &HelpState,
    tab: HelpTab,
    visit: VisitId,
    target: &str,
    fragment: &str,
    placeholder_text: &str,
) -> String {
    if !tab.searchable() {
        return String::new();
    }
    let q = if state.tab == tab { state.query.as_str() } else { "" };
    format!(
        r##"<form class="filters card" action="/how-to-help" method="get"
      hx-get="{fragment}" hx-target="#{target}" hx-trigger="input, submit">
    <input type="hidden" name="tab" value="{tab}">
    <input type="hidden" name="visit" value="{visit}">
    <input type="search" name="q" value="{q}" placeholder="{placeholder_text}" autocomplete="off">
</form>"##,
        tab = tab.as_str(),
        q = html_escape(q),
    )
}

/// "How to help" page shell.
///
/// All three sections are rendered so their fetches run side by side; only
/// the active tab is visible. Tab links drop the search text.
#[must_use]
pub fn how_to_help_page(state: &HelpState, visit: VisitId) -> String {
    let visit_param = visit.to_string();
    let tabs: String = HelpTab::ALL
        .iter()
        .map(|&tab| {
            let next = state.switched(tab);
            let class = if tab == state.tab { "tab active" } else { "tab" };
            format!(
                r#"<a class="{class}" href="{}">{}</a>"#,
                html_escape(&href(
                    "/how-to-help",
                    &[("tab", next.tab.as_str()), ("q", next.query.as_str())]
                )),
                tab.label()
            )
        })
        .collect();

    let hidden = |tab: HelpTab| if tab == state.tab { "" } else { " hidden" };
    let query_for = |tab: HelpTab| if tab == state.tab { state.query.as_str() } else { "" };

    let content = format!(
        r#"{heading}
<nav class="tabs">{tabs}</nav>
<section class="tab-panel"{donations_hidden}>
    <h2>Doações Monetárias</h2>
    <p>As doações em dinheiro são extremamente eficazes pois permitem que as organizações comprem exatamente o que é necessário no momento e local adequados.</p>
    {organizations}
</section>
<section class="tab-panel"{supplies_hidden}>
    <h2>Doação de Suprimentos</h2>
    <p>Conecte-se diretamente com organizações que precisam de itens específicos.</p>
    {supplies_form}
    {supplies}
</section>
<section class="tab-panel"{volunteer_hidden}>
    <h2>Oportunidades de Voluntariado</h2>
    <p>Doe seu tempo e habilidades para ajudar diretamente as comunidades afetadas.</p>
    {volunteer_form}
    {volunteer}
</section>"#,
        heading = page_heading(
            "❤️",
            "Como Ajudar",
            "Descubra formas de contribuir: doações, suprimentos e voluntariado."
        ),
        donations_hidden = hidden(HelpTab::Donations),
        supplies_hidden = hidden(HelpTab::Supplies),
        volunteer_hidden = hidden(HelpTab::Volunteer),
        organizations = placeholder("organizations-results", "/fragments/organizations"),
        supplies_form = help_search_form(
            state,
            HelpTab::Supplies,
            visit,
            "supplies-results",
            "/fragments/supply-needs",
            "Buscar por organização, item ou localização..."
        ),
        supplies = placeholder(
            "supplies-results",
            &href(
                "/fragments/supply-needs",
                &[("q", query_for(HelpTab::Supplies)), ("visit", visit_param.as_str())]
            )
        ),
        volunteer_form = help_search_form(
            state,
            HelpTab::Volunteer,
            visit,
            "volunteer-results",
            "/fragments/volunteer-opportunities",
            "Buscar por área de atuação, organização ou localização..."
        ),
        volunteer = placeholder(
            "volunteer-results",
            &href(
                "/fragments/volunteer-opportunities",
                &[("q", query_for(HelpTab::Volunteer)), ("visit", visit_param.as_str())]
            )
        ),
    );

    layout("Como Ajudar", "/how-to-help", &content)
}

/// NGO cards.
#[must_use]
pub fn organizations_fragment(visible: &Visible<'_, Organization>) -> String {
    render_visible(
        visible,
        || empty_state("❤️", "Nenhuma organização encontrada"),
        |ngos| {
            let cards: String = ngos
                .iter()
                .map(|ngo| {
                    let verified = if ngo.verified {
                        r#"<span class="badge badge-outline tone-green">✓ Verificado</span>"#
                    } else {
                        ""
                    };
                    let donate = if ngo.website.is_empty() {
                        String::new()
                    } else {
                        format!(
                            r#"<a class="btn btn-primary" href="{}" target="_blank" rel="noopener">Doar Agora</a>"#,
                            html_escape(&ngo.website)
                        )
                    };
                    format!(
                        r#"<article class="card">
    <div class="card-title-row"><h3>{name}</h3>{verified}</div>
    <p class="card-meta">{focus}</p>
    <p>{description}</p>
    {donate}
</article>"#,
                        name = html_escape(&ngo.name),
                        focus = html_escape(&ngo.focus),
                        description = html_escape(&ngo.description),
                    )
                })
                .collect();
            format!(r#"<div class="grid">{cards}</div>"#)
        },
    )
}

/// Supply need cards.
#[must_use]
pub fn supply_needs_fragment(visible: &Visible<'_, SupplyNeed>) -> String {
    render_visible(
        visible,
        || empty_state("📦", "Nenhuma necessidade encontrada"),
        |needs| {
            needs
                .iter()
                .map(|need| {
                    let contact = Contact::parse(&need.contact);
                    let contact_text = contact
                        .as_ref()
                        .map(|c| html_escape(c.as_str()))
                        .unwrap_or_default();
                    let contact_btn = contact
                        .as_ref()
                        .map(|c| contact_link(c, "Entrar em Contato"))
                        .unwrap_or_default();
                    format!(
                        r#"<article class="card">
    <div class="card-title-row"><h3>{organization}</h3>{badge}</div>
    <p class="card-meta">📍 {location} • {contact_text}</p>
    <h4>Itens necessários:</h4>
    <div class="badges">{items}</div>
    <p class="card-meta">🕒 {delivery}</p>
    {contact_btn}
</article>"#,
                        organization = html_escape(&need.organization),
                        badge = badge_html(&lookup::urgency_badge(&need.urgency)),
                        location = html_escape(&need.location),
                        items = outline_badges(&need.items),
                        delivery = html_escape(&need.delivery_info),
                    )
                })
                .collect()
        },
    )
}

/// Volunteer opportunity cards.
#[must_use]
pub fn volunteer_fragment(visible: &Visible<'_, VolunteerOpportunity>) -> String {
    render_visible(
        visible,
        || empty_state("🤝", "Nenhuma oportunidade encontrada"),
        |opportunities| {
            opportunities
                .iter()
                .map(|op| {
                    let urgent = if op.urgent {
                        r#"<span class="badge tone-red">URGENTE</span>"#
                    } else {
                        ""
                    };
                    let requirements: String = op
                        .requirements
                        .iter()
                        .map(|r| format!("<li>{}</li>", html_escape(r)))
                        .collect();
                    let apply = Contact::parse(&op.contact)
                        .map(|c| contact_link(&c, &format!("Candidatar-se: {}", c.as_str())))
                        .unwrap_or_default();
                    format!(
                        r#"<article class="card">
    <div class="card-title-row"><h3>{role}</h3>{urgent}</div>
    <p class="card-meta">{organization} • {location}</p>
    <p>{description}</p>
    <h4>Requisitos:</h4>
    <ul>{requirements}</ul>
    <p class="card-meta">🕒 {commitment}</p>
    {apply}
</article>"#,
                        role = html_escape(&op.role),
                        organization = html_escape(&op.organization),
                        location = html_escape(&op.location),
                        description = html_escape(&op.description),
                        commitment = html_escape(&op.time_commitment),
                    )
                })
                .collect()
        },
    )
}

// ============================================================================
// Preparedness
// ============================================================================

fn emergency_numbers_panel() -> String {
    let numbers: String = EMERGENCY_NUMBERS
        .iter()
        .map(|(number, service)| {
            format!(
                r#"<div class="emergency-number"><div class="number">{number}</div><div>{service}</div></div>"#
            )
        })
        .collect();
    format!(
        r#"<section class="card emergency">
    <h2>Números de Emergência</h2>
    <div class="grid">{numbers}</div>
</section>"#
    )
}

/// Preparedness page shell: the guide list, or one opened guide.
#[must_use]
pub fn preparedness_page(guide: Option<Id>) -> String {
    let content = match guide {
        None => format!(
            "{heading}\n{list}\n{numbers}",
            heading = page_heading(
                "📘",
                "Guias de Preparação",
                "Aprenda como se preparar para emergências e proteger sua família durante situações de crise."
            ),
            list = placeholder("guides-results", "/fragments/guides"),
            numbers = emergency_numbers_panel(),
        ),
        Some(id) => format!(
            r#"<a class="btn btn-outline" href="/preparedness">← Voltar aos guias</a>
<div class="card guide-detail">
    {detail}
    <div class="tip">
        <h3>💡 Dica Importante</h3>
        <p>Pratique regularmente os procedimentos descritos neste guia e mantenha seus suprimentos de emergência atualizados.</p>
    </div>
</div>"#,
            detail = placeholder("guide-detail", &format!("/fragments/guides/{id}")),
        ),
    };

    layout("Preparo", "/preparedness", &content)
}

/// Guide summary cards.
#[must_use]
pub fn guides_fragment(visible: &Visible<'_, GuideSummary>, selector: Selector<Id>) -> String {
    render_visible(
        visible,
        || empty_state("📘", "Nenhum guia disponível"),
        |guides| {
            let cards: String = guides
                .iter()
                .map(|guide| {
                    let target = selector
                        .toggled(guide.id)
                        .map(|id| id.to_string())
                        .unwrap_or_default();
                    format!(
                        r#"<article class="card">
    <div class="badges">{category}{difficulty}</div>
    <h3>{title}</h3>
    <p class="card-meta">Tempo estimado: {time}</p>
    <p>{description}</p>
    <a class="btn btn-primary" href="{link}">Ler Guia</a>
</article>"#,
                        category = badge_html(&lookup::guide_category_badge(&guide.category)),
                        difficulty = badge_html(&lookup::difficulty_badge(&guide.difficulty)),
                        title = html_escape(&guide.title),
                        time = html_escape(&guide.estimated_time),
                        description = html_escape(&guide.description),
                        link = html_escape(&href("/preparedness", &[("guide", target.as_str())])),
                    )
                })
                .collect();
            format!(r#"<div class="grid">{cards}</div>"#)
        },
    )
}

/// An opened guide; the markdown body is rendered in the browser.
///
/// The body is escaped text until the browser turns it into markup, and
/// that markup goes through DOMPurify first. Without both libraries the
/// guide stays plain text.
#[must_use]
pub fn guide_detail_fragment(guide: &GuideDetail) -> String {
    let summary = &guide.summary;
    format!(
        r#"<div class="badges">{category}{difficulty}<span class="badge badge-outline">{time}</span></div>
<h1>{title}</h1>
<p class="lead">{description}</p>
<div class="markdown" data-markdown>{body}</div>
<script>
document.querySelectorAll('[data-markdown]').forEach(function(el) {{
  if (!window.marked || !window.DOMPurify) return;
  el.innerHTML = DOMPurify.sanitize(marked.parse(el.textContent));
  el.removeAttribute('data-markdown');
}});
</script>"#,
        category = badge_html(&lookup::guide_category_badge(&summary.category)),
        difficulty = badge_html(&lookup::difficulty_badge(&summary.difficulty)),
        time = html_escape(&summary.estimated_time),
        title = html_escape(&summary.title),
        description = html_escape(&summary.description),
        body = html_escape(&guide.content_md),
    )
}

// ============================================================================
// Not found
// ============================================================================

/// Catch-all page for unknown routes.
#[must_use]
pub fn not_found_page(path: &str) -> String {
    let content = format!(
        r#"<div class="empty-state">
    <div class="empty-icon">404</div>
    <h3>Página não encontrada</h3>
    <p>O endereço <code>{}</code> não existe.</p>
    <a class="btn btn-primary" href="/">Voltar ao início</a>
</div>"#,
        html_escape(path)
    );
    layout("Página não encontrada", path, &content)
}

// ============================================================================
// Stylesheet (embedded for single-binary deployment)
// ============================================================================

const STYLES: &str = r#"
:root {
    --font: 'Inter', -apple-system, BlinkMacSystemFont, sans-serif;
    --bg: #f9fafb; --surface: #ffffff; --text: #1f2937; --muted: #6b7280;
    --border: #e5e7eb; --accent: #dc2626; --accent-hover: #b91c1c;
    --radius: 10px; --shadow: 0 1px 3px rgba(0,0,0,0.08);
}
* { box-sizing: border-box; }
body { margin: 0; font-family: var(--font); background: var(--bg); color: var(--text); }
a { color: inherit; }
.container { max-width: 1100px; margin: 0 auto; padding: 0 16px; }
.main { padding-top: 32px; padding-bottom: 48px; }
.header { background: var(--surface); border-bottom: 1px solid var(--border); }
.header-inner { display: flex; align-items: center; justify-content: space-between; height: 64px; }
.logo { font-weight: 800; font-size: 20px; text-decoration: none; }
.logo-sos { color: var(--accent); }
.nav { display: flex; gap: 4px; flex-wrap: wrap; }
.nav-link { padding: 8px 12px; border-radius: 8px; text-decoration: none; color: var(--muted); font-weight: 500; }
.nav-link.active, .nav-link:hover { background: #fee2e2; color: var(--accent); }
.page-heading h1 { margin: 0 0 8px; font-size: 30px; }
.page-heading p { color: var(--muted); margin: 0 0 24px; }
.hero { text-align: center; margin-bottom: 48px; }
.hero h1 { font-size: 56px; margin: 0 0 16px; }
.hero p { font-size: 20px; color: var(--muted); max-width: 720px; margin: 0 auto 24px; }
.hero-actions { display: flex; gap: 12px; justify-content: center; flex-wrap: wrap; }
.section-header { display: flex; justify-content: space-between; align-items: center; }
.card { background: var(--surface); border: 1px solid var(--border); border-radius: var(--radius); box-shadow: var(--shadow); padding: 20px; margin-bottom: 16px; display: block; text-decoration: none; }
.alert-card { border-left: 4px solid var(--accent); }
.card h3 { margin: 0 0 8px; }
.card-title-row { display: flex; justify-content: space-between; align-items: flex-start; gap: 12px; }
.card-meta { color: var(--muted); font-size: 14px; }
.grid { display: grid; gap: 16px; grid-template-columns: repeat(auto-fill, minmax(240px, 1fr)); }
.quick-icon { font-size: 32px; }
.filters { display: flex; gap: 12px; flex-wrap: wrap; align-items: center; }
.filters form { display: flex; gap: 12px; flex: 1; flex-wrap: wrap; }
.filters input[type=search] { flex: 1; min-width: 220px; padding: 10px 12px; border: 1px solid var(--border); border-radius: 8px; font-size: 15px; }
.filters select { padding: 10px 12px; border: 1px solid var(--border); border-radius: 8px; background: var(--surface); }
.view-toggle { display: flex; gap: 8px; }
.btn { display: inline-block; padding: 10px 16px; border-radius: 8px; font-weight: 600; text-decoration: none; border: 1px solid transparent; cursor: pointer; margin-top: 8px; }
.btn-sm { padding: 6px 12px; font-size: 14px; }
.btn-primary { background: var(--accent); color: #fff; }
.btn-primary:hover { background: var(--accent-hover); }
.btn-outline { border-color: var(--border); background: var(--surface); }
.actions { display: flex; gap: 8px; flex-wrap: wrap; }
.badges { display: flex; gap: 6px; flex-wrap: wrap; align-items: center; margin-bottom: 8px; }
.badge { display: inline-block; padding: 2px 10px; border-radius: 9999px; font-size: 12px; font-weight: 700; white-space: nowrap; }
.badge-outline { border: 1px solid var(--border); font-weight: 500; }
.tone-red { background: #ef4444; color: #fff; }
.tone-orange { background: #f97316; color: #fff; }
.tone-yellow { background: #eab308; color: #000; }
.tone-blue { background: #3b82f6; color: #fff; }
.tone-green { background: #22c55e; color: #fff; }
.tone-emerald { background: #d1fae5; color: #065f46; }
.tone-purple { background: #ede9fe; color: #5b21b6; }
.tone-gray { background: #6b7280; color: #fff; }
.badge-outline.tone-green { background: transparent; color: #15803d; border-color: #86efac; }
.details { border-top: 1px solid var(--border); margin-top: 16px; padding-top: 16px; }
.tabs { display: grid; grid-template-columns: repeat(3, 1fr); background: #f3f4f6; border-radius: 8px; padding: 4px; margin-bottom: 24px; }
.tab { text-align: center; padding: 8px; border-radius: 6px; text-decoration: none; color: var(--muted); font-weight: 600; }
.tab.active { background: var(--surface); color: var(--text); box-shadow: var(--shadow); }
.loading .skeleton { height: 96px; border-radius: var(--radius); background: linear-gradient(90deg, #f3f4f6, #e5e7eb, #f3f4f6); margin-bottom: 16px; animation: pulse 1.2s infinite; }
@keyframes pulse { 50% { opacity: 0.5; } }
.empty-state { text-align: center; padding: 48px 0; color: var(--muted); }
.empty-icon { font-size: 40px; margin-bottom: 12px; }
.error-state { border: 1px solid #fecaca; background: #fef2f2; color: #991b1b; border-radius: var(--radius); padding: 20px; }
.error-title { font-weight: 700; margin: 0 0 4px; }
.map-canvas { height: 520px; border-radius: var(--radius); border: 1px solid var(--border); }
.guide-detail { margin-top: 16px; }
.markdown { line-height: 1.6; white-space: pre-wrap; }
.markdown:not([data-markdown]) { white-space: normal; }
.tip { margin-top: 32px; padding: 16px; background: #eff6ff; border-radius: 8px; color: #1e3a8a; }
.emergency-number { text-align: center; }
.emergency-number .number { font-size: 28px; font-weight: 800; color: var(--accent); }
.footer { background: #1f2937; color: #d1d5db; padding: 40px 0 16px; }
.footer-grid { display: grid; gap: 24px; grid-template-columns: repeat(auto-fit, minmax(220px, 1fr)); }
.footer a { color: #d1d5db; }
.footer h3 { color: #fff; }
.copyright { text-align: center; font-size: 13px; color: #9ca3af; border-top: 1px solid #374151; padding-top: 16px; margin-top: 24px; }
"#;

#[cfg(test)]
mod tests {
    use super::*;

    fn alert(id: u32, title: &str) -> Alert {
        Alert {
            id,
            title: title.into(),
            severity: Severity::Critical,
            date: None,
            time: None,
            description: String::new(),
            location: "Porto Alegre, RS".into(),
            source: String::new(),
            recommendations: vec!["Procure abrigo".into()],
        }
    }

    #[test]
    fn test_html_escape() {
        assert_eq!(
            html_escape(r#"<script>alert("x")</script> & 'y'"#),
            "&lt;script&gt;alert(&quot;x&quot;)&lt;/script&gt; &amp; &#39;y&#39;"
        );
    }

    #[test]
    fn test_href_skips_inactive_params() {
        assert_eq!(href("/alerts", &[("q", ""), ("severity", "all")]), "/alerts");
        assert_eq!(
            href("/alerts", &[("q", "porto alegre"), ("severity", "high")]),
            "/alerts?q=porto+alegre&severity=high"
        );
        assert_eq!(href("/news", &[("q", "água & luz")]), "/news?q=%C3%A1gua+%26+luz");
    }

    #[test]
    fn test_map_search_url() {
        let url = map_search_url("Rua das Flores, 123");
        assert!(url.starts_with("https://www.google.com/maps/search/?api=1&query=Rua+das+Flores"));
    }

    #[test]
    fn test_alert_toggle_links() {
        let a = alert(1, "Enchente");
        let b = alert(2, "Seca");
        let visible = Visible::Items(vec![&a, &b]);
        let html = alerts_fragment(&visible, "", &Choice::All, Selector::new(Some(1)), Some(7));

        // The open alert shows its recommendations and links back to closed
        assert!(html.contains("Procure abrigo"));
        assert!(html.contains("Ocultar detalhes"));
        assert!(html.contains(r#"href="/alerts""#));
        assert!(html.contains(r#"hx-get="/fragments/alerts?visit=7""#));
        // The other alert links to itself
        assert!(html.contains(r#"href="/alerts?selected=2""#));
        assert!(html.contains(r#"hx-get="/fragments/alerts?selected=2&amp;visit=7""#));
        assert_eq!(html.matches("Recomendações").count(), 1);
    }

    #[test]
    fn test_alerts_form_keeps_selection() {
        let html = alerts_page("", &Choice::All, Some(4), 7);
        assert!(html.contains(r#"<input type="hidden" id="alerts-selected" name="selected" value="4">"#));
        assert!(html.contains(r#"<input type="hidden" name="visit" value="7">"#));

        // Every fragment refreshes the form's copy of the selection
        let a = alert(4, "Enchente");
        let open = alerts_fragment(&Visible::Items(vec![&a]), "", &Choice::All, Selector::new(Some(4)), Some(7));
        assert!(open.contains(r#"id="alerts-selected" name="selected" value="4" hx-swap-oob="true""#));

        let hidden: Visible<'_, Alert> = Visible::Empty;
        let html = alerts_fragment(&hidden, "seca", &Choice::All, Selector::new(Some(4)), Some(7));
        assert!(html.contains(r#"value="4" hx-swap-oob="true""#));

        let closed = alerts_fragment(&Visible::Items(vec![&a]), "", &Choice::All, Selector::default(), Some(7));
        assert!(closed.contains(r#"name="selected" value="" hx-swap-oob="true""#));
    }

    #[test]
    fn test_fragment_states() {
        let failed: Visible<'_, Alert> = Visible::Failed(crate::errors::USER_MESSAGE);
        let html = alerts_fragment(&failed, "", &Choice::All, Selector::default(), None);
        assert!(html.contains("error-state"));
        assert!(html.contains(crate::errors::USER_MESSAGE));

        let empty: Visible<'_, Alert> = Visible::Empty;
        let html = alerts_fragment(&empty, "xyz", &Choice::All, Selector::default(), None);
        assert!(html.contains("Nenhum alerta encontrado"));
        assert!(!html.contains("error-state"));
    }

    #[test]
    fn test_api_text_is_escaped() {
        let a = alert(1, "<img src=x onerror=alert(1)>");
        let visible = Visible::Items(vec![&a]);
        let html = alerts_fragment(&visible, "", &Choice::All, Selector::default(), None);
        assert!(!html.contains("<img"));
        assert!(html.contains("&lt;img"));
    }

    #[test]
    fn test_pages_keep_filters_rendered() {
        let html = alerts_page("porto", &Choice::Only(Severity::High), None, 7);
        assert!(html.contains(r#"value="porto""#));
        assert!(html.contains(r#"<option value="high" selected>"#));
        assert!(html.contains(r#"hx-get="/fragments/alerts?q=porto&amp;severity=high&amp;visit=7""#));

        let html = news_page("chuva", 8);
        assert!(html.contains(r#"hx-get="/fragments/news?q=chuva&amp;visit=8""#));
        assert!(html.contains(r#"<input type="hidden" name="visit" value="8">"#));

        let html = support_map_page("", &Choice::All, ViewMode::Map, 9);
        assert!(html.contains(r#"hx-get="/fragments/support-points?view=map&amp;visit=9""#));
        assert!(html.contains(r#"<input type="hidden" name="visit" value="9">"#));
    }

    #[test]
    fn test_help_tabs_drop_query() {
        let state = HelpState {
            tab: HelpTab::Supplies,
            query: "água".into(),
        };
        let html = how_to_help_page(&state, 7);
        assert!(html.contains(r#"href="/how-to-help?tab=volunteer""#));
        assert!(html.contains(r#"href="/how-to-help?tab=supplies&amp;q=%C3%A1gua""#));
        // Every section fetches on its own
        assert!(html.contains(r#"hx-get="/fragments/organizations""#));
        assert!(html.contains(r#"hx-get="/fragments/supply-needs?q=%C3%A1gua&amp;visit=7""#));
        assert!(html.contains(r#"hx-get="/fragments/volunteer-opportunities?visit=7""#));
    }

    #[test]
    fn test_map_only_plots_points_with_coordinates() {
        let json = r#"[
            {"id": 1, "name": "Ginásio", "type": "shelter", "latitude": -30.03, "longitude": -51.23},
            {"id": 2, "name": "Hospital", "type": "hospital"}
        ]"#;
        let points: Vec<SupportPoint> = serde_json::from_str(json).unwrap();
        let refs: Vec<&SupportPoint> = points.iter().collect();
        let html = support_points_fragment(&Visible::Items(refs), ViewMode::Map);
        assert!(html.contains("Ginásio"));
        assert!(!html.contains("Hospital\""));
        assert!(html.contains("L.circleMarker"));
    }

    #[test]
    fn test_script_json_cannot_close_tag() {
        let out = script_json(&vec!["</script>"]);
        assert!(!out.contains("</script>"));
    }

    #[test]
    fn test_guide_links_open_guide() {
        let guide = GuideSummary {
            id: 3,
            title: "Kit de emergência".into(),
            category: crate::models::GuideCategory::Preparation,
            difficulty: crate::models::Difficulty::Basic,
            estimated_time: "15 min".into(),
            description: String::new(),
        };
        let html = guides_fragment(&Visible::Items(vec![&guide]), Selector::default());
        assert!(html.contains(r#"href="/preparedness?guide=3""#));
        assert!(html.contains("tone-blue"));
    }

    #[test]
    fn test_guide_markup_is_sanitized() {
        let guide = GuideDetail {
            summary: GuideSummary {
                id: 5,
                title: "Evacuação".into(),
                category: crate::models::GuideCategory::Emergency,
                difficulty: crate::models::Difficulty::Basic,
                estimated_time: "10 min".into(),
                description: String::new(),
            },
            content_md: "# Rotas\n<img src=x onerror=alert(1)><script>alert(2)</script>".into(),
        };
        let html = guide_detail_fragment(&guide);

        assert!(!html.contains("<img"));
        assert!(!html.contains("<script>alert"));
        assert!(html.contains("&lt;img src=x onerror=alert(1)&gt;"));
        // Parsed markdown never reaches the page without sanitizing
        assert!(html.contains("el.innerHTML = DOMPurify.sanitize(marked.parse(el.textContent));"));
        assert_eq!(html.matches("innerHTML").count(), 1);
        assert!(layout("Preparo", "/preparedness", "").contains("purify.min.js"));
    }

    #[test]
    fn test_view_mode_parse() {
        assert_eq!(ViewMode::parse("MAP"), ViewMode::Map);
        assert_eq!(ViewMode::parse("grid"), ViewMode::List);
    }
}
