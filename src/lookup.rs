//! Presentation lookup tables.
//!
//! One canonical table per enumeration, shared by the terminal output and
//! the web UI. Every table is total: values outside the known set get a
//! defined fallback badge.

use std::borrow::Cow;

use tracing::debug;

use crate::models::{Difficulty, GuideCategory, PointStatus, PointType, Severity, Urgency};

/// Color family of a badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Red,
    Orange,
    Yellow,
    Blue,
    Green,
    Emerald,
    Purple,
    Gray,
}

impl Tone {
    /// CSS class used by the web UI.
    #[must_use]
    pub const fn css_class(self) -> &'static str {
        match self {
            Self::Red => "tone-red",
            Self::Orange => "tone-orange",
            Self::Yellow => "tone-yellow",
            Self::Blue => "tone-blue",
            Self::Green => "tone-green",
            Self::Emerald => "tone-emerald",
            Self::Purple => "tone-purple",
            Self::Gray => "tone-gray",
        }
    }

    /// ANSI color code used by terminal output.
    #[must_use]
    pub const fn ansi(self) -> &'static str {
        match self {
            Self::Red => "\x1b[91m",
            Self::Orange => "\x1b[38;5;208m",
            Self::Yellow => "\x1b[93m",
            Self::Blue => "\x1b[94m",
            Self::Green => "\x1b[92m",
            Self::Emerald => "\x1b[32m",
            Self::Purple => "\x1b[95m",
            Self::Gray => "\x1b[37m",
        }
    }
}

/// A label plus the tone it is drawn in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Badge<'a> {
    pub label: Cow<'a, str>,
    pub tone: Tone,
}

impl Badge<'static> {
    const fn fixed(label: &'static str, tone: Tone) -> Self {
        Self {
            label: Cow::Borrowed(label),
            tone,
        }
    }
}

impl<'a> Badge<'a> {
    fn text(label: &'a str, tone: Tone) -> Self {
        Self {
            label: Cow::Borrowed(label),
            tone,
        }
    }
}

/// Alert severity badge. Unknown levels show as BAIXO in gray.
#[must_use]
pub fn severity_badge(severity: &Severity) -> Badge<'static> {
    match severity {
        Severity::Critical => Badge::fixed("CRÍTICO", Tone::Red),
        Severity::High => Badge::fixed("ALTO", Tone::Orange),
        Severity::Medium => Badge::fixed("MÉDIO", Tone::Yellow),
        Severity::Low => Badge::fixed("BAIXO", Tone::Blue),
        Severity::Other(raw) => {
            debug!(severity = %raw, "unrecognised severity, showing fallback badge");
            Badge::fixed("BAIXO", Tone::Gray)
        }
    }
}

/// Human label for a severity choice in filter controls.
#[must_use]
pub fn severity_option_label(severity: &Severity) -> &'static str {
    match severity {
        Severity::Critical => "Crítico",
        Severity::High => "Alto",
        Severity::Medium => "Médio",
        Severity::Low => "Baixo",
        Severity::Other(_) => "Outro",
    }
}

/// Supply need urgency badge. Anything below medium reads as BAIXA.
#[must_use]
pub fn urgency_badge(urgency: &Urgency) -> Badge<'static> {
    match urgency {
        Urgency::Urgent => Badge::fixed("URGENTE", Tone::Red),
        Urgency::High => Badge::fixed("ALTA", Tone::Orange),
        Urgency::Medium => Badge::fixed("MÉDIA", Tone::Yellow),
        Urgency::Low => Badge::fixed("BAIXA", Tone::Green),
        Urgency::Other(raw) => {
            debug!(urgency = %raw, "unrecognised urgency, showing fallback badge");
            Badge::fixed("BAIXA", Tone::Green)
        }
    }
}

/// Support point kind badge.
#[must_use]
pub fn point_type_badge(kind: &PointType) -> Badge<'static> {
    match kind {
        PointType::Shelter => Badge::fixed("Abrigo", Tone::Blue),
        PointType::Hospital => Badge::fixed("Hospital", Tone::Red),
        PointType::DonationCollection => Badge::fixed("Coleta de Doações", Tone::Green),
        PointType::AidDistribution => Badge::fixed("Distribuição", Tone::Purple),
        PointType::HealthClinic => Badge::fixed("Posto de Saúde", Tone::Orange),
        PointType::Other(_) => Badge::fixed("Outro", Tone::Gray),
    }
}

/// Icon shown next to a support point kind.
#[must_use]
pub fn point_type_icon(kind: &PointType) -> &'static str {
    match kind {
        PointType::Shelter => "🏠",
        PointType::Hospital | PointType::HealthClinic => "🏥",
        PointType::DonationCollection => "📦",
        PointType::AidDistribution => "🤝",
        PointType::Other(_) => "📍",
    }
}

/// Plural label for a support point kind in filter controls.
#[must_use]
pub fn point_type_option_label(kind: &PointType) -> &'static str {
    match kind {
        PointType::Shelter => "Abrigos",
        PointType::Hospital => "Hospitais",
        PointType::DonationCollection => "Coleta de Doações",
        PointType::AidDistribution => "Distribuição",
        PointType::HealthClinic => "Postos de Saúde",
        PointType::Other(_) => "Outros",
    }
}

/// Support point availability badge.
#[must_use]
pub fn point_status_badge(status: &PointStatus) -> Badge<'static> {
    match status {
        PointStatus::Available => Badge::fixed("Disponível", Tone::Green),
        PointStatus::Urgent => Badge::fixed("Urgente", Tone::Red),
        PointStatus::Full => Badge::fixed("Lotado", Tone::Yellow),
        PointStatus::Other(_) => Badge::fixed("Indisponível", Tone::Gray),
    }
}

/// News category badge; the label is the category itself.
#[must_use]
pub fn news_category_badge(category: &str) -> Badge<'_> {
    let tone = match category {
        "Tecnologia" => Tone::Blue,
        "Doações" => Tone::Green,
        "Meio Ambiente" => Tone::Emerald,
        "Prevenção" => Tone::Purple,
        _ => Tone::Gray,
    };
    Badge::text(category, tone)
}

/// Preparedness guide category badge.
#[must_use]
pub fn guide_category_badge(category: &GuideCategory) -> Badge<'_> {
    let tone = match category {
        GuideCategory::Preparation => Tone::Blue,
        GuideCategory::Emergency => Tone::Red,
        GuideCategory::Prevention => Tone::Purple,
        GuideCategory::Other(_) => Tone::Gray,
    };
    Badge::text(category.as_str(), tone)
}

/// Preparedness guide difficulty badge.
#[must_use]
pub fn difficulty_badge(difficulty: &Difficulty) -> Badge<'_> {
    let tone = match difficulty {
        Difficulty::Basic => Tone::Green,
        Difficulty::Intermediate => Tone::Yellow,
        Difficulty::Advanced => Tone::Red,
        Difficulty::Other(_) => Tone::Gray,
    };
    Badge::text(difficulty.as_str(), tone)
}
