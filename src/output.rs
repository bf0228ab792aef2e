//! Output formatters for SOS Crise records.
//!
//! Supports human-readable (with colors), JSON, and NDJSON formats.

use std::io::{self, Write};

use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;

use crate::lookup::{self, Badge};
use crate::models::{
    Alert, Contact, GuideDetail, GuideSummary, NewsItem, Organization, SupplyNeed, SupportPoint,
    VolunteerOpportunity,
};
use crate::view::Visible;

// ANSI color codes
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";

// Icons for visual richness
const ICON_ALERT: &str = "⚠️";
const ICON_NEWS: &str = "📰";
const ICON_HEART: &str = "❤️";
const ICON_BOX: &str = "📦";
const ICON_HANDS: &str = "🤝";
const ICON_BOOK: &str = "📘";
const ICON_VERIFIED: &str = "✓";

/// Shown when a filter leaves nothing to display.
pub const NO_RESULTS: &str = "Nenhum resultado encontrado. Tente ajustar os filtros de busca.";

/// Output format selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    /// Human-readable terminal output (default)
    #[default]
    Human,
    /// JSON array
    Json,
    /// Newline-delimited JSON (one object per line)
    Ndjson,
}

impl std::str::FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "human" => Ok(Self::Human),
            "json" => Ok(Self::Json),
            "ndjson" => Ok(Self::Ndjson),
            _ => Err(format!("unknown format: {s} (expected: human, json, ndjson)")),
        }
    }
}

/// Format a date the way Brazilians read it.
#[must_use]
pub fn format_date(date: Option<NaiveDate>) -> String {
    date.map_or_else(String::new, |d| d.format("%d/%m/%Y").to_string())
}

/// Format a time as `HH:MM`.
#[must_use]
pub fn format_time(time: Option<NaiveTime>) -> String {
    time.map_or_else(String::new, |t| t.format("%H:%M").to_string())
}

fn badge(b: &Badge<'_>) -> String {
    format!("{}{BOLD}{}{RESET}", b.tone.ansi(), b.label)
}

/// A record with a terminal rendering.
pub trait HumanRecord: Serialize {
    /// Write this record as one block of human-readable lines.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write_human<W: Write>(&self, writer: &mut W) -> io::Result<()>;
}

impl HumanRecord for Alert {
    fn write_human<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let severity = lookup::severity_badge(&self.severity);
        writeln!(
            writer,
            "{ICON_ALERT} {} │ {BOLD}{}{RESET} {DIM}#{}{RESET}",
            badge(&severity),
            self.title,
            self.id
        )?;
        writeln!(
            writer,
            "   {DIM}{} • {} às {} • Fonte: {}{RESET}",
            self.location,
            format_date(self.date),
            format_time(self.time),
            self.source
        )?;
        if !self.description.is_empty() {
            writeln!(writer, "   {}", self.description)?;
        }
        Ok(())
    }
}

impl HumanRecord for NewsItem {
    fn write_human<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let category = lookup::news_category_badge(&self.category);
        let verified = if self.verified {
            format!(" {}{ICON_VERIFIED} Verificado{RESET}", lookup::Tone::Green.ansi())
        } else {
            String::new()
        };
        writeln!(
            writer,
            "{ICON_NEWS} {} │ {BOLD}{}{RESET}{verified}",
            badge(&category),
            self.title
        )?;
        writeln!(
            writer,
            "   {DIM}{} • {}{RESET}",
            format_date(self.date),
            self.source
        )?;
        if !self.summary.is_empty() {
            writeln!(writer, "   {}", self.summary)?;
        }
        if !self.url.is_empty() {
            writeln!(writer, "   {DIM}{}{RESET}", self.url)?;
        }
        Ok(())
    }
}

impl HumanRecord for Organization {
    fn write_human<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let verified = if self.verified {
            format!(" {}{ICON_VERIFIED} Verificado{RESET}", lookup::Tone::Green.ansi())
        } else {
            String::new()
        };
        writeln!(writer, "{ICON_HEART} {BOLD}{}{RESET}{verified}", self.name)?;
        if !self.focus.is_empty() {
            writeln!(writer, "   {DIM}{}{RESET}", self.focus)?;
        }
        if !self.description.is_empty() {
            writeln!(writer, "   {}", self.description)?;
        }
        if !self.website.is_empty() {
            writeln!(writer, "   Doar agora: {}", self.website)?;
        }
        Ok(())
    }
}

impl HumanRecord for SupplyNeed {
    fn write_human<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let urgency = lookup::urgency_badge(&self.urgency);
        writeln!(
            writer,
            "{ICON_BOX} {} │ {BOLD}{}{RESET} {DIM}• {}{RESET}",
            badge(&urgency),
            self.organization,
            self.location
        )?;
        writeln!(writer, "   Itens necessários: {}", self.items.join(", "))?;
        if !self.delivery_info.is_empty() {
            writeln!(writer, "   {DIM}{}{RESET}", self.delivery_info)?;
        }
        if let Some(contact) = Contact::parse(&self.contact) {
            writeln!(writer, "   Contato: {}", contact.as_str())?;
        }
        Ok(())
    }
}

impl HumanRecord for VolunteerOpportunity {
    fn write_human<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let urgent = if self.urgent {
            format!(" {}{BOLD}URGENTE{RESET}", lookup::Tone::Red.ansi())
        } else {
            String::new()
        };
        writeln!(writer, "{ICON_HANDS} {BOLD}{}{RESET}{urgent}", self.role)?;
        writeln!(
            writer,
            "   {DIM}{} • {} • {}{RESET}",
            self.organization, self.location, self.time_commitment
        )?;
        if !self.description.is_empty() {
            writeln!(writer, "   {}", self.description)?;
        }
        for requirement in &self.requirements {
            writeln!(writer, "   - {requirement}")?;
        }
        if let Some(contact) = Contact::parse(&self.contact) {
            writeln!(writer, "   Candidatar-se: {}", contact.as_str())?;
        }
        Ok(())
    }
}

impl HumanRecord for SupportPoint {
    fn write_human<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let kind = lookup::point_type_badge(&self.kind);
        let status = lookup::point_status_badge(&self.status);
        writeln!(
            writer,
            "{} {} │ {} │ {BOLD}{}{RESET}",
            lookup::point_type_icon(&self.kind),
            badge(&kind),
            badge(&status),
            self.name
        )?;
        writeln!(writer, "   {DIM}{} • {}{RESET}", self.address, self.hours)?;
        if !self.services.is_empty() {
            writeln!(writer, "   Serviços: {}", self.services.join(", "))?;
        }
        if !self.needed_items().is_empty() {
            writeln!(writer, "   Itens necessários: {}", self.needed_items().join(", "))?;
        }
        if let Some(capacity) = &self.capacity {
            writeln!(writer, "   Capacidade: {capacity}")?;
        }
        if let Some(phone) = &self.phone {
            writeln!(writer, "   Ligar: {phone}")?;
        }
        if let Some((lat, lon)) = self.coordinates() {
            writeln!(writer, "   {DIM}⊕ {lat:.4}, {lon:.4}{RESET}")?;
        }
        Ok(())
    }
}

impl HumanRecord for GuideSummary {
    fn write_human<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let category = lookup::guide_category_badge(&self.category);
        let difficulty = lookup::difficulty_badge(&self.difficulty);
        writeln!(
            writer,
            "{ICON_BOOK} {} {} │ {BOLD}{}{RESET} {DIM}#{}{RESET}",
            badge(&category),
            badge(&difficulty),
            self.title,
            self.id
        )?;
        if !self.estimated_time.is_empty() {
            writeln!(writer, "   {DIM}Tempo estimado: {}{RESET}", self.estimated_time)?;
        }
        if !self.description.is_empty() {
            writeln!(writer, "   {}", self.description)?;
        }
        Ok(())
    }
}

impl HumanRecord for GuideDetail {
    fn write_human<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        self.summary.write_human(writer)?;
        writeln!(writer)?;
        writeln!(writer, "{}", self.content_md)
    }
}

/// Write the recommendations of an opened alert.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_recommendations<W: Write>(writer: &mut W, alert: &Alert) -> io::Result<()> {
    writeln!(writer, "   {BOLD}Recomendações:{RESET}")?;
    for recommendation in &alert.recommendations {
        writeln!(writer, "   • {recommendation}")?;
    }
    Ok(())
}

/// Write records in human-readable format with rich colors.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_human<W: Write, T: HumanRecord>(writer: &mut W, records: &[&T]) -> io::Result<()> {
    for record in records {
        record.write_human(writer)?;
    }
    Ok(())
}

/// Write records as a JSON array.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_json<W: Write, T: Serialize>(writer: &mut W, records: &[&T]) -> io::Result<()> {
    let json = serde_json::to_string_pretty(records)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(writer, "{json}")
}

/// Write records as newline-delimited JSON.
///
/// Each record is written as a single line of JSON.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_ndjson<W: Write, T: Serialize>(writer: &mut W, records: &[&T]) -> io::Result<()> {
    for record in records {
        let json = serde_json::to_string(record)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        writeln!(writer, "{json}")?;
    }
    Ok(())
}

/// Write records in the specified format.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_records<W: Write, T: HumanRecord>(
    writer: &mut W,
    records: &[&T],
    format: Format,
) -> io::Result<()> {
    match format {
        Format::Human => write_human(writer, records),
        Format::Json => write_json(writer, records),
        Format::Ndjson => write_ndjson(writer, records),
    }
}

/// Write whatever a list view currently shows.
///
/// An empty result is not an error: humans get [`NO_RESULTS`], machine
/// formats get an empty document.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_visible<W: Write, T: HumanRecord>(
    writer: &mut W,
    visible: &Visible<'_, T>,
    format: Format,
) -> io::Result<()> {
    match visible {
        Visible::Loading => Ok(()),
        Visible::Failed(message) => writeln!(writer, "{message}"),
        Visible::Empty => match format {
            Format::Human => writeln!(writer, "{DIM}{NO_RESULTS}{RESET}"),
            Format::Json => writeln!(writer, "[]"),
            Format::Ndjson => Ok(()),
        },
        Visible::Items(items) => write_records(writer, items, format),
    }
}
