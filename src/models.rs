//! Data models for SOS Crise API responses.
//!
//! Every record is an immutable snapshot owned by the API. Most attributes
//! may be missing or `null` in the JSON; absent strings and lists decode as
//! empty, the genuinely optional ones stay `Option`.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize};

/// Record identifier, unique within its collection.
pub type Id = u32;

/// Decode `null` the same way as a missing field.
fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Verification flags default to `true` on the API side.
fn nullable_verified<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(true))
}

const fn verified_default() -> bool {
    true
}

/// Declares a closed set of text values plus an `Other` catch-all.
///
/// Parsing is total and case-insensitive, so a value the API invents later
/// still decodes and keeps its original text.
macro_rules! text_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $($(#[$vmeta:meta])* $variant:ident => $text:literal,)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Deserialize, Serialize)]
        #[serde(from = "Option<String>", into = "String")]
        pub enum $name {
            $($(#[$vmeta])* $variant,)+
            /// Any value outside the known set (including a missing one)
            Other(String),
        }

        impl $name {
            /// Every known value, in display order.
            ///
            /// Only the enums offered as filter choices list their values.
            #[allow(dead_code)]
            #[must_use]
            pub fn known() -> Vec<Self> {
                vec![$(Self::$variant),+]
            }

            /// Parse a value, falling back to [`Self::Other`].
            #[must_use]
            pub fn parse(s: &str) -> Self {
                let lower = s.trim().to_lowercase();
                $(
                    if lower == $text.to_lowercase() {
                        return Self::$variant;
                    }
                )+
                Self::Other(s.trim().to_string())
            }

            /// The wire text for this value.
            #[must_use]
            pub fn as_str(&self) -> &str {
                match self {
                    $(Self::$variant => $text,)+
                    Self::Other(s) => s,
                }
            }
        }

        impl PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                match (self, other) {
                    (Self::Other(a), Self::Other(b)) => a.to_lowercase() == b.to_lowercase(),
                    _ => std::mem::discriminant(self) == std::mem::discriminant(other),
                }
            }
        }

        impl Eq for $name {}

        impl Default for $name {
            fn default() -> Self {
                Self::Other(String::new())
            }
        }

        impl From<Option<String>> for $name {
            fn from(value: Option<String>) -> Self {
                Self::parse(value.as_deref().unwrap_or_default())
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                match value {
                    $name::Other(s) => s,
                    known => known.as_str().to_string(),
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = std::convert::Infallible;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self::parse(s))
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

text_enum! {
    /// How serious an alert is.
    Severity {
        Critical => "critical",
        High => "high",
        Medium => "medium",
        Low => "low",
    }
}

text_enum! {
    /// How urgently a supply need must be met.
    Urgency {
        Urgent => "urgent",
        High => "high",
        Medium => "medium",
        Low => "low",
    }
}

text_enum! {
    /// Kind of support location.
    PointType {
        Shelter => "shelter",
        Hospital => "hospital",
        DonationCollection => "donation_collection",
        AidDistribution => "aid_distribution",
        HealthClinic => "health_clinic",
    }
}

text_enum! {
    /// Whether a support location can take people or donations right now.
    PointStatus {
        Available => "available",
        Urgent => "urgent",
        Full => "full",
    }
}

text_enum! {
    /// Theme of a preparedness guide.
    GuideCategory {
        Preparation => "Preparação",
        Emergency => "Emergência",
        Prevention => "Prevenção",
    }
}

text_enum! {
    /// Reading level of a preparedness guide.
    Difficulty {
        Basic => "Básico",
        Intermediate => "Intermediário",
        Advanced => "Avançado",
    }
}

/// An emergency alert.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Alert {
    pub id: Id,
    pub title: String,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub time: Option<NaiveTime>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: String,
    #[serde(default, deserialize_with = "nullable")]
    pub location: String,
    #[serde(default, deserialize_with = "nullable")]
    pub source: String,
    /// What people in the affected area should do, in order
    #[serde(default, deserialize_with = "nullable")]
    pub recommendations: Vec<String>,
}

/// A news article about an ongoing crisis.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct NewsItem {
    pub id: Id,
    pub title: String,
    #[serde(default, deserialize_with = "nullable")]
    pub summary: String,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "nullable")]
    pub source: String,
    /// Free text; a handful of well-known values get their own badge color
    #[serde(default, deserialize_with = "nullable")]
    pub category: String,
    #[serde(default = "verified_default", deserialize_with = "nullable_verified")]
    pub verified: bool,
    #[serde(default, deserialize_with = "nullable")]
    pub url: String,
}

/// An NGO accepting monetary donations.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Organization {
    pub id: Id,
    pub name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub description: String,
    #[serde(default, deserialize_with = "nullable")]
    pub focus: String,
    #[serde(default, deserialize_with = "nullable")]
    pub website: String,
    #[serde(default = "verified_default", deserialize_with = "nullable_verified")]
    pub verified: bool,
}

/// Items an organization needs donated.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SupplyNeed {
    pub id: Id,
    pub organization: String,
    pub items: Vec<String>,
    #[serde(default)]
    pub urgency: Urgency,
    #[serde(default, deserialize_with = "nullable")]
    pub location: String,
    #[serde(default, deserialize_with = "nullable")]
    pub contact: String,
    #[serde(default, deserialize_with = "nullable")]
    pub delivery_info: String,
}

/// A call for volunteers.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct VolunteerOpportunity {
    pub id: Id,
    pub organization: String,
    pub role: String,
    #[serde(default, deserialize_with = "nullable")]
    pub description: String,
    #[serde(default, deserialize_with = "nullable")]
    pub requirements: Vec<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub location: String,
    #[serde(default, deserialize_with = "nullable")]
    pub time_commitment: String,
    #[serde(default, deserialize_with = "nullable")]
    pub contact: String,
    #[serde(default, deserialize_with = "nullable")]
    pub urgent: bool,
}

/// A physical place offering help: shelter, hospital, collection point...
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SupportPoint {
    pub id: Id,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: PointType,
    #[serde(default, deserialize_with = "nullable")]
    pub address: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub services: Vec<String>,
    #[serde(default)]
    pub capacity: Option<String>,
    #[serde(default)]
    pub status: PointStatus,
    #[serde(default, deserialize_with = "nullable")]
    pub hours: String,
    #[serde(default)]
    pub needed_items: Option<Vec<String>>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

impl SupportPoint {
    /// `(latitude, longitude)` when both are known.
    #[must_use]
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        Some((self.latitude?, self.longitude?))
    }

    /// Needed items, if the point asked for any.
    #[must_use]
    pub fn needed_items(&self) -> &[String] {
        self.needed_items.as_deref().unwrap_or_default()
    }
}

/// List entry for a preparedness guide.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct GuideSummary {
    pub id: Id,
    pub title: String,
    #[serde(default)]
    pub category: GuideCategory,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default, deserialize_with = "nullable")]
    pub estimated_time: String,
    #[serde(default, deserialize_with = "nullable")]
    pub description: String,
}

/// A full preparedness guide, fetched only once it is opened.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct GuideDetail {
    #[serde(flatten)]
    pub summary: GuideSummary,
    /// Markdown body
    pub content_md: String,
}

/// How to reach whoever posted a need or an opportunity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Contact {
    Email(String),
    Phone(String),
}

impl Contact {
    /// Classify a contact string: anything with an `@` is an email.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            None
        } else if raw.contains('@') {
            Some(Self::Email(raw.to_string()))
        } else {
            Some(Self::Phone(raw.to_string()))
        }
    }

    /// Link target for this contact (`mailto:` or `tel:`).
    #[must_use]
    pub fn href(&self) -> String {
        match self {
            Self::Email(address) => format!("mailto:{address}"),
            Self::Phone(number) => {
                let dialable: String = number
                    .chars()
                    .filter(|c| c.is_ascii_digit() || *c == '+')
                    .collect();
                format!("tel:{dialable}")
            }
        }
    }

    /// The contact as written by the API.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Email(s) | Self::Phone(s) => s,
        }
    }
}
