//! Record filtering logic.
//!
//! Free-text search is a case-insensitive substring match ORed across the
//! searchable fields of a record. Categorical filters are exact matches with
//! an `all` sentinel. Every active criterion must pass.

use std::convert::Infallible;
use std::fmt;

use crate::models::{
    Alert, GuideSummary, NewsItem, Organization, PointType, Severity, SupplyNeed, SupportPoint,
    VolunteerOpportunity,
};

/// Sentinel that disables a categorical filter.
pub const ALL: &str = "all";

/// Records that can be matched against a free-text query.
pub trait Searchable {
    /// The fields a query is matched against.
    fn search_fields(&self) -> Vec<&str>;
}

impl Searchable for Alert {
    fn search_fields(&self) -> Vec<&str> {
        vec![self.title.as_str(), self.location.as_str()]
    }
}

impl Searchable for NewsItem {
    fn search_fields(&self) -> Vec<&str> {
        vec![self.title.as_str(), self.summary.as_str(), self.category.as_str()]
    }
}

impl Searchable for SupplyNeed {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = Vec::with_capacity(self.items.len() + 2);
        fields.push(self.organization.as_str());
        fields.extend(self.items.iter().map(String::as_str));
        fields.push(self.location.as_str());
        fields
    }
}

impl Searchable for VolunteerOpportunity {
    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.role.as_str(),
            self.organization.as_str(),
            self.location.as_str(),
        ]
    }
}

impl Searchable for SupportPoint {
    fn search_fields(&self) -> Vec<&str> {
        vec![self.name.as_str(), self.address.as_str()]
    }
}

/// A free-text query, lowercased once up front.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextQuery {
    raw: String,
    needle: String,
}

impl TextQuery {
    #[must_use]
    pub fn new(raw: &str) -> Self {
        Self {
            raw: raw.to_string(),
            needle: raw.to_lowercase(),
        }
    }

    /// The query as typed.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.needle.is_empty()
    }

    /// Check if any searchable field of `item` contains the query.
    #[must_use]
    pub fn matches<T: Searchable>(&self, item: &T) -> bool {
        if self.is_empty() {
            return true;
        }
        item.search_fields()
            .iter()
            .any(|field| field.to_lowercase().contains(&self.needle))
    }
}

/// A categorical filter: either everything, or one exact value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Choice<T> {
    #[default]
    All,
    Only(T),
}

impl<T: PartialEq> Choice<T> {
    /// Check if `value` passes this filter.
    #[must_use]
    pub fn admits(&self, value: &T) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => wanted == value,
        }
    }

    #[must_use]
    pub const fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }
}

impl<T> std::str::FromStr for Choice<T>
where
    T: std::str::FromStr<Err = Infallible>,
{
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case(ALL) {
            return Ok(Self::All);
        }
        Ok(Self::Only(s.parse()?))
    }
}

impl<T: fmt::Display> fmt::Display for Choice<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str(ALL),
            Self::Only(value) => value.fmt(f),
        }
    }
}

/// A predicate deciding which records of a collection are visible.
pub trait ItemFilter<T> {
    fn matches(&self, item: &T) -> bool;
}

/// Produce the visible subset of `items`, keeping their order.
#[must_use]
pub fn apply<'a, T, F>(items: &'a [T], filter: &F) -> Vec<&'a T>
where
    F: ItemFilter<T> + ?Sized,
{
    items.iter().filter(|item| filter.matches(item)).collect()
}

/// Lets every record through; for lists without search controls.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unfiltered;

impl ItemFilter<Organization> for Unfiltered {
    fn matches(&self, _: &Organization) -> bool {
        true
    }
}

impl ItemFilter<GuideSummary> for Unfiltered {
    fn matches(&self, _: &GuideSummary) -> bool {
        true
    }
}

impl<T: Searchable> ItemFilter<T> for TextQuery {
    fn matches(&self, item: &T) -> bool {
        TextQuery::matches(self, item)
    }
}

/// Alerts page criteria.
#[derive(Debug, Default, Clone)]
pub struct AlertFilter {
    pub query: TextQuery,
    pub severity: Choice<Severity>,
}

impl ItemFilter<Alert> for AlertFilter {
    fn matches(&self, alert: &Alert) -> bool {
        self.query.matches(alert) && self.severity.admits(&alert.severity)
    }
}

/// Support map criteria.
#[derive(Debug, Default, Clone)]
pub struct SupportPointFilter {
    pub query: TextQuery,
    pub kind: Choice<PointType>,
    /// Only points with both coordinates (the ones a map can plot)
    pub mappable_only: bool,
}

impl ItemFilter<SupportPoint> for SupportPointFilter {
    fn matches(&self, point: &SupportPoint) -> bool {
        self.query.matches(point)
            && self.kind.admits(&point.kind)
            && (!self.mappable_only || point.coordinates().is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alert(id: u32, title: &str, location: &str, severity: Severity) -> Alert {
        Alert {
            id,
            title: title.into(),
            severity,
            date: None,
            time: None,
            description: String::new(),
            location: location.into(),
            source: String::new(),
            recommendations: Vec::new(),
        }
    }

    fn sample_alerts() -> Vec<Alert> {
        vec![
            alert(1, "Enchente em Porto Alegre", "Porto Alegre, RS", Severity::Critical),
            alert(2, "Seca no Nordeste", "Nordeste", Severity::Low),
        ]
    }

    fn ids(alerts: &[&Alert]) -> Vec<u32> {
        alerts.iter().map(|a| a.id).collect()
    }

    fn filter(query: &str, severity: &str) -> AlertFilter {
        AlertFilter {
            query: TextQuery::new(query),
            severity: severity.parse().unwrap(),
        }
    }

    #[test]
    fn test_search_matches_location() {
        let alerts = sample_alerts();
        assert_eq!(ids(&apply(&alerts, &filter("porto", "all"))), vec![1]);
    }

    #[test]
    fn test_severity_filter() {
        let alerts = sample_alerts();
        assert_eq!(ids(&apply(&alerts, &filter("", "critical"))), vec![1]);
        assert_eq!(ids(&apply(&alerts, &filter("", "LOW"))), vec![2]);
    }

    #[test]
    fn test_no_match_is_empty_not_error() {
        let alerts = sample_alerts();
        assert!(apply(&alerts, &filter("xyz", "all")).is_empty());
    }

    #[test]
    fn test_inactive_filters_are_identity() {
        let alerts = sample_alerts();
        assert_eq!(ids(&apply(&alerts, &AlertFilter::default())), vec![1, 2]);
    }

    #[test]
    fn test_filters_combine_with_and() {
        let alerts = sample_alerts();
        assert!(apply(&alerts, &filter("seca", "critical")).is_empty());
        assert_eq!(ids(&apply(&alerts, &filter("SECA", "low"))), vec![2]);
    }

    #[test]
    fn test_results_are_subset_containing_query() {
        let alerts = sample_alerts();
        for q in ["e", "NORD", "alegre", "rs", " "] {
            let query = TextQuery::new(q);
            let found = apply(&alerts, &query);
            assert!(found.len() <= alerts.len());
            for a in found {
                assert!(
                    a.search_fields()
                        .iter()
                        .any(|f| f.to_lowercase().contains(&q.to_lowercase()))
                );
            }
        }
    }

    #[test]
    fn test_supply_need_matches_any_item() {
        let need = SupplyNeed {
            id: 1,
            organization: "Cruz Vermelha".into(),
            items: vec!["Água potável".into(), "Cobertores".into()],
            urgency: crate::models::Urgency::Urgent,
            location: "Canoas, RS".into(),
            contact: String::new(),
            delivery_info: String::new(),
        };
        assert!(TextQuery::new("cobert").matches(&need));
        assert!(TextQuery::new("CANOAS").matches(&need));
        assert!(!TextQuery::new("fraldas").matches(&need));
    }

    #[test]
    fn test_choice_parse() {
        assert_eq!("all".parse::<Choice<Severity>>().unwrap(), Choice::All);
        assert_eq!("".parse::<Choice<Severity>>().unwrap(), Choice::All);
        assert_eq!(
            "High".parse::<Choice<Severity>>().unwrap(),
            Choice::Only(Severity::High)
        );
        assert_eq!(Choice::Only(PointType::Shelter).to_string(), "shelter");
        assert_eq!(Choice::<PointType>::All.to_string(), "all");
    }

    #[test]
    fn test_support_point_filter() {
        let json = r#"[
            {"id": 1, "name": "Ginásio Municipal", "type": "shelter", "address": "Rua das Flores, 123",
             "latitude": -30.03, "longitude": -51.23},
            {"id": 2, "name": "Hospital Regional", "type": "hospital", "address": "Av. Brasil, 456"},
            {"id": 3, "name": "Escola Estadual", "type": "shelter", "address": "Rua Brasil, 9"}
        ]"#;
        let points: Vec<SupportPoint> = serde_json::from_str(json).unwrap();

        let by_type = SupportPointFilter {
            kind: Choice::Only(PointType::Shelter),
            ..Default::default()
        };
        let found: Vec<u32> = apply(&points, &by_type).iter().map(|p| p.id).collect();
        assert_eq!(found, vec![1, 3]);

        let by_address = SupportPointFilter {
            query: TextQuery::new("brasil"),
            ..Default::default()
        };
        let found: Vec<u32> = apply(&points, &by_address).iter().map(|p| p.id).collect();
        assert_eq!(found, vec![2, 3]);

        let mappable = SupportPointFilter {
            mappable_only: true,
            ..Default::default()
        };
        let found: Vec<u32> = apply(&points, &mappable).iter().map(|p| p.id).collect();
        assert_eq!(found, vec![1]);
    }
}
