//! View state for list and detail screens.
//!
//! A list screen is one fetch lifecycle (`idle → loading → failed | loaded`)
//! plus a filter that derives the visible subset. Changing the filter only
//! recomputes the subset. A detail screen nests its own lifecycle keyed by
//! the selected id.

use tracing::{debug, warn};

use crate::errors::FetchError;
use crate::filters::{self, ItemFilter};

/// Lifecycle of one network request.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum FetchState<T> {
    /// Nothing requested yet
    #[default]
    Idle,
    /// Request in flight
    Loading,
    /// Request failed; holds the message to show
    Failed(&'static str),
    /// Data available (possibly an empty collection)
    Loaded(T),
}

impl<T> FetchState<T> {
    /// Collapse a fetch result into a terminal state.
    ///
    /// Every failure becomes the same user-facing message; the cause only
    /// goes to the log.
    #[must_use]
    pub fn from_result(result: Result<T, FetchError>) -> Self {
        match result {
            Ok(data) => Self::Loaded(data),
            Err(e) => {
                warn!("fetch failed: {e}");
                Self::Failed(e.user_message())
            }
        }
    }

    #[must_use]
    pub const fn data(&self) -> Option<&T> {
        match self {
            Self::Loaded(data) => Some(data),
            _ => None,
        }
    }
}

/// Master-detail selection: at most one id, toggled on repeat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selector<K> {
    selected: Option<K>,
}

impl<K> Default for Selector<K> {
    fn default() -> Self {
        Self { selected: None }
    }
}

impl<K: Copy + PartialEq> Selector<K> {
    #[must_use]
    pub const fn new(selected: Option<K>) -> Self {
        Self { selected }
    }

    #[must_use]
    pub const fn selected(&self) -> Option<K> {
        self.selected
    }

    #[must_use]
    pub fn is_selected(&self, id: K) -> bool {
        self.selected == Some(id)
    }

    /// Selection that results from picking `id`, without changing `self`.
    #[must_use]
    pub fn toggled(&self, id: K) -> Option<K> {
        if self.is_selected(id) { None } else { Some(id) }
    }

    /// Pick `id`: selects it, or clears it if it already was selected.
    pub fn toggle(&mut self, id: K) -> Option<K> {
        self.selected = self.toggled(id);
        self.selected
    }
}

/// What a list screen should draw.
#[derive(Debug, PartialEq)]
pub enum Visible<'a, T> {
    Loading,
    Failed(&'static str),
    /// Loaded, but nothing passes the filter
    Empty,
    Items(Vec<&'a T>),
}

/// A remote collection plus the filter applied to it.
#[derive(Debug)]
pub struct ListView<T, F> {
    state: FetchState<Vec<T>>,
    filter: F,
}

impl<T, F: ItemFilter<T>> ListView<T, F> {
    #[must_use]
    pub fn new(filter: F) -> Self {
        Self {
            state: FetchState::Idle,
            filter,
        }
    }

    /// Mark the collection request as in flight.
    pub fn begin(&mut self) {
        self.state = FetchState::Loading;
    }

    /// Record the outcome of the collection request.
    pub fn finish(&mut self, result: Result<Vec<T>, FetchError>) {
        self.state = FetchState::from_result(result);
    }

    /// Replace the filter. The collection is not refetched.
    pub fn set_filter(&mut self, filter: F) {
        self.filter = filter;
    }

    #[must_use]
    pub const fn filter(&self) -> &F {
        &self.filter
    }

    #[must_use]
    pub const fn state(&self) -> &FetchState<Vec<T>> {
        &self.state
    }

    /// Number of records fetched, before filtering.
    #[must_use]
    pub fn total(&self) -> usize {
        self.state.data().map_or(0, Vec::len)
    }

    /// The subset of the collection passing the current filter.
    #[must_use]
    pub fn visible(&self) -> Visible<'_, T> {
        match &self.state {
            FetchState::Idle | FetchState::Loading => Visible::Loading,
            FetchState::Failed(message) => Visible::Failed(*message),
            FetchState::Loaded(items) => {
                let shown = filters::apply(items, &self.filter);
                if shown.is_empty() {
                    Visible::Empty
                } else {
                    Visible::Items(shown)
                }
            }
        }
    }
}

/// Proof that a detail request was issued for a given selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket<K> {
    id: K,
    generation: u64,
}

impl<K: Copy> Ticket<K> {
    #[must_use]
    pub const fn id(&self) -> K {
        self.id
    }
}

/// A detail pane driven by a [`Selector`].
///
/// Only a selected id has a request. A response whose ticket no longer
/// matches the current selection is dropped.
#[derive(Debug)]
pub struct DetailView<K, T> {
    selector: Selector<K>,
    state: FetchState<T>,
    generation: u64,
}

impl<K, T> Default for DetailView<K, T> {
    fn default() -> Self {
        Self {
            selector: Selector::default(),
            state: FetchState::Idle,
            generation: 0,
        }
    }
}

impl<K: Copy + PartialEq + std::fmt::Debug, T> DetailView<K, T> {
    /// Toggle `id`. Returns a ticket when a detail request should go out.
    pub fn select(&mut self, id: K) -> Option<Ticket<K>> {
        self.generation += 1;
        match self.selector.toggle(id) {
            Some(id) => {
                self.state = FetchState::Loading;
                Some(Ticket {
                    id,
                    generation: self.generation,
                })
            }
            None => {
                self.state = FetchState::Idle;
                None
            }
        }
    }

    /// Record a detail response. Returns `false` if it was stale.
    pub fn resolve(&mut self, ticket: Ticket<K>, result: Result<T, FetchError>) -> bool {
        if ticket.generation != self.generation || !self.selector.is_selected(ticket.id) {
            debug!(id = ?ticket.id, "discarding stale detail response");
            return false;
        }
        self.state = FetchState::from_result(result);
        true
    }

    #[must_use]
    pub const fn selected(&self) -> Option<K> {
        self.selector.selected()
    }

    #[must_use]
    pub const fn state(&self) -> &FetchState<T> {
        &self.state
    }
}

/// Sections of the "how to help" page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HelpTab {
    #[default]
    Donations,
    Supplies,
    Volunteer,
}

impl HelpTab {
    pub const ALL: [Self; 3] = [Self::Donations, Self::Supplies, Self::Volunteer];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Donations => "donations",
            Self::Supplies => "supplies",
            Self::Volunteer => "volunteer",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Donations => "Doações em Dinheiro",
            Self::Supplies => "Suprimentos",
            Self::Volunteer => "Voluntariado",
        }
    }

    /// Tabs with a free-text search box.
    #[must_use]
    pub const fn searchable(self) -> bool {
        !matches!(self, Self::Donations)
    }
}

impl std::str::FromStr for HelpTab {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "donations" => Ok(Self::Donations),
            "supplies" => Ok(Self::Supplies),
            "volunteer" => Ok(Self::Volunteer),
            _ => Err(format!("unknown tab: {s}")),
        }
    }
}

/// Tab and search state of the "how to help" page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HelpState {
    pub tab: HelpTab,
    pub query: String,
}

impl HelpState {
    /// Move to `tab`. A different tab starts with an empty search.
    pub fn switch_to(&mut self, tab: HelpTab) {
        if tab != self.tab {
            self.tab = tab;
            self.query.clear();
        }
    }

    /// State after moving to `tab`, without changing `self`.
    #[must_use]
    pub fn switched(&self, tab: HelpTab) -> Self {
        let mut next = self.clone();
        next.switch_to(tab);
        next
    }
}
