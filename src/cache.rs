//! Bounded per-visit cache of list views.
//!
//! A page visit fetches its collection once. Later filter requests from
//! the same visit re-filter the cached [`ListView`] instead of going back to
//! the API. The oldest visits are evicted when the cache is full, so memory
//! stays bounded however long the server runs.

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::errors::FetchError;
use crate::filters::ItemFilter;
use crate::view::ListView;

/// Identifies one page visit across its fragment requests.
pub type VisitId = u64;

/// Default number of visits kept per collection.
pub const DEFAULT_CAPACITY: usize = 256;

/// List views keyed by visit, oldest evicted first.
#[derive(Debug)]
pub struct VisitCache<T, F> {
    inner: Mutex<Visits<T, F>>,
}

#[derive(Debug)]
struct Visits<T, F> {
    views: HashMap<VisitId, ListView<T, F>>,
    /// Insertion order (oldest at front)
    order: VecDeque<VisitId>,
    capacity: usize,
}

impl<T, F: ItemFilter<T>> VisitCache<T, F> {
    /// Create a cache holding at most `capacity` visits.
    ///
    /// # Panics
    ///
    /// Panics if capacity is zero.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "capacity must be positive");

        Self {
            inner: Mutex::new(Visits {
                views: HashMap::with_capacity(capacity),
                order: VecDeque::with_capacity(capacity),
                capacity,
            }),
        }
    }

    #[must_use]
    pub fn with_default_capacity() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }

    fn visits(&self) -> MutexGuard<'_, Visits<T, F>> {
        // A panic while rendering leaves the map itself consistent
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply `filter` to the view of `visit` and render it.
    ///
    /// A visit seen before keeps its fetched state, whether loaded or
    /// failed, and only gets the new filter. An unknown visit runs `fetch`
    /// once and is remembered. Without a visit the view is fetched and
    /// dropped after rendering.
    pub async fn with_view<Fut, R>(
        &self,
        visit: Option<VisitId>,
        filter: F,
        fetch: impl FnOnce() -> Fut,
        render: impl FnOnce(&ListView<T, F>) -> R,
    ) -> R
    where
        Fut: Future<Output = Result<Vec<T>, FetchError>>,
    {
        if let Some(id) = visit {
            let mut visits = self.visits();
            let cached = visits.views.len();
            if let Some(view) = visits.views.get_mut(&id) {
                debug!(visit = id, cached, "re-filtering cached view");
                view.set_filter(filter);
                return render(view);
            }
        }

        let mut view = ListView::new(filter);
        view.begin();
        view.finish(fetch().await);
        let output = render(&view);

        if let Some(id) = visit {
            self.visits().insert(id, view);
        }
        output
    }
}

impl<T, F> Visits<T, F> {
    fn insert(&mut self, id: VisitId, view: ListView<T, F>) {
        // Two first requests of one visit can race; the later one wins
        if self.views.insert(id, view).is_some() {
            return;
        }

        if self.order.len() >= self.capacity {
            let oldest = self.order.pop_front();
            if let Some(oldest) = oldest {
                self.views.remove(&oldest);
                debug!(visit = oldest, "evicted cached view");
            }
        }
        self.order.push_back(id);

        debug_assert!(self.order.len() <= self.capacity);
        debug_assert_eq!(self.order.len(), self.views.len());
    }
}
