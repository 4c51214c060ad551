//! Page controller: drives one dashboard page through its lifecycle
//!
//! The controller owns the page's local state (lifecycle state, filter
//! criteria, source collection, cached view) and decides when the view is
//! recomputed:
//!
//! - when a load resolves, before `Ready` is observable
//! - when the source collection is replaced
//! - when a criteria field actually changes while `Ready`
//!
//! Reading the view never recomputes it. Loads are numbered; a load that
//! resolves after a newer one started is discarded.
//!
//! # Example
//!
//! ```rust,ignore
//! let page = Arc::new(PageController::new("employees", source, auth, spec));
//!
//! page.activate().await?;
//! page.set_search_term("bot");
//! if let Some(view) = page.view() {
//!     render(&view.filtered, &view.stats);
//! }
//! ```

use crate::config::PageConfig;
use crate::core::auth::{AuthContext, AuthPolicy, AuthProvider, CurrentUser};
use crate::core::criteria::FilterCriteria;
use crate::core::entity::Entity;
use crate::core::error::{ConfigError, ViewError};
use crate::core::events::{EventBus, PageEvent};
use crate::core::service::EntitySource;
use crate::core::stats::DerivedStats;
use crate::core::view::{DerivedView, ViewSpec, derive_view};
use crate::page::state::{LoadSettings, PageState, PageStatus, TimeoutPolicy};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Everything a successful load brings back
struct Fetched<T> {
    entities: Vec<T>,
    stats: Option<DerivedStats>,
    categories: Vec<String>,
}

/// View cached together with the inputs it was derived from
struct CachedView<T> {
    source: Arc<Vec<T>>,
    criteria_revision: u64,
    view: Arc<DerivedView<T>>,
}

struct Inner<T> {
    state: PageState,
    generation: u64,
    criteria: FilterCriteria,
    criteria_revision: u64,
    source: Option<Arc<Vec<T>>>,
    remote_stats: Option<DerivedStats>,
    categories: Vec<String>,
    cache: Option<CachedView<T>>,
    recomputes: u64,
}

impl<T> Default for Inner<T> {
    fn default() -> Self {
        Self {
            state: PageState::Idle,
            generation: 0,
            criteria: FilterCriteria::default(),
            criteria_revision: 0,
            source: None,
            remote_stats: None,
            categories: Vec::new(),
            cache: None,
            recomputes: 0,
        }
    }
}

impl<T> Inner<T> {
    fn cache_is_fresh(&self) -> bool {
        match (&self.cache, &self.source) {
            (Some(cache), Some(source)) => {
                Arc::ptr_eq(&cache.source, source) && cache.criteria_revision == self.criteria_revision
            }
            _ => false,
        }
    }

    fn drop_data(&mut self) {
        self.source = None;
        self.remote_stats = None;
        self.categories.clear();
        self.cache = None;
    }
}

/// Controller of a single dashboard page
///
/// Share it behind an `Arc`; every method takes `&self`. The internal lock
/// is never held across an await.
pub struct PageController<T: Entity> {
    resource: String,
    source: Arc<dyn EntitySource<T>>,
    auth: Arc<dyn AuthProvider>,
    policy: AuthPolicy,
    spec: ViewSpec<T>,
    settings: LoadSettings,
    events: Option<EventBus>,
    inner: Mutex<Inner<T>>,
}

impl<T: Entity> PageController<T> {
    /// Create a controller for a page
    pub fn new(
        resource: impl Into<String>,
        source: Arc<dyn EntitySource<T>>,
        auth: Arc<dyn AuthProvider>,
        spec: ViewSpec<T>,
    ) -> Self {
        Self {
            resource: resource.into(),
            source,
            auth,
            policy: AuthPolicy::Authenticated,
            spec,
            settings: LoadSettings::default(),
            events: None,
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Create a controller from a configured page
    pub fn from_config(
        config: &PageConfig,
        source: Arc<dyn EntitySource<T>>,
        auth: Arc<dyn AuthProvider>,
    ) -> Result<Self, ConfigError> {
        Ok(Self::new(config.resource.clone(), source, auth, config.view_spec()?)
            .with_settings(config.load_settings())
            .with_policy(config.auth_policy()))
    }

    pub fn with_settings(mut self, settings: LoadSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_policy(mut self, policy: AuthPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    // === Lifecycle ===

    /// Start the page once a user is available
    ///
    /// Without a current user the page stays `Idle` and `Ok(Idle)` is
    /// returned; call again after sign-in. An already activated page is
    /// left as is.
    pub async fn activate(&self) -> Result<PageStatus, ViewError> {
        let status = self.status();
        if status != PageStatus::Idle {
            return Ok(status);
        }

        match self.current_user().await? {
            Some(user) => {
                tracing::info!(resource = %self.resource, user = %user.id, "Activating page");
                Ok(self.load_as(user).await)
            }
            None => {
                tracing::debug!(resource = %self.resource, "No current user, page stays idle");
                Ok(PageStatus::Idle)
            }
        }
    }

    /// Load (or reload) the source collection
    ///
    /// Fetch failures and timeouts do not return `Err`: they are stored in
    /// the page state and the returned status is `Error` (or `Ready` with an
    /// empty collection, per the timeout policy). `Err` means the load could
    /// not start.
    pub async fn load(&self) -> Result<PageStatus, ViewError> {
        let user = self.current_user().await?.ok_or(ViewError::Unauthenticated)?;
        Ok(self.load_as(user).await)
    }

    /// Reload after a failure
    pub async fn retry(&self) -> Result<PageStatus, ViewError> {
        match self.state() {
            PageState::Error(e) if e.is_retryable() => self.load().await,
            state => Err(self.invalid("retry", state.status())),
        }
    }

    /// Reload a page that is showing data
    pub async fn refresh(&self) -> Result<PageStatus, ViewError> {
        match self.status() {
            PageStatus::Ready => self.load().await,
            status => Err(self.invalid("refresh", status)),
        }
    }

    /// Return to `Idle`, dropping data and criteria (sign-out, unmount)
    ///
    /// A load still in flight is discarded when it resolves.
    pub fn deactivate(&self) {
        let mut inner = self.lock();
        inner.generation += 1;
        inner.drop_data();
        inner.criteria = FilterCriteria::default();
        inner.criteria_revision += 1;
        self.transition(&mut inner, PageState::Idle);
    }

    async fn current_user(&self) -> Result<Option<CurrentUser>, ViewError> {
        self.auth
            .current_user()
            .await
            .map_err(|e| ViewError::Internal(format!("auth provider failed: {:#}", e)))
    }

    async fn load_as(&self, user: CurrentUser) -> PageStatus {
        if !self.policy.check(&AuthContext::User(user.clone())) {
            let err = ViewError::Forbidden {
                resource: self.resource.clone(),
                role: self.policy.required_role().unwrap_or_default().to_string(),
            };
            tracing::warn!(resource = %self.resource, error = %err, "Access denied");

            let mut inner = self.lock();
            inner.generation += 1;
            inner.drop_data();
            self.transition(&mut inner, PageState::Error(err));
            return PageStatus::Error;
        }

        let generation = self.begin_load();
        let outcome = self.fetch(&user).await;
        self.finish_load(generation, outcome)
    }

    fn begin_load(&self) -> u64 {
        let mut inner = self.lock();
        inner.generation += 1;
        let generation = inner.generation;

        inner.drop_data();
        self.transition(&mut inner, PageState::Loading { generation });
        generation
    }

    async fn fetch(&self, user: &CurrentUser) -> Result<Fetched<T>, ViewError> {
        let requests = async {
            futures::try_join!(
                self.source.fetch_entities(user),
                self.source.fetch_stats(user),
                self.source.fetch_categories(user),
            )
        };

        let result = match self.settings.timeout {
            Some(limit) => match tokio::time::timeout(limit, requests).await {
                Ok(result) => result,
                Err(_) => {
                    return Err(ViewError::Timeout {
                        resource: self.resource.clone(),
                        after: limit,
                    });
                }
            },
            None => requests.await,
        };

        result
            .map(|(entities, stats, categories)| Fetched {
                entities,
                stats,
                categories,
            })
            .map_err(|e| ViewError::Fetch {
                resource: self.resource.clone(),
                message: format!("{:#}", e),
            })
    }

    fn finish_load(&self, generation: u64, outcome: Result<Fetched<T>, ViewError>) -> PageStatus {
        let mut inner = self.lock();

        if generation != inner.generation {
            tracing::warn!(
                resource = %self.resource,
                generation,
                current = inner.generation,
                "Discarding stale load result"
            );
            self.publish(PageEvent::StaleResponseDiscarded {
                resource: self.resource.clone(),
                generation,
                current: inner.generation,
            });
            return inner.state.status();
        }

        match outcome {
            Ok(fetched) => {
                tracing::debug!(
                    resource = %self.resource,
                    generation,
                    count = fetched.entities.len(),
                    "Load resolved"
                );
                inner.source = Some(Arc::new(fetched.entities));
                inner.remote_stats = fetched.stats;
                inner.categories = fetched.categories;
                self.recompute(&mut inner);
                self.transition(&mut inner, PageState::Ready);
            }
            Err(ViewError::Timeout { after, .. })
                if self.settings.on_timeout == TimeoutPolicy::ReadyEmpty =>
            {
                tracing::warn!(
                    resource = %self.resource,
                    generation,
                    timeout_ms = after.as_millis() as u64,
                    "Load timed out, showing empty page"
                );
                inner.source = Some(Arc::new(Vec::new()));
                self.recompute(&mut inner);
                self.transition(&mut inner, PageState::Ready);
            }
            Err(err) => {
                tracing::warn!(resource = %self.resource, generation, error = %err, "Load failed");
                self.transition(&mut inner, PageState::Error(err));
            }
        }

        inner.state.status()
    }

    // === Filter input ===

    /// Set the free-text search term. Returns whether it changed.
    pub fn set_search_term(&self, term: impl Into<String>) -> bool {
        let mut inner = self.lock();
        let changed = inner.criteria.set_search_term(term);
        if changed {
            self.criteria_changed(&mut inner);
        }
        changed
    }

    /// Select a value for a categorical filter ("" clears it). Returns
    /// whether the criteria changed.
    pub fn set_filter(&self, field: impl Into<String>, value: impl Into<String>) -> bool {
        let mut inner = self.lock();
        let changed = inner.criteria.set_filter(field, value);
        if changed {
            self.criteria_changed(&mut inner);
        }
        changed
    }

    /// Reset the search term and every categorical filter
    pub fn clear_filters(&self) -> bool {
        let mut inner = self.lock();
        let changed = inner.criteria.clear();
        if changed {
            self.criteria_changed(&mut inner);
        }
        changed
    }

    fn criteria_changed(&self, inner: &mut Inner<T>) {
        inner.criteria_revision += 1;
        if inner.state.is_ready() {
            self.recompute(inner);
        }
    }

    // === Local mutations ===

    /// Replace the source collection (after a local create/delete/toggle)
    pub fn replace_source(&self, entities: Vec<T>) -> Result<(), ViewError> {
        let mut inner = self.lock();
        if !inner.state.is_ready() {
            return Err(self.invalid("replace the source", inner.state.status()));
        }
        inner.source = Some(Arc::new(entities));
        self.recompute(&mut inner);
        Ok(())
    }

    /// Edit a copy of the source collection and install it
    pub fn update_source<F>(&self, edit: F) -> Result<(), ViewError>
    where
        F: FnOnce(&mut Vec<T>),
    {
        let mut inner = self.lock();
        if !inner.state.is_ready() {
            return Err(self.invalid("update the source", inner.state.status()));
        }
        let mut entities = inner.source.as_deref().cloned().unwrap_or_default();
        edit(&mut entities);
        inner.source = Some(Arc::new(entities));
        self.recompute(&mut inner);
        Ok(())
    }

    // === Reads ===

    /// The filtered rows and stats; `None` unless the page is `Ready`
    pub fn view(&self) -> Option<Arc<DerivedView<T>>> {
        let mut inner = self.lock();
        if !inner.state.is_ready() {
            return None;
        }
        if !inner.cache_is_fresh() {
            self.recompute(&mut inner);
        }
        inner.cache.as_ref().map(|cache| Arc::clone(&cache.view))
    }

    /// The unfiltered source collection; `None` unless the page is `Ready`
    pub fn source(&self) -> Option<Arc<Vec<T>>> {
        let inner = self.lock();
        if !inner.state.is_ready() {
            return None;
        }
        inner.source.clone()
    }

    pub fn state(&self) -> PageState {
        self.lock().state.clone()
    }

    pub fn status(&self) -> PageStatus {
        self.lock().state.status()
    }

    pub fn criteria(&self) -> FilterCriteria {
        self.lock().criteria.clone()
    }

    /// Options for the category selector from the last load
    pub fn categories(&self) -> Vec<String> {
        self.lock().categories.clone()
    }

    /// How many times the view has been recomputed
    pub fn recompute_count(&self) -> u64 {
        self.lock().recomputes
    }

    /// Number of the most recent load
    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn spec(&self) -> &ViewSpec<T> {
        &self.spec
    }

    // === Internals ===

    fn lock(&self) -> MutexGuard<'_, Inner<T>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn recompute(&self, inner: &mut Inner<T>) {
        let source = inner.source.get_or_insert_with(|| Arc::new(Vec::new())).clone();

        let mut view = derive_view(&source, &inner.criteria, &self.spec);
        if let Some(remote) = &inner.remote_stats {
            view.stats = view.stats.merged_with(remote);
        }

        tracing::debug!(
            resource = %self.resource,
            filtered = view.filtered.len(),
            total = source.len(),
            "Recomputed view"
        );
        self.publish(PageEvent::Recomputed {
            resource: self.resource.clone(),
            filtered: view.filtered.len(),
            total: source.len(),
        });

        inner.cache = Some(CachedView {
            source,
            criteria_revision: inner.criteria_revision,
            view: Arc::new(view),
        });
        inner.recomputes += 1;
    }

    fn transition(&self, inner: &mut Inner<T>, next: PageState) {
        let from = inner.state.status();
        let to = next.status();
        debug_assert!(
            from.can_transition_to(to),
            "invalid page transition {} -> {}",
            from,
            to
        );

        inner.state = next;
        if from != to {
            tracing::debug!(resource = %self.resource, %from, %to, "Page state changed");
            self.publish(PageEvent::StateChanged {
                resource: self.resource.clone(),
                from,
                to,
            });
        }
    }

    fn publish(&self, event: PageEvent) {
        if let Some(events) = &self.events {
            events.publish(event);
        }
    }

    fn invalid(&self, operation: &str, status: PageStatus) -> ViewError {
        ViewError::InvalidTransition {
            operation: operation.to_string(),
            state: status.to_string(),
        }
    }
}
