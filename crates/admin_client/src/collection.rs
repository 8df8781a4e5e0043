use std::{
    marker::PhantomData,
    sync::{Arc, Mutex, MutexGuard, PoisonError, Weak},
};

use api_types::{
    Page,
    user::{UserUpdate, UserView},
};
use chrono::{DateTime, Utc};

use crate::{
    client::ApiClient,
    error::FetchError,
    memory::{LastQuery, QueryIntent},
    notify::{Notification, Notifier, TracingNotifier},
    pagination::{PageSize, PageWindow},
    refresh::{RefreshInterval, RefreshTimer},
    resource::{Resource, Users},
};

const CONNECTION_ERROR: &str = "Failed to connect to server. Please try again later.";

/// What happened to a load request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The response replaced the visible page.
    Applied,
    /// The requested page is already shown; nothing was sent.
    Unchanged,
    /// A newer request was issued while this one was in flight.
    Superseded,
    /// The request failed; the error is in the snapshot.
    Failed,
}

/// Everything a view needs to render a collection.
#[derive(Debug, Clone)]
pub struct CollectionSnapshot<R: Resource> {
    pub records: Vec<R::Record>,
    pub window: PageWindow,
    pub is_loading: bool,
    pub error: Option<String>,
    pub session_expired: bool,
    pub refresh_interval: RefreshInterval,
    pub last_update: Option<DateTime<Utc>>,
    pub intent: Arc<QueryIntent<R::Filters>>,
}

struct CollectionState<R: Resource> {
    records: Vec<R::Record>,
    window: PageWindow,
    last: LastQuery<R::Filters>,
    is_loading: bool,
    error: Option<String>,
    session_expired: bool,
    issued: u64,
    last_update: Option<DateTime<Utc>>,
}

struct PendingLoad<F> {
    seq: u64,
    intent: Arc<QueryIntent<F>>,
    page: u32,
    size: PageSize,
}

impl<R: Resource> CollectionState<R> {
    fn new(size: PageSize) -> Self {
        Self {
            records: Vec::new(),
            window: PageWindow::new(size),
            last: LastQuery::fetch_all(size),
            is_loading: false,
            error: None,
            session_expired: false,
            issued: 0,
            last_update: None,
        }
    }

    /// Marks a new request as the latest one.
    fn begin(&mut self) -> PendingLoad<R::Filters> {
        self.issued += 1;
        self.is_loading = true;
        PendingLoad {
            seq: self.issued,
            intent: Arc::clone(&self.last.intent),
            page: self.last.page,
            size: self.last.size,
        }
    }

    fn apply(&mut self, page: Page<R::Record>, size: PageSize) {
        tracing::debug!(
            resource = R::LABEL,
            page = page.number,
            total_pages = page.total_pages,
            records = page.records.len(),
            "page applied"
        );
        self.records = page.records;
        self.window.apply(page.number, page.total_pages, size);
        self.last.page = self.window.current_page;
        self.error = None;
        self.session_expired = false;
        self.last_update = Some(Utc::now());
    }

    /// Records `err` and returns the toast to raise, if any.
    fn fail(&mut self, err: &FetchError, verb: &str, noun: &str) -> Option<Notification> {
        match err {
            FetchError::SessionExpired => {
                tracing::warn!(resource = R::LABEL, "session expired");
                self.session_expired = true;
                None
            }
            FetchError::Application { message } => {
                tracing::warn!(resource = R::LABEL, "failed to {verb} {noun}: {message}");
                self.error = Some(message.clone());
                Some(Notification::error("Error", message.clone()))
            }
            other => {
                tracing::error!(resource = R::LABEL, "failed to {verb} {noun}: {other}");
                self.error = Some(CONNECTION_ERROR.to_string());
                Some(Notification::error(
                    "Connection Error",
                    format!("Failed to {verb} {noun}. Server may be unavailable."),
                ))
            }
        }
    }

    fn snapshot(&self, refresh_interval: RefreshInterval) -> CollectionSnapshot<R> {
        CollectionSnapshot {
            records: self.records.clone(),
            window: self.window,
            is_loading: self.is_loading,
            error: self.error.clone(),
            session_expired: self.session_expired,
            refresh_interval,
            last_update: self.last_update,
            intent: Arc::clone(&self.last.intent),
        }
    }
}

struct Inner<R: Resource> {
    api: ApiClient,
    notifier: Arc<dyn Notifier>,
    state: Mutex<CollectionState<R>>,
    timer: Mutex<RefreshTimer>,
}

/// A paginated view over one admin resource, remembering the last query.
///
/// Cloning is cheap and every clone drives the same state. Dropping the last
/// clone stops the auto-refresh timer.
pub struct Collection<R: Resource> {
    inner: Arc<Inner<R>>,
}

impl<R: Resource> Clone for Collection<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R: Resource> Collection<R> {
    pub fn builder(api: ApiClient) -> CollectionBuilder<R> {
        CollectionBuilder {
            api,
            page_size: PageSize::default(),
            notifier: None,
            _resource: PhantomData,
        }
    }

    pub fn new(api: ApiClient) -> Self {
        Self::builder(api).build()
    }

    fn state(&self) -> MutexGuard<'_, CollectionState<R>> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn timer(&self) -> MutexGuard<'_, RefreshTimer> {
        self.inner
            .timer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> CollectionSnapshot<R> {
        let refresh_interval = self.refresh_interval();
        self.state().snapshot(refresh_interval)
    }

    pub fn page_size(&self) -> PageSize {
        self.state().window.page_size
    }

    /// Loads the first page of the unfiltered list and remembers that choice.
    pub async fn fetch_all(&self) -> LoadOutcome {
        let pending = {
            let mut state = self.state();
            let size = state.window.page_size;
            state.last.replace(QueryIntent::FetchAll, size);
            tracing::info!(resource = R::LABEL, "listing all");
            state.begin()
        };
        self.run(pending).await
    }

    /// Loads the first page matching `filters` and remembers them.
    pub async fn search(&self, filters: R::Filters) -> LoadOutcome {
        let pending = {
            let mut state = self.state();
            let size = state.window.page_size;
            let intent = QueryIntent::search(filters);
            tracing::info!(resource = R::LABEL, intent = ?intent, "new query");
            state.last.replace(intent, size);
            state.begin()
        };
        self.run(pending).await
    }

    /// Drops the remembered filters.
    pub async fn clear(&self) -> LoadOutcome {
        self.fetch_all().await
    }

    /// Replays the remembered query at its remembered page and size.
    pub async fn refresh_latest_search(&self) -> LoadOutcome {
        let pending = self.state().begin();
        self.run(pending).await
    }

    pub async fn go_to_page(&self, target: i64) -> LoadOutcome {
        let pending = {
            let mut state = self.state();
            let page = state.window.clamp_page(target);
            if page == state.window.current_page {
                return LoadOutcome::Unchanged;
            }
            let size = state.window.page_size;
            state.last.set_position(page, size);
            state.begin()
        };
        self.run(pending).await
    }

    pub async fn next_page(&self) -> LoadOutcome {
        let current = i64::from(self.state().window.current_page);
        self.go_to_page(current + 1).await
    }

    pub async fn previous_page(&self) -> LoadOutcome {
        let current = i64::from(self.state().window.current_page);
        self.go_to_page(current - 1).await
    }

    /// Switches to `new_size`, staying on the page that holds the first
    /// record currently shown.
    pub async fn change_page_size(&self, new_size: PageSize) -> LoadOutcome {
        let pending = self.resize(|_| new_size);
        self.run(pending).await
    }

    /// Like [`Collection::change_page_size`], with the new size computed
    /// from the size current when the call runs. Steps issued back to back
    /// compound even while earlier loads are in flight.
    pub async fn step_page_size(&self, step: fn(PageSize) -> PageSize) -> LoadOutcome {
        let pending = self.resize(step);
        self.run(pending).await
    }

    fn resize(&self, pick: impl FnOnce(PageSize) -> PageSize) -> PendingLoad<R::Filters> {
        let mut state = self.state();
        let new_size = pick(state.window.page_size);
        let page = state.window.page_for_size(new_size);
        state.window.page_size = new_size;
        state.last.set_position(page, new_size);
        state.begin()
    }

    pub fn refresh_interval(&self) -> RefreshInterval {
        self.timer().interval()
    }

    /// Replays the remembered query every period of `choice`, replacing any
    /// previous schedule. `Off` stops auto-refresh.
    ///
    /// Must be called from within a tokio runtime.
    pub fn set_refresh_interval(&self, choice: RefreshInterval) {
        let weak: Weak<Inner<R>> = Arc::downgrade(&self.inner);
        self.timer().set_interval(choice, move || {
            let weak = Weak::clone(&weak);
            async move {
                // Runs detached: cancelling the timer must not drop a load halfway.
                if let Some(inner) = weak.upgrade() {
                    tokio::spawn(async move {
                        Collection { inner }.refresh_latest_search().await;
                    });
                }
            }
        });
    }

    /// Stops auto-refresh. In-flight requests still complete.
    pub fn shutdown(&self) {
        self.timer().cancel();
    }

    async fn run(&self, pending: PendingLoad<R::Filters>) -> LoadOutcome {
        let mut in_flight = InFlight {
            collection: self,
            seq: pending.seq,
            armed: true,
        };
        let result = self
            .inner
            .api
            .fetch_page::<R>(&pending.intent, pending.page, pending.size.get())
            .await;
        in_flight.armed = false;

        let notification = {
            let mut state = self.state();
            if state.issued != pending.seq {
                tracing::debug!(
                    resource = R::LABEL,
                    seq = pending.seq,
                    latest = state.issued,
                    "dropping superseded response"
                );
                return LoadOutcome::Superseded;
            }
            state.is_loading = false;
            match result {
                Ok(page) => {
                    state.apply(page, pending.size);
                    return LoadOutcome::Applied;
                }
                Err(err) => state.fail(&err, pending.intent.verb(), R::LABEL),
            }
        };

        self.raise(notification);
        LoadOutcome::Failed
    }

    fn raise(&self, notification: Option<Notification>) {
        if let Some(notification) = notification {
            self.inner.notifier.notify(notification);
        }
    }
}

/// Clears the loading flag when a load future is dropped before its
/// response arrives and no newer load has taken over.
struct InFlight<'a, R: Resource> {
    collection: &'a Collection<R>,
    seq: u64,
    armed: bool,
}

impl<R: Resource> Drop for InFlight<'_, R> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut state = self.collection.state();
        if state.issued == self.seq {
            tracing::debug!(resource = R::LABEL, seq = self.seq, "load cancelled");
            state.is_loading = false;
        }
    }
}

impl Collection<Users> {
    /// Applies `update` to one user, then reloads the remembered query so the
    /// list shows the change.
    pub async fn update_user(&self, user_id: i64, update: UserUpdate) -> Option<UserView> {
        match self.inner.api.update_user(user_id, &update).await {
            Ok(res) => {
                tracing::info!(user_id, "user updated");
                let message = res
                    .message
                    .unwrap_or_else(|| "User updated successfully".to_string());
                self.raise(Some(Notification::success("Success", message)));
                self.refresh_latest_search().await;
                res.user
            }
            Err(err) => {
                let notification = self.state().fail(&err, "update", "user");
                self.raise(notification);
                None
            }
        }
    }
}

pub struct CollectionBuilder<R: Resource> {
    api: ApiClient,
    page_size: PageSize,
    notifier: Option<Arc<dyn Notifier>>,
    _resource: PhantomData<R>,
}

impl<R: Resource> CollectionBuilder<R> {
    pub fn page_size(mut self, page_size: PageSize) -> CollectionBuilder<R> {
        self.page_size = page_size;
        self
    }

    /// Where toasts go; defaults to the log.
    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> CollectionBuilder<R> {
        self.notifier = Some(notifier);
        self
    }

    pub fn build(self) -> Collection<R> {
        Collection {
            inner: Arc::new(Inner {
                api: self.api,
                notifier: self
                    .notifier
                    .unwrap_or_else(|| Arc::new(TracingNotifier)),
                state: Mutex::new(CollectionState::new(self.page_size)),
                timer: Mutex::new(RefreshTimer::new()),
            }),
        }
    }
}
