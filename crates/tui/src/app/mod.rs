use std::{
    sync::{Arc, Mutex, PoisonError},
    time::{Duration, Instant},
};

use admin_client::{
    ApiClient, Collection, CollectionSnapshot, Notification, NotificationLevel, Notifier,
    PageSize, QueryIntent, RefreshInterval, Resource, SearchFilters, Transactions, Users,
};
use crossterm::event::{self, Event, KeyEvent};
use serde::{Deserialize, Serialize};

use crate::{
    config::AppConfig,
    error::{AppError, Result},
    local_state::{LocalState, SectionPrefs},
    search,
    ui::{
        self,
        keymap::{AppAction, map_key},
    },
};

const TOAST_TTL: Duration = Duration::from_secs(4);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Transactions,
    Users,
}

impl Section {
    pub const ALL: [Section; 2] = [Self::Transactions, Self::Users];

    pub fn label(self) -> &'static str {
        match self {
            Self::Transactions => "Transactions",
            Self::Users => "Users",
        }
    }

    fn next(self) -> Self {
        match self {
            Self::Transactions => Self::Users,
            Self::Users => Self::Transactions,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    Search,
    GoTo,
    EditUser(i64),
}

/// The one-line input shown in place of the key hints.
#[derive(Debug, Clone)]
pub struct Prompt {
    pub kind: PromptKind,
    pub input: String,
    pub error: Option<String>,
}

impl Prompt {
    fn new(kind: PromptKind, input: String) -> Self {
        Self {
            kind,
            input,
            error: None,
        }
    }

    pub fn label(&self) -> String {
        match self.kind {
            PromptKind::Search => "Search".to_string(),
            PromptKind::GoTo => "Go to page".to_string(),
            PromptKind::EditUser(id) => format!("Edit user {id}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ToastState {
    pub level: NotificationLevel,
    pub title: String,
    pub message: String,
    shown_at: Instant,
}

/// Keeps the latest notification until the UI picks it up.
#[derive(Default)]
struct ToastSink {
    latest: Mutex<Option<ToastState>>,
}

impl ToastSink {
    fn take(&self) -> Option<ToastState> {
        self.latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

impl Notifier for ToastSink {
    fn notify(&self, notification: Notification) {
        tracing::debug!(title = %notification.title, "toast: {}", notification.description);
        *self.latest.lock().unwrap_or_else(PoisonError::into_inner) = Some(ToastState {
            level: notification.level,
            title: notification.title,
            message: notification.description,
            shown_at: Instant::now(),
        });
    }
}

/// What the UI shows for one section: the collection's last snapshot and
/// the highlighted row.
#[derive(Debug)]
pub struct SectionState<R: Resource> {
    pub snapshot: CollectionSnapshot<R>,
    pub selected: usize,
}

impl<R: Resource> SectionState<R> {
    fn new(snapshot: CollectionSnapshot<R>) -> Self {
        Self {
            snapshot,
            selected: 0,
        }
    }

    fn update(&mut self, snapshot: CollectionSnapshot<R>) {
        self.snapshot = snapshot;
        self.selected = self
            .selected
            .min(self.snapshot.records.len().saturating_sub(1));
    }

    fn select_next(&mut self) {
        if self.snapshot.records.is_empty() {
            return;
        }
        self.selected = (self.selected + 1).min(self.snapshot.records.len() - 1);
    }

    fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn selected_record(&self) -> Option<&R::Record> {
        self.snapshot.records.get(self.selected)
    }

    /// Active filters in prompt syntax; empty for a fetch-all.
    pub fn filter_summary(&self) -> String {
        match self.snapshot.intent.as_ref() {
            QueryIntent::FetchAll => String::new(),
            QueryIntent::Search(filters) => search::describe(&filters.params()),
        }
    }
}

#[derive(Debug)]
pub struct AppState {
    pub section: Section,
    pub transactions: SectionState<Transactions>,
    pub users: SectionState<Users>,
    pub prompt: Option<Prompt>,
    pub toast: Option<ToastState>,
    pub base_url: String,
}

impl AppState {
    pub fn session_expired(&self) -> bool {
        self.transactions.snapshot.session_expired || self.users.snapshot.session_expired
    }
}

#[derive(Debug, Clone, Copy)]
enum Load {
    All,
    Clear,
    Refresh,
    Next,
    Previous,
    GoTo(i64),
    StepSize(fn(PageSize) -> PageSize),
}

/// Runs `load` on its own task so the UI keeps drawing while it is in flight.
fn spawn_load<R: Resource>(collection: &Collection<R>, load: Load) {
    let collection = collection.clone();
    tokio::spawn(async move {
        let outcome = match load {
            Load::All => collection.fetch_all().await,
            Load::Clear => collection.clear().await,
            Load::Refresh => collection.refresh_latest_search().await,
            Load::Next => collection.next_page().await,
            Load::Previous => collection.previous_page().await,
            Load::GoTo(page) => collection.go_to_page(page).await,
            Load::StepSize(step) => collection.step_page_size(step).await,
        };
        tracing::debug!(resource = R::LABEL, ?load, ?outcome, "load finished");
    });
}

pub struct App {
    config: AppConfig,
    transactions: Collection<Transactions>,
    users: Collection<Users>,
    toasts: Arc<ToastSink>,
    local: LocalState,
    pub state: AppState,
    should_quit: bool,
}

impl App {
    /// Must be called from within a tokio runtime: restoring a saved
    /// refresh interval starts its timer.
    pub fn new(config: AppConfig) -> Result<Self> {
        let mut builder = ApiClient::builder()
            .base_url(&config.base_url)
            .refresh_path(&config.refresh_path);
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let api = builder.build()?;

        let local = LocalState::load(&config.state_file).unwrap_or_else(|err| {
            tracing::warn!("ignoring unreadable local state: {err}");
            LocalState::default()
        });
        let prefs = |section| {
            local.prefs_for(section).unwrap_or(SectionPrefs {
                section,
                page_size: config.page_size,
                refresh_interval: config.refresh_interval,
            })
        };
        let transaction_prefs = prefs(Section::Transactions);
        let user_prefs = prefs(Section::Users);

        let toasts = Arc::new(ToastSink::default());
        let transactions: Collection<Transactions> = Collection::builder(api.clone())
            .page_size(transaction_prefs.page_size)
            .notifier(toasts.clone())
            .build();
        let users: Collection<Users> = Collection::builder(api)
            .page_size(user_prefs.page_size)
            .notifier(toasts.clone())
            .build();
        transactions.set_refresh_interval(transaction_prefs.refresh_interval);
        users.set_refresh_interval(user_prefs.refresh_interval);

        let state = AppState {
            section: Section::Transactions,
            transactions: SectionState::new(transactions.snapshot()),
            users: SectionState::new(users.snapshot()),
            prompt: None,
            toast: None,
            base_url: config.base_url.clone(),
        };

        Ok(Self {
            config,
            transactions,
            users,
            toasts,
            local,
            state,
            should_quit: false,
        })
    }

    pub async fn run(&mut self) -> Result<()> {
        spawn_load(&self.transactions, Load::All);
        spawn_load(&self.users, Load::All);

        let mut terminal = ui::setup_terminal()?;
        let result = self.event_loop(&mut terminal).await;
        ui::restore_terminal(&mut terminal)?;

        self.transactions.shutdown();
        self.users.shutdown();
        result
    }

    async fn event_loop(&mut self, terminal: &mut ui::Terminal) -> Result<()> {
        let tick_rate = Duration::from_millis(200);

        while !self.should_quit {
            self.sync();
            terminal
                .draw(|frame| ui::render(frame, &self.state))
                .map_err(|err| AppError::Terminal(err.to_string()))?;

            if event::poll(tick_rate)? {
                match event::read()? {
                    Event::Key(key) => self.handle_key(key),
                    Event::Resize(_, _) => {}
                    _ => {}
                }
            }
            tokio::task::yield_now().await;
        }

        Ok(())
    }

    /// Pulls the latest collection state and notifications into the view.
    fn sync(&mut self) {
        self.state.transactions.update(self.transactions.snapshot());
        self.state.users.update(self.users.snapshot());

        self.remember_page_sizes();

        if let Some(toast) = self.toasts.take() {
            self.state.toast = Some(toast);
        }
        if self
            .state
            .toast
            .as_ref()
            .is_some_and(|toast| toast.shown_at.elapsed() >= TOAST_TTL)
        {
            self.state.toast = None;
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        let typing = self.state.prompt.is_some();
        match map_key(key, typing) {
            AppAction::Quit => {
                self.should_quit = true;
            }
            AppAction::Cancel => {
                self.state.prompt = None;
            }
            AppAction::NextField => {
                if !typing {
                    self.state.section = self.state.section.next();
                }
            }
            AppAction::Submit => {
                if typing {
                    self.submit_prompt();
                }
            }
            AppAction::Backspace => {
                if let Some(prompt) = &mut self.state.prompt {
                    prompt.input.pop();
                    prompt.error = None;
                }
            }
            AppAction::Up => self.select_prev(),
            AppAction::Down => self.select_next(),
            AppAction::Input(ch) => {
                if let Some(prompt) = &mut self.state.prompt {
                    prompt.input.push(ch);
                    prompt.error = None;
                } else {
                    self.handle_browse_key(ch);
                }
            }
            AppAction::None => {}
        }
    }

    fn handle_browse_key(&mut self, ch: char) {
        match ch {
            '1' => self.state.section = Section::Transactions,
            '2' => self.state.section = Section::Users,
            'n' | 'N' => self.load(Load::Next),
            'p' | 'P' => self.load(Load::Previous),
            'r' | 'R' => self.load(Load::Refresh),
            'c' | 'C' => self.load(Load::Clear),
            'g' | 'G' => self.open_prompt(PromptKind::GoTo),
            '/' => self.open_prompt(PromptKind::Search),
            '+' | '=' => self.cycle_page_size(PageSize::next),
            '-' => self.cycle_page_size(PageSize::previous),
            'i' | 'I' => self.cycle_refresh_interval(),
            'e' | 'E' => self.edit_selected_user(),
            'j' | 'J' => self.select_next(),
            'k' | 'K' => self.select_prev(),
            _ => {}
        }
    }

    fn load(&self, load: Load) {
        match self.state.section {
            Section::Transactions => spawn_load(&self.transactions, load),
            Section::Users => spawn_load(&self.users, load),
        }
    }

    fn select_next(&mut self) {
        match self.state.section {
            Section::Transactions => self.state.transactions.select_next(),
            Section::Users => self.state.users.select_next(),
        }
    }

    fn select_prev(&mut self) {
        match self.state.section {
            Section::Transactions => self.state.transactions.select_prev(),
            Section::Users => self.state.users.select_prev(),
        }
    }

    fn open_prompt(&mut self, kind: PromptKind) {
        let input = match (kind, self.state.section) {
            (PromptKind::Search, Section::Transactions) => self.state.transactions.filter_summary(),
            (PromptKind::Search, Section::Users) => self.state.users.filter_summary(),
            _ => String::new(),
        };
        self.state.prompt = Some(Prompt::new(kind, input));
    }

    fn edit_selected_user(&mut self) {
        if self.state.section != Section::Users {
            return;
        }
        if let Some(user) = self.state.users.selected_record() {
            let id = user.user_id;
            self.open_prompt(PromptKind::EditUser(id));
        }
    }

    fn submit_prompt(&mut self) {
        let Some(prompt) = self.state.prompt.take() else {
            return;
        };
        let result = match prompt.kind {
            PromptKind::Search => self.submit_search(&prompt.input),
            PromptKind::GoTo => self.submit_go_to(&prompt.input),
            PromptKind::EditUser(id) => self.submit_user_update(id, &prompt.input),
        };
        if let Err(message) = result {
            self.state.prompt = Some(Prompt {
                error: Some(message),
                ..prompt
            });
        }
    }

    fn submit_search(&self, input: &str) -> std::result::Result<(), String> {
        match self.state.section {
            Section::Transactions => {
                let filters = search::transaction_filters(input).map_err(|err| err.to_string())?;
                let transactions = self.transactions.clone();
                tokio::spawn(async move { transactions.search(filters).await });
            }
            Section::Users => {
                let filters = search::user_filters(input).map_err(|err| err.to_string())?;
                let users = self.users.clone();
                tokio::spawn(async move { users.search(filters).await });
            }
        }
        Ok(())
    }

    fn submit_go_to(&self, input: &str) -> std::result::Result<(), String> {
        self.load(Load::GoTo(page_target(input)?));
        Ok(())
    }

    fn submit_user_update(&self, user_id: i64, input: &str) -> std::result::Result<(), String> {
        let update = search::user_update(input).map_err(|err| err.to_string())?;
        let users = self.users.clone();
        tokio::spawn(async move { users.update_user(user_id, update).await });
        Ok(())
    }

    /// The size is stepped on the load task; the next sync saves it.
    fn cycle_page_size(&mut self, step: fn(PageSize) -> PageSize) {
        self.load(Load::StepSize(step));
    }

    fn remember_page_sizes(&mut self) {
        for section in Section::ALL {
            let current = match section {
                Section::Transactions => self.state.transactions.snapshot.window.page_size,
                Section::Users => self.state.users.snapshot.window.page_size,
            };
            let saved = self
                .local
                .prefs_for(section)
                .map_or(self.config.page_size, |prefs| prefs.page_size);
            if current != saved {
                self.remember(section, |prefs| prefs.page_size = current);
            }
        }
    }

    fn cycle_refresh_interval(&mut self) {
        let section = self.state.section;
        let interval = match section {
            Section::Transactions => {
                let next = self.transactions.refresh_interval().next();
                self.transactions.set_refresh_interval(next);
                next
            }
            Section::Users => {
                let next = self.users.refresh_interval().next();
                self.users.set_refresh_interval(next);
                next
            }
        };
        let description = match interval {
            RefreshInterval::Off => format!("{} auto-refresh off", section.label()),
            other => format!("{} refresh every {other}", section.label()),
        };
        self.toasts
            .notify(Notification::info("Auto-refresh", description));
        self.remember(section, |prefs| prefs.refresh_interval = interval);
    }

    fn remember(&mut self, section: Section, change: impl FnOnce(&mut SectionPrefs)) {
        let mut prefs = SectionPrefs {
            section,
            page_size: match section {
                Section::Transactions => self.transactions.page_size(),
                Section::Users => self.users.page_size(),
            },
            refresh_interval: match section {
                Section::Transactions => self.transactions.refresh_interval(),
                Section::Users => self.users.refresh_interval(),
            },
        };
        change(&mut prefs);
        self.local.set_prefs(prefs);
        if let Err(err) = self.local.save(&self.config.state_file) {
            tracing::warn!("failed to save local state: {err}");
        }
    }
}

/// Zero based page index for a one based page number typed by the user.
fn page_target(input: &str) -> std::result::Result<i64, String> {
    let page: i64 = input
        .trim()
        .parse()
        .map_err(|_| format!("\"{}\" is not a page number", input.trim()))?;
    Ok(page.saturating_sub(1))
}
