//! Data access for the admin dashboard.
//!
//! The crate talks to the platform's admin REST API and keeps, per listed
//! resource, the state a dashboard needs: the current page of records, the
//! page window, the last query the user asked for and an optional
//! auto-refresh timer replaying that query.
//!
//! Transactions and users share one implementation, [`Collection`],
//! parameterised over a [`Resource`].

mod auth;
mod client;
mod collection;
mod error;
mod filters;
mod memory;
mod notify;
mod pagination;
mod refresh;
mod resource;

pub use auth::{HttpTokenRefresher, TokenRefresher};
pub use client::{ApiClient, ApiClientBuilder, RequestSpec};
pub use collection::{Collection, CollectionBuilder, CollectionSnapshot, LoadOutcome};
pub use error::{BuildError, FetchError, RefreshError};
pub use filters::{
    ANY, Filter, FilterParam, SearchFilters, TransactionFilters, UserFilters,
    FILTER_DATETIME_FORMAT,
};
pub use memory::{LastQuery, QueryIntent};
pub use notify::{Notification, NotificationLevel, Notifier, TracingNotifier};
pub use pagination::{InvalidPageSize, PageSize, PageWindow};
pub use refresh::{InvalidRefreshInterval, RefreshInterval, RefreshTimer};
pub use resource::{Resource, Transactions, Users};
