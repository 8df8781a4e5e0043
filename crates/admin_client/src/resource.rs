use std::fmt::Debug;

use api_types::{
    ListEnvelope,
    transaction::{TransactionListResponse, TransactionView},
    user::{UserListResponse, UserView},
};
use serde::de::DeserializeOwned;

use crate::{
    client::RequestSpec,
    error::FetchError,
    filters::{SearchFilters, TransactionFilters, UserFilters},
};

/// A paginated, searchable collection exposed by the admin API.
pub trait Resource: Send + Sync + 'static {
    type Record: DeserializeOwned + Clone + Debug + Send + Sync + 'static;
    type Filters: SearchFilters;
    type Envelope: DeserializeOwned + ListEnvelope<Record = Self::Record> + Send;

    /// Plural noun used in user facing messages.
    const LABEL: &'static str;

    fn list_request(page: u32, size: u32) -> RequestSpec;

    fn search_request(
        filters: &Self::Filters,
        page: u32,
        size: u32,
    ) -> Result<RequestSpec, FetchError>;
}

/// Trades executed on the platform.
#[derive(Debug, Clone, Copy, Default)]
pub struct Transactions;

impl Resource for Transactions {
    type Record = TransactionView;
    type Filters = TransactionFilters;
    type Envelope = TransactionListResponse;

    const LABEL: &'static str = "transactions";

    fn list_request(page: u32, size: u32) -> RequestSpec {
        RequestSpec::get("/api/admin/transactions").page(page, size)
    }

    fn search_request(
        filters: &TransactionFilters,
        page: u32,
        size: u32,
    ) -> Result<RequestSpec, FetchError> {
        Ok(RequestSpec::get("/api/admin/transactions/search")
            .params(filters.params())
            .page(page, size))
    }
}

/// Platform accounts.
#[derive(Debug, Clone, Copy, Default)]
pub struct Users;

impl Resource for Users {
    type Record = UserView;
    type Filters = UserFilters;
    type Envelope = UserListResponse;

    const LABEL: &'static str = "users";

    fn list_request(page: u32, size: u32) -> RequestSpec {
        RequestSpec::get("/api/admin/users").page(page, size)
    }

    fn search_request(
        filters: &UserFilters,
        page: u32,
        size: u32,
    ) -> Result<RequestSpec, FetchError> {
        RequestSpec::post("/api/admin/users/search").json(&filters.to_search(page, size))
    }
}

#[cfg(test)]
mod tests {
    use reqwest::Method;

    use super::*;
    use crate::filters::Filter;

    #[test]
    fn transaction_search_is_a_get_with_query() {
        let filters = TransactionFilters {
            platform: Filter::Value("Alpaca".to_string()),
            ..TransactionFilters::default()
        };
        let spec = Transactions::search_request(&filters, 0, 10).unwrap();
        assert_eq!(spec.method, Method::GET);
        assert_eq!(spec.path, "/api/admin/transactions/search");
        assert_eq!(spec.query[0], ("platform", "Alpaca".to_string()));
        assert!(spec.body.is_none());
    }

    #[test]
    fn user_search_is_a_post_with_body() {
        let filters = UserFilters {
            user_name: Filter::Value("ada".to_string()),
            ..UserFilters::default()
        };
        let spec = Users::search_request(&filters, 3, 50).unwrap();
        assert_eq!(spec.method, Method::POST);
        assert!(spec.query.is_empty());
        let body = spec.body.unwrap();
        assert_eq!(body["userName"], "ada");
        assert_eq!(body["page"], 3);
        assert_eq!(body["size"], 50);
        assert!(body["email"].is_null());
    }
}
