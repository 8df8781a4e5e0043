use std::{fmt::Debug, str::FromStr};

use api_types::{
    transaction::{TransactionSide, TransactionStatus},
    user::{AccountStatus, UserSearch},
};
use chrono::NaiveDateTime;

/// Textual form of [`Filter::Any`], as typed in search forms.
pub const ANY: &str = "_any_";

/// Format used for date-time filter parameters.
pub const FILTER_DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// A value that can be sent as a filter parameter.
pub trait FilterParam {
    fn to_param(&self) -> String;

    /// A blank value never constrains a query.
    fn is_blank(&self) -> bool {
        false
    }
}

impl FilterParam for String {
    fn to_param(&self) -> String {
        self.trim().to_string()
    }

    fn is_blank(&self) -> bool {
        self.trim().is_empty()
    }
}

impl FilterParam for i64 {
    fn to_param(&self) -> String {
        self.to_string()
    }
}

impl FilterParam for f64 {
    fn to_param(&self) -> String {
        self.to_string()
    }
}

impl FilterParam for NaiveDateTime {
    fn to_param(&self) -> String {
        self.format(FILTER_DATETIME_FORMAT).to_string()
    }
}

impl FilterParam for TransactionSide {
    fn to_param(&self) -> String {
        self.as_str().to_string()
    }
}

impl FilterParam for TransactionStatus {
    fn to_param(&self) -> String {
        self.as_str().to_string()
    }
}

impl FilterParam for AccountStatus {
    fn to_param(&self) -> String {
        self.as_str().to_string()
    }
}

/// A single search field.
///
/// `Any` means the field does not constrain the query. It is not the same as
/// an empty string value, although neither is ever sent to the backend.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter<T> {
    Any,
    Value(T),
}

impl<T> Default for Filter<T> {
    fn default() -> Self {
        Self::Any
    }
}

impl<T> From<T> for Filter<T> {
    fn from(value: T) -> Self {
        Self::Value(value)
    }
}

impl<T: FilterParam> Filter<T> {
    /// The value, when it actually constrains the query.
    pub fn constraint(&self) -> Option<&T> {
        match self {
            Self::Value(value) if !value.is_blank() => Some(value),
            _ => None,
        }
    }

    pub fn param(&self) -> Option<String> {
        self.constraint().map(FilterParam::to_param)
    }

    pub fn is_any(&self) -> bool {
        matches!(self, Self::Any)
    }
}

impl<T: FromStr> Filter<T> {
    /// Parses form input, mapping the [`ANY`] sentinel to [`Filter::Any`].
    pub fn parse(raw: &str) -> Result<Self, T::Err> {
        if raw.trim() == ANY {
            return Ok(Self::Any);
        }
        raw.trim().parse().map(Self::Value)
    }
}

/// The filter field set of a searchable resource.
pub trait SearchFilters: Clone + Debug + Default + PartialEq + Send + Sync + 'static {
    /// `(name, value)` query parameters for the constraining fields.
    fn params(&self) -> Vec<(&'static str, String)>;

    /// True when no field constrains the query; such a search is a fetch-all.
    fn is_unconstrained(&self) -> bool {
        self.params().is_empty()
    }
}

fn push<T: FilterParam>(
    params: &mut Vec<(&'static str, String)>,
    name: &'static str,
    filter: &Filter<T>,
) {
    if let Some(value) = filter.param() {
        params.push((name, value));
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionFilters {
    pub user_id: Filter<i64>,
    pub portfolio_id: Filter<i64>,
    pub platform: Filter<String>,
    pub symbol: Filter<String>,
    pub from_time: Filter<NaiveDateTime>,
    pub to_time: Filter<NaiveDateTime>,
    pub from_amount: Filter<f64>,
    pub to_amount: Filter<f64>,
    pub from_price: Filter<f64>,
    pub to_price: Filter<f64>,
    pub side: Filter<TransactionSide>,
    pub status: Filter<TransactionStatus>,
}

impl SearchFilters for TransactionFilters {
    fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        push(&mut params, "userId", &self.user_id);
        push(&mut params, "portfolioId", &self.portfolio_id);
        push(&mut params, "platform", &self.platform);
        push(&mut params, "symbol", &self.symbol);
        push(&mut params, "fromTime", &self.from_time);
        push(&mut params, "toTime", &self.to_time);
        push(&mut params, "fromAmount", &self.from_amount);
        push(&mut params, "toAmount", &self.to_amount);
        push(&mut params, "fromPrice", &self.from_price);
        push(&mut params, "toPrice", &self.to_price);
        push(&mut params, "type", &self.side);
        push(&mut params, "status", &self.status);
        params
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserFilters {
    pub user_id: Filter<i64>,
    pub user_name: Filter<String>,
    pub email: Filter<String>,
    pub account_status: Filter<AccountStatus>,
    pub registration_from: Filter<NaiveDateTime>,
    pub registration_to: Filter<NaiveDateTime>,
}

impl UserFilters {
    /// Body of the user search request; non-constraining fields become `null`.
    pub fn to_search(&self, page: u32, size: u32) -> UserSearch {
        UserSearch {
            user_id: self.user_id.constraint().copied(),
            user_name: self.user_name.param(),
            email: self.email.param(),
            account_status: self.account_status.constraint().copied(),
            registration_date_from: self.registration_from.param(),
            registration_date_to: self.registration_to.param(),
            page,
            size,
        }
    }
}

impl SearchFilters for UserFilters {
    fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        push(&mut params, "userId", &self.user_id);
        push(&mut params, "userName", &self.user_name);
        push(&mut params, "email", &self.email);
        push(&mut params, "accountStatus", &self.account_status);
        push(&mut params, "registrationDateFrom", &self.registration_from);
        push(&mut params, "registrationDateTo", &self.registration_to);
        params
    }
}
