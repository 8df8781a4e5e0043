use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Returned when a textual enum value does not name a known variant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown value \"{0}\"")]
pub struct UnknownVariant(pub String);

/// Page payload carried inside every list envelope.
///
/// Every field is optional on the wire; [`PageBody::into_page`] applies the
/// defaults the dashboard relies on.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageBody<T> {
    pub content: Option<Vec<T>>,
    /// Zero based index of the page the server actually returned.
    pub number: Option<u32>,
    pub total_pages: Option<u32>,
}

impl<T> PageBody<T> {
    pub fn into_page(self) -> Page<T> {
        Page {
            records: self.content.unwrap_or_default(),
            number: self.number.unwrap_or(0),
            total_pages: self.total_pages.unwrap_or(1).max(1),
        }
    }
}

/// A normalized page: `total_pages` is never zero.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub records: Vec<T>,
    pub number: u32,
    pub total_pages: u32,
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            number: 0,
            total_pages: 1,
        }
    }
}

/// A list response envelope: `{success, <key>: {content, number, totalPages}, message?}`.
pub trait ListEnvelope {
    type Record;

    /// Returns the page, or the server message when `success` is false.
    fn into_page(self) -> Result<Page<Self::Record>, Option<String>>;
}

/// Local date-times as the backend writes them (`2024-03-01T09:30:00`,
/// seconds and fractions optional).
///
/// Timestamps carrying an offset (`Z`, `+02:00`) are also accepted and keep
/// their wall-clock time.
pub mod local_time {
    use chrono::{DateTime, NaiveDateTime};
    use serde::{Deserialize, Deserializer, Serializer, de};

    const FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

    pub fn parse(raw: &str) -> Result<NaiveDateTime, chrono::ParseError> {
        let raw = raw.trim();
        NaiveDateTime::parse_from_str(raw, FORMATS[0])
            .or_else(|_| NaiveDateTime::parse_from_str(raw, FORMATS[1]))
            .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|dt| dt.naive_local()))
    }

    pub fn serialize<S>(value: &Option<NaiveDateTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(value) => serializer.serialize_str(&value.format(FORMATS[0]).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        raw.map(|raw| parse(&raw).map_err(de::Error::custom))
            .transpose()
    }
}

pub mod transaction {
    use std::str::FromStr;

    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "UPPERCASE")]
    pub enum TransactionSide {
        Buy,
        Sell,
        #[serde(other)]
        Unknown,
    }

    impl TransactionSide {
        pub fn as_str(self) -> &'static str {
            match self {
                Self::Buy => "BUY",
                Self::Sell => "SELL",
                Self::Unknown => "UNKNOWN",
            }
        }
    }

    impl FromStr for TransactionSide {
        type Err = UnknownVariant;

        fn from_str(s: &str) -> Result<Self, Self::Err> {
            match s.trim().to_ascii_uppercase().as_str() {
                "BUY" => Ok(Self::Buy),
                "SELL" => Ok(Self::Sell),
                _ => Err(UnknownVariant(s.to_string())),
            }
        }
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "UPPERCASE")]
    pub enum TransactionStatus {
        Pending,
        Completed,
        Failed,
        #[serde(other)]
        Unknown,
    }

    impl TransactionStatus {
        pub fn as_str(self) -> &'static str {
            match self {
                Self::Pending => "PENDING",
                Self::Completed => "COMPLETED",
                Self::Failed => "FAILED",
                Self::Unknown => "UNKNOWN",
            }
        }
    }

    impl FromStr for TransactionStatus {
        type Err = UnknownVariant;

        fn from_str(s: &str) -> Result<Self, Self::Err> {
            match s.trim().to_ascii_uppercase().as_str() {
                "PENDING" => Ok(Self::Pending),
                "COMPLETED" => Ok(Self::Completed),
                "FAILED" => Ok(Self::Failed),
                _ => Err(UnknownVariant(s.to_string())),
            }
        }
    }

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct TransactionView {
        #[serde(default)]
        pub id: Option<i64>,
        pub user_id: i64,
        pub portfolio_id: i64,
        #[serde(default)]
        pub platform: Option<String>,
        pub symbol: String,
        #[serde(rename = "type")]
        pub side: TransactionSide,
        pub status: TransactionStatus,
        pub quantity: f64,
        pub price: f64,
        #[serde(default)]
        pub total_value: Option<f64>,
        /// Local time of execution, as reported by the platform.
        #[serde(default, with = "local_time")]
        pub transaction_date: Option<NaiveDateTime>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionListResponse {
        #[serde(default)]
        pub success: bool,
        pub transactions: Option<PageBody<TransactionView>>,
        pub message: Option<String>,
    }

    impl ListEnvelope for TransactionListResponse {
        type Record = TransactionView;

        fn into_page(self) -> Result<Page<TransactionView>, Option<String>> {
            if !self.success {
                return Err(self.message);
            }
            Ok(self
                .transactions
                .map(PageBody::into_page)
                .unwrap_or_default())
        }
    }
}

pub mod user {
    use std::str::FromStr;

    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "UPPERCASE")]
    pub enum AccountStatus {
        Active,
        Suspended,
        Nonverified,
        #[serde(other)]
        Unknown,
    }

    impl AccountStatus {
        pub fn as_str(self) -> &'static str {
            match self {
                Self::Active => "ACTIVE",
                Self::Suspended => "SUSPENDED",
                Self::Nonverified => "NONVERIFIED",
                Self::Unknown => "UNKNOWN",
            }
        }
    }

    impl FromStr for AccountStatus {
        type Err = UnknownVariant;

        fn from_str(s: &str) -> Result<Self, Self::Err> {
            match s.trim().to_ascii_uppercase().as_str() {
                "ACTIVE" => Ok(Self::Active),
                "SUSPENDED" => Ok(Self::Suspended),
                "NONVERIFIED" => Ok(Self::Nonverified),
                _ => Err(UnknownVariant(s.to_string())),
            }
        }
    }

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct UserView {
        pub user_id: i64,
        pub user_name: String,
        pub email: String,
        pub account_status: AccountStatus,
        #[serde(default, with = "local_time")]
        pub registration_date: Option<NaiveDateTime>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct UserListResponse {
        #[serde(default)]
        pub success: bool,
        pub users: Option<PageBody<UserView>>,
        pub message: Option<String>,
    }

    impl ListEnvelope for UserListResponse {
        type Record = UserView;

        fn into_page(self) -> Result<Page<UserView>, Option<String>> {
            if !self.success {
                return Err(self.message);
            }
            Ok(self.users.map(PageBody::into_page).unwrap_or_default())
        }
    }

    /// Request body for `POST /api/admin/users/search`.
    ///
    /// `None` fields are sent as `null`, meaning "any".
    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct UserSearch {
        pub user_id: Option<i64>,
        pub user_name: Option<String>,
        pub email: Option<String>,
        pub account_status: Option<AccountStatus>,
        pub registration_date_from: Option<String>,
        pub registration_date_to: Option<String>,
        pub page: u32,
        pub size: u32,
    }

    /// Request body for `PUT /api/admin/users/{userId}`.
    ///
    /// `None` fields are sent as `null` and left unchanged by the server.
    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct UserUpdate {
        pub user_name: Option<String>,
        pub email: Option<String>,
        pub password: Option<String>,
        pub account_status: Option<AccountStatus>,
    }

    impl UserUpdate {
        pub fn is_empty(&self) -> bool {
            self.user_name.is_none()
                && self.email.is_none()
                && self.password.is_none()
                && self.account_status.is_none()
        }
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct UserUpdateResponse {
        #[serde(default)]
        pub success: bool,
        pub user: Option<UserView>,
        pub message: Option<String>,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use transaction::{TransactionListResponse, TransactionSide, TransactionStatus};
    use user::{AccountStatus, UserListResponse, UserUpdate};

    #[test]
    fn transaction_envelope_yields_page() {
        let body = r#"{
            "success": true,
            "transactions": {
                "content": [{
                    "userId": 7,
                    "portfolioId": 3,
                    "platform": "Binance",
                    "symbol": "BTCUSDT",
                    "type": "BUY",
                    "status": "COMPLETED",
                    "quantity": 0.5,
                    "price": 40000.0,
                    "totalValue": 20000.0,
                    "transactionDate": "2024-03-01T09:30"
                }],
                "number": 2,
                "totalPages": 5
            }
        }"#;

        let envelope: TransactionListResponse = serde_json::from_str(body).unwrap();
        let page = envelope.into_page().unwrap();
        assert_eq!(page.number, 2);
        assert_eq!(page.total_pages, 5);
        assert_eq!(page.records.len(), 1);
        let tx = &page.records[0];
        assert_eq!(tx.side, TransactionSide::Buy);
        assert_eq!(tx.status, TransactionStatus::Completed);
        assert_eq!(
            tx.transaction_date.map(|d| d.to_string()).as_deref(),
            Some("2024-03-01 09:30:00")
        );
    }

    #[test]
    fn missing_platform_and_offset_dates_do_not_fail_the_page() {
        let body = r#"{
            "success": true,
            "transactions": {
                "content": [{
                    "userId": 7,
                    "portfolioId": 3,
                    "platform": null,
                    "symbol": "ETHUSDT",
                    "type": "SELL",
                    "status": "PENDING",
                    "quantity": 1.0,
                    "price": 3000.0,
                    "transactionDate": "2024-03-01T09:30:00Z"
                }, {
                    "userId": 7,
                    "portfolioId": 3,
                    "symbol": "ETHUSDT",
                    "type": "BUY",
                    "status": "COMPLETED",
                    "quantity": 1.0,
                    "price": 2900.0,
                    "transactionDate": "2024-03-02T18:05:00+02:00"
                }],
                "number": 0,
                "totalPages": 1
            }
        }"#;

        let envelope: TransactionListResponse = serde_json::from_str(body).unwrap();
        let page = envelope.into_page().unwrap();
        assert_eq!(page.records.len(), 2);
        assert_eq!(page.records[0].platform, None);
        assert_eq!(page.records[1].platform, None);
        assert_eq!(
            page.records[0].transaction_date.map(|d| d.to_string()).as_deref(),
            Some("2024-03-01 09:30:00")
        );
        assert_eq!(
            page.records[1].transaction_date.map(|d| d.to_string()).as_deref(),
            Some("2024-03-02 18:05:00")
        );
    }

    #[test]
    fn offset_registration_dates_parse() {
        let parsed = local_time::parse("2023-11-05T10:11:12.345+01:00").unwrap();
        assert_eq!(parsed.to_string(), "2023-11-05 10:11:12.345");
        assert!(local_time::parse("2023-11-05").is_err());
    }

    #[test]
    fn unknown_variant_names_the_value() {
        let err = "HOLD".parse::<TransactionSide>().unwrap_err();
        assert_eq!(err.to_string(), "unknown value \"HOLD\"");
    }

    #[test]
    fn failed_envelope_carries_message() {
        let body = r#"{"success": false, "message": "not allowed"}"#;
        let envelope: UserListResponse = serde_json::from_str(body).unwrap();
        assert_eq!(envelope.into_page().unwrap_err().as_deref(), Some("not allowed"));
    }

    #[test]
    fn missing_page_defaults_to_single_empty_page() {
        let body = r#"{"success": true, "users": {"content": null, "totalPages": 0}}"#;
        let envelope: UserListResponse = serde_json::from_str(body).unwrap();
        let page = envelope.into_page().unwrap();
        assert!(page.records.is_empty());
        assert_eq!(page.number, 0);
        assert_eq!(page.total_pages, 1);
    }

    #[test]
    fn unknown_status_does_not_fail_the_page() {
        let body = r#"{
            "success": true,
            "users": {"content": [{
                "user_id": 1,
                "user_name": "ada",
                "email": "ada@example.com",
                "account_status": "BANNED",
                "registration_date": "2023-11-05T10:11:12.345"
            }], "number": 0, "totalPages": 1}
        }"#;
        let envelope: UserListResponse = serde_json::from_str(body).unwrap();
        let page = envelope.into_page().unwrap();
        assert_eq!(page.records[0].account_status, AccountStatus::Unknown);
        assert!(page.records[0].registration_date.is_some());
    }

    #[test]
    fn update_sends_null_for_unchanged_fields() {
        let update = UserUpdate {
            account_status: Some(AccountStatus::Suspended),
            ..UserUpdate::default()
        };
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "userName": null,
                "email": null,
                "password": null,
                "accountStatus": "SUSPENDED"
            })
        );
    }
}
