//! Parsing of the one-line prompts typed in the dashboard.
//!
//! A prompt is a list of whitespace separated `field=value` tokens, e.g.
//! `symbol=AAPL type=BUY from=2024-01-01T09:30`. Double quotes keep spaces
//! inside a value (`platform="Interactive Brokers"`). The value `_any_`
//! leaves a field unconstrained.

use std::str::FromStr;

use admin_client::{ANY, Filter, TransactionFilters, UserFilters};
use api_types::user::{AccountStatus, UserUpdate};
use chrono::{NaiveDate, NaiveDateTime};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("expected field=value, got \"{0}\"")]
    MissingValue(String),
    #[error("unknown field \"{field}\", expected one of: {expected}")]
    UnknownField {
        field: String,
        expected: &'static str,
    },
    #[error("invalid value \"{value}\" for {field}")]
    InvalidValue { field: String, value: String },
    #[error("nothing to update")]
    EmptyUpdate,
}

pub const TRANSACTION_FIELDS: &str =
    "user, portfolio, platform, symbol, from, to, min_amount, max_amount, min_price, max_price, type, status";
pub const USER_FIELDS: &str = "id, name, email, status, from, to";
pub const UPDATE_FIELDS: &str = "name, email, password, status";

/// Splits on whitespace outside double quotes. The quotes themselves are
/// dropped; an unterminated quote runs to the end of the input.
fn words(input: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut word = String::new();
    let mut started = false;
    let mut quoted = false;
    for ch in input.chars() {
        match ch {
            '"' => {
                quoted = !quoted;
                started = true;
            }
            ch if ch.is_whitespace() && !quoted => {
                if started {
                    words.push(std::mem::take(&mut word));
                    started = false;
                }
            }
            ch => {
                word.push(ch);
                started = true;
            }
        }
    }
    if started {
        words.push(word);
    }
    words
}

fn tokens(input: &str) -> impl Iterator<Item = Result<(String, String), ParseError>> {
    words(input).into_iter().map(|token| match token.split_once('=') {
        Some((field, value)) => Ok((field.to_ascii_lowercase(), value.to_string())),
        None => Err(ParseError::MissingValue(token)),
    })
}

fn value<T: FromStr>(field: &str, raw: &str) -> Result<Filter<T>, ParseError> {
    Filter::parse(raw).map_err(|_| invalid(field, raw))
}

/// Accepts `YYYY-MM-DDTHH:MM[:SS]` or a bare date, read as midnight.
fn datetime(field: &str, raw: &str) -> Result<Filter<NaiveDateTime>, ParseError> {
    if raw == ANY {
        return Ok(Filter::Any);
    }
    api_types::local_time::parse(raw)
        .or_else(|_| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d").map(|date| date.and_time(Default::default()))
        })
        .map(Filter::Value)
        .map_err(|_| invalid(field, raw))
}

fn invalid(field: &str, raw: &str) -> ParseError {
    ParseError::InvalidValue {
        field: field.to_string(),
        value: raw.to_string(),
    }
}

pub fn transaction_filters(input: &str) -> Result<TransactionFilters, ParseError> {
    let mut filters = TransactionFilters::default();
    for token in tokens(input) {
        let (field, raw) = token?;
        match field.as_str() {
            "user" | "user_id" | "userid" => filters.user_id = value(&field, &raw)?,
            "portfolio" | "portfolio_id" | "portfolioid" => filters.portfolio_id = value(&field, &raw)?,
            "platform" => filters.platform = value(&field, &raw)?,
            "symbol" => filters.symbol = value(&field, &raw)?,
            "from" | "fromtime" => filters.from_time = datetime(&field, &raw)?,
            "to" | "totime" => filters.to_time = datetime(&field, &raw)?,
            "min_amount" | "fromamount" => filters.from_amount = value(&field, &raw)?,
            "max_amount" | "toamount" => filters.to_amount = value(&field, &raw)?,
            "min_price" | "fromprice" => filters.from_price = value(&field, &raw)?,
            "max_price" | "toprice" => filters.to_price = value(&field, &raw)?,
            "type" | "side" => filters.side = value(&field, &raw)?,
            "status" => filters.status = value(&field, &raw)?,
            _ => {
                return Err(ParseError::UnknownField {
                    field,
                    expected: TRANSACTION_FIELDS,
                });
            }
        }
    }
    Ok(filters)
}

pub fn user_filters(input: &str) -> Result<UserFilters, ParseError> {
    let mut filters = UserFilters::default();
    for token in tokens(input) {
        let (field, raw) = token?;
        match field.as_str() {
            "id" | "user_id" | "userid" => filters.user_id = value(&field, &raw)?,
            "name" | "user_name" | "username" => filters.user_name = value(&field, &raw)?,
            "email" => filters.email = value(&field, &raw)?,
            "status" | "accountstatus" => filters.account_status = value(&field, &raw)?,
            "from" | "registrationdatefrom" => filters.registration_from = datetime(&field, &raw)?,
            "to" | "registrationdateto" => filters.registration_to = datetime(&field, &raw)?,
            _ => {
                return Err(ParseError::UnknownField {
                    field,
                    expected: USER_FIELDS,
                });
            }
        }
    }
    Ok(filters)
}

/// Parses an edit prompt. Empty values leave the field unchanged.
pub fn user_update(input: &str) -> Result<UserUpdate, ParseError> {
    let mut update = UserUpdate::default();
    for token in tokens(input) {
        let (field, raw) = token?;
        let text = (!raw.is_empty()).then_some(raw);
        match field.as_str() {
            "name" | "user_name" => update.user_name = text,
            "email" => update.email = text,
            "password" => update.password = text,
            "status" => {
                update.account_status = match text {
                    Some(raw) => Some(
                        raw.parse::<AccountStatus>()
                            .map_err(|_| invalid(&field, &raw))?,
                    ),
                    None => None,
                }
            }
            _ => {
                return Err(ParseError::UnknownField {
                    field,
                    expected: UPDATE_FIELDS,
                });
            }
        }
    }
    if update.is_empty() {
        return Err(ParseError::EmptyUpdate);
    }
    Ok(update)
}

/// Renders the active filters back in prompt syntax, using the wire names
/// the parsers also accept.
pub fn describe(params: &[(&'static str, String)]) -> String {
    params
        .iter()
        .map(|(name, value)| {
            if value.contains(char::is_whitespace) {
                format!("{name}=\"{value}\"")
            } else {
                format!("{name}={value}")
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use api_types::transaction::TransactionSide;
    use admin_client::SearchFilters;

    use super::*;

    #[test]
    fn parses_transaction_filters() {
        let filters =
            transaction_filters("symbol=AAPL type=buy from=2024-01-01T09:30 max_price=200.5")
                .unwrap();

        assert_eq!(filters.symbol, Filter::Value("AAPL".to_string()));
        assert_eq!(filters.side, Filter::Value(TransactionSide::Buy));
        assert_eq!(filters.to_price, Filter::Value(200.5));
        assert_eq!(
            filters.from_time.param().as_deref(),
            Some("2024-01-01T09:30")
        );
        assert!(filters.status.is_any());
    }

    #[test]
    fn bare_dates_start_at_midnight() {
        let filters = user_filters("from=2023-11-02").unwrap();
        assert_eq!(
            filters.registration_from.param().as_deref(),
            Some("2023-11-02T00:00")
        );
    }

    #[test]
    fn sentinel_leaves_a_field_open() {
        let filters = transaction_filters("status=_any_ user=_any_").unwrap();
        assert_eq!(filters, TransactionFilters::default());

        let filters = transaction_filters("status=FAILED status=_any_").unwrap();
        assert!(filters.status.is_any());
    }

    #[test]
    fn empty_prompt_constrains_nothing() {
        assert_eq!(transaction_filters("   ").unwrap(), TransactionFilters::default());
        assert_eq!(user_filters("").unwrap(), UserFilters::default());
    }

    #[test]
    fn bad_tokens_are_reported() {
        assert_eq!(
            transaction_filters("AAPL"),
            Err(ParseError::MissingValue("AAPL".to_string()))
        );
        assert!(matches!(
            transaction_filters("colour=red"),
            Err(ParseError::UnknownField { field, .. }) if field == "colour"
        ));
        assert_eq!(
            transaction_filters("user=abc"),
            Err(ParseError::InvalidValue {
                field: "user".to_string(),
                value: "abc".to_string()
            })
        );
        assert!(user_filters("from=yesterday").is_err());
    }

    #[test]
    fn parses_user_updates() {
        let update = user_update("status=suspended email=ada@example.com name=").unwrap();
        assert_eq!(update.account_status, Some(AccountStatus::Suspended));
        assert_eq!(update.email.as_deref(), Some("ada@example.com"));
        assert_eq!(update.user_name, None);

        assert_eq!(user_update("name="), Err(ParseError::EmptyUpdate));
        assert!(user_update("status=banned").is_err());
    }

    #[test]
    fn described_filters_parse_back() {
        use admin_client::SearchFilters;

        let filters =
            transaction_filters("user=7 from=2024-01-02T09:30 max_amount=1500.5 type=BUY").unwrap();
        let text = describe(&filters.params());
        assert_eq!(
            text,
            "userId=7 fromTime=2024-01-02T09:30 toAmount=1500.5 type=BUY"
        );
        assert_eq!(transaction_filters(&text).unwrap(), filters);

        let users = user_filters("name=ada status=active to=2024-06-30").unwrap();
        assert_eq!(user_filters(&describe(&users.params())).unwrap(), users);
    }

    #[test]
    fn quoted_values_keep_their_spaces() {
        let filters =
            transaction_filters(r#"platform="Interactive Brokers" symbol=AAPL"#).unwrap();
        assert_eq!(
            filters.platform,
            Filter::Value("Interactive Brokers".to_string())
        );
        assert_eq!(filters.symbol, Filter::Value("AAPL".to_string()));

        let update = user_update(r#"name="Ada Lovelace""#).unwrap();
        assert_eq!(update.user_name.as_deref(), Some("Ada Lovelace"));

        let text = describe(&filters.params());
        assert_eq!(text, r#"platform="Interactive Brokers" symbol=AAPL"#);
        assert_eq!(transaction_filters(&text).unwrap(), filters);
    }

    #[test]
    fn describe_uses_prompt_syntax() {
        let params = vec![("symbol", "AAPL".to_string()), ("type", "SELL".to_string())];
        assert_eq!(describe(&params), "symbol=AAPL type=SELL");
    }
}
