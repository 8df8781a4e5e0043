#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use admin_client::{ApiClient, Notification, Notifier};
use serde_json::{Value, json};
use wiremock::{MockServer, Request};

/// Keeps every notification for later inspection.
#[derive(Default)]
pub struct Recorder(Mutex<Vec<Notification>>);

impl Recorder {
    pub fn taken(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.0.lock().unwrap())
    }
}

impl Notifier for Recorder {
    fn notify(&self, notification: Notification) {
        self.0.lock().unwrap().push(notification);
    }
}

pub fn client(server: &MockServer) -> ApiClient {
    ApiClient::new(&server.uri()).unwrap()
}

pub fn transaction(id: i64) -> Value {
    json!({
        "id": id,
        "userId": 7,
        "portfolioId": 3,
        "platform": "Alpaca",
        "symbol": "AAPL",
        "type": "BUY",
        "status": "COMPLETED",
        "quantity": 10.0,
        "price": 187.5,
        "totalValue": 1875.0,
        "transactionDate": "2024-03-01T09:30:00"
    })
}

pub fn transactions_page(number: u32, total_pages: u32) -> Value {
    json!({
        "success": true,
        "transactions": {
            "content": [transaction(i64::from(number) + 1)],
            "number": number,
            "totalPages": total_pages
        }
    })
}

pub fn user(id: i64, status: &str) -> Value {
    json!({
        "user_id": id,
        "user_name": "ada",
        "email": "ada@example.com",
        "account_status": status,
        "registration_date": "2023-11-02T08:00:00"
    })
}

pub fn users_page(number: u32, total_pages: u32) -> Value {
    json!({
        "success": true,
        "users": {
            "content": [user(42, "ACTIVE")],
            "number": number,
            "totalPages": total_pages
        }
    })
}

/// Query pairs of a received request, in order.
pub fn query(request: &Request) -> Vec<(String, String)> {
    request
        .url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

pub async fn requests(server: &MockServer) -> Vec<Request> {
    server.received_requests().await.unwrap_or_default()
}

pub fn pairs(expected: &[(&str, &str)]) -> Vec<(String, String)> {
    expected
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

pub fn recorder() -> Arc<Recorder> {
    Arc::new(Recorder::default())
}

/// Polls `done` until it holds, for at most a few seconds of wall time.
///
/// Also works under a paused clock: each virtual sleep lets the runtime
/// poll sockets while real time passes.
pub async fn wait_until(mut done: impl FnMut() -> bool) -> bool {
    let deadline = std::time::Instant::now() + std::time::Duration::from_secs(5);
    while !done() {
        if std::time::Instant::now() > deadline {
            return false;
        }
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }
    true
}

/// Waits until `server` has seen `count` requests.
pub async fn wait_for_requests(server: &MockServer, count: usize) -> Vec<Request> {
    let deadline = std::time::Instant::now() + std::time::Duration::from_secs(5);
    loop {
        let received = requests(server).await;
        if received.len() >= count || std::time::Instant::now() > deadline {
            return received;
        }
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }
}
