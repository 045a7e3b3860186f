use std::time::Duration;

use once_cell::sync::Lazy;
use reqwest::Client;

static HTTP_CLIENT: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .user_agent(concat!("twitchmote_bot/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(Duration::from_secs(10))
        .timeout(Duration::from_secs(30))
        .build()
        .expect("Failed to build HTTP client")
});

/// Shared connection pool. Callers that need a longer deadline override it per
/// request with `RequestBuilder::timeout`.
pub fn get_http_client() -> &'static Client {
    &HTTP_CLIENT
}
