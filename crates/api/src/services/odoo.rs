//! Odoo JSON-RPC client for loyalty cards.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use domain::models::{LoyaltyCard, LoyaltyQuery};
use domain::services::{LoyaltySource, SourceError};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::config::OdooConfig;

const LOYALTY_MODEL: &str = "loyalty.card";

pub struct OdooClient {
    client: Client,
    endpoint: String,
    database: String,
    uid: i64,
    api_key: String,
    next_id: AtomicU64,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    message: String,
    #[serde(default)]
    data: Option<RpcErrorData>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorData {
    #[serde(default)]
    message: Option<String>,
}

impl From<RpcError> for SourceError {
    fn from(err: RpcError) -> Self {
        // The nested data message carries the server-side exception text.
        let message = err
            .data
            .and_then(|d| d.message)
            .filter(|m| !m.is_empty())
            .unwrap_or(err.message);
        SourceError::Upstream {
            message,
            code: err.code,
            request_id: None,
        }
    }
}

impl OdooClient {
    pub fn new(config: &OdooConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        Ok(Self {
            client,
            endpoint: format!("{}/jsonrpc", config.url.trim_end_matches('/')),
            database: config.database.clone(),
            uid: config.uid,
            api_key: config.api_key.clone(),
            next_id: AtomicU64::new(1),
        })
    }

    fn search_read_payload(&self, model: &str, query: &LoyaltyQuery) -> Value {
        let mut kwargs = json!({ "fields": query.fields });
        if let Some(order) = &query.order {
            kwargs["order"] = json!(order);
        }
        if let Some(limit) = query.limit {
            kwargs["limit"] = json!(limit);
        }

        json!({
            "jsonrpc": "2.0",
            "method": "call",
            "id": self.next_id.fetch_add(1, Ordering::Relaxed),
            "params": {
                "service": "object",
                "method": "execute_kw",
                "args": [
                    self.database,
                    self.uid,
                    self.api_key,
                    model,
                    "search_read",
                    [query.domain],
                    kwargs
                ]
            }
        })
    }

    async fn call(&self, payload: &Value) -> Result<Value, SourceError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SourceError::Timeout
                } else {
                    SourceError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Upstream {
                message: format!("Odoo returned HTTP {}", status.as_u16()),
                code: Some(i64::from(status.as_u16())),
                request_id: None,
            });
        }

        let body: RpcResponse = response
            .json()
            .await
            .map_err(|e| SourceError::InvalidResponse(format!("Malformed JSON-RPC body: {}", e)))?;

        if let Some(error) = body.error {
            return Err(error.into());
        }
        body.result
            .ok_or_else(|| SourceError::InvalidResponse("JSON-RPC body has no result".into()))
    }
}

#[async_trait::async_trait]
impl LoyaltySource for OdooClient {
    async fn get_loyalty_cards(
        &self,
        query: &LoyaltyQuery,
    ) -> Result<Vec<LoyaltyCard>, SourceError> {
        let payload = self.search_read_payload(LOYALTY_MODEL, query);
        let result = self.call(&payload).await?;

        let cards: Vec<LoyaltyCard> = serde_json::from_value(result)
            .map_err(|e| SourceError::InvalidResponse(format!("Malformed loyalty card: {}", e)))?;
        debug!(count = cards.len(), "Fetched loyalty cards");
        Ok(cards)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(url: String) -> OdooClient {
        OdooClient::new(&OdooConfig {
            enabled: true,
            url,
            database: "bookings".into(),
            uid: 2,
            api_key: "secret".into(),
            timeout_ms: 2_000,
        })
        .expect("client")
    }

    #[test]
    fn builds_execute_kw_payload() {
        let client = test_client("http://odoo.local/".into());
        let payload = client.search_read_payload(LOYALTY_MODEL, &LoyaltyQuery::all_cards());

        assert_eq!(client.endpoint, "http://odoo.local/jsonrpc");
        assert_eq!(payload["params"]["service"], "object");
        assert_eq!(payload["params"]["method"], "execute_kw");
        let args = payload["params"]["args"].as_array().unwrap();
        assert_eq!(args[0], "bookings");
        assert_eq!(args[1], 2);
        assert_eq!(args[3], "loyalty.card");
        assert_eq!(args[4], "search_read");
        assert_eq!(args[5], json!([[]]));
        assert_eq!(args[6]["order"], "id desc");
        assert_eq!(args[6]["fields"].as_array().unwrap().len(), 5);
        assert!(args[6].get("limit").is_none());
    }

    #[tokio::test]
    async fn decodes_cards_with_false_fields() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/jsonrpc"))
            .and(body_partial_json(json!({ "params": { "method": "execute_kw" } })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": 1,
                "result": [
                    {
                        "id": 8,
                        "code": "044a-1b2c",
                        "points": 42.5,
                        "expiration_date": "2025-12-31",
                        "partner_id": [5, "Jane Roe"]
                    },
                    {
                        "id": 7,
                        "code": false,
                        "points": 0.0,
                        "expiration_date": false,
                        "partner_id": false
                    }
                ]
            })))
            .mount(&server)
            .await;

        let cards = test_client(server.uri())
            .get_loyalty_cards(&LoyaltyQuery::all_cards())
            .await
            .expect("cards");

        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].usable_code(), Some("044a-1b2c"));
        assert_eq!(cards[0].expiration_date, NaiveDate::from_ymd_opt(2025, 12, 31));
        assert!(cards[1].code.is_none());
        assert!(cards[1].partner_id.is_none());
    }

    #[tokio::test]
    async fn rpc_error_becomes_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/jsonrpc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": 1,
                "error": {
                    "code": 200,
                    "message": "Odoo Server Error",
                    "data": { "message": "Access Denied" }
                }
            })))
            .mount(&server)
            .await;

        let err = test_client(server.uri())
            .get_loyalty_cards(&LoyaltyQuery::all_cards())
            .await
            .unwrap_err();

        assert_eq!(err.user_message(), "Access Denied");
    }

    #[tokio::test]
    async fn http_failure_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/jsonrpc"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = test_client(server.uri())
            .get_loyalty_cards(&LoyaltyQuery::all_cards())
            .await
            .unwrap_err();

        assert!(matches!(err, SourceError::Upstream { code: Some(503), .. }));
    }
}
