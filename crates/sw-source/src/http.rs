//! Client for the store data-access service.
//!
//! Every response carries an envelope: `HttpResponseCode` (200 on success)
//! and `ResponseCode`, where 2001 means rows were read and 3003 means no
//! record exists. Any other `ResponseCode` is surfaced as [`SourceError::Api`].

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use sw_schemas::{BusinessHoursRule, PollingObservation, StoreId, StoreStatus};
use tracing::debug;

use crate::{decode_weekday, parse_local_time, parse_timestamp_utc, SourceError, StoreDataSource};

const RECORD_READ_SUCCESS: i64 = 2001;
const RECORD_NOT_FOUND: i64 = 3003;

#[derive(Debug, Clone)]
pub struct HttpStoreDataSource {
    http: reqwest::Client,
    base_url: String,
    order_by: String,
}

impl HttpStoreDataSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::new_with_order(base_url, "asc")
    }

    pub fn new_with_order(base_url: impl Into<String>, order_by: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            order_by: order_by.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn decode<T: DeserializeOwned>(
        &self,
        op: &'static str,
        resp: Result<reqwest::Response, reqwest::Error>,
    ) -> Result<T, SourceError> {
        let resp = resp.map_err(|e| SourceError::Transport(format!("{op}: {e}")))?;
        let status = resp.status();
        if status.is_server_error() {
            return Err(SourceError::Transport(format!("{op}: http status {}", status.as_u16())));
        }
        if !status.is_success() {
            return Err(SourceError::Api {
                code: Some(i64::from(status.as_u16())),
                message: format!("{op}: http status {}", status.as_u16()),
            });
        }
        let body = resp
            .bytes()
            .await
            .map_err(|e| SourceError::Transport(format!("{op}: body read failed: {e}")))?;
        serde_json::from_slice(&body).map_err(|e| SourceError::Decode(format!("{op}: {e}")))
    }
}

/// `Ok(true)` when rows were read, `Ok(false)` when nothing exists.
fn check_envelope(op: &'static str, env: &Envelope) -> Result<bool, SourceError> {
    if let Some(code) = env.http_response_code {
        if code != 200 {
            return Err(SourceError::Api {
                code: Some(code),
                message: format!("{op}: HttpResponseCode {code}"),
            });
        }
    }
    match env.response_code {
        Some(RECORD_READ_SUCCESS) => Ok(true),
        Some(RECORD_NOT_FOUND) => Ok(false),
        code => Err(SourceError::Api {
            code,
            message: format!("{op}: unexpected ResponseCode"),
        }),
    }
}

// ---------------------------------------------------------------------------
// Wire shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "HttpResponseCode")]
    http_response_code: Option<i64>,
    #[serde(rename = "ResponseCode")]
    response_code: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct UniqueStoresResponse {
    #[serde(flatten)]
    envelope: Envelope,
    #[serde(rename = "StoreId", default)]
    store_ids: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct RowsResponse<R> {
    #[serde(flatten)]
    envelope: Envelope,
    #[serde(rename = "Rows", default = "Vec::new")]
    rows: Vec<R>,
}

#[derive(Debug, Deserialize)]
struct TimezoneResponse {
    #[serde(flatten)]
    envelope: Envelope,
    #[serde(rename = "Row")]
    row: Option<TimezoneRow>,
}

#[derive(Debug, Deserialize)]
struct TimezoneRow {
    #[serde(rename = "ST_Timezone")]
    timezone: String,
}

#[derive(Debug, Deserialize)]
struct StatusRow {
    #[serde(rename = "SS_StoreStatus")]
    status: String,
    #[serde(rename = "SS_TimestampUtc")]
    timestamp_utc: String,
}

#[derive(Debug, Deserialize)]
struct DetailsRow {
    #[serde(rename = "SD_Day")]
    day: i64,
    #[serde(rename = "SD_StartTimeLocal")]
    start_time_local: String,
    #[serde(rename = "SD_EndTimeLocal")]
    end_time_local: String,
}

/// Store ids are BIGINT upstream but may arrive as JSON strings too.
fn store_id_from_json(v: &Value) -> Result<StoreId, SourceError> {
    match v {
        Value::Number(n) => Ok(n.to_string()),
        Value::String(s) => Ok(s.trim().to_string()),
        other => Err(SourceError::Decode(format!("store id must be number or string, got {other}"))),
    }
}

#[async_trait::async_trait]
impl StoreDataSource for HttpStoreDataSource {
    fn source_name(&self) -> &'static str {
        "das_http"
    }

    async fn list_store_ids(&self) -> Result<Vec<StoreId>, SourceError> {
        let op = "list_store_ids";
        let resp = self.http.get(self.url("/unique/stores")).send().await;
        let body: UniqueStoresResponse = self.decode(op, resp).await?;
        if !check_envelope(op, &body.envelope)? {
            return Ok(Vec::new());
        }
        body.store_ids.iter().map(store_id_from_json).collect()
    }

    async fn get_timezone(&self, store_id: &str) -> Result<Option<String>, SourceError> {
        let op = "get_timezone";
        let resp = self
            .http
            .get(self.url(&format!("/store/{store_id}/timezone")))
            .send()
            .await;
        let body: TimezoneResponse = self.decode(op, resp).await?;
        if !check_envelope(op, &body.envelope)? {
            debug!(store_id = %store_id, "no timezone record");
            return Ok(None);
        }
        Ok(body.row.map(|r| r.timezone))
    }

    async fn get_business_hours(&self, store_id: &str) -> Result<Vec<BusinessHoursRule>, SourceError> {
        let op = "get_business_hours";
        let resp = self
            .http
            .post(self.url(&format!("/store/{store_id}")))
            .query(&[("order_by", self.order_by.as_str())])
            .send()
            .await;
        let body: RowsResponse<DetailsRow> = self.decode(op, resp).await?;
        if !check_envelope(op, &body.envelope)? {
            return Ok(Vec::new());
        }

        body.rows
            .into_iter()
            .map(|r| -> Result<BusinessHoursRule, SourceError> {
                let bad_time =
                    |raw: &str| SourceError::Decode(format!("{op}: store {store_id}: bad time '{raw}'"));
                Ok(BusinessHoursRule {
                    store_id: store_id.to_string(),
                    weekday: decode_weekday(store_id, r.day)?,
                    start_time_local: parse_local_time(&r.start_time_local)
                        .ok_or_else(|| bad_time(&r.start_time_local))?,
                    end_time_local: parse_local_time(&r.end_time_local)
                        .ok_or_else(|| bad_time(&r.end_time_local))?,
                })
            })
            .collect()
    }

    async fn get_observations(&self, store_id: &str) -> Result<Vec<PollingObservation>, SourceError> {
        let op = "get_observations";
        let resp = self
            .http
            .post(self.url(&format!("/store_status/{store_id}")))
            .query(&[("order_by", self.order_by.as_str())])
            .send()
            .await;
        let body: RowsResponse<StatusRow> = self.decode(op, resp).await?;
        if !check_envelope(op, &body.envelope)? {
            return Ok(Vec::new());
        }

        body.rows
            .into_iter()
            .map(|r| -> Result<PollingObservation, SourceError> {
                let status = StoreStatus::parse(&r.status).ok_or_else(|| {
                    SourceError::Decode(format!("{op}: store {store_id}: bad status '{}'", r.status))
                })?;
                let timestamp_utc = parse_timestamp_utc(&r.timestamp_utc).ok_or_else(|| {
                    SourceError::Decode(format!(
                        "{op}: store {store_id}: bad timestamp '{}'",
                        r.timestamp_utc
                    ))
                })?;
                Ok(PollingObservation {
                    store_id: store_id.to_string(),
                    timestamp_utc,
                    status,
                })
            })
            .collect()
    }
}
