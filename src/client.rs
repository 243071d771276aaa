use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::ProviderError;
use crate::provider::{DnsProvider, RecordSpec};
use crate::record::{RawRemoteRecord, RemoteRecord};

/// Blocking client for the Porkbun JSON API.
#[derive(Clone)]
pub struct PorkbunClient {
    http: Client,
    endpoint: String,
    api_key: String,
    secret_api_key: String,
}

#[derive(Serialize)]
struct Authenticated<'a, T: Serialize> {
    apikey: &'a str,
    secretapikey: &'a str,
    #[serde(flatten)]
    body: T,
}

#[derive(Serialize)]
struct Empty {}

#[derive(Serialize)]
struct RecordBody<'a> {
    name: &'a str,
    #[serde(rename = "type")]
    record_type: &'a str,
    content: &'a str,
    ttl: u32,
    prio: Option<u16>,
}

impl<'a> From<&'a RecordSpec> for RecordBody<'a> {
    fn from(record: &'a RecordSpec) -> Self {
        RecordBody {
            name: &record.name,
            record_type: record.record_type.as_str(),
            content: &record.content,
            ttl: record.ttl,
            prio: record.prio,
        }
    }
}

#[derive(Serialize)]
struct NameServerBody<'a> {
    ns: &'a [String],
}

#[derive(Deserialize)]
struct PingResponse {
    #[serde(rename = "yourIp")]
    your_ip: Option<String>,
}

#[derive(Deserialize)]
struct RecordsResponse {
    #[serde(default)]
    records: Vec<RawRemoteRecord>,
}

#[derive(Deserialize)]
struct CreateResponse {
    id: Value,
}

#[derive(Deserialize, Default)]
struct StatusResponse {
    status: Option<String>,
    message: Option<String>,
}

/// Turns an HTTP status and body into the JSON payload or a provider error.
///
/// Anything but a 200 carrying a `SUCCESS` status (or no status at all) is an error.
pub fn interpret_response(http_status: u16, body: &str) -> Result<Value, ProviderError> {
    let value: Option<Value> = serde_json::from_str(body).ok();
    let status: StatusResponse = value
        .clone()
        .and_then(|v| serde_json::from_value(v).ok())
        .unwrap_or_default();

    let success = status
        .status
        .as_deref()
        .is_none_or(|s| s.eq_ignore_ascii_case("SUCCESS"));

    match value {
        Some(value) if http_status == 200 && success => Ok(value),
        Some(_) => Err(ProviderError::new(
            status.status.unwrap_or_else(|| "Unknown status".to_string()),
            status.message.unwrap_or_else(|| "Unknown message".to_string()),
        )),
        None => Err(ProviderError::new(
            format!("HTTP {http_status}"),
            if body.trim().is_empty() {
                "Unknown message".to_string()
            } else {
                body.trim().to_string()
            },
        )),
    }
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, ProviderError> {
    serde_json::from_value(value)
        .map_err(|e| ProviderError::new("Invalid response", e.to_string()))
}

impl PorkbunClient {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        secret_api_key: impl Into<String>,
    ) -> Self {
        Self {
            http: Client::new(),
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            secret_api_key: secret_api_key.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.endpoint.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    fn post<T: Serialize>(&self, path: &str, body: T) -> Result<Value, ProviderError> {
        let url = self.url(path);
        debug!("POST {url}");
        let body = Authenticated {
            apikey: &self.api_key,
            secretapikey: &self.secret_api_key,
            body,
        };
        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .map_err(|e| ProviderError::new("Request failed", e.to_string()))?;
        let http_status = response.status().as_u16();
        let text = response
            .text()
            .map_err(|e| ProviderError::new("Request failed", e.to_string()))?;
        interpret_response(http_status, &text)
    }

    /// Returns the caller's public IP; doubles as a credentials check.
    pub fn ping(&self) -> Result<String, ProviderError> {
        let response: PingResponse = decode(self.post("ping", Empty {})?)?;
        Ok(response.your_ip.unwrap_or_default())
    }
}

impl DnsProvider for PorkbunClient {
    fn list_records(&self, domain: &str) -> Result<Vec<RemoteRecord>, ProviderError> {
        let response: RecordsResponse =
            decode(self.post(&format!("dns/retrieve/{domain}"), Empty {})?)?;
        let records = response
            .records
            .into_iter()
            .filter_map(|raw| {
                let id = raw.id.clone();
                match RemoteRecord::try_from(raw) {
                    Ok(record) => Some(record),
                    Err(e) => {
                        warn!("Ignoring record {id}: {e}");
                        None
                    }
                }
            })
            .collect();
        Ok(records)
    }

    fn create_record(&self, domain: &str, record: &RecordSpec) -> Result<String, ProviderError> {
        let response: CreateResponse = decode(self.post(
            &format!("dns/create/{domain}"),
            RecordBody::from(record),
        )?)?;
        Ok(match response.id {
            Value::String(id) => id,
            other => other.to_string(),
        })
    }

    fn update_record(
        &self,
        domain: &str,
        id: &str,
        record: &RecordSpec,
    ) -> Result<(), ProviderError> {
        self.post(&format!("dns/edit/{domain}/{id}"), RecordBody::from(record))?;
        Ok(())
    }

    fn delete_record(&self, domain: &str, id: &str) -> Result<(), ProviderError> {
        self.post(&format!("dns/delete/{domain}/{id}"), Empty {})?;
        Ok(())
    }

    fn set_name_servers(
        &self,
        domain: &str,
        name_servers: &[String],
    ) -> Result<(), ProviderError> {
        self.post(
            &format!("domain/updateNs/{domain}"),
            NameServerBody { ns: name_servers },
        )?;
        Ok(())
    }
}
