//! IonQ REST API client.
//!
//! Speaks the `v0.1` jobs API: `POST {url}` submits, `GET {url}{id}` reads
//! status and results, `PUT {url}{id}/status/cancel` cancels.

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::convert::IonQCircuit;
use crate::error::{IonQError, IonQResult};

/// IonQ jobs endpoint.
pub const IONQ_JOBS_URL: &str = "https://api.ionq.co/v0.1/jobs/";

/// Environment variable overriding [`IONQ_JOBS_URL`].
pub const JOBS_URL_ENV: &str = "IONQ_JOBS_URL";

/// IonQ REST API client.
///
/// Authenticates with `Authorization: apiKey <key>`.
#[derive(Clone)]
pub struct IonQClient {
    client: Client,
    /// Jobs URL, always ending in `/`.
    base_url: String,
    api_key: String,
}

impl std::fmt::Debug for IonQClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IonQClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

impl IonQClient {
    /// Create a client for the production endpoint, or the one in
    /// `IONQ_JOBS_URL` when set.
    pub fn new(api_key: impl Into<String>) -> IonQResult<Self> {
        let base_url = std::env::var(JOBS_URL_ENV)
            .ok()
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| IONQ_JOBS_URL.to_string());
        Self::with_base_url(base_url, api_key)
    }

    /// Create a client targeting a custom jobs URL.
    pub fn with_base_url(base_url: impl Into<String>, api_key: impl Into<String>) -> IonQResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Ok(Self {
            client,
            base_url,
            api_key: api_key.into(),
        })
    }

    /// The jobs URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn auth_header(&self) -> String {
        format!("apiKey {}", self.api_key)
    }

    /// Submit a job.
    #[instrument(skip(self, request), fields(name = %request.name, shots = request.shots))]
    pub async fn submit_job(&self, request: &JobRequest) -> IonQResult<JobResponse> {
        debug!("POST {}", self.base_url);
        let resp = self
            .client
            .post(&self.base_url)
            .header("Authorization", self.auth_header())
            .json(request)
            .send()
            .await
            .map_err(connection_error)?;
        Self::read_response(resp).await
    }

    /// Fetch status, and results once the job completed.
    #[instrument(skip(self))]
    pub async fn get_job(&self, job_id: &str) -> IonQResult<JobResponse> {
        let url = format!("{}{job_id}", self.base_url);
        debug!("GET {}", url);
        let resp = self
            .client
            .get(&url)
            .header("Authorization", self.auth_header())
            .send()
            .await
            .map_err(connection_error)?;
        Self::read_response(resp).await
    }

    /// Cancel a job.
    #[instrument(skip(self))]
    pub async fn cancel_job(&self, job_id: &str) -> IonQResult<JobResponse> {
        let url = format!("{}{job_id}/status/cancel", self.base_url);
        debug!("PUT {}", url);
        let resp = self
            .client
            .put(&url)
            .header("Authorization", self.auth_header())
            .send()
            .await
            .map_err(connection_error)?;
        Self::read_response(resp).await
    }

    /// IonQ reports failures in a JSON body, whatever the HTTP status, so the
    /// body is decoded first and the status only matters when it is not JSON.
    async fn read_response(resp: Response) -> IonQResult<JobResponse> {
        let status = resp.status();
        let text = resp.text().await?;
        match serde_json::from_str::<JobResponse>(&text) {
            Ok(body) => Ok(body),
            Err(_) if !status.is_success() => Err(IonQError::ApiError {
                status: status.as_u16(),
                message: text,
            }),
            Err(e) => Err(IonQError::Json(e)),
        }
    }
}

fn connection_error(e: reqwest::Error) -> IonQError {
    if e.is_connect() || e.is_timeout() {
        IonQError::Connection(e.to_string())
    } else {
        IonQError::Http(e)
    }
}

/// Body of `POST {url}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRequest {
    /// Always `"json"`.
    pub lang: String,
    /// The circuit.
    pub body: IonQCircuit,
    /// `"qpu"` or `"simulator"`.
    pub target: String,
    /// Job name.
    pub name: String,
    /// Number of shots.
    pub shots: u32,
}

impl JobRequest {
    /// Create a JSON-language request.
    pub fn new(body: IonQCircuit, target: impl Into<String>, name: impl Into<String>, shots: u32) -> Self {
        Self {
            lang: "json".into(),
            body,
            target: target.into(),
            name: name.into(),
            shots,
        }
    }
}

/// A number the API sends either bare or as a string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Numeric {
    Number(f64),
    Text(String),
}

impl Numeric {
    /// Numeric value, if it is one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Numeric::Number(v) => Some(*v),
            Numeric::Text(s) => s.trim().parse().ok(),
        }
    }
}

/// Job body returned by every endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobResponse {
    /// Job identifier.
    #[serde(default)]
    pub id: Option<String>,
    /// `ready`, `running`, `completed`, `failed` or `canceled`.
    #[serde(default)]
    pub status: Option<String>,
    /// Error reported by the API.
    #[serde(default)]
    pub error: Option<serde_json::Value>,
    /// Width of the histogram keys.
    #[serde(default)]
    pub qubits: Option<Numeric>,
    /// Results, once completed.
    #[serde(default)]
    pub data: Option<JobData>,
}

impl JobResponse {
    /// The `error` field as text.
    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(|e| match e {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }

    /// Check whether the API reported the job as failed.
    pub fn is_failed(&self) -> bool {
        self.status.as_deref() == Some("failed")
    }
}

/// Results of a completed job.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobData {
    /// Probability of each outcome, keyed by its integer value.
    #[serde(default)]
    pub histogram: BTreeMap<String, Numeric>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::IonQCircuit;

    #[test]
    fn test_debug_redacts_key() {
        let client = IonQClient::with_base_url("http://localhost:1/jobs", "secret-key").unwrap();
        let debug = format!("{client:?}");
        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains("secret-key"));
        assert_eq!(client.base_url(), "http://localhost:1/jobs/");
        assert_eq!(client.auth_header(), "apiKey secret-key");
    }

    #[test]
    fn test_job_request_serialization() {
        let body = IonQCircuit {
            qubits: 1,
            circuit: vec![],
        };
        let req = JobRequest::new(body, "simulator", "job_0", 100);
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["lang"], "json");
        assert_eq!(json["target"], "simulator");
        assert_eq!(json["name"], "job_0");
        assert_eq!(json["shots"], 100);
        assert_eq!(json["body"]["qubits"], 1);
    }

    #[test]
    fn test_completed_response() {
        let resp: JobResponse = serde_json::from_str(
            r#"{"id":"abc","status":"completed","qubits":"2","data":{"histogram":{"0":0.5,"3":"0.5"}}}"#,
        )
        .unwrap();
        assert_eq!(resp.id.as_deref(), Some("abc"));
        assert_eq!(resp.qubits.and_then(|q| q.as_f64()), Some(2.0));
        let hist = resp.data.unwrap().histogram;
        assert_eq!(hist["0"].as_f64(), Some(0.5));
        assert_eq!(hist["3"].as_f64(), Some(0.5));
    }

    #[test]
    fn test_error_message() {
        let resp: JobResponse =
            serde_json::from_str(r#"{"error":{"type":"BadRequest","message":"no"}}"#).unwrap();
        assert!(resp.error_message().unwrap().contains("BadRequest"));

        let resp: JobResponse = serde_json::from_str(r#"{"error":"quota exceeded"}"#).unwrap();
        assert_eq!(resp.error_message().as_deref(), Some("quota exceeded"));

        let resp: JobResponse = serde_json::from_str(r#"{"status":"failed"}"#).unwrap();
        assert!(resp.is_failed());
    }
}
