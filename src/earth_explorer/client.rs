use super::{ApiKey, Credentials, Envelope, InventoryApi, RequestParams, SearchResults};
use crate::config::ClientConfig;
use crate::error::ApiError;
use anyhow::{Context, Result};
use reqwest::Client;
use serde_json::{json, Value};
use tracing::debug;
use url::Url;

pub struct EarthExplorer {
    client: Client,
    base_url: Url,
}

impl EarthExplorer {
    pub fn new(client: Client, base_url: Url) -> Self {
        Self { client, base_url }
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .danger_accept_invalid_certs(!config.verify_tls)
            .build()
            .context("Failed to create HTTP client")?;
        let base_url = config.base_url().context("Invalid inventory base url")?;
        Ok(Self::new(client, base_url))
    }

    /// Posts `body` as the `jsonRequest` form field and unwraps the response envelope.
    async fn call(self: &Self, endpoint: &str, body: &str) -> Result<Value, ApiError> {
        let url = self.base_url.join(endpoint)?;
        debug!(%url, "inventory request");

        let transport = |source: reqwest::Error| {
            if source.is_timeout() {
                ApiError::Timeout {
                    endpoint: endpoint.to_string(),
                }
            } else {
                ApiError::Transport {
                    endpoint: endpoint.to_string(),
                    source,
                }
            }
        };

        let response = self
            .client
            .post(url)
            .form(&[("jsonRequest", body)])
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Http {
                endpoint: endpoint.to_string(),
                status,
            });
        }

        let text = response.text().await.map_err(transport)?;
        let envelope: Envelope =
            serde_json::from_str(&text).map_err(|source| ApiError::Decode {
                endpoint: endpoint.to_string(),
                source,
            })?;
        envelope.into_data()
    }
}

impl InventoryApi for EarthExplorer {
    async fn login(self: &Self, credentials: &Credentials) -> Result<ApiKey, ApiError> {
        let password = credentials.password()?;
        let body = json!({"username": credentials.username, "password": password}).to_string();
        match self.call("login", &body).await? {
            Value::String(key) if !key.is_empty() => Ok(key),
            _ => Err(ApiError::MissingApiKey),
        }
    }

    async fn search(self: &Self, params: &RequestParams) -> Result<SearchResults, ApiError> {
        let data = self.call("search", &params.to_json()).await?;
        serde_json::from_value(data).map_err(|source| ApiError::Decode {
            endpoint: "search".to_string(),
            source,
        })
    }

    async fn download(self: &Self, params: &RequestParams) -> Result<Value, ApiError> {
        self.call("download", &params.to_json()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::earth_explorer::Dataset;
    use std::io::{Read, Write};
    use std::net::{TcpListener, TcpStream};
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;

    fn config_for(port: u16, timeout_secs: u64) -> ClientConfig {
        ClientConfig {
            base_url: Some(format!("http://127.0.0.1:{port}/inventory/json/v/1.4.1")),
            timeout_secs,
            ..Default::default()
        }
    }

    /// Base url of a local port nothing listens on.
    fn closed_port_config() -> ClientConfig {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        config_for(port, 5)
    }

    /// Reads one request, head and body, from the stream.
    fn read_request(stream: &mut TcpStream) -> String {
        let mut buf = vec![];
        let mut chunk = [0u8; 1024];
        loop {
            let n = stream.read(&mut chunk).unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&buf);
            if let Some(head_end) = text.find("\r\n\r\n") {
                let length = text[..head_end]
                    .lines()
                    .filter_map(|line| line.split_once(':'))
                    .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
                    .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= head_end + 4 + length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    /// Answers a single request with `status` and `body` after `delay`. The
    /// raw request comes back through the receiver.
    fn serve_once(
        status: &'static str,
        body: &'static str,
        delay: Duration,
    ) -> (u16, mpsc::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let _ = tx.send(read_request(&mut stream));
            thread::sleep(delay);
            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\n\
                 Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = stream.write_all(response.as_bytes());
        });
        (port, rx)
    }

    fn alice() -> Credentials {
        Credentials::new("alice", Some("secret".to_string()))
    }

    #[tokio::test]
    async fn test_login_posts_json_request_form() {
        let (port, requests) = serve_once(
            "200 OK",
            r#"{"errorCode":null,"error":"","data":"9ccf44a1c7e74d7f94769956b54cd889"}"#,
            Duration::ZERO,
        );
        let api = EarthExplorer::from_config(&config_for(port, 5)).unwrap();

        let key = api.login(&alice()).await.unwrap();
        assert_eq!(key, "9ccf44a1c7e74d7f94769956b54cd889");

        let request = requests.recv().unwrap();
        let (head, body) = request.split_once("\r\n\r\n").unwrap();
        assert!(head.starts_with("POST /inventory/json/v/1.4.1/login "));
        assert!(head
            .to_ascii_lowercase()
            .contains("content-type: application/x-www-form-urlencoded"));

        let fields = url::form_urlencoded::parse(body.as_bytes()).collect::<Vec<_>>();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].0, "jsonRequest");
        let payload: Value = serde_json::from_str(&fields[0].1).unwrap();
        assert_eq!(payload, json!({"username": "alice", "password": "secret"}));
    }

    #[tokio::test]
    async fn test_login_error_envelope_is_remote() {
        let (port, _requests) = serve_once(
            "200 OK",
            r#"{"errorCode":"AUTH_INVALID","error":"bad credentials","data":null}"#,
            Duration::ZERO,
        );
        let api = EarthExplorer::from_config(&config_for(port, 5)).unwrap();

        let err = api.login(&alice()).await.unwrap_err();
        assert!(err.is_remote());
        assert_eq!(err.to_string(), "AUTH_INVALID: bad credentials");
    }

    #[tokio::test]
    async fn test_login_without_key_fails() {
        for body in [
            r#"{"errorCode":null,"error":"","data":null}"#,
            r#"{"errorCode":null,"error":""}"#,
            r#"{"errorCode":null,"error":"","data":""}"#,
            r#"{"errorCode":null,"error":"","data":42}"#,
        ] {
            let (port, _requests) = serve_once("200 OK", body, Duration::ZERO);
            let api = EarthExplorer::from_config(&config_for(port, 5)).unwrap();
            let err = api.login(&alice()).await.unwrap_err();
            assert!(matches!(err, ApiError::MissingApiKey), "{body}: {err:?}");
        }
    }

    #[tokio::test]
    async fn test_slow_server_times_out() {
        let (port, _requests) = serve_once(
            "200 OK",
            r#"{"errorCode":null,"error":"","data":"key"}"#,
            Duration::from_secs(3),
        );
        let api = EarthExplorer::from_config(&config_for(port, 1)).unwrap();

        let err = api.login(&alice()).await.unwrap_err();
        assert!(matches!(err, ApiError::Timeout { ref endpoint } if endpoint == "login"));
        assert_eq!(err.to_string(), "login request timed out");
    }

    #[tokio::test]
    async fn test_http_status_error() {
        let (port, _requests) =
            serve_once("503 Service Unavailable", "maintenance", Duration::ZERO);
        let api = EarthExplorer::from_config(&config_for(port, 5)).unwrap();
        let params = RequestParams::new(&"key".to_string(), Dataset::LandsatTmC1, 1);

        let err = api.search(&params).await.unwrap_err();
        assert!(matches!(
            err,
            ApiError::Http { ref endpoint, status }
                if endpoint == "search" && status == reqwest::StatusCode::SERVICE_UNAVAILABLE
        ));
    }

    #[tokio::test]
    async fn test_search_decodes_results() {
        let (port, requests) = serve_once(
            "200 OK",
            r#"{"errorCode":null,"error":"","data":{"totalHits":1,"nextRecord":2,
                "results":[{"displayId":"LC08_L1TP_038037_20190612","entityId":"LC8038"}]}}"#,
            Duration::ZERO,
        );
        let api = EarthExplorer::from_config(&config_for(port, 5)).unwrap();
        let mut params = RequestParams::new(&"key-7".to_string(), Dataset::Landsat8C1, 10);
        params.with_months(&[6]);

        let results = api.search(&params).await.unwrap();
        assert_eq!(results.total_hits, 1);
        assert_eq!(results.results[0].display_id, "LC08_L1TP_038037_20190612");
        assert_eq!(results.extra["nextRecord"], json!(2));

        let request = requests.recv().unwrap();
        let (_, body) = request.split_once("\r\n\r\n").unwrap();
        let (_, payload) = url::form_urlencoded::parse(body.as_bytes()).next().unwrap();
        let payload: Value = serde_json::from_str(&payload).unwrap();
        assert_eq!(payload["apiKey"], json!("key-7"));
        assert_eq!(payload["datasetName"], json!("LANDSAT_8_C1"));
        assert_eq!(payload["months"], json!([6]));
    }

    #[tokio::test]
    async fn test_download_returns_data() {
        let (port, _requests) = serve_once(
            "200 OK",
            r#"{"errorCode":null,"error":"","data":[{"entityId":"LC8038","url":"https://x"}]}"#,
            Duration::ZERO,
        );
        let api = EarthExplorer::from_config(&config_for(port, 5)).unwrap();
        let mut params = RequestParams::with_api_key(&"key".to_string());
        params.set("entityIds", json!(["LC8038"]));

        let data = api.download(&params).await.unwrap();
        assert_eq!(data[0]["entityId"], json!("LC8038"));
    }

    #[tokio::test]
    async fn test_login_transport_failure() {
        let api = EarthExplorer::from_config(&closed_port_config()).unwrap();
        let err = api.login(&alice()).await.unwrap_err();
        assert!(matches!(err, ApiError::Transport { ref endpoint, .. } if endpoint == "login"));
        assert!(!err.is_remote());
    }

    #[tokio::test]
    async fn test_download_transport_failure() {
        let api = EarthExplorer::from_config(&closed_port_config()).unwrap();
        let params = RequestParams::with_api_key(&"key".to_string());
        let err = api.download(&params).await.unwrap_err();
        assert!(matches!(err, ApiError::Transport { ref endpoint, .. } if endpoint == "download"));
    }
}
