// src/fetch/mod.rs

use anyhow::Result;

use crate::client::ResultsClient;
use crate::decode::{self, Record};

/// Fetch the index of available result files.
///
/// The JSON array from `index.json` is returned as-is, order preserved,
/// with no validation of the entries. Transport errors propagate.
pub async fn fetch_index(client: &ResultsClient) -> Result<Vec<String>> {
    client
        .get_with("index.json", |body| {
            serde_json::from_str(body).map_err(Into::into)
        })
        .await
}

/// Fetch one named CSV result file and decode it into records.
///
/// `csv_file` is concatenated into the request path unvalidated. Transport
/// failures reject with the underlying error; decode failures do not —
/// they resolve to `Ok(None)` after logging diagnostics, so callers must
/// check for `None` explicitly rather than relying on `Err`.
pub async fn fetch_results(
    client: &ResultsClient,
    csv_file: &str,
) -> Result<Option<Vec<Record>>> {
    client
        .get_with(csv_file, |body| Ok(decode::parse_results(body)))
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::Config;
    use serde_json::json;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one canned HTTP response on an ephemeral port, returning the
    /// root URL to point the client at.
    async fn serve_once(status_line: &str, body: &str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let response = format!(
            "HTTP/1.1 {status_line}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = sock.read(&mut buf).await;
            let _ = sock.write_all(response.as_bytes()).await;
        });
        format!("http://{addr}")
    }

    fn client_for(api_root: String) -> ResultsClient {
        let config = Config {
            api_root,
            timeout: Duration::from_secs(5),
        };
        ResultsClient::new(&config).unwrap()
    }

    #[tokio::test]
    async fn index_passthrough_preserves_order() {
        let root = serve_once("200 OK", r#"["a.csv","b.csv"]"#).await;
        let index = fetch_index(&client_for(root)).await.unwrap();
        assert_eq!(index, vec!["a.csv", "b.csv"]);
    }

    #[tokio::test]
    async fn results_decode_well_formed_body() {
        let root = serve_once("200 OK", "x,y\n1,true\n2,false\n").await;
        let rows = fetch_results(&client_for(root), "f.csv")
            .await
            .unwrap()
            .expect("clean body should decode");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["x"], json!(1));
        assert_eq!(rows[0]["y"], json!(true));
        assert_eq!(rows[1]["x"], json!(2));
        assert_eq!(rows[1]["y"], json!(false));
    }

    #[tokio::test]
    async fn malformed_body_resolves_to_none_not_error() {
        let root = serve_once("200 OK", "x,y\n1\n2,3,4\n").await;
        let parsed = fetch_results(&client_for(root), "bad.csv").await.unwrap();
        assert!(parsed.is_none());
    }

    #[tokio::test]
    async fn server_error_rejects_instead_of_resolving_to_none() {
        let root = serve_once("500 Internal Server Error", "boom").await;
        let err = fetch_results(&client_for(root), "f.csv").await.unwrap_err();
        let status = err
            .chain()
            .find_map(|c| c.downcast_ref::<reqwest::Error>().and_then(|e| e.status()));
        assert_eq!(status, Some(reqwest::StatusCode::INTERNAL_SERVER_ERROR));
    }

    #[tokio::test]
    async fn stalled_server_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (sock, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
            drop(sock);
        });

        let config = Config {
            api_root: format!("http://{addr}"),
            timeout: Duration::from_millis(200),
        };
        let client = ResultsClient::new(&config).unwrap();
        let err = fetch_index(&client).await.unwrap_err();
        let timed_out = err
            .chain()
            .any(|c| c.downcast_ref::<reqwest::Error>().is_some_and(|e| e.is_timeout()));
        assert!(timed_out, "expected timeout, got: {err:#}");
    }
}
