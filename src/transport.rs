//! HTTP transport with a fixed-interval retry policy
//!
//! Success is decided purely by membership of the response status in the
//! caller's accepted set. Unaccepted server errors (5xx) are retried at a
//! constant interval; any other unaccepted status is non-transient and fails
//! immediately. The interval is deliberately constant, with no jitter and no
//! exponential growth: a session issues a handful of requests at most.

use crate::error::FreenomError;
use reqwest::{Client, Method, Response, StatusCode, Url};
use std::time::Duration;

/// Maximum number of attempts per request, the first one included
const MAX_ATTEMPTS: u32 = 3;

/// Fixed wait between attempts after a server error
pub(crate) const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(3);

/// Upper bound on the body excerpt carried by an `UnexpectedStatus` error
const PREVIEW_MAX_LEN: usize = 500;

/// Sends requests against a fixed origin.
///
/// Cookies ride on the jar installed on the underlying client; the transport
/// itself never reads or writes them.
#[derive(Clone, Debug)]
pub(crate) struct Transport {
    client: Client,
    base_url: Url,
    retry_delay: Duration,
}

impl Transport {
    pub fn new(client: Client, base_url: Url, retry_delay: Duration) -> Self {
        Self {
            client,
            base_url,
            retry_delay,
        }
    }

    /// Issue `method` against `path` (relative to the base URL), optionally
    /// with a form-encoded body, and return the first response whose status
    /// is in `accepted`.
    ///
    /// The request is rebuilt from its parts on every attempt, so the form
    /// body is re-encoded rather than replayed from a consumed buffer.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        form: Option<&[(String, String)]>,
        accepted: &[StatusCode],
    ) -> Result<Response, FreenomError> {
        let url = self
            .base_url
            .join(path)
            .map_err(|e| FreenomError::Validation(format!("cannot build URL for {path}: {e}")))?;

        let mut attempts = 0;
        loop {
            attempts += 1;
            log::debug!("{method} {path} (attempt {attempts}/{MAX_ATTEMPTS})");

            let mut builder = self.client.request(method.clone(), url.clone());
            if let Some(fields) = form {
                builder = builder.form(&fields);
            }
            let response = builder.send().await?;
            let status = response.status();
            log::debug!("{method} {path} => {status}");

            if accepted.contains(&status) {
                return Ok(response);
            }

            // Only server errors get another attempt; every other unaccepted
            // status is non-transient.
            if status.is_server_error() && attempts < MAX_ATTEMPTS {
                log::warn!(
                    "{path} answered {status}, retrying in {:?} ({attempts}/{MAX_ATTEMPTS})",
                    self.retry_delay
                );
                tokio::time::sleep(self.retry_delay).await;
                continue;
            }

            let body = response.text().await.unwrap_or_default();
            return Err(FreenomError::UnexpectedStatus {
                path: path.to_string(),
                status,
                preview: body.chars().take(PREVIEW_MAX_LEN).collect(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transport_for(server: &mockito::ServerGuard) -> Transport {
        let client = Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap();
        let base_url = Url::parse(&server.url()).unwrap();
        Transport::new(client, base_url, Duration::from_millis(1))
    }

    #[tokio::test]
    async fn accepted_status_returns_response_unmodified() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/page.php")
            .with_status(200)
            .with_body("hello")
            .expect(1)
            .create_async()
            .await;

        let transport = transport_for(&server);
        let response = transport
            .request(Method::GET, "page.php", None, &[StatusCode::OK])
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.text().await.unwrap(), "hello");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn redirect_status_can_be_the_accepted_one() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/page.php")
            .with_status(302)
            .with_header("location", "/elsewhere.php")
            .expect(1)
            .create_async()
            .await;

        let transport = transport_for(&server);
        let response = transport
            .request(Method::GET, "page.php", None, &[StatusCode::FOUND])
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FOUND);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn server_error_is_retried_exactly_three_times() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/page.php")
            .with_status(503)
            .with_body("unavailable")
            .expect(3)
            .create_async()
            .await;

        let transport = transport_for(&server);
        let err = transport
            .request(Method::GET, "page.php", None, &[StatusCode::OK])
            .await
            .unwrap_err();

        match err {
            FreenomError::UnexpectedStatus {
                path,
                status,
                preview,
            } => {
                assert_eq!(path, "page.php");
                assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
                assert_eq!(preview, "unavailable");
            }
            other => panic!("expected UnexpectedStatus, got {other:?}"),
        }
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn server_error_recovery_succeeds_on_third_attempt() {
        use std::io::{Read, Write};
        use std::net::TcpListener;

        // mockito cannot sequence responses, so a bare listener answers the
        // first two attempts with 503 and the third with 200.
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let responses: [&str; 3] = [
            "HTTP/1.1 503 Service Unavailable\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
            "HTTP/1.1 503 Service Unavailable\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
            "HTTP/1.1 200 OK\r\nContent-Length: 9\r\nConnection: close\r\n\r\nrecovered",
        ];
        let handle = std::thread::spawn(move || {
            let mut served = 0;
            for response in responses {
                let (mut stream, _) = listener.accept().unwrap();
                let mut request = Vec::new();
                let mut chunk = [0u8; 1024];
                loop {
                    let n = stream.read(&mut chunk).unwrap();
                    if n == 0 {
                        break;
                    }
                    request.extend_from_slice(&chunk[..n]);
                    if request.windows(4).any(|w| w == b"\r\n\r\n") {
                        break;
                    }
                }
                stream.write_all(response.as_bytes()).unwrap();
                served += 1;
            }
            served
        });

        let client = Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap();
        let base_url = Url::parse(&format!("http://{addr}/")).unwrap();
        let transport = Transport::new(client, base_url, Duration::from_millis(1));

        let response = transport
            .request(Method::GET, "page.php", None, &[StatusCode::OK])
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.text().await.unwrap(), "recovered");
        assert_eq!(handle.join().unwrap(), 3);
    }

    #[tokio::test]
    async fn client_error_fails_after_a_single_attempt() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/page.php")
            .with_status(404)
            .expect(1)
            .create_async()
            .await;

        let transport = transport_for(&server);
        let err = transport
            .request(Method::GET, "page.php", None, &[StatusCode::OK])
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            FreenomError::UnexpectedStatus {
                status: StatusCode::NOT_FOUND,
                ..
            }
        ));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn unbuildable_url_is_a_validation_error() {
        let client = Client::builder().build().unwrap();
        let transport = Transport::new(
            client,
            Url::parse("http://127.0.0.1:1/").unwrap(),
            Duration::from_millis(1),
        );

        // An absolute path with an out-of-range port cannot be joined; no
        // request is ever sent.
        let err = transport
            .request(Method::GET, "http://host:99999999/", None, &[StatusCode::OK])
            .await
            .unwrap_err();

        assert!(matches!(err, FreenomError::Validation(_)));
    }

    #[tokio::test]
    async fn unexpected_redirect_is_not_retried() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/page.php")
            .with_status(302)
            .with_header("location", "/elsewhere.php")
            .expect(1)
            .create_async()
            .await;

        let transport = transport_for(&server);
        let err = transport
            .request(Method::GET, "page.php", None, &[StatusCode::OK])
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            FreenomError::UnexpectedStatus {
                status: StatusCode::FOUND,
                ..
            }
        ));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn body_preview_is_truncated_to_500_chars() {
        let mut server = mockito::Server::new_async().await;
        let body = "x".repeat(600);
        server
            .mock("GET", "/page.php")
            .with_status(400)
            .with_body(&body)
            .create_async()
            .await;

        let transport = transport_for(&server);
        let err = transport
            .request(Method::GET, "page.php", None, &[StatusCode::OK])
            .await
            .unwrap_err();

        match err {
            FreenomError::UnexpectedStatus { preview, .. } => {
                assert_eq!(preview.chars().count(), 500);
            }
            other => panic!("expected UnexpectedStatus, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn form_body_is_resent_on_every_attempt() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/submit.php")
            .match_body(mockito::Matcher::UrlEncoded(
                "field".into(),
                "value".into(),
            ))
            .with_status(500)
            .expect(3)
            .create_async()
            .await;

        let transport = transport_for(&server);
        let form = vec![("field".to_string(), "value".to_string())];
        let err = transport
            .request(
                Method::POST,
                "submit.php",
                Some(form.as_slice()),
                &[StatusCode::FOUND],
            )
            .await
            .unwrap_err();

        assert!(matches!(err, FreenomError::UnexpectedStatus { .. }));
        mock.assert_async().await;
    }
}
