use std::sync::{Arc, Mutex, mpsc};
use std::thread;
use std::time::Duration;

use serde_json::{Value, json};

pub const TITLE_LINK: &str = "https://example.com/t/1";

/// In-process stand-in for the scrape api.
pub struct ScrapeStub {
    pub base_url: String,
    requests: Arc<Mutex<Vec<String>>>,
    shutdown_tx: Option<mpsc::Sender<()>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl ScrapeStub {
    pub fn spawn() -> Self {
        let server = tiny_http::Server::http("127.0.0.1:0").expect("start scrape stub server");
        let addr = server.server_addr();
        let base_url = format!("http://{addr}");

        let requests = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&requests);
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        let handle = thread::spawn(move || {
            loop {
                if shutdown_rx.try_recv().is_ok() {
                    break;
                }

                let mut request = match server.recv_timeout(Duration::from_millis(50)) {
                    Ok(Some(req)) => req,
                    Ok(None) => continue,
                    Err(_) => break,
                };

                let path = request.url().to_string();
                let mut body = String::new();
                if request.method() != &tiny_http::Method::Post
                    || request.as_reader().read_to_string(&mut body).is_err()
                {
                    let _ = request.respond(
                        tiny_http::Response::from_string("bad request").with_status_code(400),
                    );
                    continue;
                }
                let Ok(parsed) = serde_json::from_str::<Value>(&body) else {
                    let _ = request.respond(
                        tiny_http::Response::from_string("invalid json").with_status_code(400),
                    );
                    continue;
                };
                let url = parsed.get("url").and_then(|v| v.as_str()).unwrap_or("");
                let target_name = parsed
                    .get("targetName")
                    .and_then(|v| v.as_str())
                    .unwrap_or("");
                seen.lock()
                    .expect("requests lock")
                    .push(format!("{path} {url}"));

                let (status, response_body) = match path.as_str() {
                    "/api/favicon-title" if url.contains("down") => {
                        (500, json!({ "error": "upstream failure" }))
                    }
                    "/api/favicon-title" => (
                        200,
                        json!({
                            "success": true,
                            "faviconUrl": format!("{url}/favicon.ico"),
                            "siteTitle": "Example",
                        }),
                    ),
                    "/api/search-links" if target_name.to_lowercase().contains("foo") => (
                        200,
                        json!({
                            "pairedData": [
                                { "link": TITLE_LINK, "name": "Foo", "src": "https://x/1.jpg" }
                            ]
                        }),
                    ),
                    "/api/search-links" => (200, json!({ "pairedData": [] })),
                    "/api/chapter-links" if url == TITLE_LINK => (
                        200,
                        json!({
                            "success": true,
                            "chapterLinks": [
                                { "href": format!("{TITLE_LINK}/c2"), "text": "Chapter 2" },
                                { "href": format!("{TITLE_LINK}/c1"), "text": "Chapter 1" },
                            ]
                        }),
                    ),
                    "/api/chapter-links" => (200, json!({ "success": false })),
                    "/api/images" if url.ends_with("/c1") => (
                        200,
                        json!({
                            "success": true,
                            "images": ["https://img.example/1-1.jpg", " https://img.example/1-2.jpg "],
                        }),
                    ),
                    "/api/images" if url.ends_with("/c2") => (
                        200,
                        json!({ "success": true, "images": ["https://img.example/2-1.jpg"] }),
                    ),
                    "/api/images" if url.ends_with("/empty") => {
                        (200, json!({ "success": true, "images": [] }))
                    }
                    "/api/images" => (200, json!({ "success": false })),
                    _ => (404, json!({ "error": "not found" })),
                };

                let header =
                    tiny_http::Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..])
                        .expect("build header");
                let response = tiny_http::Response::from_string(response_body.to_string())
                    .with_status_code(status)
                    .with_header(header);
                let _ = request.respond(response);
            }
        });

        Self {
            base_url,
            requests,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        }
    }

    /// `"<path> <url>"` for every request received so far.
    #[allow(dead_code)]
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().expect("requests lock").clone()
    }

    #[allow(dead_code)]
    pub fn count(&self, path: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.split(' ').next() == Some(path))
            .count()
    }
}

impl Drop for ScrapeStub {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
