#![allow(dead_code)]

use std::{
    collections::{HashMap, VecDeque},
    fs,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use edgar_toolkit::{Edgar, EdgarConfig, EdgarUrls, RetryPolicy};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
};

pub const TEST_USER_AGENT: &str = "edgar-toolkit tests test@example.com";

pub fn fixture_path(relative: impl AsRef<Path>) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(relative)
}

pub fn read_fixture(relative: impl AsRef<Path>) -> String {
    fs::read_to_string(fixture_path(relative)).expect("fixture file should be readable")
}

/// One scripted reply of the mock server.
#[derive(Debug, Clone)]
pub struct MockResponse {
    pub status: u16,
    pub body: String,
    pub headers: Vec<(String, String)>,
    pub delay: Duration,
}

impl MockResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self::status(200).with_body(body)
    }

    pub fn fixture(relative: &str) -> Self {
        Self::ok(read_fixture(relative))
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            body: String::new(),
            headers: Vec::new(),
            delay: Duration::ZERO,
        }
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// A request the mock server received.
#[derive(Debug, Clone)]
pub struct Hit {
    pub path: String,
    pub user_agent: Option<String>,
    pub at: Instant,
}

#[derive(Default)]
struct State {
    routes: Mutex<HashMap<String, VecDeque<MockResponse>>>,
    hits: Mutex<Vec<Hit>>,
}

impl State {
    /// Pops the next scripted response; the last one repeats forever.
    fn next_response(&self, path: &str) -> MockResponse {
        let mut routes = self.routes.lock().unwrap();
        match routes.get_mut(path) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) => queue
                .front()
                .cloned()
                .unwrap_or_else(|| MockResponse::status(404)),
            None => MockResponse::status(404).with_body("not found"),
        }
    }
}

/// Minimal HTTP/1.1 server on a random local port, routing by path.
pub struct MockServer {
    base_url: String,
    state: Arc<State>,
}

impl MockServer {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        let state = Arc::new(State::default());

        let server_state = Arc::clone(&state);
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let state = Arc::clone(&server_state);
                tokio::spawn(async move {
                    let _ = serve(stream, state).await;
                });
            }
        });

        Self {
            base_url: format!("http://{address}"),
            state,
        }
    }

    /// Scripts the replies for `path`, in order.
    pub fn route(&self, path: &str, responses: Vec<MockResponse>) -> &Self {
        self.state
            .routes
            .lock()
            .unwrap()
            .insert(path.to_string(), responses.into());
        self
    }

    pub fn url(&self) -> &str {
        &self.base_url
    }

    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn hits(&self) -> Vec<Hit> {
        self.state.hits.lock().unwrap().clone()
    }

    pub fn hit_count(&self, path: &str) -> usize {
        self.hits().iter().filter(|hit| hit.path == path).count()
    }
}

async fn serve(mut stream: TcpStream, state: Arc<State>) -> std::io::Result<()> {
    let mut request = Vec::new();
    let mut chunk = [0u8; 4096];
    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
        let read = stream.read(&mut chunk).await?;
        if read == 0 {
            return Ok(());
        }
        request.extend_from_slice(&chunk[..read]);
    }

    let request = String::from_utf8_lossy(&request);
    let target = request.split_whitespace().nth(1).unwrap_or("/");
    let path = target.split('?').next().unwrap_or(target).to_string();
    let user_agent = request.lines().find_map(|line| {
        let (name, value) = line.split_once(':')?;
        name.eq_ignore_ascii_case("user-agent")
            .then(|| value.trim().to_string())
    });

    state.hits.lock().unwrap().push(Hit {
        path: path.clone(),
        user_agent,
        at: Instant::now(),
    });
    let response = state.next_response(&path);

    if !response.delay.is_zero() {
        tokio::time::sleep(response.delay).await;
    }

    let mut head = format!(
        "HTTP/1.1 {} Mock\r\nContent-Length: {}\r\nConnection: close\r\n",
        response.status,
        response.body.len()
    );
    for (name, value) in &response.headers {
        head.push_str(&format!("{name}: {value}\r\n"));
    }
    head.push_str("\r\n");

    stream.write_all(head.as_bytes()).await?;
    stream.write_all(response.body.as_bytes()).await?;
    stream.shutdown().await
}

/// Retry delays short enough for tests.
pub fn fast_retries(max_retries: u32) -> RetryPolicy {
    RetryPolicy {
        max_retries,
        base_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(5),
        rate_limit_base_delay: Duration::from_millis(1),
        rate_limit_max_delay: Duration::from_millis(5),
    }
}

pub fn test_config(server: &MockServer) -> EdgarConfig {
    EdgarConfig::new(TEST_USER_AGENT)
        .with_base_urls(EdgarUrls::single_host(server.url()))
        .with_request_delay(Duration::ZERO)
        .with_retry_policy(fast_retries(2))
}

/// A client pointed at `server` with no rate gate and fast retries.
pub fn mock_edgar(server: &MockServer) -> Edgar {
    Edgar::with_config(test_config(server)).unwrap()
}
