//! Purpose: End-to-end tests for the HTTP/JSON server and remote client.
//! Exports: None (integration test module).
//! Role: Validate store/get/check and error propagation across TCP.
//! Invariants: Uses loopback-only server with a temp data directory.
//! Invariants: Server processes are cleaned up on drop.

use graphstore::api::{decode, ErrorKind, RemoteClient};
use serde_json::{json, Value};
use std::io::Read;
use std::net::{SocketAddr, TcpListener};
use std::process::{Child, Command, Stdio};
use std::sync::{Mutex, MutexGuard};
use std::thread::sleep;
use std::time::{Duration, Instant};

type TestResult<T> = Result<T, Box<dyn std::error::Error>>;

static SERVER_LOCK: Mutex<()> = Mutex::new(());

struct TestServer {
    child: Child,
    base_url: String,
    token: Option<String>,
    _server_guard: MutexGuard<'static, ()>,
}

impl TestServer {
    fn start(data_dir: &std::path::Path) -> TestResult<Self> {
        Self::start_with_options(data_dir, None, None)
    }

    fn start_with_token(data_dir: &std::path::Path, token: &str) -> TestResult<Self> {
        Self::start_with_options(data_dir, Some(token), None)
    }

    fn start_with_edge_limit(data_dir: &std::path::Path, max_edges: u64) -> TestResult<Self> {
        Self::start_with_options(data_dir, None, Some(max_edges))
    }

    fn start_with_options(
        data_dir: &std::path::Path,
        token: Option<&str>,
        max_edges: Option<u64>,
    ) -> TestResult<Self> {
        let guard = SERVER_LOCK
            .lock()
            .unwrap_or_else(|poison| poison.into_inner());
        let mut last_err: Option<Box<dyn std::error::Error>> = None;
        for _attempt in 0..3 {
            let port = pick_port()?;
            let bind = format!("127.0.0.1:{port}");
            let base_url = format!("http://{bind}");

            let mut command = Command::new(env!("CARGO_BIN_EXE_graphstore"));
            command
                .arg("--dir")
                .arg(data_dir)
                .arg("serve")
                .arg("--bind")
                .arg(&bind)
                .stdout(Stdio::null())
                .stderr(Stdio::piped());
            if let Some(token) = token {
                command.arg("--token").arg(token);
            }
            if let Some(max_edges) = max_edges {
                command.arg("--max-edges").arg(max_edges.to_string());
            }
            let mut child = command.spawn()?;

            match wait_for_server(&mut child, bind.parse()?) {
                Ok(()) => {
                    return Ok(Self {
                        child,
                        base_url,
                        token: token.map(str::to_string),
                        _server_guard: guard,
                    });
                }
                Err(err) => {
                    let _ = child.kill();
                    let _ = child.wait();
                    last_err = Some(err);
                    sleep(Duration::from_millis(30));
                }
            }
        }

        Err(last_err.unwrap_or_else(|| "server failed to start".into()))
    }

    fn client(&self) -> TestResult<RemoteClient> {
        Ok(RemoteClient::new(self.base_url.clone())?)
    }

    fn client_with_token(&self) -> TestResult<RemoteClient> {
        let mut client = RemoteClient::new(self.base_url.clone())?;
        if let Some(token) = &self.token {
            client = client.with_token(token.clone());
        }
        Ok(client)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

fn sample_payload() -> Value {
    json!({
        "vertexes": ["v1", "v2", "v3"],
        "edges": [
            {"source": "v1", "destination": "v2", "weight": 5},
            {"source": "v1", "destination": "v3", "weight": 15},
            {"source": "v2", "destination": "v3", "weight": 25},
        ],
    })
}

#[test]
fn remote_store_get_check() -> TestResult<()> {
    let temp_dir = tempfile::tempdir()?;
    let server = TestServer::start(temp_dir.path())?;
    let client = server.client()?;

    let graph = decode(&sample_payload(), None)?;
    let id = client.save_graph(&graph)?;

    let fetched = client.graph(&id)?;
    assert_eq!(fetched, graph);

    assert!(client.has_vertex(&id, "v2")?);
    assert!(!client.has_vertex(&id, "v9")?);
    Ok(())
}

#[test]
fn remote_missing_graph_is_not_found() -> TestResult<()> {
    let temp_dir = tempfile::tempdir()?;
    let server = TestServer::start(temp_dir.path())?;
    let client = server.client()?;

    let err = client.graph("no-such-graph").expect_err("missing graph");
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(err.id(), Some("no-such-graph"));
    Ok(())
}

#[test]
fn server_rejects_invalid_documents_with_400() -> TestResult<()> {
    let temp_dir = tempfile::tempdir()?;
    let server = TestServer::start(temp_dir.path())?;

    let payload = json!({
        "vertexes": ["v1"],
        "edges": [{"source": "v1", "destination": "ghost", "weight": 1}],
    });
    let url = format!("{}/api/graphs", server.base_url);
    let err = ureq::post(&url)
        .set("Content-Type", "application/json")
        .send_string(&payload.to_string())
        .expect_err("invalid graph");
    let ureq::Error::Status(status, resp) = err else {
        return Err("expected status error".into());
    };
    assert_eq!(status, 400);
    let body: Value = serde_json::from_str(&resp.into_string()?)?;
    assert_eq!(body["error"]["kind"], "Usage");
    assert_eq!(
        body["error"]["message"],
        "edge references vertex 'ghost' which is not declared in 'vertexes'"
    );
    Ok(())
}

#[test]
fn server_enforces_its_edge_limit() -> TestResult<()> {
    let temp_dir = tempfile::tempdir()?;
    let server = TestServer::start_with_edge_limit(temp_dir.path(), 2)?;

    let url = format!("{}/api/graphs", server.base_url);
    let err = ureq::post(&url)
        .set("Content-Type", "application/json")
        .send_string(&sample_payload().to_string())
        .expect_err("over the limit");
    let ureq::Error::Status(status, resp) = err else {
        return Err("expected status error".into());
    };
    assert_eq!(status, 400);
    let body: Value = serde_json::from_str(&resp.into_string()?)?;
    assert_eq!(
        body["error"]["message"],
        "graph exceeds the maximum edge count of 2"
    );
    Ok(())
}

#[test]
fn token_is_required_when_configured() -> TestResult<()> {
    let temp_dir = tempfile::tempdir()?;
    let server = TestServer::start_with_token(temp_dir.path(), "secret")?;
    let graph = decode(&sample_payload(), None)?;

    let unauthenticated = server.client()?;
    let err = unauthenticated
        .save_graph(&graph)
        .expect_err("missing token");
    assert_eq!(err.kind(), ErrorKind::Permission);

    let authenticated = server.client_with_token()?;
    let id = authenticated.save_graph(&graph)?;
    assert!(authenticated.has_vertex(&id, "v1")?);
    Ok(())
}

fn pick_port() -> TestResult<u16> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    let port = listener.local_addr()?.port();
    drop(listener);
    Ok(port)
}

fn wait_for_server(child: &mut Child, addr: SocketAddr) -> TestResult<()> {
    // healthz never requires auth, so it works for every configuration.
    let url = format!("http://{addr}/healthz");
    let start = Instant::now();
    loop {
        if let Ok(resp) = ureq::get(&url).call() {
            if resp.status() == 200 {
                return Ok(());
            }
        }
        if let Some(status) = child.try_wait()? {
            let mut stderr = String::new();
            if let Some(mut pipe) = child.stderr.take() {
                let _ = pipe.read_to_string(&mut stderr);
            }
            let detail = stderr.trim();
            return Err(format!(
                "server exited before ready (status: {status}, stderr: {})",
                if detail.is_empty() { "<empty>" } else { detail }
            )
            .into());
        }
        if start.elapsed() > Duration::from_secs(8) {
            return Err("server did not start in time".into());
        }
        sleep(Duration::from_millis(20));
    }
}
