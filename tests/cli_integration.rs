//! Integration tests for the memdev binary
//!
//! Each test spins up a one-shot HTTP server on localhost, points memdev at it
//! with `--base-url`, and checks both the command output and the developer
//! console table printed with `--console`.

use std::fs;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::path::Path;
use std::process::{Command, Output};
use std::thread::{self, JoinHandle};

use tempfile::TempDir;

/// Isolated home, log and state directories plus a config file pointing at them
struct Sandbox {
    dir: TempDir,
}

impl Sandbox {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let state = dir.path().join("state");
        fs::write(
            dir.path().join("memdev.yaml"),
            format!("paths:\n  state: {}\n", state.display()),
        )
        .unwrap();
        Self { dir }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn run(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_memdev"))
            .env("HOME", self.path())
            .env("XDG_DATA_HOME", self.path().join("data"))
            .env("XDG_CONFIG_HOME", self.path().join("config"))
            .env("NO_COLOR", "1")
            .env_remove("MEMDEV_API_BASE_URL")
            .env_remove("MEMDEV_CONFIG")
            .env_remove("MEMDEV_DIR")
            .env_remove("RUST_LOG")
            .arg("--config")
            .arg(self.path().join("memdev.yaml"))
            .args(args)
            .output()
            .expect("Failed to execute memdev")
    }
}

/// Serve exactly one request, returning the base URL and a handle yielding the request head
fn serve_once(status_line: &str, body: &str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status_line,
        body.len(),
        body
    );

    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let head = read_request_head(&mut stream);
        stream.write_all(response.as_bytes()).unwrap();
        stream.flush().unwrap();
        head
    });

    (base, handle)
}

fn read_request_head(stream: &mut TcpStream) -> String {
    let mut reader = BufReader::new(stream.try_clone().unwrap());
    let mut head = String::new();
    let mut content_length = 0usize;

    loop {
        let mut line = String::new();
        if reader.read_line(&mut line).unwrap() == 0 || line == "\r\n" {
            break;
        }
        if let Some((name, value)) = line.split_once(':')
            && name.eq_ignore_ascii_case("content-length")
        {
            content_length = value.trim().parse().unwrap_or(0);
        }
        head.push_str(&line);
    }

    let mut body = vec![0u8; content_length];
    reader.read_exact(&mut body).unwrap();
    head
}

fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    format!("http://{}", listener.local_addr().unwrap())
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

#[test]
fn test_health_prints_status_and_console() {
    let sandbox = Sandbox::new();
    let (base, server) = serve_once("200 OK", r#"{"status":"ok"}"#);

    let output = sandbox.run(&["health", "--base-url", &base, "--console", "-o", "json"]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let body: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(body["status"], "ok");

    let console = stderr(&output);
    assert!(console.contains("Developer Console (1)"), "stderr: {}", console);
    assert!(console.contains("GET"));
    assert!(console.contains("200"));
    assert!(console.contains(&format!("{}/health", base)));

    let head = server.join().unwrap();
    assert!(head.starts_with("GET /health HTTP/1.1"), "head: {}", head);
    assert!(head.to_lowercase().contains("content-type: application/json"));
}

#[test]
fn test_store_server_error_is_reported_and_logged() {
    let sandbox = Sandbox::new();
    let (base, server) = serve_once("500 Internal Server Error", "internal error");

    let output = sandbox.run(&["store", "--base-url", &base, "--console", "-u", "u1", "-t", "user:hi"]);

    assert!(!output.status.success());
    let err = stderr(&output);
    assert!(err.contains("500 Internal Server Error: internal error"), "stderr: {}", err);
    assert!(err.contains("Developer Console (1)"));
    assert!(err.contains("POST"));

    let head = server.join().unwrap();
    assert!(head.starts_with("POST /v1/store HTTP/1.1"), "head: {}", head);
}

#[test]
fn test_retrieve_uses_and_persists_user_id() {
    let sandbox = Sandbox::new();
    let body = r#"{"results":[{"id":"m1","content":"likes tea","layer":"semantic","type":"explicit","score":0.91}]}"#;
    let (base, server) = serve_once("200 OK", body);

    let output = sandbox.run(&["retrieve", "--base-url", &base, "-u", "alice", "-q", "green tea", "-o", "json"]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let result: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(result["results"][0]["content"], "likes tea");

    let head = server.join().unwrap();
    assert!(
        head.starts_with("GET /v1/retrieve?user_id=alice&query=green+tea&limit=10&offset=0 HTTP/1.1"),
        "head: {}",
        head
    );

    let shown = sandbox.run(&["user", "show"]);
    assert!(shown.status.success());
    assert_eq!(stdout(&shown).trim(), "alice");
}

#[test]
fn test_network_failure_logs_no_event() {
    let sandbox = Sandbox::new();
    let base = closed_port_url();

    let output = sandbox.run(&["health", "--base-url", &base, "--console"]);

    assert!(!output.status.success());
    assert!(stderr(&output).contains("Developer Console (0)"));
}

#[test]
fn test_browse_exports_results() {
    let sandbox = Sandbox::new();
    let body = r#"{"results":[{"id":"m1","content":"likes tea","layer":"semantic","type":"explicit"}]}"#;
    let (base, server) = serve_once("200 OK", body);
    let export = sandbox.path().join("export.json");

    let output = sandbox.run(&[
        "browse",
        "--base-url",
        &base,
        "-u",
        "bob",
        "--export",
        export.to_str().unwrap(),
        "-o",
        "json",
    ]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let exported: serde_json::Value = serde_json::from_str(&fs::read_to_string(&export).unwrap()).unwrap();
    assert_eq!(exported[0]["id"], "m1");

    let head = server.join().unwrap();
    assert!(head.starts_with("GET /v1/retrieve?user_id=bob&limit=20&offset=0 HTTP/1.1"), "head: {}", head);
}

#[test]
fn test_config_get_reads_file() {
    let sandbox = Sandbox::new();

    let output = sandbox.run(&["config", "get", "api.origin"]);

    assert!(output.status.success());
    assert_eq!(stdout(&output).trim(), "http://localhost");
}
