//! Shared test infrastructure for integration tests.

use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::sync::{Arc, Mutex};
use std::thread;

pub const BIN: &str = env!("CARGO_BIN_EXE_review-submit");
pub const EMPLOYEE_FIELD: &str = "entry.111";

/// One request as seen by the fake endpoint.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub body: String,
}

/// Local stand-in for the survey endpoint. Every request gets the same
/// canned HTML body; requests are recorded in arrival order.
pub struct FakeEndpoint {
    url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl FakeEndpoint {
    pub fn start(body: &str) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind fake endpoint");
        let addr = listener.local_addr().expect("local addr");
        let requests = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&requests);
        let body = body.to_string();
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else {
                    continue;
                };
                serve(stream, &body, &recorded);
            }
        });
        Self {
            url: format!("http://{addr}/forms/d/e/test/formResponse"),
            requests,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().expect("lock requests").clone()
    }
}

fn serve(
    stream: TcpStream,
    body: &str,
    recorded: &Mutex<Vec<RecordedRequest>>,
) -> Option<()> {
    let mut reader = BufReader::new(stream.try_clone().ok()?);
    let mut request_line = String::new();
    reader.read_line(&mut request_line).ok()?;
    let mut parts = request_line.split_whitespace();
    let method = parts.next()?.to_string();
    let path = parts.next()?.to_string();

    let mut content_length = 0usize;
    loop {
        let mut header = String::new();
        if reader.read_line(&mut header).ok()? == 0 {
            break;
        }
        let header = header.trim_end();
        if header.is_empty() {
            break;
        }
        if let Some((name, value)) = header.split_once(':') {
            if name.eq_ignore_ascii_case("content-length") {
                content_length = value.trim().parse().unwrap_or(0);
            }
        }
    }
    let mut raw_body = vec![0u8; content_length];
    reader.read_exact(&mut raw_body).ok()?;
    recorded.lock().ok()?.push(RecordedRequest {
        method,
        path,
        body: String::from_utf8_lossy(&raw_body).into_owned(),
    });

    let mut stream = stream;
    let response = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    );
    stream.write_all(response.as_bytes()).ok()?;
    stream.flush().ok()
}

/// A URL nothing listens on.
pub fn closed_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind probe port");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    format!("http://{addr}/forms/d/e/closed/formResponse")
}

/// Write a minimal config pointing at `form_url`.
pub fn write_config(dir: &Path, form_url: &str) -> PathBuf {
    let config = serde_json::json!({
        "schema_version": 1,
        "form_url": form_url,
        "fields": {
            "employee_name": EMPLOYEE_FIELD,
            "team": "entry.222",
        },
        "request_timeout_ms": 2000,
        "settle_delay_ms": 0,
        "surface_dir": dir.join("surfaces"),
    });
    std::fs::create_dir_all(dir.join("surfaces")).expect("create surface root");
    let path = dir.join("config.json");
    std::fs::write(
        &path,
        serde_json::to_string_pretty(&config).expect("serialize config"),
    )
    .expect("write config");
    path
}

/// Run the binary with an environment that cannot leak a user config.
pub fn run(args: &[&str]) -> Output {
    Command::new(BIN)
        .args(args)
        .env_remove("REVIEW_SUBMIT_CONFIG")
        .env_remove("REVIEW_SUBMIT_FORM_URL")
        .env_remove("REVIEW_SUBMIT_LOG")
        .output()
        .expect("run review-submit")
}

pub fn stdout_json(output: &Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).unwrap_or_else(|err| {
        panic!(
            "parse stdout as json: {err}\nstdout: {}\nstderr: {}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        )
    })
}
