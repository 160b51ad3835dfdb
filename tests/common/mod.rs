//! Shared test infrastructure for integration tests.

use calamine::{open_workbook_auto, DataType, Reader};
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::sync::{Arc, Mutex};
use std::thread;
use tempfile::TempDir;

/// One request as seen by the stub provider.
#[derive(Debug, Clone)]
pub struct SeenRequest {
    /// Request target, including any query string.
    pub target: String,
    pub headers: Vec<(String, String)>,
    pub body: serde_json::Value,
}

impl SeenRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

type Responder = dyn Fn(&serde_json::Value) -> (u16, String) + Send + Sync;

/// Local HTTP server standing in for a model provider.
pub struct StubProvider {
    pub url: String,
    seen: Arc<Mutex<Vec<SeenRequest>>>,
}

impl StubProvider {
    /// Serve every request with `respond(request_json)` on a background thread.
    pub fn start<F>(path: &str, respond: F) -> Self
    where
        F: Fn(&serde_json::Value) -> (u16, String) + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind stub provider");
        let addr = listener.local_addr().expect("stub address");
        let seen = Arc::new(Mutex::new(Vec::new()));
        let respond: Arc<Responder> = Arc::new(respond);

        let thread_seen = Arc::clone(&seen);
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { break };
                handle(stream, &thread_seen, respond.as_ref());
            }
        });

        Self {
            url: format!("http://{addr}{path}"),
            seen,
        }
    }

    pub fn requests(&self) -> Vec<SeenRequest> {
        self.seen.lock().expect("stub lock").clone()
    }
}

fn handle(stream: TcpStream, seen: &Mutex<Vec<SeenRequest>>, respond: &Responder) {
    let mut reader = BufReader::new(stream.try_clone().expect("clone stream"));

    let mut request_line = String::new();
    reader.read_line(&mut request_line).expect("read request line");
    let target = request_line
        .split_whitespace()
        .nth(1)
        .unwrap_or_default()
        .to_string();

    let mut headers = Vec::new();
    let mut content_length = 0usize;
    let mut chunked = false;
    loop {
        let mut line = String::new();
        reader.read_line(&mut line).expect("read header");
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((key, value)) = line.split_once(':') {
            let (key, value) = (key.trim().to_string(), value.trim().to_string());
            if key.eq_ignore_ascii_case("content-length") {
                content_length = value.parse().expect("content length");
            }
            if key.eq_ignore_ascii_case("transfer-encoding") && value.contains("chunked") {
                chunked = true;
            }
            headers.push((key, value));
        }
    }

    let body = if chunked {
        read_chunked(&mut reader)
    } else {
        let mut body = vec![0u8; content_length];
        reader.read_exact(&mut body).expect("read body");
        body
    };
    let body: serde_json::Value = serde_json::from_slice(&body).expect("request body is JSON");

    let (status, reply) = respond(&body);
    seen.lock().expect("stub lock").push(SeenRequest {
        target,
        headers,
        body,
    });

    let response = format!(
        "HTTP/1.1 {status} Stub\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{reply}",
        reply.len()
    );
    let mut stream = stream;
    stream
        .write_all(response.as_bytes())
        .expect("write response");
    stream.flush().expect("flush response");
}

fn read_chunked(reader: &mut impl BufRead) -> Vec<u8> {
    let mut body = Vec::new();
    loop {
        let mut size_line = String::new();
        reader.read_line(&mut size_line).expect("read chunk size");
        let size_hex = size_line.trim().split(';').next().unwrap_or_default();
        let size = usize::from_str_radix(size_hex, 16).expect("chunk size");
        let mut chunk = vec![0u8; size + 2];
        reader.read_exact(&mut chunk).expect("read chunk");
        if size == 0 {
            return body;
        }
        body.extend_from_slice(&chunk[..size]);
    }
}

/// Feedback text embedded in a composed prompt.
pub fn feedback_of(prompt: &str) -> &str {
    prompt
        .rsplit_once("Feedback: ")
        .map(|(_, tail)| tail.trim().trim_matches('"'))
        .unwrap_or_default()
}

pub fn gemini_reply(text: &str) -> String {
    serde_json::json!({
        "candidates": [{"content": {"parts": [{"text": text}]}}]
    })
    .to_string()
}

pub fn chat_reply(text: &str) -> String {
    serde_json::json!({
        "choices": [{"message": {"role": "assistant", "content": text}}]
    })
    .to_string()
}

/// Write a single-sheet workbook of string cells.
pub fn write_workbook(path: &Path, headers: &[&str], rows: &[&[&str]]) {
    let mut workbook = rust_xlsxwriter::Workbook::new();
    let sheet = workbook.add_worksheet();
    for (col, header) in headers.iter().enumerate() {
        sheet
            .write_string(0, col as u16, *header)
            .expect("write header");
    }
    for (row, values) in rows.iter().enumerate() {
        for (col, value) in values.iter().enumerate() {
            if value.is_empty() {
                continue;
            }
            sheet
                .write_string(row as u32 + 1, col as u16, *value)
                .expect("write cell");
        }
    }
    workbook.save(path).expect("save workbook");
}

/// Read the first worksheet back as rows of strings, header included.
pub fn read_workbook(path: &Path) -> Vec<Vec<String>> {
    let mut workbook = open_workbook_auto(path).expect("open output workbook");
    let name = workbook.sheet_names().first().cloned().expect("a sheet");
    let range = workbook
        .worksheet_range(&name)
        .expect("sheet exists")
        .expect("read sheet");
    range
        .rows()
        .map(|row| {
            row.iter()
                .map(|cell| match cell {
                    DataType::Empty => String::new(),
                    other => other.to_string(),
                })
                .collect()
        })
        .collect()
}

/// Scratch directory with an isolated config home.
pub struct Workspace {
    pub dir: TempDir,
}

impl Default for Workspace {
    fn default() -> Self {
        Self {
            dir: TempDir::new().expect("create temp dir"),
        }
    }
}

impl Workspace {
    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Run `ftag` with no inherited `FTAG_*` settings or user config.
    pub fn ftag(&self, args: &[&str], envs: &[(&str, &str)]) -> Output {
        let mut command = Command::new(env!("CARGO_BIN_EXE_ftag"));
        command
            .args(args)
            .current_dir(self.dir.path())
            .env("XDG_CONFIG_HOME", self.path("config-home"))
            .env("HOME", self.dir.path())
            .env_remove("RUST_LOG");
        for name in ["FTAG_PROVIDER", "FTAG_ENDPOINT", "FTAG_API_KEY", "FTAG_MODEL"] {
            command.env_remove(name);
        }
        for (key, value) in envs {
            command.env(key, value);
        }
        command.output().expect("run ftag")
    }
}

pub fn stderr_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

pub fn stdout_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}
