// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

#![allow(dead_code)]

use buildwatch::error::fault_code;
use buildwatch::xmlrpc::{self, Value};
use http_body_util::{BodyExt, Full};
use hyper::body::{Bytes, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use std::collections::BTreeMap;
use std::convert::Infallible;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Handle to a running buildwatch process.
pub struct DaemonHandle {
    child: Child,
    log_lines: Arc<Mutex<Vec<String>>>,
    _stdout_thread: std::thread::JoinHandle<()>,
    _stderr_thread: std::thread::JoinHandle<()>,
}

impl DaemonHandle {
    /// Start buildwatch with `args`, pointing it at `server_url` when given.
    pub fn start(server_url: Option<&str>, args: &[&str]) -> Self {
        let bin = env!("CARGO_BIN_EXE_buildwatch");
        let mut command = Command::new(bin);
        command
            .args(args)
            .env_remove("SUPERVISOR_SERVER_URL")
            .env_remove("SUPERVISOR_USERNAME")
            .env_remove("SUPERVISOR_PASSWORD")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(url) = server_url {
            command.env("SUPERVISOR_SERVER_URL", url);
        }
        let mut child = command.spawn().expect("failed to start buildwatch");

        let stdout = child.stdout.take().expect("failed to capture stdout");
        let stderr = child.stderr.take().expect("failed to capture stderr");
        let log_lines = Arc::new(Mutex::new(Vec::<String>::new()));

        // simple_logger writes INFO to stdout, WARN/ERROR to stderr.
        let stdout_thread = capture(stdout, "[daemon]", Arc::clone(&log_lines));
        let stderr_thread = capture(stderr, "[daemon:err]", Arc::clone(&log_lines));

        Self {
            child,
            log_lines,
            _stdout_thread: stdout_thread,
            _stderr_thread: stderr_thread,
        }
    }

    /// Wait until a log line containing `pattern` appears, or timeout.
    pub fn wait_for_log(&self, pattern: &str, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if self.count_log_matches(pattern) > 0 {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            std::thread::sleep(Duration::from_millis(50));
        }
    }

    pub fn wait_for_log_default(&self, pattern: &str) -> bool {
        self.wait_for_log(pattern, DEFAULT_TIMEOUT)
    }

    /// Count how many log lines contain `pattern`.
    pub fn count_log_matches(&self, pattern: &str) -> usize {
        let lines = self.log_lines.lock().unwrap();
        lines.iter().filter(|l| l.contains(pattern)).count()
    }

    pub fn send_signal(&self, sig: Signal) {
        let pid = self.child.id() as i32;
        signal::kill(Pid::from_raw(pid), sig).expect("failed to send signal to buildwatch");
    }

    /// Send SIGTERM and wait for buildwatch to exit. Returns the exit status.
    pub fn stop(&mut self) -> std::process::ExitStatus {
        self.send_signal(Signal::SIGTERM);
        self.wait_with_timeout(DEFAULT_TIMEOUT)
    }

    /// Wait for buildwatch to exit within the given timeout, killing it otherwise.
    pub fn wait_with_timeout(&mut self, timeout: Duration) -> std::process::ExitStatus {
        let deadline = Instant::now() + timeout;
        loop {
            match self
                .child
                .try_wait()
                .expect("failed to check buildwatch status")
            {
                Some(status) => return status,
                None => {
                    if Instant::now() >= deadline {
                        self.child.kill().ok();
                        return self.child.wait().expect("failed to wait on killed buildwatch");
                    }
                    std::thread::sleep(Duration::from_millis(50));
                }
            }
        }
    }
}

impl Drop for DaemonHandle {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

fn capture<R>(
    stream: R,
    prefix: &'static str,
    lines: Arc<Mutex<Vec<String>>>,
) -> std::thread::JoinHandle<()>
where
    R: std::io::Read + Send + 'static,
{
    std::thread::spawn(move || {
        for line in BufReader::new(stream).lines() {
            match line {
                Ok(l) => {
                    eprintln!("{prefix} {l}");
                    lines.lock().unwrap().push(l);
                }
                Err(_) => break,
            }
        }
    })
}

/// Write the version marker.
pub fn write_marker(path: &Path, content: &str) {
    std::fs::write(path, content)
        .unwrap_or_else(|e| panic!("failed to write {}: {e}", path.display()));
}

struct FakeProcess {
    group: String,
    name: String,
    pid: i64,
    statename: &'static str,
}

#[derive(Default)]
struct SupervisorState {
    processes: BTreeMap<String, FakeProcess>,
    calls: Vec<String>,
    next_pid: i64,
}

/// A supervisord XML-RPC endpoint on 127.0.0.1. Stopped processes report
/// STOPPED right away.
pub struct FakeSupervisor {
    port: u16,
    state: Arc<Mutex<SupervisorState>>,
    _thread: std::thread::JoinHandle<()>,
}

impl FakeSupervisor {
    /// Serve the given `(group, name, state)` processes.
    pub fn start(processes: &[(&str, &str, &'static str)]) -> Self {
        let mut state = SupervisorState {
            next_pid: 4_190_000,
            ..SupervisorState::default()
        };
        for (group, name, statename) in processes {
            let pid = if *statename == "STOPPED" {
                0
            } else {
                state.next_pid += 1;
                state.next_pid
            };
            state.processes.insert(
                format!("{group}:{name}"),
                FakeProcess {
                    group: group.to_string(),
                    name: name.to_string(),
                    pid,
                    statename,
                },
            );
        }
        let state = Arc::new(Mutex::new(state));

        let (port_tx, port_rx) = std::sync::mpsc::channel();
        let server_state = Arc::clone(&state);
        let thread = std::thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("failed to build runtime");
            runtime.block_on(serve(server_state, port_tx));
        });
        let port = port_rx
            .recv_timeout(DEFAULT_TIMEOUT)
            .expect("fake supervisord did not start");

        Self {
            port,
            state,
            _thread: thread,
        }
    }

    pub fn url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    /// Every method call received, as `method name`.
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn calls_to(&self, method: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| c.strip_prefix(method).map(|rest| rest.trim().to_string()))
            .collect()
    }

    pub fn statename(&self, qualified_name: &str) -> Option<&'static str> {
        let state = self.state.lock().unwrap();
        state.processes.get(qualified_name).map(|p| p.statename)
    }
}

async fn serve(state: Arc<Mutex<SupervisorState>>, port_tx: std::sync::mpsc::Sender<u16>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind fake supervisord");
    let port = listener.local_addr().expect("no local addr").port();
    port_tx.send(port).expect("failed to report port");

    loop {
        let Ok((stream, _)) = listener.accept().await else {
            continue;
        };
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            let service = service_fn(move |request: Request<Incoming>| {
                let state = Arc::clone(&state);
                async move { Ok::<_, Infallible>(handle(&state, request).await) }
            });
            let _ = http1::Builder::new()
                .serve_connection(TokioIo::new(stream), service)
                .await;
        });
    }
}

async fn handle(
    state: &Mutex<SupervisorState>,
    request: Request<Incoming>,
) -> Response<Full<Bytes>> {
    let body = match request.into_body().collect().await {
        Ok(body) => body.to_bytes(),
        Err(_) => return xml_response(xmlrpc::encode_fault(fault_code::FAILED, "bad body")),
    };
    let (method, params) = match xmlrpc::parse_call(&body) {
        Ok(call) => call,
        Err(e) => return xml_response(xmlrpc::encode_fault(fault_code::FAILED, &e.to_string())),
    };
    let name = params
        .first()
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let mut state = state.lock().unwrap();
    state.calls.push(format!("{method} {name}").trim().to_string());
    let result = match method.as_str() {
        "supervisor.getAllProcessInfo" => Ok(Value::Array(
            state.processes.values().map(process_info).collect(),
        )),
        "supervisor.getProcessInfo" => state
            .processes
            .get(&name)
            .map(process_info)
            .ok_or((fault_code::BAD_NAME, name.clone())),
        "supervisor.stopProcess" => match state.processes.get_mut(&name) {
            None => Err((fault_code::BAD_NAME, name.clone())),
            Some(p) if p.statename != "RUNNING" && p.statename != "STARTING" => {
                Err((fault_code::NOT_RUNNING, name.clone()))
            }
            Some(p) => {
                p.statename = "STOPPED";
                p.pid = 0;
                Ok(Value::Bool(true))
            }
        },
        "supervisor.startProcess" => {
            state.next_pid += 1;
            let pid = state.next_pid;
            match state.processes.get_mut(&name) {
                None => Err((fault_code::BAD_NAME, name.clone())),
                Some(p) if p.statename != "STOPPED" => {
                    Err((fault_code::ALREADY_STARTED, name.clone()))
                }
                Some(p) => {
                    p.statename = "RUNNING";
                    p.pid = pid;
                    Ok(Value::Bool(true))
                }
            }
        }
        _ => Err((fault_code::UNKNOWN_METHOD, method.clone())),
    };

    match result {
        Ok(value) => xml_response(xmlrpc::encode_response(&value)),
        Err((code, message)) => xml_response(xmlrpc::encode_fault(code, &message)),
    }
}

fn process_info(process: &FakeProcess) -> Value {
    Value::Struct(BTreeMap::from([
        ("group".to_string(), Value::from(process.group.as_str())),
        ("name".to_string(), Value::from(process.name.as_str())),
        ("pid".to_string(), Value::Int(process.pid)),
        ("statename".to_string(), Value::from(process.statename)),
    ]))
}

fn xml_response(body: String) -> Response<Full<Bytes>> {
    Response::builder()
        .header("Content-Type", "text/xml")
        .body(Full::new(Bytes::from(body)))
        .expect("valid response")
}
