use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use serde::{Serialize, Deserialize};

use crate::{
    engine,
    args,
    io,
};
use engine::{
    methods,
    EngineError,
    EngineSession,
    LaunchConfig,
    TaskArguments,
};

/// Bridge engine provider.
/// Spawns a bridge process that owns the real engine connection and talks
/// to it with one JSON object per line over stdin/stdout.
#[derive(Debug)]
pub struct Method {
    /// Arguments for the bridge process.
    method_args: MethodCfg,
}
impl Method {
    pub fn new() -> args::ProcResult<Self> {
        Ok(Method{method_args: MethodCfg::default()})
    }
}

/// Deserializer from the method cfg file.
#[derive(Debug, Serialize, Deserialize)]
struct MethodCfg {
    #[serde(default = "MethodCfg::default_command", alias = "cmd")]
    command: String,
    #[serde(default = "MethodCfg::default_args")]
    args: Vec<String>,
    #[serde(default)]
    working_dir: Option<PathBuf>,
    #[serde(default = "MethodCfg::default_exit_timeout_s")]
    exit_timeout_s: u64,
}
impl MethodCfg {
    pub fn default_command() -> String {
        "python".to_string()
    }
    pub fn default_args() -> Vec<String> {
        vec!["-u".to_string(), "engine_bridge.py".to_string()]
    }
    pub fn default_exit_timeout_s() -> u64 {
        30
    }
    pub fn default() -> Self {
        MethodCfg{
            command: Self::default_command(),
            args: Self::default_args(),
            working_dir: None,
            exit_timeout_s: Self::default_exit_timeout_s(),
        }
    }
}

/// Request line sent to the bridge.
#[derive(Debug, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum Request<'a> {
    Launch(&'a LaunchConfig),
    ListTasks,
    InitializeWorkflow { workflow_type: &'a str },
    SetArguments { task: &'a str, arguments: &'a TaskArguments },
    Execute { task: &'a str },
    Exit,
}

/// Failure category reported by the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
enum FailureKind {
    NotFound,
    Rejected,
    Unsupported,
}

/// Response line read from the bridge.
#[derive(Debug, Deserialize)]
struct Response {
    ok: bool,
    #[serde(default)]
    tasks: Vec<String>,
    #[serde(default)]
    kind: Option<FailureKind>,
    #[serde(default)]
    message: String,
}
impl Response {
    /// Turn a failed response into the matching `EngineError`.
    fn into_result(self) -> engine::ProcResult<Response> {
        if self.ok {
            return Ok(self);
        }
        Err(match self.kind {
            Some(FailureKind::NotFound) => EngineError::TaskNotFound(self.message),
            Some(FailureKind::Unsupported) => EngineError::Unsupported(self.message),
            Some(FailureKind::Rejected) | None => EngineError::Rejected(self.message),
        })
    }
}

impl methods::EngineProvider for Method {
    /// Get the name of the engine provider.
    fn get_method_name(&self) -> String {
        "bridge".to_string()
    }

    /// Parse the provider config file
    fn parse_method_cfg(&mut self, method_cfg_file: &Path) -> args::ProcResult<()> {
        self.method_args = io::read_cfg_file(method_cfg_file)?;
        Ok(())
    }

    fn describe_method_cfg(&self, extension: &str) -> io::IoResult<String> {
        io::to_cfg_string(&self.method_args, extension)
    }

    fn launch(&self, launch_cfg: &LaunchConfig) -> engine::ProcResult<Box<dyn EngineSession>> {
        let mut command = Command::new(&self.method_args.command);
        command
            .args(&self.method_args.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit());
        if let Some(dir) = &self.method_args.working_dir {
            command.current_dir(dir);
        }
        // Keep terminal Ctrl-C away from the bridge, the driver closes it
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }

        tracing::debug!(command = %self.method_args.command, args = ?self.method_args.args, "Spawning engine bridge");
        let mut child = command
            .spawn()
            .map_err(|error| EngineError::Launch(format!("could not start \"{}\": {}", self.method_args.command, error)))?;

        let (stdin, stdout) = match (child.stdin.take(), child.stdout.take()) {
            (Some(stdin), Some(stdout)) => (stdin, stdout),
            _ => {
                let _ = child.kill();
                return Err(EngineError::Launch("bridge process has no stdio pipes".to_string()));
            },
        };

        // Reader thread, so the launch handshake can time out
        let (sender, lines) = mpsc::channel();
        std::thread::spawn(move || {
            for line in BufReader::new(stdout).lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(error) => {
                        let _ = sender.send(Err(error));
                        break;
                    },
                };
                let trimmed = line.trim();
                // Engines print banners on stdout, only JSON objects are responses
                if !trimmed.starts_with('{') {
                    if !trimmed.is_empty() {
                        tracing::debug!("bridge: {}", trimmed);
                    }
                    continue;
                }
                if sender.send(Ok(trimmed.to_string())).is_err() {
                    break;
                }
            }
        });

        let mut session = BridgeSession{
            child,
            stdin,
            lines,
            exit_timeout: Duration::from_secs(self.method_args.exit_timeout_s),
            closed: false,
        };

        match session.request(&Request::Launch(launch_cfg), Some(launch_cfg.start_timeout())) {
            Ok(_) => Ok(Box::new(session)),
            Err(error @ EngineError::Unsupported(_)) => Err(error),
            Err(error) => Err(EngineError::Launch(error.to_string())),
        }
    }
}

/// Session backed by a bridge child process.
/// The child is killed on drop if it was not shut down through `exit`.
#[derive(Debug)]
struct BridgeSession {
    child: Child,
    stdin: ChildStdin,
    lines: Receiver<std::io::Result<String>>,
    exit_timeout: Duration,
    closed: bool,
}
impl BridgeSession {
    /// Send one request and wait for its response.
    /// `None` waits for as long as the engine takes.
    fn request(&mut self, request: &Request, timeout: Option<Duration>) -> engine::ProcResult<Response> {
        if self.closed {
            return Err(EngineError::Closed);
        }

        let mut line = serde_json::to_string(request)
            .map_err(|error| EngineError::Transport(format!("could not encode request: {error}")))?;
        line.push('\n');
        self.stdin
            .write_all(line.as_bytes())
            .and_then(|_| self.stdin.flush())
            .map_err(|error| EngineError::Transport(format!("could not write to bridge: {error}")))?;

        let received = match timeout {
            Some(timeout) => self.lines.recv_timeout(timeout).map_err(|error| match error {
                RecvTimeoutError::Timeout => EngineError::Transport(format!("no response within {} s", timeout.as_secs())),
                RecvTimeoutError::Disconnected => EngineError::Transport("bridge closed its output".to_string()),
            })?,
            None => self.lines
                .recv()
                .map_err(|_| EngineError::Transport("bridge closed its output".to_string()))?,
        };
        let line = received.map_err(|error| EngineError::Transport(format!("could not read from bridge: {error}")))?;

        let response: Response = serde_json::from_str(&line)
            .map_err(|error| EngineError::Transport(format!("malformed response {line}: {error}")))?;
        response.into_result()
    }

    /// Wait for the child to exit, killing it once `timeout` has passed.
    fn wait_for_exit(&mut self, timeout: Duration) -> engine::ProcResult<()> {
        let deadline = Instant::now() + timeout;
        loop {
            match self.child.try_wait() {
                Ok(Some(_)) => return Ok(()),
                Ok(None) if Instant::now() < deadline => std::thread::sleep(Duration::from_millis(50)),
                Ok(None) => {
                    let _ = self.child.kill();
                    let _ = self.child.wait();
                    return Err(EngineError::Transport(format!("bridge did not exit within {} s, killed it", timeout.as_secs())));
                },
                Err(error) => {
                    let _ = self.child.kill();
                    return Err(EngineError::Transport(format!("could not reap bridge process: {error}")));
                },
            }
        }
    }
}

impl EngineSession for BridgeSession {
    fn task_names(&mut self) -> engine::ProcResult<Vec<String>> {
        Ok(self.request(&Request::ListTasks, None)?.tasks)
    }

    fn initialize_workflow(&mut self, workflow_type: &str) -> engine::ProcResult<()> {
        self.request(&Request::InitializeWorkflow{workflow_type}, None)?;
        Ok(())
    }

    fn set_task_arguments(&mut self, task: &str, arguments: &TaskArguments) -> engine::ProcResult<()> {
        self.request(&Request::SetArguments{task, arguments}, None)?;
        Ok(())
    }

    fn execute_task(&mut self, task: &str) -> engine::ProcResult<()> {
        self.request(&Request::Execute{task}, None)?;
        Ok(())
    }

    fn exit(&mut self) -> engine::ProcResult<()> {
        let timeout = self.exit_timeout;
        let start = Instant::now();
        let result = self.request(&Request::Exit, Some(timeout));
        self.closed = true;
        match result {
            Ok(_) => self.wait_for_exit(timeout.saturating_sub(start.elapsed())),
            Err(error) => {
                let _ = self.child.kill();
                let _ = self.child.wait();
                Err(error)
            },
        }
    }
}

impl Drop for BridgeSession {
    fn drop(&mut self) {
        if !self.closed {
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}
