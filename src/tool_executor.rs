//! Tool Executor
//!
//! Runs a whitelisted tool by name and renders its result as plain text the model can read
//! back. Grounded on the teacher's `tools::bash::BashTool::execute`: spawn via
//! `tokio::process::Command`, read stdout/stderr concurrently through a byte-capped reader so
//! an unbounded stream can't be buffered in memory, and enforce a wall-clock timeout around
//! the whole spawn-read-wait sequence, killing the child on overflow or timeout.
//!
//! Unlike the teacher's tool, commands here are never built from a shell string: each catalog
//! entry is a fixed `program` plus a fixed argument list, with the one path-parameterized tool
//! appending a single [`crate::path_sanitizer`]-validated argument. There is no shell
//! interpolation of model-supplied text anywhere in this module.
//!
//! Every error variant is absorbed here and rendered as an `Error: ...`-prefixed string;
//! nothing from this module propagates to the orchestrator as an `Err`.

use crate::error::ToolError;
use crate::path_sanitizer;
use crate::tool_registry::{ToolRegistry, LIST_FILES_IN_PATH};
use std::path::Path;
use tokio::io::AsyncReadExt;
use tokio::process::Command as TokioCommand;
use tokio::time::Duration;

const TIMEOUT: Duration = Duration::from_secs(10);
const MAX_OUTPUT_BYTES: usize = 1024 * 1024;

enum CommandSpec {
    /// Fixed program and argv, no caller input involved.
    Fixed(&'static str, &'static [&'static str]),
    /// Program and fixed leading argv, with one sanitized path argument appended.
    WithPath(&'static str, &'static [&'static str]),
}

fn lookup(name: &str) -> Option<CommandSpec> {
    match name {
        "get_current_directory" => Some(CommandSpec::Fixed("pwd", &[])),
        "get_project_tree" => Some(CommandSpec::Fixed(
            "find",
            &[
                ".",
                "-maxdepth",
                "3",
                "-not",
                "-path",
                "*/.git/*",
                "-not",
                "-path",
                "*/target/*",
                "-not",
                "-path",
                "*/node_modules/*",
            ],
        )),
        "list_current_directory" => Some(CommandSpec::Fixed("ls", &["-la"])),
        LIST_FILES_IN_PATH => Some(CommandSpec::WithPath("ls", &["-la"])),
        "get_current_time" => Some(CommandSpec::Fixed("date", &[])),
        "get_disk_usage" => Some(CommandSpec::Fixed("df", &["-h", "."])),
        "get_os_identity" => Some(CommandSpec::Fixed("uname", &["-a"])),
        "get_runtime_version" => Some(CommandSpec::Fixed("rustc", &["--version"])),
        "get_vcs_status" => Some(CommandSpec::Fixed("git", &["status", "--short"])),
        _ => None,
    }
}

/// Executes whitelisted tools on behalf of the ReACT loop.
pub struct ToolExecutor;

impl ToolExecutor {
    /// Run the named tool with the given JSON arguments, returning text suitable to feed back
    /// to the model as a tool-result message. Never returns `Err`: every failure mode is
    /// rendered inline as an `Error: ...` string.
    pub async fn execute(name: &str, args: &serde_json::Value) -> String {
        match Self::try_execute(name, args).await {
            Ok(output) => output,
            Err(e) => format!("Error: {}", e),
        }
    }

    async fn try_execute(name: &str, args: &serde_json::Value) -> Result<String, ToolError> {
        if !ToolRegistry::is_known(name) {
            return Err(ToolError::Unknown(name.to_string()));
        }
        let spec = lookup(name).ok_or_else(|| ToolError::Unknown(name.to_string()))?;

        let (program, argv) = match spec {
            CommandSpec::Fixed(program, argv) => (program, argv.iter().map(|a| a.to_string()).collect::<Vec<_>>()),
            CommandSpec::WithPath(program, leading) => {
                let raw_path = args
                    .get("path")
                    .and_then(|v| v.as_str())
                    .unwrap_or(".");
                let resolved = path_sanitizer::sanitize(raw_path).map_err(ToolError::Path)?;
                let mut argv: Vec<String> = leading.iter().map(|a| a.to_string()).collect();
                argv.push(path_to_arg(&resolved));
                (program, argv)
            }
        };

        let output = run_with_limits(program, &argv).await?;
        render(name, output)
    }
}

fn path_to_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

struct CapturedOutput {
    stdout: String,
    stderr: String,
    success: bool,
}

/// Spawn `program argv...`, read stdout/stderr concurrently under a shared byte cap, and
/// enforce a wall-clock timeout around the whole sequence. Kills the child on overflow or
/// timeout rather than leaving it to finish unobserved.
async fn run_with_limits(program: &str, argv: &[String]) -> Result<CapturedOutput, ToolError> {
    let program = program.to_string();
    let argv = argv.to_vec();

    match tokio::time::timeout(TIMEOUT, async move {
        let mut command = TokioCommand::new(&program);
        command
            .args(&argv)
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .kill_on_drop(true);

        let mut child = command
            .spawn()
            .map_err(|e| ToolError::Runtime(format!("failed to spawn '{}': {}", program, e)))?;
        let stdout_pipe = child.stdout.take().expect("stdout was piped");
        let stderr_pipe = child.stderr.take().expect("stderr was piped");

        let (stdout_result, stderr_result) = tokio::join!(
            read_limited(stdout_pipe, MAX_OUTPUT_BYTES),
            read_limited(stderr_pipe, MAX_OUTPUT_BYTES),
        );

        let (stdout_bytes, stderr_bytes) = match (stdout_result, stderr_result) {
            (Err(e), _) | (_, Err(e)) => {
                let _ = child.kill().await;
                let _ = child.wait().await;
                return Err(e);
            }
            (Ok(out), Ok(err)) => (out, err),
        };

        let status = child
            .wait()
            .await
            .map_err(|e| ToolError::Runtime(format!("failed to wait on '{}': {}", program, e)))?;

        Ok(CapturedOutput {
            stdout: String::from_utf8_lossy(&stdout_bytes).into_owned(),
            stderr: String::from_utf8_lossy(&stderr_bytes).into_owned(),
            success: status.success(),
        })
    })
    .await
    {
        Ok(result) => result,
        Err(_) => Err(ToolError::Timeout),
    }
}

async fn read_limited<R: AsyncReadExt + Unpin>(
    mut reader: R,
    max_bytes: usize,
) -> Result<Vec<u8>, ToolError> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 8192];
    loop {
        match reader.read(&mut chunk).await {
            Ok(0) => return Ok(buf),
            Ok(n) => {
                if buf.len() + n > max_bytes {
                    return Err(ToolError::OutputOverflow);
                }
                buf.extend_from_slice(&chunk[..n]);
            }
            Err(e) => return Err(ToolError::Runtime(e.to_string())),
        }
    }
}

/// Stdout takes precedence if non-empty, then stderr, then a fixed placeholder for the
/// listing tools so the model never sees a bare empty string. A nonzero exit with no output on
/// either stream is a runtime failure, not a success with nothing to say.
fn render(name: &str, output: CapturedOutput) -> Result<String, ToolError> {
    if !output.stdout.trim().is_empty() {
        return Ok(output.stdout);
    }
    if !output.stderr.trim().is_empty() {
        return Ok(output.stderr);
    }
    if !output.success {
        return Err(ToolError::Runtime(
            "command exited with a non-zero status and produced no output".to_string(),
        ));
    }
    Ok(match name {
        "list_current_directory" | LIST_FILES_IN_PATH => "(empty directory)".to_string(),
        _ => String::new(),
    })
}
