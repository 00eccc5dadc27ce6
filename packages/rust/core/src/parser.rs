//! External sample parser bridge.
//!
//! The parser turns a raw sample into the structured document model. It is
//! an external program speaking a small JSON protocol: one request on stdin,
//! one tagged response line on stdout.

use std::future::Future;
use std::path::PathBuf;
use std::process::Stdio;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, instrument};

use samplebuilder_shared::{ParserConfig, Project, Result, SampleBuilderError};

// ---------------------------------------------------------------------------
// Contract
// ---------------------------------------------------------------------------

/// Hosts the parser needs to rewrite sample URLs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParserHosts {
    pub platform: String,
    pub api: String,
    pub backend: String,
    pub preview: String,
}

/// Routing context passed alongside the raw sample.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseContext {
    pub base_path: String,
    pub canonical: String,
    pub preview: String,
    pub hosts: ParserHosts,
}

/// One parse invocation.
#[derive(Debug, Clone, Serialize)]
pub struct ParseRequest {
    /// On-disk path of the sample.
    pub path: PathBuf,
    pub context: ParseContext,
    pub contents: String,
}

/// Converts a raw sample into its structured document.
///
/// Returns the parser's raw JSON; validation into `ParsedSample` happens in
/// the document adapter. Implementations must be deterministic for identical
/// requests.
pub trait SampleParser: Send + Sync + 'static {
    fn parse(&self, request: ParseRequest) -> impl Future<Output = Result<Value>> + Send;
}

// ---------------------------------------------------------------------------
// Subprocess implementation
// ---------------------------------------------------------------------------

/// Request message written to the parser's stdin.
#[derive(Debug, Serialize)]
#[serde(tag = "type")]
enum RequestMessage<'a> {
    #[serde(rename = "parse")]
    Parse {
        #[serde(flatten)]
        request: &'a ParseRequest,
    },
}

/// Response message read from the parser's stdout.
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum ResponseMessage {
    #[serde(rename = "result")]
    Result { result: Value },
    #[serde(rename = "error")]
    Error { error: String },
}

/// Runs the configured parser command once per sample.
#[derive(Debug, Clone)]
pub struct CommandParser {
    command: String,
    args: Vec<String>,
    working_dir: PathBuf,
}

impl CommandParser {
    /// Relative working directories resolve against the project root.
    pub fn new(config: &ParserConfig, project: &Project) -> Self {
        let working_dir = match &config.working_dir {
            Some(dir) => project.absolute(dir),
            None => project.root().to_path_buf(),
        };
        Self {
            command: config.command.clone(),
            args: config.args.clone(),
            working_dir,
        }
    }
}

impl SampleParser for CommandParser {
    #[instrument(skip_all, fields(path = %request.path.display()))]
    async fn parse(&self, request: ParseRequest) -> Result<Value> {
        let payload = serde_json::to_vec(&RequestMessage::Parse { request: &request })
            .map_err(|e| SampleBuilderError::parse(format!("failed to serialize request: {e}")))?;

        let mut child = Command::new(&self.command)
            .args(&self.args)
            .current_dir(&self.working_dir)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                SampleBuilderError::parse(format!(
                    "failed to spawn parser: {e}. Is `{}` installed?",
                    self.command
                ))
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| SampleBuilderError::parse("failed to capture parser stdin"))?;

        let write = async move {
            stdin.write_all(&payload).await?;
            stdin.shutdown().await
        };
        let (written, output) = tokio::join!(write, child.wait_with_output());

        let output = output
            .map_err(|e| SampleBuilderError::parse(format!("parser did not finish: {e}")))?;
        written.map_err(|e| SampleBuilderError::parse(format!("failed to write to parser stdin: {e}")))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        debug!(status = ?output.status, bytes = output.stdout.len(), "parser exited");

        match decode_response(&stdout) {
            Ok(value) => Ok(value),
            Err(_) if !output.status.success() => Err(SampleBuilderError::parse(format!(
                "parser exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ))),
            Err(e) => Err(e),
        }
    }
}

/// Decode the last non-empty stdout line as a response message.
fn decode_response(stdout: &str) -> Result<Value> {
    let line = stdout
        .lines()
        .map(str::trim)
        .rfind(|line| !line.is_empty())
        .ok_or_else(|| SampleBuilderError::parse("parser produced no output"))?;

    let msg: ResponseMessage = serde_json::from_str(line).map_err(|e| {
        SampleBuilderError::parse(format!(
            "invalid parser response: {e} (got: {})",
            line.chars().take(200).collect::<String>()
        ))
    })?;

    match msg {
        ResponseMessage::Result { result } => Ok(result),
        ResponseMessage::Error { error } => Err(SampleBuilderError::parse(error)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> ParseRequest {
        ParseRequest {
            path: PathBuf::from("/project/examples/source/01-category/sample.html"),
            context: ParseContext {
                base_path: "http://localhost:8080/documentation/examples/category/sample".into(),
                canonical: "http://localhost:8080/documentation/examples/category/sample/index.html"
                    .into(),
                preview: "http://localhost:8080/documentation/examples/category/sample/preview/index.html"
                    .into(),
                hosts: ParserHosts {
                    platform: "http://localhost:8080".into(),
                    api: "https://api.example".into(),
                    backend: "https://backend.example".into(),
                    preview: "http://localhost:8083".into(),
                },
            },
            contents: "<html></html>".into(),
        }
    }

    #[test]
    fn request_message_shape() {
        let request = request();
        let json = serde_json::to_value(RequestMessage::Parse { request: &request }).unwrap();
        assert_eq!(json["type"], "parse");
        assert_eq!(json["path"], "/project/examples/source/01-category/sample.html");
        assert_eq!(json["context"]["hosts"]["preview"], "http://localhost:8083");
        assert_eq!(json["contents"], "<html></html>");
    }

    #[test]
    fn decode_result_uses_last_line() {
        let stdout = "warming up\n{\"type\":\"result\",\"result\":{\"title\":\"t\"}}\n\n";
        assert_eq!(decode_response(stdout).unwrap()["title"], "t");
    }

    #[test]
    fn decode_error_message() {
        let err = decode_response(r#"{"type":"error","error":"boom"}"#).unwrap_err();
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn decode_rejects_empty_and_garbage() {
        assert!(decode_response("\n  \n").is_err());
        assert!(decode_response("not json").is_err());
    }

    #[tokio::test]
    async fn missing_command_is_a_parse_error() {
        let parser = CommandParser {
            command: format!("samplebuilder-missing-{}", uuid::Uuid::now_v7()),
            args: Vec::new(),
            working_dir: std::env::temp_dir(),
        };
        let err = parser.parse(request()).await.unwrap_err();
        assert!(matches!(err, SampleBuilderError::Parse { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn command_parser_round_trip() {
        let parser = CommandParser {
            command: "sh".into(),
            args: vec![
                "-c".into(),
                r#"cat > /dev/null; echo '{"type":"result","result":{"title":"From sh"}}'"#.into(),
            ],
            working_dir: std::env::temp_dir(),
        };
        let value = parser.parse(request()).await.unwrap();
        assert_eq!(value["title"], "From sh");
    }
}
