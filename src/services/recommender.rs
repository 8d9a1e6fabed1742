//! Vocabulary recommender
//!
//! Runs the external recommender CLI and pulls the JSON payload out of its
//! console output. The tool prints banner and footer lines around the JSON,
//! so the payload is located structurally rather than by line position.

use async_trait::async_trait;
use serde_json::Value;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::types::{Result, ServiceError};

/// Parameters of one recommendation request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecommendQuery {
    pub search_term: String,
    pub search_class: Option<String>,
    pub endpoint: Option<String>,
}

/// Anything that can recommend vocabulary terms
#[async_trait]
pub trait Recommender: Send + Sync {
    /// `Ok(None)` when the tool ran but produced no usable JSON
    async fn recommend(&self, query: &RecommendQuery) -> Result<Option<Value>>;
}

#[derive(Debug, Clone)]
pub struct RecommenderConfig {
    /// Launcher program (`yarn`)
    pub program: String,
    /// Recommender project directory, passed as `--cwd`
    pub working_dir: PathBuf,
    pub timeout: Duration,
}

/// Recommender backed by a child process
pub struct CommandRecommender {
    config: RecommenderConfig,
}

impl CommandRecommender {
    pub fn new(config: RecommenderConfig) -> Self {
        Self { config }
    }

    /// Argument vector for `query`; never passed through a shell
    pub fn arguments(&self, query: &RecommendQuery) -> Vec<String> {
        let mut args = vec![
            "--cwd".to_string(),
            self.config.working_dir.display().to_string(),
            "recommend".to_string(),
            "-t".to_string(),
            query.search_term.clone(),
            "-f".to_string(),
            "json".to_string(),
        ];
        if let Some(class) = &query.search_class {
            args.push("-c".to_string());
            args.push(class.clone());
        }
        if let Some(endpoint) = &query.endpoint {
            args.push("-e".to_string());
            args.push(endpoint.clone());
        }
        args
    }
}

#[async_trait]
impl Recommender for CommandRecommender {
    async fn recommend(&self, query: &RecommendQuery) -> Result<Option<Value>> {
        let args = self.arguments(query);
        debug!(program = %self.config.program, args = ?args, "Running recommender");

        let output = Command::new(&self.config.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(self.config.timeout, output)
            .await
            .map_err(|_| {
                ServiceError::Recommender(format!(
                    "timed out after {}s",
                    self.config.timeout.as_secs()
                ))
            })?
            .map_err(|e| {
                ServiceError::Recommender(format!("failed to start {}: {}", self.config.program, e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let excerpt: String = stderr.trim().chars().take(200).collect();
            return Err(ServiceError::Recommender(format!(
                "exited with {}: {}",
                output.status, excerpt
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let payload = extract_json_payload(&stdout);
        if payload.is_none() {
            warn!(
                search_term = %query.search_term,
                bytes = stdout.len(),
                "Recommender output contained no JSON payload"
            );
        }
        Ok(payload)
    }
}

/// First `{` or `[` whose balanced match parses as JSON
pub fn extract_json_payload(text: &str) -> Option<Value> {
    let bytes = text.as_bytes();
    let mut start = 0;

    while let Some(offset) = bytes[start..].iter().position(|b| matches!(b, b'{' | b'[')) {
        let open = start + offset;
        if let Some(close) = matching_close(bytes, open) {
            if let Ok(value) = serde_json::from_str(&text[open..=close]) {
                return Some(value);
            }
        }
        start = open + 1;
    }
    None
}

/// Index of the bracket closing `bytes[open]`, skipping string contents
fn matching_close(bytes: &[u8], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(open) {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' | b'[' => depth += 1,
            b'}' | b']' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Serialize with four-space indentation
pub fn to_pretty_json(value: &Value) -> Result<Vec<u8>> {
    use serde::Serialize;

    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value
        .serialize(&mut serializer)
        .map_err(|e| ServiceError::Internal(e.to_string()))?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn recommender(program: &str) -> CommandRecommender {
        CommandRecommender::new(RecommenderConfig {
            program: program.to_string(),
            working_dir: PathBuf::from("/app/vocabulary-recommender"),
            timeout: Duration::from_secs(5),
        })
    }

    fn query(term: &str) -> RecommendQuery {
        RecommendQuery {
            search_term: term.to_string(),
            search_class: None,
            endpoint: None,
        }
    }

    #[test]
    fn test_extracts_payload_between_banner_and_footer() {
        let output = "yarn run v1.22.19\n$ node dist/index.js recommend -t person -f json\n\
                      [{\"label\": \"Person\", \"uri\": \"http://xmlns.com/foaf/0.1/Person\"}]\n\
                      Done in 2.31s.\n";
        assert_eq!(
            extract_json_payload(output),
            Some(json!([{"label": "Person", "uri": "http://xmlns.com/foaf/0.1/Person"}]))
        );
    }

    #[test]
    fn test_brackets_inside_strings_are_ignored() {
        let output = "[info] starting\n{\"note\": \"a } and ] inside\", \"n\": [1, 2]}\n[done]";
        assert_eq!(
            extract_json_payload(output),
            Some(json!({"note": "a } and ] inside", "n": [1, 2]}))
        );
    }

    #[test]
    fn test_no_payload() {
        assert_eq!(extract_json_payload(""), None);
        assert_eq!(extract_json_payload("yarn run v1\nerror Command failed.\n"), None);
        assert_eq!(extract_json_payload("{ not json at all"), None);
    }

    #[test]
    fn test_arguments() {
        let r = recommender("yarn");
        assert_eq!(
            r.arguments(&query("it's a term")),
            vec![
                "--cwd",
                "/app/vocabulary-recommender",
                "recommend",
                "-t",
                "it's a term",
                "-f",
                "json"
            ]
        );

        let full = RecommendQuery {
            search_term: "person".into(),
            search_class: Some("class".into()),
            endpoint: Some("https://lov.linkeddata.es/dataset/lov/sparql".into()),
        };
        let args = r.arguments(&full);
        assert_eq!(&args[7..], &["-c", "class", "-e", "https://lov.linkeddata.es/dataset/lov/sparql"]);
    }

    #[test]
    fn test_pretty_json_uses_four_spaces() {
        let rendered = to_pretty_json(&json!({"a": [1]})).unwrap();
        assert_eq!(
            String::from_utf8(rendered).unwrap(),
            "{\n    \"a\": [\n        1\n    ]\n}"
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_non_zero_exit_is_an_error() {
        let err = recommender("false").recommend(&query("x")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Recommender(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_missing_program_is_an_error() {
        let err = recommender("/nonexistent/recommender-bin")
            .recommend(&query("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Recommender(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_successful_run_without_json() {
        // `echo` prints its arguments and exits 0
        let result = recommender("echo").recommend(&query("x")).await.unwrap();
        assert_eq!(result, None);
    }
}
