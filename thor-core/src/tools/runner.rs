//! Tool execution with a timeout, a kill switch and a confined root

use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::timeout;
use tracing::{debug, instrument, warn};
use walkdir::WalkDir;

use super::call::{SearchMatch, ToolCall, ToolOutput};
use crate::error::ToolError;
use crate::kill_switch::KillSwitch;

/// Cap on search results returned to a model
const MAX_MATCHES: usize = 200;

/// Configuration for the tool runner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolConfig {
    /// Every path a tool touches must resolve under this directory
    pub root: PathBuf,
    /// Per-invocation limit
    pub timeout: Duration,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Runs [`ToolCall`]s against the filesystem and a shell
#[derive(Debug, Clone)]
pub struct ToolRunner {
    root: PathBuf,
    timeout: Duration,
    kill_switch: KillSwitch,
}

impl ToolRunner {
    /// Create a runner. The root must exist.
    pub fn new(config: ToolConfig, kill_switch: KillSwitch) -> Result<Self, ToolError> {
        let root = config.root.canonicalize()?;
        Ok(Self {
            root,
            timeout: config.timeout,
            kill_switch,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Run one call. Refused outright once the kill switch is engaged.
    #[instrument(skip(self, call), fields(tool = call.name()))]
    pub async fn execute(&self, call: &ToolCall) -> Result<ToolOutput, ToolError> {
        if self.kill_switch.is_engaged() {
            return Err(ToolError::Cancelled);
        }
        match timeout(self.timeout, self.dispatch(call)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(timeout = ?self.timeout, "tool call timed out");
                Err(ToolError::Timeout(self.timeout))
            }
        }
    }

    async fn dispatch(&self, call: &ToolCall) -> Result<ToolOutput, ToolError> {
        match call {
            ToolCall::ReadFile { path } => {
                let full = self.confine(path)?;
                debug!(path = %full.display(), "reading file");
                let content = tokio::fs::read_to_string(&full).await?;
                Ok(ToolOutput::FileContent {
                    path: path.clone(),
                    content,
                })
            }
            ToolCall::WriteFile { path, content } => {
                let full = self.confine(path)?;
                if let Some(parent) = full.parent() {
                    tokio::fs::create_dir_all(parent).await?;
                }
                debug!(path = %full.display(), bytes = content.len(), "writing file");
                tokio::fs::write(&full, content).await?;
                Ok(ToolOutput::Written {
                    path: path.clone(),
                    bytes: content.len(),
                })
            }
            ToolCall::ListFiles { directory, pattern } => {
                let dir = self.confine(directory)?;
                let root = self.root.clone();
                let pattern = pattern.clone();
                let entries =
                    tokio::task::spawn_blocking(move || list_files(&root, &dir, &pattern))
                        .await
                        .map_err(std::io::Error::other)??;
                Ok(ToolOutput::Listing { entries })
            }
            ToolCall::SearchFiles {
                query,
                file_pattern,
            } => {
                let root = self.root.clone();
                let query = query.clone();
                let file_pattern = file_pattern.clone();
                let (matches, truncated) = tokio::task::spawn_blocking(move || {
                    search_files(&root, &query, &file_pattern)
                })
                .await
                .map_err(std::io::Error::other)?;
                Ok(ToolOutput::Matches { matches, truncated })
            }
            ToolCall::RunCommand { command, cwd } => {
                let dir = match cwd {
                    Some(cwd) => self.confine(cwd)?,
                    None => self.root.clone(),
                };
                debug!(%command, cwd = %dir.display(), "running command");
                let output = tokio::process::Command::new("sh")
                    .arg("-c")
                    .arg(command)
                    .current_dir(&dir)
                    .kill_on_drop(true)
                    .output()
                    .await?;
                Ok(ToolOutput::Command {
                    exit_code: output.status.code(),
                    stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                    stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                })
            }
        }
    }

    /// Resolve `path` against the root, rejecting anything that lands outside it.
    ///
    /// Resolution is lexical; symlinks inside the root are followed as-is.
    fn confine(&self, path: &str) -> Result<PathBuf, ToolError> {
        let requested = Path::new(path);
        let joined = if requested.is_absolute() {
            requested.to_path_buf()
        } else {
            self.root.join(requested)
        };

        let mut normalized = PathBuf::new();
        for component in joined.components() {
            match component {
                Component::CurDir => {}
                Component::ParentDir => {
                    if !normalized.pop() {
                        return Err(ToolError::PathOutsideRoot(requested.to_path_buf()));
                    }
                }
                other => normalized.push(other),
            }
        }

        if normalized.starts_with(&self.root) {
            Ok(normalized)
        } else {
            Err(ToolError::PathOutsideRoot(requested.to_path_buf()))
        }
    }
}

fn relative(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .into_owned()
}

fn list_files(root: &Path, dir: &Path, pattern: &str) -> Result<Vec<String>, ToolError> {
    let recursive = pattern.contains("**");
    let name_pattern = pattern.rsplit('/').next().unwrap_or(pattern);
    let walker = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(if recursive { usize::MAX } else { 1 });

    let mut entries = Vec::new();
    for entry in walker {
        let entry = entry.map_err(std::io::Error::from)?;
        let name = entry.file_name().to_string_lossy();
        if !wildcard_match(name_pattern, &name) {
            continue;
        }
        let mut shown = relative(root, entry.path());
        if entry.file_type().is_dir() {
            shown.push('/');
        }
        entries.push(shown);
    }
    entries.sort();
    Ok(entries)
}

fn search_files(root: &Path, query: &str, file_pattern: &str) -> (Vec<SearchMatch>, bool) {
    let needle = query.to_lowercase();
    let mut matches = Vec::new();

    let files = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter(|e| wildcard_match(file_pattern, &e.file_name().to_string_lossy()));

    for entry in files {
        // unreadable and non-UTF-8 files are skipped
        let Ok(content) = std::fs::read_to_string(entry.path()) else {
            continue;
        };
        for (idx, line) in content.lines().enumerate() {
            if !line.to_lowercase().contains(&needle) {
                continue;
            }
            if matches.len() == MAX_MATCHES {
                return (matches, true);
            }
            matches.push(SearchMatch {
                path: relative(root, entry.path()),
                line: idx + 1,
                text: line.trim().to_string(),
            });
        }
    }
    (matches, false)
}

/// Match `name` against a pattern where `*` is any run and `?` is one char.
pub(crate) fn wildcard_match(pattern: &str, name: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let n: Vec<char> = name.chars().collect();
    let (mut pi, mut ni) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;

    while ni < n.len() {
        if pi < p.len() && (p[pi] == '?' || p[pi] == n[ni]) {
            pi += 1;
            ni += 1;
        } else if pi < p.len() && p[pi] == '*' {
            backtrack = Some((pi, ni));
            pi += 1;
        } else if let Some((star, matched)) = backtrack {
            pi = star + 1;
            ni = matched + 1;
            backtrack = Some((star, matched + 1));
        } else {
            return false;
        }
    }
    p[pi..].iter().all(|&c| c == '*')
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn runner(dir: &TempDir) -> ToolRunner {
        ToolRunner::new(
            ToolConfig {
                root: dir.path().to_path_buf(),
                timeout: Duration::from_secs(5),
            },
            KillSwitch::new(),
        )
        .unwrap()
    }

    #[test]
    fn wildcard_patterns() {
        assert!(wildcard_match("*", "anything.rs"));
        assert!(wildcard_match("*.rs", "main.rs"));
        assert!(!wildcard_match("*.rs", "main.rsx"));
        assert!(wildcard_match("m??n.*", "main.rs"));
        assert!(wildcard_match("**", "deep"));
        assert!(!wildcard_match("a*b", "acd"));
    }

    #[tokio::test]
    async fn write_then_read() {
        let dir = TempDir::new().unwrap();
        let runner = runner(&dir);

        let written = runner
            .execute(&ToolCall::WriteFile {
                path: "notes/plan.md".into(),
                content: "ship it".into(),
            })
            .await
            .unwrap();
        assert_eq!(
            written,
            ToolOutput::Written {
                path: "notes/plan.md".into(),
                bytes: 7
            }
        );

        let read = runner
            .execute(&ToolCall::ReadFile {
                path: "notes/plan.md".into(),
            })
            .await
            .unwrap();
        assert_eq!(read.to_model_text(), "ship it");
    }

    #[tokio::test]
    async fn paths_outside_root_are_rejected() {
        let dir = TempDir::new().unwrap();
        let runner = runner(&dir);

        for path in ["../escape.txt", "/etc/passwd", "a/../../b"] {
            let err = runner
                .execute(&ToolCall::ReadFile { path: path.into() })
                .await
                .unwrap_err();
            assert!(
                matches!(err, ToolError::PathOutsideRoot(_)),
                "{path} was not confined"
            );
        }
    }

    #[tokio::test]
    async fn dotted_paths_inside_root_are_allowed() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.txt"), "x").unwrap();
        let runner = runner(&dir);

        let out = runner
            .execute(&ToolCall::ReadFile {
                path: "./sub/../a.txt".into(),
            })
            .await
            .unwrap();
        assert_eq!(out.to_model_text(), "x");
    }

    #[tokio::test]
    async fn list_files_flat_and_recursive() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("src")).unwrap();
        std::fs::write(dir.path().join("Cargo.toml"), "").unwrap();
        std::fs::write(dir.path().join("src/lib.rs"), "").unwrap();
        let runner = runner(&dir);

        let flat = runner
            .execute(&ToolCall::parse("list_files", json!({})).unwrap())
            .await
            .unwrap();
        assert_eq!(
            flat,
            ToolOutput::Listing {
                entries: vec!["Cargo.toml".into(), "src/".into()]
            }
        );

        let deep = runner
            .execute(&ToolCall::ListFiles {
                directory: ".".into(),
                pattern: "**/*.rs".into(),
            })
            .await
            .unwrap();
        assert_eq!(
            deep,
            ToolOutput::Listing {
                entries: vec!["src/lib.rs".into()]
            }
        );
    }

    #[tokio::test]
    async fn search_is_case_insensitive() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.rs"), "fn main() {}\n// TODO: Budget\n").unwrap();
        std::fs::write(dir.path().join("b.txt"), "budget notes\n").unwrap();
        let runner = runner(&dir);

        let out = runner
            .execute(&ToolCall::SearchFiles {
                query: "budget".into(),
                file_pattern: "*.rs".into(),
            })
            .await
            .unwrap();
        assert_eq!(
            out,
            ToolOutput::Matches {
                matches: vec![SearchMatch {
                    path: "a.rs".into(),
                    line: 2,
                    text: "// TODO: Budget".into()
                }],
                truncated: false
            }
        );
    }

    #[tokio::test]
    async fn run_command_captures_output() {
        let dir = TempDir::new().unwrap();
        let runner = runner(&dir);

        let out = runner
            .execute(&ToolCall::RunCommand {
                command: "echo hello && exit 3".into(),
                cwd: None,
            })
            .await
            .unwrap();
        match out {
            ToolOutput::Command {
                exit_code, stdout, ..
            } => {
                assert_eq!(exit_code, Some(3));
                assert_eq!(stdout.trim(), "hello");
            }
            other => panic!("unexpected output: {other:?}"),
        }
    }

    #[tokio::test]
    async fn slow_command_times_out() {
        let dir = TempDir::new().unwrap();
        let runner = ToolRunner::new(
            ToolConfig {
                root: dir.path().to_path_buf(),
                timeout: Duration::from_millis(50),
            },
            KillSwitch::new(),
        )
        .unwrap();

        let err = runner
            .execute(&ToolCall::RunCommand {
                command: "sleep 5".into(),
                cwd: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Timeout(_)));
    }

    #[tokio::test]
    async fn engaged_kill_switch_refuses_calls() {
        let dir = TempDir::new().unwrap();
        let kill_switch = KillSwitch::new();
        let runner = ToolRunner::new(
            ToolConfig {
                root: dir.path().to_path_buf(),
                timeout: Duration::from_secs(5),
            },
            kill_switch.clone(),
        )
        .unwrap();

        kill_switch.engage("operator stop");
        let err = runner
            .execute(&ToolCall::ListFiles {
                directory: ".".into(),
                pattern: "*".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Cancelled));
    }

    #[test]
    fn missing_root_is_an_error() {
        let result = ToolRunner::new(
            ToolConfig {
                root: PathBuf::from("/definitely/not/here"),
                timeout: Duration::from_secs(1),
            },
            KillSwitch::new(),
        );
        assert!(matches!(result, Err(ToolError::Io(_))));
    }
}
