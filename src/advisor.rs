//! Advisory review of transformation logic on failing rows.
//!
//! Advice never changes a verdict; it only fills the `AI_Suggestion` column and
//! the optional advice artifacts. Two advisors exist: [`PrecheckAdvisor`], a
//! deterministic syntax sanity check, and [`CommandAdvisor`], which hands rows
//! that pass the pre-check to an external program (typically a wrapper around
//! a language model) as JSON on stdin and reads JSON advice from stdout.

use std::{
    fs,
    io::{self, Read, Write},
    path::{Path, PathBuf},
    process::{Command, Stdio},
    sync::LazyLock,
    thread,
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use log::{debug, info, warn};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

static FENCE_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?im)^```(?:json)?").expect("valid fence pattern"));
static FENCE_CLOSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)```\s*$").expect("valid fence pattern"));
static FLAT_OBJECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{[^{}]+\}").expect("valid object pattern"));
static FUNCTION_CALL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z]+\s*\(").expect("valid call pattern"));
static QUALIFIED_FIELD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z_]+\.[A-Za-z_]+").expect("valid field pattern"));

const FIX_FOLLOWUP: &str = "Fix syntax or verify manually before revalidation.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvisorConfig {
    pub enabled: bool,
    /// External program; the pre-check alone is used when unset.
    pub command: Option<PathBuf>,
    pub args: Vec<String>,
    pub timeout_secs: u64,
    pub max_explanation_chars: usize,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            command: None,
            args: Vec::new(),
            timeout_secs: 30,
            max_explanation_chars: 400,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdviceRequest {
    pub table: String,
    pub field: String,
    pub logic: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Advice {
    pub judgement: String,
    pub explanation: String,
    pub suggested_followup: String,
    pub dq_sql: String,
    pub recon_sql: String,
}

impl Advice {
    /// Placeholder used whenever advice cannot be obtained or parsed.
    pub fn unparsed(text: &str, max_chars: usize) -> Self {
        Self {
            judgement: "Unparsed".to_string(),
            explanation: text.trim().chars().take(max_chars).collect(),
            ..Self::default()
        }
    }

    pub fn summary(&self) -> String {
        if self.explanation.is_empty() {
            self.judgement.clone()
        } else {
            format!("{}: {}", self.judgement, self.explanation)
        }
    }
}

#[derive(Debug, Error)]
pub enum AdvisorError {
    #[error("failed to start advisor {program:?}: {source}")]
    Spawn { program: PathBuf, source: io::Error },
    #[error("advisor I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("advisor did not answer within {0:?}")]
    Timeout(Duration),
    #[error("advisor exited with {0}")]
    Exit(String),
    #[error("advisor output reader panicked")]
    Reader,
}

pub trait LogicAdvisor {
    fn name(&self) -> &str;
    fn advise(&self, request: &AdviceRequest) -> Result<Advice, AdvisorError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precheck {
    Empty,
    Error,
    Warn,
    Ok,
}

impl Precheck {
    pub fn as_str(self) -> &'static str {
        match self {
            Precheck::Empty => "EMPTY",
            Precheck::Error => "ERROR",
            Precheck::Warn => "WARN",
            Precheck::Ok => "OK",
        }
    }
}

/// Cheap syntax sanity check of a transformation expression.
pub fn precheck(logic: &str) -> (Precheck, String) {
    if logic.trim().is_empty() {
        return (Precheck::Empty, "No transformation logic provided.".to_string());
    }
    let open = logic.matches('(').count();
    let close = logic.matches(')').count();
    if open != close {
        return (
            Precheck::Error,
            format!("Parentheses mismatch: {open} '(' vs {close} ')'."),
        );
    }
    if !FUNCTION_CALL.is_match(logic) {
        return (Precheck::Warn, "No SQL-like function detected.".to_string());
    }
    if !QUALIFIED_FIELD.is_match(logic) {
        return (Precheck::Warn, "No table.field pattern detected.".to_string());
    }
    (Precheck::Ok, "Syntax appears valid.".to_string())
}

fn precheck_advice(status: Precheck, message: String) -> Advice {
    Advice {
        judgement: status.as_str().to_string(),
        explanation: message,
        suggested_followup: match status {
            Precheck::Ok => String::new(),
            _ => FIX_FOLLOWUP.to_string(),
        },
        ..Advice::default()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PrecheckAdvisor;

impl LogicAdvisor for PrecheckAdvisor {
    fn name(&self) -> &str {
        "precheck"
    }

    fn advise(&self, request: &AdviceRequest) -> Result<Advice, AdvisorError> {
        let (status, message) = precheck(&request.logic);
        Ok(precheck_advice(status, message))
    }
}

#[derive(Debug, Clone)]
pub struct CommandAdvisor {
    program: PathBuf,
    args: Vec<String>,
    timeout: Duration,
    max_chars: usize,
}

impl CommandAdvisor {
    pub fn new(program: impl Into<PathBuf>, config: &AdvisorConfig) -> Self {
        Self {
            program: program.into(),
            args: config.args.clone(),
            timeout: Duration::from_secs(config.timeout_secs.max(1)),
            max_chars: config.max_explanation_chars,
        }
    }

    fn run(&self, payload: &str) -> Result<String, AdvisorError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| AdvisorError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            if let Err(err) = stdin.write_all(payload.as_bytes()) {
                if err.kind() != io::ErrorKind::BrokenPipe {
                    return Err(err.into());
                }
            }
        }
        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| io::Error::other("advisor stdout unavailable"))?;
        let reader = thread::spawn(move || {
            let mut buffer = String::new();
            stdout.read_to_string(&mut buffer).map(|_| buffer)
        });

        let deadline = Instant::now() + self.timeout;
        let status = loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }
            if Instant::now() >= deadline {
                let _ = child.kill();
                let _ = child.wait();
                return Err(AdvisorError::Timeout(self.timeout));
            }
            thread::sleep(Duration::from_millis(20));
        };
        let output = reader.join().map_err(|_| AdvisorError::Reader)??;
        if !status.success() {
            return Err(AdvisorError::Exit(status.to_string()));
        }
        Ok(output)
    }
}

impl LogicAdvisor for CommandAdvisor {
    fn name(&self) -> &str {
        "command"
    }

    fn advise(&self, request: &AdviceRequest) -> Result<Advice, AdvisorError> {
        let (status, message) = precheck(&request.logic);
        if status != Precheck::Ok {
            return Ok(precheck_advice(status, message));
        }
        let payload = serde_json::to_string(request).map_err(io::Error::other)?;
        let output = self.run(&payload)?;
        Ok(parse_advice(&output, self.max_chars))
    }
}

/// Builds the advisor described by `config`, or `None` when advice is off.
pub fn from_config(config: &AdvisorConfig) -> Option<Box<dyn LogicAdvisor>> {
    if !config.enabled {
        return None;
    }
    Some(match &config.command {
        Some(program) => Box::new(CommandAdvisor::new(program, config)),
        None => Box::new(PrecheckAdvisor),
    })
}

/// Extracts advice from free-form model output.
///
/// Markdown fences are stripped; a JSON object or the first object of a JSON
/// array is accepted; otherwise the first flat `{...}` that parses is used.
pub fn parse_advice(text: &str, max_chars: usize) -> Advice {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Advice::unparsed("Empty response", max_chars);
    }
    let without_open = FENCE_OPEN.replace_all(trimmed, "");
    let cleaned = FENCE_CLOSE.replace_all(without_open.trim(), "");
    let cleaned = cleaned.trim();

    if let Ok(value) = serde_json::from_str::<Value>(cleaned) {
        let object = match value {
            Value::Array(items) => items.into_iter().find(Value::is_object),
            Value::Object(_) => Some(value),
            _ => None,
        };
        if let Some(advice) = object.and_then(|obj| serde_json::from_value::<Advice>(obj).ok()) {
            return advice;
        }
    }
    FLAT_OBJECT
        .find_iter(cleaned)
        .find_map(|candidate| serde_json::from_str::<Advice>(candidate.as_str()).ok())
        .unwrap_or_else(|| Advice::unparsed(cleaned, max_chars))
}

/// One row's advice as written to `logic_quality.json`.
#[derive(Debug, Clone, Serialize)]
pub struct LogicQualityEntry {
    #[serde(rename = "Target Table")]
    pub table: String,
    #[serde(rename = "Target Field")]
    pub field: String,
    #[serde(rename = "Logic")]
    pub logic: String,
    #[serde(rename = "AI_Judgement")]
    pub judgement: String,
    #[serde(rename = "AI_Explanation")]
    pub explanation: String,
    #[serde(rename = "AI_Suggested_Followup")]
    pub suggested_followup: String,
}

/// Asks the advisor about one request, degrading every failure to the
/// placeholder.
pub fn consult(advisor: &dyn LogicAdvisor, request: &AdviceRequest, max_chars: usize) -> Advice {
    match advisor.advise(request) {
        Ok(advice) => advice,
        Err(err) => {
            warn!(
                "Advisor '{}' failed for {}.{}: {err}",
                advisor.name(),
                request.table,
                request.field
            );
            Advice::unparsed(&err.to_string(), max_chars)
        }
    }
}

pub fn write_artifacts(dir: &Path, advised: &[(AdviceRequest, Advice)]) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("Creating advice directory {dir:?}"))?;

    let entries: Vec<LogicQualityEntry> = advised
        .iter()
        .map(|(request, advice)| LogicQualityEntry {
            table: request.table.clone(),
            field: request.field.clone(),
            logic: request.logic.clone(),
            judgement: advice.judgement.clone(),
            explanation: advice.explanation.clone(),
            suggested_followup: advice.suggested_followup.clone(),
        })
        .collect();
    let json_path = dir.join("logic_quality.json");
    let json = serde_json::to_string_pretty(&entries).context("Serializing advice")?;
    fs::write(&json_path, json).with_context(|| format!("Writing {json_path:?}"))?;

    write_sql_artifact(
        &dir.join("dq_checks_ai.sql"),
        advised,
        |advice| &advice.dq_sql,
        "-- No DQ SQL generated",
    )?;
    write_sql_artifact(
        &dir.join("recon_ai.sql"),
        advised,
        |advice| &advice.recon_sql,
        "-- No reconciliation SQL generated",
    )?;
    info!("Advice for {} row(s) written to {:?}", advised.len(), dir);
    Ok(())
}

fn write_sql_artifact(
    path: &Path,
    advised: &[(AdviceRequest, Advice)],
    pick: impl Fn(&Advice) -> &String,
    placeholder: &str,
) -> Result<()> {
    let mut sql = String::new();
    for (request, advice) in advised {
        let statement = pick(advice).trim();
        if statement.is_empty() {
            continue;
        }
        sql.push_str(&format!("-- {}.{}\n{}\n\n", request.table, request.field, statement));
    }
    if sql.is_empty() {
        sql = format!("{placeholder}\n");
    }
    debug!("Writing {:?}", path);
    fs::write(path, sql).with_context(|| format!("Writing {path:?}"))
}
