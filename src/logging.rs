//! Structured logging for the orchestration engine.
//!
//! Every record is one JSON line. Records are filtered by level
//! (`LOG_LEVEL`) and domain (`LOG_DOMAINS`), echoed to stdout, and appended
//! to per-run files under `LOG_DIR/RUN_ID/` (`LOG_DIR=-` keeps stdout only).

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fs::{create_dir_all, File};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::process;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, OnceLock};
use std::time::Instant;

// =============================================================================
// Log Levels
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Trace = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
    Fatal = 5,
}

impl Level {
    pub fn from_env() -> Self {
        match std::env::var("LOG_LEVEL").as_deref() {
            Ok("trace") => Level::Trace,
            Ok("debug") => Level::Debug,
            Ok("info") => Level::Info,
            Ok("warn") => Level::Warn,
            Ok("error") => Level::Error,
            Ok("fatal") => Level::Fatal,
            _ => Level::Info,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Trace => "trace",
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
            Level::Fatal => "fatal",
        }
    }
}

// =============================================================================
// Log Domains
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Pipeline,  // Stage attempts and outcomes
    Agent,     // Agent credit and activation
    Optimizer, // On-demand optimization
    Facade,    // Request/response operations
    System,    // Startup, shutdown, summaries
    Profile,   // Timing scopes
}

impl Domain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Pipeline => "pipeline",
            Domain::Agent => "agent",
            Domain::Optimizer => "optimizer",
            Domain::Facade => "facade",
            Domain::System => "system",
            Domain::Profile => "profile",
        }
    }

    pub fn is_enabled(&self) -> bool {
        match std::env::var("LOG_DOMAINS").as_deref() {
            Ok("all") | Err(_) => true,
            Ok(domains) => domains.split(',').any(|d| d.trim() == self.as_str()),
        }
    }
}

// =============================================================================
// Run context
// =============================================================================

static LOG_SEQ: AtomicU64 = AtomicU64::new(0);
static PROFILE_SEQ: AtomicU64 = AtomicU64::new(0);
static RUN_CONTEXT: OnceLock<RunContext> = OnceLock::new();

fn next_seq() -> u64 {
    LOG_SEQ.fetch_add(1, Ordering::SeqCst)
}

#[derive(Debug)]
struct RunContext {
    run_id: String,
    events: Option<Mutex<BufWriter<File>>>,
    trace: Option<Mutex<BufWriter<File>>>,
}

fn open_sink(path: PathBuf) -> Option<Mutex<BufWriter<File>>> {
    match File::create(&path) {
        Ok(f) => Some(Mutex::new(BufWriter::new(f))),
        Err(err) => {
            eprintln!("[log] failed to create {}: {}", path.display(), err);
            None
        }
    }
}

fn ensure_run_context() -> &'static RunContext {
    RUN_CONTEXT.get_or_init(|| {
        let run_id = std::env::var("RUN_ID")
            .unwrap_or_else(|_| format!("r-{}-{}", ts_epoch_ms(), process::id()));
        let base = std::env::var("LOG_DIR").unwrap_or_else(|_| default_log_dir().to_string());
        if base == "-" {
            return RunContext {
                run_id,
                events: None,
                trace: None,
            };
        }

        let mut run_dir = PathBuf::from(base);
        run_dir.push(&run_id);
        if let Err(err) = create_dir_all(&run_dir) {
            eprintln!("[log] failed to create run dir: {}", err);
        }
        let _ = std::fs::write(
            run_dir.join("manifest.json"),
            json!({
                "run_id": run_id,
                "ts": ts_now(),
                "pid": process::id(),
                "log_dir": run_dir.to_string_lossy(),
            })
            .to_string(),
        );

        RunContext {
            events: open_sink(run_dir.join("events.jsonl")),
            trace: open_sink(run_dir.join("trace.jsonl")),
            run_id,
        }
    })
}

fn split_fields(mut fields: Map<String, Value>) -> (Map<String, Value>, Map<String, Value>) {
    let mut top = Map::new();
    for key in ["pipeline_id", "agent_id", "transformer_id", "msg"] {
        if let Some(value) = fields.remove(key) {
            top.insert(key.to_string(), value);
        }
    }
    (top, fields)
}

/// Unit tests keep stdout only unless LOG_DIR says otherwise.
fn default_log_dir() -> &'static str {
    if cfg!(test) {
        "-"
    } else {
        "out/runs"
    }
}

/// Warnings and above reach disk immediately; the rest wait for `flush_logs`.
fn needs_flush(level: Level) -> bool {
    level >= Level::Warn
}

fn write_line(writer: &Option<Mutex<BufWriter<File>>>, line: &str, flush: bool) {
    if let Some(Ok(mut w)) = writer.as_ref().map(|m| m.lock()) {
        let _ = writeln!(w, "{}", line);
        if flush {
            let _ = w.flush();
        }
    }
}

fn flush_sink(writer: &Option<Mutex<BufWriter<File>>>) {
    if let Some(Ok(mut w)) = writer.as_ref().map(|m| m.lock()) {
        let _ = w.flush();
    }
}

/// Push buffered records from both run files to disk.
pub fn flush_logs() {
    if let Some(ctx) = RUN_CONTEXT.get() {
        flush_sink(&ctx.events);
        flush_sink(&ctx.trace);
    }
}

// =============================================================================
// Core logging functions
// =============================================================================

/// RFC3339 timestamp with milliseconds
pub fn ts_now() -> String {
    Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

/// Epoch milliseconds
pub fn ts_epoch_ms() -> u64 {
    Utc::now().timestamp_millis() as u64
}

/// Emit a structured log entry
pub fn log(level: Level, domain: Domain, event: &str, fields: Map<String, Value>) {
    if level < Level::from_env() || !domain.is_enabled() {
        return;
    }
    emit_record(level, domain.as_str(), event, fields);
}

fn emit_record(level: Level, component: &str, event: &str, fields: Map<String, Value>) {
    let ctx = ensure_run_context();
    let (mut top, data) = split_fields(fields);

    let msg = top.remove("msg").unwrap_or(Value::String(String::new()));
    let mut entry = Map::new();
    entry.insert("ts".to_string(), json!(ts_now()));
    entry.insert("run_id".to_string(), json!(ctx.run_id.clone()));
    entry.insert("seq".to_string(), json!(next_seq()));
    entry.insert("lvl".to_string(), json!(level.as_str().to_uppercase()));
    entry.insert("component".to_string(), json!(component));
    entry.insert("event".to_string(), json!(event));
    entry.insert("msg".to_string(), msg);
    for (k, v) in top {
        entry.insert(k, v);
    }
    entry.insert("data".to_string(), Value::Object(data));

    let line = Value::Object(entry).to_string();
    match level {
        Level::Trace | Level::Debug => write_line(&ctx.trace, &line, needs_flush(level)),
        _ => write_line(&ctx.events, &line, needs_flush(level)),
    }
    println!("{}", line);
}

// =============================================================================
// Domain-Specific Logging Helpers
// =============================================================================

pub fn log_engine_start(fingerprint: &str, processing_power: f64, coherence: f64, tick_ms: u64) {
    log(
        Level::Info,
        Domain::System,
        "engine_start",
        obj(&[
            ("msg", v_str("orchestration engine activated")),
            ("seed_fingerprint", v_str(fingerprint)),
            ("neural_processing_power", v_num(processing_power)),
            ("global_coherence", v_num(coherence)),
            ("tick_ms", json!(tick_ms)),
        ]),
    );
}

pub fn log_stage_success(pipeline_id: &str, stage: &str, profit: f64, next_stage: usize) {
    log(
        Level::Debug,
        Domain::Pipeline,
        "stage_success",
        obj(&[
            ("pipeline_id", v_str(pipeline_id)),
            ("stage", v_str(stage)),
            ("profit", v_num(profit)),
            ("next_stage", json!(next_stage)),
        ]),
    );
}

pub fn log_stage_miss(pipeline_id: &str, stage: &str) {
    log(
        Level::Debug,
        Domain::Pipeline,
        "stage_miss",
        obj(&[("pipeline_id", v_str(pipeline_id)), ("stage", v_str(stage))]),
    );
}

pub fn log_stage_fault(pipeline_id: &str, reason: &str) {
    log(
        Level::Warn,
        Domain::Pipeline,
        "stage_fault",
        obj(&[
            ("pipeline_id", v_str(pipeline_id)),
            ("msg", v_str(reason)),
        ]),
    );
}

pub fn log_agent_credit(agent_id: &str, profit: f64, entanglement: f64) {
    log(
        Level::Trace,
        Domain::Agent,
        "credit",
        obj(&[
            ("agent_id", v_str(agent_id)),
            ("profit", v_num(profit)),
            ("entanglement_strength", v_num(entanglement)),
        ]),
    );
}

#[allow(clippy::too_many_arguments)]
pub fn log_tick_summary(
    tick_seq: u64,
    attempted: usize,
    succeeded: usize,
    faulted: usize,
    tick_profit: f64,
    total_profit: f64,
    coherence: f64,
    state_hash: u64,
) {
    log(
        Level::Info,
        Domain::System,
        "tick_summary",
        obj(&[
            ("tick_seq", json!(tick_seq)),
            ("attempted", json!(attempted)),
            ("succeeded", json!(succeeded)),
            ("faulted", json!(faulted)),
            ("tick_profit", v_num(tick_profit)),
            ("total_profit", v_num(total_profit)),
            ("global_coherence", v_num(coherence)),
            ("state_hash", v_str(&format!("{:016x}", state_hash))),
        ]),
    );
}

pub fn log_optimization(notes: &[String], coherence: f64, processing_power: f64) {
    log(
        Level::Info,
        Domain::Optimizer,
        "optimize",
        obj(&[
            ("notes", Value::Array(notes.iter().map(|n| v_str(n)).collect())),
            ("new_coherence", v_num(coherence)),
            ("new_processing_power", v_num(processing_power)),
        ]),
    );
}

pub fn log_facade_call(op: &str, target: &str, ok: bool) {
    log(
        Level::Info,
        Domain::Facade,
        op,
        obj(&[("target", v_str(target)), ("ok", Value::Bool(ok))]),
    );
}

// =============================================================================
// Utility Functions
// =============================================================================

pub fn obj(pairs: &[(&str, Value)]) -> Map<String, Value> {
    let mut map = Map::new();
    for (k, v) in pairs {
        map.insert((*k).to_string(), v.clone());
    }
    map
}

pub fn v_str(s: &str) -> Value {
    Value::String(s.to_string())
}

pub fn v_num(n: f64) -> Value {
    json!(n)
}

// =============================================================================
// Profiling Scope
// =============================================================================

/// Profiling scope that emits structured timing on drop.
pub struct ProfileScope {
    label: &'static str,
    context: Option<Map<String, Value>>,
    started: Instant,
    enabled: bool,
}

impl ProfileScope {
    pub fn with_context(label: &'static str, fields: &[(&str, Value)]) -> Self {
        let enabled = Self::should_sample();
        Self {
            label,
            context: if enabled { Some(obj(fields)) } else { None },
            started: Instant::now(),
            enabled,
        }
    }

    fn should_sample() -> bool {
        std::env::var("PROFILE_SAMPLE")
            .ok()
            .and_then(|v| v.parse::<f64>().ok())
            .map(|p| {
                if p >= 1.0 {
                    true
                } else if p <= 0.0 {
                    false
                } else {
                    let seq = PROFILE_SEQ.fetch_add(1, Ordering::SeqCst);
                    let bucket = (seq % 10_000) as f64 / 10_000.0;
                    bucket < p
                }
            })
            .unwrap_or(true)
    }
}

impl Drop for ProfileScope {
    fn drop(&mut self) {
        if !self.enabled {
            return;
        }
        let elapsed_ms = self.started.elapsed().as_secs_f64() * 1000.0;
        let mut fields = self.context.take().unwrap_or_default();
        fields.insert("label".to_string(), v_str(self.label));
        fields.insert("elapsed_ms".to_string(), v_num(elapsed_ms));
        log(Level::Trace, Domain::Profile, "profile", fields);
    }
}

// =============================================================================
// Tests
// =============================================================================
