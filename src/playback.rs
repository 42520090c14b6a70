//! Pattern runner
//!
//! Decides whether and when a freshly compiled program reaches the audio
//! engine. Re-evaluating an unchanged program can retrigger playing patterns,
//! so only real content changes go through; slider drags are coalesced by a
//! short debounce, while tempo and scale edits are applied at once.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::sleep;

use crate::engine::AudioEngine;

const TEMPO_CALL: &str = "setcpm(";
const SCALE_CALL: &str = ".scale(";

#[derive(Clone, Debug)]
pub struct RunnerSettings {
    pub debounce: Duration,
    /// Engine error substrings that are known quirks rather than real failures.
    pub benign_errors: Vec<String>,
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(30),
            benign_errors: vec![
                "got \"undefined\" instead of pattern".to_string(),
                "Cannot read properties of undefined".to_string(),
                "is not a function".to_string(),
            ],
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunnerStatus {
    Idle,
    Running,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Same content as what is already playing.
    Unchanged,
    /// Runner is stopped by a global pause; the program is kept for resume.
    Halted,
    /// Debounce armed.
    Scheduled,
    Evaluated,
    /// Engine failed with a known quirk.
    Suppressed(String),
    Failed(String),
    /// Program went blank; engine hushed.
    Stopped,
}

/// Drops comment-only lines, blank lines and tempo calls.
pub fn strip_for_comparison(pattern: &str) -> String {
    pattern
        .lines()
        .filter(|line| !line.trim_start().starts_with("//"))
        .map(|line| remove_calls(line, TEMPO_CALL))
        .map(|line| line.trim_end().to_string())
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Byte range of every `<prefix>...)` call in `text`, parentheses balanced.
fn call_spans(text: &str, prefix: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut from = 0;
    while let Some(offset) = text[from..].find(prefix) {
        let start = from + offset;
        let mut depth = 0usize;
        let mut end = text.len();
        for (i, ch) in text[start + prefix.len() - 1..].char_indices() {
            match ch {
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth == 0 {
                        end = start + prefix.len() - 1 + i + 1;
                        break;
                    }
                }
                _ => {}
            }
        }
        spans.push((start, end));
        from = end;
    }
    spans
}

fn remove_calls(line: &str, prefix: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut cursor = 0;
    for (start, end) in call_spans(line, prefix) {
        out.push_str(&line[cursor..start]);
        cursor = end;
        if line[cursor..].starts_with(';') {
            cursor += 1;
        }
    }
    out.push_str(&line[cursor..]);
    out
}

pub fn extract_tempo(pattern: &str) -> Option<String> {
    call_spans(pattern, TEMPO_CALL)
        .last()
        .map(|(start, end)| pattern[*start..*end].to_string())
}

fn scale_calls(content: &str) -> Vec<&str> {
    call_spans(content, SCALE_CALL)
        .into_iter()
        .map(|(start, end)| &content[start..end])
        .collect()
}

pub fn is_benign_error(message: &str, benign: &[String]) -> bool {
    benign
        .iter()
        .any(|needle| !needle.is_empty() && message.contains(needle.as_str()))
}

struct PendingEvaluation {
    generation: u64,
    handle: Option<JoinHandle<()>>,
}

struct RunnerInner {
    status: RunnerStatus,
    last_evaluated: Option<String>,
    last_tempo: Option<String>,
    latest: Option<String>,
    pending: Option<PendingEvaluation>,
    generation: u64,
    halted: bool,
}

impl RunnerInner {
    fn new() -> Self {
        Self {
            status: RunnerStatus::Idle,
            last_evaluated: None,
            last_tempo: None,
            latest: None,
            pending: None,
            generation: 0,
            halted: false,
        }
    }

    fn cancel_pending(&mut self) {
        if let Some(pending) = self.pending.take() {
            if let Some(handle) = pending.handle {
                handle.abort();
            }
        }
    }

    fn reset(&mut self) {
        self.cancel_pending();
        self.status = RunnerStatus::Idle;
        self.last_evaluated = None;
        self.last_tempo = None;
    }

    /// One evaluation attempt. Failures leave the previous state untouched.
    fn evaluate(
        &mut self,
        engine: &dyn AudioEngine,
        settings: &RunnerSettings,
        pattern: &str,
    ) -> SubmitOutcome {
        match engine.evaluate(pattern) {
            Ok(()) => {
                log::debug!("[runner] evaluated {} bytes", pattern.len());
                self.last_evaluated = Some(strip_for_comparison(pattern));
                self.last_tempo = extract_tempo(pattern);
                self.status = RunnerStatus::Running;
                SubmitOutcome::Evaluated
            }
            Err(err) if is_benign_error(&err, &settings.benign_errors) => {
                log::warn!("[runner] pattern engine warning: {}", err);
                SubmitOutcome::Suppressed(err)
            }
            Err(err) => {
                log::error!("[runner] pattern evaluation failed: {}", err);
                SubmitOutcome::Failed(err)
            }
        }
    }
}

#[derive(Clone)]
pub struct PatternRunner {
    inner: Arc<Mutex<RunnerInner>>,
    engine: Arc<dyn AudioEngine>,
    settings: Arc<RunnerSettings>,
}

impl PatternRunner {
    pub fn new(engine: Arc<dyn AudioEngine>, settings: RunnerSettings) -> Self {
        Self {
            inner: Arc::new(Mutex::new(RunnerInner::new())),
            engine,
            settings: Arc::new(settings),
        }
    }

    /// Feeds a freshly compiled program. Call on every recompilation.
    pub fn submit(&self, pattern: &str) -> SubmitOutcome {
        let mut guard = self.inner.lock().expect("pattern runner poisoned");
        guard.latest = Some(pattern.to_string());
        if guard.halted {
            return SubmitOutcome::Halted;
        }

        let content = strip_for_comparison(pattern);
        if content.is_empty() {
            let was_active = guard.status == RunnerStatus::Running || guard.pending.is_some();
            guard.reset();
            if !was_active {
                return SubmitOutcome::Unchanged;
            }
            log::info!("[runner] nothing to play, hushing");
            self.engine.hush();
            return SubmitOutcome::Stopped;
        }

        let tempo = extract_tempo(pattern);
        let Some(last) = guard.last_evaluated.clone() else {
            return self.schedule(&mut guard, pattern);
        };

        if last == content && tempo == guard.last_tempo {
            // Supersedes any debounced edit that has since been reverted.
            guard.cancel_pending();
            return SubmitOutcome::Unchanged;
        }

        if tempo != guard.last_tempo || scale_calls(&content) != scale_calls(&last) {
            guard.cancel_pending();
            return guard.evaluate(self.engine.as_ref(), &self.settings, pattern);
        }

        self.schedule(&mut guard, pattern)
    }

    fn schedule(&self, guard: &mut RunnerInner, pattern: &str) -> SubmitOutcome {
        guard.cancel_pending();
        guard.generation += 1;
        let generation = guard.generation;

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            log::debug!("[runner] no async runtime, evaluating without debounce");
            return guard.evaluate(self.engine.as_ref(), &self.settings, pattern);
        };

        let inner = self.inner.clone();
        let engine = self.engine.clone();
        let settings = self.settings.clone();
        let pattern = pattern.to_string();
        let delay = settings.debounce;
        let handle = runtime.spawn(async move {
            sleep(delay).await;
            let mut guard = inner.lock().expect("pattern runner poisoned");
            if guard.pending.as_ref().map(|p| p.generation) != Some(generation) {
                return;
            }
            guard.pending = None;
            guard.evaluate(engine.as_ref(), &settings, &pattern);
        });

        guard.pending = Some(PendingEvaluation {
            generation,
            handle: Some(handle),
        });
        SubmitOutcome::Scheduled
    }

    /// Hushes the engine and ignores submissions until [`resume`](Self::resume).
    pub fn stop(&self) {
        let mut guard = self.inner.lock().expect("pattern runner poisoned");
        guard.halted = true;
        guard.reset();
        log::info!("[runner] stopped");
        self.engine.hush();
    }

    /// Clears a stop and evaluates `pattern` (or the last submitted program)
    /// immediately.
    pub fn resume(&self, pattern: Option<&str>) -> SubmitOutcome {
        let latest = {
            let mut guard = self.inner.lock().expect("pattern runner poisoned");
            guard.halted = false;
            pattern.map(str::to_string).or_else(|| guard.latest.clone())
        };
        let Some(pattern) = latest else {
            return SubmitOutcome::Unchanged;
        };

        let mut guard = self.inner.lock().expect("pattern runner poisoned");
        guard.latest = Some(pattern.clone());
        if strip_for_comparison(&pattern).is_empty() {
            guard.reset();
            return SubmitOutcome::Unchanged;
        }
        guard.cancel_pending();
        guard.evaluate(self.engine.as_ref(), &self.settings, &pattern)
    }

    pub fn status(&self) -> RunnerStatus {
        self.inner.lock().expect("pattern runner poisoned").status
    }

    pub fn is_halted(&self) -> bool {
        self.inner.lock().expect("pattern runner poisoned").halted
    }

    pub fn has_pending(&self) -> bool {
        self.inner
            .lock()
            .expect("pattern runner poisoned")
            .pending
            .is_some()
    }

    /// Comparison form of the program currently playing.
    pub fn last_evaluated(&self) -> Option<String> {
        self.inner
            .lock()
            .expect("pattern runner poisoned")
            .last_evaluated
            .clone()
    }
}
