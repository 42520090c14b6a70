//! Audio engine sink
//!
//! The pattern engine itself is external. The runner only needs to hand it
//! program text and to silence it.

use std::sync::{Arc, Mutex};

pub trait AudioEngine: Send + Sync {
    /// Evaluates a full program, replacing whatever was playing.
    fn evaluate(&self, code: &str) -> Result<(), String>;
    /// Silences all output.
    fn hush(&self);
}

/// Prints programs instead of playing them. Used by the CLI.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutEngine;

impl AudioEngine for StdoutEngine {
    fn evaluate(&self, code: &str) -> Result<(), String> {
        println!("--- evaluate ---\n{}", code);
        Ok(())
    }

    fn hush(&self) {
        println!("--- hush ---");
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EngineCall {
    Evaluate(String),
    Hush,
}

/// Records every call; can be told to fail evaluations.
#[derive(Clone, Default)]
pub struct RecordingEngine {
    calls: Arc<Mutex<Vec<EngineCall>>>,
    failure: Arc<Mutex<Option<String>>>,
}

impl RecordingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.calls.lock().expect("recording engine poisoned").clone()
    }

    pub fn evaluations(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                EngineCall::Evaluate(code) => Some(code),
                EngineCall::Hush => None,
            })
            .collect()
    }

    pub fn hush_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| **call == EngineCall::Hush)
            .count()
    }

    /// Every following evaluation fails with `message` (`None` to recover).
    pub fn fail_with(&self, message: Option<&str>) {
        *self.failure.lock().expect("recording engine poisoned") = message.map(str::to_string);
    }
}

impl AudioEngine for RecordingEngine {
    fn evaluate(&self, code: &str) -> Result<(), String> {
        self.calls
            .lock()
            .expect("recording engine poisoned")
            .push(EngineCall::Evaluate(code.to_string()));
        match self.failure.lock().expect("recording engine poisoned").clone() {
            Some(message) => Err(message),
            None => Ok(()),
        }
    }

    fn hush(&self) {
        self.calls
            .lock()
            .expect("recording engine poisoned")
            .push(EngineCall::Hush);
    }
}
