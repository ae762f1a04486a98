mod assets_tests;
mod tokens_tests;

use crate::browser::{Evaluate, Script};
use crate::error::HarvestError;
use serde_json::{Value, json};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

/// Simulated page that answers scripts with canned snapshots
///
/// A script given a sequence answers with its entries in order and keeps
/// repeating the last one.
#[derive(Debug, Default)]
pub(crate) struct FakePage {
    results: HashMap<Script, Value>,
    sequences: Mutex<HashMap<Script, VecDeque<Value>>>,
    calls: Mutex<Vec<(Script, Vec<Value>)>>,
    html: String,
}

impl FakePage {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_script(mut self, script: Script, result: Value) -> Self {
        self.results.insert(script, result);
        self
    }

    pub(crate) fn with_sequence(mut self, script: Script, results: Vec<Value>) -> Self {
        self.sequences
            .get_mut()
            .unwrap()
            .insert(script, results.into());
        self
    }

    pub(crate) fn with_html(mut self, html: &str) -> Self {
        self.html = html.to_string();
        self
    }

    /// Every script evaluated so far, with its arguments
    pub(crate) fn calls(&self) -> Vec<(Script, Vec<Value>)> {
        self.calls.lock().unwrap().clone()
    }

    fn next_in_sequence(&self, script: Script) -> Option<Value> {
        let mut sequences = self.sequences.lock().unwrap();
        let queue = sequences.get_mut(&script)?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

impl Evaluate for FakePage {
    async fn evaluate(&self, script: Script, args: Vec<Value>) -> Result<Value, HarvestError> {
        self.calls.lock().unwrap().push((script, args));

        self.next_in_sequence(script)
            .or_else(|| self.results.get(&script).cloned())
            .ok_or_else(|| HarvestError::Script {
                script: script.name(),
                reason: "script threw: ReferenceError".to_string(),
            })
    }

    async fn page_source(&self) -> Result<String, HarvestError> {
        if self.html.is_empty() {
            return Err(HarvestError::Session("no document loaded".to_string()));
        }
        Ok(self.html.clone())
    }
}

/// Style probe of an element that is laid out and shown
pub(crate) fn visible() -> Value {
    json!({ "display": "block", "visibility": "visible", "opacity": "1", "inLayout": true })
}
