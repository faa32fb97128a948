//! Batch files: `[{"function": "<builtin>", "args": {...}}, ...]`

use crate::builtins;
use anyhow::{bail, Context, Result};
use forkpool_core::domain::{ArgMap, NamedFn};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct BatchEntry {
    function: String,
    #[serde(default)]
    args: ArgMap,
}

/// Parallel function and argument lists, ready for `Executor::execute`
#[derive(Debug)]
pub struct Batch {
    pub functions: Vec<NamedFn>,
    pub args: Vec<ArgMap>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.functions.len()
    }
}

/// Load and resolve a batch file
pub fn load(path: &Path) -> Result<Batch> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read batch file {}", path.display()))?;
    parse(&raw).with_context(|| format!("Invalid batch file {}", path.display()))
}

/// Parse batch JSON and resolve every function against the builtin registry
pub fn parse(raw: &str) -> Result<Batch> {
    let entries: Vec<BatchEntry> = serde_json::from_str(raw).context("Invalid batch JSON")?;

    let mut functions = Vec::with_capacity(entries.len());
    let mut args = Vec::with_capacity(entries.len());
    for (index, entry) in entries.into_iter().enumerate() {
        let Some(function) = builtins::lookup(&entry.function) else {
            bail!(
                "entry {}: unknown function '{}' (see `forkpool functions`)",
                index,
                entry.function
            );
        };
        functions.push(function);
        args.push(entry.args);
    }

    Ok(Batch { functions, args })
}

/// The `inc(0..=8), inc("a")` demo batch
pub fn demo() -> Batch {
    use crate::builtins::inc;

    let mut values: Vec<serde_json::Value> = (0..9).map(serde_json::Value::from).collect();
    values.push(serde_json::Value::from("a"));

    let args = values
        .into_iter()
        .map(|val| {
            let mut map = ArgMap::new();
            map.insert("val".to_string(), val);
            map
        })
        .collect::<Vec<_>>();
    let functions = args
        .iter()
        .map(|_| forkpool_core::named_fn!(inc))
        .collect();

    Batch { functions, args }
}
