use super::scripts::Script;
use crate::error::HarvestError;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Narrow capability the extractors need from a loaded page
///
/// The live implementation is [`PageSession`](super::PageSession); tests use
/// a simulated page that returns canned snapshots.
#[allow(async_fn_in_trait)]
pub trait Evaluate {
    /// Run a named in-page script and return its JSON result
    async fn evaluate(&self, script: Script, args: Vec<Value>) -> Result<Value, HarvestError>;

    /// Serialized live DOM
    async fn page_source(&self) -> Result<String, HarvestError>;
}

/// Run a script and deserialize its result into `T`
pub async fn evaluate_as<T, E>(page: &E, script: Script, args: Vec<Value>) -> Result<T, HarvestError>
where
    T: DeserializeOwned,
    E: Evaluate,
{
    let value = page.evaluate(script, args).await?;
    serde_json::from_value(value).map_err(|e| HarvestError::Script {
        script: script.name(),
        reason: format!("unexpected result shape: {}", e),
    })
}
