//! Answer layer - the "always a number" contract.
//!
//! Parsing cannot fail (the facade guarantees it); compiling and
//! executing can, and every such failure collapses into the answer `0`.
//! Nothing structured ever reaches the caller: one non-negative base-10
//! integer per question, by design.

use anyhow::Result;
use tracing::{debug, error};
use vidstat_common::QueryIntent;

use crate::compile::compile;
use crate::llm::OllamaClient;
use crate::parser;
use crate::store::Store;

/// Answer one question. Total: any internal failure answers "0".
pub async fn answer_question(client: &OllamaClient, store: &Store, text: &str) -> String {
    let intent = parser::parse_question(client, text).await;
    debug!(?intent, "executing intent");

    let value = match execute_intent(store, &intent) {
        Ok(v) => v,
        Err(e) => {
            error!("intent execution failed: {e:#}");
            0
        }
    };

    value.max(0).to_string()
}

/// Compile and run a single scalar query; NULL coerces to 0.
pub fn execute_intent(store: &Store, intent: &QueryIntent) -> Result<i64> {
    let query = compile(intent)?;
    let value = store.fetch_scalar(&query.sql, &query.params)?;
    Ok(value.unwrap_or(0))
}
