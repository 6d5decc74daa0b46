//! Relay of streamed completion fragments to a progress sink

use futures_util::StreamExt;
use tracing::debug;

use crate::llm::CompletionStream;
use crate::Result;

use super::prompts::RESPONSE_END;

/// Receives progress text as it is produced.
pub trait ProgressSink: Send {
    fn report(&mut self, fragment: &str);
}

/// Collects fragments in memory.
impl ProgressSink for Vec<String> {
    fn report(&mut self, fragment: &str) {
        self.push(fragment.to_string());
    }
}

/// Remove the first end-of-response marker from a fragment.
///
/// Later occurrences are left in place.
pub fn strip_response_end(fragment: &str) -> String {
    fragment.replacen(RESPONSE_END, "", 1)
}

/// Forward every fragment of `stream` to `sink` in arrival order.
///
/// Returns the number of fragments relayed. A stream error stops the relay
/// and is returned as is; fragments already reported stay delivered.
pub async fn relay(mut stream: CompletionStream, sink: &mut dyn ProgressSink) -> Result<usize> {
    let mut relayed = 0;

    while let Some(fragment) = stream.next().await {
        let fragment = fragment?;
        sink.report(&strip_response_end(&fragment));
        relayed += 1;
    }

    debug!("Relayed {} fragments", relayed);
    Ok(relayed)
}
