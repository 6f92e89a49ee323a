use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use gardenlink_shared::{GardenError, Result};

use super::{Tool, str_arg};

/// `requestMemoryCompression`: emits a signal for the task runner; does no work itself.
pub struct RequestMemoryCompressionTool;

#[derive(Debug, Serialize)]
struct CompressionSignal<'a> {
    action: &'static str,
    details: CompressionDetails<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CompressionDetails<'a> {
    error_message: &'a str,
}

#[async_trait]
impl Tool for RequestMemoryCompressionTool {
    fn name(&self) -> &str {
        "requestMemoryCompression"
    }

    fn description(&self) -> &str {
        "Use ONLY when an API failure says the context window is full. Asks the runner to \
         summarize the oldest memory. Arguments: errorMessage (the full API error text)."
    }

    async fn call(&self, args: Value) -> Result<String> {
        let Some(error_message) = str_arg(&args, "errorMessage") else {
            return Ok("Error: The 'errorMessage' argument is required.".into());
        };

        let signal = CompressionSignal {
            action: "request_memory_compression",
            details: CompressionDetails { error_message },
        };
        serde_json::to_string(&signal).map_err(|e| GardenError::parse(e.to_string()))
    }
}
