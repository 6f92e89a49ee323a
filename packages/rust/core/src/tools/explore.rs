use async_trait::async_trait;
use serde_json::Value;

use gardenlink_shared::Result;

use super::{Tool, str_arg};
use crate::explore::GraphTraversalAssembler;

/// `exploreWikilinks`: recursive link exploration with relevance filtering.
pub struct ExploreWikilinksTool {
    assembler: GraphTraversalAssembler,
}

impl ExploreWikilinksTool {
    pub fn new(assembler: GraphTraversalAssembler) -> Self {
        Self { assembler }
    }
}

#[async_trait]
impl Tool for ExploreWikilinksTool {
    fn name(&self) -> &str {
        "exploreWikilinks"
    }

    fn description(&self) -> &str {
        "Follows [[wikilinks]] in `initialContent` (which must contain at least one) up to two \
         levels deep across gardens, then keeps only what is relevant to `goal`. \
         Arguments: goal (string), initialContent (string)."
    }

    async fn call(&self, args: Value) -> Result<String> {
        let (Some(goal), Some(initial_content)) =
            (str_arg(&args, "goal"), str_arg(&args, "initialContent"))
        else {
            return Ok("Error: 'goal' and 'initialContent' are required.".into());
        };

        self.assembler.assemble(goal, initial_content).await
    }
}
