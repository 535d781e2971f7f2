//! Tool-calling agent loop.

use std::sync::Arc;

use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::client::ChatModel;
use crate::error::{AgentError, Result};
use crate::message::{ChatMessage, ToolCall};
use crate::tool::AgentTool;

/// Model round trips allowed per question.
pub const DEFAULT_MAX_TURNS: usize = 6;

pub const AGENT_NAME: &str = "Documentation Assistant";

/// System instructions for [`DocumentationAgent`].
pub const DEFAULT_INSTRUCTIONS: &str = "\
You are an AI assistant with access to documentation. Your primary function is to help users \
by providing accurate information based on documentation when appropriate.

- When a user asks a question that might be related to documentation, use the \
'retrieve_documentation' tool to search for relevant information
- Only use the tool when you think the question requires specific documentation knowledge
- For general knowledge questions, respond using your general knowledge without using the tool
- When you receive documentation results, incorporate the relevant information into your response
- Always be clear about what information comes from the documentation versus your general knowledge
- If the documentation doesn't contain relevant information, acknowledge this and respond based \
on your general knowledge";

/// Answers questions, calling tools when the model asks for them.
pub struct DocumentationAgent {
    model: Arc<dyn ChatModel>,
    tools: Vec<Arc<dyn AgentTool>>,
    instructions: String,
    max_turns: usize,
}

impl DocumentationAgent {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self {
            model,
            tools: Vec::new(),
            instructions: DEFAULT_INSTRUCTIONS.to_string(),
            max_turns: DEFAULT_MAX_TURNS,
        }
    }

    /// Offer `tool` to the model.
    pub fn with_tool(mut self, tool: Arc<dyn AgentTool>) -> Self {
        self.tools.push(tool);
        self
    }

    /// Replace the system prompt.
    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = instructions.into();
        self
    }

    /// Set the turn budget. Zero is treated as one.
    pub fn with_max_turns(mut self, max_turns: usize) -> Self {
        self.max_turns = max_turns.max(1);
        self
    }

    pub fn name(&self) -> &str {
        AGENT_NAME
    }

    /// Answer `query`.
    ///
    /// Each turn sends the conversation so far. Tool calls in the reply are
    /// executed in order and their outputs appended; a reply without tool
    /// calls is the answer.
    pub async fn run(&self, query: &str) -> Result<String> {
        let definitions: Vec<Value> = self.tools.iter().map(|tool| tool.definition()).collect();
        let mut messages = vec![
            ChatMessage::system(self.instructions.as_str()),
            ChatMessage::user(query),
        ];

        for turn in 1..=self.max_turns {
            let reply = self.model.complete(&messages, &definitions).await?;
            let calls = reply.requested_calls().to_vec();

            if calls.is_empty() {
                let answer = reply.content.filter(|c| !c.trim().is_empty()).ok_or_else(|| {
                    AgentError::InvalidResponse("reply has neither content nor tool calls".to_string())
                })?;
                info!("Agent answered after {turn} turn(s)");
                return Ok(answer);
            }

            debug!("Turn {turn}: model requested {} tool call(s)", calls.len());
            messages.push(reply);
            for call in &calls {
                let output = self.call_tool(call).await;
                messages.push(ChatMessage::tool(&call.id, output.to_string()));
            }
        }

        warn!("Agent gave up after {} turns", self.max_turns);
        Err(AgentError::TurnLimit(self.max_turns))
    }

    async fn call_tool(&self, call: &ToolCall) -> Value {
        let name = call.function.name.as_str();
        match self.tools.iter().find(|tool| tool.name() == name) {
            Some(tool) => {
                info!("Calling tool {name}");
                tool.invoke(&call.function.arguments).await
            }
            None => {
                warn!("Model requested unknown tool {name}");
                json!({"status": "error", "error": format!("unknown tool: {name}")})
            }
        }
    }
}
