//! # Agent
//!
//! A chat-completions agent that answers documentation questions, with
//! retrieval exposed to the model as a function tool.
//!
//! - [`ChatCompletionsClient`]: OpenAI-compatible endpoint (OpenRouter by
//!   default) behind the [`ChatModel`] trait
//! - [`RetrieveDocumentationTool`]: the `retrieve_documentation` function
//! - [`DocumentationAgent`]: the tool-calling loop
//! - [`ChatService`]: answer plus sources, as served by the chat endpoint
//! - [`run_console`]: interactive question loop behind `docrag-chat`
//!
//! ## Usage
//!
//! ```rust,ignore
//! let engine = Arc::new(RetrievalEngine::from_settings(&settings)?);
//! let client = ChatCompletionsClient::from_settings(&settings.agent)?;
//! let agent = DocumentationAgent::new(Arc::new(client))
//!     .with_tool(Arc::new(RetrieveDocumentationTool::new(engine.clone())));
//!
//! let outcome = ChatService::new(engine, agent).answer("How do I add a sidebar?", 3).await;
//! ```

pub mod agent;
pub mod client;
pub mod console;
pub mod error;
pub mod message;
pub mod service;
pub mod tool;

pub use agent::{DEFAULT_MAX_TURNS, DocumentationAgent};
pub use client::{ChatCompletionsClient, ChatModel};
pub use console::{ConsoleSummary, EXIT_COMMANDS, run_console};
pub use error::{AgentError, Result};
pub use message::{ChatMessage, FunctionCall, Role, ToolCall};
pub use service::{ChatOutcome, ChatService, ChatStatus};
pub use tool::{AgentTool, DEFAULT_TOOL_TOP_K, RetrieveDocumentationTool};
