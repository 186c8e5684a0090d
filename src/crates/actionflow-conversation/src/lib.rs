//! Multi-turn conversation orchestration over compiled action tools.
//!
//! This crate drives the chat loop that `actionflow-core` and
//! `actionflow-dispatch` feed into:
//!
//! - [`messages`] - the append-only conversation transcript, with tool
//!   invocation parts that resolve exactly once.
//! - [`endpoint`] - the model endpoint boundary: turn request/response wire
//!   types and the HTTP implementation.
//! - [`orchestrator`] - the state machine that submits user input, dispatches
//!   actionable tool invocations concurrently, and runs interpretation
//!   follow-ups for each result.
//!
//! # Example
//!
//! ```rust,ignore
//! use actionflow_conversation::{EndpointConfig, HttpModelEndpoint, Orchestrator};
//! use actionflow_dispatch::{DispatchConfig, HttpDispatcher, ToolCompiler};
//!
//! let compiler = ToolCompiler::new(HttpDispatcher::new(DispatchConfig::new())?);
//! let tools = compiler.compile_all(&actions);
//!
//! let endpoint = HttpModelEndpoint::new(EndpointConfig::new(
//!     "https://chat.example.com/api/turn",
//!     "agent_1",
//! ))?;
//!
//! let mut orchestrator = Orchestrator::new(endpoint, tools, "agent_1");
//! orchestrator.submit("What's the weather in Oslo?").await?;
//! println!("{}", orchestrator.transcript().visible_text());
//! ```

pub mod endpoint;
pub mod error;
pub mod messages;
pub mod orchestrator;

pub use endpoint::{
    EndpointConfig, HttpModelEndpoint, ModelEndpoint, TurnRequest, TurnResponse, WireToolCall,
    WireToolResult,
};
pub use error::{ConversationError, Result};
pub use messages::{ActionResult, ChatMessage, InvocationState, Part, Role, Transcript};
pub use orchestrator::{InterpretationPrompt, Orchestrator, Phase};
