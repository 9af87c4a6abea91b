//! ABOUTME: Prompt composer and LLM driver wrapper (C6): grounded prompt assembly plus
//! ABOUTME: cancellable batch/streaming generation over the `LlmDriver` adapter

mod driver;
mod prompt;

pub use driver::{collect_stream, generate, generate_stream, metadata_channel, stream_from_tokens};
pub use prompt::{build_context_block, build_messages, build_system_prompt, ContextSource, NO_ACCESSIBLE_DOCUMENTS_MESSAGE};
