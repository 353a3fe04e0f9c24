// Request shapes the pickers understand and the normalization that turns them
// into a single prompt string.

pub mod request;

pub use request::{
    extract_prompt, ChatMessage, ContentPart, MessageContent, PromptInput, RequestBody,
    RoutingRequest,
};
