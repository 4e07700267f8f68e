//! Hosted model integrations.

pub mod inference_client {
    pub use crate::inference_client::*;
}

pub mod chat {
    pub use crate::followup::{load_chat_model, ChatModel, HuggingFaceChatClient};
}
