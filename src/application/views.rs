//! Shapes the collection is projected into for callers: resource listings,
//! resource reads and the summary prompt.

use crate::domain::todo::{Todo, TodoId};

pub const TEXT_MIME_TYPE: &str = "text/plain";
pub const URI_SCHEME: &str = "todo";

pub fn resource_uri(id: &TodoId) -> String { format!("{URI_SCHEME}:///{id}") }

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceDescriptor {
    pub uri: String,
    pub name: String,
    pub description: String,
    pub mime_type: String,
    pub done: bool,
}

impl ResourceDescriptor {
    pub fn new(id: &TodoId, todo: &Todo) -> Self {
        Self {
            uri: resource_uri(id),
            name: todo.title.clone(),
            description: format!("A text todo: {}", todo.title),
            mime_type: TEXT_MIME_TYPE.to_string(),
            done: todo.done,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceContents {
    pub uri: String,
    pub mime_type: String,
    pub text: String,
    pub done: bool,
}

impl ResourceContents {
    pub fn new(id: &TodoId, todo: &Todo) -> Self {
        Self {
            uri: resource_uri(id),
            mime_type: TEXT_MIME_TYPE.to_string(),
            text: todo.content.clone(),
            done: todo.done,
        }
    }
}


/// Prompt messages are always spoken by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageContent {
    Text { text: String },
    Resource { resource: ResourceContents },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptMessage {
    pub content: MessageContent,
}

impl PromptMessage {
    pub fn user_text(text: impl Into<String>) -> Self {
        Self { content: MessageContent::Text { text: text.into() } }
    }

    pub fn user_resource(resource: ResourceContents) -> Self {
        Self { content: MessageContent::Resource { resource } }
    }

    pub fn is_resource(&self) -> bool { matches!(self.content, MessageContent::Resource { .. }) }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryPrompt {
    pub description: String,
    pub messages: Vec<PromptMessage>,
}
