use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Page, PageParams, Source};
use crate::{
    client::{ApiRequest, Client, ResponseStream},
    errors::Error,
};

const CONVERSATIONS: &str = "conversations";
const MESSAGES: &str = "messages";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub metadata: Option<Value>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateConversation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListConversations {
    pub page: PageParams,
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    #[serde(default)]
    pub id: Option<String>,
    pub role: Role,
    pub content: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessage {
    pub content: String,
    /// Whether the reply may draw on stored memories
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_memory: Option<bool>,
}

impl SendMessage {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            use_memory: None,
        }
    }

    #[must_use]
    pub fn use_memory(mut self, use_memory: bool) -> Self {
        self.use_memory = Some(use_memory);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
    pub message: ChatMessage,
    #[serde(default)]
    pub sources: Vec<Source>,
}

#[derive(Debug, Clone, Copy)]
pub struct Conversations<'a> {
    client: &'a Client,
}

impl<'a> Conversations<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    pub async fn create(&self, conversation: &CreateConversation) -> Result<Conversation, Error> {
        self.client
            .send(ApiRequest::post([CONVERSATIONS]).json(conversation)?)
            .await
    }

    pub async fn list(&self, params: &ListConversations) -> Result<Page<Conversation>, Error> {
        let request = params
            .page
            .apply(ApiRequest::get([CONVERSATIONS]))
            .query_opt("userId", params.user_id.as_deref());
        self.client.send(request).await
    }

    pub async fn get(&self, id: &str) -> Result<Conversation, Error> {
        self.client.send(ApiRequest::get([CONVERSATIONS, id])).await
    }

    pub async fn delete(&self, id: &str) -> Result<(), Error> {
        self.client
            .send(ApiRequest::delete([CONVERSATIONS, id]))
            .await
    }

    /// Full history, oldest first
    pub async fn messages(&self, id: &str) -> Result<Vec<ChatMessage>, Error> {
        self.client
            .send(ApiRequest::get([CONVERSATIONS, id, MESSAGES]))
            .await
    }

    pub async fn send(&self, id: &str, message: &SendMessage) -> Result<ChatReply, Error> {
        self.client
            .send(ApiRequest::post([CONVERSATIONS, id, MESSAGES]).json(message)?)
            .await
    }

    /// Sends a message and streams the reply back as it's generated
    pub async fn stream(&self, id: &str, message: &SendMessage) -> Result<ResponseStream, Error> {
        self.client
            .stream(ApiRequest::post([CONVERSATIONS, id, MESSAGES, "stream"]).json(message)?)
            .await
    }
}
