use serde::{Deserialize, Serialize};

use super::Source;
use crate::{
    client::{ApiRequest, Client, ResponseStream},
    errors::Error,
};

/// A question answered from the stored memories
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    pub query: String,
    /// How many memories to retrieve as context
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl QueryRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    #[must_use]
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResponse {
    pub answer: String,
    #[serde(default)]
    pub sources: Vec<Source>,
}

#[derive(Debug, Clone, Copy)]
pub struct Query<'a> {
    client: &'a Client,
}

impl<'a> Query<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    pub async fn ask(&self, request: &QueryRequest) -> Result<QueryResponse, Error> {
        self.client
            .send(ApiRequest::post(["query"]).json(request)?)
            .await
    }

    /// Same as [`Query::ask`] but the answer arrives as a stream of events while it's generated
    pub async fn stream(&self, request: &QueryRequest) -> Result<ResponseStream, Error> {
        self.client
            .stream(ApiRequest::post(["query", "stream"]).json(request)?)
            .await
    }
}
