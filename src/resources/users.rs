use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Page, PageParams};
use crate::{
    client::{ApiRequest, Client},
    errors::Error,
};

const USERS: &str = "users";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    /// The caller's own identifier for this user
    #[serde(default)]
    pub external_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub metadata: Option<Value>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUser {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUser {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

#[derive(Debug, Clone, Copy)]
pub struct Users<'a> {
    client: &'a Client,
}

impl<'a> Users<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    pub async fn create(&self, user: &CreateUser) -> Result<User, Error> {
        self.client
            .send(ApiRequest::post([USERS]).json(user)?)
            .await
    }

    pub async fn list(&self, page: &PageParams) -> Result<Page<User>, Error> {
        self.client.send(page.apply(ApiRequest::get([USERS]))).await
    }

    pub async fn get(&self, id: &str) -> Result<User, Error> {
        self.client.send(ApiRequest::get([USERS, id])).await
    }

    pub async fn update(&self, id: &str, update: &UpdateUser) -> Result<User, Error> {
        self.client
            .send(ApiRequest::put([USERS, id]).json(update)?)
            .await
    }

    pub async fn delete(&self, id: &str) -> Result<(), Error> {
        self.client.send(ApiRequest::delete([USERS, id])).await
    }
}
