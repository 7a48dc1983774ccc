use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Page, PageParams};
use crate::{
    client::{ApiRequest, Client},
    errors::Error,
};

const WEBHOOKS: &str = "webhooks";

/// An endpoint the service calls back when something happens, e.g. `memory.created`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Webhook {
    pub id: String,
    pub url: String,
    #[serde(default)]
    pub events: Vec<String>,
    #[serde(default = "enabled")]
    pub active: bool,
    /// Only returned when the webhook is created
    #[serde(default)]
    pub secret: Option<String>,
    pub created_at: DateTime<Utc>,
}

fn enabled() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWebhook {
    pub url: String,
    pub events: Vec<String>,
}

impl CreateWebhook {
    pub fn new<I>(url: impl Into<String>, events: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self {
            url: url.into(),
            events: events.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateWebhook {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub events: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

#[derive(Debug, Clone, Copy)]
pub struct Webhooks<'a> {
    client: &'a Client,
}

impl<'a> Webhooks<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    pub async fn create(&self, webhook: &CreateWebhook) -> Result<Webhook, Error> {
        self.client
            .send(ApiRequest::post([WEBHOOKS]).json(webhook)?)
            .await
    }

    pub async fn list(&self, page: &PageParams) -> Result<Page<Webhook>, Error> {
        self.client.send(page.apply(ApiRequest::get([WEBHOOKS]))).await
    }

    pub async fn get(&self, id: &str) -> Result<Webhook, Error> {
        self.client.send(ApiRequest::get([WEBHOOKS, id])).await
    }

    pub async fn update(&self, id: &str, update: &UpdateWebhook) -> Result<Webhook, Error> {
        self.client
            .send(ApiRequest::put([WEBHOOKS, id]).json(update)?)
            .await
    }

    pub async fn delete(&self, id: &str) -> Result<(), Error> {
        self.client.send(ApiRequest::delete([WEBHOOKS, id])).await
    }
}
