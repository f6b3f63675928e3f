//! Best-effort announcements of new articles on external channels.

pub mod telegram;
pub mod vk;

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use futures::future::join_all;
use tokio::task::JoinHandle;

use crate::{blog::models::article::Article, config::ServerConfig};

use self::{telegram::TelegramChannel, vk::VkChannel};

/// What gets announced about a piece of content.
#[derive(Debug, Clone, PartialEq)]
pub struct Publication {
    pub title: String,
    pub excerpt: String,
    pub url: String,
    pub image_url: Option<String>,
}

impl Publication {
    pub fn from_article(article: &Article, site_url: &str) -> Self {
        Publication {
            title: article.title.clone(),
            excerpt: article.excerpt.clone(),
            url: format!("{site_url}/blog/{}/", article.slug),
            image_url: article
                .img
                .as_deref()
                .filter(|img| !img.is_empty())
                .map(|img| format!("{site_url}/{}", img.trim_start_matches('/'))),
        }
    }
}

/// New published articles are announced; achievements and drafts are not.
pub fn should_announce(article: &Article) -> bool {
    article.is_published && !article.is_achievement
}

#[async_trait]
pub trait Channel: Send + Sync {
    fn name(&self) -> &'static str;

    async fn deliver(&self, publication: &Publication) -> eyre::Result<()>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum DeliveryStatus {
    Delivered,
    Failed(String),
    TimedOut,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub channel: &'static str,
    pub status: DeliveryStatus,
}

#[derive(Clone)]
pub struct Notifier {
    channels: Arc<[Arc<dyn Channel>]>,
    timeout: Duration,
}

impl Notifier {
    pub fn new(channels: Vec<Arc<dyn Channel>>, timeout: Duration) -> Self {
        Notifier {
            channels: channels.into(),
            timeout,
        }
    }

    /// Channels whose credentials are all configured.
    pub fn from_config(config: &ServerConfig, http: reqwest::Client) -> Self {
        let mut channels: Vec<Arc<dyn Channel>> = vec![];

        if let Some(telegram) = &config.telegram {
            channels.push(Arc::new(TelegramChannel::new(http.clone(), telegram.clone())));
        }
        if let Some(vk) = &config.vk {
            channels.push(Arc::new(VkChannel::new(http, vk.clone())));
        }

        tracing::info!(
            channels = ?channels.iter().map(|c| c.name()).collect::<Vec<_>>(),
            "Publication notifier configured"
        );

        Notifier::new(channels, config.notify_timeout)
    }

    pub fn channel_names(&self) -> Vec<&'static str> {
        self.channels.iter().map(|c| c.name()).collect()
    }

    /// Delivers to every channel concurrently. Each channel gets its own
    /// timeout and a failure never affects the others.
    pub async fn deliver_all(&self, publication: &Publication) -> Vec<Delivery> {
        let deliveries = self.channels.iter().map(|channel| async move {
            let status =
                match tokio::time::timeout(self.timeout, channel.deliver(publication)).await {
                    Ok(Ok(())) => {
                        tracing::info!(channel = channel.name(), title = %publication.title, "Publication announced");
                        DeliveryStatus::Delivered
                    }
                    Ok(Err(e)) => {
                        tracing::error!(channel = channel.name(), error = ?e, "Could not announce publication");
                        DeliveryStatus::Failed(e.to_string())
                    }
                    Err(_) => {
                        tracing::warn!(channel = channel.name(), timeout = ?self.timeout, "Announcing publication timed out");
                        DeliveryStatus::TimedOut
                    }
                };

            Delivery {
                channel: channel.name(),
                status,
            }
        });

        join_all(deliveries).await
    }

    /// Announces a newly created article when it qualifies. Returns at once,
    /// like [`Notifier::publish`].
    pub fn announce(
        &self,
        article: &Article,
        site_url: &str,
    ) -> Option<JoinHandle<Vec<Delivery>>> {
        if !should_announce(article) {
            return None;
        }
        self.publish(Publication::from_article(article, site_url))
    }

    /// Announces in the background. The caller never waits on or sees the
    /// outcome; the handle is only useful to tests.
    pub fn publish(&self, publication: Publication) -> Option<JoinHandle<Vec<Delivery>>> {
        if self.channels.is_empty() {
            return None;
        }

        let notifier = self.clone();
        Some(tokio::spawn(async move {
            notifier.deliver_all(&publication).await
        }))
    }
}
