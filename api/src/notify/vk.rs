use async_trait::async_trait;
use serde_json::Value;

use crate::{config::VkConfig, utils::truncate_with_ellipsis};

use super::{Channel, Publication};

const API_BASE: &str = "https://api.vk.com";
const API_VERSION: &str = "5.131";
const EXCERPT_CHARS: usize = 300;

pub struct VkChannel {
    http: reqwest::Client,
    config: VkConfig,
    api_base: String,
}

impl VkChannel {
    pub fn new(http: reqwest::Client, config: VkConfig) -> Self {
        VkChannel {
            http,
            config,
            api_base: API_BASE.to_string(),
        }
    }

    #[cfg(test)]
    fn with_api_base(mut self, api_base: String) -> Self {
        self.api_base = api_base;
        self
    }
}

pub fn message_text(publication: &Publication) -> String {
    let mut text = format!("📝 {}\n\n", publication.title);

    if !publication.excerpt.is_empty() {
        text.push_str(&truncate_with_ellipsis(&publication.excerpt, EXCERPT_CHARS));
        text.push_str("\n\n");
    }

    text.push_str(&format!("🔗 Read: {}", publication.url));
    text
}

#[async_trait]
impl Channel for VkChannel {
    fn name(&self) -> &'static str {
        "vk"
    }

    async fn deliver(&self, publication: &Publication) -> eyre::Result<()> {
        let owner_id = format!("-{}", self.config.group_id);
        let message = message_text(publication);

        let mut params = vec![
            ("owner_id", owner_id.as_str()),
            ("message", message.as_str()),
            ("from_group", "1"),
            ("access_token", self.config.access_token.as_str()),
            ("v", API_VERSION),
        ];
        if let Some(image_url) = &publication.image_url {
            params.push(("attachments", image_url.as_str()));
        }

        let response: Value = self
            .http
            .post(format!("{}/method/wall.post", self.api_base))
            .query(&params)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        // the API answers 200 even when the call failed
        if let Some(error) = response.get("error") {
            let message = error
                .get("error_msg")
                .and_then(Value::as_str)
                .unwrap_or("unknown error");
            eyre::bail!("VK API error: {message}");
        }

        Ok(())
    }
}
