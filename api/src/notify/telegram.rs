use async_trait::async_trait;
use serde_json::json;

use crate::{
    config::TelegramConfig,
    utils::{escape_markdown, truncate_with_ellipsis},
};

use super::{Channel, Publication};

const API_BASE: &str = "https://api.telegram.org";
const EXCERPT_CHARS: usize = 200;

pub struct TelegramChannel {
    http: reqwest::Client,
    config: TelegramConfig,
    api_base: String,
}

impl TelegramChannel {
    pub fn new(http: reqwest::Client, config: TelegramConfig) -> Self {
        TelegramChannel {
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

/// Post body in MarkdownV2: bold title, the excerpt and a link to the article.
pub fn message_text(publication: &Publication) -> String {
    let mut text = format!("📝 *{}*\n\n", escape_markdown(&publication.title));

    if !publication.excerpt.is_empty() {
        let excerpt = truncate_with_ellipsis(&publication.excerpt, EXCERPT_CHARS);
        text.push_str(&escape_markdown(&excerpt));
        text.push_str("\n\n");
    }

    // inside the link target only `)` and `\` are special
    let url = publication.url.replace('\\', "\\\\").replace(')', "\\)");
    text.push_str(&format!("[Read more]({url})"));
    text
}

#[async_trait]
impl Channel for TelegramChannel {
    fn name(&self) -> &'static str {
        "telegram"
    }

    async fn deliver(&self, publication: &Publication) -> eyre::Result<()> {
        let text = message_text(publication);

        let (method, body) = match &publication.image_url {
            Some(image_url) => (
                "sendPhoto",
                json!({
                    "chat_id": self.config.channel_id,
                    "photo": image_url,
                    "caption": text,
                    "parse_mode": "MarkdownV2",
                }),
            ),
            None => (
                "sendMessage",
                json!({
                    "chat_id": self.config.channel_id,
                    "text": text,
                    "parse_mode": "MarkdownV2",
                    "disable_web_page_preview": false,
                }),
            ),
        };

        let url = format!("{}/bot{}/{method}", self.api_base, self.config.bot_token);

        self.http
            .post(url)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        Ok(())
    }
}
