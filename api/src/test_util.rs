use std::{
    net::SocketAddr,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use axum::Router;
use chrono::NaiveDate;

use crate::{
    blog::models::article::Article,
    notify::{Channel, Publication},
};

/// Serves `router` on an ephemeral local port for the rest of the test.
pub async fn serve(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

/// An address nothing listens on.
pub async fn closed_addr() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Channel that sleeps for `delay`, then succeeds or fails.
pub struct FakeChannel {
    name: &'static str,
    delay: Duration,
    fail: bool,
    calls: AtomicUsize,
}

impl FakeChannel {
    pub fn new(name: &'static str, delay: Duration, fail: bool) -> Arc<Self> {
        Arc::new(FakeChannel {
            name,
            delay,
            fail,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Channel for FakeChannel {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn deliver(&self, _publication: &Publication) -> eyre::Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        if self.fail {
            eyre::bail!("channel rejected the post");
        }
        Ok(())
    }
}

/// A published regular article with an image.
pub fn article() -> Article {
    let at = NaiveDate::from_ymd_opt(2024, 5, 1)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap();
    Article {
        id: 1,
        title: "Hello".into(),
        slug: "hello".into(),
        sub_title: String::new(),
        excerpt: "Intro".into(),
        body: "Body".into(),
        img: Some("/media/articles/hello.png".into()),
        category_id: None,
        author: "Owner".into(),
        views: 0,
        is_published: true,
        is_achievement: false,
        achievement_icon: "fas fa-trophy".into(),
        achievement_date: None,
        created_at: at,
        updated_at: at,
    }
}
