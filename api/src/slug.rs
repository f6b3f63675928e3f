use std::future::Future;

use serde::Serialize;

use crate::store::{SlugStore, StoreError};

/// Inserts racing on the same derived slug are retried this many times.
const MAX_INSERT_ATTEMPTS: usize = 3;

/// The kinds of content that own a slug. Each kind is its own uniqueness scope.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Article,
    Project,
    Category,
}

impl ContentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Article => "article",
            ContentKind::Project => "project",
            ContentKind::Category => "category",
        }
    }

    /// Column length of the kind's slug.
    pub fn slug_max_len(&self) -> usize {
        match self {
            ContentKind::Article | ContentKind::Project => 200,
            ContentKind::Category => 100,
        }
    }
}

/// Room left in the column for a `-N` suffix.
const SUFFIX_RESERVE: usize = 10;

/// Transliterates the title into a lowercase, hyphen separated ASCII token.
pub fn base_slug(kind: ContentKind, title: &str) -> String {
    let mut slug = ::slug::slugify(title);

    let limit = kind.slug_max_len() - SUFFIX_RESERVE;
    if slug.len() > limit {
        // slugify only emits ASCII, so any byte index is a char boundary
        slug.truncate(limit);
        let trimmed = slug.trim_end_matches('-').len();
        slug.truncate(trimmed);
    }

    if slug.is_empty() {
        return kind.as_str().to_string();
    }

    slug
}

/// Picks the slug for a record of `kind`.
///
/// A non-empty `requested` slug is returned verbatim. Otherwise the slug is
/// derived from `title`, and `-1`, `-2`, ... are appended until no other
/// record of the same kind (ignoring `exclude_id`) uses it.
pub async fn assign_slug<S>(
    store: &S,
    kind: ContentKind,
    requested: Option<&str>,
    title: &str,
    exclude_id: Option<i32>,
) -> Result<String, StoreError>
where
    S: SlugStore + ?Sized,
{
    if let Some(slug) = requested.filter(|s| !s.is_empty()) {
        return Ok(slug.to_string());
    }

    let base = base_slug(kind, title);
    let mut candidate = base.clone();
    let mut counter: u64 = 1;

    while store.slug_taken(kind, &candidate, exclude_id).await? {
        candidate = format!("{base}-{counter}");
        counter += 1;
    }

    if candidate != base {
        tracing::debug!(kind = kind.as_str(), %base, slug = %candidate, "Slug collided, suffixed");
    }

    Ok(candidate)
}

/// Assigns a slug and runs `insert` with it.
///
/// Two concurrent inserts can derive the same slug; when the unique constraint
/// rejects ours, a derived slug is assigned again. An explicitly requested
/// slug is never changed, so its conflict is returned to the caller.
pub async fn insert_with_slug<S, T, F, Fut>(
    store: &S,
    kind: ContentKind,
    requested: Option<&str>,
    title: &str,
    mut insert: F,
) -> Result<T, StoreError>
where
    S: SlugStore + ?Sized,
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<T, StoreError>>,
{
    let explicit = requested.is_some_and(|s| !s.is_empty());
    let mut attempt = 1;

    loop {
        let slug = assign_slug(store, kind, requested, title, None).await?;

        match insert(slug.clone()).await {
            Err(StoreError::Conflict) if !explicit && attempt < MAX_INSERT_ATTEMPTS => {
                tracing::debug!(kind = kind.as_str(), %slug, attempt, "Slug taken concurrently, reassigning");
                attempt += 1;
            }
            result => return result,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::store::memory::MemoryStore;

    #[test]
    fn transliterates_and_lowercases() {
        assert_eq!(base_slug(ContentKind::Article, "Hello World"), "hello-world");
        assert_eq!(base_slug(ContentKind::Article, "Привет мир"), "privet-mir");
        assert_eq!(
            base_slug(ContentKind::Article, "  Rust & Axum: 2024!  "),
            "rust-axum-2024"
        );
    }

    #[test]
    fn untitled_content_falls_back_to_kind() {
        assert_eq!(base_slug(ContentKind::Category, "!!!"), "category");
        assert_eq!(base_slug(ContentKind::Project, ""), "project");
    }

    #[test]
    fn long_titles_leave_room_for_a_suffix() {
        let title = "word ".repeat(100);
        let slug = base_slug(ContentKind::Category, &title);

        assert!(slug.len() <= ContentKind::Category.slug_max_len() - SUFFIX_RESERVE);
        assert!(!slug.ends_with('-'));
    }

    #[tokio::test]
    async fn same_title_twice_gets_numeric_suffix() {
        let store = MemoryStore::default();

        let first = assign_slug(&store, ContentKind::Article, None, "Hello World", None)
            .await
            .unwrap();
        store.add_slug(ContentKind::Article, 1, &first).await;

        let second = assign_slug(&store, ContentKind::Article, None, "Hello World", None)
            .await
            .unwrap();
        store.add_slug(ContentKind::Article, 2, &second).await;

        let third = assign_slug(&store, ContentKind::Article, None, "Hello World", None)
            .await
            .unwrap();

        assert_eq!(first, "hello-world");
        assert_eq!(second, "hello-world-1");
        assert_eq!(third, "hello-world-2");
    }

    #[tokio::test]
    async fn explicit_slug_is_used_verbatim() {
        let store = MemoryStore::default();
        store.add_slug(ContentKind::Article, 1, "taken").await;

        let slug = assign_slug(&store, ContentKind::Article, Some("taken"), "Title", None)
            .await
            .unwrap();

        assert_eq!(slug, "taken");
    }

    #[tokio::test]
    async fn empty_requested_slug_is_derived() {
        let store = MemoryStore::default();

        let slug = assign_slug(&store, ContentKind::Article, Some(""), "My Post", None)
            .await
            .unwrap();

        assert_eq!(slug, "my-post");
    }

    #[tokio::test]
    async fn updating_record_does_not_collide_with_itself() {
        let store = MemoryStore::default();
        store.add_slug(ContentKind::Article, 7, "my-post").await;

        let slug = assign_slug(&store, ContentKind::Article, None, "My Post", Some(7))
            .await
            .unwrap();

        assert_eq!(slug, "my-post");
    }

    #[tokio::test]
    async fn scopes_are_per_kind() {
        let store = MemoryStore::default();
        store.add_slug(ContentKind::Project, 1, "my-post").await;

        let slug = assign_slug(&store, ContentKind::Article, None, "My Post", None)
            .await
            .unwrap();

        assert_eq!(slug, "my-post");
    }

    #[tokio::test]
    async fn concurrent_insert_gets_a_fresh_slug() {
        let store = MemoryStore::default();
        let attempts = AtomicUsize::new(0);

        let slug = insert_with_slug(&store, ContentKind::Article, None, "Race", |slug| {
            let store = &store;
            let attempts = &attempts;
            async move {
                if attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                    // another writer commits the same slug between our check and insert
                    store.add_slug(ContentKind::Article, 1, &slug).await;
                    return Err(StoreError::Conflict);
                }
                store.add_slug(ContentKind::Article, 2, &slug).await;
                Ok(slug)
            }
        })
        .await
        .unwrap();

        assert_eq!(slug, "race-1");
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn explicit_slug_conflict_is_returned() {
        let store = MemoryStore::default();

        let result: Result<(), _> = insert_with_slug(
            &store,
            ContentKind::Category,
            Some("news"),
            "News",
            |_| async { Err(StoreError::Conflict) },
        )
        .await;

        assert!(matches!(result, Err(StoreError::Conflict)));
    }
}
