use std::collections::HashMap;

use serde::Serialize;

use crate::{
    blog::vote::{SubjectKind, UserVote},
    store::{AuthoredComment, CommentStore, StoreError, VoteStore},
};

// The model that will be returned to the client
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct CommentTree {
    pub id: i32,
    pub author_name: String,
    pub content: String,
    pub parent_id: Option<i32>,
    pub created_at: chrono::NaiveDateTime,
    pub children: Vec<CommentTree>,
    pub likes: i64,
    pub dislikes: i64,
    pub user_vote: UserVote,
    pub depth: usize,
    pub is_comment_owner: bool,
    pub is_blog_author: bool,
}

impl CommentTree {
    /// A leaf node without votes, as a comment looks right after creation.
    pub fn leaf(
        row: AuthoredComment,
        depth: usize,
        viewer_id: Option<i32>,
        owner_id: i32,
    ) -> Self {
        let AuthoredComment {
            comment,
            author_name,
        } = row;

        CommentTree {
            id: comment.id,
            author_name,
            content: comment.content,
            parent_id: comment.parent_id,
            created_at: comment.created_at,
            children: vec![],
            likes: 0,
            dislikes: 0,
            user_vote: UserVote::None,
            depth,
            is_comment_owner: viewer_id == Some(comment.identity_id),
            is_blog_author: comment.identity_id == owner_id,
        }
    }
}

/// Assembles flat rows into threads.
///
/// Rows live in one arena and are linked through a parent index, so assembly
/// is linear in the number of rows. Roots and every child list come out
/// ordered by creation time. Rows whose parent is not among `rows` (for
/// example hidden by moderation) are dropped along with their replies.
pub fn build_tree(mut rows: Vec<CommentTree>) -> Vec<CommentTree> {
    rows.sort_by_key(|c| (c.created_at, c.id));

    let index: HashMap<i32, usize> = rows.iter().enumerate().map(|(i, c)| (c.id, i)).collect();

    let mut children: Vec<Vec<usize>> = vec![vec![]; rows.len()];
    let mut roots = vec![];
    for (i, comment) in rows.iter().enumerate() {
        match comment.parent_id {
            None => roots.push(i),
            Some(parent_id) => {
                if let Some(&parent) = index.get(&parent_id) {
                    children[parent].push(i);
                }
            }
        }
    }

    let mut arena: Vec<Option<CommentTree>> = rows.into_iter().map(Some).collect();

    roots
        .into_iter()
        .filter_map(|root| assemble(root, 0, &mut arena, &children))
        .collect()
}

fn assemble(
    idx: usize,
    depth: usize,
    arena: &mut [Option<CommentTree>],
    children: &[Vec<usize>],
) -> Option<CommentTree> {
    let mut node = arena[idx].take()?;
    node.depth = depth;
    node.children = children[idx]
        .iter()
        .filter_map(|&child| assemble(child, depth + 1, arena, children))
        .collect();
    Some(node)
}

/// Approved threads of an article with vote counts and the viewer's votes.
pub async fn list_for_entity<S>(
    store: &S,
    article_id: i32,
    viewer_id: Option<i32>,
    owner_id: i32,
) -> Result<Vec<CommentTree>, StoreError>
where
    S: CommentStore + VoteStore + ?Sized,
{
    let rows = store.approved_comments(article_id).await?;
    let ids: Vec<i32> = rows.iter().map(|r| r.comment.id).collect();

    let tallies = store.tallies(SubjectKind::Comment, &ids).await?;
    let directions = match viewer_id {
        Some(viewer_id) => {
            store
                .directions_of(viewer_id, SubjectKind::Comment, &ids)
                .await?
        }
        None => HashMap::new(),
    };

    let nodes = rows
        .into_iter()
        .map(|row| {
            let mut node = CommentTree::leaf(row, 0, viewer_id, owner_id);
            let tally = tallies.get(&node.id).copied().unwrap_or_default();
            node.likes = tally.likes;
            node.dislikes = tally.dislikes;
            node.user_vote = UserVote::from(directions.get(&node.id).copied());
            node
        })
        .collect();

    Ok(build_tree(nodes))
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::{
        blog::{
            comment::create_comment,
            vote::{Direction, Subject, cast},
        },
        store::memory::MemoryStore,
    };

    const ARTICLE: i32 = 1;
    const OWNER: i32 = 1;
    const READER: i32 = 2;

    fn node(id: i32, parent_id: Option<i32>, minute: u32) -> CommentTree {
        CommentTree {
            id,
            author_name: format!("Author {id}"),
            content: format!("Content for comment {id}"),
            parent_id,
            created_at: NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(0, minute, 0)
                .unwrap(),
            children: vec![],
            likes: 0,
            dislikes: 0,
            user_vote: UserVote::None,
            depth: 0,
            is_comment_owner: false,
            is_blog_author: false,
        }
    }

    #[test]
    fn empty_input_gives_empty_tree() {
        assert!(build_tree(vec![]).is_empty());
    }

    #[test]
    fn replies_nest_under_parents_with_depth() {
        let tree = build_tree(vec![
            node(3, Some(2), 3),
            node(1, None, 1),
            node(2, Some(1), 2),
        ]);

        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].id, 1);
        assert_eq!(tree[0].children[0].id, 2);
        assert_eq!(tree[0].children[0].depth, 1);
        assert_eq!(tree[0].children[0].children[0].id, 3);
        assert_eq!(tree[0].children[0].children[0].depth, 2);
    }

    #[test]
    fn roots_and_children_are_oldest_first() {
        let tree = build_tree(vec![
            node(4, None, 9),
            node(1, None, 1),
            node(3, Some(1), 5),
            node(2, Some(1), 2),
        ]);

        let roots: Vec<i32> = tree.iter().map(|c| c.id).collect();
        let replies: Vec<i32> = tree[0].children.iter().map(|c| c.id).collect();

        assert_eq!(roots, vec![1, 4]);
        assert_eq!(replies, vec![2, 3]);
    }

    #[test]
    fn orphaned_replies_are_hidden() {
        // 2 is missing, e.g. unapproved, so its reply 3 must not surface
        let tree = build_tree(vec![node(1, None, 1), node(3, Some(2), 3)]);

        assert_eq!(tree.len(), 1);
        assert!(tree[0].children.is_empty());
    }

    #[tokio::test]
    async fn listing_carries_votes_and_flags() {
        let store = MemoryStore::default();
        store.add_author(OWNER, "Owner").await;
        store.add_author(READER, "Reader").await;

        let root = create_comment(&store, ARTICLE, READER, "first".into(), None)
            .await
            .unwrap()
            .comment;
        let answer = create_comment(&store, ARTICLE, OWNER, "thanks".into(), Some(root.id))
            .await
            .unwrap()
            .comment;
        cast(&store, Subject::comment(root.id), OWNER, Direction::Like)
            .await
            .unwrap();
        cast(&store, Subject::comment(answer.id), READER, Direction::Dislike)
            .await
            .unwrap();

        let tree = list_for_entity(&store, ARTICLE, Some(READER), OWNER)
            .await
            .unwrap();

        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].author_name, "Reader");
        assert_eq!(tree[0].likes, 1);
        assert!(tree[0].is_comment_owner);
        assert!(!tree[0].is_blog_author);
        assert_eq!(tree[0].user_vote, UserVote::None);

        let reply = &tree[0].children[0];
        assert_eq!(reply.dislikes, 1);
        assert_eq!(reply.user_vote, UserVote::Disliked);
        assert!(reply.is_blog_author);
        assert!(!reply.is_comment_owner);
    }

    #[tokio::test]
    async fn unapproved_comments_and_their_replies_are_hidden() {
        let store = MemoryStore::default();
        let root = create_comment(&store, ARTICLE, READER, "root".into(), None)
            .await
            .unwrap()
            .comment;
        let hidden = create_comment(&store, ARTICLE, READER, "spam".into(), Some(root.id))
            .await
            .unwrap()
            .comment;
        create_comment(&store, ARTICLE, READER, "under spam".into(), Some(hidden.id))
            .await
            .unwrap();
        store.set_approval(&[hidden.id], false).await.unwrap();

        let tree = list_for_entity(&store, ARTICLE, None, OWNER).await.unwrap();

        assert_eq!(tree.len(), 1);
        assert!(tree[0].children.is_empty());
    }

    #[tokio::test]
    async fn listing_is_stable_without_writes() {
        let store = MemoryStore::default();
        let mut parent = None;
        for i in 0..6 {
            let created = create_comment(&store, ARTICLE, READER, format!("c{i}"), parent)
                .await
                .unwrap();
            parent = if i % 2 == 0 { Some(created.comment.id) } else { None };
        }

        let first = list_for_entity(&store, ARTICLE, Some(READER), OWNER)
            .await
            .unwrap();
        let second = list_for_entity(&store, ARTICLE, Some(READER), OWNER)
            .await
            .unwrap();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn other_articles_are_not_listed() {
        let store = MemoryStore::default();
        create_comment(&store, 2, READER, "elsewhere".into(), None)
            .await
            .unwrap();

        assert!(
            list_for_entity(&store, ARTICLE, None, OWNER)
                .await
                .unwrap()
                .is_empty()
        );
    }
}
