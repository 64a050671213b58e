//! Post storage
//!
//! Controllers depend on [`PostStore`]; the bootstrap binds the in-memory
//! implementation as a shared instance so posts outlive a single request.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Comment {
    pub author: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Post {
    pub id: u64,
    pub title: String,
    pub body: String,
    pub published: bool,
    pub comments: Vec<Comment>,
}

pub trait PostStore: Send + Sync {
    /// Every post, newest first
    fn all(&self) -> Vec<Post>;

    fn find(&self, id: u64) -> Option<Post>;

    fn create(&self, title: &str, body: &str) -> Post;

    fn update(&self, id: u64, title: &str, body: &str) -> Option<Post>;

    fn set_published(&self, id: u64, published: bool) -> Option<Post>;

    fn add_comment(&self, id: u64, comment: Comment) -> Option<Post>;

    /// Published posts, newest first
    fn published(&self) -> Vec<Post> {
        self.all().into_iter().filter(|p| p.published).collect()
    }
}

/// Process-local store guarded by a lock
#[derive(Debug)]
pub struct MemoryPostStore {
    posts: RwLock<Vec<Post>>,
    next_id: AtomicU64,
}

impl MemoryPostStore {
    pub fn new() -> Self {
        Self {
            posts: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// A store holding a welcome post
    pub fn seeded() -> Self {
        let store = Self::new();
        let welcome = store.create(
            "Hello, world",
            "Welcome to the blog. Posts are kept in memory until the server stops.",
        );
        store.set_published(welcome.id, true);
        store
    }

    fn modify<F>(&self, id: u64, f: F) -> Option<Post>
    where
        F: FnOnce(&mut Post),
    {
        let mut posts = match self.posts.write() {
            Ok(posts) => posts,
            Err(_) => {
                warn!("post store lock poisoned");
                return None;
            }
        };
        let post = posts.iter_mut().find(|p| p.id == id)?;
        f(&mut *post);
        Some(post.clone())
    }
}

impl PostStore for MemoryPostStore {
    fn all(&self) -> Vec<Post> {
        let mut posts = self.posts.read().map(|p| p.clone()).unwrap_or_default();
        posts.sort_by(|a, b| b.id.cmp(&a.id));
        posts
    }

    fn find(&self, id: u64) -> Option<Post> {
        self.posts.read().ok()?.iter().find(|p| p.id == id).cloned()
    }

    fn create(&self, title: &str, body: &str) -> Post {
        let post = Post {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            title: title.to_string(),
            body: body.to_string(),
            published: false,
            comments: Vec::new(),
        };
        match self.posts.write() {
            Ok(mut posts) => posts.push(post.clone()),
            Err(_) => warn!(id = post.id, "post store lock poisoned, post not saved"),
        }
        post
    }

    fn update(&self, id: u64, title: &str, body: &str) -> Option<Post> {
        self.modify(id, |post| {
            post.title = title.to_string();
            post.body = body.to_string();
        })
    }

    fn set_published(&self, id: u64, published: bool) -> Option<Post> {
        self.modify(id, |post| post.published = published)
    }

    fn add_comment(&self, id: u64, comment: Comment) -> Option<Post> {
        self.modify(id, |post| post.comments.push(comment))
    }
}
