//! In-memory repositories for tests. Mirrors the Postgres semantics,
//! including cascade on user delete.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

use async_trait::async_trait;
use time::OffsetDateTime;

use crate::error::RepoError;
use crate::posts::{
    repo::PostRepo,
    repo_types::{Post, PostId, PostInput},
};
use crate::users::{
    repo::UserRepo,
    repo_types::{Credentials, NewUser, User, UserId, UserProfile},
};

struct StoredUser {
    user: User,
    password_hash: String,
}

struct StoredPost {
    id: PostId,
    input: PostInput,
    author_id: UserId,
    likes: u32,
    created_at: OffsetDateTime,
}

#[derive(Default)]
struct Inner {
    users: BTreeMap<UserId, StoredUser>,
    /// (followed, follower)
    follows: BTreeSet<(UserId, UserId)>,
    posts: BTreeMap<PostId, StoredPost>,
    next_user: UserId,
    next_post: PostId,
}

impl Inner {
    fn view(&self, p: &StoredPost) -> Post {
        Post {
            id: p.id,
            title: p.input.title.clone(),
            content: p.input.content.clone(),
            author_id: p.author_id,
            author_nick: self
                .users
                .get(&p.author_id)
                .map(|u| u.user.nick.clone())
                .unwrap_or_default(),
            likes: p.likes,
            created_at: p.created_at,
        }
    }

    fn newest_first(&self, mut posts: Vec<Post>) -> Vec<Post> {
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        posts
    }

    fn taken(&self, profile: &UserProfile, except: Option<UserId>) -> bool {
        self.users.values().any(|s| {
            Some(s.user.id) != except
                && (s.user.nick == profile.nick || s.user.email == profile.email)
        })
    }

    fn owned_post(&mut self, id: PostId, author: UserId) -> Result<&mut StoredPost, RepoError> {
        match self.posts.get_mut(&id) {
            None => Err(RepoError::NotFound),
            Some(p) if p.author_id != author => Err(RepoError::NotOwner),
            Some(p) => Ok(p),
        }
    }
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl UserRepo for MemoryStore {
    async fn create(&self, new: &NewUser) -> Result<User, RepoError> {
        let mut inner = self.lock();
        if inner.taken(&new.profile, None) {
            return Err(RepoError::Conflict("nick or email already in use".into()));
        }
        inner.next_user += 1;
        let user = User {
            id: inner.next_user,
            name: new.profile.name.clone(),
            nick: new.profile.nick.clone(),
            email: new.profile.email.clone(),
            created_at: OffsetDateTime::now_utc(),
        };
        inner.users.insert(
            user.id,
            StoredUser {
                user: user.clone(),
                password_hash: new.password_hash.clone(),
            },
        );
        Ok(user)
    }

    async fn search(&self, fragment: &str) -> Result<Vec<User>, RepoError> {
        let needle = fragment.to_lowercase();
        let inner = self.lock();
        Ok(inner
            .users
            .values()
            .filter(|s| {
                s.user.name.to_lowercase().contains(&needle)
                    || s.user.nick.to_lowercase().contains(&needle)
            })
            .map(|s| s.user.clone())
            .collect())
    }

    async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepoError> {
        Ok(self.lock().users.get(&id).map(|s| s.user.clone()))
    }

    async fn update(&self, id: UserId, profile: &UserProfile) -> Result<(), RepoError> {
        let mut inner = self.lock();
        if inner.taken(profile, Some(id)) {
            return Err(RepoError::Conflict("nick or email already in use".into()));
        }
        let stored = inner.users.get_mut(&id).ok_or(RepoError::NotFound)?;
        stored.user.name = profile.name.clone();
        stored.user.nick = profile.nick.clone();
        stored.user.email = profile.email.clone();
        Ok(())
    }

    async fn delete(&self, id: UserId) -> Result<(), RepoError> {
        let mut inner = self.lock();
        inner.users.remove(&id).ok_or(RepoError::NotFound)?;
        inner.follows.retain(|(target, follower)| *target != id && *follower != id);
        inner.posts.retain(|_, p| p.author_id != id);
        Ok(())
    }

    async fn get_credentials_by_email(
        &self,
        email: &str,
    ) -> Result<Option<Credentials>, RepoError> {
        Ok(self
            .lock()
            .users
            .values()
            .find(|s| s.user.email == email)
            .map(|s| Credentials {
                id: s.user.id,
                password_hash: s.password_hash.clone(),
            }))
    }

    async fn follow(&self, target: UserId, follower: UserId) -> Result<(), RepoError> {
        let mut inner = self.lock();
        if !inner.users.contains_key(&target) || !inner.users.contains_key(&follower) {
            return Err(RepoError::NotFound);
        }
        inner.follows.insert((target, follower));
        Ok(())
    }

    async fn unfollow(&self, target: UserId, follower: UserId) -> Result<(), RepoError> {
        self.lock().follows.remove(&(target, follower));
        Ok(())
    }

    async fn list_followers(&self, id: UserId) -> Result<Vec<User>, RepoError> {
        let inner = self.lock();
        Ok(inner
            .follows
            .iter()
            .filter(|(target, _)| *target == id)
            .filter_map(|(_, follower)| inner.users.get(follower))
            .map(|s| s.user.clone())
            .collect())
    }

    async fn list_following(&self, id: UserId) -> Result<Vec<User>, RepoError> {
        let inner = self.lock();
        Ok(inner
            .follows
            .iter()
            .filter(|(_, follower)| *follower == id)
            .filter_map(|(target, _)| inner.users.get(target))
            .map(|s| s.user.clone())
            .collect())
    }

    async fn get_password_hash(&self, id: UserId) -> Result<Option<String>, RepoError> {
        Ok(self.lock().users.get(&id).map(|s| s.password_hash.clone()))
    }

    async fn update_password(&self, id: UserId, password_hash: &str) -> Result<(), RepoError> {
        let mut inner = self.lock();
        let stored = inner.users.get_mut(&id).ok_or(RepoError::NotFound)?;
        stored.password_hash = password_hash.to_string();
        Ok(())
    }
}

#[async_trait]
impl PostRepo for MemoryStore {
    async fn create(&self, author: UserId, input: &PostInput) -> Result<Post, RepoError> {
        let mut inner = self.lock();
        if !inner.users.contains_key(&author) {
            return Err(RepoError::NotFound);
        }
        inner.next_post += 1;
        let stored = StoredPost {
            id: inner.next_post,
            input: input.clone(),
            author_id: author,
            likes: 0,
            created_at: OffsetDateTime::now_utc(),
        };
        let post = inner.view(&stored);
        inner.posts.insert(stored.id, stored);
        Ok(post)
    }

    async fn get_by_id(&self, id: PostId) -> Result<Option<Post>, RepoError> {
        let inner = self.lock();
        Ok(inner.posts.get(&id).map(|p| inner.view(p)))
    }

    async fn list_feed(&self, user: UserId) -> Result<Vec<Post>, RepoError> {
        let inner = self.lock();
        let posts = inner
            .posts
            .values()
            .filter(|p| p.author_id == user || inner.follows.contains(&(p.author_id, user)))
            .map(|p| inner.view(p))
            .collect();
        Ok(inner.newest_first(posts))
    }

    async fn list_by_author(&self, author: UserId) -> Result<Vec<Post>, RepoError> {
        let inner = self.lock();
        let posts = inner
            .posts
            .values()
            .filter(|p| p.author_id == author)
            .map(|p| inner.view(p))
            .collect();
        Ok(inner.newest_first(posts))
    }

    async fn update(
        &self,
        id: PostId,
        author: UserId,
        input: &PostInput,
    ) -> Result<(), RepoError> {
        let mut inner = self.lock();
        inner.owned_post(id, author)?.input = input.clone();
        Ok(())
    }

    async fn delete(&self, id: PostId, author: UserId) -> Result<(), RepoError> {
        let mut inner = self.lock();
        inner.owned_post(id, author)?;
        inner.posts.remove(&id);
        Ok(())
    }

    async fn like(&self, id: PostId) -> Result<(), RepoError> {
        let mut inner = self.lock();
        let post = inner.posts.get_mut(&id).ok_or(RepoError::NotFound)?;
        post.likes += 1;
        Ok(())
    }

    async fn unlike(&self, id: PostId) -> Result<(), RepoError> {
        let mut inner = self.lock();
        let post = inner.posts.get_mut(&id).ok_or(RepoError::NotFound)?;
        post.likes = post.likes.saturating_sub(1);
        Ok(())
    }
}
