//! Turning stored records into template view models.

use std::collections::HashMap;

use yatube_core::domain::{Comment, Group, Post, PostFilter};
use yatube_core::pagination::Paginator;
use yatube_core::ports::BaseRepository;
use actix_web::{HttpRequest, web};
use yatube_shared::{
    AuthorRef, CommentView, GroupOption, GroupRef, PageQuery, PageView, PostCard, format_date,
    post_url,
};

use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// Resolves authors and groups for a batch of records, loading each one once.
pub struct Lookup<'a> {
    state: &'a AppState,
    authors: HashMap<i64, AuthorRef>,
    groups: HashMap<i64, Option<GroupRef>>,
}

impl<'a> Lookup<'a> {
    pub fn new(state: &'a AppState) -> Self {
        Self {
            state,
            authors: HashMap::new(),
            groups: HashMap::new(),
        }
    }

    pub async fn author(&mut self, user_id: i64) -> AppResult<AuthorRef> {
        if let Some(author) = self.authors.get(&user_id) {
            return Ok(author.clone());
        }
        let user = self
            .state
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("author {user_id} is missing")))?;
        let author = AuthorRef {
            id: user.id,
            username: user.username,
        };
        self.authors.insert(user_id, author.clone());
        Ok(author)
    }

    pub async fn group(&mut self, group_id: Option<i64>) -> AppResult<Option<GroupRef>> {
        let Some(group_id) = group_id else {
            return Ok(None);
        };
        if let Some(group) = self.groups.get(&group_id) {
            return Ok(group.clone());
        }
        let group = self
            .state
            .groups
            .find_by_id(group_id)
            .await?
            .map(|g| GroupRef {
                title: g.title,
                slug: g.slug,
            });
        self.groups.insert(group_id, group.clone());
        Ok(group)
    }

    pub async fn post_card(&mut self, post: Post) -> AppResult<PostCard> {
        let author = self.author(post.author_id).await?;
        let group = self.group(post.group_id).await?;
        let media_url = &self.state.settings.media_url;

        Ok(PostCard {
            id: post.id,
            url: post_url(&author.username, post.id),
            image_url: post.image.map(|path| format!("{media_url}{path}")),
            pub_date: format_date(&post.pub_date),
            text: post.text,
            author,
            group,
        })
    }

    pub async fn comment(&mut self, comment: Comment) -> AppResult<CommentView> {
        Ok(CommentView {
            id: comment.id,
            author: self.author(comment.author_id).await?,
            created: format_date(&comment.created),
            text: comment.text,
        })
    }
}

/// The `page` parameter of a feed request. A repeated parameter is not an
/// error; the last value wins.
pub fn page_query(req: &HttpRequest) -> PageQuery {
    web::Query::<Vec<(String, String)>>::from_query(req.query_string())
        .map(|pairs| PageQuery::from_pairs(pairs.into_inner()))
        .unwrap_or_default()
}

/// Load one page of a feed, newest first.
pub async fn feed_page(
    state: &AppState,
    filter: PostFilter,
    requested: Option<&str>,
) -> AppResult<PageView<PostCard>> {
    let paginator = Paginator::new(state.settings.posts_per_page);
    let count = state.posts.count(filter).await?;
    let window = paginator.window(count, requested);
    let posts = state
        .posts
        .find_page(filter, window.offset, window.limit)
        .await?;

    let mut lookup = Lookup::new(state);
    let mut cards = Vec::with_capacity(posts.len());
    for post in posts {
        cards.push(lookup.post_card(post).await?);
    }

    Ok(PageView::new(
        cards,
        window.number,
        window.num_pages,
        window.count,
    ))
}

/// `<select>` entries for the post form, `selected` marking the raw value.
pub fn group_options(groups: &[Group], selected: Option<&str>) -> Vec<GroupOption> {
    let selected = selected.map(str::trim).unwrap_or_default();
    groups
        .iter()
        .map(|g| {
            let id = g.id.to_string();
            GroupOption {
                selected: id == selected,
                title: g.title.clone(),
                id,
            }
        })
        .collect()
}
