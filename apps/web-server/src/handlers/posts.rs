//! Feeds, single posts, the post form and comments.

use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, web};

use yatube_core::domain::{Group, NewComment, NewPost, PostFilter, User};
use yatube_core::forms::{CommentForm, FormErrors, PostForm};
use yatube_core::ports::BaseRepository;
use yatube_shared::post_url;

use super::redirect;
use super::views::{Lookup, feed_page, group_options, page_query};
use crate::middleware::auth::{Identity, OptionalIdentity};
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;
use crate::templates::base_context;

async fn find_user(state: &AppState, username: &str) -> AppResult<User> {
    state
        .users
        .find_by_username(username)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user {username}")))
}

/// GET /
pub async fn index(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    req: HttpRequest,
) -> AppResult<HttpResponse> {
    let page_obj = feed_page(&state, PostFilter::All, page_query(&req).as_deref()).await?;

    let mut ctx = base_context(identity.as_ref());
    ctx.insert("page_obj", &page_obj);
    state.templates.page(StatusCode::OK, "posts/index.html", &ctx)
}

/// GET /group/{slug}/
pub async fn group_posts(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    path: web::Path<String>,
    req: HttpRequest,
) -> AppResult<HttpResponse> {
    let slug = path.into_inner();
    let group = state
        .groups
        .find_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("group {slug}")))?;
    let page_obj = feed_page(&state, PostFilter::Group(group.id), page_query(&req).as_deref()).await?;

    let mut ctx = base_context(identity.as_ref());
    ctx.insert("group", &group);
    ctx.insert("page_obj", &page_obj);
    state.templates.page(StatusCode::OK, "posts/group.html", &ctx)
}

/// GET /{username}/
pub async fn profile(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    path: web::Path<String>,
    req: HttpRequest,
) -> AppResult<HttpResponse> {
    let author = find_user(&state, &path).await?;
    let page_obj = feed_page(&state, PostFilter::Author(author.id), page_query(&req).as_deref()).await?;

    let mut ctx = base_context(identity.as_ref());
    ctx.insert("author", &author.username);
    ctx.insert("posts_count", &page_obj.count);
    ctx.insert("page_obj", &page_obj);
    state.templates.page(StatusCode::OK, "posts/profile.html", &ctx)
}

/// GET /{username}/{post_id}/
pub async fn post_view(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    path: web::Path<(String, i64)>,
) -> AppResult<HttpResponse> {
    let (username, post_id) = path.into_inner();
    let author = find_user(&state, &username).await?;
    let post = state
        .posts
        .find_by_author(author.id, post_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("post {username}/{post_id}")))?;
    let posts_count = state.posts.count(PostFilter::Author(author.id)).await?;

    let mut lookup = Lookup::new(&state);
    let mut comments = Vec::new();
    for comment in state.comments.find_by_post(post.id).await? {
        comments.push(lookup.comment(comment).await?);
    }
    let card = lookup.post_card(post).await?;

    let mut ctx = base_context(identity.as_ref());
    ctx.insert(
        "is_author",
        &identity.as_ref().is_some_and(|i| i.user_id == author.id),
    );
    ctx.insert("author", &author.username);
    ctx.insert("posts_count", &posts_count);
    ctx.insert("post", &card);
    ctx.insert("comments", &comments);
    state.templates.page(StatusCode::OK, "posts/post.html", &ctx)
}

/// The post form, for either a new post (`editing = None`) or an existing one.
fn render_post_form(
    state: &AppState,
    identity: &Identity,
    form: &PostForm,
    errors: &FormErrors,
    groups: &[Group],
    editing: Option<(&str, i64)>,
) -> AppResult<HttpResponse> {
    let mut ctx = base_context(Some(identity));
    ctx.insert("is_edit", &editing.is_some());
    if let Some((username, post_id)) = editing {
        ctx.insert("post_url", &post_url(username, post_id));
    }
    ctx.insert("text", &form.text);
    ctx.insert("groups", &group_options(groups, form.group.as_deref()));
    ctx.insert("text_errors", errors.field("text"));
    ctx.insert("group_errors", errors.field("group"));
    state.templates.page(StatusCode::OK, "posts/new_post.html", &ctx)
}

/// GET /new/
pub async fn new_post_form(
    state: web::Data<AppState>,
    identity: Identity,
) -> AppResult<HttpResponse> {
    let groups = state.groups.list().await?;
    render_post_form(
        &state,
        &identity,
        &PostForm::default(),
        &FormErrors::new(),
        &groups,
        None,
    )
}

/// POST /new/
pub async fn create_post(
    state: web::Data<AppState>,
    identity: Identity,
    form: web::Form<PostForm>,
) -> AppResult<HttpResponse> {
    let form = form.into_inner();
    let groups = state.groups.list().await?;

    match form.validate(&groups) {
        Ok(cleaned) => {
            let post = state
                .posts
                .create(NewPost::new(identity.user_id, cleaned))
                .await?;
            tracing::info!(post_id = post.id, author = %identity.username, "Post created");
            Ok(redirect("/"))
        }
        Err(errors) => render_post_form(&state, &identity, &form, &errors, &groups, None),
    }
}

/// GET /{username}/{post_id}/edit/
pub async fn edit_post_form(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<(String, i64)>,
) -> AppResult<HttpResponse> {
    let (username, post_id) = path.into_inner();
    if identity.username != username {
        return Ok(redirect(&post_url(&username, post_id)));
    }
    let post = state
        .posts
        .find_by_author(identity.user_id, post_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("post {username}/{post_id}")))?;
    let groups = state.groups.list().await?;

    render_post_form(
        &state,
        &identity,
        &PostForm::from_post(&post),
        &FormErrors::new(),
        &groups,
        Some((&username, post_id)),
    )
}

/// POST /{username}/{post_id}/edit/
pub async fn update_post(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<(String, i64)>,
    form: web::Form<PostForm>,
) -> AppResult<HttpResponse> {
    let (username, post_id) = path.into_inner();
    let url = post_url(&username, post_id);
    if identity.username != username {
        tracing::debug!(user = %identity.username, post_id, "Edit by non-author ignored");
        return Ok(redirect(&url));
    }
    let mut post = state
        .posts
        .find_by_author(identity.user_id, post_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("post {username}/{post_id}")))?;

    let form = form.into_inner();
    let groups = state.groups.list().await?;
    match form.validate(&groups) {
        Ok(cleaned) => {
            post.apply_edit(cleaned);
            state.posts.update(post).await?;
            tracing::info!(post_id, author = %username, "Post updated");
            Ok(redirect(&url))
        }
        Err(errors) => render_post_form(
            &state,
            &identity,
            &form,
            &errors,
            &groups,
            Some((&username, post_id)),
        ),
    }
}

/// POST /{username}/{post_id}/comment/
pub async fn add_comment(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<(String, i64)>,
    form: web::Form<CommentForm>,
) -> AppResult<HttpResponse> {
    let (username, post_id) = path.into_inner();
    let author = find_user(&state, &username).await?;
    let post = state
        .posts
        .find_by_author(author.id, post_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("post {username}/{post_id}")))?;

    match form.validate() {
        Ok(text) => {
            let comment = state
                .comments
                .create(NewComment::new(post.id, identity.user_id, text))
                .await?;
            tracing::info!(comment_id = comment.id, post_id, "Comment added");
        }
        Err(_) => tracing::debug!(post_id, "Empty comment ignored"),
    }

    Ok(redirect(&post_url(&username, post_id)))
}

/// GET /{username}/{post_id}/comment/
///
/// Reached after logging in from a comment form; send the visitor to the post.
pub async fn comment_redirect(path: web::Path<(String, i64)>) -> HttpResponse {
    let (username, post_id) = path.into_inner();
    redirect(&post_url(&username, post_id))
}
