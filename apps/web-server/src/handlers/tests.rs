use std::sync::Arc;

use actix_web::body::MessageBody;
use actix_web::cookie::Cookie;
use actix_web::dev::ServiceResponse;
use actix_web::http::{StatusCode, header};
use actix_web::{App, test, web};
use chrono::{TimeZone, Utc};

use yatube_core::domain::{Group, NewGroup, NewPost, NewUser, Post, PostFilter, User};
use yatube_core::forms::{CleanedPost, REQUIRED};
use yatube_core::ports::BaseRepository;
use yatube_infra::{JwtConfig, JwtTokenService};

use super::{configure_routes, error_handlers};
use crate::config::SiteSettings;
use crate::middleware::auth::SESSION_COOKIE;
use crate::state::AppState;
use crate::templates::{DEFAULT_DIR, Templates};

fn test_state() -> AppState {
    let templates = Templates::load(DEFAULT_DIR).expect("templates compile");
    AppState::in_memory(
        Arc::new(templates),
        Arc::new(SiteSettings::default()),
        Arc::new(JwtTokenService::new(JwtConfig::default())),
    )
}

macro_rules! test_app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .wrap(error_handlers())
                .app_data(web::Data::new($state.clone()))
                .configure(configure_routes),
        )
        .await
    };
}

async fn create_user(state: &AppState, username: &str) -> User {
    state
        .users
        .create(NewUser::new(
            username.to_string(),
            format!("{username}@example.com"),
            "unused-hash".to_string(),
        ))
        .await
        .unwrap()
}

async fn create_group(state: &AppState, title: &str, slug: &str) -> Group {
    state
        .groups
        .create(NewGroup::new(title, slug, "").unwrap())
        .await
        .unwrap()
}

async fn create_post(state: &AppState, author: &User, text: &str, group: Option<&Group>) -> Post {
    state
        .posts
        .create(NewPost::new(
            author.id,
            CleanedPost {
                text: text.to_string(),
                group_id: group.map(|g| g.id),
            },
        ))
        .await
        .unwrap()
}

fn session(state: &AppState, user: &User) -> Cookie<'static> {
    let token = state.tokens.generate_token(user.id, &user.username).unwrap();
    Cookie::new(SESSION_COOKIE, token)
}

fn location<B>(resp: &ServiceResponse<B>) -> &str {
    resp.headers()
        .get(header::LOCATION)
        .expect("Location header")
        .to_str()
        .unwrap()
}

async fn body_text<B: MessageBody>(resp: ServiceResponse<B>) -> String {
    let bytes = test::read_body(resp).await;
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn count_cards(body: &str) -> usize {
    body.matches("<article class=\"post\">").count()
}

#[actix_web::test]
async fn test_index_lists_posts_newest_first() {
    let state = test_state();
    let alice = create_user(&state, "alice").await;

    for (text, day) in [("middle post", 2), ("oldest post", 1), ("newest post", 3)] {
        let mut post = create_post(&state, &alice, text, None).await;
        post.pub_date = Utc.with_ymd_and_hms(2021, 7, day, 12, 0, 0).unwrap();
        state.posts.update(post).await.unwrap();
    }

    let app = test_app!(state);
    let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body = body_text(resp).await;
    let newest = body.find("newest post").unwrap();
    let middle = body.find("middle post").unwrap();
    let oldest = body.find("oldest post").unwrap();
    assert!(newest < middle && middle < oldest);
}

#[actix_web::test]
async fn test_new_post_requires_login() {
    let state = test_state();
    let app = test_app!(state);

    let req = test::TestRequest::get().uri("/new/").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/auth/login/?next=/new/");
}

#[actix_web::test]
async fn test_new_post_form_lists_groups() {
    let state = test_state();
    let alice = create_user(&state, "alice").await;
    create_group(&state, "Dogs", "dogs").await;
    create_group(&state, "Cats", "cats").await;
    let app = test_app!(state);

    let req = test::TestRequest::get()
        .uri("/new/")
        .cookie(session(&state, &alice))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body = body_text(resp).await;
    assert!(body.find(">Cats<").unwrap() < body.find(">Dogs<").unwrap());
}

#[actix_web::test]
async fn test_new_post_with_empty_text_creates_nothing() {
    let state = test_state();
    let alice = create_user(&state, "alice").await;
    let app = test_app!(state);

    let req = test::TestRequest::post()
        .uri("/new/")
        .cookie(session(&state, &alice))
        .set_form([("text", "   "), ("group", "")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_text(resp).await.contains(REQUIRED));

    assert_eq!(state.posts.count(PostFilter::All).await.unwrap(), 0);
}

#[actix_web::test]
async fn test_new_post_creates_post_and_redirects() {
    let state = test_state();
    let alice = create_user(&state, "alice").await;
    let cats = create_group(&state, "Cats", "cats").await;
    let app = test_app!(state);

    let group_id = cats.id.to_string();
    let req = test::TestRequest::post()
        .uri("/new/")
        .cookie(session(&state, &alice))
        .set_form([("text", " hello "), ("group", group_id.as_str())])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/");

    let posts = state.posts.find_page(PostFilter::All, 0, 10).await.unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].text, "hello");
    assert_eq!(posts[0].author_id, alice.id);
    assert_eq!(posts[0].group_id, Some(cats.id));
}

#[actix_web::test]
async fn test_new_post_rejects_unknown_group() {
    let state = test_state();
    let alice = create_user(&state, "alice").await;
    let app = test_app!(state);

    let req = test::TestRequest::post()
        .uri("/new/")
        .cookie(session(&state, &alice))
        .set_form([("text", "hello"), ("group", "42")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_text(resp).await.contains("Select a valid choice."));
    assert_eq!(state.posts.count(PostFilter::All).await.unwrap(), 0);
}

#[actix_web::test]
async fn test_author_can_edit_post() {
    let state = test_state();
    let alice = create_user(&state, "alice").await;
    let cats = create_group(&state, "Cats", "cats").await;
    let post = create_post(&state, &alice, "hello", None).await;
    let other = create_post(&state, &alice, "untouched", None).await;
    let app = test_app!(state);

    let edit_url = format!("/alice/{}/edit/", post.id);
    let req = test::TestRequest::get()
        .uri(&edit_url)
        .cookie(session(&state, &alice))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_text(resp).await.contains(">hello</textarea>"));

    let group_id = cats.id.to_string();
    let req = test::TestRequest::post()
        .uri(&edit_url)
        .cookie(session(&state, &alice))
        .set_form([("text", "hello again"), ("group", group_id.as_str())])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), format!("/alice/{}/", post.id));

    let edited = state.posts.find_by_id(post.id).await.unwrap().unwrap();
    assert_eq!(edited.text, "hello again");
    assert_eq!(edited.group_id, Some(cats.id));
    assert_eq!(edited.pub_date, post.pub_date);
    assert_eq!(edited.author_id, alice.id);

    let untouched = state.posts.find_by_id(other.id).await.unwrap().unwrap();
    assert_eq!(untouched, other);
}

#[actix_web::test]
async fn test_edit_with_empty_text_rerenders_form() {
    let state = test_state();
    let alice = create_user(&state, "alice").await;
    let post = create_post(&state, &alice, "hello", None).await;
    let app = test_app!(state);

    let req = test::TestRequest::post()
        .uri(&format!("/alice/{}/edit/", post.id))
        .cookie(session(&state, &alice))
        .set_form([("text", ""), ("group", "")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_text(resp).await.contains(REQUIRED));

    let stored = state.posts.find_by_id(post.id).await.unwrap().unwrap();
    assert_eq!(stored.text, "hello");
}

#[actix_web::test]
async fn test_non_author_edit_redirects_without_changes() {
    let state = test_state();
    let alice = create_user(&state, "alice").await;
    let bob = create_user(&state, "bob").await;
    let post = create_post(&state, &alice, "hello", None).await;
    let app = test_app!(state);

    let edit_url = format!("/alice/{}/edit/", post.id);
    let post_url = format!("/alice/{}/", post.id);

    let req = test::TestRequest::get()
        .uri(&edit_url)
        .cookie(session(&state, &bob))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), post_url);

    let req = test::TestRequest::post()
        .uri(&edit_url)
        .cookie(session(&state, &bob))
        .set_form([("text", "hijacked"), ("group", "")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), post_url);

    let stored = state.posts.find_by_id(post.id).await.unwrap().unwrap();
    assert_eq!(stored, post);
}

#[actix_web::test]
async fn test_edit_of_someone_elses_post_id_is_not_found() {
    let state = test_state();
    let alice = create_user(&state, "alice").await;
    let bob = create_user(&state, "bob").await;
    let bobs_post = create_post(&state, &bob, "bob's", None).await;
    let app = test_app!(state);

    let req = test::TestRequest::get()
        .uri(&format!("/alice/{}/edit/", bobs_post.id))
        .cookie(session(&state, &alice))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_guest_edit_redirects_to_login() {
    let state = test_state();
    let alice = create_user(&state, "alice").await;
    let post = create_post(&state, &alice, "hello", None).await;
    let app = test_app!(state);

    let req = test::TestRequest::get()
        .uri(&format!("/alice/{}/edit/", post.id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(
        location(&resp),
        format!("/auth/login/?next=/alice/{}/edit/", post.id)
    );
}

#[actix_web::test]
async fn test_group_page() {
    let state = test_state();
    let alice = create_user(&state, "alice").await;
    let cats = create_group(&state, "Cats", "cats").await;
    create_post(&state, &alice, "a cat post", Some(&cats)).await;
    create_post(&state, &alice, "an ungrouped post", None).await;
    let app = test_app!(state);

    let req = test::TestRequest::get().uri("/group/cats/").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_text(resp).await;
    assert_eq!(count_cards(&body), 1);
    assert!(body.contains("a cat post"));
    assert!(!body.contains("an ungrouped post"));

    let req = test::TestRequest::get().uri("/group/dogs/").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert!(body_text(resp).await.contains("Page not found"));
}

#[actix_web::test]
async fn test_pagination() {
    let state = test_state();
    let alice = create_user(&state, "alice").await;
    for i in 0..13 {
        create_post(&state, &alice, &format!("post number {i}"), None).await;
    }
    let app = test_app!(state);

    for (uri, expected) in [
        ("/", 10),
        ("/?page=2", 3),
        ("/?page=3", 3),
        ("/?page=0", 3),
        ("/?page=abc", 10),
        ("/?page=99999999999999999999", 3),
        ("/?page=1&page=2", 3),
        ("/?page=2&page=1", 10),
        ("/alice/?page=2", 3),
    ] {
        let resp = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK, "{uri}");
        assert_eq!(count_cards(&body_text(resp).await), expected, "{uri}");
    }
}

#[actix_web::test]
async fn test_profile_and_post_pages() {
    let state = test_state();
    let alice = create_user(&state, "alice").await;
    create_user(&state, "bob").await;
    let post = create_post(&state, &alice, "hello", None).await;
    let app = test_app!(state);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/alice/").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_text(resp).await;
    assert_eq!(count_cards(&body), 1);
    assert!(body.contains("hello"));

    let req = test::TestRequest::get()
        .uri(&format!("/alice/{}/", post.id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_text(resp).await.contains("hello"));

    for uri in [
        "/nobody/".to_string(),
        format!("/bob/{}/", post.id),
        "/alice/999/".to_string(),
        "/alice/not-a-number/".to_string(),
    ] {
        let resp = test::call_service(&app, test::TestRequest::get().uri(&uri).to_request()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{uri}");
    }
}

#[actix_web::test]
async fn test_post_text_is_escaped() {
    let state = test_state();
    let alice = create_user(&state, "alice").await;
    create_post(&state, &alice, "<script>alert(1)</script>", None).await;
    let app = test_app!(state);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
    let body = body_text(resp).await;
    assert!(!body.contains("<script>alert(1)</script>"));
    assert!(body.contains("&lt;script&gt;"));
}

#[actix_web::test]
async fn test_add_comment() {
    let state = test_state();
    let alice = create_user(&state, "alice").await;
    let bob = create_user(&state, "bob").await;
    let post = create_post(&state, &alice, "hello", None).await;
    let app = test_app!(state);

    let comment_url = format!("/alice/{}/comment/", post.id);
    let post_url = format!("/alice/{}/", post.id);

    let req = test::TestRequest::post()
        .uri(&comment_url)
        .set_form([("text", "nice")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert!(location(&resp).starts_with("/auth/login/?next="));

    let req = test::TestRequest::post()
        .uri(&comment_url)
        .cookie(session(&state, &bob))
        .set_form([("text", "  ")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert!(state.comments.find_by_post(post.id).await.unwrap().is_empty());

    let req = test::TestRequest::post()
        .uri(&comment_url)
        .cookie(session(&state, &bob))
        .set_form([("text", "nice post")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), post_url);

    let comments = state.comments.find_by_post(post.id).await.unwrap();
    assert_eq!(comments.len(), 1);

    // Back from the login page the browser asks for the comment URL by GET.
    let req = test::TestRequest::get()
        .uri(&comment_url)
        .cookie(session(&state, &bob))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), post_url);
    assert_eq!(comments[0].author_id, bob.id);

    let resp = test::call_service(&app, test::TestRequest::get().uri(&post_url).to_request()).await;
    assert!(body_text(resp).await.contains("nice post"));

    let req = test::TestRequest::post()
        .uri("/alice/999/comment/")
        .cookie(session(&state, &bob))
        .set_form([("text", "lost")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_error_pages() {
    let state = test_state();
    let app = test_app!(state);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/400/").to_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert!(body_text(resp).await.contains("Page not found"));

    let resp = test::call_service(&app, test::TestRequest::get().uri("/500/").to_request()).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body_text(resp).await.contains("Server error"));

    let req = test::TestRequest::get().uri("/no/such/page/here/").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert!(body_text(resp).await.contains("Page not found"));
}

#[actix_web::test]
async fn test_session_of_deleted_user_is_rejected() {
    let state = test_state();
    let alice = create_user(&state, "alice").await;
    let cookie = session(&state, &alice);
    state.users.delete(alice.id).await.unwrap();
    let app = test_app!(state);

    let req = test::TestRequest::get().uri("/new/").cookie(cookie).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/auth/login/?next=/new/");
}

#[actix_web::test]
async fn test_signup_login_logout() {
    let state = test_state();
    let app = test_app!(state);

    let signup = [
        ("username", "carol"),
        ("email", "carol@example.com"),
        ("password1", "correct horse"),
        ("password2", "correct horse"),
    ];
    let req = test::TestRequest::post()
        .uri("/auth/signup/")
        .set_form(signup)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/auth/login/");

    let req = test::TestRequest::post()
        .uri("/auth/signup/")
        .set_form(signup)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_text(resp).await.contains("already exists"));

    let req = test::TestRequest::post()
        .uri("/auth/login/")
        .set_form([("username", "carol"), ("password", "wrong password"), ("next", "/new/")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_text(resp).await.contains("Please enter a correct username and password."));

    let req = test::TestRequest::post()
        .uri("/auth/login/")
        .set_form([("username", "carol"), ("password", "correct horse"), ("next", "/new/")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/new/");
    let token = resp
        .response()
        .cookies()
        .find(|c| c.name() == SESSION_COOKIE)
        .map(|c| c.value().to_string())
        .expect("session cookie");

    let req = test::TestRequest::get()
        .uri("/new/")
        .cookie(Cookie::new(SESSION_COOKIE, token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::post().uri("/auth/logout/").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    let cleared = resp
        .response()
        .cookies()
        .find(|c| c.name() == SESSION_COOKIE)
        .expect("removal cookie");
    assert_eq!(cleared.value(), "");
}

#[actix_web::test]
async fn test_login_ignores_offsite_next() {
    let state = test_state();
    let password_hash = state.passwords.hash("correct horse").unwrap();
    state
        .users
        .create(NewUser::new(
            "dave".to_string(),
            "dave@example.com".to_string(),
            password_hash,
        ))
        .await
        .unwrap();
    let app = test_app!(state);

    let req = test::TestRequest::post()
        .uri("/auth/login/")
        .set_form([
            ("username", "dave"),
            ("password", "correct horse"),
            ("next", "//evil.example/"),
        ])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/");
}

#[actix_web::test]
async fn test_about_pages() {
    let state = test_state();
    let alice = create_user(&state, "alice").await;
    let app = test_app!(state);

    for (uri, heading) in [
        ("/about/author/", "<h1>About the author</h1>"),
        ("/about/tech/", "<h1>Technologies</h1>"),
    ] {
        let resp = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK, "{uri}");
        assert!(body_text(resp).await.contains(heading), "{uri}");

        let req = test::TestRequest::get()
            .uri(uri)
            .cookie(session(&state, &alice))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK, "{uri}");
    }
}

#[actix_web::test]
async fn test_login_with_unusable_password_hash_is_rejected() {
    let state = test_state();
    // `create_user` stores a value that is not a password hash.
    create_user(&state, "erin").await;
    let app = test_app!(state);

    let req = test::TestRequest::post()
        .uri("/auth/login/")
        .set_form([("username", "erin"), ("password", "anything")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().get(header::SET_COOKIE).is_none());
    assert!(body_text(resp).await.contains("Please enter a correct username and password"));
}
