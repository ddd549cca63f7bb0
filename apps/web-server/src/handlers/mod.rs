//! HTTP handlers and route configuration.

mod about;
mod auth;
mod errors;
mod posts;
mod views;

#[cfg(test)]
mod tests;

use actix_web::http::header;
use actix_web::{HttpResponse, web};

pub use errors::error_handlers;

/// 302 to `location`.
pub(crate) fn redirect(location: &str) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, location))
        .finish()
}

/// Configure all application routes.
///
/// Fixed paths come first so that `/{username}/` never shadows them.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg
        // Posting
        .service(
            web::resource("/new/")
                .route(web::get().to(posts::new_post_form))
                .route(web::post().to(posts::create_post)),
        )
        // Auth routes
        .service(
            web::scope("/auth")
                .service(
                    web::resource("/signup/")
                        .route(web::get().to(auth::signup_form))
                        .route(web::post().to(auth::signup)),
                )
                .service(
                    web::resource("/login/")
                        .route(web::get().to(auth::login_form))
                        .route(web::post().to(auth::login)),
                )
                .service(
                    web::resource("/logout/")
                        .route(web::get().to(auth::logout))
                        .route(web::post().to(auth::logout)),
                ),
        )
        // About
        .route("/about/author/", web::get().to(about::author))
        .route("/about/tech/", web::get().to(about::tech))
        // Error pages
        .route("/400/", web::get().to(errors::page_not_found))
        .route("/500/", web::get().to(errors::server_error))
        // Feeds
        .route("/group/{slug}/", web::get().to(posts::group_posts))
        .route("/", web::get().to(posts::index))
        .route("/{username}/", web::get().to(posts::profile))
        // Single post
        .route(
            "/{username}/{post_id:\\d+}/",
            web::get().to(posts::post_view),
        )
        .service(
            web::resource("/{username}/{post_id:\\d+}/edit/")
                .route(web::get().to(posts::edit_post_form))
                .route(web::post().to(posts::update_post)),
        )
        .service(
            web::resource("/{username}/{post_id:\\d+}/comment/")
                .route(web::get().to(posts::comment_redirect))
                .route(web::post().to(posts::add_comment)),
        )
        .default_service(web::to(errors::page_not_found));
}
