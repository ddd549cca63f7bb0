//! Static "about" pages.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, web};

use crate::middleware::auth::OptionalIdentity;
use crate::middleware::error::AppResult;
use crate::state::AppState;
use crate::templates::base_context;

fn render(
    state: &AppState,
    identity: &OptionalIdentity,
    template: &str,
) -> AppResult<HttpResponse> {
    let ctx = base_context(identity.as_ref());
    state.templates.page(StatusCode::OK, template, &ctx)
}

/// GET /about/author/
pub async fn author(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
) -> AppResult<HttpResponse> {
    render(&state, &identity, "about/author.html")
}

/// GET /about/tech/
pub async fn tech(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
) -> AppResult<HttpResponse> {
    render(&state, &identity, "about/tech.html")
}
