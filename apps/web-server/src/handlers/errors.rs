//! Error pages.
//!
//! `/400/`, `/500/` and unmatched routes render their page directly. Any other
//! 404 or 500 response (an [`AppError`](crate::middleware::error::AppError)
//! returned by a handler) is rewritten into the same pages by
//! [`error_handlers`].

use actix_web::dev::ServiceResponse;
use actix_web::http::StatusCode;
use actix_web::http::header::{self, HeaderValue};
use actix_web::middleware::{ErrorHandlerResponse, ErrorHandlers};
use actix_web::{FromRequest, HttpResponse, web};

use crate::middleware::auth::OptionalIdentity;
use crate::middleware::error::AppResult;
use crate::state::AppState;
use crate::templates::base_context;

const NOT_FOUND_TEMPLATE: &str = "misc/404.html";
const SERVER_ERROR_TEMPLATE: &str = "misc/500.html";

/// GET /400/ and every unmatched path.
pub async fn page_not_found(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
) -> AppResult<HttpResponse> {
    let ctx = base_context(identity.as_ref());
    state
        .templates
        .page(StatusCode::NOT_FOUND, NOT_FOUND_TEMPLATE, &ctx)
}

/// GET /500/
pub async fn server_error(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
) -> AppResult<HttpResponse> {
    let ctx = base_context(identity.as_ref());
    state
        .templates
        .page(StatusCode::INTERNAL_SERVER_ERROR, SERVER_ERROR_TEMPLATE, &ctx)
}

/// Middleware that swaps plain-text 404 / 500 bodies for the HTML pages.
pub fn error_handlers<B: 'static>() -> ErrorHandlers<B> {
    ErrorHandlers::new()
        .handler(StatusCode::NOT_FOUND, render_not_found)
        .handler(StatusCode::INTERNAL_SERVER_ERROR, render_server_error)
}

fn render_not_found<B: 'static>(
    res: ServiceResponse<B>,
) -> actix_web::Result<ErrorHandlerResponse<B>> {
    render_error_page(res, NOT_FOUND_TEMPLATE)
}

fn render_server_error<B: 'static>(
    res: ServiceResponse<B>,
) -> actix_web::Result<ErrorHandlerResponse<B>> {
    render_error_page(res, SERVER_ERROR_TEMPLATE)
}

fn is_html<B>(res: &ServiceResponse<B>) -> bool {
    res.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("text/html"))
}

fn render_error_page<B: 'static>(
    res: ServiceResponse<B>,
    template: &'static str,
) -> actix_web::Result<ErrorHandlerResponse<B>> {
    if is_html(&res) {
        return Ok(ErrorHandlerResponse::Response(res.map_into_left_body()));
    }

    let (req, res) = res.into_parts();
    Ok(ErrorHandlerResponse::Future(Box::pin(async move {
        let identity = OptionalIdentity::extract(&req).await?;
        let rendered = match req.app_data::<web::Data<AppState>>() {
            Some(state) => Some(
                state
                    .templates
                    .render(template, &base_context(identity.as_ref())),
            ),
            None => None,
        };

        match rendered {
            Some(Ok(body)) => {
                let mut res = res.set_body(body);
                res.headers_mut().insert(
                    header::CONTENT_TYPE,
                    HeaderValue::from_static("text/html; charset=utf-8"),
                );
                Ok(ServiceResponse::new(req, res)
                    .map_into_boxed_body()
                    .map_into_right_body())
            }
            Some(Err(e)) => {
                tracing::error!("Error page could not be rendered: {}", e);
                Ok(ServiceResponse::new(req, res).map_into_left_body())
            }
            None => Ok(ServiceResponse::new(req, res).map_into_left_body()),
        }
    })))
}
