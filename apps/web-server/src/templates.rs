//! Template rendering - one render path for every page.

use actix_web::HttpResponse;
use actix_web::http::StatusCode;
use actix_web::http::header::ContentType;
use tera::{Context, Tera};

use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};

/// Templates shipped with the crate.
pub const DEFAULT_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/templates");

pub struct Templates {
    tera: Tera,
}

impl Templates {
    /// Compile every `*.html` under `dir`.
    pub fn load(dir: &str) -> Result<Self, tera::Error> {
        let glob = format!("{}/**/*.html", dir.trim_end_matches('/'));
        let tera = Tera::new(&glob)?;
        tracing::debug!(
            templates = tera.get_template_names().count(),
            dir,
            "Templates loaded"
        );
        Ok(Self { tera })
    }

    pub fn render(&self, name: &str, ctx: &Context) -> AppResult<String> {
        self.tera
            .render(name, ctx)
            .map_err(|e| AppError::Internal(format!("rendering {name}: {e:?}")))
    }

    /// Render `name` into an HTML response with the given status.
    pub fn page(&self, status: StatusCode, name: &str, ctx: &Context) -> AppResult<HttpResponse> {
        let body = self.render(name, ctx)?;
        Ok(HttpResponse::build(status)
            .content_type(ContentType::html())
            .body(body))
    }
}

/// Context every page starts from: the signed-in user, if any.
pub fn base_context(identity: Option<&Identity>) -> Context {
    let mut ctx = Context::new();
    ctx.insert("current_user", &identity.map(|i| i.username.as_str()));
    ctx
}
