//! Authentication handlers.

use actix_web::http::{StatusCode, header};
use actix_web::{HttpResponse, web};

use yatube_core::domain::NewUser;
use yatube_core::error::RepoError;
use yatube_core::forms::{FormErrors, LoginForm, SignupForm};
use yatube_shared::NextQuery;

use super::redirect;
use crate::middleware::auth::{OptionalIdentity, expired_session_cookie, safe_next, session_cookie};
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;
use crate::templates::base_context;

const USERNAME_TAKEN: &str = "A user with that username already exists.";
const BAD_CREDENTIALS: &str = "Please enter a correct username and password. Note that both fields may be case-sensitive.";

fn render_signup(
    state: &AppState,
    identity: &OptionalIdentity,
    form: &SignupForm,
    errors: &FormErrors,
) -> AppResult<HttpResponse> {
    let mut ctx = base_context(identity.as_ref());
    ctx.insert("form", form);
    for field in ["username", "email", "password1", "password2"] {
        ctx.insert(format!("{field}_errors"), errors.field(field));
    }
    state.templates.page(StatusCode::OK, "auth/signup.html", &ctx)
}

fn render_login(
    state: &AppState,
    identity: &OptionalIdentity,
    form: &LoginForm,
    errors: &FormErrors,
) -> AppResult<HttpResponse> {
    let mut ctx = base_context(identity.as_ref());
    ctx.insert("form", form);
    ctx.insert("next", &safe_next(form.next.as_deref()));
    ctx.insert("username_errors", errors.field("username"));
    ctx.insert("password_errors", errors.field("password"));
    ctx.insert("non_field_errors", errors.field(FormErrors::NON_FIELD));
    state.templates.page(StatusCode::OK, "auth/login.html", &ctx)
}

/// GET /auth/signup/
pub async fn signup_form(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
) -> AppResult<HttpResponse> {
    render_signup(&state, &identity, &SignupForm::default(), &FormErrors::new())
}

/// POST /auth/signup/
pub async fn signup(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    form: web::Form<SignupForm>,
) -> AppResult<HttpResponse> {
    let form = form.into_inner();
    let cleaned = match form.validate() {
        Ok(cleaned) => cleaned,
        Err(errors) => return render_signup(&state, &identity, &form, &errors),
    };

    if state.users.find_by_username(&cleaned.username).await?.is_some() {
        let mut errors = FormErrors::new();
        errors.add("username", USERNAME_TAKEN);
        return render_signup(&state, &identity, &form, &errors);
    }

    let password_hash = state
        .passwords
        .hash(&cleaned.password)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let user = NewUser::new(cleaned.username, cleaned.email, password_hash);
    match state.users.create(user).await {
        Ok(user) => {
            tracing::info!(user_id = user.id, username = %user.username, "User registered");
            Ok(redirect(&state.settings.login_url))
        }
        // Lost a race with another signup for the same name.
        Err(RepoError::Constraint(_)) => {
            let mut errors = FormErrors::new();
            errors.add("username", USERNAME_TAKEN);
            render_signup(&state, &identity, &form, &errors)
        }
        Err(e) => Err(e.into()),
    }
}

/// GET /auth/login/
pub async fn login_form(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    query: web::Query<NextQuery>,
) -> AppResult<HttpResponse> {
    let form = LoginForm {
        next: query.into_inner().next,
        ..LoginForm::default()
    };
    render_login(&state, &identity, &form, &FormErrors::new())
}

/// POST /auth/login/
pub async fn login(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    form: web::Form<LoginForm>,
) -> AppResult<HttpResponse> {
    let form = form.into_inner();
    if let Err(errors) = form.validate() {
        return render_login(&state, &identity, &form, &errors);
    }

    let user = state.users.find_by_username(form.username.trim()).await?;
    let verified = match &user {
        Some(user) => state
            .passwords
            .verify(&form.password, &user.password_hash)
            .map_err(|e| AppError::Internal(e.to_string()))?,
        None => false,
    };
    let Some(user) = user.filter(|_| verified) else {
        tracing::debug!(username = %form.username, "Login rejected");
        let mut errors = FormErrors::new();
        errors.add(FormErrors::NON_FIELD, BAD_CREDENTIALS);
        return render_login(&state, &identity, &form, &errors);
    };

    let token = state
        .tokens
        .generate_token(user.id, &user.username)
        .map_err(|e| AppError::Internal(e.to_string()))?;
    let cookie = session_cookie(
        token,
        state.tokens.expiration_seconds(),
        state.settings.secure_cookies,
    );

    tracing::info!(user_id = user.id, "User logged in");
    let next = safe_next(form.next.as_deref()).unwrap_or("/");
    Ok(HttpResponse::Found()
        .insert_header((header::LOCATION, next))
        .cookie(cookie)
        .finish())
}

/// GET|POST /auth/logout/
pub async fn logout() -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, "/"))
        .cookie(expired_session_cookie())
        .finish()
}
