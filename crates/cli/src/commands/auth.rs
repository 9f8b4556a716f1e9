//! Account commands: login, register, logout, whoami, refresh.

use inventory_client::ClientError;
use inventory_client::session;
use inventory_core::form::{LoginForm, RegisterForm};

use super::{App, value_or_prompt};
use crate::render;

/// Log in and persist the session.
///
/// # Errors
///
/// Returns error on invalid input, wrong credentials or I/O failure.
pub async fn login(
    app: &App,
    username: Option<String>,
    password: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let form = LoginForm {
        username: value_or_prompt(username, "Username: ")?,
        password: value_or_prompt(password, "Password: ")?,
    };
    let credentials = form.validate()?;

    let session = session::login(&app.api, &app.store, &credentials).await?;
    let who = session
        .profile()
        .map_or_else(|| credentials.username.clone(), render::profile);
    render::emit(&format!("Logged in as {who}"));
    Ok(())
}

/// Create an account. Does not log in.
///
/// # Errors
///
/// Returns error on invalid input or when the server rejects a field.
pub async fn register(
    app: &App,
    username: Option<String>,
    email: Option<String>,
    password: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let form = RegisterForm {
        username: value_or_prompt(username, "Username: ")?,
        email: value_or_prompt(email, "Email: ")?,
        password: value_or_prompt(password, "Password: ")?,
    };
    let registration = form.validate()?;

    let user = app.api.register(&registration).await?;
    tracing::info!(username = %user.username, "Account created");
    render::emit(&format!(
        "Account {} created. Run `inv login` to sign in.",
        user.username
    ));
    Ok(())
}

/// Blacklist the refresh token and forget the session.
///
/// # Errors
///
/// Returns the blacklist failure after the local session has been removed.
pub async fn logout(app: &App) -> Result<(), Box<dyn std::error::Error>> {
    let Some(saved) = app.store.load().await? else {
        render::emit("Not logged in.");
        return Ok(());
    };
    session::logout(&app.api, &app.store, &saved).await?;
    render::emit("Logged out.");
    Ok(())
}

/// Show who the saved session belongs to.
///
/// # Errors
///
/// Returns `ClientError::NotAuthenticated` if nobody is logged in.
pub async fn whoami(app: &App) -> Result<(), Box<dyn std::error::Error>> {
    let session = app.require_session().await?;
    let profile = session.profile().ok_or(ClientError::NotAuthenticated)?;
    render::emit(&render::profile(profile));
    Ok(())
}

/// Exchange the refresh token for a new access token.
///
/// # Errors
///
/// Returns error if there is no session or the refresh token is rejected.
pub async fn refresh(app: &App) -> Result<(), Box<dyn std::error::Error>> {
    let session = session::refresh(&app.api, &app.store).await?;
    match session.profile() {
        Some(profile) => render::emit(&format!(
            "Access token refreshed for {}",
            render::profile(profile)
        )),
        None => render::emit("Access token refreshed."),
    }
    Ok(())
}
