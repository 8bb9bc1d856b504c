//! Login and account commands.

use ryj_storefront::StorefrontSession;
use ryj_storefront::api::RegisterRequest;
use ryj_storefront::auth::AuthSession;

use super::{CliError, Output, set_sentry_user};

pub async fn login(
    session: &mut StorefrontSession,
    out: &Output,
    email: &str,
    password: &str,
) -> Result<(), CliError> {
    let user = session.login(email, password).await?;
    set_sentry_user(session);

    out.render(&user, |out| {
        out.line(format!("Logged in as {} ({})", user.display_name(), user.role));
    });
    Ok(())
}

pub fn logout(session: &mut StorefrontSession) {
    session.logout();
    sentry::configure_scope(|scope| scope.set_user(None));
}

/// Create an account. The new user still has to log in.
pub async fn register(
    session: &StorefrontSession,
    out: &Output,
    request: &RegisterRequest,
) -> Result<(), CliError> {
    let response = AuthSession::register(session.api(), request).await?;

    out.render(&response, |out| {
        out.line(format!("Account created for {}. You can now log in.", request.email));
    });
    Ok(())
}

pub fn whoami(session: &StorefrontSession, out: &Output) {
    let user = session.auth().user();

    out.render(&user, |out| match user {
        Some(user) => out.line(format!(
            "{} <{}> ({})",
            user.display_name(),
            user.email,
            user.role
        )),
        None => out.line("Not logged in."),
    });
}
