use crate::context::Ctx;
use crate::error::Error;
use crate::forms::{LoginForm, SignupForm};
use crate::policy::Permission;
use crate::session::USERNAME;
use crate::storage::{RecordExt, Table};
use crate::web::{Method, Page};

use super::{accepts_form, account_nav, ucfirst, FORM_REJECTED};

/// Which login page a submission came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum LoginScope {
    /// Any account may log in
    Account,
    /// Only admins and sysadmins may log in
    Admin,
}

/// Login form, or the welcome message and logout button once logged in.
pub(super) fn portal(ctx: &mut Ctx<'_>) -> Result<Page, Error> {
    let mut page = account_page(ctx, "account.html", "Website - Account")?;
    if wants_logout(ctx) {
        log_out(ctx, &mut page);
        return Ok(page);
    }
    if ctx.is_submission() {
        log_in(ctx, &mut page, LoginScope::Account)?;
    }

    match logged_in_username(ctx) {
        Some(username) => {
            page.message(format!("Welcome back, {}.", ucfirst(&username)))
                .form("logout", None);
        }
        None => {
            page.form("login", None);
        }
    }
    Ok(page)
}

/// Account creation. A successful signup logs the new user in.
pub(super) fn signup(ctx: &mut Ctx<'_>) -> Result<Page, Error> {
    let mut page = account_page(ctx, "signup.html", "Website - Sign up")?;
    if wants_logout(ctx) {
        log_out(ctx, &mut page);
        return Ok(page);
    }

    let mut prefill = None;
    if accepts_form(ctx) {
        let form = SignupForm::from_params(ctx.form());
        let users = ctx.table(Table::Users);
        match form.check(&users)?.finish() {
            Err(errors) => {
                page.message(FORM_REJECTED).errors(errors);
                prefill = Some(form.prefill());
            }
            Ok(()) => {
                let hash = ctx.hasher().hash(&form.password)?;
                users.insert(&form.record(hash))?;
                let username = form.username.to_lowercase();
                if let Some(row) = users.find("username", username.as_str(), None, None)?.first() {
                    ctx.session_mut().populate_from(row);
                }
                ctx.log().info(format_args!("account {username} created"));
            }
        }
    }

    let token = ctx.issue_form_token();
    match logged_in_username(ctx) {
        Some(username) => {
            page.message(format!("You are currently signed in to: {}.", ucfirst(&username)))
                .form("logout", None);
        }
        None => {
            page.form("signup", Some(token));
            if let Some(values) = prefill {
                page.record("values", values);
            }
        }
    }
    Ok(page)
}

/// Checks a posted login form and, when the credentials are good, copies
/// the user's row into the session. Problems are reported on `page`.
pub(super) fn log_in(ctx: &mut Ctx<'_>, page: &mut Page, scope: LoginScope) -> Result<(), Error> {
    let form = LoginForm::from_params(ctx.form());
    if let Err(errors) = form.check().finish() {
        page.message(FORM_REJECTED).errors(errors);
        return Ok(());
    }

    let username = form.username.to_lowercase();
    let rows = ctx
        .table(Table::Users)
        .find("username", username.as_str(), None, None)?;
    let Some(row) = rows.first() else {
        ctx.log().info(format_args!("login for unknown user {username}"));
        page.message("No user found with that username.");
        return Ok(());
    };

    if scope == LoginScope::Admin {
        let staff = row
            .integer("permissions")
            .and_then(|tier| Permission::try_from(tier).ok())
            .is_some_and(|tier| tier >= Permission::Admin);
        if !staff {
            ctx.log().warn(format_args!("admin login refused for {username}"));
            page.message("You do not have the permissions to access the admin portal.")
                .message("If you believe this to be an error, please contact the system administrator.");
            return Ok(());
        }
    }

    let stored = row.text("password").unwrap_or_default();
    if ctx.hasher().verify(&form.password, stored)? {
        ctx.session_mut().populate_from(row);
        ctx.log().info(format_args!("{username} logged in"));
    } else {
        ctx.log().info(format_args!("wrong password for {username}"));
        page.message(match scope {
            LoginScope::Account => "Wrong username or password",
            LoginScope::Admin => "Wrong password for the username.",
        });
    }
    Ok(())
}

fn account_page(ctx: &Ctx<'_>, template: &'static str, title: &str) -> Result<Page, Error> {
    let mut page = super::website_page(ctx, template, title)?;
    page.sidebar(account_nav());
    Ok(page)
}

fn wants_logout(ctx: &Ctx<'_>) -> bool {
    ctx.request().method() == Method::Post && ctx.form().has("logout")
}

fn log_out(ctx: &mut Ctx<'_>, page: &mut Page) {
    if let Some(username) = ctx.session().text(USERNAME) {
        ctx.log().info(format_args!("{username} logged out"));
    }
    ctx.session_mut().clear();
    page.redirect("/account/portal");
}

fn logged_in_username(ctx: &Ctx<'_>) -> Option<String> {
    let session = ctx.session();
    if !session.is_logged_in() {
        return None;
    }
    Some(session.text(USERNAME).unwrap_or_default().to_string())
}
