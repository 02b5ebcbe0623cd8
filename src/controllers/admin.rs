use crate::context::Ctx;
use crate::error::Error;
use crate::forms::{ArticleForm, CategoryForm, UserEditForm};
use crate::gate::PolicyGate;
use crate::policy::{authorize_edit, Authenticated, Authorized, Permission};
use crate::session::Principal;
use crate::storage::{record, Record, RecordExt, Table, Value};
use crate::web::{Page, UploadOutcome};

use super::account::{log_in, LoginScope};
use super::{accepts_form, admin_nav, public_profile, timestamp, ucfirst, FORM_REJECTED};

fn admin_page(ctx: &Ctx<'_>, template: &'static str, title: &str) -> Result<Page, Error> {
    let mut page = super::website_page(ctx, template, title)?;
    page.sidebar(admin_nav());
    Ok(page)
}

/// The logged-in admin or sysadmin, if there is one.
fn staff(ctx: &Ctx<'_>) -> Option<Principal> {
    PolicyGate::new(ctx.session())
        .require(Authenticated)
        .require(Authorized::at_least(Permission::Admin))
        .build()
        .map_err(|violation| {
            ctx.log().debug(format_args!("admin page refused: {violation}"));
        })
        .ok()
}

/// Admin login, then a welcome once logged in. Every other admin page
/// falls back to this when the visitor is not staff.
fn login_gate(ctx: &mut Ctx<'_>, mut page: Page) -> Result<Page, Error> {
    if ctx.is_submission() {
        log_in(ctx, &mut page, LoginScope::Admin)?;
    }
    match ctx.session().principal() {
        Some(user) if user.permission >= Permission::Admin => {
            page.message(format!(
                "Welcome back, {}. Please choose an option from the left.",
                ucfirst(&user.username)
            ));
        }
        Some(_) => {
            page.message("You do not have the permissions to access this page.")
                .message("If you believe this to be an error, please contact the system administrator.");
        }
        None => {
            page.form("admin_login", None);
        }
    }
    Ok(page)
}

macro_rules! staff_or_login {
    ($ctx:expr, $page:expr) => {
        match staff($ctx) {
            Some(actor) => actor,
            None => return login_gate($ctx, $page),
        }
    };
}

pub(super) fn portal(ctx: &mut Ctx<'_>) -> Result<Page, Error> {
    let page = admin_page(ctx, "admin/index.html", "Admin Portal")?;
    login_gate(ctx, page)
}

/// User list, or with `?id=` the edit form for one user.
pub(super) fn manage_users(ctx: &mut Ctx<'_>) -> Result<Page, Error> {
    let mut page = admin_page(ctx, "admin/manageusers.html", "Manage Users")?;
    let actor = staff_or_login!(ctx, page);

    if let Some(uid) = ctx.query().integer("id") {
        edit_user(ctx, &mut page, &actor, uid)?;
        return Ok(page);
    }

    let users = ctx
        .table(Table::Users)
        .find_all(Some("uid"), Some("ASC"))?
        .into_iter()
        .map(|user| {
            let role = user
                .integer("permissions")
                .and_then(|tier| Permission::try_from(tier).ok())
                .map_or("-", Permission::label);
            let mut user = public_profile(user);
            user.insert("role".to_string(), role.into());
            user
        })
        .collect();
    page.message("To set a user as admin, they must create an account first.")
        .records("users", users);
    Ok(page)
}

fn edit_user(ctx: &mut Ctx<'_>, page: &mut Page, actor: &Principal, uid: i64) -> Result<(), Error> {
    let users = ctx.table(Table::Users);
    let Some(target) = users.find_by_key(uid)? else {
        page.message("User not found.");
        return Ok(());
    };
    if let Err(violation) = authorize_edit(actor, &target) {
        ctx.log().warn(format_args!(
            "{} may not edit user {uid}: {violation}",
            actor.username
        ));
        page.message(violation.message);
        return Ok(());
    }

    if ctx.is_submission() {
        let form = UserEditForm::from_params(ctx.form());
        if form.delete {
            if uid == actor.uid {
                page.message("You cannot delete your own account.");
            } else {
                users.delete(uid)?;
                ctx.log()
                    .info(format_args!("{} deleted user {uid}", actor.username));
                page.message("User deleted successfully.");
            }
            return Ok(());
        }

        match form.check(&users, &target)?.finish() {
            Err(errors) => {
                page.message(FORM_REJECTED).errors(errors);
            }
            Ok(()) => {
                let mut values = form.record(uid);
                if actor.permission == Permission::Sysadmin {
                    if let Some(tier) = form.permissions {
                        values.insert("permissions".to_string(), tier.tier().into());
                    }
                }
                users.update(&values)?;
                ctx.log()
                    .info(format_args!("{} updated user {uid}", actor.username));
                page.message("User has been updated.");
                return Ok(());
            }
        }
    }

    let form = if actor.permission == Permission::Sysadmin {
        "edit_user_sysadmin"
    } else {
        "edit_user"
    };
    page.form(form, None).record("user", public_profile(target));
    Ok(())
}

/// Inquiry list, newest first; `?id=` marks one complete.
pub(super) fn inquiries(ctx: &mut Ctx<'_>) -> Result<Page, Error> {
    let mut page = admin_page(ctx, "admin/inquiries.html", "Customer Inquiries")?;
    staff_or_login!(ctx, page);
    let table = ctx.table(Table::Inquiries);

    if let Some(id) = ctx.query().integer("id") {
        if table.find_by_key(id)?.is_some() {
            table.update(&record([("id", id.into()), ("status", "Complete".into())]))?;
            page.message("Inquiry has been set as completed.");
        } else {
            page.message("Inquiry not found.");
        }
        return Ok(page);
    }

    let rows = table.find_all(Some("date"), Some("DESC"))?;
    if rows.is_empty() {
        page.message("Inquiries not found, check the database.");
    }
    page.records("inquiries", rows);
    Ok(page)
}

pub(super) fn articles(ctx: &mut Ctx<'_>) -> Result<Page, Error> {
    let mut page = admin_page(ctx, "admin/articles.html", "Articles")?;
    staff_or_login!(ctx, page);
    let rows = ctx.table(Table::Articles).find_all(None, None)?;
    if rows.is_empty() {
        page.message("No articles found in the database, please check the database.");
    }
    page.records("articles", rows);
    Ok(page)
}

pub(super) fn categories(ctx: &mut Ctx<'_>) -> Result<Page, Error> {
    let mut page = admin_page(ctx, "admin/categories.html", "Categories")?;
    staff_or_login!(ctx, page);
    let rows = ctx.table(Table::Categories).find_all(None, None)?;
    if rows.is_empty() {
        page.message("No categories found in the database, please check the database.");
    }
    page.records("categories", rows);
    Ok(page)
}

pub(super) fn add_category(ctx: &mut Ctx<'_>) -> Result<Page, Error> {
    let mut page = admin_page(ctx, "admin/addcategory.html", "Add Category")?;
    staff_or_login!(ctx, page);

    if accepts_form(ctx) {
        let form = CategoryForm::from_params(ctx.form());
        match form.check().finish() {
            Err(errors) => {
                page.message(FORM_REJECTED).errors(errors);
            }
            Ok(()) => {
                let id = ctx
                    .table(Table::Categories)
                    .insert(&record([("name", form.name.as_str().into())]))?;
                ctx.log().info(format_args!("category {id} added"));
                page.message("Category added.");
            }
        }
    }

    let token = ctx.issue_form_token();
    page.form("category", Some(token));
    Ok(page)
}

pub(super) fn edit_category(ctx: &mut Ctx<'_>) -> Result<Page, Error> {
    let mut page = admin_page(ctx, "admin/editcategory.html", "Edit Category")?;
    staff_or_login!(ctx, page);
    let table = ctx.table(Table::Categories);

    let category = match ctx.query().integer("id") {
        Some(id) => table.find_by_key(id)?,
        None => None,
    };
    let Some(category) = category else {
        page.message("Category not found.");
        return Ok(page);
    };

    if accepts_form(ctx) {
        let form = CategoryForm::from_params(ctx.form());
        match form.check().finish() {
            Err(errors) => {
                page.message(FORM_REJECTED).errors(errors);
            }
            Ok(()) => {
                let id = category.get("id").cloned().unwrap_or_default();
                table.update(&record([("id", id), ("name", form.name.as_str().into())]))?;
                page.message("Category edited successfully.");
                return Ok(page);
            }
        }
    }

    let token = ctx.issue_form_token();
    page.form("edit_category", Some(token)).record("category", category);
    Ok(page)
}

pub(super) fn delete_category(ctx: &mut Ctx<'_>) -> Result<Page, Error> {
    let mut page = admin_page(ctx, "admin/deletecategory.html", "Delete Category")?;
    staff_or_login!(ctx, page);

    match ctx.query().integer("id") {
        Some(id) => {
            if ctx.table(Table::Categories).delete(id)? > 0 {
                ctx.log().info(format_args!("category {id} deleted"));
                page.message("Category deleted successfully.");
            } else {
                page.message("Failed to delete the category. Please try again later.");
            }
        }
        None => {
            page.message("Category not found.");
        }
    }
    Ok(page)
}

pub(super) fn add_article(ctx: &mut Ctx<'_>) -> Result<Page, Error> {
    let mut page = admin_page(ctx, "admin/addarticle.html", "Add Article")?;
    let actor = staff_or_login!(ctx, page);

    if accepts_form(ctx) {
        let form = ArticleForm::from_params(ctx.form());
        match form.check().finish() {
            Err(errors) => {
                page.message(FORM_REJECTED).errors(errors);
            }
            Ok(()) => {
                let path = store_image(ctx, &mut page)?;
                let mut row = form.record(timestamp());
                row.insert("uid".to_string(), actor.uid.into());
                row.insert("path".to_string(), path.into());
                let id = ctx.table(Table::Articles).insert(&row)?;
                ctx.log()
                    .info(format_args!("{} added article {id}", actor.username));
                page.message("Article added.");
            }
        }
    }

    attach_categories(ctx, &mut page)?;
    let token = ctx.issue_form_token();
    page.form("article", Some(token));
    Ok(page)
}

pub(super) fn edit_article(ctx: &mut Ctx<'_>) -> Result<Page, Error> {
    let mut page = admin_page(ctx, "admin/editarticle.html", "Edit Article")?;
    staff_or_login!(ctx, page);
    let table = ctx.table(Table::Articles);

    let article = match ctx.query().integer("id") {
        Some(id) => table.find_by_key(id)?,
        None => None,
    };
    let Some(article) = article else {
        page.message("Article not found.");
        return Ok(page);
    };

    if accepts_form(ctx) {
        let form = ArticleForm::from_params(ctx.form());
        match form.check().finish() {
            Err(errors) => {
                page.message(FORM_REJECTED).errors(errors);
            }
            Ok(()) => {
                let mut path = article.get("path").cloned().unwrap_or_default();
                if form.delete_image {
                    if let Some(old) = article.text("path").filter(|p| !p.is_empty()) {
                        remove_image(ctx, &mut page, old)?;
                        path = Value::Null;
                    }
                }
                if ctx.request().upload().is_some() {
                    path = store_image(ctx, &mut page)?.into();
                }

                let mut row = form.record(timestamp());
                row.insert("id".to_string(), article.get("id").cloned().unwrap_or_default());
                row.insert("path".to_string(), path);
                table.update(&row)?;
                page.message("Article edited successfully.");
                return Ok(page);
            }
        }
    }

    attach_categories(ctx, &mut page)?;
    let token = ctx.issue_form_token();
    page.form("edit_article", Some(token)).record("article", article);
    Ok(page)
}

pub(super) fn delete_article(ctx: &mut Ctx<'_>) -> Result<Page, Error> {
    let mut page = admin_page(ctx, "admin/deletearticle.html", "Delete Article")?;
    let actor = staff_or_login!(ctx, page);
    let table = ctx.table(Table::Articles);

    let Some(id) = ctx.query().integer("id") else {
        page.message("Article not found.");
        return Ok(page);
    };
    let Some(article) = table.find_by_key(id)? else {
        page.message("Article not found.");
        return Ok(page);
    };

    if let Some(path) = article.text("path").filter(|p| !p.is_empty()) {
        remove_image(ctx, &mut page, path)?;
    }
    if table.delete(id)? > 0 {
        ctx.log()
            .info(format_args!("{} deleted article {id}", actor.username));
        page.message(format!(
            "Article {} deleted successfully.",
            article.text("title").unwrap_or("Unknown")
        ));
    } else {
        page.message("Failed to delete the article. Please try again later.");
    }
    Ok(page)
}

fn attach_categories(ctx: &Ctx<'_>, page: &mut Page) -> Result<(), Error> {
    let categories: Vec<Record> = ctx.table(Table::Categories).find_all(None, None)?;
    if categories.is_empty() {
        page.message("No categories found in the database, please check the database.");
    }
    page.records("categories", categories);
    Ok(())
}

/// Stores the request's image, if any. Returns the public path to keep on
/// the article; every outcome is reported on the page.
fn store_image(ctx: &Ctx<'_>, page: &mut Page) -> Result<Option<String>, Error> {
    let Some(upload) = ctx.request().upload() else {
        page.message("No file uploaded or upload error.");
        return Ok(None);
    };
    match ctx.uploads().store(upload)? {
        UploadOutcome::Stored { path } => {
            let name = path.rsplit('/').next().unwrap_or(path.as_str());
            page.message(format!("The file {name} has been uploaded."));
            Ok(Some(path))
        }
        UploadOutcome::Rejected(rejection) => {
            ctx.log().info(format_args!("upload rejected: {rejection}"));
            page.message(rejection.to_string());
            Ok(None)
        }
    }
}

fn remove_image(ctx: &Ctx<'_>, page: &mut Page, path: &str) -> Result<(), Error> {
    if ctx.uploads().remove(path)? {
        page.message("Old image deleted.");
    } else {
        page.message("Image file not found for deletion.");
    }
    Ok(())
}
