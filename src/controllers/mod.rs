//! Page controllers.
//!
//! Each action takes the request context and returns a [`Page`]. Storage and
//! hashing failures are returned as errors and turned into the generic
//! failure page by [`Site`](crate::web::Site); everything a visitor can cause
//! (bad input, unknown ids, missing permissions) is reported on the page.

mod account;
mod admin;
mod article;
mod category;
mod contact;
#[cfg(test)]
mod fixture;
mod home;

use chrono::Local;

use crate::context::Ctx;
use crate::error::Error;
use crate::storage::{Record, RecordExt, Table};
use crate::web::{NavLink, Page, Route};

/// Every page the site serves.
pub const ROUTES: &[Route] = &[
    Route { controller: "home", action: "index", handler: home::index },
    Route { controller: "article", action: "latest", handler: article::latest },
    Route { controller: "category", action: "filter", handler: category::filter },
    Route { controller: "contact", action: "inquiry", handler: contact::inquiry },
    Route { controller: "account", action: "portal", handler: account::portal },
    Route { controller: "account", action: "signup", handler: account::signup },
    Route { controller: "admin", action: "portal", handler: admin::portal },
    Route { controller: "admin", action: "manageusers", handler: admin::manage_users },
    Route { controller: "admin", action: "inquiries", handler: admin::inquiries },
    Route { controller: "admin", action: "articles", handler: admin::articles },
    Route { controller: "admin", action: "addarticle", handler: admin::add_article },
    Route { controller: "admin", action: "editarticle", handler: admin::edit_article },
    Route { controller: "admin", action: "deletearticle", handler: admin::delete_article },
    Route { controller: "admin", action: "categories", handler: admin::categories },
    Route { controller: "admin", action: "addcategory", handler: admin::add_category },
    Route { controller: "admin", action: "editcategory", handler: admin::edit_category },
    Route { controller: "admin", action: "deletecategory", handler: admin::delete_category },
];

/// Shown above the error list of a rejected form.
pub const FORM_REJECTED: &str = "We could not send your form, please ensure the following:";

/// Public site navigation. The category submenu is read from the database.
pub fn website_nav(ctx: &Ctx<'_>) -> Result<Vec<NavLink>, Error> {
    let categories = ctx
        .table(Table::Categories)
        .find_all(None, None)?
        .into_iter()
        .filter_map(|category| {
            let id = category.integer("id")?;
            let name = category.text("name").filter(|n| !n.is_empty())?;
            Some(NavLink::new(name, format!("/category/filter?id={id}")))
        })
        .collect();

    Ok(vec![
        NavLink::new("Home", "/"),
        NavLink::new("Latest Articles", "/article/latest"),
        NavLink {
            children: categories,
            ..NavLink::new("Select Category", "#")
        },
        NavLink::new("Contact Page", "/contact/inquiry"),
        NavLink::new("My Account", "/account/portal"),
    ])
}

/// Account section links.
pub fn account_nav() -> Vec<NavLink> {
    vec![
        NavLink::new("Portal", "/account/portal"),
        NavLink::new("Sign up", "/account/signup"),
    ]
}

/// Admin panel links.
pub fn admin_nav() -> Vec<NavLink> {
    vec![
        NavLink::new("Portal", "/admin/portal"),
        NavLink::new("Manage Users", "/admin/manageusers"),
        NavLink::new("Inquiries", "/admin/inquiries"),
        NavLink::new("Add Category", "/admin/addcategory"),
        NavLink::new("Add Article", "/admin/addarticle"),
        NavLink::new("List Categories", "/admin/categories"),
        NavLink::new("List Articles", "/admin/articles"),
    ]
}

fn website_page(ctx: &Ctx<'_>, template: &'static str, title: &str) -> Result<Page, Error> {
    let nav = website_nav(ctx)?;
    let mut page = Page::new(template, title);
    page.sidebar(nav.clone()).nav(nav);
    Ok(page)
}

/// Whether a posted form may be processed: it was submitted and carries the
/// token issued when it was last rendered.
fn accepts_form(ctx: &Ctx<'_>) -> bool {
    if !ctx.is_submission() {
        return false;
    }
    let fresh = ctx.form_token_matches();
    if !fresh {
        ctx.log()
            .info(format_args!("ignoring stale or replayed form submission"));
    }
    fresh
}

/// A user row with the password hash removed.
fn public_profile(mut user: Record) -> Record {
    user.remove("password");
    user
}

/// `bob` becomes `Bob`.
fn ucfirst(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn timestamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

fn today() -> String {
    Local::now().format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UploadConfig;
    use crate::password::PasswordHasher;
    use crate::session::SessionContext;
    use crate::storage::{record, Database};
    use crate::web::{DirectoryUploads, Request, Router};

    #[test]
    fn registry_is_valid() {
        let router = Router::with_routes(ROUTES).unwrap();
        assert_eq!(router.keys().count(), 17);
    }

    #[test]
    fn routed_portal_matches_direct_call() {
        let db = Database::open_in_memory().unwrap();
        let uploads = DirectoryUploads::new(&UploadConfig::default());
        let request = Request::get("/account/portal");
        let hasher = PasswordHasher::with_cost(4);

        let mut session = SessionContext::new();
        let mut ctx = Ctx::new(&request, &mut session, &db, &uploads, hasher);
        let routed = Router::new().unwrap().resolve("/account/portal", &mut ctx).unwrap();

        let mut session = SessionContext::new();
        let mut ctx = Ctx::new(&request, &mut session, &db, &uploads, hasher);
        let direct = account::portal(&mut ctx).unwrap();

        assert_eq!(routed, direct);
        assert_eq!(routed.form, Some("login"));
    }

    #[test]
    fn category_submenu_lists_named_categories() {
        let db = Database::open_in_memory().unwrap();
        db.table(Table::Categories).insert(&record([("name", "Sport".into())])).unwrap();
        let uploads = DirectoryUploads::new(&UploadConfig::default());
        let request = Request::get("/");
        let mut session = SessionContext::new();
        let ctx = Ctx::new(&request, &mut session, &db, &uploads, PasswordHasher::with_cost(4));

        let nav = website_nav(&ctx).unwrap();
        assert_eq!(nav.len(), 5);
        assert_eq!(nav[2].children, vec![NavLink::new("Sport", "/category/filter?id=1")]);
    }

    #[test]
    fn ucfirst_capitalizes_first_letter_only() {
        assert_eq!(ucfirst("bobby"), "Bobby");
        assert_eq!(ucfirst(""), "");
        assert_eq!(ucfirst("éclair"), "Éclair");
    }

    #[test]
    fn public_profile_drops_password() {
        let row = public_profile(record([("username", "bob".into()), ("password", "$2b$".into())]));
        assert!(!row.contains_key("password"));
        assert!(row.contains_key("username"));
    }

    #[test]
    fn timestamps_have_sql_shape() {
        assert_eq!(timestamp().len(), "2024-01-01 00:00:00".len());
        assert_eq!(today().len(), "2024-01-01".len());
    }
}
