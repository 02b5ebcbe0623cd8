//! End-to-end flows through `Site::handle`, one client session at a time.

use newsdesk::config::SiteConfig;
use newsdesk::session::SessionStore;
use newsdesk::web::{DirectoryUploads, Request, Response, Router, Site};
use newsdesk::{
    record, Database, Error, PasswordHasher, RecordExt, Secret, SessionContext, Table,
    ValidationErrorKind, FORM_TOKEN_FIELD, GENERIC_FAILURE,
};

struct Client<'s> {
    site: &'s Site,
    session: Option<String>,
    token: Option<i64>,
}

impl<'s> Client<'s> {
    fn new(site: &'s Site) -> Self {
        Self {
            site,
            session: None,
            token: None,
        }
    }

    fn send(&mut self, mut request: Request) -> Response {
        if let Some(id) = &self.session {
            request = request.with_session(id.clone());
        }
        let response = self.site.handle(&request);
        self.session = response.session_id.clone();
        if response.page.form_token.is_some() {
            self.token = response.page.form_token;
        }
        response
    }

    fn get(&mut self, uri: &str) -> Response {
        self.send(Request::get(uri))
    }

    /// Posts `fields` with `submit` and the last issued form token.
    fn submit(&mut self, uri: &str, fields: &[(&str, &str)]) -> Response {
        let mut request = Request::post(uri).with_form("submit", "Submit");
        if let Some(token) = self.token {
            request = request.with_form(FORM_TOKEN_FIELD, token.to_string());
        }
        for (name, value) in fields {
            request = request.with_form(*name, *value);
        }
        self.send(request)
    }
}

fn site() -> (Site, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let mut config = SiteConfig::default();
    config.uploads.directory = dir.path().to_path_buf();
    config.security.bcrypt_cost = 4;
    (Site::from_config(&config).unwrap(), dir)
}

fn add_user(site: &Site, username: &str, tier: i64) {
    let hash = site
        .hasher()
        .hash(&Secret::new("password123".to_string()))
        .unwrap();
    site.database()
        .table(Table::Users)
        .insert(&record([
            ("username", username.into()),
            ("firstname", "Test".into()),
            ("surname", "User".into()),
            ("email", format!("{username}@example.com").into()),
            ("password", hash.into()),
            ("phone_num", "+447222555555".into()),
            ("permissions", tier.into()),
        ]))
        .unwrap();
}

fn signup_fields(username: &str) -> Vec<(&str, &str)> {
    vec![
        ("firstname", "Bob"),
        ("surname", "Smith"),
        ("username", username),
        ("email", "bob@example.com"),
        ("tel", "+447222555555"),
        ("password", "password123"),
    ]
}

#[test]
fn unknown_paths_serve_the_home_page() {
    let (site, _dir) = site();
    for uri in ["/", "/nowhere", "/account/portal/extra", "/ADMIN"] {
        let response = site.handle(&Request::get(uri));
        assert_eq!(response.page.title, "Website - Home", "{uri}");
        assert_eq!(response.page.template, "index.html");
    }
}

#[test]
fn routing_is_case_insensitive() {
    let (site, _dir) = site();
    let response = site.handle(&Request::get("/Article/LATEST"));
    assert_eq!(response.page.title, "Website - Latest Articles");
}

#[test]
fn signup_then_logout_then_login() {
    let (site, _dir) = site();
    let mut client = Client::new(&site);

    client.get("/account/signup");
    let rejected = client.submit("/account/signup", &signup_fields("bo"));
    assert_eq!(rejected.page.errors.len(), 1);
    assert_eq!(rejected.page.errors[0].kind(), ValidationErrorKind::Length { min: 4, max: 32 });
    assert!(site.database().table(Table::Users).find_all(None, None).unwrap().is_empty());

    let accepted = client.submit("/account/signup", &signup_fields("bobby"));
    assert!(accepted.page.errors.is_empty());
    assert!(accepted.page.has_message("You are currently signed in to: Bobby."));

    let out = client.send(Request::post("/account/portal").with_form("logout", "Log out"));
    assert_eq!(out.page.redirect.as_deref(), Some("/account/portal"));
    assert_eq!(client.get("/account/portal").page.form, Some("login"));

    let back = client.submit(
        "/account/portal",
        &[("username", "bobby"), ("password", "password123")],
    );
    assert!(back.page.has_message("Welcome back, Bobby."));
}

#[test]
fn reloaded_inquiry_is_stored_once() {
    let (site, _dir) = site();
    let mut client = Client::new(&site);
    client.get("/contact/inquiry");
    let fields = [
        ("title", "Advertising"),
        ("inquiry", "Do you sell advertising space?"),
        ("firstname", "Bob"),
        ("surname", "Smith"),
        ("email", "bob@example.com"),
        ("tel", "+447222555555"),
    ];

    let mut replay = Request::post("/contact/inquiry")
        .with_form("submit", "Submit")
        .with_form(FORM_TOKEN_FIELD, client.token.unwrap().to_string());
    for (name, value) in fields {
        replay = replay.with_form(name, value);
    }
    let first = client.send(replay.clone());
    assert!(first.page.has_message(
        "Inquiry form successfully sent. We will be in touch as soon as we can!"
    ));
    let second = client.send(replay);
    assert!(!second.page.has_message(
        "Inquiry form successfully sent. We will be in touch as soon as we can!"
    ));

    let rows = site.database().table(Table::Inquiries).find_all(None, None).unwrap();
    assert_eq!(rows.len(), 1);
}

#[test]
fn admin_manages_categories_and_articles() {
    let (site, _dir) = site();
    add_user(&site, "ada", 1);
    let mut client = Client::new(&site);

    assert_eq!(client.get("/admin/categories").page.form, Some("admin_login"));
    let welcome = client.submit("/admin/portal", &[("username", "ada"), ("password", "password123")]);
    assert!(welcome
        .page
        .has_message("Welcome back, Ada. Please choose an option from the left."));

    client.get("/admin/addcategory");
    let added = client.submit("/admin/addcategory", &[("name", "Sport")]);
    assert!(added.page.has_message("Category added."));

    let listed = client.get("/admin/categories");
    assert_eq!(listed.page.rows("categories")[0].text("name"), Some("Sport"));
    assert_eq!(listed.page.nav[2].children[0].label, "Sport");

    client.get("/admin/addarticle");
    let article = client.submit(
        "/admin/addarticle",
        &[
            ("title", "Match Report"),
            ("description", "A long account of the match."),
            ("categoryId", "1"),
        ],
    );
    assert!(article.page.has_message("Article added."));

    let public = client.get("/article/latest");
    assert_eq!(public.page.rows("articles")[0].text("title"), Some("Match Report"));
    assert_eq!(public.page.rows("authors")[0].text("username"), Some("ada"));
}

#[test]
fn regular_users_cannot_reach_admin_pages() {
    let (site, _dir) = site();
    add_user(&site, "bob", 0);
    let mut client = Client::new(&site);

    let refused = client.submit("/admin/portal", &[("username", "bob"), ("password", "password123")]);
    assert!(refused
        .page
        .has_message("You do not have the permissions to access the admin portal."));

    client.submit("/account/portal", &[("username", "bob"), ("password", "password123")]);
    let page = client.get("/admin/manageusers").page;
    assert!(page.has_message("You do not have the permissions to access this page."));
    assert!(page.rows("users").is_empty());
}

#[test]
fn password_hashes_never_reach_pages() {
    let (site, _dir) = site();
    add_user(&site, "ada", 1);
    site.database()
        .table(Table::Categories)
        .insert(&record([("name", "Sport".into())]))
        .unwrap();
    site.database()
        .table(Table::Articles)
        .insert(&record([
            ("title", "Match Report".into()),
            ("description", "A long account of the match.".into()),
            ("categoryId", 1.into()),
            ("date", "2024-01-01 09:00:00".into()),
            ("uid", 1.into()),
        ]))
        .unwrap();

    let mut client = Client::new(&site);
    client.submit("/admin/portal", &[("username", "ada"), ("password", "password123")]);
    for uri in ["/article/latest", "/article/latest?id=1", "/category/filter?id=1", "/admin/manageusers"] {
        let json = serde_json::to_string(&client.get(uri)).unwrap();
        assert!(!json.contains("$2"), "{uri} leaked a hash");
    }
}

struct BrokenStore;

impl SessionStore for BrokenStore {
    fn load(&self, _: &str) -> Result<Option<SessionContext>, Error> {
        Err(Error::Session("store offline".to_string()))
    }

    fn save(&self, _: &str, _: &SessionContext) -> Result<(), Error> {
        Err(Error::Session("store offline".to_string()))
    }

    fn remove(&self, _: &str) -> Result<(), Error> {
        Ok(())
    }
}

#[test]
fn infrastructure_failures_show_only_the_generic_message() {
    let site = Site::new(
        Database::open_in_memory().unwrap(),
        Router::new().unwrap(),
        BrokenStore,
        Box::new(DirectoryUploads::new(&Default::default())),
        PasswordHasher::with_cost(4),
    );
    let response = site.handle(&Request::get("/article/latest").with_session("abc"));
    assert_eq!(response.page.messages, vec![GENERIC_FAILURE.to_string()]);
    assert!(response.page.data.is_empty());
    assert_eq!(response.session_id.as_deref(), Some("abc"));
}

#[test]
fn session_store_holds_only_live_sessions() {
    let (site, _dir) = site();
    add_user(&site, "bobby", 0);
    for uri in ["/", "/article/latest", "/account/portal"] {
        assert_eq!(site.handle(&Request::get(uri)).session_id, None, "{uri}");
    }
    assert!(site.sessions().is_empty());

    let mut client = Client::new(&site);
    let planted = site.handle(&Request::get("/contact/inquiry")).session_id.unwrap();
    client.session = Some(planted.clone());
    client.submit("/account/portal", &[("username", "bobby"), ("password", "password123")]);
    let signed_in = client.session.clone().unwrap();
    assert_ne!(signed_in, planted);
    assert!(site.sessions().load(&planted).unwrap().is_none());
    assert_eq!(site.sessions().len(), 1);

    let out = client.send(Request::post("/account/portal").with_form("logout", "Log out"));
    assert_eq!(out.session_id, None);
    assert!(site.sessions().load(&signed_in).unwrap().is_none());
    assert!(site.sessions().is_empty());
}
