//! Test harness for running actions against a fresh site.

use crate::config::UploadConfig;
use crate::context::{Ctx, FORM_TOKEN_FIELD};
use crate::password::PasswordHasher;
use crate::secret::Secret;
use crate::session::{SessionContext, FORM_TOKEN};
use crate::storage::{record, Database, Table};
use crate::web::{Action, DirectoryUploads, Page, Request};

pub(crate) struct Fixture {
    pub db: Database,
    pub session: SessionContext,
    pub uploads: DirectoryUploads,
    pub dir: tempfile::TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let uploads = DirectoryUploads::new(&UploadConfig {
            directory: dir.path().to_path_buf(),
            public_prefix: "/images/upload".to_string(),
            max_bytes: 5_000_000,
        });
        Self {
            db: Database::open_in_memory().unwrap(),
            session: SessionContext::new(),
            uploads,
            dir,
        }
    }

    pub fn hasher() -> PasswordHasher {
        PasswordHasher::with_cost(4)
    }

    pub fn run(&mut self, action: Action, request: Request) -> Page {
        let mut ctx = Ctx::new(&request, &mut self.session, &self.db, &self.uploads, Self::hasher());
        action(&mut ctx).unwrap()
    }

    /// A POST carrying `submit` and a valid form token.
    pub fn submission(&mut self, uri: &str) -> Request {
        self.session.set(FORM_TOKEN, 4242);
        Request::post(uri)
            .with_form("submit", "Submit")
            .with_form(FORM_TOKEN_FIELD, "4242")
    }

    pub fn add_user(&self, username: &str, tier: i64, password: &str) -> i64 {
        let hash = Self::hasher().hash(&Secret::new(password.to_string())).unwrap();
        self.db
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
            .unwrap()
    }

    pub fn log_in(&mut self, username: &str) {
        let row = self
            .db
            .table(Table::Users)
            .find("username", username, None, None)
            .unwrap()
            .remove(0);
        self.session.populate_from(&row);
    }

    pub fn add_category(&self, name: &str) -> i64 {
        self.db
            .table(Table::Categories)
            .insert(&record([("name", name.into())]))
            .unwrap()
    }

    pub fn add_article(&self, title: &str, category: i64, uid: i64, path: Option<&str>) -> i64 {
        self.db
            .table(Table::Articles)
            .insert(&record([
                ("title", title.into()),
                ("description", "Article body text.".into()),
                ("categoryId", category.into()),
                ("date", "2024-01-01 09:00:00".into()),
                ("uid", uid.into()),
                ("path", path.into()),
            ]))
            .unwrap()
    }
}
