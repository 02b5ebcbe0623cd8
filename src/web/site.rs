use serde::Serialize;

use crate::config::SiteConfig;
use crate::context::Ctx;
use crate::error::Error;
use crate::password::PasswordHasher;
use crate::session::{new_session_id, MemorySessionStore, SessionContext, SessionStore};
use crate::storage::Database;

use super::page::Page;
use super::request::Request;
use super::router::Router;
use super::upload::{DirectoryUploads, UploadStore};

/// What a framework integration sends back to the client.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    /// Id of the request this answers, for correlating logs
    pub request_id: String,
    /// Session id the client should present next time, or `None` when the
    /// client holds no session
    pub session_id: Option<String>,
    /// Page to render
    pub page: Page,
}

/// The whole site: database, route table, session store and image storage.
///
/// `handle` is the outermost boundary. No error escapes it; anything that
/// goes wrong is logged with the request id and replaced by the generic
/// failure page.
pub struct Site<S: SessionStore = MemorySessionStore> {
    db: Database,
    router: Router,
    sessions: S,
    uploads: Box<dyn UploadStore>,
    hasher: PasswordHasher,
}

impl Site<MemorySessionStore> {
    /// A site built from `config`, keeping sessions in memory.
    pub fn from_config(config: &SiteConfig) -> Result<Self, Error> {
        config.validate()?;
        Ok(Self::new(
            Database::open(&config.database)?,
            Router::new()?,
            MemorySessionStore::new(),
            Box::new(DirectoryUploads::new(&config.uploads)),
            PasswordHasher::with_cost(config.security.bcrypt_cost),
        ))
    }
}

impl<S: SessionStore> Site<S> {
    /// Assembles a site from its parts.
    pub fn new(
        db: Database,
        router: Router,
        sessions: S,
        uploads: Box<dyn UploadStore>,
        hasher: PasswordHasher,
    ) -> Self {
        Self {
            db,
            router,
            sessions,
            uploads,
            hasher,
        }
    }

    /// The site's database.
    pub fn database(&self) -> &Database {
        &self.db
    }

    /// The site's session store.
    pub fn sessions(&self) -> &S {
        &self.sessions
    }

    /// Password hasher used for logins and signups.
    pub fn hasher(&self) -> PasswordHasher {
        self.hasher
    }

    /// Runs one request to completion.
    pub fn handle(&self, request: &Request) -> Response {
        let path = request.uri().split_once('?').map_or(request.uri(), |(p, _)| p);
        let span = tracing::info_span!(
            "request",
            request_id = %request.request_id(),
            method = %request.method(),
            path = %path,
        );
        let _entered = span.enter();

        let (page, session_id) = match self.dispatch(request) {
            Ok(answer) => answer,
            Err(error) => {
                tracing::error!(
                    request_id = %request.request_id(),
                    path = %path,
                    error = %error,
                    details = ?error,
                    "request failed"
                );
                (Page::failure(), request.session_id().map(str::to_string))
            }
        };

        Response {
            request_id: request.request_id().to_string(),
            session_id,
            page,
        }
    }

    /// Runs the action and settles the session. Only ids this store issued
    /// are honoured. Logging in moves the session to a fresh id, and a
    /// session left empty is forgotten instead of saved.
    fn dispatch(&self, request: &Request) -> Result<(Page, Option<String>), Error> {
        let (mut id, mut session) = match request.session_id() {
            Some(id) => match self.sessions.load(id)? {
                Some(session) => (Some(id.to_string()), session),
                None => {
                    tracing::debug!("ignoring unknown session id");
                    (None, SessionContext::new())
                }
            },
            None => (None, SessionContext::new()),
        };
        let was_logged_in = session.is_logged_in();

        let page = {
            let mut ctx = Ctx::new(
                request,
                &mut session,
                &self.db,
                self.uploads.as_ref(),
                self.hasher,
            );
            self.router.resolve(request.uri(), &mut ctx)?
        };

        if !was_logged_in && session.is_logged_in() {
            if let Some(old) = id.take() {
                self.sessions.remove(&old)?;
            }
        }

        if session.is_empty() {
            if let Some(old) = id {
                self.sessions.remove(&old)?;
                tracing::debug!("session cleared");
            }
            return Ok((page, None));
        }

        let id = id.unwrap_or_else(|| {
            tracing::debug!("starting new session");
            new_session_id()
        });
        self.sessions.save(&id, &session)?;
        Ok((page, Some(id)))
    }
}

impl<S: SessionStore> std::fmt::Debug for Site<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Site")
            .field("db", &self.db)
            .field("router", &self.router)
            .finish_non_exhaustive()
    }
}
