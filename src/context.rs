use rand::Rng;

use crate::logging::RequestLog;
use crate::password::PasswordHasher;
use crate::session::{Principal, SessionContext, FORM_TOKEN};
use crate::storage::{Database, Table, TableGateway};
use crate::web::{Method, Params, Request, UploadStore};

/// Form field carrying the token a form was rendered with.
pub const FORM_TOKEN_FIELD: &str = "randchk";

/// Everything a page controller can reach while handling one request.
///
/// `Ctx` is built by [`Site`](crate::web::Site) for each request and passed
/// to the routed action. Session changes made through it are saved when the
/// action returns.
pub struct Ctx<'a> {
    request: &'a Request,
    session: &'a mut SessionContext,
    db: &'a Database,
    uploads: &'a dyn UploadStore,
    hasher: PasswordHasher,
}

impl<'a> Ctx<'a> {
    /// Assembles a context for one request.
    pub fn new(
        request: &'a Request,
        session: &'a mut SessionContext,
        db: &'a Database,
        uploads: &'a dyn UploadStore,
        hasher: PasswordHasher,
    ) -> Self {
        Self {
            request,
            session,
            db,
            uploads,
            hasher,
        }
    }

    /// Returns the request ID for this context.
    pub fn request_id(&self) -> &str {
        self.request.request_id()
    }

    /// The request being handled.
    pub fn request(&self) -> &'a Request {
        self.request
    }

    /// Query-string parameters.
    pub fn query(&self) -> &'a Params {
        self.request.query()
    }

    /// Form body parameters.
    pub fn form(&self) -> &'a Params {
        self.request.form()
    }

    /// Whether this is a form submission (`POST` carrying `submit`).
    pub fn is_submission(&self) -> bool {
        self.request.method() == Method::Post && self.request.form().has("submit")
    }

    /// Session state for this client.
    pub fn session(&self) -> &SessionContext {
        &*self.session
    }

    /// Mutable session state for this client.
    pub fn session_mut(&mut self) -> &mut SessionContext {
        &mut *self.session
    }

    /// The logged-in user, if any.
    pub fn principal(&self) -> Option<Principal> {
        self.session.principal()
    }

    /// A gateway for `table`.
    pub fn table(&self, table: Table) -> TableGateway<'a> {
        self.db.table(table)
    }

    /// Image storage.
    pub fn uploads(&self) -> &'a dyn UploadStore {
        self.uploads
    }

    /// Password hasher configured for this site.
    pub fn hasher(&self) -> PasswordHasher {
        self.hasher
    }

    /// Request-scoped logger.
    pub fn log(&self) -> RequestLog<'_> {
        RequestLog::new(self.request.request_id())
    }

    /// Issues a fresh resubmission token for the form about to be shown and
    /// remembers it in the session.
    pub fn issue_form_token(&mut self) -> i64 {
        let token = rand::thread_rng().gen_range(1..=i64::from(i32::MAX));
        self.session.set(FORM_TOKEN, token);
        token
    }

    /// Whether the submitted `randchk` matches the token last issued to this
    /// session. A reload of an already-processed form fails this check.
    pub fn form_token_matches(&self) -> bool {
        let issued = self.session.get(FORM_TOKEN).and_then(|v| v.as_integer());
        let submitted = self.form().integer(FORM_TOKEN_FIELD);
        matches!((issued, submitted), (Some(a), Some(b)) if a == b)
    }
}
