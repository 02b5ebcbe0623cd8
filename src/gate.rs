use crate::{
    error::{Violation, ViolationKind},
    policy::PolicyReq,
    session::{Principal, SessionContext},
};

/// The policy enforcement gate.
///
/// `PolicyGate` turns a session into a [`Principal`] after checking every
/// requirement it was given. Admin pages go through it before touching any
/// table.
///
/// # Examples
///
/// ```
/// use newsdesk::{record, Authenticated, Authorized, Permission, PolicyGate, SessionContext};
///
/// let mut session = SessionContext::new();
/// session.populate_from(&record([
///     ("uid", 1.into()),
///     ("username", "ada".into()),
///     ("permissions", 1.into()),
/// ]));
///
/// let principal = PolicyGate::new(&session)
///     .require(Authenticated)
///     .require(Authorized::at_least(Permission::Admin))
///     .build()
///     .expect("policies should pass");
///
/// assert_eq!(principal.username, "ada");
/// ```
pub struct PolicyGate<'s> {
    session: &'s SessionContext,
    requirements: Vec<PolicyReq>,
}

impl<'s> PolicyGate<'s> {
    /// Creates a gate over the given session.
    pub fn new(session: &'s SessionContext) -> Self {
        Self {
            session,
            requirements: Vec::new(),
        }
    }

    /// Adds a policy requirement, ignoring exact duplicates.
    ///
    /// # Examples
    ///
    /// ```
    /// use newsdesk::{Authenticated, PolicyGate, SessionContext};
    ///
    /// let session = SessionContext::new();
    /// let gate = PolicyGate::new(&session)
    ///     .require(Authenticated)
    ///     .require(Authenticated); // second call is deduplicated
    /// assert!(gate.build().is_err());
    /// ```
    pub fn require(mut self, policy: impl Into<PolicyReq>) -> Self {
        let req = policy.into();
        if !self.requirements.contains(&req) {
            self.requirements.push(req);
        }
        self
    }

    /// Validates all requirements and returns the logged-in user.
    ///
    /// A gate with no requirements still needs a logged-in session, since
    /// it has to produce a `Principal`.
    ///
    /// # Errors
    ///
    /// The first failing requirement's `Violation`.
    pub fn build(self) -> Result<Principal, Violation> {
        let principal = self.session.principal();
        for req in &self.requirements {
            Self::validate_one(principal.as_ref(), req)?;
        }
        principal.ok_or_else(|| {
            Violation::new(ViolationKind::Unauthenticated, "Authentication required")
        })
    }

    fn validate_one(principal: Option<&Principal>, req: &PolicyReq) -> Result<(), Violation> {
        match req {
            PolicyReq::Authenticated => {
                if principal.is_none() {
                    return Err(Violation::new(
                        ViolationKind::Unauthenticated,
                        "Authentication required",
                    ));
                }
            }
            PolicyReq::Authorized { minimum } => {
                let Some(principal) = principal else {
                    return Err(Violation::new(
                        ViolationKind::Unauthenticated,
                        "Cannot authorize unauthenticated session",
                    ));
                };
                if principal.permission < *minimum {
                    return Err(Violation::new(
                        ViolationKind::InsufficientPermission,
                        "You do not have the permissions to access this page.",
                    ));
                }
            }
        }
        Ok(())
    }
}
