use std::collections::HashMap;
use std::fmt;

use crate::context::Ctx;
use crate::error::Error;

use super::page::Page;

/// A page action: reads the request through `Ctx` and produces a `Page`.
pub type Action = fn(&mut Ctx<'_>) -> Result<Page, Error>;

/// One registry entry.
#[derive(Clone, Copy)]
pub struct Route {
    /// Controller key (first path segment)
    pub controller: &'static str,
    /// Action key (second path segment)
    pub action: &'static str,
    /// Function invoked for this pair
    pub handler: Action,
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Route({}/{})", self.controller, self.action)
    }
}

/// The controller/action pair a path resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RouteKey {
    /// Controller key
    pub controller: &'static str,
    /// Action key
    pub action: &'static str,
}

impl fmt::Display for RouteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.controller, self.action)
    }
}

/// Route served when a path does not name a registered pair.
pub const FALLBACK: RouteKey = RouteKey {
    controller: "home",
    action: "index",
};

/// Maps `controller/action` paths to actions.
///
/// Paths are matched after removing the query string and leading slashes
/// and folding to lowercase. Anything that is not exactly two registered
/// segments is served by the home page; there is no "not found" page.
///
/// # Examples
///
/// ```
/// use newsdesk::web::Router;
///
/// let router = Router::new().unwrap();
/// assert_eq!(router.route_for("/ARTICLE/Latest?id=3").to_string(), "article/latest");
/// assert_eq!(router.route_for("/no/such/page").to_string(), "home/index");
/// assert_eq!(router.route_for("").to_string(), "home/index");
/// ```
pub struct Router {
    controllers: HashMap<&'static str, HashMap<&'static str, Action>>,
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<String> = self.keys().map(|k| k.to_string()).collect();
        keys.sort();
        f.debug_struct("Router").field("routes", &keys).finish()
    }
}

impl Router {
    /// The site's route table.
    pub fn new() -> Result<Self, Error> {
        Self::with_routes(crate::controllers::ROUTES)
    }

    /// A router over `routes`, validated up front.
    ///
    /// # Errors
    ///
    /// [`Error::Argument`] when a key is empty, not lowercase, or contains
    /// `/`; when a pair is registered twice; or when `home/index` is missing.
    pub fn with_routes(routes: &[Route]) -> Result<Self, Error> {
        let mut controllers: HashMap<&'static str, HashMap<&'static str, Action>> = HashMap::new();
        for route in routes {
            for key in [route.controller, route.action] {
                let well_formed = !key.is_empty()
                    && !key.contains('/')
                    && !key.contains('?')
                    && key.to_lowercase() == key;
                if !well_formed {
                    return Err(Error::argument(format!(
                        "route key `{key}` must be non-empty lowercase without '/' or '?'"
                    )));
                }
            }
            let key = RouteKey {
                controller: route.controller,
                action: route.action,
            };
            let actions = controllers.entry(route.controller).or_default();
            if actions.insert(route.action, route.handler).is_some() {
                return Err(Error::argument(format!("route `{key}` registered twice")));
            }
        }
        let has_fallback = controllers
            .get(FALLBACK.controller)
            .is_some_and(|actions| actions.contains_key(FALLBACK.action));
        if !has_fallback {
            return Err(Error::argument(format!(
                "fallback route `{FALLBACK}` is not registered"
            )));
        }
        Ok(Self { controllers })
    }

    /// The pair `path` resolves to, falling back to `home/index`.
    pub fn route_for(&self, path: &str) -> RouteKey {
        self.lookup(&normalize(path))
            .map(|(key, _)| key)
            .unwrap_or(FALLBACK)
    }

    fn lookup(&self, normalized: &str) -> Option<(RouteKey, Action)> {
        let (controller, action) = normalized.split_once('/')?;
        let (controller, actions) = self.controllers.get_key_value(controller)?;
        let (action, handler) = actions.get_key_value(action)?;
        Some((
            RouteKey {
                controller: *controller,
                action: *action,
            },
            *handler,
        ))
    }

    /// Resolves `path` and runs its action.
    ///
    /// Errors from the action are returned unchanged; resolution itself
    /// never fails.
    pub fn resolve(&self, path: &str, ctx: &mut Ctx<'_>) -> Result<Page, Error> {
        let normalized = normalize(path);
        let (key, action) = match self.lookup(&normalized) {
            Some(found) => found,
            None => {
                if !normalized.is_empty() {
                    tracing::debug!(path = %path, "unresolved route, serving home page");
                }
                self.lookup(&FALLBACK.to_string())
                    .ok_or_else(|| Error::argument("fallback route missing"))?
            }
        };
        tracing::debug!(route = %key, "dispatching");
        action(ctx)
    }

    /// Registered pairs, in no particular order.
    pub fn keys(&self) -> impl Iterator<Item = RouteKey> + '_ {
        self.controllers.iter().flat_map(|(controller, actions)| {
            actions.keys().map(move |action| RouteKey {
                controller: *controller,
                action: *action,
            })
        })
    }
}

fn normalize(path: &str) -> String {
    let without_query = path.split_once('?').map_or(path, |(p, _)| p);
    without_query.trim_start_matches('/').to_lowercase()
}
