use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::GENERIC_FAILURE;
use crate::storage::Record;
use crate::validation::{ValidationError, ValidationErrors};

/// A navigation link, optionally with a submenu (the category list).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NavLink {
    /// Link text
    pub label: String,
    /// Target URL
    pub href: String,
    /// Nested links
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NavLink>,
}

impl NavLink {
    /// A plain link.
    pub fn new(label: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            href: href.into(),
            children: Vec::new(),
        }
    }
}

/// Everything a template needs to render one response.
///
/// Pages are plain data: the external templating layer decides how messages,
/// errors, records and forms turn into markup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page {
    /// Template name, e.g. `latest.html`
    pub template: &'static str,
    /// Document title
    pub title: String,
    /// Informational messages, in the order they were produced
    pub messages: Vec<String>,
    /// Form validation failures
    pub errors: Vec<ValidationError>,
    /// Named groups of rows to render
    pub data: BTreeMap<&'static str, Vec<Record>>,
    /// Token to embed in the page's form as `randchk`, if a form is shown
    pub form_token: Option<i64>,
    /// Which form (if any) the page shows
    pub form: Option<&'static str>,
    /// Top navigation links
    pub nav: Vec<NavLink>,
    /// Section links shown beside the content
    pub sidebar: Vec<NavLink>,
    /// Where the client should be sent instead of rendering
    pub redirect: Option<String>,
}

impl Page {
    /// An empty page for `template`.
    pub fn new(template: &'static str, title: impl Into<String>) -> Self {
        Self {
            template,
            title: title.into(),
            messages: Vec::new(),
            errors: Vec::new(),
            data: BTreeMap::new(),
            form_token: None,
            form: None,
            nav: Vec::new(),
            sidebar: Vec::new(),
            redirect: None,
        }
    }

    /// The page served whenever a request fails unexpectedly.
    pub fn failure() -> Self {
        let mut page = Self::new("error.html", "Website - Error");
        page.messages.push(GENERIC_FAILURE.to_string());
        page
    }

    /// Appends an informational message.
    pub fn message(&mut self, message: impl Into<String>) -> &mut Self {
        self.messages.push(message.into());
        self
    }

    /// Appends validation failures.
    pub fn errors(&mut self, errors: ValidationErrors) -> &mut Self {
        self.errors.extend(errors.iter().cloned());
        self
    }

    /// Attaches a group of rows under `name`.
    pub fn records(&mut self, name: &'static str, rows: Vec<Record>) -> &mut Self {
        self.data.insert(name, rows);
        self
    }

    /// Attaches a single row under `name`.
    pub fn record(&mut self, name: &'static str, row: Record) -> &mut Self {
        self.records(name, vec![row])
    }

    /// Shows `form`, protected by `token`.
    pub fn form(&mut self, form: &'static str, token: Option<i64>) -> &mut Self {
        self.form = Some(form);
        self.form_token = token;
        self
    }

    /// Replaces the navigation links.
    pub fn nav(&mut self, nav: Vec<NavLink>) -> &mut Self {
        self.nav = nav;
        self
    }

    /// Replaces the sidebar links.
    pub fn sidebar(&mut self, sidebar: Vec<NavLink>) -> &mut Self {
        self.sidebar = sidebar;
        self
    }

    /// Asks the client to go to `location`.
    pub fn redirect(&mut self, location: impl Into<String>) -> &mut Self {
        self.redirect = Some(location.into());
        self
    }

    /// Whether `message` was produced.
    pub fn has_message(&self, message: &str) -> bool {
        self.messages.iter().any(|m| m == message)
    }

    /// Rows attached under `name`, empty if none.
    pub fn rows(&self, name: &str) -> &[Record] {
        self.data.get(name).map(Vec::as_slice).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_page_carries_only_the_generic_message() {
        let page = Page::failure();
        assert_eq!(page.messages, vec![GENERIC_FAILURE.to_string()]);
        assert!(page.errors.is_empty());
        assert!(page.data.is_empty());
    }

    #[test]
    fn builder_methods_chain() {
        let mut page = Page::new("latest.html", "Website - Latest Articles");
        page.message("There are no articles posted yet.")
            .records("articles", Vec::new())
            .form("comment", Some(7));
        assert!(page.has_message("There are no articles posted yet."));
        assert_eq!(page.form_token, Some(7));
        assert!(page.rows("articles").is_empty());
        assert!(page.rows("missing").is_empty());
    }

    #[test]
    fn serializes_for_templates() {
        let mut page = Page::new("index.html", "Website - Home");
        page.nav(vec![NavLink::new("Home", "/")]);
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["template"], "index.html");
        assert_eq!(json["nav"][0]["href"], "/");
        assert!(json["nav"][0].get("children").is_none());
    }
}
