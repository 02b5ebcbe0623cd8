//! Submitted forms and the rule set each one is checked against.
//!
//! A form is read from the request body with `from_params`; missing fields
//! read as `""` so the `required` rule reports them. `check` runs every rule
//! for the form and returns the collected [`Checks`]; forms that look at
//! existing accounts take the users gateway and may fail with a storage
//! error.

use crate::error::Error;
use crate::policy::Permission;
use crate::secret::Secret;
use crate::storage::{record, Record, TableGateway, Value};
use crate::validation::{duplicate_email, duplicate_username, rules, Checks};
use crate::web::Params;

/// Username and password, as posted by both login pages.
#[derive(Debug)]
pub struct LoginForm {
    /// As typed; looked up case-insensitively
    pub username: String,
    /// Plain-text password
    pub password: Secret<String>,
}

impl LoginForm {
    /// Reads `username` and `password`.
    pub fn from_params(form: &Params) -> Self {
        Self {
            username: form.text("username").to_string(),
            password: form.secret("password"),
        }
    }

    /// Login rules.
    pub fn check(&self) -> Checks {
        let password = self.password.expose_secret().as_str();
        let mut checks = Checks::new();
        checks
            .push(rules::required(&[
                ("Username", Some(self.username.as_str())),
                ("Password", Some(password)),
            ]))
            .push(rules::no_spaces(&[
                ("Username", self.username.as_str()),
                ("Password", password),
            ]))
            .push(rules::length("Username", &self.username, 2, 32))
            .push(rules::length("Password", password, 8, 32));
        checks
    }
}

/// New account details.
#[derive(Debug)]
pub struct SignupForm {
    /// Given name
    pub firstname: String,
    /// Family name
    pub surname: String,
    /// Requested username
    pub username: String,
    /// Contact email
    pub email: String,
    /// UK phone number (`tel`)
    pub tel: String,
    /// Chosen password
    pub password: Secret<String>,
}

impl SignupForm {
    /// Reads the signup fields.
    pub fn from_params(form: &Params) -> Self {
        Self {
            firstname: form.text("firstname").to_string(),
            surname: form.text("surname").to_string(),
            username: form.text("username").to_string(),
            email: form.text("email").to_string(),
            tel: form.text("tel").to_string(),
            password: form.secret("password"),
        }
    }

    /// Signup rules, including the duplicate-account lookups.
    pub fn check(&self, users: &TableGateway<'_>) -> Result<Checks, Error> {
        let password = self.password.expose_secret().as_str();
        let mut checks = Checks::new();
        checks
            .push(duplicate_username(users, &self.username, None)?)
            .push(duplicate_email(users, &self.email, None)?)
            .push(rules::required(&[
                ("Firstname", Some(self.firstname.as_str())),
                ("Surname", Some(self.surname.as_str())),
                ("Username", Some(self.username.as_str())),
                ("Email", Some(self.email.as_str())),
                ("Phone Number", Some(self.tel.as_str())),
                ("Password", Some(password)),
            ]))
            .push(rules::no_spaces(&[
                ("Username", self.username.as_str()),
                ("Password", password),
                ("Email", self.email.as_str()),
                ("Phone Number", self.tel.as_str()),
            ]))
            .push(rules::length("Username", &self.username, 4, 32))
            .push(rules::length("Firstname", &self.firstname, 2, 32))
            .push(rules::length("Surname", &self.surname, 2, 32))
            .push(rules::length("Password", password, 8, 32))
            .push(rules::email(&self.email))
            .push(rules::alphabetic(&[
                ("Firstname", self.firstname.as_str()),
                ("Surname", self.surname.as_str()),
                ("Username", self.username.as_str()),
            ]))
            .push(rules::uk_phone(&self.tel));
        Ok(checks)
    }

    /// The `users` row to insert, with `password_hash` in place of the
    /// plain-text password.
    pub fn record(&self, password_hash: String) -> Record {
        record([
            ("username", self.username.to_lowercase().into()),
            ("firstname", self.firstname.as_str().into()),
            ("surname", self.surname.as_str().into()),
            ("email", self.email.to_lowercase().into()),
            ("password", password_hash.into()),
            ("phone_num", self.tel.as_str().into()),
        ])
    }

    /// Values to put back into the form after a rejected submission.
    /// The password is never echoed.
    pub fn prefill(&self) -> Record {
        record([
            ("firstname", self.firstname.as_str().into()),
            ("surname", self.surname.as_str().into()),
            ("username", self.username.as_str().into()),
            ("email", self.email.as_str().into()),
            ("tel", self.tel.as_str().into()),
        ])
    }
}

/// An admin's changes to an existing account.
#[derive(Debug, Clone)]
pub struct UserEditForm {
    /// New username
    pub username: String,
    /// New given name
    pub firstname: String,
    /// New family name
    pub surname: String,
    /// New email
    pub email: String,
    /// New phone number
    pub phone_num: String,
    /// New tier; `None` when absent or not a known tier
    pub permissions: Option<Permission>,
    /// Delete the account instead of updating it
    pub delete: bool,
}

impl UserEditForm {
    /// Reads the edit-user fields.
    pub fn from_params(form: &Params) -> Self {
        Self {
            username: form.text("username").to_string(),
            firstname: form.text("firstname").to_string(),
            surname: form.text("surname").to_string(),
            email: form.text("email").to_string(),
            phone_num: form.text("phone_num").to_string(),
            permissions: form
                .integer("permissions")
                .and_then(|tier| Permission::try_from(tier).ok()),
            delete: form.has("delete"),
        }
    }

    /// Edit rules. Duplicates are checked against every account except
    /// `current`, the one being edited.
    pub fn check(&self, users: &TableGateway<'_>, current: &Record) -> Result<Checks, Error> {
        let mut checks = Checks::new();
        checks
            .push(duplicate_username(users, &self.username, Some(current))?)
            .push(duplicate_email(users, &self.email, Some(current))?)
            .push(rules::required(&[
                ("Firstname", Some(self.firstname.as_str())),
                ("Surname", Some(self.surname.as_str())),
                ("Username", Some(self.username.as_str())),
                ("Email", Some(self.email.as_str())),
                ("Phone Number", Some(self.phone_num.as_str())),
            ]))
            .push(rules::no_spaces(&[
                ("Email", self.email.as_str()),
                ("Phone Number", self.phone_num.as_str()),
            ]))
            .push(rules::length("Username", &self.username, 4, 32))
            .push(rules::length("Firstname", &self.firstname, 2, 32))
            .push(rules::length("Surname", &self.surname, 2, 32))
            .push(rules::email(&self.email))
            .push(rules::alphabetic(&[
                ("Firstname", self.firstname.as_str()),
                ("Surname", self.surname.as_str()),
                ("Username", self.username.as_str()),
            ]))
            .push(rules::uk_phone(&self.phone_num));
        Ok(checks)
    }

    /// The update for user `uid`. The tier is not included; callers add it
    /// when the actor may change tiers.
    pub fn record(&self, uid: i64) -> Record {
        record([
            ("uid", uid.into()),
            ("username", self.username.to_lowercase().into()),
            ("firstname", self.firstname.as_str().into()),
            ("surname", self.surname.as_str().into()),
            ("email", self.email.to_lowercase().into()),
            ("phone_num", self.phone_num.as_str().into()),
        ])
    }
}

/// Contact page inquiry.
#[derive(Debug, Clone)]
pub struct InquiryForm {
    /// Subject line
    pub title: String,
    /// Body text
    pub inquiry: String,
    /// Given name
    pub firstname: String,
    /// Family name
    pub surname: String,
    /// Reply address
    pub email: String,
    /// Phone number (`tel`)
    pub tel: String,
}

impl InquiryForm {
    /// Reads the inquiry fields.
    pub fn from_params(form: &Params) -> Self {
        Self {
            title: form.text("title").to_string(),
            inquiry: form.text("inquiry").to_string(),
            firstname: form.text("firstname").to_string(),
            surname: form.text("surname").to_string(),
            email: form.text("email").to_string(),
            tel: form.text("tel").to_string(),
        }
    }

    /// Inquiry rules.
    pub fn check(&self) -> Checks {
        let mut checks = Checks::new();
        checks
            .push(rules::required(&[
                ("Inquiry", Some(self.inquiry.as_str())),
                ("Title", Some(self.title.as_str())),
                ("Firstname", Some(self.firstname.as_str())),
                ("Surname", Some(self.surname.as_str())),
                ("Email", Some(self.email.as_str())),
                ("Phone Number", Some(self.tel.as_str())),
            ]))
            .push(rules::no_spaces(&[
                ("Email", self.email.as_str()),
                ("Phone Number", self.tel.as_str()),
            ]))
            .push(rules::length("Firstname", &self.firstname, 2, 32))
            .push(rules::length("Surname", &self.surname, 2, 32))
            .push(rules::length("Title", &self.title, 2, 128))
            .push(rules::length("Inquiry", &self.inquiry, 10, 5000))
            .push(rules::length("Email", &self.email, 2, 128))
            .push(rules::email(&self.email))
            .push(rules::alphabetic(&[
                ("Firstname", self.firstname.as_str()),
                ("Surname", self.surname.as_str()),
                ("Title", self.title.as_str()),
            ]))
            .push(rules::uk_phone(&self.tel));
        checks
    }

    /// The `inquiries` row, dated `date` and credited to `username` when
    /// the visitor is logged in.
    pub fn record(&self, date: String, username: Option<&str>) -> Record {
        let mut row = record([
            ("title", self.title.as_str().into()),
            ("inquiry", self.inquiry.as_str().into()),
            ("firstname", self.firstname.as_str().into()),
            ("surname", self.surname.as_str().into()),
            ("email", self.email.to_lowercase().into()),
            ("phone_num", self.tel.as_str().into()),
            ("date", date.into()),
        ]);
        if let Some(username) = username {
            row.insert("username".to_string(), username.into());
        }
        row
    }

    /// Values to put back into the form after a rejected submission.
    pub fn prefill(&self) -> Record {
        record([
            ("title", self.title.as_str().into()),
            ("inquiry", self.inquiry.as_str().into()),
            ("firstname", self.firstname.as_str().into()),
            ("surname", self.surname.as_str().into()),
            ("email", self.email.as_str().into()),
            ("tel", self.tel.as_str().into()),
        ])
    }
}

/// A comment on an article.
#[derive(Debug, Clone)]
pub struct CommentForm {
    /// Given name
    pub firstname: String,
    /// Family name
    pub surname: String,
    /// Contact email
    pub email: String,
    /// Comment body (`text`)
    pub text: String,
}

impl CommentForm {
    /// Reads the comment fields.
    pub fn from_params(form: &Params) -> Self {
        Self {
            firstname: form.text("firstname").to_string(),
            surname: form.text("surname").to_string(),
            email: form.text("email").to_string(),
            text: form.text("text").to_string(),
        }
    }

    /// Comment rules.
    pub fn check(&self) -> Checks {
        let mut checks = Checks::new();
        checks
            .push(rules::required(&[
                ("Message", Some(self.text.as_str())),
                ("Firstname", Some(self.firstname.as_str())),
                ("Surname", Some(self.surname.as_str())),
                ("Email", Some(self.email.as_str())),
            ]))
            .push(rules::no_spaces(&[("Email", self.email.as_str())]))
            .push(rules::length("Firstname", &self.firstname, 2, 32))
            .push(rules::length("Surname", &self.surname, 2, 32))
            .push(rules::length("Message", &self.text, 10, 5000))
            .push(rules::length("Email", &self.email, 2, 128))
            .push(rules::email(&self.email))
            .push(rules::alphabetic(&[
                ("Firstname", self.firstname.as_str()),
                ("Surname", self.surname.as_str()),
            ]));
        checks
    }

    /// The `comments` row for `article_id`.
    pub fn record(&self, article_id: i64, date: String, username: Option<&str>) -> Record {
        let mut row = record([
            ("firstname", self.firstname.as_str().into()),
            ("articleId", article_id.into()),
            ("surname", self.surname.as_str().into()),
            ("email", self.email.to_lowercase().into()),
            ("text", self.text.as_str().into()),
            ("date", date.into()),
        ]);
        if let Some(username) = username {
            row.insert("username".to_string(), username.into());
        }
        row
    }

    /// Values to put back into the form after a rejected submission.
    pub fn prefill(&self) -> Record {
        record([
            ("firstname", self.firstname.as_str().into()),
            ("surname", self.surname.as_str().into()),
            ("email", self.email.as_str().into()),
            ("text", self.text.as_str().into()),
        ])
    }
}

/// Category name, for adding or renaming.
#[derive(Debug, Clone)]
pub struct CategoryForm {
    /// Category name
    pub name: String,
}

impl CategoryForm {
    /// Reads `name`.
    pub fn from_params(form: &Params) -> Self {
        Self {
            name: form.text("name").to_string(),
        }
    }

    /// Category rules.
    pub fn check(&self) -> Checks {
        let mut checks = Checks::new();
        checks
            .push(rules::required(&[("Category Name", Some(self.name.as_str()))]))
            .push(rules::length("Category Name", &self.name, 2, 32))
            .push(rules::alphabetic(&[("Category Name", self.name.as_str())]));
        checks
    }
}

/// Article fields shared by the add and edit pages.
#[derive(Debug, Clone)]
pub struct ArticleForm {
    /// Headline
    pub title: String,
    /// Body text
    pub description: String,
    /// Chosen category id, as submitted
    pub category_id: String,
    /// Drop the current image (edit page only)
    pub delete_image: bool,
}

impl ArticleForm {
    /// Reads the article fields.
    pub fn from_params(form: &Params) -> Self {
        Self {
            title: form.text("title").to_string(),
            description: form.text("description").to_string(),
            category_id: form.text("categoryId").to_string(),
            delete_image: form.has("delete"),
        }
    }

    /// Article rules.
    pub fn check(&self) -> Checks {
        let mut checks = Checks::new();
        checks
            .push(rules::required(&[
                ("Article Title", Some(self.title.as_str())),
                ("Article Text", Some(self.description.as_str())),
                ("Category ID", Some(self.category_id.as_str())),
            ]))
            .push(rules::length("Article Title", &self.title, 2, 255))
            .push(rules::length("Article Text", &self.description, 10, 5000))
            .push(rules::alphabetic(&[("Article Title", self.title.as_str())]));
        checks
    }

    /// Title, text, category and date columns. Callers add the key, author
    /// and image path.
    pub fn record(&self, date: String) -> Record {
        let category = self
            .category_id
            .trim()
            .parse::<i64>()
            .map(Value::from)
            .unwrap_or_else(|_| Value::from(self.category_id.as_str()));
        record([
            ("title", self.title.as_str().into()),
            ("description", self.description.as_str().into()),
            ("categoryId", category),
            ("date", date.into()),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{Database, RecordExt, Table};
    use crate::validation::ValidationErrorKind;

    fn params(pairs: &[(&str, &str)]) -> Params {
        pairs.iter().copied().collect()
    }

    fn signup(username: &str) -> SignupForm {
        SignupForm::from_params(&params(&[
            ("firstname", "Bob"),
            ("surname", "Smith"),
            ("username", username),
            ("email", "Bob@Example.com"),
            ("tel", "+447222555555"),
            ("password", "password123"),
        ]))
    }

    #[test]
    fn short_signup_username_reports_length() {
        let db = Database::open_in_memory().unwrap();
        let errors = signup("bo")
            .check(&db.table(Table::Users))
            .unwrap()
            .finish()
            .unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors.contains(ValidationErrorKind::Length { min: 4, max: 32 }));
        assert_eq!(errors.messages()[0], "Username must be between 4 and 32 characters.");
    }

    #[test]
    fn valid_signup_builds_lowercased_row_without_plain_password() {
        let db = Database::open_in_memory().unwrap();
        let form = signup("Bobby");
        assert!(form.check(&db.table(Table::Users)).unwrap().finish().is_ok());

        let row = form.record("$2b$04$hash".to_string());
        assert_eq!(row.text("username"), Some("bobby"));
        assert_eq!(row.text("email"), Some("bob@example.com"));
        assert_eq!(row.text("password"), Some("$2b$04$hash"));
        assert!(!form.prefill().contains_key("password"));
    }

    #[test]
    fn empty_login_reports_required_then_lengths() {
        let errors = LoginForm::from_params(&Params::default()).check().finish().unwrap_err();
        assert_eq!(
            errors.messages(),
            vec![
                "Username field is required.".to_string(),
                "Username must be between 2 and 32 characters.".to_string(),
                "Password must be between 8 and 32 characters.".to_string(),
            ]
        );
    }

    #[test]
    fn login_password_is_redacted_in_debug() {
        let form = LoginForm::from_params(&params(&[("username", "bob"), ("password", "hunter2hunter2")]));
        assert!(!format!("{form:?}").contains("hunter2"));

        let form = SignupForm::from_params(&params(&[("username", "bobby"), ("password", "hunter2hunter2")]));
        assert!(!format!("{form:?}").contains("hunter2"));
    }

    #[test]
    fn edit_form_ignores_unknown_tier() {
        let form = UserEditForm::from_params(&params(&[("permissions", "7"), ("delete", "on")]));
        assert_eq!(form.permissions, None);
        assert!(form.delete);
        let form = UserEditForm::from_params(&params(&[("permissions", "0")]));
        assert_eq!(form.permissions, Some(Permission::User));
    }

    #[test]
    fn inquiry_requires_inquiry_first() {
        let errors = InquiryForm::from_params(&Params::default()).check().finish().unwrap_err();
        assert_eq!(errors.iter().next().map(|e| e.field()), Some("Inquiry"));
    }

    #[test]
    fn comment_row_carries_username_when_logged_in() {
        let form = CommentForm::from_params(&params(&[
            ("firstname", "Ann"),
            ("surname", "Lee"),
            ("email", "ANN@example.com"),
            ("text", "A thoughtful remark."),
        ]));
        assert!(form.check().finish().is_ok());
        let row = form.record(4, "2024-01-01 10:00:00".to_string(), Some("ann"));
        assert_eq!(row.integer("articleId"), Some(4));
        assert_eq!(row.text("email"), Some("ann@example.com"));
        assert_eq!(row.text("username"), Some("ann"));
        assert!(!form.record(4, String::new(), None).contains_key("username"));
    }

    #[test]
    fn category_name_must_be_letters() {
        let form = CategoryForm::from_params(&params(&[("name", "Sport 2")]));
        let errors = form.check().finish().unwrap_err();
        assert!(errors.contains(ValidationErrorKind::NotAlphabetic));
    }

    #[test]
    fn article_category_is_stored_as_integer() {
        let form = ArticleForm::from_params(&params(&[
            ("title", "Local News"),
            ("description", "Something happened today."),
            ("categoryId", "3"),
        ]));
        assert!(form.check().finish().is_ok());
        assert_eq!(form.record(String::new()).get("categoryId"), Some(&Value::Integer(3)));
    }
}
