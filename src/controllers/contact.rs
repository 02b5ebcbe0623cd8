use crate::context::Ctx;
use crate::error::Error;
use crate::forms::InquiryForm;
use crate::session::USERNAME;
use crate::storage::{record, Table};
use crate::web::Page;

use super::{accepts_form, today, FORM_REJECTED};

/// Contact form. A valid submission is stored as a pending inquiry.
pub(super) fn inquiry(ctx: &mut Ctx<'_>) -> Result<Page, Error> {
    let mut page = super::website_page(ctx, "contact.html", "Website - Inquiry")?;
    let mut prefill = None;

    if accepts_form(ctx) {
        let form = InquiryForm::from_params(ctx.form());
        match form.check().finish() {
            Err(errors) => {
                page.message(FORM_REJECTED).errors(errors);
                prefill = Some(form.prefill());
            }
            Ok(()) => {
                let username = ctx.session().text(USERNAME);
                let id = ctx
                    .table(Table::Inquiries)
                    .insert(&form.record(today(), username))?;
                ctx.log().info(format_args!("inquiry {id} received"));
                page.message(
                    "Inquiry form successfully sent. We will be in touch as soon as we can!",
                );
            }
        }
    }

    let prefill = prefill.unwrap_or_else(|| {
        let session = ctx.session();
        record([
            ("firstname", session.text("firstname").into()),
            ("surname", session.text("surname").into()),
            ("email", session.text("email").into()),
            ("tel", session.text("phone_num").into()),
        ])
    });
    let token = ctx.issue_form_token();
    page.form("inquiry", Some(token)).record("values", prefill);
    Ok(page)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controllers::fixture::Fixture;
    use crate::storage::RecordExt;
    use crate::web::Request;

    fn filled(fx: &mut Fixture) -> Request {
        fx.submission("/contact/inquiry")
            .with_form("title", "Advertising")
            .with_form("inquiry", "Do you sell advertising space?")
            .with_form("firstname", "Bob")
            .with_form("surname", "Smith")
            .with_form("email", "Bob@Example.com")
            .with_form("tel", "+447222555555")
    }

    #[test]
    fn shows_form_with_token() {
        let mut fx = Fixture::new();
        let page = fx.run(inquiry, Request::get("/contact/inquiry"));
        assert_eq!(page.title, "Website - Inquiry");
        assert_eq!(page.form, Some("inquiry"));
        assert!(page.form_token.is_some());
    }

    #[test]
    fn valid_inquiry_is_stored_pending() {
        let mut fx = Fixture::new();
        let request = filled(&mut fx);
        let page = fx.run(inquiry, request);

        assert!(page.has_message("Inquiry form successfully sent. We will be in touch as soon as we can!"));
        let rows = fx.db.table(Table::Inquiries).find_all(None, None).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].text("status"), Some("Pending"));
        assert_eq!(rows[0].text("email"), Some("bob@example.com"));
        assert_eq!(rows[0].text("phone_num"), Some("+447222555555"));
        assert!(rows[0].text("username").is_none());
    }

    #[test]
    fn logged_in_inquiry_records_username() {
        let mut fx = Fixture::new();
        fx.add_user("bobby", 0, "password123");
        fx.log_in("bobby");
        let request = filled(&mut fx);
        fx.run(inquiry, request);

        let rows = fx.db.table(Table::Inquiries).find_all(None, None).unwrap();
        assert_eq!(rows[0].text("username"), Some("bobby"));
    }

    #[test]
    fn bad_phone_is_reported_and_nothing_stored() {
        let mut fx = Fixture::new();
        let request = filled(&mut fx).with_form("tel", "(+447222)555555");
        let page = fx.run(inquiry, request);

        assert_eq!(page.errors.len(), 1);
        assert_eq!(page.errors[0].to_string(), "Phone number you provided is not a valid format.");
        assert_eq!(page.rows("values")[0].text("tel"), Some("(+447222)555555"));
        assert!(fx.db.table(Table::Inquiries).find_all(None, None).unwrap().is_empty());
    }

    #[test]
    fn submission_without_token_is_ignored() {
        let mut fx = Fixture::new();
        let request = Request::post("/contact/inquiry")
            .with_form("submit", "Submit")
            .with_form("title", "Advertising");
        let page = fx.run(inquiry, request);
        assert!(page.errors.is_empty());
        assert!(fx.db.table(Table::Inquiries).find_all(None, None).unwrap().is_empty());
    }
}
