use crate::context::Ctx;
use crate::error::Error;
use crate::forms::CommentForm;
use crate::session::USERNAME;
use crate::storage::{record, Record, Table};
use crate::web::Page;

use super::{accepts_form, timestamp, FORM_REJECTED};

/// Articles in a category (`?id=`), or one article (`?article=`) with its
/// comments and the comment form when `comments=show`.
pub(super) fn filter(ctx: &mut Ctx<'_>) -> Result<Page, Error> {
    let mut page = super::website_page(ctx, "category.html", "Website- Category")?;
    let query = ctx.query();
    let articles_table = ctx.table(Table::Articles);

    let (articles, single) = if let Some(category) = query.integer("id") {
        (articles_table.find("categoryId", category, None, None)?, None)
    } else if let Some(article) = query.integer("article") {
        (articles_table.find("id", article, None, None)?, Some(article))
    } else {
        (Vec::new(), None)
    };

    if articles.is_empty() {
        page.message("Article not found.");
        return Ok(page);
    }
    let Some(authors) = super::article::authors_of(ctx, &articles)? else {
        page.message("User not found.");
        return Ok(page);
    };
    page.records("articles", articles).records("authors", authors);

    if let Some(article_id) = single.filter(|_| query.get("comments") == Some("show")) {
        comments(ctx, &mut page, article_id)?;
    }
    Ok(page)
}

fn comments(ctx: &mut Ctx<'_>, page: &mut Page, article_id: i64) -> Result<(), Error> {
    let comments = ctx.table(Table::Comments);
    let mut prefill = None;

    if accepts_form(ctx) {
        let form = CommentForm::from_params(ctx.form());
        match form.check().finish() {
            Err(errors) => {
                page.message(FORM_REJECTED).errors(errors);
                prefill = Some(form.prefill());
            }
            Ok(()) => {
                let username = ctx.session().text(USERNAME);
                comments.insert(&form.record(article_id, timestamp(), username))?;
                ctx.log()
                    .info(format_args!("comment added to article {article_id}"));
            }
        }
    }

    let token = ctx.issue_form_token();
    page.form("comment", Some(token))
        .record("values", prefill.unwrap_or_else(|| session_prefill(ctx)))
        .records(
            "comments",
            comments.find("articleId", article_id, Some("date"), Some("DESC"))?,
        );
    Ok(())
}

/// Name and email from the logged-in profile, so members need not retype them.
fn session_prefill(ctx: &Ctx<'_>) -> Record {
    let session = ctx.session();
    record([
        ("firstname", session.text("firstname").into()),
        ("surname", session.text("surname").into()),
        ("email", session.text("email").into()),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controllers::fixture::Fixture;
    use crate::storage::RecordExt;
    use crate::web::Request;

    fn seeded() -> (Fixture, i64, i64) {
        let fx = Fixture::new();
        let uid = fx.add_user("ann", 1, "password123");
        let cat = fx.add_category("Sport");
        let article = fx.add_article("Match Report", cat, uid, Some("/images/upload/a.png"));
        (fx, cat, article)
    }

    #[test]
    fn category_lists_its_articles() {
        let (mut fx, cat, _) = seeded();
        let page = fx.run(filter, Request::get(format!("/category/filter?id={cat}")));
        assert_eq!(page.title, "Website- Category");
        assert_eq!(page.rows("articles").len(), 1);
        assert_eq!(page.form, None);
    }

    #[test]
    fn unknown_or_missing_ids_report_not_found() {
        let (mut fx, _, _) = seeded();
        for uri in ["/category/filter?id=77", "/category/filter?article=x", "/category/filter"] {
            let page = fx.run(filter, Request::get(uri));
            assert!(page.has_message("Article not found."), "{uri}");
        }
    }

    #[test]
    fn comments_are_shown_with_a_form() {
        let (mut fx, _, article) = seeded();
        let page = fx.run(filter, Request::get(format!("/category/filter?article={article}&comments=show")));
        assert_eq!(page.form, Some("comment"));
        assert!(page.form_token.is_some());
        assert!(page.rows("comments").is_empty());
    }

    #[test]
    fn valid_comment_is_stored_and_listed() {
        let (mut fx, _, article) = seeded();
        let request = fx
            .submission(&format!("/category/filter?article={article}&comments=show"))
            .with_form("firstname", "Bob")
            .with_form("surname", "Smith")
            .with_form("email", "BOB@example.com")
            .with_form("text", "Great match, well played.");
        let page = fx.run(filter, request);

        assert!(page.errors.is_empty());
        let comments = page.rows("comments");
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].text("email"), Some("bob@example.com"));
        assert_eq!(comments[0].integer("articleId"), Some(article));
    }

    #[test]
    fn invalid_comment_is_rejected_and_echoed() {
        let (mut fx, _, article) = seeded();
        let request = fx
            .submission(&format!("/category/filter?article={article}&comments=show"))
            .with_form("firstname", "Bob")
            .with_form("surname", "Smith")
            .with_form("email", "bob@example.com")
            .with_form("text", "Too short");
        let page = fx.run(filter, request);

        assert!(page.has_message(FORM_REJECTED));
        assert_eq!(page.errors[0].to_string(), "Message must be between 10 and 5000 characters.");
        assert_eq!(page.rows("values")[0].text("text"), Some("Too short"));
        assert!(page.rows("comments").is_empty());
    }

    #[test]
    fn replayed_comment_is_ignored() {
        let (mut fx, _, article) = seeded();
        let uri = format!("/category/filter?article={article}&comments=show");
        let request = fx
            .submission(&uri)
            .with_form("firstname", "Bob")
            .with_form("surname", "Smith")
            .with_form("email", "bob@example.com")
            .with_form("text", "Great match, well played.");
        fx.run(filter, request.clone());
        let page = fx.run(filter, request);
        assert_eq!(page.rows("comments").len(), 1);
    }
}
