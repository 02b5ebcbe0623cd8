use crate::context::Ctx;
use crate::error::Error;
use crate::storage::{Record, RecordExt, Table};
use crate::web::Page;

use super::public_profile;

const NO_SUCH_AUTHOR: &str = "User or article you searched for does not exist.";

/// Latest articles, newest first, each with its author. With `?id=<uid>`
/// only that author's articles are listed.
pub(super) fn latest(ctx: &mut Ctx<'_>) -> Result<Page, Error> {
    let mut page = super::website_page(ctx, "latest.html", "Website - Latest Articles")?;
    match ctx.query().integer("id") {
        Some(uid) => by_author(ctx, &mut page, uid)?,
        None => everything(ctx, &mut page)?,
    }
    Ok(page)
}

fn by_author(ctx: &Ctx<'_>, page: &mut Page, uid: i64) -> Result<(), Error> {
    let Some(author) = ctx.table(Table::Users).find_by_key(uid)? else {
        page.message(NO_SUCH_AUTHOR);
        return Ok(());
    };
    let articles = ctx.table(Table::Articles).find("uid", uid, None, None)?;
    if articles.is_empty() {
        page.message("There are no articles posted by this author.");
        return Ok(());
    }
    page.message(format!(
        "Articles by {} {}",
        author.display("firstname"),
        author.display("surname")
    ));
    page.record("author", public_profile(author))
        .records("articles", articles);
    Ok(())
}

fn everything(ctx: &Ctx<'_>, page: &mut Page) -> Result<(), Error> {
    let articles = ctx
        .table(Table::Articles)
        .find_all(Some("date"), Some("DESC"))?;
    if articles.is_empty() {
        page.message("There are no articles posted yet.");
        return Ok(());
    }
    let Some(authors) = authors_of(ctx, &articles)? else {
        page.message(NO_SUCH_AUTHOR);
        return Ok(());
    };
    page.records("articles", articles).records("authors", authors);
    Ok(())
}

/// The author of each article, index for index. `None` if any article's
/// author is gone.
pub(super) fn authors_of(ctx: &Ctx<'_>, articles: &[Record]) -> Result<Option<Vec<Record>>, Error> {
    let users = ctx.table(Table::Users);
    let mut authors = Vec::with_capacity(articles.len());
    for article in articles {
        let author = match article.integer("uid") {
            Some(uid) => users.find_by_key(uid)?,
            None => None,
        };
        match author {
            Some(author) => authors.push(public_profile(author)),
            None => {
                ctx.log().warn(format_args!(
                    "article {} has no author",
                    article.display("id")
                ));
                return Ok(None);
            }
        }
    }
    Ok(Some(authors))
}
