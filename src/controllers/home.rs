use crate::context::Ctx;
use crate::error::Error;
use crate::web::Page;

/// Landing page; also served for every path that does not resolve.
pub(super) fn index(ctx: &mut Ctx<'_>) -> Result<Page, Error> {
    super::website_page(ctx, "index.html", "Website - Home")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UploadConfig;
    use crate::password::PasswordHasher;
    use crate::session::SessionContext;
    use crate::storage::Database;
    use crate::web::{DirectoryUploads, Request};

    #[test]
    fn home_page_has_site_navigation() {
        let db = Database::open_in_memory().unwrap();
        let uploads = DirectoryUploads::new(&UploadConfig::default());
        let request = Request::get("/");
        let mut session = SessionContext::new();
        let mut ctx = Ctx::new(&request, &mut session, &db, &uploads, PasswordHasher::with_cost(4));

        let page = index(&mut ctx).unwrap();
        assert_eq!(page.template, "index.html");
        assert_eq!(page.title, "Website - Home");
        assert_eq!(page.nav[0].href, "/");
        assert!(page.messages.is_empty());
    }
}
