use diesel::PgConnection;

use crate::db::models::post::Post;
use crate::db::repositories::post_repository::PostRepository;
use crate::error::AppError;

pub const DEFAULT_PAGE_SIZE: i64 = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub total: i64,
    pub total_pages: i64,
    pub page: i64,
}

/// `ceil(total / page_size)`, with an empty listing counting as one page.
pub fn total_pages(total: i64, page_size: i64) -> i64 {
    if total <= 0 {
        1
    } else {
        (total - 1) / page_size + 1
    }
}

pub fn validate_page_number(page: i64) -> Result<(), AppError> {
    if page < 1 {
        return Err(AppError::bad_request(
            "Page number must be greater than or equal to 1",
        ));
    }
    Ok(())
}

/// Page 1 is always valid, even for an empty listing.
pub fn check_page_bounds(page: i64, total_pages: i64) -> Result<(), AppError> {
    if page > 1 && page > total_pages {
        return Err(AppError::page_out_of_range(format!(
            "Page number exceeds available pages ({total_pages})"
        )));
    }
    Ok(())
}

/// Offset-based listing of all posts, newest first, optionally restricted to
/// titles containing `search` (case-insensitive).
pub fn list(
    conn: &mut PgConnection,
    page: i64,
    page_size: i64,
    search: Option<&str>,
) -> Result<Page<Post>, AppError> {
    validate_page_number(page)?;
    let search = search.filter(|s| !s.is_empty());

    let total = PostRepository::count_matching(conn, search)?;
    let total_pages = total_pages(total, page_size);
    check_page_bounds(page, total_pages)?;

    let data = PostRepository::list_page(conn, search, (page - 1) * page_size, page_size)?;

    Ok(Page {
        data,
        total,
        total_pages,
        page,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connection::test_pool;
    use crate::db::models::post::NewPost;
    use crate::db::repositories::user_repository::{UserRepository, tests::new_test_user};

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(total_pages(1, 3), 1);
        assert_eq!(total_pages(3, 3), 1);
        assert_eq!(total_pages(4, 3), 2);
        assert_eq!(total_pages(9, 3), 3);
    }

    #[test]
    fn empty_listing_has_one_page() {
        assert_eq!(total_pages(0, 3), 1);
    }

    #[test]
    fn page_zero_is_bad_request() {
        assert!(matches!(validate_page_number(0), Err(AppError::BadRequest(_))));
        assert!(matches!(validate_page_number(-3), Err(AppError::BadRequest(_))));
        assert!(validate_page_number(1).is_ok());
    }

    #[test]
    fn page_beyond_last_is_out_of_range() {
        assert!(matches!(
            check_page_bounds(2, 1),
            Err(AppError::PageOutOfRange(_))
        ));
        assert!(check_page_bounds(1, 1).is_ok());
        assert!(check_page_bounds(2, 2).is_ok());
    }

    #[test]
    #[ignore = "requires DATABASE_URL"]
    fn list_pages_through_search_results() {
        let pool = test_pool();
        let mut conn = pool.get().unwrap();
        let user = UserRepository::create(&mut conn, &new_test_user("pages")).unwrap();
        let tag = uuid::Uuid::new_v4().simple().to_string();

        let mut ids = Vec::new();
        for i in 0..4 {
            let post = PostRepository::create(
                &mut conn,
                &NewPost {
                    title: format!("{tag} #{i}"),
                    content: "body".to_string(),
                    user_id: user.id,
                    image: None,
                },
            )
            .unwrap();
            ids.push(post.id);
        }

        let first = list(&mut conn, 1, 3, Some(&tag.to_uppercase())).unwrap();
        assert_eq!(first.total, 4);
        assert_eq!(first.total_pages, 2);
        assert_eq!(
            first.data.iter().map(|p| p.id).collect::<Vec<_>>(),
            vec![ids[3], ids[2], ids[1]]
        );

        let second = list(&mut conn, 2, 3, Some(&tag)).unwrap();
        assert_eq!(second.data.len(), 1);
        assert_eq!(second.data[0].id, ids[0]);

        assert!(matches!(
            list(&mut conn, 3, 3, Some(&tag)),
            Err(AppError::PageOutOfRange(_))
        ));
    }

    #[test]
    #[ignore = "requires DATABASE_URL"]
    fn empty_search_result_still_serves_page_one() {
        let pool = test_pool();
        let mut conn = pool.get().unwrap();
        let term = format!("no-such-title-{}", uuid::Uuid::new_v4().simple());

        let page = list(&mut conn, 1, 3, Some(&term)).unwrap();
        assert!(page.data.is_empty());
        assert_eq!(page.total, 0);
        assert_eq!(page.total_pages, 1);

        assert!(matches!(
            list(&mut conn, 2, 3, Some(&term)),
            Err(AppError::PageOutOfRange(_))
        ));
    }
}
