use serde::{Deserialize, Serialize};

pub(crate) const fn default_limit() -> i64 {
    10
}

const fn default_page() -> i64 {
    1
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub(crate) struct PageQuery {
    #[serde(default = "default_page")]
    pub(crate) page: i64,
    #[serde(default = "default_limit")]
    pub(crate) limit: i64,
}

impl Default for PageQuery {
    fn default() -> Self {
        Self { page: default_page(), limit: default_limit() }
    }
}

/// Page window after clamping to sane bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Page {
    pub(crate) page: i64,
    pub(crate) limit: i64,
}

impl Page {
    /// `page` is capped so that the offset always fits in an `i64`.
    pub(crate) fn resolve(query: PageQuery, max_limit: i64) -> Self {
        let limit = query.limit.clamp(1, max_limit.max(1));
        Self { page: query.page.clamp(1, i64::MAX / limit), limit }
    }

    pub(crate) fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    pub(crate) fn describe(&self, total_rows: i64) -> Pagination {
        Pagination {
            total_pages: (total_rows + self.limit - 1) / self.limit,
            limit: self.limit,
            current_page: self.page,
            total_rows,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub(crate) struct Pagination {
    pub(crate) total_pages: i64,
    pub(crate) limit: i64,
    pub(crate) current_page: i64,
    pub(crate) total_rows: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_pages_rounds_up() {
        let page = Page::resolve(PageQuery { page: 2, limit: 10 }, 100);
        assert_eq!(page.offset(), 10);
        assert_eq!(
            page.describe(21),
            Pagination { total_pages: 3, limit: 10, current_page: 2, total_rows: 21 }
        );
        assert_eq!(page.describe(0).total_pages, 0);
        assert_eq!(page.describe(20).total_pages, 2);
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let page = Page::resolve(PageQuery { page: 0, limit: 500 }, 100);
        assert_eq!(page, Page { page: 1, limit: 100 });
        assert_eq!(Page::resolve(PageQuery { page: -3, limit: 0 }, 100), Page { page: 1, limit: 1 });
    }

    #[test]
    fn huge_page_keeps_offset_in_range() {
        let page = Page::resolve(PageQuery { page: i64::MAX, limit: 10 }, 100);
        assert_eq!(page.page, i64::MAX / 10);
        assert_eq!(page.offset(), (i64::MAX / 10 - 1) * 10);
        assert!(page.offset() >= 0);

        let single = Page::resolve(PageQuery { page: i64::MAX, limit: 1 }, 100);
        assert_eq!(single.offset(), i64::MAX - 1);
    }
}
