//! Page arithmetic for question listings (100 records per page)

/// Records per listing page
pub const PAGE_SIZE: i64 = 100;

/// Page window derived from a result count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// Current page number (1-indexed)
    pub page: i64,
    /// Total number of pages; zero for an empty result
    pub total_pages: i64,
    /// Records to skip before this page
    pub offset: i64,
}

impl Pagination {
    /// Window for `requested_page` over `total_results` records
    ///
    /// Out-of-range pages are clamped to the first or last page.
    ///
    /// ```
    /// use arithq_server::pagination::Pagination;
    ///
    /// let p = Pagination::new(250, 2);
    /// assert_eq!((p.page, p.total_pages, p.offset), (2, 3, 100));
    ///
    /// let p = Pagination::new(250, 99);
    /// assert_eq!((p.page, p.offset), (3, 200));
    /// ```
    pub fn new(total_results: i64, requested_page: i64) -> Self {
        let total_results = total_results.max(0);
        let total_pages = total_results / PAGE_SIZE + i64::from(total_results % PAGE_SIZE != 0);
        let last_page = total_pages.max(1);
        let page = requested_page.clamp(1, last_page);

        Self {
            page,
            total_pages,
            offset: (page - 1) * PAGE_SIZE,
        }
    }

    /// Maximum records on this page
    pub fn limit(&self) -> i64 {
        PAGE_SIZE
    }
}
