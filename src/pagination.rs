use serde::Serialize;

/// Number of listings per page on the search results view.
pub const DEFAULT_PAGE_SIZE: usize = 18;

/// Computes the page links to render: `Some(n)` is a page, `None` an ellipsis.
fn get_pages(
    total_pages: usize,
    current_page: usize,
    left_edge: usize,
    left_current: usize,
    right_current: usize,
    right_edge: usize,
) -> Vec<Option<usize>> {
    let last_page = total_pages;

    if last_page == 0 {
        return vec![];
    }

    let mut pages = Vec::new();

    let left_end = (1 + left_edge).min(last_page + 1);
    pages.extend((1..left_end).map(Some));

    let mid_start = left_end.max(current_page.saturating_sub(left_current));
    let mid_end = (current_page + right_current + 1).min(last_page + 1);

    if mid_start > left_end {
        pages.push(None);
    }
    pages.extend((mid_start..mid_end).map(Some));

    let right_start = mid_end.max(last_page.saturating_sub(right_edge) + 1);

    if right_start > mid_end {
        pages.push(None);
    }
    pages.extend((right_start..=last_page).map(Some));

    pages
}

/// One page of items together with the navigation state around it.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub pages: Vec<Option<usize>>,
    pub page: usize,
    pub total: usize,
    pub total_pages: usize,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, current_page: usize, total: usize, page_size: usize) -> Self {
        let current_page = current_page.max(1);
        let total_pages = if page_size == 0 {
            0
        } else {
            total.div_ceil(page_size)
        };

        let pages = get_pages(total_pages, current_page, 2, 2, 4, 2);

        Self {
            items,
            pages,
            page: current_page,
            total,
            total_pages,
        }
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_scenario_has_three_pages() {
        let paginated = Paginated::new(vec![(); 18], 1, 40, DEFAULT_PAGE_SIZE);

        assert_eq!(paginated.total_pages, 3);
        assert_eq!(paginated.pages, vec![Some(1), Some(2), Some(3)]);
        assert!(!paginated.has_previous());
        assert!(paginated.has_next());
    }

    #[test]
    fn long_ranges_collapse_into_ellipses() {
        let pages = get_pages(30, 15, 2, 2, 4, 2);

        assert_eq!(
            pages,
            vec![
                Some(1),
                Some(2),
                None,
                Some(13),
                Some(14),
                Some(15),
                Some(16),
                Some(17),
                Some(18),
                Some(19),
                None,
                Some(29),
                Some(30),
            ]
        );
    }

    #[test]
    fn empty_result_has_no_pages() {
        let paginated: Paginated<()> = Paginated::new(vec![], 0, 0, DEFAULT_PAGE_SIZE);

        assert!(paginated.pages.is_empty());
        assert_eq!(paginated.page, 1);
        assert!(!paginated.has_next());
    }
}
