//! Fixed-size pagination of ordered collections.

use std::num::NonZeroUsize;

use serde::Serialize;

/// Posts shown per feed page.
pub const POSTS_PER_PAGE: NonZeroUsize = match NonZeroUsize::new(10) {
    Some(size) => size,
    None => panic!("page size must be positive"),
};

/// One page of an ordered collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based number of the page actually served.
    pub number: usize,
    pub num_pages: usize,
    /// Total number of items across all pages.
    pub count: usize,
    pub has_previous: bool,
    pub has_next: bool,
    pub previous_page_number: Option<usize>,
    pub next_page_number: Option<usize>,
}

impl<T> Page<T> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Parse a raw `?page=` value. Anything that is not an integer is `None`.
pub fn parse_page_number(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|value| value.trim().parse::<i64>().ok())
}

/// The page number actually served for a parsed request over `num_pages`.
///
/// Missing numbers serve page 1. Numbers past the end, or below 1, serve the
/// last page.
pub fn clamp_page_number(requested: Option<i64>, num_pages: usize) -> usize {
    let num_pages = num_pages.max(1);
    match requested {
        None => 1,
        Some(n) if n < 1 => num_pages,
        Some(n) => usize::try_from(n).map_or(num_pages, |n| n.min(num_pages)),
    }
}

/// Split `items` into pages of `page_size` and return the requested one.
///
/// Missing or non-numeric page numbers serve page 1. Numbers past the end, or
/// below 1, serve the last page. An empty collection has a single empty page.
pub fn paginate<T>(items: Vec<T>, page_size: NonZeroUsize, page_number: Option<&str>) -> Page<T> {
    let count = items.len();
    let size = page_size.get();
    let num_pages = count.div_ceil(size).max(1);

    let number = clamp_page_number(parse_page_number(page_number), num_pages);

    let start = (number - 1) * size;
    let items: Vec<T> = items.into_iter().skip(start).take(size).collect();

    Page {
        items,
        number,
        num_pages,
        count,
        has_previous: number > 1,
        has_next: number < num_pages,
        previous_page_number: (number > 1).then(|| number - 1),
        next_page_number: (number < num_pages).then(|| number + 1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn size(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    #[test]
    fn test_pages_cover_every_item_exactly_once() {
        for page_size in 1..=7 {
            for total in 0..=35 {
                let items: Vec<usize> = (0..total).collect();
                let first = paginate(items.clone(), size(page_size), None);
                let expected_pages = total.div_ceil(page_size).max(1);
                assert_eq!(first.num_pages, expected_pages);

                let mut seen = Vec::new();
                for number in 1..=first.num_pages {
                    let raw = number.to_string();
                    let page = paginate(items.clone(), size(page_size), Some(&raw));
                    assert_eq!(page.number, number);
                    assert!(page.len() <= page_size);
                    seen.extend(page.items);
                }
                assert_eq!(seen, items);
            }
        }
    }

    #[test]
    fn test_default_page_is_first() {
        let page = paginate((0..13).collect::<Vec<i32>>(), POSTS_PER_PAGE, None);
        assert_eq!(page.number, 1);
        assert_eq!(page.len(), 10);
        assert_eq!(page.count, 13);
        assert!(!page.has_previous);
        assert!(page.has_next);
        assert_eq!(page.next_page_number, Some(2));
    }

    #[test]
    fn test_second_page_holds_the_rest() {
        let page = paginate((0..13).collect::<Vec<_>>(), POSTS_PER_PAGE, Some("2"));
        assert_eq!(page.items, vec![10, 11, 12]);
        assert!(page.has_previous);
        assert!(!page.has_next);
    }

    #[test]
    fn test_non_numeric_page_falls_back_to_first() {
        for raw in ["abc", "", "2.0", "1e3"] {
            let page = paginate((0..25).collect::<Vec<_>>(), POSTS_PER_PAGE, Some(raw));
            assert_eq!(page.number, 1, "raw page {:?}", raw);
        }
    }

    #[test]
    fn test_out_of_range_page_serves_last_page() {
        for raw in ["3", "99", "0", "-4"] {
            let page = paginate((0..25).collect::<Vec<_>>(), POSTS_PER_PAGE, Some(raw));
            assert_eq!(page.number, 3, "raw page {:?}", raw);
            assert_eq!(page.items, vec![20, 21, 22, 23, 24]);
        }
    }

    #[test]
    fn test_whitespace_around_page_number_is_ignored() {
        let page = paginate((0..25).collect::<Vec<_>>(), POSTS_PER_PAGE, Some(" 2 "));
        assert_eq!(page.number, 2);
    }

    #[test]
    fn test_empty_collection_has_one_empty_page() {
        let page = paginate(Vec::<u8>::new(), POSTS_PER_PAGE, Some("5"));
        assert_eq!(page.number, 1);
        assert_eq!(page.num_pages, 1);
        assert!(page.is_empty());
        assert!(!page.has_next);
        assert!(!page.has_previous);
    }

    #[test]
    fn test_clamp_matches_served_page() {
        assert_eq!(clamp_page_number(None, 3), 1);
        assert_eq!(clamp_page_number(Some(2), 3), 2);
        assert_eq!(clamp_page_number(Some(1000), 3), 3);
        assert_eq!(clamp_page_number(Some(-1), 3), 3);
        assert_eq!(clamp_page_number(Some(7), 0), 1);
    }
}
