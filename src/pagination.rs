//! Page-window arithmetic shared by the index list (client-side paging) and
//! the transcript segment view (server-side paging).
//!
//! Pages are 1-indexed. `total_pages == 0` means "nothing to page", in which
//! case the cursor sits at 1 and every navigation request is refused.

/// Requested cursor movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageNav {
  Prev,
  Next,
  Jump(usize),
}

/// Number of pages needed for `count` items. Zero items (or a zero page size) means zero pages.
pub fn total_pages(count: usize, page_size: usize) -> usize {
  if page_size == 0 { 0 } else { count.div_ceil(page_size) }
}

/// Clamp `page` into `[1, max(total, 1)]`.
pub fn clamp_page(page: usize, total: usize) -> usize {
  page.min(total.max(1)).max(1)
}

/// The slice of `items` shown on `page`. Out-of-range pages yield an empty slice.
pub fn window_for<T>(items: &[T], page_size: usize, page: usize) -> &[T] {
  if page == 0 || page_size == 0 {
    return &[];
  }
  let start = (page - 1).saturating_mul(page_size);
  if start >= items.len() {
    return &[];
  }
  let end = start.saturating_add(page_size).min(items.len());
  &items[start..end]
}

/// A page cursor plus the page count it's valid against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pager {
  page: usize,
  total: usize,
}

impl Default for Pager {
  fn default() -> Self {
    Self { page: 1, total: 0 }
  }
}

impl Pager {
  pub fn page(&self) -> usize {
    self.page
  }

  pub fn total_pages(&self) -> usize {
    self.total
  }

  /// Whether prev/next controls should be shown at all.
  pub fn is_active(&self) -> bool {
    self.total > 1
  }

  /// Where `nav` would land, or `None` if the move is refused.
  pub fn target(&self, nav: PageNav) -> Option<usize> {
    if self.total <= 1 {
      return None;
    }
    let dest = match nav {
      PageNav::Prev => self.page.checked_sub(1)?,
      PageNav::Next => self.page.checked_add(1)?,
      PageNav::Jump(n) => n,
    };
    (dest >= 1 && dest <= self.total && dest != self.page).then_some(dest)
  }

  /// Apply `nav` in place. Returns whether the cursor moved.
  pub fn go(&mut self, nav: PageNav) -> bool {
    match self.target(nav) {
      Some(dest) => {
        self.page = dest;
        true
      }
      None => false,
    }
  }

  /// Replace both cursor and page count (server-side paging results).
  pub fn set(&mut self, page: usize, total: usize) {
    self.total = total;
    self.page = clamp_page(page, total);
  }

  /// Back to page 1 over the given page count.
  pub fn reset(&mut self, total: usize) {
    self.set(1, total);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn twenty_five_items_in_tens() {
    let items: Vec<usize> = (0..25).collect();
    assert_eq!(total_pages(items.len(), 10), 3);
    assert_eq!(window_for(&items, 10, 1), (0..10).collect::<Vec<_>>().as_slice());
    assert_eq!(window_for(&items, 10, 3), &[20, 21, 22, 23, 24]);
    assert!(window_for(&items, 10, 4).is_empty());
    assert!(window_for(&items, 10, 0).is_empty());
  }

  #[test]
  fn pages_partition_the_collection() {
    for count in 0..40 {
      for size in 1..12 {
        let items: Vec<usize> = (0..count).collect();
        let total = total_pages(count, size);
        let mut seen = Vec::new();
        for page in 1..=total {
          let w = window_for(&items, size, page);
          assert!(!w.is_empty());
          if let Some(&last) = seen.last() {
            assert_eq!(w[0], last + 1, "page {page} not contiguous with the previous one");
          }
          seen.extend_from_slice(w);
        }
        assert_eq!(seen, items, "count={count} size={size}");
      }
    }
  }

  #[test]
  fn zero_items_zero_pages() {
    assert_eq!(total_pages(0, 10), 0);
    assert_eq!(total_pages(5, 0), 0);
    let empty: [u8; 0] = [];
    assert!(window_for(&empty, 10, 1).is_empty());
  }

  #[test]
  fn clamp_page_bounds_and_idempotence() {
    assert_eq!(clamp_page(0, 0), 1);
    assert_eq!(clamp_page(7, 0), 1);
    assert_eq!(clamp_page(0, 3), 1);
    assert_eq!(clamp_page(9, 3), 3);
    for t in 0..6 {
      for p in 0..10 {
        let once = clamp_page(p, t);
        assert_eq!(clamp_page(once, t), once);
      }
    }
  }

  #[test]
  fn pager_refuses_out_of_range_moves() {
    let mut pager = Pager::default();
    pager.reset(3);
    assert!(!pager.go(PageNav::Prev));
    assert!(pager.go(PageNav::Next));
    assert!(pager.go(PageNav::Next));
    assert_eq!(pager.page(), 3);
    assert!(!pager.go(PageNav::Next));
    assert!(!pager.go(PageNav::Jump(4)));
    assert!(!pager.go(PageNav::Jump(0)));
    assert!(pager.go(PageNav::Jump(1)));
    assert_eq!(pager.page(), 1);
  }

  #[test]
  fn pager_is_inert_with_one_page() {
    let mut pager = Pager::default();
    pager.reset(1);
    assert!(!pager.is_active());
    assert_eq!(pager.target(PageNav::Jump(1)), None);
    assert!(!pager.go(PageNav::Next));
  }

  #[test]
  fn shrinking_total_clamps_cursor() {
    let mut pager = Pager::default();
    pager.reset(5);
    pager.go(PageNav::Jump(5));
    pager.set(pager.page(), 2);
    assert_eq!(pager.page(), 2);
    pager.set(pager.page(), 0);
    assert_eq!(pager.page(), 1);
  }
}
