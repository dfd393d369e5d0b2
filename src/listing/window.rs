//! Compact page navigation strip.

/// Maximum number of page links shown before the strip collapses into a
/// windowed form with ellipsis gaps.
const MAX_VISIBLE_PAGES: u32 = 5;

/// One element of the navigation strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageLink {
    Page(u32),
    /// Gap between the first page and the window.
    StartEllipsis,
    /// Gap between the window and the last page.
    EndEllipsis,
}

/// Build the strip of page links for `current_page` out of `total_pages`.
///
/// Small paginations list every page. Larger ones always anchor the first
/// and last page, keep a window of up to three pages around the current
/// one, and collapse the gaps into ellipses. The first and last pages are
/// never duplicated by the window.
pub fn page_window(total_pages: u32, current_page: u32) -> Vec<PageLink> {
    let total = total_pages.max(1);
    if total <= MAX_VISIBLE_PAGES {
        return (1..=total).map(PageLink::Page).collect();
    }

    let current = current_page.clamp(1, total);
    let mut links = vec![PageLink::Page(1)];

    if current > 3 {
        links.push(PageLink::StartEllipsis);
    }

    let window_start = current.saturating_sub(1).max(2);
    let window_end = (current + 1).min(total - 1);
    for page in window_start..=window_end {
        links.push(PageLink::Page(page));
    }

    if current < total - 2 {
        links.push(PageLink::EndEllipsis);
    }

    links.push(PageLink::Page(total));
    links
}
