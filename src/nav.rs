//! Page navigation.
//!
//! A closed set of pages and one transition: `show`.  Showing a page hides
//! every other page; showing Dashboard or Results additionally asks the shell
//! to refetch results + metrics for the current tenant.  No history stack, no
//! deep linking.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Dashboard,
    Results,
    Upload,
    Reports,
    Settings,
}

impl Page {
    pub const ALL: [Page; 5] = [
        Page::Dashboard,
        Page::Results,
        Page::Upload,
        Page::Reports,
        Page::Settings,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Page::Dashboard => "Dashboard",
            Page::Results => "Results",
            Page::Upload => "Upload",
            Page::Reports => "Reports",
            Page::Settings => "Settings",
        }
    }
}

/// What the shell must do after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavEffect {
    None,
    /// Refetch results + metrics for the current tenant.
    RefreshData,
}

#[derive(Debug)]
pub struct Navigator {
    current: Page,
}

impl Default for Navigator {
    fn default() -> Self {
        Self {
            current: Page::Dashboard,
        }
    }
}

impl Navigator {
    pub fn current(&self) -> Page {
        self.current
    }

    /// The only transition.  Returns the follow-up effect for the shell.
    pub fn show(&mut self, page: Page) -> NavEffect {
        self.current = page;
        match page {
            Page::Dashboard | Page::Results => NavEffect::RefreshData,
            Page::Upload | Page::Reports | Page::Settings => NavEffect::None,
        }
    }

    /// Cycle to the next/previous page in nav-bar order (TUI tab keys).
    pub fn cycle(&mut self, forward: bool) -> NavEffect {
        let idx = Page::ALL.iter().position(|p| *p == self.current).unwrap_or(0);
        let len = Page::ALL.len();
        let next = if forward {
            (idx + 1) % len
        } else {
            (idx + len - 1) % len
        };
        self.show(Page::ALL[next])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_page_is_dashboard() {
        assert_eq!(Navigator::default().current(), Page::Dashboard);
    }

    #[test]
    fn test_only_dashboard_and_results_refresh() {
        let mut nav = Navigator::default();
        assert_eq!(nav.show(Page::Results), NavEffect::RefreshData);
        assert_eq!(nav.show(Page::Upload), NavEffect::None);
        assert_eq!(nav.show(Page::Reports), NavEffect::None);
        assert_eq!(nav.show(Page::Settings), NavEffect::None);
        assert_eq!(nav.show(Page::Dashboard), NavEffect::RefreshData);
    }

    #[test]
    fn test_show_updates_current() {
        let mut nav = Navigator::default();
        nav.show(Page::Settings);
        assert_eq!(nav.current(), Page::Settings);
    }

    #[test]
    fn test_cycle_wraps_both_directions() {
        let mut nav = Navigator::default();
        nav.cycle(false);
        assert_eq!(nav.current(), Page::Settings);
        nav.cycle(true);
        assert_eq!(nav.current(), Page::Dashboard);
        nav.cycle(true);
        assert_eq!(nav.current(), Page::Results);
    }
}
