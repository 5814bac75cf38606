/// Back-navigable cursor stack for the job feed. Cursors are opaque tokens
/// issued by the backend; `None` means the first page. The controller never
/// fabricates a cursor.
#[derive(Debug, Clone, Default)]
pub struct Paginator {
    current: Option<String>,
    history: Vec<Option<String>>,
}

impl Paginator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn can_retreat(&self) -> bool {
        !self.history.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.history.len()
    }

    /// Pushes the cursor being left (even the first-page `None`) and
    /// activates `next`. No-op when the feed reported no further page.
    /// Returns whether the cursor actually moved.
    pub fn advance(&mut self, next: Option<String>, has_next: bool) -> bool {
        let Some(next) = next else { return false };
        if !has_next {
            return false;
        }
        self.history.push(self.current.take());
        self.current = Some(next);
        true
    }

    /// Pops the most recent history entry and activates it. Returns false
    /// when there is no history to go back to.
    pub fn retreat(&mut self) -> bool {
        match self.history.pop() {
            Some(previous) => {
                self.current = previous;
                true
            }
            None => false,
        }
    }

    /// Pagination state is scoped to one filter configuration; a filter
    /// change drops everything.
    pub fn reset(&mut self) {
        self.current = None;
        self.history.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_pushes_the_cursor_being_left() {
        let mut paginator = Paginator::new();
        assert!(paginator.advance(Some("abc".to_string()), true));
        assert_eq!(paginator.current(), Some("abc"));
        assert_eq!(paginator.depth(), 1);

        assert!(paginator.retreat());
        assert_eq!(paginator.current(), None);
        assert_eq!(paginator.depth(), 0);
    }

    #[test]
    fn advance_is_noop_without_next_page() {
        let mut paginator = Paginator::new();
        assert!(!paginator.advance(None, true));
        assert!(!paginator.advance(Some("abc".to_string()), false));
        assert_eq!(paginator.current(), None);
        assert!(!paginator.can_retreat());
    }

    #[test]
    fn retreat_is_disabled_on_empty_history() {
        let mut paginator = Paginator::new();
        assert!(!paginator.retreat());
        assert_eq!(paginator.current(), None);
    }

    #[test]
    fn retreat_restores_cursor_before_each_advance() {
        let mut paginator = Paginator::new();
        let pages = ["p1", "p2", "p3", "p4"];
        for page in pages {
            paginator.advance(Some(page.to_string()), true);
        }
        assert_eq!(paginator.current(), Some("p4"));

        // Walking back pops in strict LIFO order.
        for expected in ["p3", "p2", "p1"] {
            assert!(paginator.retreat());
            assert_eq!(paginator.current(), Some(expected));
        }
        assert!(paginator.retreat());
        assert_eq!(paginator.current(), None);
        assert!(!paginator.retreat());
    }

    #[test]
    fn reset_clears_cursor_and_history() {
        let mut paginator = Paginator::new();
        paginator.advance(Some("abc".to_string()), true);
        paginator.advance(Some("def".to_string()), true);
        paginator.reset();
        assert_eq!(paginator.current(), None);
        assert!(!paginator.can_retreat());
    }
}
