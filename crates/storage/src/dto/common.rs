use uuid::Uuid;

/// Keyset page over rows ordered by their UUID key.
///
/// Passes walk large tables page by page instead of loading a league's whole
/// history at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub after: Option<Uuid>,
    pub limit: i64,
}

impl PageRequest {
    pub fn first(limit: i64) -> Self {
        Self {
            after: None,
            limit: limit.max(1),
        }
    }

    /// The page following one whose last key was `last`.
    pub fn next(self, last: Uuid) -> Self {
        Self {
            after: Some(last),
            ..self
        }
    }

    /// A short page means the walk is complete.
    pub fn is_last(&self, fetched: usize) -> bool {
        (fetched as i64) < self.limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_page_clamps_limit() {
        assert_eq!(PageRequest::first(0).limit, 1);
        assert_eq!(PageRequest::first(250).limit, 250);
    }

    #[test]
    fn test_next_page_keeps_limit() {
        let last = Uuid::new_v4();
        let page = PageRequest::first(10).next(last);
        assert_eq!(page.after, Some(last));
        assert_eq!(page.limit, 10);
        assert!(page.is_last(9));
        assert!(!page.is_last(10));
    }
}
