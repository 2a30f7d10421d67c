//! Tag-path tracking and the two path predicates used by rule matching.

/// True iff both paths have the same length and equal elements.
///
/// # Examples
/// ```
/// use commerceml_parser::rules::path_equals;
///
/// assert!(path_equals(&["Root", "Item"], &["Root", "Item"]));
/// assert!(!path_equals(&["Root", "Item", "Id"], &["Root", "Item"]));
/// ```
pub fn path_equals<A, B>(a: &[A], b: &[B]) -> bool
where
    A: AsRef<str>,
    B: AsRef<str>,
{
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.as_ref() == y.as_ref())
}

/// True iff `prefix` matches the leading elements of `current`.
///
/// # Examples
/// ```
/// use commerceml_parser::rules::path_starts_with;
///
/// assert!(path_starts_with(&["Root", "Item", "Id"], &["Root", "Item"]));
/// assert!(path_starts_with(&["Root"], &["Root"]));
/// assert!(!path_starts_with(&["Root"], &["Root", "Item"]));
/// ```
pub fn path_starts_with<A, B>(current: &[A], prefix: &[B]) -> bool
where
    A: AsRef<str>,
    B: AsRef<str>,
{
    current.len() >= prefix.len()
        && prefix
            .iter()
            .zip(current)
            .all(|(p, c)| p.as_ref() == c.as_ref())
}

/// Stack of currently open tag names, root first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathTracker {
    path: Vec<String>,
}

impl PathTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter an element.
    pub fn push(&mut self, tag_name: impl Into<String>) {
        self.path.push(tag_name.into());
    }

    /// Leave the innermost element.
    pub fn pop(&mut self) -> Option<String> {
        self.path.pop()
    }

    /// The full path from the document root.
    #[must_use]
    pub fn current(&self) -> &[String] {
        &self.path
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.path.len()
    }

    #[must_use]
    pub fn equals<S: AsRef<str>>(&self, other: &[S]) -> bool {
        path_equals(&self.path, other)
    }

    #[must_use]
    pub fn starts_with<S: AsRef<str>>(&self, prefix: &[S]) -> bool {
        path_starts_with(&self.path, prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_equals_requires_same_length() {
        assert!(path_equals::<&str, &str>(&[], &[]));
        assert!(!path_equals(&["a"], &["a", "b"]));
        assert!(!path_equals(&["a", "c"], &["a", "b"]));
    }

    #[test]
    fn test_same_name_under_different_parent() {
        let group_id = ["Root", "Group", "Id"];
        let item_id = ["Root", "Item", "Id"];
        assert!(!path_equals(&group_id, &item_id));
        assert!(!path_starts_with(&item_id, &["Root", "Group"]));
    }

    #[test]
    fn test_empty_prefix_matches_everything() {
        assert!(path_starts_with::<&str, &str>(&["a", "b"], &[]));
    }

    #[test]
    fn test_tracker_push_pop() {
        let mut tracker = PathTracker::new();
        tracker.push("Root");
        tracker.push("Item");
        assert_eq!(tracker.depth(), 2);
        assert!(tracker.equals(&["Root", "Item"]));
        assert!(tracker.starts_with(&["Root"]));

        assert_eq!(tracker.pop().as_deref(), Some("Item"));
        assert!(tracker.equals(&["Root"]));
        assert_eq!(tracker.current().to_vec(), vec!["Root".to_string()]);
    }
}
