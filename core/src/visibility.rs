use std::collections::HashSet;

/// Keys of the nodes and pods whose children are currently shown.
///
/// Kept apart from the snapshot so rebuilding the tree on every refresh never
/// loses or desynchronizes expand/collapse state. Keys of entities that have
/// since vanished simply linger until they reappear or the set is reset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisibilityState {
    expanded: HashSet<String>,
}

impl VisibilityState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.expanded.contains(key)
    }

    /// Flip membership of `key`. Returns whether the key is now expanded.
    pub fn toggle(&mut self, key: &str) -> bool {
        if self.expanded.remove(key) {
            false
        } else {
            self.expanded.insert(key.to_string());
            true
        }
    }

    /// Collapse everything.
    pub fn reset(&mut self) {
        self.expanded.clear();
    }

    pub fn len(&self) -> usize {
        self.expanded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expanded.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_is_an_involution() {
        let mut state = VisibilityState::new();
        assert!(state.toggle("node/n1"));
        assert!(state.contains("node/n1"));
        assert!(!state.toggle("node/n1"));
        assert!(!state.contains("node/n1"));
        assert!(state.is_empty());
    }

    #[test]
    fn reset_clears_everything() {
        let mut state = VisibilityState::new();
        state.toggle("node/n1");
        state.toggle("pod/n1/default/p1");
        assert_eq!(state.len(), 2);
        state.reset();
        assert!(state.is_empty());
    }
}
