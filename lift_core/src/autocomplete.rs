//! Keyboard-navigable suggestion list for the exercise search box.

use crate::types::{Catalog, Exercise};

/// Keys the suggestion list reacts to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    Up,
    Down,
    Enter,
    Escape,
}

/// Suggestions for the current search term plus the highlighted row
#[derive(Clone, Debug, Default)]
pub struct Autocomplete {
    suggestions: Vec<Exercise>,
    highlighted: Option<usize>,
}

impl Autocomplete {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recompute suggestions for `query`; an empty query hides the list
    pub fn update(&mut self, query: &str, catalog: &Catalog) {
        self.suggestions = catalog.search(query).into_iter().cloned().collect();
        self.highlighted = None;
    }

    pub fn suggestions(&self) -> &[Exercise] {
        &self.suggestions
    }

    pub fn highlighted(&self) -> Option<usize> {
        self.highlighted
    }

    pub fn is_visible(&self) -> bool {
        !self.suggestions.is_empty()
    }

    /// Hide the list without choosing anything
    pub fn dismiss(&mut self) {
        self.suggestions.clear();
        self.highlighted = None;
    }

    /// Handle a key press. Returns the chosen exercise on Enter.
    ///
    /// Up/Down clamp at the ends of the list. Enter with nothing highlighted
    /// picks the only suggestion when there is exactly one.
    pub fn handle_key(&mut self, key: Key) -> Option<Exercise> {
        if !self.is_visible() {
            return None;
        }

        let last = self.suggestions.len() - 1;
        match key {
            Key::Down => {
                self.highlighted = Some(match self.highlighted {
                    None => 0,
                    Some(i) => (i + 1).min(last),
                });
                None
            }
            Key::Up => {
                self.highlighted = match self.highlighted {
                    None | Some(0) => Some(0),
                    Some(i) => Some(i - 1),
                };
                None
            }
            Key::Enter => {
                let index = match self.highlighted {
                    Some(i) => i,
                    None if self.suggestions.len() == 1 => 0,
                    None => return None,
                };
                let chosen = self.suggestions.get(index).cloned();
                self.dismiss();
                chosen
            }
            Key::Escape => {
                self.dismiss();
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::get_default_catalog;

    fn with_query(query: &str) -> Autocomplete {
        let mut ac = Autocomplete::new();
        ac.update(query, get_default_catalog());
        ac
    }

    #[test]
    fn test_empty_query_hidden() {
        let ac = with_query("");
        assert!(!ac.is_visible());
        assert_eq!(ac.highlighted(), None);
    }

    #[test]
    fn test_arrow_navigation_clamps() {
        let mut ac = with_query("supino");
        assert_eq!(ac.suggestions().len(), 2);

        ac.handle_key(Key::Down);
        assert_eq!(ac.highlighted(), Some(0));
        ac.handle_key(Key::Down);
        ac.handle_key(Key::Down);
        assert_eq!(ac.highlighted(), Some(1));
        ac.handle_key(Key::Up);
        ac.handle_key(Key::Up);
        assert_eq!(ac.highlighted(), Some(0));
    }

    #[test]
    fn test_enter_selects_highlighted_and_hides() {
        let mut ac = with_query("supino");
        ac.handle_key(Key::Down);
        ac.handle_key(Key::Down);
        let chosen = ac.handle_key(Key::Enter).unwrap();
        assert_eq!(chosen.name, "Supino Inclinado com Halteres");
        assert!(!ac.is_visible());
    }

    #[test]
    fn test_enter_without_highlight() {
        let mut ambiguous = with_query("supino");
        assert!(ambiguous.handle_key(Key::Enter).is_none());
        assert!(ambiguous.is_visible());

        let mut single = with_query("terra");
        assert_eq!(single.handle_key(Key::Enter).unwrap().id, "7");
    }

    #[test]
    fn test_escape_dismisses() {
        let mut ac = with_query("rosca");
        ac.handle_key(Key::Down);
        assert!(ac.handle_key(Key::Escape).is_none());
        assert!(!ac.is_visible());
        assert_eq!(ac.highlighted(), None);
    }

    #[test]
    fn test_new_query_resets_highlight() {
        let mut ac = with_query("supino");
        ac.handle_key(Key::Down);
        ac.update("sup", get_default_catalog());
        assert_eq!(ac.highlighted(), None);
    }
}
