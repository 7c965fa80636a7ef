//! Prompt filtering for list and search views

use crate::forest::Forest;
use crate::types::{ParentRef, Prompt};

/// Filter options for listing prompts
#[derive(Debug, Clone, Default)]
pub struct PromptFilter {
    /// Search in name and content
    pub search: Option<String>,

    /// Only favourite prompts
    pub favorites_only: bool,

    /// Only prompts placed directly in this location
    pub folder: Option<ParentRef>,
}

impl PromptFilter {
    /// Create a new empty filter
    pub fn new() -> Self {
        Self::default()
    }

    /// Set search query
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    /// Only favourite prompts
    pub fn favorites_only(mut self) -> Self {
        self.favorites_only = true;
        self
    }

    /// Restrict to one folder (or the top level)
    pub fn in_folder(mut self, folder: ParentRef) -> Self {
        self.folder = Some(folder);
        self
    }

    /// Check if a prompt matches this filter
    pub fn matches(&self, prompt: &Prompt) -> bool {
        if self.favorites_only && !prompt.is_favorite {
            return false;
        }

        if let Some(ref folder) = self.folder {
            if prompt.parent_id != *folder {
                return false;
            }
        }

        if let Some(ref search) = self.search {
            let search_lower = search.to_lowercase();
            if !prompt.name.to_lowercase().contains(&search_lower)
                && !prompt.content.to_lowercase().contains(&search_lower)
            {
                return false;
            }
        }

        true
    }

    /// Matching prompts of a forest in pre-order
    pub fn apply<'a>(&self, forest: &'a Forest) -> Vec<&'a Prompt> {
        forest
            .prompts()
            .into_iter()
            .filter(|prompt| self.matches(prompt))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prompt(name: &str, content: &str) -> Prompt {
        Prompt::new(name, content, ParentRef::Root).unwrap()
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let p = prompt("Cold Email", "Write a short intro");
        assert!(PromptFilter::new().with_search("email").matches(&p));
        assert!(PromptFilter::new().with_search("INTRO").matches(&p));
        assert!(!PromptFilter::new().with_search("tweet").matches(&p));
    }

    #[test]
    fn test_favorites_only() {
        let p = prompt("A", "a");
        assert!(!PromptFilter::new().favorites_only().matches(&p));
        assert!(PromptFilter::new()
            .favorites_only()
            .matches(&p.with_favorite(true)));
    }

    #[test]
    fn test_folder_restriction() {
        let mut p = prompt("A", "a");
        p.parent_id = ParentRef::folder("f1");
        assert!(PromptFilter::new()
            .in_folder(ParentRef::folder("f1"))
            .matches(&p));
        assert!(!PromptFilter::new().in_folder(ParentRef::Root).matches(&p));
    }
}
