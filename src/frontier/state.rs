//! Dispatch cursor over the seed list and the unprocessed pool

use crate::frontier::FrontierError;
use std::collections::HashSet;

/// Everything `next_link` reads or advances, guarded by one lock
#[derive(Debug, Default)]
pub(crate) struct DispatchState {
    seeds: Vec<String>,
    pool: Vec<String>,
    pool_members: HashSet<String>,
    /// Seed index while seeding; `seeds.len() + pool index` afterwards
    cursor: usize,
    seed_exhausted: bool,
}

impl DispatchState {
    pub(crate) fn new(seeds: Vec<String>) -> Self {
        Self {
            seeds,
            ..Default::default()
        }
    }

    /// Returns the link under the cursor and advances past it
    pub(crate) fn advance(&mut self) -> Result<Option<String>, FrontierError> {
        if !self.seed_exhausted {
            if let Some(link) = self.seeds.get(self.cursor) {
                let link = link.clone();
                self.cursor += 1;
                return Ok(Some(link));
            }
            self.seed_exhausted = true;
            tracing::info!(
                "Seed list exhausted after {} links, switching to discovered links",
                self.seeds.len()
            );
        }

        let index = match self.cursor.checked_sub(self.seeds.len()) {
            Some(index) => index,
            None => return Err(self.desync()),
        };

        if index < self.pool.len() {
            let link = self.pool[index].clone();
            self.cursor += 1;
            Ok(Some(link))
        } else if index == self.pool.len() {
            Ok(None)
        } else {
            Err(self.desync())
        }
    }

    fn desync(&self) -> FrontierError {
        FrontierError::CursorDesync {
            cursor: self.cursor,
            seeds: self.seeds.len(),
            pool: self.pool.len(),
        }
    }

    /// Appends links not already in the pool; returns how many were added
    pub(crate) fn append<I>(&mut self, urls: I) -> usize
    where
        I: IntoIterator<Item = String>,
    {
        let mut added = 0;
        for url in urls {
            if self.pool_members.insert(url.clone()) {
                self.pool.push(url);
                added += 1;
            }
        }
        added
    }

    pub(crate) fn undispatched_pool(&self) -> Vec<String> {
        let start = if self.seed_exhausted {
            self.cursor.saturating_sub(self.seeds.len()).min(self.pool.len())
        } else {
            0
        };
        self.pool[start..].to_vec()
    }

    pub(crate) fn seed_exhausted(&self) -> bool {
        self.seed_exhausted
    }

    pub(crate) fn seed_len(&self) -> usize {
        self.seeds.len()
    }

    pub(crate) fn pool_len(&self) -> usize {
        self.pool.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_seed_list_starts_in_pool() {
        let mut state = DispatchState::new(Vec::new());
        assert_eq!(state.advance().unwrap(), None);
        assert!(state.seed_exhausted());

        state.append(vec!["a".to_string()]);
        assert_eq!(state.advance().unwrap(), Some("a".to_string()));
        assert_eq!(state.advance().unwrap(), None);
    }

    #[test]
    fn test_cursor_past_pool_is_desync() {
        let mut state = DispatchState::new(vec!["s".to_string()]);
        state.seed_exhausted = true;
        state.cursor = 3;

        assert_eq!(
            state.advance().unwrap_err(),
            FrontierError::CursorDesync {
                cursor: 3,
                seeds: 1,
                pool: 0
            }
        );
    }

    #[test]
    fn test_cursor_behind_seed_list_is_desync() {
        let mut state = DispatchState::new(vec!["s1".to_string(), "s2".to_string()]);
        state.seed_exhausted = true;
        state.cursor = 1;

        assert!(state.advance().is_err());
    }

    #[test]
    fn test_append_keeps_first_occurrence_order() {
        let mut state = DispatchState::new(Vec::new());
        let added = state.append(
            ["b", "a", "b", "c", "a"]
                .iter()
                .map(|s| s.to_string()),
        );
        assert_eq!(added, 3);
        assert_eq!(state.pool, vec!["b", "a", "c"]);
    }
}
