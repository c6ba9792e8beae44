//! Crash-recovery persistence of the unprocessed pool

use crate::frontier::Frontier;
use crate::storage::{DocumentStore, StorageResult};

/// Writes every not-yet-dispatched pool link to the store
///
/// Links already persisted are skipped. Returns how many links the
/// snapshot held.
pub fn persist_unprocessed<S: DocumentStore>(
    frontier: &Frontier,
    store: &mut S,
) -> StorageResult<usize> {
    let snapshot = frontier.snapshot_unprocessed();

    for url in &snapshot {
        match store.insert_unprocessed_link(url) {
            Ok(()) => {}
            Err(e) if e.is_duplicate() => {}
            Err(e) => return Err(e),
        }
    }

    tracing::info!("Persisted {} unprocessed links", snapshot.len());
    Ok(snapshot.len())
}

/// Loads and clears the links persisted by a previous run
pub fn restore_unprocessed<S: DocumentStore>(store: &mut S) -> StorageResult<Vec<String>> {
    let links = store.take_unprocessed_links()?;
    if !links.is_empty() {
        tracing::info!("Restored {} unprocessed links from previous run", links.len());
    }
    Ok(links)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontier::Dispatch;
    use crate::storage::SqliteStore;

    #[test]
    fn test_persist_and_restore_round() {
        let mut store = SqliteStore::new_in_memory().unwrap();
        let frontier = Frontier::new(vec!["http://seed".to_string()]);
        frontier.add_discovered_links(vec![
            "http://a".to_string(),
            "http://b".to_string(),
            "http://c".to_string(),
        ]);

        // seed + first pool link are dispatched and must not be persisted
        frontier.next_link().unwrap();
        frontier.next_link().unwrap();

        assert_eq!(persist_unprocessed(&frontier, &mut store).unwrap(), 2);
        // persisting twice tolerates the duplicates
        assert_eq!(persist_unprocessed(&frontier, &mut store).unwrap(), 2);

        let restored = restore_unprocessed(&mut store).unwrap();
        assert_eq!(restored, vec!["http://b", "http://c"]);
        assert!(restore_unprocessed(&mut store).unwrap().is_empty());

        let resumed = Frontier::with_pool(vec!["http://seed".to_string()], restored);
        assert_eq!(
            resumed.next_link().unwrap(),
            Dispatch::Link("http://seed".to_string())
        );
        assert_eq!(
            resumed.next_link().unwrap(),
            Dispatch::Link("http://b".to_string())
        );
    }
}
