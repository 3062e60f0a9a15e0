//! Bulk copying between storages.
//!
//! These are the primitives a split orchestrator sequences: replacing a
//! target storage with a source's full contents, or moving one collection's
//! documents through a name filter. Copies are not atomic; a document that
//! vanishes between listing and reading is skipped with a warning rather
//! than failing the whole copy.

use tracing::{debug, warn};

use crate::error::StoreResult;
use crate::traits::Storage;

/// Replace `target`'s full contents with `source`'s.
///
/// Clears the target's default collection and every collection it
/// currently lists, then copies the source collection by collection.
/// Because collection bindings are deterministic, copying the same source
/// twice creates no physical collections the first copy did not.
pub fn copy_storage(source: &dyn Storage, target: &dyn Storage) -> StoreResult<()> {
    target.delete_all("")?;
    for name in target.collection_names()? {
        target.create_collection(&name)?.delete_all("")?;
    }

    let mut copied = copy_collection(source, target)?;
    for name in source.collection_names()? {
        let from = source.create_collection(&name)?;
        let to = target.create_collection(&name)?;
        copied += copy_collection(from.as_ref(), to.as_ref())?;
    }

    debug!(copied, "storage copy complete");
    Ok(())
}

/// Replace the target collection's documents with the source collection's.
/// Returns the number of documents copied.
pub fn copy_collection(source: &dyn Storage, target: &dyn Storage) -> StoreResult<usize> {
    copy_filtered(source, target, &|_| true)
}

/// Replace the target collection's documents with the source documents
/// accepted by `filter`. Returns the number of documents copied.
///
/// The filter is the seam for split classification policies; this module
/// implements none.
pub fn copy_filtered(
    source: &dyn Storage,
    target: &dyn Storage,
    filter: &dyn Fn(&str) -> bool,
) -> StoreResult<usize> {
    target.delete_all("")?;

    let mut copied = 0;
    for name in source.list_all("")? {
        if !filter(&name) {
            continue;
        }
        match source.read(&name)? {
            Some(value) => {
                target.write(&name, &value)?;
                copied += 1;
            }
            None => {
                warn!(document = %name, "document vanished during copy; skipping");
            }
        }
    }
    Ok(copied)
}
