use crate::domain::error::CoreError;
use crate::domain::model::Collection;

/// Fails fast when the inputs cannot be meaningfully compared: fewer than `needed`
/// collections, or any collection built under a config different from the first one.
pub fn ensure_comparable(collections: &[Collection], needed: usize) -> Result<(), CoreError> {
    if collections.len() < needed {
        return Err(CoreError::NotEnoughInputs {
            needed,
            got: collections.len(),
        });
    }

    let Some(first) = collections.first() else {
        return Ok(());
    };

    for c in collections.iter().skip(1) {
        if c.config() != first.config() {
            return Err(CoreError::ConfigMismatch {
                expected: Box::new(first.config().clone()),
                found: Box::new(c.config().clone()),
                input: c.source().to_string(),
            });
        }
    }
    Ok(())
}
