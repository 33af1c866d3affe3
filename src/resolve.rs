//! Reference resolution against a [`ProjectFileMap`].

use crate::types::{ProjectFile, ProjectFileMap};

/// Strips the query string and fragment from an asset reference.
pub fn clean_reference(reference: &str) -> &str {
    let without_query = reference.split('?').next().unwrap_or(reference);
    without_query.split('#').next().unwrap_or(without_query)
}

impl ProjectFileMap {
    /// Resolves an asset reference found in HTML, CSS or JS to a project file.
    ///
    /// Rules are tried in order and the first hit wins:
    ///
    /// 1. exact key match (after dropping `?query` and `#fragment`)
    /// 2. exact match without a leading `./`
    /// 3. exact match without a leading `/`
    /// 4. any key ending with the reference, or any file whose base name equals it
    /// 5. any file whose base name equals the last segment of the reference
    ///
    /// Never fails loudly; an unresolvable reference yields `None`.
    pub fn resolve(&self, reference: &str) -> Option<&ProjectFile> {
        let clean = clean_reference(reference);
        if clean.is_empty() {
            return None;
        }

        if let Some(file) = self.get(clean) {
            return Some(file);
        }

        if let Some(stripped) = clean.strip_prefix("./") {
            if let Some(file) = self.get(stripped) {
                return Some(file);
            }
        }

        if let Some(stripped) = clean.strip_prefix('/') {
            if let Some(file) = self.get(stripped) {
                return Some(file);
            }
        }

        if let Some((_, file)) = self
            .iter()
            .find(|(path, file)| path.ends_with(clean) || file.name == clean)
        {
            return Some(file);
        }

        let last_segment = clean.rsplit('/').next().unwrap_or(clean);
        self.files().find(|file| file.name == last_segment)
    }
}
