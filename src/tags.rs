use crate::SyntaxKind;

/// Constant-time lookup from a tagged kind to caller-attached metadata.
///
/// Only tagged kinds can carry entries, so storage is indexed at `id >> 1`;
/// anonymous kinds always come back empty.
#[derive(Debug, Clone, Default)]
pub struct TagTable<T> {
    content: Vec<Option<T>>,
}

impl<T> TagTable<T> {
    /// Builds a table from `(kind, value)` pairs. Untagged kinds are
    /// ignored; a later pair for the same kind replaces the earlier one.
    pub fn from_pairs<I>(pairs: I) -> TagTable<T>
    where
        I: IntoIterator<Item = (SyntaxKind, T)>,
    {
        let mut content = Vec::new();
        for (kind, value) in pairs {
            if !kind.is_tagged() {
                continue;
            }
            let index = usize::from(kind.0 >> 1);
            if content.len() <= index {
                content.resize_with(index + 1, || None);
            }
            content[index] = Some(value);
        }
        TagTable { content }
    }

    /// The value attached to `kind`, or `None` when `kind` is anonymous or
    /// carries no entry.
    #[inline]
    pub fn get(&self, kind: SyntaxKind) -> Option<&T> {
        if !kind.is_tagged() {
            return None;
        }
        self.content.get(usize::from(kind.0 >> 1))?.as_ref()
    }
}
