/// A partial-update value for a field that can also be cleared.
///
/// Plain `Option<T>` covers fields that are either left alone or overwritten;
/// `Patch` adds the third state for optional links that a caller may remove.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Patch<T> {
    #[default]
    Unset,
    Clear,
    Set(T),
}

impl<T> Patch<T> {
    pub fn is_unset(&self) -> bool {
        matches!(self, Patch::Unset)
    }

    /// Applies the patch to an optional target.
    pub fn apply_to(self, target: &mut Option<T>) {
        match self {
            Patch::Unset => {}
            Patch::Clear => *target = None,
            Patch::Set(v) => *target = Some(v),
        }
    }
}

/// Overwrites `target` when a value was supplied.
pub fn apply<T>(value: Option<T>, target: &mut T) {
    if let Some(v) = value {
        *target = v;
    }
}
