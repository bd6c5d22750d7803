//! Tri-state field value for partial updates.
//!
//! A JSON payload can leave a property out, send it as `null`, or send a
//! value. `Option<T>` folds the first two together, which would make
//! "clear the description" indistinguishable from "leave it alone", so update
//! payloads carry a [`Patch`] per field instead.

/// One field of a partial update.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Patch<T> {
    /// The property was not present in the payload.
    #[default]
    Unset,
    /// The property was present and explicitly `null`.
    Null,
    /// The property was present with a value.
    Value(T),
}

impl<T> Patch<T> {
    /// Keep only a concrete value; `Unset` and `Null` both become `None`.
    ///
    /// Used for fields that may never be nulled.
    pub fn into_value(self) -> Option<T> {
        match self {
            Patch::Value(value) => Some(value),
            Patch::Unset | Patch::Null => None,
        }
    }

    /// Drop only `Unset`; `Null` survives as `Some(None)`.
    ///
    /// Used for nullable fields.
    pub fn into_nullable(self) -> Option<Option<T>> {
        match self {
            Patch::Unset => None,
            Patch::Null => Some(None),
            Patch::Value(value) => Some(Some(value)),
        }
    }
}
