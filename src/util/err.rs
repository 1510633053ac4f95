/// Converts errors from their error type (of the submodule) to that of
/// a `carthorse::Error` variant.
///
/// ```rust
/// use carthorse::StoreError;
/// carthorse::impl_err!(StoreError, Store);
/// ```
pub mod err_macro {
    macro_rules! impl_err {
        ($from:ty, $variant:ident) => {
            use crate::Error;

            impl From<$from> for Error {
                fn from(value: $from) -> Self {
                    Error::$variant(value)
                }
            }
        };
    }

    pub(crate) use impl_err;
}
