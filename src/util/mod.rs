pub mod cancel;
pub mod err;

pub use cancel::CancellationToken;
pub(crate) use err::err_macro::impl_err;
