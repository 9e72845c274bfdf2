//! Error handling foundation for campus-desk.
//!
//! This module provides only the `Result` type alias using rootcause.
//! Each crate defines its own domain error enums in its own `error`
//! module and returns `Report<E>` so callers can inspect the typed
//! context with `Report::current_context`.

use rootcause::Report;

/// A Result type alias using rootcause's Report for error handling.
pub type Result<T, C = ()> = std::result::Result<T, Report<C>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_type_works() {
        let ok: Result<i32> = Ok(42);
        assert_eq!(ok.expect("should be ok"), 42);
    }
}
