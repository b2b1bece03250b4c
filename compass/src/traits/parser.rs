//! Parser Trait
//!
//! Generic interface for turning an input format into a strongly-typed structure. The
//! diagram parser in [`crate::parsers::model_parser`] is the implementation used by the
//! engine; the trait keeps the orchestrator independent of the concrete payload format.
//!
//! # Example
//!
//! ```rust
//! use compass::error::CompassResult;
//! use compass::traits::parser::Parser;
//!
//! struct LineCounter;
//!
//! impl<'a> Parser<&'a str, usize> for LineCounter {
//!     fn parse(&self, input: &'a str) -> CompassResult<usize> {
//!         Ok(input.lines().count())
//!     }
//! }
//!
//! assert_eq!(LineCounter.parse("a\nb").unwrap(), 2);
//! ```

use crate::error::CompassResult;

/// Parses `Input` into `Output`, validating it along the way.
///
/// # Errors
///
/// Returns a [`crate::error::CompassError`] if the input does not conform to the
/// expected schema.
pub trait Parser<Input, Output> {
    fn parse(&self, input: Input) -> CompassResult<Output>;
}
