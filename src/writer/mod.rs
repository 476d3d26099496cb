//! Module for writing JSON data
//!
//! [`JsonBufferWriter`] writes a JSON document into a caller-supplied fixed-size
//! byte buffer, counting the bytes the document needs even when the buffer is
//! too small (or empty, for a pure dry run).

use std::fmt::Display;

use duplicate::duplicate_item;

mod buffer_writer;
// Re-export buffer implementation under `writer` module
pub use buffer_writer::*;

/// Sealed trait for finite number types such as `u32`
///
/// Values of this number type are finite and will therefore always be
/// valid JSON numbers. They will neither be NaN nor Infinity.
///
/// The types implementing this trait are the integer types up to 64 bits;
/// narrower types promote, their decimal rendering is identical to that of
/// the promoted 64-bit value. Implementing this trait for custom number
/// types is not possible.
pub trait FiniteNumber: Display + private::Sealed {}

/// Sealed trait for floating point number types such as `f64`
///
/// Implementing this trait for custom number types is not possible.
pub trait FloatingPointNumber: Display + private::Sealed {
    /// Whether this number is finite and can therefore be written as JSON number
    ///
    /// NaN and Infinity have no JSON number representation.
    fn is_finite(&self) -> bool;
}

mod private {
    // Sealed trait, see https://rust-lang.github.io/api-guidelines/future-proofing.html#sealed-traits-protect-against-downstream-implementations-c-sealed
    pub trait Sealed {}

    // Use `duplicate` crate to avoid repeating code for all supported types, see https://stackoverflow.com/a/61467564
    #[duplicate::duplicate_item(type_template; [u8]; [i8]; [u16]; [i16]; [u32]; [i32]; [u64]; [i64]; [usize]; [isize]; [f32]; [f64])]
    impl Sealed for type_template {}
}

// Use `duplicate` crate to avoid repeating code for all supported types, see https://stackoverflow.com/a/61467564
#[duplicate_item(type_template; [u8]; [i8]; [u16]; [i16]; [u32]; [i32]; [u64]; [i64]; [usize]; [isize])]
impl FiniteNumber for type_template {}

#[duplicate_item(type_template; [f32]; [f64])]
impl FloatingPointNumber for type_template {
    fn is_finite(&self) -> bool {
        type_template::is_finite(*self)
    }
}
