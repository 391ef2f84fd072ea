//! # Value Codec
//!
//! Field-by-field encoding of fixed-layout values into packet payloads.
//!
//! A fixed-layout value has a statically known encoded size and no heap
//! indirections. Each field is written little-endian in declaration order with
//! no padding, so the encoding is identical on every platform regardless of how
//! the compiler lays the struct out in memory.
//!
//! ## Wire Format
//! ```text
//! [LayoutVersion(1)] [Field0] [Field1] ... [FieldN]
//! ```
//!
//! The layout version is bumped whenever a type's field list changes, so a
//! receiver with an older definition rejects the bytes instead of misreading them.
//!
//! ## Usage
//! ```rust
//! use tranquility_protocol::core::serialization::{deserialize, serialize};
//! use tranquility_protocol::fixed_layout;
//!
//! fixed_layout! {
//!     #[derive(Debug, Clone, Copy, PartialEq)]
//!     pub struct Position {
//!         pub x: f32,
//!         pub y: f32,
//!         pub flags: u8,
//!     }
//! }
//!
//! let pos = Position { x: 1.5, y: -2.0, flags: 3 };
//! let bytes = serialize(&pos);
//! assert_eq!(bytes.len(), 1 + 4 + 4 + 1);
//! assert_eq!(deserialize::<Position>(&bytes).unwrap(), pos);
//! ```

use crate::error::{constants, ProtocolError, Result};
use bytes::{Buf, BufMut};

/// Width of the leading layout-version tag
pub const LAYOUT_TAG_LEN: usize = 1;

/// A value with a fixed, explicitly described binary layout.
///
/// Implement it with the [`fixed_layout!`](crate::fixed_layout) macro rather than by hand;
/// the macro keeps `ENCODED_LEN` consistent with the field list.
pub trait FixedLayout: Sized {
    /// Encoded size of the fields, excluding the layout tag
    const ENCODED_LEN: usize;

    /// Version tag written ahead of the fields by [`serialize`]
    const LAYOUT_VERSION: u8 = 1;

    /// Append the fields to `out`.
    fn encode_fields(&self, out: &mut Vec<u8>);

    /// Read the fields from the front of `input`, advancing it.
    ///
    /// Callers guarantee at least `ENCODED_LEN` bytes are available.
    fn decode_fields(input: &mut &[u8]) -> Result<Self>;
}

/// Total serialized size of `T`, including the layout tag.
pub const fn encoded_size<T: FixedLayout>() -> usize {
    LAYOUT_TAG_LEN + T::ENCODED_LEN
}

/// Encode `value` into a new buffer.
pub fn serialize<T: FixedLayout>(value: &T) -> Vec<u8> {
    let mut out = Vec::with_capacity(encoded_size::<T>());
    out.put_u8(T::LAYOUT_VERSION);
    value.encode_fields(&mut out);
    debug_assert_eq!(out.len(), encoded_size::<T>());
    out
}

/// Decode a `T` from exactly `encoded_size::<T>()` bytes.
///
/// # Errors
/// - `ProtocolError::SizeMismatch` if `bytes` has any other length
/// - `ProtocolError::UnsupportedVersion` if the layout tag differs from `T::LAYOUT_VERSION`
/// - `ProtocolError::DeserializeError` if a field holds a value its type cannot represent
pub fn deserialize<T: FixedLayout>(bytes: &[u8]) -> Result<T> {
    let expected = encoded_size::<T>();
    if bytes.len() != expected {
        return Err(ProtocolError::SizeMismatch {
            expected,
            actual: bytes.len(),
        });
    }

    let mut input = bytes;
    let version = input.get_u8();
    if version != T::LAYOUT_VERSION {
        return Err(ProtocolError::UnsupportedVersion(u32::from(version)));
    }

    let value = T::decode_fields(&mut input)?;
    if !input.is_empty() {
        return Err(ProtocolError::DeserializeError(format!(
            "{} bytes left over after decoding",
            input.len()
        )));
    }
    Ok(value)
}

#[inline]
fn ensure_remaining(input: &[u8], needed: usize) -> Result<()> {
    if input.len() < needed {
        return Err(ProtocolError::SizeMismatch {
            expected: needed,
            actual: input.len(),
        });
    }
    Ok(())
}

macro_rules! impl_primitive {
    ($($ty:ty => $put:ident, $get:ident;)*) => {
        $(
            impl FixedLayout for $ty {
                const ENCODED_LEN: usize = std::mem::size_of::<$ty>();

                #[inline]
                fn encode_fields(&self, out: &mut Vec<u8>) {
                    out.$put(*self);
                }

                #[inline]
                fn decode_fields(input: &mut &[u8]) -> Result<Self> {
                    ensure_remaining(input, Self::ENCODED_LEN)?;
                    Ok(input.$get())
                }
            }
        )*
    };
}

impl_primitive! {
    u8 => put_u8, get_u8;
    i8 => put_i8, get_i8;
    u16 => put_u16_le, get_u16_le;
    i16 => put_i16_le, get_i16_le;
    u32 => put_u32_le, get_u32_le;
    i32 => put_i32_le, get_i32_le;
    u64 => put_u64_le, get_u64_le;
    i64 => put_i64_le, get_i64_le;
    f32 => put_f32_le, get_f32_le;
    f64 => put_f64_le, get_f64_le;
}

impl FixedLayout for bool {
    const ENCODED_LEN: usize = 1;

    fn encode_fields(&self, out: &mut Vec<u8>) {
        out.put_u8(u8::from(*self));
    }

    fn decode_fields(input: &mut &[u8]) -> Result<Self> {
        ensure_remaining(input, 1)?;
        match input.get_u8() {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(ProtocolError::DeserializeError(format!(
                "{}: {other}",
                constants::ERR_INVALID_BOOL
            ))),
        }
    }
}

impl<T: FixedLayout, const N: usize> FixedLayout for [T; N] {
    const ENCODED_LEN: usize = T::ENCODED_LEN * N;

    fn encode_fields(&self, out: &mut Vec<u8>) {
        for item in self {
            item.encode_fields(out);
        }
    }

    fn decode_fields(input: &mut &[u8]) -> Result<Self> {
        ensure_remaining(input, Self::ENCODED_LEN)?;
        let mut items = Vec::with_capacity(N);
        for _ in 0..N {
            items.push(T::decode_fields(input)?);
        }
        items
            .try_into()
            .map_err(|_| ProtocolError::DeserializeError(format!("expected {N} array elements")))
    }
}

/// Declare a struct and implement [`FixedLayout`](crate::core::serialization::FixedLayout)
/// for it, encoding fields in declaration order.
///
/// An optional leading `version N;` sets the layout version (default 1).
///
/// ```rust
/// use tranquility_protocol::fixed_layout;
///
/// fixed_layout! {
///     version 2;
///     #[derive(Debug, PartialEq)]
///     pub struct Greeting {
///         pub protocol: u32,
///         pub nonce: [u8; 16],
///     }
/// }
/// ```
#[macro_export]
macro_rules! fixed_layout {
    (
        version $ver:literal;
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $($(#[$fmeta:meta])* $fvis:vis $field:ident : $fty:ty),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $($(#[$fmeta])* $fvis $field : $fty),+
        }

        impl $crate::core::serialization::FixedLayout for $name {
            const ENCODED_LEN: usize =
                0 $(+ <$fty as $crate::core::serialization::FixedLayout>::ENCODED_LEN)+;
            const LAYOUT_VERSION: u8 = $ver;

            fn encode_fields(&self, out: &mut Vec<u8>) {
                $(
                    <$fty as $crate::core::serialization::FixedLayout>::encode_fields(
                        &self.$field,
                        out,
                    );
                )+
            }

            fn decode_fields(input: &mut &[u8]) -> $crate::error::Result<Self> {
                $(
                    let $field =
                        <$fty as $crate::core::serialization::FixedLayout>::decode_fields(input)?;
                )+
                Ok(Self { $($field),+ })
            }
        }
    };
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $($(#[$fmeta:meta])* $fvis:vis $field:ident : $fty:ty),+ $(,)?
        }
    ) => {
        $crate::fixed_layout! {
            version 1;
            $(#[$meta])*
            $vis struct $name {
                $($(#[$fmeta])* $fvis $field : $fty),+
            }
        }
    };
}
