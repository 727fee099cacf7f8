//! Runtime ABI values.

use crate::{AbiError, AbiType, Result};
use alloy_primitives::{Address, B256, I256, U256};
use std::iter::zip;

/// A value paired with enough type information to encode it.
///
/// Numeric variants carry their declared bit width (and scale, for the
/// fixed-point kinds) so that a value is meaningful on its own; the width is
/// checked against the descriptor when encoding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AbiValue {
    /// A boolean.
    Bool(bool),
    /// An unsigned integer and its declared bit width.
    Uint(U256, usize),
    /// A signed integer and its declared bit width.
    Int(I256, usize),
    /// An unsigned fixed-point number: raw scaled integer, bit width, scale.
    Ufixed(U256, usize, usize),
    /// A signed fixed-point number: raw scaled integer, bit width, scale.
    Fixed(I256, usize, usize),
    /// An address.
    Address(Address),
    /// A fixed-size byte string, left-aligned in a word, and its size.
    FixedBytes(B256, usize),
    /// A dynamically sized byte string.
    Bytes(Vec<u8>),
    /// A UTF-8 string.
    String(String),
    /// A fixed-length array.
    FixedArray(Vec<AbiValue>),
    /// A dynamically sized array.
    Array(Vec<AbiValue>),
    /// An anonymous field grouping.
    Tuple(Vec<AbiValue>),
    /// A named field grouping.
    Struct {
        /// The declared struct name.
        name: String,
        /// Field names, parallel to `tuple`.
        prop_names: Vec<String>,
        /// Field values, in declaration order.
        tuple: Vec<AbiValue>,
    },
}

impl AbiValue {
    /// Builds a `bytes<N>` value from 1 to 32 bytes, right-padding the word
    /// with zeroes.
    pub fn fixed_bytes(bytes: &[u8]) -> Result<Self> {
        let size = bytes.len();
        if size == 0 || size > 32 {
            return Err(AbiError::unsupported(format!("invalid fixed bytes size: {size}")));
        }
        let mut word = B256::ZERO;
        word[..size].copy_from_slice(bytes);
        Ok(Self::FixedBytes(word, size))
    }

    /// Reconstructs the type descriptor this value is shaped as.
    ///
    /// Returns `None` when the shape is ambiguous, such as an empty array.
    /// Array element types are taken from the first element.
    pub fn as_type(&self) -> Option<AbiType> {
        match self {
            Self::Bool(_) => Some(AbiType::Bool),
            Self::Uint(_, bits) => Some(AbiType::Uint(*bits)),
            Self::Int(_, bits) => Some(AbiType::Int(*bits)),
            Self::Ufixed(_, bits, scale) => Some(AbiType::Ufixed(*bits, *scale)),
            Self::Fixed(_, bits, scale) => Some(AbiType::Fixed(*bits, *scale)),
            Self::Address(_) => Some(AbiType::Address),
            Self::FixedBytes(_, size) => Some(AbiType::FixedBytes(*size)),
            Self::Bytes(_) => Some(AbiType::Bytes),
            Self::String(_) => Some(AbiType::String),
            Self::FixedArray(vals) => {
                Some(AbiType::FixedArray(Box::new(vals.first()?.as_type()?), vals.len()))
            }
            Self::Array(vals) => Some(AbiType::Array(Box::new(vals.first()?.as_type()?))),
            Self::Tuple(vals) => {
                vals.iter().map(Self::as_type).collect::<Option<Vec<_>>>().map(AbiType::Tuple)
            }
            Self::Struct { name, prop_names, tuple } => {
                if prop_names.len() != tuple.len() {
                    return None;
                }
                let fields = zip(prop_names, tuple)
                    .map(|(name, value)| Some((name.clone(), value.as_type()?)))
                    .collect::<Option<Vec<_>>>()?;
                Some(AbiType::Struct { name: name.clone(), fields })
            }
        }
    }

    /// A printable name for this value's shape, for diagnostics.
    pub fn type_name(&self) -> String {
        match self.as_type() {
            Some(ty) => ty.name(),
            None => self.kind().into(),
        }
    }

    const fn kind(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Uint(..) => "uint",
            Self::Int(..) => "int",
            Self::Ufixed(..) => "ufixed",
            Self::Fixed(..) => "fixed",
            Self::Address(_) => "address",
            Self::FixedBytes(..) => "fixed bytes",
            Self::Bytes(_) => "bytes",
            Self::String(_) => "string",
            Self::FixedArray(_) => "fixed array",
            Self::Array(_) => "array",
            Self::Tuple(_) => "tuple",
            Self::Struct { .. } => "struct",
        }
    }

    /// Returns the boolean, if this is a boolean.
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the integer and its bit width, if this is an unsigned integer.
    pub const fn as_uint(&self) -> Option<(U256, usize)> {
        match self {
            Self::Uint(value, bits) => Some((*value, *bits)),
            _ => None,
        }
    }

    /// Returns the integer and its bit width, if this is a signed integer.
    pub const fn as_int(&self) -> Option<(I256, usize)> {
        match self {
            Self::Int(value, bits) => Some((*value, *bits)),
            _ => None,
        }
    }

    /// Returns the address, if this is an address.
    pub const fn as_address(&self) -> Option<Address> {
        match self {
            Self::Address(address) => Some(*address),
            _ => None,
        }
    }

    /// Returns the padded word and size, if this is a fixed byte string.
    pub const fn as_fixed_bytes(&self) -> Option<(B256, usize)> {
        match self {
            Self::FixedBytes(word, size) => Some((*word, *size)),
            _ => None,
        }
    }

    /// Returns the bytes, if this is a dynamic byte string.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Returns the string, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the elements, if this is an array of either kind.
    pub fn as_slice(&self) -> Option<&[AbiValue]> {
        match self {
            Self::FixedArray(vals) | Self::Array(vals) => Some(vals),
            _ => None,
        }
    }

    /// Returns the fields, if this is a tuple or a struct.
    pub fn as_tuple(&self) -> Option<&[AbiValue]> {
        match self {
            Self::Tuple(vals) | Self::Struct { tuple: vals, .. } => Some(vals),
            _ => None,
        }
    }

    /// Returns the name, field names and field values, if this is a struct.
    pub fn as_struct(&self) -> Option<(&str, &[String], &[AbiValue])> {
        match self {
            Self::Struct { name, prop_names, tuple } => Some((name, prop_names, tuple)),
            _ => None,
        }
    }
}

impl AbiType {
    /// Whether `value` is shaped exactly as this descriptor: same tag, same
    /// widths, same lengths, and recursively so for every child. Struct
    /// values must also carry the declared struct and field names.
    pub fn matches(&self, value: &AbiValue) -> bool {
        match (self, value) {
            (Self::Bool, AbiValue::Bool(_)) => true,
            (Self::Uint(bits), AbiValue::Uint(_, vbits)) => bits == vbits,
            (Self::Int(bits), AbiValue::Int(_, vbits)) => bits == vbits,
            (Self::Ufixed(bits, scale), AbiValue::Ufixed(_, vbits, vscale)) => {
                bits == vbits && scale == vscale
            }
            (Self::Fixed(bits, scale), AbiValue::Fixed(_, vbits, vscale)) => {
                bits == vbits && scale == vscale
            }
            (Self::Address, AbiValue::Address(_)) => true,
            (Self::FixedBytes(size), AbiValue::FixedBytes(_, vsize)) => size == vsize,
            (Self::Bytes, AbiValue::Bytes(_)) => true,
            (Self::String, AbiValue::String(_)) => true,
            (Self::FixedArray(ty, count), AbiValue::FixedArray(vals)) => {
                vals.len() == *count && vals.iter().all(|v| ty.matches(v))
            }
            (Self::Array(ty), AbiValue::Array(vals)) => vals.iter().all(|v| ty.matches(v)),
            (Self::Tuple(types), AbiValue::Tuple(vals)) => {
                types.len() == vals.len() && zip(types, vals).all(|(ty, v)| ty.matches(v))
            }
            (
                Self::Struct { name, fields },
                AbiValue::Struct { name: vname, prop_names, tuple },
            ) => {
                name == vname
                    && fields.len() == tuple.len()
                    && prop_names.len() == tuple.len()
                    && zip(fields, prop_names).all(|((fname, _), pname)| fname == pname)
                    && zip(fields, tuple).all(|((_, ty), v)| ty.matches(v))
            }
            _ => false,
        }
    }

    pub(crate) fn type_check(&self, value: &AbiValue) -> Result<()> {
        if self.matches(value) {
            Ok(())
        } else {
            Err(AbiError::TypeMismatch { expected: self.name(), actual: value.type_name() })
        }
    }
}

impl From<bool> for AbiValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<U256> for AbiValue {
    fn from(value: U256) -> Self {
        Self::Uint(value, 256)
    }
}

impl From<I256> for AbiValue {
    fn from(value: I256) -> Self {
        Self::Int(value, 256)
    }
}

impl From<Address> for AbiValue {
    fn from(value: Address) -> Self {
        Self::Address(value)
    }
}

impl From<B256> for AbiValue {
    fn from(value: B256) -> Self {
        Self::FixedBytes(value, 32)
    }
}

impl From<Vec<u8>> for AbiValue {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}

impl From<&[u8]> for AbiValue {
    fn from(value: &[u8]) -> Self {
        Self::Bytes(value.to_vec())
    }
}

impl From<String> for AbiValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&str> for AbiValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}
