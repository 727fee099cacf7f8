//! Packed encoding mode.

use crate::{encode, AbiError, AbiType, AbiValue, Result};
use std::iter::{repeat, zip};

/// Encodes values in the packed, non-standard mode.
///
/// Each value contributes its minimal representation: numerics shrink to
/// their declared byte width, booleans to one byte, addresses to 20 bytes,
/// fixed byte strings to their declared size, and `bytes`/`string` become
/// their raw data with no length prefix. Array elements keep the standard
/// padded form but carry no count word. The result has no offsets and is
/// not decodable in general; it exists for hashing and signing schemes.
///
/// Tuples, structs, and arrays whose elements are not static elementary
/// types have no packed form and are rejected.
pub fn encode_packed(types: &[AbiType], values: &[AbiValue]) -> Result<Vec<u8>> {
    encode::check_params(types, values)?;
    let mut out = Vec::new();
    for (ty, value) in zip(types, values) {
        packed_into(ty, value, &mut out)?;
    }
    Ok(out)
}

fn packed_into(ty: &AbiType, value: &AbiValue, out: &mut Vec<u8>) -> Result<()> {
    match value {
        AbiValue::Bool(b) => out.push(*b as u8),
        AbiValue::Uint(v, bits) | AbiValue::Ufixed(v, bits, _) => {
            out.extend_from_slice(&v.to_be_bytes::<32>()[32 - bits / 8..]);
        }
        AbiValue::Int(v, bits) | AbiValue::Fixed(v, bits, _) => {
            out.extend_from_slice(&v.into_raw().to_be_bytes::<32>()[32 - bits / 8..]);
        }
        AbiValue::Address(address) => out.extend_from_slice(address.as_slice()),
        AbiValue::FixedBytes(word, size) => out.extend_from_slice(&word[..*size]),
        AbiValue::Bytes(bytes) => out.extend_from_slice(bytes),
        AbiValue::String(s) => out.extend_from_slice(s.as_bytes()),
        AbiValue::FixedArray(vals) | AbiValue::Array(vals) => {
            let elem = packed_element(ty)?;
            encode::encode_sequence(zip(repeat(elem), vals), out);
        }
        AbiValue::Tuple(_) | AbiValue::Struct { .. } => {
            return Err(AbiError::unsupported(format!("{} has no packed form", ty.name())));
        }
    }
    Ok(())
}

/// Array elements keep their padded form in packed mode, so only static
/// elementary element types are representable.
fn packed_element(ty: &AbiType) -> Result<&AbiType> {
    let (AbiType::FixedArray(elem, _) | AbiType::Array(elem)) = ty else {
        unreachable!("array value with non-array type")
    };
    match elem.as_ref() {
        elem @ (AbiType::Bool
        | AbiType::Uint(_)
        | AbiType::Int(_)
        | AbiType::Ufixed(..)
        | AbiType::Fixed(..)
        | AbiType::Address
        | AbiType::FixedBytes(_)) => Ok(elem),
        _ => Err(AbiError::unsupported(format!("{} has no packed form", ty.name()))),
    }
}
