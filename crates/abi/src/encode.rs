//! Head/tail encoding of value sequences.

use crate::{utils, AbiError, AbiType, AbiValue, Result, Word};
use std::iter::{repeat, zip};
use tracing::trace;

/// ABI-encodes a parameter sequence.
///
/// The result is the head region of `values` followed by its tail region:
/// static values inline, dynamic values as offset words pointing into the
/// tail. This is the layout of call data after the selector and of return
/// data. An empty sequence encodes to an empty byte string.
///
/// Types are validated first; values must match them exactly, and every
/// numeric value must fit its declared width.
pub fn encode_params(types: &[AbiType], values: &[AbiValue]) -> Result<Vec<u8>> {
    check_params(types, values)?;
    trace!(params = types.len(), "encoding parameter sequence");
    let mut out = Vec::with_capacity(seq_encoded_size(zip(types, values)));
    encode_sequence(zip(types, values), &mut out);
    Ok(out)
}

/// ABI-encodes a single value in its self-contained form.
///
/// This is the value's own encoding, without the offset word an enclosing
/// sequence would add: a string encodes as its length word and padded
/// bytes, a dynamic array as its count word and element sequence. For a
/// value used as a sole function argument, use [`encode_params`] instead.
pub fn encode_value(ty: &AbiType, value: &AbiValue) -> Result<Vec<u8>> {
    ty.validate()?;
    ty.type_check(value)?;
    check_widths(value)?;
    let mut out = Vec::with_capacity(encoded_size(ty, value));
    encode_into(ty, value, &mut out);
    Ok(out)
}

/// Validates `types`, checks `values` against them pairwise, and checks
/// numeric widths.
pub(crate) fn check_params(types: &[AbiType], values: &[AbiValue]) -> Result<()> {
    if types.len() != values.len() {
        return Err(AbiError::TypeMismatch {
            expected: format!("{} parameters", types.len()),
            actual: format!("{} values", values.len()),
        });
    }
    for (ty, value) in zip(types, values) {
        ty.validate()?;
        ty.type_check(value)?;
        check_widths(value)?;
    }
    Ok(())
}

/// Appends the head/tail encoding of typed items to `out`. Offsets are
/// relative to the start of the appended region.
///
/// Whether an item sits inline or behind an offset word is decided by its
/// declared type, never by the value: a fixed array of strings takes an
/// offset word even when its count is zero, exactly as the decoder expects.
pub(crate) fn encode_sequence<'a, I>(items: I, out: &mut Vec<u8>)
where
    I: Iterator<Item = (&'a AbiType, &'a AbiValue)> + Clone,
{
    let head_size: usize = items.clone().map(|(ty, _)| ty.head_size()).sum();
    let mut tail = Vec::new();
    for (ty, value) in items {
        if ty.is_dynamic() {
            out.extend_from_slice(utils::pad_usize(head_size + tail.len()).as_slice());
            encode_into(ty, value, &mut tail);
        } else {
            encode_into(ty, value, out);
        }
    }
    out.extend_from_slice(&tail);
}

/// Appends the self-contained encoding of one value to `out`. The value has
/// already been checked against its descriptor.
fn encode_into(ty: &AbiType, value: &AbiValue, out: &mut Vec<u8>) {
    match (ty, value) {
        (_, AbiValue::Bool(b)) => {
            let mut word = Word::ZERO;
            word[31] = *b as u8;
            out.extend_from_slice(word.as_slice());
        }
        (_, AbiValue::Uint(value, _) | AbiValue::Ufixed(value, _, _)) => {
            out.extend_from_slice(&value.to_be_bytes::<32>());
        }
        (_, AbiValue::Int(value, _) | AbiValue::Fixed(value, _, _)) => {
            out.extend_from_slice(&value.into_raw().to_be_bytes::<32>());
        }
        (_, AbiValue::Address(address)) => out.extend_from_slice(address.into_word().as_slice()),
        (_, AbiValue::FixedBytes(word, _)) => out.extend_from_slice(word.as_slice()),
        (_, AbiValue::Bytes(bytes)) => encode_counted(bytes, out),
        (_, AbiValue::String(s)) => encode_counted(s.as_bytes(), out),
        (AbiType::Array(elem), AbiValue::Array(vals)) => {
            out.extend_from_slice(utils::pad_usize(vals.len()).as_slice());
            encode_sequence(zip(repeat(elem.as_ref()), vals), out);
        }
        (AbiType::FixedArray(elem, _), AbiValue::FixedArray(vals)) => {
            encode_sequence(zip(repeat(elem.as_ref()), vals), out);
        }
        (AbiType::Tuple(types), AbiValue::Tuple(vals)) => {
            encode_sequence(zip(types, vals), out);
        }
        (AbiType::Struct { fields, .. }, AbiValue::Struct { tuple, .. }) => {
            encode_sequence(zip(fields.iter().map(|(_, ty)| ty), tuple), out);
        }
        _ => unreachable!("value shape checked against its descriptor"),
    }
}

/// Length word, data, zero padding to a word boundary.
fn encode_counted(bytes: &[u8], out: &mut Vec<u8>) {
    out.extend_from_slice(utils::pad_usize(bytes.len()).as_slice());
    out.extend_from_slice(bytes);
    out.resize(out.len() + utils::padded_len(bytes.len()) - bytes.len(), 0);
}

/// Exact encoded size of one value in self-contained form.
fn encoded_size(ty: &AbiType, value: &AbiValue) -> usize {
    match (ty, value) {
        (_, AbiValue::Bytes(bytes)) => 32 + utils::padded_len(bytes.len()),
        (_, AbiValue::String(s)) => 32 + utils::padded_len(s.len()),
        (AbiType::Array(elem), AbiValue::Array(vals)) => {
            32 + seq_encoded_size(zip(repeat(elem.as_ref()), vals))
        }
        (AbiType::FixedArray(elem, _), AbiValue::FixedArray(vals)) => {
            seq_encoded_size(zip(repeat(elem.as_ref()), vals))
        }
        (AbiType::Tuple(types), AbiValue::Tuple(vals)) => seq_encoded_size(zip(types, vals)),
        (AbiType::Struct { fields, .. }, AbiValue::Struct { tuple, .. }) => {
            seq_encoded_size(zip(fields.iter().map(|(_, ty)| ty), tuple))
        }
        _ => 32,
    }
}

fn seq_encoded_size<'a, I>(items: I) -> usize
where
    I: Iterator<Item = (&'a AbiType, &'a AbiValue)>,
{
    items
        .map(|(ty, value)| {
            if ty.is_dynamic() { 32 + encoded_size(ty, value) } else { encoded_size(ty, value) }
        })
        .sum()
}

/// Checks that every numeric value in the tree fits its declared width.
fn check_widths(value: &AbiValue) -> Result<()> {
    match value {
        AbiValue::Uint(v, bits) | AbiValue::Ufixed(v, bits, _) => {
            if !utils::fits_width(&v.to_be_bytes::<32>(), *bits, false) {
                return Err(AbiError::overflow(value.type_name()));
            }
            Ok(())
        }
        AbiValue::Int(v, bits) | AbiValue::Fixed(v, bits, _) => {
            if !utils::fits_width(&v.into_raw().to_be_bytes::<32>(), *bits, true) {
                return Err(AbiError::overflow(value.type_name()));
            }
            Ok(())
        }
        AbiValue::FixedArray(vals)
        | AbiValue::Array(vals)
        | AbiValue::Tuple(vals)
        | AbiValue::Struct { tuple: vals, .. } => vals.iter().try_for_each(check_widths),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode_params;
    use alloy_primitives::{hex, I256, U256};

    fn uint(value: u64) -> AbiValue {
        AbiValue::Uint(U256::from(value), 256)
    }

    #[test]
    fn encodes_static_words() {
        let encoded = encode_value(&AbiType::Uint(256), &uint(291)).unwrap();
        assert_eq!(
            encoded,
            hex!("0000000000000000000000000000000000000000000000000000000000000123")
        );

        let encoded = encode_value(&AbiType::Bool, &AbiValue::Bool(true)).unwrap();
        assert_eq!(
            encoded,
            hex!("0000000000000000000000000000000000000000000000000000000000000001")
        );

        let minus_one = AbiValue::Int(I256::MINUS_ONE, 8);
        let encoded = encode_value(&AbiType::Int(8), &minus_one).unwrap();
        assert_eq!(
            encoded,
            hex!("ffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff")
        );
    }

    #[test]
    fn encodes_string_payload() {
        let encoded = encode_value(&AbiType::String, &"dave".into()).unwrap();
        assert_eq!(
            encoded,
            hex!(
                "0000000000000000000000000000000000000000000000000000000000000004"
                "6461766500000000000000000000000000000000000000000000000000000000"
            )
        );
    }

    #[test]
    fn encodes_sole_dynamic_parameter_behind_offset() {
        let types = [AbiType::parse("uint256[]").unwrap()];
        let values = [AbiValue::Array(vec![uint(1), uint(2), uint(3)])];
        let encoded = encode_params(&types, &values).unwrap();
        assert_eq!(
            encoded,
            hex!(
                "0000000000000000000000000000000000000000000000000000000000000020"
                "0000000000000000000000000000000000000000000000000000000000000003"
                "0000000000000000000000000000000000000000000000000000000000000001"
                "0000000000000000000000000000000000000000000000000000000000000002"
                "0000000000000000000000000000000000000000000000000000000000000003"
            )
        );
    }

    #[test]
    fn encodes_static_tuple_inline() {
        let types = [AbiType::parse("tuple(uint256,bool)").unwrap(), AbiType::Uint(256)];
        let values = [AbiValue::Tuple(vec![uint(1), AbiValue::Bool(true)]), uint(2)];
        let encoded = encode_params(&types, &values).unwrap();
        assert_eq!(
            encoded,
            hex!(
                "0000000000000000000000000000000000000000000000000000000000000001"
                "0000000000000000000000000000000000000000000000000000000000000001"
                "0000000000000000000000000000000000000000000000000000000000000002"
            )
        );
    }

    #[test]
    fn tail_offsets_are_distinct_and_in_order() {
        let types = [AbiType::String, AbiType::String];
        let values = ["a".into(), "b".into()];
        let encoded = encode_params(&types, &values).unwrap();
        assert_eq!(
            encoded,
            hex!(
                "0000000000000000000000000000000000000000000000000000000000000040"
                "0000000000000000000000000000000000000000000000000000000000000080"
                "0000000000000000000000000000000000000000000000000000000000000001"
                "6100000000000000000000000000000000000000000000000000000000000000"
                "0000000000000000000000000000000000000000000000000000000000000001"
                "6200000000000000000000000000000000000000000000000000000000000000"
            )
        );
    }

    #[test]
    fn empty_fixed_arrays_of_dynamic_elements_keep_their_offset_word() {
        // `string[0]` is dynamic even though it holds nothing, so the head
        // carries an offset word pointing at its empty payload.
        let types = [AbiType::parse("string[0]").unwrap()];
        let values = [AbiValue::FixedArray(vec![])];
        let encoded = encode_params(&types, &values).unwrap();
        assert_eq!(
            encoded,
            hex!("0000000000000000000000000000000000000000000000000000000000000020")
        );
        assert_eq!(decode_params(&types, &encoded, true).unwrap(), values);

        let types = [AbiType::parse("tuple(string[0],uint256)").unwrap()];
        let values = [AbiValue::Tuple(vec![AbiValue::FixedArray(vec![]), uint(7)])];
        let encoded = encode_params(&types, &values).unwrap();
        assert_eq!(
            encoded,
            hex!(
                "0000000000000000000000000000000000000000000000000000000000000020"
                "0000000000000000000000000000000000000000000000000000000000000040"
                "0000000000000000000000000000000000000000000000000000000000000007"
            )
        );
        assert_eq!(decode_params(&types, &encoded, true).unwrap(), values);
    }

    #[test]
    fn empty_sequence_encodes_to_empty_bytes() {
        assert_eq!(encode_params(&[], &[]).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn length_is_always_a_word_multiple() {
        let types = [AbiType::Bytes];
        let values = [AbiValue::Bytes(vec![0xaa; 33])];
        let encoded = encode_params(&types, &values).unwrap();
        assert_eq!(encoded.len() % 32, 0);
        assert_eq!(encoded.len(), 32 + 32 + 64);
    }

    #[test]
    fn rejects_wrong_arity() {
        let err = encode_params(&[AbiType::Bool], &[]).unwrap_err();
        assert!(matches!(err, AbiError::TypeMismatch { .. }));
    }

    #[test]
    fn rejects_out_of_range_numerics() {
        let err = encode_value(&AbiType::Uint(8), &AbiValue::Uint(U256::from(256u64), 8));
        assert_eq!(err.unwrap_err(), AbiError::Overflow { ty: "uint8".into() });

        let too_low = AbiValue::Int(I256::try_from(-129i64).unwrap(), 8);
        assert!(matches!(
            encode_value(&AbiType::Int(8), &too_low).unwrap_err(),
            AbiError::Overflow { .. }
        ));
        let in_range = AbiValue::Int(I256::try_from(-128i64).unwrap(), 8);
        assert!(encode_value(&AbiType::Int(8), &in_range).is_ok());

        // Nested values are checked too.
        let types = [AbiType::parse("uint8[]").unwrap()];
        let values = [AbiValue::Array(vec![AbiValue::Uint(U256::from(300u64), 8)])];
        assert!(matches!(
            encode_params(&types, &values).unwrap_err(),
            AbiError::Overflow { .. }
        ));
    }

    #[test]
    fn rejects_invalid_descriptor() {
        let err = encode_value(&AbiType::Uint(7), &AbiValue::Uint(U256::ZERO, 7)).unwrap_err();
        assert!(matches!(err, AbiError::UnsupportedType(_)));
    }
}
