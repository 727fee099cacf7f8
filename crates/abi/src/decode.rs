//! All-or-nothing decoding of encoded data.
//!
//! Decoding walks the expected types over the buffer and fails on the first
//! word that cannot be interpreted; no partial results are produced. Every
//! offset and length word is bounds-checked against the region it addresses
//! before anything is read through it.

use crate::{utils, AbiError, AbiType, AbiValue, Result};
use alloy_primitives::{Address, B256, I256, U256};
use tracing::trace;

/// Decodes a parameter sequence, the inverse of
/// [`encode_params`](crate::encode_params).
///
/// With `validate` set, the canonical form is enforced: padding bytes must
/// be zero, booleans must be 0 or 1, and strings must be valid UTF-8.
/// Without it the decoder is lenient about those, but truncated buffers,
/// out-of-range offsets and numeric words wider than their declared type
/// are always errors.
///
/// Data past the encoded sequence is ignored.
pub fn decode_params(types: &[AbiType], data: &[u8], validate: bool) -> Result<Vec<AbiValue>> {
    for ty in types {
        ty.validate()?;
    }
    trace!(params = types.len(), data = data.len(), validate, "decoding parameter sequence");
    let mut decoder = Decoder::new(data, validate);
    types.iter().map(|ty| decode_item(&mut decoder, ty)).collect()
}

/// Decodes a single value from its self-contained form, the inverse of
/// [`encode_value`](crate::encode_value).
pub fn decode_value(ty: &AbiType, data: &[u8], validate: bool) -> Result<AbiValue> {
    ty.validate()?;
    let mut decoder = Decoder::new(data, validate);
    if ty.is_dynamic() {
        decode_payload(&mut decoder, ty)
    } else {
        decode_static(&mut decoder, ty)
    }
}

/// A read cursor over one encoding region.
///
/// Offset words are relative to the start of the region they appear in, so
/// each indirection produces a child decoder rooted at the offset target.
pub(crate) struct Decoder<'a> {
    /// The region offsets are relative to.
    buf: &'a [u8],
    /// Read position within `buf`.
    offset: usize,
    /// Canonical-form checking.
    validate: bool,
}

impl<'a> Decoder<'a> {
    pub(crate) fn new(buf: &'a [u8], validate: bool) -> Self {
        Self { buf, offset: 0, validate }
    }

    fn remaining_words(&self) -> usize {
        (self.buf.len() - self.offset) / 32
    }

    fn take_word(&mut self) -> Result<&'a [u8; 32]> {
        let Some(word) = self.buf.get(self.offset..).and_then(|r| r.first_chunk::<32>()) else {
            return Err(AbiError::malformed("unexpected end of data"));
        };
        self.offset += 32;
        Ok(word)
    }

    fn take_offset(&mut self) -> Result<usize> {
        utils::as_offset(self.take_word()?)
    }

    /// A decoder over the region starting at `offset` within this region.
    fn child(&self, offset: usize) -> Result<Decoder<'a>> {
        if offset > self.buf.len() {
            return Err(AbiError::malformed(format!("offset {offset} outside data")));
        }
        Ok(Decoder { buf: &self.buf[offset..], offset: 0, validate: self.validate })
    }

    /// Reads an offset word and returns a decoder over the region it points
    /// to.
    fn take_indirection(&mut self) -> Result<Decoder<'a>> {
        let offset = self.take_offset()?;
        self.child(offset)
    }

    /// A decoder rooted at the current read position. Array element offsets
    /// are relative to the word after the count, so the element region
    /// starts there.
    fn raw_child(&self) -> Decoder<'a> {
        Decoder { buf: &self.buf[self.offset..], offset: 0, validate: self.validate }
    }

    /// Reads `len` raw bytes and skips the padding to the next word
    /// boundary.
    fn take_counted(&mut self, len: usize) -> Result<&'a [u8]> {
        let rest = &self.buf[self.offset..];
        if len > rest.len() {
            return Err(AbiError::malformed("length word exceeds data"));
        }
        let padded = utils::padded_len(len);
        if self.validate {
            if padded > rest.len() {
                return Err(AbiError::malformed("unexpected end of data"));
            }
            if !utils::check_zeroes(&rest[len..padded]) {
                return Err(AbiError::malformed("nonzero padding after data"));
            }
        }
        self.offset += padded.min(rest.len());
        Ok(&rest[..len])
    }
}

/// Decodes one item of a sequence: static items in place, dynamic items
/// through their offset word.
fn decode_item(decoder: &mut Decoder<'_>, ty: &AbiType) -> Result<AbiValue> {
    if ty.is_dynamic() {
        let mut child = decoder.take_indirection()?;
        decode_payload(&mut child, ty)
    } else {
        decode_static(decoder, ty)
    }
}

/// Decodes a static value from the current read position.
fn decode_static(decoder: &mut Decoder<'_>, ty: &AbiType) -> Result<AbiValue> {
    match ty {
        AbiType::Bool => {
            let word = decoder.take_word()?;
            if decoder.validate && (!utils::check_zeroes(&word[..31]) || word[31] > 1) {
                return Err(AbiError::malformed("boolean word is not 0 or 1"));
            }
            Ok(AbiValue::Bool(word.iter().any(|b| *b != 0)))
        }
        AbiType::Uint(bits) => {
            let word = decoder.take_word()?;
            if !utils::fits_width(word, *bits, false) {
                return Err(AbiError::overflow(ty.name()));
            }
            Ok(AbiValue::Uint(U256::from_be_bytes(*word), *bits))
        }
        AbiType::Int(bits) => {
            let word = decoder.take_word()?;
            if !utils::fits_width(word, *bits, true) {
                return Err(AbiError::overflow(ty.name()));
            }
            Ok(AbiValue::Int(I256::from_raw(U256::from_be_bytes(*word)), *bits))
        }
        AbiType::Ufixed(bits, scale) => {
            let word = decoder.take_word()?;
            if !utils::fits_width(word, *bits, false) {
                return Err(AbiError::overflow(ty.name()));
            }
            Ok(AbiValue::Ufixed(U256::from_be_bytes(*word), *bits, *scale))
        }
        AbiType::Fixed(bits, scale) => {
            let word = decoder.take_word()?;
            if !utils::fits_width(word, *bits, true) {
                return Err(AbiError::overflow(ty.name()));
            }
            Ok(AbiValue::Fixed(I256::from_raw(U256::from_be_bytes(*word)), *bits, *scale))
        }
        AbiType::Address => {
            let word = decoder.take_word()?;
            if decoder.validate && !utils::check_zeroes(&word[..12]) {
                return Err(AbiError::malformed("address padding is not zero"));
            }
            Ok(AbiValue::Address(Address::from_word(B256::new(*word))))
        }
        AbiType::FixedBytes(size) => {
            let word = decoder.take_word()?;
            if decoder.validate && !utils::check_zeroes(&word[*size..]) {
                return Err(AbiError::malformed("fixed bytes padding is not zero"));
            }
            let mut out = B256::ZERO;
            out[..*size].copy_from_slice(&word[..*size]);
            Ok(AbiValue::FixedBytes(out, *size))
        }
        AbiType::FixedArray(..) | AbiType::Tuple(_) | AbiType::Struct { .. } => {
            decode_compound(decoder, ty)
        }
        AbiType::Bytes | AbiType::String | AbiType::Array(_) => {
            unreachable!("dynamic type decoded in static position")
        }
    }
}

/// Decodes the payload of a dynamic value. The decoder is rooted at the
/// payload, so nested offsets resolve against it.
fn decode_payload(decoder: &mut Decoder<'_>, ty: &AbiType) -> Result<AbiValue> {
    match ty {
        AbiType::Bytes => {
            let len = decoder.take_offset()?;
            Ok(AbiValue::Bytes(decoder.take_counted(len)?.to_vec()))
        }
        AbiType::String => {
            let len = decoder.take_offset()?;
            let bytes = decoder.take_counted(len)?;
            let s = if decoder.validate {
                String::from_utf8(bytes.to_vec())
                    .map_err(|_| AbiError::malformed("string data is not valid utf-8"))?
            } else {
                String::from_utf8_lossy(bytes).into_owned()
            };
            Ok(AbiValue::String(s))
        }
        AbiType::Array(elem) => {
            let count = decoder.take_offset()?;
            // Zero-sized element types would make the bound below vacuous:
            // any count could claim to fit in no data at all.
            if count > 0 && elem.min_words() == 0 {
                return Err(AbiError::malformed("array element type is zero-sized"));
            }
            let mut region = decoder.raw_child();
            let needed = count
                .checked_mul(elem.min_words())
                .ok_or_else(|| AbiError::malformed("array length out of range"))?;
            if region.remaining_words() < needed {
                return Err(AbiError::malformed("array length exceeds data"));
            }
            let mut vals = Vec::with_capacity(count.min(needed));
            for _ in 0..count {
                vals.push(decode_item(&mut region, elem)?);
            }
            Ok(AbiValue::Array(vals))
        }
        AbiType::FixedArray(..) | AbiType::Tuple(_) | AbiType::Struct { .. } => {
            decode_compound(decoder, ty)
        }
        _ => unreachable!("static type decoded in payload position"),
    }
}

/// Decodes a fixed array, tuple or struct field by field. Static compounds
/// read inline from their parent region; dynamic ones arrive here with a
/// decoder rooted at their payload. Either way the fields form a sequence
/// starting at the current read position.
fn decode_compound(decoder: &mut Decoder<'_>, ty: &AbiType) -> Result<AbiValue> {
    match ty {
        AbiType::FixedArray(elem, count) => {
            // The count comes from the descriptor, not the data, so cap the
            // reservation at what the region could possibly hold.
            let mut vals = Vec::with_capacity((*count).min(decoder.remaining_words()));
            for _ in 0..*count {
                vals.push(decode_item(decoder, elem)?);
            }
            Ok(AbiValue::FixedArray(vals))
        }
        AbiType::Tuple(types) => {
            let mut vals = Vec::with_capacity(types.len());
            for ty in types {
                vals.push(decode_item(decoder, ty)?);
            }
            Ok(AbiValue::Tuple(vals))
        }
        AbiType::Struct { name, fields } => {
            let mut tuple = Vec::with_capacity(fields.len());
            for (_, fty) in fields {
                tuple.push(decode_item(decoder, fty)?);
            }
            Ok(AbiValue::Struct {
                name: name.clone(),
                prop_names: fields.iter().map(|(fname, _)| fname.clone()).collect(),
                tuple,
            })
        }
        _ => unreachable!("scalar type decoded as compound"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{encode_params, encode_value};
    use alloy_primitives::hex;

    fn uint(value: u64) -> AbiValue {
        AbiValue::Uint(U256::from(value), 256)
    }

    #[test]
    fn decodes_single_word() {
        let data = hex!("0000000000000000000000000000000000000000000000000000000000000123");
        let value = decode_value(&AbiType::Uint(256), &data, true).unwrap();
        assert_eq!(value, uint(0x123));
    }

    #[test]
    fn decodes_string_payload() {
        let data = hex!(
            "0000000000000000000000000000000000000000000000000000000000000004"
            "6461766500000000000000000000000000000000000000000000000000000000"
        );
        let value = decode_value(&AbiType::String, &data, true).unwrap();
        assert_eq!(value, "dave".into());
    }

    #[test]
    fn element_offsets_are_relative_to_the_word_after_the_count() {
        let types = [AbiType::parse("string[]").unwrap()];
        let data = hex!(
            "0000000000000000000000000000000000000000000000000000000000000020"
            "0000000000000000000000000000000000000000000000000000000000000001"
            "0000000000000000000000000000000000000000000000000000000000000020"
            "0000000000000000000000000000000000000000000000000000000000000002"
            "6869000000000000000000000000000000000000000000000000000000000000"
        );
        let values = decode_params(&types, &data, true).unwrap();
        assert_eq!(values, [AbiValue::Array(vec!["hi".into()])]);
    }

    #[test]
    fn rejects_truncated_buffers() {
        let types = [AbiType::Uint(256), AbiType::Uint(256)];
        let data = hex!("0000000000000000000000000000000000000000000000000000000000000001");
        let err = decode_params(&types, &data, false).unwrap_err();
        assert_eq!(err, AbiError::MalformedData("unexpected end of data".into()));

        // A length word larger than the remaining data fails even when some
        // of the data is present.
        let data = hex!(
            "0000000000000000000000000000000000000000000000000000000000000020"
            "0000000000000000000000000000000000000000000000000000000000000005"
            "686900"
        );
        let err = decode_params(&[AbiType::Bytes], &data, false).unwrap_err();
        assert!(matches!(err, AbiError::MalformedData(_)));
    }

    #[test]
    fn rejects_out_of_range_offsets() {
        let data = hex!("0000000000000000000000000000000000000000000000000000000000000100");
        let err = decode_params(&[AbiType::Bytes], &data, false).unwrap_err();
        assert!(matches!(err, AbiError::MalformedData(_)));

        // An offset word too wide for the platform can never be valid.
        let data = hex!("ffffffffffffffffffffffffffffffffffffffffffffffff0000000000000020");
        let err = decode_params(&[AbiType::Bytes], &data, false).unwrap_err();
        assert!(matches!(err, AbiError::MalformedData(_)));
    }

    #[test]
    fn rejects_absurd_array_counts() {
        // Count word claims 2^40 elements in a two-word buffer.
        let data = hex!(
            "0000000000000000000000000000000000000000000000000000000000000020"
            "0000000000000000000000000000000000000000000000000000010000000000"
            "0000000000000000000000000000000000000000000000000000000000000001"
        );
        let types = [AbiType::parse("uint256[]").unwrap()];
        let err = decode_params(&types, &data, false).unwrap_err();
        assert_eq!(err, AbiError::MalformedData("array length exceeds data".into()));
    }

    #[test]
    fn rejects_arrays_of_zero_sized_elements() {
        // A count word claiming a million empty tuples, backed by no data.
        let data = hex!(
            "0000000000000000000000000000000000000000000000000000000000000020"
            "00000000000000000000000000000000000000000000000000000000000f4240"
        );
        for name in ["tuple()[]", "uint8[0][]"] {
            let types = [AbiType::parse(name).unwrap()];
            let err = decode_params(&types, &data, false).unwrap_err();
            assert_eq!(err, AbiError::MalformedData("array element type is zero-sized".into()));
        }

        // Empty arrays of such element types still round-trip.
        let types = [AbiType::parse("tuple()[]").unwrap()];
        let empty = encode_params(&types, &[AbiValue::Array(vec![])]).unwrap();
        assert_eq!(decode_params(&types, &empty, true).unwrap(), [AbiValue::Array(vec![])]);
    }

    #[test]
    fn rejects_fixed_array_counts_beyond_the_data() {
        let ty = AbiType::parse("uint256[4294967296]").unwrap();
        let data = hex!("0000000000000000000000000000000000000000000000000000000000000001");
        let err = decode_value(&ty, &data, false).unwrap_err();
        assert_eq!(err, AbiError::MalformedData("unexpected end of data".into()));
    }

    #[test]
    fn numeric_width_is_checked_in_both_modes() {
        let data = hex!("0000000000000000000000000000000000000000000000000000000000000100");
        for validate in [false, true] {
            let err = decode_value(&AbiType::Uint(8), &data, validate).unwrap_err();
            assert_eq!(err, AbiError::Overflow { ty: "uint8".into() });
        }

        // 0x0100 read as int8 is out of range, but as int16 it is 256.
        let err = decode_value(&AbiType::Int(8), &data, false).unwrap_err();
        assert!(matches!(err, AbiError::Overflow { .. }));
        let value = decode_value(&AbiType::Int(16), &data, false).unwrap();
        assert_eq!(value, AbiValue::Int(I256::try_from(256i64).unwrap(), 16));
    }

    #[test]
    fn sign_extension_round_trips() {
        let minus_two = AbiValue::Int(I256::try_from(-2i64).unwrap(), 16);
        let encoded = encode_value(&AbiType::Int(16), &minus_two).unwrap();
        assert_eq!(
            encoded,
            hex!("fffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffe")
        );
        assert_eq!(decode_value(&AbiType::Int(16), &encoded, true).unwrap(), minus_two);
    }

    #[test]
    fn validation_mode_rejects_noncanonical_words() {
        let two = hex!("0000000000000000000000000000000000000000000000000000000000000002");
        assert_eq!(decode_value(&AbiType::Bool, &two, false).unwrap(), AbiValue::Bool(true));
        assert!(matches!(
            decode_value(&AbiType::Bool, &two, true).unwrap_err(),
            AbiError::MalformedData(_)
        ));

        let dirty_address =
            hex!("0100000000000000000000001111111111111111111111111111111111111111");
        assert!(decode_value(&AbiType::Address, &dirty_address, false).is_ok());
        assert!(decode_value(&AbiType::Address, &dirty_address, true).is_err());

        let dirty_pad = hex!(
            "0000000000000000000000000000000000000000000000000000000000000002"
            "68690000000000000000000000000000000000000000000000000000000000ff"
        );
        assert_eq!(
            decode_value(&AbiType::Bytes, &dirty_pad, false).unwrap(),
            AbiValue::Bytes(b"hi".to_vec())
        );
        assert!(matches!(
            decode_value(&AbiType::Bytes, &dirty_pad, true).unwrap_err(),
            AbiError::MalformedData(_)
        ));

        let invalid_utf8 = hex!(
            "0000000000000000000000000000000000000000000000000000000000000002"
            "ff68000000000000000000000000000000000000000000000000000000000000"
        );
        assert!(decode_value(&AbiType::String, &invalid_utf8, false).is_ok());
        assert!(matches!(
            decode_value(&AbiType::String, &invalid_utf8, true).unwrap_err(),
            AbiError::MalformedData(_)
        ));
    }

    #[test]
    fn trailing_data_is_ignored() {
        let mut data = encode_params(&[AbiType::Bool], &[AbiValue::Bool(true)]).unwrap();
        data.extend_from_slice(&[0xffu8; 32]);
        let values = decode_params(&[AbiType::Bool], &data, true).unwrap();
        assert_eq!(values, [AbiValue::Bool(true)]);
    }

    #[test]
    fn empty_sequence_decodes_from_empty_data() {
        assert_eq!(decode_params(&[], &[], true).unwrap(), Vec::<AbiValue>::new());
    }

    #[test]
    fn decodes_structs_with_field_names() {
        let ty = AbiType::Struct {
            name: "Person".into(),
            fields: vec![("wallet".into(), AbiType::Address), ("label".into(), AbiType::String)],
        };
        let value = AbiValue::Struct {
            name: "Person".into(),
            prop_names: vec!["wallet".into(), "label".into()],
            tuple: vec![AbiValue::Address(Address::repeat_byte(0x11)), "abc".into()],
        };
        let encoded = encode_params(std::slice::from_ref(&ty), std::slice::from_ref(&value)).unwrap();
        let decoded = decode_params(std::slice::from_ref(&ty), &encoded, true).unwrap();
        assert_eq!(decoded, [value]);
    }
}
