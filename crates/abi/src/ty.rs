//! ABI type descriptors.
//!
//! An [`AbiType`] describes the shape of a value independently of any
//! particular value: the elementary building blocks (`bool`, `uintN`,
//! `address`, ...), fixed and dynamically sized sequences of them, and
//! anonymous or named field groupings. Descriptors are plain data; they can
//! be built programmatically or parsed from canonical type names with
//! [`AbiType::parse`].

use crate::{AbiError, Result};
use std::fmt;
use std::str::FromStr;

/// An ABI type descriptor.
///
/// Named structs carry their declared name and field names so that
/// diagnostics and decoded values stay readable, but their wire shape is
/// exactly that of the equivalent anonymous tuple.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum AbiType {
    /// Boolean, encoded as one word holding 0 or 1.
    Bool,
    /// Unsigned integer of the given bit width. Widths are multiples of 8
    /// between 8 and 256.
    Uint(usize),
    /// Signed two's complement integer of the given bit width.
    Int(usize),
    /// Unsigned fixed-point decimal: `ufixed<bits>x<scale>`.
    Ufixed(usize, usize),
    /// Signed fixed-point decimal: `fixed<bits>x<scale>`.
    Fixed(usize, usize),
    /// 20-byte account address, encoded left-padded to one word.
    Address,
    /// Fixed-size byte string of 1 to 32 bytes, encoded right-padded.
    FixedBytes(usize),
    /// Dynamically sized byte string.
    Bytes,
    /// Dynamically sized UTF-8 string.
    String,
    /// Fixed-length array: `T[N]`.
    FixedArray(Box<AbiType>, usize),
    /// Dynamically sized array: `T[]`.
    Array(Box<AbiType>),
    /// Anonymous ordered field grouping: `tuple(T1,...,Tn)`.
    Tuple(Vec<AbiType>),
    /// Named field grouping. Encodes identically to the tuple of its field
    /// types; the name stands in for the expansion in canonical type names.
    Struct {
        /// The declared struct name.
        name: String,
        /// Field names paired with their types, in declaration order.
        fields: Vec<(String, AbiType)>,
    },
}

impl AbiType {
    /// Constructs a `uint<bits>` descriptor, checking the width.
    pub fn uint(bits: usize) -> Result<Self> {
        validate_int_bits(bits)?;
        Ok(Self::Uint(bits))
    }

    /// Constructs an `int<bits>` descriptor, checking the width.
    pub fn int(bits: usize) -> Result<Self> {
        validate_int_bits(bits)?;
        Ok(Self::Int(bits))
    }

    /// Constructs a `ufixed<bits>x<scale>` descriptor, checking both sizes.
    pub fn ufixed(bits: usize, scale: usize) -> Result<Self> {
        validate_fixed_size(bits, scale)?;
        Ok(Self::Ufixed(bits, scale))
    }

    /// Constructs a `fixed<bits>x<scale>` descriptor, checking both sizes.
    pub fn fixed(bits: usize, scale: usize) -> Result<Self> {
        validate_fixed_size(bits, scale)?;
        Ok(Self::Fixed(bits, scale))
    }

    /// Constructs a `bytes<size>` descriptor, checking the size.
    pub fn fixed_bytes(size: usize) -> Result<Self> {
        validate_bytes_size(size)?;
        Ok(Self::FixedBytes(size))
    }

    /// Checks that every width, size and scale in this descriptor tree is
    /// legal. Descriptors built through the checked constructors or
    /// [`parse`](Self::parse) are always valid; this exists for descriptors
    /// assembled directly from the enum variants.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Uint(bits) | Self::Int(bits) => validate_int_bits(*bits),
            Self::Ufixed(bits, scale) | Self::Fixed(bits, scale) => {
                validate_fixed_size(*bits, *scale)
            }
            Self::FixedBytes(size) => validate_bytes_size(*size),
            Self::FixedArray(ty, _) | Self::Array(ty) => ty.validate(),
            Self::Tuple(types) => types.iter().try_for_each(Self::validate),
            Self::Struct { fields, .. } => fields.iter().try_for_each(|(_, ty)| ty.validate()),
            _ => Ok(()),
        }
    }

    /// Whether values of this type have a data-dependent encoded size.
    ///
    /// Dynamic types are referenced through an offset word in their
    /// enclosing sequence; static types are encoded inline.
    pub fn is_dynamic(&self) -> bool {
        match self {
            Self::Bytes | Self::String | Self::Array(_) => true,
            Self::FixedArray(ty, _) => ty.is_dynamic(),
            Self::Tuple(types) => types.iter().any(Self::is_dynamic),
            Self::Struct { fields, .. } => fields.iter().any(|(_, ty)| ty.is_dynamic()),
            _ => false,
        }
    }

    /// Number of bytes a value of this type occupies in the head region of
    /// its enclosing sequence. Static types occupy their full encoding;
    /// dynamic types occupy the single offset word.
    pub fn head_size(&self) -> usize {
        if self.is_dynamic() {
            return 32;
        }
        match self {
            // Saturate: a parsed descriptor can carry counts far beyond any
            // buffer, and a saturated size still fails every bounds check.
            Self::FixedArray(ty, count) => count.saturating_mul(ty.head_size()),
            Self::Tuple(types) => {
                types.iter().map(Self::head_size).fold(0, usize::saturating_add)
            }
            Self::Struct { fields, .. } => {
                fields.iter().map(|(_, ty)| ty.head_size()).fold(0, usize::saturating_add)
            }
            _ => 32,
        }
    }

    /// Lower bound on the number of words the encoding of one value of this
    /// type occupies, used to reject length words no buffer could satisfy.
    pub(crate) fn min_words(&self) -> usize {
        if self.is_dynamic() { 1 } else { self.head_size() / 32 }
    }

    /// The canonical name of this type. Named structs print their declared
    /// name; see [`selector_type`](Self::selector_type) for the expanded
    /// spelling used in signatures.
    pub fn name(&self) -> String {
        self.to_string()
    }

    /// The type name as it appears in function and event signatures, with
    /// named structs expanded to their `tuple(...)` form.
    pub fn selector_type(&self) -> String {
        SelectorType(self).to_string()
    }

    /// Flattens a named struct into its leaf fields, in declaration order.
    ///
    /// Nested struct fields are replaced by their own flattened fields in
    /// place, depth first, so `Baz { bar: Bar { a, b }, c }` flattens to
    /// `[a, b, c]`. Returns `None` for anything that is not a struct.
    pub fn flatten_fields(&self) -> Option<Vec<(&str, &AbiType)>> {
        let Self::Struct { fields, .. } = self else { return None };
        let mut out = Vec::with_capacity(fields.len());
        collect_flat(fields, &mut out);
        Some(out)
    }

    /// Parses a canonical type name.
    ///
    /// Accepts the elementary names with their short aliases (`uint` for
    /// `uint256`, `int` for `int256`, `fixed`/`ufixed` for the 128x18
    /// defaults), `tuple(...)` groupings with or without the `tuple`
    /// keyword, and any chain of `[N]`/`[]` array suffixes. Named structs
    /// have no parseable spelling; they are built programmatically.
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(AbiError::unsupported("empty type name"));
        }

        // The stem ends at the first '[' outside any parentheses; the rest
        // of the string is the array suffix chain.
        let mut depth = 0usize;
        let mut stem_end = s.len();
        for (i, b) in s.bytes().enumerate() {
            match b {
                b'(' => depth += 1,
                b')' => {
                    depth = depth
                        .checked_sub(1)
                        .ok_or_else(|| unbalanced(s))?;
                }
                b'[' if depth == 0 => {
                    stem_end = i;
                    break;
                }
                _ => {}
            }
        }

        let (stem, suffixes) = s.split_at(stem_end);
        let mut ty = Self::parse_stem(stem)?;

        let mut rest = suffixes;
        while !rest.is_empty() {
            let inner = rest
                .strip_prefix('[')
                .and_then(|r| r.find(']').map(|close| (&r[..close], &r[close + 1..])));
            let Some((count, tail)) = inner else {
                return Err(AbiError::unsupported(format!("invalid array suffix in `{s}`")));
            };
            ty = if count.is_empty() {
                Self::Array(Box::new(ty))
            } else {
                Self::FixedArray(Box::new(ty), parse_digits(count, s)?)
            };
            rest = tail;
        }
        Ok(ty)
    }

    fn parse_stem(s: &str) -> Result<Self> {
        if let Some(parens) = s.strip_prefix("tuple") {
            if parens.starts_with('(') {
                return Self::parse_tuple(parens);
            }
        }
        if s.starts_with('(') {
            return Self::parse_tuple(s);
        }
        Self::parse_root(s)
    }

    fn parse_tuple(s: &str) -> Result<Self> {
        let inner = s
            .strip_prefix('(')
            .and_then(|s| s.strip_suffix(')'))
            .ok_or_else(|| unbalanced(s))?;
        let inner = inner.trim();
        if inner.is_empty() {
            return Ok(Self::Tuple(vec![]));
        }

        let mut types = Vec::new();
        let mut depth = 0usize;
        let mut start = 0;
        for (i, b) in inner.bytes().enumerate() {
            match b {
                b'(' => depth += 1,
                b')' => {
                    depth = depth
                        .checked_sub(1)
                        .ok_or_else(|| unbalanced(s))?;
                }
                b',' if depth == 0 => {
                    types.push(Self::parse(&inner[start..i])?);
                    start = i + 1;
                }
                _ => {}
            }
        }
        if depth != 0 {
            return Err(unbalanced(s));
        }
        // A trailing comma leaves an empty final segment.
        let last = inner[start..].trim();
        if last.is_empty() {
            return Err(AbiError::unsupported(format!("trailing comma in `{s}`")));
        }
        types.push(Self::parse(last)?);
        Ok(Self::Tuple(types))
    }

    fn parse_root(s: &str) -> Result<Self> {
        match s {
            "address" => Ok(Self::Address),
            "bool" => Ok(Self::Bool),
            "string" => Ok(Self::String),
            "bytes" => Ok(Self::Bytes),
            "uint" => Ok(Self::Uint(256)),
            "int" => Ok(Self::Int(256)),
            "fixed" => Ok(Self::Fixed(128, 18)),
            "ufixed" => Ok(Self::Ufixed(128, 18)),
            _ => {
                if let Some(size) = s.strip_prefix("bytes") {
                    Self::fixed_bytes(parse_digits(size, s)?)
                } else if let Some(bits) = s.strip_prefix("uint") {
                    Self::uint(parse_digits(bits, s)?)
                } else if let Some(bits) = s.strip_prefix("int") {
                    Self::int(parse_digits(bits, s)?)
                } else if let Some(sizes) = s.strip_prefix("ufixed") {
                    let (bits, scale) = parse_fixed_sizes(sizes, s)?;
                    Self::ufixed(bits, scale)
                } else if let Some(sizes) = s.strip_prefix("fixed") {
                    let (bits, scale) = parse_fixed_sizes(sizes, s)?;
                    Self::fixed(bits, scale)
                } else {
                    Err(AbiError::unsupported(format!("unknown type name: `{s}`")))
                }
            }
        }
    }
}

impl FromStr for AbiType {
    type Err = AbiError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for AbiType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool => f.write_str("bool"),
            Self::Uint(bits) => write!(f, "uint{bits}"),
            Self::Int(bits) => write!(f, "int{bits}"),
            Self::Ufixed(bits, scale) => write!(f, "ufixed{bits}x{scale}"),
            Self::Fixed(bits, scale) => write!(f, "fixed{bits}x{scale}"),
            Self::Address => f.write_str("address"),
            Self::FixedBytes(size) => write!(f, "bytes{size}"),
            Self::Bytes => f.write_str("bytes"),
            Self::String => f.write_str("string"),
            Self::FixedArray(ty, count) => write!(f, "{ty}[{count}]"),
            Self::Array(ty) => write!(f, "{ty}[]"),
            Self::Tuple(types) => {
                f.write_str("tuple(")?;
                for (i, ty) in types.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{ty}")?;
                }
                f.write_str(")")
            }
            Self::Struct { name, .. } => f.write_str(name),
        }
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for AbiType {
    /// Serializes as the signature spelling of the canonical name, which is
    /// self-contained: named structs appear in expanded `tuple(...)` form.
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.selector_type())
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for AbiType {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = <String as serde::Deserialize<'de>>::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Prints a descriptor the way it is spelled inside a signature.
struct SelectorType<'a>(&'a AbiType);

impl SelectorType<'_> {
    fn write_list<'a>(
        f: &mut fmt::Formatter<'_>,
        types: impl Iterator<Item = &'a AbiType>,
    ) -> fmt::Result {
        f.write_str("tuple(")?;
        for (i, ty) in types.enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", SelectorType(ty))?;
        }
        f.write_str(")")
    }
}

impl fmt::Display for SelectorType<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            AbiType::FixedArray(ty, count) => write!(f, "{}[{count}]", SelectorType(ty)),
            AbiType::Array(ty) => write!(f, "{}[]", SelectorType(ty)),
            AbiType::Tuple(types) => Self::write_list(f, types.iter()),
            AbiType::Struct { fields, .. } => {
                Self::write_list(f, fields.iter().map(|(_, ty)| ty))
            }
            ty => write!(f, "{ty}"),
        }
    }
}

fn collect_flat<'a>(fields: &'a [(String, AbiType)], out: &mut Vec<(&'a str, &'a AbiType)>) {
    for (name, ty) in fields {
        match ty {
            AbiType::Struct { fields: inner, .. } => collect_flat(inner, out),
            _ => out.push((name.as_str(), ty)),
        }
    }
}

fn validate_int_bits(bits: usize) -> Result<()> {
    if bits == 0 || bits > 256 || bits % 8 != 0 {
        return Err(AbiError::unsupported(format!("invalid integer width: {bits}")));
    }
    Ok(())
}

fn validate_fixed_size(bits: usize, scale: usize) -> Result<()> {
    validate_int_bits(bits)?;
    if scale == 0 || scale > 80 {
        return Err(AbiError::unsupported(format!("invalid fixed-point scale: {scale}")));
    }
    Ok(())
}

fn validate_bytes_size(size: usize) -> Result<()> {
    if size == 0 || size > 32 {
        return Err(AbiError::unsupported(format!("invalid fixed bytes size: {size}")));
    }
    Ok(())
}

fn parse_digits(digits: &str, whole: &str) -> Result<usize> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AbiError::unsupported(format!("unknown type name: `{whole}`")));
    }
    digits
        .parse()
        .map_err(|_| AbiError::unsupported(format!("size out of range in `{whole}`")))
}

fn parse_fixed_sizes(sizes: &str, whole: &str) -> Result<(usize, usize)> {
    let Some((bits, scale)) = sizes.split_once('x') else {
        return Err(AbiError::unsupported(format!("unknown type name: `{whole}`")));
    };
    Ok((parse_digits(bits, whole)?, parse_digits(scale, whole)?))
}

fn unbalanced(s: &str) -> AbiError {
    AbiError::unsupported(format!("unbalanced parentheses in `{s}`"))
}
