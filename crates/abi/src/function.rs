//! Canonical signatures, selectors, and call and log plumbing.

use crate::{decode_params, encode_params, AbiError, AbiType, AbiValue, Result};
use alloy_primitives::{keccak256, Selector, B256};
use tracing::trace;

/// Renders the canonical signature `name(type1,...,typeN)`.
///
/// Named struct parameters appear in their expanded `tuple(...)` form, so
/// the signature depends only on the wire shape of the parameters.
pub fn signature(name: &str, params: &[AbiType]) -> String {
    let mut sig = String::with_capacity(name.len() + 2 + 16 * params.len());
    sig.push_str(name);
    sig.push('(');
    for (i, ty) in params.iter().enumerate() {
        if i > 0 {
            sig.push(',');
        }
        sig.push_str(&ty.selector_type());
    }
    sig.push(')');
    sig
}

/// The first four bytes of the digest of the canonical signature, used to
/// dispatch calls.
pub fn selector(name: &str, params: &[AbiType]) -> Selector {
    selector_with(name, params, |data| keccak256(data))
}

/// Like [`selector`], with the digest primitive supplied by the caller.
pub fn selector_with<F>(name: &str, params: &[AbiType], hash: F) -> Selector
where
    F: FnOnce(&[u8]) -> B256,
{
    let digest = hash(signature(name, params).as_bytes());
    Selector::from_slice(&digest[..4])
}

/// The full 32-byte digest of the canonical signature, used as the first
/// topic of non-anonymous logs.
pub fn event_signature_hash(name: &str, params: &[AbiType]) -> B256 {
    event_signature_hash_with(name, params, |data| keccak256(data))
}

/// Like [`event_signature_hash`], with the digest primitive supplied by the
/// caller.
pub fn event_signature_hash_with<F>(name: &str, params: &[AbiType], hash: F) -> B256
where
    F: FnOnce(&[u8]) -> B256,
{
    hash(signature(name, params).as_bytes())
}

/// A function declaration: name plus input and output types.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Function {
    /// The function name.
    pub name: String,
    /// Input parameter types, in declaration order.
    pub inputs: Vec<AbiType>,
    /// Output parameter types, in declaration order.
    pub outputs: Vec<AbiType>,
}

impl Function {
    /// Creates a function declaration.
    pub fn new(name: impl Into<String>, inputs: Vec<AbiType>, outputs: Vec<AbiType>) -> Self {
        Self { name: name.into(), inputs, outputs }
    }

    /// The canonical signature over the input types.
    pub fn signature(&self) -> String {
        signature(&self.name, &self.inputs)
    }

    /// The four-byte call selector.
    pub fn selector(&self) -> Selector {
        selector(&self.name, &self.inputs)
    }

    /// Encodes call data: the selector followed by the encoded arguments.
    pub fn abi_encode_input(&self, values: &[AbiValue]) -> Result<Vec<u8>> {
        trace!(function = %self.name, params = values.len(), "encoding call data");
        let body = encode_params(&self.inputs, values)?;
        let mut data = Vec::with_capacity(4 + body.len());
        data.extend_from_slice(self.selector().as_slice());
        data.extend_from_slice(&body);
        Ok(data)
    }

    /// Encodes the arguments without the selector, the form used for
    /// constructor arguments appended to deployment code.
    pub fn abi_encode_input_raw(&self, values: &[AbiValue]) -> Result<Vec<u8>> {
        encode_params(&self.inputs, values)
    }

    /// Decodes argument data that carries no selector.
    pub fn abi_decode_input(&self, data: &[u8], validate: bool) -> Result<Vec<AbiValue>> {
        decode_params(&self.inputs, data, validate)
    }

    /// Decodes full call data, checking that it starts with this function's
    /// selector.
    pub fn abi_decode_input_prefixed(&self, data: &[u8], validate: bool) -> Result<Vec<AbiValue>> {
        let Some((prefix, body)) = data.split_first_chunk::<4>() else {
            return Err(AbiError::malformed("unexpected end of data"));
        };
        if prefix != self.selector().as_slice() {
            return Err(AbiError::malformed(format!(
                "selector does not match {}",
                self.signature()
            )));
        }
        self.abi_decode_input(body, validate)
    }

    /// Encodes return data.
    pub fn abi_encode_output(&self, values: &[AbiValue]) -> Result<Vec<u8>> {
        encode_params(&self.outputs, values)
    }

    /// Decodes return data.
    pub fn abi_decode_output(&self, data: &[u8], validate: bool) -> Result<Vec<AbiValue>> {
        decode_params(&self.outputs, data, validate)
    }
}

/// One event parameter: a type plus its indexed flag.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventParam {
    /// The parameter name.
    pub name: String,
    /// The parameter type.
    pub ty: AbiType,
    /// Whether the parameter is stored in a topic rather than the data
    /// section.
    pub indexed: bool,
}

impl EventParam {
    /// Creates an event parameter.
    pub fn new(name: impl Into<String>, ty: AbiType, indexed: bool) -> Self {
        Self { name: name.into(), ty, indexed }
    }
}

/// An event declaration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Event {
    /// The event name.
    pub name: String,
    /// Event parameters, in declaration order.
    pub inputs: Vec<EventParam>,
    /// Whether the event omits the signature topic.
    pub anonymous: bool,
}

/// Values recovered from one log record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedEvent {
    /// Indexed parameter values, in declaration order. An indexed value
    /// whose type does not fit a single word is replaced by the 32-byte
    /// digest stored in its topic.
    pub indexed: Vec<AbiValue>,
    /// Non-indexed parameter values decoded from the data section, in
    /// declaration order.
    pub body: Vec<AbiValue>,
}

impl Event {
    /// Creates an event declaration.
    pub fn new(name: impl Into<String>, inputs: Vec<EventParam>, anonymous: bool) -> Self {
        Self { name: name.into(), inputs, anonymous }
    }

    /// The canonical signature over all parameters, indexed or not.
    pub fn signature(&self) -> String {
        let types: Vec<AbiType> = self.inputs.iter().map(|input| input.ty.clone()).collect();
        signature(&self.name, &types)
    }

    /// The signature digest stored as the first topic of non-anonymous
    /// logs.
    pub fn signature_hash(&self) -> B256 {
        keccak256(self.signature().as_bytes())
    }

    /// Number of topics a log of this event carries.
    pub fn topic_count(&self) -> usize {
        let indexed = self.inputs.iter().filter(|input| input.indexed).count();
        indexed + usize::from(!self.anonymous)
    }

    /// Decodes one log record against this declaration.
    ///
    /// The topic list must have exactly the declared shape, including the
    /// signature topic unless the event is anonymous. Indexed values that
    /// fit a single word are decoded from their topics; larger or dynamic
    /// indexed values are only present as digests, which are returned as
    /// 32-byte fixed bytes values.
    pub fn decode_log(&self, topics: &[B256], data: &[u8], validate: bool) -> Result<DecodedEvent> {
        trace!(event = %self.name, topics = topics.len(), data = data.len(), "decoding log");
        if topics.len() != self.topic_count() {
            return Err(AbiError::malformed(format!(
                "expected {} topics, got {}",
                self.topic_count(),
                topics.len()
            )));
        }

        let mut topics = topics.iter();
        if !self.anonymous {
            // Consumes the signature topic.
            if *next_topic(&mut topics)? != self.signature_hash() {
                return Err(AbiError::malformed(format!(
                    "signature topic does not match {}",
                    self.signature()
                )));
            }
        }

        let mut indexed = Vec::new();
        let mut body_types = Vec::new();
        for input in &self.inputs {
            if input.indexed {
                indexed.push(decode_topic(&input.ty, next_topic(&mut topics)?, validate)?);
            } else {
                body_types.push(input.ty.clone());
            }
        }

        let body = decode_params(&body_types, data, validate)?;
        Ok(DecodedEvent { indexed, body })
    }
}

fn next_topic<'a>(topics: &mut impl Iterator<Item = &'a B256>) -> Result<&'a B256> {
    topics.next().ok_or_else(|| AbiError::malformed("missing log topic"))
}

fn decode_topic(ty: &AbiType, topic: &B256, validate: bool) -> Result<AbiValue> {
    if ty.is_dynamic() || ty.head_size() != 32 {
        return Ok(AbiValue::FixedBytes(*topic, 32));
    }
    crate::decode_value(ty, topic.as_slice(), validate)
}
