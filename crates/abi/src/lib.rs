//! Contract ABI codec: typed values to and from the platform calling
//! convention.
//!
//! Everything on the wire is a sequence of 32-byte words. A parameter list
//! encodes as a head region and a tail region: static values lie inline in
//! the head, dynamic values leave a big-endian offset word behind and put
//! their payload in the tail. Offsets are relative to the region they
//! appear in, so the same scheme nests for arrays of arrays of strings.
//!
//! The codec is stateless and all-or-nothing. [`AbiType`] describes shapes,
//! [`AbiValue`] carries data, [`encode_params`]/[`decode_params`] convert
//! whole parameter sequences, and [`Function`]/[`Event`] add the selector
//! and topic plumbing on top.
//!
//! # Examples
//!
//! ```
//! use ethwire_abi::{AbiType, AbiValue, Function};
//! use alloy_primitives::{Address, U256};
//!
//! let transfer = Function::new(
//!     "transfer",
//!     vec![AbiType::Address, AbiType::Uint(256)],
//!     vec![AbiType::Bool],
//! );
//! assert_eq!(transfer.signature(), "transfer(address,uint256)");
//!
//! let args = [
//!     AbiValue::Address(Address::repeat_byte(0x11)),
//!     AbiValue::Uint(U256::from(1_000_000u64), 256),
//! ];
//! let data = transfer.abi_encode_input(&args)?;
//! assert_eq!(&data[..4], [0xa9, 0x05, 0x9c, 0xbb]);
//!
//! let back = transfer.abi_decode_input(&data[4..], true)?;
//! assert_eq!(back, args);
//! # Ok::<_, ethwire_abi::AbiError>(())
//! ```

#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

mod decode;
mod encode;
mod error;
mod function;
mod packed;
mod ty;
mod utils;
mod value;

pub use decode::{decode_params, decode_value};
pub use encode::{encode_params, encode_value};
pub use error::{AbiError, Result};
pub use function::{
    event_signature_hash, event_signature_hash_with, selector, selector_with, signature,
    DecodedEvent, Event, EventParam, Function,
};
pub use packed::encode_packed;
pub use ty::AbiType;
pub use value::AbiValue;

/// The 32-byte word of the wire format.
pub type Word = alloy_primitives::B256;
