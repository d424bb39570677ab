//! Codec Module
//!
//! Value serialization used by the remote bridge. The default is bincode;
//! JSON and closure-based codecs are also provided.

use std::fmt;
use std::marker::PhantomData;

use serde::{de::DeserializeOwned, Serialize};

use crate::error::{CodecError, ConfigError};

// == Codec Trait ==
/// Converts cache values to and from the bytes kept in the remote store.
pub trait Codec<V>: Send + Sync {
    fn serialize(&self, value: &V) -> Result<Vec<u8>, CodecError>;

    fn deserialize(&self, bytes: &[u8]) -> Result<V, CodecError>;

    /// Reports whether both operations are available.
    ///
    /// Called once when a cache is built; a failure aborts construction.
    fn check(&self) -> Result<(), ConfigError> {
        Ok(())
    }
}

// == Bincode ==
/// Compact binary codec for any serde type.
#[derive(Debug, Clone, Copy, Default)]
pub struct BincodeCodec;

impl<V> Codec<V> for BincodeCodec
where
    V: Serialize + DeserializeOwned,
{
    fn serialize(&self, value: &V) -> Result<Vec<u8>, CodecError> {
        bincode::serialize(value).map_err(|e| CodecError::Serialize(e.to_string()))
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<V, CodecError> {
        bincode::deserialize(bytes).map_err(|e| CodecError::Deserialize(e.to_string()))
    }
}

// == JSON ==
/// Human-readable codec. Required for self-describing values such as
/// `serde_json::Value`, which bincode cannot decode.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl<V> Codec<V> for JsonCodec
where
    V: Serialize + DeserializeOwned,
{
    fn serialize(&self, value: &V) -> Result<Vec<u8>, CodecError> {
        serde_json::to_vec(value).map_err(|e| CodecError::Serialize(e.to_string()))
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<V, CodecError> {
        serde_json::from_slice(bytes).map_err(|e| CodecError::Deserialize(e.to_string()))
    }
}

// == Closure Codec ==
pub type SerializeFn<V> = Box<dyn Fn(&V) -> Result<Vec<u8>, CodecError> + Send + Sync>;
pub type DeserializeFn<V> = Box<dyn Fn(&[u8]) -> Result<V, CodecError> + Send + Sync>;

/// Codec assembled from a pair of closures, either of which may be missing.
///
/// A cache refuses to build with an incomplete `FnCodec`.
pub struct FnCodec<V> {
    serialize: Option<SerializeFn<V>>,
    deserialize: Option<DeserializeFn<V>>,
    _value: PhantomData<fn() -> V>,
}

impl<V> FnCodec<V> {
    pub fn new(serialize: Option<SerializeFn<V>>, deserialize: Option<DeserializeFn<V>>) -> Self {
        Self {
            serialize,
            deserialize,
            _value: PhantomData,
        }
    }

    /// Builds a complete codec from two closures.
    pub fn from_fns<S, D>(serialize: S, deserialize: D) -> Self
    where
        S: Fn(&V) -> Result<Vec<u8>, CodecError> + Send + Sync + 'static,
        D: Fn(&[u8]) -> Result<V, CodecError> + Send + Sync + 'static,
    {
        Self::new(Some(Box::new(serialize)), Some(Box::new(deserialize)))
    }
}

impl<V> Codec<V> for FnCodec<V> {
    fn serialize(&self, value: &V) -> Result<Vec<u8>, CodecError> {
        let serialize = self
            .serialize
            .as_ref()
            .ok_or(CodecError::MissingOperation("serialize"))?;
        serialize(value)
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<V, CodecError> {
        let deserialize = self
            .deserialize
            .as_ref()
            .ok_or(CodecError::MissingOperation("deserialize"))?;
        deserialize(bytes)
    }

    fn check(&self) -> Result<(), ConfigError> {
        if self.serialize.is_none() {
            return Err(ConfigError::MissingCodecOperation("serialize"));
        }
        if self.deserialize.is_none() {
            return Err(ConfigError::MissingCodecOperation("deserialize"));
        }
        Ok(())
    }
}

impl<V> fmt::Debug for FnCodec<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnCodec")
            .field("serialize", &self.serialize.is_some())
            .field("deserialize", &self.deserialize.is_some())
            .finish()
    }
}
