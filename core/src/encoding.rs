//! Body encoders for structured request bodies.
//!
//! An encoder turns a `Serialize` value into bytes and names the content
//! type those bytes carry. The builder treats it as opaque: on failure it
//! records a [`ConfigError::Serialization`] and leaves the body alone.

use serde::Serialize;

use crate::error::ConfigError;

pub trait BodyEncoder {
    /// Value sent as `Content-Type`.
    fn content_type(&self) -> &'static str;

    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, ConfigError>;
}

/// `application/json` through serde_json.
#[derive(Debug, Clone, Copy, Default)]
pub struct Json;

impl BodyEncoder for Json {
    fn content_type(&self) -> &'static str {
        "application/json"
    }

    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, ConfigError> {
        serde_json::to_vec(value).map_err(|e| ConfigError::Serialization {
            format: "json",
            message: e.to_string(),
        })
    }
}

/// `application/xml` through quick-xml. The root element is named after the
/// serialized type.
#[derive(Debug, Clone, Copy, Default)]
pub struct Xml;

impl BodyEncoder for Xml {
    fn content_type(&self) -> &'static str {
        "application/xml"
    }

    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, ConfigError> {
        quick_xml::se::to_string(value)
            .map(String::into_bytes)
            .map_err(|e| ConfigError::Serialization {
                format: "xml",
                message: e.to_string(),
            })
    }
}
