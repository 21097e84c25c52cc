//! Body codecs: pluggable payload encoders and response decoders.

use bytes::Bytes;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::CodecError;

/// Serializes a request payload into an outbound byte buffer.
///
/// An encoder must write a complete representation of `value` or fail with
/// an error wrapping the underlying cause. Implementations are selected
/// per call through [`with_encoder`](crate::with_encoder); [`JsonCodec`]
/// is the default.
pub trait Encoder<T: ?Sized>: Send + Sync {
    /// Write a complete representation of `value` into `sink`.
    fn encode(&self, value: &T, sink: &mut Vec<u8>) -> Result<(), CodecError>;
}

/// Deserializes a buffered response body into a typed value.
///
/// A decoder must fully consume the buffered `body` into a value or fail
/// with an error wrapping the underlying cause, including on partial or
/// truncated input.
pub trait Decoder<T>: Send + Sync {
    /// Produce a `T` from the fully buffered `body`.
    fn decode(&self, body: &[u8]) -> Result<T, CodecError>;
}

/// JSON codec backed by `serde_json`. The default in both directions.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl<T: Serialize + ?Sized> Encoder<T> for JsonCodec {
    fn encode(&self, value: &T, sink: &mut Vec<u8>) -> Result<(), CodecError> {
        serde_json::to_writer(&mut *sink, value).map_err(|e| CodecError::Serialize(e.into()))
    }
}

impl<T: DeserializeOwned> Decoder<T> for JsonCodec {
    fn decode(&self, body: &[u8]) -> Result<T, CodecError> {
        serde_json::from_slice(body).map_err(|e| CodecError::Deserialize(e.into()))
    }
}

/// `application/x-www-form-urlencoded` codec backed by `serde_urlencoded`.
///
/// Encoding follows the iteration order of the value; decoding rejects
/// malformed percent escapes.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormCodec;

impl<T: Serialize + ?Sized> Encoder<T> for FormCodec {
    fn encode(&self, value: &T, sink: &mut Vec<u8>) -> Result<(), CodecError> {
        let encoded =
            serde_urlencoded::to_string(value).map_err(|e| CodecError::Serialize(e.into()))?;
        sink.extend_from_slice(encoded.as_bytes());
        Ok(())
    }
}

impl<T: DeserializeOwned> Decoder<T> for FormCodec {
    fn decode(&self, body: &[u8]) -> Result<T, CodecError> {
        // The underlying parser passes broken escapes through as literal
        // text, so validate them up front.
        check_percent_escapes(body)?;
        serde_urlencoded::from_bytes(body).map_err(|e| CodecError::Deserialize(e.into()))
    }
}

fn check_percent_escapes(input: &[u8]) -> Result<(), CodecError> {
    let mut i = 0;
    while i < input.len() {
        if input[i] == b'%' {
            let valid = input.len() > i + 2
                && input[i + 1].is_ascii_hexdigit()
                && input[i + 2].is_ascii_hexdigit();
            if !valid {
                return Err(CodecError::Deserialize(
                    format!("malformed percent escape at byte {i}").into(),
                ));
            }
            i += 3;
        } else {
            i += 1;
        }
    }
    Ok(())
}

/// Verbatim passthrough codec for byte-shaped payloads and results.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawCodec;

impl Encoder<[u8]> for RawCodec {
    fn encode(&self, value: &[u8], sink: &mut Vec<u8>) -> Result<(), CodecError> {
        sink.extend_from_slice(value);
        Ok(())
    }
}

impl Encoder<Vec<u8>> for RawCodec {
    fn encode(&self, value: &Vec<u8>, sink: &mut Vec<u8>) -> Result<(), CodecError> {
        Encoder::<[u8]>::encode(self, value, sink)
    }
}

impl Encoder<Bytes> for RawCodec {
    fn encode(&self, value: &Bytes, sink: &mut Vec<u8>) -> Result<(), CodecError> {
        Encoder::<[u8]>::encode(self, value, sink)
    }
}

impl Encoder<str> for RawCodec {
    fn encode(&self, value: &str, sink: &mut Vec<u8>) -> Result<(), CodecError> {
        Encoder::<[u8]>::encode(self, value.as_bytes(), sink)
    }
}

impl Encoder<String> for RawCodec {
    fn encode(&self, value: &String, sink: &mut Vec<u8>) -> Result<(), CodecError> {
        Encoder::<[u8]>::encode(self, value.as_bytes(), sink)
    }
}

impl Decoder<Vec<u8>> for RawCodec {
    fn decode(&self, body: &[u8]) -> Result<Vec<u8>, CodecError> {
        Ok(body.to_vec())
    }
}

impl Decoder<Bytes> for RawCodec {
    fn decode(&self, body: &[u8]) -> Result<Bytes, CodecError> {
        Ok(Bytes::copy_from_slice(body))
    }
}

impl Decoder<String> for RawCodec {
    fn decode(&self, body: &[u8]) -> Result<String, CodecError> {
        String::from_utf8(body.to_vec()).map_err(|e| CodecError::Deserialize(e.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use std::collections::BTreeMap;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Nested {
        name: String,
        tags: Vec<String>,
        count: u32,
    }

    fn json_round_trip<T>(value: &T) -> T
    where
        T: Serialize + DeserializeOwned,
    {
        let mut buf = Vec::new();
        JsonCodec.encode(value, &mut buf).unwrap();
        JsonCodec.decode(&buf).unwrap()
    }

    #[test]
    fn test_json_round_trip_scalar() {
        assert_eq!(json_round_trip(&42u32), 42);
        assert_eq!(json_round_trip(&"hello".to_string()), "hello");
    }

    #[test]
    fn test_json_round_trip_nested() {
        let value = Nested {
            name: "widget".into(),
            tags: vec!["a".into(), "b".into()],
            count: 5,
        };
        assert_eq!(json_round_trip(&value), value);
    }

    #[test]
    fn test_json_round_trip_empty_payload() {
        let value: BTreeMap<String, String> = BTreeMap::new();
        assert_eq!(json_round_trip(&value), value);
    }

    #[test]
    fn test_json_decode_truncated_input_fails() {
        let err = Decoder::<serde_json::Value>::decode(&JsonCodec, b"{\"a\":1").unwrap_err();
        assert!(matches!(err, CodecError::Deserialize(_)));
    }

    #[test]
    fn test_form_round_trip() {
        let mut value = BTreeMap::new();
        value.insert("test".to_string(), "1".to_string());
        value.insert("test2".to_string(), "2".to_string());

        let mut buf = Vec::new();
        FormCodec.encode(&value, &mut buf).unwrap();
        assert_eq!(buf, b"test=1&test2=2");

        let decoded: BTreeMap<String, String> = FormCodec.decode(&buf).unwrap();
        assert_eq!(decoded, value);
    }

    #[test]
    fn test_form_encodes_reserved_characters() {
        let pairs = vec![("q".to_string(), "a b&c".to_string())];
        let mut buf = Vec::new();
        FormCodec.encode(&pairs, &mut buf).unwrap();
        assert_eq!(buf, b"q=a+b%26c");
    }

    #[test]
    fn test_form_decode_malformed_escape_fails() {
        let err =
            Decoder::<BTreeMap<String, String>>::decode(&FormCodec, b"password=fsd%zzf").unwrap_err();
        assert!(err.to_string().contains("malformed percent escape"));

        let err = Decoder::<BTreeMap<String, String>>::decode(&FormCodec, b"key=%4").unwrap_err();
        assert!(matches!(err, CodecError::Deserialize(_)));
    }

    #[test]
    fn test_raw_passthrough() {
        let mut buf = Vec::new();
        RawCodec.encode("raw body".as_bytes(), &mut buf).unwrap();
        assert_eq!(buf, b"raw body");

        let decoded: Vec<u8> = RawCodec.decode(&buf).unwrap();
        assert_eq!(decoded, b"raw body");

        let decoded: Bytes = RawCodec.decode(&buf).unwrap();
        assert_eq!(decoded.as_ref(), b"raw body");
    }

    #[test]
    fn test_raw_decode_invalid_utf8_string_fails() {
        let err = Decoder::<String>::decode(&RawCodec, &[0xff, 0xfe]).unwrap_err();
        assert!(matches!(err, CodecError::Deserialize(_)));
    }
}
