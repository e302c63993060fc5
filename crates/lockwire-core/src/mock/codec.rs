use lockwire_model::{SignedToken, TerminalReply, TerminalRequest};

use crate::{codec::NativeCodec, error::ProtocolError};

/// JSON codec with a deterministic fake signature.
#[derive(Clone, Copy, Debug, Default)]
pub struct FakeCodec;

impl FakeCodec {
    fn to_json<T: serde::Serialize>(value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(|e| ProtocolError::Encode(e.to_string()))
    }

    fn from_json<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(bytes).map_err(|e| ProtocolError::Decode(e.to_string()))
    }
}

impl NativeCodec for FakeCodec {
    fn sign(&self, data: &[u8], private_key: &[u8]) -> Result<Vec<u8>, ProtocolError> {
        if private_key.is_empty() {
            return Err(ProtocolError::InvalidArguments("empty private key".into()));
        }
        let folded = data
            .iter()
            .enumerate()
            .fold(0u8, |acc, (i, b)| acc ^ b ^ private_key[i % private_key.len()]);
        Ok(format!("fake-sig:{}:{folded:02x}", data.len()).into_bytes())
    }

    fn encode_token(&self, token: &SignedToken) -> Result<Vec<u8>, ProtocolError> {
        Self::to_json(token)
    }

    fn decode_token(&self, bytes: &[u8]) -> Result<SignedToken, ProtocolError> {
        Self::from_json(bytes)
    }

    fn encode_request(&self, request: &TerminalRequest) -> Result<Vec<u8>, ProtocolError> {
        Self::to_json(request)
    }

    fn decode_reply(&self, bytes: &[u8]) -> Result<TerminalReply, ProtocolError> {
        Self::from_json(bytes)
    }
}

impl FakeCodec {
    /// Terminal side: decode a request envelope.
    pub fn decode_request(&self, bytes: &[u8]) -> Result<TerminalRequest, ProtocolError> {
        Self::from_json(bytes)
    }

    /// Terminal side: encode a reply envelope.
    pub fn encode_reply(&self, reply: &TerminalReply) -> Result<Vec<u8>, ProtocolError> {
        Self::to_json(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_depends_on_key_and_data() {
        let codec = FakeCodec;
        let a = codec.sign(b"payload", b"key-1").unwrap();
        let b = codec.sign(b"payload", b"key-2").unwrap();
        assert_ne!(a, b);
        assert!(codec.sign(b"payload", b"").is_err());
    }

    #[test]
    fn truncated_request_does_not_decode() {
        let codec = FakeCodec;
        let bytes = codec
            .encode_request(&TerminalRequest {
                signed_token: vec![1, 2, 3],
                application_payload: vec![],
            })
            .unwrap();
        assert!(codec.decode_request(&bytes[..bytes.len() - 1]).is_err());
        assert!(codec.decode_request(&bytes).is_ok());
    }
}
