use lockwire_model::{SignedToken, TerminalReply, TerminalRequest};

use crate::error::ProtocolError;

/// Boundary to the native crypto/codec library.
///
/// Every call takes and returns plain byte buffers; the binary token and envelope
/// formats stay inside the library and are never interpreted here.
pub trait NativeCodec: Send + Sync + 'static {
    /// Signs `data` with `private_key`, returning the signature bytes.
    fn sign(&self, data: &[u8], private_key: &[u8]) -> Result<Vec<u8>, ProtocolError>;

    fn encode_token(&self, token: &SignedToken) -> Result<Vec<u8>, ProtocolError>;
    fn decode_token(&self, bytes: &[u8]) -> Result<SignedToken, ProtocolError>;

    fn encode_request(&self, request: &TerminalRequest) -> Result<Vec<u8>, ProtocolError>;
    fn decode_reply(&self, bytes: &[u8]) -> Result<TerminalReply, ProtocolError>;
}
