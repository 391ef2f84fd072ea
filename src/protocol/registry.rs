use crate::core::packet::{parse_with_scheme, peek_header, PacketScheme};
use crate::error::{constants, ProtocolError, Result};
use std::collections::HashMap;
use tracing::debug;

/// Maps packet type codes to the scheme they travel under.
///
/// Built once, then shared read-only; parsing never mutates it, so no lock is
/// needed for concurrent use.
#[derive(Debug, Clone, Default)]
pub struct PacketRegistry {
    schemes: HashMap<u32, PacketScheme>,
}

impl PacketRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign `scheme` to `packet_type`.
    ///
    /// Registering the same pair twice is a no-op; changing the scheme of an
    /// already-registered type is refused.
    pub fn register(&mut self, packet_type: u32, scheme: PacketScheme) -> Result<()> {
        match self.schemes.get(&packet_type) {
            Some(existing) if *existing != scheme => Err(ProtocolError::ConfigError(format!(
                "{}: type {packet_type} is {existing:?}",
                constants::ERR_SCHEME_CONFLICT
            ))),
            Some(_) => Ok(()),
            None => {
                self.schemes.insert(packet_type, scheme);
                Ok(())
            }
        }
    }

    /// Builder-style [`register`](Self::register)
    pub fn with(mut self, packet_type: u32, scheme: PacketScheme) -> Result<Self> {
        self.register(packet_type, scheme)?;
        Ok(self)
    }

    pub fn scheme_for(&self, packet_type: u32) -> Result<PacketScheme> {
        self.schemes
            .get(&packet_type)
            .copied()
            .ok_or(ProtocolError::UnexpectedMessage(packet_type))
    }

    pub fn len(&self) -> usize {
        self.schemes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemes.is_empty()
    }

    /// Parse a packet using the scheme registered for its type.
    pub fn parse(&self, bytes: &[u8], key: Option<&[u8]>) -> Result<(u32, Vec<u8>)> {
        let header = peek_header(bytes)?;
        let scheme = self.scheme_for(header.packet_type)?;
        debug!(packet_type = header.packet_type, ?scheme, "Dispatching packet");
        parse_with_scheme(bytes, scheme, key)
    }
}
