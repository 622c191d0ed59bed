//! Module-specific payload decoders
//!
//! The payload following the common [`PamData`] fields depends on the
//! module that wrote the file. Decoders are looked up by the module type
//! named in the file header, so new module types can be supported by
//! registering a decoder without touching the container decoder.
use crate::error::{Error, ErrorKind, Result};
use crate::model::Payload;
use crate::parser::gemini;
use crate::parser::pamdata::PamData;
use crate::parser::read::Reader;
use std::collections::HashMap;
use std::fmt;

/// Decodes the payload of one data record
pub trait PayloadDecoder: Send + Sync {
    /// Decode the payload at the reader's position
    ///
    /// `pam` holds the already decoded common fields of the record.
    fn decode(&self, reader: &mut Reader<'_>, pam: &PamData) -> Result<Payload>;
}

/// Decoder for the Gemini Threshold Detector track payload
#[derive(Debug, Clone, Copy, Default)]
pub struct GeminiDecoder;

impl PayloadDecoder for GeminiDecoder {
    fn decode(&self, reader: &mut Reader<'_>, _pam: &PamData) -> Result<Payload> {
        Ok(Payload::Track(reader.read()?))
    }
}

/// A map from module type to payload decoder
///
/// The default registry knows every module type this crate implements.
pub struct PayloadRegistry {
    decoders: HashMap<String, Box<dyn PayloadDecoder>>,
}

impl PayloadRegistry {
    /// A registry without any decoders
    pub fn empty() -> Self {
        PayloadRegistry {
            decoders: HashMap::new(),
        }
    }

    /// Register `decoder` for `module_type`, replacing any previous one
    pub fn register<D>(&mut self, module_type: impl Into<String>, decoder: D) -> &mut Self
    where
        D: PayloadDecoder + 'static,
    {
        self.decoders.insert(module_type.into(), Box::new(decoder));
        self
    }

    /// The decoder registered for `module_type`
    pub fn get(&self, module_type: &str) -> Option<&dyn PayloadDecoder> {
        self.decoders.get(module_type).map(|d| d.as_ref())
    }

    /// Whether a decoder is registered for `module_type`
    pub fn supports(&self, module_type: &str) -> bool {
        self.decoders.contains_key(module_type)
    }

    /// The registered module types
    pub fn module_types(&self) -> impl Iterator<Item = &str> {
        self.decoders.keys().map(|k| k.as_str())
    }

    /// Decode a payload with the decoder registered for `module_type`
    ///
    /// # Errors
    ///
    /// Fails with [`ErrorKind::UnsupportedModuleType`] if no decoder is
    /// registered.
    pub fn decode(
        &self,
        module_type: &str,
        reader: &mut Reader<'_>,
        pam: &PamData,
    ) -> Result<Payload> {
        let decoder = self.get(module_type).ok_or_else(|| {
            Error::new(
                reader.position(),
                ErrorKind::UnsupportedModuleType(module_type.to_string()),
            )
        })?;
        decoder.decode(reader, pam)
    }
}

impl Default for PayloadRegistry {
    fn default() -> Self {
        let mut registry = PayloadRegistry::empty();
        registry.register(gemini::MODULE_TYPE, GeminiDecoder);
        registry
    }
}

impl fmt::Debug for PayloadRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.module_types()).finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn default_registry_knows_gemini() {
        let registry = PayloadRegistry::default();
        assert!(registry.supports("Gemini Threshold Detector"));
        assert!(!registry.supports("Click Detector"));
        assert!(PayloadRegistry::empty().module_types().next().is_none());
    }

    #[test]
    fn unknown_module_type_is_named() {
        let buf = [0u8; 4];
        let mut r = Reader::new(&buf);
        let pam = PamData::default();
        let err = PayloadRegistry::default()
            .decode("WhistlesMoans", &mut r, &pam)
            .unwrap_err();
        assert!(matches!(err.kind, ErrorKind::UnsupportedModuleType(ref m) if m == "WhistlesMoans"));
    }
}
