//! Ordered converter chain. First success wins; head has priority.

use std::sync::Arc;

use super::{AddressConverter, Base58AddressConverter, DecodedAddress, ScriptType, SegWitBech32AddressConverter};
use crate::errors::AddressFormatError;
use crate::network::NetworkIdentity;

#[derive(Debug, Clone, Default)]
pub struct AddressConverterChain {
    converters: Vec<Arc<dyn AddressConverter>>,
}

impl AddressConverterChain {
    /// Chain from converters already in priority order.
    pub fn new(converters: Vec<Arc<dyn AddressConverter>>) -> Self {
        Self { converters }
    }

    /// `[bech32, base58]` for the given chain.
    pub fn for_network(network: &NetworkIdentity) -> Self {
        Self::new(vec![
            Arc::new(SegWitBech32AddressConverter::for_network(network)),
            Arc::new(Base58AddressConverter::for_network(network)),
        ])
    }

    /// Insert at head; the new converter wins ties.
    pub fn prepend(mut self, converter: Arc<dyn AddressConverter>) -> Self {
        self.converters.insert(0, converter);
        self
    }

    pub fn convert(&self, address: &str) -> Result<DecodedAddress, AddressFormatError> {
        let mut errors = Vec::with_capacity(self.converters.len());
        for converter in &self.converters {
            match converter.convert(address) {
                Ok(decoded) => return Ok(decoded),
                Err(e) => errors.push(e),
            }
        }
        Err(AddressFormatError::Unrecognized(errors))
    }

    pub fn encode(&self, payload: &[u8], script_type: ScriptType) -> Result<DecodedAddress, AddressFormatError> {
        let mut errors = Vec::with_capacity(self.converters.len());
        for converter in &self.converters {
            match converter.encode(payload, script_type) {
                Ok(encoded) => return Ok(encoded),
                Err(e) => errors.push(e),
            }
        }
        Err(AddressFormatError::Unrecognized(errors))
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.converters.iter().map(|c| c.name()).collect()
    }

    pub fn len(&self) -> usize { self.converters.len() }
    pub fn is_empty(&self) -> bool { self.converters.is_empty() }
}
