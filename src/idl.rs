//! IDL resolver interface.
//!
//! Parsing `.thrift` IDL text is out of scope for this crate; what's in
//! scope is the narrow lookup interface the decoder consults once a message
//! has been decoded, so that numeric field ids can be replaced by names.
//! Callers who do have a parsed IDL supply the result via [`IdlIndex`].

use crate::error::IdlError;
use std::collections::HashMap;

/// The service, parameter, and exception field names for one RPC method.
#[derive(Debug, Clone, Default)]
pub struct MethodSignature {
    pub service_name: String,
    params: HashMap<i16, String>,
    exceptions: HashMap<i16, String>,
}

impl MethodSignature {
    pub fn new(service_name: impl Into<String>) -> Self {
        MethodSignature {
            service_name: service_name.into(),
            params: HashMap::new(),
            exceptions: HashMap::new(),
        }
    }

    pub fn with_param(mut self, id: i16, name: impl Into<String>) -> Self {
        self.params.insert(id, name.into());
        self
    }

    pub fn with_exception(mut self, id: i16, name: impl Into<String>) -> Self {
        self.exceptions.insert(id, name.into());
        self
    }

    pub fn param_name(&self, id: i16) -> Option<&str> {
        self.params.get(&id).map(String::as_str)
    }

    pub fn exception_name(&self, id: i16) -> Option<&str> {
        self.exceptions.get(&id).map(String::as_str)
    }
}

/// A pure lookup consulted after a message completes, to decorate field
/// positions with names.
pub trait IdlResolver: Send + Sync {
    fn find_method(&self, name: &str) -> Option<MethodSignature>;
}

/// The default resolver when no IDL was supplied: every lookup misses, and
/// renderings fall back to numeric field ids.
#[derive(Debug, Default)]
pub struct NullIdlResolver;

impl IdlResolver for NullIdlResolver {
    fn find_method(&self, _name: &str) -> Option<MethodSignature> {
        None
    }
}

/// An in-memory index built ahead of time from already-parsed method
/// signatures. Constructing an `IdlIndex` is the supported entry point for
/// callers who parse `idl_files` themselves.
#[derive(Debug, Default)]
pub struct IdlIndex {
    methods: HashMap<String, MethodSignature>,
}

impl IdlIndex {
    /// Builds an index from `(method_name, signature)` pairs, rejecting a
    /// duplicate method name rather than silently keeping the last one.
    pub fn from_signatures(
        signatures: impl IntoIterator<Item = (String, MethodSignature)>,
    ) -> Result<Self, IdlError> {
        let mut methods = HashMap::new();
        for (name, signature) in signatures {
            if methods.insert(name.clone(), signature).is_some() {
                return Err(IdlError::DuplicateMethod(name));
            }
        }
        Ok(IdlIndex { methods })
    }
}

impl IdlResolver for IdlIndex {
    fn find_method(&self, name: &str) -> Option<MethodSignature> {
        self.methods.get(name).cloned()
    }
}
