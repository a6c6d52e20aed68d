//! Backend address parsing.
//!
//! Accepted forms:
//! - `host:port`: dialled directly
//! - `direct://host:port`: same as the bare form
//! - `scheme:///target`: handed to the channel untouched

use url::Url;

/// Where the backend channel should connect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// A single `host:port` address.
    Direct(String),
    /// A resolver target (`dns:///svc:9095`), not interpreted here.
    PassThrough(String),
}

impl Target {
    pub fn as_str(&self) -> &str {
        match self {
            Target::Direct(addr) | Target::PassThrough(addr) => addr,
        }
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AddressError {
    #[error("invalid backend address {address:?}: {source}")]
    Invalid {
        address: String,
        #[source]
        source: url::ParseError,
    },

    #[error("unrecognised scheme: {0}")]
    UnsupportedScheme(String),

    #[error("backend address {0:?} has no host")]
    MissingHost(String),
}

/// Parse a backend location string.
pub fn parse_address(unparsed: &str) -> Result<Target, AddressError> {
    if unparsed.contains(":///") {
        return Ok(Target::PassThrough(unparsed.to_string()));
    }

    if !unparsed.contains("://") {
        return Ok(Target::Direct(unparsed.to_string()));
    }

    let parsed = Url::parse(unparsed).map_err(|source| AddressError::Invalid {
        address: unparsed.to_string(),
        source,
    })?;

    match parsed.scheme() {
        "direct" => {
            let host = parsed
                .host_str()
                .filter(|h| !h.is_empty())
                .ok_or_else(|| AddressError::MissingHost(unparsed.to_string()))?;
            let addr = match parsed.port() {
                Some(port) => format!("{host}:{port}"),
                None => host.to_string(),
            };
            Ok(Target::Direct(addr))
        }
        other => Err(AddressError::UnsupportedScheme(other.to_string())),
    }
}
