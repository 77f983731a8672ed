//! The seam every datastore connection is created through.

use std::fmt;

use async_trait::async_trait;

use crate::config::Settings;

use super::error::InfraError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectorKind {
    Primary,
    Secondary,
    Document,
}

impl ConnectorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Secondary => "secondary",
            Self::Document => "document",
        }
    }
}

impl fmt::Display for ConnectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Creates one live datastore handle from validated settings.
///
/// `connect` is called once per process; the handle it returns is shared
/// by reference with every feature module that declares a need for it.
#[async_trait]
pub trait Connector: Send + Sync {
    type Handle: Send + Sync + 'static;

    fn kind(&self) -> ConnectorKind;

    async fn connect(&self, settings: &Settings) -> Result<Self::Handle, InfraError>;
}
