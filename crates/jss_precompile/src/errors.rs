use swc_core::common::Span;

/// Invalid configuration. Returned before any module is visited.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
  #[error("At least one style sheet identifier must be configured")]
  NoIdentifiers,
  #[error("Invalid style sheet identifier {0:?}")]
  InvalidIdentifier(String),
  #[error("Unknown compiler plugin {0:?}")]
  UnknownPlugin(String),
  #[error("Failed to parse configuration: {0}")]
  Parse(#[from] serde_json::Error),
}

/// A recognized call that cannot be precompiled. The call is left untouched.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CallSiteError {
  #[error("Style description is not an object literal or a reference to one")]
  MalformedStyleDescription { span: Span },
  #[error("Selector {selector:?} collides with the reserved raw style key")]
  ReservedKeyCollision { span: Span, selector: String },
  #[error("Spread entries are not supported in a style description")]
  UnsupportedSpread { span: Span },
}

impl CallSiteError {
  pub fn span(&self) -> Span {
    match self {
      CallSiteError::MalformedStyleDescription { span }
      | CallSiteError::ReservedKeyCollision { span, .. }
      | CallSiteError::UnsupportedSpread { span } => *span,
    }
  }
}
