//! Ahead-of-time compilation of JSS style sheets.
//!
//! Calls such as `createStyleSheet({ a: { color: 'red' } })` are rewritten so that the statically
//! known styles arrive precompiled under the `"@raw"` key, with the generated class names passed
//! in the options argument:
//!
//! ```js
//! createStyleSheet({ "@raw": ".a-0 {\n  color: red;\n}" }, { "classes": { "a": "a-0" } });
//! ```
//!
//! Properties whose value can't be known at compile time are left for the runtime.
use std::sync::Arc;

pub use classify::{PropertyMap, StaticValue};
pub use compiler::{CompiledSheet, HyphenatePlugin, StylePlugin};
pub use config::{ClassNaming, PrecompileConfig, DEFAULT_IDENTIFIER};
pub use errors::{CallSiteError, ConfigError};
pub use naming::{ClassNamer, CounterClassNamer, HashClassNamer, NamingContext};
pub use visitor::{CompiledCall, JssPrecompileVisitor};

use crate::compiler::{builtin_plugin, StyleSheetCompiler};
use crate::naming::class_namer_for;
use crate::recognizer::CallSiteRecognizer;

pub mod classify;
pub mod compiler;
mod config;
mod errors;
pub mod naming;
pub mod recognizer;
pub mod resolve;
pub mod rewrite;
pub mod serialize;
mod visitor;

/// Key of the precompiled style text in a rewritten style description.
pub const RAW_STYLES_KEY: &str = "@raw";
/// Key of the generated class names in the options argument.
pub const CLASSES_KEY: &str = "classes";

/// Configured precompiler for a build. Hands out one [`JssPrecompileVisitor`] per file; all of
/// them share the class naming state.
pub struct JssPrecompiler {
  recognizer: CallSiteRecognizer,
  namer: Arc<dyn ClassNamer>,
  plugins: Vec<Arc<dyn StylePlugin>>,
  options: Arc<serde_json::Value>,
}

impl JssPrecompiler {
  pub fn new(config: PrecompileConfig) -> Result<Self, ConfigError> {
    config.validate()?;

    let plugins = config
      .plugins
      .iter()
      .map(|name| builtin_plugin(name).ok_or_else(|| ConfigError::UnknownPlugin(name.clone())))
      .collect::<Result<Vec<_>, _>>()?;

    Ok(JssPrecompiler {
      recognizer: CallSiteRecognizer::new(&config.identifiers),
      namer: class_namer_for(&config.class_naming),
      plugins,
      options: Arc::new(config.jss_options),
    })
  }

  /// Replace the configured naming strategy.
  pub fn with_class_namer(mut self, namer: impl ClassNamer + 'static) -> Self {
    self.namer = Arc::new(namer);
    self
  }

  /// Add a compiler stage after the configured ones.
  pub fn with_plugin(mut self, plugin: impl StylePlugin + 'static) -> Self {
    self.plugins.push(Arc::new(plugin));
    self
  }

  pub fn visitor(&self, file_name: impl Into<String>) -> JssPrecompileVisitor {
    JssPrecompileVisitor::new(
      file_name.into(),
      self.recognizer.clone(),
      StyleSheetCompiler::new(self.namer.clone(), self.plugins.clone()),
      self.options.clone(),
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_rejects_invalid_config() {
    let config = PrecompileConfig {
      plugins: vec!["hyphenate".into(), "prefixer".into()],
      ..Default::default()
    };
    assert!(matches!(
      JssPrecompiler::new(config),
      Err(ConfigError::UnknownPlugin(name)) if name == "prefixer"
    ));

    let config = PrecompileConfig {
      identifiers: vec![],
      ..Default::default()
    };
    assert!(matches!(
      JssPrecompiler::new(config),
      Err(ConfigError::NoIdentifiers)
    ));

    let config = PrecompileConfig {
      identifiers: vec!["create-sheet".into()],
      ..Default::default()
    };
    assert!(matches!(
      JssPrecompiler::new(config),
      Err(ConfigError::InvalidIdentifier(name)) if name == "create-sheet"
    ));
  }

  #[test]
  fn test_accepts_builtin_plugins() {
    let config = PrecompileConfig::from_json(r#"{ "plugins": ["hyphenate"] }"#).unwrap();
    assert!(JssPrecompiler::new(config).is_ok());
  }
}
