use serde::Deserialize;
use swc_core::ecma::ast::Ident;

use crate::errors::ConfigError;

pub const DEFAULT_IDENTIFIER: &str = "createStyleSheet";

fn default_identifiers() -> Vec<String> {
  vec![DEFAULT_IDENTIFIER.to_string()]
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrecompileConfig {
  /// Names of the functions whose calls are precompiled.
  ///
  /// Defaults to `["createStyleSheet"]`
  #[serde(default = "default_identifiers")]
  pub identifiers: Vec<String>,
  /// Built-in strategy used to generate class names when no custom namer is installed.
  #[serde(default)]
  pub class_naming: ClassNaming,
  /// Built-in compiler plugins, applied in order.
  #[serde(default)]
  pub plugins: Vec<String>,
  /// Passed through untouched to the class namer and plugins.
  #[serde(default)]
  pub jss_options: serde_json::Value,
}

impl Default for PrecompileConfig {
  fn default() -> PrecompileConfig {
    PrecompileConfig {
      identifiers: default_identifiers(),
      class_naming: ClassNaming::default(),
      plugins: vec![],
      jss_options: serde_json::Value::Null,
    }
  }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(tag = "strategy", rename_all = "camelCase")]
pub enum ClassNaming {
  /// `<prefix><selector>-<n>`, `n` counting up across the whole run
  Counter {
    #[serde(default)]
    prefix: String,
  },
  /// `<prefix><selector>-<hash>`, stable for a given file, call and selector
  Hash {
    #[serde(default)]
    prefix: String,
  },
}

impl Default for ClassNaming {
  fn default() -> Self {
    ClassNaming::Counter {
      prefix: String::new(),
    }
  }
}

impl PrecompileConfig {
  pub fn from_json(json: &str) -> Result<Self, ConfigError> {
    let config: PrecompileConfig = serde_json::from_str(json)?;
    Ok(config)
  }

  pub(crate) fn validate(&self) -> Result<(), ConfigError> {
    if self.identifiers.is_empty() {
      return Err(ConfigError::NoIdentifiers);
    }

    if let Some(invalid) = self
      .identifiers
      .iter()
      .find(|name| Ident::verify_symbol(name).is_err())
    {
      return Err(ConfigError::InvalidIdentifier(invalid.clone()));
    }

    Ok(())
  }
}
