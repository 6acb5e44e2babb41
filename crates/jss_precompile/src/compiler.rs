use std::sync::Arc;

use indexmap::IndexMap;

use crate::classify::PropertyMap;
use crate::naming::{ClassNameAllocator, ClassNamer, NamingContext};
use crate::serialize::{serialize_property, serialize_rule};

/// The compiled static part of one call's style description.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CompiledSheet {
  /// Rule blocks for every selector with static properties, separated by newlines
  pub raw_text: String,
  /// Selector name to generated class name, in declaration order
  pub classes: IndexMap<String, String>,
}

/// A compiler stage.
///
/// `process_properties` runs on every selector before it is serialized, in the order the plugins
/// were configured. Stages keep the key order of the mapping they receive.
pub trait StylePlugin: Send + Sync {
  fn name(&self) -> &str;

  fn process_properties(
    &self,
    _selector: &str,
    properties: PropertyMap,
    _context: &NamingContext<'_>,
  ) -> PropertyMap {
    properties
  }

  /// Called with the finished sheet of every recognized call, including empty ones.
  fn on_process_sheet(&self, _sheet: &CompiledSheet, _context: &NamingContext<'_>) {}
}

/// Rewrites camelCase property names to kebab-case: `backgroundColor` to `background-color`.
#[derive(Clone, Copy, Debug, Default)]
pub struct HyphenatePlugin;

impl HyphenatePlugin {
  pub const NAME: &'static str = "hyphenate";
}

impl StylePlugin for HyphenatePlugin {
  fn name(&self) -> &str {
    HyphenatePlugin::NAME
  }

  fn process_properties(
    &self,
    _selector: &str,
    properties: PropertyMap,
    _context: &NamingContext<'_>,
  ) -> PropertyMap {
    properties
      .into_iter()
      .map(|(name, value)| (hyphenate(&name), value))
      .collect()
  }
}

fn hyphenate(name: &str) -> String {
  let mut hyphenated = String::with_capacity(name.len() + 4);
  for c in name.chars() {
    if c.is_ascii_uppercase() {
      hyphenated.push('-');
      hyphenated.push(c.to_ascii_lowercase());
    } else {
      hyphenated.push(c);
    }
  }
  hyphenated
}

/// Looks up a built-in plugin by its configuration name.
pub fn builtin_plugin(name: &str) -> Option<Arc<dyn StylePlugin>> {
  match name {
    HyphenatePlugin::NAME => Some(Arc::new(HyphenatePlugin)),
    _ => None,
  }
}

/// Turns the static properties of a call into a [`CompiledSheet`].
#[derive(Clone)]
pub struct StyleSheetCompiler {
  namer: Arc<dyn ClassNamer>,
  plugins: Vec<Arc<dyn StylePlugin>>,
}

impl StyleSheetCompiler {
  pub fn new(namer: Arc<dyn ClassNamer>, plugins: Vec<Arc<dyn StylePlugin>>) -> Self {
    StyleSheetCompiler { namer, plugins }
  }

  /// Compile `(selector, properties)` pairs in the order given. Every selector gets a class, even
  /// when it has nothing to print.
  pub fn compile<'r, I>(&self, rules: I, context: &NamingContext<'_>) -> CompiledSheet
  where
    I: IntoIterator<Item = (&'r str, &'r PropertyMap)>,
  {
    let mut sheet = CompiledSheet::default();
    let mut blocks = vec![];
    let mut allocator = ClassNameAllocator::new(self.namer.as_ref());

    for (selector, properties) in rules {
      let class_name = allocator.allocate(selector, context);

      let properties = self
        .plugins
        .iter()
        .fold(properties.clone(), |properties, plugin| {
          plugin.process_properties(selector, properties, context)
        });

      let mut declarations = Vec::with_capacity(properties.len());
      for (name, value) in &properties {
        match serialize_property(name, value) {
          Ok(declaration) => declarations.push(declaration),
          Err(error) => {
            tracing::warn!(%selector, property = %name, "Dropping property: {}", error);
          }
        }
      }

      let block = serialize_rule(&class_name, &declarations);
      if !block.is_empty() {
        blocks.push(block);
      }
      sheet.classes.insert(selector.to_string(), class_name);
    }

    sheet.raw_text = blocks.join("\n");

    for plugin in &self.plugins {
      plugin.on_process_sheet(&sheet, context);
    }

    sheet
  }
}
