use indexmap::IndexMap;
use swc_core::common::Spanned;
use swc_core::ecma::ast::*;

use crate::errors::CallSiteError;
use crate::resolve::{DeclarationTable, Resolution, UnresolvedReason};
use crate::serialize::serialize_value;
use crate::RAW_STYLES_KEY;

/// A property value that is fully known at compile time.
#[derive(Clone, Debug, PartialEq)]
pub enum StaticValue {
  Str(String),
  Num(f64),
  List(Vec<StaticValue>),
}

/// Static properties of one selector, in declaration order.
pub type PropertyMap = IndexMap<String, StaticValue>;

/// Why a value has to be left for the runtime to compute.
#[derive(Clone, Debug, PartialEq)]
pub enum DynamicReason {
  Callable,
  Call,
  Unresolved(UnresolvedReason),
  /// A literal the serializer has no text form for (`true`, `null`, regexes, ...)
  UnsupportedLiteral,
  /// Nested rules and fallbacks are compiled by the runtime
  NestedMapping,
  /// Lists nested more than one level deep
  NestingTooDeep,
  /// Holes and spread elements in lists, spread entries in mappings
  Spread,
  /// A computed key that does not reduce to a string or number
  UnresolvedKey,
  Other,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Classification {
  Static(StaticValue),
  Dynamic(DynamicReason),
}

/// One top-level entry of a style description after classification.
#[derive(Clone, Debug)]
pub enum SelectorClassification {
  /// The selector's property mapping was visible; its properties are partitioned.
  Split {
    name: String,
    key: PropName,
    static_props: PropertyMap,
    dynamic_props: Vec<PropOrSpread>,
  },
  /// Nothing about the selector is known statically; the entry is kept verbatim.
  Opaque {
    name: Option<String>,
    entry: PropOrSpread,
    reason: DynamicReason,
  },
}

impl SelectorClassification {
  pub fn name(&self) -> Option<&str> {
    match self {
      SelectorClassification::Split { name, .. } => Some(name),
      SelectorClassification::Opaque { name, .. } => name.as_deref(),
    }
  }

  /// Static or mixed. Empty mappings count as static.
  pub fn has_static_part(&self) -> bool {
    matches!(self, SelectorClassification::Split { dynamic_props, static_props, .. }
      if !static_props.is_empty() || dynamic_props.is_empty())
  }

  pub fn has_dynamic_part(&self) -> bool {
    match self {
      SelectorClassification::Split { dynamic_props, .. } => !dynamic_props.is_empty(),
      SelectorClassification::Opaque { .. } => true,
    }
  }
}

#[derive(Clone, Debug, Default)]
pub struct StyleClassification {
  pub selectors: Vec<SelectorClassification>,
}

impl StyleClassification {
  pub fn has_static_part(&self) -> bool {
    self.selectors.iter().any(|s| s.has_static_part())
  }
}

/// Splits style descriptions into what can be compiled now and what the runtime has to compute.
pub struct StyleClassifier<'a> {
  table: &'a DeclarationTable,
}

impl<'a> StyleClassifier<'a> {
  pub fn new(table: &'a DeclarationTable) -> Self {
    StyleClassifier { table }
  }

  /// Classify the first argument of a recognized call.
  pub fn classify_styles(&self, styles: &Expr) -> Result<StyleClassification, CallSiteError> {
    let Resolution::Resolved(Expr::Object(object)) = self.table.resolve_expr(styles) else {
      return Err(CallSiteError::MalformedStyleDescription { span: styles.span() });
    };

    let mut selectors = Vec::with_capacity(object.props.len());
    for entry in &object.props {
      let PropOrSpread::Prop(prop) = entry else {
        return Err(CallSiteError::UnsupportedSpread { span: entry.span() });
      };

      let selector = self.classify_selector(entry, prop);
      if selector.name() == Some(RAW_STYLES_KEY) {
        return Err(CallSiteError::ReservedKeyCollision {
          span: prop.span(),
          selector: RAW_STYLES_KEY.to_string(),
        });
      }
      selectors.push(selector);
    }

    Ok(StyleClassification { selectors })
  }

  fn classify_selector(&self, entry: &PropOrSpread, prop: &Prop) -> SelectorClassification {
    let opaque = |name: Option<String>, reason: DynamicReason| SelectorClassification::Opaque {
      name,
      entry: entry.clone(),
      reason,
    };

    let (key, value) = match prop {
      Prop::KeyValue(kv) => (kv.key.clone(), &*kv.value),
      Prop::Shorthand(ident) => {
        return match self.table.resolve_ident(ident) {
          Resolution::Resolved(value) => self.classify_rule(
            ident.sym.to_string(),
            PropName::Ident(IdentName::new(ident.sym.clone(), ident.span)),
            entry,
            value,
          ),
          Resolution::Unresolved(reason) => {
            opaque(Some(ident.sym.to_string()), unresolved_reason(reason))
          }
        };
      }
      Prop::Method(method) => {
        return opaque(self.key_name(&method.key), DynamicReason::Callable);
      }
      Prop::Getter(getter) => {
        return opaque(self.key_name(&getter.key), DynamicReason::Callable);
      }
      Prop::Setter(setter) => {
        return opaque(self.key_name(&setter.key), DynamicReason::Callable);
      }
      Prop::Assign(_) => return opaque(None, DynamicReason::Other),
    };

    match self.key_name(&key) {
      Some(name) => self.classify_rule(name, key, entry, value),
      None => opaque(None, DynamicReason::UnresolvedKey),
    }
  }

  /// Partition one selector's property mapping, property by property.
  fn classify_rule(
    &self,
    name: String,
    key: PropName,
    entry: &PropOrSpread,
    value: &Expr,
  ) -> SelectorClassification {
    let object = match self.table.resolve_expr(value) {
      Resolution::Resolved(Expr::Object(object)) => object,
      Resolution::Resolved(other) => {
        return SelectorClassification::Opaque {
          name: Some(name),
          entry: entry.clone(),
          reason: self.dynamic_reason_of(other),
        };
      }
      Resolution::Unresolved(reason) => {
        return SelectorClassification::Opaque {
          name: Some(name),
          entry: entry.clone(),
          reason: unresolved_reason(reason),
        };
      }
    };

    let mut static_props = PropertyMap::new();
    let mut dynamic_props = vec![];

    for property in &object.props {
      let PropOrSpread::Prop(prop) = property else {
        // Spreads may override anything declared before them
        return SelectorClassification::Opaque {
          name: Some(name),
          entry: entry.clone(),
          reason: DynamicReason::Spread,
        };
      };

      let classified = match &**prop {
        Prop::KeyValue(kv) => match self.key_name(&kv.key) {
          Some(property_name) => (property_name, self.classify_value(&kv.value)),
          None => (
            String::new(),
            Classification::Dynamic(DynamicReason::UnresolvedKey),
          ),
        },
        Prop::Shorthand(ident) => (
          ident.sym.to_string(),
          self.classify_value(&Expr::Ident(ident.clone())),
        ),
        _ => (
          String::new(),
          Classification::Dynamic(DynamicReason::Callable),
        ),
      };

      match classified {
        (property_name, Classification::Static(value)) if serialize_value(&value).is_ok() => {
          static_props.insert(property_name, value);
        }
        (property_name, Classification::Static(_)) => {
          tracing::trace!(selector = %name, property = %property_name, "Style property has no text form");
          dynamic_props.push(property.clone());
        }
        (property_name, Classification::Dynamic(reason)) => {
          tracing::trace!(selector = %name, property = %property_name, ?reason, "Dynamic style property");
          dynamic_props.push(property.clone());
        }
      }
    }

    SelectorClassification::Split {
      name,
      key,
      static_props,
      dynamic_props,
    }
  }

  /// The static name of a key, resolving computed keys through the declaration table.
  pub fn key_name(&self, key: &PropName) -> Option<String> {
    match key {
      PropName::Ident(ident) => Some(ident.sym.to_string()),
      PropName::Str(s) => Some(s.value.to_string()),
      PropName::Num(n) => Some(format_number(n.value)),
      PropName::BigInt(b) => Some(b.value.to_string()),
      PropName::Computed(computed) => match self.classify_value(&computed.expr) {
        Classification::Static(StaticValue::Str(name)) => Some(name),
        Classification::Static(StaticValue::Num(n)) => Some(format_number(n)),
        _ => None,
      },
    }
  }

  /// Classify a property value.
  pub fn classify_value(&self, expr: &Expr) -> Classification {
    self.classify_at_depth(expr, 0)
  }

  fn classify_at_depth(&self, expr: &Expr, list_depth: usize) -> Classification {
    let expr = match self.table.resolve_expr(expr) {
      Resolution::Resolved(expr) => expr,
      Resolution::Unresolved(reason) => {
        return Classification::Dynamic(unresolved_reason(reason));
      }
    };

    match expr {
      Expr::Lit(Lit::Str(s)) => Classification::Static(StaticValue::Str(s.value.to_string())),
      Expr::Lit(Lit::Num(n)) => Classification::Static(StaticValue::Num(n.value)),
      Expr::Tpl(tpl) if tpl.exprs.is_empty() => {
        let text = tpl
          .quasis
          .iter()
          .map(|quasi| {
            quasi
              .cooked
              .as_ref()
              .map(|cooked| cooked.to_string())
              .unwrap_or_else(|| quasi.raw.to_string())
          })
          .collect::<String>();
        Classification::Static(StaticValue::Str(text))
      }
      Expr::Unary(UnaryExpr { op, arg, .. })
        if matches!(op, UnaryOp::Minus | UnaryOp::Plus) && arg.is_lit() =>
      {
        match &**arg {
          Expr::Lit(Lit::Num(n)) if *op == UnaryOp::Minus => {
            Classification::Static(StaticValue::Num(-n.value))
          }
          Expr::Lit(Lit::Num(n)) => Classification::Static(StaticValue::Num(n.value)),
          _ => Classification::Dynamic(DynamicReason::UnsupportedLiteral),
        }
      }
      Expr::Array(array) => {
        if list_depth >= 2 {
          return Classification::Dynamic(DynamicReason::NestingTooDeep);
        }

        let mut items = Vec::with_capacity(array.elems.len());
        for element in &array.elems {
          let Some(ExprOrSpread { spread: None, expr }) = element else {
            return Classification::Dynamic(DynamicReason::Spread);
          };

          match self.classify_at_depth(expr, list_depth + 1) {
            Classification::Static(item) => items.push(item),
            dynamic => return dynamic,
          }
        }

        Classification::Static(StaticValue::List(items))
      }
      other => Classification::Dynamic(self.dynamic_reason_of(other)),
    }
  }

  fn dynamic_reason_of(&self, expr: &Expr) -> DynamicReason {
    match expr {
      Expr::Arrow(_) | Expr::Fn(_) => DynamicReason::Callable,
      Expr::Call(_) | Expr::New(_) | Expr::TaggedTpl(_) | Expr::OptChain(_) => DynamicReason::Call,
      Expr::Object(_) => DynamicReason::NestedMapping,
      Expr::Lit(_) => DynamicReason::UnsupportedLiteral,
      _ => DynamicReason::Other,
    }
  }
}

fn unresolved_reason(reason: UnresolvedReason) -> DynamicReason {
  match reason {
    UnresolvedReason::FunctionDeclaration => DynamicReason::Callable,
    reason => DynamicReason::Unresolved(reason),
  }
}

/// Numbers as JavaScript prints them for the common cases: `1`, `0.5`, `-2`.
pub fn format_number(value: f64) -> String {
  if value == 0.0 {
    // Covers -0
    return "0".to_string();
  }
  value.to_string()
}

#[cfg(test)]
mod tests {
  use indoc::indoc;
  use jss_swc_runner::test_utils::run_test_visit_const;
  use pretty_assertions::assert_eq;
  use swc_core::ecma::visit::{Visit, VisitWith};

  use super::*;
  use crate::recognizer::CallSiteRecognizer;

  struct Classify {
    result: Option<Result<StyleClassification, CallSiteError>>,
  }

  impl Visit for Classify {
    fn visit_module(&mut self, module: &Module) {
      let table = DeclarationTable::collect(module);
      let call_sites = CallSiteRecognizer::new(&["createStyleSheet"]).find_call_sites(module);
      let styles = call_sites[0].styles_arg().unwrap();
      self.result = Some(StyleClassifier::new(&table).classify_styles(styles));
    }
  }

  fn classify(code: &str) -> Result<StyleClassification, CallSiteError> {
    run_test_visit_const(code, |_| Classify { result: None })
      .visitor
      .result
      .unwrap()
  }

  fn split(selector: &SelectorClassification) -> (&str, &PropertyMap, usize) {
    match selector {
      SelectorClassification::Split {
        name,
        static_props,
        dynamic_props,
        ..
      } => (name.as_str(), static_props, dynamic_props.len()),
      SelectorClassification::Opaque { .. } => panic!("expected a split selector"),
    }
  }

  fn str_value(value: &str) -> StaticValue {
    StaticValue::Str(value.to_string())
  }

  #[test]
  fn test_static_and_dynamic_values() {
    let result = classify(indoc! {r#"
      function f() {}
      createStyleSheet({
        a: {
          color: 'red',
          width: 0,
          margin: -2,
          font: `bold`,
          handler: () => {},
          other: function () {},
          ref: f,
          call: compute(),
          flag: true,
          empty: null,
          nested: { color: 'blue' }
        }
      });
    "#})
    .unwrap();

    assert_eq!(result.selectors.len(), 1);
    let (name, static_props, dynamic_count) = split(&result.selectors[0]);
    assert_eq!(name, "a");
    assert_eq!(
      static_props.iter().collect::<Vec<_>>(),
      vec![
        (&"color".to_string(), &str_value("red")),
        (&"width".to_string(), &StaticValue::Num(0.0)),
        (&"margin".to_string(), &StaticValue::Num(-2.0)),
        (&"font".to_string(), &str_value("bold")),
      ]
    );
    assert_eq!(dynamic_count, 7);
  }

  #[test]
  fn test_lists() {
    let result = classify(indoc! {r#"
      createStyleSheet({
        a: {
          flat: [0, 1],
          nested: [[0, 1], 'solid'],
          tooDeep: [[[0]]],
          withFunction: ['red', () => 'blue'],
          sparse: [0, , 1]
        }
      });
    "#})
    .unwrap();

    let (_, static_props, dynamic_count) = split(&result.selectors[0]);
    assert_eq!(
      static_props.get("flat"),
      Some(&StaticValue::List(vec![
        StaticValue::Num(0.0),
        StaticValue::Num(1.0)
      ]))
    );
    assert_eq!(
      static_props.get("nested"),
      Some(&StaticValue::List(vec![
        StaticValue::List(vec![StaticValue::Num(0.0), StaticValue::Num(1.0)]),
        str_value("solid"),
      ]))
    );
    assert_eq!(static_props.len(), 2);
    assert_eq!(dynamic_count, 3);
  }

  #[test]
  fn test_references_and_computed_keys() {
    let result = classify(indoc! {r#"
      const prop = 'a';
      const red = 'red';
      const color = red;
      const base = { color: color, width: [1, 2] };
      createStyleSheet({
        [prop]: { color },
        b: base,
        [unknown]: { color: 'red' },
        c: theme.c
      });
    "#})
    .unwrap();

    assert_eq!(result.selectors.len(), 4);

    let (name, static_props, dynamic_count) = split(&result.selectors[0]);
    assert_eq!(name, "a");
    assert_eq!(static_props.get("color"), Some(&str_value("red")));
    assert_eq!(dynamic_count, 0);

    let (name, static_props, _) = split(&result.selectors[1]);
    assert_eq!(name, "b");
    assert_eq!(static_props.len(), 2);

    assert!(matches!(
      &result.selectors[2],
      SelectorClassification::Opaque {
        name: None,
        reason: DynamicReason::UnresolvedKey,
        ..
      }
    ));
    assert!(matches!(
      &result.selectors[3],
      SelectorClassification::Opaque {
        name: Some(name),
        reason: DynamicReason::Other,
        ..
      } if name == "c"
    ));
  }

  #[test]
  fn test_selector_kinds() {
    let result = classify(indoc! {r#"
      createStyleSheet({
        empty: {},
        fullyDynamic: { color: () => 'red' },
        mixed: { color: 'red', width: () => 1 },
        withSpread: { ...base, color: 'red' }
      });
    "#})
    .unwrap();

    let flags: Vec<(Option<&str>, bool, bool)> = result
      .selectors
      .iter()
      .map(|s| (s.name(), s.has_static_part(), s.has_dynamic_part()))
      .collect();

    assert_eq!(
      flags,
      vec![
        (Some("empty"), true, false),
        (Some("fullyDynamic"), false, true),
        (Some("mixed"), true, true),
        (Some("withSpread"), false, true),
      ]
    );
  }

  #[test]
  fn test_malformed_descriptions() {
    assert!(matches!(
      classify("createStyleSheet('red');"),
      Err(CallSiteError::MalformedStyleDescription { .. })
    ));
    assert!(matches!(
      classify("createStyleSheet(importedStyles);"),
      Err(CallSiteError::MalformedStyleDescription { .. })
    ));
    assert!(matches!(
      classify("createStyleSheet(makeStyles());"),
      Err(CallSiteError::MalformedStyleDescription { .. })
    ));
    assert!(matches!(
      classify("createStyleSheet({ ...base, a: { color: 'red' } });"),
      Err(CallSiteError::UnsupportedSpread { .. })
    ));
    assert!(matches!(
      classify("createStyleSheet({ '@raw': { color: 'red' } });"),
      Err(CallSiteError::ReservedKeyCollision { selector, .. }) if selector == "@raw"
    ));
  }

  #[test]
  fn test_format_number() {
    assert_eq!(format_number(0.0), "0");
    assert_eq!(format_number(-0.0), "0");
    assert_eq!(format_number(1.0), "1");
    assert_eq!(format_number(0.5), "0.5");
    assert_eq!(format_number(-12.25), "-12.25");
  }
}
