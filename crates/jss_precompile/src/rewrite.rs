use std::collections::HashMap;

use indexmap::IndexMap;
use swc_core::common::{Span, DUMMY_SP};
use swc_core::ecma::ast::*;
use swc_core::ecma::visit::{noop_visit_mut_type, VisitMut, VisitMutWith};

use crate::classify::{SelectorClassification, StyleClassification};
use crate::{CLASSES_KEY, RAW_STYLES_KEY};

/// New arguments for one call, and the declaration to rewrite when the style description is
/// passed by reference.
#[derive(Clone, Debug)]
pub struct CallRewrite {
  pub span: Span,
  pub args: Vec<ExprOrSpread>,
  pub declaration: Option<(Id, Box<Expr>)>,
}

fn string_lit(value: &str) -> Str {
  Str {
    span: DUMMY_SP,
    value: value.into(),
    raw: None,
  }
}

fn key_value(key: PropName, value: Expr) -> PropOrSpread {
  PropOrSpread::Prop(Box::new(Prop::KeyValue(KeyValueProp {
    key,
    value: Box::new(value),
  })))
}

fn object(props: Vec<PropOrSpread>) -> ObjectLit {
  ObjectLit {
    span: DUMMY_SP,
    props,
  }
}

/// What remains of a style description once its static part is compiled: the raw style entry
/// first, then every selector that still has something for the runtime to evaluate.
pub fn build_styles_object(classification: &StyleClassification, raw_text: &str) -> ObjectLit {
  let mut props = vec![];

  if !raw_text.is_empty() {
    props.push(key_value(
      PropName::Str(string_lit(RAW_STYLES_KEY)),
      Expr::Lit(Lit::Str(string_lit(raw_text))),
    ));
  }

  for selector in &classification.selectors {
    match selector {
      SelectorClassification::Split {
        key, dynamic_props, ..
      } if !dynamic_props.is_empty() => {
        props.push(key_value(
          key.clone(),
          Expr::Object(object(dynamic_props.clone())),
        ));
      }
      SelectorClassification::Split { .. } => {}
      SelectorClassification::Opaque { entry, .. } => props.push(entry.clone()),
    }
  }

  object(props)
}

/// `{ "selector": "class-name", ... }`
pub fn build_classes_object(classes: &IndexMap<String, String>) -> ObjectLit {
  object(
    classes
      .iter()
      .map(|(selector, class_name)| {
        key_value(
          PropName::Str(string_lit(selector)),
          Expr::Lit(Lit::Str(string_lit(class_name))),
        )
      })
      .collect(),
  )
}

/// The options argument with `classes` added.
///
/// A literal keeps its entries and gets `classes` appended. Any other expression is spread into
/// a new literal.
pub fn extend_options(options: Option<&Expr>, classes: ObjectLit) -> Expr {
  let classes = key_value(PropName::Str(string_lit(CLASSES_KEY)), Expr::Object(classes));

  match options {
    Some(Expr::Object(existing)) => {
      let mut extended = existing.clone();
      extended.props.push(classes);
      Expr::Object(extended)
    }
    Some(other) => Expr::Object(object(vec![
      PropOrSpread::Spread(SpreadElement {
        dot3_token: DUMMY_SP,
        expr: Box::new(other.clone()),
      }),
      classes,
    ])),
    None => Expr::Object(object(vec![classes])),
  }
}

/// Plan the new argument list of `call`.
///
/// With `in_place` set, the first argument stays as it is and `styles` replaces the initializer of
/// that declaration instead.
pub fn plan_call_rewrite(
  call: &CallExpr,
  styles: ObjectLit,
  classes: ObjectLit,
  in_place: Option<Id>,
) -> CallRewrite {
  let mut args = Vec::with_capacity(call.args.len().max(2));

  let declaration = match in_place {
    Some(id) => {
      args.push(call.args[0].clone());
      Some((id, Box::new(Expr::Object(styles))))
    }
    None => {
      args.push(ExprOrSpread {
        spread: None,
        expr: Box::new(Expr::Object(styles)),
      });
      None
    }
  };

  let options = call.args.get(1).map(|arg| &*arg.expr);
  args.push(ExprOrSpread {
    spread: None,
    expr: Box::new(extend_options(options, classes)),
  });
  args.extend(call.args.iter().skip(2).cloned());

  CallRewrite {
    span: call.span,
    args,
    declaration,
  }
}

/// Applies planned rewrites to the module the plans were made for.
///
/// Calls are found by span and declarations by id. Replacement arguments are visited after they
/// are put in place, so calls nested in the dynamic remainder are rewritten too.
#[derive(Debug, Default)]
pub struct CallSiteRewriter {
  calls: HashMap<Span, Vec<ExprOrSpread>>,
  declarations: HashMap<Id, Box<Expr>>,
}

impl CallSiteRewriter {
  pub fn add(&mut self, rewrite: CallRewrite) {
    if let Some((id, init)) = rewrite.declaration {
      self.declarations.insert(id, init);
    }
    self.calls.insert(rewrite.span, rewrite.args);
  }

  pub fn is_empty(&self) -> bool {
    self.calls.is_empty() && self.declarations.is_empty()
  }
}

impl VisitMut for CallSiteRewriter {
  noop_visit_mut_type!();

  fn visit_mut_call_expr(&mut self, node: &mut CallExpr) {
    if let Some(args) = self.calls.remove(&node.span) {
      node.args = args;
    }

    node.visit_mut_children_with(self);
  }

  fn visit_mut_var_declarator(&mut self, node: &mut VarDeclarator) {
    if let Pat::Ident(ident) = &node.name {
      if let Some(init) = self.declarations.remove(&ident.id.to_id()) {
        node.init = Some(init);
      }
    }

    node.visit_mut_children_with(self);
  }
}

#[cfg(test)]
mod tests {
  use jss_swc_runner::test_utils::{print_unchanged, remove_code_whitespace, run_test_visit};
  use pretty_assertions::assert_eq;
  use swc_core::ecma::visit::{Visit, VisitWith};

  use super::*;

  struct ReplaceArgs;

  impl VisitMut for ReplaceArgs {
    fn visit_mut_module(&mut self, module: &mut Module) {
      let mut plans = vec![];
      module.visit_with(&mut CollectCalls(&mut plans));

      let mut rewriter = CallSiteRewriter::default();
      for call in plans {
        let mut classes = IndexMap::new();
        classes.insert("a".to_string(), "a-id".to_string());
        rewriter.add(plan_call_rewrite(
          &call,
          object(vec![]),
          build_classes_object(&classes),
          None,
        ));
      }
      module.visit_mut_with(&mut rewriter);
    }
  }

  struct CollectCalls<'a>(&'a mut Vec<CallExpr>);

  impl Visit for CollectCalls<'_> {
    fn visit_call_expr(&mut self, node: &CallExpr) {
      self.0.push(node.clone());
      node.visit_children_with(self);
    }
  }

  fn rewrite(code: &str) -> String {
    remove_code_whitespace(&run_test_visit(code, |_| ReplaceArgs).output_code)
  }

  fn normalize(code: &str) -> String {
    remove_code_whitespace(&print_unchanged(code))
  }

  #[test]
  fn test_adds_options_argument() {
    assert_eq!(
      rewrite("f({});"),
      normalize(r#"f({}, { "classes": { "a": "a-id" } });"#)
    );
  }

  #[test]
  fn test_extends_literal_options() {
    assert_eq!(
      rewrite("f({}, { a: 1 });"),
      normalize(r#"f({}, { a: 1, "classes": { "a": "a-id" } });"#)
    );
  }

  #[test]
  fn test_spreads_options_reference() {
    assert_eq!(
      rewrite("f({}, options, extra);"),
      normalize(r#"f({}, { ...options, "classes": { "a": "a-id" } }, extra);"#)
    );
  }

  #[test]
  fn test_raw_entry_comes_first() {
    let styles = StyleClassification {
      selectors: vec![SelectorClassification::Split {
        name: "a".into(),
        key: PropName::Ident(IdentName::new("a".into(), DUMMY_SP)),
        static_props: Default::default(),
        dynamic_props: vec![key_value(
          PropName::Ident(IdentName::new("width".into(), DUMMY_SP)),
          Expr::Lit(Lit::Num(Number {
            span: DUMMY_SP,
            value: 1.0,
            raw: None,
          })),
        )],
      }],
    };

    let built = build_styles_object(&styles, ".a-id {}");
    assert_eq!(built.props.len(), 2);
    let PropOrSpread::Prop(first) = &built.props[0] else {
      panic!("expected a property");
    };
    let Prop::KeyValue(KeyValueProp {
      key: PropName::Str(key),
      ..
    }) = &**first
    else {
      panic!("expected a string key");
    };
    assert_eq!(&*key.value, RAW_STYLES_KEY);

    assert_eq!(build_styles_object(&styles, "").props.len(), 1);
  }
}
