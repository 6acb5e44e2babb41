use std::collections::HashMap;
use std::sync::Arc;

use swc_core::common::Span;
use swc_core::ecma::ast::*;
use swc_core::ecma::visit::{VisitMut, VisitMutWith, VisitWith};

use crate::classify::{SelectorClassification, StyleClassifier};
use crate::compiler::{CompiledSheet, StyleSheetCompiler};
use crate::errors::CallSiteError;
use crate::naming::NamingContext;
use crate::recognizer::{CallSite, CallSiteCollector, CallSiteRecognizer};
use crate::resolve::{unwrap_transparent, Binding, DeclarationCollector, DeclarationTable};
use crate::rewrite::{
  build_classes_object, build_styles_object, plan_call_rewrite, CallRewrite, CallSiteRewriter,
};

/// The precompiled output of one rewritten call.
#[derive(Clone, Debug, PartialEq)]
pub struct CompiledCall {
  pub span: Span,
  /// Position of the call among the recognized calls of the module
  pub call_index: usize,
  pub sheet: CompiledSheet,
}

/// Precompiles the static styles of every recognized call in a module or script.
///
/// Calls that can't be precompiled are left as they are.
pub struct JssPrecompileVisitor {
  file_name: String,
  recognizer: CallSiteRecognizer,
  compiler: StyleSheetCompiler,
  options: Arc<serde_json::Value>,
  compiled: Vec<CompiledCall>,
}

impl JssPrecompileVisitor {
  pub(crate) fn new(
    file_name: String,
    recognizer: CallSiteRecognizer,
    compiler: StyleSheetCompiler,
    options: Arc<serde_json::Value>,
  ) -> Self {
    JssPrecompileVisitor {
      file_name,
      recognizer,
      compiler,
      options,
      compiled: vec![],
    }
  }

  /// Every call rewritten so far, in source order.
  pub fn compiled(&self) -> &[CompiledCall] {
    &self.compiled
  }

  fn precompile<N>(&mut self, node: &mut N)
  where
    N: VisitWith<DeclarationCollector>
      + for<'a> VisitWith<CallSiteCollector<'a>>
      + VisitMutWith<CallSiteRewriter>,
  {
    let table = DeclarationTable::collect(&*node);
    let call_sites = self.recognizer.find_call_sites(&*node);
    if call_sites.is_empty() {
      return;
    }

    let references = count_style_references(&call_sites);
    let mut rewriter = CallSiteRewriter::default();

    for call_site in &call_sites {
      match self.plan(&table, call_site, &references) {
        Ok(Some((rewrite, sheet))) => {
          self.compiled.push(CompiledCall {
            span: rewrite.span,
            call_index: call_site.index,
            sheet,
          });
          rewriter.add(rewrite);
        }
        Ok(None) => {}
        Err(error) => {
          tracing::warn!(
            file_name = %self.file_name,
            span = ?error.span(),
            "Skipping style sheet call: {}",
            error
          );
        }
      }
    }

    if !rewriter.is_empty() {
      node.visit_mut_with(&mut rewriter);
    }
  }

  fn plan(
    &self,
    table: &DeclarationTable,
    call_site: &CallSite,
    references: &HashMap<Id, usize>,
  ) -> Result<Option<(CallRewrite, CompiledSheet)>, CallSiteError> {
    let call = &call_site.call;
    let Some(styles) = call_site.styles_arg() else {
      tracing::trace!(call_index = call_site.index, "Style sheet call without styles");
      return Ok(None);
    };

    if call.args.iter().any(|arg| arg.spread.is_some()) {
      return Err(CallSiteError::MalformedStyleDescription { span: call.span });
    }

    let classification = StyleClassifier::new(table).classify_styles(styles)?;

    let context = NamingContext {
      file_name: &self.file_name,
      call_index: call_site.index,
      options: &self.options,
    };
    let sheet = self.compiler.compile(
      classification
        .selectors
        .iter()
        .filter(|selector| selector.has_static_part())
        .filter_map(|selector| match selector {
          SelectorClassification::Split {
            name, static_props, ..
          } => Some((name.as_str(), static_props)),
          SelectorClassification::Opaque { .. } => None,
        }),
      &context,
    );

    if !classification.has_static_part() {
      tracing::debug!(
        file_name = %self.file_name,
        call_index = call_site.index,
        "No static styles to precompile"
      );
      return Ok(None);
    }

    let dynamic_selectors = classification
      .selectors
      .iter()
      .filter(|selector| selector.has_dynamic_part())
      .count();
    tracing::debug!(
      file_name = %self.file_name,
      call_index = call_site.index,
      static_selectors = sheet.classes.len(),
      dynamic_selectors,
      "Precompiled style sheet"
    );

    let rewrite = plan_call_rewrite(
      call,
      build_styles_object(&classification, &sheet.raw_text),
      build_classes_object(&sheet.classes),
      in_place_declaration(table, styles, references),
    );

    Ok(Some((rewrite, sheet)))
  }
}

/// How many recognized calls pass each identifier as their style description.
fn count_style_references(call_sites: &[CallSite]) -> HashMap<Id, usize> {
  let mut references = HashMap::new();
  for styles in call_sites.iter().filter_map(|call_site| call_site.styles_arg()) {
    if let Expr::Ident(ident) = unwrap_transparent(styles) {
      *references.entry(ident.to_id()).or_insert(0) += 1;
    }
  }
  references
}

/// The declaration to rewrite in place: a `const` initialized with an object literal and passed
/// to exactly one recognized call.
fn in_place_declaration(
  table: &DeclarationTable,
  styles: &Expr,
  references: &HashMap<Id, usize>,
) -> Option<Id> {
  let Expr::Ident(ident) = unwrap_transparent(styles) else {
    return None;
  };

  let id = ident.to_id();
  if references.get(&id) != Some(&1) || table.is_reassigned(&id) {
    return None;
  }

  match table.binding(&id)? {
    Binding::Value {
      kind: VarDeclKind::Const,
      init: Some(init),
      ..
    } if unwrap_transparent(init).is_object() => Some(id),
    _ => None,
  }
}

impl VisitMut for JssPrecompileVisitor {
  fn visit_mut_module(&mut self, node: &mut Module) {
    self.precompile(node);
  }

  fn visit_mut_script(&mut self, node: &mut Script) {
    self.precompile(node);
  }
}

#[cfg(test)]
mod tests {
  use indoc::indoc;
  use jss_swc_runner::test_utils::{print_unchanged, remove_code_whitespace, run_test_visit};
  use pretty_assertions::assert_eq;
  use tracing_test::traced_test;

  use super::*;
  use crate::config::PrecompileConfig;
  use crate::JssPrecompiler;

  fn precompiler() -> JssPrecompiler {
    JssPrecompiler::new(PrecompileConfig::default())
      .unwrap()
      .with_class_namer(|selector: &str, _: &NamingContext<'_>| format!("{}-id", selector))
  }

  fn transform(code: &str) -> (String, Vec<CompiledCall>) {
    let precompiler = precompiler();
    let result = run_test_visit(code, |_| precompiler.visitor("styles.js"));
    (
      remove_code_whitespace(&result.output_code),
      result.visitor.compiled().to_vec(),
    )
  }

  fn normalize(code: &str) -> String {
    remove_code_whitespace(&print_unchanged(code))
  }

  #[test]
  fn test_static_styles() {
    let (output, compiled) = transform("createStyleSheet({ a: { color: 'red' } });");

    assert_eq!(
      output,
      normalize(
        r#"createStyleSheet({ "@raw": ".a-id {\n  color: red;\n}" }, { "classes": { "a": "a-id" } });"#
      )
    );
    assert_eq!(compiled.len(), 1);
    assert_eq!(compiled[0].sheet.raw_text, ".a-id {\n  color: red;\n}");
  }

  #[test]
  fn test_in_place_declaration() {
    let (output, _) = transform(indoc! {r#"
      const styles = { a: { color: 'red' } };
      createStyleSheet(styles);
    "#});

    assert_eq!(
      output,
      normalize(indoc! {r#"
        const styles = { "@raw": ".a-id {\n  color: red;\n}" };
        createStyleSheet(styles, { "classes": { "a": "a-id" } });
      "#})
    );
  }

  #[test]
  fn test_shared_declaration_is_inlined() {
    let (output, _) = transform(indoc! {r#"
      const styles = { a: { color: 'red' } };
      createStyleSheet(styles);
      createStyleSheet(styles);
    "#});

    assert_eq!(
      output,
      normalize(indoc! {r#"
        const styles = { a: { color: 'red' } };
        createStyleSheet({ "@raw": ".a-id {\n  color: red;\n}" }, { "classes": { "a": "a-id" } });
        createStyleSheet({ "@raw": ".a-id {\n  color: red;\n}" }, { "classes": { "a": "a-id" } });
      "#})
    );
  }

  #[test]
  fn test_let_declaration_is_inlined() {
    let (output, _) = transform(indoc! {r#"
      let styles = { a: { color: 'red' } };
      createStyleSheet(styles);
    "#});

    assert_eq!(
      output,
      normalize(indoc! {r#"
        let styles = { a: { color: 'red' } };
        createStyleSheet({ "@raw": ".a-id {\n  color: red;\n}" }, { "classes": { "a": "a-id" } });
      "#})
    );
  }

  #[test]
  fn test_scripts_are_precompiled() {
    let precompiler = precompiler();
    let mut visitor = precompiler.visitor("script.js");
    let mut script = Script {
      span: Default::default(),
      body: vec![],
      shebang: None,
    };
    script.visit_mut_with(&mut visitor);
    assert!(visitor.compiled().is_empty());
  }

  #[test]
  #[traced_test]
  fn test_malformed_call_is_skipped_with_warning() {
    let code = indoc! {r#"
      createStyleSheet(...args);
      createStyleSheet({ "@raw": { color: 'red' } });
      createStyleSheet(makeStyles());
    "#};
    let (output, compiled) = transform(code);

    assert_eq!(output, normalize(code));
    assert!(compiled.is_empty());
    assert!(logs_contain("Skipping style sheet call"));
  }
}
