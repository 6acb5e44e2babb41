use std::collections::HashSet;

use swc_core::atoms::Atom;
use swc_core::ecma::ast::{CallExpr, Callee, Expr, Lit, MemberProp, UnaryOp};
use swc_core::ecma::visit::{noop_visit_type, Visit, VisitWith};

/// What a recognized call passes as its style description.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CallSiteKind {
  /// No arguments, `null`, `undefined` or `void 0`. Left as it is.
  NoStyles,
  /// The first argument is a style description candidate.
  Styles,
}

/// A call to one of the configured style sheet functions.
#[derive(Clone, Debug)]
pub struct CallSite {
  /// Position of the call among the recognized calls of the module, in source order
  pub index: usize,
  pub kind: CallSiteKind,
  pub call: CallExpr,
}

impl CallSite {
  pub fn styles_arg(&self) -> Option<&Expr> {
    match self.kind {
      CallSiteKind::NoStyles => None,
      CallSiteKind::Styles => self.call.args.first().map(|arg| &*arg.expr),
    }
  }
}

/// Matches calls by callee name: `createStyleSheet(...)` or `jss.createStyleSheet(...)`.
#[derive(Clone, Debug)]
pub struct CallSiteRecognizer {
  identifiers: HashSet<Atom>,
}

impl CallSiteRecognizer {
  pub fn new<S: AsRef<str>>(identifiers: &[S]) -> Self {
    CallSiteRecognizer {
      identifiers: identifiers
        .iter()
        .map(|name| Atom::from(name.as_ref()))
        .collect(),
    }
  }

  fn matches_callee(&self, callee: &Expr) -> bool {
    match callee {
      Expr::Ident(ident) => self.identifiers.contains(&ident.sym),
      Expr::Member(member) => match &member.prop {
        MemberProp::Ident(prop) => self.identifiers.contains(&prop.sym),
        _ => false,
      },
      Expr::Paren(paren) => self.matches_callee(&paren.expr),
      _ => false,
    }
  }

  pub fn recognize(&self, call: &CallExpr) -> Option<CallSiteKind> {
    let Callee::Expr(callee) = &call.callee else {
      return None;
    };

    if !self.matches_callee(callee) {
      return None;
    }

    let Some(first) = call.args.first() else {
      return Some(CallSiteKind::NoStyles);
    };

    if first.spread.is_none() && is_absent_value(&first.expr) {
      return Some(CallSiteKind::NoStyles);
    }

    Some(CallSiteKind::Styles)
  }

  /// All recognized calls under `node`, outer calls before the calls nested in their arguments.
  pub fn find_call_sites<N>(&self, node: &N) -> Vec<CallSite>
  where
    N: for<'a> VisitWith<CallSiteCollector<'a>>,
  {
    let mut collector = CallSiteCollector {
      recognizer: self,
      call_sites: vec![],
    };
    node.visit_with(&mut collector);
    collector.call_sites
  }
}

fn is_absent_value(expr: &Expr) -> bool {
  match expr {
    Expr::Lit(Lit::Null(_)) => true,
    Expr::Ident(ident) => &*ident.sym == "undefined",
    Expr::Unary(unary) => unary.op == UnaryOp::Void && matches!(&*unary.arg, Expr::Lit(_)),
    Expr::Paren(paren) => is_absent_value(&paren.expr),
    _ => false,
  }
}

pub struct CallSiteCollector<'a> {
  recognizer: &'a CallSiteRecognizer,
  call_sites: Vec<CallSite>,
}

impl Visit for CallSiteCollector<'_> {
  noop_visit_type!();

  fn visit_call_expr(&mut self, node: &CallExpr) {
    if let Some(kind) = self.recognizer.recognize(node) {
      self.call_sites.push(CallSite {
        index: self.call_sites.len(),
        kind,
        call: node.clone(),
      });
    }

    node.visit_children_with(self);
  }
}
