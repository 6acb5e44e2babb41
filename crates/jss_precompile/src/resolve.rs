use std::collections::{HashMap, HashSet};

use swc_core::common::Span;
use swc_core::ecma::ast::*;
use swc_core::ecma::utils::find_pat_ids;
use swc_core::ecma::visit::{noop_visit_type, Visit, VisitWith};

/// Why an identifier could not be reduced to the expression it stands for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UnresolvedReason {
  /// Global, or declared somewhere this module can't see
  Undeclared,
  Imported,
  Parameter,
  /// Declared with a destructuring pattern
  Destructured,
  Reassigned,
  DeclaredAfterUse,
  NoInitializer,
  FunctionDeclaration,
  ClassDeclaration,
  /// Initialized with something that is never static (a call, a function, ...)
  OpaqueInitializer,
  Circular,
}

#[derive(Debug)]
pub enum Resolution<'a> {
  Resolved(&'a Expr),
  Unresolved(UnresolvedReason),
}

#[derive(Debug)]
pub enum Binding {
  Value {
    kind: VarDeclKind,
    span: Span,
    init: Option<Box<Expr>>,
  },
  /// A variable whose initializer can't hold a static value, so it is not kept
  Opaque { kind: VarDeclKind, span: Span },
  Function,
  Class,
  Import,
  Parameter,
  Destructured,
}

/// Every binding declared in one module, keyed by the scope aware [`Id`] the SWC resolver
/// assigned, plus the bindings that are written to after their declaration.
#[derive(Debug, Default)]
pub struct DeclarationTable {
  bindings: HashMap<Id, Binding>,
  reassigned: HashSet<Id>,
}

impl DeclarationTable {
  pub fn collect<N>(node: &N) -> Self
  where
    N: VisitWith<DeclarationCollector>,
  {
    let mut collector = DeclarationCollector {
      table: DeclarationTable::default(),
      in_assign: false,
    };
    node.visit_with(&mut collector);
    collector.table
  }

  pub fn binding(&self, id: &Id) -> Option<&Binding> {
    self.bindings.get(id)
  }

  pub fn is_reassigned(&self, id: &Id) -> bool {
    self.reassigned.contains(id)
  }

  /// The initializer of `ident` if it is a plain declaration that is never written to again.
  pub fn resolve_ident(&self, ident: &Ident) -> Resolution<'_> {
    let id = ident.to_id();

    let Some(binding) = self.bindings.get(&id) else {
      return Resolution::Unresolved(UnresolvedReason::Undeclared);
    };

    if self.reassigned.contains(&id) {
      return Resolution::Unresolved(UnresolvedReason::Reassigned);
    }

    match binding {
      Binding::Value { span, .. } | Binding::Opaque { span, .. } if span.lo > ident.span.lo => {
        Resolution::Unresolved(UnresolvedReason::DeclaredAfterUse)
      }
      Binding::Value { init: Some(init), .. } => Resolution::Resolved(init),
      Binding::Value { init: None, .. } => Resolution::Unresolved(UnresolvedReason::NoInitializer),
      Binding::Opaque { .. } => Resolution::Unresolved(UnresolvedReason::OpaqueInitializer),
      Binding::Function => Resolution::Unresolved(UnresolvedReason::FunctionDeclaration),
      Binding::Class => Resolution::Unresolved(UnresolvedReason::ClassDeclaration),
      Binding::Import => Resolution::Unresolved(UnresolvedReason::Imported),
      Binding::Parameter => Resolution::Unresolved(UnresolvedReason::Parameter),
      Binding::Destructured => Resolution::Unresolved(UnresolvedReason::Destructured),
    }
  }

  /// Follow `expr` through identifier chains (`const a = b; const b = {...}`) until an
  /// expression that is not an identifier is reached.
  pub fn resolve_expr<'a>(&'a self, expr: &'a Expr) -> Resolution<'a> {
    let mut visited = HashSet::new();
    let mut current = unwrap_transparent(expr);

    while let Expr::Ident(ident) = current {
      if !visited.insert(ident.to_id()) {
        return Resolution::Unresolved(UnresolvedReason::Circular);
      }

      match self.resolve_ident(ident) {
        Resolution::Resolved(init) => current = unwrap_transparent(init),
        unresolved => return unresolved,
      }
    }

    Resolution::Resolved(current)
  }
}

/// Skip wrappers that don't change the value of an expression.
pub fn unwrap_transparent(expr: &Expr) -> &Expr {
  match expr {
    Expr::Paren(ParenExpr { expr, .. })
    | Expr::TsAs(TsAsExpr { expr, .. })
    | Expr::TsConstAssertion(TsConstAssertion { expr, .. })
    | Expr::TsSatisfies(TsSatisfiesExpr { expr, .. })
    | Expr::TsTypeAssertion(TsTypeAssertion { expr, .. })
    | Expr::TsNonNull(TsNonNullExpr { expr, .. }) => unwrap_transparent(expr),
    _ => expr,
  }
}

/// Only initializers that may reduce to a style value are kept in the table.
fn may_be_static(expr: &Expr) -> bool {
  matches!(
    unwrap_transparent(expr),
    Expr::Lit(_)
      | Expr::Ident(_)
      | Expr::Array(_)
      | Expr::Object(_)
      | Expr::Tpl(_)
      | Expr::Unary(_)
  )
}

/// The identifier at the root of `a.b.c`, if any.
fn member_root(expr: &Expr) -> Option<&Ident> {
  match unwrap_transparent(expr) {
    Expr::Ident(ident) => Some(ident),
    Expr::Member(member) => member_root(&member.obj),
    _ => None,
  }
}

pub struct DeclarationCollector {
  table: DeclarationTable,
  in_assign: bool,
}

impl DeclarationCollector {
  fn declare(&mut self, id: Id, binding: Binding) {
    if self.table.bindings.insert(id.clone(), binding).is_some() {
      // `var a = 1; var a = 2;` or a function redeclared as a variable
      self.table.reassigned.insert(id);
    }
  }

  fn declare_pat(&mut self, pat: &Pat, binding: impl Fn() -> Binding) {
    let ids: Vec<Id> = find_pat_ids(pat);
    for id in ids {
      self.declare(id, binding());
    }
  }

  fn mark_written(&mut self, expr: &Expr) {
    if let Some(ident) = member_root(expr) {
      self.table.reassigned.insert(ident.to_id());
    }
  }
}

impl Visit for DeclarationCollector {
  noop_visit_type!();

  fn visit_var_decl(&mut self, node: &VarDecl) {
    for decl in &node.decls {
      match &decl.name {
        Pat::Ident(ident) => {
          let binding = match &decl.init {
            Some(init) if !may_be_static(init) => Binding::Opaque {
              kind: node.kind,
              span: decl.span,
            },
            init => Binding::Value {
              kind: node.kind,
              span: decl.span,
              init: init.clone(),
            },
          };
          self.declare(ident.id.to_id(), binding);
        }
        pat => self.declare_pat(pat, || Binding::Destructured),
      }
    }

    node.visit_children_with(self);
  }

  fn visit_fn_decl(&mut self, node: &FnDecl) {
    self.declare(node.ident.to_id(), Binding::Function);
    node.visit_children_with(self);
  }

  fn visit_class_decl(&mut self, node: &ClassDecl) {
    self.declare(node.ident.to_id(), Binding::Class);
    node.visit_children_with(self);
  }

  fn visit_param(&mut self, node: &Param) {
    self.declare_pat(&node.pat, || Binding::Parameter);
    node.visit_children_with(self);
  }

  fn visit_arrow_expr(&mut self, node: &ArrowExpr) {
    for param in &node.params {
      self.declare_pat(param, || Binding::Parameter);
    }
    node.visit_children_with(self);
  }

  fn visit_import_decl(&mut self, node: &ImportDecl) {
    for specifier in &node.specifiers {
      let local = match specifier {
        ImportSpecifier::Named(named) => &named.local,
        ImportSpecifier::Default(default) => &default.local,
        ImportSpecifier::Namespace(namespace) => &namespace.local,
      };
      self.declare(local.to_id(), Binding::Import);
    }
  }

  fn visit_assign_expr(&mut self, node: &AssignExpr) {
    match &node.left {
      AssignTarget::Simple(SimpleAssignTarget::Member(member)) => self.mark_written(&member.obj),
      left => {
        self.in_assign = true;
        left.visit_with(self);
        self.in_assign = false;
      }
    }

    node.right.visit_with(self);
  }

  fn visit_for_head(&mut self, node: &ForHead) {
    match node {
      ForHead::Pat(pat) => {
        if let Pat::Expr(expr) = &**pat {
          self.mark_written(expr);
        }
        self.in_assign = true;
        pat.visit_with(self);
        self.in_assign = false;
      }
      head => head.visit_children_with(self),
    }
  }

  fn visit_binding_ident(&mut self, node: &BindingIdent) {
    if self.in_assign {
      self.table.reassigned.insert(node.id.to_id());
    }
  }

  fn visit_update_expr(&mut self, node: &UpdateExpr) {
    self.mark_written(&node.arg);
    node.visit_children_with(self);
  }

  fn visit_unary_expr(&mut self, node: &UnaryExpr) {
    if node.op == UnaryOp::Delete {
      self.mark_written(&node.arg);
    }
    node.visit_children_with(self);
  }
}
