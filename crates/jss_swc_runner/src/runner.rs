use std::string::FromUtf8Error;

use swc_core::common::comments::SingleThreadedComments;
use swc_core::common::input::StringInput;
use swc_core::common::sync::Lrc;
use swc_core::common::{FileName, Globals, Mark, SourceMap, GLOBALS};
use swc_core::ecma::ast::Module;
use swc_core::ecma::codegen::text_writer::JsWriter;
use swc_core::ecma::parser::lexer::Lexer;
use swc_core::ecma::parser::{EsSyntax, Parser, Syntax, TsSyntax};
use swc_core::ecma::transforms::base::resolver;
use swc_core::ecma::visit::{Visit, VisitMut, VisitMutWith, VisitWith};

/// Dialect the input source is written in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SourceSyntax {
  #[default]
  Js,
  Jsx,
  Ts,
  Tsx,
}

impl SourceSyntax {
  /// Guess the dialect from a file extension, falling back to plain JS.
  pub fn from_file_name(file_name: &str) -> Self {
    match file_name.rsplit_once('.').map(|(_, ext)| ext) {
      Some("jsx") => SourceSyntax::Jsx,
      Some("ts" | "mts" | "cts") => SourceSyntax::Ts,
      Some("tsx") => SourceSyntax::Tsx,
      _ => SourceSyntax::Js,
    }
  }

  fn to_swc(self) -> Syntax {
    match self {
      SourceSyntax::Js => Syntax::Es(EsSyntax::default()),
      SourceSyntax::Jsx => Syntax::Es(EsSyntax {
        jsx: true,
        ..Default::default()
      }),
      SourceSyntax::Ts => Syntax::Typescript(TsSyntax::default()),
      SourceSyntax::Tsx => Syntax::Typescript(TsSyntax {
        tsx: true,
        ..Default::default()
      }),
    }
  }
}

#[derive(Clone, Debug, Default)]
pub struct RunOptions {
  pub syntax: SourceSyntax,
  /// Name used for the source file in the source map, `None` for an anonymous file
  pub file_name: Option<String>,
}

impl RunOptions {
  pub fn for_file(file_name: impl Into<String>) -> Self {
    let file_name = file_name.into();
    RunOptions {
      syntax: SourceSyntax::from_file_name(&file_name),
      file_name: Some(file_name),
    }
  }
}

pub struct RunContext {
  /// Source-map in use
  pub source_map: Lrc<SourceMap>,
  /// Global mark from SWC resolver
  pub global_mark: Mark,
  /// Unresolved mark from SWC resolver
  pub unresolved_mark: Mark,
  /// File name the module was parsed from
  pub file_name: String,
}

pub struct RunVisitResult<V> {
  pub output_code: String,
  #[allow(unused)]
  pub visitor: V,
  pub source_map: Vec<u8>,
}

/// Runner of SWC transformations
///
/// * Parse `code` with SWC
/// * Run a visitor over it
/// * Return the result
///
pub fn run_visit<V: VisitMut>(
  code: &str,
  options: &RunOptions,
  make_visit: impl FnOnce(RunContext) -> V,
) -> Result<RunVisitResult<V>, RunWithTransformationError> {
  let (output_code, visitor, source_map) = run_with_transformation(
    code,
    options,
    |context: RunContext, module: &mut Module| {
      let mut visit = make_visit(context);
      module.visit_mut_with(&mut visit);
      visit
    },
  )?;
  Ok(RunVisitResult {
    output_code,
    visitor,
    source_map,
  })
}

/// Same as `run_visit` but for `Visit` instead of `VisitMut`
pub fn run_visit_const<V: Visit>(
  code: &str,
  options: &RunOptions,
  make_visit: impl FnOnce(RunContext) -> V,
) -> Result<RunVisitResult<V>, RunWithTransformationError> {
  let (output_code, visitor, source_map) = run_with_transformation(
    code,
    options,
    |context: RunContext, module: &mut Module| {
      let mut visit = make_visit(context);
      module.visit_with(&mut visit);
      visit
    },
  )?;
  Ok(RunVisitResult {
    output_code,
    visitor,
    source_map,
  })
}

#[derive(Debug, thiserror::Error)]
pub enum RunWithTransformationError {
  #[error("Failed to parse module: {0:?}")]
  SwcParse(swc_core::ecma::parser::error::Error),
  #[error("IO Error: {0}")]
  IoError(#[from] std::io::Error),
  #[error("Invalid utf-8 output: {0}")]
  InvalidUtf8Output(#[from] FromUtf8Error),
  #[error("Failed to generate source map")]
  SourceMap(#[from] sourcemap::Error),
}

type RunWithTransformationOutput<R> = (String, R, Vec<u8>);

/// Parse code, run resolver over it, then run the `transform` function with the parsed module.
/// Comments are kept so that code the transform does not touch prints back unchanged.
fn run_with_transformation<R>(
  code: &str,
  options: &RunOptions,
  transform: impl FnOnce(RunContext, &mut Module) -> R,
) -> Result<RunWithTransformationOutput<R>, RunWithTransformationError> {
  let source_map = Lrc::new(SourceMap::default());
  let file_name = options
    .file_name
    .clone()
    .map(FileName::Custom)
    .unwrap_or(FileName::Anon);
  let source_file = source_map.new_source_file(Lrc::new(file_name), code.into());
  let comments = SingleThreadedComments::default();

  let lexer = Lexer::new(
    options.syntax.to_swc(),
    Default::default(),
    StringInput::from(&*source_file),
    Some(&comments),
  );

  let mut parser = Parser::new_from(lexer);
  let mut module = parser
    .parse_module()
    .map_err(RunWithTransformationError::SwcParse)?;
  if let Some(error) = parser.take_errors().into_iter().next() {
    return Err(RunWithTransformationError::SwcParse(error));
  }

  GLOBALS.set(
    &Globals::new(),
    || -> Result<RunWithTransformationOutput<R>, RunWithTransformationError> {
      let global_mark = Mark::new();
      let unresolved_mark = Mark::new();
      let is_typescript = matches!(options.syntax, SourceSyntax::Ts | SourceSyntax::Tsx);
      module.visit_mut_with(&mut resolver(unresolved_mark, global_mark, is_typescript));

      let context = RunContext {
        source_map: source_map.clone(),
        global_mark,
        unresolved_mark,
        file_name: options.file_name.clone().unwrap_or_default(),
      };
      let result = transform(context, &mut module);

      let mut line_pos_buffer = vec![];
      let mut output_buffer = vec![];
      let writer = JsWriter::new(
        source_map.clone(),
        "\n",
        &mut output_buffer,
        Some(&mut line_pos_buffer),
      );
      let mut emitter = swc_core::ecma::codegen::Emitter {
        cfg: Default::default(),
        cm: source_map.clone(),
        comments: Some(&comments),
        wr: writer,
      };
      emitter.emit_module(&module)?;
      let output_code = String::from_utf8(output_buffer)?;
      let source_map = source_map.build_source_map(&line_pos_buffer);
      let mut output_map_buffer = vec![];
      source_map.to_writer(&mut output_map_buffer)?;

      Ok((output_code, result, output_map_buffer))
    },
  )
}
