use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use jss_precompile::{JssPrecompiler, PrecompileConfig};
use jss_swc_runner::runner::{run_visit, RunOptions};
use tracing_subscriber::EnvFilter;

/// Precompile the static styles of JSS `createStyleSheet` calls
#[derive(Parser, Debug)]
#[command(name = "jss-precompile")]
struct Args {
  /// JavaScript or TypeScript source file
  input: PathBuf,
  /// JSON configuration file
  #[arg(short, long)]
  config: Option<PathBuf>,
  /// Write the rewritten code here instead of stdout
  #[arg(short, long)]
  output: Option<PathBuf>,
  /// Write a source map of the rewritten code
  #[arg(long)]
  source_map: Option<PathBuf>,
  /// Append the compiled style text of every rewritten call to the output
  #[arg(long)]
  emit_css: bool,
  /// Log every rewritten call. Otherwise logging follows `RUST_LOG`
  #[arg(short, long)]
  verbose: bool,
}

fn load_config(args: &Args) -> anyhow::Result<PrecompileConfig> {
  let Some(path) = &args.config else {
    return Ok(PrecompileConfig::default());
  };

  let json = fs::read_to_string(path)
    .with_context(|| format!("Failed to read configuration {}", path.display()))?;
  let config = PrecompileConfig::from_json(&json)
    .with_context(|| format!("Invalid configuration {}", path.display()))?;
  Ok(config)
}

struct Output {
  code: String,
  source_map: Vec<u8>,
}

fn run(args: &Args) -> anyhow::Result<Output> {
  let precompiler = JssPrecompiler::new(load_config(args)?)?;

  let file_name = args.input.to_string_lossy().to_string();
  let code = fs::read_to_string(&args.input)
    .with_context(|| format!("Failed to read {}", args.input.display()))?;

  let result = run_visit(&code, &RunOptions::for_file(&file_name), |_| {
    precompiler.visitor(&file_name)
  })
  .with_context(|| format!("Failed to precompile {}", file_name))?;

  let compiled = result.visitor.compiled();
  tracing::info!(
    file_name = %file_name,
    rewritten_calls = compiled.len(),
    "Precompiled styles"
  );

  let mut code = result.output_code;
  if args.emit_css {
    for call in compiled {
      if call.sheet.raw_text.is_empty() {
        continue;
      }
      write!(
        code,
        "\n/* styles of call {} */\n{}\n",
        call.call_index, call.sheet.raw_text
      )?;
    }
  }

  Ok(Output {
    code,
    source_map: result.source_map,
  })
}

fn main() -> anyhow::Result<()> {
  let args = Args::parse();

  let filter = if args.verbose {
    EnvFilter::new("jss_precompile=debug,jss_precompile_cli=info")
  } else {
    EnvFilter::from_default_env()
  };
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .init();

  let output = run(&args)?;

  if let Some(path) = &args.source_map {
    fs::write(path, &output.source_map)
      .with_context(|| format!("Failed to write {}", path.display()))?;
  }

  match &args.output {
    Some(path) => {
      fs::write(path, &output.code).with_context(|| format!("Failed to write {}", path.display()))?
    }
    None => print!("{}", output.code),
  }

  Ok(())
}
