use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use xxhash_rust::xxh3::xxh3_64;

use crate::config::ClassNaming;

/// What a class namer knows about the selector it is naming.
#[derive(Clone, Copy, Debug)]
pub struct NamingContext<'a> {
  pub file_name: &'a str,
  /// Position of the call among the recognized calls of the module
  pub call_index: usize,
  /// `jssOptions` from the configuration
  pub options: &'a serde_json::Value,
}

/// Generates the class name a selector compiles to.
pub trait ClassNamer: Send + Sync {
  fn class_name(&self, selector: &str, context: &NamingContext<'_>) -> String;
}

impl<F> ClassNamer for F
where
  F: Fn(&str, &NamingContext<'_>) -> String + Send + Sync,
{
  fn class_name(&self, selector: &str, context: &NamingContext<'_>) -> String {
    self(selector, context)
  }
}

/// `<prefix><selector>-<n>`, where `n` counts every class named during the run.
#[derive(Debug, Default)]
pub struct CounterClassNamer {
  prefix: String,
  counter: AtomicUsize,
}

impl CounterClassNamer {
  pub fn new(prefix: impl Into<String>) -> Self {
    CounterClassNamer {
      prefix: prefix.into(),
      counter: AtomicUsize::new(0),
    }
  }
}

impl ClassNamer for CounterClassNamer {
  fn class_name(&self, selector: &str, _context: &NamingContext<'_>) -> String {
    let n = self.counter.fetch_add(1, Ordering::Relaxed);
    format!("{}{}-{}", self.prefix, selector, n)
  }
}

/// `<prefix><selector>-<hash>`, the same for every build of an unchanged file.
#[derive(Debug, Default)]
pub struct HashClassNamer {
  prefix: String,
}

impl HashClassNamer {
  pub fn new(prefix: impl Into<String>) -> Self {
    HashClassNamer {
      prefix: prefix.into(),
    }
  }
}

impl ClassNamer for HashClassNamer {
  fn class_name(&self, selector: &str, context: &NamingContext<'_>) -> String {
    let key = format!("{}:{}:{}", context.file_name, context.call_index, selector);
    let hash = xxh3_64(key.as_bytes()) as u32;
    format!("{}{}-{:08x}", self.prefix, selector, hash)
  }
}

pub fn class_namer_for(naming: &ClassNaming) -> Arc<dyn ClassNamer> {
  match naming {
    ClassNaming::Counter { prefix } => Arc::new(CounterClassNamer::new(prefix.clone())),
    ClassNaming::Hash { prefix } => Arc::new(HashClassNamer::new(prefix.clone())),
  }
}

/// Hands out the class names of one call.
///
/// The namer is asked once per selector. Names are unique within the call: when the namer repeats
/// itself the name gets a `-<n>` suffix.
pub struct ClassNameAllocator<'n> {
  namer: &'n dyn ClassNamer,
  issued: HashSet<String>,
}

impl<'n> ClassNameAllocator<'n> {
  pub fn new(namer: &'n dyn ClassNamer) -> Self {
    ClassNameAllocator {
      namer,
      issued: HashSet::new(),
    }
  }

  pub fn allocate(&mut self, selector: &str, context: &NamingContext<'_>) -> String {
    let candidate = self.namer.class_name(selector, context);

    let mut name = candidate.clone();
    let mut suffix = 1;
    while !self.issued.insert(name.clone()) {
      name = format!("{}-{}", candidate, suffix);
      suffix += 1;
    }
    name
  }
}
