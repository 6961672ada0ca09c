//! HLSL → GLSL source-to-source converter.
//!
//! Translates HLSL shader text into GLSL text for the five programmable
//! stages (vertex, pixel, geometry, hull/domain, compute) by rewriting the
//! token stream in place:
//!
//! - `cbuffer` blocks become uniform blocks, structured buffers become
//!   SSBO-style buffer blocks, textures/samplers/images become GLSL
//!   sampler/image declarations (with shadow-sampler inference driven by a
//!   `<texture><suffix>` naming convention);
//! - object method calls (`Tex.Sample(...)`) are routed to GLSL function
//!   stubs selected by (object type, method, arity), with result-width
//!   swizzle correction;
//! - `Interlocked*` calls and RW-texture `[]` subscripts become
//!   `imageAtomic*`/`imageLoad`/`imageStore` forms;
//! - the requested entry point's signature is lowered to a parameterless
//!   `main()` with stage-specific interface variables, prologue and
//!   `return`-macro epilogue.
//!
//! The output intentionally leans on a small runtime-support header
//! ([`GLSL_DEFINITIONS`]) supplying type aliases, the stub functions and the
//! `_GET_GL_*`/`_SET_GL_*` builtin-access macros; token-level type names
//! (`float4` and friends) pass through unchanged and resolve through that
//! header.
//!
//! Everything is single-threaded and synchronous; a failed conversion
//! produces an error and no output (there is no partial/degraded mode).

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

mod defs;
mod stream;
mod stubs;

pub use crate::defs::GLSL_DEFINITIONS;
pub use crate::stream::ConversionStream;
pub use crate::stubs::{IoDirection, SemanticMacro, StubInfo, StubTables, SwizzlePolicy};

pub use hlsl_lex::{LexError, LexErrorKind};

/// Target shader stage of one conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Pixel,
    Geometry,
    Hull,
    Domain,
    Compute,
}

impl ShaderStage {
    /// Parses the common short and long spellings (`vs`, `vertex`, …).
    pub fn from_name(name: &str) -> Option<ShaderStage> {
        Some(match name.to_ascii_lowercase().as_str() {
            "vs" | "vertex" => ShaderStage::Vertex,
            "ps" | "pixel" | "fragment" => ShaderStage::Pixel,
            "gs" | "geometry" => ShaderStage::Geometry,
            "hs" | "hull" => ShaderStage::Hull,
            "ds" | "domain" => ShaderStage::Domain,
            "cs" | "compute" => ShaderStage::Compute,
            _ => return None,
        })
    }
}

/// Resolves named byte blobs for `#include` processing.
///
/// The converter treats this as a read-only, side-effect-free lookup; a
/// `None` return makes the include a hard error.
pub trait SourceResolver {
    fn open(&self, name: &str) -> Option<Vec<u8>>;
}

/// Resolver with no files; any `#include` fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullResolver;

impl SourceResolver for NullResolver {
    fn open(&self, _name: &str) -> Option<Vec<u8>> {
        None
    }
}

/// In-memory resolver, mainly for tests.
#[derive(Debug, Default, Clone)]
pub struct MemoryResolver {
    files: HashMap<String, Vec<u8>>,
}

impl MemoryResolver {
    pub fn new() -> MemoryResolver {
        MemoryResolver::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, contents: impl Into<Vec<u8>>) {
        self.files.insert(name.into(), contents.into());
    }
}

impl SourceResolver for MemoryResolver {
    fn open(&self, name: &str) -> Option<Vec<u8>> {
        self.files.get(name).cloned()
    }
}

/// Resolves includes relative to a base directory.
#[derive(Debug, Clone)]
pub struct FileResolver {
    base: PathBuf,
}

impl FileResolver {
    pub fn new(base: impl Into<PathBuf>) -> FileResolver {
        FileResolver { base: base.into() }
    }
}

impl SourceResolver for FileResolver {
    fn open(&self, name: &str) -> Option<Vec<u8>> {
        std::fs::read(self.base.join(name)).ok()
    }
}

/// Per-`convert()` options.
#[derive(Debug, Clone)]
pub struct ConversionAttribs {
    /// Name of the HLSL function to lower into `main()`.
    pub entry_point: String,
    pub stage: ShaderStage,
    /// Prepend [`GLSL_DEFINITIONS`] to the output.
    pub include_definitions: bool,
    /// Suffix pairing a texture with its sampler-state variable
    /// (`Tex` + `Tex_sampler`); drives shadow-sampler inference.
    pub sampler_suffix: String,
    /// Emit explicit `layout(location = N)` qualifiers on stage-varying
    /// interface variables. Vertex attributes and pixel render targets are
    /// always located explicitly regardless of this flag.
    pub use_inout_location_qualifiers: bool,
}

impl ConversionAttribs {
    pub fn new(entry_point: impl Into<String>, stage: ShaderStage) -> ConversionAttribs {
        ConversionAttribs {
            entry_point: entry_point.into(),
            stage,
            include_definitions: true,
            sampler_suffix: "_sampler".to_string(),
            use_inout_location_qualifiers: false,
        }
    }
}

/// Conversion failure. Always fatal to the current `convert()` call; the
/// token stream snapshot (when enabled) is still restored, so further
/// conversions against the same stream remain possible.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("{source_error}\n{context}")]
    Tokenize {
        source_error: LexError,
        context: String,
    },
    #[error("unable to open include file {name:?}")]
    IncludeNotFound { name: String },
    #[error("{message}\n{context}")]
    MalformedInput { message: String, context: String },
    #[error(
        "unable to find function stub for {object_type}.{method} with {arity} argument(s): {call}"
    )]
    MissingStub {
        object_type: String,
        method: String,
        arity: usize,
        call: String,
    },
    #[error("required shader attribute [{name}] is missing or malformed")]
    MissingAttribute { name: &'static str },
    #[error("conflicting shader input location {location} (semantic {semantic:?})")]
    LocationConflict { location: u32, semantic: String },
    #[error("semantic {semantic:?} is not valid as an {direction} of a {stage:?} shader")]
    InvalidSemantic {
        semantic: String,
        direction: &'static str,
        stage: ShaderStage,
    },
    #[error("entry-point parameter {parameter:?} of a {stage:?} shader carries no semantic")]
    MissingSemantic {
        parameter: String,
        stage: ShaderStage,
    },
    #[error("entry point {0:?} not found")]
    EntryPointNotFound(String),
    #[error("patch constant function {0:?} not found")]
    PatchConstantFuncNotFound(String),
}

/// One-shot conversion of a single entry point.
///
/// Builds the stub tables and a [`ConversionStream`] internally; callers
/// converting several entry points out of one source should construct the
/// stream themselves with `preserve_tokens` enabled.
pub fn convert_hlsl_to_glsl(
    source: &str,
    source_name: &str,
    resolver: &dyn SourceResolver,
    attribs: &ConversionAttribs,
) -> Result<String, ConvertError> {
    let tables = Arc::new(StubTables::new());
    let mut stream = ConversionStream::new(source_name, source, resolver, tables, false)?;
    stream.convert(attribs)
}
