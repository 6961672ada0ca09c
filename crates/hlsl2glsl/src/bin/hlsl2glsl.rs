use std::env;
use std::fs;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use anyhow::{bail, Context};
use hlsl2glsl::{
    ConversionAttribs, ConversionStream, FileResolver, ShaderStage, StubTables,
};

fn usage() -> &'static str {
    "\
hlsl2glsl: convert an HLSL shader to GLSL

USAGE:
    cargo run -p hlsl2glsl --bin hlsl2glsl -- <shader.hlsl> --entry NAME --stage STAGE [flags]

FLAGS:
    --entry NAME            Entry point function name (default: main)
    --stage STAGE           vs|ps|gs|hs|ds|cs (or vertex|pixel|...)
    --no-definitions        Do not prepend the GLSL runtime definitions header
    --sampler-suffix S      Texture/sampler pairing suffix (default: _sampler)
    --locations             Emit explicit layout(location=N) on varyings
"
}

fn main() {
    if let Err(err) = real_main() {
        eprintln!("error: {err:#}");
        process::exit(1);
    }
}

fn real_main() -> anyhow::Result<()> {
    let mut path: Option<PathBuf> = None;
    let mut entry = "main".to_string();
    let mut stage: Option<ShaderStage> = None;
    let mut include_definitions = true;
    let mut sampler_suffix = "_sampler".to_string();
    let mut use_locations = false;

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                print!("{}", usage());
                return Ok(());
            }
            "--entry" => {
                let Some(v) = args.next() else {
                    bail!("--entry requires a value");
                };
                entry = v;
            }
            "--stage" => {
                let Some(v) = args.next() else {
                    bail!("--stage requires a value");
                };
                stage = Some(
                    ShaderStage::from_name(&v)
                        .with_context(|| format!("unknown shader stage {v:?}"))?,
                );
            }
            "--no-definitions" => include_definitions = false,
            "--sampler-suffix" => {
                let Some(v) = args.next() else {
                    bail!("--sampler-suffix requires a value");
                };
                sampler_suffix = v;
            }
            "--locations" => use_locations = true,
            _ if arg.starts_with('-') => {
                bail!("unknown option {arg:?}\n\n{}", usage());
            }
            _ => {
                if path.is_some() {
                    bail!("unexpected positional argument {arg:?}\n\n{}", usage());
                }
                path = Some(PathBuf::from(arg));
            }
        }
    }

    let Some(path) = path else {
        bail!("missing HLSL input path\n\n{}", usage());
    };
    let Some(stage) = stage else {
        bail!("missing --stage\n\n{}", usage());
    };

    let source = fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let base = path
        .parent()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    let resolver = FileResolver::new(base);

    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("shader")
        .to_string();
    let tables = Arc::new(StubTables::new());
    let mut stream = ConversionStream::new(&name, &source, &resolver, tables, false)
        .with_context(|| format!("failed to load {}", path.display()))?;

    let mut attribs = ConversionAttribs::new(entry, stage);
    attribs.include_definitions = include_definitions;
    attribs.sampler_suffix = sampler_suffix;
    attribs.use_inout_location_qualifiers = use_locations;

    let glsl = stream
        .convert(&attribs)
        .with_context(|| format!("failed to convert {}", path.display()))?;
    print!("{glsl}");
    Ok(())
}
