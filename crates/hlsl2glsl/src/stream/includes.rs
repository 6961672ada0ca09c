//! Textual `#include` inlining, run before tokenization.
//!
//! Includes are located outside comments and string constants only. Each
//! file contributes its text once per translation unit (tracked through a
//! case-insensitive set), matching the usual include-guard-free HLSL style;
//! an include that cannot be resolved aborts the conversion.

use std::collections::HashSet;

use hlsl_lex::{render_source_context, skip_comment, skip_identifier};
use tracing::debug;

use crate::{ConvertError, SourceResolver};

pub(crate) fn inline_includes(
    source: &str,
    resolver: &dyn SourceResolver,
) -> Result<String, ConvertError> {
    let mut included = HashSet::new();
    inline_into(source, resolver, &mut included)
}

fn inline_into(
    source: &str,
    resolver: &dyn SourceResolver,
    included: &mut HashSet<String>,
) -> Result<String, ConvertError> {
    let buf = source.as_bytes();
    let mut out = String::with_capacity(source.len());
    let mut chunk_start = 0usize;
    let mut pos = 0usize;

    while pos < buf.len() {
        match buf[pos] {
            b'/' => {
                let after = skip_comment(buf, pos).map_err(|e| ConvertError::Tokenize {
                    context: render_source_context(source, e.at, 2),
                    source_error: e,
                })?;
                pos = if after == pos { pos + 1 } else { after };
            }
            b'"' => {
                // Skip the string body; an unterminated string is reported
                // by the tokenizer with full context, not here.
                pos += 1;
                while pos < buf.len() {
                    match buf[pos] {
                        b'\\' if pos + 1 < buf.len() => pos += 2,
                        b'"' => {
                            pos += 1;
                            break;
                        }
                        _ => pos += 1,
                    }
                }
            }
            b'#' => {
                let hash = pos;
                let mut p = pos + 1;
                while p < buf.len() && matches!(buf[p], b' ' | b'\t') {
                    p += 1;
                }
                let name_end = skip_identifier(buf, p);
                if &source[p..name_end] != "include" {
                    pos += 1;
                    continue;
                }
                let (file, after) = parse_include_name(source, name_end)
                    .ok_or_else(|| ConvertError::MalformedInput {
                        message: "malformed #include directive".to_string(),
                        context: render_source_context(source, hash, 2),
                    })?;

                out.push_str(&source[chunk_start..hash]);
                if included.insert(file.to_ascii_lowercase()) {
                    let blob = resolver
                        .open(&file)
                        .ok_or_else(|| ConvertError::IncludeNotFound { name: file.clone() })?;
                    let text = String::from_utf8_lossy(&blob).into_owned();
                    debug!(include = %file, bytes = text.len(), "inlining include");
                    out.push_str(&inline_into(&text, resolver, included)?);
                } else {
                    debug!(include = %file, "skipping repeated include");
                }
                pos = after;
                chunk_start = after;
            }
            _ => pos += 1,
        }
    }

    out.push_str(&source[chunk_start..]);
    Ok(out)
}

/// Parses `"name"` or `<name>` after the `include` directive name. Returns
/// the file name and the position just past the closing delimiter.
fn parse_include_name(source: &str, mut pos: usize) -> Option<(String, usize)> {
    let buf = source.as_bytes();
    while pos < buf.len() && matches!(buf[pos], b' ' | b'\t') {
        pos += 1;
    }
    let close = match buf.get(pos)? {
        b'"' => b'"',
        b'<' => b'>',
        _ => return None,
    };
    let name_start = pos + 1;
    let mut p = name_start;
    while p < buf.len() && buf[p] != close && buf[p] != b'\n' {
        p += 1;
    }
    if buf.get(p) != Some(&close) || p == name_start {
        return None;
    }
    Some((source[name_start..p].to_string(), p + 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryResolver;

    #[test]
    fn inlines_each_file_once_case_insensitively() {
        let mut resolver = MemoryResolver::new();
        resolver.insert("common.fxh", "float Common() { return 1.0; }\n");
        let src = "#include \"common.fxh\"\n#include \"COMMON.FXH\"\nfloat4 x;\n";
        let out = inline_includes(src, &resolver).expect("inlines");
        assert_eq!(out.matches("float Common()").count(), 1);
        assert!(out.contains("float4 x;"));
    }

    #[test]
    fn nested_includes_and_angle_form() {
        let mut resolver = MemoryResolver::new();
        resolver.insert("outer.fxh", "#include <inner.fxh>\nfloat Outer;\n");
        resolver.insert("inner.fxh", "float Inner;\n");
        let out = inline_includes("#include <outer.fxh>\n", &resolver).expect("inlines");
        let inner = out.find("float Inner").expect("inner present");
        let outer = out.find("float Outer").expect("outer present");
        assert!(inner < outer);
    }

    #[test]
    fn include_inside_comment_is_ignored() {
        let resolver = MemoryResolver::new();
        let src = "// #include \"missing.fxh\"\n/* #include <also_missing> */\nfloat x;\n";
        let out = inline_includes(src, &resolver).expect("no includes to resolve");
        assert_eq!(out, src);
    }

    #[test]
    fn unresolvable_include_is_a_hard_error() {
        let resolver = MemoryResolver::new();
        let err = inline_includes("#include \"nope.fxh\"\n", &resolver).unwrap_err();
        match err {
            ConvertError::IncludeNotFound { name } => assert_eq!(name, "nope.fxh"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn malformed_include_reports_context() {
        let resolver = MemoryResolver::new();
        let err = inline_includes("#include oops\n", &resolver).unwrap_err();
        match err {
            ConvertError::MalformedInput { message, .. } => {
                assert!(message.contains("#include"))
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
