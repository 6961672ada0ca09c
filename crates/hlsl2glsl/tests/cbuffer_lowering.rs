use hlsl2glsl::{convert_hlsl_to_glsl, ConversionAttribs, NullResolver, ShaderStage};

fn convert_ps(src: &str, entry: &str) -> String {
    let mut attribs = ConversionAttribs::new(entry, ShaderStage::Pixel);
    attribs.include_definitions = false;
    convert_hlsl_to_glsl(src, "test.hlsl", &NullResolver, &attribs).expect("conversion")
}

#[test]
fn cbuffer_becomes_uniform_block() {
    let src = "\
cbuffer Constants
{
    float4 g_Tint;
};

float4 PSMain(float4 pos : SV_Position) : SV_Target
{
    return g_Tint;
}
";
    let out = convert_ps(src, "PSMain");
    assert!(out.contains("uniform Constants"), "no uniform block:\n{out}");
    assert!(!out.contains("cbuffer"), "cbuffer keyword survived:\n{out}");
    assert!(out.contains("float4 g_Tint;"), "member lost:\n{out}");
}

#[test]
fn semicolon_insertion_is_idempotent() {
    // Already terminated: must not gain a second semicolon.
    let with_semi = "\
cbuffer CB { float4 a; };
float4 PSMain(float4 p : SV_Position) : SV_Target { return a; }
";
    let out = convert_ps(with_semi, "PSMain");
    assert!(!out.contains(";;"), "double semicolon:\n{out}");

    // Unterminated: gains exactly one.
    let without_semi = "\
cbuffer CB { float4 a; }
float4 PSMain(float4 p : SV_Position) : SV_Target { return a; }
";
    let out = convert_ps(without_semi, "PSMain");
    assert!(out.contains("};"), "missing inserted semicolon:\n{out}");
    assert!(!out.contains(";;"), "double semicolon:\n{out}");
}

#[test]
fn register_clause_is_stripped() {
    let src = "\
cbuffer CB : register(b2)
{
    float4 a;
};
float4 PSMain(float4 p : SV_Position) : SV_Target { return a; }
";
    let out = convert_ps(src, "PSMain");
    assert!(!out.contains("register"), "register clause survived:\n{out}");
    assert!(out.contains("uniform CB"), "block header mangled:\n{out}");
}

#[test]
fn numeric_float_suffixes_are_stripped() {
    let src = "\
float4 PSMain(float4 p : SV_Position) : SV_Target
{
    float x = 0.5f;
    float y = 1.5e-3F;
    return float4(x, y, 0.25, 1.0);
}
";
    let out = convert_ps(src, "PSMain");
    assert!(out.contains("0.5;"), "suffix not stripped:\n{out}");
    assert!(out.contains("1.5e-3;"), "uppercase suffix not stripped:\n{out}");
}

#[test]
fn flow_control_attributes_are_deleted() {
    let src = "\
float4 PSMain(float4 p : SV_Position) : SV_Target
{
    float acc = 0.0;
    [unroll]
    for (int i = 0; i < 4; ++i)
    {
        [branch]
        if (p.x > 0.0)
            acc += 1.0;
    }
    return float4(acc, 0.0, 0.0, 1.0);
}
";
    let out = convert_ps(src, "PSMain");
    assert!(!out.contains("[unroll]"), "unroll attribute survived:\n{out}");
    assert!(!out.contains("[branch]"), "branch attribute survived:\n{out}");
    assert!(out.contains("for (int i = 0; i < 4; ++i)"), "loop mangled:\n{out}");
}
