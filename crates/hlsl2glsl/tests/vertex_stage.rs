use hlsl2glsl::{
    convert_hlsl_to_glsl, ConversionAttribs, ConvertError, NullResolver, ShaderStage,
};

fn attribs() -> ConversionAttribs {
    let mut a = ConversionAttribs::new("VSMain", ShaderStage::Vertex);
    a.include_definitions = false;
    a
}

fn convert_vs(src: &str) -> String {
    convert_hlsl_to_glsl(src, "test.hlsl", &NullResolver, &attribs()).expect("conversion")
}

const SRC: &str = "\
struct VSOut
{
    float4 Pos : SV_Position;
    float2 UV  : TEXCOORD0;
};

VSOut VSMain(float2 uv : TEXCOORD0, float3 n : ATTRIB5, uint vid : SV_VertexID)
{
    VSOut o;
    o.Pos = float4(n * float(vid), 1.0);
    o.UV = uv;
    return o;
}
";

#[test]
fn attribute_locations_explicit_wins_auto_continues() {
    let out = convert_vs(SRC);
    assert!(
        out.contains("layout(location = 0) in float2 _in_texcoord0;"),
        "auto location must start at 0:\n{out}"
    );
    assert!(
        out.contains("layout(location = 5) in float3 _in_attrib5;"),
        "explicit ATTRIB5 must pin location 5:\n{out}"
    );
}

#[test]
fn builtin_semantics_route_through_accessor_macros() {
    let out = convert_vs(SRC);
    assert!(out.contains("vid = _GET_GL_VERTEX_ID;"), "vertex id input wrong:\n{out}");
    assert!(
        out.contains("_SET_GL_POSITION(_RET_VAL_.Pos);"),
        "SV_Position output must use the builtin macro:\n{out}"
    );
}

#[test]
fn entry_point_signature_is_lowered_to_parameterless_main() {
    let out = convert_vs(SRC);
    assert!(out.contains("void main()"), "signature not lowered:\n{out}");
    assert!(!out.contains("VSMain"), "entry name survived:\n{out}");
    assert!(out.contains("_RETURN_("), "returns not macro-ified:\n{out}");
    // The varying is written inside the return macro, not declared with a
    // location by default.
    assert!(out.contains("out float2 _texcoord0;"), "varying missing:\n{out}");
    assert!(out.contains("_texcoord0 = _RET_VAL_.UV;"), "varying assignment missing:\n{out}");
}

#[test]
fn explicit_varying_locations_are_opt_in() {
    let mut a = attribs();
    a.use_inout_location_qualifiers = true;
    let out = convert_hlsl_to_glsl(SRC, "test.hlsl", &NullResolver, &a).expect("conversion");
    assert!(
        out.contains("layout(location = 0) out float2 _texcoord0;"),
        "flag must add varying locations:\n{out}"
    );
}

#[test]
fn location_collision_is_a_hard_error() {
    // ATTRIB2 pins 2, the auto counter then hands out 3, and the explicit
    // ATTRIB3 collides with it.
    let src = "\
float4 VSMain(float3 a : ATTRIB2, float3 b : TEXCOORD0, float3 c : ATTRIB3) : SV_Position
{
    return float4(a + b + c, 1.0);
}
";
    match convert_hlsl_to_glsl(src, "test.hlsl", &NullResolver, &attribs()) {
        Err(ConvertError::LocationConflict { location, semantic }) => {
            assert_eq!(location, 3);
            assert_eq!(semantic, "attrib3");
        }
        other => panic!("expected LocationConflict, got {other:?}"),
    }
}

#[test]
fn struct_inputs_are_flattened_into_attributes() {
    let src = "\
struct VSIn
{
    float3 Pos  : ATTRIB0;
    float3 Norm : ATTRIB1;
};

float4 VSMain(VSIn In) : SV_Position
{
    return float4(In.Pos + In.Norm, 1.0);
}
";
    let out = convert_vs(src);
    assert!(
        out.contains("layout(location = 0) in float3 _in_attrib0;"),
        "first member attribute missing:\n{out}"
    );
    assert!(
        out.contains("layout(location = 1) in float3 _in_attrib1;"),
        "second member attribute missing:\n{out}"
    );
    assert!(out.contains("In.Pos = _in_attrib0;"), "member fill missing:\n{out}");
    assert!(out.contains("In.Norm = _in_attrib1;"), "member fill missing:\n{out}");
    // The struct survives with its semantics stripped.
    assert!(!out.contains(": ATTRIB0"), "struct semantics survived:\n{out}");
}
