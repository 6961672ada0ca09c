use hlsl2glsl::{
    convert_hlsl_to_glsl, ConversionAttribs, ConvertError, NullResolver, ShaderStage,
};

fn attribs(entry: &str) -> ConversionAttribs {
    let mut a = ConversionAttribs::new(entry, ShaderStage::Pixel);
    a.include_definitions = false;
    a
}

fn convert_ps(src: &str, entry: &str) -> String {
    convert_hlsl_to_glsl(src, "test.hlsl", &NullResolver, &attribs(entry)).expect("conversion")
}

#[test]
fn cbuffer_position_and_target_end_to_end() {
    let src = "cbuffer CB { float4 a; }; \
float4 main(float4 pos : SV_Position) : SV_Target { return a; }";
    let out = convert_ps(src, "main");

    assert!(out.contains("uniform CB { float4 a; };"), "uniform block wrong:\n{out}");
    assert!(out.contains("void main()"), "parameterless main missing:\n{out}");
    assert!(
        out.contains("pos = _GET_GL_FRAG_COORD;"),
        "position builtin read missing:\n{out}"
    );
    assert!(
        out.contains("layout(location = 0) out float4 _sv_target;"),
        "target output variable missing:\n{out}"
    );
    assert!(
        out.contains("_sv_target = _RET_VAL_;"),
        "target assignment missing from return macro:\n{out}"
    );
    assert!(out.contains("_RETURN_("), "return not macro-ified:\n{out}");
    assert!(!out.contains("SV_Target"), "semantic survived:\n{out}");
}

#[test]
fn indexed_targets_and_depth_output() {
    let src = "\
struct PSOut
{
    float4 Color  : SV_Target0;
    float4 Bright : SV_Target3;
    float  Depth  : SV_Depth;
};

PSOut PSMain(float4 pos : SV_Position)
{
    PSOut o;
    o.Color = pos;
    o.Bright = pos;
    o.Depth = pos.z;
    return o;
}
";
    let out = convert_ps(src, "PSMain");
    assert!(
        out.contains("layout(location = 0) out float4 _sv_target0;"),
        "target 0 missing:\n{out}"
    );
    assert!(
        out.contains("layout(location = 3) out float4 _sv_target3;"),
        "target 3 missing:\n{out}"
    );
    assert!(
        out.contains("_SET_GL_FRAG_DEPTH(_RET_VAL_.Depth);"),
        "depth output must use the builtin macro:\n{out}"
    );
}

#[test]
fn front_facing_input_and_interpolation_qualifiers() {
    let src = "\
float4 PSMain(
    bool ff : SV_IsFrontFace,
    noperspective float2 uv : TEXCOORD0,
    nointerpolation int id : BLENDINDICES) : SV_Target
{
    return float4(uv, ff ? 1.0 : 0.0, float(id));
}
";
    let out = convert_ps(src, "PSMain");
    assert!(out.contains("ff = _GET_GL_FRONT_FACING;"), "front-face input wrong:\n{out}");
    assert!(
        out.contains("noperspective in float2 _texcoord0;"),
        "noperspective varying missing:\n{out}"
    );
    assert!(
        out.contains("flat in int _blendindices;"),
        "nointerpolation must map to flat:\n{out}"
    );
}

#[test]
fn non_target_output_semantic_is_a_hard_error() {
    let src = "float4 PSMain(float4 p : SV_Position) : NORMAL { return p; }";
    match convert_hlsl_to_glsl(src, "test.hlsl", &NullResolver, &attribs("PSMain")) {
        Err(ConvertError::InvalidSemantic {
            semantic,
            direction,
            ..
        }) => {
            assert_eq!(semantic, "normal");
            assert_eq!(direction, "output");
        }
        other => panic!("expected InvalidSemantic, got {other:?}"),
    }
}

#[test]
fn target_index_out_of_range_is_a_hard_error() {
    let src = "float4 PSMain(float4 p : SV_Position) : SV_Target8 { return p; }";
    assert!(matches!(
        convert_hlsl_to_glsl(src, "test.hlsl", &NullResolver, &attribs("PSMain")),
        Err(ConvertError::InvalidSemantic { .. })
    ));
}
