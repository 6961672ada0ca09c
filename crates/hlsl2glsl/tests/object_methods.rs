use hlsl2glsl::{
    convert_hlsl_to_glsl, ConversionAttribs, ConvertError, NullResolver, ShaderStage,
};

fn convert_ps(src: &str) -> String {
    try_convert_ps(src).expect("conversion")
}

fn try_convert_ps(src: &str) -> Result<String, ConvertError> {
    let mut attribs = ConversionAttribs::new("PSMain", ShaderStage::Pixel);
    attribs.include_definitions = false;
    convert_hlsl_to_glsl(src, "test.hlsl", &NullResolver, &attribs)
}

#[test]
fn sample_swizzle_matches_declared_component_count() {
    let src = "\
Texture2D<float3> Tex;
SamplerState Tex_sampler;

float4 PSMain(float2 uv : TEXCOORD0) : SV_Target
{
    return float4(Tex.Sample(Tex_sampler, uv), 1.0);
}
";
    let out = convert_ps(src);
    assert!(
        out.contains("Sample_2(Tex, Tex_sampler, uv)_SWIZZLE3"),
        "expected stub call with 3-component swizzle:\n{out}"
    );
}

#[test]
fn load_swizzles_and_gather_stays_fixed_width() {
    let src = "\
Texture3D<int2> g_Int;
Texture2D<float4> g_Four;
SamplerState g_Four_sampler;

float4 PSMain(float2 uv : TEXCOORD0) : SV_Target
{
    int2 a = g_Int.Load(int4(0, 0, 0, 0));
    float4 b = g_Four.Gather(g_Four_sampler, uv);
    return b + float4(a.x, a.y, 0.0, 0.0);
}
";
    let out = convert_ps(src);
    assert!(
        out.contains("Load_1(g_Int, int4(0, 0, 0, 0))_SWIZZLE2"),
        "Load must swizzle to the declared width:\n{out}"
    );
    assert!(
        out.contains("Gather_2(g_Four, g_Four_sampler, uv)"),
        "Gather call not rewritten:\n{out}"
    );
    assert!(
        !out.contains("Gather_2(g_Four, g_Four_sampler, uv)_SWIZZLE"),
        "Gather is fixed-width and must not be swizzled:\n{out}"
    );
}

#[test]
fn object_expression_subscripts_are_carried_into_the_stub_call() {
    let src = "\
Texture2D g_Tiles[4];
SamplerState g_Tiles_sampler;

float4 PSMain(float2 uv : TEXCOORD0) : SV_Target
{
    return g_Tiles[2].Sample(g_Tiles_sampler, uv);
}
";
    let out = convert_ps(src);
    assert!(
        out.contains("Sample_2(g_Tiles[2], g_Tiles_sampler, uv)_SWIZZLE4"),
        "subscripted object call wrong:\n{out}"
    );
}

#[test]
fn nested_calls_are_rewritten_independently() {
    let src = "\
Texture2D<float3> Tex;
SamplerState Tex_sampler;
Texture2D<float4> Lut;
SamplerState Lut_sampler;

float4 PSMain(float2 uv : TEXCOORD0) : SV_Target
{
    return float4(Tex.Sample(Tex_sampler, Lut.Sample(Lut_sampler, uv).xy), 1.0);
}
";
    let out = convert_ps(src);
    assert!(
        out.contains("Sample_2(Lut, Lut_sampler, uv)_SWIZZLE4.xy"),
        "inner call not rewritten:\n{out}"
    );
    assert!(out.contains("Sample_2(Tex, Tex_sampler,"), "outer call not rewritten:\n{out}");
}

#[test]
fn struct_member_access_is_not_an_object_method() {
    let src = "\
struct Light { float3 Dir; };

float4 PSMain(float3 n : NORMAL) : SV_Target
{
    Light l;
    l.Dir = float3(0.0, 1.0, 0.0);
    return float4(dot(n, l.Dir), 0.0, 0.0, 1.0);
}
";
    let out = convert_ps(src);
    assert!(out.contains("l.Dir = float3"), "member access mangled:\n{out}");
}

#[test]
fn unknown_method_or_arity_is_a_hard_error() {
    let src = "\
Texture2D Tex;
SamplerState Tex_sampler;

float4 PSMain(float2 uv : TEXCOORD0) : SV_Target
{
    return Tex.Frobnicate(Tex_sampler, uv);
}
";
    match try_convert_ps(src) {
        Err(ConvertError::MissingStub {
            object_type,
            method,
            arity,
            ..
        }) => {
            assert_eq!(object_type, "sampler2D");
            assert_eq!(method, "Frobnicate");
            assert_eq!(arity, 2);
        }
        other => panic!("expected MissingStub, got {other:?}"),
    }
}
