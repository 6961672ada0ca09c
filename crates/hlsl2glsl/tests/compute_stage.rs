use hlsl2glsl::{
    convert_hlsl_to_glsl, ConversionAttribs, ConvertError, NullResolver, ShaderStage,
};

fn attribs() -> ConversionAttribs {
    let mut a = ConversionAttribs::new("main", ShaderStage::Compute);
    a.include_definitions = false;
    a
}

#[test]
fn numthreads_becomes_local_size_layout_and_is_removed() {
    let src = "\
RWTexture2D<float4 /* format = rgba32f */> g_Out;

[numthreads(8, 8, 1)]
void main(uint3 id : SV_DispatchThreadID)
{
    g_Out[id.xy] = float4(1.0, 0.0, 0.0, 1.0);
}
";
    let out = convert_hlsl_to_glsl(src, "test.hlsl", &NullResolver, &attribs()).expect("conversion");
    assert!(
        out.contains("layout(local_size_x = 8, local_size_y = 8, local_size_z = 1) in;"),
        "local size layout missing:\n{out}"
    );
    assert!(!out.contains("numthreads"), "attribute text survived:\n{out}");
    assert!(
        out.contains("id = _GET_GL_GLOBAL_INVOCATION_ID;"),
        "dispatch thread id input wrong:\n{out}"
    );
    assert!(
        out.contains("imageStore(g_Out, _ToIvec(id.xy)"),
        "store not rewritten:\n{out}"
    );
}

#[test]
fn all_compute_input_semantics_map_to_builtins() {
    let src = "\
[numthreads(4, 2, 1)]
void main(
    uint3 dtid : SV_DispatchThreadID,
    uint3 gid  : SV_GroupID,
    uint3 gtid : SV_GroupThreadID,
    uint  gi   : SV_GroupIndex)
{
    uint x = dtid.x + gid.x + gtid.x + gi;
}
";
    let out = convert_hlsl_to_glsl(src, "test.hlsl", &NullResolver, &attribs()).expect("conversion");
    assert!(out.contains("dtid = _GET_GL_GLOBAL_INVOCATION_ID;"), "wrong:\n{out}");
    assert!(out.contains("gid = _GET_GL_WORK_GROUP_ID;"), "wrong:\n{out}");
    assert!(out.contains("gtid = _GET_GL_LOCAL_INVOCATION_ID;"), "wrong:\n{out}");
    assert!(out.contains("gi = _GET_GL_LOCAL_INVOCATION_INDEX;"), "wrong:\n{out}");
}

#[test]
fn missing_numthreads_is_a_hard_error() {
    let src = "void main(uint3 id : SV_DispatchThreadID) { }";
    assert!(matches!(
        convert_hlsl_to_glsl(src, "test.hlsl", &NullResolver, &attribs()),
        Err(ConvertError::MissingAttribute { name: "numthreads" })
    ));
}

#[test]
fn malformed_numthreads_is_a_hard_error() {
    let src = "[numthreads(8, 8)] void main(uint3 id : SV_DispatchThreadID) { }";
    assert!(matches!(
        convert_hlsl_to_glsl(src, "test.hlsl", &NullResolver, &attribs()),
        Err(ConvertError::MissingAttribute { name: "numthreads" })
    ));
}

#[test]
fn non_compute_input_semantic_is_a_hard_error() {
    let src = "[numthreads(1, 1, 1)] void main(float2 uv : TEXCOORD0) { }";
    match convert_hlsl_to_glsl(src, "test.hlsl", &NullResolver, &attribs()) {
        Err(ConvertError::InvalidSemantic {
            semantic,
            direction,
            stage,
        }) => {
            assert_eq!(semantic, "texcoord0");
            assert_eq!(direction, "input");
            assert_eq!(stage, ShaderStage::Compute);
        }
        other => panic!("expected InvalidSemantic, got {other:?}"),
    }
}

#[test]
fn output_parameters_are_rejected() {
    let src = "[numthreads(1, 1, 1)] void main(out uint x : SOMETHING) { }";
    assert!(matches!(
        convert_hlsl_to_glsl(src, "test.hlsl", &NullResolver, &attribs()),
        Err(ConvertError::InvalidSemantic {
            direction: "output",
            ..
        })
    ));
}
