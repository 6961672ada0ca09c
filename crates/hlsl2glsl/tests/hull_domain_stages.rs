use hlsl2glsl::{
    convert_hlsl_to_glsl, ConversionAttribs, ConvertError, NullResolver, ShaderStage,
};

fn attribs(entry: &str, stage: ShaderStage) -> ConversionAttribs {
    let mut a = ConversionAttribs::new(entry, stage);
    a.include_definitions = false;
    a
}

const HULL_SRC: &str = "\
struct VSOut { float3 Pos : POSITION; };
struct HSOut { float3 Pos : POSITION; };
struct PatchTess
{
    float Edges[3] : SV_TessFactor;
    float Inside   : SV_InsideTessFactor;
};

PatchTess PCF(InputPatch<VSOut, 3> ip)
{
    PatchTess pt;
    pt.Edges[0] = 1.0;
    pt.Edges[1] = 1.0;
    pt.Edges[2] = 1.0;
    pt.Inside = 1.0;
    return pt;
}

[domain(\"tri\")]
[partitioning(\"fractional_odd\")]
[outputtopology(\"triangle_cw\")]
[outputcontrolpoints(3)]
[patchconstantfunc(\"PCF\")]
HSOut HSMain(InputPatch<VSOut, 3> cp, uint i : SV_OutputControlPointID)
{
    HSOut o;
    o.Pos = cp[i].Pos;
    return o;
}
";

fn convert_hs(src: &str) -> String {
    convert_hlsl_to_glsl(src, "test.hlsl", &NullResolver, &attribs("HSMain", ShaderStage::Hull))
        .expect("conversion")
}

#[test]
fn hull_emits_vertices_layout_and_invocation_indexed_outputs() {
    let out = convert_hs(HULL_SRC);
    assert!(out.contains("layout(vertices = 3) out;"), "vertices layout missing:\n{out}");
    assert!(
        out.contains("out float3 _pcp_position[];"),
        "per-control-point output array missing:\n{out}"
    );
    assert!(
        out.contains("_pcp_position[gl_InvocationID] = _RET_VAL_.Pos;"),
        "control-point output must index by gl_InvocationID:\n{out}"
    );
    assert!(out.contains("i = _GET_GL_INVOCATION_ID;"), "control point id input wrong:\n{out}");
}

#[test]
fn hull_input_patch_fills_from_runtime_patch_size() {
    let out = convert_hs(HULL_SRC);
    assert!(out.contains("VSOut cp[3];"), "patch local missing:\n{out}");
    assert!(
        out.contains("for (int _i = 0; _i < gl_PatchVerticesIn; ++_i)"),
        "patch fill must loop over gl_PatchVerticesIn, not the declared size:\n{out}"
    );
    assert!(
        out.contains("cp[_i].Pos = _position[_i];"),
        "patch member fill missing:\n{out}"
    );
    assert!(out.contains("in float3 _position[];"), "input varying array missing:\n{out}");
}

#[test]
fn patch_constant_function_runs_once_per_patch() {
    let out = convert_hs(HULL_SRC);
    assert!(
        out.contains("if (gl_InvocationID == 0)"),
        "patch constants must be guarded to one invocation:\n{out}"
    );
    assert!(
        out.contains("PatchTess _patch_constants = PCF(cp);"),
        "patch constant call missing:\n{out}"
    );
    for i in 0..3 {
        assert!(
            out.contains(&format!(
                "_SET_GL_TESS_LEVEL_OUTER({i}, _patch_constants.Edges[{i}]);"
            )),
            "outer tess level {i} missing:\n{out}"
        );
    }
    assert!(
        out.contains("_SET_GL_TESS_LEVEL_INNER(0, _patch_constants.Inside);"),
        "inner tess level missing:\n{out}"
    );
    // The PCF itself survives as a plain function with the patch type
    // rewritten to an array parameter.
    assert!(out.contains("PatchTess PCF(VSOut ip[3])"), "PCF signature not lowered:\n{out}");
}

#[test]
fn hull_missing_required_attributes_is_a_hard_error() {
    let no_cp = HULL_SRC.replace("[outputcontrolpoints(3)]\n", "");
    assert!(matches!(
        convert_hlsl_to_glsl(
            &no_cp,
            "test.hlsl",
            &NullResolver,
            &attribs("HSMain", ShaderStage::Hull)
        ),
        Err(ConvertError::MissingAttribute {
            name: "outputcontrolpoints"
        })
    ));

    let no_pcf = HULL_SRC.replace("[patchconstantfunc(\"PCF\")]\n", "");
    assert!(matches!(
        convert_hlsl_to_glsl(
            &no_pcf,
            "test.hlsl",
            &NullResolver,
            &attribs("HSMain", ShaderStage::Hull)
        ),
        Err(ConvertError::MissingAttribute {
            name: "patchconstantfunc"
        })
    ));
}

#[test]
fn hull_unknown_patch_constant_function_is_a_hard_error() {
    let bad = HULL_SRC.replace("[patchconstantfunc(\"PCF\")]", "[patchconstantfunc(\"Nope\")]");
    assert!(matches!(
        convert_hlsl_to_glsl(
            &bad,
            "test.hlsl",
            &NullResolver,
            &attribs("HSMain", ShaderStage::Hull)
        ),
        Err(ConvertError::PatchConstantFuncNotFound(name)) if name == "Nope"
    ));
}

const DOMAIN_SRC: &str = "\
struct PatchTess
{
    float Edges[3] : SV_TessFactor;
    float Inside   : SV_InsideTessFactor;
};
struct HSOut { float3 Pos : POSITION; };
struct DSOut { float4 Pos : SV_Position; };

/* partitioning = fractional_odd */
/* outputtopology = triangle_cw */
[domain(\"tri\")]
DSOut DSMain(PatchTess pt, float3 bary : SV_DomainLocation, const OutputPatch<HSOut, 3> cp)
{
    DSOut o;
    o.Pos = float4(cp[0].Pos * bary.x, 1.0);
    return o;
}
";

fn convert_ds(src: &str) -> String {
    convert_hlsl_to_glsl(
        src,
        "test.hlsl",
        &NullResolver,
        &attribs("DSMain", ShaderStage::Domain),
    )
    .expect("conversion")
}

#[test]
fn domain_reads_attributes_from_brackets_and_comments() {
    let out = convert_ds(DOMAIN_SRC);
    assert!(
        out.contains("layout(triangles, fractional_odd_spacing, cw) in;"),
        "tessellation evaluation layout wrong:\n{out}"
    );
}

#[test]
fn domain_inputs_read_tess_levels_coord_and_control_points() {
    let out = convert_ds(DOMAIN_SRC);
    for i in 0..3 {
        assert!(
            out.contains(&format!("pt.Edges[{i}] = _GET_GL_TESS_LEVEL_OUTER({i});")),
            "outer level read {i} missing:\n{out}"
        );
    }
    assert!(
        out.contains("pt.Inside = _GET_GL_TESS_LEVEL_INNER(0);"),
        "inner level read missing:\n{out}"
    );
    assert!(out.contains("bary = _GET_GL_TESS_COORD;"), "domain location wrong:\n{out}");
    assert!(
        out.contains("cp[_i].Pos = _pcp_position[_i];"),
        "output patch fill must read the hull's per-control-point arrays:\n{out}"
    );
    assert!(
        out.contains("_SET_GL_POSITION(_RET_VAL_.Pos);"),
        "domain position output missing:\n{out}"
    );
}

#[test]
fn domain_missing_partitioning_is_a_hard_error() {
    let bad = DOMAIN_SRC.replace("/* partitioning = fractional_odd */\n", "");
    assert!(matches!(
        convert_hlsl_to_glsl(
            &bad,
            "test.hlsl",
            &NullResolver,
            &attribs("DSMain", ShaderStage::Domain)
        ),
        Err(ConvertError::MissingAttribute {
            name: "partitioning"
        })
    ));
}
