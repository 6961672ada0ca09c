use hlsl2glsl::{convert_hlsl_to_glsl, ConversionAttribs, NullResolver, ShaderStage};

fn convert_cs(src: &str) -> String {
    let mut attribs = ConversionAttribs::new("CSMain", ShaderStage::Compute);
    attribs.include_definitions = false;
    convert_hlsl_to_glsl(src, "test.hlsl", &NullResolver, &attribs).expect("conversion")
}

const SRC: &str = "\
StructuredBuffer<float4> g_Positions : register(t0);
RWStructuredBuffer<uint> g_Counters;
RWStructuredBuffer<float4> g_Output : register(u1);

[numthreads(64, 1, 1)]
void CSMain(uint3 id : SV_DispatchThreadID)
{
    g_Output[id.x] = g_Positions[id.x];
    g_Counters[id.x] = id.x;
}
";

#[test]
fn read_only_buffer_gets_std140_readonly_block() {
    let out = convert_cs(SRC);
    assert!(
        out.contains("layout(std140) readonly buffer g_Positions"),
        "missing readonly buffer block:\n{out}"
    );
    assert!(
        out.contains("float4 g_Positions_data[];"),
        "missing interior array:\n{out}"
    );
    assert!(
        out.contains("#define g_Positions g_Positions_data"),
        "missing alias define:\n{out}"
    );
    assert!(!out.contains("StructuredBuffer"), "keyword survived:\n{out}");
    assert!(!out.contains("register"), "register clause survived:\n{out}");
}

#[test]
fn rw_buffers_take_distinct_auto_bindings_and_drop_readonly() {
    let out = convert_cs(SRC);
    assert!(
        out.contains("layout(std140, binding = 0) buffer g_Counters"),
        "first RW buffer binding wrong:\n{out}"
    );
    assert!(
        out.contains("layout(std140, binding = 1) buffer g_Output"),
        "second RW buffer binding wrong:\n{out}"
    );
    assert!(
        !out.contains("readonly buffer g_Counters") && !out.contains("readonly buffer g_Output"),
        "RW buffer must not be readonly:\n{out}"
    );
}

#[test]
fn references_are_left_for_the_alias_define() {
    let out = convert_cs(SRC);
    // The body still says `g_Counters[...]`; the #define redirects it to
    // the interior array at GLSL compile time.
    assert!(
        out.contains("g_Counters[id.x] = id.x;"),
        "body reference rewritten unexpectedly:\n{out}"
    );
}
