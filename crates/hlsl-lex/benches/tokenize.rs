#[cfg(target_arch = "wasm32")]
fn main() {}

#[cfg(not(target_arch = "wasm32"))]
use criterion::{black_box, criterion_group, criterion_main, Criterion};

#[cfg(not(target_arch = "wasm32"))]
use hlsl_lex::tokenize;

#[cfg(not(target_arch = "wasm32"))]
const PIXEL_SHADER: &str = r#"
cbuffer Constants
{
    float4x4 g_WorldViewProj;
    float4 g_Tint;
};

Texture2D    g_Albedo;
SamplerState g_Albedo_sampler;

struct PSInput
{
    float4 Pos   : SV_Position;
    float2 UV    : TEXCOORD0;
    float3 Norm  : NORMAL;
};

float3 Shade(float3 n, float3 albedo)
{
    float ndl = max(dot(n, normalize(float3(0.3, 1.0, 0.2))), 0.0);
    return albedo * (0.15 + 0.85 * ndl);
}

float4 PSMain(PSInput In) : SV_Target
{
    float4 albedo = g_Albedo.Sample(g_Albedo_sampler, In.UV);
    float3 lit = Shade(normalize(In.Norm), albedo.rgb);
    return float4(lit, albedo.a) * g_Tint;
}
"#;

#[cfg(not(target_arch = "wasm32"))]
fn bench_tokenize(c: &mut Criterion) {
    // Repeat the fixture so the benchmark is not dominated by setup.
    let big: String = PIXEL_SHADER.repeat(64);

    let mut group = c.benchmark_group("hlsl_tokenize");
    group.bench_function("pixel_shader_x64", |b| {
        b.iter(|| {
            let list = tokenize(black_box(&big)).expect("fixture tokenizes");
            black_box(list.len());
        })
    });
    group.finish();
}

#[cfg(not(target_arch = "wasm32"))]
criterion_group!(benches, bench_tokenize);
#[cfg(not(target_arch = "wasm32"))]
criterion_main!(benches);
