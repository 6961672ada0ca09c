//! The GLSL runtime-support header prepended to converted shaders.
//!
//! Converted source references this header in three ways: HLSL-style type
//! names pass through the converter untouched and resolve through the type
//! aliases; rewritten object-method calls resolve through the stub
//! functions/macros; generated prologues and `_RETURN_` macros go through
//! the `_GET_GL_*`/`_SET_GL_*` builtin accessors. Keep the stub names in
//! sync with [`crate::StubTables`].

pub const GLSL_DEFINITIONS: &str = r#"// ---- HLSL compatibility definitions (generated header) ----

#define float2   vec2
#define float3   vec3
#define float4   vec4
#define int2     ivec2
#define int3     ivec3
#define int4     ivec4
#define uint2    uvec2
#define uint3    uvec3
#define uint4    uvec4
#define bool2    bvec2
#define bool3    bvec3
#define bool4    bvec4
#define half     float
#define half2    vec2
#define half3    vec3
#define half4    vec4
#define float2x2 mat2
#define float3x3 mat3
#define float4x4 mat4
#define float4x3 mat4x3
#define float3x4 mat3x4
#define groupshared shared
#define static
#define inline

// Separate sampler-state variables survive conversion as harmless globals.
#define SamplerState           int
#define SamplerComparisonState int

// Common intrinsic renames. `mul(M, v)` keeps HLSL's operand order.
#define lerp        mix
#define frac        fract
#define rsqrt       inversesqrt
#define atan2       atan
#define ddx         dFdx
#define ddy         dFdy
#define mad         fma
#define saturate(x) clamp((x), 0.0, 1.0)
#define mul(a, b)   ((a) * (b))
#define GroupMemoryBarrierWithGroupSync() barrier()
#define DeviceMemoryBarrierWithGroupSync() barrier()

// Result-width correction suffixes appended to Sample/Load-family stubs.
#define _SWIZZLE1 .x
#define _SWIZZLE2 .xy
#define _SWIZZLE3 .xyz
#define _SWIZZLE4

// Coordinate conversion for imageLoad/imageStore rewrites.
int   _ToIvec(int x)    { return x; }
int   _ToIvec(uint x)   { return int(x); }
ivec2 _ToIvec(ivec2 v)  { return v; }
ivec2 _ToIvec(uvec2 v)  { return ivec2(v); }
ivec2 _ToIvec(vec2 v)   { return ivec2(v); }
ivec3 _ToIvec(ivec3 v)  { return v; }
ivec3 _ToIvec(uvec3 v)  { return ivec3(v); }
ivec3 _ToIvec(vec3 v)   { return ivec3(v); }

// imageStore always takes a 4-component value.
vec4  _ExpandVector(float x) { return vec4(x, 0.0, 0.0, 0.0); }
vec4  _ExpandVector(vec2 v)  { return vec4(v, 0.0, 0.0); }
vec4  _ExpandVector(vec3 v)  { return vec4(v, 0.0); }
vec4  _ExpandVector(vec4 v)  { return v; }
ivec4 _ExpandVector(int x)   { return ivec4(x, 0, 0, 0); }
ivec4 _ExpandVector(ivec2 v) { return ivec4(v, 0, 0); }
ivec4 _ExpandVector(ivec3 v) { return ivec4(v, 0); }
ivec4 _ExpandVector(ivec4 v) { return v; }
uvec4 _ExpandVector(uint x)  { return uvec4(x, 0u, 0u, 0u); }
uvec4 _ExpandVector(uvec2 v) { return uvec4(v, 0u, 0u); }
uvec4 _ExpandVector(uvec3 v) { return uvec4(v, 0u); }
uvec4 _ExpandVector(uvec4 v) { return v; }

// Builtin accessors. Only the macros a stage actually uses expand, so the
// full set can be defined for every stage.
#define _GET_GL_VERTEX_ID              gl_VertexID
#define _GET_GL_INSTANCE_ID            gl_InstanceID
#define _SET_GL_POSITION(_pos)         gl_Position = _pos
#define _GET_GL_FRAG_COORD             gl_FragCoord
#define _GET_GL_FRONT_FACING           gl_FrontFacing
#define _SET_GL_FRAG_DEPTH(_d)         gl_FragDepth = _d
#define _GET_GL_IN_POSITION(_i)        gl_in[_i].gl_Position
#define _GET_GL_PRIMITIVE_ID           gl_PrimitiveID
#define _GET_GL_PRIMITIVE_ID_IN        gl_PrimitiveIDIn
#define _SET_GL_LAYER(_l)              gl_Layer = _l
#define _GET_GL_INVOCATION_ID          gl_InvocationID
#define _SET_GL_OUT_POSITION(_pos)     gl_out[gl_InvocationID].gl_Position = _pos
#define _SET_GL_TESS_LEVEL_OUTER(_i, _v) gl_TessLevelOuter[_i] = _v
#define _SET_GL_TESS_LEVEL_INNER(_i, _v) gl_TessLevelInner[_i] = _v
#define _GET_GL_TESS_LEVEL_OUTER(_i)   gl_TessLevelOuter[_i]
#define _GET_GL_TESS_LEVEL_INNER(_i)   gl_TessLevelInner[_i]
#define _GET_GL_TESS_COORD             gl_TessCoord
#define _GET_GL_GLOBAL_INVOCATION_ID   gl_GlobalInvocationID
#define _GET_GL_WORK_GROUP_ID          gl_WorkGroupID
#define _GET_GL_LOCAL_INVOCATION_ID    gl_LocalInvocationID
#define _GET_GL_LOCAL_INVOCATION_INDEX gl_LocalInvocationIndex

// Texture stubs. The sampler-state argument is the dummy `int` global the
// sampler declaration became; it exists only to keep call shapes intact.
#define Sample_2(_tex, _smp, _uv)                  texture(_tex, _uv)
#define Sample_3(_tex, _smp, _uv, _off)            textureOffset(_tex, _uv, _off)
#define SampleBias_3(_tex, _smp, _uv, _b)          texture(_tex, _uv, _b)
#define SampleBias_4(_tex, _smp, _uv, _b, _off)    textureOffset(_tex, _uv, _off, _b)
#define SampleLevel_3(_tex, _smp, _uv, _lod)       textureLod(_tex, _uv, _lod)
#define SampleLevel_4(_tex, _smp, _uv, _lod, _off) textureLodOffset(_tex, _uv, _lod, _off)
#define SampleGrad_4(_tex, _smp, _uv, _dx, _dy)    textureGrad(_tex, _uv, _dx, _dy)
#define SampleGrad_5(_tex, _smp, _uv, _dx, _dy, _off) textureGradOffset(_tex, _uv, _dx, _dy, _off)
#define Gather_2(_tex, _smp, _uv)                  textureGather(_tex, _uv)
#define Gather_3(_tex, _smp, _uv, _off)            textureGatherOffset(_tex, _uv, _off)

// Comparison sampling: GLSL folds the reference value into the coordinate.
float SampleCmp_3(sampler1DShadow t, int s, float uv, float cmp)       { return texture(t, vec3(uv, 0.0, cmp)); }
float SampleCmp_3(sampler2DShadow t, int s, vec2 uv, float cmp)        { return texture(t, vec3(uv, cmp)); }
float SampleCmp_3(sampler2DArrayShadow t, int s, vec3 uv, float cmp)   { return texture(t, vec4(uv, cmp)); }
float SampleCmp_3(samplerCubeShadow t, int s, vec3 uv, float cmp)      { return texture(t, vec4(uv, cmp)); }
float SampleCmpLevelZero_3(sampler2DShadow t, int s, vec2 uv, float cmp)      { return textureLod(t, vec3(uv, cmp), 0.0); }
float SampleCmpLevelZero_3(sampler1DShadow t, int s, float uv, float cmp)     { return textureLod(t, vec3(uv, 0.0, cmp), 0.0); }
vec4  GatherCmp_3(sampler2DShadow t, int s, vec2 uv, float cmp)        { return textureGather(t, uv, cmp); }
vec4  GatherCmp_3(sampler2DArrayShadow t, int s, vec3 uv, float cmp)   { return textureGather(t, uv, cmp); }

// Load: integer coordinates with the mip level folded into the last
// component (matching the HLSL Load signature).
vec4  Load_1(sampler1D t, ivec2 loc)       { return texelFetch(t, loc.x, loc.y); }
vec4  Load_1(sampler2D t, ivec3 loc)       { return texelFetch(t, loc.xy, loc.z); }
vec4  Load_1(sampler2DArray t, ivec4 loc)  { return texelFetch(t, loc.xyz, loc.w); }
vec4  Load_1(sampler3D t, ivec4 loc)       { return texelFetch(t, loc.xyz, loc.w); }
vec4  Load_1(samplerBuffer t, int loc)     { return texelFetch(t, loc); }
ivec4 Load_1(isampler2D t, ivec3 loc)      { return texelFetch(t, loc.xy, loc.z); }
ivec4 Load_1(isampler3D t, ivec4 loc)      { return texelFetch(t, loc.xyz, loc.w); }
ivec4 Load_1(isamplerBuffer t, int loc)    { return texelFetch(t, loc); }
uvec4 Load_1(usampler2D t, ivec3 loc)      { return texelFetch(t, loc.xy, loc.z); }
uvec4 Load_1(usampler3D t, ivec4 loc)      { return texelFetch(t, loc.xyz, loc.w); }
uvec4 Load_1(usamplerBuffer t, int loc)    { return texelFetch(t, loc); }
#define Load_2(_tex, _loc, _arg) Load_1(_tex, _loc)

// GetDimensions: out-parameter forms over textureSize.
void GetDimensions_1(samplerBuffer t, out int w)               { w = textureSize(t); }
void GetDimensions_2(sampler2D t, out int w, out int h)        { ivec2 d = textureSize(t, 0); w = d.x; h = d.y; }
void GetDimensions_2(sampler2D t, out uint w, out uint h)      { ivec2 d = textureSize(t, 0); w = uint(d.x); h = uint(d.y); }
void GetDimensions_2(sampler2D t, out float w, out float h)    { ivec2 d = textureSize(t, 0); w = float(d.x); h = float(d.y); }
void GetDimensions_3(sampler3D t, out int w, out int h, out int d) { ivec3 s = textureSize(t, 0); w = s.x; h = s.y; d = s.z; }
void GetDimensions_3(sampler2DArray t, out int w, out int h, out int e) { ivec3 s = textureSize(t, 0); w = s.x; h = s.y; e = s.z; }
void GetDimensions_2(image2D img, out int w, out int h)        { ivec2 d = imageSize(img); w = d.x; h = d.y; }
void GetDimensions_2(image2D img, out uint w, out uint h)      { ivec2 d = imageSize(img); w = uint(d.x); h = uint(d.y); }

// Atomic stubs. The image family takes the rewritten (image, coord) pair;
// the shared-variable family forwards the destination expression unchanged.
#define InterlockedAddImage_2(_img, _coord, _val)             imageAtomicAdd(_img, _coord, _val)
#define InterlockedAddImage_3(_img, _coord, _val, _orig)      ((_orig) = imageAtomicAdd(_img, _coord, _val))
#define InterlockedAndImage_2(_img, _coord, _val)             imageAtomicAnd(_img, _coord, _val)
#define InterlockedAndImage_3(_img, _coord, _val, _orig)      ((_orig) = imageAtomicAnd(_img, _coord, _val))
#define InterlockedOrImage_2(_img, _coord, _val)              imageAtomicOr(_img, _coord, _val)
#define InterlockedOrImage_3(_img, _coord, _val, _orig)       ((_orig) = imageAtomicOr(_img, _coord, _val))
#define InterlockedXorImage_2(_img, _coord, _val)             imageAtomicXor(_img, _coord, _val)
#define InterlockedXorImage_3(_img, _coord, _val, _orig)      ((_orig) = imageAtomicXor(_img, _coord, _val))
#define InterlockedMinImage_2(_img, _coord, _val)             imageAtomicMin(_img, _coord, _val)
#define InterlockedMinImage_3(_img, _coord, _val, _orig)      ((_orig) = imageAtomicMin(_img, _coord, _val))
#define InterlockedMaxImage_2(_img, _coord, _val)             imageAtomicMax(_img, _coord, _val)
#define InterlockedMaxImage_3(_img, _coord, _val, _orig)      ((_orig) = imageAtomicMax(_img, _coord, _val))
#define InterlockedExchangeImage_3(_img, _coord, _val, _orig) ((_orig) = imageAtomicExchange(_img, _coord, _val))
#define InterlockedCompareExchangeImage_4(_img, _coord, _cmp, _val, _orig) ((_orig) = imageAtomicCompSwap(_img, _coord, _cmp, _val))
#define InterlockedCompareStoreImage_3(_img, _coord, _cmp, _val) imageAtomicCompSwap(_img, _coord, _cmp, _val)

#define InterlockedAddSharedVar_2(_dest, _val)              atomicAdd(_dest, _val)
#define InterlockedAddSharedVar_3(_dest, _val, _orig)       ((_orig) = atomicAdd(_dest, _val))
#define InterlockedAndSharedVar_2(_dest, _val)              atomicAnd(_dest, _val)
#define InterlockedAndSharedVar_3(_dest, _val, _orig)       ((_orig) = atomicAnd(_dest, _val))
#define InterlockedOrSharedVar_2(_dest, _val)               atomicOr(_dest, _val)
#define InterlockedOrSharedVar_3(_dest, _val, _orig)        ((_orig) = atomicOr(_dest, _val))
#define InterlockedXorSharedVar_2(_dest, _val)              atomicXor(_dest, _val)
#define InterlockedXorSharedVar_3(_dest, _val, _orig)       ((_orig) = atomicXor(_dest, _val))
#define InterlockedMinSharedVar_2(_dest, _val)              atomicMin(_dest, _val)
#define InterlockedMinSharedVar_3(_dest, _val, _orig)       ((_orig) = atomicMin(_dest, _val))
#define InterlockedMaxSharedVar_2(_dest, _val)              atomicMax(_dest, _val)
#define InterlockedMaxSharedVar_3(_dest, _val, _orig)       ((_orig) = atomicMax(_dest, _val))
#define InterlockedExchangeSharedVar_3(_dest, _val, _orig)  ((_orig) = atomicExchange(_dest, _val))
#define InterlockedCompareExchangeSharedVar_4(_dest, _cmp, _val, _orig) ((_orig) = atomicCompSwap(_dest, _cmp, _val))
#define InterlockedCompareStoreSharedVar_3(_dest, _cmp, _val) atomicCompSwap(_dest, _cmp, _val)

// ---- end of generated header ----
"#;

#[cfg(test)]
mod tests {
    use super::GLSL_DEFINITIONS;

    #[test]
    fn header_supplies_the_names_the_converter_emits() {
        for name in [
            "_SWIZZLE1",
            "_SWIZZLE4",
            "_ToIvec",
            "_ExpandVector",
            "_GET_GL_FRAG_COORD",
            "_SET_GL_POSITION",
            "_GET_GL_GLOBAL_INVOCATION_ID",
            "Sample_2",
            "SampleCmp_3",
            "Load_1",
            "InterlockedAddImage_2",
            "InterlockedAddSharedVar_2",
            "SamplerState",
        ] {
            assert!(
                GLSL_DEFINITIONS.contains(name),
                "definitions header is missing {name}"
            );
        }
    }
}
