//! Lookup tables consulted during conversion.
//!
//! [`StubTables`] is built once (it enumerates every sampler/image type ×
//! method × arity combination the converter understands) and then shared by
//! reference between conversion streams; keeping it an explicit value avoids
//! hidden global initialization order while preserving the build-once
//! property.

use std::collections::{HashMap, HashSet};

use crate::ShaderStage;

/// How the result of a rewritten object-method call is width-corrected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwizzlePolicy {
    /// Append `_SWIZZLEn` where `n` is the object's declared component
    /// count (`Texture2D<float2>` → `_SWIZZLE2`). Sample/Load family.
    ComponentCount,
    /// The stub's result width is fixed regardless of the declared element
    /// type (Gather always returns 4 components, SampleCmp a scalar).
    Fixed,
}

#[derive(Debug, Clone)]
pub struct StubInfo {
    pub name: String,
    pub swizzle: SwizzlePolicy,
}

/// Direction of a shader parameter relative to its stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IoDirection {
    In,
    Out,
}

/// A `_GET_GL_*` / `_SET_GL_*` builtin-access macro.
#[derive(Debug, Clone, Copy)]
pub struct SemanticMacro {
    pub name: &'static str,
    /// The macro takes a vertex index argument (geometry/tessellation
    /// per-vertex inputs read through `gl_in[i]`).
    pub indexed: bool,
}

#[derive(Debug)]
pub struct StubTables {
    stubs: HashMap<(String, String, usize), StubInfo>,
    atomic_stubs: HashMap<(&'static str, String, usize), String>,
    atomic_ops: HashSet<&'static str>,
    semantics: HashMap<(ShaderStage, IoDirection, String), SemanticMacro>,
}

impl Default for StubTables {
    fn default() -> Self {
        StubTables::new()
    }
}

const GLSL_PREFIXES: [&str; 3] = ["", "i", "u"];

/// Sampler-dimension suffixes and whether a shadow variant exists.
const SAMPLER_DIMS: [(&str, bool); 10] = [
    ("1D", true),
    ("1DArray", true),
    ("2D", true),
    ("2DArray", true),
    ("3D", false),
    ("Cube", true),
    ("CubeArray", true),
    ("2DMS", false),
    ("2DMSArray", false),
    ("Buffer", false),
];

const IMAGE_DIMS: [&str; 6] = ["1D", "1DArray", "2D", "2DArray", "3D", "Buffer"];

impl StubTables {
    pub fn new() -> StubTables {
        let mut t = StubTables {
            stubs: HashMap::new(),
            atomic_stubs: HashMap::new(),
            atomic_ops: HashSet::new(),
            semantics: HashMap::new(),
        };
        t.register_texture_stubs();
        t.register_atomics();
        t.register_semantics();
        t
    }

    /// Looks up the stub for `Object.Method(...)` with `arity` arguments,
    /// keyed by the object's resolved GLSL type.
    pub fn stub(&self, object_type: &str, method: &str, arity: usize) -> Option<&StubInfo> {
        self.stubs
            .get(&(object_type.to_string(), method.to_string(), arity))
    }

    pub fn is_atomic(&self, name: &str) -> bool {
        self.atomic_ops.contains(name)
    }

    /// `kind` is `"image"` or `"shared"`; `arity` is the argument count of
    /// the original HLSL call.
    pub fn atomic_stub(&self, kind: &'static str, name: &str, arity: usize) -> Option<&str> {
        self.atomic_stubs
            .get(&(kind, name.to_string(), arity))
            .map(|s| s.as_str())
    }

    pub fn semantic_macro(
        &self,
        stage: ShaderStage,
        direction: IoDirection,
        semantic: &str,
    ) -> Option<SemanticMacro> {
        self.semantics
            .get(&(stage, direction, semantic.to_string()))
            .copied()
    }

    fn add_stub(&mut self, object: &str, method: &str, arity: usize, swizzle: SwizzlePolicy) {
        self.stubs.insert(
            (object.to_string(), method.to_string(), arity),
            StubInfo {
                name: format!("{method}_{arity}"),
                swizzle,
            },
        );
    }

    fn register_texture_stubs(&mut self) {
        use SwizzlePolicy::*;

        for prefix in GLSL_PREFIXES {
            for (dim, has_shadow) in SAMPLER_DIMS {
                let sampler = format!("{prefix}sampler{dim}");
                let is_ms = dim.starts_with("2DMS");
                let is_buffer = dim == "Buffer";

                if is_buffer {
                    // Buffer SRVs only support element fetch and size query.
                    self.add_stub(&sampler, "Load", 1, ComponentCount);
                    self.add_stub(&sampler, "GetDimensions", 1, Fixed);
                    continue;
                }

                if is_ms {
                    // MS resources: Load takes (location, sample[, offset]).
                    self.add_stub(&sampler, "Load", 2, ComponentCount);
                    self.add_stub(&sampler, "Load", 3, ComponentCount);
                    for arity in 1..=3 {
                        self.add_stub(&sampler, "GetDimensions", arity, Fixed);
                    }
                    continue;
                }

                // (sampler, coords[, offset]) and the bias/lod/grad variants.
                self.add_stub(&sampler, "Sample", 2, ComponentCount);
                self.add_stub(&sampler, "Sample", 3, ComponentCount);
                self.add_stub(&sampler, "SampleBias", 3, ComponentCount);
                self.add_stub(&sampler, "SampleBias", 4, ComponentCount);
                self.add_stub(&sampler, "SampleLevel", 3, ComponentCount);
                self.add_stub(&sampler, "SampleLevel", 4, ComponentCount);
                self.add_stub(&sampler, "SampleGrad", 4, ComponentCount);
                self.add_stub(&sampler, "SampleGrad", 5, ComponentCount);
                // Load takes int coords with the mip folded in.
                self.add_stub(&sampler, "Load", 1, ComponentCount);
                self.add_stub(&sampler, "Load", 2, ComponentCount);
                // Gather always returns a 4-component result.
                self.add_stub(&sampler, "Gather", 2, Fixed);
                self.add_stub(&sampler, "Gather", 3, Fixed);
                for arity in 1..=4 {
                    self.add_stub(&sampler, "GetDimensions", arity, Fixed);
                }

                // Shadow variants: comparison sampling only.
                if has_shadow && prefix.is_empty() {
                    let shadow = format!("sampler{dim}Shadow");
                    self.add_stub(&shadow, "SampleCmp", 3, Fixed);
                    self.add_stub(&shadow, "SampleCmp", 4, Fixed);
                    self.add_stub(&shadow, "SampleCmpLevelZero", 3, Fixed);
                    self.add_stub(&shadow, "SampleCmpLevelZero", 4, Fixed);
                    self.add_stub(&shadow, "GatherCmp", 3, Fixed);
                    self.add_stub(&shadow, "GatherCmp", 4, Fixed);
                    for arity in 1..=4 {
                        self.add_stub(&shadow, "GetDimensions", arity, Fixed);
                    }
                }
            }

            for dim in IMAGE_DIMS {
                let image = format!("{prefix}image{dim}");
                for arity in 1..=3 {
                    self.add_stub(&image, "GetDimensions", arity, Fixed);
                }
            }
        }
    }

    fn register_atomics(&mut self) {
        // (op, valid original-call arities)
        const OPS: [(&str, &[usize]); 9] = [
            ("InterlockedAdd", &[2, 3]),
            ("InterlockedAnd", &[2, 3]),
            ("InterlockedOr", &[2, 3]),
            ("InterlockedXor", &[2, 3]),
            ("InterlockedMin", &[2, 3]),
            ("InterlockedMax", &[2, 3]),
            ("InterlockedExchange", &[3]),
            ("InterlockedCompareExchange", &[4]),
            ("InterlockedCompareStore", &[3]),
        ];
        for (op, arities) in OPS {
            self.atomic_ops.insert(op);
            for &arity in arities {
                self.atomic_stubs
                    .insert(("image", op.to_string(), arity), format!("{op}Image_{arity}"));
                self.atomic_stubs.insert(
                    ("shared", op.to_string(), arity),
                    format!("{op}SharedVar_{arity}"),
                );
            }
        }
    }

    fn register_semantics(&mut self) {
        use IoDirection::{In, Out};
        use ShaderStage::*;

        let mut add = |stage, dir, sem: &str, name: &'static str, indexed: bool| {
            self.semantics
                .insert((stage, dir, sem.to_string()), SemanticMacro { name, indexed });
        };

        add(Vertex, In, "sv_vertexid", "_GET_GL_VERTEX_ID", false);
        add(Vertex, In, "sv_instanceid", "_GET_GL_INSTANCE_ID", false);
        add(Vertex, Out, "sv_position", "_SET_GL_POSITION", false);

        add(Pixel, In, "sv_position", "_GET_GL_FRAG_COORD", false);
        add(Pixel, In, "sv_isfrontface", "_GET_GL_FRONT_FACING", false);
        add(Pixel, Out, "sv_depth", "_SET_GL_FRAG_DEPTH", false);

        add(Geometry, In, "sv_position", "_GET_GL_IN_POSITION", true);
        add(Geometry, In, "sv_primitiveid", "_GET_GL_PRIMITIVE_ID_IN", false);
        add(Geometry, Out, "sv_position", "_SET_GL_POSITION", false);
        add(Geometry, Out, "sv_rendertargetarrayindex", "_SET_GL_LAYER", false);

        add(Hull, In, "sv_position", "_GET_GL_IN_POSITION", true);
        add(Hull, In, "sv_outputcontrolpointid", "_GET_GL_INVOCATION_ID", false);
        add(Hull, In, "sv_primitiveid", "_GET_GL_PRIMITIVE_ID", false);
        add(Hull, Out, "sv_position", "_SET_GL_OUT_POSITION", false);
        add(Hull, Out, "sv_tessfactor", "_SET_GL_TESS_LEVEL_OUTER", true);
        add(Hull, Out, "sv_insidetessfactor", "_SET_GL_TESS_LEVEL_INNER", true);

        add(Domain, In, "sv_position", "_GET_GL_IN_POSITION", true);
        add(Domain, In, "sv_domainlocation", "_GET_GL_TESS_COORD", false);
        add(Domain, In, "sv_tessfactor", "_GET_GL_TESS_LEVEL_OUTER", true);
        add(Domain, In, "sv_insidetessfactor", "_GET_GL_TESS_LEVEL_INNER", true);
        add(Domain, In, "sv_primitiveid", "_GET_GL_PRIMITIVE_ID", false);
        add(Domain, Out, "sv_position", "_SET_GL_POSITION", false);

        add(Compute, In, "sv_dispatchthreadid", "_GET_GL_GLOBAL_INVOCATION_ID", false);
        add(Compute, In, "sv_groupid", "_GET_GL_WORK_GROUP_ID", false);
        add(Compute, In, "sv_groupthreadid", "_GET_GL_LOCAL_INVOCATION_ID", false);
        add(Compute, In, "sv_groupindex", "_GET_GL_LOCAL_INVOCATION_INDEX", false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_family_swizzles_gather_does_not() {
        let t = StubTables::new();
        let sample = t.stub("sampler2D", "Sample", 2).expect("Sample_2");
        assert_eq!(sample.name, "Sample_2");
        assert_eq!(sample.swizzle, SwizzlePolicy::ComponentCount);

        let gather = t.stub("sampler2D", "Gather", 2).expect("Gather_2");
        assert_eq!(gather.swizzle, SwizzlePolicy::Fixed);

        let cmp = t.stub("sampler2DShadow", "SampleCmp", 3).expect("SampleCmp_3");
        assert_eq!(cmp.swizzle, SwizzlePolicy::Fixed);

        // Shadow samplers do not get plain Sample stubs.
        assert!(t.stub("sampler2DShadow", "Sample", 2).is_none());
        // Integer samplers do.
        assert!(t.stub("isampler3D", "Load", 1).is_some());
    }

    #[test]
    fn atomic_routing() {
        let t = StubTables::new();
        assert!(t.is_atomic("InterlockedAdd"));
        assert!(!t.is_atomic("Interlocked"));
        assert_eq!(
            t.atomic_stub("image", "InterlockedAdd", 2),
            Some("InterlockedAddImage_2")
        );
        assert_eq!(
            t.atomic_stub("shared", "InterlockedCompareExchange", 4),
            Some("InterlockedCompareExchangeSharedVar_4")
        );
        assert_eq!(t.atomic_stub("image", "InterlockedAdd", 5), None);
    }

    #[test]
    fn semantic_macros_are_stage_and_direction_keyed() {
        let t = StubTables::new();
        let frag = t
            .semantic_macro(ShaderStage::Pixel, IoDirection::In, "sv_position")
            .expect("pixel input SV_Position");
        assert_eq!(frag.name, "_GET_GL_FRAG_COORD");

        let pos = t
            .semantic_macro(ShaderStage::Vertex, IoDirection::Out, "sv_position")
            .expect("vertex output SV_Position");
        assert_eq!(pos.name, "_SET_GL_POSITION");

        assert!(t
            .semantic_macro(ShaderStage::Vertex, IoDirection::In, "sv_position")
            .is_none());

        let gs_in = t
            .semantic_macro(ShaderStage::Geometry, IoDirection::In, "sv_position")
            .expect("gs input SV_Position");
        assert!(gs_in.indexed);
    }
}
