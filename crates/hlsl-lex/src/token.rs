//! Token model: type tags, keyword table, and the token record itself.

use core::fmt;

/// HLSL keywords the converter cares about.
///
/// Anything not in this table tokenizes as a plain identifier; built-in type
/// names (`float4`, `uint` and friends) intentionally stay identifiers so
/// they pass through to the output unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Cbuffer,
    Struct,
    Void,
    Return,
    Const,
    Unorm,

    // Parameter storage qualifiers.
    In,
    Out,
    InOut,

    // Interpolation qualifiers.
    Linear,
    Centroid,
    NoInterpolation,
    NoPerspective,
    Sample,

    // Flow control.
    If,
    Else,
    For,
    Do,
    While,
    Break,
    Continue,
    Switch,
    Case,
    Default,
    Discard,

    // Texture / buffer object types.
    Texture1D,
    Texture1DArray,
    Texture2D,
    Texture2DArray,
    Texture2DMS,
    Texture2DMSArray,
    Texture3D,
    TextureCube,
    TextureCubeArray,
    Buffer,
    RWTexture1D,
    RWTexture1DArray,
    RWTexture2D,
    RWTexture2DArray,
    RWTexture3D,
    RWBuffer,

    StructuredBuffer,
    RWStructuredBuffer,

    SamplerState,
    SamplerComparisonState,

    // Geometry shader primitive types and stream objects.
    Point,
    Line,
    Triangle,
    LineAdj,
    TriangleAdj,
    PointStream,
    LineStream,
    TriangleStream,

    // Tessellation patch types.
    InputPatch,
    OutputPatch,
}

impl Keyword {
    pub fn from_ident(ident: &str) -> Option<Keyword> {
        use Keyword::*;
        Some(match ident {
            "cbuffer" => Cbuffer,
            "struct" => Struct,
            "void" => Void,
            "return" => Return,
            "const" => Const,
            "unorm" => Unorm,
            "in" => In,
            "out" => Out,
            "inout" => InOut,
            "linear" => Linear,
            "centroid" => Centroid,
            "nointerpolation" => NoInterpolation,
            "noperspective" => NoPerspective,
            "sample" => Sample,
            "if" => If,
            "else" => Else,
            "for" => For,
            "do" => Do,
            "while" => While,
            "break" => Break,
            "continue" => Continue,
            "switch" => Switch,
            "case" => Case,
            "default" => Default,
            "discard" => Discard,
            "Texture1D" => Texture1D,
            "Texture1DArray" => Texture1DArray,
            "Texture2D" => Texture2D,
            "Texture2DArray" => Texture2DArray,
            "Texture2DMS" => Texture2DMS,
            "Texture2DMSArray" => Texture2DMSArray,
            "Texture3D" => Texture3D,
            "TextureCube" => TextureCube,
            "TextureCubeArray" => TextureCubeArray,
            "Buffer" => Buffer,
            "RWTexture1D" => RWTexture1D,
            "RWTexture1DArray" => RWTexture1DArray,
            "RWTexture2D" => RWTexture2D,
            "RWTexture2DArray" => RWTexture2DArray,
            "RWTexture3D" => RWTexture3D,
            "RWBuffer" => RWBuffer,
            "StructuredBuffer" => StructuredBuffer,
            "RWStructuredBuffer" => RWStructuredBuffer,
            "SamplerState" => SamplerState,
            "SamplerComparisonState" => SamplerComparisonState,
            "point" => Point,
            "line" => Line,
            "triangle" => Triangle,
            "lineadj" => LineAdj,
            "triangleadj" => TriangleAdj,
            "PointStream" => PointStream,
            "LineStream" => LineStream,
            "TriangleStream" => TriangleStream,
            "InputPatch" => InputPatch,
            "OutputPatch" => OutputPatch,
            _ => return None,
        })
    }

    /// Texture-dimension keywords (`Texture1D`…`RWBuffer`), i.e. everything
    /// that triggers texture/image declaration lowering.
    pub fn is_texture(self) -> bool {
        use Keyword::*;
        matches!(
            self,
            Texture1D
                | Texture1DArray
                | Texture2D
                | Texture2DArray
                | Texture2DMS
                | Texture2DMSArray
                | Texture3D
                | TextureCube
                | TextureCubeArray
                | Buffer
                | RWTexture1D
                | RWTexture1DArray
                | RWTexture2D
                | RWTexture2DArray
                | RWTexture3D
                | RWBuffer
        )
    }

    pub fn is_rw_texture(self) -> bool {
        use Keyword::*;
        matches!(
            self,
            RWTexture1D | RWTexture1DArray | RWTexture2D | RWTexture2DArray | RWTexture3D | RWBuffer
        )
    }

    /// Keywords a `[flatten]`/`[branch]`/`[loop]`/`[unroll]` style attribute
    /// can legally precede.
    pub fn is_flow_control(self) -> bool {
        use Keyword::*;
        matches!(self, If | For | Do | While | Switch)
    }

    pub fn is_interpolation_qualifier(self) -> bool {
        use Keyword::*;
        matches!(
            self,
            Linear | Centroid | NoInterpolation | NoPerspective | Sample
        )
    }

    pub fn is_gs_primitive(self) -> bool {
        use Keyword::*;
        matches!(self, Point | Line | Triangle | LineAdj | TriangleAdj)
    }

    pub fn is_gs_stream(self) -> bool {
        use Keyword::*;
        matches!(self, PointStream | LineStream | TriangleStream)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenType {
    Undefined,
    PreprocessorDirective,
    Identifier,
    NumericConstant,
    StringConstant,

    Semicolon,
    Comma,
    Colon,
    DoubleColon,
    Dot,
    QuestionMark,

    OpenBrace,
    ClosingBrace,
    OpenParen,
    ClosingParen,
    OpenSquare,
    ClosingSquare,
    OpenAngle,
    ClosingAngle,

    /// `=` and all compound assignments (`+=`, `<<=`, …).
    Assignment,
    /// `<`/`>` never get this tag (they tokenize as angle brackets); `==`,
    /// `!=`, `<=`, `>=` do.
    ComparisonOp,
    LogicOp,
    BitwiseOp,
    IncDecOp,
    MathOp,

    Keyword(Keyword),

    /// Free-form converter-generated text; never produced by the tokenizer.
    TextBlock,
}

impl TokenType {
    /// The other half of this token's bracket family, if it is a bracket.
    pub fn matching_bracket(self) -> Option<TokenType> {
        use TokenType::*;
        Some(match self {
            OpenBrace => ClosingBrace,
            ClosingBrace => OpenBrace,
            OpenParen => ClosingParen,
            ClosingParen => OpenParen,
            OpenSquare => ClosingSquare,
            ClosingSquare => OpenSquare,
            OpenAngle => ClosingAngle,
            ClosingAngle => OpenAngle,
            _ => return None,
        })
    }

    pub fn is_open_bracket(self) -> bool {
        use TokenType::*;
        matches!(self, OpenBrace | OpenParen | OpenSquare | OpenAngle)
    }

    pub fn is_closing_bracket(self) -> bool {
        use TokenType::*;
        matches!(self, ClosingBrace | ClosingParen | ClosingSquare | ClosingAngle)
    }
}

/// One lexical unit of the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub ty: TokenType,
    /// The token text. Mutated freely during conversion.
    pub literal: String,
    /// Whitespace and comments that preceded this token, verbatim.
    pub delimiter: String,
    /// Parse-order index assigned by the tokenizer; converter-inserted
    /// tokens share the index of their insertion neighborhood. Only used
    /// for lookback heuristics, never as an identity.
    pub index: u32,
}

impl Token {
    pub fn new(ty: TokenType, literal: impl Into<String>) -> Token {
        Token {
            ty,
            literal: literal.into(),
            delimiter: String::new(),
            index: 0,
        }
    }

    pub fn with_delimiter(mut self, delimiter: impl Into<String>) -> Token {
        self.delimiter = delimiter.into();
        self
    }

    pub fn keyword(&self) -> Option<Keyword> {
        match self.ty {
            TokenType::Keyword(kw) => Some(kw),
            _ => None,
        }
    }

    pub fn is_ident(&self, name: &str) -> bool {
        self.ty == TokenType::Identifier && self.literal == name
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.delimiter, self.literal)
    }
}
