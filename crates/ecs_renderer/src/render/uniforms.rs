//! Uniform types, values, and the declaration parser that drives
//! optional uniform binding
//!
//! A material only receives a uniform its shader declares. The declared set
//! comes from [`parse_uniforms`], which scans stage sources for
//! `uniform <type> <name>;`, `uniform <type> <name>[N];` and
//! `uniform <Block> { <type> <member>; ... };` declarations.

use std::collections::BTreeMap;
use std::fmt;

use crate::foundation::math::{Mat3, Mat4, Vec2, Vec3, Vec4};

/// Declared type of a uniform
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UniformType {
    /// `bool`
    Bool,
    /// `int`
    Int,
    /// `uint`
    UInt,
    /// `float`
    Float,
    /// `vec2`
    Vec2,
    /// `vec3`
    Vec3,
    /// `vec4`
    Vec4,
    /// `ivec2`/`ivec3`/`ivec4`, by component count
    IVec(u8),
    /// `mat3`
    Mat3,
    /// `mat4`
    Mat4,
    /// Any sampler type
    Sampler(String),
    /// Any storage image type
    Image(String),
    /// Fixed-size array
    Array {
        /// Element type
        element: Box<UniformType>,
        /// Declared length
        len: usize,
    },
    /// Uniform block and its members
    Block(BTreeMap<String, UniformType>),
    /// Unrecognized type name, kept verbatim
    Other(String),
}

impl UniformType {
    /// Map a type keyword to a uniform type
    pub fn from_keyword(keyword: &str) -> Self {
        match keyword {
            "bool" => Self::Bool,
            "int" => Self::Int,
            "uint" => Self::UInt,
            "float" => Self::Float,
            "vec2" => Self::Vec2,
            "vec3" => Self::Vec3,
            "vec4" => Self::Vec4,
            "ivec2" => Self::IVec(2),
            "ivec3" => Self::IVec(3),
            "ivec4" => Self::IVec(4),
            "mat3" => Self::Mat3,
            "mat4" => Self::Mat4,
            other if other.starts_with("sampler") => Self::Sampler(other.to_string()),
            other if other.starts_with("image") => Self::Image(other.to_string()),
            other => Self::Other(other.to_string()),
        }
    }
}

/// A value staged for a uniform
#[derive(Debug, Clone, PartialEq)]
pub enum UniformValue {
    /// Boolean
    Bool(bool),
    /// Signed integer
    Int(i32),
    /// Unsigned integer
    UInt(u32),
    /// Float
    Float(f32),
    /// 2-vector
    Vec2(Vec2),
    /// 3-vector
    Vec3(Vec3),
    /// 4-vector
    Vec4(Vec4),
    /// 3x3 matrix
    Mat3(Mat3),
    /// 4x4 matrix
    Mat4(Mat4),
    /// Integer array (sampler slots)
    IntArray(Vec<i32>),
    /// Float array
    FloatArray(Vec<f32>),
    /// Vector array
    Vec3Array(Vec<Vec3>),
}

impl UniformValue {
    /// Size of the value in bytes as uploaded
    pub fn byte_size(&self) -> usize {
        let float = std::mem::size_of::<f32>();
        match self {
            Self::Bool(_) | Self::Int(_) | Self::UInt(_) | Self::Float(_) => 4,
            Self::Vec2(_) => 2 * float,
            Self::Vec3(_) => 3 * float,
            Self::Vec4(_) => 4 * float,
            Self::Mat3(_) => 9 * float,
            Self::Mat4(_) => 16 * float,
            Self::IntArray(values) => values.len() * 4,
            Self::FloatArray(values) => values.len() * float,
            Self::Vec3Array(values) => values.len() * 3 * float,
        }
    }
}

impl fmt::Display for UniformValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(value) => write!(f, "{value}"),
            Self::Int(value) => write!(f, "{value}"),
            Self::UInt(value) => write!(f, "{value}u"),
            Self::Float(value) => write!(f, "{value}"),
            Self::Vec2(value) => write!(f, "vec2({}, {})", value.x, value.y),
            Self::Vec3(value) => write!(f, "vec3({}, {}, {})", value.x, value.y, value.z),
            Self::Vec4(value) => write!(f, "vec4({}, {}, {}, {})", value.x, value.y, value.z, value.w),
            Self::Mat3(_) => f.write_str("mat3"),
            Self::Mat4(_) => f.write_str("mat4"),
            Self::IntArray(values) => write!(f, "int[{}]", values.len()),
            Self::FloatArray(values) => write!(f, "float[{}]", values.len()),
            Self::Vec3Array(values) => write!(f, "vec3[{}]", values.len()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token<'a> {
    Word(&'a str),
    Punct(char),
}

fn tokenize(source: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    for line in source.lines() {
        let line = line.split("//").next().unwrap_or_default();
        let mut start = None;
        for (index, ch) in line.char_indices() {
            let is_word = ch.is_alphanumeric() || ch == '_';
            match (is_word, start) {
                (true, None) => start = Some(index),
                (true, Some(_)) => {}
                (false, Some(begin)) => {
                    tokens.push(Token::Word(&line[begin..index]));
                    start = None;
                }
                (false, None) => {}
            }
            if !is_word && !ch.is_whitespace() {
                tokens.push(Token::Punct(ch));
            }
        }
        if let Some(begin) = start {
            tokens.push(Token::Word(&line[begin..]));
        }
    }
    tokens
}

/// Skip qualifiers like `highp` or `readonly` between `uniform` and the type
fn is_qualifier(word: &str) -> bool {
    matches!(
        word,
        "lowp" | "mediump" | "highp" | "readonly" | "writeonly" | "coherent" | "volatile" | "restrict" | "const"
    )
}

/// Parse `<type> <name> [N]` starting at `index`; returns the entry and the index after it
fn parse_declaration(tokens: &[Token<'_>], mut index: usize) -> Option<((String, UniformType), usize)> {
    while let Some(Token::Word(word)) = tokens.get(index) {
        if is_qualifier(word) {
            index += 1;
        } else {
            break;
        }
    }
    let Some(Token::Word(type_name)) = tokens.get(index) else {
        return None;
    };
    let Some(Token::Word(name)) = tokens.get(index + 1) else {
        return None;
    };
    let mut uniform_type = UniformType::from_keyword(type_name);
    let mut next = index + 2;
    if let (Some(Token::Punct('[')), Some(Token::Word(len)), Some(Token::Punct(']'))) =
        (tokens.get(next), tokens.get(next + 1), tokens.get(next + 2))
    {
        if let Ok(len) = len.parse::<usize>() {
            uniform_type = UniformType::Array {
                element: Box::new(uniform_type),
                len,
            };
            next += 3;
        }
    }
    Some(((name.to_string(), uniform_type), next))
}

/// Collect every uniform declared in a shader source, keyed by name
pub fn parse_uniforms(source: &str) -> BTreeMap<String, UniformType> {
    let tokens = tokenize(source);
    let mut uniforms = BTreeMap::new();
    let mut index = 0;

    while index < tokens.len() {
        if tokens[index] != Token::Word("uniform") {
            index += 1;
            continue;
        }
        index += 1;

        // uniform Block { members };
        if let (Some(Token::Word(block)), Some(Token::Punct('{'))) = (tokens.get(index), tokens.get(index + 1)) {
            let mut members = BTreeMap::new();
            let mut cursor = index + 2;
            while cursor < tokens.len() && tokens[cursor] != Token::Punct('}') {
                match parse_declaration(&tokens, cursor) {
                    Some((member, after)) if tokens.get(after) == Some(&Token::Punct(';')) => {
                        members.insert(member.0, member.1);
                        cursor = after + 1;
                    }
                    _ => cursor += 1,
                }
            }
            uniforms.insert((*block).to_string(), UniformType::Block(members));
            index = cursor + 1;
            continue;
        }

        if let Some(((name, uniform_type), after)) = parse_declaration(&tokens, index) {
            uniforms.insert(name, uniform_type);
            index = after;
        }
    }
    uniforms
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHADER: &str = r"
        #version 410 core
        layout(location = 0) in vec3 a_Position;
        uniform mat4 u_ModelViewProjection;
        uniform highp float u_Glossiness; // shininess
        uniform vec3 u_LightPositions[16];
        uniform sampler2D u_Textures[16];
        // uniform float u_Commented;
        layout(std140) uniform Lights {
            vec4 positions[4];
            float count;
        };
        void main() {}
    ";

    #[test]
    fn test_parses_plain_and_array_uniforms() {
        let uniforms = parse_uniforms(SHADER);
        assert_eq!(uniforms.get("u_ModelViewProjection"), Some(&UniformType::Mat4));
        assert_eq!(uniforms.get("u_Glossiness"), Some(&UniformType::Float));
        assert_eq!(
            uniforms.get("u_LightPositions"),
            Some(&UniformType::Array {
                element: Box::new(UniformType::Vec3),
                len: 16
            })
        );
        assert!(matches!(
            uniforms.get("u_Textures"),
            Some(UniformType::Array { element, len: 16 }) if **element == UniformType::Sampler("sampler2D".to_string())
        ));
        assert!(!uniforms.contains_key("u_Commented"));
        assert!(!uniforms.contains_key("a_Position"));
    }

    #[test]
    fn test_parses_uniform_blocks() {
        let uniforms = parse_uniforms(SHADER);
        let Some(UniformType::Block(members)) = uniforms.get("Lights") else {
            panic!("block not parsed: {uniforms:?}");
        };
        assert_eq!(members.get("count"), Some(&UniformType::Float));
        assert!(matches!(members.get("positions"), Some(UniformType::Array { len: 4, .. })));
    }

    #[test]
    fn test_empty_source_declares_nothing() {
        assert!(parse_uniforms("void main() {}").is_empty());
    }
}
