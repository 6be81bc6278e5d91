//! Pipeline Attributes
//!
//! Typed, named values passed into a stage's shader invocation. Attribute
//! lists are rebuilt every frame per pass and never cached across frames,
//! so the types here are plain immutable value objects.

use std::borrow::Cow;

use glam::{Mat4, Vec2, Vec3};

use crate::gpu::TextureHandle;

/// The value of a pipeline attribute.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AttributeValue {
    Int(i32),
    UInt(u32),
    Float(f32),
    Vec2(Vec2),
    Vec3(Vec3),
    Mat4(Mat4),
    /// A texture binding; the backend resolves the unit.
    Texture(TextureHandle),
}

/// A named shader input.
///
/// Identity is the name alone: two attributes with the same name and value
/// are interchangeable.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineAttribute {
    pub name: Cow<'static, str>,
    pub value: AttributeValue,
}

impl PipelineAttribute {
    #[must_use]
    pub fn int(name: impl Into<Cow<'static, str>>, value: i32) -> Self {
        Self {
            name: name.into(),
            value: AttributeValue::Int(value),
        }
    }

    #[must_use]
    pub fn uint(name: impl Into<Cow<'static, str>>, value: u32) -> Self {
        Self {
            name: name.into(),
            value: AttributeValue::UInt(value),
        }
    }

    #[must_use]
    pub fn float(name: impl Into<Cow<'static, str>>, value: f32) -> Self {
        Self {
            name: name.into(),
            value: AttributeValue::Float(value),
        }
    }

    #[must_use]
    pub fn vec2(name: impl Into<Cow<'static, str>>, value: Vec2) -> Self {
        Self {
            name: name.into(),
            value: AttributeValue::Vec2(value),
        }
    }

    #[must_use]
    pub fn vec3(name: impl Into<Cow<'static, str>>, value: Vec3) -> Self {
        Self {
            name: name.into(),
            value: AttributeValue::Vec3(value),
        }
    }

    #[must_use]
    pub fn mat4(name: impl Into<Cow<'static, str>>, value: Mat4) -> Self {
        Self {
            name: name.into(),
            value: AttributeValue::Mat4(value),
        }
    }

    #[must_use]
    pub fn texture(name: impl Into<Cow<'static, str>>, value: TextureHandle) -> Self {
        Self {
            name: name.into(),
            value: AttributeValue::Texture(value),
        }
    }

    /// Boolean flags travel as integers, matching GLSL uniform conventions.
    #[must_use]
    pub fn flag(name: impl Into<Cow<'static, str>>, value: bool) -> Self {
        Self::int(name, i32::from(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_encodes_as_integer() {
        assert_eq!(
            PipelineAttribute::flag("shadowCasting", true).value,
            AttributeValue::Int(1)
        );
        assert_eq!(
            PipelineAttribute::flag("shadowCasting", false).value,
            AttributeValue::Int(0)
        );
    }
}
