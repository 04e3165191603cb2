//! Declarative export schema.
//!
//! Each component declares its editor-visible fields as a static table.
//! Editors and serializers read the table; the renderer only uses the
//! component's typed getters.

/// Type of an exported field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportType {
    Bool,
    Int,
    Float,
    String,
    Vec2,
    Vec3,
    Vec4,
    Color,
    /// Enumeration with its option labels in declaration order.
    Enum(&'static [&'static str]),
    FilePath,
    Font,
    NodeReference,
}

/// Default value of an exported field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExportValue {
    Bool(bool),
    Int(i64),
    Float(f32),
    String(&'static str),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    /// Index into the field's enum labels.
    Enum(usize),
    None,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExportField {
    pub name: &'static str,
    pub ty: ExportType,
    pub default: ExportValue,
    pub description: &'static str,
}

impl ExportField {
    #[must_use]
    pub const fn new(
        name: &'static str,
        ty: ExportType,
        default: ExportValue,
        description: &'static str,
    ) -> Self {
        Self {
            name,
            ty,
            default,
            description,
        }
    }

    /// Option labels for enum fields; empty for every other type.
    #[must_use]
    pub fn options(&self) -> &'static [&'static str] {
        match self.ty {
            ExportType::Enum(labels) => labels,
            _ => &[],
        }
    }
}

/// Looks up a field by name.
#[must_use]
pub fn find_field<'a>(schema: &'a [ExportField], name: &str) -> Option<&'a ExportField> {
    schema.iter().find(|f| f.name == name)
}
