//! Field descriptors for records and filters.
//!
//! A [`Shape`] lists the fields of a type together with their declared
//! [`FieldType`] and, for filters, the [`FieldMeta`] attached to each field.
//! Shapes are normally produced by `#[derive(Record)]` and are read once per
//! (model, filter) pair when a specification is compiled.

use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::op::Operator;
use crate::traits::Record;

/// The primitive numeric type of a number field.
///
/// Different kinds never match each other: an `i32` filter field does not
/// match an `i64` model field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumberKind {
    I8,
    I16,
    I32,
    I64,
    Isize,
    U8,
    U16,
    U32,
    U64,
    Usize,
    F32,
    F64,
}

impl NumberKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NumberKind::I8 => "i8",
            NumberKind::I16 => "i16",
            NumberKind::I32 => "i32",
            NumberKind::I64 => "i64",
            NumberKind::Isize => "isize",
            NumberKind::U8 => "u8",
            NumberKind::U16 => "u16",
            NumberKind::U32 => "u32",
            NumberKind::U64 => "u64",
            NumberKind::Usize => "usize",
            NumberKind::F32 => "f32",
            NumberKind::F64 => "f64",
        }
    }
}

/// Identity of an enum type whose values are compared by discriminant.
#[derive(Clone, Copy)]
pub struct EnumType {
    name: &'static str,
    id: TypeId,
}

impl EnumType {
    pub fn of<T: 'static>() -> Self {
        EnumType {
            name: short_type_name::<T>(),
            id: TypeId::of::<T>(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// Identity of a nested record type, with lazy access to its shape.
#[derive(Clone, Copy)]
pub struct RecordType {
    name: &'static str,
    id: TypeId,
    shape: fn() -> Shape,
}

impl RecordType {
    pub fn of<T: Record>() -> Self {
        RecordType {
            name: short_type_name::<T>(),
            id: TypeId::of::<T>(),
            shape: T::shape,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Builds the shape of the nested record.
    pub fn shape(&self) -> Shape {
        (self.shape)()
    }
}

macro_rules! identity_by_type_id {
    ($($ty:ident),*) => {
        $(
            impl PartialEq for $ty {
                fn eq(&self, other: &Self) -> bool {
                    self.id == other.id
                }
            }

            impl Eq for $ty {}

            impl Hash for $ty {
                fn hash<H: Hasher>(&self, state: &mut H) {
                    self.id.hash(state);
                }
            }

            impl fmt::Debug for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.name)
                }
            }
        )*
    };
}

identity_by_type_id!(EnumType, RecordType);

/// Declared type of a field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldType {
    String,
    Bool,
    Number(NumberKind),
    Timestamp,
    Enum(EnumType),
    Record(RecordType),
    /// Nullable of the inner type (`Option<T>`).
    Optional(Box<FieldType>),
    /// Enumerable of the inner type (`Vec<T>`, sets).
    List(Box<FieldType>),
}

impl FieldType {
    pub fn optional(inner: FieldType) -> Self {
        FieldType::Optional(Box::new(inner))
    }

    pub fn list(inner: FieldType) -> Self {
        FieldType::List(Box::new(inner))
    }

    pub fn is_optional(&self) -> bool {
        matches!(self, FieldType::Optional(_))
    }

    pub fn is_list(&self) -> bool {
        matches!(self, FieldType::List(_))
    }

    /// Strips one level of `Optional`, if any.
    pub fn unwrap_optional(&self) -> &FieldType {
        match self {
            FieldType::Optional(inner) => inner,
            other => other,
        }
    }

    /// Element type of a list, looking through one level of `Optional`.
    pub fn element(&self) -> Option<&FieldType> {
        match self.unwrap_optional() {
            FieldType::List(inner) => Some(inner),
            _ => None,
        }
    }

    /// Returns `true` if the scalar (optional unwrapped) is a string.
    pub fn is_text(&self) -> bool {
        matches!(self.unwrap_optional(), FieldType::String)
    }

    /// Returns `true` if the scalar (optional unwrapped) supports ordering.
    pub fn is_orderable(&self) -> bool {
        matches!(
            self.unwrap_optional(),
            FieldType::String | FieldType::Number(_) | FieldType::Timestamp
        )
    }

    /// Returns `true` if the scalar (optional unwrapped) is a nested record.
    pub fn is_record(&self) -> bool {
        matches!(self.unwrap_optional(), FieldType::Record(_))
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::String => f.write_str("String"),
            FieldType::Bool => f.write_str("bool"),
            FieldType::Number(kind) => f.write_str(kind.as_str()),
            FieldType::Timestamp => f.write_str("Timestamp"),
            FieldType::Enum(e) => f.write_str(e.name),
            FieldType::Record(r) => f.write_str(r.name),
            FieldType::Optional(inner) => write!(f, "Option<{}>", inner),
            FieldType::List(inner) => write!(f, "Vec<{}>", inner),
        }
    }
}

/// Criterion metadata declared on a filter field.
///
/// Ignored when the type is used as a model.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FieldMeta {
    pub operator: Operator,
    pub negate: bool,
    /// Explicit dotted path into the model, replacing name matching.
    pub path: Option<&'static str>,
    /// Field never produces a criterion.
    pub ignore: bool,
    /// Skip the criterion when the filter value is empty. `None` defers to
    /// [`CompilerOptions::ignore_if_empty`](crate::CompilerOptions).
    pub ignore_if_empty: Option<bool>,
}

/// A single field of a shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub ty: FieldType,
    pub meta: FieldMeta,
}

impl FieldDescriptor {
    pub fn new(name: &'static str, ty: FieldType) -> Self {
        FieldDescriptor {
            name,
            ty,
            meta: FieldMeta::default(),
        }
    }

    pub fn with_meta(mut self, meta: FieldMeta) -> Self {
        self.meta = meta;
        self
    }
}

/// The fields of a record or filter type, in declaration order.
#[derive(Debug, Clone)]
pub struct Shape {
    name: &'static str,
    id: TypeId,
    fields: Vec<FieldDescriptor>,
}

impl Shape {
    pub fn new<T: 'static>(name: &'static str, fields: Vec<FieldDescriptor>) -> Self {
        Shape {
            name,
            id: TypeId::of::<T>(),
            fields,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn type_id(&self) -> TypeId {
        self.id
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Looks up a field by its exposed name (case-sensitive).
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }
}

pub(crate) fn short_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}
