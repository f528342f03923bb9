//! Front-end types.
//!
//! Types are plain values. Class, array and parameterized types are not
//! symbols of their own: a `Type::Class` carries the class handle and its
//! type arguments, an array carries its component type.

use std::fmt;
use std::sync::Arc;

use jbridge_parser::WildcardBound;
use jbridge_scanner::SyntaxKind;

use crate::symbols::SymbolId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Boolean,
    Byte,
    Short,
    Char,
    Int,
    Long,
    Float,
    Double,
}

impl PrimitiveKind {
    pub fn from_keyword(kind: SyntaxKind) -> Option<PrimitiveKind> {
        Some(match kind {
            SyntaxKind::BooleanKeyword => PrimitiveKind::Boolean,
            SyntaxKind::ByteKeyword => PrimitiveKind::Byte,
            SyntaxKind::ShortKeyword => PrimitiveKind::Short,
            SyntaxKind::CharKeyword => PrimitiveKind::Char,
            SyntaxKind::IntKeyword => PrimitiveKind::Int,
            SyntaxKind::LongKeyword => PrimitiveKind::Long,
            SyntaxKind::FloatKeyword => PrimitiveKind::Float,
            SyntaxKind::DoubleKeyword => PrimitiveKind::Double,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            PrimitiveKind::Boolean => "boolean",
            PrimitiveKind::Byte => "byte",
            PrimitiveKind::Short => "short",
            PrimitiveKind::Char => "char",
            PrimitiveKind::Int => "int",
            PrimitiveKind::Long => "long",
            PrimitiveKind::Float => "float",
            PrimitiveKind::Double => "double",
        }
    }

    pub fn from_name(name: &str) -> Option<PrimitiveKind> {
        Some(match name {
            "boolean" => PrimitiveKind::Boolean,
            "byte" => PrimitiveKind::Byte,
            "short" => PrimitiveKind::Short,
            "char" => PrimitiveKind::Char,
            "int" => PrimitiveKind::Int,
            "long" => PrimitiveKind::Long,
            "float" => PrimitiveKind::Float,
            "double" => PrimitiveKind::Double,
            _ => return None,
        })
    }

    /// Signature letter (`I`, `Z`, ...).
    pub fn descriptor(self) -> char {
        match self {
            PrimitiveKind::Boolean => 'Z',
            PrimitiveKind::Byte => 'B',
            PrimitiveKind::Short => 'S',
            PrimitiveKind::Char => 'C',
            PrimitiveKind::Int => 'I',
            PrimitiveKind::Long => 'J',
            PrimitiveKind::Float => 'F',
            PrimitiveKind::Double => 'D',
        }
    }

    pub fn from_descriptor(c: char) -> Option<PrimitiveKind> {
        Some(match c {
            'Z' => PrimitiveKind::Boolean,
            'B' => PrimitiveKind::Byte,
            'S' => PrimitiveKind::Short,
            'C' => PrimitiveKind::Char,
            'I' => PrimitiveKind::Int,
            'J' => PrimitiveKind::Long,
            'F' => PrimitiveKind::Float,
            'D' => PrimitiveKind::Double,
            _ => return None,
        })
    }

    pub fn is_numeric(self) -> bool {
        self != PrimitiveKind::Boolean
    }

    /// Qualified name of the box class.
    pub fn box_class(self) -> &'static str {
        match self {
            PrimitiveKind::Boolean => "java.lang.Boolean",
            PrimitiveKind::Byte => "java.lang.Byte",
            PrimitiveKind::Short => "java.lang.Short",
            PrimitiveKind::Char => "java.lang.Character",
            PrimitiveKind::Int => "java.lang.Integer",
            PrimitiveKind::Long => "java.lang.Long",
            PrimitiveKind::Float => "java.lang.Float",
            PrimitiveKind::Double => "java.lang.Double",
        }
    }

    fn rank(self) -> u8 {
        match self {
            PrimitiveKind::Boolean => 0,
            PrimitiveKind::Byte => 1,
            PrimitiveKind::Short | PrimitiveKind::Char => 2,
            PrimitiveKind::Int => 3,
            PrimitiveKind::Long => 4,
            PrimitiveKind::Float => 5,
            PrimitiveKind::Double => 6,
        }
    }

    /// Widening primitive conversion (identity included).
    pub fn widens_to(self, target: PrimitiveKind) -> bool {
        if self == target {
            return true;
        }
        if !self.is_numeric() || !target.is_numeric() {
            return false;
        }
        if target == PrimitiveKind::Char || (self == PrimitiveKind::Char && target == PrimitiveKind::Short) {
            return false;
        }
        self.rank() < target.rank()
    }

    /// Binary numeric promotion.
    pub fn promote(self, other: PrimitiveKind) -> PrimitiveKind {
        let widest = if self.rank() >= other.rank() { self } else { other };
        if widest.rank() < PrimitiveKind::Int.rank() {
            PrimitiveKind::Int
        } else {
            widest
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Type {
    Primitive(PrimitiveKind),
    Void,
    /// Type of the `null` literal.
    Null,
    Class {
        sym: SymbolId,
        args: Vec<Type>,
    },
    Array(Box<Type>),
    TypeVar(SymbolId),
    Wildcard {
        bound_kind: WildcardBound,
        bound: Option<Box<Type>>,
    },
    /// Unresolvable type, named as written.
    Error {
        name: Arc<str>,
    },
    /// Not attributed (lenient constructs such as lambda bodies).
    Unknown,
}

impl Type {
    pub fn class(sym: SymbolId) -> Type {
        Type::Class {
            sym,
            args: Vec::new(),
        }
    }

    pub fn error(name: &str) -> Type {
        Type::Error {
            name: Arc::from(name),
        }
    }

    pub fn array_of(elem: Type, dims: u32) -> Type {
        (0..dims).fold(elem, |ty, _| Type::Array(Box::new(ty)))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Type::Error { .. })
    }

    /// Error or unknown: suppress follow-on diagnostics.
    pub fn is_erroneous(&self) -> bool {
        matches!(self, Type::Error { .. } | Type::Unknown)
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, Type::Primitive(_))
    }

    pub fn primitive(&self) -> Option<PrimitiveKind> {
        match self {
            Type::Primitive(kind) => Some(*kind),
            _ => None,
        }
    }

    pub fn is_reference(&self) -> bool {
        matches!(
            self,
            Type::Class { .. } | Type::Array(_) | Type::TypeVar(_) | Type::Null
        )
    }

    /// Class handle for class types.
    pub fn class_symbol(&self) -> Option<SymbolId> {
        match self {
            Type::Class { sym, .. } => Some(*sym),
            _ => None,
        }
    }

    pub fn type_args(&self) -> &[Type] {
        match self {
            Type::Class { args, .. } => args,
            _ => &[],
        }
    }

    pub fn element_type(&self) -> Option<&Type> {
        match self {
            Type::Array(elem) => Some(elem),
            _ => None,
        }
    }

    /// Innermost component type of an array, or the type itself.
    pub fn leaf_type(&self) -> &Type {
        let mut ty = self;
        while let Type::Array(elem) = ty {
            ty = elem;
        }
        ty
    }

    pub fn dimensions(&self) -> u32 {
        let mut dims = 0;
        let mut ty = self;
        while let Type::Array(elem) = ty {
            dims += 1;
            ty = elem;
        }
        dims
    }

    /// The type without type arguments.
    pub fn erasure(&self) -> Type {
        match self {
            Type::Class { sym, .. } => Type::class(*sym),
            Type::Array(elem) => Type::Array(Box::new(elem.erasure())),
            other => other.clone(),
        }
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_widening() {
        assert!(PrimitiveKind::Int.widens_to(PrimitiveKind::Long));
        assert!(PrimitiveKind::Char.widens_to(PrimitiveKind::Int));
        assert!(!PrimitiveKind::Long.widens_to(PrimitiveKind::Int));
        assert!(!PrimitiveKind::Byte.widens_to(PrimitiveKind::Char));
        assert!(!PrimitiveKind::Boolean.widens_to(PrimitiveKind::Int));
        assert_eq!(
            PrimitiveKind::Byte.promote(PrimitiveKind::Short),
            PrimitiveKind::Int
        );
        assert_eq!(
            PrimitiveKind::Int.promote(PrimitiveKind::Double),
            PrimitiveKind::Double
        );
    }

    #[test]
    fn test_array_helpers() {
        let ty = Type::array_of(Type::Primitive(PrimitiveKind::Int), 2);
        assert_eq!(ty.dimensions(), 2);
        assert_eq!(ty.leaf_type(), &Type::Primitive(PrimitiveKind::Int));
        assert_eq!(ty.element_type().map(Type::dimensions), Some(1));
    }
}
