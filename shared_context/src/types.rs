use std::fmt;

/// The type lattice shared by the semantic walker and the code generator
/// helpers.
///
/// `Unknown` is absorbing: it arises once a sub-expression has already
/// produced an error, and every operation involving it is considered
/// well-typed so a single mistake doesn't cascade into a wall of
/// unrelated diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Integer,
    Float,
    String,
    Boolean,
    Void,
    Unknown,
    Array(Box<Type>),
}

impl Type {
    pub fn array_of(element: Type) -> Type {
        Type::Array(Box::new(element))
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Type::Unknown)
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Type::Array(_))
    }

    /// The element type of an array, or `Unknown` if `self` isn't one.
    /// `ty.is_array()` should be checked where the distinction matters;
    /// this is the convenience accessor for call sites that already
    /// know `self` is an array.
    pub fn element_type(&self) -> Type {
        match self {
            Type::Array(inner) => (**inner).clone(),
            _ => Type::Unknown,
        }
    }

    /// Structural equality where `Unknown` equals everything, so that a
    /// single failed sub-expression doesn't trigger secondary mismatches.
    pub fn equal(&self, other: &Type) -> bool {
        if self.is_unknown() || other.is_unknown() {
            return true;
        }

        match (self, other) {
            (Type::Array(a), Type::Array(b)) => a.equal(b),
            (a, b) => a == b,
        }
    }

    pub fn numeric(&self) -> bool {
        matches!(self, Type::Integer | Type::Float | Type::Unknown)
    }

    /// The result type of an arithmetic operation between two numeric
    /// operands: `integer op integer` stays `integer`, anything mixing in
    /// a `float` widens to `float`. Callers must check `numeric()` on
    /// both operands first.
    pub fn arith_result(&self, other: &Type) -> Type {
        if self.is_unknown() || other.is_unknown() {
            return Type::Unknown;
        }

        match (self, other) {
            (Type::Float, _) | (_, Type::Float) => Type::Float,
            (Type::Integer, Type::Integer) => Type::Integer,
            _ => Type::Unknown,
        }
    }

    /// Relational and equality operators accept two numeric operands, or
    /// two operands of identical non-numeric type.
    pub fn comparable(&self, other: &Type) -> bool {
        if self.is_unknown() || other.is_unknown() {
            return true;
        }

        (self.numeric() && other.numeric()) || self.equal(other)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Integer => write!(f, "integer"),
            Type::Float => write!(f, "float"),
            Type::String => write!(f, "string"),
            Type::Boolean => write!(f, "boolean"),
            Type::Void => write!(f, "void"),
            Type::Unknown => write!(f, "unknown"),
            Type::Array(inner) => write!(f, "array of {}", inner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_absorbs_equality_checks() {
        assert!(Type::Unknown.equal(&Type::Integer));
        assert!(Type::Integer.equal(&Type::Unknown));
    }

    #[test]
    fn arrays_compare_structurally() {
        let a = Type::array_of(Type::Integer);
        let b = Type::array_of(Type::Integer);
        let c = Type::array_of(Type::String);
        assert!(a.equal(&b));
        assert!(!a.equal(&c));
    }

    #[test]
    fn arithmetic_widens_to_float() {
        assert_eq!(Type::Integer.arith_result(&Type::Integer), Type::Integer);
        assert_eq!(Type::Integer.arith_result(&Type::Float), Type::Float);
        assert_eq!(Type::Float.arith_result(&Type::Integer), Type::Float);
    }

    #[test]
    fn comparable_allows_numeric_mixes_but_not_type_mixes() {
        assert!(Type::Integer.comparable(&Type::Float));
        assert!(!Type::Integer.comparable(&Type::String));
        assert!(Type::String.comparable(&Type::String));
    }

    #[test]
    fn display_renders_nested_arrays() {
        let ty = Type::array_of(Type::array_of(Type::Integer));
        assert_eq!(ty.to_string(), "array of array of integer");
    }
}
