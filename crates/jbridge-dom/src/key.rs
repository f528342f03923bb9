//! Binding keys.
//!
//! A binding key is a context-free string naming a symbol, stable across
//! sessions and across source versus classpath origin:
//!
//! ```text
//! package        java/util            ("" for the unnamed package)
//! module         "java.base
//! type           Ljava/util/Map$Entry;   I   V   [[Ljava/lang/String;
//! parameterized  Ljava/util/List<Ljava/lang/String;>;
//! type variable  TT;   (as an argument)     Lp/A;:TT;   (as a binding)
//! wildcard       *   +Ljava/lang/Number;   -Ljava/lang/Integer;
//! method         Lp/A;.m<T:Ljava/lang/Object;>(ITT;)V|Ljava/io/IOException;
//! constructor    Lp/A;.(I)V
//! field          Lp/A;.count)I
//! local          Lp/A;.m()V#total#0
//! annotation     Lp/A;.m()V@Ljava/lang/Deprecated;
//! member value   Lp/A;@Lp/Ann;.value
//! ```

use std::fmt;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KeyParseError {
    #[error("binding key '{key}' ends unexpectedly")]
    UnexpectedEnd { key: String },
    #[error("binding key '{key}': unexpected '{found}' at offset {offset}")]
    Unexpected { key: String, offset: usize, found: char },
    #[error("binding key '{key}': trailing text at offset {offset}")]
    Trailing { key: String, offset: usize },
}

/// Key of a type as it appears inside other keys.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeKey {
    /// Descriptor character (`I`, `J`, `Z`, ...).
    Primitive(char),
    Void,
    /// Type of `null`.
    Null,
    Class {
        /// Slash separated binary name: `java/util/Map$Entry`.
        path: String,
        args: Vec<TypeKey>,
    },
    Array(Box<TypeKey>),
    TypeVar(String),
    Wildcard {
        /// `'*'`, `'+'` (extends) or `'-'` (super).
        kind: char,
        bound: Option<Box<TypeKey>>,
    },
}

const PRIMITIVE_DESCRIPTORS: &[char] = &['Z', 'B', 'C', 'S', 'I', 'J', 'F', 'D'];

impl TypeKey {
    /// Class key from a dotted binary name (`p.A$B`).
    pub fn class(binary_name: &str) -> TypeKey {
        TypeKey::Class {
            path: binary_name.replace('.', "/"),
            args: Vec::new(),
        }
    }

    pub fn array_of(element: TypeKey, dims: u32) -> TypeKey {
        (0..dims).fold(element, |t, _| TypeKey::Array(Box::new(t)))
    }

    /// Dotted binary name of a class key (`p.A$B`).
    pub fn binary_name(&self) -> Option<String> {
        match self {
            TypeKey::Class { path, .. } => Some(path.replace('/', ".")),
            _ => None,
        }
    }

    /// Dotted canonical name of a class key (`p.A.B`).
    pub fn canonical_name(&self) -> Option<String> {
        self.binary_name().map(|n| n.replace('$', "."))
    }

    pub fn leaf(&self) -> &TypeKey {
        match self {
            TypeKey::Array(elem) => elem.leaf(),
            other => other,
        }
    }

    pub fn dimensions(&self) -> u32 {
        match self {
            TypeKey::Array(elem) => 1 + elem.dimensions(),
            _ => 0,
        }
    }

    /// The key with every type argument removed.
    pub fn erasure(&self) -> TypeKey {
        match self {
            TypeKey::Class { path, .. } => TypeKey::Class {
                path: path.clone(),
                args: Vec::new(),
            },
            TypeKey::Array(elem) => TypeKey::Array(Box::new(elem.erasure())),
            other => other.clone(),
        }
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeKey::Primitive(c) => write!(f, "{c}"),
            TypeKey::Void => f.write_str("V"),
            TypeKey::Null => f.write_str("N"),
            TypeKey::Class { path, args } => {
                write!(f, "L{path}")?;
                if !args.is_empty() {
                    f.write_str("<")?;
                    for arg in args {
                        write!(f, "{arg}")?;
                    }
                    f.write_str(">")?;
                }
                f.write_str(";")
            }
            TypeKey::Array(elem) => write!(f, "[{elem}"),
            TypeKey::TypeVar(name) => write!(f, "T{name};"),
            TypeKey::Wildcard { kind, bound } => match bound {
                Some(b) => write!(f, "{kind}{b}"),
                None => write!(f, "{kind}"),
            },
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MethodKey {
    pub owner: TypeKey,
    /// Empty for constructors.
    pub name: String,
    /// Type parameter names with their first bound.
    pub type_params: Vec<(String, TypeKey)>,
    pub params: Vec<TypeKey>,
    pub return_type: TypeKey,
    pub thrown: Vec<TypeKey>,
}

impl MethodKey {
    pub fn is_constructor(&self) -> bool {
        self.name.is_empty()
    }
}

impl fmt::Display for MethodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.owner, self.name)?;
        if !self.type_params.is_empty() {
            f.write_str("<")?;
            for (name, bound) in &self.type_params {
                write!(f, "{name}:{bound}")?;
            }
            f.write_str(">")?;
        }
        f.write_str("(")?;
        for param in &self.params {
            write!(f, "{param}")?;
        }
        write!(f, "){}", self.return_type)?;
        for thrown in &self.thrown {
            write!(f, "|{thrown}")?;
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum BindingKey {
    /// Dotted package name.
    Package(String),
    Module(String),
    Type(TypeKey),
    Method(MethodKey),
    Field {
        owner: TypeKey,
        name: String,
        ty: TypeKey,
    },
    LocalVariable {
        owner: Box<BindingKey>,
        name: String,
        occurrence: u32,
    },
    TypeVariable {
        owner: Box<BindingKey>,
        name: String,
    },
    Annotation {
        recipient: Box<BindingKey>,
        annotation_type: TypeKey,
    },
    MemberValuePair {
        annotation: Box<BindingKey>,
        name: String,
    },
}

impl BindingKey {
    pub fn parse(key: &str) -> Result<BindingKey, KeyParseError> {
        KeyParser::new(key).parse()
    }

    pub fn is_package(key: &str) -> bool {
        !key.starts_with('"') && !key.starts_with('[') && !key.contains(';') && !is_single_primitive(key)
    }
}

fn is_single_primitive(key: &str) -> bool {
    let mut chars = key.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => PRIMITIVE_DESCRIPTORS.contains(&c) || c == 'V' || c == 'N',
        _ => false,
    }
}

impl fmt::Display for BindingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindingKey::Package(name) => f.write_str(&name.replace('.', "/")),
            BindingKey::Module(name) => write!(f, "\"{name}"),
            BindingKey::Type(ty) => write!(f, "{ty}"),
            BindingKey::Method(method) => write!(f, "{method}"),
            BindingKey::Field { owner, name, ty } => write!(f, "{owner}.{name}){ty}"),
            BindingKey::LocalVariable {
                owner,
                name,
                occurrence,
            } => write!(f, "{owner}#{name}#{occurrence}"),
            BindingKey::TypeVariable { owner, name } => write!(f, "{owner}:T{name};"),
            BindingKey::Annotation {
                recipient,
                annotation_type,
            } => write!(f, "{recipient}@{annotation_type}"),
            BindingKey::MemberValuePair { annotation, name } => write!(f, "{annotation}.{name}"),
        }
    }
}

struct KeyParser<'a> {
    key: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> KeyParser<'a> {
    fn new(key: &'a str) -> Self {
        KeyParser {
            key,
            bytes: key.as_bytes(),
            pos: 0,
        }
    }

    fn parse(mut self) -> Result<BindingKey, KeyParseError> {
        if let Some(module) = self.key.strip_prefix('"') {
            return Ok(BindingKey::Module(module.to_string()));
        }
        if BindingKey::is_package(self.key) {
            return Ok(BindingKey::Package(self.key.replace('/', ".")));
        }
        let ty = self.type_key()?;
        let mut key = match self.peek() {
            Some(b'.') => {
                self.pos += 1;
                self.member(ty)?
            }
            _ => BindingKey::Type(ty),
        };
        loop {
            match self.peek() {
                None => return Ok(key),
                Some(b'#') => {
                    self.pos += 1;
                    let name = self.until(b"#").to_string();
                    self.expect(b'#')?;
                    let digits = self.until(b"#:@");
                    let occurrence = digits.parse().map_err(|_| self.unexpected())?;
                    key = BindingKey::LocalVariable {
                        owner: Box::new(key),
                        name,
                        occurrence,
                    };
                }
                Some(b':') => {
                    self.pos += 1;
                    self.expect(b'T')?;
                    let name = self.until(b";").to_string();
                    self.expect(b';')?;
                    key = BindingKey::TypeVariable {
                        owner: Box::new(key),
                        name,
                    };
                }
                Some(b'@') => {
                    self.pos += 1;
                    let annotation_type = self.type_key()?;
                    key = BindingKey::Annotation {
                        recipient: Box::new(key),
                        annotation_type,
                    };
                }
                Some(b'.') if matches!(key, BindingKey::Annotation { .. }) => {
                    self.pos += 1;
                    let name = self.until(b"#:@").to_string();
                    key = BindingKey::MemberValuePair {
                        annotation: Box::new(key),
                        name,
                    };
                }
                Some(_) => {
                    return Err(KeyParseError::Trailing {
                        key: self.key.to_string(),
                        offset: self.pos,
                    });
                }
            }
        }
    }

    /// A method or field of `owner`; the `.` is consumed.
    fn member(&mut self, owner: TypeKey) -> Result<BindingKey, KeyParseError> {
        let name = self.until(b"(<)").to_string();
        match self.peek() {
            Some(b')') => {
                self.pos += 1;
                let ty = self.type_key()?;
                Ok(BindingKey::Field { owner, name, ty })
            }
            Some(b'<') | Some(b'(') => {
                let mut type_params = Vec::new();
                if self.peek() == Some(b'<') {
                    self.pos += 1;
                    while self.peek() != Some(b'>') {
                        let tp = self.until(b":>").to_string();
                        self.expect(b':')?;
                        let bound = self.type_key()?;
                        type_params.push((tp, bound));
                    }
                    self.pos += 1;
                }
                self.expect(b'(')?;
                let mut params = Vec::new();
                while self.peek() != Some(b')') {
                    params.push(self.type_key()?);
                }
                self.pos += 1;
                let return_type = self.type_key()?;
                let mut thrown = Vec::new();
                while self.peek() == Some(b'|') {
                    self.pos += 1;
                    thrown.push(self.type_key()?);
                }
                Ok(BindingKey::Method(MethodKey {
                    owner,
                    name,
                    type_params,
                    params,
                    return_type,
                    thrown,
                }))
            }
            Some(_) => Err(self.unexpected()),
            None => Err(self.end()),
        }
    }

    fn type_key(&mut self) -> Result<TypeKey, KeyParseError> {
        let Some(c) = self.peek() else {
            return Err(self.end());
        };
        self.pos += 1;
        match c {
            b'V' => Ok(TypeKey::Void),
            b'N' => Ok(TypeKey::Null),
            b'[' => Ok(TypeKey::Array(Box::new(self.type_key()?))),
            b'*' => Ok(TypeKey::Wildcard {
                kind: '*',
                bound: None,
            }),
            b'+' | b'-' => Ok(TypeKey::Wildcard {
                kind: c as char,
                bound: Some(Box::new(self.type_key()?)),
            }),
            b'T' => {
                let name = self.until(b";").to_string();
                self.expect(b';')?;
                Ok(TypeKey::TypeVar(name))
            }
            b'L' => {
                let path = self.until(b"<;").to_string();
                let mut args = Vec::new();
                if self.peek() == Some(b'<') {
                    self.pos += 1;
                    while self.peek() != Some(b'>') {
                        if self.peek().is_none() {
                            return Err(self.end());
                        }
                        args.push(self.type_key()?);
                    }
                    self.pos += 1;
                }
                self.expect(b';')?;
                Ok(TypeKey::Class { path, args })
            }
            other if PRIMITIVE_DESCRIPTORS.contains(&(other as char)) => Ok(TypeKey::Primitive(other as char)),
            _ => {
                self.pos -= 1;
                Err(self.unexpected())
            }
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    /// Text up to (not including) the first of `stops`, or to the end.
    fn until(&mut self, stops: &[u8]) -> &'a str {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if stops.contains(&b) {
                break;
            }
            self.pos += 1;
        }
        self.key.get(start..self.pos).unwrap_or("")
    }

    fn expect(&mut self, byte: u8) -> Result<(), KeyParseError> {
        match self.peek() {
            Some(b) if b == byte => {
                self.pos += 1;
                Ok(())
            }
            Some(_) => Err(self.unexpected()),
            None => Err(self.end()),
        }
    }

    fn unexpected(&self) -> KeyParseError {
        match self.key.get(self.pos..).and_then(|rest| rest.chars().next()) {
            Some(found) => KeyParseError::Unexpected {
                key: self.key.to_string(),
                offset: self.pos,
                found,
            },
            None => self.end(),
        }
    }

    fn end(&self) -> KeyParseError {
        KeyParseError::UnexpectedEnd {
            key: self.key.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(text: &str) -> BindingKey {
        let key = BindingKey::parse(text).unwrap();
        assert_eq!(key.to_string(), text);
        key
    }

    #[test]
    fn test_type_keys() {
        let key = round_trip("Ljava/util/Map$Entry;");
        let BindingKey::Type(ty) = key else {
            panic!("expected a type key");
        };
        assert_eq!(ty.binary_name().as_deref(), Some("java.util.Map$Entry"));
        assert_eq!(ty.canonical_name().as_deref(), Some("java.util.Map.Entry"));

        let BindingKey::Type(array) = round_trip("[[I") else {
            panic!("expected a type key");
        };
        assert_eq!(array.dimensions(), 2);
        assert_eq!(array.leaf(), &TypeKey::Primitive('I'));
        round_trip("Ljava/util/Map<Ljava/lang/String;[Ljava/lang/Integer;>;");
        round_trip("Ljava/util/List<+Ljava/lang/Number;>;");
        round_trip("Ljava/util/List<*>;");
        round_trip("V");
    }

    #[test]
    fn test_member_keys() {
        let key = round_trip("Lp/A;.m<T:Ljava/lang/Object;>(ITT;[Ljava/lang/String;)V|Ljava/io/IOException;");
        let BindingKey::Method(method) = key else {
            panic!("expected a method key");
        };
        assert_eq!(method.name, "m");
        assert_eq!(method.params.len(), 3);
        assert_eq!(method.params[1], TypeKey::TypeVar("T".to_string()));
        assert_eq!(method.thrown.len(), 1);

        let BindingKey::Method(ctor) = round_trip("Lp/A;.(I)V") else {
            panic!("expected a constructor key");
        };
        assert!(ctor.is_constructor());

        assert_eq!(
            round_trip("Lp/A;.count)I"),
            BindingKey::Field {
                owner: TypeKey::class("p.A"),
                name: "count".to_string(),
                ty: TypeKey::Primitive('I'),
            }
        );
        assert!(matches!(
            round_trip("Lp/A;.m()V#total#1"),
            BindingKey::LocalVariable { occurrence: 1, .. }
        ));
        assert!(matches!(round_trip("Lp/A;:TT;"), BindingKey::TypeVariable { .. }));
        assert!(matches!(
            round_trip("Lp/A;.m()V@Ljava/lang/Deprecated;"),
            BindingKey::Annotation { .. }
        ));
        assert!(matches!(
            round_trip("Lp/A;@Lp/Ann;.value"),
            BindingKey::MemberValuePair { .. }
        ));
    }

    #[test]
    fn test_package_and_module_keys() {
        assert_eq!(BindingKey::parse("java/util").unwrap(), BindingKey::Package("java.util".to_string()));
        assert_eq!(BindingKey::parse("").unwrap(), BindingKey::Package(String::new()));
        assert_eq!(BindingKey::Package("java.util".to_string()).to_string(), "java/util");
        assert_eq!(round_trip("\"java.base"), BindingKey::Module("java.base".to_string()));
        assert!(!BindingKey::is_package("I"));
        assert!(!BindingKey::is_package("[I"));
    }

    #[test]
    fn test_malformed_keys() {
        assert!(matches!(
            BindingKey::parse("Lp/A;.m(I"),
            Err(KeyParseError::UnexpectedEnd { .. })
        ));
        assert!(matches!(
            BindingKey::parse("Lp/A;.m(Q)V"),
            Err(KeyParseError::Unexpected { found: 'Q', .. })
        ));
        assert!(matches!(
            BindingKey::parse("Lp/A;x"),
            Err(KeyParseError::Trailing { offset: 5, .. })
        ));
    }
}
