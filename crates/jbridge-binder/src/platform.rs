//! Embedded platform library.
//!
//! A small `java.lang`, `java.lang.annotation`, `java.io` and `java.util`
//! are embedded as source stubs with `include_str!` and served by the file
//! manager as the first (boot) classpath entry. Only signatures matter: the
//! stubs are parsed with bodies ignored.

/// One embedded platform source file.
#[derive(Debug, Clone, Copy)]
pub struct EmbeddedClass {
    /// Slash-separated path relative to the library root (`java/lang/Object.java`).
    pub path: &'static str,
    /// The file content.
    pub content: &'static str,
}

/// Display name of the platform classpath entry.
pub const PLATFORM_ENTRY_NAME: &str = "jrt-fs";

macro_rules! embed {
    ($path:literal) => {
        EmbeddedClass {
            path: $path,
            content: include_str!(concat!("../platform/", $path)),
        }
    };
}

pub static PLATFORM_CLASSES: &[EmbeddedClass] = &[
    embed!("java/io/Closeable.java"),
    embed!("java/io/IOException.java"),
    embed!("java/io/PrintStream.java"),
    embed!("java/io/Serializable.java"),
    embed!("java/lang/AutoCloseable.java"),
    embed!("java/lang/Boolean.java"),
    embed!("java/lang/Byte.java"),
    embed!("java/lang/CharSequence.java"),
    embed!("java/lang/Character.java"),
    embed!("java/lang/Class.java"),
    embed!("java/lang/CloneNotSupportedException.java"),
    embed!("java/lang/Cloneable.java"),
    embed!("java/lang/Comparable.java"),
    embed!("java/lang/Deprecated.java"),
    embed!("java/lang/Double.java"),
    embed!("java/lang/Enum.java"),
    embed!("java/lang/Error.java"),
    embed!("java/lang/Exception.java"),
    embed!("java/lang/Float.java"),
    embed!("java/lang/FunctionalInterface.java"),
    embed!("java/lang/IllegalArgumentException.java"),
    embed!("java/lang/IllegalStateException.java"),
    embed!("java/lang/Integer.java"),
    embed!("java/lang/InterruptedException.java"),
    embed!("java/lang/Iterable.java"),
    embed!("java/lang/Long.java"),
    embed!("java/lang/Math.java"),
    embed!("java/lang/NullPointerException.java"),
    embed!("java/lang/Number.java"),
    embed!("java/lang/Object.java"),
    embed!("java/lang/Override.java"),
    embed!("java/lang/Record.java"),
    embed!("java/lang/Runnable.java"),
    embed!("java/lang/RuntimeException.java"),
    embed!("java/lang/SafeVarargs.java"),
    embed!("java/lang/Short.java"),
    embed!("java/lang/String.java"),
    embed!("java/lang/StringBuilder.java"),
    embed!("java/lang/SuppressWarnings.java"),
    embed!("java/lang/System.java"),
    embed!("java/lang/Thread.java"),
    embed!("java/lang/Throwable.java"),
    embed!("java/lang/UnsupportedOperationException.java"),
    embed!("java/lang/Void.java"),
    embed!("java/lang/annotation/Annotation.java"),
    embed!("java/lang/annotation/Documented.java"),
    embed!("java/lang/annotation/ElementType.java"),
    embed!("java/lang/annotation/Inherited.java"),
    embed!("java/lang/annotation/Retention.java"),
    embed!("java/lang/annotation/RetentionPolicy.java"),
    embed!("java/lang/annotation/Target.java"),
    embed!("java/util/ArrayList.java"),
    embed!("java/util/Arrays.java"),
    embed!("java/util/Collection.java"),
    embed!("java/util/Collections.java"),
    embed!("java/util/HashMap.java"),
    embed!("java/util/HashSet.java"),
    embed!("java/util/Iterator.java"),
    embed!("java/util/List.java"),
    embed!("java/util/Map.java"),
    embed!("java/util/Objects.java"),
    embed!("java/util/Optional.java"),
    embed!("java/util/Set.java"),
    embed!("java/util/function/BiFunction.java"),
    embed!("java/util/function/Consumer.java"),
    embed!("java/util/function/Function.java"),
    embed!("java/util/function/Predicate.java"),
    embed!("java/util/function/Supplier.java"),
];

pub fn get_class(path: &str) -> Option<&'static EmbeddedClass> {
    PLATFORM_CLASSES.iter().find(|c| c.path == path)
}

/// Whether any embedded class lives in the package directory `dir`
/// (`java/util`).
pub fn has_package(dir: &str) -> bool {
    PLATFORM_CLASSES.iter().any(|c| {
        c.path
            .rsplit_once('/')
            .is_some_and(|(parent, _)| parent == dir || parent.starts_with(&format!("{dir}/")))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_classes_present() {
        for path in [
            "java/lang/Object.java",
            "java/lang/String.java",
            "java/lang/Override.java",
            "java/io/IOException.java",
            "java/util/List.java",
        ] {
            assert!(get_class(path).is_some(), "missing {path}");
        }
    }

    #[test]
    fn test_package_lookup() {
        assert!(has_package("java/lang"));
        assert!(has_package("java"));
        assert!(!has_package("javax/swing"));
    }

    #[test]
    fn test_stub_declares_its_package() {
        for class in PLATFORM_CLASSES {
            let (dir, _) = class.path.rsplit_once('/').unwrap();
            let expected = format!("package {};", dir.replace('/', "."));
            assert!(class.content.starts_with(&expected), "{}", class.path);
        }
    }
}
