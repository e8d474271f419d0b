//! Classes and objects provided by the host rather than declared in source.
use super::Type;
use std::rc::Rc;

#[derive(Debug, PartialEq)]
pub struct NativeMethod {
    pub name: String,
    pub parameters: Vec<(String, Type)>,
    pub return_type: Type,
    /// A variadic method takes at least `parameters.len()` arguments. Arguments past the
    /// declared parameters are not type checked.
    pub is_variadic: bool,
}

impl NativeMethod {
    pub fn new<S: Into<String>>(name: S, parameters: &[(&str, Type)], return_type: Type) -> Self {
        Self {
            name: name.into(),
            parameters: parameters
                .iter()
                .map(|(name, ty)| (name.to_string(), ty.clone()))
                .collect(),
            return_type,
            is_variadic: false,
        }
    }

    pub fn variadic(mut self) -> Self {
        self.is_variadic = true;
        self
    }
}

#[derive(Debug, PartialEq)]
pub struct NativeClass {
    pub name: String,
    methods: Vec<Rc<NativeMethod>>,
}

impl NativeClass {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            methods: vec![],
        }
    }

    pub fn with_method(mut self, method: NativeMethod) -> Self {
        self.methods.push(Rc::new(method));
        self
    }

    pub fn method(&self, name: &str) -> Option<&Rc<NativeMethod>> {
        self.methods.iter().find(|m| m.name == name)
    }

    pub fn methods(&self) -> impl Iterator<Item = &Rc<NativeMethod>> {
        self.methods.iter()
    }

    pub fn r#type(&self) -> Type {
        Type::NativeClass(self.name.clone())
    }
}

/// A pre-instantiated global such as `ARGV`.
#[derive(Debug, PartialEq)]
pub struct NativeObject {
    pub name: String,
    pub class: Rc<NativeClass>,
}

impl NativeObject {
    pub fn r#type(&self) -> Type {
        self.class.r#type()
    }
}

#[derive(Debug, Default)]
pub struct NativeRegistry {
    classes: Vec<Rc<NativeClass>>,
    objects: Vec<Rc<NativeObject>>,
}

impl NativeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The classes and objects every program can use.
    pub fn prelude() -> Self {
        let mut registry = Self::new();

        registry.register_class(
            NativeClass::new("Base64")
                .with_method(NativeMethod::new(
                    "encode",
                    &[("s", Type::String)],
                    Type::String,
                ))
                .with_method(NativeMethod::new(
                    "decode",
                    &[("s", Type::String)],
                    Type::String,
                )),
        );
        registry.register_class(
            NativeClass::new("Libc")
                .with_method(NativeMethod::new("getpid", &[], Type::Int32))
                .with_method(NativeMethod::new(
                    "environ",
                    &[],
                    Type::dictionary_of(Type::String, Type::String),
                )),
        );

        // ARGV is an instance of an internal class which is not visible by name.
        let argv = Rc::new(
            NativeClass::new("Argv").with_method(NativeMethod::new("pop", &[], Type::String)),
        );
        registry.register_object("ARGV", &argv);

        registry
    }

    pub fn register_class(&mut self, class: NativeClass) -> Rc<NativeClass> {
        let class = Rc::new(class);

        self.classes.push(Rc::clone(&class));
        class
    }

    pub fn register_object<S: Into<String>>(&mut self, name: S, class: &Rc<NativeClass>) {
        self.objects.push(Rc::new(NativeObject {
            name: name.into(),
            class: Rc::clone(class),
        }));
    }

    pub fn classes(&self) -> impl Iterator<Item = &Rc<NativeClass>> {
        self.classes.iter()
    }

    pub fn objects(&self) -> impl Iterator<Item = &Rc<NativeObject>> {
        self.objects.iter()
    }

    pub fn class(&self, name: &str) -> Option<&Rc<NativeClass>> {
        self.classes.iter().find(|c| c.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prelude() {
        let registry = NativeRegistry::prelude();

        let base64 = registry.class("Base64").unwrap();
        let encode = base64.method("encode").unwrap();
        assert_eq!(encode.parameters.len(), 1);
        assert_eq!(encode.return_type, Type::String);

        assert!(registry.class("Argv").is_none());

        let argv = registry.objects().find(|o| o.name == "ARGV").unwrap();
        assert_eq!(argv.r#type(), Type::NativeClass("Argv".into()));
        assert!(argv.class.method("pop").is_some());
    }

    #[test]
    fn variadic() {
        let method = NativeMethod::new("printf", &[("format", Type::String)], Type::Void).variadic();
        assert!(method.is_variadic);
    }
}
