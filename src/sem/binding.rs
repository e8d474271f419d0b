//! What a name refers to.
use super::native::{NativeClass, NativeObject};
use super::{Type, TypeReference};
use crate::syntax::{Class, Enum, Function};
use std::fmt;
use std::rc::Rc;

#[derive(Debug)]
pub struct ParameterInfo {
    pub name: String,
    pub type_ref: TypeReference,
}

/// Signature of a function, method or constructor. Type references are shared with the
/// declaration, so the signature is complete once the declaration is resolved.
#[derive(Debug)]
pub struct FunctionSignature {
    pub name: String,
    pub parameters: Vec<ParameterInfo>,
    pub return_type: TypeReference,
    pub is_constructor: bool,
}

impl FunctionSignature {
    pub fn from_declaration(function: &Function) -> Self {
        Self {
            name: function.name.name.clone(),
            parameters: function
                .parameters
                .iter()
                .map(|p| ParameterInfo {
                    name: p.name.name.clone(),
                    type_ref: p.type_ref.clone(),
                })
                .collect(),
            return_type: function.return_type.clone(),
            is_constructor: function.is_constructor,
        }
    }
}

#[derive(Debug)]
pub struct FieldInfo {
    pub class_name: String,
    pub name: String,
    pub type_ref: TypeReference,
    pub has_initializer: bool,
    pub is_mutable: bool,
}

#[derive(Debug)]
pub struct ClassInfo {
    pub name: String,
    pub fields: Vec<Rc<FieldInfo>>,
    pub methods: Vec<Rc<FunctionSignature>>,
    pub constructors: Vec<Rc<FunctionSignature>>,
}

impl ClassInfo {
    pub fn from_declaration(class: &Class) -> Self {
        let name = class.name.name.clone();
        let fields = class
            .fields
            .iter()
            .map(|field| {
                Rc::new(FieldInfo {
                    class_name: name.clone(),
                    name: field.name.name.clone(),
                    type_ref: field.type_ref.clone(),
                    has_initializer: field.initializer.is_some(),
                    is_mutable: field.is_mutable,
                })
            })
            .collect();
        let (constructors, methods): (Vec<_>, Vec<_>) = class
            .methods
            .iter()
            .map(|m| Rc::new(FunctionSignature::from_declaration(m)))
            .partition(|m| m.is_constructor);

        Self {
            name,
            fields,
            methods,
            constructors,
        }
    }

    pub fn field(&self, name: &str) -> Option<&Rc<FieldInfo>> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn method(&self, name: &str) -> Option<&Rc<FunctionSignature>> {
        self.methods.iter().find(|m| m.name == name)
    }

    /// Parameter counts of the constructors, ascending.
    pub fn constructor_arities(&self) -> Vec<usize> {
        let mut arities: Vec<usize> = self
            .constructors
            .iter()
            .map(|c| c.parameters.len())
            .collect();
        arities.sort_unstable();
        arities.dedup();
        arities
    }

    pub fn r#type(&self) -> Type {
        Type::Class(self.name.clone())
    }
}

#[derive(Debug)]
pub struct EnumInfo {
    pub name: String,
    pub members: Vec<String>,
    pub underlying_type: TypeReference,
}

impl EnumInfo {
    pub fn from_declaration(declaration: &Enum) -> Self {
        Self {
            name: declaration.name.name.clone(),
            members: declaration
                .members
                .iter()
                .map(|m| m.name.name.clone())
                .collect(),
            underlying_type: declaration.underlying_type.clone(),
        }
    }

    pub fn has_member(&self, name: &str) -> bool {
        self.members.iter().any(|m| m == name)
    }

    pub fn r#type(&self) -> Type {
        Type::Enum(self.name.clone())
    }
}

#[derive(Debug, Clone)]
pub enum BindingKind {
    Variable {
        type_ref: TypeReference,
        is_mutable: bool,
    },
    Function(Rc<FunctionSignature>),
    Class(Rc<ClassInfo>),
    NativeClass(Rc<NativeClass>),
    NativeObject(Rc<NativeObject>),
    Field(Rc<FieldInfo>),
    Enum(Rc<EnumInfo>),
    /// A name that was not found in any enclosing scope. Type resolution either re-binds it
    /// to a global declared later or reports it as undefined.
    GlobalCandidate,
}

/// The kind of entity a binding refers to, as named in diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ObjectKind {
    Variable,
    Function,
    Field,
    Class,
    Object,
    Enum,
    Identifier,
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ObjectKind::Variable => "Variable",
            ObjectKind::Function => "Function",
            ObjectKind::Field => "Field",
            ObjectKind::Class => "Class",
            ObjectKind::Object => "Object",
            ObjectKind::Enum => "Enum",
            ObjectKind::Identifier => "Identifier",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone)]
pub struct Binding {
    name: String,
    kind: BindingKind,
    /// Number of scopes between the reference and the declaration. `None` for globals.
    depth: Option<usize>,
}

impl Binding {
    // -- initializers
    pub fn new<S: Into<String>>(name: S, kind: BindingKind) -> Self {
        Self {
            name: name.into(),
            kind,
            depth: None,
        }
    }

    pub fn variable<S: Into<String>>(name: S, type_ref: &TypeReference, is_mutable: bool) -> Self {
        Self::new(
            name,
            BindingKind::Variable {
                type_ref: type_ref.clone(),
                is_mutable,
            },
        )
    }

    pub fn function(signature: &Rc<FunctionSignature>) -> Self {
        Self::new(
            signature.name.clone(),
            BindingKind::Function(Rc::clone(signature)),
        )
    }

    pub fn class(class: &Rc<ClassInfo>) -> Self {
        Self::new(class.name.clone(), BindingKind::Class(Rc::clone(class)))
    }

    pub fn native_class(class: &Rc<NativeClass>) -> Self {
        Self::new(class.name.clone(), BindingKind::NativeClass(Rc::clone(class)))
    }

    pub fn native_object(object: &Rc<NativeObject>) -> Self {
        Self::new(
            object.name.clone(),
            BindingKind::NativeObject(Rc::clone(object)),
        )
    }

    pub fn field(field: &Rc<FieldInfo>) -> Self {
        Self::new(field.name.clone(), BindingKind::Field(Rc::clone(field)))
    }

    pub fn enumeration(info: &Rc<EnumInfo>) -> Self {
        Self::new(info.name.clone(), BindingKind::Enum(Rc::clone(info)))
    }

    pub fn global_candidate<S: Into<String>>(name: S) -> Self {
        Self::new(name, BindingKind::GlobalCandidate)
    }

    /// Returns a copy of this binding as seen from `depth` scopes below its declaration.
    pub fn at_depth(&self, depth: usize) -> Self {
        Self {
            depth: Some(depth),
            ..self.clone()
        }
    }

    // -- accessors
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &BindingKind {
        &self.kind
    }

    pub fn depth(&self) -> Option<usize> {
        self.depth
    }

    pub fn is_local(&self) -> bool {
        self.depth.is_some()
    }

    pub fn is_global_candidate(&self) -> bool {
        matches!(self.kind, BindingKind::GlobalCandidate)
    }

    pub fn object_kind(&self) -> ObjectKind {
        match self.kind {
            BindingKind::Variable { .. } => ObjectKind::Variable,
            BindingKind::Function(_) => ObjectKind::Function,
            BindingKind::Class(_) | BindingKind::NativeClass(_) => ObjectKind::Class,
            BindingKind::NativeObject(_) => ObjectKind::Object,
            BindingKind::Field(_) => ObjectKind::Field,
            BindingKind::Enum(_) => ObjectKind::Enum,
            BindingKind::GlobalCandidate => ObjectKind::Identifier,
        }
    }

    /// Whether assigning to the bound entity is an error regardless of state.
    pub fn is_immutable(&self) -> bool {
        match &self.kind {
            BindingKind::Variable { is_mutable, .. } => !is_mutable,
            BindingKind::Field(field) => !field.is_mutable,
            BindingKind::GlobalCandidate => false,
            _ => true,
        }
    }

    /// The type slot of the bound entity. Functions yield their return type.
    pub fn type_reference(&self) -> Option<TypeReference> {
        match &self.kind {
            BindingKind::Variable { type_ref, .. } => Some(type_ref.clone()),
            BindingKind::Function(signature) => Some(signature.return_type.clone()),
            BindingKind::Class(class) => Some(TypeReference::resolved(class.r#type())),
            BindingKind::NativeClass(class) => Some(TypeReference::resolved(class.r#type())),
            BindingKind::NativeObject(object) => Some(TypeReference::resolved(object.r#type())),
            BindingKind::Field(field) => Some(field.type_ref.clone()),
            BindingKind::Enum(info) => Some(TypeReference::resolved(info.r#type())),
            BindingKind::GlobalCandidate => None,
        }
    }

    pub fn signature(&self) -> Option<&Rc<FunctionSignature>> {
        if let BindingKind::Function(signature) = &self.kind {
            Some(signature)
        } else {
            None
        }
    }

    pub fn class_info(&self) -> Option<&Rc<ClassInfo>> {
        if let BindingKind::Class(class) = &self.kind {
            Some(class)
        } else {
            None
        }
    }

    pub fn field_info(&self) -> Option<&Rc<FieldInfo>> {
        if let BindingKind::Field(field) = &self.kind {
            Some(field)
        } else {
            None
        }
    }
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} `{}`", self.object_kind(), self.name)?;
        if let Some(depth) = self.depth {
            write!(f, " (depth {})", depth)?;
        }
        Ok(())
    }
}
