use super::native::{NativeClass, NativeRegistry};
use super::{Binding, BindingKind, ObjectKind};
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    Native,
    Unit(usize),
}

#[derive(Debug)]
struct GlobalEntry {
    binding: Binding,
    origin: Origin,
}

/// Top-level declarations visible to every unit of a session.
#[derive(Debug, Default)]
pub struct GlobalScope {
    entries: HashMap<String, GlobalEntry>,
}

impl GlobalScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_natives(registry: &NativeRegistry) -> Self {
        let mut scope = Self::new();

        for class in registry.classes() {
            scope.insert(Binding::native_class(class), Origin::Native);
        }
        for object in registry.objects() {
            scope.insert(Binding::native_object(object), Origin::Native);
        }

        scope
    }

    fn insert(&mut self, binding: Binding, origin: Origin) {
        self.entries
            .insert(binding.name().to_string(), GlobalEntry { binding, origin });
    }

    pub fn get(&self, name: &str) -> Option<&Binding> {
        self.entries.get(name).map(|entry| &entry.binding)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Finds a native class by name, including classes only reachable through an object.
    pub fn native_class(&self, name: &str) -> Option<Rc<NativeClass>> {
        self.entries
            .values()
            .find_map(|entry| match entry.binding.kind() {
                BindingKind::NativeClass(class) if class.name == name => Some(Rc::clone(class)),
                BindingKind::NativeObject(object) if object.class.name == name => {
                    Some(Rc::clone(&object.class))
                }
                _ => None,
            })
    }

    /// Declares a top-level entity of compilation unit `unit`.
    ///
    /// A name can be declared once per unit. A later unit may redeclare a variable of an
    /// earlier one; any other collision fails with the kind of the existing entity.
    pub fn declare(&mut self, binding: Binding, unit: usize) -> Result<(), ObjectKind> {
        if let Some(existing) = self.entries.get(binding.name()) {
            let redefinable = match existing.origin {
                Origin::Native => false,
                Origin::Unit(declared_in) => {
                    declared_in < unit
                        && existing.binding.object_kind() == ObjectKind::Variable
                        && binding.object_kind() == ObjectKind::Variable
                }
            };

            if !redefinable {
                return Err(existing.binding.object_kind());
            }
        }

        self.insert(binding, Origin::Unit(unit));
        Ok(())
    }

    pub fn snapshot(&self) -> GlobalSnapshot {
        GlobalSnapshot {
            entries: self
                .entries
                .iter()
                .map(|(name, entry)| (name.clone(), entry.binding.object_kind()))
                .collect(),
        }
    }
}

/// Names and kinds of the global declarations at one point in time.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GlobalSnapshot {
    entries: BTreeMap<String, ObjectKind>,
}

impl GlobalSnapshot {
    pub fn get(&self, name: &str) -> Option<ObjectKind> {
        self.entries.get(name).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, ObjectKind)> {
        self.entries.iter().map(|(name, kind)| (name.as_str(), *kind))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug)]
enum Slot {
    // Declared, but its initializer is still being resolved.
    Declared,
    Defined(Binding),
}

#[derive(Debug, Default)]
struct Frame {
    slots: HashMap<String, Slot>,
}

#[derive(Debug)]
pub enum Lookup {
    /// The binding, with its depth relative to the innermost scope.
    Found(Binding),
    /// The innermost declaration of the name is not initialized yet.
    NotReady,
    Missing,
}

/// Local scopes from the outermost block to the innermost.
#[derive(Debug, Default)]
pub struct ScopeStack {
    frames: Vec<Frame>,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self) {
        self.frames.push(Frame::default());
    }

    pub fn pop(&mut self) {
        self.frames.pop();
    }

    /// `true` at top level, where declarations go to the global scope.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Declares `name` in the innermost scope. Returns `false` if the scope already has it.
    pub fn declare(&mut self, name: &str) -> bool {
        match self.frames.last_mut() {
            Some(frame) if !frame.slots.contains_key(name) => {
                frame.slots.insert(name.to_string(), Slot::Declared);
                true
            }
            _ => false,
        }
    }

    pub fn define(&mut self, binding: Binding) {
        if let Some(frame) = self.frames.last_mut() {
            frame
                .slots
                .insert(binding.name().to_string(), Slot::Defined(binding));
        }
    }

    pub fn lookup(&self, name: &str) -> Lookup {
        let innermost = self.frames.len();

        for (i, frame) in self.frames.iter().enumerate().rev() {
            match frame.slots.get(name) {
                Some(Slot::Declared) => return Lookup::NotReady,
                Some(Slot::Defined(binding)) => {
                    return Lookup::Found(binding.at_depth(innermost - 1 - i))
                }
                None => {}
            }
        }

        Lookup::Missing
    }
}
