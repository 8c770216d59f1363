use std::collections::HashMap;
use std::rc::Rc;

use crate::callable::LoxFunction;

/// A class value: its name, unbound instance methods, and the static methods
/// it owns.
#[derive(Debug)]
pub struct LoxClass {
    pub name: String,
    methods: HashMap<String, Rc<LoxFunction>>,
    static_methods: HashMap<String, Rc<LoxFunction>>,
}

impl LoxClass {
    pub fn new(
        name: String,
        methods: HashMap<String, Rc<LoxFunction>>,
        static_methods: HashMap<String, Rc<LoxFunction>>,
    ) -> Self {
        Self {
            name,
            methods,
            static_methods,
        }
    }

    /// Unbound instance method `name`, if declared.
    pub fn find_method(&self, name: &str) -> Option<Rc<LoxFunction>> {
        self.methods.get(name).cloned()
    }

    pub fn find_static_method(&self, name: &str) -> Option<Rc<LoxFunction>> {
        self.static_methods.get(name).cloned()
    }

    /// Calling the class takes whatever `init` takes.
    pub fn arity(&self) -> usize {
        self.methods.get("init").map_or(0, |init| init.arity())
    }
}
