use crate::model::ViewModelData;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

/// Live data-binding context shared by an artboard and its scene.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ViewModelInstance {
    name: String,
    values: BTreeMap<String, f32>,
}

pub type SharedViewModel = Rc<RefCell<ViewModelInstance>>;

impl ViewModelInstance {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: BTreeMap::new(),
        }
    }

    pub fn from_data(data: &ViewModelData) -> Self {
        Self {
            name: data.name.clone(),
            values: data
                .properties
                .iter()
                .map(|p| (p.name.clone(), p.value))
                .collect(),
        }
    }

    pub fn into_shared(self) -> SharedViewModel {
        Rc::new(RefCell::new(self))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn number(&self, property: &str) -> Option<f32> {
        self.values.get(property).copied()
    }

    /// Sets an existing property. Returns false for unknown names.
    pub fn set_number(&mut self, property: &str, value: f32) -> bool {
        match self.values.get_mut(property) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    pub fn property_names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PropertyData;

    #[test]
    fn from_data_copies_initial_values() {
        let vm = ViewModelInstance::from_data(&ViewModelData {
            name: "Controls".into(),
            properties: vec![PropertyData {
                name: "energy".into(),
                value: 0.25,
            }],
        });
        assert_eq!(vm.name(), "Controls");
        assert_eq!(vm.number("energy"), Some(0.25));
        assert_eq!(vm.number("missing"), None);
    }

    #[test]
    fn set_number_only_updates_known_properties() {
        let mut vm = ViewModelInstance::from_data(&ViewModelData {
            name: "vm".into(),
            properties: vec![PropertyData {
                name: "a".into(),
                value: 1.0,
            }],
        });
        assert!(vm.set_number("a", 3.0));
        assert!(!vm.set_number("b", 3.0));
        assert_eq!(vm.number("a"), Some(3.0));
        assert_eq!(vm.len(), 1);
    }

    #[test]
    fn shared_instance_sees_writes() {
        let shared = ViewModelInstance::new("x").into_shared();
        let other = Rc::clone(&shared);
        assert!(!other.borrow_mut().set_number("missing", 1.0));
        assert!(shared.borrow().is_empty());
    }
}
