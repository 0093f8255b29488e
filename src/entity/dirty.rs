/// Names of fields changed since load or construction.
///
/// Marking is idempotent. Iteration follows first-marked order, which fixes
/// the order of validation errors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirtySet {
    fields: Vec<String>,
}

impl DirtySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` if the field was already dirty.
    pub fn insert(&mut self, field: &str) -> bool {
        if self.contains(field) {
            return false;
        }
        self.fields.push(field.to_string());
        true
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f == field)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn clear(&mut self) {
        self.fields.clear();
    }
}
