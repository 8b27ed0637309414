use std::fmt;

/// A configured device and the entities attached to it, in configuration order.
#[derive(Debug, Clone)]
pub struct Device {
    pub id: String,
    pub name: String,
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    pub entity_ids: Vec<String>,
}

impl Device {
    pub fn new(id: String, name: String) -> Self {
        Self {
            id,
            name,
            manufacturer: None,
            model: None,
            entity_ids: Vec::new(),
        }
    }

    /// Attach an entity. Re-attaching keeps the original position.
    pub fn add_entity(&mut self, entity_id: String) {
        if !self.entity_ids.contains(&entity_id) {
            self.entity_ids.push(entity_id);
        }
    }
}

/// `Name (Manufacturer Model)`, leaving out whatever is unknown.
impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        match (&self.manufacturer, &self.model) {
            (Some(manufacturer), Some(model)) => write!(f, " ({} {})", manufacturer, model),
            (Some(only), None) | (None, Some(only)) => write!(f, " ({})", only),
            (None, None) => Ok(()),
        }
    }
}
