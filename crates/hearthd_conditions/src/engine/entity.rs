/// Entity registry entries.
///
/// An entry ties an entity to the device it belongs to. The domain is the part of the entity id
/// before the dot (`sensor` for `sensor.living_room_temperature`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryEntry {
    pub entity_id: String,
    pub domain: String,
    pub device_id: Option<String>,
}

impl RegistryEntry {
    /// Create an entry for a valid entity id. Returns `None` if the id is malformed.
    pub fn new(entity_id: &str, device_id: Option<String>) -> Option<Self> {
        let (domain, _) = split_entity_id(entity_id)?;
        Some(Self {
            entity_id: entity_id.to_string(),
            domain: domain.to_string(),
            device_id,
        })
    }
}

/// Split an entity id into `(domain, object_id)`.
pub fn split_entity_id(entity_id: &str) -> Option<(&str, &str)> {
    entity_id.split_once('.')
}

/// Check that an entity id has the form `<domain>.<object_id>`.
///
/// Both parts are non-empty runs of `[0-9a-z_]` that neither start nor end with `_`, and the id
/// never contains `__`.
pub fn valid_entity_id(entity_id: &str) -> bool {
    let Some((domain, object_id)) = split_entity_id(entity_id) else {
        return false;
    };

    if entity_id.contains("__") {
        return false;
    }

    [domain, object_id].iter().all(|part| {
        !part.is_empty()
            && !part.starts_with('_')
            && !part.ends_with('_')
            && part
                .chars()
                .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase() || c == '_')
    })
}
