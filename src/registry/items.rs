use crate::models::ConfigIdentity;
use log::debug;

/// Consumer of configuration metadata, typically a UI or persistence layer.
pub trait ConfigItemSink {
    fn register_config_item(&mut self, item: &ConfigIdentity);
}

/// Collects the configuration items of every built pipeline.
#[derive(Debug, Default)]
pub struct ConfigItemRegistry {
    items: Vec<ConfigIdentity>,
}

impl ConfigItemRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, path: &str) -> Option<&ConfigIdentity> {
        self.items.iter().find(|item| item.path == path)
    }

    /// Items ordered for display. Ties keep registration order.
    pub fn sorted(&self) -> Vec<&ConfigIdentity> {
        let mut items: Vec<&ConfigIdentity> = self.items.iter().collect();
        items.sort_by_key(|item| item.sort_order);
        items
    }

    /// Display-ordered items as a JSON array.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.sorted())
    }
}

impl ConfigItemSink for ConfigItemRegistry {
    fn register_config_item(&mut self, item: &ConfigIdentity) {
        debug!(
            "Config item {} '{}' (sort {})",
            item.path, item.title, item.sort_order
        );
        self.items.push(item.clone());
    }
}
