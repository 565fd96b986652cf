use std::collections::BTreeMap;

use crate::store::{load_or_default, Store};

const DELIMITER: char = ';';

/// `;name;` → literal replacement text. Read-only after load.
#[derive(Clone, Debug, Default)]
pub struct TextReplacements {
    map: BTreeMap<String, String>,
}

impl TextReplacements {
    pub fn new(map: BTreeMap<String, String>) -> Self {
        Self { map }
    }

    pub fn load(store: &dyn Store<BTreeMap<String, String>>) -> Self {
        Self::new(load_or_default(store))
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Replace every occurrence of every known `;name;` token.
    pub fn replace(&self, body: &str) -> String {
        if body.matches(DELIMITER).count() < 2 {
            return body.to_string();
        }

        let mut out = body.to_string();
        for (name, replacement) in &self.map {
            let token = format!("{DELIMITER}{name}{DELIMITER}");
            if out.contains(&token) {
                out = out.replace(&token, replacement);
            }
        }
        out
    }
}
