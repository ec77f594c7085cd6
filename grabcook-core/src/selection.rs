//! Selected ingredients, kept in sync with the `ingredients` URL parameter.

use url::Url;

pub const INGREDIENTS_PARAM: &str = "ingredients";

/// Ordered set of catalog ingredient ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngredientSelection {
    ids: Vec<String>,
}

impl IngredientSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the selection from `url`.
    ///
    /// Values are comma separated and the parameter may repeat; blanks and
    /// duplicates are dropped.
    pub fn from_url(url: &Url) -> Self {
        let mut selection = Self::new();
        for (key, value) in url.query_pairs() {
            if key == INGREDIENTS_PARAM {
                for id in value.split(',') {
                    selection.add(id);
                }
            }
        }
        selection
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|i| i == id)
    }

    /// Returns false when `id` is blank or already selected.
    pub fn add(&mut self, id: &str) -> bool {
        let id = id.trim();
        if id.is_empty() || self.contains(id) {
            return false;
        }
        self.ids.push(id.to_string());
        true
    }

    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.ids.len();
        self.ids.retain(|i| i != id.trim());
        self.ids.len() != before
    }

    /// Add when absent, remove when present. Returns whether `id` is now selected.
    pub fn toggle(&mut self, id: &str) -> bool {
        if self.remove(id) {
            false
        } else {
            self.add(id)
        }
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// Write the selection into `url`, keeping every other parameter.
    ///
    /// An empty selection removes the parameter, and the query string too
    /// when nothing else is left.
    pub fn apply_to_url(&self, url: &mut Url) {
        let others: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(key, _)| key != INGREDIENTS_PARAM)
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();

        if others.is_empty() && self.ids.is_empty() {
            url.set_query(None);
            return;
        }

        let mut pairs = url.query_pairs_mut();
        pairs.clear();
        for (key, value) in &others {
            pairs.append_pair(key, value);
        }
        if !self.ids.is_empty() {
            pairs.append_pair(INGREDIENTS_PARAM, &self.ids.join(","));
        }
    }

    /// Copy of `url` carrying this selection.
    pub fn to_url(&self, url: &Url) -> Url {
        let mut url = url.clone();
        self.apply_to_url(&mut url);
        url
    }
}
