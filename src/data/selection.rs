//! Column selection model behind the multi-select control.

/// Ordered set of column names. Insertion order is kept and duplicates ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnSelection {
    columns: Vec<String>,
}

impl ColumnSelection {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut selection = Self::default();
        for column in columns {
            selection.insert(column.into());
        }
        selection
    }

    /// The first `count` numeric columns.
    pub fn default_for(numeric_columns: &[String], count: usize) -> Self {
        Self::new(numeric_columns.iter().take(count).cloned())
    }

    pub fn insert(&mut self, column: String) {
        if !self.contains(&column) {
            self.columns.push(column);
        }
    }

    pub fn remove(&mut self, column: &str) {
        self.columns.retain(|c| c != column);
    }

    /// Set membership from a checkbox; newly checked columns go last.
    pub fn set(&mut self, column: &str, selected: bool) {
        if selected {
            self.insert(column.to_string());
        } else {
            self.remove(column);
        }
    }

    pub fn clear(&mut self) {
        self.columns.clear();
    }

    pub fn contains(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Column driving single-column charts.
    pub fn primary(&self) -> Option<&str> {
        self.columns.first().map(String::as_str)
    }

    /// Columns driving bivariate charts.
    pub fn pair(&self) -> Option<(&str, &str)> {
        match self.columns.as_slice() {
            [x, y, ..] => Some((x.as_str(), y.as_str())),
            _ => None,
        }
    }

    /// Selected columns that are also in `numeric`, in selection order.
    pub fn numeric_subset(&self, numeric: &[String]) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| numeric.contains(c))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn keeps_order_and_ignores_duplicates() {
        let selection = ColumnSelection::new(["nickel", "iron", "nickel"]);
        assert_eq!(selection.columns(), names(&["nickel", "iron"]).as_slice());
        assert_eq!(selection.primary(), Some("nickel"));
        assert_eq!(selection.pair(), Some(("nickel", "iron")));
    }

    #[test]
    fn default_takes_leading_numeric_columns() {
        let numeric = names(&["iron", "nickel", "sulfur", "water_ice"]);
        let selection = ColumnSelection::default_for(&numeric, 3);
        assert_eq!(selection.columns(), &numeric[..3]);

        let short = ColumnSelection::default_for(&numeric[..1], 3);
        assert_eq!(short.len(), 1);
    }

    #[test]
    fn checkbox_toggles_append_and_remove() {
        let mut selection = ColumnSelection::new(["iron"]);
        selection.set("sulfur", true);
        selection.set("iron", false);
        selection.set("iron", true);
        assert_eq!(selection.columns(), names(&["sulfur", "iron"]).as_slice());
        assert_eq!(selection.pair(), Some(("sulfur", "iron")));

        selection.clear();
        assert!(selection.is_empty());
        assert_eq!(selection.primary(), None);
        assert_eq!(selection.pair(), None);
    }

    #[test]
    fn numeric_subset_filters_in_selection_order() {
        let selection = ColumnSelection::new(["sulfur", "Celestial Body", "iron"]);
        let numeric = names(&["iron", "nickel", "sulfur"]);
        assert_eq!(selection.numeric_subset(&numeric), names(&["sulfur", "iron"]));
    }
}
