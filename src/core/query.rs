use tracing::{info, warn};

/// A monitored class as the engine sees it. Built once from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassQuery {
    pub class_name: String,
    pub fields: Vec<String>,
    pub where_clause: Option<String>,
    pub title_field: Option<String>,
}

/// The WQL text for one class together with the shape information the
/// materializer needs when walking its rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledQuery {
    pub class_name: String,
    pub fields: Vec<String>,
    pub title_field: Option<String>,
    pub text: String,
}

impl ClassQuery {
    /// `SELECT f1,f2 FROM Class[ WHERE clause]`. The clause is appended verbatim.
    /// Returns `None` for a class without fields.
    pub fn compile(&self) -> Option<CompiledQuery> {
        if self.fields.is_empty() {
            return None;
        }
        let mut text = String::from("SELECT ");
        text.push_str(&self.fields.join(","));
        text.push_str(" FROM ");
        text.push_str(&self.class_name);
        if let Some(clause) = self.where_clause.as_deref().filter(|c| !c.is_empty()) {
            text.push_str(" WHERE ");
            text.push_str(clause);
        }
        Some(CompiledQuery {
            class_name: self.class_name.clone(),
            fields: self.fields.clone(),
            title_field: self.title_field.clone().filter(|t| !t.is_empty()),
            text,
        })
    }
}

#[cfg(test)]
impl ClassQuery {
    pub fn new(class_name: impl Into<String>, fields: &[&str]) -> Self {
        Self {
            class_name: class_name.into(),
            fields: fields.iter().map(|f| f.to_string()).collect(),
            where_clause: None,
            title_field: None,
        }
    }

    pub fn with_where(mut self, clause: impl Into<String>) -> Self {
        self.where_clause = Some(clause.into());
        self
    }

    pub fn with_title(mut self, field: impl Into<String>) -> Self {
        self.title_field = Some(field.into());
        self
    }
}

/// Compiled queries keyed by class name, kept in configuration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryTable {
    entries: Vec<CompiledQuery>,
}

impl QueryTable {
    #[cfg(test)]
    pub fn get(&self, class_name: &str) -> Option<&CompiledQuery> {
        self.entries.iter().find(|q| q.class_name == class_name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CompiledQuery> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn insert(&mut self, query: CompiledQuery) {
        match self
            .entries
            .iter_mut()
            .find(|q| q.class_name == query.class_name)
        {
            Some(existing) => {
                warn!(
                    "Class {} is configured more than once; the later entry replaces the earlier one",
                    query.class_name
                );
                *existing = query;
            }
            None => self.entries.push(query),
        }
    }
}

/// Builds the lookup table once at setup. Classes without fields are left out.
pub fn compile(classes: &[ClassQuery]) -> QueryTable {
    let mut table = QueryTable::default();
    for class in classes {
        match class.compile() {
            Some(query) => {
                info!("Query: {}", query.text);
                table.insert(query);
            }
            None => warn!(
                "No fields defined for class {}, skipping",
                class.class_name
            ),
        }
    }
    table
}
