//! Row query description
//!
//! A small builder for the row-level queries the store issues:
//! equality filters, one ordering column and an optional limit.

use crate::config;
use std::fmt;

/// Collections exposed by the hosted backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Projects,
    Tasks,
    TodoItems,
    Profiles,
}

impl Table {
    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Projects => config::PROJECTS_TABLE,
            Table::Tasks => config::TASKS_TABLE,
            Table::TodoItems => config::TODO_ITEMS_TABLE,
            Table::Profiles => config::PROFILES_TABLE,
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Asc => "asc",
            Direction::Desc => "desc",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ordering {
    pub column: String,
    pub direction: Direction,
}

/// A select over one table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub table: Table,
    pub filters: Vec<(String, String)>,
    pub order: Option<Ordering>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn select(table: Table) -> Self {
        Self {
            table,
            filters: Vec::new(),
            order: None,
            limit: None,
        }
    }

    /// Keep rows whose `column` equals `value`
    pub fn eq(mut self, column: &str, value: impl Into<String>) -> Self {
        self.filters.push((column.to_string(), value.into()));
        self
    }

    pub fn order(mut self, column: &str, direction: Direction) -> Self {
        self.order = Some(Ordering {
            column: column.to_string(),
            direction,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// PostgREST query-string pairs for this query
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = vec![("select".to_string(), "*".to_string())];

        for (column, value) in &self.filters {
            params.push((column.clone(), format!("eq.{}", value)));
        }

        if let Some(order) = &self.order {
            params.push((
                "order".to_string(),
                format!("{}.{}", order.column, order.direction.as_str()),
            ));
        }

        if let Some(limit) = self.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }

        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_params() {
        let query = Query::select(Table::TodoItems)
            .eq("task_id", "abc")
            .order("order_index", Direction::Desc)
            .limit(1);

        let params = query.to_params();
        assert_eq!(
            params,
            vec![
                ("select".to_string(), "*".to_string()),
                ("task_id".to_string(), "eq.abc".to_string()),
                ("order".to_string(), "order_index.desc".to_string()),
                ("limit".to_string(), "1".to_string()),
            ]
        );
        assert_eq!(query.table.to_string(), "todo_items");
    }
}
