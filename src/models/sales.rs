use serde::{Deserialize, Serialize};
use std::fmt;

/// One raw spreadsheet row: (column name, cell text) pairs in sheet order.
/// The first sheet row is the header and never becomes a `SheetRow`.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct SheetRow {
    fields: Vec<(String, String)>,
}

impl SheetRow {
    pub fn new(fields: Vec<(String, String)>) -> Self {
        Self { fields }
    }

    /// Cell text for a column, if the column exists in this row.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value.as_str())
    }

    /// True when every cell in the row is blank.
    pub fn is_blank(&self) -> bool {
        self.fields.iter().all(|(_, value)| value.is_empty())
    }
}

impl fmt::Display for SheetRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (name, value)) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{name}: {value}")?;
        }
        write!(f, "}}")
    }
}

/// One validated sales submission. Numeric cells arrive already coerced
/// to text because the form only takes text values.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SalesRecord {
    pub first_name: String,
    pub last_name: String,
    pub sales_target: String,
    pub sales: String,
}

impl SalesRecord {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

impl TryFrom<&SheetRow> for SalesRecord {
    type Error = String;

    fn try_from(row: &SheetRow) -> Result<Self, Self::Error> {
        let field = |column: &str| {
            row.get(column)
                .filter(|value| !value.is_empty())
                .map(str::to_owned)
                .ok_or_else(|| format!("Missing {column}"))
        };

        Ok(SalesRecord {
            first_name: field("First Name")?,
            last_name: field("Last Name")?,
            sales_target: field("Sales Target")?,
            sales: field("Sales")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_row() -> SheetRow {
        SheetRow::new(vec![
            ("First Name".to_string(), "Jane".to_string()),
            ("Last Name".to_string(), "Doe".to_string()),
            ("Sales Target".to_string(), "200".to_string()),
            ("Sales".to_string(), "250".to_string()),
        ])
    }

    #[test]
    fn converts_complete_row() {
        let record = SalesRecord::try_from(&full_row()).unwrap();
        assert_eq!(record.first_name, "Jane");
        assert_eq!(record.last_name, "Doe");
        assert_eq!(record.sales_target, "200");
        assert_eq!(record.sales, "250");
        assert_eq!(record.full_name(), "Jane Doe");
    }

    #[test]
    fn missing_column_names_the_column() {
        let row = SheetRow::new(vec![
            ("First Name".to_string(), "Jane".to_string()),
            ("Last Name".to_string(), "Doe".to_string()),
            ("Sales Target".to_string(), "200".to_string()),
        ]);
        let err = SalesRecord::try_from(&row).unwrap_err();
        assert_eq!(err, "Missing Sales");
    }

    #[test]
    fn blank_cell_counts_as_missing() {
        let row = SheetRow::new(vec![
            ("First Name".to_string(), String::new()),
            ("Last Name".to_string(), "Doe".to_string()),
            ("Sales Target".to_string(), "200".to_string()),
            ("Sales".to_string(), "250".to_string()),
        ]);
        let err = SalesRecord::try_from(&row).unwrap_err();
        assert_eq!(err, "Missing First Name");
    }

    #[test]
    fn display_lists_every_field() {
        let rendered = full_row().to_string();
        assert!(rendered.contains("First Name: Jane"));
        assert!(rendered.contains("Sales: 250"));
    }
}
