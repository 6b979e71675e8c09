//! CSV loading for the `Crops` and `Wages` tables.
//!
//! Files need a header row. Columns are matched by name, so their order is
//! free; an `id` column is optional and SQLite assigns one when absent.

use fieldhand_core::error::DatabaseError;

/// One row of the `Crops` table.
#[derive(Debug, Clone, PartialEq)]
pub struct CropRecord {
    pub id: Option<i64>,
    pub crop_name: String,
    pub month: String,
    pub year: i64,
    pub yield_amount: f64,
    pub target: f64,
}

/// One row of the `Wages` table.
#[derive(Debug, Clone, PartialEq)]
pub struct WageRecord {
    pub id: Option<i64>,
    pub employee_name: String,
    pub wage: f64,
    pub month: String,
    pub year: i64,
    pub time_worked: f64,
}

const CROP_COLUMNS: [&str; 5] = ["crop_name", "month", "year", "yield_amount", "target"];
const WAGE_COLUMNS: [&str; 5] = ["employee_name", "wage", "month", "year", "time_worked"];

/// Parse the text of a crops CSV file.
pub fn parse_crops(text: &str) -> Result<Vec<CropRecord>, DatabaseError> {
    let table = Table::parse("crops", text, &CROP_COLUMNS)?;
    table
        .rows()
        .map(|row| {
            Ok(CropRecord {
                id: row.optional_int("id")?,
                crop_name: row.text("crop_name")?,
                month: row.text("month")?,
                year: row.int("year")?,
                yield_amount: row.real("yield_amount")?,
                target: row.real("target")?,
            })
        })
        .collect()
}

/// Parse the text of a wages CSV file.
pub fn parse_wages(text: &str) -> Result<Vec<WageRecord>, DatabaseError> {
    let table = Table::parse("wages", text, &WAGE_COLUMNS)?;
    table
        .rows()
        .map(|row| {
            Ok(WageRecord {
                id: row.optional_int("id")?,
                employee_name: row.text("employee_name")?,
                wage: row.real("wage")?,
                month: row.text("month")?,
                year: row.int("year")?,
                time_worked: row.real("time_worked")?,
            })
        })
        .collect()
}

struct Table {
    source: &'static str,
    header: Vec<String>,
    records: Vec<(usize, Vec<String>)>,
}

struct Row<'t> {
    table: &'t Table,
    line: usize,
    fields: &'t [String],
}

impl Table {
    fn parse(
        source: &'static str,
        text: &str,
        required: &[&str],
    ) -> Result<Self, DatabaseError> {
        // Excel and pandas `utf-8-sig` prefix the header with a BOM.
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(text.as_bytes());

        let header: Vec<String> = reader
            .headers()
            .map_err(|e| DatabaseError::Import(format!("{source} CSV header: {e}")))?
            .iter()
            .map(|h| h.trim().to_ascii_lowercase())
            .collect();
        if header.iter().all(|h| h.is_empty()) {
            return Err(DatabaseError::Import(format!("{source} CSV is empty")));
        }

        for column in required {
            if !header.iter().any(|h| h == column) {
                return Err(DatabaseError::Import(format!(
                    "{source} CSV is missing column '{column}'"
                )));
            }
        }

        let mut records = Vec::new();
        for result in reader.records() {
            let record = result.map_err(|e| DatabaseError::Import(format!("{source} CSV: {e}")))?;
            if record.iter().all(|f| f.trim().is_empty()) {
                continue;
            }
            let line = record.position().map_or(0, |p| p.line() as usize);
            records.push((line, record.iter().map(str::to_string).collect()));
        }

        Ok(Self {
            source,
            header,
            records,
        })
    }

    fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        self.records.iter().map(|(line, fields)| Row {
            table: self,
            line: *line,
            fields,
        })
    }
}

impl Row<'_> {
    fn raw(&self, column: &str) -> Option<&str> {
        let idx = self.table.header.iter().position(|h| h == column)?;
        self.fields.get(idx).map(|f| f.trim())
    }

    fn error(&self, column: &str, reason: &str) -> DatabaseError {
        DatabaseError::Import(format!(
            "{} CSV line {}: column '{column}' {reason}",
            self.table.source, self.line
        ))
    }

    fn text(&self, column: &str) -> Result<String, DatabaseError> {
        match self.raw(column) {
            Some(v) if !v.is_empty() => Ok(v.to_string()),
            _ => Err(self.error(column, "is empty")),
        }
    }

    fn int(&self, column: &str) -> Result<i64, DatabaseError> {
        let raw = self.text(column)?;
        raw.parse::<i64>()
            .or_else(|_| {
                // pandas writes whole floats as "2023.0"
                raw.parse::<f64>()
                    .ok()
                    .filter(|f| f.fract() == 0.0)
                    .map(|f| f as i64)
                    .ok_or(())
            })
            .map_err(|_| self.error(column, &format!("is not an integer: {raw}")))
    }

    fn real(&self, column: &str) -> Result<f64, DatabaseError> {
        let raw = self.text(column)?;
        raw.parse::<f64>()
            .map_err(|_| self.error(column, &format!("is not a number: {raw}")))
    }

    fn optional_int(&self, column: &str) -> Result<Option<i64>, DatabaseError> {
        match self.raw(column) {
            None | Some("") => Ok(None),
            Some(_) => self.int(column).map(Some),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crops_in_any_column_order() {
        let text = "target,crop_name,year,month,yield_amount,id\n4.0,Wheat,2023,July,4.2,7\n";
        let rows = parse_crops(text).unwrap();
        assert_eq!(
            rows,
            vec![CropRecord {
                id: Some(7),
                crop_name: "Wheat".into(),
                month: "July".into(),
                year: 2023,
                yield_amount: 4.2,
                target: 4.0,
            }]
        );
    }

    #[test]
    fn crops_without_id_column() {
        let text = "crop_name,month,year,yield_amount,target\r\nRye,May,2022.0,3.1,3.0\r\n\r\n";
        let rows = parse_crops(text).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, None);
        assert_eq!(rows[0].year, 2022);
    }

    #[test]
    fn missing_column_is_rejected() {
        let err = parse_crops("crop_name,month,year,yield_amount\nWheat,July,2023,4.2\n")
            .unwrap_err();
        assert!(err.to_string().contains("missing column 'target'"));
    }

    #[test]
    fn bad_number_names_the_line() {
        let text = "employee_name,wage,month,year,time_worked\nAnna,lots,June,2024,160\n";
        let err = parse_wages(text).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("line 2"), "{msg}");
        assert!(msg.contains("'wage'"), "{msg}");
    }

    #[test]
    fn empty_file_is_rejected() {
        assert!(parse_wages("").is_err());
        assert_eq!(
            parse_wages("employee_name,wage,month,year,time_worked\n").unwrap(),
            vec![]
        );
    }

    #[test]
    fn quoted_fields_keep_commas_and_escapes() {
        let text = "employee_name,wage,month,year,time_worked\n\"Kowalski, \"\"Jan\"\"\",4800,May,2023,150\n";
        let rows = parse_wages(text).unwrap();
        assert_eq!(rows[0].employee_name, "Kowalski, \"Jan\"");
        assert_eq!(rows[0].wage, 4800.0);
    }

    #[test]
    fn byte_order_mark_before_header() {
        let text = "\u{feff}crop_name,month,year,yield_amount,target\nWheat,July,2023,4.2,4.0\n";
        let rows = parse_crops(text).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].crop_name, "Wheat");
    }

    #[test]
    fn quoted_newline_stays_in_one_field() {
        let text = "employee_name,wage,month,year,time_worked\n\"Nowak\nAnna\",5200,June,2024,160\nJan,4100,June,2024,150\n";
        let rows = parse_wages(text).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].employee_name, "Nowak\nAnna");
        assert_eq!(rows[0].wage, 5200.0);
        assert_eq!(rows[1].employee_name, "Jan");
    }

    #[test]
    fn lines_are_counted_across_multiline_records() {
        let text = "employee_name,wage,month,year,time_worked\n\"Nowak\nAnna\",5200,June,2024,160\nJan,lots,June,2024,150\n";
        let msg = parse_wages(text).unwrap_err().to_string();
        assert!(msg.contains("line 4"), "{msg}");
    }
}
