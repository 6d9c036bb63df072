use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::{Arc, RwLock};

use log::info;

use crate::error::{DbError, DbResult};
use crate::heap_file::HeapFile;
use crate::tuple::TupleDesc;
use crate::types::Type::{IntType, StringType};

/// Live mapping from table name and table id to the heap file backing it.
/// Table ids are derived from the file's absolute path, so reloading the
/// same schema file across process restarts reattaches the same ids.
pub struct Catalog {
    tables: RwLock<HashMap<String, Arc<HeapFile>>>,
    table_ids: RwLock<HashMap<usize, Arc<HeapFile>>>,
    table_names: RwLock<HashMap<usize, String>>,
}

impl Catalog {
    pub fn new() -> Self {
        Catalog {
            tables: RwLock::new(HashMap::new()),
            table_ids: RwLock::new(HashMap::new()),
            table_names: RwLock::new(HashMap::new()),
        }
    }

    pub fn add_table(&self, file: HeapFile, name: String) {
        let mut tables = self.tables.write().unwrap();
        let file_id = file.get_id();
        tables.insert(name.clone(), Arc::new(file));
        let mut table_ids = self.table_ids.write().unwrap();
        table_ids.insert(file_id, Arc::clone(tables.get(&name).unwrap()));
        self.table_names.write().unwrap().insert(file_id, name);
    }

    pub fn get_table_from_name(&self, name: &str) -> Option<Arc<HeapFile>> {
        let tables = self.tables.read().unwrap();
        tables.get(name).map(Arc::clone)
    }

    pub fn get_table_from_id(&self, id: usize) -> Option<Arc<HeapFile>> {
        let table_ids = self.table_ids.read().unwrap();
        table_ids.get(&id).map(Arc::clone)
    }

    pub fn get_table_name(&self, table_id: usize) -> Option<String> {
        self.table_names.read().unwrap().get(&table_id).cloned()
    }

    /// Every registered table id, in no particular order. Mirrors the
    /// collaborator surface an external query optimizer would drive the
    /// catalog through to enumerate tables.
    pub fn table_id_iterator(&self) -> Vec<usize> {
        self.table_ids.read().unwrap().keys().copied().collect()
    }

    pub fn get_tuple_desc(&self, table_id: usize) -> Option<TupleDesc> {
        let table = self.get_table_from_id(table_id);
        table.map(|t| t.get_tuple_desc().clone())
    }

    /// Loads a schema file of `table_name (field: Type, ...)` lines,
    /// opening or creating a `data/<table_name>.dat` heap file for each
    /// and registering it under `table_name`.
    pub fn load_schema(&self, schema_file_path: &str) -> DbResult<()> {
        let schema_file = File::open(schema_file_path)?;
        let reader = BufReader::new(schema_file);
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let split_parens: Vec<&str> = line.split('(').collect();
            if split_parens.len() < 2 {
                return Err(DbError::InvalidSchema(line));
            }
            let table_name = split_parens[0].to_string().replace(' ', "");
            let path = format!("data/{}.dat", table_name);
            let file = OpenOptions::new()
                .create(true)
                .read(true)
                .write(true)
                .open(&path)?;

            let fields: Vec<&str> = split_parens[1].trim_end_matches(')').split(',').collect();
            let mut field_types = vec![];
            let mut field_names = vec![];
            for field in fields.iter() {
                let field: Vec<&str> = field.split(':').collect();
                if field.len() != 2 {
                    return Err(DbError::InvalidSchema(line.clone()));
                }
                let field_name = field[0].to_string().replace(' ', "");
                let field_type = field[1].to_string().replace(' ', "");
                let field_type = match field_type.as_str() {
                    "Int" => IntType,
                    "String" => StringType,
                    other => return Err(DbError::InvalidSchema(other.to_string())),
                };
                field_names.push(field_name);
                field_types.push(field_type);
            }
            let heap_file = HeapFile::new(file, Path::new(&path), TupleDesc::new(field_types, field_names));
            info!("loaded table {} from {}", table_name, path);
            self.add_table(heap_file, table_name);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Type;

    #[test]
    fn add_table_registers_under_both_name_and_id() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.dat");
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(&path)
            .unwrap();
        let td = TupleDesc::new(vec![Type::IntType], vec!["id".to_string()]);
        let heap_file = HeapFile::new(file, &path, td);
        let id = heap_file.get_id();

        let catalog = Catalog::new();
        catalog.add_table(heap_file, "widgets".to_string());

        assert!(catalog.get_table_from_name("widgets").is_some());
        assert!(catalog.get_table_from_id(id).is_some());
        assert_eq!(catalog.get_table_name(id), Some("widgets".to_string()));
        assert_eq!(catalog.table_id_iterator(), vec![id]);
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}
