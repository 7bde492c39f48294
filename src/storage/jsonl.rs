//! JSONL (JSON Lines) files: one JSON object per line.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info, warn};

use super::StorageError;

/// JSONL file writer.
pub struct JsonlWriter<T> {
    path: PathBuf,
    _marker: PhantomData<T>,
}

impl<T: Serialize> JsonlWriter<T> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _marker: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn ensure_dir(&self) -> Result<(), StorageError> {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent)?,
            _ => {}
        }
        Ok(())
    }

    fn write_lines(&self, file: File, entities: &[T]) -> Result<usize, StorageError> {
        let mut writer = BufWriter::new(file);
        for entity in entities {
            let json = serde_json::to_string(entity)?;
            writeln!(writer, "{}", json)?;
        }
        writer.flush()?;
        Ok(entities.len())
    }

    /// Append a single entity to the file.
    pub fn append(&self, entity: &T) -> Result<(), StorageError> {
        self.append_batch(std::slice::from_ref(entity))?;
        debug!("Appended entity to {:?}", self.path);
        Ok(())
    }

    /// Append multiple entities to the file.
    pub fn append_batch(&self, entities: &[T]) -> Result<usize, StorageError> {
        if entities.is_empty() {
            return Ok(0);
        }
        self.ensure_dir()?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        self.write_lines(file, entities)
    }

    /// Write entities, replacing the entire file.
    pub fn write_all(&self, entities: &[T]) -> Result<usize, StorageError> {
        self.ensure_dir()?;

        let count = self.write_lines(File::create(&self.path)?, entities)?;
        info!("Wrote {} entities to {:?}", count, self.path);
        Ok(count)
    }
}

/// JSONL file reader.
pub struct JsonlReader<T> {
    path: PathBuf,
    _marker: PhantomData<T>,
}

impl<T: DeserializeOwned> JsonlReader<T> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _marker: PhantomData,
        }
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Read all entities; a missing file reads as empty.
    pub fn read_all(&self) -> Result<Vec<T>, StorageError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let reader = BufReader::new(File::open(&self.path)?);
        let mut entities = Vec::new();

        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str(&line) {
                Ok(entity) => entities.push(entity),
                Err(e) => warn!("Failed to parse line {} in {:?}: {}", index + 1, self.path, e),
            }
        }

        debug!("Read {} entities from {:?}", entities.len(), self.path);
        Ok(entities)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ArmyList, Quantity, Summary, Unit};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn army(title: &str, unit: &str) -> ArmyList {
        let mut list = ArmyList::new(Summary {
            list_title: title.to_string(),
            ..Default::default()
        });
        list.push_unit("CHARACTER", Unit::new(Quantity::ONE, unit, 80));
        list
    }

    #[test]
    fn test_jsonl_write_and_read() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("lists.jsonl");
        let lists = vec![army("First", "Captain"), army("Second", "Warboss")];

        let writer: JsonlWriter<ArmyList> = JsonlWriter::new(&path);
        assert_eq!(writer.write_all(&lists).unwrap(), 2);

        let reader: JsonlReader<ArmyList> = JsonlReader::new(&path);
        assert_eq!(reader.read_all().unwrap(), lists);
    }

    #[test]
    fn test_jsonl_append_creates_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested/out/lists.jsonl");

        let writer: JsonlWriter<ArmyList> = JsonlWriter::new(&path);
        writer.append(&army("First", "Captain")).unwrap();
        writer.append(&army("Second", "Warboss")).unwrap();
        assert_eq!(writer.append_batch(&[]).unwrap(), 0);

        let reader: JsonlReader<ArmyList> = JsonlReader::new(&path);
        let read = reader.read_all().unwrap();
        assert_eq!(read.len(), 2);
        assert_eq!(read[1].summary.list_title, "Second");
    }

    #[test]
    fn test_jsonl_read_missing_and_bad_lines() {
        let temp_dir = TempDir::new().unwrap();
        let missing: JsonlReader<ArmyList> = JsonlReader::new(temp_dir.path().join("none.jsonl"));
        assert!(!missing.exists());
        assert!(missing.read_all().unwrap().is_empty());

        let path = temp_dir.path().join("mixed.jsonl");
        let good = serde_json::to_string(&army("Good", "Captain")).unwrap();
        fs::write(&path, format!("{}\n\nnot json\n", good)).unwrap();
        let reader: JsonlReader<ArmyList> = JsonlReader::new(&path);
        assert_eq!(reader.read_all().unwrap().len(), 1);
    }
}
