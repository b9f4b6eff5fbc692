// src/store/attempts.rs

use std::{
    collections::{BTreeSet, HashSet},
    fs::{self, File, OpenOptions},
    io::{self, Read, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
};

use csv::{ReaderBuilder, StringRecord, WriterBuilder};

use crate::models::attempt::{Attempt, RowId};

use super::{StoreError, require_columns};

/// In-memory copy of the attempts CSV.
///
/// Rows are only ever appended. The header order of the backing file is
/// remembered so that appended rows line up with whatever column layout
/// the file was produced with.
#[derive(Debug)]
pub struct AttemptStore {
    path: PathBuf,
    headers: StringRecord,
    attempts: Vec<Attempt>,
    students: HashSet<String>,
}

impl AttemptStore {
    /// Loads the whole file into memory.
    ///
    /// A missing file, an unreadable row or a missing required column is an error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| StoreError::io(path, e))?;
        let mut reader = ReaderBuilder::new().from_reader(file);

        let headers = reader
            .headers()
            .map_err(|e| StoreError::csv(path, e))?
            .clone();
        require_columns(path, &headers, &Attempt::COLUMNS)?;

        let mut attempts = Vec::new();
        for row in reader.deserialize::<Attempt>() {
            attempts.push(row.map_err(|e| StoreError::csv(path, e))?);
        }

        let students = attempts.iter().map(|a| a.student_id.clone()).collect();

        tracing::info!("Loaded {} attempts from {}", attempts.len(), path.display());

        Ok(Self {
            path: path.to_path_buf(),
            headers,
            attempts,
            students,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.attempts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attempts.is_empty()
    }

    pub fn attempts(&self) -> &[Attempt] {
        &self.attempts
    }

    pub fn get(&self, row: RowId) -> Option<&Attempt> {
        self.attempts.get(row)
    }

    pub fn contains_student(&self, student_id: &str) -> bool {
        self.students.contains(student_id)
    }

    pub fn student_count(&self) -> usize {
        self.students.len()
    }

    /// Rows of one student in file order, paired with their row ids.
    pub fn for_student<'a>(
        &'a self,
        student_id: &'a str,
    ) -> impl Iterator<Item = (RowId, &'a Attempt)> + 'a {
        self.attempts
            .iter()
            .enumerate()
            .filter(move |(_, a)| a.student_id == student_id)
    }

    /// Distinct topics across all rows.
    pub fn topics(&self) -> BTreeSet<String> {
        self.attempts.iter().map(|a| a.topic.clone()).collect()
    }

    /// Appends `rows` to the backing file, then to memory.
    ///
    /// The file is flushed and synced before memory is touched, so a failed
    /// write leaves the in-memory table exactly as it was. Bytes of a failed
    /// batch that did reach the file are cut off again.
    pub fn append(&mut self, rows: Vec<Attempt>) -> Result<(), StoreError> {
        if rows.is_empty() {
            return Ok(());
        }

        let mut file = OpenOptions::new()
            .read(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| StoreError::io(&self.path, e))?;
        let original_len = file
            .metadata()
            .map_err(|e| StoreError::io(&self.path, e))?
            .len();

        let mut buf = Vec::new();
        // A last record without a line terminator would swallow the first new row.
        if !ends_with_newline(&mut file, original_len).map_err(|e| StoreError::io(&self.path, e))? {
            buf.push(b'\n');
        }
        buf.extend(self.encode_rows(&rows, false)?);

        if let Err(e) = (&file).write_all(&buf).and_then(|_| file.sync_data()) {
            self.rollback(&file, original_len);
            return Err(StoreError::io(&self.path, e));
        }

        for row in &rows {
            self.students.insert(row.student_id.clone());
        }
        let count = rows.len();
        self.attempts.extend(rows);

        tracing::debug!("Appended {} attempts (total {})", count, self.attempts.len());
        Ok(())
    }

    /// Restores the file to `original_len` bytes after a failed append.
    ///
    /// Falls back to a full rewrite from memory when the file cannot be
    /// truncated.
    fn rollback(&self, file: &File, original_len: u64) {
        match file.set_len(original_len) {
            Ok(()) => {
                tracing::warn!("Rolled {} back to {} bytes", self.path.display(), original_len);
            }
            Err(e) => {
                tracing::error!("Failed to truncate {}: {}", self.path.display(), e);
                if let Err(e) = self.persist() {
                    tracing::error!("Failed to rewrite {}: {}", self.path.display(), e);
                }
            }
        }
    }

    /// Rewrites the whole backing file from memory.
    ///
    /// Writes a sibling temporary file and renames it over the original, so
    /// readers never observe a half-written table.
    pub fn persist(&self) -> Result<(), StoreError> {
        let buf = self.encode_rows(&self.attempts, true)?;
        let tmp = self.path.with_extension("csv.tmp");

        let mut file = File::create(&tmp).map_err(|e| StoreError::io(&tmp, e))?;
        file.write_all(&buf)
            .and_then(|_| file.sync_all())
            .map_err(|e| StoreError::io(&tmp, e))?;
        fs::rename(&tmp, &self.path).map_err(|e| StoreError::io(&self.path, e))?;

        tracing::info!("Persisted {} attempts to {}", self.attempts.len(), self.path.display());
        Ok(())
    }

    fn encode_rows(&self, rows: &[Attempt], with_headers: bool) -> Result<Vec<u8>, StoreError> {
        let mut writer = WriterBuilder::new().has_headers(false).from_writer(Vec::new());

        if with_headers {
            writer
                .write_record(&self.headers)
                .map_err(|e| StoreError::csv(&self.path, e))?;
        }
        for row in rows {
            let record: Vec<String> = self.headers.iter().map(|col| row.column_value(col)).collect();
            writer
                .write_record(&record)
                .map_err(|e| StoreError::csv(&self.path, e))?;
        }

        writer
            .into_inner()
            .map_err(|e| StoreError::io(&self.path, e.into_error()))
    }
}

/// True for an empty file or one whose last byte is `\n`.
fn ends_with_newline(file: &mut File, len: u64) -> io::Result<bool> {
    if len == 0 {
        return Ok(true);
    }
    let mut last = [0u8; 1];
    file.seek(SeekFrom::Start(len - 1))?;
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}
