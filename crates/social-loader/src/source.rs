//! CSV row source.
//!
//! Expected header: `user_id, gender, age, eye_color, education, hobbies,
//! languages, music, friends`. Unknown columns are ignored, missing ones read as
//! absent, and `friends` is a `;`-separated id list.

use crate::LoadError;
use csv::{ReaderBuilder, Trim};
use social_types::RawUserRow;
use std::fs::File;
use std::io::Read;
use std::path::Path;

pub struct CsvSource<R> {
    reader: csv::Reader<R>,
}

impl CsvSource<File> {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let file = File::open(path.as_ref())?;
        Ok(Self::from_reader(file))
    }
}

impl<R: Read> CsvSource<R> {
    pub fn from_reader(reader: R) -> Self {
        let reader = ReaderBuilder::new()
            .flexible(true)
            .trim(Trim::All)
            .from_reader(reader);
        Self { reader }
    }

    /// Data rows numbered from 1, in file order.
    pub fn rows(&mut self) -> impl Iterator<Item = (u64, Result<RawUserRow, csv::Error>)> + '_ {
        self.reader
            .deserialize::<RawUserRow>()
            .enumerate()
            .map(|(i, row)| (i as u64 + 1, row))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_rows_with_missing_and_extra_columns() {
        let data = "user_id,age,friends,extra\n0,25.0,1;2,x\n1,,,\n";
        let mut source = CsvSource::from_reader(data.as_bytes());
        let rows: Vec<(u64, RawUserRow)> = source
            .rows()
            .map(|(n, r)| (n, r.unwrap()))
            .collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].0, 1);
        assert_eq!(rows[0].1.age.as_deref(), Some("25.0"));
        assert_eq!(rows[0].1.friends.as_deref(), Some("1;2"));
        assert_eq!(rows[1].1.age, None);
        assert_eq!(rows[1].1.gender, None);
    }
}
