//! JSON file helpers.

use std::fs;
use std::fs::File;
use std::io::{BufReader, BufWriter, Error};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{from_reader, to_writer_pretty};

/// Reads a JSON-encoded type from a given file `path`.
pub fn read_json<D: DeserializeOwned>(path: impl AsRef<Path>) -> Result<D, Error> {
    let reader = BufReader::new(File::open(path)?);
    Ok(from_reader(reader)?)
}

/// JSON-encodes `value` in pretty-printed form and writes it to `path`, replacing any existing file.
pub fn write_json(path: impl AsRef<Path>, value: &impl Serialize) -> Result<(), Error> {
    let writer = BufWriter::new(File::create(path)?);
    Ok(to_writer_pretty(writer, value)?)
}

/// Lists the `.json` files under `path`, descending into subdirectories. If `path` is itself a file, it is
/// returned as the sole entry regardless of its extension. Entries are sorted so that repeated
/// listings of the same tree are identical.
pub fn json_files(path: impl AsRef<Path>) -> Result<Vec<PathBuf>, Error> {
    let path = path.as_ref();
    if !fs::metadata(path)?.is_dir() {
        return Ok(vec![path.to_path_buf()]);
    }
    let mut files = vec![];
    collect_json(path.to_path_buf(), &mut files)?;
    files.sort();
    Ok(files)
}

fn collect_json(path: PathBuf, files: &mut Vec<PathBuf>) -> Result<(), Error> {
    if fs::metadata(&path)?.is_dir() {
        for entry in fs::read_dir(path)? {
            collect_json(entry?.path(), files)?;
        }
    } else if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json")) {
        files.push(path);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::env;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = env::temp_dir().join(format!("linesman-file-{name}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn write_then_read() {
        let dir = scratch_dir("roundtrip");
        let path = dir.join("rules.json");
        let rules = BTreeMap::from([("rec".to_string(), 1.0), ("rush_yd".to_string(), 0.1)]);
        write_json(&path, &rules).unwrap();
        let read: BTreeMap<String, f64> = read_json(&path).unwrap();
        assert_eq!(rules, read);
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn lists_json_files_recursively() {
        let dir = scratch_dir("listing");
        fs::create_dir_all(dir.join("week1")).unwrap();
        fs::write(dir.join("b.json"), "{}").unwrap();
        fs::write(dir.join("a.JSON"), "{}").unwrap();
        fs::write(dir.join("notes.txt"), "").unwrap();
        fs::write(dir.join("week1").join("c.json"), "{}").unwrap();

        let files = json_files(&dir).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|file| file.strip_prefix(&dir).unwrap().to_string_lossy().replace('\\', "/"))
            .collect();
        assert_eq!(vec!["a.JSON", "b.json", "week1/c.json"], names);

        let single = json_files(dir.join("notes.txt")).unwrap();
        assert_eq!(vec![dir.join("notes.txt")], single);
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn missing_path() {
        assert!(json_files("/nonexistent/linesman").is_err());
        assert!(read_json::<BTreeMap<String, f64>>("/nonexistent/linesman.json").is_err());
    }
}
