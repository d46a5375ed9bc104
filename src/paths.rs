//! Filesystem helpers for imaging data directories
//!
//! Imaging runs land on disk as trees of FOV folders and single-channel
//! image files. These helpers list and validate those trees and normalize
//! the names found in them.

use std::path::{Path, PathBuf};

use crate::error::{FovkitError, Result};
use crate::models::known_extensions;

/// Check that every path exists.
///
/// A missing intermediate directory and a missing terminal file produce
/// different errors, so callers can tell a mistyped tree root from a
/// missing image.
pub fn validate_paths<P: AsRef<Path>>(paths: &[P]) -> Result<()> {
    for path in paths {
        let path = path.as_ref();
        if path.exists() {
            continue;
        }

        let mut probe = PathBuf::new();
        for component in path.components() {
            probe.push(component);
            if !probe.exists() {
                if probe == path {
                    return Err(FovkitError::missing_file(path));
                }
                return Err(FovkitError::BadPath {
                    path: path.to_path_buf(),
                    component: component.as_os_str().to_string_lossy().into_owned(),
                });
            }
        }

        // every component resolved but the full path does not (broken link)
        return Err(FovkitError::missing_file(path));
    }

    Ok(())
}

/// List plain files in a directory (non-recursive).
///
/// With `substrs = None` all files are returned. In fuzzy mode a file
/// matches when its name contains any of the substrings; in exact mode its
/// stem (name minus the final extension) must equal one of them. Hidden
/// entries (leading `.`) are skipped unless `ignore_hidden` is false.
pub fn list_files(
    dir: impl AsRef<Path>,
    substrs: Option<&[&str]>,
    exact_match: bool,
    ignore_hidden: bool,
) -> Result<Vec<String>> {
    let names = list_entries(dir.as_ref(), true, ignore_hidden)?;
    Ok(filter_names(names, substrs, exact_match))
}

/// List directories in a directory (non-recursive).
///
/// Unlike [`list_files`], fuzzy folder matching is aligned to segment
/// boundaries: `_txt` matches `othertf_txt` but `other` does not, since run
/// and FOV folder names are delimiter-separated. Exact mode compares the
/// whole folder name.
pub fn list_folders(
    dir: impl AsRef<Path>,
    substrs: Option<&[&str]>,
    exact_match: bool,
    ignore_hidden: bool,
) -> Result<Vec<String>> {
    let names = list_entries(dir.as_ref(), false, ignore_hidden)?;
    let Some(substrs) = substrs else {
        return Ok(names);
    };
    Ok(names
        .into_iter()
        .filter(|name| {
            if exact_match {
                substrs.iter().any(|substr| substr == name)
            } else {
                substrs.iter().any(|substr| matches_segments(name, substr))
            }
        })
        .collect())
}

/// Substring match aligned to segment boundaries: each end of the match must
/// sit at the start/end of the folder name or against a separator character
/// (which may come from the substring itself).
fn matches_segments(folder: &str, substr: &str) -> bool {
    if substr.is_empty() {
        return false;
    }
    let separator = |byte: u8| !byte.is_ascii_alphanumeric();
    let bytes = folder.as_bytes();
    let sub = substr.as_bytes();
    for (index, _) in folder.match_indices(substr) {
        let end = index + substr.len();
        let start_ok = index == 0 || separator(bytes[index - 1]) || separator(sub[0]);
        let end_ok = end == folder.len() || separator(bytes[end]) || separator(sub[sub.len() - 1]);
        if start_ok && end_ok {
            return true;
        }
    }
    false
}

fn list_entries(dir: &Path, want_files: bool, ignore_hidden: bool) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in walkdir::WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry?;
        if entry.file_type().is_file() != want_files {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if ignore_hidden && name.starts_with('.') {
            continue;
        }
        names.push(name);
    }
    Ok(names)
}

fn filter_names(names: Vec<String>, substrs: Option<&[&str]>, exact_match: bool) -> Vec<String> {
    let Some(substrs) = substrs else {
        return names;
    };
    names
        .into_iter()
        .filter(|name| {
            if exact_match {
                let (stem, _) = split_extension(name);
                substrs.iter().any(|substr| *substr == stem)
            } else {
                substrs.iter().any(|substr| name.contains(substr))
            }
        })
        .collect()
}

/// Split a file name into (stem, extension), treating a leading dot as part
/// of the name rather than an extension separator
fn split_extension(name: &str) -> (&str, Option<&str>) {
    match name.rfind('.') {
        Some(index) if index > 0 => (&name[..index], Some(&name[index + 1..])),
        _ => (name, None),
    }
}

/// Strip recognized file extensions from a list of names.
///
/// Only the final extension is removed, and only when it is one of the
/// [known extensions](known_extensions) (or empty); an unrecognized suffix
/// like `fov.4` is kept intact. Names that still contain a `.` afterwards
/// are reported with a warning since they usually indicate surprising file
/// names.
pub fn remove_file_extensions<S: AsRef<str>>(files: &[S]) -> Vec<String> {
    let mut stripped = Vec::with_capacity(files.len());
    for file in files {
        let name = file.as_ref();
        let (stem, ext) = split_extension(name);
        let recognized = match ext {
            Some(ext) if !ext.is_empty() => {
                known_extensions().any(|known| ext.eq_ignore_ascii_case(known))
            }
            _ => true,
        };
        stripped.push(if recognized { stem.to_string() } else { name.to_string() });
    }

    let leftover: Vec<&str> = stripped
        .iter()
        .filter(|name| name.contains('.'))
        .map(|name| name.as_str())
        .collect();
    if !leftover.is_empty() {
        tracing::warn!(
            "these names still contain '.' after extension removal: {}; double check them",
            leftover.join(", ")
        );
    }

    stripped
}

/// Take the prefix before the first occurrence of `delimiter` in each name.
///
/// With `delimiter = None` the names are returned unchanged. When the
/// delimiter is mandatory (`delimiter_optional = false`), names that do not
/// contain it are reported with a warning.
pub fn extract_delimited_names<S: AsRef<str>>(
    names: &[S],
    delimiter: Option<&str>,
    delimiter_optional: bool,
) -> Vec<String> {
    let Some(delimiter) = delimiter else {
        return names.iter().map(|name| name.as_ref().to_string()).collect();
    };

    let missing: Vec<&str> = names
        .iter()
        .map(|name| name.as_ref())
        .filter(|name| !name.contains(delimiter))
        .collect();
    if !missing.is_empty() && !delimiter_optional {
        tracing::warn!(
            "the following names do not contain the mandatory delimiter '{}': {}",
            delimiter,
            missing.join(", ")
        );
    }

    names
        .iter()
        .map(|name| {
            let name = name.as_ref();
            name.split(delimiter).next().unwrap_or(name).to_string()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) {
        fs::File::create(dir.join(name)).unwrap();
    }

    #[test]
    fn test_validate_paths() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("real_subdirectory")).unwrap();

        // valid single path and multiple paths
        validate_paths(&[temp.path()]).unwrap();
        validate_paths(&[temp.path().to_path_buf(), temp.path().join("real_subdirectory")]).unwrap();

        // missing intermediate folder
        let bad_middle = temp.path().join("not_a_real_subdirectory").join("child");
        let err = validate_paths(&[bad_middle]).unwrap_err();
        assert!(matches!(err, FovkitError::BadPath { .. }));
        assert!(err.to_string().contains("not_a_real_subdirectory"));

        // existing parents, missing terminal file
        let wrong_file = temp.path().join("real_subdirectory").join("not_a_real_file.tiff");
        let err = validate_paths(&[wrong_file]).unwrap_err();
        assert!(matches!(err, FovkitError::MissingFile { .. }));
        assert!(err.to_string().contains("not_a_real_file"));
    }

    #[test]
    fn test_list_files() {
        let temp = TempDir::new().unwrap();
        for name in [
            "tf.txt",
            "othertf.txt",
            "test.out",
            "test.csv",
            "._fov-1-scan-1.json",
            "._fov-1-scan-1_pulse_heights.csv",
        ] {
            touch(temp.path(), name);
        }
        // folders are not picked up
        fs::create_dir(temp.path().join("badfolder_test")).unwrap();

        let mut all = list_files(temp.path(), None, false, true).unwrap();
        all.sort();
        assert_eq!(all, vec!["othertf.txt", "test.csv", "test.out", "tf.txt"]);

        let mut txt = list_files(temp.path(), Some(&[".txt"]), false, true).unwrap();
        txt.sort();
        assert_eq!(txt, vec!["othertf.txt", "tf.txt"]);

        let mut both = list_files(temp.path(), Some(&[".txt", ".out"]), false, true).unwrap();
        both.sort();
        assert_eq!(both, vec!["othertf.txt", "test.out", "tf.txt"]);

        let mut hidden = list_files(temp.path(), Some(&["fov-1"]), false, false).unwrap();
        hidden.sort();
        assert_eq!(
            hidden,
            vec!["._fov-1-scan-1.json", "._fov-1-scan-1_pulse_heights.csv"]
        );
    }

    #[test]
    fn test_list_files_exact_match() {
        let temp = TempDir::new().unwrap();
        for name in [".chan-metadata.tiff", "chan0.tiff", "chan.tiff", "c.tiff"] {
            touch(temp.path(), name);
        }
        fs::create_dir(temp.path().join("badfolder_test")).unwrap();

        let mut all = list_files(temp.path(), None, true, true).unwrap();
        all.sort();
        assert_eq!(all, vec!["c.tiff", "chan.tiff", "chan0.tiff"]);

        let single = list_files(temp.path(), Some(&["c"]), true, true).unwrap();
        assert_eq!(single, vec!["c.tiff"]);

        let mut multiple = list_files(temp.path(), Some(&["c", "chan"]), true, true).unwrap();
        multiple.sort();
        assert_eq!(multiple, vec!["c.tiff", "chan.tiff"]);

        let hidden = list_files(temp.path(), Some(&[".chan-metadata"]), true, false).unwrap();
        assert_eq!(hidden, vec![".chan-metadata.tiff"]);
    }

    #[test]
    fn test_list_folders() {
        let temp = TempDir::new().unwrap();
        let dirnames = [
            "tf_txt",
            "othertf_txt",
            "test_csv",
            "test_out",
            "test_csv1",
            "test_csv2",
            "Ntest_csv",
            ".hidden_dir",
        ];
        for dirname in dirnames {
            fs::create_dir(temp.path().join(dirname)).unwrap();
        }
        // files are not picked up
        touch(temp.path(), "test_badfile.txt");

        let mut all = list_folders(temp.path(), None, false, true).unwrap();
        all.sort();
        let mut expected = vec![
            "Ntest_csv",
            "othertf_txt",
            "test_csv",
            "test_csv1",
            "test_csv2",
            "test_out",
            "tf_txt",
        ];
        expected.sort_unstable();
        assert_eq!(all, expected);

        let mut txt = list_folders(temp.path(), Some(&["_txt"]), false, true).unwrap();
        txt.sort();
        assert_eq!(txt, vec!["othertf_txt", "tf_txt"]);

        // segment alignment: "test_" anchors at a boundary, "other" does not
        let mut fuzzy = list_folders(temp.path(), Some(&["test_", "other"]), false, true).unwrap();
        fuzzy.sort();
        assert_eq!(fuzzy, vec!["test_csv", "test_csv1", "test_csv2", "test_out"]);

        let hidden = list_folders(temp.path(), Some(&["hidden"]), false, false).unwrap();
        assert_eq!(hidden, vec![".hidden_dir"]);

        // exact matching only returns the folder whose full name matches
        let exact = list_folders(temp.path(), Some(&["test_csv"]), true, true).unwrap();
        assert_eq!(exact, vec!["test_csv"]);

        let mut exact_two = list_folders(temp.path(), Some(&["tf_txt", "othertf_txt"]), true, true).unwrap();
        exact_two.sort();
        assert_eq!(exact_two, vec!["othertf_txt", "tf_txt"]);

        let exact_hidden = list_folders(temp.path(), Some(&[".hidden_dir"]), true, false).unwrap();
        assert_eq!(exact_hidden, vec![".hidden_dir"]);
    }

    #[test]
    fn test_remove_file_extensions() {
        let files = ["fov1.tiff", "fov2.tiff", "fov3.png", "fov4.jpg", "fov5.bin", "fov6.json"];
        assert_eq!(
            remove_file_extensions(&files),
            vec!["fov1", "fov2", "fov3", "fov4", "fov5", "fov6"]
        );

        let empty: [&str; 0] = [];
        assert!(remove_file_extensions(&empty).is_empty());

        // the archive suffix is recognized, leaving a dotted stem behind
        assert_eq!(
            remove_file_extensions(&["fov5.tar.gz", "fov6.sample.csv"]),
            vec!["fov5.tar", "fov6.sample"]
        );

        // unrecognized suffixes are kept
        assert_eq!(
            remove_file_extensions(&["fov.1.tiff", "fov.2.tiff", "fov.3.png", "fov.4"]),
            vec!["fov.1", "fov.2", "fov.3", "fov.4"]
        );
    }

    #[test]
    fn test_extract_delimited_names() {
        let names = ["fov1_restofname", "fov2"];
        assert_eq!(
            extract_delimited_names(&names, Some("_"), true),
            vec!["fov1", "fov2"]
        );

        // no delimiter given: names pass through
        assert_eq!(
            extract_delimited_names(&names, None, true),
            vec!["fov1_restofname", "fov2"]
        );

        let empty: [&str; 0] = [];
        assert!(extract_delimited_names(&empty, Some("_"), true).is_empty());

        // mandatory delimiter missing only warns, output is unchanged
        assert_eq!(extract_delimited_names(&["fov2"], Some("_"), false), vec!["fov2"]);
    }

    #[test]
    fn test_split_extension() {
        assert_eq!(split_extension("a.b.c"), ("a.b", Some("c")));
        assert_eq!(split_extension(".hidden"), (".hidden", None));
        assert_eq!(split_extension("plain"), ("plain", None));
        assert_eq!(split_extension(".chan-metadata.tiff"), (".chan-metadata", Some("tiff")));
    }
}
