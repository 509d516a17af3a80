use std::path::{Path, PathBuf};

use time::macros::format_description;
use time::OffsetDateTime;

/// Hands out capture file names of the form `Scr_YYYY-MM-DD_HH-MM-SS.ext`.
///
/// A second capture within the same wall-clock second gets a `_1` suffix, the
/// next `_2` and so on. Names of files that already exist are skipped.
#[derive(Debug, Default)]
pub struct CaptureNamer {
    last_second: Option<i64>,
    counter: u32,
}

impl CaptureNamer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next free path in `dir` for the current local time.
    pub fn next_path(&mut self, dir: &Path, ext: &str) -> PathBuf {
        let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
        self.path_at(dir, ext, now)
    }

    pub fn path_at(&mut self, dir: &Path, ext: &str, at: OffsetDateTime) -> PathBuf {
        let second = at.unix_timestamp();
        if self.last_second == Some(second) {
            self.counter += 1;
        } else {
            self.last_second = Some(second);
            self.counter = 0;
        }

        let stamp = at
            .format(format_description!("[year]-[month]-[day]_[hour]-[minute]-[second]"))
            .unwrap_or_else(|_| second.to_string());

        loop {
            let name = match self.counter {
                0 => format!("Scr_{stamp}.{ext}"),
                n => format!("Scr_{stamp}_{n}.{ext}"),
            };

            let path = dir.join(name);
            if !path.exists() {
                return path;
            }
            self.counter += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    #[test]
    fn same_second_gets_a_suffix() {
        let dir = tempfile::tempdir().unwrap();
        let mut namer = CaptureNamer::new();
        let at = datetime!(2024-03-05 07:08:09 UTC);

        let first = namer.path_at(dir.path(), "png", at);
        let second = namer.path_at(dir.path(), "png", at);
        let third = namer.path_at(dir.path(), "gif", at);

        assert_eq!(first.file_name().unwrap(), "Scr_2024-03-05_07-08-09.png");
        assert_eq!(second.file_name().unwrap(), "Scr_2024-03-05_07-08-09_1.png");
        assert_eq!(third.file_name().unwrap(), "Scr_2024-03-05_07-08-09_2.gif");
    }

    #[test]
    fn a_new_second_resets_the_counter() {
        let dir = tempfile::tempdir().unwrap();
        let mut namer = CaptureNamer::new();

        namer.path_at(dir.path(), "png", datetime!(2024-03-05 07:08:09 UTC));
        namer.path_at(dir.path(), "png", datetime!(2024-03-05 07:08:09 UTC));
        let next = namer.path_at(dir.path(), "png", datetime!(2024-03-05 07:08:10 UTC));
        assert_eq!(next.file_name().unwrap(), "Scr_2024-03-05_07-08-10.png");
    }

    #[test]
    fn existing_files_are_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Scr_2024-03-05_07-08-09.png"), b"x").unwrap();

        let mut namer = CaptureNamer::new();
        let path = namer.path_at(dir.path(), "png", datetime!(2024-03-05 07:08:09 UTC));
        assert_eq!(path.file_name().unwrap(), "Scr_2024-03-05_07-08-09_1.png");
    }
}
