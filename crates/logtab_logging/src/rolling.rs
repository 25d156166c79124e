//! Size-bounded log file: `<stem>.log`, shifted to `<stem>.log.1`, `.2`, ...
//! once it would grow past the size limit.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy)]
pub(crate) struct Limits {
    /// Files kept on disk, the active one included.
    pub(crate) keep: usize,
    pub(crate) max_bytes: u64,
}

pub(crate) struct RollingLog {
    active: PathBuf,
    limits: Limits,
    file: File,
    written: u64,
}

impl RollingLog {
    pub(crate) fn open(dir: &Path, stem: &str, limits: Limits) -> io::Result<Self> {
        fs::create_dir_all(dir)?;
        let active = dir.join(format!("{}.log", sanitize_stem(stem)));
        let file = append_to(&active)?;
        let written = file.metadata()?.len();

        let mut log = Self {
            active,
            limits: Limits {
                keep: limits.keep.max(1),
                ..limits
            },
            file,
            written,
        };
        if log.written > log.limits.max_bytes {
            log.roll()?;
        }
        Ok(log)
    }

    pub(crate) fn active_path(&self) -> &Path {
        &self.active
    }

    fn archive(&self, index: usize) -> PathBuf {
        let mut name = self.active.clone().into_os_string();
        name.push(format!(".{}", index));
        PathBuf::from(name)
    }

    fn roll(&mut self) -> io::Result<()> {
        self.file.flush()?;

        let last = self.limits.keep - 1;
        if last > 0 {
            let oldest = self.archive(last);
            if oldest.exists() {
                fs::remove_file(&oldest)?;
            }
            for index in (1..last).rev() {
                let from = self.archive(index);
                if from.exists() {
                    fs::rename(&from, self.archive(index + 1))?;
                }
            }
            fs::rename(&self.active, self.archive(1))?;
        } else {
            fs::remove_file(&self.active)?;
        }

        self.file = append_to(&self.active)?;
        self.written = 0;
        Ok(())
    }
}

impl Write for RollingLog {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.written > 0 && self.written + buf.len() as u64 > self.limits.max_bytes {
            self.roll()?;
        }
        let n = self.file.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

fn append_to(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

pub(crate) fn sanitize_stem(name: &str) -> String {
    name.chars()
        .map(|ch| match ch {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' => ch,
            _ => '_',
        })
        .collect()
}
