//! Cubit kernel driven through batch journals.
//!
//! Commands are recorded into `<journal_dir>/<label>.jou` and played back by
//! `cubit -batch -nographics -nojournal` when the session closes. Entity ids
//! are only known during playback, so [`CadSession::last_created`] binds an
//! APREPRO variable with `#{var = Id("volume")}` and later commands refer to
//! it as `{var}`.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::kernel::{CadError, CadKernel, CadSession, EntityKind, KernelId};

/// Playback stops at the first failing command.
const JOURNAL_HEADER: &str = "journal errorabort on";

/// Cubit executable plus the directory journals are written to.
#[derive(Debug, Clone)]
pub struct CubitJournal {
    program: String,
    extra_args: Vec<String>,
    journal_dir: PathBuf,
}

impl CubitJournal {
    pub fn new(program: impl Into<String>, journal_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            extra_args: Vec::new(),
            journal_dir: journal_dir.into(),
        }
    }

    /// Additional command-line arguments passed before the journal path.
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.extra_args = args;
        self
    }

    pub fn journal_dir(&self) -> &Path {
        &self.journal_dir
    }

    fn play(&self, journal: &Path) -> Result<(), CadError> {
        log::info!("Playing {} with {}", journal.display(), self.program);
        let output = Command::new(&self.program)
            .args(&self.extra_args)
            .args(["-batch", "-nographics", "-nojournal"])
            .arg(journal)
            .output()
            .map_err(|source| CadError::Launch {
                program: self.program.clone(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        if let Some(line) = stdout
            .lines()
            .chain(stderr.lines())
            .find(|l| l.trim_start().starts_with("ERROR:"))
        {
            return Err(CadError::Kernel(line.trim().to_string()));
        }
        if !output.status.success() {
            return Err(CadError::Kernel(format!(
                "{} exited with {}",
                self.program, output.status
            )));
        }
        Ok(())
    }
}

impl CadKernel for CubitJournal {
    fn name(&self) -> &str {
        "cubit"
    }

    fn open<'a>(&'a self, label: &str) -> Result<Box<dyn CadSession + 'a>, CadError> {
        Ok(Box::new(JournalSession {
            kernel: self,
            path: self.journal_dir.join(format!("{}.jou", label)),
            lines: vec![JOURNAL_HEADER.to_string()],
            bindings: 0,
        }))
    }
}

struct JournalSession<'a> {
    kernel: &'a CubitJournal,
    path: PathBuf,
    lines: Vec<String>,
    bindings: usize,
}

impl CadSession for JournalSession<'_> {
    fn execute(&mut self, command: &str) -> Result<(), CadError> {
        if command.contains('\n') {
            return Err(CadError::Command {
                command: command.to_string(),
                message: "journal commands must fit on one line".into(),
            });
        }
        self.lines.push(command.to_string());
        Ok(())
    }

    fn last_created(&mut self, kind: EntityKind) -> Result<KernelId, CadError> {
        self.bindings += 1;
        let var = format!("{}_{}", kind.keyword(), self.bindings);
        self.lines
            .push(format!("#{{{} = Id(\"{}\")}}", var, kind.keyword()));
        Ok(KernelId::Deferred(var))
    }

    fn close(self: Box<Self>) -> Result<(), CadError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| CadError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let mut content = self.lines.join("\n");
        content.push('\n');
        std::fs::write(&self.path, content).map_err(|source| CadError::Io {
            path: self.path.clone(),
            source,
        })?;
        self.kernel.play(&self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_journal_binds_ids_and_reports_launch_failure() {
        let dir = std::env::temp_dir().join(format!("godiva-cubit-{}", std::process::id()));
        let kernel = CubitJournal::new("/nonexistent/cubit-binary", &dir);

        let mut session = kernel.open("shells").unwrap();
        session.execute("create sphere radius 1").unwrap();
        let id = session.last_created(EntityKind::Volume).unwrap();
        assert_eq!(id, KernelId::Deferred("volume_1".into()));
        session.execute(&format!("volume {} id 1", id)).unwrap();
        assert!(session.execute("reset\nreset").is_err());

        let err = session.close().unwrap_err();
        assert!(matches!(err, CadError::Launch { .. }));

        let journal = std::fs::read_to_string(dir.join("shells.jou")).unwrap();
        let lines: Vec<&str> = journal.lines().collect();
        assert_eq!(
            lines,
            vec![
                "journal errorabort on",
                "create sphere radius 1",
                "#{volume_1 = Id(\"volume\")}",
                "volume {volume_1} id 1",
            ]
        );
    }
}
