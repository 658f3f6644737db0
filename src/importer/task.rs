//! Running an import on a worker thread

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;
use std::thread;

use tracing::{debug, error, warn};

use crate::error::{BooksError, BooksResult};
use crate::models::BookUid;
use crate::storage::Storage;

use super::BookImporter;

/// Final result of an import
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportOutcome {
    Succeeded { book_uid: BookUid },
    Failed { message: String },
}

impl ImportOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }

    pub fn book_uid(&self) -> Option<&BookUid> {
        match self {
            Self::Succeeded { book_uid } => Some(book_uid),
            Self::Failed { .. } => None,
        }
    }
}

/// Where an import stands, as seen from the thread that started it
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ImportState {
    #[default]
    Idle,
    Importing,
    Succeeded(BookUid),
    Failed(String),
}

impl From<&ImportOutcome> for ImportState {
    fn from(outcome: &ImportOutcome) -> Self {
        match outcome {
            ImportOutcome::Succeeded { book_uid } => Self::Succeeded(book_uid.clone()),
            ImportOutcome::Failed { message } => Self::Failed(message.clone()),
        }
    }
}

/// An import running on its worker thread
///
/// There is no cancellation; the worker always runs to completion.
pub struct PendingImport {
    receiver: Receiver<ImportOutcome>,
    handle: Option<thread::JoinHandle<()>>,
    state: ImportState,
}

impl PendingImport {
    /// Start importing `source` on a new thread
    pub fn spawn(
        importer: Arc<dyn BookImporter>,
        storage: Arc<Storage>,
        source: PathBuf,
    ) -> BooksResult<Self> {
        let (sender, receiver) = mpsc::channel();

        let handle = thread::Builder::new()
            .name("book-import".into())
            .spawn(move || {
                let result =
                    panic::catch_unwind(AssertUnwindSafe(|| importer.import_book(&storage, &source)));

                let outcome = match result {
                    Ok(Ok(book_uid)) => ImportOutcome::Succeeded { book_uid },
                    Ok(Err(e)) => {
                        error!(source = %source.display(), error = %e, "Import failed");
                        ImportOutcome::Failed {
                            message: e.to_string(),
                        }
                    }
                    Err(payload) => {
                        let message = format!("Importer panicked: {}", panic_message(&*payload));
                        error!(source = %source.display(), "{}", message);
                        ImportOutcome::Failed { message }
                    }
                };

                if sender.send(outcome).is_err() {
                    debug!(source = %source.display(), "Import handle dropped before the outcome was delivered");
                }
            })
            .map_err(|e| BooksError::Import(format!("Failed to start import worker: {}", e)))?;

        Ok(Self {
            receiver,
            handle: Some(handle),
            state: ImportState::Importing,
        })
    }

    pub fn state(&self) -> &ImportState {
        &self.state
    }

    /// Non-blocking poll; `Some` exactly once, when the worker has finished
    pub fn try_complete(&mut self) -> Option<ImportOutcome> {
        if self.state != ImportState::Importing {
            return None;
        }

        let outcome = match self.receiver.try_recv() {
            Ok(outcome) => outcome,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => worker_vanished(),
        };
        Some(self.finish(outcome))
    }

    /// Block until the worker has finished
    pub fn wait(mut self) -> ImportOutcome {
        if let Some(outcome) = self.completed_outcome() {
            return outcome;
        }
        let outcome = self.receiver.recv().unwrap_or_else(|_| worker_vanished());
        self.finish(outcome)
    }

    fn completed_outcome(&self) -> Option<ImportOutcome> {
        match &self.state {
            ImportState::Succeeded(book_uid) => Some(ImportOutcome::Succeeded {
                book_uid: book_uid.clone(),
            }),
            ImportState::Failed(message) => Some(ImportOutcome::Failed {
                message: message.clone(),
            }),
            ImportState::Idle | ImportState::Importing => None,
        }
    }

    fn finish(&mut self, outcome: ImportOutcome) -> ImportOutcome {
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("Import worker panicked after reporting its result");
            }
        }
        self.state = ImportState::from(&outcome);
        outcome
    }
}

fn worker_vanished() -> ImportOutcome {
    ImportOutcome::Failed {
        message: "Import worker exited without a result".into(),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::BookPaths;
    use std::path::Path;
    use std::time::Duration;
    use tempfile::TempDir;

    struct FixedImporter(BooksResult<BookUid>);

    impl BookImporter for FixedImporter {
        fn import_book(&self, _storage: &Storage, _source: &Path) -> BooksResult<BookUid> {
            match &self.0 {
                Ok(uid) => Ok(uid.clone()),
                Err(e) => Err(BooksError::Import(e.to_string())),
            }
        }
    }

    struct PanickingImporter;

    impl BookImporter for PanickingImporter {
        fn import_book(&self, _storage: &Storage, _source: &Path) -> BooksResult<BookUid> {
            panic!("parser exploded")
        }
    }

    fn storage() -> (Arc<Storage>, TempDir) {
        let temp = TempDir::new().unwrap();
        let storage = Storage::open(BookPaths::with_base_dir(temp.path().to_path_buf())).unwrap();
        (Arc::new(storage), temp)
    }

    #[test]
    fn test_success_outcome() {
        let (storage, _temp) = storage();
        let importer = Arc::new(FixedImporter(Ok(BookUid::from("imported"))));

        let pending = PendingImport::spawn(importer, storage, PathBuf::from("x.json")).unwrap();
        assert_eq!(pending.state(), &ImportState::Importing);

        let outcome = pending.wait();
        assert_eq!(
            outcome,
            ImportOutcome::Succeeded {
                book_uid: BookUid::from("imported")
            }
        );
    }

    #[test]
    fn test_error_becomes_failed() {
        let (storage, _temp) = storage();
        let importer = Arc::new(FixedImporter(Err(BooksError::Import("bad file".into()))));

        let outcome = PendingImport::spawn(importer, storage, PathBuf::from("x.json"))
            .unwrap()
            .wait();

        match outcome {
            ImportOutcome::Failed { message } => assert!(message.contains("bad file")),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_panic_becomes_failed() {
        let (storage, _temp) = storage();

        let outcome = PendingImport::spawn(Arc::new(PanickingImporter), storage, PathBuf::from("x"))
            .unwrap()
            .wait();

        assert!(!outcome.is_success());
        assert!(matches!(
            outcome,
            ImportOutcome::Failed { ref message } if message.contains("parser exploded")
        ));
    }

    #[test]
    fn test_try_complete_reports_once() {
        let (storage, _temp) = storage();
        let importer = Arc::new(FixedImporter(Ok(BookUid::from("polled"))));
        let mut pending = PendingImport::spawn(importer, storage, PathBuf::from("x")).unwrap();

        let outcome = loop {
            if let Some(outcome) = pending.try_complete() {
                break outcome;
            }
            thread::sleep(Duration::from_millis(5));
        };

        assert_eq!(outcome.book_uid(), Some(&BookUid::from("polled")));
        assert_eq!(pending.state(), &ImportState::Succeeded(BookUid::from("polled")));
        assert!(pending.try_complete().is_none());
        assert!(pending.wait().is_success());
    }
}
