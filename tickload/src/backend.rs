use crate::{LoadError, LoadResult, Resource, ResourceId};

/// Status of a requested load, as reported by a [`ResourceBackend`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum LoadStatus {
    // The backend is still working on it
    Pending,
    // The resource is loaded and can be retrieved
    Ready,
    // The load was attempted and did not succeed
    Failed,
    // The backend does not know about this identifier, usually because it was never requested
    InvalidTarget,
}

impl LoadStatus {
    /// Every status except `Pending` is terminal. A loader stops polling once it sees one.
    pub fn is_terminal(self) -> bool {
        !matches!(self, LoadStatus::Pending)
    }
}

/// Backends that wrap an engine reporting load status as an integer code use this to convert it.
/// An unknown code means progress accounting can't be trusted, callers should treat the error
/// as fatal.
impl TryFrom<i32> for LoadStatus {
    type Error = LoadError;

    fn try_from(code: i32) -> LoadResult<Self> {
        match code {
            0 => Ok(LoadStatus::InvalidTarget),
            1 => Ok(LoadStatus::Pending),
            2 => Ok(LoadStatus::Failed),
            3 => Ok(LoadStatus::Ready),
            _ => Err(LoadError::UnrecognizedStatus(code)),
        }
    }
}

impl From<LoadStatus> for i32 {
    fn from(status: LoadStatus) -> Self {
        match status {
            LoadStatus::InvalidTarget => 0,
            LoadStatus::Pending => 1,
            LoadStatus::Failed => 2,
            LoadStatus::Ready => 3,
        }
    }
}

/// The answer to a status query: the status and how far along the load is, from 0 to 1.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PollResult {
    pub status: LoadStatus,
    pub progress: f32,
}

impl PollResult {
    pub fn pending(progress: f32) -> Self {
        PollResult {
            status: LoadStatus::Pending,
            progress,
        }
    }

    pub fn ready() -> Self {
        PollResult {
            status: LoadStatus::Ready,
            progress: 1.0,
        }
    }

    pub fn failed() -> Self {
        PollResult {
            status: LoadStatus::Failed,
            progress: 0.0,
        }
    }

    pub fn invalid_target() -> Self {
        PollResult {
            status: LoadStatus::InvalidTarget,
            progress: 0.0,
        }
    }

    /// Progress clamped to [0, 1]. NaN is treated as no progress.
    pub fn clamped_progress(&self) -> f32 {
        if self.progress.is_nan() {
            0.0
        } else {
            self.progress.clamp(0.0, 1.0)
        }
    }
}

/// The asynchronous loading service the loaders drive. All calls must return promptly, the
/// actual work happens wherever the backend chooses to do it (usually worker threads).
///
/// A backend may be shared by several loaders, so it's keyed purely by identifier. Status
/// queries must be idempotent: loaders poll the same identifier any number of times.
pub trait ResourceBackend: Send + Sync {
    /// Begin loading the resource. Must not block.
    fn request_load(
        &self,
        id: &ResourceId,
    ) -> LoadResult<()>;

    /// Report the status of a previously requested load.
    fn poll_status(
        &self,
        id: &ResourceId,
    ) -> PollResult;

    /// Hand over the loaded value. Called once per load after `poll_status` reports a terminal
    /// status. Returns None if the load failed.
    fn retrieve(
        &self,
        id: &ResourceId,
    ) -> Option<Box<dyn Resource>>;
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn unknown_status_code_is_an_error() {
        match LoadStatus::try_from(42) {
            Err(LoadError::UnrecognizedStatus(42)) => {}
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn converts_engine_status_codes() {
        assert_eq!(LoadStatus::try_from(0).unwrap(), LoadStatus::InvalidTarget);
        assert_eq!(LoadStatus::try_from(3).unwrap(), LoadStatus::Ready);
        assert_eq!(i32::from(LoadStatus::Pending), 1);
        assert_eq!(i32::from(LoadStatus::Failed), 2);
    }

    #[test]
    fn progress_is_clamped() {
        assert_eq!(PollResult::pending(1.5).clamped_progress(), 1.0);
        assert_eq!(PollResult::pending(-0.5).clamped_progress(), 0.0);
        assert_eq!(PollResult::pending(f32::NAN).clamped_progress(), 0.0);
        assert!(!LoadStatus::Pending.is_terminal());
        assert!(LoadStatus::InvalidTarget.is_terminal());
    }
}
