use crossbeam_channel::{Receiver, Sender};
use std::collections::HashMap;
use std::io::Read;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;
use tickload::{LoadResult, PollResult, Resource, ResourceBackend, ResourceId};

enum RequestState {
    Loading { bytes_read: u64, total_bytes: u64 },
    Ready(Vec<u8>),
    Failed,
}

type RequestStates = Arc<Mutex<HashMap<ResourceId, RequestState>>>;

struct FileIORequest {
    id: ResourceId,
    path: PathBuf,
}

#[derive(Clone)]
struct ReadSettings {
    chunk_size: usize,
    chunk_delay: Duration,
}

// Reads a file chunk by chunk, publishing progress into the shared state as it goes
fn read_file(
    request: &FileIORequest,
    settings: &ReadSettings,
    states: &RequestStates,
) -> std::io::Result<Vec<u8>> {
    let mut file = std::fs::File::open(&request.path)?;
    let total_bytes = file.metadata()?.len();
    let mut data = Vec::with_capacity(total_bytes as usize);
    let mut chunk = vec![0u8; settings.chunk_size];

    loop {
        let read = file.read(&mut chunk)?;
        if read == 0 {
            return Ok(data);
        }

        data.extend_from_slice(&chunk[0..read]);
        if let Some(state) = states.lock().unwrap().get_mut(&request.id) {
            *state = RequestState::Loading {
                bytes_read: data.len() as u64,
                total_bytes,
            };
        }

        if !settings.chunk_delay.is_zero() {
            std::thread::sleep(settings.chunk_delay);
        }
    }
}

// Thread that tries to take jobs out of the request channel and ends when the finish channel is
// signalled
struct FileIOWorkerThread {
    finish_tx: Sender<()>,
    join_handle: JoinHandle<()>,
}

impl FileIOWorkerThread {
    fn new(
        request_rx: Receiver<FileIORequest>,
        states: RequestStates,
        settings: ReadSettings,
        thread_index: usize,
    ) -> std::io::Result<Self> {
        let (finish_tx, finish_rx) = crossbeam_channel::bounded(1);
        let join_handle = std::thread::Builder::new()
            .name(format!("File IO Thread {}", thread_index))
            .spawn(move || {
                profiling::register_thread!(&format!("FileIOWorkerThread {}", thread_index));
                loop {
                    crossbeam_channel::select! {
                        recv(request_rx) -> msg => {
                            let request = match msg {
                                Ok(request) => request,
                                // The backend dropped its sender
                                Err(_) => return,
                            };

                            profiling::scope!("FileIORequest");
                            log::trace!("Start read {} {:?}", request.id, request.path);
                            let new_state = match read_file(&request, &settings, &states) {
                                Ok(data) => {
                                    log::trace!(
                                        "Finished read {} ({} bytes)",
                                        request.id,
                                        data.len()
                                    );
                                    RequestState::Ready(data)
                                }
                                Err(e) => {
                                    log::warn!("Failed to read {:?}: {}", request.path, e);
                                    RequestState::Failed
                                }
                            };

                            // The request may have been retrieved and forgotten in the meantime
                            if let Some(state) = states.lock().unwrap().get_mut(&request.id) {
                                *state = new_state;
                            }
                        },
                        recv(finish_rx) -> _msg => {
                            return;
                        }
                    }
                }
            })?;

        Ok(FileIOWorkerThread {
            finish_tx,
            join_handle,
        })
    }
}

// Spans N threads, proxies requests to them, and stops the threads when dropped
struct FileIOThreadPool {
    worker_threads: Vec<FileIOWorkerThread>,
    request_tx: Sender<FileIORequest>,
}

impl FileIOThreadPool {
    fn new(
        worker_count: usize,
        states: RequestStates,
        settings: ReadSettings,
    ) -> std::io::Result<Self> {
        let (request_tx, request_rx) = crossbeam_channel::unbounded::<FileIORequest>();

        let mut worker_threads = Vec::with_capacity(worker_count);
        for thread_index in 0..worker_count {
            let worker = FileIOWorkerThread::new(
                request_rx.clone(),
                states.clone(),
                settings.clone(),
                thread_index,
            )?;
            worker_threads.push(worker);
        }

        Ok(FileIOThreadPool {
            worker_threads,
            request_tx,
        })
    }

    fn add_request(
        &self,
        request: FileIORequest,
    ) -> LoadResult<()> {
        self.request_tx
            .send(request)
            .map_err(|_| "file IO threads are not running".into())
    }

    fn finish(self) {
        for worker_thread in &self.worker_threads {
            let _ = worker_thread.finish_tx.send(());
        }

        for worker_thread in self.worker_threads {
            if worker_thread.join_handle.join().is_err() {
                log::error!("file IO thread panicked");
            }
        }
    }
}

/// Loads files relative to a root directory on a pool of worker threads. Resources are the raw
/// file contents as a `Vec<u8>`.
pub struct ThreadedFileBackend {
    root_path: PathBuf,
    states: RequestStates,
    thread_pool: Option<FileIOThreadPool>,
}

impl ThreadedFileBackend {
    pub fn new(
        root_path: PathBuf,
        worker_count: usize,
        chunk_size: usize,
        chunk_delay: Duration,
    ) -> std::io::Result<Self> {
        let states = RequestStates::default();
        let settings = ReadSettings {
            chunk_size: chunk_size.max(1),
            chunk_delay,
        };
        let thread_pool = FileIOThreadPool::new(worker_count.max(1), states.clone(), settings)?;

        Ok(ThreadedFileBackend {
            root_path,
            states,
            thread_pool: Some(thread_pool),
        })
    }
}

impl ResourceBackend for ThreadedFileBackend {
    fn request_load(
        &self,
        id: &ResourceId,
    ) -> LoadResult<()> {
        let thread_pool = self
            .thread_pool
            .as_ref()
            .ok_or_else(|| tickload::LoadError::from("file backend is shut down"))?;

        // A repeated request starts over
        self.states.lock().unwrap().insert(
            id.clone(),
            RequestState::Loading {
                bytes_read: 0,
                total_bytes: 0,
            },
        );

        let result = thread_pool.add_request(FileIORequest {
            id: id.clone(),
            path: self.root_path.join(id.as_str()),
        });
        if result.is_err() {
            self.states.lock().unwrap().remove(id);
        }
        result
    }

    fn poll_status(
        &self,
        id: &ResourceId,
    ) -> PollResult {
        match self.states.lock().unwrap().get(id) {
            None => PollResult::invalid_target(),
            Some(RequestState::Loading {
                bytes_read,
                total_bytes,
            }) => {
                if *total_bytes == 0 {
                    PollResult::pending(0.0)
                } else {
                    PollResult::pending(*bytes_read as f32 / *total_bytes as f32)
                }
            }
            Some(RequestState::Ready(_)) => PollResult::ready(),
            Some(RequestState::Failed) => PollResult::failed(),
        }
    }

    fn retrieve(
        &self,
        id: &ResourceId,
    ) -> Option<Box<dyn Resource>> {
        let mut states = self.states.lock().unwrap();
        match states.remove(id) {
            Some(RequestState::Ready(data)) => Some(Box::new(data)),
            // Still loading, put it back
            Some(state @ RequestState::Loading { .. }) => {
                states.insert(id.clone(), state);
                None
            }
            Some(RequestState::Failed) | None => None,
        }
    }
}

impl Drop for ThreadedFileBackend {
    fn drop(&mut self) {
        if let Some(thread_pool) = self.thread_pool.take() {
            thread_pool.finish();
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use tickload::LoadStatus;

    fn wait_for_terminal(
        backend: &ThreadedFileBackend,
        id: &ResourceId,
    ) -> PollResult {
        for _ in 0..500 {
            let poll = backend.poll_status(id);
            if poll.status.is_terminal() {
                return poll;
            }
            std::thread::sleep(Duration::from_millis(2));
        }
        panic!("{} never finished loading", id);
    }

    #[test]
    fn loads_file_contents() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "hello loader").unwrap();
        let backend =
            ThreadedFileBackend::new(dir.path().to_path_buf(), 2, 4, Duration::ZERO).unwrap();

        let id = ResourceId::from("a.txt");
        backend.request_load(&id).unwrap();
        assert_eq!(wait_for_terminal(&backend, &id).status, LoadStatus::Ready);

        let resource = backend.retrieve(&id).unwrap();
        let data = resource.downcast_ref::<Vec<u8>>().unwrap();
        assert_eq!(data.as_slice(), b"hello loader");

        // Retrieved loads are forgotten
        assert_eq!(backend.poll_status(&id).status, LoadStatus::InvalidTarget);
    }

    #[test]
    fn missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let backend =
            ThreadedFileBackend::new(dir.path().to_path_buf(), 1, 1024, Duration::ZERO).unwrap();

        let id = ResourceId::from("missing.bin");
        backend.request_load(&id).unwrap();
        assert_eq!(wait_for_terminal(&backend, &id).status, LoadStatus::Failed);
        assert!(backend.retrieve(&id).is_none());
    }

    #[test]
    fn unrequested_id_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let backend =
            ThreadedFileBackend::new(dir.path().to_path_buf(), 1, 1024, Duration::ZERO).unwrap();
        assert_eq!(
            backend.poll_status(&ResourceId::from("never")).status,
            LoadStatus::InvalidTarget
        );
    }

    #[test]
    fn drives_a_multi_loader() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.bin"), vec![1u8; 300]).unwrap();
        std::fs::write(dir.path().join("b.bin"), vec![2u8; 100]).unwrap();
        let backend = Arc::new(
            ThreadedFileBackend::new(dir.path().to_path_buf(), 2, 64, Duration::ZERO).unwrap(),
        );

        let mut loader =
            tickload::MultiLoader::new(["a.bin", "missing.bin", "b.bin"], backend, 0.0);
        loader.start().unwrap();

        let mut last_progress = 0.0;
        for _ in 0..1000 {
            if loader.is_complete() {
                break;
            }
            loader.advance(0.016);
            let progress = loader.total_progress();
            assert!(progress >= last_progress);
            last_progress = progress;
            std::thread::sleep(Duration::from_millis(1));
        }

        assert!(loader.is_complete());
        assert_eq!(loader.get::<Vec<u8>>(0).map(|d| d.len()), Some(300));
        assert!(loader.get::<Vec<u8>>(1).is_none());
        assert_eq!(loader.get_by_id::<Vec<u8>>("b.bin").map(|d| d.len()), Some(100));
    }
}
