//! The log-structured store engine.
//!
//! All mutations append immutable records to the single active segment
//! file; an in-memory [`KeyDir`] maps each key to its newest record. Sealed
//! segments are immutable until the region compactor rewrites their live
//! records into a fresh segment and unlinks them.
//!
//! ## Locking discipline
//!
//! One writer at a time: `put`, `delete`, rotation, and the compactor's
//! publish step hold the engine writer mutex. Reads share the segment map
//! and do positional reads, so they only contend on lock acquisition.

use crate::checkpoint::{self, CheckpointMarker};
use crate::clock::{now_ns, NANOS_PER_SEC};
use crate::config::StoreOptions;
use crate::error::{CoreError, CoreResult};
use crate::index::KeyDir;
use crate::segment::record::{read_record_at, Record};
use crate::segment::{
    active_path, compact_path, parse_segment_name, sealed_path, SegmentRole,
};
use crate::transform::Transformer;
use cinderkv_storage::{FileBackend, StorageBackend};
use cinderkv_types::Kind;
use cron::Schedule;
use fs2::FileExt;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

const LOCK_FILE: &str = "LOCK";

/// Whether the region compactor is currently rewriting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompactionState {
    /// No compaction in progress.
    Idle,
    /// A compaction pass is rewriting sealed segments.
    Running,
}

impl CompactionState {
    /// Lowercase name used in the health report.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
        }
    }
}

/// Result of a successful `get`.
#[derive(Debug, Clone)]
pub struct Fetched {
    /// Per-key version of the returned write (the MVCC tag).
    pub version: u64,
    /// Kind of the stored value.
    pub kind: Kind,
    /// The value bytes with transforms reversed.
    pub value: Vec<u8>,
    /// Whole seconds until expiry; -1 when the record never expires.
    pub ttl: i64,
}

/// Statistics from one region compaction pass.
#[derive(Debug, Clone)]
pub struct CompactionStats {
    /// Sealed segments consumed.
    pub input_segments: usize,
    /// Records scanned across those segments.
    pub input_records: usize,
    /// Records rewritten into the output segment.
    pub live_records: usize,
    /// Superseded, tombstoned, expired, or corrupt records dropped.
    pub dropped_records: usize,
    /// Bytes reclaimed (input bytes minus output bytes).
    pub reclaimed_bytes: u64,
    /// Id of the new sealed segment, if any records survived.
    pub output_segment: Option<u64>,
}

type SegmentHandle = Arc<RwLock<FileBackend>>;

/// The CinderKV storage engine.
///
/// Thread-safe; share it behind an [`Arc`]. Background workers hold only
/// weak references, so dropping the last caller handle stops them, but a
/// graceful shutdown should still call [`close`](Self::close) to sync the
/// active segment and write a clean checkpoint marker.
pub struct LogStore {
    dir: PathBuf,
    options: StoreOptions,
    transformer: Transformer,
    _lock_file: File,
    /// Serializes put/delete/rotation and the compactor's publish step.
    write_lock: Mutex<()>,
    segments: RwLock<HashMap<u64, SegmentHandle>>,
    active_id: RwLock<u64>,
    next_id: AtomicU64,
    keydir: KeyDir,
    compacting: AtomicBool,
    closed: AtomicBool,
    shutdown: AtomicBool,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl LogStore {
    /// Opens a store, creating the directory if missing and rebuilding the
    /// key directory from an on-disk scan.
    ///
    /// Stale compaction outputs are deleted, every segment tail is
    /// CRC-verified (torn tails are truncated), and the highest-id file
    /// becomes the active segment unless it already exceeds the rotation
    /// threshold.
    pub fn open(path: impl AsRef<Path>, options: StoreOptions) -> CoreResult<Self> {
        let dir = path.as_ref().to_path_buf();
        create_data_dir(&dir, options.dir_mode)?;

        let lock_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(dir.join(LOCK_FILE))?;
        if lock_file.try_lock_exclusive().is_err() {
            return Err(CoreError::Locked);
        }

        let transformer = Transformer::from_options(&options)?;

        let (mut sealed_ids, active_from_disk) = enumerate_segments(&dir)?;

        if let Some(marker) = checkpoint::read_marker(&dir)? {
            if marker.clean {
                debug!(active = marker.active_id, "previous shutdown was clean");
            } else {
                info!(
                    active = marker.active_id,
                    durable = marker.durable_size,
                    "previous shutdown was not clean; verifying segment tails"
                );
            }
        }

        sealed_ids.sort_unstable();
        let mut segments: HashMap<u64, SegmentHandle> = HashMap::new();
        let keydir = KeyDir::new();
        let mut newest_seen: HashMap<Vec<u8>, u64> = HashMap::new();

        let mut replay_order: Vec<(u64, PathBuf)> = sealed_ids
            .iter()
            .map(|&id| (id, sealed_path(&dir, id)))
            .collect();
        if let Some(id) = active_from_disk {
            replay_order.push((id, active_path(&dir, id)));
        }

        for (id, path) in replay_order {
            let mut backend = FileBackend::open(&path)?;
            if let Some(fail_offset) = replay_file(&keydir, &mut newest_seen, &backend, id)? {
                warn!(
                    segment = id,
                    offset = fail_offset,
                    "truncating segment at first invalid record"
                );
                backend.truncate(fail_offset)?;
            }
            segments.insert(id, Arc::new(RwLock::new(backend)));
        }

        let max_id = segments.keys().copied().max().unwrap_or(0);

        // The highest-id file stays active while it has room; otherwise it
        // is sealed and a fresh file takes over.
        let mut next_id = max_id + 1;
        let active_id = match active_from_disk {
            Some(id) => {
                let size = segments[&id].read().size()?;
                if size >= options.rotation_threshold {
                    segments[&id].read().rename_to(&sealed_path(&dir, id))?;
                    let fresh = next_id;
                    next_id += 1;
                    let backend = FileBackend::open(&active_path(&dir, fresh))?;
                    segments.insert(fresh, Arc::new(RwLock::new(backend)));
                    fresh
                } else {
                    id
                }
            }
            None => {
                let highest = segments.keys().copied().max();
                let mut adopted = None;
                if let Some(high) = highest {
                    if segments[&high].read().size()? < options.rotation_threshold {
                        segments[&high]
                            .read()
                            .rename_to(&active_path(&dir, high))?;
                        adopted = Some(high);
                    }
                }
                match adopted {
                    Some(id) => id,
                    None => {
                        let fresh = next_id.max(1);
                        next_id = fresh + 1;
                        let backend = FileBackend::open(&active_path(&dir, fresh))?;
                        segments.insert(fresh, Arc::new(RwLock::new(backend)));
                        fresh
                    }
                }
            }
        };

        let store = Self {
            dir,
            options,
            transformer,
            _lock_file: lock_file,
            write_lock: Mutex::new(()),
            segments: RwLock::new(segments),
            active_id: RwLock::new(active_id),
            next_id: AtomicU64::new(next_id),
            keydir,
            compacting: AtomicBool::new(false),
            closed: AtomicBool::new(false),
            shutdown: AtomicBool::new(false),
            workers: Mutex::new(Vec::new()),
        };

        store.write_checkpoint(false)?;
        info!(
            path = %store.dir.display(),
            keys = store.key_count(),
            active = active_id,
            sealed = store.sealed_segment_count(),
            "store opened"
        );
        Ok(store)
    }

    /// Writes a value, returning the bumped per-key version.
    ///
    /// The value bytes pass through the transform pipeline, are framed with
    /// header and CRC, and appended to the active segment (rotating it
    /// first if the append would cross the size threshold). The index is
    /// only updated after a successful append.
    pub fn put(&self, key: &[u8], kind: Kind, value: &[u8], ttl_secs: u64) -> CoreResult<u64> {
        self.ensure_open()?;
        validate_key(key)?;
        if kind == Kind::Unknown {
            return Err(CoreError::invalid_argument(
                "kind `unknown` is reserved for tombstones",
            ));
        }

        let now = now_ns();
        let expires_at = if ttl_secs > 0 {
            now.saturating_add(ttl_secs.saturating_mul(NANOS_PER_SEC))
        } else {
            0
        };

        let transformed = self.transformer.encode(value)?;
        if transformed.len() > u32::MAX as usize {
            return Err(CoreError::invalid_argument("value too large"));
        }
        let record = Record::put(key.to_vec(), kind, transformed, expires_at, now);
        let encoded = record.encode();

        let _guard = self.write_lock.lock();
        self.ensure_open()?;
        let (segment_id, offset) = self.append_record(&encoded)?;
        let version = self.keydir.put(
            key,
            segment_id,
            offset,
            encoded.len() as u64,
            now,
            expires_at,
        );
        Ok(version)
    }

    /// Reads the newest value for a key.
    ///
    /// Absent and expired keys return [`CoreError::NotFound`]. A record
    /// that fails its CRC returns [`CoreError::ChecksumMismatch`] and the
    /// index entry is kept so an operator can repair the file.
    pub fn get(&self, key: &[u8]) -> CoreResult<Fetched> {
        self.ensure_open()?;
        let now = now_ns();

        let mut entry = self.keydir.get(key, now).ok_or(CoreError::NotFound)?;
        let backend = match self.segment(entry.segment_id) {
            Ok(backend) => backend,
            // The compactor may have repointed the entry between lookup and
            // segment fetch; one retry observes the new location.
            Err(_) => {
                entry = self.keydir.get(key, now).ok_or(CoreError::NotFound)?;
                self.segment(entry.segment_id)?
            }
        };

        let data = backend.read().read_at(entry.offset, entry.length as usize)?;
        let record = Record::decode(&data)?;

        if record.is_tombstone() || record.kind == Kind::Unknown {
            return Err(CoreError::NotFound);
        }

        let value = self.transformer.decode(&record.value)?;
        Ok(Fetched {
            version: entry.version,
            kind: record.kind,
            value,
            ttl: record.ttl_remaining(now),
        })
    }

    /// Deletes a key.
    ///
    /// Always appends a tombstone - even for an unknown key - so the log
    /// stays authoritative for followers. Idempotent from the caller's
    /// perspective.
    pub fn delete(&self, key: &[u8]) -> CoreResult<()> {
        self.ensure_open()?;
        validate_key(key)?;

        let record = Record::tombstone(key.to_vec(), now_ns());
        let encoded = record.encode();

        let _guard = self.write_lock.lock();
        self.ensure_open()?;
        self.append_record(&encoded)?;
        self.keydir.remove(key);
        Ok(())
    }

    /// Shuts the store down: stops background workers, syncs the active
    /// segment, and writes a clean checkpoint marker. Further operations
    /// fail with [`CoreError::Closed`]. Safe to call more than once.
    pub fn close(&self) -> CoreResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Ok(());
        }

        self.shutdown.store(true, Ordering::SeqCst);
        let handles: Vec<_> = self.workers.lock().drain(..).collect();
        for handle in handles {
            let _ = handle.join();
        }

        let _guard = self.write_lock.lock();
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.write_checkpoint_locked(true)?;
        info!(path = %self.dir.display(), "store closed");
        Ok(())
    }

    /// Number of live (unexpired) keys.
    pub fn key_count(&self) -> usize {
        self.keydir.len(now_ns())
    }

    /// Whether a compaction pass is currently running.
    pub fn compaction_state(&self) -> CompactionState {
        if self.compacting.load(Ordering::SeqCst) {
            CompactionState::Running
        } else {
            CompactionState::Idle
        }
    }

    /// The data directory.
    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.dir
    }

    /// Id of the segment currently receiving appends.
    pub fn active_segment_id(&self) -> u64 {
        *self.active_id.read()
    }

    /// Ids of sealed segments, ascending.
    pub fn sealed_segment_ids(&self) -> Vec<u64> {
        let active = *self.active_id.read();
        let mut ids: Vec<u64> = self
            .segments
            .read()
            .keys()
            .copied()
            .filter(|&id| id != active)
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Number of sealed segments.
    pub fn sealed_segment_count(&self) -> usize {
        self.sealed_segment_ids().len()
    }

    /// Total bytes across all segment files.
    pub fn disk_usage(&self) -> CoreResult<u64> {
        let segments = self.segments.read();
        let mut total = 0u64;
        for backend in segments.values() {
            total += backend.read().size()?;
        }
        Ok(total)
    }

    /// Syncs the active segment and rewrites the `CHECKPOINT` marker.
    pub fn write_checkpoint(&self, clean: bool) -> CoreResult<()> {
        let _guard = self.write_lock.lock();
        self.write_checkpoint_locked(clean)
    }

    fn write_checkpoint_locked(&self, clean: bool) -> CoreResult<()> {
        let active_id = *self.active_id.read();
        let backend = self.segment(active_id)?;
        backend.write().sync()?;
        let durable_size = backend.read().size()?;

        checkpoint::write_marker(
            &self.dir,
            &CheckpointMarker {
                active_id,
                durable_size,
                clean,
            },
        )
    }

    /// Runs one region compaction pass.
    ///
    /// A no-op returning `Ok(None)` when fewer than `threshold` sealed
    /// segments exist or another pass is already running. On success the
    /// surviving records live in one fresh sealed segment and the old
    /// sealed files are unlinked.
    pub fn compact_region(&self, threshold: usize) -> CoreResult<Option<CompactionStats>> {
        self.ensure_open()?;
        if self.compacting.swap(true, Ordering::SeqCst) {
            return Ok(None);
        }
        let result = self.compact_region_inner(threshold);
        self.compacting.store(false, Ordering::SeqCst);
        result
    }

    fn compact_region_inner(&self, threshold: usize) -> CoreResult<Option<CompactionStats>> {
        let sealed = self.sealed_segment_ids();
        if sealed.is_empty() || sealed.len() < threshold {
            return Ok(None);
        }

        let input_bytes = {
            let segments = self.segments.read();
            let mut total = 0u64;
            for id in &sealed {
                if let Some(backend) = segments.get(id) {
                    total += backend.read().size()?;
                }
            }
            total
        };

        let output_id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let output_path = compact_path(&self.dir, output_id);
        let output = Arc::new(RwLock::new(FileBackend::open(&output_path)?));

        let rewrite = self.rewrite_live_records(&sealed, output_id, &output);
        let (input_records, live_records) = match rewrite {
            Ok(counts) => counts,
            Err(e) => {
                let _ = output.read().remove();
                return Err(e);
            }
        };

        output.write().sync()?;
        let output_bytes = output.read().size()?;

        if output_bytes > 0 {
            output.read().rename_to(&sealed_path(&self.dir, output_id))?;
        }

        // Publish: swap the sealed set under the writer lock, then unlink.
        let removed: Vec<SegmentHandle> = {
            let _guard = self.write_lock.lock();
            let mut segments = self.segments.write();
            if output_bytes > 0 {
                segments.insert(output_id, Arc::clone(&output));
            }
            sealed
                .iter()
                .filter_map(|id| segments.remove(id))
                .collect()
        };
        for backend in removed {
            let _ = backend.read().remove();
        }
        if output_bytes == 0 {
            let _ = output.read().remove();
        }

        Ok(Some(CompactionStats {
            input_segments: sealed.len(),
            input_records,
            live_records,
            dropped_records: input_records - live_records,
            reclaimed_bytes: input_bytes.saturating_sub(output_bytes),
            output_segment: (output_bytes > 0).then_some(output_id),
        }))
    }

    fn rewrite_live_records(
        &self,
        sealed: &[u64],
        output_id: u64,
        output: &SegmentHandle,
    ) -> CoreResult<(usize, usize)> {
        let mut input_records = 0usize;
        let mut live_records = 0usize;

        for &id in sealed {
            let backend = self.segment(id)?;
            let mut offset = 0u64;
            loop {
                let next = {
                    let guard = backend.read();
                    read_record_at(&*guard, offset)
                };
                match next {
                    Ok(Some((record, len))) => {
                        input_records += 1;
                        let live = !record.is_tombstone()
                            && record.kind != Kind::Unknown
                            && self.keydir.points_at(&record.key, id, offset, now_ns());
                        if live {
                            let new_offset = output.write().append(&record.encode())?;
                            let _guard = self.write_lock.lock();
                            if self
                                .keydir
                                .repoint(&record.key, id, offset, output_id, new_offset)
                            {
                                live_records += 1;
                            }
                            // A failed repoint means a concurrent write
                            // superseded the record; the copy is dead bytes
                            // a later pass will drop.
                        }
                        offset += len;
                    }
                    Ok(None) => break,
                    Err(e) if e.is_corruption() => {
                        warn!(
                            segment = id,
                            offset,
                            error = %e,
                            "dropping corrupt tail during compaction"
                        );
                        break;
                    }
                    Err(e) => return Err(e),
                }
            }
        }

        Ok((input_records, live_records))
    }

    /// Starts the cron-scheduled region compaction worker.
    ///
    /// `schedule` is a 6-field cron expression (seconds first), e.g.
    /// `0 0 3 * * *` for 03:00 daily.
    pub fn start_region_compactor(
        self: &Arc<Self>,
        schedule: &str,
        threshold: usize,
    ) -> CoreResult<()> {
        let schedule = Schedule::from_str(schedule)
            .map_err(|e| CoreError::config(format!("invalid cron expression: {e}")))?;
        let weak: Weak<Self> = Arc::downgrade(self);

        let handle = thread::spawn(move || {
            region_worker_loop(&weak, &schedule, threshold);
        });
        self.workers.lock().push(handle);
        Ok(())
    }

    /// Starts the periodic checkpoint worker.
    pub fn start_checkpointer(self: &Arc<Self>, interval_secs: u32) {
        let weak: Weak<Self> = Arc::downgrade(self);
        let interval = Duration::from_secs(u64::from(interval_secs.max(1)));

        let handle = thread::spawn(move || {
            let mut due = Instant::now() + interval;
            loop {
                thread::sleep(Duration::from_millis(200));
                let Some(store) = weak.upgrade() else { return };
                if store.shutdown.load(Ordering::SeqCst) {
                    return;
                }
                if Instant::now() < due {
                    continue;
                }
                due = Instant::now() + interval;
                match store.write_checkpoint(false) {
                    Ok(()) => debug!("checkpoint written"),
                    Err(e) => warn!(error = %e, "checkpoint failed"),
                }
            }
        });
        self.workers.lock().push(handle);
    }

    fn ensure_open(&self) -> CoreResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(CoreError::Closed);
        }
        Ok(())
    }

    fn segment(&self, id: u64) -> CoreResult<SegmentHandle> {
        self.segments
            .read()
            .get(&id)
            .cloned()
            .ok_or_else(|| CoreError::corrupt(format!("segment {id} is not loaded")))
    }

    /// Appends a framed record, rotating first when the append would push
    /// the active file past the threshold. Caller holds the writer lock.
    fn append_record(&self, encoded: &[u8]) -> CoreResult<(u64, u64)> {
        self.rotate_if_needed(encoded.len() as u64)?;
        let active_id = *self.active_id.read();
        let backend = self.segment(active_id)?;
        let offset = backend.write().append(encoded)?;
        Ok((active_id, offset))
    }

    fn rotate_if_needed(&self, incoming: u64) -> CoreResult<()> {
        let active_id = *self.active_id.read();
        let backend = self.segment(active_id)?;
        let size = backend.read().size()?;

        if size == 0 || size + incoming <= self.options.rotation_threshold {
            return Ok(());
        }

        // Seal before the append proceeds; the boundary record goes to the
        // new file.
        backend.write().sync()?;
        backend.read().rename_to(&sealed_path(&self.dir, active_id))?;

        let new_id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let new_backend = FileBackend::open(&active_path(&self.dir, new_id))?;
        self.segments
            .write()
            .insert(new_id, Arc::new(RwLock::new(new_backend)));
        *self.active_id.write() = new_id;

        debug!(sealed = active_id, active = new_id, "rotated active segment");
        Ok(())
    }
}

impl std::fmt::Debug for LogStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogStore")
            .field("dir", &self.dir)
            .field("active_id", &*self.active_id.read())
            .field("segments", &self.segments.read().len())
            .field("compaction", &self.compaction_state().as_str())
            .finish_non_exhaustive()
    }
}

fn validate_key(key: &[u8]) -> CoreResult<()> {
    if key.is_empty() {
        return Err(CoreError::invalid_argument("key cannot be empty"));
    }
    if key.len() > u32::MAX as usize {
        return Err(CoreError::invalid_argument("key too large"));
    }
    Ok(())
}

#[cfg(unix)]
fn create_data_dir(dir: &Path, mode: u32) -> CoreResult<()> {
    use std::os::unix::fs::DirBuilderExt;
    if dir.exists() {
        return Ok(());
    }
    fs::DirBuilder::new()
        .recursive(true)
        .mode(mode)
        .create(dir)?;
    Ok(())
}

#[cfg(not(unix))]
fn create_data_dir(dir: &Path, _mode: u32) -> CoreResult<()> {
    if !dir.exists() {
        fs::create_dir_all(dir)?;
    }
    Ok(())
}

/// Lists segment files in the data directory, deleting stale compaction
/// outputs. Returns (sealed ids, active id if present).
fn enumerate_segments(dir: &Path) -> CoreResult<(Vec<u64>, Option<u64>)> {
    let mut sealed = Vec::new();
    let mut actives = Vec::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        match parse_segment_name(name) {
            Some((id, SegmentRole::Sealed)) => sealed.push(id),
            Some((id, SegmentRole::Active)) => actives.push(id),
            Some((id, SegmentRole::Compact)) => {
                warn!(segment = id, "removing stale compaction output");
                fs::remove_file(entry.path())?;
            }
            None => {}
        }
    }

    // More than one active file can only come from a crash between the
    // seal rename and the next create; all but the highest are sealed.
    actives.sort_unstable();
    while actives.len() > 1 {
        let id = actives.remove(0);
        fs::rename(active_path(dir, id), sealed_path(dir, id))?;
        sealed.push(id);
    }

    Ok((sealed, actives.pop()))
}

/// Replays one segment file into the key directory.
///
/// Precedence across files is newest-wins by record timestamp: a
/// compaction output can carry a higher segment id than the active file,
/// so scan order alone is not write order. Superseded records still bump
/// the per-key version. Returns the offset of the first invalid record,
/// which the caller truncates.
fn replay_file(
    keydir: &KeyDir,
    newest_seen: &mut HashMap<Vec<u8>, u64>,
    backend: &FileBackend,
    segment_id: u64,
) -> CoreResult<Option<u64>> {
    let mut offset = 0u64;
    loop {
        match read_record_at(backend, offset) {
            Ok(Some((record, len))) => {
                let seen = newest_seen.get(&record.key).copied().unwrap_or(0);
                if record.created_at >= seen {
                    newest_seen.insert(record.key.clone(), record.created_at);
                    if record.is_tombstone() {
                        keydir.remove(&record.key);
                    } else if record.kind != Kind::Unknown {
                        keydir.put(
                            &record.key,
                            segment_id,
                            offset,
                            len,
                            record.created_at,
                            record.expires_at,
                        );
                    }
                } else {
                    keydir.bump_version(&record.key);
                }
                offset += len;
            }
            Ok(None) => return Ok(None),
            Err(e) if e.is_corruption() => {
                debug!(segment = segment_id, offset, error = %e, "scan stopped");
                return Ok(Some(offset));
            }
            Err(e) => return Err(e),
        }
    }
}

fn region_worker_loop(weak: &Weak<LogStore>, schedule: &Schedule, threshold: usize) {
    use chrono::Utc;

    loop {
        let Some(next) = schedule.upcoming(Utc).next() else {
            return;
        };

        // Sleep until the next firing, staying responsive to shutdown.
        loop {
            let Some(store) = weak.upgrade() else { return };
            if store.shutdown.load(Ordering::SeqCst) {
                return;
            }
            drop(store);

            let now = Utc::now();
            if now >= next {
                break;
            }
            let wait = (next - now)
                .to_std()
                .unwrap_or_default()
                .min(Duration::from_millis(500));
            thread::sleep(wait);
        }

        let Some(store) = weak.upgrade() else { return };
        if store.shutdown.load(Ordering::SeqCst) {
            return;
        }
        match store.compact_region(threshold) {
            Ok(Some(stats)) => info!(
                input_segments = stats.input_segments,
                live = stats.live_records,
                dropped = stats.dropped_records,
                reclaimed = stats.reclaimed_bytes,
                "region compaction finished"
            ),
            Ok(None) => debug!("region compaction skipped"),
            Err(e) => warn!(error = %e, "region compaction failed"),
        }
    }
}
