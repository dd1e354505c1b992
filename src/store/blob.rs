//! Id-addressed blob store with durable write-through and an in-memory index.
//!
//! A [`BlobRecord`] only ever exists for a payload that was fully written and synced. The
//! file write runs on the blocking pool outside the index lock, so concurrent saves only
//! serialize on the map insert.
//!
//! Cancellation reaches into the write: dropping a [`BlobStore::save`] future (for example
//! because the call deadline fired) flags the in-flight writer, which stops at the next chunk
//! and removes its file. Writer and caller settle ownership of the file through one atomic
//! state, so exactly one of them cleans up and no file outlives an unregistered save.

// std
use std::{
	fs::{self, File, OpenOptions},
	io::Write,
	path::{Path, PathBuf},
	sync::atomic::{AtomicU8, Ordering},
};
// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD_NO_PAD};
use sha2::{Digest, Sha256};
use tokio::{
	task,
	time::{self, Instant},
};
use uuid::Uuid;
// self
use crate::{
	_prelude::*,
	auth::OwnerId,
	error::ValidationError,
	obs::{self, Op, OpOutcome, OpSpan},
	store::StoreError,
};

const CHUNK_LEN: usize = 64 * 1024;

const RUNNING: u8 = 0;
const WRITTEN: u8 = 1;
const FAILED: u8 = 2;
const CANCELLED: u8 = 3;

/// Boxed future returned by [`BlobStore`] operations.
pub type BlobFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Storage contract for id-addressed binary objects.
pub trait BlobStore
where
	Self: Send + Sync,
{
	/// Durably writes `payload` and registers it under a freshly generated id.
	fn save<'a>(
		&'a self,
		owner: &'a OwnerId,
		suffix: &'a BlobSuffix,
		payload: Vec<u8>,
	) -> BlobFuture<'a, BlobId>;

	/// Fetches the record registered for `id`, if any.
	fn fetch(&self, id: &BlobId) -> Option<BlobRecord>;

	/// Number of registered records.
	fn len(&self) -> usize;

	/// Returns true if no record has been registered.
	fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Same as [`save`](Self::save), abandoning the write once `deadline` passes.
	fn save_until<'a>(
		&'a self,
		deadline: Instant,
		owner: &'a OwnerId,
		suffix: &'a BlobSuffix,
		payload: Vec<u8>,
	) -> BlobFuture<'a, BlobId> {
		Box::pin(async move {
			match time::timeout_at(deadline, self.save(owner, suffix, payload)).await {
				Ok(result) => result,
				Err(_) => Err(StoreError::DeadlineExceeded),
			}
		})
	}
}

/// Globally unique, randomly generated blob identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlobId(Uuid);
impl BlobId {
	/// Draws a new random (v4) identifier.
	pub fn generate() -> Self {
		Self(Uuid::new_v4())
	}

	/// Underlying UUID.
	pub fn as_uuid(&self) -> &Uuid {
		&self.0
	}
}
impl Display for BlobId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		Display::fmt(&self.0.hyphenated(), f)
	}
}
impl FromStr for BlobId {
	type Err = uuid::Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Uuid::parse_str(s).map(Self)
	}
}

/// Content-type suffix appended to the blob file name, e.g. `.png`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BlobSuffix(String);
impl BlobSuffix {
	const MAX_LEN: usize = 32;

	/// Validates `value`: empty, or `.` followed by ASCII alphanumerics.
	pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
		let value = value.into();
		let valid = value.is_empty()
			|| (value.len() > 1
				&& value.len() <= Self::MAX_LEN
				&& value.starts_with('.')
				&& value[1..].chars().all(|c| c.is_ascii_alphanumeric()));

		if valid { Ok(Self(value)) } else { Err(ValidationError::BlobSuffix { suffix: value }) }
	}

	/// Returns the suffix as a string slice.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}
impl Display for BlobSuffix {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}
impl TryFrom<String> for BlobSuffix {
	type Error = ValidationError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		Self::new(value)
	}
}
impl From<BlobSuffix> for String {
	fn from(value: BlobSuffix) -> Self {
		value.0
	}
}

/// Metadata registered for a durably written blob. Never mutated or deleted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobRecord {
	/// Blob identifier.
	pub id: BlobId,
	/// Owner the blob was uploaded for.
	pub owner: OwnerId,
	/// Content-type suffix used in the file name.
	pub suffix: BlobSuffix,
	/// Location of the payload on disk.
	pub path: PathBuf,
	/// Payload size in bytes.
	pub size: u64,
	/// Base64 (no padding) SHA-256 digest of the payload.
	pub sha256: String,
}

/// Disk-backed [`BlobStore`] writing `<id><suffix>` files under a root directory.
#[derive(Debug)]
pub struct DiskBlobStore {
	root: PathBuf,
	index: RwLock<HashMap<BlobId, BlobRecord>>,
}
impl DiskBlobStore {
	/// Uses `root` as-is; saves fail if it does not exist or is not writable.
	pub fn new(root: impl Into<PathBuf>) -> Self {
		Self { root: root.into(), index: Default::default() }
	}

	/// Creates `root` (and parents) if needed, then builds the store.
	pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
		let root = root.into();

		fs::create_dir_all(&root).map_err(|e| StoreError::Storage {
			message: format!("Failed to create blob root {}: {e}", root.display()),
		})?;

		Ok(Self::new(root))
	}

	/// Directory blobs are written to.
	pub fn root(&self) -> &Path {
		&self.root
	}

	/// Digests and writes `payload` on the blocking pool; returns the base64 SHA-256.
	async fn write_durably(path: PathBuf, payload: Vec<u8>) -> Result<String, StoreError> {
		let state = Arc::new(AtomicU8::new(RUNNING));
		let mut ticket = WriteTicket { state: state.clone(), path: path.clone(), settled: false };
		let writer = task::spawn_blocking(move || {
			let sha256 = STANDARD_NO_PAD.encode(Sha256::digest(&payload));

			write_chunks(&path, &payload, &state).map(|()| sha256)
		});
		let result = match writer.await {
			Ok(result) => result,
			Err(e) => Err(StoreError::Storage { message: format!("Blob writer panicked: {e}") }),
		};

		ticket.settled = true;

		result
	}
}
impl BlobStore for DiskBlobStore {
	fn save<'a>(
		&'a self,
		owner: &'a OwnerId,
		suffix: &'a BlobSuffix,
		payload: Vec<u8>,
	) -> BlobFuture<'a, BlobId> {
		const OP: Op = Op::BlobSave;

		let span = OpSpan::new(OP, "save");

		Box::pin(span.instrument(async move {
			obs::record_op_outcome(OP, OpOutcome::Attempt);

			let id = BlobId::generate();
			let path = self.root.join(format!("{id}{suffix}"));
			let size = payload.len() as u64;
			let sha256 = match Self::write_durably(path.clone(), payload).await {
				Ok(sha256) => sha256,
				Err(e) => {
					obs::record_op_outcome(OP, OpOutcome::Failure);
					obs::log_store_failure(OP, &e);

					return Err(e);
				},
			};

			let record =
				BlobRecord { id, owner: owner.clone(), suffix: suffix.clone(), path, size, sha256 };

			self.index.write().insert(id, record);
			obs::record_op_outcome(OP, OpOutcome::Success);

			Ok(id)
		}))
	}

	fn fetch(&self, id: &BlobId) -> Option<BlobRecord> {
		self.index.read().get(id).cloned()
	}

	fn len(&self) -> usize {
		self.index.read().len()
	}
}

/// Caller half of the writer handshake; flags cancellation when dropped unsettled.
struct WriteTicket {
	state: Arc<AtomicU8>,
	path: PathBuf,
	settled: bool,
}
impl Drop for WriteTicket {
	fn drop(&mut self) {
		if self.settled {
			return;
		}

		// If the writer already finished, the file is ours to discard; otherwise it sees the
		// flag and discards the file itself.
		if let Err(WRITTEN) =
			self.state.compare_exchange(RUNNING, CANCELLED, Ordering::AcqRel, Ordering::Acquire)
		{
			let _ = fs::remove_file(&self.path);
		}
	}
}

fn write_chunks(path: &Path, payload: &[u8], state: &AtomicU8) -> Result<(), StoreError> {
	let storage_error = |action: &str, e: std::io::Error| StoreError::Storage {
		message: format!("Failed to {action} {}: {e}", path.display()),
	};
	// `create_new` keeps a colliding id from ever overwriting an existing blob.
	let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
		Ok(file) => file,
		Err(e) => {
			state.store(FAILED, Ordering::Release);

			return Err(storage_error("create", e));
		},
	};
	let outcome = fill(&mut file, payload, state).map_err(|e| storage_error("write", e));

	drop(file);

	match outcome {
		Ok(true) =>
			match state.compare_exchange(RUNNING, WRITTEN, Ordering::AcqRel, Ordering::Acquire) {
				Ok(_) => Ok(()),
				Err(_) => {
					let _ = fs::remove_file(path);

					Err(StoreError::DeadlineExceeded)
				},
			},
		Ok(false) => {
			let _ = fs::remove_file(path);

			Err(StoreError::DeadlineExceeded)
		},
		Err(e) => {
			state.store(FAILED, Ordering::Release);

			let _ = fs::remove_file(path);

			Err(e)
		},
	}
}

/// Writes and syncs `payload`; `Ok(false)` means the caller went away mid-write.
fn fill(file: &mut File, payload: &[u8], state: &AtomicU8) -> std::io::Result<bool> {
	for chunk in payload.chunks(CHUNK_LEN) {
		if state.load(Ordering::Acquire) == CANCELLED {
			return Ok(false);
		}

		file.write_all(chunk)?;
	}

	file.sync_all()?;

	Ok(true)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::_preludet::temp_blob_root;

	fn owner() -> OwnerId {
		OwnerId::new("laptop-1").expect("Owner fixture should be valid.")
	}

	fn png() -> BlobSuffix {
		BlobSuffix::new(".png").expect("Suffix fixture should be valid.")
	}

	#[test]
	fn suffix_validation() {
		assert!(BlobSuffix::new("").is_ok());
		assert!(BlobSuffix::new(".jpeg").is_ok());
		assert!(BlobSuffix::new("png").is_err());
		assert!(BlobSuffix::new(".").is_err());
		assert!(BlobSuffix::new("./../etc").is_err());
		assert!(BlobSuffix::new(".p/ng").is_err());
	}

	#[test]
	fn blob_ids_round_trip_through_display() {
		let id = BlobId::generate();
		let parsed: BlobId = id.to_string().parse().expect("Displayed id should parse.");

		assert_eq!(id, parsed);
	}

	#[test]
	fn cancelled_writer_removes_its_file() {
		let root = temp_blob_root("blob_unit_cancelled_writer");

		fs::create_dir_all(&root).expect("Blob root should be created.");

		let path = root.join("cancelled.bin");
		let state = AtomicU8::new(CANCELLED);

		assert_eq!(write_chunks(&path, &[1_u8; 16], &state), Err(StoreError::DeadlineExceeded));
		assert!(!path.exists());

		fs::remove_dir_all(&root).expect("Temporary blob root should be removable.");
	}

	#[test]
	fn existing_files_are_never_overwritten_or_removed() {
		let root = temp_blob_root("blob_unit_collision");

		fs::create_dir_all(&root).expect("Blob root should be created.");

		let path = root.join("taken.bin");

		fs::write(&path, b"original").expect("Fixture file should be written.");

		let state = AtomicU8::new(RUNNING);

		assert!(matches!(
			write_chunks(&path, b"replacement", &state),
			Err(StoreError::Storage { .. })
		));
		assert_eq!(fs::read(&path).expect("Fixture file should remain."), b"original");

		fs::remove_dir_all(&root).expect("Temporary blob root should be removable.");
	}

	#[tokio::test]
	async fn save_writes_file_then_registers_record() {
		let root = temp_blob_root("blob_unit_save");
		let store = DiskBlobStore::open(&root).expect("Blob root should be created.");
		let payload = b"\x89PNG fake image bytes".to_vec();
		let id = store.save(&owner(), &png(), payload.clone()).await.expect("Save should succeed.");
		let record = store.fetch(&id).expect("Saved blob should be indexed.");

		assert_eq!(record.path, root.join(format!("{id}.png")));
		assert_eq!(record.owner, owner());
		assert_eq!(record.size, payload.len() as u64);
		assert_eq!(record.sha256, STANDARD_NO_PAD.encode(Sha256::digest(&payload)));
		assert_eq!(fs::read(&record.path).expect("Blob file should exist."), payload);
		assert_eq!(store.len(), 1);

		fs::remove_dir_all(&root).expect("Temporary blob root should be removable.");
	}

	#[tokio::test]
	async fn durable_write_reports_the_payload_digest() {
		let root = temp_blob_root("blob_unit_digest");

		fs::create_dir_all(&root).expect("Blob root should be created.");

		let path = root.join("empty.bin");
		let sha256 = DiskBlobStore::write_durably(path.clone(), Vec::new())
			.await
			.expect("Empty write should succeed.");

		assert_eq!(sha256, "47DEQpj8HBSa+/TImW+5JCeuQeRkm5NMpJWZG3hSuFU");
		assert_eq!(fs::read(&path).expect("Blob file should exist."), b"");

		fs::remove_dir_all(&root).expect("Temporary blob root should be removable.");
	}

	#[tokio::test]
	async fn failed_write_leaves_index_untouched() {
		let root = temp_blob_root("blob_unit_missing_root");
		let store = DiskBlobStore::new(&root);
		let result = store.save(&owner(), &png(), b"payload".to_vec()).await;

		assert!(matches!(result, Err(StoreError::Storage { .. })));
		assert!(store.is_empty());
		assert!(!root.exists());
	}
}
