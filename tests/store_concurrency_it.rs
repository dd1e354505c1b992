// std
use std::{collections::HashSet, fs};
// crates.io
use tokio::{
	task::JoinSet,
	time::{self, Instant},
};
// self
use callgate::{
	_preludet::*,
	auth::{OwnerId, PasswordDigest, Role, Username},
	store::{
		BlobId, BlobStore, BlobSuffix, Credential, CredentialStore, DiskBlobStore, RatingAggregator,
		RatingSummary, StoreError,
	},
};

const BLOB_SAVES: usize = 10_000;
const RATERS: u64 = 1_000;

fn owner() -> OwnerId {
	OwnerId::new("laptop-42").expect("Owner fixture should be valid.")
}

fn jpg() -> BlobSuffix {
	BlobSuffix::new(".jpg").expect("Suffix fixture should be valid.")
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_blob_saves_get_distinct_ids() {
	let root = temp_blob_root("it_concurrent_saves");
	let store = Arc::new(DiskBlobStore::open(&root).expect("Blob root should be created."));
	let mut saves = JoinSet::new();

	for i in 0..BLOB_SAVES {
		let store = store.clone();

		saves.spawn(async move {
			store.save(&owner(), &jpg(), i.to_le_bytes().to_vec()).await
		});
	}

	let mut ids = HashSet::with_capacity(BLOB_SAVES);

	while let Some(joined) = saves.join_next().await {
		let id = joined
			.expect("Save task should not panic.")
			.expect("Concurrent save should succeed.");

		assert!(ids.insert(id), "Blob id {id} was handed out twice.");
	}

	assert_eq!(ids.len(), BLOB_SAVES);
	assert_eq!(store.len(), BLOB_SAVES);
	assert_eq!(
		fs::read_dir(&root).expect("Blob root should be listable.").count(),
		BLOB_SAVES
	);

	fs::remove_dir_all(&root).expect("Temporary blob root should be removable.");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn failed_writes_register_nothing() {
	let root = temp_blob_root("it_missing_root");
	let store = Arc::new(DiskBlobStore::new(&root));
	let mut saves = JoinSet::new();

	for _ in 0..64 {
		let store = store.clone();

		saves.spawn(async move { store.save(&owner(), &jpg(), b"payload".to_vec()).await });
	}

	while let Some(joined) = saves.join_next().await {
		let result = joined.expect("Save task should not panic.");

		assert!(matches!(result, Err(StoreError::Storage { .. })));
	}

	assert!(store.is_empty());
	assert!(!root.exists());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn expired_deadline_leaves_no_record_and_no_file() {
	let root = temp_blob_root("it_deadline");
	let store = DiskBlobStore::open(&root).expect("Blob root should be created.");
	let payload = vec![7_u8; 8 * 1024 * 1024];
	let result = store.save_until(Instant::now(), &owner(), &jpg(), payload).await;

	assert_eq!(result, Err(StoreError::DeadlineExceeded));
	assert!(store.is_empty());

	// The abandoned writer finishes its cleanup on the blocking pool.
	let give_up = Instant::now() + std::time::Duration::from_secs(10);

	while fs::read_dir(&root).expect("Blob root should be listable.").next().is_some() {
		assert!(Instant::now() < give_up, "Abandoned blob file was never removed.");

		time::sleep(std::time::Duration::from_millis(10)).await;
	}

	fs::remove_dir_all(&root).expect("Temporary blob root should be removable.");
}

#[tokio::test]
async fn unknown_blob_ids_fetch_nothing() {
	let store = DiskBlobStore::new(temp_blob_root("it_unknown_id"));

	assert!(store.fetch(&BlobId::generate()).is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_ratings_are_never_lost() {
	let ratings = Arc::new(RatingAggregator::default());
	let mut raters = JoinSet::new();

	for _ in 0..RATERS {
		let ratings = ratings.clone();

		raters.spawn(async move { ratings.contribute("laptop-42", 5.0) });
	}

	let mut counts = HashSet::new();

	while let Some(joined) = raters.join_next().await {
		let summary = joined
			.expect("Rating task should not panic.")
			.expect("Finite rating should be accepted.");

		assert_eq!(summary.average, 5.0);
		assert!(counts.insert(summary.count), "Two contributions observed the same count.");
	}

	assert_eq!(counts.len() as u64, RATERS);
	assert_eq!(ratings.summary("laptop-42"), Some(RatingSummary { count: RATERS, average: 5.0 }));
}

#[tokio::test]
async fn credentials_save_once_and_find_back() {
	let store = CredentialStore::default();
	let hasher = test_password_hasher();
	let digest = hasher.hash("secret").expect("Hashing should succeed.");
	let credential = Credential::new(
		Username::new("admin1").expect("Username fixture should be valid."),
		digest.clone(),
		Role::new("admin").expect("Role fixture should be valid."),
	);

	store.save(credential.clone()).expect("First save should succeed.");

	assert_eq!(store.find("admin1"), Some(credential.clone()));
	assert_eq!(
		store.save(Credential::new(
			credential.username.clone(),
			PasswordDigest::from_phc(digest.as_phc()),
			Role::new("user").expect("Role fixture should be valid."),
		)),
		Err(StoreError::DuplicateUser { username: "admin1".into() })
	);
	assert!(hasher.verify("secret", &digest).expect("Stored digest should parse."));
	assert_eq!(store.len(), 1);
}
