//! Drive file transfer: batch image upload and log reconciliation.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use super::auth::Credential;
use super::CloudError;

const UPLOAD_URL: &str = "https://www.googleapis.com/upload/drive/v3/files";
const FILES_URL: &str = "https://www.googleapis.com/drive/v3/files";

/// A file record in the destination folder.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteFile {
    pub id: String,
    pub name: String,
}

/// Remote file store operations used by the uploaders.
pub trait RemoteStore {
    /// Creates a file under `parent` and returns its id.
    fn create(
        &self,
        name: &str,
        parent: &str,
        bytes: Vec<u8>,
        mime: &str,
    ) -> Result<String, CloudError>;

    /// First non-trashed file named `name` under `parent`, if any.
    fn find_by_name(&self, name: &str, parent: &str) -> Result<Option<RemoteFile>, CloudError>;

    /// Replaces the content of an existing file and returns its id.
    fn update(&self, id: &str, bytes: Vec<u8>, mime: &str) -> Result<String, CloudError>;
}

/// Google Drive v3 client.
pub struct DriveClient {
    client: reqwest::blocking::Client,
    token: String,
}

impl DriveClient {
    pub fn new(cred: &Credential) -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
            token: cred.access_token.clone(),
        }
    }

    fn check(
        res: reqwest::blocking::Response,
    ) -> Result<reqwest::blocking::Response, CloudError> {
        let status = res.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(CloudError::NotFound);
        }
        if !status.is_success() {
            return Err(CloudError::Api {
                status,
                body: res.text().unwrap_or_default(),
            });
        }
        Ok(res)
    }
}

#[derive(Debug, Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<RemoteFile>,
}

#[derive(Debug, Deserialize)]
struct FileId {
    #[serde(default)]
    id: String,
}

impl RemoteStore for DriveClient {
    fn create(
        &self,
        name: &str,
        parent: &str,
        bytes: Vec<u8>,
        mime: &str,
    ) -> Result<String, CloudError> {
        let metadata = serde_json::json!({ "name": name, "parents": [parent] });
        let form = reqwest::blocking::multipart::Form::new()
            .part(
                "metadata",
                reqwest::blocking::multipart::Part::text(metadata.to_string())
                    .mime_str("application/json")?,
            )
            .part(
                "media",
                reqwest::blocking::multipart::Part::bytes(bytes).mime_str(mime)?,
            );
        let res = self
            .client
            .post(format!("{}?uploadType=multipart&fields=id", UPLOAD_URL))
            .bearer_auth(&self.token)
            .multipart(form)
            .send()?;
        Ok(Self::check(res)?.json::<FileId>()?.id)
    }

    fn find_by_name(&self, name: &str, parent: &str) -> Result<Option<RemoteFile>, CloudError> {
        let query = format!(
            "name='{}' and '{}' in parents and trashed=false",
            name, parent
        );
        let res = self
            .client
            .get(FILES_URL)
            .bearer_auth(&self.token)
            .query(&[
                ("q", query.as_str()),
                ("spaces", "drive"),
                ("fields", "files(id, name)"),
            ])
            .send()?;
        let list = Self::check(res)?.json::<FileList>()?;
        Ok(list.files.into_iter().next())
    }

    fn update(&self, id: &str, bytes: Vec<u8>, mime: &str) -> Result<String, CloudError> {
        let res = self
            .client
            .patch(format!("{}/{}?uploadType=media&fields=id", UPLOAD_URL, id))
            .bearer_auth(&self.token)
            .header(reqwest::header::CONTENT_TYPE, mime)
            .body(bytes)
            .send()?;
        Ok(Self::check(res)?.json::<FileId>()?.id)
    }
}

/// Uploads every staged still to the destination folder.
///
/// A file is deleted locally only after the response carried a non-empty
/// remote id; otherwise it stays behind for manual inspection. A failed
/// upload is logged and the remaining files are still attempted.
pub fn upload_images(store: &dyn RemoteStore, staging_dir: &str, parent: &str) {
    let entries = match fs::read_dir(staging_dir) {
        Ok(entries) => entries,
        Err(e) => {
            log::error!("Can't list staging dir {}: {}", staging_dir, e);
            return;
        }
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let name = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name.to_owned(),
            None => continue,
        };
        match upload_one(store, &path, &name, parent) {
            Ok(id) if !id.is_empty() => {
                log::info!("File ID: {}", id);
                if let Err(e) = fs::remove_file(&path) {
                    log::error!("Uploaded but can't remove {}: {}", path.display(), e);
                }
            }
            Ok(_) => log::error!("No file id returned for {}; keeping local copy", name),
            Err(e) => log::error!("Upload of {} failed: {}", name, e),
        }
    }
}

fn upload_one(
    store: &dyn RemoteStore,
    path: &Path,
    name: &str,
    parent: &str,
) -> Result<String, CloudError> {
    let bytes = fs::read(path)?;
    store.create(name, parent, bytes, "image/jpeg")
}

/// Reconciles one local log with the destination folder.
///
/// An existing remote record is updated in place; a missing one is created.
/// Create-after-failed-update happens only when the update failed because the
/// record is gone, so a transient failure never produces a duplicate. Errors
/// are logged and never fatal.
pub fn sync_log(store: &dyn RemoteStore, log_path: &str, parent: &str) {
    if let Err(e) = sync_log_inner(store, log_path, parent) {
        log::error!("Log sync of {} failed: {}", log_path, e);
    }
}

fn sync_log_inner(
    store: &dyn RemoteStore,
    log_path: &str,
    parent: &str,
) -> Result<(), CloudError> {
    let name = Path::new(log_path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| log_path.to_string());
    let bytes = fs::read(log_path)?;

    match store.find_by_name(&name, parent)? {
        Some(existing) => match store.update(&existing.id, bytes.clone(), "text/plain") {
            Ok(id) => log::info!("Updated file ID: {}", id),
            Err(CloudError::NotFound) => {
                let id = store.create(&name, parent, bytes, "text/plain")?;
                log::info!("Uploaded file ID: {}", id);
            }
            Err(e) => return Err(e),
        },
        None => {
            let id = store.create(&name, parent, bytes, "text/plain")?;
            log::info!("Uploaded file ID: {}", id);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::fs;

    /// What the mock update call should do.
    enum UpdateBehavior {
        Ok,
        Gone,
        Transient,
    }

    struct MockStore {
        existing: Option<RemoteFile>,
        create_id: String,
        fail_create_for: Option<String>,
        update: UpdateBehavior,
        created: RefCell<Vec<String>>,
        updated: RefCell<Vec<String>>,
    }

    impl MockStore {
        fn new(create_id: &str) -> Self {
            Self {
                existing: None,
                create_id: create_id.to_string(),
                fail_create_for: None,
                update: UpdateBehavior::Ok,
                created: RefCell::new(vec![]),
                updated: RefCell::new(vec![]),
            }
        }
    }

    impl RemoteStore for MockStore {
        fn create(
            &self,
            name: &str,
            _parent: &str,
            _bytes: Vec<u8>,
            _mime: &str,
        ) -> Result<String, CloudError> {
            if self.fail_create_for.as_deref() == Some(name) {
                return Err(CloudError::Api {
                    status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
                    body: "boom".to_string(),
                });
            }
            self.created.borrow_mut().push(name.to_string());
            Ok(self.create_id.clone())
        }

        fn find_by_name(
            &self,
            _name: &str,
            _parent: &str,
        ) -> Result<Option<RemoteFile>, CloudError> {
            Ok(self.existing.clone())
        }

        fn update(&self, id: &str, _bytes: Vec<u8>, _mime: &str) -> Result<String, CloudError> {
            self.updated.borrow_mut().push(id.to_string());
            match self.update {
                UpdateBehavior::Ok => Ok(id.to_string()),
                UpdateBehavior::Gone => Err(CloudError::NotFound),
                UpdateBehavior::Transient => Err(CloudError::Api {
                    status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
                    body: "try later".to_string(),
                }),
            }
        }
    }

    fn staging(name: &str, files: &[&str]) -> String {
        let dir = format!("/tmp/fieldcamtest/{}", name);
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        for f in files {
            fs::write(format!("{}/{}", dir, f), b"jpegdata").unwrap();
        }
        dir
    }

    #[test]
    fn upload_deletes_local_file_on_confirmed_id() {
        let dir = staging("upload_confirmed", &["a_1.jpg"]);
        let store = MockStore::new("remote-id-1");

        upload_images(&store, &dir, "folder");

        assert_eq!(store.created.borrow().as_slice(), ["a_1.jpg"]);
        assert_eq!(fs::read_dir(&dir).unwrap().count(), 0);
    }

    #[test]
    fn upload_keeps_local_file_without_id() {
        let dir = staging("upload_no_id", &["a_1.jpg"]);
        let store = MockStore::new("");

        upload_images(&store, &dir, "folder");

        assert!(Path::new(&format!("{}/a_1.jpg", dir)).is_file());
    }

    #[test]
    fn upload_failure_is_isolated_per_file() {
        let dir = staging("upload_isolated", &["bad.jpg", "good.jpg"]);
        let mut store = MockStore::new("remote-id-2");
        store.fail_create_for = Some("bad.jpg".to_string());

        upload_images(&store, &dir, "folder");

        // The failing file stays, the other one was still uploaded and removed.
        assert!(Path::new(&format!("{}/bad.jpg", dir)).is_file());
        assert!(!Path::new(&format!("{}/good.jpg", dir)).exists());
        assert_eq!(store.created.borrow().as_slice(), ["good.jpg"]);
    }

    fn log_file(name: &str) -> String {
        fs::create_dir_all("/tmp/fieldcamtest/logs").unwrap();
        let path = format!("/tmp/fieldcamtest/logs/{}", name);
        fs::write(&path, b"log line\n").unwrap();
        path
    }

    #[test]
    fn sync_log_creates_when_absent() {
        let path = log_file("wittyPi.log");
        let store = MockStore::new("new-id");

        sync_log(&store, &path, "folder");

        assert_eq!(store.created.borrow().as_slice(), ["wittyPi.log"]);
        assert!(store.updated.borrow().is_empty());
    }

    #[test]
    fn sync_log_updates_existing_record() {
        let path = log_file("schedule.log");
        let mut store = MockStore::new("unused");
        store.existing = Some(RemoteFile {
            id: "existing-id".to_string(),
            name: "schedule.log".to_string(),
        });

        sync_log(&store, &path, "folder");

        assert_eq!(store.updated.borrow().as_slice(), ["existing-id"]);
        assert!(store.created.borrow().is_empty());
    }

    #[test]
    fn sync_log_recreates_when_record_is_gone() {
        let path = log_file("wittyPi.log");
        let mut store = MockStore::new("recreated-id");
        store.existing = Some(RemoteFile {
            id: "stale-id".to_string(),
            name: "wittyPi.log".to_string(),
        });
        store.update = UpdateBehavior::Gone;

        sync_log(&store, &path, "folder");

        assert_eq!(store.updated.borrow().as_slice(), ["stale-id"]);
        assert_eq!(store.created.borrow().as_slice(), ["wittyPi.log"]);
    }

    #[test]
    fn sync_log_transient_update_failure_creates_no_duplicate() {
        let path = log_file("schedule.log");
        let mut store = MockStore::new("unused");
        store.existing = Some(RemoteFile {
            id: "existing-id".to_string(),
            name: "schedule.log".to_string(),
        });
        store.update = UpdateBehavior::Transient;

        sync_log(&store, &path, "folder");

        assert_eq!(store.updated.borrow().as_slice(), ["existing-id"]);
        assert!(store.created.borrow().is_empty());
    }

    #[test]
    fn sync_log_missing_local_file_is_not_fatal() {
        let store = MockStore::new("unused");
        sync_log(&store, "/tmp/fieldcamtest/no_such.log", "folder");
        assert!(store.created.borrow().is_empty());
        assert!(store.updated.borrow().is_empty());
    }
}
