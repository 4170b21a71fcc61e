use std::path::{Path, PathBuf};

use bincode::Options;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use sled::{Config, Db, IVec, Tree};
use uuid::Uuid;

use crate::{
    application::services::{HospitalStore, UserStore},
    domain::{DomainError, Hospital, Session, User},
};

const HOSPITALS_TREE: &str = "hospitals";
const USERS_TREE: &str = "users";
const USER_EMAILS_TREE: &str = "user_emails";
const SESSIONS_TREE: &str = "sessions";

/// Default page cache when no explicit capacity is configured.
pub const DEFAULT_CACHE_CAPACITY: u64 = 64 * 1024 * 1024;

/// Embedded directory store backed by `sled`.
///
/// Every record is bincode-encoded into its own tree. Users are additionally
/// indexed by normalized email so registration can enforce uniqueness, and
/// sessions are keyed by the digest of their bearer token.
pub struct SledDirectoryStore {
    db: Db,
    hospitals: Tree,
    users: Tree,
    user_emails: Tree,
    sessions: Tree,
    _data_dir: PathBuf,
    write_lock: Mutex<()>,
}

impl SledDirectoryStore {
    /// Opens (or creates) a sled database rooted at `data_dir`.
    pub fn open(data_dir: impl AsRef<Path>) -> Result<Self, DomainError> {
        Self::open_with_cache(data_dir, DEFAULT_CACHE_CAPACITY)
    }

    pub fn open_with_cache(
        data_dir: impl AsRef<Path>,
        cache_capacity: u64,
    ) -> Result<Self, DomainError> {
        let dir = data_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir).map_err(|err| {
            DomainError::storage(format!("failed to create data directory {:?}: {err}", dir))
        })?;

        let db = Config::default()
            .path(&dir)
            .cache_capacity(cache_capacity)
            .mode(sled::Mode::HighThroughput)
            .open()
            .map_err(|err| DomainError::storage(format!("failed to open sled db: {err}")))?;

        let open_tree = |name: &str| {
            db.open_tree(name)
                .map_err(|err| DomainError::storage(format!("failed to open {name} tree: {err}")))
        };

        let hospitals = open_tree(HOSPITALS_TREE)?;
        let users = open_tree(USERS_TREE)?;
        let user_emails = open_tree(USER_EMAILS_TREE)?;
        let sessions = open_tree(SESSIONS_TREE)?;

        Ok(Self {
            db,
            hospitals,
            users,
            user_emails,
            sessions,
            _data_dir: dir,
            write_lock: Mutex::new(()),
        })
    }

    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>, DomainError> {
        bincode::options()
            .with_fixint_encoding()
            .allow_trailing_bytes()
            .serialize(value)
            .map_err(|err| DomainError::storage(format!("serialization error: {err}")))
    }

    fn deserialize<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, DomainError> {
        bincode::options()
            .with_fixint_encoding()
            .allow_trailing_bytes()
            .deserialize(bytes)
            .map_err(|err| DomainError::storage(format!("deserialization error: {err}")))
    }

    fn encode_key(id: &Uuid) -> [u8; 16] {
        *id.as_bytes()
    }

    fn decode_hospital(bytes: &IVec) -> Result<Hospital, DomainError> {
        Self::deserialize(bytes.as_ref())
    }

    fn flush(tree: &Tree, what: &str) -> Result<(), DomainError> {
        tree.flush()
            .map_err(|err| DomainError::storage(format!("failed to flush {what}: {err}")))?;
        Ok(())
    }
}

impl HospitalStore for SledDirectoryStore {
    fn insert(&self, hospital: &Hospital) -> Result<(), DomainError> {
        let _guard = self.write_lock.lock();

        let bytes = Self::serialize(hospital)?;
        self.hospitals
            .insert(Self::encode_key(&hospital.id), bytes)
            .map_err(|err| DomainError::storage(format!("failed to persist hospital: {err}")))?;

        Self::flush(&self.hospitals, "hospitals")
    }

    fn get(&self, id: &Uuid) -> Result<Option<Hospital>, DomainError> {
        self.hospitals
            .get(Self::encode_key(id))
            .map_err(|err| DomainError::storage(format!("failed to read hospital: {err}")))?
            .map(|value| Self::decode_hospital(&value))
            .transpose()
    }

    fn list(&self) -> Result<Vec<Hospital>, DomainError> {
        let mut items: Vec<Hospital> = Vec::new();

        for entry in self.hospitals.iter() {
            let (_, value) = entry.map_err(|err| {
                DomainError::storage(format!("failed to read hospital record: {err}"))
            })?;
            items.push(Self::decode_hospital(&value)?);
        }

        items.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(items)
    }

    fn update(
        &self,
        id: &Uuid,
        apply: &mut dyn FnMut(&mut Hospital) -> Result<(), DomainError>,
    ) -> Result<Option<Hospital>, DomainError> {
        let _guard = self.write_lock.lock();

        let key = Self::encode_key(id);
        let Some(value) = self
            .hospitals
            .get(key)
            .map_err(|err| DomainError::storage(format!("failed to read hospital: {err}")))?
        else {
            return Ok(None);
        };

        let mut hospital = Self::decode_hospital(&value)?;
        apply(&mut hospital)?;

        let bytes = Self::serialize(&hospital)?;
        self.hospitals
            .insert(key, bytes)
            .map_err(|err| DomainError::storage(format!("failed to persist hospital: {err}")))?;
        Self::flush(&self.hospitals, "hospitals")?;

        Ok(Some(hospital))
    }

    fn remove(&self, id: &Uuid) -> Result<Option<Hospital>, DomainError> {
        let _guard = self.write_lock.lock();

        let removed = self
            .hospitals
            .remove(Self::encode_key(id))
            .map_err(|err| DomainError::storage(format!("failed to delete hospital: {err}")))?
            .map(|value| Self::decode_hospital(&value))
            .transpose()?;
        Self::flush(&self.hospitals, "hospitals")?;

        Ok(removed)
    }

    fn ping(&self) -> Result<(), DomainError> {
        self.db
            .flush()
            .map_err(|err| DomainError::storage(format!("failed to flush db: {err}")))?;

        Ok(())
    }
}

impl UserStore for SledDirectoryStore {
    fn create_user(&self, user: &User) -> Result<(), DomainError> {
        let _guard = self.write_lock.lock();

        let taken = self
            .user_emails
            .contains_key(user.email.as_bytes())
            .map_err(|err| DomainError::storage(format!("failed to read user index: {err}")))?;
        if taken {
            return Err(DomainError::already_exists("User already exists"));
        }

        let key = Self::encode_key(&user.id);
        let bytes = Self::serialize(user)?;
        self.users
            .insert(key, bytes)
            .map_err(|err| DomainError::storage(format!("failed to persist user: {err}")))?;
        self.user_emails
            .insert(user.email.as_bytes(), key.to_vec())
            .map_err(|err| DomainError::storage(format!("failed to index user: {err}")))?;

        Self::flush(&self.users, "users")?;
        Self::flush(&self.user_emails, "user index")
    }

    fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        let Some(id_bytes) = self
            .user_emails
            .get(email.as_bytes())
            .map_err(|err| DomainError::storage(format!("failed to read user index: {err}")))?
        else {
            return Ok(None);
        };

        let id = Uuid::from_slice(id_bytes.as_ref())
            .map_err(|err| DomainError::storage(format!("corrupt user index entry: {err}")))?;
        self.find_user(&id)
    }

    fn find_user(&self, id: &Uuid) -> Result<Option<User>, DomainError> {
        self.users
            .get(Self::encode_key(id))
            .map_err(|err| DomainError::storage(format!("failed to read user: {err}")))?
            .map(|value| Self::deserialize(value.as_ref()))
            .transpose()
    }

    fn save_session(&self, session: &Session) -> Result<(), DomainError> {
        let bytes = Self::serialize(session)?;
        self.sessions
            .insert(session.token_digest.as_bytes(), bytes)
            .map_err(|err| DomainError::storage(format!("failed to persist session: {err}")))?;

        Self::flush(&self.sessions, "sessions")
    }

    fn find_session(&self, token_digest: &str) -> Result<Option<Session>, DomainError> {
        self.sessions
            .get(token_digest.as_bytes())
            .map_err(|err| DomainError::storage(format!("failed to read session: {err}")))?
            .map(|value| Self::deserialize(value.as_ref()))
            .transpose()
    }

    fn revoke_session(&self, token_digest: &str) -> Result<(), DomainError> {
        self.sessions
            .remove(token_digest.as_bytes())
            .map_err(|err| DomainError::storage(format!("failed to revoke session: {err}")))?;

        Self::flush(&self.sessions, "sessions")
    }
}
