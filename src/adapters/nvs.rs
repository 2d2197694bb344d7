//! NVS (Non-Volatile Storage) adapter.
//!
//! Implements [`BlobStore`] for the session record and [`ConfigPort`] for
//! the node configuration.
//!
//! - Namespace handles are RAII: [`NvsNamespace`] calls `nvs_close` on drop.
//! - Every `write`/`delete`/`clear` is followed by its own `nvs_commit`.
//!   Two writes are two commits.
//! - Names are limited to [`MAX_NAME_LEN`] bytes and are never truncated.
//! - The simulation backend keeps a `HashMap` keyed by `(namespace, key)`
//!   with the same isolation rules (dev/test only).

use crate::app::ports::{
    BlobNamespace, BlobStore, ConfigError, ConfigPort, MAX_NAME_LEN, StorageError,
};
use crate::config::{self, NodeConfig};
use log::{info, warn};

#[cfg(not(target_os = "espidf"))]
use std::collections::HashMap;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

const CONFIG_NAMESPACE: &str = "node";
const CONFIG_KEY: &str = "cfg";

/// Stored configs larger than this are treated as corrupt.
const MAX_CONFIG_BLOB: usize = 256;

/// `ESP_ERR_NVS_INVALID_LENGTH`, mirrored by the simulation backend.
#[cfg(not(target_os = "espidf"))]
const SIM_INVALID_LENGTH: i32 = 0x110C;

pub struct NvsAdapter {
    #[cfg(not(target_os = "espidf"))]
    store: HashMap<(String, String), Vec<u8>>,
}

impl NvsAdapter {
    /// Create a new NvsAdapter and initialise NVS flash.
    ///
    /// On first boot or after a version mismatch the NVS partition is erased
    /// and re-initialised automatically; that also drops any persisted
    /// session, so the next wake joins fresh.
    pub fn new() -> Result<Self, StorageError> {
        #[cfg(target_os = "espidf")]
        {
            // SAFETY: nvs_flash_init / nvs_flash_erase are called from the
            // single main-task context before any NVS access.
            let ret = unsafe { nvs_flash_init() };
            if ret == ESP_ERR_NVS_NO_FREE_PAGES || ret == ESP_ERR_NVS_NEW_VERSION_FOUND {
                warn!("NvsAdapter: erasing and re-initialising flash partition");
                let ret = unsafe { nvs_flash_erase() };
                if ret != ESP_OK {
                    return Err(StorageError::IoError(ret));
                }
                let ret = unsafe { nvs_flash_init() };
                if ret != ESP_OK {
                    return Err(StorageError::IoError(ret));
                }
            } else if ret != ESP_OK {
                return Err(StorageError::IoError(ret));
            }
            info!("NvsAdapter: ESP-IDF NVS initialised");
        }

        #[cfg(not(target_os = "espidf"))]
        info!("NvsAdapter: simulation backend");

        Ok(Self {
            #[cfg(not(target_os = "espidf"))]
            store: HashMap::new(),
        })
    }
}

/// Reject names NVS would refuse (or silently truncate).
fn check_name(name: &str) -> Result<(), StorageError> {
    if name.is_empty() || name.len() > MAX_NAME_LEN || name.contains('\0') {
        return Err(StorageError::InvalidName);
    }
    Ok(())
}

impl BlobStore for NvsAdapter {
    type Namespace<'a> = NvsNamespace<'a>;

    #[cfg(not(target_os = "espidf"))]
    fn open(&mut self, namespace: &str) -> Result<NvsNamespace<'_>, StorageError> {
        check_name(namespace)?;
        Ok(NvsNamespace {
            namespace: namespace.to_string(),
            store: &mut self.store,
        })
    }

    #[cfg(target_os = "espidf")]
    fn open(&mut self, namespace: &str) -> Result<NvsNamespace<'_>, StorageError> {
        check_name(namespace)?;
        let ns = c_name(namespace);
        let mut handle: nvs_handle_t = 0;
        // SAFETY: `ns` is NUL-terminated and outlives the call.
        let ret = unsafe {
            nvs_open(
                ns.as_ptr() as *const _,
                nvs_open_mode_t_NVS_READWRITE,
                &mut handle,
            )
        };
        if ret != ESP_OK {
            warn!("NvsAdapter: nvs_open({}) failed: {}", namespace, ret);
            return Err(StorageError::IoError(ret));
        }
        Ok(NvsNamespace {
            handle,
            _adapter: core::marker::PhantomData,
        })
    }
}

// ── Namespace handle ───────────────────────────────────────────────

/// Open namespace.  Closed when dropped.
#[cfg(not(target_os = "espidf"))]
pub struct NvsNamespace<'a> {
    namespace: String,
    store: &'a mut HashMap<(String, String), Vec<u8>>,
}

#[cfg(not(target_os = "espidf"))]
impl NvsNamespace<'_> {
    fn composite_key(&self, key: &str) -> Result<(String, String), StorageError> {
        check_name(key)?;
        Ok((self.namespace.clone(), key.to_string()))
    }
}

#[cfg(not(target_os = "espidf"))]
impl BlobNamespace for NvsNamespace<'_> {
    fn blob_len(&self, key: &str) -> Option<usize> {
        let key = self.composite_key(key).ok()?;
        self.store.get(&key).map(Vec::len)
    }

    fn read(&self, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        let key = self.composite_key(key)?;
        let data = self.store.get(&key).ok_or(StorageError::NotFound)?;
        if data.len() > buf.len() {
            return Err(StorageError::IoError(SIM_INVALID_LENGTH));
        }
        buf[..data.len()].copy_from_slice(data);
        Ok(data.len())
    }

    fn write(&mut self, key: &str, data: &[u8]) -> Result<(), StorageError> {
        let key = self.composite_key(key)?;
        self.store.insert(key, data.to_vec());
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<(), StorageError> {
        let key = self.composite_key(key)?;
        self.store.remove(&key);
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StorageError> {
        let ns = &self.namespace;
        self.store.retain(|(n, _), _| n != ns);
        Ok(())
    }
}

#[cfg(target_os = "espidf")]
pub struct NvsNamespace<'a> {
    handle: nvs_handle_t,
    _adapter: core::marker::PhantomData<&'a mut NvsAdapter>,
}

#[cfg(target_os = "espidf")]
fn c_name(name: &str) -> [u8; MAX_NAME_LEN + 1] {
    let mut buf = [0u8; MAX_NAME_LEN + 1];
    let len = name.len().min(MAX_NAME_LEN);
    buf[..len].copy_from_slice(&name.as_bytes()[..len]);
    buf
}

#[cfg(target_os = "espidf")]
impl NvsNamespace<'_> {
    fn commit(&mut self) -> Result<(), StorageError> {
        let ret = unsafe { nvs_commit(self.handle) };
        if ret != ESP_OK {
            return Err(StorageError::IoError(ret));
        }
        Ok(())
    }
}

#[cfg(target_os = "espidf")]
impl BlobNamespace for NvsNamespace<'_> {
    fn blob_len(&self, key: &str) -> Option<usize> {
        check_name(key).ok()?;
        let key = c_name(key);
        let mut size: usize = 0;
        // Null output pointer: NVS only reports the stored length.
        let ret = unsafe {
            nvs_get_blob(
                self.handle,
                key.as_ptr() as *const _,
                core::ptr::null_mut(),
                &mut size,
            )
        };
        (ret == ESP_OK).then_some(size)
    }

    fn read(&self, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        check_name(key)?;
        let key = c_name(key);
        let mut size = buf.len();
        let ret = unsafe {
            nvs_get_blob(
                self.handle,
                key.as_ptr() as *const _,
                buf.as_mut_ptr() as *mut _,
                &mut size,
            )
        };
        if ret == ESP_ERR_NVS_NOT_FOUND {
            return Err(StorageError::NotFound);
        }
        if ret != ESP_OK {
            return Err(StorageError::IoError(ret));
        }
        Ok(size)
    }

    fn write(&mut self, key: &str, data: &[u8]) -> Result<(), StorageError> {
        check_name(key)?;
        let key = c_name(key);
        let ret = unsafe {
            nvs_set_blob(
                self.handle,
                key.as_ptr() as *const _,
                data.as_ptr() as *const _,
                data.len(),
            )
        };
        if ret == ESP_ERR_NVS_NOT_ENOUGH_SPACE {
            return Err(StorageError::Full);
        }
        if ret != ESP_OK {
            return Err(StorageError::IoError(ret));
        }
        self.commit()
    }

    fn delete(&mut self, key: &str) -> Result<(), StorageError> {
        check_name(key)?;
        let key = c_name(key);
        let ret = unsafe { nvs_erase_key(self.handle, key.as_ptr() as *const _) };
        if ret != ESP_OK && ret != ESP_ERR_NVS_NOT_FOUND {
            return Err(StorageError::IoError(ret));
        }
        self.commit()
    }

    fn clear(&mut self) -> Result<(), StorageError> {
        let ret = unsafe { nvs_erase_all(self.handle) };
        if ret != ESP_OK {
            return Err(StorageError::IoError(ret));
        }
        self.commit()
    }
}

#[cfg(target_os = "espidf")]
impl Drop for NvsNamespace<'_> {
    fn drop(&mut self) {
        // SAFETY: handle came from a successful nvs_open and is closed once.
        unsafe { nvs_close(self.handle) };
    }
}

// ── Configuration ──────────────────────────────────────────────────

impl ConfigPort for NvsAdapter {
    fn load(&mut self) -> Result<NodeConfig, ConfigError> {
        let ns = match self.open(CONFIG_NAMESPACE) {
            Ok(ns) => ns,
            Err(e) => {
                warn!("NvsAdapter: config namespace unavailable ({}), using defaults", e);
                return Ok(NodeConfig::default());
            }
        };

        let Some(len) = ns.blob_len(CONFIG_KEY) else {
            info!("NvsAdapter: no stored config, using defaults");
            return Ok(NodeConfig::default());
        };
        if len == 0 || len > MAX_CONFIG_BLOB {
            return Err(ConfigError::Corrupted);
        }

        let mut buf = vec![0u8; len];
        let n = ns.read(CONFIG_KEY, &mut buf).map_err(|_| ConfigError::IoError)?;
        let cfg: NodeConfig = postcard::from_bytes(&buf[..n]).map_err(|_| ConfigError::Corrupted)?;
        config::validate(&cfg).map_err(ConfigError::ValidationFailed)?;
        info!("NvsAdapter: loaded config ({} bytes)", n);
        Ok(cfg)
    }

    fn save(&mut self, config: &NodeConfig) -> Result<(), ConfigError> {
        config::validate(config).map_err(ConfigError::ValidationFailed)?;
        let bytes = postcard::to_allocvec(config).map_err(|_| ConfigError::IoError)?;
        let mut ns = self.open(CONFIG_NAMESPACE).map_err(|_| ConfigError::IoError)?;
        ns.write(CONFIG_KEY, &bytes).map_err(|e| {
            warn!("NvsAdapter: config write failed: {}", e);
            ConfigError::IoError
        })?;
        info!("NvsAdapter: config saved ({} bytes)", bytes.len());
        Ok(())
    }
}
