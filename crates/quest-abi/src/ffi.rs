use core::ffi::{c_char, c_void};

/// Bump this when you break the ABI. Host checks it at load time.
pub const QUEST_ABI_VERSION: u32 = 1;

pub const PLUGIN_ENTRY_SYMBOL: &str = "quest_plugin_entry_v1";

pub const ERR_OK: i32 = 0;
pub const ERR_FAIL: i32 = 1;
pub const ERR_OUT_OF_RANGE: i32 = 2;
pub const ERR_NOT_LOADED: i32 = 3;
pub const ERR_INVALID_ARG: i32 = 4;

/// Booleans cross the boundary as `i32`; errors are the negated `ERR_*` code.
pub const BOOL_FALSE: i32 = 0;
pub const BOOL_TRUE: i32 = 1;

/// NUL-terminated UTF-8 owned by the plugin. `len` excludes the terminator.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct QuestString {
    pub ptr: *mut c_char,
    pub len: usize,
}

impl QuestString {
    pub const fn null() -> Self {
        Self {
            ptr: core::ptr::null_mut(),
            len: 0,
        }
    }

    pub fn is_null(&self) -> bool {
        self.ptr.is_null()
    }
}

/// Byte buffer owned by the plugin (JPEG icons, raw pixels).
#[repr(C)]
#[derive(Clone, Copy)]
pub struct QuestBytes {
    pub ptr: *mut u8,
    pub len: usize,
}

impl QuestBytes {
    pub const fn null() -> Self {
        Self {
            ptr: core::ptr::null_mut(),
            len: 0,
        }
    }

    pub fn is_null(&self) -> bool {
        self.ptr.is_null()
    }
}

/// RGBA8 pixels, rows top to bottom. Free `pixels` with `free_bytes`.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct QuestImage {
    pub pixels: QuestBytes,
    pub width: u32,
    pub height: u32,
}

impl QuestImage {
    pub const fn null() -> Self {
        Self {
            pixels: QuestBytes::null(),
            width: 0,
            height: 0,
        }
    }
}

#[repr(C)]
pub struct PluginInfo {
    pub abi_version: u32,
    pub id: *const c_char,     // "quest-app-info"
    pub semver: *const c_char, // "0.1.0"
}

// ---------- Function pointer types (C ABI) ----------

/// `activity` is a JNI `jobject` for the host activity (Unity's `currentActivity`).
pub type AttachContextFn = unsafe extern "C" fn(activity: *mut c_void) -> i32;
/// `config_json` may be null for defaults (see `CatalogConfig`).
pub type LoadCatalogFn = unsafe extern "C" fn(config_json: *const c_char) -> i32;
pub type SizeFn = unsafe extern "C" fn() -> i32;
pub type StringAtFn = unsafe extern "C" fn(index: i32) -> QuestString;
pub type BoolAtFn = unsafe extern "C" fn(index: i32) -> i32;
/// Epoch millis, 0 when unset, or a negated error code.
pub type TimestampAtFn = unsafe extern "C" fn(index: i32) -> i64;
pub type BytesAtFn = unsafe extern "C" fn(index: i32) -> QuestBytes;
pub type StringFn = unsafe extern "C" fn() -> QuestString;
pub type PackageActionFn = unsafe extern "C" fn(package_name: *const c_char) -> i32;

pub type BoolFn = unsafe extern "C" fn() -> i32;
pub type ActionFn = unsafe extern "C" fn() -> i32;
/// Returns the number of updated records or a negated error code.
pub type RefreshLastUsedFn = unsafe extern "C" fn(days_lookback: i32) -> i32;

pub type ExtractArchiveFn =
    unsafe extern "C" fn(archive_path: *const c_char, target_dir: *const c_char) -> i32;
pub type UpsertArchiveEntryFn = unsafe extern "C" fn(
    archive_path: *const c_char,
    source_file_path: *const c_char,
    entry_name: *const c_char,
) -> i32;
/// Returns the number of packs extracted or a negated error code.
pub type SyncIconPacksFn = unsafe extern "C" fn(packs_dir: *const c_char) -> i32;

pub type LoadRawImageFn = unsafe extern "C" fn(path: *const c_char, max_pixels: i32) -> QuestImage;

pub type LastErrorFn = unsafe extern "C" fn() -> QuestString;
pub type FreeStringFn = unsafe extern "C" fn(s: QuestString);
pub type FreeBytesFn = unsafe extern "C" fn(b: QuestBytes);

// ---------- VTables ----------

#[repr(C)]
pub struct CatalogApi {
    pub attach_context: AttachContextFn,
    pub load_catalog: LoadCatalogFn,

    pub size: SizeFn,
    pub package_name_at: StringAtFn,
    pub display_name_at: StringAtFn,
    pub is_vr_capable_at: BoolAtFn,
    pub is_2d_at: BoolAtFn,
    pub last_used_at: TimestampAtFn,
    /// JPEG-encoded icon.
    pub icon_bytes_at: BytesAtFn,

    /// JSON array of `quest_abi::dto::AppSnapshot`.
    pub catalog_json: StringFn,
    pub host_package_name: StringFn,
    pub launch_package: PackageActionFn,
}

#[repr(C)]
pub struct UsageApi {
    pub has_usage_access: BoolFn,
    /// Opens the platform settings screen; the grant is observed by the host later.
    pub request_usage_access: ActionFn,
    pub refresh_last_used: RefreshLastUsedFn,
}

#[repr(C)]
pub struct ArchiveApi {
    pub extract_archive: ExtractArchiveFn,
    /// Entry-name matching is case-insensitive.
    pub upsert_archive_entry: UpsertArchiveEntryFn,
    pub sync_icon_packs: SyncIconPacksFn,
}

#[repr(C)]
pub struct ImageApi {
    pub load_raw_image: LoadRawImageFn,
}

#[repr(C)]
pub struct PluginApi {
    pub info: PluginInfo,
    pub catalog: CatalogApi,
    pub usage: UsageApi,
    pub archive: ArchiveApi,
    pub image: ImageApi,

    // Diagnostics & memory management
    pub last_error: LastErrorFn,
    pub free_string: FreeStringFn,
    pub free_bytes: FreeBytesFn,
}

/// Plugin must export `quest_plugin_entry_v1` returning a pointer to a static `PluginApi`.
pub type PluginEntryFn = unsafe extern "C" fn() -> *const PluginApi;
