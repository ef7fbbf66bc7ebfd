//! QuestAppInfo plugin: C-ABI shim the launcher host loads at runtime.
//!
//! The host resolves `quest_plugin_entry_v1`, then calls `attach_context`
//! with its activity and `load_catalog` before any index-based read.

#[cfg(target_os = "android")]
mod android;
#[cfg_attr(not(target_os = "android"), allow(dead_code))]
mod enumerated;
mod logging;

use core::ffi::{c_char, c_void};
use std::ffi::{CStr, CString};
use std::path::Path;
use std::sync::Arc;

use log::{log, warn, Level};
use once_cell::sync::Lazy;
use quest_abi::ffi::*;
use quest_core::{
    extract_archive, load_raw_image, sync_icon_packs, upsert_archive_entry, AppCatalog,
    CatalogConfig, CatalogState, Platform, QuestError,
};

static STATE: Lazy<CatalogState> = Lazy::new(CatalogState::new);

// -----------------------------
// Error plumbing (thread-local)
// -----------------------------

thread_local! {
    static LAST_ERR: std::cell::RefCell<Option<CString>> = const { std::cell::RefCell::new(None) };
}

fn set_last_error(msg: impl AsRef<str>) -> i32 {
    LAST_ERR.with(|slot| *slot.borrow_mut() = Some(to_cstring(msg.as_ref())));
    ERR_FAIL
}

/// `ERR_*` code and log level for `e`. Caller mistakes stay below `Error`.
fn classify(e: &QuestError) -> (i32, Level) {
    match e {
        QuestError::IndexOutOfRange { .. } => (ERR_OUT_OF_RANGE, Level::Warn),
        QuestError::NotLoaded => (ERR_NOT_LOADED, Level::Debug),
        _ => (ERR_FAIL, Level::Error),
    }
}

/// Record `e` and map it to its `ERR_*` code.
fn fail(e: QuestError) -> i32 {
    let (code, level) = classify(&e);
    log!(level, "{e}");
    set_last_error(e.to_string());
    code
}

fn invalid_arg(msg: impl AsRef<str>) -> i32 {
    set_last_error(msg);
    ERR_INVALID_ARG
}

unsafe extern "C" fn last_error() -> QuestString {
    let s = LAST_ERR.with(|slot| slot.borrow().clone());
    match s {
        Some(cs) => make_string(cs),
        None => QuestString::null(),
    }
}

// -----------------------------
// Helpers for FFI allocations
// -----------------------------

fn to_cstring(s: &str) -> CString {
    CString::new(s.replace('\0', "")).unwrap_or_default()
}

fn make_string(cs: CString) -> QuestString {
    let len = cs.as_bytes().len();
    QuestString {
        ptr: cs.into_raw(),
        len,
    }
}

fn make_string_from_utf8(s: &str) -> QuestString {
    make_string(to_cstring(s))
}

fn make_bytes(v: Vec<u8>) -> QuestBytes {
    let boxed = v.into_boxed_slice();
    let len = boxed.len();
    QuestBytes {
        ptr: Box::into_raw(boxed).cast::<u8>(),
        len,
    }
}

unsafe extern "C" fn free_string(s: QuestString) {
    if !s.ptr.is_null() {
        drop(CString::from_raw(s.ptr));
    }
}

unsafe extern "C" fn free_bytes(b: QuestBytes) {
    if !b.ptr.is_null() {
        drop(Box::from_raw(std::ptr::slice_from_raw_parts_mut(b.ptr, b.len)));
    }
}

/// Borrow a host string argument; `Err` carries the code to return.
unsafe fn str_arg<'a>(p: *const c_char, what: &str) -> Result<&'a str, i32> {
    if p.is_null() {
        return Err(invalid_arg(format!("null {what}")));
    }
    CStr::from_ptr(p)
        .to_str()
        .map_err(|e| invalid_arg(format!("invalid UTF-8 in {what}: {e}")))
}

fn bool_code(r: Result<bool, i32>) -> i32 {
    match r {
        Ok(true) => BOOL_TRUE,
        Ok(false) => BOOL_FALSE,
        Err(code) => -code,
    }
}

fn count_code(r: Result<usize, i32>) -> i32 {
    match r {
        Ok(n) => i32::try_from(n).unwrap_or(i32::MAX),
        Err(code) => -code,
    }
}

// -----------------------------
// Catalog access
// -----------------------------

fn platform() -> quest_core::Result<Arc<dyn Platform>> {
    #[cfg(target_os = "android")]
    {
        Ok(Arc::new(android::AndroidPlatform::attached()?))
    }
    #[cfg(not(target_os = "android"))]
    {
        Err(quest_core::PlatformError::Unavailable.into())
    }
}

fn with_catalog<T>(f: impl FnOnce(&AppCatalog) -> quest_core::Result<T>) -> Result<T, i32> {
    STATE.with_catalog(f).map_err(fail)
}

/// Run `f` against the record at `index`; negative indices are out of range.
fn at<T>(index: i32, f: impl FnOnce(&AppCatalog, usize) -> quest_core::Result<T>) -> Result<T, i32> {
    let Ok(i) = usize::try_from(index) else {
        set_last_error(format!("index {index} out of range"));
        return Err(ERR_OUT_OF_RANGE);
    };
    with_catalog(|c| f(c, i))
}

unsafe extern "C" fn attach_context(activity: *mut c_void) -> i32 {
    if activity.is_null() {
        return invalid_arg("null activity");
    }
    #[cfg(target_os = "android")]
    {
        match android::attach(activity) {
            Ok(()) => ERR_OK,
            Err(e) => fail(e.into()),
        }
    }
    #[cfg(not(target_os = "android"))]
    {
        fail(quest_core::PlatformError::Unavailable.into())
    }
}

unsafe extern "C" fn load_catalog(config_json: *const c_char) -> i32 {
    let config = if config_json.is_null() {
        CatalogConfig::default()
    } else {
        let js = match str_arg(config_json, "config_json") {
            Ok(v) => v,
            Err(code) => return code,
        };
        match CatalogConfig::from_json_str(js) {
            Ok(c) => c,
            Err(e) => return invalid_arg(format!("bad catalog config: {e}")),
        }
    };

    match platform().and_then(|p| AppCatalog::load(p, config)) {
        Ok(catalog) => {
            STATE.set_catalog(catalog);
            ERR_OK
        }
        Err(e) => fail(e),
    }
}

unsafe extern "C" fn size() -> i32 {
    count_code(with_catalog(|c| Ok(c.size())))
}

unsafe extern "C" fn package_name_at(index: i32) -> QuestString {
    match at(index, |c, i| c.package_name_at(i).map(str::to_owned)) {
        Ok(s) => make_string_from_utf8(&s),
        Err(_) => QuestString::null(),
    }
}

unsafe extern "C" fn display_name_at(index: i32) -> QuestString {
    match at(index, |c, i| c.display_name_at(i)) {
        Ok(s) => make_string_from_utf8(&s),
        Err(_) => QuestString::null(),
    }
}

unsafe extern "C" fn is_vr_capable_at(index: i32) -> i32 {
    bool_code(at(index, |c, i| c.is_vr_capable_at(i)))
}

unsafe extern "C" fn is_2d_at(index: i32) -> i32 {
    bool_code(at(index, |c, i| c.is_2d_at(i)))
}

unsafe extern "C" fn last_used_at(index: i32) -> i64 {
    match at(index, |c, i| c.last_used_at(i)) {
        Ok(ts) => ts.unwrap_or(0),
        Err(code) => -i64::from(code),
    }
}

unsafe extern "C" fn icon_bytes_at(index: i32) -> QuestBytes {
    match at(index, |c, i| c.icon_bytes_at(i)) {
        Ok(jpeg) => make_bytes(jpeg),
        Err(_) => QuestBytes::null(),
    }
}

unsafe extern "C" fn catalog_json() -> QuestString {
    match with_catalog(|c| Ok(serde_json::to_string(&c.snapshot()?)?)) {
        Ok(js) => make_string_from_utf8(&js),
        Err(_) => QuestString::null(),
    }
}

unsafe extern "C" fn host_package_name() -> QuestString {
    match with_catalog(|c| c.host_package_name()) {
        Ok(s) => make_string_from_utf8(&s),
        Err(_) => QuestString::null(),
    }
}

unsafe extern "C" fn launch_package(package_name: *const c_char) -> i32 {
    let name = match str_arg(package_name, "package_name") {
        Ok(v) => v,
        Err(code) => return code,
    };
    match with_catalog(|c| c.launch_package(name)) {
        Ok(()) => ERR_OK,
        Err(code) => code,
    }
}

// -----------------------------
// Usage API
// -----------------------------

unsafe extern "C" fn has_usage_access() -> i32 {
    bool_code(with_catalog(|c| Ok(c.has_usage_access())))
}

unsafe extern "C" fn request_usage_access() -> i32 {
    match with_catalog(|c| c.request_usage_access()) {
        Ok(()) => ERR_OK,
        Err(code) => code,
    }
}

unsafe extern "C" fn refresh_last_used(days_lookback: i32) -> i32 {
    let r = STATE
        .with_catalog_mut(|c| {
            let days = u32::try_from(days_lookback).unwrap_or_else(|_| {
                warn!("negative lookback {days_lookback}, using configured default");
                c.config().usage_lookback_days
            });
            c.refresh_last_used(days)
        })
        .map_err(fail);
    count_code(r)
}

// -----------------------------
// Archive & image API
// -----------------------------

unsafe extern "C" fn archive_extract(archive_path: *const c_char, target_dir: *const c_char) -> i32 {
    let (archive, target) = match (
        str_arg(archive_path, "archive_path"),
        str_arg(target_dir, "target_dir"),
    ) {
        (Ok(a), Ok(t)) => (a, t),
        (Err(code), _) | (_, Err(code)) => return code,
    };
    match extract_archive(Path::new(archive), Path::new(target)) {
        Ok(_) => ERR_OK,
        Err(e) => fail(e),
    }
}

unsafe extern "C" fn archive_upsert_entry(
    archive_path: *const c_char,
    source_file_path: *const c_char,
    entry_name: *const c_char,
) -> i32 {
    let args = (
        str_arg(archive_path, "archive_path"),
        str_arg(source_file_path, "source_file_path"),
        str_arg(entry_name, "entry_name"),
    );
    let (archive, source, entry) = match args {
        (Ok(a), Ok(s), Ok(e)) => (a, s, e),
        (Err(code), _, _) | (_, Err(code), _) | (_, _, Err(code)) => return code,
    };
    match upsert_archive_entry(Path::new(archive), Path::new(source), entry) {
        Ok(()) => ERR_OK,
        Err(e) => fail(e),
    }
}

unsafe extern "C" fn archive_sync_icon_packs(packs_dir: *const c_char) -> i32 {
    let dir = match str_arg(packs_dir, "packs_dir") {
        Ok(v) => v,
        Err(code) => return -code,
    };
    count_code(
        sync_icon_packs(Path::new(dir))
            .map(|s| s.extracted.len())
            .map_err(fail),
    )
}

unsafe extern "C" fn image_load_raw(path: *const c_char, max_pixels: i32) -> QuestImage {
    let p = match str_arg(path, "path") {
        Ok(v) => v,
        Err(_) => return QuestImage::null(),
    };
    // non-positive budget means full size
    let budget = u64::try_from(max_pixels).unwrap_or(0);
    match load_raw_image(Path::new(p), budget) {
        Ok(img) => QuestImage {
            width: img.width,
            height: img.height,
            pixels: make_bytes(img.rgba),
        },
        Err(e) => {
            fail(e);
            QuestImage::null()
        }
    }
}

// -----------------------------
// Static PluginApi surface
// -----------------------------

struct SyncApi(PluginApi);

// Only immutable pointers to static C strings.
unsafe impl Sync for SyncApi {}

static API: SyncApi = SyncApi(PluginApi {
    info: PluginInfo {
        abi_version: QUEST_ABI_VERSION,
        id: c"quest-app-info".as_ptr(),
        semver: c"0.1.0".as_ptr(),
    },
    catalog: CatalogApi {
        attach_context,
        load_catalog,
        size,
        package_name_at,
        display_name_at,
        is_vr_capable_at,
        is_2d_at,
        last_used_at,
        icon_bytes_at,
        catalog_json,
        host_package_name,
        launch_package,
    },
    usage: UsageApi {
        has_usage_access,
        request_usage_access,
        refresh_last_used,
    },
    archive: ArchiveApi {
        extract_archive: archive_extract,
        upsert_archive_entry: archive_upsert_entry,
        sync_icon_packs: archive_sync_icon_packs,
    },
    image: ImageApi {
        load_raw_image: image_load_raw,
    },
    last_error,
    free_string,
    free_bytes,
});

#[no_mangle]
pub extern "C" fn quest_plugin_entry_v1() -> *const PluginApi {
    logging::init();
    &API.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::{Read, Write};
    use tempfile::TempDir;
    use zip::write::FileOptions;
    use zip::{ZipArchive, ZipWriter};

    fn api() -> &'static PluginApi {
        unsafe { &*quest_plugin_entry_v1() }
    }

    fn cstr(p: &Path) -> CString {
        CString::new(p.to_str().unwrap()).unwrap()
    }

    fn take_error() -> String {
        let api = api();
        unsafe {
            let s = (api.last_error)();
            assert!(!s.is_null());
            let msg = CStr::from_ptr(s.ptr).to_str().unwrap().to_owned();
            assert_eq!(msg.len(), s.len);
            (api.free_string)(s);
            msg
        }
    }

    #[test]
    fn entry_reports_abi_and_identity() {
        let api = api();
        assert_eq!(api.info.abi_version, QUEST_ABI_VERSION);
        let id = unsafe { CStr::from_ptr(api.info.id) };
        assert_eq!(id.to_str().unwrap(), "quest-app-info");
        assert!(std::ptr::eq(api, unsafe { &*quest_plugin_entry_v1() }));
    }

    // No test ever loads a catalog, so these see the unloaded state.
    #[test]
    fn reads_before_load_report_not_loaded() {
        let api = api();
        unsafe {
            assert_eq!((api.catalog.size)(), -ERR_NOT_LOADED);
            assert!((api.catalog.package_name_at)(0).is_null());
            assert!(take_error().contains("not loaded"));
            assert_eq!((api.catalog.is_vr_capable_at)(0), -ERR_NOT_LOADED);
            assert_eq!((api.catalog.last_used_at)(0), -i64::from(ERR_NOT_LOADED));
            assert!((api.catalog.icon_bytes_at)(0).is_null());
            assert_eq!((api.usage.has_usage_access)(), -ERR_NOT_LOADED);
            assert_eq!((api.usage.refresh_last_used)(30), -ERR_NOT_LOADED);
        }
    }

    #[test]
    fn caller_errors_are_not_logged_as_failures() {
        assert_eq!(classify(&QuestError::NotLoaded), (ERR_NOT_LOADED, Level::Debug));
        assert_eq!(
            classify(&QuestError::IndexOutOfRange { index: 9, len: 3 }),
            (ERR_OUT_OF_RANGE, Level::Warn)
        );
        assert_eq!(
            classify(&quest_core::PlatformError::Unavailable.into()),
            (ERR_FAIL, Level::Error)
        );
    }

    #[test]
    fn negative_index_is_out_of_range() {
        let api = api();
        unsafe {
            assert_eq!((api.catalog.is_2d_at)(-1), -ERR_OUT_OF_RANGE);
            assert!(take_error().contains("-1"));
        }
    }

    #[test]
    fn null_arguments_are_rejected() {
        let api = api();
        unsafe {
            assert_eq!((api.catalog.attach_context)(std::ptr::null_mut()), ERR_INVALID_ARG);
            assert_eq!((api.catalog.launch_package)(std::ptr::null()), ERR_INVALID_ARG);
            assert_eq!(
                (api.archive.extract_archive)(std::ptr::null(), c"out".as_ptr()),
                ERR_INVALID_ARG
            );
            assert!(take_error().contains("archive_path"));
        }
    }

    #[test]
    fn bad_config_json_is_invalid_arg() {
        let api = api();
        unsafe {
            assert_eq!((api.catalog.load_catalog)(c"{\"filter\": 7}".as_ptr()), ERR_INVALID_ARG);
        }
    }

    #[cfg(not(target_os = "android"))]
    #[test]
    fn load_without_platform_fails() {
        let api = api();
        unsafe {
            assert_eq!((api.catalog.load_catalog)(std::ptr::null()), ERR_FAIL);
            assert!(take_error().contains("platform not available"));
        }
    }

    #[test]
    fn upsert_then_extract_through_the_table() {
        let api = api();
        let tmp = TempDir::new().unwrap();
        let zip_path = tmp.path().join("iconpack_rename.zip");
        let icon = tmp.path().join("icon.jpg");
        fs::write(&icon, b"jpeg").unwrap();

        let rc = unsafe {
            (api.archive.upsert_archive_entry)(
                cstr(&zip_path).as_ptr(),
                cstr(&icon).as_ptr(),
                c"com.a.jpg".as_ptr(),
            )
        };
        assert_eq!(rc, ERR_OK);
        let mut za = ZipArchive::new(fs::File::open(&zip_path).unwrap()).unwrap();
        let mut body = Vec::new();
        za.by_name("com.a.jpg").unwrap().read_to_end(&mut body).unwrap();
        assert_eq!(body, b"jpeg");

        let out = tmp.path().join("out");
        let rc = unsafe {
            (api.archive.extract_archive)(cstr(&zip_path).as_ptr(), cstr(&out).as_ptr())
        };
        assert_eq!(rc, ERR_OK);
        assert_eq!(fs::read(out.join("com.a.jpg")).unwrap(), b"jpeg");
    }

    #[test]
    fn extract_failure_sets_last_error() {
        let api = api();
        let tmp = TempDir::new().unwrap();
        let rc = unsafe {
            (api.archive.extract_archive)(
                cstr(&tmp.path().join("missing.zip")).as_ptr(),
                cstr(&tmp.path().join("out")).as_ptr(),
            )
        };
        assert_eq!(rc, ERR_FAIL);
        assert!(take_error().contains("I/O error"));
    }

    #[test]
    fn sync_counts_extracted_packs() {
        let api = api();
        let tmp = TempDir::new().unwrap();
        let mut zw = ZipWriter::new(fs::File::create(tmp.path().join("iconpack_a.zip")).unwrap());
        zw.start_file("com.a.jpg", FileOptions::default()).unwrap();
        zw.write_all(b"a").unwrap();
        zw.finish().unwrap();

        let dir = cstr(tmp.path());
        unsafe {
            assert_eq!((api.archive.sync_icon_packs)(dir.as_ptr()), 1);
            assert_eq!((api.archive.sync_icon_packs)(dir.as_ptr()), 0);
        }
    }

    #[test]
    fn raw_image_crosses_the_boundary() {
        let api = api();
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("tile.png");
        image::RgbaImage::from_pixel(40, 20, image::Rgba([1, 2, 3, 255]))
            .save(&path)
            .unwrap();

        let img = unsafe { (api.image.load_raw_image)(cstr(&path).as_ptr(), 200) };
        assert_eq!((img.width, img.height), (20, 10));
        assert_eq!(img.pixels.len, 20 * 10 * 4);
        assert_eq!(unsafe { std::slice::from_raw_parts(img.pixels.ptr, 4) }, &[1, 2, 3, 255]);
        unsafe { (api.free_bytes)(img.pixels) };

        fs::write(&path, b"not an image").unwrap();
        let img = unsafe { (api.image.load_raw_image)(cstr(&path).as_ptr(), 0) };
        assert!(img.pixels.is_null());
        assert_eq!((img.width, img.height), (0, 0));
        assert!(!take_error().is_empty());
    }

    #[test]
    fn owned_buffers_round_trip_through_free() {
        let api = api();
        let s = make_string_from_utf8("com.oculus.browser");
        assert_eq!(s.len, "com.oculus.browser".len());
        let b = make_bytes(vec![0xFF, 0xD8, 0xFF]);
        assert_eq!(unsafe { std::slice::from_raw_parts(b.ptr, b.len) }, &[0xFF, 0xD8, 0xFF]);
        unsafe {
            (api.free_string)(s);
            (api.free_bytes)(b);
            (api.free_string)(QuestString::null());
            (api.free_bytes)(QuestBytes::null());
        }
    }

    #[test]
    fn interior_nul_is_stripped() {
        let s = make_string_from_utf8("a\0b");
        assert_eq!(s.len, 2);
        unsafe { free_string(s) };
    }
}
