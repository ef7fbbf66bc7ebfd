//! JNI-backed `Platform`: PackageManager, UsageStatsManager, AppOpsManager
//! and activity intents, reached through the host activity.

use core::ffi::c_void;
use std::collections::{BTreeMap, HashMap};

use jni::objects::{GlobalRef, JObject, JObjectArray, JString, JValue};
use jni::sys::{jint, jobject, JNI_VERSION_1_6};
use jni::{JNIEnv, JavaVM};
use log::{debug, info};
use once_cell::sync::OnceCell;
use quest_core::platform::{
    ActivityLauncher, AppRegistry, ApplicationDescriptor, FeatureInfo, IconBitmap,
    UsageStatsSource, VR_MODE_METADATA_KEY,
};
use quest_core::PlatformError;

use crate::enumerated::Enumerated;

const GET_META_DATA: jint = 0x0000_0080;
const GET_CONFIGURATIONS: jint = 0x0000_4000;
const FLAG_ACTIVITY_NEW_TASK: jint = 0x1000_0000;
const MODE_ALLOWED: jint = 0;
const MODE_DEFAULT: jint = 3;
const PERMISSION_GRANTED: jint = 0;
const FALLBACK_ICON_SIZE: jint = 128;

const NAME_NOT_FOUND: &str = "android/content/pm/PackageManager$NameNotFoundException";
const USAGE_ACCESS_SETTINGS: &str = "android.settings.USAGE_ACCESS_SETTINGS";

static VM: OnceCell<JavaVM> = OnceCell::new();
static ACTIVITY: OnceCell<GlobalRef> = OnceCell::new();

/// Called by the runtime on `System.loadLibrary("QuestAppInfo")`.
#[no_mangle]
pub extern "system" fn JNI_OnLoad(vm: JavaVM, _reserved: *mut c_void) -> jint {
    crate::logging::init();
    let _ = VM.set(vm);
    JNI_VERSION_1_6
}

/// Pin the host activity and publish it through `ndk_context`. Only the
/// first activity is kept; later calls are accepted and ignored.
pub fn attach(activity: *mut c_void) -> Result<(), PlatformError> {
    let vm = VM.get().ok_or(PlatformError::Unavailable)?;
    if ACTIVITY.get().is_some() {
        debug!("activity already attached");
        return Ok(());
    }
    let env = vm.attach_current_thread().map_err(call_err)?;
    let local = unsafe { JObject::from_raw(activity as jobject) };
    let global = env.new_global_ref(&local).map_err(call_err)?;

    ACTIVITY.get_or_init(|| {
        unsafe {
            ndk_context::initialize_android_context(
                vm.get_java_vm_pointer().cast(),
                global.as_obj().as_raw().cast(),
            );
        }
        info!("host activity attached");
        global
    });
    Ok(())
}

fn call_err(e: jni::errors::Error) -> PlatformError {
    PlatformError::Call(e.to_string())
}

enum Failure {
    Jni(jni::errors::Error),
    NotFound(String),
    Call(String),
}

impl From<jni::errors::Error> for Failure {
    fn from(e: jni::errors::Error) -> Self {
        Failure::Jni(e)
    }
}

type JniResult<T> = Result<T, Failure>;

/// Every call goes through the attached activity. The `ApplicationInfo`
/// objects of the last enumeration are kept so labels and icons still
/// resolve for packages removed since.
pub struct AndroidPlatform {
    infos: Enumerated<GlobalRef>,
}

impl AndroidPlatform {
    pub fn attached() -> Result<Self, PlatformError> {
        if ACTIVITY.get().is_none() {
            return Err(PlatformError::Unavailable);
        }
        Ok(AndroidPlatform {
            infos: Enumerated::new(),
        })
    }

    /// The enumerated `ApplicationInfo`, or a fresh lookup by package name.
    fn app_info<'local>(
        &self,
        env: &mut JNIEnv<'local>,
        pm: &JObject,
        package: &str,
    ) -> JniResult<JObject<'local>> {
        match self.infos.get(package) {
            Some(info) => Ok(env.new_local_ref(info.as_obj())?),
            None => application_info(env, pm, package),
        }
    }

    fn with_env<T>(
        &self,
        f: impl FnOnce(&mut JNIEnv, &JObject) -> JniResult<T>,
    ) -> Result<T, PlatformError> {
        if ACTIVITY.get().is_none() {
            return Err(PlatformError::Unavailable);
        }
        let ctx = ndk_context::android_context();
        let vm = unsafe { JavaVM::from_raw(ctx.vm().cast()) }.map_err(call_err)?;
        let mut env = vm.attach_current_thread().map_err(call_err)?;
        let activity = unsafe { JObject::from_raw(ctx.context().cast()) };

        match env.with_local_frame(32, |env| f(env, &activity)) {
            Ok(v) => Ok(v),
            Err(Failure::NotFound(pkg)) => Err(PlatformError::PackageNotFound(pkg)),
            Err(Failure::Call(msg)) => Err(PlatformError::Call(msg)),
            Err(Failure::Jni(e)) => match take_exception(&mut env) {
                Some(detail) => Err(PlatformError::Call(format!("{e}: {detail}"))),
                None => Err(call_err(e)),
            },
        }
    }
}

// -----------------------------
// JNI helpers
// -----------------------------

fn java_string(env: &mut JNIEnv, obj: &JObject) -> jni::errors::Result<String> {
    Ok(env.get_string(<&JString>::from(obj))?.into())
}

fn nullable_string(env: &mut JNIEnv, obj: &JObject) -> jni::errors::Result<Option<String>> {
    if obj.is_null() {
        return Ok(None);
    }
    java_string(env, obj).map(Some)
}

/// Clear any pending exception and describe it.
fn take_exception(env: &mut JNIEnv) -> Option<String> {
    if !env.exception_check().unwrap_or(false) {
        return None;
    }
    let throwable = env.exception_occurred().ok()?;
    env.exception_clear().ok()?;
    let text = env
        .call_method(&throwable, "toString", "()Ljava/lang/String;", &[])
        .and_then(|v| v.l())
        .and_then(|s| java_string(env, &s));
    let _ = env.delete_local_ref(throwable);
    Some(text.unwrap_or_else(|_| "java exception".to_string()))
}

/// Map `NameNotFoundException` from a package lookup to `Failure::NotFound`.
fn package_lookup<T>(env: &mut JNIEnv, package: &str, r: jni::errors::Result<T>) -> JniResult<T> {
    match r {
        Err(jni::errors::Error::JavaException) => {
            let throwable = env.exception_occurred()?;
            env.exception_clear()?;
            if env.is_instance_of(&throwable, NAME_NOT_FOUND)? {
                Err(Failure::NotFound(package.to_string()))
            } else {
                let text = env
                    .call_method(&throwable, "toString", "()Ljava/lang/String;", &[])?
                    .l()?;
                Err(Failure::Call(java_string(env, &text)?))
            }
        }
        other => Ok(other?),
    }
}

fn package_manager<'local>(env: &mut JNIEnv<'local>, ctx: &JObject) -> JniResult<JObject<'local>> {
    Ok(env
        .call_method(ctx, "getPackageManager", "()Landroid/content/pm/PackageManager;", &[])?
        .l()?)
}

fn system_service<'local>(
    env: &mut JNIEnv<'local>,
    ctx: &JObject,
    name: &str,
) -> JniResult<JObject<'local>> {
    let name = env.new_string(name)?;
    let svc = env
        .call_method(
            ctx,
            "getSystemService",
            "(Ljava/lang/String;)Ljava/lang/Object;",
            &[JValue::Object(&name)],
        )?
        .l()?;
    if svc.is_null() {
        return Err(Failure::Call("system service unavailable".into()));
    }
    Ok(svc)
}

fn application_info<'local>(
    env: &mut JNIEnv<'local>,
    pm: &JObject,
    package: &str,
) -> JniResult<JObject<'local>> {
    let name = env.new_string(package)?;
    let r = env
        .call_method(
            pm,
            "getApplicationInfo",
            "(Ljava/lang/String;I)Landroid/content/pm/ApplicationInfo;",
            &[JValue::Object(&name), JValue::Int(0)],
        )
        .and_then(|v| v.l());
    package_lookup(env, package, r)
}

fn read_descriptor(env: &mut JNIEnv, info: &JObject) -> JniResult<ApplicationDescriptor> {
    let name = env.get_field(info, "packageName", "Ljava/lang/String;")?.l()?;
    let package_name = java_string(env, &name)?;
    let flags = env.get_field(info, "flags", "I")?.i()? as u32;

    let bundle = env.get_field(info, "metaData", "Landroid/os/Bundle;")?.l()?;
    let metadata = if bundle.is_null() {
        None
    } else {
        let key = env.new_string(VR_MODE_METADATA_KEY)?;
        let value = env
            .call_method(
                &bundle,
                "getString",
                "(Ljava/lang/String;)Ljava/lang/String;",
                &[JValue::Object(&key)],
            )?
            .l()?;
        let mut map = BTreeMap::new();
        if let Some(v) = nullable_string(env, &value)? {
            map.insert(VR_MODE_METADATA_KEY.to_string(), v);
        }
        Some(map)
    };

    Ok(ApplicationDescriptor {
        package_name,
        flags,
        metadata,
    })
}

/// Unpack `int` ARGB pixels (non-premultiplied) into RGBA bytes.
fn argb_to_rgba(pixels: &[jint]) -> Vec<u8> {
    let mut out = Vec::with_capacity(pixels.len() * 4);
    for &p in pixels {
        let p = p as u32;
        out.extend_from_slice(&[(p >> 16) as u8, (p >> 8) as u8, p as u8, (p >> 24) as u8]);
    }
    out
}

// -----------------------------
// Platform impls
// -----------------------------

impl AppRegistry for AndroidPlatform {
    fn installed_applications(&self) -> Result<Vec<ApplicationDescriptor>, PlatformError> {
        self.with_env(|env, ctx| {
            let pm = package_manager(env, ctx)?;
            let list = env
                .call_method(
                    &pm,
                    "getInstalledApplications",
                    "(I)Ljava/util/List;",
                    &[JValue::Int(GET_META_DATA)],
                )?
                .l()?;
            let n = env.call_method(&list, "size", "()I", &[])?.i()?;

            let mut apps = Vec::with_capacity(n.max(0) as usize);
            let mut infos = Vec::with_capacity(n.max(0) as usize);
            for i in 0..n {
                let (app, info) = env.with_local_frame(8, |env| -> JniResult<_> {
                    let info = env
                        .call_method(&list, "get", "(I)Ljava/lang/Object;", &[JValue::Int(i)])?
                        .l()?;
                    let app = read_descriptor(env, &info)?;
                    Ok((app, env.new_global_ref(&info)?))
                })?;
                infos.push((app.package_name.clone(), info));
                apps.push(app);
            }
            self.infos.replace(infos);
            debug!("package manager reported {} applications", apps.len());
            Ok(apps)
        })
    }

    fn application_label(&self, app: &ApplicationDescriptor) -> Result<String, PlatformError> {
        self.with_env(|env, ctx| {
            let pm = package_manager(env, ctx)?;
            let info = self.app_info(env, &pm, &app.package_name)?;
            let label = env
                .call_method(
                    &pm,
                    "getApplicationLabel",
                    "(Landroid/content/pm/ApplicationInfo;)Ljava/lang/CharSequence;",
                    &[JValue::Object(&info)],
                )?
                .l()?;
            let text = env
                .call_method(&label, "toString", "()Ljava/lang/String;", &[])?
                .l()?;
            Ok(java_string(env, &text)?)
        })
    }

    fn required_features(
        &self,
        package_name: &str,
    ) -> Result<Option<Vec<FeatureInfo>>, PlatformError> {
        self.with_env(|env, ctx| {
            let pm = package_manager(env, ctx)?;
            let name = env.new_string(package_name)?;
            let r = env
                .call_method(
                    &pm,
                    "getPackageInfo",
                    "(Ljava/lang/String;I)Landroid/content/pm/PackageInfo;",
                    &[JValue::Object(&name), JValue::Int(GET_CONFIGURATIONS)],
                )
                .and_then(|v| v.l());
            let pkg = package_lookup(env, package_name, r)?;

            let arr = env
                .get_field(&pkg, "reqFeatures", "[Landroid/content/pm/FeatureInfo;")?
                .l()?;
            if arr.is_null() {
                return Ok(None);
            }
            let arr = JObjectArray::from(arr);
            let n = env.get_array_length(&arr)?;
            let mut features = Vec::with_capacity(n.max(0) as usize);
            for i in 0..n {
                let feature = env.get_object_array_element(&arr, i)?;
                if feature.is_null() {
                    features.push(FeatureInfo { name: None });
                    continue;
                }
                let name = env.get_field(&feature, "name", "Ljava/lang/String;")?.l()?;
                features.push(FeatureInfo {
                    name: nullable_string(env, &name)?,
                });
                env.delete_local_ref(name)?;
                env.delete_local_ref(feature)?;
            }
            Ok(Some(features))
        })
    }

    fn application_icon(&self, app: &ApplicationDescriptor) -> Result<IconBitmap, PlatformError> {
        self.with_env(|env, ctx| {
            let pm = package_manager(env, ctx)?;
            let info = self.app_info(env, &pm, &app.package_name)?;
            let drawable = env
                .call_method(
                    &pm,
                    "getApplicationIcon",
                    "(Landroid/content/pm/ApplicationInfo;)Landroid/graphics/drawable/Drawable;",
                    &[JValue::Object(&info)],
                )?
                .l()?;

            let mut w = env.call_method(&drawable, "getIntrinsicWidth", "()I", &[])?.i()?;
            let mut h = env.call_method(&drawable, "getIntrinsicHeight", "()I", &[])?.i()?;
            if w <= 0 || h <= 0 {
                w = FALLBACK_ICON_SIZE;
                h = FALLBACK_ICON_SIZE;
            }

            let config = env
                .get_static_field(
                    "android/graphics/Bitmap$Config",
                    "ARGB_8888",
                    "Landroid/graphics/Bitmap$Config;",
                )?
                .l()?;
            let bitmap = env
                .call_static_method(
                    "android/graphics/Bitmap",
                    "createBitmap",
                    "(IILandroid/graphics/Bitmap$Config;)Landroid/graphics/Bitmap;",
                    &[JValue::Int(w), JValue::Int(h), JValue::Object(&config)],
                )?
                .l()?;
            let canvas = env.new_object(
                "android/graphics/Canvas",
                "(Landroid/graphics/Bitmap;)V",
                &[JValue::Object(&bitmap)],
            )?;
            env.call_method(
                &drawable,
                "setBounds",
                "(IIII)V",
                &[JValue::Int(0), JValue::Int(0), JValue::Int(w), JValue::Int(h)],
            )?;
            env.call_method(
                &drawable,
                "draw",
                "(Landroid/graphics/Canvas;)V",
                &[JValue::Object(&canvas)],
            )?;

            let pixels = env.new_int_array(w * h)?;
            env.call_method(
                &bitmap,
                "getPixels",
                "([IIIIIII)V",
                &[
                    JValue::Object(&pixels),
                    JValue::Int(0),
                    JValue::Int(w),
                    JValue::Int(0),
                    JValue::Int(0),
                    JValue::Int(w),
                    JValue::Int(h),
                ],
            )?;
            let mut argb = vec![0 as jint; (w * h) as usize];
            env.get_int_array_region(&pixels, 0, &mut argb)?;
            env.call_method(&bitmap, "recycle", "()V", &[])?;

            Ok(IconBitmap {
                width: w as u32,
                height: h as u32,
                rgba: argb_to_rgba(&argb),
            })
        })
    }

    fn own_package_name(&self) -> Result<String, PlatformError> {
        self.with_env(|env, ctx| {
            let name = env
                .call_method(ctx, "getPackageName", "()Ljava/lang/String;", &[])?
                .l()?;
            Ok(java_string(env, &name)?)
        })
    }
}

impl UsageStatsSource for AndroidPlatform {
    fn has_usage_access(&self) -> Result<bool, PlatformError> {
        self.with_env(|env, ctx| {
            let app_ops = system_service(env, ctx, "appops")?;
            let uid = env
                .call_static_method("android/os/Process", "myUid", "()I", &[])?
                .i()?;
            let own = env
                .call_method(ctx, "getPackageName", "()Ljava/lang/String;", &[])?
                .l()?;
            let op = env.new_string("android:get_usage_stats")?;
            let mode = env
                .call_method(
                    &app_ops,
                    "checkOpNoThrow",
                    "(Ljava/lang/String;ILjava/lang/String;)I",
                    &[JValue::Object(&op), JValue::Int(uid), JValue::Object(&own)],
                )?
                .i()?;

            if mode == MODE_DEFAULT {
                let perm = env.new_string("android.permission.PACKAGE_USAGE_STATS")?;
                let granted = env
                    .call_method(
                        ctx,
                        "checkCallingOrSelfPermission",
                        "(Ljava/lang/String;)I",
                        &[JValue::Object(&perm)],
                    )?
                    .i()?;
                return Ok(granted == PERMISSION_GRANTED);
            }
            Ok(mode == MODE_ALLOWED)
        })
    }

    fn last_used_between(
        &self,
        start_ms: i64,
        end_ms: i64,
    ) -> Result<HashMap<String, i64>, PlatformError> {
        self.with_env(|env, ctx| {
            let usm = system_service(env, ctx, "usagestats")?;
            let stats = env
                .call_method(
                    &usm,
                    "queryAndAggregateUsageStats",
                    "(JJ)Ljava/util/Map;",
                    &[JValue::Long(start_ms), JValue::Long(end_ms)],
                )?
                .l()?;
            let mut out = HashMap::new();
            if stats.is_null() {
                return Ok(out);
            }

            let keys = env.call_method(&stats, "keySet", "()Ljava/util/Set;", &[])?.l()?;
            let keys = JObjectArray::from(
                env.call_method(&keys, "toArray", "()[Ljava/lang/Object;", &[])?
                    .l()?,
            );
            let n = env.get_array_length(&keys)?;
            for i in 0..n {
                let entry = env.with_local_frame(8, |env| -> JniResult<_> {
                    let key = env.get_object_array_element(&keys, i)?;
                    let record = env
                        .call_method(
                            &stats,
                            "get",
                            "(Ljava/lang/Object;)Ljava/lang/Object;",
                            &[JValue::Object(&key)],
                        )?
                        .l()?;
                    if record.is_null() {
                        return Ok(None);
                    }
                    let ts = env.call_method(&record, "getLastTimeStamp", "()J", &[])?.j()?;
                    Ok(Some((java_string(env, &key)?, ts)))
                })?;
                if let Some((pkg, ts)) = entry {
                    out.insert(pkg, ts);
                }
            }
            Ok(out)
        })
    }
}

impl ActivityLauncher for AndroidPlatform {
    fn open_usage_access_settings(&self) -> Result<(), PlatformError> {
        self.with_env(|env, ctx| {
            let action = env.new_string(USAGE_ACCESS_SETTINGS)?;
            let intent = env.new_object(
                "android/content/Intent",
                "(Ljava/lang/String;)V",
                &[JValue::Object(&action)],
            )?;
            start_activity(env, ctx, &intent)
        })
    }

    fn launch_package(&self, package_name: &str) -> Result<(), PlatformError> {
        self.with_env(|env, ctx| {
            let pm = package_manager(env, ctx)?;
            let name = env.new_string(package_name)?;
            let intent = env
                .call_method(
                    &pm,
                    "getLaunchIntentForPackage",
                    "(Ljava/lang/String;)Landroid/content/Intent;",
                    &[JValue::Object(&name)],
                )?
                .l()?;
            if intent.is_null() {
                return Err(Failure::NotFound(package_name.to_string()));
            }
            start_activity(env, ctx, &intent)
        })
    }
}

fn start_activity(env: &mut JNIEnv, ctx: &JObject, intent: &JObject) -> JniResult<()> {
    env.call_method(
        intent,
        "addFlags",
        "(I)Landroid/content/Intent;",
        &[JValue::Int(FLAG_ACTIVITY_NEW_TASK)],
    )?;
    env.call_method(
        ctx,
        "startActivity",
        "(Landroid/content/Intent;)V",
        &[JValue::Object(intent)],
    )?;
    Ok(())
}
