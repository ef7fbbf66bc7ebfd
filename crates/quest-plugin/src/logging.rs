use std::sync::Once;

static INIT: Once = Once::new();

/// Install the logger once per process; later calls are no-ops.
pub fn init() {
    INIT.call_once(|| {
        #[cfg(target_os = "android")]
        android_logger::init_once(
            android_logger::Config::default()
                .with_max_level(log::LevelFilter::Debug)
                .with_tag("QuestAppInfo"),
        );

        #[cfg(not(target_os = "android"))]
        {
            // the host may already own a logger
            let _ = env_logger::Builder::from_env(
                env_logger::Env::default().default_filter_or("info"),
            )
            .try_init();
        }

        log::debug!("QuestAppInfo logging ready");
    });
}
