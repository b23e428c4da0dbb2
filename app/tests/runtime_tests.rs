#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::Arc;

    use adapters::desktop::{Banner, BannerHandle, BannerPresenter, Permission, SoundCue, SoundPlayer};
    use app::config::AppConfig;
    use app::runtime::{Collaborators, Runtime};
    use corelib::models::{AlertCondition, Category, NotificationDraft, Priority, SettingsPatch};
    use inbox::NotificationAction;
    use inbox::repository::NotificationRepository;
    use parking_lot::Mutex;
    use scheduler::{MotionSpec, RenderSink};

    #[derive(Default)]
    struct Desk {
        sounds: Mutex<usize>,
        banners: Mutex<Vec<String>>,
        renders: Mutex<Vec<String>>,
    }

    impl SoundPlayer for Desk {
        fn play(&self, _cue: SoundCue) -> anyhow::Result<()> {
            *self.sounds.lock() += 1;
            Ok(())
        }
    }

    impl BannerPresenter for Desk {
        fn permission(&self) -> Permission {
            Permission::Granted
        }

        fn request_permission(&self) -> Permission {
            Permission::Granted
        }

        fn show(&self, banner: &Banner) -> anyhow::Result<BannerHandle> {
            let mut banners = self.banners.lock();
            banners.push(banner.title.clone());
            Ok(BannerHandle(banners.len() as u32))
        }

        fn close(&self, _handle: BannerHandle) {}

        fn focus_app(&self) {}
    }

    impl RenderSink for Desk {
        fn animate(&self, target: &str, _spec: &MotionSpec) -> anyhow::Result<()> {
            self.renders.lock().push(target.to_string());
            Ok(())
        }
    }

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("signaldesk-app-{}-{name}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn mk_config(name: &str) -> AppConfig {
        let dir = scratch(name);
        AppConfig {
            database_url: format!("sqlite://{}", dir.join("notifications.db").display()),
            user_id: Some("user-1".into()),
            storage_path: Some(dir.join("client.json")),
            reduced_motion: true,
            ..Default::default()
        }
    }

    async fn mk_runtime(cfg: &AppConfig) -> (Runtime, Arc<Desk>) {
        let desk = Arc::new(Desk::default());
        let collaborators = Collaborators {
            sound: desk.clone(),
            banner: desk.clone(),
            render: desk.clone(),
        };
        let runtime = Runtime::start(cfg, collaborators).await.unwrap();
        (runtime, desk)
    }

    #[tokio::test]
    async fn stored_row_comes_back_through_change_feed() {
        let cfg = mk_config("feed");
        let (runtime, desk) = mk_runtime(&cfg).await;
        let hub = runtime.hub().clone();

        let draft = NotificationDraft::new(Category::Security, Priority::High, "Security Alert", "New device");
        runtime.repository().create("user-1", &draft).await.unwrap();
        runtime
            .repository()
            .create("someone-else", &draft)
            .await
            .unwrap();
        runtime.shutdown().await;

        let titles: Vec<String> = hub.select(|s| s.store().iter().map(|n| n.title.clone()).collect());
        assert_eq!(titles, ["Security Alert"], "other users' rows are filtered out");
        assert_eq!(*desk.sounds.lock(), 1);
        assert_eq!(desk.banners.lock().as_slice(), ["Security Alert"]);
        assert_eq!(desk.renders.lock().len(), 1);
    }

    #[tokio::test]
    async fn disabled_category_stays_out_end_to_end() {
        let cfg = mk_config("filter");
        let (runtime, desk) = mk_runtime(&cfg).await;
        let hub = runtime.hub().clone();
        hub.dispatch(NotificationAction::UpdateSettings(SettingsPatch {
            security_alerts: Some(false),
            ..Default::default()
        }));

        let draft = NotificationDraft::new(Category::Security, Priority::High, "Security Alert", "New device");
        runtime.repository().create("user-1", &draft).await.unwrap();
        runtime.shutdown().await;

        assert_eq!(hub.select(|s| s.store().len()), 0);
        assert_eq!(*desk.sounds.lock(), 0);
        assert!(desk.banners.lock().is_empty());
    }

    #[tokio::test]
    async fn alert_book_notifications_are_ingested() {
        let cfg = mk_config("alerts");
        let (runtime, _) = mk_runtime(&cfg).await;
        let hub = runtime.hub().clone();

        {
            let mut book = runtime.alert_book();
            assert!(book.create("ETH", AlertCondition::Above, "not a number").is_err());
            book.create("ETH", AlertCondition::Above, "4000").unwrap();
        }
        runtime.shutdown().await;

        let titles: Vec<String> = hub.select(|s| s.store().iter().map(|n| n.title.clone()).collect());
        assert_eq!(titles, ["Price Alert Created", "Invalid Price"]);
    }

    #[tokio::test]
    async fn welcome_is_shown_once_per_storage() {
        let cfg = mk_config("welcome");

        let (runtime, _) = mk_runtime(&cfg).await;
        assert!(runtime.greet_first_run().await.unwrap());
        let hub = runtime.hub().clone();
        runtime.shutdown().await;
        assert_eq!(hub.select(|s| s.unread_count()), 1);

        let (runtime, _) = mk_runtime(&cfg).await;
        assert!(!runtime.greet_first_run().await.unwrap());
        runtime.shutdown().await;
    }
}
