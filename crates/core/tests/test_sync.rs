#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use core_lib::sync::{
        compute_missing, publish_missing, render_digest, render_post, PublishOutcome,
        PublishReport, Repository, RepositoryPublisher,
    };
    use core_lib::AuthError;
    use futures::executor::block_on;
    use tokio_util::sync::CancellationToken;

    fn repo(name: &str) -> Repository {
        Repository::new(
            name,
            format!("https://github.com/octo/{name}"),
            Some(format!("{name} description")),
        )
    }

    /// Records every call and fails on the listed names.
    struct RecordingPublisher {
        fail_on: Vec<&'static str>,
        calls: Mutex<Vec<String>>,
        cancel_after_first: Option<CancellationToken>,
    }

    impl RecordingPublisher {
        fn new(fail_on: Vec<&'static str>) -> Self {
            Self {
                fail_on,
                calls: Mutex::new(Vec::new()),
                cancel_after_first: None,
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl RepositoryPublisher for RecordingPublisher {
        async fn publish(&self, repository: &Repository) -> Result<String, AuthError> {
            self.calls.lock().unwrap().push(repository.name.clone());
            if let Some(cancel) = &self.cancel_after_first {
                cancel.cancel();
            }
            if self.fail_on.contains(&repository.name.as_str()) {
                return Err(AuthError::ProviderError("500: boom".to_string()));
            }
            Ok(format!("urn:li:share:{}", repository.name))
        }
    }

    #[test]
    fn test_missing_is_ordered_subsequence() {
        let repos = vec![repo("delta"), repo("alpha"), repo("charlie"), repo("bravo")];
        let posts = ["post about charlie"];

        let missing = compute_missing(&repos, &posts);

        let names: Vec<_> = missing.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["delta", "alpha", "bravo"]);
    }

    #[test]
    fn test_no_posts_means_everything_missing() {
        let repos = vec![repo("one"), repo("two")];
        let posts: Vec<String> = Vec::new();

        assert_eq!(compute_missing(&repos, &posts), repos);
    }

    #[test]
    fn test_empty_repositories() {
        let posts = ["anything"];
        assert!(compute_missing(&[], &posts).is_empty());
    }

    #[test]
    fn test_mock_posts_cover_every_repository() {
        let repos = vec![
            repo("Portfolio Website"),
            repo("AI-Chatbot Project"),
            repo("Hello World Post"),
        ];
        let posts = ["Portfolio Website", "AI-Chatbot Project", "Hello World Post"];

        assert!(compute_missing(&repos, &posts).is_empty());
    }

    #[test]
    fn test_matching_is_case_sensitive_substring() {
        let repos = vec![repo("AI"), repo("rust")];
        let posts = ["The MAIN project", "Rust rewrite"];

        let missing = compute_missing(&repos, &posts);

        // "AI" hides inside "MAIN"; "rust" does not match "Rust".
        assert_eq!(missing, vec![repo("rust")]);
    }

    #[test]
    fn test_new_repo_scenario() {
        let repos = vec![Repository::new("NewRepo", "u", Some("d"))];
        let posts: [&str; 0] = [];

        let missing = compute_missing(&repos, &posts);
        assert_eq!(missing, repos);

        let text = render_post(&missing[0]);
        assert!(text.contains("NewRepo"));
        assert!(text.contains('d'));
        assert!(text.contains('u'));
    }

    #[test]
    fn test_render_post_is_pure() {
        let r = repo("gitsync");
        assert_eq!(render_post(&r), render_post(&r));
        assert_eq!(
            render_post(&r),
            "🚀 Check out my GitHub project \"gitsync\"! gitsync description GitHub: https://github.com/octo/gitsync"
        );
    }

    #[test]
    fn test_render_post_without_description() {
        let r = Repository::new("bare", "https://github.com/octo/bare", None::<String>);
        let text = render_post(&r);

        assert!(text.contains("\"bare\"!  GitHub: https://github.com/octo/bare"));
    }

    #[test]
    fn test_render_digest() {
        assert_eq!(render_digest(&[]), None);
        assert_eq!(
            render_digest(&[repo("a"), repo("b")]).as_deref(),
            Some("Check out these amazing projects: a, b. 🚀")
        );
    }

    #[test]
    fn test_nothing_to_do() {
        let publisher = RecordingPublisher::new(vec![]);
        let repos = vec![repo("x")];
        let posts = ["x marks the spot"];

        let report = block_on(publish_missing(
            &repos,
            &posts,
            &publisher,
            &CancellationToken::new(),
        ));

        assert_eq!(report, PublishReport::NothingToDo);
        assert!(report.all_published());
        assert!(publisher.calls().is_empty());
    }

    #[test]
    fn test_failure_in_the_middle_keeps_partial_progress() {
        let publisher = RecordingPublisher::new(vec!["second"]);
        let repos = vec![repo("first"), repo("second"), repo("third")];
        let posts: [&str; 0] = [];

        let report = block_on(publish_missing(
            &repos,
            &posts,
            &publisher,
            &CancellationToken::new(),
        ));

        assert!(!report.all_published());
        let PublishReport::Completed(records) = report else {
            panic!("expected a completed report");
        };
        assert_eq!(publisher.calls(), vec!["first", "second", "third"]);
        assert_eq!(
            records[0].outcome,
            PublishOutcome::Published {
                post_id: "urn:li:share:first".to_string()
            }
        );
        assert!(matches!(records[1].outcome, PublishOutcome::Failed { .. }));
        assert_eq!(
            records[2].outcome,
            PublishOutcome::Published {
                post_id: "urn:li:share:third".to_string()
            }
        );
    }

    #[test]
    fn test_cancellation_skips_remaining() {
        let cancel = CancellationToken::new();
        let mut publisher = RecordingPublisher::new(vec![]);
        publisher.cancel_after_first = Some(cancel.clone());
        let repos = vec![repo("first"), repo("second")];
        let posts: [&str; 0] = [];

        let report = block_on(publish_missing(&repos, &posts, &publisher, &cancel));

        let PublishReport::Completed(records) = report else {
            panic!("expected a completed report");
        };
        assert_eq!(publisher.calls(), vec!["first"]);
        assert!(matches!(records[0].outcome, PublishOutcome::Published { .. }));
        assert_eq!(records[1].outcome, PublishOutcome::Skipped);
    }

    #[test]
    fn test_record_serialization() {
        let record = core_lib::sync::PublishRecord {
            repo: "gitsync".to_string(),
            outcome: PublishOutcome::Published {
                post_id: "urn:li:share:7".to_string(),
            },
        };
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(
            json,
            serde_json::json!({"repo": "gitsync", "status": "published", "postId": "urn:li:share:7"})
        );
    }
}
