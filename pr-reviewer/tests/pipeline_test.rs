//! End-to-end pipeline scenarios over the scripted LLM backend and an
//! in-memory store.

use std::sync::Arc;
use std::time::Duration;

use llm_gateway::{
    AgentBinding, CallLog, LlmGateway, ModelBindings, ProviderClient, ScriptedService,
};
use pr_reviewer::aggregate::markdown::render_markdown;
use pr_reviewer::model::{Category, ChangeSource, ReviewConfig, Severity};
use pr_reviewer::{Error, ProviderConfig, ReviewQuery, ReviewService, ReviewStore, ServiceLimits};

const PY_DIFF: &str = "\
diff --git a/src/app.py b/src/app.py
--- a/src/app.py
+++ b/src/app.py
@@ -10,0 +11,3 @@
+a = 1
+b = 2
+c = a + b
";

const SQL_DIFF: &str = "\
diff --git a/src/db.py b/src/db.py
--- a/src/db.py
+++ b/src/db.py
@@ -11,0 +12,1 @@
+query = \"SELECT * FROM u WHERE id=\" + uid
";

const BINARY_ONLY_DIFF: &str = "\
diff --git a/logo.png b/logo.png
Binary files a/logo.png and b/logo.png differ
";

async fn service_with(scripted: ScriptedService, limits: ServiceLimits) -> ReviewService {
    let gateway = Arc::new(LlmGateway::new(
        ProviderClient::Scripted(scripted),
        ModelBindings::new(AgentBinding::with_model("scripted")),
    ));
    let store = ReviewStore::connect("sqlite::memory:").await.unwrap();
    ReviewService::new(
        gateway,
        store,
        ProviderConfig {
            base_api: "https://api.github.com".into(),
            token: None,
        },
        limits,
    )
}

fn manual(diff: &str) -> ChangeSource {
    ChangeSource::Manual {
        diff_text: diff.into(),
        repository: Some("acme/widgets".into()),
        pr_number: Some(7),
    }
}

#[tokio::test]
async fn clean_manual_diff_completes_with_a_positive_summary() {
    let service = service_with(ScriptedService::new("[]"), ServiceLimits::default()).await;
    let result = service
        .review(manual(PY_DIFF), ReviewConfig::default())
        .await
        .unwrap();

    assert_eq!(result.summary.files_analyzed, 1);
    assert_eq!(result.summary.lines_changed, 3);
    assert_eq!(result.summary.total_findings, 0);
    assert!(result.failures.is_empty());

    let md = render_markdown(&result);
    assert!(md.contains("No issues detected"));
}

#[tokio::test]
async fn sql_injection_finding_surfaces_under_file_and_line() {
    let scripted = ScriptedService::new("[]").enqueue(
        "security",
        r#"[{"line": 12, "severity": "critical", "description": "SQL injection", "suggestion": "parameterize"}]"#,
    );
    let service = service_with(scripted, ServiceLimits::default()).await;
    let result = service
        .review(manual(SQL_DIFF), ReviewConfig::default())
        .await
        .unwrap();

    assert_eq!(result.findings.len(), 1);
    let f = &result.findings[0];
    assert_eq!(f.category, Category::Security);
    assert_eq!(f.severity, Severity::Critical);
    assert_eq!(f.line_number, 12);
    assert_eq!(f.agent_source, Category::Security);

    let md = render_markdown(&result);
    assert!(md.contains("## `src/db.py`"));
    assert!(md.contains("### Line 12"));
    assert!(md.contains("SQL injection"));

    // Round-trip: the persisted review matches what the pipeline returned.
    let loaded = service
        .store()
        .get(result.review_id)
        .await
        .unwrap()
        .expect("persisted");
    assert_eq!(loaded.findings, result.findings);
    assert_eq!(loaded.summary, result.summary);
}

#[tokio::test]
async fn severity_threshold_drops_low_findings() {
    let scripted = ScriptedService::new("[]").enqueue(
        "security",
        r#"[
            {"line": 12, "severity": "critical", "description": "SQL injection", "suggestion": "parameterize"},
            {"line": 12, "severity": "low", "description": "naming nit"}
        ]"#,
    );
    let service = service_with(scripted, ServiceLimits::default()).await;

    let mut config = ReviewConfig::default();
    config.severity_threshold = Severity::High;
    let result = service.review(manual(SQL_DIFF), config).await.unwrap();

    assert_eq!(result.findings.len(), 1);
    assert_eq!(result.findings[0].severity, Severity::Critical);
    assert!(
        result
            .findings
            .iter()
            .all(|f| f.severity >= Severity::High)
    );
}

#[tokio::test]
async fn disabled_categories_never_reach_the_gateway() {
    let log = CallLog::new();
    let scripted = ScriptedService::new("[]").with_log(log.clone());
    let service = service_with(scripted, ServiceLimits::default()).await;

    let mut config = ReviewConfig::default();
    config.enabled_categories = [Category::Logic].into_iter().collect();
    let result = service.review(manual(PY_DIFF), config).await.unwrap();

    assert!(result.findings.is_empty());
    let callers = log.agent_ids();
    assert!(!callers.is_empty());
    assert!(callers.iter().all(|agent| agent == "logic"), "{callers:?}");
}

#[tokio::test]
async fn analyzer_timeout_is_isolated_from_the_others() {
    let scripted = ScriptedService::new("[]")
        .enqueue(
            "security",
            r#"[{"line": 12, "severity": "critical", "description": "SQL injection", "suggestion": "parameterize"}]"#,
        )
        .with_delay("performance", Duration::from_millis(500));

    let limits = ServiceLimits {
        analyzer_timeout: Duration::from_millis(100),
        review_timeout: Some(Duration::from_secs(10)),
        ..ServiceLimits::default()
    };
    let service = service_with(scripted, limits).await;
    let result = service
        .review(manual(SQL_DIFF), ReviewConfig::default())
        .await
        .unwrap();

    // The timed-out analyzer contributed a diagnostic, not an error.
    assert_eq!(result.failures.len(), 1);
    assert_eq!(result.failures[0].category, Category::Performance);
    assert!(
        matches!(
            result.failures[0].kind,
            pr_reviewer::model::FailureKind::Timeout
        ),
        "{:?}",
        result.failures[0]
    );

    // The security finding survived intact.
    assert_eq!(result.findings.len(), 1);
    assert_eq!(result.findings[0].agent_source, Category::Security);
}

#[tokio::test]
async fn binary_only_diff_is_a_successful_empty_review() {
    let log = CallLog::new();
    let scripted = ScriptedService::new("[]").with_log(log.clone());
    let service = service_with(scripted, ServiceLimits::default()).await;
    let result = service
        .review(manual(BINARY_ONLY_DIFF), ReviewConfig::default())
        .await
        .unwrap();

    assert_eq!(result.summary.files_analyzed, 0);
    assert_eq!(result.summary.total_findings, 0);
    assert!(log.is_empty(), "no analyzer should have run");
}

#[tokio::test]
async fn fixed_replies_make_the_pipeline_deterministic() {
    let reply =
        r#"[{"line": 12, "severity": "high", "description": "SQL injection", "suggestion": "parameterize"}]"#;

    let mut renders = Vec::new();
    for _ in 0..2 {
        let scripted = ScriptedService::new("[]").enqueue("security", reply);
        let service = service_with(scripted, ServiceLimits::default()).await;
        let result = service
            .review(manual(SQL_DIFF), ReviewConfig::default())
            .await
            .unwrap();
        renders.push((result.findings.clone(), result.summary.clone(), render_markdown(&result)));
    }

    assert_eq!(renders[0].0, renders[1].0);
    assert_eq!(renders[0].1, renders[1].1);
    // The rendered document embeds no review id or timestamp, so it is
    // byte-identical across runs.
    assert_eq!(renders[0].2, renders[1].2);
}

#[tokio::test]
async fn review_deadline_cancels_without_persisting() {
    let scripted =
        ScriptedService::new("[]").with_delay("logic", Duration::from_millis(500));
    let limits = ServiceLimits {
        analyzer_timeout: Duration::from_secs(5),
        review_timeout: Some(Duration::from_millis(50)),
        ..ServiceLimits::default()
    };
    let service = service_with(scripted, limits).await;

    let err = service
        .review(manual(PY_DIFF), ReviewConfig::default())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Cancelled));

    let stored = service.store().query(&ReviewQuery::default()).await.unwrap();
    assert!(stored.is_empty(), "cancelled review must not persist");
}

#[tokio::test]
async fn input_limits_reject_before_analysis() {
    let log = CallLog::new();
    let scripted = ScriptedService::new("[]").with_log(log.clone());
    let limits = ServiceLimits {
        max_files_per_review: 1,
        ..ServiceLimits::default()
    };
    let service = service_with(scripted, limits).await;

    let two_files = format!("{PY_DIFF}{SQL_DIFF}");
    let err = service
        .review(manual(&two_files), ReviewConfig::default())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)), "{err}");
    assert!(log.is_empty(), "analyzers must not run on rejected input");
}

#[tokio::test]
async fn empty_diff_content_is_a_validation_error() {
    let service = service_with(ScriptedService::new("[]"), ServiceLimits::default()).await;
    let err = service
        .review(
            ChangeSource::Manual {
                diff_text: "   ".into(),
                repository: None,
                pr_number: None,
            },
            ReviewConfig::default(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
}
