//! Integration tests for resolution and deployment.
//!
//! Runs the full flow over the in-memory registry and hosting service:
//! registry listing -> derived names -> model -> endpoint config -> endpoint

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use rstest::{fixture, rstest};

use meridian_promote::hosting::HostingCall;
use meridian_promote::{
    derive_names, ApprovalStatus, Deployer, DeploymentNames, EndpointAction,
    ExistingResourcePolicy, HostingService, MemoryHosting, MemoryRegistry, ModelPackage, ModelRegistry,
    PackageArn, Pipeline, PromoteError, Resolver,
};

const GROUP: &str = "MyModelGroup";
const ROLE: &str = "arn:aws:iam::123456789012:role/sagemaker-exec";

fn package_arn(id: &str) -> String {
    format!("arn:aws:sagemaker:us-east-1:123456789012:model-package/{GROUP}/{id}")
}

fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).unwrap()
}

// ============================================================================
// Fixtures
// ============================================================================

#[fixture]
fn registry() -> Arc<MemoryRegistry> {
    let registry = MemoryRegistry::new();
    registry
        .register(
            GROUP,
            ModelPackage::new(
                package_arn("abc123"),
                ApprovalStatus::Approved,
                at(1_700_000_000),
            ),
        )
        .unwrap();
    Arc::new(registry)
}

#[fixture]
fn hosting() -> Arc<MemoryHosting> {
    Arc::new(MemoryHosting::new())
}

#[fixture]
fn deployer(hosting: Arc<MemoryHosting>) -> (Deployer, Arc<MemoryHosting>) {
    let deployer = Deployer::new(Arc::clone(&hosting) as Arc<dyn HostingService>, ROLE);
    (deployer, hosting)
}

// ============================================================================
// Resolution
// ============================================================================

#[rstest]
#[tokio::test]
async fn resolves_single_approved_package(registry: Arc<MemoryRegistry>) {
    let names = Resolver::new(registry).resolve(GROUP).await.unwrap();

    assert_eq!(names.model_package_arn.as_str(), package_arn("abc123"));
    assert_eq!(names.model_name, "abc123-model");
    assert_eq!(names.endpoint_config_name, "abc123-config");
    assert_eq!(names.endpoint_name, "abc123-endpoint");
}

#[rstest]
#[tokio::test]
async fn group_without_approved_package_is_not_found() {
    let registry = MemoryRegistry::new();
    registry
        .register(
            GROUP,
            ModelPackage::new(package_arn("p1"), ApprovalStatus::Pending, at(10)),
        )
        .unwrap();
    registry
        .register(
            GROUP,
            ModelPackage::new(package_arn("r1"), ApprovalStatus::Rejected, at(20)),
        )
        .unwrap();

    let err = Resolver::new(Arc::new(registry))
        .resolve(GROUP)
        .await
        .unwrap_err();

    assert!(matches!(err, PromoteError::NotFound { ref group } if group == GROUP));
}

#[rstest]
#[case::newest_first(&[("new", 300), ("mid", 200), ("old", 100)], "new")]
#[case::newest_last(&[("old", 100), ("mid", 200), ("new", 300)], "new")]
#[case::newest_middle(&[("old", 100), ("new", 300), ("mid", 200)], "new")]
#[tokio::test]
async fn newest_approved_package_wins(#[case] approved: &[(&str, i64)], #[case] expected: &str) {
    let registry = MemoryRegistry::new();
    for (id, secs) in approved {
        registry
            .register(
                GROUP,
                ModelPackage::new(package_arn(id), ApprovalStatus::Approved, at(*secs)),
            )
            .unwrap();
    }
    // Newer, but not deployable.
    registry
        .register(
            GROUP,
            ModelPackage::new(package_arn("pending"), ApprovalStatus::Pending, at(900)),
        )
        .unwrap();

    let names = Resolver::new(Arc::new(registry)).resolve(GROUP).await.unwrap();
    assert_eq!(names.model_package_arn.as_str(), package_arn(expected));
}

#[rstest]
#[tokio::test]
async fn approval_change_is_seen_by_next_resolution(registry: Arc<MemoryRegistry>) {
    registry
        .register(
            GROUP,
            ModelPackage::new(
                package_arn("def456"),
                ApprovalStatus::Pending,
                at(1_800_000_000),
            ),
        )
        .unwrap();
    let resolver = Resolver::new(Arc::clone(&registry) as Arc<dyn ModelRegistry>);

    let before = resolver.resolve(GROUP).await.unwrap();
    assert_eq!(before.model_name, "abc123-model");

    registry
        .set_status(GROUP, &package_arn("def456"), ApprovalStatus::Approved)
        .unwrap();

    let after = resolver.resolve(GROUP).await.unwrap();
    assert_eq!(after.model_name, "def456-model");
}

#[rstest]
#[case("arn:aws:sagemaker:us-east-1:1:model-package/g/7")]
#[case("no-slashes")]
#[case("trailing/")]
fn derived_names_are_stable(#[case] arn: &str) {
    let arn = PackageArn::new(arn);
    assert_eq!(derive_names(&arn), derive_names(&arn));
}

// ============================================================================
// Deployment
// ============================================================================

#[rstest]
#[tokio::test]
async fn resolved_record_drives_separate_deploy(
    registry: Arc<MemoryRegistry>,
    deployer: (Deployer, Arc<MemoryHosting>),
) {
    let (deployer, hosting) = deployer;
    let resolved = Resolver::new(registry).resolve(GROUP).await.unwrap();

    // The two steps only share the serialised record.
    let record = serde_json::to_string(&resolved).unwrap();
    let handed_over: DeploymentNames = serde_json::from_str(&record).unwrap();
    assert_eq!(handed_over, resolved);

    let outcome = deployer.deploy(&handed_over).await.unwrap();
    assert_eq!(outcome.endpoint_name, "abc123-endpoint");
    let model = hosting.model("abc123-model").unwrap().unwrap();
    assert_eq!(model.package_arn.as_str(), package_arn("abc123"));
}

#[rstest]
#[tokio::test]
async fn deploy_accepts_workflow_payload(deployer: (Deployer, Arc<MemoryHosting>)) {
    let (deployer, hosting) = deployer;
    let payload = serde_json::json!({
        "ModelPackageArn": package_arn("abc123"),
        "ModelName": "abc123-model",
        "EndpointConfigName": "abc123-config",
        "EndpointName": "abc123-endpoint",
    });

    let names: DeploymentNames = serde_json::from_value(payload).unwrap();
    let outcome = deployer.deploy(&names).await.unwrap();

    assert_eq!(
        serde_json::to_value(&outcome).unwrap(),
        serde_json::json!({ "EndpointName": "abc123-endpoint" })
    );
    assert_eq!(
        hosting.endpoint_config("abc123-endpoint").unwrap().as_deref(),
        Some("abc123-config")
    );
}

#[rstest]
#[tokio::test]
async fn endpoint_is_created_then_updated(deployer: (Deployer, Arc<MemoryHosting>)) {
    let (deployer, hosting) = deployer;
    let arn = PackageArn::new(package_arn("abc123"));

    deployer.ensure_model(&arn, "abc123-model").await.unwrap();
    deployer
        .ensure_endpoint_config("abc123-model", "abc123-config")
        .await
        .unwrap();
    deployer
        .ensure_endpoint_config("abc123-model", "xyz-config")
        .await
        .unwrap();

    let first = deployer
        .ensure_endpoint("abc123-endpoint", "abc123-config")
        .await
        .unwrap();
    assert_eq!(first.action, EndpointAction::Created);

    let second = deployer
        .ensure_endpoint("abc123-endpoint", "xyz-config")
        .await
        .unwrap();
    assert_eq!(second.action, EndpointAction::Updated);
    assert_eq!(second.config_name, "xyz-config");

    assert_eq!(hosting.endpoint_count().unwrap(), 1);
    assert_eq!(
        hosting.endpoint_config("abc123-endpoint").unwrap().as_deref(),
        Some("xyz-config")
    );
}

#[rstest]
#[tokio::test]
async fn same_endpoint_twice_takes_update_branch(deployer: (Deployer, Arc<MemoryHosting>)) {
    let (deployer, hosting) = deployer;
    let names = derive_names(&PackageArn::new(package_arn("abc123")));
    deployer.deploy(&names).await.unwrap();

    let again = deployer
        .ensure_endpoint(&names.endpoint_name, &names.endpoint_config_name)
        .await
        .unwrap();

    assert_eq!(again.action, EndpointAction::Updated);
    assert_eq!(
        hosting.calls().unwrap().last(),
        Some(&HostingCall::UpdateEndpoint(
            "abc123-endpoint".to_owned(),
            "abc123-config".to_owned()
        ))
    );
}

#[rstest]
#[tokio::test]
async fn model_twice_surfaces_native_error(deployer: (Deployer, Arc<MemoryHosting>)) {
    let (deployer, _hosting) = deployer;
    let arn = PackageArn::new(package_arn("abc123"));

    deployer.ensure_model(&arn, "abc123-model").await.unwrap();
    let err = deployer
        .ensure_model(&arn, "abc123-model")
        .await
        .unwrap_err();

    assert!(matches!(err, PromoteError::Provision(_)));
    assert_eq!(
        err.to_string(),
        "Cannot create already existing model \"abc123-model\"."
    );
}

#[rstest]
#[tokio::test]
async fn config_step_does_not_run_after_model_failure(deployer: (Deployer, Arc<MemoryHosting>)) {
    let (deployer, hosting) = deployer;
    let names = derive_names(&PackageArn::new(package_arn("abc123")));
    deployer
        .ensure_model(&names.model_package_arn, &names.model_name)
        .await
        .unwrap();

    deployer.deploy(&names).await.unwrap_err();

    assert_eq!(
        hosting.calls().unwrap(),
        vec![
            HostingCall::CreateModel("abc123-model".to_owned()),
            HostingCall::CreateModel("abc123-model".to_owned()),
        ]
    );
}

// ============================================================================
// Pipeline
// ============================================================================

#[rstest]
#[tokio::test]
async fn reuse_policy_converges_on_rerun(
    registry: Arc<MemoryRegistry>,
    hosting: Arc<MemoryHosting>,
) {
    let deployer = Deployer::new(Arc::clone(&hosting) as Arc<dyn HostingService>, ROLE)
        .with_existing_resources(ExistingResourcePolicy::Reuse);
    let pipeline = Pipeline::new(Resolver::new(registry), deployer, Duration::from_secs(5));

    let first = pipeline.run(GROUP).await.unwrap();
    let second = pipeline.run(GROUP).await.unwrap();

    assert_eq!(first.endpoint.action, EndpointAction::Created);
    assert_eq!(second.endpoint.action, EndpointAction::Updated);
    assert_eq!(second.outcome().endpoint_name, "abc123-endpoint");
    assert_eq!(hosting.endpoint_count().unwrap(), 1);
}

#[rstest]
#[tokio::test]
async fn default_policy_fails_on_rerun(
    registry: Arc<MemoryRegistry>,
    hosting: Arc<MemoryHosting>,
) {
    let deployer = Deployer::new(Arc::clone(&hosting) as Arc<dyn HostingService>, ROLE);
    let pipeline = Pipeline::new(Resolver::new(registry), deployer, Duration::from_secs(5));

    pipeline.run(GROUP).await.unwrap();
    let err = pipeline.run(GROUP).await.unwrap_err();

    assert!(matches!(err, PromoteError::Provision(_)));
    assert_eq!(hosting.endpoint_count().unwrap(), 1);
}

#[rstest]
#[tokio::test]
async fn new_approval_gets_own_endpoint(
    registry: Arc<MemoryRegistry>,
    hosting: Arc<MemoryHosting>,
) {
    let deployer = Deployer::new(Arc::clone(&hosting) as Arc<dyn HostingService>, ROLE);
    let pipeline = Pipeline::new(
        Resolver::new(Arc::clone(&registry) as Arc<dyn ModelRegistry>),
        deployer,
        Duration::from_secs(5),
    );

    pipeline.run(GROUP).await.unwrap();
    registry
        .register(
            GROUP,
            ModelPackage::new(
                package_arn("def456"),
                ApprovalStatus::Approved,
                at(1_800_000_000),
            ),
        )
        .unwrap();
    let report = pipeline.run(GROUP).await.unwrap();

    // Each package gets its own endpoint name, so a new package is a create.
    assert_eq!(report.endpoint.name, "def456-endpoint");
    assert_eq!(report.endpoint.action, EndpointAction::Created);
    assert_eq!(hosting.endpoint_count().unwrap(), 2);
}

#[rstest]
#[tokio::test]
async fn stalled_hosting_hits_deadline(registry: Arc<MemoryRegistry>) {
    let hosting = Arc::new(MemoryHosting::new().with_latency(Duration::from_secs(30)));
    let deployer = Deployer::new(hosting as Arc<dyn HostingService>, ROLE);
    let pipeline = Pipeline::new(Resolver::new(registry), deployer, Duration::from_millis(100));

    let err = pipeline.run(GROUP).await.unwrap_err();
    assert!(matches!(err, PromoteError::DeadlineExceeded { .. }));
    assert!(err.is_retryable());
}
