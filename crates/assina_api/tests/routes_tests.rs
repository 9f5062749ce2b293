use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use bytes::Bytes;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use assina_api::{api_router, ApiState};
use assina_domain::{
    ArtifactStore, CompletionNotifier, CreateEnvelopeService, EnvelopeRepository, EnvelopeStatus,
    EvidenceService, MockArtifactStore, MockCompletionNotifier, MockEnvelopeRepository,
    MockPdfComposer, MockSignerRepository, MockSigningProvider, PdfComposer, ProviderEnvelopeState,
    ReconcileService, SignatureEnvelope, SignatureMode, SignerRepository, SigningProvider,
    StampService,
};

#[derive(Default)]
struct TestPorts {
    envelope_repo: MockEnvelopeRepository,
    signer_repo: MockSignerRepository,
    provider: MockSigningProvider,
    store: MockArtifactStore,
    notifier: MockCompletionNotifier,
    pdf: MockPdfComposer,
}

fn api(ports: TestPorts) -> Router {
    let envelope_repo: Arc<dyn EnvelopeRepository> = Arc::new(ports.envelope_repo);
    let signer_repo: Arc<dyn SignerRepository> = Arc::new(ports.signer_repo);
    let provider: Arc<dyn SigningProvider> = Arc::new(ports.provider);
    let store: Arc<dyn ArtifactStore> = Arc::new(ports.store);
    let notifier: Arc<dyn CompletionNotifier> = Arc::new(ports.notifier);
    let pdf: Arc<dyn PdfComposer> = Arc::new(ports.pdf);

    let verification_base_url = "https://verify.example.com".to_string();

    let reconcile = Arc::new(ReconcileService::new(
        envelope_repo.clone(),
        signer_repo.clone(),
        provider.clone(),
        store.clone(),
        notifier.clone(),
    ));
    let evidence = Arc::new(EvidenceService::new(
        envelope_repo.clone(),
        signer_repo.clone(),
        provider.clone(),
        store.clone(),
        pdf.clone(),
        verification_base_url.clone(),
    ));
    let stamp = Arc::new(StampService::new(
        envelope_repo.clone(),
        signer_repo,
        store.clone(),
        pdf,
        notifier,
        verification_base_url,
    ));
    let create = Arc::new(CreateEnvelopeService::new(envelope_repo, provider, store));

    api_router(ApiState::new(reconcile, evidence, stamp, create))
}

async fn post(router: Router, uri: &str, body: Value) -> (StatusCode, Bytes) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, bytes)
}

fn pending_envelope() -> SignatureEnvelope {
    SignatureEnvelope {
        document_id: "doc-1".to_string(),
        title: "Contrato".to_string(),
        mode: SignatureMode::Provider,
        provider_envelope_id: Some("prov-1".to_string()),
        provider_document_id: Some("pdoc-1".to_string()),
        status: EnvelopeStatus::Pending,
        signed_count: 0,
        total_signers: 2,
        source_artifact_key: "source/doc-1.pdf".to_string(),
        signed_artifact_key: None,
        created_at: None,
        updated_at: None,
    }
}

#[tokio::test]
async fn webhook_with_unknown_uuid_returns_404() {
    // Arrange
    let mut ports = TestPorts::default();
    ports
        .envelope_repo
        .expect_get_by_provider_envelope_id()
        .withf(|uuid| uuid == "prov-unknown")
        .return_once(|_| Ok(None));

    // Act
    let (status, body) = post(
        api(ports),
        "/webhooks/signature",
        json!({"event": "ENVELOPE_SIGNED", "uuid": "prov-unknown"}),
    )
    .await;

    // Assert
    assert_eq!(status, StatusCode::NOT_FOUND);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["success"], json!(false));
}

#[tokio::test]
async fn webhook_reports_success_on_a_no_op_reconcile() {
    // Arrange: provider state carries no news
    let mut ports = TestPorts::default();
    ports
        .envelope_repo
        .expect_get_by_provider_envelope_id()
        .return_once(|_| Ok(Some(pending_envelope())));
    ports
        .envelope_repo
        .expect_get_by_document_id()
        .return_once(|_| Ok(Some(pending_envelope())));
    ports.provider.expect_envelope_state().return_once(|_| {
        Ok(ProviderEnvelopeState {
            completed: false,
            signers: vec![],
            documents: vec![],
        })
    });
    ports
        .signer_repo
        .expect_list_by_document()
        .return_once(|_| Ok(vec![]));
    ports
        .signer_repo
        .expect_count_signed()
        .return_once(|_| Ok(0));

    // Act
    let (status, body) = post(
        api(ports),
        "/webhooks/signature",
        json!({"event": "SIGNER_SIGNED", "uuid": "prov-1", "signerNonce": "n-1"}),
    )
    .await;

    // Assert
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body, json!({"success": true}));
}

#[tokio::test]
async fn single_sync_returns_reconcile_counts() {
    // Arrange
    let mut ports = TestPorts::default();
    ports
        .envelope_repo
        .expect_get_by_document_id()
        .withf(|id| id == "doc-1")
        .return_once(|_| Ok(Some(pending_envelope())));
    ports.provider.expect_envelope_state().return_once(|_| {
        Ok(ProviderEnvelopeState {
            completed: false,
            signers: vec![],
            documents: vec![],
        })
    });
    ports
        .signer_repo
        .expect_list_by_document()
        .return_once(|_| Ok(vec![]));
    ports
        .signer_repo
        .expect_count_signed()
        .return_once(|_| Ok(1));
    ports
        .envelope_repo
        .expect_update_signed_count()
        .withf(|id, count| id == "doc-1" && *count == 1)
        .return_once(|_, _| Ok(()));

    // Act
    let (status, body) = post(api(ports), "/signatures/sync", json!({"documentId": "doc-1"})).await;

    // Assert
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["signedCount"], json!(1));
    assert_eq!(body["totalSigners"], json!(2));
    assert_eq!(body["completed"], json!(false));
    assert_eq!(body["changed"], json!(true));
}

#[tokio::test]
async fn batch_sync_reports_per_document_results() {
    // Arrange: first document unknown, second reconciles clean
    let mut ports = TestPorts::default();
    ports
        .envelope_repo
        .expect_get_by_document_id()
        .withf(|id| id == "doc-missing")
        .return_once(|_| Ok(None));
    ports
        .envelope_repo
        .expect_get_by_document_id()
        .withf(|id| id == "doc-1")
        .return_once(|_| Ok(Some(pending_envelope())));
    ports.provider.expect_envelope_state().return_once(|_| {
        Ok(ProviderEnvelopeState {
            completed: false,
            signers: vec![],
            documents: vec![],
        })
    });
    ports
        .signer_repo
        .expect_list_by_document()
        .return_once(|_| Ok(vec![]));
    ports
        .signer_repo
        .expect_count_signed()
        .return_once(|_| Ok(0));

    // Act
    let (status, body) = post(
        api(ports),
        "/signatures/sync",
        json!({"documentIds": ["doc-missing", "doc-1"]}),
    )
    .await;

    // Assert
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["totalChanged"], json!(0));
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["documentId"], json!("doc-missing"));
    assert_eq!(results[0]["success"], json!(false));
    assert_eq!(results[1]["documentId"], json!("doc-1"));
    assert_eq!(results[1]["success"], json!(true));
}

#[tokio::test]
async fn sync_without_a_document_key_is_rejected() {
    let (status, body) = post(api(TestPorts::default()), "/signatures/sync", json!({})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["success"], json!(false));
}

#[tokio::test]
async fn evidence_streams_a_pdf_attachment() {
    // Arrange: completed simple-mode envelope
    let mut ports = TestPorts::default();
    let envelope = SignatureEnvelope {
        mode: SignatureMode::Simple,
        provider_envelope_id: None,
        provider_document_id: None,
        status: EnvelopeStatus::Signed,
        signed_count: 2,
        signed_artifact_key: Some("signed/doc-1/Contrato.pdf".to_string()),
        ..pending_envelope()
    };
    ports
        .envelope_repo
        .expect_get_by_document_id()
        .return_once(move |_| Ok(Some(envelope)));
    ports
        .store
        .expect_download()
        .withf(|key| key == "signed/doc-1/Contrato.pdf")
        .return_once(|_| Ok(Bytes::from_static(b"%PDF-signed")));
    ports
        .signer_repo
        .expect_list_by_document()
        .return_once(|_| Ok(vec![]));
    ports
        .pdf
        .expect_render_evidence_report()
        .return_once(|_| Ok(Bytes::from_static(b"%PDF-report")));
    ports
        .pdf
        .expect_merge()
        .withf(|documents| documents.len() == 2)
        .return_once(|_| Ok(Bytes::from_static(b"%PDF-merged")));

    // Act
    let request = Request::builder()
        .method("POST")
        .uri("/signatures/evidence")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({"documentId": "doc-1"}).to_string()))
        .unwrap();
    let response = api(ports).oneshot(request).await.unwrap();

    // Assert
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/pdf"
    );
    assert_eq!(
        response.headers().get(header::CONTENT_DISPOSITION).unwrap(),
        "attachment; filename=\"Contrato_evidencias.pdf\""
    );
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(bytes.as_ref(), b"%PDF-merged");
}

#[tokio::test]
async fn create_with_an_unknown_mode_is_rejected() {
    let (status, body) = post(
        api(TestPorts::default()),
        "/signatures",
        json!({
            "documentId": "doc-1",
            "title": "Contrato",
            "mode": "qualified",
            "sourceArtifactKey": "source/doc-1.pdf",
            "signers": [{"name": "Ana", "email": "ana@example.com"}]
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["success"], json!(false));
}

#[tokio::test]
async fn create_simple_envelope_returns_the_persisted_record() {
    // Arrange: simple mode never touches the provider
    let mut ports = TestPorts::default();
    ports
        .envelope_repo
        .expect_create_with_signers()
        .withf(|input| {
            input.document_id == "doc-1"
                && input.provider_envelope_id.is_none()
                && input.signers.len() == 1
        })
        .return_once(|_| {
            Ok(SignatureEnvelope {
                mode: SignatureMode::Simple,
                provider_envelope_id: None,
                provider_document_id: None,
                total_signers: 1,
                ..pending_envelope()
            })
        });

    // Act
    let (status, body) = post(
        api(ports),
        "/signatures",
        json!({
            "documentId": "doc-1",
            "title": "Contrato",
            "mode": "simple",
            "sourceArtifactKey": "source/doc-1.pdf",
            "signers": [{"name": "Ana", "email": "ana@example.com"}]
        }),
    )
    .await;

    // Assert
    assert_eq!(status, StatusCode::CREATED);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["documentId"], json!("doc-1"));
    assert_eq!(body["mode"], json!("simple"));
    assert_eq!(body["status"], json!("pending"));
}
