use crate::common::{load_fixture, test_config, Call, MockTransport, FORM_ACTION, RESULT_LIST_URL, SEARCH_URL};
use dpma_register::sources::dpma::session::RegistrySearchSession;
use dpma_register::RegisterError;
use std::sync::Arc;

#[tokio::test]
async fn test_search_submits_number_with_hidden_form_fields() {
    let transport = MockTransport::new();
    transport.add_page(SEARCH_URL, &load_fixture("dpma/basis.html"));
    transport.add_submission(
        RESULT_LIST_URL,
        &load_fixture("dpma/trefferliste_wo2008034638.html"),
    );

    let mut session = RegistrySearchSession::new(Arc::new(transport.clone()), test_config());
    assert!(!session.is_started());
    let results = session.search("WO2008034638").await.expect("Search failed");

    assert!(session.is_started());
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].reference, "1120070023456");
    assert_eq!(results[0].label.as_deref(), Some("DE 11 2007 002 345.6"));
    assert_eq!(results[1].reference, "E 077120582");
    assert_eq!(results[1].label.as_deref(), Some("PCT/EP2007/008123"));

    assert_eq!(
        transport.calls(),
        vec![
            Call::Open(SEARCH_URL.to_string()),
            Call::Submit {
                action: FORM_ACTION.to_string(),
                fields: vec![
                    (
                        "t:formdata".to_string(),
                        "H4sIAAAAAAAAAJWQsU4CQRCG&x".to_string()
                    ),
                    ("akzPn".to_string(), "WO2008034638".to_string()),
                ],
            },
        ]
    );
}

#[tokio::test]
async fn test_session_is_opened_once() {
    let transport = MockTransport::new();
    transport.add_page(SEARCH_URL, &load_fixture("dpma/basis.html"));
    transport.add_submission(RESULT_LIST_URL, &load_fixture("dpma/no_results.html"));
    transport.add_submission(RESULT_LIST_URL, &load_fixture("dpma/no_results.html"));

    let mut session = RegistrySearchSession::new(Arc::new(transport.clone()), test_config());
    session.search("DE1").await.unwrap();
    session.search("DE2").await.unwrap();

    let opens = transport
        .calls()
        .iter()
        .filter(|call| matches!(call, Call::Open(_)))
        .count();
    assert_eq!(opens, 1);
    assert_eq!(transport.submit_count(), 2);
}

#[tokio::test]
async fn test_zero_results_marker_yields_empty_list() {
    let transport = MockTransport::new();
    transport.add_page(SEARCH_URL, &load_fixture("dpma/basis.html"));
    transport.add_submission(RESULT_LIST_URL, &load_fixture("dpma/no_results.html"));

    let mut session = RegistrySearchSession::new(Arc::new(transport), test_config());
    let results = session.search("DE99999999").await.unwrap();
    assert!(results.is_empty());
}

#[tokio::test]
async fn test_single_hit_redirect_reads_detail_page() {
    let transport = MockTransport::new();
    transport.add_page(SEARCH_URL, &load_fixture("dpma/basis.html"));
    transport.add_submission(
        "https://register.dpma.de/DPMAregister/pat/register?AKZ=196308771&CURSOR=0",
        &load_fixture("dpma/register_196308771.html"),
    );

    let mut session = RegistrySearchSession::new(Arc::new(transport), test_config());
    let results = session.search("DE19630877").await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].reference, "196308771");
    assert_eq!(results[0].label, None);
}

#[tokio::test]
async fn test_firewall_on_start_page_blocks_without_submitting() {
    let transport = MockTransport::new();
    transport.add_page(SEARCH_URL, &load_fixture("dpma/basis_blocked.html"));

    let mut session = RegistrySearchSession::new(Arc::new(transport.clone()), test_config());
    let err = session.search("DE19630877").await.unwrap_err();

    assert!(matches!(err, RegisterError::Blocked(ref url) if url == SEARCH_URL));
    assert_eq!(transport.calls(), vec![Call::Open(SEARCH_URL.to_string())]);
}

#[tokio::test]
async fn test_firewall_on_search_response_is_not_retried() {
    let transport = MockTransport::new();
    transport.add_page(SEARCH_URL, &load_fixture("dpma/basis.html"));
    transport.add_submission(RESULT_LIST_URL, &load_fixture("dpma/basis_blocked.html"));

    let mut session = RegistrySearchSession::new(Arc::new(transport.clone()), test_config());
    let err = session.search("DE19630877").await.unwrap_err();

    assert!(matches!(err, RegisterError::Blocked(_)));
    assert_eq!(transport.submit_count(), 1);
}

#[tokio::test]
async fn test_firewall_on_opened_page_is_reported() {
    let transport = MockTransport::new();
    transport.add_page(SEARCH_URL, &load_fixture("dpma/basis.html"));
    transport.add_page(
        "https://register.dpma.de/DPMAregister/pat/register?AKZ=1&VIEW=st36",
        &load_fixture("dpma/basis_blocked.html"),
    );

    let mut session = RegistrySearchSession::new(Arc::new(transport), test_config());
    let err = session
        .download("https://register.dpma.de/DPMAregister/pat/register?AKZ=1&VIEW=st36")
        .await
        .unwrap_err();
    assert!(matches!(err, RegisterError::Blocked(_)));
}

#[tokio::test]
async fn test_second_search_reuses_start_page_form() {
    let transport = MockTransport::new();
    transport.add_page(SEARCH_URL, &load_fixture("dpma/basis.html"));
    transport.add_submission(RESULT_LIST_URL, &load_fixture("dpma/no_results.html"));
    transport.add_submission(RESULT_LIST_URL, &load_fixture("dpma/no_results.html"));

    let mut session = RegistrySearchSession::new(Arc::new(transport.clone()), test_config());
    session.search("DE1").await.unwrap();
    session.search("DE2").await.unwrap();

    let submitted: Vec<_> = transport
        .calls()
        .into_iter()
        .filter_map(|call| match call {
            Call::Submit { action, fields } => Some((action, fields)),
            Call::Open(_) => None,
        })
        .collect();
    assert_eq!(submitted.len(), 2);
    assert_eq!(submitted[0].0, submitted[1].0);
    assert_eq!(
        submitted[1].1,
        vec![
            (
                "t:formdata".to_string(),
                "H4sIAAAAAAAAAJWQsU4CQRCG&x".to_string()
            ),
            ("akzPn".to_string(), "DE2".to_string()),
        ]
    );
}
