use crate::common::{load_fixture, test_config, MockTransport, RESULT_LIST_URL, SEARCH_URL};
use dpma_register::sources::dpma::resolver::{disambiguate, FileReferenceResolver};
use dpma_register::sources::dpma::session::RegistrySearchSession;
use dpma_register::types::ResolvedReference;
use dpma_register::RegisterError;
use std::sync::Arc;

fn resolver_with(transport: &MockTransport) -> FileReferenceResolver {
    let session = RegistrySearchSession::new(Arc::new(transport.clone()), test_config());
    FileReferenceResolver::new(session)
}

fn candidate(reference: &str, label: &str) -> ResolvedReference {
    ResolvedReference::new(reference, Some(label.to_string()))
}

#[tokio::test]
async fn test_twelve_digit_german_number_needs_no_network() {
    let transport = MockTransport::new();
    let mut resolver = resolver_with(&transport);

    let resolved = resolver.resolve("DE102006006014A1").await.unwrap();
    assert_eq!(resolved.reference, "1020060060140");
    assert_eq!(resolved.label.as_deref(), Some("DE102006006014A1"));

    let resolved = resolver.resolve(" de202013102018 ").await.unwrap();
    assert_eq!(resolved.reference, "2020131020184");

    assert!(transport.calls().is_empty());
    assert!(!resolver.session().is_started());
}

#[tokio::test]
async fn test_german_number_skips_alternate_records() {
    let transport = MockTransport::new();
    transport.add_page(SEARCH_URL, &load_fixture("dpma/basis.html"));
    transport.add_submission(
        RESULT_LIST_URL,
        &load_fixture("dpma/trefferliste_de19630877.html"),
    );
    let mut resolver = resolver_with(&transport);

    let resolved = resolver.resolve("DE19630877").await.unwrap();
    assert_eq!(resolved.reference, "196308771");
    assert_eq!(resolved.label.as_deref(), Some("196 30 877.1"));
}

#[tokio::test]
async fn test_wo_number_keeps_pct_candidate() {
    let transport = MockTransport::new();
    transport.add_page(SEARCH_URL, &load_fixture("dpma/basis.html"));
    transport.add_submission(
        RESULT_LIST_URL,
        &load_fixture("dpma/trefferliste_wo2008034638.html"),
    );
    let mut resolver = resolver_with(&transport);

    let resolved = resolver.resolve("WO2008034638").await.unwrap();
    assert_eq!(resolved.reference, "E 077120582");
}

#[tokio::test]
async fn test_zero_results_is_not_found() {
    let transport = MockTransport::new();
    transport.add_page(SEARCH_URL, &load_fixture("dpma/basis.html"));
    transport.add_submission(RESULT_LIST_URL, &load_fixture("dpma/no_results.html"));
    let mut resolver = resolver_with(&transport);

    let err = resolver.resolve("DE99999999").await.unwrap_err();
    assert!(matches!(err, RegisterError::NotFound(ref number) if number == "DE99999999"));
}

#[tokio::test]
async fn test_blocked_search_surfaces_as_blocked() {
    let transport = MockTransport::new();
    transport.add_page(SEARCH_URL, &load_fixture("dpma/basis_blocked.html"));
    let mut resolver = resolver_with(&transport);

    let err = resolver.resolve("EP666666").await.unwrap_err();
    assert!(matches!(err, RegisterError::Blocked(_)));
    assert_eq!(transport.submit_count(), 0);
}

#[test]
fn test_single_candidate_is_never_filtered() {
    let resolved = disambiguate("DE4446098", vec![candidate("E 954800058", "E 95480005.8")]).unwrap();
    assert_eq!(resolved.reference, "E 954800058");

    let resolved = disambiguate("WO2008034638", vec![candidate("1120070023456", "DE 11 2007")]).unwrap();
    assert_eq!(resolved.reference, "1120070023456");
}

#[test]
fn test_ambiguous_result_takes_first_remaining_candidate() {
    let candidates = vec![
        candidate("E 954800058", "E 95480005.8"),
        candidate("5981234", "598 12 34"),
        candidate("5981235", "598 12 35"),
    ];
    let resolved = disambiguate("DE5981234", candidates).unwrap();
    assert_eq!(resolved.reference, "5981234");
}

#[test]
fn test_filters_removing_every_candidate_is_not_found() {
    let candidates = vec![
        candidate("1120070023456", "DE 11 2007 002 345.6"),
        ResolvedReference::new("1120070023457", None),
    ];
    let err = disambiguate("WO2008034638", candidates).unwrap_err();
    assert!(matches!(err, RegisterError::NotFound(_)));
}

#[test]
fn test_other_jurisdictions_are_not_filtered() {
    let candidates = vec![
        candidate("E 954800058", "E 95480005.8"),
        candidate("E 954800059", "E 95480005.9"),
    ];
    let resolved = disambiguate("EP0666666", candidates).unwrap();
    assert_eq!(resolved.reference, "E 954800058");
}
