use crate::common::{
    load_fixture, test_config, Call, MockTransport, DETAIL_URL_196308771, RESULT_LIST_URL,
    SEARCH_URL, ST36_URL_196308771,
};
use dpma_register::runtime::cache::MemoryCache;
use dpma_register::types::OutputFormat;
use dpma_register::{RegisterAccess, RegisterError};
use std::sync::Arc;

fn register_with_search_hit() -> (MockTransport, RegisterAccess) {
    let transport = MockTransport::with_register_196308771();
    transport.add_submission(
        RESULT_LIST_URL,
        &load_fixture("dpma/trefferliste_de19630877.html"),
    );
    let register = RegisterAccess::with_transport(test_config(), Arc::new(transport.clone()));
    (transport, register)
}

#[tokio::test]
async fn test_json_for_de19630877_goes_through_search() {
    let (transport, mut register) = register_with_search_hit();

    let payload = register
        .access("DE19630877", OutputFormat::Json, "en")
        .await
        .expect("Access failed");
    let json: serde_json::Value = serde_json::from_slice(&payload).unwrap();

    assert_eq!(json["title"]["lang"], "de");
    assert_eq!(
        json["title"]["text"],
        "Verfahren zur Herstellung von Kunststoffbehältern"
    );
    assert_eq!(json["applicants"][0]["country"], "DE");
    assert_eq!(
        json["applicants"][0]["name"],
        "Krupp Corpoplast Maschinenbau GmbH"
    );
    assert_eq!(json["application_reference"][0]["doc_number"], "19630877.1");

    let dates: Vec<_> = json["events"]
        .as_array()
        .unwrap()
        .iter()
        .map(|event| event["date_of_procedural_status"].as_str().unwrap())
        .collect();
    assert_eq!(dates, vec!["19960731", "19980205", "20000518"]);

    assert_eq!(
        transport.calls().first(),
        Some(&Call::Open(SEARCH_URL.to_string()))
    );
    assert_eq!(transport.submit_count(), 1);
    assert!(transport
        .calls()
        .contains(&Call::Open(ST36_URL_196308771.to_string())));
}

#[tokio::test]
async fn test_xml_is_returned_verbatim() {
    let (_, mut register) = register_with_search_hit();
    let payload = register
        .access("DE19630877", OutputFormat::Xml, "en")
        .await
        .unwrap();
    assert_eq!(payload, load_fixture("dpma/st36_196308771.xml").into_bytes());
}

#[tokio::test]
async fn test_json_raw_keeps_source_names() {
    let (_, mut register) = register_with_search_hit();
    let payload = register
        .access("DE19630877", OutputFormat::JsonRaw, "en")
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&payload).unwrap();
    let title = &json["dpma-patent-document"]["bibliographic-data"]["invention-title"];
    assert_eq!(title["@lang"], "DE");
}

#[tokio::test]
async fn test_url_format_returns_detail_page_url() {
    let (transport, mut register) = register_with_search_hit();
    let payload = register
        .access("DE19630877", OutputFormat::Url, "en")
        .await
        .unwrap();
    assert_eq!(String::from_utf8(payload).unwrap(), DETAIL_URL_196308771);
    assert!(!transport
        .calls()
        .contains(&Call::Open(DETAIL_URL_196308771.to_string())));
}

#[tokio::test]
async fn test_html_compact_keeps_register_table() {
    let (_, mut register) = register_with_search_hit();
    let payload = register
        .access("DE19630877", OutputFormat::HtmlCompact, "en")
        .await
        .unwrap();
    let html = String::from_utf8(payload).unwrap();
    assert!(html.contains(r#"id="verfahrensdaten_tabelle""#));
    assert!(html.contains("DE19630877A1"));
    assert!(!html.contains("Imprint"));
    assert!(html.contains(&format!(r#"<a href="{DETAIL_URL_196308771}" target="_blank">HTML</a>"#)));
}

#[tokio::test]
async fn test_pdf_follows_link_on_detail_page() {
    let (transport, mut register) = register_with_search_hit();
    let pdf_url = "https://register.dpma.de/DPMAregister/pat/register/PAT_196308771_2024-01-15?AKZ=196308771&VIEW=pdf";
    transport.add_page(pdf_url, "%PDF-1.4 register extract");

    let payload = register
        .access("DE19630877", OutputFormat::Pdf, "en")
        .await
        .unwrap();
    assert_eq!(payload, b"%PDF-1.4 register extract".to_vec());
}

#[tokio::test]
async fn test_derived_reference_skips_search() {
    let transport = MockTransport::new();
    transport.add_page(SEARCH_URL, &load_fixture("dpma/basis.html"));
    let mut register = RegisterAccess::with_transport(test_config(), Arc::new(transport.clone()));

    let url = register
        .document_url("DE102006006014A1", "de")
        .await
        .unwrap();
    assert_eq!(
        url,
        "https://register.dpma.de/DPMAregister/pat/register:showalleverfahrenstabellen?AKZ=1020060060140&lang=de"
    );
    assert!(transport.calls().is_empty());
}

#[tokio::test]
async fn test_missing_st36_link_is_reported() {
    let transport = MockTransport::new();
    transport.add_page(SEARCH_URL, &load_fixture("dpma/basis.html"));
    transport.add_page(
        "https://register.dpma.de/DPMAregister/pat/register:showalleverfahrenstabellen?AKZ=1020060060140&lang=en",
        "<html><body><p>No downloads</p></body></html>",
    );
    let mut register = RegisterAccess::with_transport(test_config(), Arc::new(transport));

    let err = register
        .access("DE102006006014", OutputFormat::Xml, "en")
        .await
        .unwrap_err();
    assert!(matches!(err, RegisterError::MissingLink(_)));
}

#[tokio::test]
async fn test_cache_hit_avoids_transport() {
    let (transport, register) = register_with_search_hit();
    let cache = Arc::new(MemoryCache::new());
    let mut register = register.with_cache(cache.clone());

    let first = register
        .access("DE19630877", OutputFormat::Json, "en")
        .await
        .unwrap();
    let calls_after_first = transport.calls().len();
    assert_eq!(cache.len(), 1);

    let second = register
        .access("DE19630877", OutputFormat::Json, "en")
        .await
        .unwrap();
    assert_eq!(first, second);
    assert_eq!(transport.calls().len(), calls_after_first);
}

#[tokio::test]
async fn test_malformed_register_xml_is_reported() {
    let transport = MockTransport::with_register_196308771();
    transport.add_page(ST36_URL_196308771, "<not-xml");
    transport.add_submission(
        RESULT_LIST_URL,
        &load_fixture("dpma/trefferliste_de19630877.html"),
    );
    let mut register = RegisterAccess::with_transport(test_config(), Arc::new(transport));

    let err = register
        .access("DE19630877", OutputFormat::Json, "en")
        .await
        .unwrap_err();
    assert!(matches!(err, RegisterError::MalformedDocument(_)));
}
