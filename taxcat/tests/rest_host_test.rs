use mockito::Matcher;
use serde_json::json;
use taxcat::host::rest::WpRest;
use taxcat::host::{HostPlatform, Taxonomy};
use taxcat::TaxcatError;

// base64("editor:app pass")
const AUTH: &str = "Basic ZWRpdG9yOmFwcCBwYXNz";

#[tokio::test]
async fn test_fetch_post_reads_raw_content() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("GET", "/wp-json/wp/v2/posts/123")
        .match_query(Matcher::UrlEncoded("context".into(), "edit".into()))
        .match_header("authorization", AUTH)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"id":123,"content":{"raw":"<p>Henry Ford</p>","rendered":"<p>Henry Ford</p>\n","protected":false}}"#,
        )
        .create_async()
        .await;

    let host = WpRest::new(server.url(), "editor", "app pass").expect("host");
    let content = host.fetch_post_content(123).await.expect("fetch");

    assert_eq!(content, "<p>Henry Ford</p>");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_unknown_post_is_not_found() {
    let mut server = mockito::Server::new_async().await;

    let _mock = server
        .mock("GET", "/wp-json/wp/v2/posts/999")
        .match_query(Matcher::Any)
        .with_status(404)
        .with_body(r#"{"code":"rest_post_invalid_id","message":"Invalid post ID.","data":{"status":404}}"#)
        .create_async()
        .await;

    let host = WpRest::new(server.url(), "editor", "app pass").expect("host");
    let err = host.fetch_post_content(999).await.unwrap_err();

    assert!(matches!(err.downcast_ref::<TaxcatError>(), Some(TaxcatError::PostNotFound(999))));
}

#[tokio::test]
async fn test_replace_terms_resolves_creates_and_sets_in_one_update() {
    let mut server = mockito::Server::new_async().await;

    // existing term, returned HTML-escaped
    let search_existing = server
        .mock("GET", "/wp-json/wp/v2/organization")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("search".into(), "Ben & Jerry's".into()),
            Matcher::UrlEncoded("per_page".into(), "100".into()),
        ]))
        .with_status(200)
        .with_body(r#"[{"id":41,"name":"Ben &amp; Jerry&#039;s","slug":"ben-jerrys","taxonomy":"organization"}]"#)
        .create_async()
        .await;

    // search hits only a longer name, so the term must be created
    let search_new = server
        .mock("GET", "/wp-json/wp/v2/organization")
        .match_query(Matcher::UrlEncoded("search".into(), "Toyota".into()))
        .with_status(200)
        .with_body(r#"[{"id":7,"name":"Toyota Prius","slug":"toyota-prius","taxonomy":"organization"}]"#)
        .create_async()
        .await;

    let create = server
        .mock("POST", "/wp-json/wp/v2/organization")
        .match_header("authorization", AUTH)
        .match_body(Matcher::Json(json!({"name": "Toyota"})))
        .with_status(201)
        .with_body(r#"{"id":88,"name":"Toyota","slug":"toyota","taxonomy":"organization"}"#)
        .create_async()
        .await;

    let update = server
        .mock("POST", "/wp-json/wp/v2/posts/123")
        .match_body(Matcher::Json(json!({"organization": [41, 88]})))
        .with_status(200)
        .with_body(r#"{"id":123}"#)
        .create_async()
        .await;

    let host = WpRest::new(server.url(), "editor", "app pass").expect("host");
    host.replace_terms(
        123,
        Taxonomy::Organization,
        &["Ben & Jerry's".to_string(), "Toyota".to_string()],
    )
    .await
    .expect("replace");

    search_existing.assert_async().await;
    search_new.assert_async().await;
    create.assert_async().await;
    update.assert_async().await;
}

#[tokio::test]
async fn test_term_exists_rejection_reuses_id() {
    let mut server = mockito::Server::new_async().await;

    let _search = server
        .mock("GET", "/wp-json/wp/v2/people")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body("[]")
        .create_async()
        .await;

    let _create = server
        .mock("POST", "/wp-json/wp/v2/people")
        .with_status(400)
        .with_body(r#"{"code":"term_exists","message":"A term with the name provided already exists.","data":{"status":400,"term_id":12}}"#)
        .create_async()
        .await;

    let update = server
        .mock("POST", "/wp-json/wp/v2/posts/5")
        .match_body(Matcher::Json(json!({"people": [12]})))
        .with_status(200)
        .with_body(r#"{"id":5}"#)
        .create_async()
        .await;

    let host = WpRest::new(server.url(), "editor", "app pass").expect("host");
    host.replace_terms(5, Taxonomy::People, &["Henry Ford".to_string()])
        .await
        .expect("replace");

    update.assert_async().await;
}

#[tokio::test]
async fn test_empty_names_clear_taxonomy() {
    let mut server = mockito::Server::new_async().await;

    let update = server
        .mock("POST", "/wp-json/wp/v2/posts/5")
        .match_body(Matcher::Json(json!({"people": []})))
        .with_status(200)
        .with_body(r#"{"id":5}"#)
        .create_async()
        .await;

    let host = WpRest::new(server.url(), "editor", "app pass").expect("host");
    host.replace_terms(5, Taxonomy::People, &[]).await.expect("replace");

    update.assert_async().await;
}

#[tokio::test]
async fn test_list_terms_for_post() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("GET", "/wp-json/wp/v2/people")
        .match_query(Matcher::UrlEncoded("post".into(), "123".into()))
        .with_status(200)
        .with_body(r#"[{"id":961,"name":"Henry Ford","slug":"henry-ford","taxonomy":"people","count":3}]"#)
        .create_async()
        .await;

    let host = WpRest::new(server.url(), "editor", "app pass").expect("host");
    let terms = host.list_terms(123, Taxonomy::People).await.expect("list");

    assert_eq!(terms.len(), 1);
    assert_eq!(terms[0].term_id, 961);
    assert_eq!(terms[0].name, "Henry Ford");
    assert_eq!(terms[0].slug, "henry-ford");
    assert_eq!(terms[0].taxonomy, "people");
    mock.assert_async().await;
}
