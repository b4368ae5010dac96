use crate::catalog::{CatalogError, GenreCatalog, GenreNode};
use std::collections::HashSet;

const CATALOG: &str = r#"{
    "Zydeco": "zydeco classics",
    "Rock": {
        "Classic": {
            "1970s": "70s rock",
            "1960s": "60s rock"
        },
        "Alternative": "alternative rock"
    },
    "Ambient": {
        "Deep": {
            "Deeper": {
                "Deepest": "dark ambient drone"
            }
        }
    }
}"#;

#[test]
fn should_keep_declaration_order() {
    let catalog = GenreCatalog::from_json(CATALOG).unwrap();

    assert_eq!(catalog.categories(), vec!["Zydeco", "Rock", "Ambient"]);

    let classic = catalog.find("Rock/Classic").unwrap();
    let names = classic
        .children()
        .iter()
        .map(GenreNode::name)
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["1970s", "1960s"]);
}

#[test]
fn should_flatten_leaves_at_any_depth() {
    let catalog = GenreCatalog::from_json(CATALOG).unwrap();

    let queries = catalog
        .leaves()
        .into_iter()
        .map(|leaf| leaf.query)
        .collect::<Vec<_>>();

    assert_eq!(
        queries,
        vec![
            "zydeco classics",
            "70s rock",
            "60s rock",
            "alternative rock",
            "dark ambient drone"
        ]
    );
}

#[test]
fn should_pick_random_leaf_never_category() {
    let catalog = GenreCatalog::from_json(CATALOG).unwrap();
    let queries = catalog
        .leaves()
        .into_iter()
        .map(|leaf| leaf.query.to_string())
        .collect::<HashSet<_>>();

    for _ in 0..200 {
        let leaf = catalog.random_leaf().unwrap();
        assert!(queries.contains(leaf.query));
        assert_ne!(leaf.display_name, "Rock");
        assert_ne!(leaf.display_name, "Deeper");
    }
}

#[test]
fn should_find_by_path_or_name_ignoring_case() {
    let catalog = GenreCatalog::from_json(CATALOG).unwrap();

    assert_eq!(
        catalog.find("rock / classic / 1960S"),
        Some(&GenreNode::Leaf {
            name: "1960s".into(),
            query: "60s rock".into()
        })
    );
    assert_eq!(catalog.find("deepest").map(GenreNode::name), Some("Deepest"));
    assert_eq!(catalog.find("rock/deepest"), None);
    assert_eq!(catalog.find(""), None);
}

#[test]
fn should_pick_random_leaf_within_category() {
    let catalog = GenreCatalog::from_json(CATALOG).unwrap();
    let rock = catalog.find("Rock").unwrap();

    for _ in 0..50 {
        let leaf = rock.random_leaf().unwrap();
        assert!(["70s rock", "60s rock", "alternative rock"].contains(&leaf.query));
    }
}

#[test]
fn should_return_nothing_for_empty_catalog() {
    let catalog = GenreCatalog::from_json("{}").unwrap();

    assert!(catalog.leaves().is_empty());
    assert_eq!(catalog.random_leaf(), None);
}

#[test]
fn should_reject_non_string_leaves() {
    let result = GenreCatalog::from_json(r#"{"Rock": 42}"#);

    assert!(matches!(result, Err(CatalogError::Json(_))));
}

#[test]
fn should_load_embedded_catalog() {
    let catalog = GenreCatalog::embedded().unwrap();

    assert!(catalog.leaves().len() > 20);
    assert!(catalog
        .leaves()
        .iter()
        .all(|leaf| !leaf.query.trim().is_empty()));
    assert!(catalog.find("Rock/Classic Rock/1970s").is_some());
}

#[actix_rt::test]
async fn should_load_catalog_from_file() {
    let directory = tempfile::tempdir().unwrap();
    let path = directory.path().join("catalog.json");
    tokio::fs::write(&path, CATALOG).await.unwrap();

    let catalog = GenreCatalog::from_file(&path).await.unwrap();

    assert_eq!(catalog.leaves().len(), 5);
}

#[actix_rt::test]
async fn should_report_missing_catalog_file() {
    let result = GenreCatalog::from_file(std::path::Path::new("/nonexistent/catalog.json")).await;

    assert!(matches!(result, Err(CatalogError::Io(_))));
}
