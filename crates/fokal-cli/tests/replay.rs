//! Replay of the bundled album scenario

use fokal_cli::{replay, Scenario};
use fokal_core::{FokalConfig, Rejection, StatusClass};
use std::path::Path;

fn album() -> Scenario {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("scenarios/album.json");
    Scenario::load(&path).unwrap()
}

#[tokio::test]
async fn album_scenario_outcomes() {
    let lines = replay(&album(), &FokalConfig::default()).await.unwrap();

    let outcomes: Vec<(&str, StatusClass, Option<Rejection>)> = lines
        .iter()
        .map(|line| (line.op, line.status, line.rejection))
        .collect();
    assert_eq!(
        outcomes,
        vec![
            ("modify_links", StatusClass::Success, None),
            ("modify_links", StatusClass::Forbidden, Some(Rejection::Unauthorized)),
            ("add_tags", StatusClass::Success, None),
            ("add_tags", StatusClass::BadRequest, Some(Rejection::MalformedReference)),
            ("list_links", StatusClass::Success, None),
            ("get_tags", StatusClass::Success, None),
            ("delete", StatusClass::Forbidden, Some(Rejection::Unauthorized)),
            ("delete", StatusClass::Success, None),
            // the deleted image has no owner left, so nothing grants the read
            ("get_tags", StatusClass::Forbidden, Some(Rejection::Unauthorized)),
        ]
    );

    assert_eq!(
        lines[4].links,
        Some(vec![
            "images/imgoneaaaaaa".to_string(),
            "images/imgtwoaaaaaa".to_string(),
        ])
    );
    assert_eq!(
        lines[5].tags,
        Some(["ocean".to_string(), "sunset".to_string()].into())
    );
}

#[tokio::test]
async fn lines_serialize_without_empty_fields() {
    let lines = replay(&album(), &FokalConfig::default()).await.unwrap();
    let json = serde_json::to_value(&lines[0]).unwrap();
    assert_eq!(json["status"], "Success");
    assert!(json.get("rejection").is_none());
    assert!(json.get("links").is_none());
}
