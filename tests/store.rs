use serde_json::{Value, json};

use football_docs::filter::{Filter, Update};
use football_docs::player::{PlayerDocument, player_validator};
use football_docs::queries::{
    players_by_nationality, players_by_team_prefix, players_started_after, uppercase_names,
};
use football_docs::store::{
    CollectionStatus, DocId, DocumentStore, FindOptions, SortOrder, StoreError,
};

const PLAYERS: &str = "players";

fn player_doc(id: &str, name: &str, team: &str, nationality: &str, start_year: i32) -> Value {
    json!({
        "player_id": id,
        "name": name,
        "nationality": nationality,
        "position": "MF",
        "age": 25,
        "birth_year": null,
        "start_year": start_year,
        "team": {"squad_id": format!("sq-{team}"), "name": team},
        "stats": {"goals": 2, "assists": 1},
        "advanced_stats": {"xG": 1.5, "shots": 10}
    })
}

fn seeded_store() -> (DocumentStore, Vec<DocId>) {
    let mut store = DocumentStore::open_in_memory().expect("memory store");
    store
        .create_collection(PLAYERS, &player_validator())
        .expect("create collection");
    let ids = store
        .insert_many(
            PLAYERS,
            &[
                player_doc("p1", "Ella Toone", "Manchester United", "eng ENG", 2022),
                player_doc("p2", "Lauren James", "Chelsea", "eng ENG", 2015),
                player_doc("p3", "Khadija Shaw", "Manchester City", "jm JAM", 2020),
                player_doc("p4", "Marisa Ferrer", "manchester lowercase", "es ESP", 2024),
            ],
        )
        .expect("insert");
    (store, ids)
}

fn player_ids(docs: &[football_docs::store::StoredDocument]) -> Vec<String> {
    docs.iter()
        .map(|doc| {
            doc.get("player_id")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        })
        .collect()
}

#[test]
fn ensure_collection_is_idempotent() {
    let mut store = DocumentStore::open_in_memory().expect("memory store");
    let validator = player_validator();
    assert_eq!(
        store.ensure_collection(PLAYERS, &validator).expect("ensure"),
        CollectionStatus::Created
    );
    assert_eq!(
        store.ensure_collection(PLAYERS, &validator).expect("ensure"),
        CollectionStatus::AlreadyExists
    );
    let err = store
        .create_collection(PLAYERS, &validator)
        .expect_err("duplicate create should fail");
    assert!(matches!(err, StoreError::CollectionExists(name) if name == PLAYERS));
    assert_eq!(store.collection_names().expect("names"), vec![PLAYERS]);
    assert_eq!(store.validator(PLAYERS).expect("validator"), validator);
}

#[test]
fn validator_rejects_malformed_documents() {
    let mut store = DocumentStore::open_in_memory().expect("memory store");
    store
        .create_collection(PLAYERS, &player_validator())
        .expect("create collection");

    let mut missing_team = player_doc("p1", "A", "Chelsea", "", 2020);
    missing_team.as_object_mut().expect("object").remove("team");
    let mut bare_team = player_doc("p1", "A", "Chelsea", "", 2020);
    bare_team["team"] = json!("Chelsea");
    let mut double_year = player_doc("p1", "A", "Chelsea", "", 2020);
    double_year["start_year"] = json!(2020.0);
    let mut string_age = player_doc("p1", "A", "Chelsea", "", 2020);
    string_age["age"] = json!("24");
    let mut int_xg = player_doc("p1", "A", "Chelsea", "", 2020);
    int_xg["advanced_stats"]["xG"] = json!(1);

    for (label, doc) in [
        ("team", missing_team),
        ("team", bare_team),
        ("start_year", double_year),
        ("age", string_age),
        ("advanced_stats.xG", int_xg),
    ] {
        let err = store
            .insert_many(PLAYERS, &[doc])
            .expect_err("invalid document should be rejected");
        match err {
            StoreError::Validation { violations, .. } => {
                assert!(
                    violations.iter().any(|v| v.path == label),
                    "expected violation at {label}, got {violations:?}"
                );
            }
            other => panic!("unexpected error {other}"),
        }
    }
    assert_eq!(store.count(PLAYERS, &Filter::All).expect("count"), 0);

    let mut null_nationality = player_doc("p1", "A", "Chelsea", "", 2020);
    null_nationality["nationality"] = Value::Null;
    store
        .insert_one(PLAYERS, &null_nationality)
        .expect("nullable nationality is accepted");
}

#[test]
fn batch_with_one_bad_document_inserts_nothing() {
    let mut store = DocumentStore::open_in_memory().expect("memory store");
    store
        .create_collection(PLAYERS, &player_validator())
        .expect("create collection");
    let mut bad = player_doc("p2", "B", "Chelsea", "", 2020);
    bad.as_object_mut().expect("object").remove("position");

    let err = store
        .insert_many(PLAYERS, &[player_doc("p1", "A", "Chelsea", "", 2020), bad])
        .expect_err("batch should be rejected");
    assert!(matches!(err, StoreError::Validation { ref target, .. } if target == "document 1"));
    assert_eq!(store.count(PLAYERS, &Filter::All).expect("count"), 0);
}

#[test]
fn insert_then_find_by_id_round_trips() {
    let (store, ids) = seeded_store();
    let doc = store
        .find_by_id(PLAYERS, ids[1])
        .expect("find")
        .expect("document exists");
    assert_eq!(doc.id, ids[1]);
    assert_eq!(
        doc.body,
        player_doc("p2", "Lauren James", "Chelsea", "eng ENG", 2015)
    );
    assert!(store.find_by_id(PLAYERS, DocId(9_999)).expect("find").is_none());
}

#[test]
fn typed_player_round_trips_through_the_store() {
    let mut store = DocumentStore::open_in_memory().expect("memory store");
    store
        .create_collection(PLAYERS, &player_validator())
        .expect("create collection");

    let full: PlayerDocument = serde_json::from_value(json!({
        "player_id": "p9", "name": "Typed", "nationality": "", "position": "GK",
        "age": null, "birth_year": 2000, "start_year": 2019,
        "team": {"squad_id": "ars", "name": "Arsenal"},
        "stats": {"matches_played": 0, "starts": 0, "minutes_played": 0, "goals": 0,
            "assists": 0, "goals_minus_pks": 0, "penalty_goals": 0, "penalty_attempts": 0,
            "yellow_cards": 0, "red_cards": 0, "second_yellow_cards": 0},
        "advanced_stats": {"xG": 0.1, "npxG": 0.1, "xAG": 0.0, "shots": 0,
            "shots_on_target": 0, "goals_per_shot": 0.0, "goals_per_shot_on_target": 0.0,
            "average_shot_distance": 0.0, "free_kicks": 0, "npxG_per_shot": 0.0,
            "goals_minus_xG": -0.1, "np_goals_minus_xG": -0.1},
        "passing": {"passes_completed": 300, "passes_attempted": 410,
            "pass_completion_pct": 73.2, "total_pass_distance": 6000,
            "progressive_pass_distance": 2500, "expected_assists": 0.3,
            "assists_minus_xAG": 0.0, "key_passes": 1, "passes_into_final_third": 4,
            "passes_into_penalty_area": 0, "crosses_into_penalty_area": 0,
            "progressive_passes": 3},
        "goal_shot_creation": {"shot_creating_actions": 1, "sca_pass_live": 1,
            "sca_pass_dead": 0, "sca_dribble": 0, "sca_shot": 0, "sca_foul_drawn": 0,
            "sca_defense": 0, "goal_creating_actions": 0, "gca_pass_live": 0,
            "gca_pass_dead": 0, "gca_dribble": 0, "gca_shot": 0, "gca_foul_drawn": 0,
            "gca_defense": 0},
        "defense": {"tackles": 0, "tackles_won": 0, "tackles_def_3rd": 0,
            "tackles_mid_3rd": 0, "tackles_att_3rd": 0, "dribble_tackles": 0,
            "dribbles_against": 0, "dribbled_past": 0, "blocks": 0, "blocked_shots": 0,
            "blocked_passes": 0, "interceptions": 0, "tackles_interceptions": 0,
            "clearances": 12, "errors": 1}
    }))
    .expect("typed player parses");

    let inserted = full.to_document().expect("serializes");
    let id = store.insert_one(PLAYERS, &inserted).expect("insert");
    let stored = store
        .find_by_id(PLAYERS, id)
        .expect("find")
        .expect("document exists");
    assert_eq!(stored.body, inserted);
    assert_eq!(
        PlayerDocument::from_document(stored.body).expect("decodes"),
        full
    );
}

#[test]
fn start_year_query_returns_exactly_later_years() {
    let (store, _) = seeded_store();
    let docs = players_started_after(&store, PLAYERS, 2020).expect("query");
    assert_eq!(player_ids(&docs), vec!["p1", "p4"]);
    assert!(docs.iter().all(|d| d.get("start_year").and_then(Value::as_i64) > Some(2020)));
}

#[test]
fn team_prefix_query_respects_case_option() {
    let (store, _) = seeded_store();
    let sensitive = players_by_team_prefix(&store, PLAYERS, "Manchester", false).expect("query");
    assert_eq!(player_ids(&sensitive), vec!["p1", "p3"]);
    let insensitive = players_by_team_prefix(&store, PLAYERS, "Manchester", true).expect("query");
    assert_eq!(player_ids(&insensitive), vec!["p1", "p3", "p4"]);
}

#[test]
fn nationality_query_is_exact() {
    let (store, _) = seeded_store();
    let docs = players_by_nationality(&store, PLAYERS, "es ESP").expect("query");
    assert_eq!(player_ids(&docs), vec!["p4"]);
    assert!(players_by_nationality(&store, PLAYERS, "ESP")
        .expect("query")
        .is_empty());
}

#[test]
fn find_options_limit_and_order() {
    let (store, _) = seeded_store();
    let docs = store
        .find_with(
            PLAYERS,
            &Filter::All,
            &FindOptions {
                limit: Some(2),
                order: SortOrder::Descending,
            },
        )
        .expect("find");
    assert_eq!(player_ids(&docs), vec!["p4", "p3"]);
    let none = store
        .find_with(PLAYERS, &Filter::All, &FindOptions::limit(0))
        .expect("find");
    assert!(none.is_empty());
}

#[test]
fn update_one_touches_first_match_and_revalidates() {
    let (mut store, ids) = seeded_store();
    let outcome = store
        .update_one(
            PLAYERS,
            &Filter::eq("nationality", "eng ENG"),
            &Update::set("position", "FW"),
        )
        .expect("update");
    assert_eq!((outcome.matched, outcome.modified), (1, 1));
    let first = store.find_by_id(PLAYERS, ids[0]).expect("find").expect("exists");
    let second = store.find_by_id(PLAYERS, ids[1]).expect("find").expect("exists");
    assert_eq!(first.get("position"), Some(&json!("FW")));
    assert_eq!(second.get("position"), Some(&json!("MF")));

    let noop = store
        .update_one(PLAYERS, &Filter::Id(ids[0]), &Update::set("position", "FW"))
        .expect("update");
    assert_eq!((noop.matched, noop.modified), (1, 0));

    let missing = store
        .update_one(PLAYERS, &Filter::eq("player_id", "nope"), &Update::set("name", "X"))
        .expect("update");
    assert_eq!((missing.matched, missing.modified), (0, 0));

    let err = store
        .update_one(PLAYERS, &Filter::Id(ids[0]), &Update::set("start_year", "soon"))
        .expect_err("invalid update should be rejected");
    assert!(matches!(err, StoreError::Validation { .. }));
    let unchanged = store.find_by_id(PLAYERS, ids[0]).expect("find").expect("exists");
    assert_eq!(unchanged.get("start_year"), Some(&json!(2022)));
}

#[test]
fn uppercase_pass_changes_only_the_first_two() {
    let (mut store, ids) = seeded_store();
    let changes = uppercase_names(&mut store, PLAYERS, 2).expect("uppercase");
    assert_eq!(changes.len(), 2);
    assert_eq!(changes[0].id, ids[0]);
    assert_eq!(changes[0].after, "ELLA TOONE");
    assert_eq!(changes[1].after, "LAUREN JAMES");

    let names: Vec<String> = store
        .find(PLAYERS, &Filter::All)
        .expect("find")
        .iter()
        .map(|d| d.get("name").and_then(Value::as_str).unwrap_or_default().to_string())
        .collect();
    assert_eq!(
        names,
        vec!["ELLA TOONE", "LAUREN JAMES", "Khadija Shaw", "Marisa Ferrer"]
    );
}

#[test]
fn drop_removes_documents_and_validator() {
    let (mut store, _) = seeded_store();
    assert!(store.drop_collection(PLAYERS).expect("drop"));
    assert!(!store.has_collection(PLAYERS).expect("exists"));
    assert!(!store.drop_collection(PLAYERS).expect("drop again"));

    let err = store
        .find(PLAYERS, &Filter::All)
        .expect_err("missing collection");
    assert!(matches!(err, StoreError::CollectionMissing(_)));
    let err = store
        .insert_many(PLAYERS, &[player_doc("p1", "A", "Chelsea", "", 2020)])
        .expect_err("missing collection");
    assert!(matches!(err, StoreError::CollectionMissing(_)));

    store
        .create_collection(PLAYERS, &player_validator())
        .expect("recreate");
    assert_eq!(store.count(PLAYERS, &Filter::All).expect("count"), 0);
}

#[test]
fn file_backed_store_persists_between_connections() {
    let dir = std::env::temp_dir().join(format!("football_docs_store_{}", std::process::id()));
    let path = dir.join("players.sqlite");
    let uri = format!("sqlite://{}", path.display());
    let _ = std::fs::remove_file(&path);

    {
        let mut store = DocumentStore::connect(&uri).expect("open file store");
        store
            .create_collection(PLAYERS, &player_validator())
            .expect("create collection");
        store
            .insert_one(PLAYERS, &player_doc("p1", "A", "Chelsea", "", 2020))
            .expect("insert");
    }

    let store = DocumentStore::connect(&uri).expect("reopen file store");
    let info = store.describe_collection(PLAYERS).expect("describe");
    assert_eq!(info.documents, 1);
    assert!(!info.created_at.is_empty());
    drop(store);
    let _ = std::fs::remove_dir_all(&dir);
}
