#![forbid(unsafe_code)]

use sammy_engines::action::{determine_action, scan_actions};
use sammy_engines::normalize::{normalize, strip_information_suffix, strip_media_type_suffix};
use sammy_engines::{ActionCategory, QueryParseConfig, QueryParseRuntime, SynonymTable};
use sammy_kernel_contracts::query::{
    Extra, MediaType, Modifier, OperationType, ParsedQuery, QueryValue, StatusType,
};
use sammy_kernel_contracts::Validate;

fn process(text: &str) -> ParsedQuery {
    let q = QueryParseRuntime::builtin().process(text);
    assert!(q.validate().is_ok(), "{text}: {q:?}");
    q
}

fn expect(
    text: &str,
    operation: OperationType,
    media_type: MediaType,
    term: &str,
    modifier: Option<Modifier>,
    value: Option<QueryValue>,
) {
    let q = process(text);
    assert_eq!(q.operation, Some(operation), "{text}");
    assert_eq!(q.media_type, media_type, "{text}");
    assert_eq!(q.term, term, "{text}");
    assert_eq!(q.modifier, modifier, "{text}");
    assert_eq!(q.value, value, "{text}");
    assert_eq!(q.extra, None, "{text}");
}

#[test]
fn at_e2e_01_search() {
    expect(
        "search for naruto",
        OperationType::Search,
        MediaType::Anime,
        "naruto",
        None,
        None,
    );
    expect(
        "Can you find me some information on Berserk manga?",
        OperationType::Search,
        MediaType::Manga,
        "berserk",
        None,
        None,
    );
    expect(
        "Search for NARUTO…",
        OperationType::Search,
        MediaType::Anime,
        "naruto",
        None,
        None,
    );
    expect(
        "tell me about one piece",
        OperationType::Search,
        MediaType::Anime,
        "one piece",
        None,
        None,
    );
}

#[test]
fn at_e2e_02_add() {
    expect(
        "add fullmetal alchemist to my manga list",
        OperationType::Add,
        MediaType::Manga,
        "fullmetal alchemist",
        None,
        None,
    );
    expect(
        "add naruto to my manga list please",
        OperationType::Add,
        MediaType::Manga,
        "naruto",
        None,
        None,
    );
    expect(
        "Please add Naruto to my list!",
        OperationType::Add,
        MediaType::Anime,
        "naruto",
        None,
        None,
    );
}

#[test]
fn at_e2e_03_delete() {
    expect(
        "remove berserk from my manga list",
        OperationType::Delete,
        MediaType::Manga,
        "berserk",
        None,
        None,
    );
    expect(
        "remove berserk from my manga list now",
        OperationType::Delete,
        MediaType::Manga,
        "berserk",
        None,
        None,
    );
    expect(
        "get rid of bleach",
        OperationType::Delete,
        MediaType::Anime,
        "bleach",
        None,
        None,
    );
}

#[test]
fn at_e2e_04_update_score() {
    expect(
        "set my score for bleach to 8",
        OperationType::Update,
        MediaType::Anime,
        "bleach",
        Some(Modifier::Score),
        Some(QueryValue::Number(8)),
    );
    expect(
        "give naruto a 9",
        OperationType::Update,
        MediaType::Anime,
        "naruto",
        Some(Modifier::Score),
        Some(QueryValue::Number(9)),
    );
    expect(
        "set my score for bleach to 0",
        OperationType::Update,
        MediaType::Anime,
        "bleach",
        Some(Modifier::Score),
        None,
    );
}

#[test]
fn at_e2e_05_update_status() {
    expect(
        "change status of naruto to completed",
        OperationType::Update,
        MediaType::Anime,
        "naruto",
        Some(Modifier::Status),
        Some(QueryValue::Status(StatusType::Completed)),
    );
    expect(
        "mark berserk as reading",
        OperationType::Update,
        MediaType::Manga,
        "berserk",
        Some(Modifier::Status),
        Some(QueryValue::Status(StatusType::Reading)),
    );
    expect(
        "set vinland saga manga to plan",
        OperationType::Update,
        MediaType::Manga,
        "vinland saga",
        Some(Modifier::Status),
        Some(QueryValue::Status(StatusType::PlanToRead)),
    );
}

#[test]
fn at_e2e_06_update_counts_and_increment() {
    expect(
        "update the chapter count of berserk to 120",
        OperationType::Update,
        MediaType::Manga,
        "berserk",
        Some(Modifier::Chapter),
        Some(QueryValue::Number(120)),
    );
    expect(
        "increment naruto",
        OperationType::UpdateIncrement,
        MediaType::Anime,
        "naruto",
        Some(Modifier::Episode),
        None,
    );
}

#[test]
fn at_e2e_07_status_takes_final_precedence() {
    expect(
        "update naruto status to dropped",
        OperationType::Update,
        MediaType::Anime,
        "naruto",
        Some(Modifier::Status),
        Some(QueryValue::Status(StatusType::Dropped)),
    );
}

#[test]
fn at_e2e_08_exit_sentinel() {
    let q = process("exit");
    assert_eq!(q, ParsedQuery::exit());
    assert_eq!(q.operation, None);
    assert_eq!(q.term, "");
}

#[test]
fn at_e2e_09_view_list() {
    let q = process("show me my manga list");
    assert_eq!(q.operation, Some(OperationType::ViewList));
    assert_eq!(q.media_type, MediaType::Manga);
    assert_eq!(q.term, "");

    let q = process("What's on my list?");
    assert_eq!(q.operation, Some(OperationType::ViewList));
    assert_eq!(q.media_type, MediaType::Anime);
}

#[test]
fn at_e2e_10_greeting_prefix_keeps_task() {
    let q = process("Hey! search for naruto");
    assert_eq!(q.extra, Some(Extra::Greeting));
    assert_eq!(q.operation, Some(OperationType::Search));
    assert_eq!(q.term, "naruto");
}

#[test]
fn at_e2e_11_every_search_phrase_resolves_search() {
    let table = SynonymTable::builtin();
    for s in table.action(ActionCategory::Search) {
        for text in [format!("{s} for test"), format!("i want to {s} for test")] {
            assert_eq!(
                determine_action(&text, &table),
                Some(OperationType::Search),
                "{text}"
            );
        }
    }
}

#[test]
fn at_e2e_12_tied_pairs_follow_override_table() {
    let table = SynonymTable::builtin();
    let pairs = [
        (ActionCategory::Delete, ActionCategory::Search),
        (ActionCategory::Increment, ActionCategory::Update),
        (ActionCategory::Search, ActionCategory::ViewList),
    ];
    let mut checked = 0;
    for (a, b) in pairs {
        for s1 in table.action(a) {
            for s2 in table.action(b) {
                let text = format!("{s1} {s2}");
                let m = scan_actions(&text, &table);
                let [x, y] = m.as_slice() else {
                    continue;
                };
                if x.index != y.index || (x.category, y.category) != (a, b) {
                    continue;
                }
                checked += 1;
                let expected = match a {
                    ActionCategory::Delete => OperationType::Delete,
                    ActionCategory::Increment => OperationType::Update,
                    _ if text.ends_with(" list") => OperationType::ViewList,
                    _ => OperationType::Search,
                };
                assert_eq!(determine_action(&text, &table), Some(expected), "{text}");
            }
        }
    }
    assert!(checked > 0);
}

#[test]
fn at_e2e_13_text_helpers() {
    let table = SynonymTable::builtin();
    assert_eq!(normalize("String with punct!!!"), "string with punct");
    assert_eq!(normalize(""), "");
    for input in ["naruto info", "info info", "", "details of bleach data"] {
        let once = strip_information_suffix(input, &table);
        assert_eq!(strip_information_suffix(once, &table), once);
    }
    assert_eq!(
        strip_media_type_suffix("test string anime"),
        ("test string", Some(MediaType::Anime))
    );
    assert_eq!(strip_media_type_suffix("teststring"), ("teststring", None));
}

#[test]
fn at_e2e_14_runtime_is_stateless_across_calls() {
    let runtime =
        QueryParseRuntime::new(QueryParseConfig::mvp_v1(), SynonymTable::builtin()).unwrap();
    let first = runtime.process("add naruto to my manga list");
    runtime.process("remove bleach");
    assert_eq!(runtime.process("add naruto to my manga list"), first);
}
