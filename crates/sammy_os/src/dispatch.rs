#![forbid(unsafe_code)]

use sammy_engines::QueryParseRuntime;
use sammy_kernel_contracts::list::{FieldUpdate, ListEntry, SearchOutcome, ServiceError, SessionContext};
use sammy_kernel_contracts::query::{
    Extra, MediaType, Modifier, OperationType, ParsedQuery, QueryValue, SCORE_MAX, SCORE_MIN,
};
use sammy_kernel_contracts::{ContractViolation, Validate};

pub const NOT_SURE_REPLY: &str = "I'm sorry. I'm not sure what you mean.";
pub const THANKS_REPLY: &str = "You're welcome!";
pub const CANCELLED_REPLY: &str = "I have cancelled the operation. Nothing was changed.";
pub const CONNECTION_REPLY: &str =
    "Oh no, there was an error connecting to the list service. Maybe check your internet connection.";
pub const UNAUTHORISED_REPLY: &str = "Something was wrong with the username or password.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListDispatchConfig {
    /// Entries printed for a list view before the rest is summarized.
    pub max_listed_entries: usize,
}

impl ListDispatchConfig {
    pub fn mvp_v1() -> Self {
        Self {
            max_listed_entries: 50,
        }
    }
}

impl Validate for ListDispatchConfig {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.max_listed_entries == 0 {
            return Err(ContractViolation::InvalidValue {
                field: "list_dispatch_config.max_listed_entries",
                reason: "must be > 0",
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Exit,
    Reply(Vec<String>),
}

pub trait QueryEngine {
    fn process(&self, text: &str) -> ParsedQuery;
}

impl QueryEngine for QueryParseRuntime {
    fn process(&self, text: &str) -> ParsedQuery {
        QueryParseRuntime::process(self, text)
    }
}

impl<E: QueryEngine + ?Sized> QueryEngine for &E {
    fn process(&self, text: &str) -> ParsedQuery {
        (**self).process(text)
    }
}

/// The list service the assistant acts on. Every call carries the session
/// explicitly; implementations hold no per-user global state.
pub trait ListService {
    /// Looks a title up in the public database.
    fn search(
        &self,
        ctx: &SessionContext,
        term: &str,
        media_type: MediaType,
    ) -> Result<SearchOutcome, ServiceError>;

    fn add(
        &self,
        ctx: &SessionContext,
        term: &str,
        media_type: MediaType,
    ) -> Result<SearchOutcome, ServiceError>;

    fn delete(
        &self,
        ctx: &SessionContext,
        term: &str,
        media_type: MediaType,
    ) -> Result<SearchOutcome, ServiceError>;

    /// Applies `update` to the matching entry of the user's list and returns
    /// the entry as stored afterwards.
    fn update(
        &self,
        ctx: &SessionContext,
        term: &str,
        media_type: MediaType,
        update: FieldUpdate,
    ) -> Result<SearchOutcome, ServiceError>;

    fn view_list(
        &self,
        ctx: &SessionContext,
        media_type: MediaType,
    ) -> Result<Vec<ListEntry>, ServiceError>;
}

#[derive(Debug, Clone)]
pub struct ListDispatch<E, S>
where
    E: QueryEngine,
    S: ListService,
{
    config: ListDispatchConfig,
    engine: E,
    service: S,
}

impl<E, S> ListDispatch<E, S>
where
    E: QueryEngine,
    S: ListService,
{
    pub fn new(config: ListDispatchConfig, engine: E, service: S) -> Result<Self, ContractViolation> {
        config.validate()?;
        Ok(Self {
            config,
            engine,
            service,
        })
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn run_turn(&self, ctx: &SessionContext, text: &str) -> DispatchOutcome {
        let query = self.engine.process(text);
        if query.is_exit() {
            return DispatchOutcome::Exit;
        }

        let mut replies = Vec::new();
        match query.extra {
            Some(Extra::Greeting) => replies.push(format!("Hello, {}!", ctx.username)),
            Some(Extra::Thanks) => replies.push(THANKS_REPLY.to_string()),
            Some(Extra::Exit) | None => {}
        }

        match query.operation {
            Some(operation) => replies.extend(self.dispatch(ctx, operation, &query)),
            None if replies.is_empty() => replies.push(NOT_SURE_REPLY.to_string()),
            None => {}
        }
        DispatchOutcome::Reply(replies)
    }

    fn dispatch(
        &self,
        ctx: &SessionContext,
        operation: OperationType,
        query: &ParsedQuery,
    ) -> Vec<String> {
        let media = query.media_type;
        if operation != OperationType::ViewList && query.term.is_empty() {
            return vec![format!(
                "Which {} did you mean? I could not pick out a title.",
                media.as_str()
            )];
        }

        let result = match operation {
            OperationType::Search => self
                .service
                .search(ctx, &query.term, media)
                .map(|out| search_reply(out, &query.term)),
            OperationType::Add => self
                .service
                .add(ctx, &query.term, media)
                .map(|out| add_reply(out, &query.term, media)),
            OperationType::Delete => self
                .service
                .delete(ctx, &query.term, media)
                .map(|out| delete_reply(out, &query.term, media)),
            OperationType::Update | OperationType::UpdateIncrement => {
                let update = match field_update(operation, query) {
                    Ok(update) => update,
                    Err(reply) => return vec![reply],
                };
                self.service
                    .update(ctx, &query.term, media, update)
                    .map(|out| update_reply(out, &query.term, media, update))
            }
            OperationType::ViewList => self
                .service
                .view_list(ctx, media)
                .map(|entries| self.view_list_reply(&entries, media)),
        };

        match result {
            Ok(replies) => replies,
            Err(err) => {
                log::warn!("list service failed on {operation:?} for {}: {err}", ctx.username);
                vec![service_error_reply(&err)]
            }
        }
    }

    fn view_list_reply(&self, entries: &[ListEntry], media: MediaType) -> Vec<String> {
        if entries.is_empty() {
            return vec![format!("Your {} list is empty.", media.as_str())];
        }
        let mut out = vec![format!("Here is your {} list.", media.as_str())];
        out.extend(
            entries
                .iter()
                .take(self.config.max_listed_entries)
                .enumerate()
                .map(|(i, e)| format!("{}> {}", i + 1, describe_entry(e))),
        );
        if entries.len() > self.config.max_listed_entries {
            out.push(format!(
                "...and {} more.",
                entries.len() - self.config.max_listed_entries
            ));
        }
        out
    }
}

/// Turns an update query into the change the service applies, or the reply
/// explaining why nothing is sent.
fn field_update(operation: OperationType, query: &ParsedQuery) -> Result<FieldUpdate, String> {
    let Some(modifier) = query.modifier else {
        return Err(NOT_SURE_REPLY.to_string());
    };
    if let Some(implied) = modifier.implied_media_type() {
        if implied != query.media_type {
            return Err(format!(
                "{} entries do not track {}s.",
                capitalize(query.media_type.as_str()),
                modifier.as_str()
            ));
        }
    }

    let update = match (operation, modifier, query.value) {
        (OperationType::UpdateIncrement, m, _) => FieldUpdate::Increment(m),
        (_, Modifier::Score, Some(QueryValue::Number(n))) => FieldUpdate::SetScore(n),
        (_, Modifier::Score, None) => {
            return Err(format!(
                "I'm sorry, but the new score value must be between {SCORE_MIN} and {SCORE_MAX}."
            ))
        }
        (_, Modifier::Status, Some(QueryValue::Status(s))) => FieldUpdate::SetStatus(s),
        (_, m, Some(QueryValue::Number(n))) if m.is_count() => FieldUpdate::SetCount(m, n),
        (_, m, None) if m.is_count() => {
            return Err(format!(
                "The value for {} must be a whole number of 0 or more.",
                m.as_str()
            ))
        }
        _ => return Err(NOT_SURE_REPLY.to_string()),
    };
    update.validate().map_err(|_| NOT_SURE_REPLY.to_string())?;
    Ok(update)
}

fn describe_entry(entry: &ListEntry) -> String {
    let status = entry.status.map(|s| s.display_name()).unwrap_or("Not on list");
    let score = entry
        .score
        .map(|s| s.to_string())
        .unwrap_or_else(|| "-".to_string());
    let title = if entry.synonyms.is_empty() {
        entry.title.clone()
    } else {
        format!("{} ({})", entry.title, entry.synonyms)
    };
    let progress = match entry.media_type {
        MediaType::Anime => progress_of(entry, Modifier::Episode),
        MediaType::Manga => format!(
            "{} | {}",
            progress_of(entry, Modifier::Chapter),
            progress_of(entry, Modifier::Volume)
        ),
    };
    format!("{title} | {status} | score {score} | {progress}")
}

/// "episodes 12/24", with "?" for an unknown total.
fn progress_of(entry: &ListEntry, field: Modifier) -> String {
    let total = match entry.total(field) {
        0 => "?".to_string(),
        n => n.to_string(),
    };
    format!("{}s {}/{total}", field.as_str(), entry.count(field))
}

fn not_found(term: &str) -> String {
    format!("I'm sorry I could not find any results for \"{term}\".")
}

fn search_reply(out: SearchOutcome, term: &str) -> Vec<String> {
    match out {
        SearchOutcome::Found(entry) => vec![
            "Here is the entry you wanted.".to_string(),
            describe_entry(&entry),
        ],
        SearchOutcome::NoResults => vec![not_found(term)],
        SearchOutcome::UserCancelled => vec![CANCELLED_REPLY.to_string()],
    }
}

fn add_reply(out: SearchOutcome, term: &str, media: MediaType) -> Vec<String> {
    match out {
        SearchOutcome::Found(entry) => vec![format!(
            "Added \"{}\" to your {} list.",
            entry.title,
            media.as_str()
        )],
        SearchOutcome::NoResults => vec![not_found(term)],
        SearchOutcome::UserCancelled => vec![CANCELLED_REPLY.to_string()],
    }
}

fn delete_reply(out: SearchOutcome, term: &str, media: MediaType) -> Vec<String> {
    match out {
        SearchOutcome::Found(entry) => vec![format!("{} was successfully deleted.", entry.title)],
        SearchOutcome::NoResults => vec![format!(
            "I could not find \"{term}\" on your {} list.",
            media.as_str()
        )],
        SearchOutcome::UserCancelled => vec![CANCELLED_REPLY.to_string()],
    }
}

fn update_reply(out: SearchOutcome, term: &str, media: MediaType, update: FieldUpdate) -> Vec<String> {
    let entry = match out {
        SearchOutcome::Found(entry) => entry,
        SearchOutcome::NoResults => {
            return vec![format!(
                "I could not find \"{term}\" on your {} list.",
                media.as_str()
            )]
        }
        SearchOutcome::UserCancelled => return vec![CANCELLED_REPLY.to_string()],
    };

    let change = match update {
        FieldUpdate::Increment(m) | FieldUpdate::SetCount(m, _) => {
            format!("{} progress is now {}", m.as_str(), entry.count(m))
        }
        FieldUpdate::SetScore(n) => format!("score is now {n}"),
        FieldUpdate::SetStatus(s) => format!("status is now {}", s.display_name()),
    };
    let mut out = vec![format!("Updated {}: {change}.", entry.title)];
    let field = update.modifier();
    if field.is_count() && entry.total(field) > 0 && entry.count(field) == entry.total(field) {
        out.push(format!(
            "{} {} is the last in the series.",
            capitalize(field.as_str()),
            entry.count(field)
        ));
    }
    out
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn service_error_reply(err: &ServiceError) -> String {
    match err {
        ServiceError::ConnectionError => CONNECTION_REPLY.to_string(),
        ServiceError::Unauthorised => UNAUTHORISED_REPLY.to_string(),
        ServiceError::Other(msg) => format!("Some kind of error has occurred: {msg}"),
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use sammy_kernel_contracts::query::StatusType;

    #[derive(Debug, Clone)]
    struct StubEngine {
        out: ParsedQuery,
    }

    impl QueryEngine for StubEngine {
        fn process(&self, _text: &str) -> ParsedQuery {
            self.out.clone()
        }
    }

    #[derive(Debug, Default)]
    struct StubService {
        calls: RefCell<Vec<String>>,
        outcome: Option<SearchOutcome>,
        error: Option<ServiceError>,
        entries: Vec<ListEntry>,
    }

    impl StubService {
        fn answer(&self, call: String) -> Result<SearchOutcome, ServiceError> {
            self.calls.borrow_mut().push(call);
            match &self.error {
                Some(err) => Err(err.clone()),
                None => Ok(self.outcome.clone().unwrap_or(SearchOutcome::NoResults)),
            }
        }
    }

    impl ListService for StubService {
        fn search(
            &self,
            _ctx: &SessionContext,
            term: &str,
            media_type: MediaType,
        ) -> Result<SearchOutcome, ServiceError> {
            self.answer(format!("search {term} {}", media_type.as_str()))
        }

        fn add(
            &self,
            _ctx: &SessionContext,
            term: &str,
            media_type: MediaType,
        ) -> Result<SearchOutcome, ServiceError> {
            self.answer(format!("add {term} {}", media_type.as_str()))
        }

        fn delete(
            &self,
            _ctx: &SessionContext,
            term: &str,
            media_type: MediaType,
        ) -> Result<SearchOutcome, ServiceError> {
            self.answer(format!("delete {term} {}", media_type.as_str()))
        }

        fn update(
            &self,
            _ctx: &SessionContext,
            term: &str,
            _media_type: MediaType,
            update: FieldUpdate,
        ) -> Result<SearchOutcome, ServiceError> {
            self.answer(format!("update {term} {update:?}"))
        }

        fn view_list(
            &self,
            _ctx: &SessionContext,
            media_type: MediaType,
        ) -> Result<Vec<ListEntry>, ServiceError> {
            self.calls
                .borrow_mut()
                .push(format!("view_list {}", media_type.as_str()));
            match &self.error {
                Some(err) => Err(err.clone()),
                None => Ok(self.entries.clone()),
            }
        }
    }

    fn ctx() -> SessionContext {
        SessionContext::v1("kira".to_string()).unwrap()
    }

    fn entry(title: &str, progress: u32, total: u32) -> ListEntry {
        ListEntry {
            title: title.to_string(),
            synonyms: String::new(),
            media_type: MediaType::Anime,
            status: Some(StatusType::Watching),
            score: None,
            progress,
            series_total: total,
            volumes_read: 0,
            series_volumes: 0,
        }
    }

    fn query(operation: OperationType, term: &str) -> ParsedQuery {
        ParsedQuery {
            operation: Some(operation),
            term: term.to_string(),
            ..ParsedQuery::default()
        }
    }

    fn dispatch(out: ParsedQuery, service: StubService) -> ListDispatch<StubEngine, StubService> {
        ListDispatch::new(ListDispatchConfig::mvp_v1(), StubEngine { out }, service).unwrap()
    }

    fn replies(outcome: DispatchOutcome) -> Vec<String> {
        match outcome {
            DispatchOutcome::Reply(r) => r,
            DispatchOutcome::Exit => panic!("expected a reply"),
        }
    }

    #[test]
    fn at_dispatch_01_exit_makes_no_service_call() {
        let d = dispatch(ParsedQuery::exit(), StubService::default());
        assert_eq!(d.run_turn(&ctx(), "exit"), DispatchOutcome::Exit);
        assert!(d.service().calls.borrow().is_empty());
    }

    #[test]
    fn at_dispatch_02_unrecognized_gets_not_sure_reply() {
        let d = dispatch(ParsedQuery::unrecognized(), StubService::default());
        assert_eq!(replies(d.run_turn(&ctx(), "blah")), vec![NOT_SURE_REPLY]);
    }

    #[test]
    fn at_dispatch_03_greeting_alone_and_with_task() {
        let greeting = ParsedQuery {
            extra: Some(Extra::Greeting),
            ..ParsedQuery::unrecognized()
        };
        let d = dispatch(greeting, StubService::default());
        assert_eq!(replies(d.run_turn(&ctx(), "hi")), vec!["Hello, kira!"]);

        let mut q = query(OperationType::Search, "naruto");
        q.extra = Some(Extra::Thanks);
        let d = dispatch(q, StubService::default());
        let r = replies(d.run_turn(&ctx(), "thanks, search for naruto"));
        assert_eq!(r[0], THANKS_REPLY);
        assert_eq!(r[1], "I'm sorry I could not find any results for \"naruto\".");
    }

    #[test]
    fn at_dispatch_04_empty_term_asks_for_title() {
        let d = dispatch(query(OperationType::Add, ""), StubService::default());
        let r = replies(d.run_turn(&ctx(), "add"));
        assert!(r[0].starts_with("Which anime did you mean?"));
        assert!(d.service().calls.borrow().is_empty());
    }

    #[test]
    fn at_dispatch_05_score_without_value_is_refused() {
        let mut q = query(OperationType::Update, "bleach");
        q.modifier = Some(Modifier::Score);
        let d = dispatch(q, StubService::default());
        let r = replies(d.run_turn(&ctx(), "set my score for bleach to 11"));
        assert!(r[0].contains("the new score value must be between 1 and 10"));
        assert!(d.service().calls.borrow().is_empty());
    }

    #[test]
    fn at_dispatch_06_field_mismatch_is_refused() {
        let mut q = query(OperationType::Update, "naruto");
        q.modifier = Some(Modifier::Chapter);
        q.value = Some(QueryValue::Number(3));
        let d = dispatch(q, StubService::default());
        let r = replies(d.run_turn(&ctx(), "x"));
        assert_eq!(r, vec!["Anime entries do not track chapters."]);
        assert!(d.service().calls.borrow().is_empty());
    }

    #[test]
    fn at_dispatch_07_update_maps_to_field_update() {
        let mut q = query(OperationType::UpdateIncrement, "naruto");
        q.modifier = Some(Modifier::Episode);
        let service = StubService {
            outcome: Some(SearchOutcome::Found(entry("Naruto", 220, 220))),
            ..StubService::default()
        };
        let d = dispatch(q, service);
        let r = replies(d.run_turn(&ctx(), "increment naruto"));
        assert_eq!(
            d.service().calls.borrow().as_slice(),
            ["update naruto Increment(Episode)"]
        );
        assert_eq!(r[0], "Updated Naruto: episode progress is now 220.");
        assert_eq!(r[1], "Episode 220 is the last in the series.");

        let mut q = query(OperationType::Update, "naruto");
        q.modifier = Some(Modifier::Status);
        q.value = Some(QueryValue::Status(StatusType::Completed));
        let d = dispatch(q, StubService::default());
        d.run_turn(&ctx(), "mark naruto as completed");
        assert_eq!(
            d.service().calls.borrow().as_slice(),
            ["update naruto SetStatus(Completed)"]
        );
    }

    #[test]
    fn at_dispatch_08_service_outcomes() {
        let service = StubService {
            outcome: Some(SearchOutcome::UserCancelled),
            ..StubService::default()
        };
        let d = dispatch(query(OperationType::Delete, "bleach"), service);
        assert_eq!(replies(d.run_turn(&ctx(), "x")), vec![CANCELLED_REPLY]);

        let service = StubService {
            error: Some(ServiceError::ConnectionError),
            ..StubService::default()
        };
        let d = dispatch(query(OperationType::Search, "bleach"), service);
        assert_eq!(replies(d.run_turn(&ctx(), "x")), vec![CONNECTION_REPLY]);
    }

    #[test]
    fn at_dispatch_09_view_list_is_capped() {
        let service = StubService {
            entries: (0..3).map(|i| entry(&format!("Show {i}"), i, 0)).collect(),
            ..StubService::default()
        };
        let d = ListDispatch::new(
            ListDispatchConfig {
                max_listed_entries: 2,
            },
            StubEngine {
                out: query(OperationType::ViewList, ""),
            },
            service,
        )
        .unwrap();
        let r = replies(d.run_turn(&ctx(), "show me my list"));
        assert_eq!(r.len(), 4);
        assert_eq!(r[0], "Here is your anime list.");
        assert_eq!(r[1], "1> Show 0 | Watching | score - | episodes 0/?");
        assert_eq!(r[3], "...and 1 more.");
    }

    #[test]
    fn at_dispatch_10_zero_list_budget_is_rejected() {
        assert!(ListDispatch::new(
            ListDispatchConfig {
                max_listed_entries: 0
            },
            StubEngine {
                out: ParsedQuery::unrecognized()
            },
            StubService::default(),
        )
        .is_err());
    }

    #[test]
    fn at_dispatch_11_runtime_is_a_query_engine() {
        let d = ListDispatch::new(
            ListDispatchConfig::mvp_v1(),
            QueryParseRuntime::builtin(),
            StubService::default(),
        )
        .unwrap();
        d.run_turn(&ctx(), "add fullmetal alchemist to my manga list");
        assert_eq!(
            d.service().calls.borrow().as_slice(),
            ["add fullmetal alchemist manga"]
        );
    }

    #[test]
    fn at_dispatch_12_volume_progress_is_reported_apart_from_chapters() {
        let berserk = ListEntry {
            media_type: MediaType::Manga,
            status: Some(StatusType::Completed),
            volumes_read: 41,
            series_volumes: 41,
            ..entry("Berserk", 364, 364)
        };
        let mut q = query(OperationType::Update, "berserk");
        q.media_type = MediaType::Manga;
        q.modifier = Some(Modifier::Volume);
        q.value = Some(QueryValue::Number(41));
        let service = StubService {
            outcome: Some(SearchOutcome::Found(berserk.clone())),
            ..StubService::default()
        };
        let d = dispatch(q, service);
        let r = replies(d.run_turn(&ctx(), "set berserk volume to 41"));
        assert_eq!(
            r,
            vec![
                "Updated Berserk: volume progress is now 41.",
                "Volume 41 is the last in the series.",
            ]
        );
        assert_eq!(
            describe_entry(&berserk),
            "Berserk | Completed | score - | chapters 364/364 | volumes 41/41"
        );
    }
}
