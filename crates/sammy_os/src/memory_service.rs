#![forbid(unsafe_code)]

use std::cell::RefCell;
use std::collections::BTreeMap;

use sammy_kernel_contracts::list::{FieldUpdate, ListEntry, SearchOutcome, ServiceError, SessionContext};
use sammy_kernel_contracts::query::{MediaType, Modifier, StatusType};
use sammy_kernel_contracts::Validate;

use crate::dispatch::ListService;
use crate::entry_match::match_entries;

/// In-process list service over a fixed catalog, one list per username.
///
/// When several entries match a term the first one is used.
#[derive(Debug, Default)]
pub struct MemoryListService {
    catalog: Vec<ListEntry>,
    lists: RefCell<BTreeMap<String, Vec<ListEntry>>>,
}

impl MemoryListService {
    pub fn new(catalog: Vec<ListEntry>) -> Self {
        Self {
            catalog,
            lists: RefCell::new(BTreeMap::new()),
        }
    }

    pub fn list_of(&self, ctx: &SessionContext) -> Vec<ListEntry> {
        self.lists
            .borrow()
            .get(&ctx.username)
            .cloned()
            .unwrap_or_default()
    }

    fn find_in_catalog(&self, term: &str, media_type: MediaType) -> Option<ListEntry> {
        let candidates: Vec<ListEntry> = self
            .catalog
            .iter()
            .filter(|e| e.media_type == media_type)
            .cloned()
            .collect();
        match_entries(&candidates, term).first().map(|e| (*e).clone())
    }

    /// Index into the user's list of the first entry matching `term`.
    fn position_in_list(list: &[ListEntry], term: &str, media_type: MediaType) -> Option<usize> {
        let found = match_entries(list, term)
            .into_iter()
            .find(|e| e.media_type == media_type)?;
        list.iter().position(|e| std::ptr::eq(e, found))
    }
}

fn apply_update(entry: &mut ListEntry, update: FieldUpdate) -> Result<(), ServiceError> {
    match update {
        FieldUpdate::Increment(m) => {
            let next = entry.count(m).saturating_add(1);
            check_total(entry, m, next)?;
            *entry.count_mut(m) = next;
        }
        FieldUpdate::SetCount(m, n) => {
            check_total(entry, m, n)?;
            *entry.count_mut(m) = n;
        }
        FieldUpdate::SetScore(n) => entry.score = Some(n),
        FieldUpdate::SetStatus(s) => entry.status = Some(s),
    }
    let field = update.modifier();
    let reached_end =
        field.is_count() && entry.total(field) > 0 && entry.count(field) == entry.total(field);
    if reached_end || update == FieldUpdate::SetStatus(StatusType::Completed) {
        entry.status = Some(StatusType::Completed);
        entry.fill_to_totals();
    }
    Ok(())
}

fn check_total(entry: &ListEntry, field: Modifier, value: u32) -> Result<(), ServiceError> {
    let total = entry.total(field);
    if total > 0 && value > total {
        return Err(ServiceError::Other(format!(
            "there are only {total} {}s in this series",
            field.as_str()
        )));
    }
    Ok(())
}

impl ListService for MemoryListService {
    fn search(
        &self,
        _ctx: &SessionContext,
        term: &str,
        media_type: MediaType,
    ) -> Result<SearchOutcome, ServiceError> {
        Ok(self
            .find_in_catalog(term, media_type)
            .map_or(SearchOutcome::NoResults, SearchOutcome::Found))
    }

    fn add(
        &self,
        ctx: &SessionContext,
        term: &str,
        media_type: MediaType,
    ) -> Result<SearchOutcome, ServiceError> {
        let Some(mut entry) = self.find_in_catalog(term, media_type) else {
            return Ok(SearchOutcome::NoResults);
        };
        let mut lists = self.lists.borrow_mut();
        let list = lists.entry(ctx.username.clone()).or_default();
        if let Some(existing) = list.iter().find(|e| e.title == entry.title) {
            return Ok(SearchOutcome::Found(existing.clone()));
        }
        if entry.status.is_none() {
            entry.status = Some(StatusType::in_progress(media_type));
        }
        list.push(entry.clone());
        Ok(SearchOutcome::Found(entry))
    }

    fn delete(
        &self,
        ctx: &SessionContext,
        term: &str,
        media_type: MediaType,
    ) -> Result<SearchOutcome, ServiceError> {
        let mut lists = self.lists.borrow_mut();
        let Some(list) = lists.get_mut(&ctx.username) else {
            return Ok(SearchOutcome::NoResults);
        };
        Ok(match Self::position_in_list(list, term, media_type) {
            Some(i) => SearchOutcome::Found(list.remove(i)),
            None => SearchOutcome::NoResults,
        })
    }

    fn update(
        &self,
        ctx: &SessionContext,
        term: &str,
        media_type: MediaType,
        update: FieldUpdate,
    ) -> Result<SearchOutcome, ServiceError> {
        update
            .validate()
            .map_err(|violation| ServiceError::Other(violation.to_string()))?;
        let mut lists = self.lists.borrow_mut();
        let Some(list) = lists.get_mut(&ctx.username) else {
            return Ok(SearchOutcome::NoResults);
        };
        let Some(i) = Self::position_in_list(list, term, media_type) else {
            return Ok(SearchOutcome::NoResults);
        };
        apply_update(&mut list[i], update)?;
        Ok(SearchOutcome::Found(list[i].clone()))
    }

    fn view_list(
        &self,
        ctx: &SessionContext,
        media_type: MediaType,
    ) -> Result<Vec<ListEntry>, ServiceError> {
        Ok(self
            .list_of(ctx)
            .into_iter()
            .filter(|e| e.media_type == media_type)
            .collect())
    }
}
