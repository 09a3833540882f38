//! The dialogue engine: a single exhaustive transition dispatch over the state tagged-union,
//! with per-state handlers that validate input, mutate the draft and decide the next state.
//!
//! Error discipline: validation failures re-prompt the same state; reference fetch failures
//! fall back to the fixed lists and the conversation continues; an append failure ends the
//! conversation with a failure message. Nothing escapes to the event loop - `handle_event`
//! catches handler errors, resets the session and reports a generic failure.

use crate::dialog::prompt;
use crate::dialog::session::{Session, SessionStore};
use crate::dialog::state::{DialogState, Event, Reply};
use crate::ledger::Ledger;
use crate::model::{Amount, NewTransaction, TxKind};
use crate::quick::QuickParser;
use crate::reference;
use crate::{Config, Result};
use anyhow::Context;
use chrono::{Datelike, Local};
use rust_decimal::Decimal;
use std::str::FromStr;
use tracing::{debug, info, warn};

const CANCEL_DIRECTIVE: &str = "/cancel";
const SKIP_DIRECTIVE: &str = "/skip";

const NO_CONVERSATION_HINT: &str =
    "No active conversation. Send /add to start one, or type a quick entry like \
     '50 products store run'.";
const INTERNAL_ERROR_REPLY: &str = "Something went wrong. Start over with /add.";
const INCOMPLETE_DRAFT_REPLY: &str = "The draft is incomplete. Start over with /add.";
const APPEND_FAILED_REPLY: &str =
    "Failed to write to the ledger sheet. The transaction was not saved.";

/// The outcome of one transition: the state to continue in (`None` ends the conversation) and
/// the payload to render.
type Step = (Option<DialogState>, Reply);

/// Drives the transaction-entry conversations. Owns the session store and talks to the ledger
/// through the injected collaborator; one event is processed at a time per conversation.
pub struct DialogEngine {
    config: Config,
    ledger: Box<dyn Ledger + Send>,
    parser: QuickParser,
    sessions: SessionStore,
}

impl DialogEngine {
    pub fn new(config: Config, ledger: Box<dyn Ledger + Send>) -> Result<Self> {
        Ok(Self {
            config,
            ledger,
            parser: QuickParser::new()?,
            sessions: SessionStore::default(),
        })
    }

    /// Begins a new conversation for `chat_id`, discarding any in-progress draft.
    pub fn start(&mut self, chat_id: i64) -> Reply {
        let session = Session::new();
        info!(conversation = %session.id, chat_id, "starting the transaction dialogue");
        self.sessions.put(chat_id, session);
        prompt::type_menu()
    }

    pub fn has_active(&self, chat_id: i64) -> bool {
        self.sessions.is_active(chat_id)
    }

    /// Force-terminates conversations that have outlived the configured idle timeout.
    pub fn evict_idle(&mut self) {
        let evicted = self.sessions.evict_idle(self.config.idle_timeout());
        if evicted > 0 {
            debug!("force-terminated {evicted} idle conversation(s)");
        }
    }

    /// Feeds one event into `chat_id`'s conversation and returns the payload to render.
    pub async fn handle_event(&mut self, chat_id: i64, event: Event) -> Reply {
        if let Event::Text(text) = &event {
            if text.trim() == CANCEL_DIRECTIVE {
                return match self.sessions.remove(chat_id) {
                    Some(session) => {
                        info!(conversation = %session.id, "conversation cancelled");
                        Reply::text("Operation cancelled.")
                    }
                    None => Reply::text(NO_CONVERSATION_HINT),
                };
            }
        }

        let Some(mut session) = self.sessions.take(chat_id) else {
            return Reply::text(NO_CONVERSATION_HINT);
        };
        session.touch();

        match self.step(&mut session, event).await {
            Ok((Some(next), reply)) => {
                session.state = next;
                self.sessions.put(chat_id, session);
                reply
            }
            Ok((None, reply)) => reply,
            Err(e) => {
                warn!(conversation = %session.id, "dialogue step failed: {e:#}");
                Reply::text(INTERNAL_ERROR_REPLY)
            }
        }
    }

    /// Tries the quick-entry grammar on a line of free text. `None` means the line was not
    /// recognized; a recognized line is committed immediately with today's date and the cash
    /// account as defaults.
    pub async fn quick_entry(&mut self, chat_id: i64, text: &str) -> Option<Reply> {
        let entry = self.parser.parse(text)?;
        debug!(chat_id, "quick entry recognized: {entry:?}");
        let tx = match NewTransaction::new(
            Local::now().day(),
            entry.kind,
            self.config.cash_account().to_string(),
            entry.category,
            entry.amount,
            entry.to_account,
            entry.comment,
            entry.hours,
        ) {
            Ok(tx) => tx,
            Err(e) => {
                debug!(chat_id, "quick entry rejected: {e:#}");
                return Some(Reply::text("The amount must be positive."));
            }
        };
        Some(self.append_and_report(&tx).await)
    }

    #[cfg(test)]
    pub(crate) fn state_of(&self, chat_id: i64) -> Option<DialogState> {
        self.sessions.state_of(chat_id)
    }

    /// The single transition dispatch. Every state is matched; adding a state without a
    /// handler is a compile error.
    async fn step(&mut self, session: &mut Session, event: Event) -> Result<Step> {
        match session.state {
            DialogState::SelectType => self.on_select_type(session, event).await,
            DialogState::SelectDate => self.on_select_date(session, event).await,
            DialogState::SelectCategory => self.on_select_category(session, event).await,
            DialogState::SelectAccount => self.on_select_account(session, event).await,
            DialogState::SelectToAccount => self.on_select_to_account(session, event).await,
            DialogState::EnterAmount => self.on_enter_amount(session, event).await,
            DialogState::EnterComment => self.on_enter_comment(session, event).await,
            DialogState::EnterHours => self.on_enter_hours(session, event).await,
            DialogState::Confirm => self.on_confirm(session, event).await,
        }
    }

    async fn on_select_type(&mut self, session: &mut Session, event: Event) -> Result<Step> {
        let Event::Select(token) = event else {
            return Ok((Some(DialogState::SelectType), prompt::type_menu()));
        };
        let kind = match token.as_str() {
            prompt::TOKEN_ADD_EXPENSE => TxKind::Expense,
            prompt::TOKEN_ADD_INCOME => TxKind::Income,
            prompt::TOKEN_ADD_TRANSFER => TxKind::Transfer,
            _ => return Ok((Some(DialogState::SelectType), prompt::type_menu())),
        };
        // A type selection always begins from a clean draft.
        session.draft.reset();
        session.draft.kind = Some(kind);
        Ok((Some(DialogState::SelectDate), prompt::date_menu(kind)))
    }

    async fn on_select_date(&mut self, session: &mut Session, event: Event) -> Result<Step> {
        let kind = session
            .draft
            .kind
            .context("the draft has no kind in SelectDate")?;
        match event {
            Event::Select(token) if token == prompt::TOKEN_DATE_CUSTOM => {
                Ok((Some(DialogState::SelectDate), prompt::custom_date_prompt(kind)))
            }
            Event::Select(token) => {
                if let Some(day) = token
                    .strip_prefix(prompt::PREFIX_DATE)
                    .and_then(|day| day.parse::<u32>().ok())
                    .filter(|day| (1..=31).contains(day))
                {
                    session.draft.day = Some(day);
                    return self.after_date(session).await;
                }
                Ok((Some(DialogState::SelectDate), prompt::date_menu(kind)))
            }
            Event::Text(text) => match text.trim().parse::<u32>() {
                Ok(day) if (1..=31).contains(&day) => {
                    session.draft.day = Some(day);
                    self.after_date(session).await
                }
                _ => Ok((
                    Some(DialogState::SelectDate),
                    Reply::text("Type a number from 1 to 31."),
                )),
            },
        }
    }

    /// Branches to the step that follows a date: expense picks a category, income and
    /// transfer pick an account first.
    async fn after_date(&mut self, session: &mut Session) -> Result<Step> {
        let kind = session
            .draft
            .kind
            .context("the draft has no kind after SelectDate")?;
        let day = session
            .draft
            .day
            .context("the draft has no day after SelectDate")?;
        match kind {
            TxKind::Expense => Ok((
                Some(DialogState::SelectCategory),
                prompt::quick_category_menu(day),
            )),
            TxKind::Income => {
                let accounts = self.accounts().await;
                Ok((
                    Some(DialogState::SelectAccount),
                    prompt::account_menu(
                        format!("Income (day {day})\n\nWhich account should it go to?"),
                        &accounts,
                        prompt::PREFIX_INCOME_ACCOUNT,
                    ),
                ))
            }
            TxKind::Transfer => {
                let accounts = self.accounts().await;
                Ok((
                    Some(DialogState::SelectAccount),
                    prompt::account_menu(
                        format!("Transfer (day {day})\n\nWhich account to take it from?"),
                        &accounts,
                        prompt::PREFIX_FROM_ACCOUNT,
                    ),
                ))
            }
        }
    }

    async fn on_select_category(&mut self, session: &mut Session, event: Event) -> Result<Step> {
        let Event::Select(token) = event else {
            return Ok((
                Some(DialogState::SelectCategory),
                Reply::text("Pick a category from the list."),
            ));
        };

        if token == prompt::TOKEN_SHOW_ALL_CATEGORIES {
            let categories = self.expense_categories().await;
            let day = session.draft.day.unwrap_or_else(|| Local::now().day());
            return Ok((
                Some(DialogState::SelectCategory),
                prompt::category_menu(
                    format!("Expense (day {day})\n\nPick a category:"),
                    &categories,
                ),
            ));
        }

        if let Some(category) = token.strip_prefix(prompt::PREFIX_QUICK_CATEGORY) {
            return self.expense_category_chosen(session, category).await;
        }

        if let Some(category) = token.strip_prefix(prompt::PREFIX_CATEGORY) {
            // The income flow picks its category after the amount has been entered.
            if session.draft.kind == Some(TxKind::Income) && session.draft.amount.is_some() {
                session.draft.category = Some(category.to_string());
                return Ok((Some(DialogState::EnterComment), prompt::comment_prompt()));
            }
            if session.draft.kind == Some(TxKind::Expense) {
                return self.expense_category_chosen(session, category).await;
            }
        }

        Ok((
            Some(DialogState::SelectCategory),
            Reply::text("Pick a category from the list."),
        ))
    }

    async fn expense_category_chosen(
        &mut self,
        session: &mut Session,
        category: &str,
    ) -> Result<Step> {
        session.draft.category = Some(category.to_string());
        let accounts = self.accounts().await;
        Ok((
            Some(DialogState::SelectAccount),
            prompt::account_menu(
                format!("Expense\nCategory: {category}\n\nWhich account to pay from?"),
                &accounts,
                prompt::PREFIX_EXPENSE_ACCOUNT,
            ),
        ))
    }

    async fn on_select_account(&mut self, session: &mut Session, event: Event) -> Result<Step> {
        let Event::Select(token) = event else {
            return Ok((
                Some(DialogState::SelectAccount),
                Reply::text("Pick an account from the list."),
            ));
        };

        if let Some(account) = token
            .strip_prefix(prompt::PREFIX_EXPENSE_ACCOUNT)
            .or_else(|| token.strip_prefix(prompt::PREFIX_INCOME_ACCOUNT))
        {
            session.draft.account = Some(account.to_string());
            return Ok((Some(DialogState::EnterAmount), Reply::text("Type the amount:")));
        }

        if let Some(account) = token.strip_prefix(prompt::PREFIX_FROM_ACCOUNT) {
            session.draft.account = Some(account.to_string());
            // The chosen source is excluded so a transfer cannot target itself.
            let destinations: Vec<String> = self
                .accounts()
                .await
                .into_iter()
                .filter(|candidate| candidate != account)
                .collect();
            return Ok((
                Some(DialogState::SelectToAccount),
                prompt::account_menu(
                    format!("Transfer\nFrom: {account}\n\nWhich account should receive it?"),
                    &destinations,
                    prompt::PREFIX_TO_ACCOUNT,
                ),
            ));
        }

        Ok((
            Some(DialogState::SelectAccount),
            Reply::text("Pick an account from the list."),
        ))
    }

    async fn on_select_to_account(&mut self, session: &mut Session, event: Event) -> Result<Step> {
        if let Event::Select(token) = &event {
            if let Some(account) = token.strip_prefix(prompt::PREFIX_TO_ACCOUNT) {
                if session.draft.account.as_deref() == Some(account) {
                    return Ok((
                        Some(DialogState::SelectToAccount),
                        Reply::text("The destination must differ from the source account."),
                    ));
                }
                session.draft.to_account = Some(account.to_string());
                return Ok((
                    Some(DialogState::EnterAmount),
                    Reply::text("Type the transfer amount:"),
                ));
            }
        }
        Ok((
            Some(DialogState::SelectToAccount),
            Reply::text("Pick an account from the list."),
        ))
    }

    async fn on_enter_amount(&mut self, session: &mut Session, event: Event) -> Result<Step> {
        let Event::Text(text) = event else {
            return Ok((
                Some(DialogState::EnterAmount),
                Reply::text("Type the amount as a number."),
            ));
        };
        let Some(amount) = Amount::parse_user_input(&text) else {
            return Ok((
                Some(DialogState::EnterAmount),
                Reply::text("That doesn't look like a number. Type something like 150 or 99.50."),
            ));
        };
        if !amount.is_positive() {
            return Ok((
                Some(DialogState::EnterAmount),
                Reply::text("The amount must be positive."),
            ));
        }
        session.draft.amount = Some(amount);

        if session.draft.kind == Some(TxKind::Income) {
            let categories = self.income_categories().await;
            return Ok((
                Some(DialogState::SelectCategory),
                prompt::category_menu(
                    format!(
                        "Amount: {}\n\nPick an income category:",
                        crate::format::money(amount.value(), self.config.currency())
                    ),
                    &categories,
                ),
            ));
        }
        Ok((Some(DialogState::EnterComment), prompt::comment_prompt()))
    }

    async fn on_enter_comment(&mut self, session: &mut Session, event: Event) -> Result<Step> {
        let Event::Text(text) = event else {
            return Ok((Some(DialogState::EnterComment), prompt::comment_prompt()));
        };
        if text != SKIP_DIRECTIVE {
            session.draft.comment = Some(text);
        }
        self.backfill_defaults(session);

        if session.draft.kind == Some(TxKind::Income)
            && session.draft.category.as_deref() == Some(reference::WAGE_CATEGORY)
        {
            return Ok((Some(DialogState::EnterHours), prompt::hours_prompt()));
        }
        Ok((
            Some(DialogState::Confirm),
            prompt::confirm_menu(&session.draft.preview(self.config.currency())),
        ))
    }

    async fn on_enter_hours(&mut self, session: &mut Session, event: Event) -> Result<Step> {
        let Event::Text(text) = event else {
            return Ok((Some(DialogState::EnterHours), prompt::hours_prompt()));
        };
        if text != SKIP_DIRECTIVE {
            let Some(hours) = parse_hours(&text) else {
                return Ok((
                    Some(DialogState::EnterHours),
                    Reply::text("Type the number of hours, like 10 or 10.5."),
                ));
            };
            session.draft.hours = Some(hours);
        }
        self.backfill_defaults(session);
        Ok((
            Some(DialogState::Confirm),
            prompt::confirm_menu(&session.draft.preview(self.config.currency())),
        ))
    }

    async fn on_confirm(&mut self, session: &mut Session, event: Event) -> Result<Step> {
        let reprompt = |session: &Session, config: &Config| {
            prompt::confirm_menu(&session.draft.preview(config.currency()))
        };
        let Event::Select(token) = event else {
            return Ok((Some(DialogState::Confirm), reprompt(session, &self.config)));
        };
        match token.as_str() {
            prompt::TOKEN_CONFIRM_YES => self.commit(session).await,
            prompt::TOKEN_CONFIRM_NO => {
                info!(conversation = %session.id, "conversation rejected at confirmation");
                Ok((None, Reply::text("Cancelled.")))
            }
            prompt::TOKEN_CONFIRM_EDIT => {
                session.draft.reset();
                Ok((Some(DialogState::SelectType), prompt::type_menu()))
            }
            _ => Ok((Some(DialogState::Confirm), reprompt(session, &self.config))),
        }
    }

    /// Hands the finished draft to the ledger. Both outcomes end the conversation; a failed
    /// append is reported but never retried.
    async fn commit(&mut self, session: &mut Session) -> Result<Step> {
        if session.draft.kind.is_none() || session.draft.amount.is_none() {
            warn!(conversation = %session.id, "commit attempted with an incomplete draft");
            return Ok((None, Reply::text(INCOMPLETE_DRAFT_REPLY)));
        }
        self.backfill_defaults(session);
        let tx = match session.draft.finish() {
            Ok(tx) => tx,
            Err(e) => {
                warn!(conversation = %session.id, "draft failed validation at commit: {e:#}");
                return Ok((None, Reply::text(INCOMPLETE_DRAFT_REPLY)));
            }
        };
        info!(conversation = %session.id, kind = %tx.kind(), "appending transaction to the ledger");
        Ok((None, self.append_and_report(&tx).await))
    }

    async fn append_and_report(&mut self, tx: &NewTransaction) -> Reply {
        match self.ledger.append_transaction(tx).await {
            Ok(()) => Reply::text(crate::format::transaction_saved(
                tx,
                self.config.currency(),
                self.config.hourly_rate(),
            )),
            Err(e) => {
                warn!("ledger append failed: {e}");
                Reply::text(APPEND_FAILED_REPLY)
            }
        }
    }

    /// Fills in the fields the user is allowed to leave implicit.
    fn backfill_defaults(&self, session: &mut Session) {
        if session.draft.account.is_none() {
            session.draft.account = Some(self.config.cash_account().to_string());
        }
        if session.draft.day.is_none() {
            session.draft.day = Some(Local::now().day());
        }
    }

    async fn accounts(&mut self) -> Vec<String> {
        match self.ledger.fetch_reference_lists().await {
            Ok(lists) if !lists.accounts.is_empty() => lists.accounts,
            Ok(_) => {
                warn!("the reference sheet lists no accounts, using the fallback list");
                reference::to_owned(reference::FALLBACK_ACCOUNTS)
            }
            Err(e) => {
                warn!("{e}, using the fallback account list");
                reference::to_owned(reference::FALLBACK_ACCOUNTS)
            }
        }
    }

    async fn expense_categories(&mut self) -> Vec<String> {
        match self.ledger.fetch_reference_lists().await {
            Ok(lists) if !lists.categories.is_empty() => lists.categories,
            Ok(_) => {
                warn!("the reference sheet lists no categories, using the fallback list");
                reference::to_owned(reference::FALLBACK_EXPENSE_CATEGORIES)
            }
            Err(e) => {
                warn!("{e}, using the fallback category list");
                reference::to_owned(reference::FALLBACK_EXPENSE_CATEGORIES)
            }
        }
    }

    async fn income_categories(&mut self) -> Vec<String> {
        match self.ledger.fetch_income_categories().await {
            Ok(categories) if !categories.is_empty() => categories,
            Ok(_) => {
                warn!("the budget sheet lists no income categories, using the fallback list");
                reference::to_owned(reference::FALLBACK_INCOME_CATEGORIES)
            }
            Err(e) => {
                warn!("{e}, using the fallback income category list");
                reference::to_owned(reference::FALLBACK_INCOME_CATEGORIES)
            }
        }
    }
}

/// Parses hours input: comma decimals are normalized and a trailing hour-unit character is
/// dropped. The value must be positive.
fn parse_hours(text: &str) -> Option<Decimal> {
    let normalized = text.replace(',', ".").replace('h', "");
    let hours = Decimal::from_str(normalized.trim()).ok()?;
    (!hours.is_zero() && hours.is_sign_positive()).then_some(hours)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{row_values, TestLedger};
    use crate::test::TestEnv;

    const CHAT: i64 = 7;

    async fn engine_with(ledger: TestLedger) -> DialogEngine {
        let env = TestEnv::new().await;
        DialogEngine::new(env.config(), Box::new(ledger)).unwrap()
    }

    fn select(token: &str) -> Event {
        Event::Select(token.to_string())
    }

    fn text(line: &str) -> Event {
        Event::Text(line.to_string())
    }

    #[test]
    fn test_parse_hours() {
        assert_eq!(parse_hours("10"), Some(Decimal::from(10)));
        assert_eq!(parse_hours("10h"), Some(Decimal::from(10)));
        assert_eq!(
            parse_hours("10,5"),
            Some(Decimal::from_str("10.5").unwrap())
        );
        assert_eq!(parse_hours("abc"), None);
        assert_eq!(parse_hours("0"), None);
        assert_eq!(parse_hours("-3"), None);
    }

    #[tokio::test]
    async fn test_expense_end_to_end() {
        let ledger = TestLedger::default();
        let log = ledger.append_log();
        let mut engine = engine_with(ledger).await;

        let reply = engine.start(CHAT);
        assert_eq!(reply.options().len(), 3);

        let reply = engine.handle_event(CHAT, select("add_expense")).await;
        assert!(reply.message().contains("Pick a date"));

        let reply = engine.handle_event(CHAT, select("date_15")).await;
        assert!(reply.message().contains("Pick a category"));

        let reply = engine.handle_event(CHAT, select("quick_Products")).await;
        let tokens: Vec<&str> = reply.options().iter().map(|c| c.token()).collect();
        assert!(tokens.contains(&"expense_Cash"));

        engine.handle_event(CHAT, select("expense_Cash")).await;
        assert_eq!(engine.state_of(CHAT), Some(DialogState::EnterAmount));

        engine.handle_event(CHAT, text("42.50")).await;
        assert_eq!(engine.state_of(CHAT), Some(DialogState::EnterComment));

        let reply = engine.handle_event(CHAT, text("groceries")).await;
        assert_eq!(engine.state_of(CHAT), Some(DialogState::Confirm));
        assert!(reply.message().contains("42.50"));
        assert!(reply.message().contains("groceries"));

        let reply = engine.handle_event(CHAT, select("confirm_yes")).await;
        assert!(reply.message().starts_with("Saved!"));

        let appended = log.lock().unwrap();
        assert_eq!(appended.len(), 1);
        assert_eq!(
            row_values(&appended[0]),
            vec!["15", "Expense", "Cash", "Products", "42.50", "", "groceries", "", "", ""]
        );
        drop(appended);
        assert_eq!(engine.state_of(CHAT), None);
    }

    #[tokio::test]
    async fn test_income_wage_flow_asks_for_hours() {
        let ledger = TestLedger::default();
        let log = ledger.append_log();
        let mut engine = engine_with(ledger).await;

        engine.start(CHAT);
        engine.handle_event(CHAT, select("add_income")).await;
        let reply = engine.handle_event(CHAT, select("date_10")).await;
        let tokens: Vec<&str> = reply.options().iter().map(|c| c.token()).collect();
        assert!(tokens.contains(&"income_Card"));

        engine.handle_event(CHAT, select("income_Card")).await;
        let reply = engine.handle_event(CHAT, text("200")).await;
        // The income category list comes from the budget sheet, after the amount.
        let tokens: Vec<&str> = reply.options().iter().map(|c| c.token()).collect();
        assert_eq!(tokens, vec!["cat_Wages/Tips", "cat_Side Job", "cat_Other"]);

        engine.handle_event(CHAT, select("cat_Wages/Tips")).await;
        assert_eq!(engine.state_of(CHAT), Some(DialogState::EnterComment));

        let reply = engine.handle_event(CHAT, text("/skip")).await;
        assert!(reply.message().contains("hours"));
        assert_eq!(engine.state_of(CHAT), Some(DialogState::EnterHours));

        engine.handle_event(CHAT, text("8")).await;
        assert_eq!(engine.state_of(CHAT), Some(DialogState::Confirm));

        let reply = engine.handle_event(CHAT, select("confirm_yes")).await;
        assert!(reply.message().contains("at the hourly rate"));

        let appended = log.lock().unwrap();
        assert_eq!(appended.len(), 1);
        assert_eq!(
            row_values(&appended[0]),
            vec!["10", "Income", "Card", "Wages/Tips", "200", "", "", "", "8", ""]
        );
    }

    #[tokio::test]
    async fn test_non_wage_income_skips_hours() {
        let ledger = TestLedger::default();
        let mut engine = engine_with(ledger).await;

        engine.start(CHAT);
        engine.handle_event(CHAT, select("add_income")).await;
        engine.handle_event(CHAT, select("date_10")).await;
        engine.handle_event(CHAT, select("income_Cash")).await;
        engine.handle_event(CHAT, text("50")).await;
        engine.handle_event(CHAT, select("cat_Other")).await;
        engine.handle_event(CHAT, text("/skip")).await;
        assert_eq!(engine.state_of(CHAT), Some(DialogState::Confirm));
    }

    #[tokio::test]
    async fn test_amount_validation_re_prompts() {
        let ledger = TestLedger::default();
        let mut engine = engine_with(ledger).await;

        engine.start(CHAT);
        engine.handle_event(CHAT, select("add_expense")).await;
        engine.handle_event(CHAT, select("date_1")).await;
        engine.handle_event(CHAT, select("quick_Cafe")).await;
        engine.handle_event(CHAT, select("expense_Card")).await;
        assert_eq!(engine.state_of(CHAT), Some(DialogState::EnterAmount));

        for bad in ["abc", "-5", "0", "12.3.4", ""] {
            engine.handle_event(CHAT, text(bad)).await;
            assert_eq!(engine.state_of(CHAT), Some(DialogState::EnterAmount));
        }

        // Comma decimals are normalized.
        engine.handle_event(CHAT, text("99,50")).await;
        assert_eq!(engine.state_of(CHAT), Some(DialogState::EnterComment));
    }

    #[tokio::test]
    async fn test_transfer_destination_excludes_source() {
        let ledger = TestLedger::default();
        let log = ledger.append_log();
        let mut engine = engine_with(ledger).await;

        engine.start(CHAT);
        engine.handle_event(CHAT, select("add_transfer")).await;
        engine.handle_event(CHAT, select("date_3")).await;
        let reply = engine.handle_event(CHAT, select("from_Cash")).await;
        let tokens: Vec<&str> = reply.options().iter().map(|c| c.token()).collect();
        assert!(!tokens.contains(&"to_Cash"));
        assert!(tokens.contains(&"to_Card"));

        // A stale self-transfer selection is refused without advancing.
        engine.handle_event(CHAT, select("to_Cash")).await;
        assert_eq!(engine.state_of(CHAT), Some(DialogState::SelectToAccount));

        engine.handle_event(CHAT, select("to_Card")).await;
        engine.handle_event(CHAT, text("100")).await;
        engine.handle_event(CHAT, text("/skip")).await;
        engine.handle_event(CHAT, select("confirm_yes")).await;

        let appended = log.lock().unwrap();
        assert_eq!(
            row_values(&appended[0]),
            vec!["3", "Transfer", "Cash", "", "100", "Card", "", "", "", ""]
        );
    }

    #[tokio::test]
    async fn test_commit_resets_draft_on_both_outcomes() {
        // Success path.
        let ledger = TestLedger::default();
        let mut engine = engine_with(ledger).await;
        drive_expense_to_confirm(&mut engine).await;
        engine.handle_event(CHAT, select("confirm_yes")).await;
        assert_eq!(engine.state_of(CHAT), None);

        // Failure path: the append fails, the reply reports it, and the draft is still gone.
        let ledger = TestLedger::default().with_failing_appends();
        let log = ledger.append_log();
        let mut engine = engine_with(ledger).await;
        drive_expense_to_confirm(&mut engine).await;
        let reply = engine.handle_event(CHAT, select("confirm_yes")).await;
        assert!(reply.message().contains("was not saved"));
        assert_eq!(engine.state_of(CHAT), None);
        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cancel_from_any_state() {
        let ledger = TestLedger::default();
        let mut engine = engine_with(ledger).await;

        engine.start(CHAT);
        engine.handle_event(CHAT, select("add_expense")).await;
        engine.handle_event(CHAT, select("date_3")).await;
        let reply = engine.handle_event(CHAT, text("/cancel")).await;
        assert!(reply.message().contains("cancelled"));
        assert_eq!(engine.state_of(CHAT), None);
    }

    #[tokio::test]
    async fn test_unknown_selection_re_prompts() {
        let ledger = TestLedger::default();
        let mut engine = engine_with(ledger).await;

        engine.start(CHAT);
        engine.handle_event(CHAT, select("add_expense")).await;
        assert_eq!(engine.state_of(CHAT), Some(DialogState::SelectDate));
        engine.handle_event(CHAT, select("confirm_yes")).await;
        assert_eq!(engine.state_of(CHAT), Some(DialogState::SelectDate));
    }

    #[tokio::test]
    async fn test_custom_date_validation() {
        let ledger = TestLedger::default();
        let mut engine = engine_with(ledger).await;

        engine.start(CHAT);
        engine.handle_event(CHAT, select("add_expense")).await;
        engine.handle_event(CHAT, select("date_custom")).await;
        assert_eq!(engine.state_of(CHAT), Some(DialogState::SelectDate));

        for bad in ["45", "0", "abc", "-1"] {
            engine.handle_event(CHAT, text(bad)).await;
            assert_eq!(engine.state_of(CHAT), Some(DialogState::SelectDate));
        }

        engine.handle_event(CHAT, text("12")).await;
        assert_eq!(engine.state_of(CHAT), Some(DialogState::SelectCategory));
    }

    #[tokio::test]
    async fn test_fetch_failure_falls_back_and_continues() {
        let ledger = TestLedger::default().with_failing_fetches();
        let mut engine = engine_with(ledger).await;

        engine.start(CHAT);
        engine.handle_event(CHAT, select("add_income")).await;
        let reply = engine.handle_event(CHAT, select("date_5")).await;
        let tokens: Vec<&str> = reply.options().iter().map(|c| c.token()).collect();
        assert_eq!(tokens, vec!["income_Cash", "income_Card", "income_Savings"]);

        engine.handle_event(CHAT, select("income_Cash")).await;
        let reply = engine.handle_event(CHAT, text("75")).await;
        let tokens: Vec<&str> = reply.options().iter().map(|c| c.token()).collect();
        assert_eq!(tokens, vec!["cat_Wages/Tips", "cat_Side Job", "cat_Other"]);
    }

    #[tokio::test]
    async fn test_confirm_edit_restarts_from_type() {
        let ledger = TestLedger::default();
        let mut engine = engine_with(ledger).await;
        drive_expense_to_confirm(&mut engine).await;

        let reply = engine.handle_event(CHAT, select("confirm_edit")).await;
        assert_eq!(engine.state_of(CHAT), Some(DialogState::SelectType));
        assert_eq!(reply.options().len(), 3);
    }

    #[tokio::test]
    async fn test_quick_entry_commits_with_defaults() {
        let ledger = TestLedger::default();
        let log = ledger.append_log();
        let mut engine = engine_with(ledger).await;

        let reply = engine.quick_entry(CHAT, "135 tips shift 10h").await.unwrap();
        assert!(reply.message().starts_with("Saved!"));

        let appended = log.lock().unwrap();
        assert_eq!(appended.len(), 1);
        let today = Local::now().day().to_string();
        assert_eq!(
            row_values(&appended[0]),
            vec![
                today.as_str(),
                "Income",
                "Cash",
                "Wages/Tips",
                "135",
                "",
                "shift",
                "",
                "10",
                ""
            ]
        );
    }

    #[tokio::test]
    async fn test_quick_entry_unrecognized() {
        let ledger = TestLedger::default();
        let log = ledger.append_log();
        let mut engine = engine_with(ledger).await;

        assert!(engine.quick_entry(CHAT, "abc products").await.is_none());
        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_start_discards_in_progress_draft() {
        let ledger = TestLedger::default();
        let mut engine = engine_with(ledger).await;

        engine.start(CHAT);
        engine.handle_event(CHAT, select("add_expense")).await;
        engine.handle_event(CHAT, select("date_3")).await;

        engine.start(CHAT);
        assert_eq!(engine.state_of(CHAT), Some(DialogState::SelectType));
    }

    async fn drive_expense_to_confirm(engine: &mut DialogEngine) {
        engine.start(CHAT);
        engine.handle_event(CHAT, select("add_expense")).await;
        engine.handle_event(CHAT, select("date_15")).await;
        engine.handle_event(CHAT, select("quick_Products")).await;
        engine.handle_event(CHAT, select("expense_Cash")).await;
        engine.handle_event(CHAT, text("42.50")).await;
        engine.handle_event(CHAT, text("groceries")).await;
        assert_eq!(engine.state_of(CHAT), Some(DialogState::Confirm));
    }
}
