//! Core chat session management.
//!
//! [`ChatSession`] owns the conversation log and the session status, hands
//! submissions to a [`Dispatcher`], and replays successful answers through a
//! [`RevealScheduler`] before committing them to the log.
//!
//! All state lives on the session and is mutated only through `&mut self`.
//! Background work (the dispatch and the reveal timer) reports back over a
//! channel, and every event is stamped with the submission generation that
//! produced it; events from an older generation, or that arrive in the wrong
//! state, are discarded.  The rendering layer drives the session by awaiting
//! [`ChatSession::next_update`].

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{debug, info, trace, warn};

use crate::chat::config::ChatConfig;
use crate::client::QueryClient;
use crate::dispatcher::{Dispatcher, HttpDispatcher};
use crate::error::{Error, Result};
use crate::observability::{SESSION_FAILURES, SESSION_REJECTED, SESSION_SUBMISSIONS};
use crate::params::{ParameterName, ParameterStore, QueryParameters};
use crate::reveal::RevealScheduler;
use crate::types::{Message, QueryResult, SessionStatus};

/// The reply committed to the log when a query fails for any reason.
pub const CONNECTION_ERROR_TEXT: &str = "⚠️ Could not connect to the server.";

/// A change the rendering layer should reflect.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionUpdate {
    /// An answer arrived and its reveal has started.
    Revealing,
    /// The revealed prefix of the answer grew.
    Partial(String),
    /// The fully revealed answer was appended to the log.
    Committed(Message),
    /// The query failed and the connection-error reply was appended.
    Failed {
        /// The message appended to the log.
        message: Message,
        /// What went wrong, for display next to the reply.
        error: String,
    },
}

#[derive(Debug)]
enum SessionEvent {
    Resolved { generation: u64, result: QueryResult },
    Tick { generation: u64, partial: String },
    Done { generation: u64 },
}

/// The dispatch task and the task relaying its result back to the session.
#[derive(Debug)]
struct InFlight {
    dispatch: AbortHandle,
    relay: JoinHandle<()>,
}

impl InFlight {
    fn abort(self) {
        self.dispatch.abort();
        self.relay.abort();
    }
}

/// Aggregated stats for a chat session.
#[derive(Debug, Clone)]
pub struct SessionStats {
    /// The identifier sent with every query.
    pub session_id: String,
    /// The number of messages in the conversation.
    pub message_count: usize,
    /// The current status.
    pub status: SessionStatus,
    /// The current parameter values.
    pub parameters: QueryParameters,
    /// Whether parameter changes are currently refused.
    pub parameters_frozen: bool,
    /// Time between reveal ticks.
    pub reveal_interval: Duration,
    /// Characters added per reveal tick.
    pub reveal_chunk_chars: usize,
    /// Submissions that were accepted and dispatched.
    pub submissions: u64,
    /// Submissions dropped because the session was busy.
    pub rejections: u64,
    /// Exchanges that ended with the connection-error reply.
    pub failures: u64,
    /// Answers revealed and committed.
    pub completed: u64,
}

/// A chat session that manages conversation state and query round trips.
pub struct ChatSession<D: Dispatcher + 'static = HttpDispatcher> {
    dispatcher: Arc<D>,
    config: ChatConfig,
    messages: Vec<Message>,
    status: SessionStatus,
    input: String,
    pending_answer: Option<String>,
    pending_partial: Option<String>,
    debug_payload: Option<Value>,
    debug_view_open: bool,
    parameters: ParameterStore,
    reveal: RevealScheduler,
    in_flight: Option<InFlight>,
    generation: u64,
    events_tx: mpsc::UnboundedSender<SessionEvent>,
    events_rx: mpsc::UnboundedReceiver<SessionEvent>,
    submissions: u64,
    rejections: u64,
    failures: u64,
    completed: u64,
}

impl ChatSession<HttpDispatcher> {
    /// Creates a session that queries the configured endpoint over HTTP.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint is not a valid http(s) URL or the HTTP
    /// client cannot be built.
    pub fn new(config: ChatConfig) -> Result<Self> {
        let client = QueryClient::with_options(&config.endpoint, config.timeout)?;
        Ok(Self::with_dispatcher(HttpDispatcher::new(client), config))
    }
}

impl<D: Dispatcher + 'static> ChatSession<D> {
    /// Creates a session with a custom dispatcher.
    pub fn with_dispatcher(dispatcher: D, config: ChatConfig) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            dispatcher: Arc::new(dispatcher),
            parameters: ParameterStore::new(config.parameters),
            reveal: RevealScheduler::new(config.reveal_interval, config.reveal_chunk_chars),
            config,
            messages: Vec::new(),
            status: SessionStatus::Idle,
            input: String::new(),
            pending_answer: None,
            pending_partial: None,
            debug_payload: None,
            debug_view_open: false,
            in_flight: None,
            generation: 0,
            events_tx,
            events_rx,
            submissions: 0,
            rejections: 0,
            failures: 0,
            completed: 0,
        }
    }

    /// Submits user text.
    ///
    /// Blank text and submissions while the session is busy are ignored and
    /// return false.  Otherwise the user message is appended, the draft input
    /// is cleared, parameters are frozen, and the query is dispatched in the
    /// background.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn submit(&mut self, text: &str) -> bool {
        if text.trim().is_empty() {
            trace!("ignoring blank submission");
            return false;
        }
        if self.status.is_busy() {
            SESSION_REJECTED.click();
            self.rejections += 1;
            debug!(status = %self.status, "dropping submission while busy");
            return false;
        }

        self.messages.push(Message::user(text));
        self.input.clear();
        self.status = SessionStatus::AwaitingResponse;
        self.parameters.freeze();
        self.generation += 1;
        self.submissions += 1;
        SESSION_SUBMISSIONS.click();

        let generation = self.generation;
        let params = self.parameters.values();
        info!(generation, %params, "submitting query");

        let dispatcher = Arc::clone(&self.dispatcher);
        let query = text.to_string();
        let session_id = self.config.user_id.clone();
        let events = self.events_tx.clone();
        let call = tokio::spawn(async move {
            dispatcher.dispatch(&query, params, &session_id).await
        });
        let dispatch = call.abort_handle();
        let relay = tokio::spawn(async move {
            let result = match call.await {
                Ok(result) => result,
                Err(err) => QueryResult::from(Error::http_client(
                    format!("dispatch task failed: {err}"),
                    None,
                )),
            };
            let _ = events.send(SessionEvent::Resolved { generation, result });
        });
        self.in_flight = Some(InFlight { dispatch, relay });
        true
    }

    /// Submits the draft input buffer.  See [`submit`](Self::submit).
    pub fn submit_input(&mut self) -> bool {
        let text = self.input.clone();
        self.submit(&text)
    }

    /// Waits for the next change to the session and applies it.
    ///
    /// Returns `None` once the session is idle.  Cancel safe: dropping the
    /// future loses no events.
    pub async fn next_update(&mut self) -> Option<SessionUpdate> {
        while self.status.is_busy() {
            let event = self.events_rx.recv().await?;
            if let Some(update) = self.apply(event) {
                return Some(update);
            }
        }
        None
    }

    /// Drives the session until it is idle, returning every update seen.
    pub async fn settle(&mut self) -> Vec<SessionUpdate> {
        let mut updates = Vec::new();
        while let Some(update) = self.next_update().await {
            updates.push(update);
        }
        updates
    }

    /// Skips the rest of the reveal and commits the answer now.
    ///
    /// Returns `None` unless an answer is being revealed.
    pub fn finish_reveal(&mut self) -> Option<SessionUpdate> {
        if self.status != SessionStatus::Revealing {
            return None;
        }
        self.reveal.cancel();
        Some(self.commit_answer())
    }

    /// Gives up on the pending query.
    ///
    /// The dispatch is aborted and the exchange ends like any other failure:
    /// the connection-error reply is appended and the session is idle again.
    /// Returns `None` unless a response is awaited.
    pub fn abandon(&mut self) -> Option<SessionUpdate> {
        if self.status != SessionStatus::AwaitingResponse {
            return None;
        }
        if let Some(in_flight) = self.in_flight.take() {
            in_flight.abort();
        }
        let err = Error::abort("query abandoned before a response arrived");
        Some(self.fail(err.to_string(), err.debug_payload()))
    }

    fn apply(&mut self, event: SessionEvent) -> Option<SessionUpdate> {
        match event {
            SessionEvent::Resolved { generation, result } => {
                if generation != self.generation
                    || self.status != SessionStatus::AwaitingResponse
                {
                    trace!(generation, "discarding stale query result");
                    return None;
                }
                self.in_flight = None;
                match result {
                    QueryResult::Success {
                        answer_text,
                        raw_payload,
                    } => {
                        debug!(generation, answer_len = answer_text.len(), "query succeeded");
                        self.debug_payload = Some(raw_payload);
                        self.status = SessionStatus::Revealing;
                        self.pending_partial = Some(String::new());
                        self.start_reveal(answer_text);
                        Some(SessionUpdate::Revealing)
                    }
                    QueryResult::Failure {
                        error_message,
                        raw_payload,
                    } => Some(self.fail(error_message, raw_payload)),
                }
            }
            SessionEvent::Tick {
                generation,
                partial,
            } => {
                if generation != self.generation || self.status != SessionStatus::Revealing {
                    return None;
                }
                self.pending_partial = Some(partial.clone());
                Some(SessionUpdate::Partial(partial))
            }
            SessionEvent::Done { generation } => {
                if generation != self.generation || self.status != SessionStatus::Revealing {
                    return None;
                }
                Some(self.commit_answer())
            }
        }
    }

    fn start_reveal(&mut self, answer: String) {
        let generation = self.generation;
        let tick_tx = self.events_tx.clone();
        let done_tx = self.events_tx.clone();
        self.pending_answer = Some(answer.clone());
        self.reveal.reveal(
            answer,
            move |partial| {
                let _ = tick_tx.send(SessionEvent::Tick {
                    generation,
                    partial,
                });
            },
            move || {
                let _ = done_tx.send(SessionEvent::Done { generation });
            },
        );
    }

    fn fail(&mut self, error_message: String, raw_payload: Value) -> SessionUpdate {
        warn!(generation = self.generation, error = %error_message, "query failed");
        SESSION_FAILURES.click();
        self.failures += 1;
        self.debug_payload = Some(raw_payload);
        let message = Message::bot(CONNECTION_ERROR_TEXT);
        self.messages.push(message.clone());
        self.become_idle();
        SessionUpdate::Failed {
            message,
            error: error_message,
        }
    }

    fn commit_answer(&mut self) -> SessionUpdate {
        let message = Message::bot(self.pending_answer.take().unwrap_or_default());
        self.messages.push(message.clone());
        self.completed += 1;
        self.become_idle();
        debug!(generation = self.generation, "answer committed");
        SessionUpdate::Committed(message)
    }

    fn become_idle(&mut self) {
        self.status = SessionStatus::Idle;
        self.pending_partial = None;
        self.parameters.thaw();
    }

    /// The conversation so far, in arrival order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Returns the number of messages in the conversation.
    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    /// The current status.
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// The revealed prefix of the answer, while revealing.
    pub fn pending_partial_text(&self) -> Option<&str> {
        self.pending_partial.as_deref()
    }

    /// The payload of the last completed exchange, success or failure.
    pub fn debug_payload(&self) -> Option<&Value> {
        self.debug_payload.as_ref()
    }

    /// The draft input.
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Replaces the draft input.
    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    /// The identifier sent with each query.
    pub fn session_id(&self) -> &str {
        &self.config.user_id
    }

    /// The configuration this session was built with.
    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    /// Snapshot of the current parameters.
    pub fn parameters(&self) -> QueryParameters {
        self.parameters.values()
    }

    /// Sets a parameter, clamped to its bounds.
    ///
    /// Returns false without changing anything while a submission is in
    /// flight or if `value` is not finite.
    pub fn set_parameter(&mut self, name: ParameterName, value: f64) -> bool {
        let applied = self.parameters.set(name, value);
        if applied {
            debug!(%name, value = self.parameters.values().get(name), "parameter set");
        }
        applied
    }

    /// Sets `top_k`.  See [`set_parameter`](Self::set_parameter).
    pub fn set_result_count(&mut self, value: u32) -> bool {
        self.parameters.set_result_count(value)
    }

    /// Sets `multi_n`.  See [`set_parameter`](Self::set_parameter).
    pub fn set_fan_out(&mut self, value: u32) -> bool {
        self.parameters.set_fan_out(value)
    }

    /// Sets `alpha`.  See [`set_parameter`](Self::set_parameter).
    pub fn set_hybrid_weight(&mut self, value: f64) -> bool {
        self.parameters.set_hybrid_weight(value)
    }

    /// Marks the debug view open.  Has no effect on the pipeline.
    pub fn open_debug_view(&mut self) {
        self.debug_view_open = true;
    }

    /// Marks the debug view closed.
    pub fn close_debug_view(&mut self) {
        self.debug_view_open = false;
    }

    /// Returns true while the debug view is open.
    pub fn is_debug_view_open(&self) -> bool {
        self.debug_view_open
    }

    /// Returns the current session statistics snapshot.
    pub fn stats(&self) -> SessionStats {
        SessionStats {
            session_id: self.config.user_id.clone(),
            message_count: self.message_count(),
            status: self.status,
            parameters: self.parameters.values(),
            parameters_frozen: self.parameters.is_frozen(),
            reveal_interval: self.reveal.tick_interval(),
            reveal_chunk_chars: self.reveal.chunk_chars(),
            submissions: self.submissions,
            rejections: self.rejections,
            failures: self.failures,
            completed: self.completed,
        }
    }
}

impl<D: Dispatcher + 'static> Drop for ChatSession<D> {
    fn drop(&mut self) {
        self.reveal.cancel();
        if let Some(in_flight) = self.in_flight.take() {
            in_flight.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;

    use crate::types::Sender;

    struct ScriptedDispatcher {
        results: Mutex<VecDeque<QueryResult>>,
        calls: Mutex<Vec<(String, QueryParameters, String)>>,
    }

    impl ScriptedDispatcher {
        fn new(results: Vec<QueryResult>) -> Arc<Self> {
            Arc::new(Self {
                results: Mutex::new(results.into()),
                calls: Mutex::default(),
            })
        }
    }

    #[async_trait::async_trait]
    impl Dispatcher for ScriptedDispatcher {
        async fn dispatch(
            &self,
            query_text: &str,
            params: QueryParameters,
            session_id: &str,
        ) -> QueryResult {
            self.calls.lock().unwrap().push((
                query_text.to_string(),
                params,
                session_id.to_string(),
            ));
            self.results
                .lock()
                .unwrap()
                .pop_front()
                .expect("no scripted result left")
        }
    }

    struct PendingDispatcher;

    #[async_trait::async_trait]
    impl Dispatcher for PendingDispatcher {
        async fn dispatch(&self, _: &str, _: QueryParameters, _: &str) -> QueryResult {
            std::future::pending().await
        }
    }

    struct SlowDispatcher {
        finished: Arc<AtomicUsize>,
    }

    impl SlowDispatcher {
        fn new() -> (Self, Arc<AtomicUsize>) {
            let finished = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    finished: Arc::clone(&finished),
                },
                finished,
            )
        }
    }

    #[async_trait::async_trait]
    impl Dispatcher for SlowDispatcher {
        async fn dispatch(&self, query_text: &str, _: QueryParameters, _: &str) -> QueryResult {
            tokio::time::sleep(Duration::from_secs(10)).await;
            self.finished.fetch_add(1, Ordering::SeqCst);
            success(&format!("answer to {query_text}"))
        }
    }

    fn config() -> ChatConfig {
        ChatConfig::new().with_reveal_interval(Duration::from_millis(5))
    }

    fn success(answer: &str) -> QueryResult {
        QueryResult::success(answer, json!({"generated_answer": answer}))
    }

    #[tokio::test]
    async fn new_session_empty() {
        let session = ChatSession::with_dispatcher(PendingDispatcher, config());
        assert_eq!(session.message_count(), 0);
        assert_eq!(session.status(), SessionStatus::Idle);
        assert!(session.pending_partial_text().is_none());
        assert!(session.debug_payload().is_none());
    }

    #[tokio::test]
    async fn blank_submissions_are_ignored() {
        let mut session = ChatSession::with_dispatcher(PendingDispatcher, config());
        for text in ["", " ", "\t\n", "   \r\n "] {
            assert!(!session.submit(text));
        }
        assert_eq!(session.message_count(), 0);
        assert_eq!(session.status(), SessionStatus::Idle);
        assert_eq!(session.stats().submissions, 0);
    }

    #[tokio::test]
    async fn submit_appends_user_message_and_awaits() {
        let mut session = ChatSession::with_dispatcher(PendingDispatcher, config());
        assert!(session.submit("hello"));
        assert_eq!(session.messages(), &[Message::user("hello")]);
        assert_eq!(session.status(), SessionStatus::AwaitingResponse);
    }

    #[tokio::test]
    async fn submit_while_awaiting_is_dropped() {
        let mut session = ChatSession::with_dispatcher(PendingDispatcher, config());
        assert!(session.submit("hello"));
        assert!(!session.submit("again"));
        assert_eq!(session.message_count(), 1);
        assert_eq!(session.status(), SessionStatus::AwaitingResponse);
        assert_eq!(session.stats().rejections, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn successful_exchange_reveals_then_commits() {
        let dispatcher = ScriptedDispatcher::new(vec![success("hi there")]);
        let mut session = ChatSession::with_dispatcher(Arc::clone(&dispatcher), config());
        assert!(session.submit("hello"));

        let updates = session.settle().await;
        assert_eq!(updates.first(), Some(&SessionUpdate::Revealing));
        let partials: Vec<&str> = updates
            .iter()
            .filter_map(|u| match u {
                SessionUpdate::Partial(p) => Some(p.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(partials.len(), "hi there".len());
        assert_eq!(partials.last(), Some(&"hi there"));
        assert_eq!(
            updates.last(),
            Some(&SessionUpdate::Committed(Message::bot("hi there")))
        );

        assert_eq!(
            session.messages(),
            &[Message::user("hello"), Message::bot("hi there")]
        );
        assert_eq!(session.status(), SessionStatus::Idle);
        assert!(session.pending_partial_text().is_none());
        assert_eq!(
            session.debug_payload(),
            Some(&json!({"generated_answer": "hi there"}))
        );
        assert_eq!(session.stats().completed, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn partial_text_is_visible_while_revealing() {
        let dispatcher = ScriptedDispatcher::new(vec![success("abc")]);
        let mut session = ChatSession::with_dispatcher(dispatcher, config());
        session.submit("q");

        assert_eq!(session.next_update().await, Some(SessionUpdate::Revealing));
        assert_eq!(session.status(), SessionStatus::Revealing);
        assert_eq!(session.pending_partial_text(), Some(""));
        assert_eq!(
            session.next_update().await,
            Some(SessionUpdate::Partial("a".to_string()))
        );
        assert_eq!(session.pending_partial_text(), Some("a"));
        assert_eq!(session.message_count(), 1);
        assert!(!session.submit("another"));
    }

    #[tokio::test(start_paused = true)]
    async fn failure_commits_connection_error() {
        let payload = json!({"error": "timeout", "message": "timeout"});
        let dispatcher =
            ScriptedDispatcher::new(vec![QueryResult::failure("timeout", payload.clone())]);
        let mut session = ChatSession::with_dispatcher(dispatcher, config());
        session.submit("hello");

        let updates = session.settle().await;
        assert_eq!(
            updates,
            vec![SessionUpdate::Failed {
                message: Message::bot(CONNECTION_ERROR_TEXT),
                error: "timeout".to_string(),
            }]
        );
        assert_eq!(
            session.messages(),
            &[Message::user("hello"), Message::bot(CONNECTION_ERROR_TEXT)]
        );
        assert_eq!(session.status(), SessionStatus::Idle);
        assert_eq!(session.debug_payload(), Some(&payload));
        assert_eq!(session.stats().failures, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_answer_still_reveals_and_commits() {
        let dispatcher = ScriptedDispatcher::new(vec![success("")]);
        let mut session = ChatSession::with_dispatcher(dispatcher, config());
        session.submit("hello");

        let updates = session.settle().await;
        assert_eq!(
            updates,
            vec![
                SessionUpdate::Revealing,
                SessionUpdate::Committed(Message::bot("")),
            ]
        );
        assert_eq!(session.messages()[1], Message::bot(""));
        assert_eq!(session.status(), SessionStatus::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn parameters_frozen_while_busy() {
        let dispatcher = ScriptedDispatcher::new(vec![success("ok")]);
        let mut session = ChatSession::with_dispatcher(Arc::clone(&dispatcher), config());
        assert!(session.set_parameter(ParameterName::ResultCount, 999.0));
        assert_eq!(session.parameters().result_count, 20);

        session.submit("hello");
        assert!(!session.set_parameter(ParameterName::ResultCount, 3.0));
        assert!(!session.set_hybrid_weight(0.1));
        assert_eq!(session.parameters().result_count, 20);

        session.settle().await;
        assert!(session.set_fan_out(2));
        assert_eq!(session.parameters().fan_out, 2);

        let calls = dispatcher.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "hello");
        assert_eq!(calls[0].1.result_count, 20);
        assert_eq!(calls[0].2, "guest");
    }

    #[tokio::test(start_paused = true)]
    async fn finish_reveal_commits_full_answer() {
        let dispatcher = ScriptedDispatcher::new(vec![success("a long answer")]);
        let mut session = ChatSession::with_dispatcher(dispatcher, config());
        assert!(session.finish_reveal().is_none());
        session.submit("hello");
        assert_eq!(session.next_update().await, Some(SessionUpdate::Revealing));
        session.next_update().await;

        assert_eq!(
            session.finish_reveal(),
            Some(SessionUpdate::Committed(Message::bot("a long answer")))
        );
        assert_eq!(session.status(), SessionStatus::Idle);
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(session.next_update().await, None);
        assert_eq!(session.message_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn log_grows_across_exchanges() {
        let dispatcher = ScriptedDispatcher::new(vec![
            success("first"),
            QueryResult::failure("boom", json!({"error": "connection"})),
            success("third"),
        ]);
        let mut session = ChatSession::with_dispatcher(dispatcher, config());
        for text in ["one", "two", "three"] {
            assert!(session.submit(text));
            session.settle().await;
        }
        let senders: Vec<Sender> = session.messages().iter().map(|m| m.sender).collect();
        assert_eq!(
            senders,
            vec![
                Sender::User,
                Sender::Bot,
                Sender::User,
                Sender::Bot,
                Sender::User,
                Sender::Bot
            ]
        );
        assert_eq!(session.messages()[3].text, CONNECTION_ERROR_TEXT);
        assert_eq!(session.messages()[5].text, "third");
        assert_eq!(
            session.debug_payload(),
            Some(&json!({"generated_answer": "third"}))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn submit_input_clears_draft() {
        let dispatcher = ScriptedDispatcher::new(vec![success("ok")]);
        let mut session = ChatSession::with_dispatcher(dispatcher, config());
        session.set_input("   ");
        assert!(!session.submit_input());
        assert_eq!(session.input(), "   ");

        session.set_input("hello");
        assert!(session.submit_input());
        assert_eq!(session.input(), "");
        assert_eq!(session.messages(), &[Message::user("hello")]);
    }

    #[tokio::test]
    async fn debug_view_does_not_touch_pipeline() {
        let mut session = ChatSession::with_dispatcher(PendingDispatcher, config());
        session.submit("hello");
        session.open_debug_view();
        assert!(session.is_debug_view_open());
        assert_eq!(session.status(), SessionStatus::AwaitingResponse);
        session.close_debug_view();
        assert!(!session.is_debug_view_open());
        assert_eq!(session.message_count(), 1);
    }

    #[tokio::test]
    async fn next_update_when_idle_returns_none() {
        let mut session = ChatSession::with_dispatcher(PendingDispatcher, config());
        assert_eq!(session.next_update().await, None);
    }

    #[tokio::test]
    async fn stats_report_freeze_and_reveal_cadence() {
        let config = config().with_reveal_chunk_chars(0);
        let mut session = ChatSession::with_dispatcher(PendingDispatcher, config);
        let stats = session.stats();
        assert!(!stats.parameters_frozen);
        assert_eq!(stats.reveal_interval, Duration::from_millis(5));
        assert_eq!(stats.reveal_chunk_chars, 1);

        session.submit("hello");
        let stats = session.stats();
        assert!(stats.parameters_frozen);
        assert_eq!(stats.status, SessionStatus::AwaitingResponse);
        assert_eq!(stats.submissions, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_session_stops_dispatch() {
        let (dispatcher, finished) = SlowDispatcher::new();
        let mut session = ChatSession::with_dispatcher(dispatcher, config());
        assert!(session.submit("hello"));
        tokio::task::yield_now().await;
        tokio::task::yield_now().await;
        drop(session);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(finished.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn abandon_ends_exchange_with_connection_error() {
        let mut session = ChatSession::with_dispatcher(PendingDispatcher, config());
        assert!(session.abandon().is_none());
        session.set_result_count(7);
        assert!(session.submit("hello"));
        tokio::task::yield_now().await;

        match session.abandon() {
            Some(SessionUpdate::Failed { message, error }) => {
                assert_eq!(message, Message::bot(CONNECTION_ERROR_TEXT));
                assert!(error.contains("aborted"));
            }
            other => panic!("expected failure, got {other:?}"),
        }
        assert_eq!(session.status(), SessionStatus::Idle);
        assert_eq!(session.debug_payload().unwrap()["error"], "abort");
        assert_eq!(session.messages()[1].sender, Sender::Bot);
        assert_eq!(session.stats().failures, 1);
        assert!(session.set_result_count(9));
        assert!(session.abandon().is_none());
        assert_eq!(session.next_update().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn abandon_stops_dispatch_and_allows_resubmit() {
        let (dispatcher, finished) = SlowDispatcher::new();
        let mut session = ChatSession::with_dispatcher(dispatcher, config());
        assert!(session.submit("first"));
        tokio::task::yield_now().await;
        assert!(session.abandon().is_some());

        assert!(session.submit("second"));
        let updates = session.settle().await;
        assert_eq!(
            updates.last(),
            Some(&SessionUpdate::Committed(Message::bot("answer to second")))
        );
        assert_eq!(finished.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(finished.load(Ordering::SeqCst), 1);
        assert_eq!(
            session.messages(),
            &[
                Message::user("first"),
                Message::bot(CONNECTION_ERROR_TEXT),
                Message::user("second"),
                Message::bot("answer to second"),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn abandon_does_not_interrupt_reveal() {
        let dispatcher = ScriptedDispatcher::new(vec![success("revealing")]);
        let mut session = ChatSession::with_dispatcher(dispatcher, config());
        session.submit("hello");
        assert_eq!(session.next_update().await, Some(SessionUpdate::Revealing));
        assert!(session.abandon().is_none());
        assert_eq!(session.status(), SessionStatus::Revealing);
    }

    #[test]
    fn http_session_rejects_bad_endpoint() {
        let err = ChatSession::new(ChatConfig::new().with_endpoint("nope")).err();
        assert!(err.is_some());
    }
}
