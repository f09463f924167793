//! End-to-end dispatch tests: plugin directory -> loader -> registry -> dispatcher
//! Run with: cargo test --test dispatch_test

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use async_trait::async_trait;
use plugbot::application::messaging::{DispatchMessages, DispatchOutcome};
use plugbot::infrastructure::plugins::{default_loader, HandlerTable, PluginLoader};
use plugbot::{
    BotError, CommandDispatcher, CommandHandler, ContextBuilder, ExecutionContext, HandlerError,
    InboundMessage, OutboundPayload, PluginRegistry, Responder,
};

static INIT: Once = Once::new();

fn ensure_init() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    });
}

#[derive(Default)]
struct Outbox(Mutex<Vec<OutboundPayload>>);

impl Outbox {
    fn texts(&self) -> Vec<String> {
        self.0
            .lock()
            .unwrap()
            .iter()
            .filter_map(|p| p.as_text().map(str::to_string))
            .collect()
    }
}

#[async_trait]
impl Responder for Outbox {
    async fn send(&self, payload: OutboundPayload) -> Result<(), BotError> {
        self.0.lock().unwrap().push(payload);
        Ok(())
    }
}

struct Pong(AtomicUsize);

#[async_trait]
impl CommandHandler for Pong {
    async fn handle(&self, _m: &InboundMessage, ctx: &ExecutionContext) -> Result<(), HandlerError> {
        self.0.fetch_add(1, Ordering::SeqCst);
        ctx.reply("pong").await?;
        Ok(())
    }
}

/// Sleeps, then replies
struct Slow;

#[async_trait]
impl CommandHandler for Slow {
    async fn handle(&self, _m: &InboundMessage, ctx: &ExecutionContext) -> Result<(), HandlerError> {
        ctx.sleep(200).await;
        ctx.reply("slow").await?;
        Ok(())
    }
}

struct Broken;

#[async_trait]
impl CommandHandler for Broken {
    async fn handle(&self, _m: &InboundMessage, _ctx: &ExecutionContext) -> Result<(), HandlerError> {
        Err(HandlerError::ExecutionFailed("database unreachable".into()))
    }
}

fn write(dir: &Path, name: &str, content: &str) {
    std::fs::write(dir.join(name), content).unwrap();
}

fn setup(dir: &Path, handlers: HandlerTable) -> (PluginLoader, CommandDispatcher) {
    ensure_init();
    let registry = Arc::new(PluginRegistry::new());
    let loader = default_loader(dir, Arc::clone(&registry), handlers);
    loader.load();
    let dispatcher = CommandDispatcher::new(registry, ContextBuilder::new("!", "@s.whatsapp.net"));
    (loader, dispatcher)
}

fn group(text: &str) -> InboundMessage {
    InboundMessage::from_text("120363@g.us", text)
}

#[tokio::test]
async fn test_ping_scenario() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "ping.yaml", "commands: [ping]\nhandler: pong\n");
    let pong = Arc::new(Pong(AtomicUsize::new(0)));
    let mut handlers = HandlerTable::new();
    handlers.register("pong", pong.clone());
    let (_loader, dispatcher) = setup(dir.path(), handlers);
    let outbox = Arc::new(Outbox::default());

    dispatcher.dispatch("!ping", &group("!ping"), outbox.clone()).await.unwrap();
    assert_eq!(outbox.texts(), vec!["pong"]);

    dispatcher.dispatch("ping", &group("ping"), outbox.clone()).await.unwrap();
    dispatcher.dispatch("!unknown", &group("!unknown"), outbox.clone()).await.unwrap();
    assert_eq!(outbox.texts().len(), 1);
    assert_eq!(pong.0.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_private_only_scenario() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "secret.yaml",
        "commands: [secret]\nhandler: pong\nrestrict-to-private-chat: true\n",
    );
    let pong = Arc::new(Pong(AtomicUsize::new(0)));
    let mut handlers = HandlerTable::new();
    handlers.register("pong", pong.clone());
    let (_loader, dispatcher) = setup(dir.path(), handlers);
    let outbox = Arc::new(Outbox::default());

    let outcome = dispatcher.dispatch("!secret", &group("!secret"), outbox.clone()).await.unwrap();
    assert_eq!(outcome, DispatchOutcome::PrivateOnly);
    assert_eq!(outbox.texts(), vec![DispatchMessages::default().private_only]);
    assert_eq!(pong.0.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_invalid_units_never_dispatch() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "a.yaml", "handler: echo\n");
    write(dir.path(), "b.yaml", "commands: []\nhandler: echo\n");
    write(dir.path(), "c.yaml", "commands: [c]\n");
    write(dir.path(), "d.yaml", "commands: [d\n");
    write(dir.path(), "e.yml", "commands: [say]\nhandler: echo\n");
    let (loader, dispatcher) = setup(dir.path(), HandlerTable::builtin());
    let outbox = Arc::new(Outbox::default());

    assert_eq!(loader.registry().commands(), vec!["say"]);
    let outcome = dispatcher.dispatch("!c", &group("!c"), outbox.clone()).await.unwrap();
    assert_eq!(outcome, DispatchOutcome::NoMatch);

    dispatcher.dispatch("!say hello   there", &group("x"), outbox.clone()).await.unwrap();
    assert_eq!(outbox.texts(), vec!["hello there"]);
}

#[tokio::test]
async fn test_failure_sends_one_generic_reply() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "db.yaml", "commands: [db]\nhandler: broken\n");
    write(dir.path(), "ping.yaml", "commands: [ping]\nhandler: pong\n");
    let handlers = HandlerTable::new()
        .with("broken", Broken)
        .with("pong", Pong(AtomicUsize::new(0)));
    let (_loader, dispatcher) = setup(dir.path(), handlers);
    let outbox = Arc::new(Outbox::default());

    let outcome = dispatcher.dispatch("!db", &group("!db"), outbox.clone()).await.unwrap();
    assert_eq!(outcome, DispatchOutcome::Executed { invoked: 1, failed: 1 });
    assert_eq!(outbox.texts(), vec![DispatchMessages::default().handler_failed]);

    // Dispatcher keeps working afterwards
    dispatcher.dispatch("!ping", &group("!ping"), outbox.clone()).await.unwrap();
    assert_eq!(outbox.texts().last().map(String::as_str), Some("pong"));
}

#[tokio::test]
async fn test_inflight_dispatch_uses_its_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "a.yaml", "commands: [dup]\nhandler: slow\n");
    write(dir.path(), "b.yaml", "commands: [dup]\nhandler: pong\n");
    let pong = Arc::new(Pong(AtomicUsize::new(0)));
    let mut handlers = HandlerTable::new().with("slow", Slow);
    handlers.register("pong", pong.clone());
    let (loader, dispatcher) = setup(dir.path(), handlers);
    assert_eq!(loader.registry().len(), 2);

    let outbox = Arc::new(Outbox::default());
    let inflight = {
        let dispatcher = dispatcher.clone();
        let outbox = outbox.clone();
        tokio::spawn(async move { dispatcher.dispatch("!dup", &group("!dup"), outbox).await })
    };

    // Drop the second unit while the first is still sleeping
    tokio::time::sleep(Duration::from_millis(50)).await;
    std::fs::remove_file(dir.path().join("b.yaml")).unwrap();
    loader.load();
    assert_eq!(loader.registry().len(), 1);

    let outcome = inflight.await.unwrap().unwrap();
    assert_eq!(outcome, DispatchOutcome::Executed { invoked: 2, failed: 0 });
    assert_eq!(outbox.texts(), vec!["slow", "pong"]);
    assert_eq!(pong.0.load(Ordering::SeqCst), 1);

    // New dispatches see the reloaded registry
    dispatcher.dispatch("!dup", &group("!dup"), outbox.clone()).await.unwrap();
    assert_eq!(pong.0.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_reload_twice_same_commands() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "ping.yaml", "commands: [ping, test]\nhandler: ping\n");
    write(dir.path(), "echo.yaml", "commands: [echo]\nhandler: echo\n");
    let (loader, _dispatcher) = setup(dir.path(), HandlerTable::builtin());

    let first = loader.registry().commands();
    loader.load();
    assert_eq!(first, loader.registry().commands());
    assert_eq!(first, vec!["echo", "ping", "test"]);
}

#[tokio::test]
async fn test_builtin_ping_replies_twice() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "ping.yaml", "commands: [ping, test]\nhandler: ping\n");
    let (_loader, dispatcher) = setup(dir.path(), HandlerTable::builtin());
    let outbox = Arc::new(Outbox::default());

    dispatcher.dispatch("!test", &group("!test"), outbox.clone()).await.unwrap();
    let texts = outbox.texts();
    assert_eq!(texts.len(), 2);
    assert_eq!(texts[0], "🏓 Pong!");
    assert!(texts[1].contains("Latency"));
}
